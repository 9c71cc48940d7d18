// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Chain gateway: balance queries and confirmation-blocking submission
//! against the stablecoin and lending-pool contracts.
//!
//! Every state-changing call returns only after the transaction is included
//! in a block, or fails with a distinguishable outcome:
//!
//! - [`ChainError::Reverted`] - terminal, must not be retried;
//! - [`ChainError::Unconfirmed`] - the transaction was submitted but the
//!   confirmation wait timed out. Neither success nor failure: the caller
//!   must re-query state before any retry (resubmitting blindly risks a
//!   double spend if the original lands later).

use std::{str::FromStr, time::Duration};

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, U256},
    providers::{
        fillers::{
            BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
            WalletFiller,
        },
        Identity, PendingTransactionBuilder, ProviderBuilder, RootProvider,
    },
    signers::local::PrivateKeySigner,
};
use url::Url;

use super::contracts::{IERC20, ILendingPool};

/// Read-only HTTP provider type (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Signing HTTP provider type (fillers + wallet).
type SignerProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
>;

/// Errors that can occur during chain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("transaction {tx_hash} unconfirmed after timeout: {reason}")]
    Unconfirmed { tx_hash: String, reason: String },
}

/// Gateway to the EVM-compatible chain holding custodial funds.
pub struct ChainGateway {
    rpc_url: Url,
    provider: HttpProvider,
    stablecoin: Address,
    confirmation_timeout: Duration,
}

impl ChainGateway {
    /// Create a gateway for the given RPC endpoint and stablecoin contract.
    pub fn new(
        rpc_url: Url,
        stablecoin_address: &str,
        confirmation_timeout: Duration,
    ) -> Result<Self, ChainError> {
        let stablecoin = parse_address(stablecoin_address)?;
        let provider = ProviderBuilder::new().connect_http(rpc_url.clone());

        Ok(Self {
            rpc_url,
            provider,
            stablecoin,
            confirmation_timeout,
        })
    }

    /// The stablecoin contract address this gateway operates on.
    pub fn stablecoin(&self) -> Address {
        self.stablecoin
    }

    /// Parse a hex private key into a signer.
    pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, ChainError> {
        let trimmed = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let key_bytes =
            alloy::hex::decode(trimmed).map_err(|e| ChainError::InvalidKey(e.to_string()))?;
        PrivateKeySigner::from_slice(&key_bytes).map_err(|e| ChainError::InvalidKey(e.to_string()))
    }

    /// Query an ERC-20 balance in token units.
    pub async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        let contract = IERC20::new(token, self.provider.clone());
        contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    /// Query the stablecoin balance of an address in token units.
    pub async fn stablecoin_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.token_balance(self.stablecoin, owner).await
    }

    /// Query the stablecoin allowance granted by `owner` to `spender`.
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ChainError> {
        let contract = IERC20::new(self.stablecoin, self.provider.clone());
        contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    /// Approve `spender` to move `amount` of the signer's stablecoin.
    ///
    /// Blocks until the approval is included in a block.
    pub async fn approve(
        &self,
        signer: PrivateKeySigner,
        spender: Address,
        amount: U256,
    ) -> Result<String, ChainError> {
        let provider = self.signing_provider(signer);
        let contract = IERC20::new(self.stablecoin, provider);
        let pending = contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(classify_send_error)?;
        self.confirm(pending).await
    }

    /// Supply `amount` of the stablecoin into a lending pool on behalf of
    /// the signer. Blocks until confirmed.
    pub async fn supply(
        &self,
        signer: PrivateKeySigner,
        pool: Address,
        amount: U256,
        on_behalf_of: Address,
    ) -> Result<String, ChainError> {
        let provider = self.signing_provider(signer);
        let contract = ILendingPool::new(pool, provider);
        let pending = contract
            .supply(self.stablecoin, amount, on_behalf_of, 0u16)
            .send()
            .await
            .map_err(classify_send_error)?;
        self.confirm(pending).await
    }

    /// Withdraw `amount` of the stablecoin from a lending pool to `to`.
    /// Blocks until confirmed.
    pub async fn withdraw(
        &self,
        signer: PrivateKeySigner,
        pool: Address,
        amount: U256,
        to: Address,
    ) -> Result<String, ChainError> {
        let provider = self.signing_provider(signer);
        let contract = ILendingPool::new(pool, provider);
        let pending = contract
            .withdraw(self.stablecoin, amount, to)
            .send()
            .await
            .map_err(classify_send_error)?;
        self.confirm(pending).await
    }

    /// Transfer `amount` of the stablecoin from the signer to `to`.
    /// Blocks until confirmed.
    pub async fn transfer_stablecoin(
        &self,
        signer: PrivateKeySigner,
        to: Address,
        amount: U256,
    ) -> Result<String, ChainError> {
        let provider = self.signing_provider(signer);
        let contract = IERC20::new(self.stablecoin, provider);
        let pending = contract
            .transfer(to, amount)
            .send()
            .await
            .map_err(classify_send_error)?;
        self.confirm(pending).await
    }

    /// Build a wallet-backed provider for a single signed submission.
    ///
    /// Nonce management is per-provider; callers must serialize submissions
    /// for the same wallet (see the per-address locks in `state`).
    fn signing_provider(&self, signer: PrivateKeySigner) -> SignerProvider {
        ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(self.rpc_url.clone())
    }

    /// Wait for inclusion and check the receipt status.
    async fn confirm(
        &self,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<String, ChainError> {
        let tx_hash = format!("{:?}", pending.tx_hash());
        let receipt = pending
            .with_timeout(Some(self.confirmation_timeout))
            .get_receipt()
            .await
            .map_err(|e| ChainError::Unconfirmed {
                tx_hash: tx_hash.clone(),
                reason: e.to_string(),
            })?;

        if !receipt.status() {
            return Err(ChainError::Reverted(format!(
                "transaction {tx_hash} reverted on-chain"
            )));
        }

        Ok(format!("{:?}", receipt.transaction_hash))
    }
}

/// Parse a 0x-prefixed hex address.
pub fn parse_address(address: &str) -> Result<Address, ChainError> {
    Address::from_str(address).map_err(|e| ChainError::InvalidAddress(e.to_string()))
}

/// Submission failures that carry revert data are terminal; everything else
/// is a transport-level RPC failure.
fn classify_send_error(e: alloy::contract::Error) -> ChainError {
    let msg = e.to_string();
    if msg.contains("revert") {
        ChainError::Reverted(msg)
    } else {
        ChainError::Rpc(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_accepts_checksummed_hex() {
        let addr = parse_address("0x07eA79F68B2B3df564D0A34F8e19D9B1e339814b").unwrap();
        assert_eq!(
            format!("{addr:?}").to_lowercase(),
            "0x07ea79f68b2b3df564d0a34f8e19d9b1e339814b"
        );
    }

    #[test]
    fn parse_address_rejects_garbage() {
        assert!(parse_address("not-an-address").is_err());
        assert!(parse_address("0x1234").is_err());
    }

    #[test]
    fn signer_from_hex_accepts_with_and_without_prefix() {
        let key = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
        let a = ChainGateway::signer_from_hex(key).unwrap();
        let b = ChainGateway::signer_from_hex(&format!("0x{key}")).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn signer_from_hex_rejects_short_keys() {
        assert!(ChainGateway::signer_from_hex("abcd").is_err());
    }
}
