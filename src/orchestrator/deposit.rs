// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Deposits into and withdrawals from yield pools.
//!
//! A deposit is a three-step on-chain sequence (balance precondition,
//! approve, supply) followed by a ledger credit. On-chain custody is the
//! source of truth; if the ledger write is lost, the reconciler recovers it
//! from the receipt-token balance.

use std::future::Future;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::blockchain::{
    decimal_to_units, parse_address, units_to_decimal, ChainError, ChainGateway,
    STABLECOIN_DECIMALS,
};
use crate::custody::WalletProvisioner;
use crate::pools::{self, YieldPool};
use crate::storage::repository::{Account, AccountKind};
use crate::storage::LedgerStore;

use super::{validate_amount, OrchestratorError, WalletLocks};

/// Chain operations the deposit and withdrawal flows need. Implemented by
/// [`ChainGateway`]; tests substitute a fixture.
pub trait PoolGateway: Send + Sync {
    fn stablecoin_balance(
        &self,
        owner: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    fn receipt_balance(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    fn approve(
        &self,
        signer: PrivateKeySigner,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = Result<String, ChainError>> + Send;

    fn supply(
        &self,
        signer: PrivateKeySigner,
        pool: Address,
        amount: U256,
        on_behalf_of: Address,
    ) -> impl Future<Output = Result<String, ChainError>> + Send;

    fn withdraw(
        &self,
        signer: PrivateKeySigner,
        pool: Address,
        amount: U256,
        to: Address,
    ) -> impl Future<Output = Result<String, ChainError>> + Send;
}

impl PoolGateway for ChainGateway {
    fn stablecoin_balance(
        &self,
        owner: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send {
        self.stablecoin_balance(owner)
    }

    fn receipt_balance(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send {
        self.token_balance(token, owner)
    }

    fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send {
        self.allowance(owner, spender)
    }

    fn approve(
        &self,
        signer: PrivateKeySigner,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = Result<String, ChainError>> + Send {
        self.approve(signer, spender, amount)
    }

    fn supply(
        &self,
        signer: PrivateKeySigner,
        pool: Address,
        amount: U256,
        on_behalf_of: Address,
    ) -> impl Future<Output = Result<String, ChainError>> + Send {
        self.supply(signer, pool, amount, on_behalf_of)
    }

    fn withdraw(
        &self,
        signer: PrivateKeySigner,
        pool: Address,
        amount: U256,
        to: Address,
    ) -> impl Future<Output = Result<String, ChainError>> + Send {
        self.withdraw(signer, pool, amount, to)
    }
}

/// Orchestrates pool deposits and withdrawals for custodial wallets.
pub struct DepositOrchestrator<G: PoolGateway> {
    store: Arc<LedgerStore>,
    chain: Arc<G>,
    provisioner: Arc<WalletProvisioner>,
    locks: Arc<WalletLocks>,
}

impl<G: PoolGateway> DepositOrchestrator<G> {
    pub fn new(
        store: Arc<LedgerStore>,
        chain: Arc<G>,
        provisioner: Arc<WalletProvisioner>,
        locks: Arc<WalletLocks>,
    ) -> Self {
        Self {
            store,
            chain,
            provisioner,
            locks,
        }
    }

    /// Supply `amount` of the user's stablecoin into a pool, then credit the
    /// matching yield account.
    ///
    /// Returns the supply tx hash. Amounts below the pool minimum are
    /// rejected before any chain access. The wallet's on-chain stablecoin
    /// balance is the precondition; the ledger account is created on first
    /// deposit and credited with the amount that actually moved on-chain
    /// (excess precision below the token's resolution is truncated).
    pub async fn deposit_to_pool(
        &self,
        user_id: &str,
        pool_id: &str,
        amount: f64,
    ) -> Result<String, OrchestratorError> {
        validate_amount(amount)?;
        let pool = pools::pool_by_id(pool_id)
            .ok_or_else(|| OrchestratorError::NotFound(format!("Pool {pool_id}")))?;
        if amount < pool.min_deposit {
            return Err(OrchestratorError::Invalid(format!(
                "Minimum deposit for pool {pool_id} is {}",
                pool.min_deposit
            )));
        }
        let pool_address = parse_address(pool.pool_address)?;

        let wallet_address = self.provisioner.ensure_wallet(user_id).await?;
        let wallet = parse_address(&wallet_address)?;
        let units = decimal_to_units(amount, STABLECOIN_DECIMALS)?;

        let lock = self.locks.for_wallet(&wallet_address);
        let _wallet_guard = lock.lock().await;

        let balance = self.chain.stablecoin_balance(wallet).await?;
        if balance < units {
            return Err(OrchestratorError::InsufficientFunds {
                available: units_to_decimal(balance, STABLECOIN_DECIMALS)?,
                requested: amount,
            });
        }

        let signer = self.provisioner.signer_for(user_id)?;

        // A leftover allowance from an earlier interrupted deposit can cover
        // this supply; only approve when it does not.
        let allowance = self.chain.allowance(wallet, pool_address).await?;
        if allowance < units {
            let approve_hash = self
                .chain
                .approve(signer.clone(), pool_address, units)
                .await?;
            info!(user_id, pool_id, tx_hash = %approve_hash, "approved pool spend");
        }

        let supply_hash = self.chain.supply(signer, pool_address, units, wallet).await?;
        info!(user_id, pool_id, amount, tx_hash = %supply_hash, "supplied to pool");

        self.log_receipt_balance(pool, wallet).await;

        let credited = units_to_decimal(units, STABLECOIN_DECIMALS)?;
        let account = self.ensure_pool_account(user_id, pool, &wallet_address)?;
        let _balance_guard = self.store.balance_guard().await;
        self.store.accounts().adjust_balance(&account.id, credited)?;

        Ok(supply_hash)
    }

    /// Withdraw `amount` of the stablecoin from a pool back to the user's
    /// wallet, then debit the yield account.
    ///
    /// The on-chain receipt balance is the precondition. The ledger debit is
    /// clamped at zero: the cached balance may lag accrued interest and must
    /// not block withdrawing value the chain says exists.
    pub async fn withdraw_from_pool(
        &self,
        user_id: &str,
        pool_id: &str,
        amount: f64,
    ) -> Result<String, OrchestratorError> {
        validate_amount(amount)?;
        let pool = pools::pool_by_id(pool_id)
            .ok_or_else(|| OrchestratorError::NotFound(format!("Pool {pool_id}")))?;
        let pool_address = parse_address(pool.pool_address)?;

        let wallet_address = self
            .provisioner
            .wallet_address(user_id)?
            .ok_or_else(|| OrchestratorError::NotFound(format!("Wallet for user {user_id}")))?;
        let wallet = parse_address(&wallet_address)?;
        let units = decimal_to_units(amount, STABLECOIN_DECIMALS)?;

        let lock = self.locks.for_wallet(&wallet_address);
        let _wallet_guard = lock.lock().await;

        if let Some(receipt_token) = pool.receipt_token {
            let token = parse_address(receipt_token)?;
            let receipt_balance = self.chain.receipt_balance(token, wallet).await?;
            if receipt_balance < units {
                return Err(OrchestratorError::InsufficientFunds {
                    available: units_to_decimal(receipt_balance, STABLECOIN_DECIMALS)?,
                    requested: amount,
                });
            }
        }

        let signer = self.provisioner.signer_for(user_id)?;
        let tx_hash = self.chain.withdraw(signer, pool_address, units, wallet).await?;
        info!(user_id, pool_id, amount, %tx_hash, "withdrew from pool");

        if let Some(account) = self.store.accounts().find_pool_account(user_id, pool_id)? {
            let withdrawn = units_to_decimal(units, STABLECOIN_DECIMALS)?;
            let _balance_guard = self.store.balance_guard().await;
            let current = self.store.accounts().get(&account.id)?.balance;
            let delta = -withdrawn.min(current);
            self.store.accounts().adjust_balance(&account.id, delta)?;
        }

        Ok(tx_hash)
    }

    /// Diagnostic read of the receipt-token position after a supply.
    async fn log_receipt_balance(&self, pool: &YieldPool, wallet: Address) {
        let Some(receipt_token) = pool.receipt_token else {
            return;
        };
        let Ok(token) = parse_address(receipt_token) else {
            return;
        };
        match self.chain.receipt_balance(token, wallet).await {
            Ok(balance) => {
                info!(
                    pool_id = pool.id,
                    receipt_balance = %crate::blockchain::format_units(balance, STABLECOIN_DECIMALS),
                    "receipt-token position after supply"
                );
            }
            Err(e) => {
                warn!(pool_id = pool.id, error = %e, "receipt-token balance read failed");
            }
        }
    }

    fn ensure_pool_account(
        &self,
        user_id: &str,
        pool: &YieldPool,
        wallet_address: &str,
    ) -> Result<Account, OrchestratorError> {
        if let Some(account) = self.store.accounts().find_pool_account(user_id, pool.id)? {
            return Ok(account);
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: pool.name.to_string(),
            account_number: String::new(),
            balance: 0.0,
            applied_transfers: Vec::new(),
            kind: AccountKind::Savings,
            apy: pool.apy,
            pool_id: Some(pool.id.to_string()),
            protocol: Some(pool.protocol.to_string()),
            chain: Some(pool.chain.to_string()),
            wallet_address: Some(wallet_address.to_string()),
            created_at: Utc::now(),
            last_updated: None,
        };
        self.store.accounts().create(&account)?;
        info!(user_id, pool_id = pool.id, account_id = %account.id, "created yield account on first deposit");
        Ok(account)
    }
}
