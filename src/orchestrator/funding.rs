// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Master-wallet funding of custodial wallets.

use std::sync::Arc;

use tracing::info;

use crate::blockchain::{decimal_to_units, parse_address, ChainGateway, STABLECOIN_DECIMALS};

use super::{validate_amount, OrchestratorError, WalletLocks};

/// Sends stablecoin from the master wallet to user custodial wallets.
///
/// Pure chain operation: no ledger writes, no automatic retry. A failed or
/// unconfirmed funding surfaces to the caller and the master-wallet balance
/// is the audit trail.
pub struct FundingOrchestrator {
    chain: Arc<ChainGateway>,
    locks: Arc<WalletLocks>,
    master_key: String,
}

impl FundingOrchestrator {
    pub fn new(chain: Arc<ChainGateway>, locks: Arc<WalletLocks>, master_key: String) -> Self {
        Self {
            chain,
            locks,
            master_key,
        }
    }

    /// Transfer `amount` (decimal stablecoin) to `wallet_address`.
    ///
    /// Blocks until the transfer is confirmed; returns the tx hash.
    pub async fn fund_wallet(
        &self,
        wallet_address: &str,
        amount: f64,
    ) -> Result<String, OrchestratorError> {
        validate_amount(amount)?;
        let to = parse_address(wallet_address)?;
        let units = decimal_to_units(amount, STABLECOIN_DECIMALS)?;

        let signer = ChainGateway::signer_from_hex(&self.master_key)?;
        let master_address = format!("{:?}", signer.address());

        // Serialize on the master wallet, not the recipient: all funding
        // transfers share the master nonce.
        let lock = self.locks.for_wallet(&master_address);
        let _guard = lock.lock().await;

        let tx_hash = self.chain.transfer_stablecoin(signer, to, units).await?;
        info!(%tx_hash, wallet = wallet_address, amount, "funded custodial wallet");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use url::Url;

    fn orchestrator() -> FundingOrchestrator {
        let chain = Arc::new(
            ChainGateway::new(
                Url::parse("http://localhost:8545").unwrap(),
                "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
                Duration::from_secs(90),
            )
            .unwrap(),
        );
        FundingOrchestrator::new(
            chain,
            Arc::new(WalletLocks::new()),
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318".to_string(),
        )
    }

    #[tokio::test]
    async fn rejects_invalid_amount_before_touching_the_chain() {
        let result = orchestrator().fund_wallet("0x036CbD53842c5426634e7929541eC2318f3dCF7e", 0.0).await;
        assert!(matches!(result, Err(OrchestratorError::Invalid(_))));
    }

    #[tokio::test]
    async fn rejects_malformed_address() {
        let result = orchestrator().fund_wallet("not-an-address", 10.0).await;
        assert!(matches!(result, Err(OrchestratorError::Chain(_))));
    }
}
