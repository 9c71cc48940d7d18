// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Shared application state.

use std::sync::Arc;

use thiserror::Error;

use crate::blockchain::{ChainError, ChainGateway};
use crate::config::Config;
use crate::custody::{CustodyError, KeyCipher, WalletProvisioner};
use crate::orchestrator::{
    AccountService, DepositOrchestrator, FundingOrchestrator, InternationalOrchestrator,
    PositionReconciler, TransferOrchestrator, WalletLocks,
};
use crate::providers::FxSettlement;
use crate::storage::{LedgerStore, StorageError};

/// Errors while building the application state at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Custody(#[from] CustodyError),
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LedgerStore>,
    pub chain: Arc<ChainGateway>,
    pub provisioner: Arc<WalletProvisioner>,
    pub settlement: Arc<FxSettlement>,
    pub wallet_locks: Arc<WalletLocks>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the full service state from validated configuration.
    pub fn from_config(config: Config) -> Result<Self, StartupError> {
        let store = Arc::new(LedgerStore::open(&config.data_dir)?);
        let chain = Arc::new(ChainGateway::new(
            config.rpc_url.clone(),
            &config.stablecoin_address,
            config.confirmation_timeout,
        )?);
        let cipher = KeyCipher::from_hex(&config.wallet_encryption_key)?;
        let provisioner = Arc::new(WalletProvisioner::new(store.clone(), cipher));
        let settlement = Arc::new(FxSettlement::new(config.settlement_delay));

        Ok(Self {
            store,
            chain,
            provisioner,
            settlement,
            wallet_locks: Arc::new(WalletLocks::new()),
            config: Arc::new(config),
        })
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.store.clone(), self.provisioner.clone())
    }

    pub fn funding(&self) -> FundingOrchestrator {
        FundingOrchestrator::new(
            self.chain.clone(),
            self.wallet_locks.clone(),
            self.config.master_wallet_key.clone(),
        )
    }

    pub fn deposits(&self) -> DepositOrchestrator<ChainGateway> {
        DepositOrchestrator::new(
            self.store.clone(),
            self.chain.clone(),
            self.provisioner.clone(),
            self.wallet_locks.clone(),
        )
    }

    pub fn reconciler(&self) -> PositionReconciler<ChainGateway> {
        PositionReconciler::new(self.store.clone(), self.chain.clone())
    }

    pub fn transfers(&self) -> TransferOrchestrator {
        TransferOrchestrator::new(self.store.clone(), self.provisioner.clone())
    }

    pub fn international(&self) -> InternationalOrchestrator {
        InternationalOrchestrator::new(self.store.clone(), self.settlement.clone())
    }
}
