// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Orchestration of wallet, deposit, and transfer flows.
//!
//! Each orchestrator composes the custody layer, the chain gateway, and the
//! ledger into one user-facing operation. Chain submissions for the same
//! custodial wallet are serialized through [`WalletLocks`] so concurrent
//! requests cannot race on the wallet nonce.

pub mod accounts;
pub mod deposit;
pub mod funding;
pub mod international;
pub mod reconcile;
pub mod transfer;

pub use accounts::AccountService;
pub use deposit::{DepositOrchestrator, PoolGateway};
pub use funding::FundingOrchestrator;
pub use international::{InternationalOrchestrator, InternationalOutcome};
pub use reconcile::{PositionReconciler, ReceiptSource, ReconcileOutcome};
pub use transfer::{TransferOrchestrator, TransferOutcome};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::blockchain::ChainError;
use crate::custody::CustodyError;
use crate::providers::SettlementError;
use crate::storage::StorageError;

/// Errors surfaced by orchestration flows.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Custody(#[from] CustodyError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("insufficient funds: {available} available, {requested} requested")]
    InsufficientFunds { available: f64, requested: f64 },

    #[error("invalid request: {0}")]
    Invalid(String),
}

/// Per-wallet-address async locks serializing chain submissions.
///
/// Alloy's nonce filler reads the pending nonce per provider, so two
/// in-flight transactions from the same wallet would collide. Holding the
/// wallet's lock across submit-and-confirm keeps submissions ordered.
#[derive(Default)]
pub struct WalletLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for a wallet address. Addresses are compared
    /// case-insensitively.
    pub fn for_wallet(&self, address: &str) -> Arc<tokio::sync::Mutex<()>> {
        let key = address.to_lowercase();
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Entries only the map still references belong to finished
        // operations; drop them so the map tracks in-flight wallets only.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(key)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Positive, finite decimal amount or `Invalid`.
fn validate_amount(amount: f64) -> Result<(), OrchestratorError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(OrchestratorError::Invalid(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}
