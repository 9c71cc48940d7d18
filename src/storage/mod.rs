// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Off-chain ledger storage.
//!
//! The ledger is a directory of JSON documents, one file per user, account,
//! or transaction record. Yield-account balances are a cached view of
//! on-chain custody; waiting-room balances and transaction audit records
//! live only here.

pub mod paths;
pub mod repository;
pub mod store;

pub use paths::{LedgerPaths, DATA_ROOT};
pub use store::{DocumentStore, StorageError, StorageResult};

use std::path::Path;

use repository::{AccountRepository, TransferRepository, UserRepository};

/// The off-chain ledger: a document store plus a store-wide balance lock.
///
/// Single-document writes are atomic on their own. Any operation that moves
/// value between two accounts (debit one, credit another) must hold
/// [`LedgerStore::balance_guard`] across both writes so concurrent moves
/// cannot interleave and double-spend a balance check.
pub struct LedgerStore {
    store: DocumentStore,
    balance_lock: tokio::sync::Mutex<()>,
}

impl LedgerStore {
    /// Open the ledger rooted at `root`, creating directories as needed.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let store = DocumentStore::open(LedgerPaths::new(root))?;
        Ok(Self {
            store,
            balance_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.store)
    }

    pub fn accounts(&self) -> AccountRepository<'_> {
        AccountRepository::new(&self.store)
    }

    pub fn transfers(&self) -> TransferRepository<'_> {
        TransferRepository::new(&self.store)
    }

    /// Acquire the store-wide balance lock for a two-sided move.
    pub async fn balance_guard(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.balance_lock.lock().await
    }
}
