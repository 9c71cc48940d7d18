// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Path utilities for the ledger document layout.

use std::path::{Path, PathBuf};

/// Default base directory for ledger documents.
pub const DATA_ROOT: &str = "/data";

/// Path utilities for the ledger document store.
#[derive(Debug, Clone)]
pub struct LedgerPaths {
    root: PathBuf,
}

impl Default for LedgerPaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl LedgerPaths {
    /// Create paths rooted at a custom directory (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all ledger data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory containing all user documents.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    /// Path to a specific user document.
    pub fn user(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    /// Directory containing all account documents.
    pub fn accounts_dir(&self) -> PathBuf {
        self.root.join("accounts")
    }

    /// Path to a specific account document.
    pub fn account(&self, account_id: &str) -> PathBuf {
        self.accounts_dir().join(format!("{account_id}.json"))
    }

    /// Directory containing all transaction audit records.
    pub fn transactions_dir(&self) -> PathBuf {
        self.root.join("transactions")
    }

    /// Path to a specific transaction record.
    pub fn transaction(&self, record_id: &str) -> PathBuf {
        self.transactions_dir().join(format!("{record_id}.json"))
    }
}
