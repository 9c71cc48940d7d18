// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Account repository.
//!
//! ## Invariants
//!
//! - Each user has exactly one waiting-room account, created at registration.
//! - At most one yield account per (user, pool) pair, enforced here by a
//!   conditional insert rather than a read-then-write at the call site.
//! - Balances change only through [`AccountRepository::adjust_balance`],
//!   [`AccountRepository::apply_once`], or [`AccountRepository::set_balance`];
//!   yield-account balances are a cached view of on-chain custody and are
//!   overwritten by reconciliation.
//! - Transfer balance effects are recorded on the account in the same
//!   document write as the balance itself, so an interrupted transfer can be
//!   replayed without applying the same move twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{DocumentStore, StorageError, StorageResult};

/// Account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AccountKind {
    /// Non-yield-bearing holding balance.
    WaitingRoom,
    Checking,
    Savings,
}

/// Account document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Masked display number; empty for waiting-room accounts.
    pub account_number: String,
    /// Off-chain bookkeeping balance in decimal currency units.
    pub balance: f64,
    /// Ids of transfers whose balance effect has landed on this account.
    /// Written in the same document update as the balance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(ignore)]
    pub applied_transfers: Vec<String>,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    /// APY snapshot taken from the pool catalog at creation.
    pub apy: f64,
    /// Yield-pool id for non-waiting-room accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    /// Denormalized copy of the owner's custodial wallet address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_waiting_room(&self) -> bool {
        self.kind == AccountKind::WaitingRoom
    }
}

/// Repository for account documents.
pub struct AccountRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> AccountRepository<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Get an account by id.
    pub fn get(&self, account_id: &str) -> StorageResult<Account> {
        let path = self.store.paths().account(account_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("Account {account_id}")));
        }
        self.store.read_json(path)
    }

    /// Create an account.
    ///
    /// Conditional insert: a second waiting-room account for the same user,
    /// or a second yield account for the same (user, pool) pair, fails with
    /// `AlreadyExists`.
    pub fn create(&self, account: &Account) -> StorageResult<()> {
        if self.store.exists(self.store.paths().account(&account.id)) {
            return Err(StorageError::AlreadyExists(format!(
                "Account {}",
                account.id
            )));
        }

        if account.is_waiting_room() {
            if self.waiting_room(&account.user_id)?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Waiting room for user {}",
                    account.user_id
                )));
            }
        } else {
            let pool_id = account.pool_id.as_deref().ok_or_else(|| {
                StorageError::Conflict("yield account requires a pool id".to_string())
            })?;
            if self.find_pool_account(&account.user_id, pool_id)?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Account for user {} and pool {pool_id}",
                    account.user_id
                )));
            }
        }

        self.store
            .write_json(self.store.paths().account(&account.id), account)
    }

    /// List all accounts owned by a user.
    pub fn list_by_user(&self, user_id: &str) -> StorageResult<Vec<Account>> {
        let mut accounts = Vec::new();
        for id in self.store.list_ids(self.store.paths().accounts_dir())? {
            if let Ok(account) = self.get(&id) {
                if account.user_id == user_id {
                    accounts.push(account);
                }
            }
        }
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(accounts)
    }

    /// Find the user's waiting-room account.
    pub fn waiting_room(&self, user_id: &str) -> StorageResult<Option<Account>> {
        Ok(self
            .list_by_user(user_id)?
            .into_iter()
            .find(Account::is_waiting_room))
    }

    /// Find the user's yield account for a specific pool.
    pub fn find_pool_account(
        &self,
        user_id: &str,
        pool_id: &str,
    ) -> StorageResult<Option<Account>> {
        Ok(self.list_by_user(user_id)?.into_iter().find(|acc| {
            !acc.is_waiting_room() && acc.pool_id.as_deref() == Some(pool_id)
        }))
    }

    /// Apply a signed delta to an account balance.
    ///
    /// The write is atomic per document. Callers moving value between two
    /// accounts must hold the ledger balance guard across both writes.
    pub fn adjust_balance(&self, account_id: &str, delta: f64) -> StorageResult<Account> {
        let mut account = self.get(account_id)?;
        let new_balance = account.balance + delta;
        if new_balance < 0.0 {
            return Err(StorageError::Conflict(format!(
                "balance of account {account_id} would go negative ({} {delta:+})",
                account.balance
            )));
        }
        account.balance = new_balance;
        account.last_updated = Some(Utc::now());
        self.store
            .write_json(self.store.paths().account(account_id), &account)?;
        Ok(account)
    }

    /// Apply a transfer's signed delta to an account balance exactly once.
    ///
    /// The transfer id and the new balance land in one document write; a
    /// repeat call for the same transfer id is a no-op returning `false`.
    pub fn apply_once(
        &self,
        account_id: &str,
        transfer_id: &str,
        delta: f64,
    ) -> StorageResult<bool> {
        let mut account = self.get(account_id)?;
        if account.applied_transfers.iter().any(|id| id == transfer_id) {
            return Ok(false);
        }
        let new_balance = account.balance + delta;
        if new_balance < 0.0 {
            return Err(StorageError::Conflict(format!(
                "balance of account {account_id} would go negative ({} {delta:+})",
                account.balance
            )));
        }
        account.balance = new_balance;
        account.applied_transfers.push(transfer_id.to_string());
        account.last_updated = Some(Utc::now());
        self.store
            .write_json(self.store.paths().account(account_id), &account)?;
        Ok(true)
    }

    /// Overwrite an account balance with freshly queried on-chain truth.
    pub fn set_balance(&self, account_id: &str, balance: f64) -> StorageResult<Account> {
        let mut account = self.get(account_id)?;
        account.balance = balance;
        account.last_updated = Some(Utc::now());
        self.store
            .write_json(self.store.paths().account(account_id), &account)?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LedgerPaths;

    fn test_store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::open(LedgerPaths::new(dir.path())).expect("open");
        (dir, store)
    }

    fn waiting_room(id: &str, user_id: &str) -> Account {
        Account {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: "Waiting Room".to_string(),
            account_number: String::new(),
            balance: 0.0,
            applied_transfers: Vec::new(),
            kind: AccountKind::WaitingRoom,
            apy: 0.0,
            pool_id: None,
            protocol: None,
            chain: None,
            wallet_address: None,
            created_at: Utc::now(),
            last_updated: None,
        }
    }

    fn yield_account(id: &str, user_id: &str, pool_id: &str) -> Account {
        Account {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: "Balanced".to_string(),
            account_number: "•••• 4821".to_string(),
            balance: 0.0,
            applied_transfers: Vec::new(),
            kind: AccountKind::Savings,
            apy: 7.2,
            pool_id: Some(pool_id.to_string()),
            protocol: Some("Aave V3".to_string()),
            chain: Some("Base".to_string()),
            wallet_address: Some("0xabc".to_string()),
            created_at: Utc::now(),
            last_updated: None,
        }
    }

    #[test]
    fn one_waiting_room_per_user() {
        let (_dir, store) = test_store();
        let repo = AccountRepository::new(&store);

        repo.create(&waiting_room("a1", "u1")).unwrap();
        let result = repo.create(&waiting_room("a2", "u1"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

        // A different user gets their own.
        repo.create(&waiting_room("a3", "u2")).unwrap();
    }

    #[test]
    fn one_account_per_user_pool_pair() {
        let (_dir, store) = test_store();
        let repo = AccountRepository::new(&store);

        repo.create(&yield_account("a1", "u1", "aave-base-balanced"))
            .unwrap();
        let dup = repo.create(&yield_account("a2", "u1", "aave-base-balanced"));
        assert!(matches!(dup, Err(StorageError::AlreadyExists(_))));

        // Same pool, different user is fine; same user, different pool too.
        repo.create(&yield_account("a3", "u2", "aave-base-balanced"))
            .unwrap();
        repo.create(&yield_account("a4", "u1", "morpho-aggressive"))
            .unwrap();
    }

    #[test]
    fn yield_account_requires_pool_id() {
        let (_dir, store) = test_store();
        let repo = AccountRepository::new(&store);

        let mut account = yield_account("a1", "u1", "aave-base-balanced");
        account.pool_id = None;
        assert!(matches!(
            repo.create(&account),
            Err(StorageError::Conflict(_))
        ));
    }

    #[test]
    fn adjust_balance_applies_delta() {
        let (_dir, store) = test_store();
        let repo = AccountRepository::new(&store);

        let mut account = waiting_room("a1", "u1");
        account.balance = 100.0;
        repo.create(&account).unwrap();

        let after = repo.adjust_balance("a1", 25.0).unwrap();
        assert_eq!(after.balance, 125.0);
        assert!(after.last_updated.is_some());

        let after = repo.adjust_balance("a1", -125.0).unwrap();
        assert_eq!(after.balance, 0.0);
    }

    #[test]
    fn adjust_balance_rejects_overdraft() {
        let (_dir, store) = test_store();
        let repo = AccountRepository::new(&store);

        let mut account = waiting_room("a1", "u1");
        account.balance = 10.0;
        repo.create(&account).unwrap();

        let result = repo.adjust_balance("a1", -10.01);
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        // Balance untouched after the rejected write.
        assert_eq!(repo.get("a1").unwrap().balance, 10.0);
    }

    #[test]
    fn apply_once_is_idempotent_per_transfer() {
        let (_dir, store) = test_store();
        let repo = AccountRepository::new(&store);

        let mut account = waiting_room("a1", "u1");
        account.balance = 100.0;
        repo.create(&account).unwrap();

        assert!(repo.apply_once("a1", "t1", -25.0).unwrap());
        assert_eq!(repo.get("a1").unwrap().balance, 75.0);

        // Replaying the same transfer changes nothing.
        assert!(!repo.apply_once("a1", "t1", -25.0).unwrap());
        assert_eq!(repo.get("a1").unwrap().balance, 75.0);

        // A different transfer applies normally.
        assert!(repo.apply_once("a1", "t2", 10.0).unwrap());
        assert_eq!(repo.get("a1").unwrap().balance, 85.0);
    }

    #[test]
    fn apply_once_rejects_overdraft() {
        let (_dir, store) = test_store();
        let repo = AccountRepository::new(&store);

        let mut account = waiting_room("a1", "u1");
        account.balance = 10.0;
        repo.create(&account).unwrap();

        let result = repo.apply_once("a1", "t1", -10.01);
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        // The rejected transfer is not recorded as applied.
        assert!(repo.apply_once("a1", "t1", -10.0).unwrap());
        assert_eq!(repo.get("a1").unwrap().balance, 0.0);
    }

    #[test]
    fn set_balance_overwrites() {
        let (_dir, store) = test_store();
        let repo = AccountRepository::new(&store);

        let mut account = yield_account("a1", "u1", "aave-base-balanced");
        account.balance = 5.0;
        repo.create(&account).unwrap();

        let after = repo.set_balance("a1", 42.5).unwrap();
        assert_eq!(after.balance, 42.5);
    }

    #[test]
    fn find_pool_account_ignores_waiting_room() {
        let (_dir, store) = test_store();
        let repo = AccountRepository::new(&store);

        repo.create(&waiting_room("a1", "u1")).unwrap();
        repo.create(&yield_account("a2", "u1", "aave-base-balanced"))
            .unwrap();

        let found = repo
            .find_pool_account("u1", "aave-base-balanced")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "a2");
        assert!(repo.find_pool_account("u1", "unknown").unwrap().is_none());
    }
}
