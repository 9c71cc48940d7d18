// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! User registration and account opening.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::custody::WalletProvisioner;
use crate::pools;
use crate::storage::repository::{Account, AccountKind, User};
use crate::storage::LedgerStore;

use super::{validate_amount, OrchestratorError};

/// Registration and account-opening flows.
pub struct AccountService {
    store: Arc<LedgerStore>,
    provisioner: Arc<WalletProvisioner>,
}

impl AccountService {
    pub fn new(store: Arc<LedgerStore>, provisioner: Arc<WalletProvisioner>) -> Self {
        Self { store, provisioner }
    }

    /// Register a new user and create their waiting-room account.
    ///
    /// The waiting room is created immediately after the user document, so a
    /// registered user never lacks one. Duplicate phone numbers are rejected
    /// by the user repository's conditional insert.
    pub fn register_user(
        &self,
        phone_number: &str,
        first_name: &str,
        last_name: &str,
        country: &str,
        currency: &str,
        currency_symbol: &str,
    ) -> Result<(User, Account), OrchestratorError> {
        if phone_number.trim().is_empty() {
            return Err(OrchestratorError::Invalid(
                "phone number is required".to_string(),
            ));
        }
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(OrchestratorError::Invalid("name is required".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            phone_number: phone_number.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            country: country.to_string(),
            currency: currency.to_string(),
            currency_symbol: currency_symbol.to_string(),
            wallet_address: None,
            encrypted_private_key: None,
            wallet_created_at: None,
            created_at: now,
        };
        self.store.users().create(&user)?;

        let waiting_room = Account {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
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
            created_at: now,
            last_updated: None,
        };
        self.store.accounts().create(&waiting_room)?;

        info!(user_id = %user.id, "registered user");
        Ok((user, waiting_room))
    }

    /// Open a yield account backed by a catalog pool.
    ///
    /// Ensures the user has a custodial wallet first, then performs the
    /// conditional insert keyed on (user, pool). The balance starts at zero;
    /// it only moves through deposits, transfers, and reconciliation.
    pub async fn open_yield_account(
        &self,
        user_id: &str,
        pool_id: &str,
        name: Option<&str>,
    ) -> Result<Account, OrchestratorError> {
        let pool = pools::pool_by_id(pool_id)
            .ok_or_else(|| OrchestratorError::NotFound(format!("Pool {pool_id}")))?;

        let wallet_address = self.provisioner.ensure_wallet(user_id).await?;

        let account = Account {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.unwrap_or(pool.name).to_string(),
            account_number: masked_account_number(),
            balance: 0.0,
            applied_transfers: Vec::new(),
            kind: AccountKind::Savings,
            apy: pool.apy,
            pool_id: Some(pool.id.to_string()),
            protocol: Some(pool.protocol.to_string()),
            chain: Some(pool.chain.to_string()),
            wallet_address: Some(wallet_address),
            created_at: Utc::now(),
            last_updated: None,
        };
        self.store.accounts().create(&account)?;

        info!(user_id, pool_id, account_id = %account.id, "opened yield account");
        Ok(account)
    }

    /// Development helper: credit a user's waiting room directly.
    pub async fn top_up_waiting_room(
        &self,
        user_id: &str,
        amount: f64,
    ) -> Result<Account, OrchestratorError> {
        validate_amount(amount)?;
        let waiting_room = self
            .store
            .accounts()
            .waiting_room(user_id)?
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!("Waiting room for user {user_id}"))
            })?;

        let _guard = self.store.balance_guard().await;
        let account = self.store.accounts().adjust_balance(&waiting_room.id, amount)?;
        info!(user_id, amount, balance = account.balance, "topped up waiting room");
        Ok(account)
    }
}

/// Masked display number in the product's card format.
fn masked_account_number() -> String {
    let digits = Uuid::new_v4().as_u128() % 10_000;
    format!("•••• {digits:04}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::KeyCipher;
    use crate::storage::StorageError;

    const TEST_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn service() -> (tempfile::TempDir, Arc<LedgerStore>, AccountService) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(LedgerStore::open(dir.path()).expect("open"));
        let provisioner = Arc::new(WalletProvisioner::new(
            store.clone(),
            KeyCipher::from_hex(TEST_KEY).expect("cipher"),
        ));
        let service = AccountService::new(store.clone(), provisioner);
        (dir, store, service)
    }

    #[test]
    fn registration_creates_user_and_waiting_room() {
        let (_dir, store, service) = service();
        let (user, waiting_room) = service
            .register_user("+15551234567", "Ada", "Lovelace", "US", "USD", "$")
            .unwrap();

        assert_eq!(waiting_room.user_id, user.id);
        assert!(waiting_room.is_waiting_room());
        assert_eq!(waiting_room.balance, 0.0);
        assert!(store.accounts().waiting_room(&user.id).unwrap().is_some());
    }

    #[test]
    fn duplicate_phone_rejected() {
        let (_dir, _store, service) = service();
        service
            .register_user("+15551234567", "Ada", "Lovelace", "US", "USD", "$")
            .unwrap();
        let result = service.register_user("+15551234567", "Grace", "Hopper", "US", "USD", "$");
        assert!(matches!(
            result,
            Err(OrchestratorError::Storage(StorageError::AlreadyExists(_)))
        ));
    }

    #[tokio::test]
    async fn open_yield_account_provisions_wallet() {
        let (_dir, store, service) = service();
        let (user, _) = service
            .register_user("+15551234567", "Ada", "Lovelace", "US", "USD", "$")
            .unwrap();

        let account = service
            .open_yield_account(&user.id, "aave-base-balanced", None)
            .await
            .unwrap();
        assert_eq!(account.apy, 7.2);
        assert_eq!(account.pool_id.as_deref(), Some("aave-base-balanced"));
        assert!(account.wallet_address.is_some());

        // The wallet landed on the user document too.
        let user = store.users().get(&user.id).unwrap();
        assert_eq!(user.wallet_address, account.wallet_address);

        // Second open for the same pool is rejected.
        let dup = service
            .open_yield_account(&user.id, "aave-base-balanced", None)
            .await;
        assert!(matches!(
            dup,
            Err(OrchestratorError::Storage(StorageError::AlreadyExists(_)))
        ));
    }

    #[tokio::test]
    async fn open_yield_account_unknown_pool() {
        let (_dir, _store, service) = service();
        let (user, _) = service
            .register_user("+15551234567", "Ada", "Lovelace", "US", "USD", "$")
            .unwrap();
        let result = service.open_yield_account(&user.id, "no-such-pool", None).await;
        assert!(matches!(result, Err(OrchestratorError::NotFound(_))));
    }

    #[tokio::test]
    async fn top_up_credits_waiting_room() {
        let (_dir, _store, service) = service();
        let (user, _) = service
            .register_user("+15551234567", "Ada", "Lovelace", "US", "USD", "$")
            .unwrap();

        let account = service.top_up_waiting_room(&user.id, 150.0).await.unwrap();
        assert_eq!(account.balance, 150.0);

        let rejected = service.top_up_waiting_room(&user.id, -1.0).await;
        assert!(matches!(rejected, Err(OrchestratorError::Invalid(_))));
    }
}
