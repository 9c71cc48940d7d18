// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Custodial wallet provisioning.
//!
//! Every user gets exactly one custodial EVM wallet. The private key is
//! generated server-side, sealed with AES-256-GCM and stored on the user
//! document; only the address ever crosses the API boundary.

pub mod cipher;
pub mod keys;

pub use cipher::KeyCipher;
pub use keys::{generate_keypair, GeneratedKeypair};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::signers::local::PrivateKeySigner;
use thiserror::Error;

use crate::storage::{LedgerStore, StorageError};

/// Errors from custody operations.
#[derive(Debug, Error)]
pub enum CustodyError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("cipher error: {0}")]
    Cipher(String),
    #[error("user {0} has no custodial wallet")]
    MissingWallet(String),
    #[error("stored key material for user {0} is unusable")]
    CorruptKey(String),
}

/// Provisions and unlocks custodial wallets.
///
/// Provisioning is idempotent: concurrent calls for the same user serialize
/// on a per-user async lock, and the underlying ledger write is conditional,
/// so exactly one keypair ever gets attached.
pub struct WalletProvisioner {
    store: Arc<LedgerStore>,
    cipher: KeyCipher,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl WalletProvisioner {
    pub fn new(store: Arc<LedgerStore>, cipher: KeyCipher) -> Self {
        Self {
            store,
            cipher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Entries only the map still references belong to finished calls;
        // drop them so the map tracks in-flight provisioning only.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Ensure the user has a custodial wallet, returning its address.
    ///
    /// Creates and seals a fresh keypair on first call; every later call
    /// returns the already-attached address unchanged.
    pub async fn ensure_wallet(&self, user_id: &str) -> Result<String, CustodyError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let user = self.store.users().get(user_id)?;
        if let Some(address) = user.wallet_address {
            return Ok(address);
        }

        let keypair = generate_keypair();
        let sealed = self.cipher.seal(keypair.private_key_hex.as_bytes())?;

        match self
            .store
            .users()
            .attach_wallet(user_id, &keypair.address, &sealed)
        {
            Ok(_) => {
                tracing::info!(user_id, address = %keypair.address, "provisioned custodial wallet");
                Ok(keypair.address)
            }
            // Lost a race outside our process (for example a second server
            // instance). The persisted wallet wins.
            Err(StorageError::Conflict(_)) => {
                let user = self.store.users().get(user_id)?;
                user.wallet_address
                    .ok_or_else(|| CustodyError::MissingWallet(user_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The user's wallet address, if one has been provisioned.
    pub fn wallet_address(&self, user_id: &str) -> Result<Option<String>, CustodyError> {
        Ok(self.store.users().get(user_id)?.wallet_address)
    }

    /// Unseal the user's private key and build a transaction signer.
    pub fn signer_for(&self, user_id: &str) -> Result<PrivateKeySigner, CustodyError> {
        let user = self.store.users().get(user_id)?;
        let sealed = user
            .encrypted_private_key
            .ok_or_else(|| CustodyError::MissingWallet(user_id.to_string()))?;

        let key_bytes = self.cipher.open(&sealed)?;
        let key_hex = String::from_utf8(key_bytes)
            .map_err(|_| CustodyError::CorruptKey(user_id.to_string()))?;
        key_hex
            .parse::<PrivateKeySigner>()
            .map_err(|_| CustodyError::CorruptKey(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::storage::repository::User;

    const TEST_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn test_provisioner() -> (tempfile::TempDir, Arc<LedgerStore>, WalletProvisioner) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(LedgerStore::open(dir.path()).expect("open"));
        let cipher = KeyCipher::from_hex(TEST_KEY).expect("cipher");
        let provisioner = WalletProvisioner::new(store.clone(), cipher);
        (dir, store, provisioner)
    }

    fn seed_user(store: &LedgerStore, id: &str) {
        store
            .users()
            .create(&User {
                id: id.to_string(),
                phone_number: format!("+1555000{id}"),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                country: "US".to_string(),
                currency: "USD".to_string(),
                currency_symbol: "$".to_string(),
                wallet_address: None,
                encrypted_private_key: None,
                wallet_created_at: None,
                created_at: Utc::now(),
            })
            .expect("seed user");
    }

    #[tokio::test]
    async fn ensure_wallet_is_idempotent() {
        let (_dir, store, provisioner) = test_provisioner();
        seed_user(&store, "u1");

        let first = provisioner.ensure_wallet("u1").await.unwrap();
        let second = provisioner.ensure_wallet("u1").await.unwrap();
        assert_eq!(first, second);

        let user = store.users().get("u1").unwrap();
        assert_eq!(user.wallet_address.as_deref(), Some(first.as_str()));
        assert!(user.encrypted_private_key.is_some());
    }

    #[tokio::test]
    async fn concurrent_provisioning_attaches_one_wallet() {
        let (_dir, store, provisioner) = test_provisioner();
        seed_user(&store, "u1");
        let provisioner = Arc::new(provisioner);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let p = provisioner.clone();
            handles.push(tokio::spawn(async move { p.ensure_wallet("u1").await }));
        }

        let mut addresses = Vec::new();
        for handle in handles {
            addresses.push(handle.await.unwrap().unwrap());
        }
        addresses.dedup();
        assert_eq!(addresses.len(), 1);
    }

    #[test]
    fn user_locks_drop_released_entries() {
        let (_dir, _store, provisioner) = test_provisioner();
        for i in 0..8 {
            let _ = provisioner.user_lock(&format!("u{i}"));
        }

        let held = provisioner.user_lock("u-held");
        assert_eq!(provisioner.locks.lock().unwrap().len(), 1);
        drop(held);
    }

    #[tokio::test]
    async fn signer_matches_provisioned_address() {
        let (_dir, _store, provisioner) = test_provisioner();
        seed_user(&provisioner.store, "u1");

        let address = provisioner.ensure_wallet("u1").await.unwrap();
        let signer = provisioner.signer_for("u1").unwrap();
        assert_eq!(
            format!("{:#x}", signer.address()),
            address.to_lowercase()
        );
    }

    #[tokio::test]
    async fn signer_for_unprovisioned_user_fails() {
        let (_dir, store, provisioner) = test_provisioner();
        seed_user(&store, "u1");
        assert!(matches!(
            provisioner.signer_for("u1"),
            Err(CustodyError::MissingWallet(_))
        ));
    }
}
