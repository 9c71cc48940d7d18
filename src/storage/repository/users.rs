// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! User repository.
//!
//! A user is created on first successful phone verification + profile
//! completion. The custodial wallet fields start empty and are attached
//! exactly once; the wallet is never rotated by this system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{DocumentStore, StorageError, StorageResult};

/// User document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Phone-derived user id.
    pub id: String,
    /// E.164 phone number the user verified.
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    /// ISO country code (e.g. "US").
    pub country: String,
    /// ISO currency code (e.g. "USD").
    pub currency: String,
    /// Display symbol for the currency (e.g. "$").
    pub currency_symbol: String,
    /// Public address of the custodial wallet, once provisioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    /// Encrypted custodial secret. NEVER exposed via API.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(ignore)]
    pub encrypted_private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_created_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name used on transaction audit records.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Repository for user documents.
pub struct UserRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> UserRepository<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Check if a user exists.
    pub fn exists(&self, user_id: &str) -> bool {
        self.store.exists(self.store.paths().user(user_id))
    }

    /// Get a user by id.
    pub fn get(&self, user_id: &str) -> StorageResult<User> {
        let path = self.store.paths().user(user_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.store.read_json(path)
    }

    /// Create a user document.
    ///
    /// Fails with `AlreadyExists` if the id or phone number is taken.
    pub fn create(&self, user: &User) -> StorageResult<()> {
        if self.exists(&user.id) {
            return Err(StorageError::AlreadyExists(format!("User {}", user.id)));
        }
        if self.find_by_phone(&user.phone_number)?.is_some() {
            return Err(StorageError::AlreadyExists(format!(
                "User with phone {}",
                user.phone_number
            )));
        }
        self.store.write_json(self.store.paths().user(&user.id), user)
    }

    /// Find a user by phone number (equality scan over the collection).
    pub fn find_by_phone(&self, phone_number: &str) -> StorageResult<Option<User>> {
        for id in self.store.list_ids(self.store.paths().users_dir())? {
            if let Ok(user) = self.get(&id) {
                if user.phone_number == phone_number {
                    return Ok(Some(user));
                }
            }
        }
        Ok(None)
    }

    /// Attach a custodial wallet to a user.
    ///
    /// Conditional write: fails with `Conflict` if the user already has a
    /// wallet address, so a lost provisioning race can never silently
    /// replace persisted key material.
    pub fn attach_wallet(
        &self,
        user_id: &str,
        wallet_address: &str,
        encrypted_private_key: &str,
    ) -> StorageResult<User> {
        let mut user = self.get(user_id)?;

        if let Some(existing) = &user.wallet_address {
            return Err(StorageError::Conflict(format!(
                "user {user_id} already has wallet {existing}"
            )));
        }

        user.wallet_address = Some(wallet_address.to_string());
        user.encrypted_private_key = Some(encrypted_private_key.to_string());
        user.wallet_created_at = Some(Utc::now());

        self.store
            .write_json(self.store.paths().user(user_id), &user)?;
        Ok(user)
    }
}
