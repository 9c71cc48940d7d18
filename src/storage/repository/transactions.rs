// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Transaction audit records for two-sided ledger moves.
//!
//! Each internal or international transfer is recorded as a staged durable
//! record written *before* the first balance write:
//!
//! ```text
//! Initiated -> Debited -> Completed
//!           \-> Failed (abandoned before the debit applied)
//! ```
//!
//! The staged record doubles as a compensating-action log: a crash between
//! the sender debit and the recipient credit leaves the record at `Debited`,
//! and the recovery sweep re-applies the missing credit. Amounts and party
//! fields are write-once; only the stage advances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{DocumentStore, StorageError, StorageResult};

/// Lifecycle stage of a two-sided ledger move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransferStage {
    /// Record written, no balance has changed yet.
    Initiated,
    /// Sender debited, recipient credit still outstanding.
    Debited,
    /// Both sides applied.
    Completed,
    /// Abandoned before any balance changed.
    Failed,
}

/// Kind of transfer recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    YieldAccountTransfer,
    InternationalTransfer,
}

/// Audit record of a transfer between two users.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: String,
    /// Transfer reference: a synthetic `YT…` ref for internal moves, the
    /// settlement network hash for international ones.
    pub reference: String,
    pub kind: TransferKind,
    pub stage: TransferStage,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_account_id: String,
    pub recipient_id: String,
    pub recipient_name: String,
    pub recipient_account_id: String,
    /// Amount debited from the sender, in the sender's currency.
    pub amount_sent: f64,
    /// Amount credited to the recipient, in the recipient's currency.
    pub amount_received: f64,
    pub currency_sent: String,
    pub currency_received: String,
    pub exchange_rate: f64,
    /// Settlement fee (zero for internal moves).
    pub fee: f64,
    /// Pool the value moved within, for internal yield-account transfers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<String>,
    /// Whether the recipient account was auto-provisioned by this transfer.
    pub account_created: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for transfer audit records.
pub struct TransferRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> TransferRepository<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Get a record by id.
    pub fn get(&self, record_id: &str) -> StorageResult<TransferRecord> {
        let path = self.store.paths().transaction(record_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("Transaction {record_id}")));
        }
        self.store.read_json(path)
    }

    /// Persist a new record. Fails if the id is already taken.
    pub fn create(&self, record: &TransferRecord) -> StorageResult<()> {
        let path = self.store.paths().transaction(&record.id);
        if self.store.exists(&path) {
            return Err(StorageError::AlreadyExists(format!(
                "Transaction {}",
                record.id
            )));
        }
        self.store.write_json(path, record)
    }

    /// Advance the stage of a record. The stage only moves forward.
    pub fn advance_stage(&self, record_id: &str, stage: TransferStage) -> StorageResult<()> {
        let mut record = self.get(record_id)?;
        if record.stage == TransferStage::Completed {
            return Err(StorageError::Conflict(format!(
                "transaction {record_id} is already completed"
            )));
        }
        record.stage = stage;
        record.updated_at = Utc::now();
        self.store
            .write_json(self.store.paths().transaction(record_id), &record)
    }

    /// List all records where the user is sender or recipient, newest first.
    pub fn list_by_user(&self, user_id: &str) -> StorageResult<Vec<TransferRecord>> {
        let mut records = Vec::new();
        for id in self.store.list_ids(self.store.paths().transactions_dir())? {
            if let Ok(record) = self.get(&id) {
                if record.sender_id == user_id || record.recipient_id == user_id {
                    records.push(record);
                }
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// List records stuck mid-flight (candidates for the recovery sweep).
    pub fn list_incomplete(&self) -> StorageResult<Vec<TransferRecord>> {
        let mut records = Vec::new();
        for id in self.store.list_ids(self.store.paths().transactions_dir())? {
            if let Ok(record) = self.get(&id) {
                if matches!(
                    record.stage,
                    TransferStage::Initiated | TransferStage::Debited
                ) {
                    records.push(record);
                }
            }
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }
}
