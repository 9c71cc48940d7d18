// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! International transfers between waiting-room balances.
//!
//! Value moves between the two users' waiting rooms with an FX conversion
//! quoted by the settlement provider. The same staged-record mechanism as
//! internal transfers guards the two balance writes; the settlement hash is
//! the transfer reference.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::providers::FxSettlement;
use crate::storage::repository::{TransferKind, TransferRecord, TransferStage};
use crate::storage::LedgerStore;

use super::{validate_amount, OrchestratorError};

/// Result of an international transfer.
#[derive(Debug, Clone)]
pub struct InternationalOutcome {
    /// Settlement-network hash of the payment.
    pub reference: String,
    pub amount_sent: f64,
    pub amount_received: f64,
    pub exchange_rate: f64,
    pub fee: f64,
}

/// Orchestrates cross-border waiting-room transfers.
pub struct InternationalOrchestrator {
    store: Arc<LedgerStore>,
    settlement: Arc<FxSettlement>,
}

impl InternationalOrchestrator {
    pub fn new(store: Arc<LedgerStore>, settlement: Arc<FxSettlement>) -> Self {
        Self { store, settlement }
    }

    /// Send `amount` (sender's currency) from the sender's waiting room to
    /// the recipient's, converted at the settlement rate.
    pub async fn send_international(
        &self,
        sender_id: &str,
        recipient_id: &str,
        amount: f64,
    ) -> Result<InternationalOutcome, OrchestratorError> {
        validate_amount(amount)?;
        if sender_id == recipient_id {
            return Err(OrchestratorError::Invalid(
                "cannot transfer to yourself".to_string(),
            ));
        }

        let sender = self.store.users().get(sender_id)?;
        let recipient = self.store.users().get(recipient_id)?;

        let sender_room = self
            .store
            .accounts()
            .waiting_room(sender_id)?
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!("Waiting room for user {sender_id}"))
            })?;
        let recipient_room = self
            .store
            .accounts()
            .waiting_room(recipient_id)?
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!("Waiting room for user {recipient_id}"))
            })?;

        if sender_room.balance < amount {
            return Err(OrchestratorError::InsufficientFunds {
                available: sender_room.balance,
                requested: amount,
            });
        }

        // Quote and settle before any balance moves. An unsupported corridor
        // fails here and the ledger never changes.
        let quote = self
            .settlement
            .settle(amount, &sender.currency, &recipient.currency)
            .await?;

        let now = Utc::now();
        let record = TransferRecord {
            id: Uuid::new_v4().to_string(),
            reference: quote.reference.clone(),
            kind: TransferKind::InternationalTransfer,
            stage: TransferStage::Initiated,
            sender_id: sender_id.to_string(),
            sender_name: sender.full_name(),
            sender_account_id: sender_room.id.clone(),
            recipient_id: recipient_id.to_string(),
            recipient_name: recipient.full_name(),
            recipient_account_id: recipient_room.id.clone(),
            amount_sent: quote.amount_sent,
            amount_received: quote.amount_received,
            currency_sent: sender.currency.clone(),
            currency_received: recipient.currency.clone(),
            exchange_rate: quote.exchange_rate,
            fee: quote.fee,
            pool_id: None,
            account_created: false,
            created_at: now,
            updated_at: now,
        };

        let _guard = self.store.balance_guard().await;

        let current = self.store.accounts().get(&sender_room.id)?.balance;
        if current < amount {
            return Err(OrchestratorError::InsufficientFunds {
                available: current,
                requested: amount,
            });
        }

        self.store.transfers().create(&record)?;
        self.store
            .accounts()
            .apply_once(&sender_room.id, &record.id, -amount)?;
        self.store
            .transfers()
            .advance_stage(&record.id, TransferStage::Debited)?;
        self.store
            .accounts()
            .apply_once(&recipient_room.id, &record.id, quote.amount_received)?;
        self.store
            .transfers()
            .advance_stage(&record.id, TransferStage::Completed)?;

        info!(
            reference = %quote.reference,
            sender_id,
            recipient_id,
            amount_sent = quote.amount_sent,
            amount_received = quote.amount_received,
            rate = quote.exchange_rate,
            "completed international transfer"
        );

        Ok(InternationalOutcome {
            reference: quote.reference,
            amount_sent: quote.amount_sent,
            amount_received: quote.amount_received,
            exchange_rate: quote.exchange_rate,
            fee: quote.fee,
        })
    }
}
