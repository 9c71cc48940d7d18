// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Internal yield-account transfers between users.
//!
//! An internal transfer is a pure off-chain ledger move within one pool: the
//! supplied principal stays in the sender's custodial position and only the
//! bookkeeping claim moves. Each transfer writes a staged audit record
//! before touching balances, so a crash between the two balance writes can
//! be repaired by [`TransferOrchestrator::sweep_incomplete`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::custody::WalletProvisioner;
use crate::pools;
use crate::storage::repository::{
    Account, AccountKind, TransferKind, TransferRecord, TransferStage,
};
use crate::storage::LedgerStore;

use super::{validate_amount, OrchestratorError};

/// Result of an internal transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Synthetic `YT…` reference of the completed move.
    pub reference: String,
    pub recipient_account_id: String,
    /// Whether the recipient's account was created by this transfer.
    pub account_created: bool,
}

/// Orchestrates internal yield-account transfers.
pub struct TransferOrchestrator {
    store: Arc<LedgerStore>,
    provisioner: Arc<WalletProvisioner>,
}

impl TransferOrchestrator {
    pub fn new(store: Arc<LedgerStore>, provisioner: Arc<WalletProvisioner>) -> Self {
        Self { store, provisioner }
    }

    /// Move `amount` from the sender's yield account to the recipient's
    /// account in the same pool, creating it (and the recipient's custodial
    /// wallet) if needed.
    pub async fn transfer(
        &self,
        sender_id: &str,
        recipient_id: &str,
        sender_account_id: &str,
        amount: f64,
    ) -> Result<TransferOutcome, OrchestratorError> {
        validate_amount(amount)?;
        if sender_id == recipient_id {
            return Err(OrchestratorError::Invalid(
                "cannot transfer to yourself".to_string(),
            ));
        }

        let sender = self.store.users().get(sender_id)?;
        let recipient = self.store.users().get(recipient_id)?;

        let sender_account = self.store.accounts().get(sender_account_id)?;
        if sender_account.user_id != sender_id {
            return Err(OrchestratorError::NotFound(format!(
                "Account {sender_account_id} for user {sender_id}"
            )));
        }
        let pool_id = sender_account.pool_id.clone().ok_or_else(|| {
            OrchestratorError::Invalid("transfers require a yield account".to_string())
        })?;
        if sender_account.balance < amount {
            return Err(OrchestratorError::InsufficientFunds {
                available: sender_account.balance,
                requested: amount,
            });
        }

        // The recipient holds their claim against their own wallet, so make
        // sure one exists before any balance moves.
        let recipient_wallet = self.provisioner.ensure_wallet(recipient_id).await?;

        let (recipient_account, account_created) =
            match self.store.accounts().find_pool_account(recipient_id, &pool_id)? {
                Some(account) => (account, false),
                None => {
                    let pool = pools::pool_by_id(&pool_id).ok_or_else(|| {
                        OrchestratorError::NotFound(format!("Pool {pool_id}"))
                    })?;
                    let account = Account {
                        id: Uuid::new_v4().to_string(),
                        user_id: recipient_id.to_string(),
                        name: pool.name.to_string(),
                        account_number: String::new(),
                        balance: 0.0,
                        applied_transfers: Vec::new(),
                        kind: AccountKind::Savings,
                        apy: pool.apy,
                        pool_id: Some(pool.id.to_string()),
                        protocol: Some(pool.protocol.to_string()),
                        chain: Some(pool.chain.to_string()),
                        wallet_address: Some(recipient_wallet),
                        created_at: Utc::now(),
                        last_updated: None,
                    };
                    self.store.accounts().create(&account)?;
                    (account, true)
                }
            };

        let reference = transfer_reference();
        let now = Utc::now();
        let record = TransferRecord {
            id: Uuid::new_v4().to_string(),
            reference: reference.clone(),
            kind: TransferKind::YieldAccountTransfer,
            stage: TransferStage::Initiated,
            sender_id: sender_id.to_string(),
            sender_name: sender.full_name(),
            sender_account_id: sender_account_id.to_string(),
            recipient_id: recipient_id.to_string(),
            recipient_name: recipient.full_name(),
            recipient_account_id: recipient_account.id.clone(),
            amount_sent: amount,
            amount_received: amount,
            currency_sent: sender.currency.clone(),
            currency_received: sender.currency,
            exchange_rate: 1.0,
            fee: 0.0,
            pool_id: Some(pool_id),
            account_created,
            created_at: now,
            updated_at: now,
        };

        let _guard = self.store.balance_guard().await;

        // Re-check under the guard: a concurrent transfer may have drained
        // the account between the precondition and here.
        let current = self.store.accounts().get(sender_account_id)?.balance;
        if current < amount {
            return Err(OrchestratorError::InsufficientFunds {
                available: current,
                requested: amount,
            });
        }

        self.store.transfers().create(&record)?;
        self.store
            .accounts()
            .apply_once(sender_account_id, &record.id, -amount)?;
        self.store
            .transfers()
            .advance_stage(&record.id, TransferStage::Debited)?;
        self.store
            .accounts()
            .apply_once(&recipient_account.id, &record.id, amount)?;
        self.store
            .transfers()
            .advance_stage(&record.id, TransferStage::Completed)?;

        info!(
            %reference,
            sender_id,
            recipient_id,
            amount,
            account_created,
            "completed internal transfer"
        );

        Ok(TransferOutcome {
            reference,
            recipient_account_id: recipient_account.id,
            account_created,
        })
    }

    /// Repair transfers interrupted mid-flight.
    ///
    /// Balance effects are recorded per transfer id on the account document
    /// itself, so replaying a move here is idempotent. A record at `Debited`
    /// gets the recipient credit applied (unless it already landed) and
    /// completes. A record at `Initiated` completes the same way when the
    /// sender debit already landed, and is marked `Failed` when it never
    /// did. Returns the number of records moved to `Completed`.
    pub async fn sweep_incomplete(&self) -> Result<usize, OrchestratorError> {
        let incomplete = self.store.transfers().list_incomplete()?;
        if incomplete.is_empty() {
            return Ok(0);
        }

        let _guard = self.store.balance_guard().await;
        let mut repaired = 0;
        for record in incomplete {
            match record.stage {
                TransferStage::Initiated => {
                    let debited = self
                        .store
                        .accounts()
                        .get(&record.sender_account_id)?
                        .applied_transfers
                        .contains(&record.id);
                    if debited {
                        self.store
                            .transfers()
                            .advance_stage(&record.id, TransferStage::Debited)?;
                        self.complete(&record)?;
                        repaired += 1;
                    } else {
                        warn!(record_id = %record.id, reference = %record.reference,
                            "abandoning transfer that never debited");
                        self.store
                            .transfers()
                            .advance_stage(&record.id, TransferStage::Failed)?;
                    }
                }
                TransferStage::Debited => {
                    self.complete(&record)?;
                    repaired += 1;
                }
                TransferStage::Completed | TransferStage::Failed => {}
            }
        }
        Ok(repaired)
    }

    /// Credit the recipient (at most once) and mark the record completed.
    fn complete(&self, record: &TransferRecord) -> Result<(), OrchestratorError> {
        let applied = self.store.accounts().apply_once(
            &record.recipient_account_id,
            &record.id,
            record.amount_received,
        )?;
        if applied {
            warn!(record_id = %record.id, reference = %record.reference,
                amount = record.amount_received,
                recipient_account = %record.recipient_account_id,
                "re-applied missing credit for interrupted transfer");
        }
        self.store
            .transfers()
            .advance_stage(&record.id, TransferStage::Completed)?;
        Ok(())
    }
}

/// Synthetic reference for off-chain moves, in the product's `YT…` format.
fn transfer_reference() -> String {
    format!("YT{}", Uuid::new_v4().simple().to_string().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::KeyCipher;
    use crate::storage::repository::User;

    const TEST_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn setup() -> (tempfile::TempDir, Arc<LedgerStore>, TransferOrchestrator) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(LedgerStore::open(dir.path()).expect("open"));
        let provisioner = Arc::new(WalletProvisioner::new(
            store.clone(),
            KeyCipher::from_hex(TEST_KEY).expect("cipher"),
        ));
        let orchestrator = TransferOrchestrator::new(store.clone(), provisioner);
        (dir, store, orchestrator)
    }

    fn seed_user(store: &LedgerStore, id: &str) {
        store
            .users()
            .create(&User {
                id: id.to_string(),
                phone_number: format!("+1555000{id}"),
                first_name: "User".to_string(),
                last_name: id.to_uppercase(),
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

    fn seed_yield_account(store: &LedgerStore, id: &str, user_id: &str, balance: f64) {
        store
            .accounts()
            .create(&Account {
                id: id.to_string(),
                user_id: user_id.to_string(),
                name: "Balanced".to_string(),
                account_number: String::new(),
                balance,
                applied_transfers: Vec::new(),
                kind: AccountKind::Savings,
                apy: 7.2,
                pool_id: Some("aave-base-balanced".to_string()),
                protocol: Some("Aave V3".to_string()),
                chain: Some("Base".to_string()),
                wallet_address: Some("0xabc".to_string()),
                created_at: Utc::now(),
                last_updated: None,
            })
            .expect("seed account");
    }

    #[tokio::test]
    async fn transfer_moves_value_and_conserves_total() {
        let (_dir, store, orchestrator) = setup();
        seed_user(&store, "u1");
        seed_user(&store, "u2");
        seed_yield_account(&store, "a1", "u1", 100.0);

        let outcome = orchestrator.transfer("u1", "u2", "a1", 30.0).await.unwrap();
        assert!(outcome.account_created);
        assert!(outcome.reference.starts_with("YT"));

        let sender = store.accounts().get("a1").unwrap();
        let recipient = store.accounts().get(&outcome.recipient_account_id).unwrap();
        assert_eq!(sender.balance, 70.0);
        assert_eq!(recipient.balance, 30.0);
        assert_eq!(sender.balance + recipient.balance, 100.0);

        // Recipient got a custodial wallet along the way.
        let recipient_user = store.users().get("u2").unwrap();
        assert!(recipient_user.wallet_address.is_some());

        // The audit record completed.
        let records = store.transfers().list_by_user("u1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stage, TransferStage::Completed);
    }

    #[tokio::test]
    async fn second_transfer_reuses_recipient_account() {
        let (_dir, store, orchestrator) = setup();
        seed_user(&store, "u1");
        seed_user(&store, "u2");
        seed_yield_account(&store, "a1", "u1", 100.0);

        let first = orchestrator.transfer("u1", "u2", "a1", 10.0).await.unwrap();
        let second = orchestrator.transfer("u1", "u2", "a1", 10.0).await.unwrap();
        assert!(first.account_created);
        assert!(!second.account_created);
        assert_eq!(first.recipient_account_id, second.recipient_account_id);

        let recipient = store.accounts().get(&second.recipient_account_id).unwrap();
        assert_eq!(recipient.balance, 20.0);
    }

    #[tokio::test]
    async fn insufficient_funds_leaves_balances_untouched() {
        let (_dir, store, orchestrator) = setup();
        seed_user(&store, "u1");
        seed_user(&store, "u2");
        seed_yield_account(&store, "a1", "u1", 20.0);

        let result = orchestrator.transfer("u1", "u2", "a1", 20.01).await;
        assert!(matches!(
            result,
            Err(OrchestratorError::InsufficientFunds {
                available,
                requested,
            }) if available == 20.0 && requested == 20.01
        ));

        assert_eq!(store.accounts().get("a1").unwrap().balance, 20.0);
        assert!(store.transfers().list_by_user("u1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn self_transfer_rejected() {
        let (_dir, store, orchestrator) = setup();
        seed_user(&store, "u1");
        seed_yield_account(&store, "a1", "u1", 20.0);
        let result = orchestrator.transfer("u1", "u1", "a1", 5.0).await;
        assert!(matches!(result, Err(OrchestratorError::Invalid(_))));
    }

    #[tokio::test]
    async fn foreign_account_rejected() {
        let (_dir, store, orchestrator) = setup();
        seed_user(&store, "u1");
        seed_user(&store, "u2");
        seed_yield_account(&store, "a1", "u1", 20.0);
        // u2 tries to spend u1's account.
        let result = orchestrator.transfer("u2", "u1", "a1", 5.0).await;
        assert!(matches!(result, Err(OrchestratorError::NotFound(_))));
    }

    /// A 25.0 record from u1/a1 to u2/a2, staged as `Initiated`.
    fn staged_record(id: &str, reference: &str) -> TransferRecord {
        let now = Utc::now();
        TransferRecord {
            id: id.to_string(),
            reference: reference.to_string(),
            kind: TransferKind::YieldAccountTransfer,
            stage: TransferStage::Initiated,
            sender_id: "u1".to_string(),
            sender_name: "User U1".to_string(),
            sender_account_id: "a1".to_string(),
            recipient_id: "u2".to_string(),
            recipient_name: "User U2".to_string(),
            recipient_account_id: "a2".to_string(),
            amount_sent: 25.0,
            amount_received: 25.0,
            currency_sent: "USD".to_string(),
            currency_received: "USD".to_string(),
            exchange_rate: 1.0,
            fee: 0.0,
            pool_id: Some("aave-base-balanced".to_string()),
            account_created: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn sweep_completes_debited_and_fails_initiated() {
        let (_dir, store, orchestrator) = setup();
        seed_user(&store, "u1");
        seed_user(&store, "u2");
        seed_yield_account(&store, "a1", "u1", 100.0);
        seed_yield_account(&store, "a2", "u2", 0.0);

        // Crash scenario A: record written, debit never happened.
        store.transfers().create(&staged_record("r1", "YTAAA")).unwrap();

        // Crash scenario B: sender debited, credit lost.
        store.transfers().create(&staged_record("r2", "YTBBB")).unwrap();
        store.accounts().apply_once("a1", "r2", -25.0).unwrap();
        store
            .transfers()
            .advance_stage("r2", TransferStage::Debited)
            .unwrap();

        let repaired = orchestrator.sweep_incomplete().await.unwrap();
        assert_eq!(repaired, 1);

        assert_eq!(
            store.transfers().get("r1").unwrap().stage,
            TransferStage::Failed
        );
        assert_eq!(
            store.transfers().get("r2").unwrap().stage,
            TransferStage::Completed
        );
        // The lost credit was re-applied; total value is conserved again.
        assert_eq!(store.accounts().get("a1").unwrap().balance, 75.0);
        assert_eq!(store.accounts().get("a2").unwrap().balance, 25.0);

        // A second sweep finds nothing to do.
        assert_eq!(orchestrator.sweep_incomplete().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sweep_does_not_recredit_an_already_applied_credit() {
        let (_dir, store, orchestrator) = setup();
        seed_user(&store, "u1");
        seed_user(&store, "u2");
        seed_yield_account(&store, "a1", "u1", 100.0);
        seed_yield_account(&store, "a2", "u2", 50.0);

        // Crash after the recipient credit landed but before the record was
        // marked Completed: both balances already moved.
        store.transfers().create(&staged_record("r1", "YTCCC")).unwrap();
        store.accounts().apply_once("a1", "r1", -25.0).unwrap();
        store
            .transfers()
            .advance_stage("r1", TransferStage::Debited)
            .unwrap();
        store.accounts().apply_once("a2", "r1", 25.0).unwrap();

        let repaired = orchestrator.sweep_incomplete().await.unwrap();
        assert_eq!(repaired, 1);
        assert_eq!(
            store.transfers().get("r1").unwrap().stage,
            TransferStage::Completed
        );

        // The credit is not paid a second time; total value is conserved.
        let a1 = store.accounts().get("a1").unwrap().balance;
        let a2 = store.accounts().get("a2").unwrap().balance;
        assert_eq!(a1, 75.0);
        assert_eq!(a2, 75.0);
        assert_eq!(a1 + a2, 150.0);
    }

    #[tokio::test]
    async fn sweep_completes_initiated_record_whose_debit_landed() {
        let (_dir, store, orchestrator) = setup();
        seed_user(&store, "u1");
        seed_user(&store, "u2");
        seed_yield_account(&store, "a1", "u1", 100.0);
        seed_yield_account(&store, "a2", "u2", 0.0);

        // Crash between the sender debit and the Debited stage mark: the
        // record still reads Initiated but the money already left a1.
        store.transfers().create(&staged_record("r1", "YTDDD")).unwrap();
        store.accounts().apply_once("a1", "r1", -25.0).unwrap();

        let repaired = orchestrator.sweep_incomplete().await.unwrap();
        assert_eq!(repaired, 1);
        assert_eq!(
            store.transfers().get("r1").unwrap().stage,
            TransferStage::Completed
        );
        assert_eq!(store.accounts().get("a1").unwrap().balance, 75.0);
        assert_eq!(store.accounts().get("a2").unwrap().balance, 25.0);
    }
}
