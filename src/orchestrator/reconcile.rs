// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! On-chain position reconciliation.
//!
//! Yield-account ledger balances are a cached view of receipt-token
//! positions. Reconciliation walks the pool catalog, reads the wallet's
//! receipt balance per pool, and makes the ledger match: missing accounts
//! are created seeded with the on-chain value, existing ones are overwritten
//! (last write wins, the chain is the source of truth).

use std::future::Future;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::blockchain::{
    parse_address, units_to_decimal, ChainError, ChainGateway, STABLECOIN_DECIMALS,
};
use crate::pools::{self, YieldPool};
use crate::storage::repository::{Account, AccountKind};
use crate::storage::LedgerStore;

use super::OrchestratorError;

/// Source of receipt-token balances. Implemented by [`ChainGateway`]; tests
/// substitute a fixture.
pub trait ReceiptSource: Send + Sync {
    fn receipt_balance(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;
}

impl ReceiptSource for ChainGateway {
    fn receipt_balance(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send {
        self.token_balance(token, owner)
    }
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReconcileOutcome {
    /// Accounts created for previously untracked positions.
    pub created: usize,
    /// Accounts whose balance was overwritten with the on-chain value.
    pub updated: usize,
}

/// Syncs ledger yield accounts from on-chain receipt balances.
pub struct PositionReconciler<S: ReceiptSource> {
    store: Arc<LedgerStore>,
    source: Arc<S>,
}

impl<S: ReceiptSource> PositionReconciler<S> {
    pub fn new(store: Arc<LedgerStore>, source: Arc<S>) -> Self {
        Self { store, source }
    }

    /// Reconcile every catalog pool for one user. Idempotent: a second pass
    /// with no on-chain change updates the same accounts to the same values.
    pub async fn reconcile(&self, user_id: &str) -> Result<ReconcileOutcome, OrchestratorError> {
        let user = self.store.users().get(user_id)?;
        let Some(wallet_address) = user.wallet_address else {
            return Ok(ReconcileOutcome::default());
        };
        let wallet = parse_address(&wallet_address)?;

        let mut outcome = ReconcileOutcome::default();
        for pool in pools::POOLS {
            let Some(receipt_token) = pool.receipt_token else {
                continue;
            };
            let token = parse_address(receipt_token)?;
            let balance_units = self.source.receipt_balance(token, wallet).await?;
            let balance = units_to_decimal(balance_units, STABLECOIN_DECIMALS)?;

            if balance == 0.0 {
                continue;
            }

            match self.store.accounts().find_pool_account(user_id, pool.id)? {
                Some(account) => {
                    self.store.accounts().set_balance(&account.id, balance)?;
                    outcome.updated += 1;
                }
                None => {
                    self.create_position_account(user_id, pool, &wallet_address, balance)?;
                    outcome.created += 1;
                }
            }
        }

        info!(
            user_id,
            created = outcome.created,
            updated = outcome.updated,
            "reconciled on-chain positions"
        );
        Ok(outcome)
    }

    fn create_position_account(
        &self,
        user_id: &str,
        pool: &YieldPool,
        wallet_address: &str,
        balance: f64,
    ) -> Result<(), OrchestratorError> {
        let account = Account {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: pool.name.to_string(),
            account_number: String::new(),
            balance,
            applied_transfers: Vec::new(),
            kind: AccountKind::Savings,
            apy: pool.apy,
            pool_id: Some(pool.id.to_string()),
            protocol: Some(pool.protocol.to_string()),
            chain: Some(pool.chain.to_string()),
            wallet_address: Some(wallet_address.to_string()),
            created_at: Utc::now(),
            last_updated: Some(Utc::now()),
        };
        self.store.accounts().create(&account)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;

    use crate::storage::repository::User;

    /// Fixture returning canned balances keyed by receipt-token address.
    struct FixedBalances {
        balances: Mutex<HashMap<Address, U256>>,
    }

    impl FixedBalances {
        fn new() -> Self {
            Self {
                balances: Mutex::new(HashMap::new()),
            }
        }

        fn set(&self, token: &str, units: u64) {
            self.balances
                .lock()
                .unwrap()
                .insert(parse_address(token).unwrap(), U256::from(units));
        }
    }

    impl ReceiptSource for FixedBalances {
        fn receipt_balance(
            &self,
            token: Address,
            _owner: Address,
        ) -> impl std::future::Future<Output = Result<U256, ChainError>> + Send {
            let balance = self
                .balances
                .lock()
                .unwrap()
                .get(&token)
                .copied()
                .unwrap_or(U256::ZERO);
            async move { Ok(balance) }
        }
    }

    const AUSDC: &str = "0xf53B60F4006cab2b3C4688ce41fD5362427A2A66";

    fn setup() -> (
        tempfile::TempDir,
        Arc<LedgerStore>,
        Arc<FixedBalances>,
        PositionReconciler<FixedBalances>,
    ) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(LedgerStore::open(dir.path()).expect("open"));
        let source = Arc::new(FixedBalances::new());
        let reconciler = PositionReconciler::new(store.clone(), source.clone());
        (dir, store, source, reconciler)
    }

    fn seed_user(store: &LedgerStore, id: &str, wallet: Option<&str>) {
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
                wallet_address: wallet.map(String::from),
                encrypted_private_key: wallet.map(|_| "sealed".to_string()),
                wallet_created_at: None,
                created_at: Utc::now(),
            })
            .expect("seed user");
    }

    const WALLET: &str = "0x07eA79F68B2B3df564D0A34F8e19D9B1e339814b";

    #[tokio::test]
    async fn creates_account_for_untracked_position() {
        let (_dir, store, source, reconciler) = setup();
        seed_user(&store, "u1", Some(WALLET));
        source.set(AUSDC, 40_000_000); // 40.0

        let outcome = reconciler.reconcile("u1").await.unwrap();
        assert_eq!(outcome, ReconcileOutcome { created: 1, updated: 0 });

        let account = store
            .accounts()
            .find_pool_account("u1", "aave-base-balanced")
            .unwrap()
            .unwrap();
        assert_eq!(account.balance, 40.0);
        assert_eq!(account.apy, 7.2);
    }

    #[tokio::test]
    async fn repeat_pass_is_idempotent() {
        let (_dir, store, source, reconciler) = setup();
        seed_user(&store, "u1", Some(WALLET));
        source.set(AUSDC, 40_000_000);

        reconciler.reconcile("u1").await.unwrap();
        let second = reconciler.reconcile("u1").await.unwrap();
        assert_eq!(second, ReconcileOutcome { created: 0, updated: 1 });

        // Still exactly one account for the pool, with the same balance.
        let accounts = store.accounts().list_by_user("u1").unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, 40.0);
    }

    #[tokio::test]
    async fn on_chain_value_overwrites_drifted_ledger() {
        let (_dir, store, source, reconciler) = setup();
        seed_user(&store, "u1", Some(WALLET));
        source.set(AUSDC, 40_000_000);
        reconciler.reconcile("u1").await.unwrap();

        // Interest accrued on-chain.
        source.set(AUSDC, 41_500_000);
        let outcome = reconciler.reconcile("u1").await.unwrap();
        assert_eq!(outcome.updated, 1);

        let account = store
            .accounts()
            .find_pool_account("u1", "aave-base-balanced")
            .unwrap()
            .unwrap();
        assert_eq!(account.balance, 41.5);
    }

    #[tokio::test]
    async fn user_without_wallet_is_a_no_op() {
        let (_dir, store, _source, reconciler) = setup();
        seed_user(&store, "u1", None);
        let outcome = reconciler.reconcile("u1").await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::default());
    }

    #[tokio::test]
    async fn zero_balance_creates_nothing() {
        let (_dir, store, _source, reconciler) = setup();
        seed_user(&store, "u1", Some(WALLET));
        let outcome = reconciler.reconcile("u1").await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::default());
        assert!(store.accounts().list_by_user("u1").unwrap().is_empty());
    }
}
