// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! HTTP API surface.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

pub mod accounts;
pub mod deposits;
pub mod health;
pub mod pools;
pub mod transfers;
pub mod users;
pub mod wallet;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/users", post(users::register_user))
        .route("/users/lookup", get(users::lookup_user))
        .route("/users/{user_id}", get(users::get_user))
        .route(
            "/users/{user_id}/accounts",
            get(accounts::list_accounts).post(accounts::open_account),
        )
        .route(
            "/users/{user_id}/waiting-room/top-up",
            post(accounts::top_up_waiting_room),
        )
        .route(
            "/users/{user_id}/wallet",
            get(wallet::get_wallet).post(wallet::ensure_wallet),
        )
        .route("/wallet/fund", post(wallet::fund_wallet))
        .route("/users/{user_id}/deposits", post(deposits::deposit))
        .route("/users/{user_id}/withdrawals", post(deposits::withdraw))
        .route("/users/{user_id}/reconcile", post(deposits::reconcile))
        .route("/transfers", post(transfers::transfer))
        .route("/transfers/international", post(transfers::international))
        .route("/transfers/sweep", post(transfers::sweep))
        .route(
            "/users/{user_id}/transactions",
            get(transfers::list_transactions),
        )
        .route("/pools", get(pools::list_pools))
        .route("/pools/{pool_id}", get(pools::get_pool))
        .with_state(state);

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::register_user,
        users::get_user,
        users::lookup_user,
        accounts::list_accounts,
        accounts::open_account,
        accounts::top_up_waiting_room,
        wallet::ensure_wallet,
        wallet::get_wallet,
        wallet::fund_wallet,
        deposits::deposit,
        deposits::withdraw,
        deposits::reconcile,
        transfers::transfer,
        transfers::international,
        transfers::list_transactions,
        transfers::sweep,
        pools::list_pools,
        pools::get_pool
    ),
    components(
        schemas(
            health::HealthResponse,
            users::RegisterUserRequest,
            users::UserResponse,
            accounts::AccountListResponse,
            accounts::OpenAccountRequest,
            accounts::TopUpRequest,
            wallet::WalletResponse,
            wallet::FundWalletRequest,
            wallet::FundWalletResponse,
            deposits::PoolMoveRequest,
            deposits::PoolMoveResponse,
            transfers::TransferRequest,
            transfers::TransferResponse,
            transfers::InternationalRequest,
            transfers::InternationalResponse,
            transfers::TransactionListResponse,
            transfers::SweepResponse,
            crate::orchestrator::ReconcileOutcome,
            crate::pools::YieldPool,
            crate::storage::repository::Account,
            crate::storage::repository::AccountKind,
            crate::storage::repository::TransferRecord,
            crate::storage::repository::TransferKind,
            crate::storage::repository::TransferStage
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Users", description = "Registration and lookup"),
        (name = "Accounts", description = "Waiting-room and yield accounts"),
        (name = "Wallet", description = "Custodial wallet management"),
        (name = "Deposits", description = "Pool deposits, withdrawals, reconciliation"),
        (name = "Transfers", description = "Internal and international transfers"),
        (name = "Pools", description = "Yield-pool catalog")
    )
)]
struct ApiDoc;

/// Test fixture: full application state over a temp-dir ledger and a dummy
/// RPC endpoint (tests never submit transactions).
#[cfg(test)]
pub(crate) fn test_state() -> (tempfile::TempDir, AppState) {
    use std::time::Duration;

    use crate::config::Config;

    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config {
        data_dir: dir.path().to_path_buf(),
        host: "127.0.0.1".to_string(),
        port: 0,
        rpc_url: "http://localhost:8545".parse().expect("url"),
        stablecoin_address: "0x036CbD53842c5426634e7929541eC2318f3dCF7e".to_string(),
        master_wallet_key: "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
            .to_string(),
        wallet_encryption_key:
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f".to_string(),
        confirmation_timeout: Duration::from_secs(5),
        settlement_delay: Duration::ZERO,
    };
    let state = AppState::from_config(config).expect("state");
    (dir, state)
}
