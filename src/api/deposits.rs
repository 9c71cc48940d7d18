// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Pool deposit, withdrawal, and reconciliation endpoints.
//!
//! These are the chain-coupled flows: each call blocks until the underlying
//! transactions confirm (or the confirmation timeout maps to 504).

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::orchestrator::ReconcileOutcome;
use crate::state::AppState;

/// Request to deposit into or withdraw from a pool.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolMoveRequest {
    pub pool_id: String,
    /// Decimal stablecoin amount.
    pub amount: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolMoveResponse {
    pub tx_hash: String,
}

/// Supply stablecoin from the user's custodial wallet into a pool.
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/deposits",
    tag = "Deposits",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    request_body = PoolMoveRequest,
    responses(
        (status = 200, description = "Supply confirmed", body = PoolMoveResponse),
        (status = 400, description = "Invalid amount or below the pool minimum"),
        (status = 404, description = "User or pool not found"),
        (status = 422, description = "Insufficient on-chain balance"),
        (status = 502, description = "Transaction reverted or RPC failure"),
        (status = 504, description = "Transaction unconfirmed within the timeout")
    )
)]
pub async fn deposit(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<PoolMoveRequest>,
) -> Result<Json<PoolMoveResponse>, ApiError> {
    let tx_hash = state
        .deposits()
        .deposit_to_pool(&user_id, &request.pool_id, request.amount)
        .await?;
    Ok(Json(PoolMoveResponse { tx_hash }))
}

/// Withdraw stablecoin from a pool back to the user's custodial wallet.
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/withdrawals",
    tag = "Deposits",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    request_body = PoolMoveRequest,
    responses(
        (status = 200, description = "Withdrawal confirmed", body = PoolMoveResponse),
        (status = 404, description = "User, wallet, or pool not found"),
        (status = 422, description = "Insufficient receipt-token balance"),
        (status = 502, description = "Transaction reverted or RPC failure"),
        (status = 504, description = "Transaction unconfirmed within the timeout")
    )
)]
pub async fn withdraw(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<PoolMoveRequest>,
) -> Result<Json<PoolMoveResponse>, ApiError> {
    let tx_hash = state
        .deposits()
        .withdraw_from_pool(&user_id, &request.pool_id, request.amount)
        .await?;
    Ok(Json(PoolMoveResponse { tx_hash }))
}

/// Sync ledger yield accounts from on-chain receipt balances.
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/reconcile",
    tag = "Deposits",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "Reconciliation outcome", body = ReconcileOutcome),
        (status = 404, description = "User not found")
    )
)]
pub async fn reconcile(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ReconcileOutcome>, ApiError> {
    let outcome = state.reconciler().reconcile(&user_id).await?;
    Ok(Json(outcome))
}
