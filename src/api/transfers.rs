// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Internal and international transfer endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::repository::TransferRecord;

/// Request to move yield-account value to another user.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub sender_id: String,
    pub recipient_id: String,
    pub sender_account_id: String,
    pub amount: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub reference: String,
    pub recipient_account_id: String,
    pub account_created: bool,
}

/// Request for a cross-border waiting-room transfer.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternationalRequest {
    pub sender_id: String,
    pub recipient_id: String,
    /// Amount in the sender's currency.
    pub amount: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternationalResponse {
    pub reference: String,
    pub amount_sent: f64,
    pub amount_received: f64,
    pub exchange_rate: f64,
    pub fee: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransferRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SweepResponse {
    /// Interrupted transfers whose missing credit was re-applied.
    pub repaired: usize,
}

/// Move yield-account value to another user within the same pool.
#[utoipa::path(
    post,
    path = "/v1/transfers",
    tag = "Transfers",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer completed", body = TransferResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "User or account not found"),
        (status = 422, description = "Insufficient funds")
    )
)]
pub async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let outcome = state
        .transfers()
        .transfer(
            &request.sender_id,
            &request.recipient_id,
            &request.sender_account_id,
            request.amount,
        )
        .await?;
    Ok(Json(TransferResponse {
        reference: outcome.reference,
        recipient_account_id: outcome.recipient_account_id,
        account_created: outcome.account_created,
    }))
}

/// Send a cross-border payment between waiting rooms.
#[utoipa::path(
    post,
    path = "/v1/transfers/international",
    tag = "Transfers",
    request_body = InternationalRequest,
    responses(
        (status = 200, description = "Payment settled", body = InternationalResponse),
        (status = 404, description = "User or waiting room not found"),
        (status = 422, description = "Insufficient funds or unsupported corridor")
    )
)]
pub async fn international(
    State(state): State<AppState>,
    Json(request): Json<InternationalRequest>,
) -> Result<Json<InternationalResponse>, ApiError> {
    let outcome = state
        .international()
        .send_international(&request.sender_id, &request.recipient_id, request.amount)
        .await?;
    Ok(Json(InternationalResponse {
        reference: outcome.reference,
        amount_sent: outcome.amount_sent,
        amount_received: outcome.amount_received,
        exchange_rate: outcome.exchange_rate,
        fee: outcome.fee,
    }))
}

/// List a user's transfer history (sent and received), newest first.
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/transactions",
    tag = "Transfers",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "Transfer records", body = TransactionListResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_transactions(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    if !state.store.users().exists(&user_id) {
        return Err(ApiError::not_found(format!("User {user_id} not found")));
    }
    let transactions = state.store.transfers().list_by_user(&user_id)?;
    let total = transactions.len();
    Ok(Json(TransactionListResponse { transactions, total }))
}

/// Repair transfers interrupted mid-flight (operator endpoint).
#[utoipa::path(
    post,
    path = "/v1/transfers/sweep",
    tag = "Transfers",
    responses(
        (status = 200, description = "Sweep outcome", body = SweepResponse)
    )
)]
pub async fn sweep(State(state): State<AppState>) -> Result<Json<SweepResponse>, ApiError> {
    let repaired = state.transfers().sweep_incomplete().await?;
    Ok(Json(SweepResponse { repaired }))
}
