// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Custodial wallet endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub wallet_address: String,
}

/// Request to fund a custodial wallet from the master wallet.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FundWalletRequest {
    pub wallet_address: String,
    /// Decimal stablecoin amount.
    pub amount: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FundWalletResponse {
    pub tx_hash: String,
}

/// Ensure the user has a custodial wallet. Idempotent: returns the existing
/// address if one was already provisioned.
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/wallet",
    tag = "Wallet",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "Wallet address", body = WalletResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn ensure_wallet(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WalletResponse>, ApiError> {
    let wallet_address = state.provisioner.ensure_wallet(&user_id).await?;
    Ok(Json(WalletResponse { wallet_address }))
}

/// Get the user's wallet address.
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/wallet",
    tag = "Wallet",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "Wallet address", body = WalletResponse),
        (status = 404, description = "User or wallet not found")
    )
)]
pub async fn get_wallet(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WalletResponse>, ApiError> {
    let wallet_address = state
        .provisioner
        .wallet_address(&user_id)?
        .ok_or_else(|| ApiError::not_found(format!("Wallet for user {user_id} not found")))?;
    Ok(Json(WalletResponse { wallet_address }))
}

/// Send stablecoin from the master wallet to a custodial wallet. Blocks
/// until the transfer confirms.
#[utoipa::path(
    post,
    path = "/v1/wallet/fund",
    tag = "Wallet",
    request_body = FundWalletRequest,
    responses(
        (status = 200, description = "Transfer confirmed", body = FundWalletResponse),
        (status = 400, description = "Invalid address or amount"),
        (status = 502, description = "Transfer reverted or RPC failure"),
        (status = 504, description = "Transfer unconfirmed within the timeout")
    )
)]
pub async fn fund_wallet(
    State(state): State<AppState>,
    Json(request): Json<FundWalletRequest>,
) -> Result<Json<FundWalletResponse>, ApiError> {
    let tx_hash = state
        .funding()
        .fund_wallet(&request.wallet_address, request.amount)
        .await?;
    Ok(Json(FundWalletResponse { tx_hash }))
}
