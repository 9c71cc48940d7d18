// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Account listing, opening, and the dev waiting-room top-up.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::repository::Account;

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountListResponse {
    pub accounts: Vec<Account>,
    pub total: usize,
}

/// Request to open a yield account.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenAccountRequest {
    pub pool_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Request to top up a waiting room (development only).
#[derive(Debug, Deserialize, ToSchema)]
pub struct TopUpRequest {
    pub amount: f64,
}

/// List all accounts owned by a user.
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/accounts",
    tag = "Accounts",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "Accounts owned by the user", body = AccountListResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_accounts(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AccountListResponse>, ApiError> {
    if !state.store.users().exists(&user_id) {
        return Err(ApiError::not_found(format!("User {user_id} not found")));
    }
    let accounts = state.store.accounts().list_by_user(&user_id)?;
    let total = accounts.len();
    Ok(Json(AccountListResponse { accounts, total }))
}

/// Open a yield account for a catalog pool.
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/accounts",
    tag = "Accounts",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    request_body = OpenAccountRequest,
    responses(
        (status = 201, description = "Account opened", body = Account),
        (status = 404, description = "User or pool not found"),
        (status = 409, description = "Account for this pool already exists")
    )
)]
pub async fn open_account(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    if !state.store.users().exists(&user_id) {
        return Err(ApiError::not_found(format!("User {user_id} not found")));
    }
    let account = state
        .accounts()
        .open_yield_account(&user_id, &request.pool_id, request.name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Credit a user's waiting room directly. Development helper, not a
/// production money movement.
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/waiting-room/top-up",
    tag = "Accounts",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    request_body = TopUpRequest,
    responses(
        (status = 200, description = "Waiting room credited", body = Account),
        (status = 404, description = "User or waiting room not found")
    )
)]
pub async fn top_up_waiting_room(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<TopUpRequest>,
) -> Result<Json<Account>, ApiError> {
    let account = state
        .accounts()
        .top_up_waiting_room(&user_id, request.amount)
        .await?;
    Ok(Json(account))
}
