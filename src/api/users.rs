// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! User registration and lookup endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::repository::User;

/// Request to register a new user.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub currency: String,
    pub currency_symbol: String,
}

/// Public view of a user. The encrypted custodial key never leaves storage.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub currency: String,
    pub currency_symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_created_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            country: user.country,
            currency: user.currency,
            currency_symbol: user.currency_symbol,
            wallet_address: user.wallet_address,
            wallet_created_at: user.wallet_created_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PhoneLookupQuery {
    pub phone: String,
}

/// Register a user and create their waiting-room account.
#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "Users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Phone number already registered")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let (user, _waiting_room) = state.accounts().register_user(
        &request.phone_number,
        &request.first_name,
        &request.last_name,
        &request.country,
        &request.currency,
        &request.currency_symbol,
    )?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Get a user by id.
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}",
    tag = "Users",
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.store.users().get(&user_id)?;
    Ok(Json(user.into()))
}

/// Look up a user by phone number.
#[utoipa::path(
    get,
    path = "/v1/users/lookup",
    tag = "Users",
    params(
        ("phone" = String, Query, description = "E.164 phone number")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "No user with that phone number")
    )
)]
pub async fn lookup_user(
    Query(query): Query<PhoneLookupQuery>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .users()
        .find_by_phone(&query.phone)?
        .ok_or_else(|| ApiError::not_found(format!("No user with phone {}", query.phone)))?;
    Ok(Json(user.into()))
}
