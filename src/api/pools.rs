// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Yield-pool catalog endpoints.

use axum::{extract::Path, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::pools::{self, YieldPool};

#[derive(Debug, Serialize, ToSchema)]
pub struct PoolListResponse {
    pub pools: Vec<YieldPool>,
    pub total: usize,
}

/// List the yield-pool catalog.
#[utoipa::path(
    get,
    path = "/v1/pools",
    tag = "Pools",
    responses(
        (status = 200, description = "Pool catalog", body = PoolListResponse)
    )
)]
pub async fn list_pools() -> Json<PoolListResponse> {
    let pools: Vec<YieldPool> = pools::POOLS.to_vec();
    let total = pools.len();
    Json(PoolListResponse { pools, total })
}

/// Get a single pool by id.
#[utoipa::path(
    get,
    path = "/v1/pools/{pool_id}",
    tag = "Pools",
    params(
        ("pool_id" = String, Path, description = "Pool identifier")
    ),
    responses(
        (status = 200, description = "Pool descriptor", body = YieldPool),
        (status = 404, description = "Unknown pool")
    )
)]
pub async fn get_pool(Path(pool_id): Path<String>) -> Result<Json<YieldPool>, ApiError> {
    pools::pool_by_id(&pool_id)
        .copied()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Pool {pool_id} not found")))
}
