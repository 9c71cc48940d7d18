// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Static catalog of supported yield pools.
//!
//! The catalog is compiled in. Pool addresses point at the lending-protocol
//! contract the deposit flow supplies into; the receipt token, where one is
//! tracked, is the interest-bearing token the reconciler reads balances of.

use serde::Serialize;
use utoipa::ToSchema;

/// A yield pool the product can route deposits into.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YieldPool {
    pub id: &'static str,
    pub name: &'static str,
    pub protocol: &'static str,
    pub chain: &'static str,
    /// Advertised APY in percent.
    pub apy: f64,
    /// Relative risk bucket shown in the product.
    pub risk: &'static str,
    /// Smallest deposit the pool accepts, in stablecoin units.
    pub min_deposit: f64,
    /// Lending-pool contract deposits are supplied to.
    pub pool_address: &'static str,
    /// Interest-bearing receipt token, where the protocol issues one we track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_token: Option<&'static str>,
}

/// All pools, in display order (conservative first).
pub const POOLS: &[YieldPool] = &[
    YieldPool {
        id: "aave-eth-conservative",
        name: "Conservative",
        protocol: "Aave V3",
        chain: "Ethereum",
        apy: 3.5,
        risk: "low",
        min_deposit: 100.0,
        pool_address: "0x87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2",
        receipt_token: None,
    },
    YieldPool {
        id: "aave-base-balanced",
        name: "Balanced",
        protocol: "Aave V3",
        chain: "Base",
        apy: 7.2,
        risk: "low",
        min_deposit: 50.0,
        pool_address: "0xA238Dd80C259a72e81d7e4664a9801593F98d1c5",
        receipt_token: Some("0xf53B60F4006cab2b3C4688ce41fD5362427A2A66"),
    },
    YieldPool {
        id: "morpho-aggressive",
        name: "Aggressive",
        protocol: "Morpho Blue",
        chain: "Ethereum",
        apy: 9.8,
        risk: "medium",
        min_deposit: 500.0,
        pool_address: "0xBBBBBbbBBb9cC5e90e3b3Af64bdAF62C37EEFFCb",
        receipt_token: None,
    },
];

/// Look up a pool by id.
pub fn pool_by_id(pool_id: &str) -> Option<&'static YieldPool> {
    POOLS.iter().find(|pool| pool.id == pool_id)
}
