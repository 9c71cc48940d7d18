// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! YieldWay server: custodial wallet and yield-account orchestration.
//!
//! Users hold a non-yield-bearing waiting-room balance in an off-chain
//! ledger and move funds into lending-pool positions through per-user
//! custodial EVM wallets. On-chain custody is the source of truth for
//! yield-account balances; the ledger caches them and is repaired by
//! reconciliation.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod custody;
pub mod error;
pub mod orchestrator;
pub mod pools;
pub mod providers;
pub mod state;
pub mod storage;
