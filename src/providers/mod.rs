// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! External payment-rail providers.

pub mod settlement;

pub use settlement::{round_cents, FxSettlement, SettlementError, SettlementQuote};
