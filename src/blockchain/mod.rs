// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Blockchain integration for the EVM chain holding custodial funds.
//!
//! This module provides:
//! - ERC-20 balance/allowance queries (stablecoin and pool receipt tokens)
//! - Confirmation-blocking approve / supply / withdraw / transfer submission
//! - Fixed-point conversions between ledger decimals and token units

pub mod client;
pub mod contracts;
pub mod units;

pub use client::{parse_address, ChainError, ChainGateway};
pub use units::{decimal_to_units, format_units, units_to_decimal, STABLECOIN_DECIMALS};
