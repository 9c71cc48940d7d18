// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Fixed-point conversions between ledger decimal amounts and token units.
//!
//! The stablecoin and every receipt token in this system carry 6 decimals.
//! Conversions from decimal values to token units always truncate excess
//! precision - rounding up would credit value that does not exist on-chain.

use alloy::primitives::U256;

use super::ChainError;

/// Decimal count of the stablecoin and its receipt tokens.
pub const STABLECOIN_DECIMALS: u8 = 6;

/// Convert a ledger decimal amount into token units, truncating.
pub fn decimal_to_units(amount: f64, decimals: u8) -> Result<U256, ChainError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ChainError::InvalidAmount(format!(
            "amount must be a non-negative number, got {amount}"
        )));
    }
    let scale = 10u128.pow(decimals as u32) as f64;
    let scaled = (amount * scale).floor();
    if scaled > u128::MAX as f64 {
        return Err(ChainError::InvalidAmount(format!(
            "amount overflow: {amount}"
        )));
    }
    Ok(U256::from(scaled as u128))
}

/// Convert token units into a ledger decimal amount.
pub fn units_to_decimal(units: U256, decimals: u8) -> Result<f64, ChainError> {
    let raw = u128::try_from(units)
        .map_err(|_| ChainError::InvalidAmount("token balance exceeds u128".to_string()))?;
    Ok(raw as f64 / 10u128.pow(decimals as u32) as f64)
}

/// Format token units as a human-readable decimal string.
pub fn format_units(units: U256, decimals: u8) -> String {
    if units.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = units / divisor;
    let remainder = units % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{whole}.{trimmed}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_to_units_truncates() {
        assert_eq!(decimal_to_units(10.0, 6).unwrap(), U256::from(10_000_000u64));
        assert_eq!(decimal_to_units(1.5, 6).unwrap(), U256::from(1_500_000u64));

        // Never rounds up, even when the dropped digit would round.
        assert_eq!(
            decimal_to_units(0.9999999, 6).unwrap(),
            U256::from(999_999u64)
        );

        assert!(decimal_to_units(-1.0, 6).is_err());
        assert!(decimal_to_units(f64::NAN, 6).is_err());
    }

    #[test]
    fn units_to_decimal_round_trip() {
        let units = U256::from(40_000_000u64);
        assert_eq!(units_to_decimal(units, 6).unwrap(), 40.0);
    }

    #[test]
    fn format_units_trims_zeroes() {
        assert_eq!(format_units(U256::from(1_000_000u64), 6), "1");
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::ZERO, 6), "0");
    }
}
