// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Mock cross-border settlement network.
//!
//! Stands in for the production settlement rail during development: quotes
//! a static FX rate, simulates network latency, and returns a synthetic
//! settlement hash. Unknown currency corridors are rejected outright rather
//! than silently settled 1:1.

use std::time::Duration;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

const SETTLEMENT_FEE: f64 = 0.00001;

/// Static FX table, quoted as 1 unit of `from` in units of `to`.
const RATES: &[(&str, &str, f64)] = &[
    ("USD", "GBP", 0.79),
    ("USD", "EUR", 0.92),
    ("USD", "CAD", 1.36),
    ("USD", "MXN", 17.5),
    ("USD", "RUB", 92.0),
    ("USD", "CNY", 7.2),
    ("USD", "BRL", 5.0),
    ("USD", "AED", 3.67),
    ("GBP", "USD", 1.27),
    ("GBP", "EUR", 1.17),
    ("GBP", "CAD", 1.72),
    ("GBP", "MXN", 22.15),
    ("GBP", "RUB", 116.0),
    ("GBP", "CNY", 9.11),
    ("GBP", "BRL", 6.33),
    ("GBP", "AED", 4.65),
    ("EUR", "USD", 1.09),
    ("EUR", "GBP", 0.86),
    ("EUR", "CAD", 1.48),
    ("EUR", "MXN", 19.05),
    ("EUR", "RUB", 100.0),
    ("EUR", "CNY", 7.85),
    ("EUR", "BRL", 5.45),
    ("EUR", "AED", 4.0),
    ("CAD", "USD", 0.74),
    ("CAD", "GBP", 0.58),
    ("CAD", "EUR", 0.68),
    ("CAD", "MXN", 12.87),
    ("CAD", "RUB", 67.6),
    ("CAD", "CNY", 5.29),
    ("CAD", "BRL", 3.68),
    ("CAD", "AED", 2.7),
    ("MXN", "USD", 0.057),
    ("MXN", "GBP", 0.045),
    ("MXN", "EUR", 0.052),
    ("MXN", "CAD", 0.078),
    ("MXN", "RUB", 5.26),
    ("MXN", "CNY", 0.41),
    ("MXN", "BRL", 0.29),
    ("MXN", "AED", 0.21),
    ("RUB", "USD", 0.011),
    ("RUB", "GBP", 0.0086),
    ("RUB", "EUR", 0.01),
    ("RUB", "CAD", 0.015),
    ("RUB", "MXN", 0.19),
    ("RUB", "CNY", 0.078),
    ("RUB", "BRL", 0.054),
    ("RUB", "AED", 0.04),
    ("CNY", "USD", 0.139),
    ("CNY", "GBP", 0.11),
    ("CNY", "EUR", 0.127),
    ("CNY", "CAD", 0.189),
    ("CNY", "MXN", 2.43),
    ("CNY", "RUB", 12.8),
    ("CNY", "BRL", 0.69),
    ("CNY", "AED", 0.51),
    ("BRL", "USD", 0.2),
    ("BRL", "GBP", 0.158),
    ("BRL", "EUR", 0.183),
    ("BRL", "CAD", 0.272),
    ("BRL", "MXN", 3.5),
    ("BRL", "RUB", 18.4),
    ("BRL", "CNY", 1.44),
    ("BRL", "AED", 0.73),
    ("AED", "USD", 0.272),
    ("AED", "GBP", 0.215),
    ("AED", "EUR", 0.25),
    ("AED", "CAD", 0.37),
    ("AED", "MXN", 4.77),
    ("AED", "RUB", 25.0),
    ("AED", "CNY", 1.96),
    ("AED", "BRL", 1.37),
];

/// Errors from the settlement provider.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("no settlement corridor from {from} to {to}")]
    UnsupportedCorridor { from: String, to: String },
}

/// Result of a settled cross-border payment.
#[derive(Debug, Clone)]
pub struct SettlementQuote {
    /// Amount debited, in the sender's currency.
    pub amount_sent: f64,
    /// Amount delivered, in the recipient's currency, rounded to cents.
    pub amount_received: f64,
    pub exchange_rate: f64,
    /// Flat network fee, in the sender's currency.
    pub fee: f64,
    /// 64-char uppercase settlement hash.
    pub reference: String,
}

/// Mock settlement network client.
pub struct FxSettlement {
    delay: Duration,
}

impl FxSettlement {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Look up the FX rate for a corridor. Same-currency corridors are 1.0.
    pub fn rate(&self, from: &str, to: &str) -> Result<f64, SettlementError> {
        if from == to {
            return Ok(1.0);
        }
        RATES
            .iter()
            .find(|(f, t, _)| *f == from && *t == to)
            .map(|(_, _, rate)| *rate)
            .ok_or_else(|| SettlementError::UnsupportedCorridor {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    /// Convert an amount across a corridor, rounded to cents.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, SettlementError> {
        let rate = self.rate(from, to)?;
        Ok(round_cents(amount * rate))
    }

    /// Settle a cross-border payment.
    ///
    /// Validates the corridor before sleeping, so an unsupported pair fails
    /// fast without paying the simulated network latency.
    pub async fn settle(
        &self,
        amount: f64,
        from: &str,
        to: &str,
    ) -> Result<SettlementQuote, SettlementError> {
        let rate = self.rate(from, to)?;
        let amount_received = round_cents(amount * rate);

        tokio::time::sleep(self.delay).await;

        let reference = settlement_reference();
        info!(
            %reference,
            from, to, rate, amount, amount_received,
            "settled international payment"
        );

        Ok(SettlementQuote {
            amount_sent: amount,
            amount_received,
            exchange_rate: rate,
            fee: SETTLEMENT_FEE,
            reference,
        })
    }
}

/// Round a currency amount to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Synthetic 64-char uppercase hex settlement hash.
fn settlement_reference() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
    .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settlement() -> FxSettlement {
        FxSettlement::new(Duration::ZERO)
    }

    #[test]
    fn same_currency_rate_is_unity() {
        assert_eq!(settlement().rate("USD", "USD").unwrap(), 1.0);
        assert_eq!(settlement().rate("XYZ", "XYZ").unwrap(), 1.0);
    }

    #[test]
    fn known_corridor_uses_table_rate() {
        assert_eq!(settlement().rate("USD", "GBP").unwrap(), 0.79);
        assert_eq!(settlement().rate("GBP", "USD").unwrap(), 1.27);
    }

    #[test]
    fn unknown_corridor_is_rejected() {
        let result = settlement().rate("USD", "JPY");
        assert!(matches!(
            result,
            Err(SettlementError::UnsupportedCorridor { .. })
        ));
    }

    #[test]
    fn conversion_rounds_to_cents() {
        // 100 * 0.79 is not exactly 79 in binary floating point; the quote
        // must still come out as 79.00 exactly.
        assert_eq!(settlement().convert(100.0, "USD", "GBP").unwrap(), 79.0);
        assert_eq!(settlement().convert(33.33, "USD", "EUR").unwrap(), 30.66);
    }

    #[tokio::test]
    async fn settle_produces_uppercase_hash_reference() {
        let quote = settlement().settle(50.0, "USD", "EUR").await.unwrap();
        assert_eq!(quote.amount_received, 46.0);
        assert_eq!(quote.exchange_rate, 0.92);
        assert_eq!(quote.reference.len(), 64);
        assert!(quote
            .reference
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn settle_rejects_unknown_corridor_without_delay() {
        let settlement = FxSettlement::new(Duration::from_secs(30));
        let start = std::time::Instant::now();
        let result = settlement.settle(10.0, "USD", "JPY").await;
        assert!(result.is_err());
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
