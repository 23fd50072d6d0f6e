// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Decimal helpers shared by the calculators. Money never passes through `f64`.

use crate::errors::{EngineError, EngineResult};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits used for display and persistence.
pub const MONEY_DP: u32 = 2;

const MONTHS_PER_YEAR: u32 = 12;

/// Converts an APR in percentage points (5.5 == 5.5%) to a fractional monthly rate.
pub fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / Decimal::ONE_HUNDRED / Decimal::from(MONTHS_PER_YEAR)
}

/// Rounds half away from zero to cents.
pub fn round_money(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

pub fn parse_money(s: &str) -> EngineResult<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| EngineError::invalid(format!("'{}' is not a decimal amount", s.trim())))
}

/// Parses a decimal column read back from the store.
pub(crate) fn decode_decimal(raw: &str, column: &str) -> EngineResult<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|_| EngineError::Corrupt(format!("{} '{}'", column, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn monthly_rate_from_percentage_points() {
        assert_eq!(monthly_rate(dec!(24)), dec!(0.02));
        assert_eq!(monthly_rate(dec!(12)), dec!(0.01));
        assert!(monthly_rate(Decimal::ZERO).is_zero());
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(2.355)), dec!(2.36));
        assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
        assert_eq!(round_money(dec!(2.344)), dec!(2.34));
    }

    #[test]
    fn parse_money_rejects_garbage() {
        assert_eq!(parse_money(" 12.50 ").unwrap(), dec!(12.50));
        assert!(matches!(
            parse_money("12,50"),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            decode_decimal("abc", "amount"),
            Err(EngineError::Corrupt(_))
        ));
    }
}
