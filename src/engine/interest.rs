// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::occurrence::add_months;
use crate::errors::{EngineError, EngineResult};
use crate::models::InterestCalculatorResult;
use crate::money::{monthly_rate, round_money};
use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;
use tracing::debug;

/// Every payment type is computed on a fixed amortizing schedule. Names other
/// than `fixed` and `minimum` are carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    #[default]
    Fixed,
    Minimum,
    #[serde(untagged)]
    Other(String),
}

impl FromStr for PaymentType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "" | "fixed" => PaymentType::Fixed,
            "minimum" => PaymentType::Minimum,
            other => PaymentType::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestInput {
    pub principal: Decimal,
    pub annual_rate: Decimal,
    pub term_months: i64,
    #[serde(default)]
    pub payment_type: PaymentType,
}

/// Fixed monthly payment for a fully amortizing loan:
/// `M = P * r(1+r)^n / ((1+r)^n - 1)`, or `P / n` when the rate is zero.
///
/// Money fields are rounded to cents only on output.
pub fn calculate_interest(
    input: &InterestInput,
    today: NaiveDate,
) -> EngineResult<InterestCalculatorResult> {
    if let PaymentType::Other(name) = &input.payment_type {
        debug!(payment_type = %name, "computing unknown payment type as fixed");
    }
    if input.term_months <= 0 {
        return Err(EngineError::invalid("term must be at least one month"));
    }
    if input.principal.is_sign_negative() {
        return Err(EngineError::invalid("principal cannot be negative"));
    }
    if input.annual_rate.is_sign_negative() {
        return Err(EngineError::invalid("interest rate cannot be negative"));
    }
    let term = u32::try_from(input.term_months)
        .map_err(|_| EngineError::invalid("term is too long"))?;
    let n = Decimal::from(term);
    let r = monthly_rate(input.annual_rate);

    let monthly_payment = if r.is_zero() {
        input.principal / n
    } else {
        annuity_payment(input.principal, r, term)?
    };
    let total_payment = monthly_payment
        .checked_mul(n)
        .ok_or_else(|| EngineError::invalid("total payment overflows"))?;
    let total_interest = total_payment - input.principal;
    let payoff_date = add_months(today, term)
        .ok_or_else(|| EngineError::invalid("payoff date is out of range"))?;

    Ok(InterestCalculatorResult {
        monthly_payment: round_money(monthly_payment),
        total_payment: round_money(total_payment),
        total_interest: round_money(total_interest),
        payoff_date,
    })
}

fn annuity_payment(principal: Decimal, r: Decimal, term: u32) -> EngineResult<Decimal> {
    let growth = (Decimal::ONE + r)
        .checked_powu(u64::from(term))
        .ok_or_else(|| EngineError::invalid("term is too long for this rate"))?;
    let denominator = growth - Decimal::ONE;
    principal
        .checked_mul(r * growth)
        .and_then(|num| num.checked_div(denominator))
        .ok_or_else(|| EngineError::invalid("monthly payment overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    fn input(principal: Decimal, rate: Decimal, term: i64) -> InterestInput {
        InterestInput {
            principal,
            annual_rate: rate,
            term_months: term,
            payment_type: PaymentType::Fixed,
        }
    }

    #[test]
    fn twelve_percent_over_a_year() {
        let res = calculate_interest(&input(dec!(10000), dec!(12), 12), today()).unwrap();
        assert_eq!(res.monthly_payment, dec!(888.49));
        assert!((res.total_payment - dec!(10661.88)).abs() <= dec!(0.12));
        assert!((res.total_interest - dec!(661.88)).abs() <= dec!(0.12));
        assert_eq!(res.payoff_date, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
    }

    #[test]
    fn zero_rate_splits_evenly() {
        let res = calculate_interest(&input(dec!(1000), Decimal::ZERO, 3), today()).unwrap();
        assert_eq!(res.monthly_payment, dec!(333.33));
        assert_eq!(res.total_payment, dec!(1000.00));
        assert!(res.total_interest.is_zero());
        assert_eq!(res.payoff_date, NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
    }

    #[test]
    fn rejects_bad_input() {
        for bad in [
            input(dec!(1000), dec!(5), 0),
            input(dec!(1000), dec!(5), -3),
            input(dec!(-1), dec!(5), 12),
            input(dec!(1000), dec!(-0.5), 12),
        ] {
            assert!(matches!(
                calculate_interest(&bad, today()),
                Err(EngineError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn payment_type_parsing() {
        assert_eq!("Minimum".parse::<PaymentType>().unwrap(), PaymentType::Minimum);
        assert_eq!("".parse::<PaymentType>().unwrap(), PaymentType::Fixed);
        assert_eq!(
            "Balloon".parse::<PaymentType>().unwrap(),
            PaymentType::Other("balloon".into())
        );
    }
}
