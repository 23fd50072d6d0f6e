// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::occurrence::add_months;
use crate::models::{AmortizationRow, PayoffPlan};
use crate::money::{monthly_rate, round_money};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

/// Thirty years.
pub const MAX_PAYOFF_MONTHS: u32 = 360;

#[derive(Debug, Clone)]
pub struct PayoffInput {
    pub debt_id: Option<i64>,
    pub balance: Decimal,
    pub annual_rate: Decimal,
    pub monthly_payment: Decimal,
    pub max_months: u32,
}

impl PayoffInput {
    pub fn new(balance: Decimal, annual_rate: Decimal, monthly_payment: Decimal) -> Self {
        PayoffInput {
            debt_id: None,
            balance,
            annual_rate,
            monthly_payment,
            max_months: MAX_PAYOFF_MONTHS,
        }
    }
}

/// Simulates month-by-month repayment at a flat payment.
///
/// The balance and payment are taken to cents first. Each month accrues
/// `round(balance * r, 2)` of interest, then applies the payment, clipped on
/// the final month so the balance lands on zero. A payment that never
/// outpaces interest runs to `max_months` and leaves a positive final
/// balance; that is a valid plan, see [`PayoffPlan::pays_off`]. If the
/// balance grows past what `Decimal` can hold the simulation stops early at
/// the last representable month.
pub fn calculate_payoff_plan(input: &PayoffInput, today: NaiveDate) -> PayoffPlan {
    let r = monthly_rate(input.annual_rate);
    let starting_balance = round_money(input.balance);
    let monthly_payment = round_money(input.monthly_payment);
    let mut balance = starting_balance;
    let mut total_interest = Decimal::ZERO;
    let mut total_payment = Decimal::ZERO;
    let mut months = 0u32;
    let mut rows = Vec::new();

    while balance > Decimal::ZERO && months < input.max_months {
        let Some((row, interest_sum, payment_sum)) =
            next_month(months + 1, balance, r, monthly_payment)
                .and_then(|row| {
                    let interest_sum = total_interest.checked_add(row.interest)?;
                    let payment_sum = total_payment.checked_add(row.payment)?;
                    Some((row, interest_sum, payment_sum))
                })
        else {
            warn!(months, %balance, "payoff simulation overflowed; stopping early");
            break;
        };
        months = row.month;
        balance = row.remaining_balance;
        total_interest = interest_sum;
        total_payment = payment_sum;
        rows.push(row);
    }

    PayoffPlan {
        debt_id: input.debt_id,
        current_balance: starting_balance,
        monthly_payment,
        total_interest,
        total_payment,
        months_to_payoff: months,
        payoff_date: add_months(today, months).unwrap_or(NaiveDate::MAX),
        amortization: rows,
    }
}

/// One month of the schedule, or `None` when a value would overflow.
fn next_month(
    month: u32,
    balance: Decimal,
    r: Decimal,
    monthly_payment: Decimal,
) -> Option<AmortizationRow> {
    let interest = round_money(balance.checked_mul(r)?);
    let payment = monthly_payment.min(balance.checked_add(interest)?);
    let principal = payment.checked_sub(interest)?;
    let remaining_balance = balance.checked_sub(principal)?;
    Some(AmortizationRow {
        month,
        payment,
        principal,
        interest,
        remaining_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn first_month_split() {
        let plan = calculate_payoff_plan(&PayoffInput::new(dec!(1200), dec!(24), dec!(200)), today());
        let first = &plan.amortization[0];
        assert_eq!(first.month, 1);
        assert_eq!(first.interest, dec!(24.00));
        assert_eq!(first.principal, dec!(176.00));
        assert_eq!(first.remaining_balance, dec!(1024.00));
        assert!(plan.pays_off());
        assert_eq!(plan.months_to_payoff as usize, plan.amortization.len());
    }

    #[test]
    fn final_payment_is_clipped() {
        let plan = calculate_payoff_plan(&PayoffInput::new(dec!(250), Decimal::ZERO, dec!(100)), today());
        assert_eq!(plan.months_to_payoff, 3);
        let last = plan.amortization.last().unwrap();
        assert_eq!(last.payment, dec!(50));
        assert!(last.remaining_balance.is_zero());
        assert_eq!(plan.total_payment, dec!(250));
        assert!(plan.total_interest.is_zero());
        assert_eq!(plan.payoff_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn insufficient_payment_hits_cap() {
        // 1% a month on 10k is 100 of interest; 50 never catches up.
        let plan = calculate_payoff_plan(&PayoffInput::new(dec!(10000), dec!(12), dec!(50)), today());
        assert_eq!(plan.months_to_payoff, MAX_PAYOFF_MONTHS);
        assert!(!plan.pays_off());
        assert!(plan.final_balance() > dec!(10000));
    }

    #[test]
    fn custom_cap_is_honoured() {
        let mut input = PayoffInput::new(dec!(5000), dec!(6), dec!(10));
        input.max_months = 12;
        let plan = calculate_payoff_plan(&input, today());
        assert_eq!(plan.amortization.len(), 12);
    }

    #[test]
    fn zero_balance_yields_empty_plan() {
        let plan = calculate_payoff_plan(&PayoffInput::new(Decimal::ZERO, dec!(5), dec!(100)), today());
        assert!(plan.amortization.is_empty());
        assert_eq!(plan.payoff_date, today());
        assert!(plan.pays_off());
    }

    #[test]
    fn runaway_balance_stops_without_panicking() {
        // 400% APR with nothing paid compounds past Decimal's range.
        let plan = calculate_payoff_plan(&PayoffInput::new(dec!(1000), dec!(400), Decimal::ZERO), today());
        assert!(!plan.pays_off());
        assert!(plan.months_to_payoff > 0);
        assert!(plan.months_to_payoff < MAX_PAYOFF_MONTHS);
        assert_eq!(plan.months_to_payoff as usize, plan.amortization.len());
        assert!(plan.final_balance() > dec!(1000000000000));
    }

    #[test]
    fn inputs_are_taken_to_cents() {
        let plan = calculate_payoff_plan(&PayoffInput::new(dec!(300.004), Decimal::ZERO, dec!(100.333)), today());
        assert_eq!(plan.current_balance, dec!(300.00));
        assert_eq!(plan.monthly_payment, dec!(100.33));
        for row in &plan.amortization {
            assert!(row.payment.scale() <= 2);
            assert!(row.remaining_balance.scale() <= 2);
        }
        assert_eq!(plan.months_to_payoff, 3);
        assert_eq!(plan.amortization.last().unwrap().payment, dec!(99.34));
        assert!(plan.pays_off());
    }
}
