// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use wealthpath::engine::{InterestInput, PaymentType, calculate_interest};
use wealthpath::errors::EngineError;
use wealthpath::{cli, commands};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
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
fn twelve_month_loan_at_twelve_percent() {
    let res = calculate_interest(&input(dec!(10000), dec!(12), 12), d(2025, 1, 31)).unwrap();
    assert_eq!(res.monthly_payment, dec!(888.49));
    // Rounded payment times term is 10661.88; unrounded is a few cents lower.
    assert!((res.total_payment - dec!(10661.88)).abs() <= dec!(0.12));
    assert_eq!(res.total_interest, res.total_payment - dec!(10000));
    assert_eq!(res.payoff_date, d(2026, 1, 31));
}

#[test]
fn zero_rate_splits_principal_evenly() {
    let res = calculate_interest(&input(dec!(1200), Decimal::ZERO, 24), d(2025, 5, 10)).unwrap();
    assert_eq!(res.monthly_payment, dec!(50.00));
    assert_eq!(res.total_payment, dec!(1200.00));
    assert!(res.total_interest.is_zero());
    assert_eq!(res.payoff_date, d(2027, 5, 10));
}

#[test]
fn long_terms_have_more_interest() {
    let short = calculate_interest(&input(dec!(250000), dec!(6.5), 180), d(2025, 1, 1)).unwrap();
    let long = calculate_interest(&input(dec!(250000), dec!(6.5), 360), d(2025, 1, 1)).unwrap();
    assert!(long.monthly_payment < short.monthly_payment);
    assert!(long.total_interest > short.total_interest);
    assert_eq!(long.monthly_payment, dec!(1580.17));
}

#[test]
fn rejects_bad_terms_and_negative_inputs() {
    for term in [0, -6] {
        let err = calculate_interest(&input(dec!(1000), dec!(5), term), d(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
    let err = calculate_interest(&input(dec!(-1), dec!(5), 12), d(2025, 1, 1)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
    let err = calculate_interest(&input(dec!(1000), dec!(-5), 12), d(2025, 1, 1)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[test]
fn every_payment_type_computes_like_fixed() {
    let fixed = calculate_interest(&input(dec!(5000), dec!(9), 36), d(2025, 1, 1)).unwrap();
    for name in ["minimum", "balloon", "interest_only"] {
        let mut other = input(dec!(5000), dec!(9), 36);
        other.payment_type = name.parse().unwrap();
        assert_eq!(calculate_interest(&other, d(2025, 1, 1)).unwrap(), fixed, "{name}");
    }
    assert_eq!(
        "balloon".parse::<PaymentType>().unwrap(),
        PaymentType::Other("balloon".into())
    );
}

#[test]
fn totals_track_rounded_payment_within_a_cent_per_month() {
    for (principal, rate, term) in [
        (dec!(10000), dec!(12), 12i64),
        (dec!(2500), dec!(3.25), 7),
        (dec!(18000), dec!(7.9), 60),
        (dec!(320000), dec!(5.5), 360),
        (dec!(999.99), dec!(29.99), 24),
        (dec!(1234.56), Decimal::ZERO, 11),
    ] {
        let res = calculate_interest(&input(principal, rate, term), d(2025, 1, 1)).unwrap();
        let n = Decimal::from(term);
        let tolerance = dec!(0.01) * n;
        assert!(
            (res.monthly_payment * n - res.total_payment).abs() <= tolerance,
            "{principal} @ {rate}% x {term}"
        );
        assert!((res.total_payment - principal - res.total_interest).abs() <= dec!(0.01));
    }
}

#[test]
fn cli_accepts_negative_term_for_validation() {
    let m = cli::build_cli().get_matches_from([
        "wealthpath",
        "calc",
        "interest",
        "--principal",
        "1000",
        "--rate",
        "5",
        "--term",
        "-3",
        "--json",
    ]);
    let (_, calc_m) = m.subcommand().unwrap();
    let err = commands::calc::handle(calc_m).unwrap_err();
    assert!(err.to_string().contains("term"));
}
