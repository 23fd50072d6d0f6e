// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::as_of;
use crate::engine::{InterestInput, calculate_interest};
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Context, Result};

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    if let Some(("interest", sub)) = m.subcommand() {
        interest(sub)?;
    }
    Ok(())
}

fn interest(sub: &clap::ArgMatches) -> Result<()> {
    let term_raw = sub.get_one::<String>("term").context("--term")?;
    let input = InterestInput {
        principal: parse_decimal(sub.get_one::<String>("principal").context("--principal")?)?,
        annual_rate: parse_decimal(sub.get_one::<String>("rate").context("--rate")?)?,
        term_months: term_raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid term '{}'", term_raw))?,
        payment_type: sub
            .get_one::<String>("payment-type")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default(),
    };
    let result = calculate_interest(&input, as_of(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &result)? {
        let rows = vec![
            vec!["Monthly payment".into(), format!("{:.2}", result.monthly_payment)],
            vec!["Total payment".into(), format!("{:.2}", result.total_payment)],
            vec!["Total interest".into(), format!("{:.2}", result.total_interest)],
            vec!["Payoff date".into(), result.payoff_date.to_string()],
        ];
        println!("{}", pretty_table(&["", "Value"], rows));
    }
    Ok(())
}
