// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod calc;
pub mod config;
pub mod debts;
pub mod ledger;
pub mod recurring;
pub mod savings;
pub mod schedule;

use crate::config::Config;
use crate::utils::parse_date;
use anyhow::Result;
use chrono::{NaiveDate, Utc};

/// `--user` if given, otherwise the configured default.
pub(crate) fn acting_user(m: &clap::ArgMatches, cfg: &Config) -> i64 {
    m.get_one::<i64>("user").copied().unwrap_or(cfg.default_user)
}

/// `--as-of` if given, otherwise today in UTC.
pub(crate) fn as_of(m: &clap::ArgMatches) -> Result<NaiveDate> {
    match m.get_one::<String>("as-of") {
        Some(raw) => parse_date(raw),
        None => Ok(Utc::now().date_naive()),
    }
}
