// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::{DefinitionOutcome, RecurringScheduler};
use crate::store::SqliteStore;
use crate::utils::{maybe_print_json, parse_instant, pretty_table};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("run", sub)) = m.subcommand() {
        run(conn, sub)?;
    }
    Ok(())
}

/// One tick. Run it from cron (or a timer unit) to keep definitions flowing.
fn run(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let now = match sub.get_one::<String>("now") {
        Some(raw) => parse_instant(raw)?,
        None => Utc::now(),
    };
    let store = SqliteStore::new(conn);
    let report = RecurringScheduler::new(&store, &store).process_due(now)?;

    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    if report.outcomes.is_empty() {
        println!("Nothing due as of {}", now.date_naive());
        return Ok(());
    }
    let rows = report
        .outcomes
        .iter()
        .map(|o| match o {
            DefinitionOutcome::Advanced {
                recurring_id,
                transaction_id,
                occurred_on,
                next_occurrence,
            } => vec![
                recurring_id.to_string(),
                "created".into(),
                format!("tx {} on {}", transaction_id, occurred_on),
                next_occurrence.to_string(),
            ],
            DefinitionOutcome::Skipped {
                recurring_id,
                reason,
            } => vec![
                recurring_id.to_string(),
                "skipped".into(),
                reason.clone(),
                String::new(),
            ],
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Recurring", "Result", "Detail", "Next"], rows)
    );
    println!(
        "{} created, {} skipped",
        report.advanced_count(),
        report.skipped_count()
    );
    Ok(())
}
