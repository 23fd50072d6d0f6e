// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::acting_user;
use crate::config::Config;
use crate::errors::{EngineError, EngineResult};
use crate::models::SavingsGoal;
use crate::money::{parse_money, round_money};
use crate::store::{RawSavingsGoal, SAVINGS_COLUMNS, encode_date};
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SavingsGoalInput {
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub currency: Option<String>,
    pub target_date: Option<NaiveDate>,
}

fn validate(input: &SavingsGoalInput) -> EngineResult<()> {
    if input.name.trim().is_empty() {
        return Err(EngineError::invalid("name is required"));
    }
    if input.target_amount <= Decimal::ZERO {
        return Err(EngineError::invalid("target amount must be greater than zero"));
    }
    if input.current_amount.is_sign_negative() {
        return Err(EngineError::invalid("current amount cannot be negative"));
    }
    Ok(())
}

fn currency_or_default(currency: Option<&str>, cfg: &Config) -> String {
    currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| cfg.default_currency.clone())
}

pub fn create_goal(
    conn: &Connection,
    cfg: &Config,
    user_id: i64,
    input: SavingsGoalInput,
) -> EngineResult<SavingsGoal> {
    validate(&input)?;
    conn.execute(
        "INSERT INTO savings_goals(user_id, name, target_amount, current_amount, currency, target_date)
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            user_id,
            input.name.trim(),
            round_money(input.target_amount).to_string(),
            round_money(input.current_amount).to_string(),
            currency_or_default(input.currency.as_deref(), cfg),
            input.target_date.map(encode_date)
        ],
    )?;
    get_goal(conn, user_id, conn.last_insert_rowid())
}

pub fn get_goal(conn: &Connection, user_id: i64, id: i64) -> EngineResult<SavingsGoal> {
    let sql = format!(
        "SELECT {} FROM savings_goals WHERE id=?1 AND user_id=?2",
        SAVINGS_COLUMNS
    );
    conn.query_row(&sql, params![id, user_id], RawSavingsGoal::from_row)
        .optional()?
        .ok_or_else(|| EngineError::not_found(format!("savings goal {}", id)))?
        .decode()
}

/// Nearest target date first; goals without one come last.
pub fn list_goals(conn: &Connection, user_id: i64) -> EngineResult<Vec<SavingsGoal>> {
    let sql = format!(
        "SELECT {} FROM savings_goals WHERE user_id=?1
         ORDER BY target_date IS NULL, target_date, id",
        SAVINGS_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], RawSavingsGoal::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.decode()?);
    }
    Ok(out)
}

pub fn update_goal(
    conn: &Connection,
    cfg: &Config,
    user_id: i64,
    id: i64,
    input: SavingsGoalInput,
) -> EngineResult<SavingsGoal> {
    get_goal(conn, user_id, id)?;
    validate(&input)?;
    conn.execute(
        "UPDATE savings_goals SET name=?1, target_amount=?2, current_amount=?3, currency=?4, target_date=?5
         WHERE id=?6 AND user_id=?7",
        params![
            input.name.trim(),
            round_money(input.target_amount).to_string(),
            round_money(input.current_amount).to_string(),
            currency_or_default(input.currency.as_deref(), cfg),
            input.target_date.map(encode_date),
            id,
            user_id
        ],
    )?;
    get_goal(conn, user_id, id)
}

pub fn delete_goal(conn: &Connection, user_id: i64, id: i64) -> EngineResult<()> {
    let removed = conn.execute(
        "DELETE FROM savings_goals WHERE id=?1 AND user_id=?2",
        params![id, user_id],
    )?;
    if removed == 0 {
        return Err(EngineError::not_found(format!("savings goal {}", id)));
    }
    Ok(())
}

/// Adds `amount` to the saved total. Going past the target is allowed.
pub fn contribute(
    conn: &Connection,
    user_id: i64,
    id: i64,
    amount: Decimal,
) -> EngineResult<SavingsGoal> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::invalid("contribution must be greater than zero"));
    }
    let tx = conn.unchecked_transaction()?;
    let goal = get_goal(&tx, user_id, id)?;
    let saved = goal
        .current_amount
        .checked_add(round_money(amount))
        .ok_or_else(|| EngineError::invalid("contribution is too large"))?;
    tx.execute(
        "UPDATE savings_goals SET current_amount=?1 WHERE id=?2 AND user_id=?3",
        params![saved.to_string(), id, user_id],
    )?;
    tx.commit()?;
    let goal = get_goal(conn, user_id, id)?;
    info!(goal = id, %amount, saved = %goal.current_amount, "savings contribution recorded");
    Ok(goal)
}

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let input = input_from_args(sub, None)?;
            let goal = create_goal(conn, cfg, acting_user(sub, cfg), input)?;
            println!("Added savings goal {} ({})", goal.id, goal.name);
        }
        Some(("list", sub)) => {
            let goals = list_goals(conn, acting_user(sub, cfg))?;
            print_goals(sub, &goals)?;
        }
        Some(("show", sub)) => {
            let id = *sub.get_one::<i64>("id").context("id")?;
            let goal = get_goal(conn, acting_user(sub, cfg), id)?;
            print_goals(sub, std::slice::from_ref(&goal))?;
        }
        Some(("update", sub)) => {
            let user = acting_user(sub, cfg);
            let id = *sub.get_one::<i64>("id").context("id")?;
            let current = get_goal(conn, user, id)?;
            let input = input_from_args(sub, Some(&current))?;
            let goal = update_goal(conn, cfg, user, id, input)?;
            println!("Updated savings goal {}", goal.id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").context("id")?;
            delete_goal(conn, acting_user(sub, cfg), id)?;
            println!("Deleted savings goal {}", id);
        }
        Some(("contribute", sub)) => {
            let id = *sub.get_one::<i64>("id").context("id")?;
            let amount = parse_money(sub.get_one::<String>("amount").context("amount")?)?;
            let goal = contribute(conn, acting_user(sub, cfg), id, amount)?;
            println!(
                "{}: {} of {} ({}%)",
                goal.name,
                fmt_money(&goal.current_amount, &goal.currency),
                fmt_money(&goal.target_amount, &goal.currency),
                goal.progress_percent()
            );
        }
        _ => {}
    }
    Ok(())
}

fn input_from_args(sub: &clap::ArgMatches, base: Option<&SavingsGoal>) -> Result<SavingsGoalInput> {
    let name = sub
        .get_one::<String>("name")
        .cloned()
        .or_else(|| base.map(|g| g.name.clone()))
        .context("--name is required")?;
    let target_amount = match sub.get_one::<String>("target") {
        Some(raw) => parse_money(raw)?,
        None => base.map(|g| g.target_amount).context("--target is required")?,
    };
    let current_amount = match sub.get_one::<String>("current") {
        Some(raw) => parse_money(raw)?,
        None => base.map(|g| g.current_amount).unwrap_or(Decimal::ZERO),
    };
    let clear_date = matches!(sub.try_get_one::<bool>("clear-date"), Ok(Some(true)));
    let target_date = if clear_date {
        None
    } else {
        match sub.get_one::<String>("target-date") {
            Some(raw) => Some(parse_date(raw)?),
            None => base.and_then(|g| g.target_date),
        }
    };
    Ok(SavingsGoalInput {
        name,
        target_amount,
        current_amount,
        currency: sub
            .get_one::<String>("currency")
            .cloned()
            .or_else(|| base.map(|g| g.currency.clone())),
        target_date,
    })
}

fn print_goals(sub: &clap::ArgMatches, goals: &[SavingsGoal]) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &goals)? {
        return Ok(());
    }
    let rows = goals
        .iter()
        .map(|g| {
            vec![
                g.id.to_string(),
                g.name.clone(),
                fmt_money(&g.current_amount, &g.currency),
                fmt_money(&g.target_amount, &g.currency),
                fmt_money(&g.remaining(), &g.currency),
                format!("{}%", g.progress_percent()),
                g.target_date.map(|d| d.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Saved", "Target", "Remaining", "Progress", "Target date"],
            rows
        )
    );
    Ok(())
}
