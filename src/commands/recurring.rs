// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{acting_user, as_of};
use crate::config::Config;
use crate::errors::{EngineError, EngineResult};
use crate::models::{Frequency, RecurringDefinition, TransactionType, UpcomingBill};
use crate::store::{RECURRING_COLUMNS, RawRecurring, encode_date};
use crate::money::parse_money;
use crate::utils::{maybe_print_json, parse_date, pretty_table};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct CreateRecurring {
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub category: String,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Partial update; `None` leaves a field alone. `end_date: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateRecurring {
    pub r#type: Option<TransactionType>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
}

fn check_amount(amount: Decimal) -> EngineResult<()> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::invalid("amount must be greater than zero"));
    }
    Ok(())
}

fn check_frequency(frequency: Frequency) -> EngineResult<()> {
    if !Frequency::ALLOWED.contains(&frequency) {
        return Err(EngineError::invalid(format!("invalid frequency '{}'", frequency)));
    }
    Ok(())
}

fn check_window(start: NaiveDate, end: Option<NaiveDate>) -> EngineResult<()> {
    match end {
        Some(end) if end < start => Err(EngineError::invalid(format!(
            "end date {} is before start date {}",
            end, start
        ))),
        _ => Ok(()),
    }
}

pub fn create_recurring(
    conn: &Connection,
    cfg: &Config,
    user_id: i64,
    input: CreateRecurring,
) -> EngineResult<RecurringDefinition> {
    check_amount(input.amount)?;
    check_frequency(input.frequency)?;
    check_window(input.start_date, input.end_date)?;
    let currency = input
        .currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| cfg.default_currency.clone());

    conn.execute(
        "INSERT INTO recurring_transactions(user_id, type, amount, currency, category, description,
                                            frequency, start_date, end_date, next_occurrence, is_active)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,1)",
        params![
            user_id,
            input.r#type.as_str(),
            input.amount.to_string(),
            currency,
            input.category.trim(),
            input.description.trim(),
            input.frequency.as_str(),
            encode_date(input.start_date),
            input.end_date.map(encode_date),
            encode_date(input.start_date)
        ],
    )?;
    get_recurring(conn, user_id, conn.last_insert_rowid())
}

pub fn get_recurring(conn: &Connection, user_id: i64, id: i64) -> EngineResult<RecurringDefinition> {
    let sql = format!(
        "SELECT {} FROM recurring_transactions WHERE id=?1 AND user_id=?2",
        RECURRING_COLUMNS
    );
    conn.query_row(&sql, params![id, user_id], RawRecurring::from_row)
        .optional()?
        .ok_or_else(|| EngineError::not_found(format!("recurring transaction {}", id)))?
        .decode()
}

pub fn list_recurring(conn: &Connection, user_id: i64) -> EngineResult<Vec<RecurringDefinition>> {
    let sql = format!(
        "SELECT {} FROM recurring_transactions WHERE user_id=?1 ORDER BY next_occurrence, id",
        RECURRING_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], RawRecurring::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.decode()?);
    }
    Ok(out)
}

/// Applies a patch. Moving the start date later pulls the pointer up to it;
/// moving it earlier never rewinds the pointer.
pub fn update_recurring(
    conn: &Connection,
    user_id: i64,
    id: i64,
    patch: UpdateRecurring,
) -> EngineResult<RecurringDefinition> {
    let mut def = get_recurring(conn, user_id, id)?;

    if let Some(t) = patch.r#type {
        def.r#type = t;
    }
    if let Some(amount) = patch.amount {
        check_amount(amount)?;
        def.amount = amount;
    }
    if let Some(currency) = patch.currency {
        def.currency = currency.trim().to_uppercase();
    }
    if let Some(category) = patch.category {
        def.category = category.trim().to_string();
    }
    if let Some(description) = patch.description {
        def.description = description.trim().to_string();
    }
    if let Some(frequency) = patch.frequency {
        check_frequency(frequency)?;
        def.frequency = frequency;
    }
    if let Some(start) = patch.start_date {
        def.start_date = start;
        def.next_occurrence = def.next_occurrence.max(start);
    }
    if let Some(end) = patch.end_date {
        def.end_date = end;
    }
    if let Some(active) = patch.is_active {
        def.is_active = active;
    }
    check_window(def.start_date, def.end_date)?;

    conn.execute(
        "UPDATE recurring_transactions SET type=?1, amount=?2, currency=?3, category=?4,
                description=?5, frequency=?6, start_date=?7, end_date=?8, next_occurrence=?9,
                is_active=?10
         WHERE id=?11 AND user_id=?12",
        params![
            def.r#type.as_str(),
            def.amount.to_string(),
            def.currency,
            def.category,
            def.description,
            def.frequency.as_str(),
            encode_date(def.start_date),
            def.end_date.map(encode_date),
            encode_date(def.next_occurrence),
            def.is_active,
            id,
            user_id
        ],
    )?;
    Ok(def)
}

pub fn pause_recurring(conn: &Connection, user_id: i64, id: i64) -> EngineResult<RecurringDefinition> {
    update_recurring(
        conn,
        user_id,
        id,
        UpdateRecurring {
            is_active: Some(false),
            ..Default::default()
        },
    )
}

/// The pointer is left where it was, so periods missed while paused are
/// generated one per tick.
pub fn resume_recurring(conn: &Connection, user_id: i64, id: i64) -> EngineResult<RecurringDefinition> {
    update_recurring(
        conn,
        user_id,
        id,
        UpdateRecurring {
            is_active: Some(true),
            ..Default::default()
        },
    )
}

pub fn delete_recurring(conn: &Connection, user_id: i64, id: i64) -> EngineResult<()> {
    let removed = conn.execute(
        "DELETE FROM recurring_transactions WHERE id=?1 AND user_id=?2",
        params![id, user_id],
    )?;
    if removed == 0 {
        return Err(EngineError::not_found(format!("recurring transaction {}", id)));
    }
    Ok(())
}

/// Active definitions soonest first. A non-positive limit means the configured default.
pub fn upcoming(
    conn: &Connection,
    cfg: &Config,
    user_id: i64,
    limit: i64,
    today: NaiveDate,
) -> EngineResult<Vec<UpcomingBill>> {
    let limit = if limit <= 0 {
        i64::try_from(cfg.upcoming_limit).unwrap_or(i64::MAX)
    } else {
        limit
    };
    let sql = format!(
        "SELECT {} FROM recurring_transactions
         WHERE user_id=?1 AND is_active=1 AND (end_date IS NULL OR end_date>=next_occurrence)
         ORDER BY next_occurrence, id LIMIT ?2",
        RECURRING_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id, limit], RawRecurring::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        let def = row?.decode()?;
        out.push(UpcomingBill {
            recurring_id: def.id,
            r#type: def.r#type,
            description: def.description,
            category: def.category,
            amount: def.amount,
            currency: def.currency,
            frequency: def.frequency,
            due_date: def.next_occurrence,
            days_until: (def.next_occurrence - today).num_days(),
        });
    }
    Ok(out)
}

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, cfg, sub)?,
        Some(("list", sub)) => {
            let data = list_recurring(conn, acting_user(sub, cfg))?;
            print_definitions(sub, &data)?;
        }
        Some(("show", sub)) => {
            let id = *sub.get_one::<i64>("id").context("id")?;
            let def = get_recurring(conn, acting_user(sub, cfg), id)?;
            print_definitions(sub, std::slice::from_ref(&def))?;
        }
        Some(("update", sub)) => update(conn, cfg, sub)?,
        Some(("pause", sub)) => {
            let id = *sub.get_one::<i64>("id").context("id")?;
            pause_recurring(conn, acting_user(sub, cfg), id)?;
            println!("Paused recurring transaction {}", id);
        }
        Some(("resume", sub)) => {
            let id = *sub.get_one::<i64>("id").context("id")?;
            let def = resume_recurring(conn, acting_user(sub, cfg), id)?;
            println!(
                "Resumed recurring transaction {}; next occurrence {}",
                id, def.next_occurrence
            );
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").context("id")?;
            delete_recurring(conn, acting_user(sub, cfg), id)?;
            println!("Deleted recurring transaction {}", id);
        }
        Some(("upcoming", sub)) => upcoming_cmd(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let input = CreateRecurring {
        r#type: sub.get_one::<String>("type").context("--type")?.parse()?,
        amount: parse_money(sub.get_one::<String>("amount").context("--amount")?)?,
        currency: sub.get_one::<String>("currency").cloned(),
        category: sub.get_one::<String>("category").cloned().unwrap_or_default(),
        description: sub.get_one::<String>("description").cloned().unwrap_or_default(),
        frequency: sub.get_one::<String>("frequency").context("--frequency")?.parse()?,
        start_date: parse_date(sub.get_one::<String>("start").context("--start")?)?,
        end_date: sub.get_one::<String>("end").map(|s| parse_date(s)).transpose()?,
    };
    let def = create_recurring(conn, cfg, acting_user(sub, cfg), input)?;
    println!(
        "Added recurring {} {} {} {:.2} starting {}",
        def.id, def.frequency, def.r#type, def.amount, def.next_occurrence
    );
    Ok(())
}

fn update(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").context("id")?;
    let end_date = if sub.get_flag("clear-end") {
        Some(None)
    } else {
        sub.get_one::<String>("end")
            .map(|s| parse_date(s))
            .transpose()?
            .map(Some)
    };
    let patch = UpdateRecurring {
        r#type: sub.get_one::<String>("type").map(|s| s.parse()).transpose()?,
        amount: sub.get_one::<String>("amount").map(|s| parse_money(s)).transpose()?,
        currency: sub.get_one::<String>("currency").cloned(),
        category: sub.get_one::<String>("category").cloned(),
        description: sub.get_one::<String>("description").cloned(),
        frequency: sub.get_one::<String>("frequency").map(|s| s.parse()).transpose()?,
        start_date: sub.get_one::<String>("start").map(|s| parse_date(s)).transpose()?,
        end_date,
        is_active: sub.get_one::<bool>("active").copied(),
    };
    let def = update_recurring(conn, acting_user(sub, cfg), id, patch)?;
    println!(
        "Updated recurring {}; next occurrence {}",
        def.id, def.next_occurrence
    );
    Ok(())
}

fn print_definitions(sub: &clap::ArgMatches, data: &[RecurringDefinition]) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|d| {
            vec![
                d.id.to_string(),
                d.r#type.to_string(),
                format!("{:.2}", d.amount),
                d.currency.clone(),
                d.category.clone(),
                d.description.clone(),
                d.frequency.to_string(),
                d.next_occurrence.to_string(),
                d.end_date.map(|e| e.to_string()).unwrap_or_default(),
                if d.is_active { "active" } else { "paused" }.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &[
                "ID", "Type", "Amount", "CCY", "Category", "Description", "Every", "Next", "Ends",
                "State"
            ],
            rows
        )
    );
    Ok(())
}

fn upcoming_cmd(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let limit = sub.get_one::<i64>("limit").copied().unwrap_or(0);
    let today = as_of(sub)?;
    let data = upcoming(conn, cfg, acting_user(sub, cfg), limit, today)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|b| {
                vec![
                    b.due_date.to_string(),
                    b.days_until.to_string(),
                    b.description.clone(),
                    b.category.clone(),
                    b.r#type.to_string(),
                    format!("{:.2} {}", b.amount, b.currency),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Due", "In days", "Description", "Category", "Type", "Amount"],
                rows
            )
        );
    }
    Ok(())
}
