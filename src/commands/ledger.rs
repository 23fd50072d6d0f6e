// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::acting_user;
use crate::config::Config;
use crate::errors::{EngineError, EngineResult};
use crate::models::{LedgerTransaction, TransactionType};
use crate::money::parse_money;
use crate::store::{RawTransaction, TRANSACTION_COLUMNS, encode_date};
use crate::utils::{maybe_print_json, parse_date, pretty_table};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use rust_decimal::Decimal;

/// A manual ledger entry.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub r#type: Option<TransactionType>,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub offset: usize,
}

fn validate(input: &TransactionInput) -> EngineResult<()> {
    if input.amount <= Decimal::ZERO {
        return Err(EngineError::invalid("amount must be greater than zero"));
    }
    if input.category.trim().is_empty() {
        return Err(EngineError::invalid("category is required"));
    }
    Ok(())
}

fn currency_or_default(currency: Option<&str>, cfg: &Config) -> String {
    currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| cfg.default_currency.clone())
}

pub fn create_transaction(
    conn: &Connection,
    cfg: &Config,
    user_id: i64,
    input: TransactionInput,
) -> EngineResult<LedgerTransaction> {
    validate(&input)?;
    conn.execute(
        "INSERT INTO transactions(user_id, type, amount, currency, category, description, date, source)
         VALUES (?1,?2,?3,?4,?5,?6,?7,'manual')",
        params![
            user_id,
            input.r#type.as_str(),
            input.amount.to_string(),
            currency_or_default(input.currency.as_deref(), cfg),
            input.category.trim(),
            input.description.trim(),
            encode_date(input.date)
        ],
    )?;
    get_transaction(conn, user_id, conn.last_insert_rowid())
}

pub fn get_transaction(conn: &Connection, user_id: i64, id: i64) -> EngineResult<LedgerTransaction> {
    let sql = format!(
        "SELECT {} FROM transactions WHERE id=?1 AND user_id=?2",
        TRANSACTION_COLUMNS
    );
    conn.query_row(&sql, params![id, user_id], RawTransaction::from_row)
        .optional()?
        .ok_or_else(|| EngineError::not_found(format!("transaction {}", id)))?
        .decode()
}

/// Newest first.
pub fn list_transactions(
    conn: &Connection,
    user_id: i64,
    filter: &LedgerFilter,
) -> EngineResult<Vec<LedgerTransaction>> {
    let mut sql = format!(
        "SELECT {} FROM transactions WHERE user_id=?",
        TRANSACTION_COLUMNS
    );
    let mut values: Vec<Value> = vec![Value::Integer(user_id)];

    if let Some(t) = filter.r#type {
        sql.push_str(" AND type=?");
        values.push(Value::Text(t.as_str().into()));
    }
    if let Some(cat) = &filter.category {
        sql.push_str(" AND category=?");
        values.push(Value::Text(cat.clone()));
    }
    if let Some(from) = filter.from {
        sql.push_str(" AND date>=?");
        values.push(Value::Text(encode_date(from)));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND date<=?");
        values.push(Value::Text(encode_date(to)));
    }
    sql.push_str(" ORDER BY date DESC, id DESC LIMIT ? OFFSET ?");
    let limit = filter
        .limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1);
    values.push(Value::Integer(limit));
    values.push(Value::Integer(i64::try_from(filter.offset).unwrap_or(i64::MAX)));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), RawTransaction::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.decode()?);
    }
    Ok(out)
}

/// Replaces the editable fields. `source` and `recurring_id` are kept, so an
/// edited scheduler entry still traces back to its definition.
pub fn update_transaction(
    conn: &Connection,
    cfg: &Config,
    user_id: i64,
    id: i64,
    input: TransactionInput,
) -> EngineResult<LedgerTransaction> {
    get_transaction(conn, user_id, id)?;
    validate(&input)?;
    conn.execute(
        "UPDATE transactions SET type=?1, amount=?2, currency=?3, category=?4, description=?5, date=?6
         WHERE id=?7 AND user_id=?8",
        params![
            input.r#type.as_str(),
            input.amount.to_string(),
            currency_or_default(input.currency.as_deref(), cfg),
            input.category.trim(),
            input.description.trim(),
            encode_date(input.date),
            id,
            user_id
        ],
    )?;
    get_transaction(conn, user_id, id)
}

pub fn delete_transaction(conn: &Connection, user_id: i64, id: i64) -> EngineResult<()> {
    let removed = conn.execute(
        "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
        params![id, user_id],
    )?;
    if removed == 0 {
        return Err(EngineError::not_found(format!("transaction {}", id)));
    }
    Ok(())
}

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let input = input_from_args(sub, None)?;
            let tx = create_transaction(conn, cfg, acting_user(sub, cfg), input)?;
            println!(
                "Recorded {} {} {:.2} {} on {}",
                tx.id, tx.r#type, tx.amount, tx.currency, tx.date
            );
        }
        Some(("list", sub)) => list(conn, cfg, sub)?,
        Some(("show", sub)) => {
            let id = *sub.get_one::<i64>("id").context("id")?;
            let tx = get_transaction(conn, acting_user(sub, cfg), id)?;
            print_transactions(sub, std::slice::from_ref(&tx))?;
        }
        Some(("update", sub)) => {
            let user = acting_user(sub, cfg);
            let id = *sub.get_one::<i64>("id").context("id")?;
            let current = get_transaction(conn, user, id)?;
            let input = input_from_args(sub, Some(&current))?;
            let tx = update_transaction(conn, cfg, user, id, input)?;
            println!("Updated transaction {}", tx.id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").context("id")?;
            delete_transaction(conn, acting_user(sub, cfg), id)?;
            println!("Deleted transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn input_from_args(
    sub: &clap::ArgMatches,
    base: Option<&LedgerTransaction>,
) -> Result<TransactionInput> {
    let r#type = match sub.get_one::<String>("type") {
        Some(raw) => raw.parse()?,
        None => base.map(|t| t.r#type).context("--type is required")?,
    };
    let amount = match sub.get_one::<String>("amount") {
        Some(raw) => parse_money(raw)?,
        None => base.map(|t| t.amount).context("--amount is required")?,
    };
    let date = match sub.get_one::<String>("date") {
        Some(raw) => parse_date(raw)?,
        None => base
            .map(|t| t.date)
            .unwrap_or_else(|| Utc::now().date_naive()),
    };
    Ok(TransactionInput {
        r#type,
        amount,
        currency: sub
            .get_one::<String>("currency")
            .cloned()
            .or_else(|| base.map(|t| t.currency.clone())),
        category: sub
            .get_one::<String>("category")
            .cloned()
            .or_else(|| base.map(|t| t.category.clone()))
            .unwrap_or_default(),
        description: sub
            .get_one::<String>("description")
            .cloned()
            .or_else(|| base.map(|t| t.description.clone()))
            .unwrap_or_default(),
        date,
    })
}

fn list(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let filter = LedgerFilter {
        r#type: sub.get_one::<String>("type").map(|s| s.parse()).transpose()?,
        category: sub.get_one::<String>("category").cloned(),
        from: sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?,
        to: sub.get_one::<String>("to").map(|s| parse_date(s)).transpose()?,
        limit: sub.get_one::<usize>("limit").copied(),
        offset: sub.get_one::<usize>("offset").copied().unwrap_or(0),
    };
    let data = list_transactions(conn, acting_user(sub, cfg), &filter)?;
    print_transactions(sub, &data)
}

fn print_transactions(sub: &clap::ArgMatches, data: &[LedgerTransaction]) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.date.to_string(),
                t.r#type.to_string(),
                format!("{:.2} {}", t.amount, t.currency),
                t.category.clone(),
                t.description.clone(),
                t.source.clone(),
                t.recurring_id.map(|r| r.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Type", "Amount", "Category", "Description", "Source", "Recurring"],
            rows
        )
    );
    Ok(())
}
