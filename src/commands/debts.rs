// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{acting_user, as_of};
use crate::config::Config;
use crate::engine::{PayoffInput, calculate_payoff_plan};
use crate::errors::{EngineError, EngineResult};
use crate::models::{Debt, DebtKind, DebtPayment, PayoffPlan};
use crate::money::{monthly_rate, parse_money, round_money};
use crate::store::{
    DEBT_COLUMNS, RawDebt, decode_payment, encode_date, payment_from_row,
};
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DebtInput {
    pub name: String,
    pub kind: DebtKind,
    pub original_amount: Decimal,
    pub current_balance: Decimal,
    pub annual_rate: Decimal,
    pub minimum_payment: Decimal,
    pub currency: Option<String>,
    pub due_day: u32,
    pub start_date: NaiveDate,
}

fn validate(input: &DebtInput) -> EngineResult<()> {
    if input.name.trim().is_empty() {
        return Err(EngineError::invalid("name is required"));
    }
    for (label, v) in [
        ("original amount", input.original_amount),
        ("current balance", input.current_balance),
        ("interest rate", input.annual_rate),
        ("minimum payment", input.minimum_payment),
    ] {
        if v.is_sign_negative() {
            return Err(EngineError::invalid(format!("{} cannot be negative", label)));
        }
    }
    if input.current_balance > input.original_amount {
        return Err(EngineError::invalid(
            "current balance cannot exceed the original amount",
        ));
    }
    if !(1..=31).contains(&input.due_day) {
        return Err(EngineError::invalid("due day must be within 1..=31"));
    }
    Ok(())
}

fn currency_or_default(currency: Option<&str>, cfg: &Config) -> String {
    currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| cfg.default_currency.clone())
}

pub fn create_debt(
    conn: &Connection,
    cfg: &Config,
    user_id: i64,
    mut input: DebtInput,
) -> EngineResult<Debt> {
    if input.current_balance.is_zero() {
        input.current_balance = input.original_amount;
    }
    validate(&input)?;
    let currency = currency_or_default(input.currency.as_deref(), cfg);
    conn.execute(
        "INSERT INTO debts(user_id, name, type, original_amount, current_balance, interest_rate,
                           minimum_payment, currency, due_day, start_date)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
        params![
            user_id,
            input.name.trim(),
            input.kind.as_str(),
            input.original_amount.to_string(),
            input.current_balance.to_string(),
            input.annual_rate.to_string(),
            input.minimum_payment.to_string(),
            currency,
            input.due_day,
            encode_date(input.start_date)
        ],
    )?;
    get_debt(conn, user_id, conn.last_insert_rowid())
}

/// Missing and foreign-owned debts are indistinguishable to the caller.
pub fn get_debt(conn: &Connection, user_id: i64, id: i64) -> EngineResult<Debt> {
    let sql = format!("SELECT {} FROM debts WHERE id=?1 AND user_id=?2", DEBT_COLUMNS);
    conn.query_row(&sql, params![id, user_id], RawDebt::from_row)
        .optional()?
        .ok_or_else(|| EngineError::not_found(format!("debt {}", id)))?
        .decode()
}

pub fn list_debts(conn: &Connection, user_id: i64) -> EngineResult<Vec<Debt>> {
    let sql = format!(
        "SELECT {} FROM debts WHERE user_id=?1 ORDER BY name, id",
        DEBT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], RawDebt::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.decode()?);
    }
    Ok(out)
}

pub fn update_debt(
    conn: &Connection,
    cfg: &Config,
    user_id: i64,
    id: i64,
    input: DebtInput,
) -> EngineResult<Debt> {
    get_debt(conn, user_id, id)?;
    validate(&input)?;
    let currency = currency_or_default(input.currency.as_deref(), cfg);
    conn.execute(
        "UPDATE debts SET name=?1, type=?2, original_amount=?3, current_balance=?4,
                interest_rate=?5, minimum_payment=?6, currency=?7, due_day=?8, start_date=?9
         WHERE id=?10 AND user_id=?11",
        params![
            input.name.trim(),
            input.kind.as_str(),
            input.original_amount.to_string(),
            input.current_balance.to_string(),
            input.annual_rate.to_string(),
            input.minimum_payment.to_string(),
            currency,
            input.due_day,
            encode_date(input.start_date),
            id,
            user_id
        ],
    )?;
    get_debt(conn, user_id, id)
}

pub fn delete_debt(conn: &Connection, user_id: i64, id: i64) -> EngineResult<()> {
    let removed = conn.execute(
        "DELETE FROM debts WHERE id=?1 AND user_id=?2",
        params![id, user_id],
    )?;
    if removed == 0 {
        return Err(EngineError::not_found(format!("debt {}", id)));
    }
    Ok(())
}

/// Splits a payment into interest and principal at the debt's current balance
/// and applies the principal.
///
/// Interest is one month at the stated APR, rounded to cents, and is paid
/// first; a payment smaller than that interest is all interest. The payment
/// row and the balance change commit together.
pub fn make_payment(
    conn: &Connection,
    user_id: i64,
    id: i64,
    amount: Decimal,
    date: NaiveDate,
) -> EngineResult<(Debt, DebtPayment)> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::invalid("payment amount must be positive"));
    }
    let debt = get_debt(conn, user_id, id)?;
    let accrued = round_money(debt.current_balance * monthly_rate(debt.annual_rate));
    let (principal, interest) = if amount < accrued {
        (Decimal::ZERO, amount)
    } else {
        (amount - accrued, accrued)
    };
    if principal > debt.current_balance {
        return Err(EngineError::invalid(format!(
            "payment {} exceeds the payoff amount {}",
            amount,
            debt.current_balance + accrued
        )));
    }
    let new_balance = debt.current_balance - principal;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO debt_payments(debt_id, amount, principal, interest, date)
         VALUES (?1,?2,?3,?4,?5)",
        params![
            id,
            amount.to_string(),
            principal.to_string(),
            interest.to_string(),
            encode_date(date)
        ],
    )?;
    let payment_id = tx.last_insert_rowid();
    tx.execute(
        "UPDATE debts SET current_balance=?1 WHERE id=?2",
        params![new_balance.to_string(), id],
    )?;
    tx.commit()?;

    info!(debt_id = id, %amount, %principal, %interest, balance = %new_balance, "payment recorded");
    let payment = DebtPayment {
        id: payment_id,
        debt_id: id,
        amount,
        principal,
        interest,
        date,
    };
    Ok((get_debt(conn, user_id, id)?, payment))
}

pub fn list_payments(conn: &Connection, user_id: i64, id: i64) -> EngineResult<Vec<DebtPayment>> {
    get_debt(conn, user_id, id)?;
    let mut stmt = conn.prepare(
        "SELECT id, debt_id, amount, principal, interest, date FROM debt_payments
         WHERE debt_id=?1 ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![id], payment_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(decode_payment(row?)?);
    }
    Ok(out)
}

/// Payoff simulation for a stored debt. A missing or zero payment falls back
/// to the debt's minimum payment.
pub fn payoff_plan(
    conn: &Connection,
    cfg: &Config,
    user_id: i64,
    id: i64,
    monthly_payment: Option<Decimal>,
    today: NaiveDate,
) -> EngineResult<PayoffPlan> {
    let debt = get_debt(conn, user_id, id)?;
    let payment = match monthly_payment {
        Some(p) if p.is_sign_negative() && !p.is_zero() => {
            return Err(EngineError::invalid("monthly payment cannot be negative"));
        }
        Some(p) if !p.is_zero() => p,
        _ => debt.minimum_payment,
    };
    let input = PayoffInput {
        debt_id: Some(debt.id),
        balance: debt.current_balance,
        annual_rate: debt.annual_rate,
        monthly_payment: payment,
        max_months: cfg.payoff_cap_months,
    };
    Ok(calculate_payoff_plan(&input, today))
}

#[derive(Debug, Clone, Serialize)]
pub struct DebtSummary {
    pub currency: String,
    pub debts: usize,
    pub total_balance: Decimal,
    pub total_minimum_payment: Decimal,
}

/// Per-currency totals; amounts in different currencies are never mixed.
pub fn summarize(debts: &[Debt]) -> Vec<DebtSummary> {
    let mut out: Vec<DebtSummary> = Vec::new();
    for debt in debts {
        match out.iter_mut().find(|s| s.currency == debt.currency) {
            Some(s) => {
                s.debts += 1;
                s.total_balance += debt.current_balance;
                s.total_minimum_payment += debt.minimum_payment;
            }
            None => out.push(DebtSummary {
                currency: debt.currency.clone(),
                debts: 1,
                total_balance: debt.current_balance,
                total_minimum_payment: debt.minimum_payment,
            }),
        }
    }
    out.sort_by(|a, b| a.currency.cmp(&b.currency));
    out
}

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, cfg, sub)?,
        Some(("list", sub)) => list(conn, cfg, sub)?,
        Some(("show", sub)) => show(conn, cfg, sub)?,
        Some(("update", sub)) => update(conn, cfg, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").context("id")?;
            delete_debt(conn, acting_user(sub, cfg), id)?;
            println!("Deleted debt {}", id);
        }
        Some(("pay", sub)) => pay(conn, cfg, sub)?,
        Some(("payments", sub)) => payments(conn, cfg, sub)?,
        Some(("plan", sub)) => plan(conn, cfg, sub)?,
        Some(("summary", sub)) => summary(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

fn decimal_arg(sub: &clap::ArgMatches, name: &str) -> Result<Option<Decimal>> {
    sub.get_one::<String>(name).map(|s| parse_decimal(s)).transpose()
}

fn input_from_args(sub: &clap::ArgMatches, base: Option<&Debt>) -> Result<DebtInput> {
    let name = sub
        .get_one::<String>("name")
        .cloned()
        .or_else(|| base.map(|d| d.name.clone()))
        .context("--name is required")?;
    let kind = match sub.get_one::<String>("type") {
        Some(raw) => raw.parse::<DebtKind>()?,
        None => base.map(|d| d.kind).unwrap_or(DebtKind::Other),
    };
    let original_amount = decimal_arg(sub, "original")?
        .or(base.map(|d| d.original_amount))
        .context("--original is required")?;
    let current_balance = decimal_arg(sub, "balance")?
        .or(base.map(|d| d.current_balance))
        .unwrap_or(Decimal::ZERO);
    let annual_rate = decimal_arg(sub, "rate")?
        .or(base.map(|d| d.annual_rate))
        .context("--rate is required")?;
    let minimum_payment = decimal_arg(sub, "min-payment")?
        .or(base.map(|d| d.minimum_payment))
        .context("--min-payment is required")?;
    let due_day = sub
        .get_one::<u32>("due-day")
        .copied()
        .or(base.map(|d| d.due_day))
        .unwrap_or(1);
    let start_date = match sub.get_one::<String>("start") {
        Some(raw) => parse_date(raw)?,
        None => base
            .map(|d| d.start_date)
            .unwrap_or_else(|| Utc::now().date_naive()),
    };
    let currency = sub
        .get_one::<String>("currency")
        .cloned()
        .or_else(|| base.map(|d| d.currency.clone()));
    Ok(DebtInput {
        name,
        kind,
        original_amount,
        current_balance,
        annual_rate,
        minimum_payment,
        currency,
        due_day,
        start_date,
    })
}

fn debt_row(d: &Debt) -> Vec<String> {
    vec![
        d.id.to_string(),
        d.name.clone(),
        d.kind.as_str().to_string(),
        fmt_money(&d.current_balance, &d.currency),
        format!("{}%", d.annual_rate.normalize()),
        fmt_money(&d.minimum_payment, &d.currency),
        d.due_day.to_string(),
    ]
}

const DEBT_HEADERS: [&str; 7] = ["ID", "Name", "Type", "Balance", "APR", "Minimum", "Due day"];

fn add(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let input = input_from_args(sub, None)?;
    let debt = create_debt(conn, cfg, acting_user(sub, cfg), input)?;
    println!(
        "Added debt {} '{}' ({})",
        debt.id,
        debt.name,
        fmt_money(&debt.current_balance, &debt.currency)
    );
    Ok(())
}

fn list(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let debts = list_debts(conn, acting_user(sub, cfg))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &debts)? {
        let rows = debts.iter().map(debt_row).collect();
        println!("{}", pretty_table(&DEBT_HEADERS, rows));
    }
    Ok(())
}

fn show(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").context("id")?;
    let debt = get_debt(conn, acting_user(sub, cfg), id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &debt)? {
        println!("{}", pretty_table(&DEBT_HEADERS, vec![debt_row(&debt)]));
    }
    Ok(())
}

fn update(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = acting_user(sub, cfg);
    let id = *sub.get_one::<i64>("id").context("id")?;
    let current = get_debt(conn, user, id)?;
    let input = input_from_args(sub, Some(&current))?;
    let debt = update_debt(conn, cfg, user, id, input)?;
    println!("Updated debt {} '{}'", debt.id, debt.name);
    Ok(())
}

fn pay(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").context("id")?;
    let amount = parse_money(sub.get_one::<String>("amount").context("--amount")?)?;
    let date = match sub.get_one::<String>("date") {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().date_naive(),
    };
    let (debt, payment) = make_payment(conn, acting_user(sub, cfg), id, amount, date)?;
    println!(
        "Paid {} on {}: principal {}, interest {}; balance now {}",
        fmt_money(&payment.amount, &debt.currency),
        payment.date,
        fmt_money(&payment.principal, &debt.currency),
        fmt_money(&payment.interest, &debt.currency),
        fmt_money(&debt.current_balance, &debt.currency)
    );
    Ok(())
}

fn payments(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").context("id")?;
    let data = list_payments(conn, acting_user(sub, cfg), id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|p| {
                vec![
                    p.date.to_string(),
                    format!("{:.2}", p.amount),
                    format!("{:.2}", p.principal),
                    format!("{:.2}", p.interest),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Amount", "Principal", "Interest"], rows)
        );
    }
    Ok(())
}

fn plan(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").context("id")?;
    let monthly = decimal_arg(sub, "monthly")?;
    let today = as_of(sub)?;
    let plan = payoff_plan(conn, cfg, acting_user(sub, cfg), id, monthly, today)?;

    if let Some(path) = sub.get_one::<String>("csv") {
        write_schedule_csv(&plan, path)?;
        println!("Wrote {} rows to {}", plan.amortization.len(), path);
    }
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &plan)? {
        return Ok(());
    }
    let rows = plan
        .amortization
        .iter()
        .map(|r| {
            vec![
                r.month.to_string(),
                format!("{:.2}", r.payment),
                format!("{:.2}", r.principal),
                format!("{:.2}", r.interest),
                format!("{:.2}", r.remaining_balance),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Payment", "Principal", "Interest", "Balance"], rows)
    );
    if plan.pays_off() {
        println!(
            "Paid off in {} months on {}: total {:.2}, interest {:.2}",
            plan.months_to_payoff, plan.payoff_date, plan.total_payment, plan.total_interest
        );
    } else {
        println!(
            "Not paid off within {} months at {:.2}/month; {:.2} still owed",
            plan.months_to_payoff,
            plan.monthly_payment,
            plan.final_balance()
        );
    }
    Ok(())
}

pub fn write_schedule_csv(plan: &PayoffPlan, path: &str) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("Create {}", path))?;
    wtr.write_record(["month", "payment", "principal", "interest", "remaining_balance"])?;
    for r in &plan.amortization {
        wtr.write_record([
            r.month.to_string(),
            r.payment.to_string(),
            r.principal.to_string(),
            r.interest.to_string(),
            r.remaining_balance.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn summary(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let data = summarize(&list_debts(conn, acting_user(sub, cfg))?);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|s| {
                vec![
                    s.currency.clone(),
                    s.debts.to_string(),
                    format!("{:.2}", s.total_balance),
                    format!("{:.2}", s.total_minimum_payment),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["CCY", "Debts", "Balance", "Minimum / month"], rows)
        );
    }
    Ok(())
}
