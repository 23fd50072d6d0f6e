// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite adapter for the scheduler traits, plus the row decoders shared by
//! the command modules.

use crate::engine::{DueDefinition, LedgerSink, RecurringStore, UnreadableDefinition};
use crate::errors::{EngineError, EngineResult};
use crate::models::{
    Debt, DebtKind, DebtPayment, Frequency, LedgerTransaction, NewLedgerTransaction,
    RecurringDefinition, SavingsGoal, TransactionType,
};
use crate::money::decode_decimal;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, Row, params};

pub const DATE_FMT: &str = "%Y-%m-%d";

pub const RECURRING_COLUMNS: &str = "id, user_id, type, amount, currency, category, description, \
     frequency, start_date, end_date, next_occurrence, is_active, last_generated";

pub const TRANSACTION_COLUMNS: &str =
    "id, user_id, type, amount, currency, category, description, date, recurring_id, source";

pub const SAVINGS_COLUMNS: &str =
    "id, user_id, name, target_amount, current_amount, currency, target_date";

pub const DEBT_COLUMNS: &str = "id, user_id, name, type, original_amount, current_balance, \
     interest_rate, minimum_payment, currency, due_day, start_date";

pub fn encode_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn decode_date(raw: &str, column: &str) -> EngineResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FMT)
        .map_err(|_| EngineError::Corrupt(format!("{} '{}'", column, raw)))
}

fn decode_timestamp(raw: &str) -> EngineResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| EngineError::Corrupt(format!("last_generated '{}'", raw)))
}

/// Text columns as SQLite hands them back, before domain parsing.
pub struct RawRecurring {
    id: i64,
    user_id: i64,
    r#type: String,
    amount: String,
    currency: String,
    category: String,
    description: String,
    frequency: String,
    start_date: String,
    end_date: Option<String>,
    next_occurrence: String,
    is_active: bool,
    last_generated: Option<String>,
}

impl RawRecurring {
    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawRecurring {
            id: r.get(0)?,
            user_id: r.get(1)?,
            r#type: r.get(2)?,
            amount: r.get(3)?,
            currency: r.get(4)?,
            category: r.get(5)?,
            description: r.get(6)?,
            frequency: r.get(7)?,
            start_date: r.get(8)?,
            end_date: r.get(9)?,
            next_occurrence: r.get(10)?,
            is_active: r.get(11)?,
            last_generated: r.get(12)?,
        })
    }

    pub fn decode(self) -> EngineResult<RecurringDefinition> {
        let r#type = self
            .r#type
            .parse::<TransactionType>()
            .map_err(|_| EngineError::Corrupt(format!("type '{}'", self.r#type)))?;
        Ok(RecurringDefinition {
            id: self.id,
            user_id: self.user_id,
            r#type,
            amount: decode_decimal(&self.amount, "amount")?,
            currency: self.currency,
            category: self.category,
            description: self.description,
            frequency: Frequency::from_stored(&self.frequency),
            start_date: decode_date(&self.start_date, "start_date")?,
            end_date: self
                .end_date
                .as_deref()
                .map(|raw| decode_date(raw, "end_date"))
                .transpose()?,
            next_occurrence: decode_date(&self.next_occurrence, "next_occurrence")?,
            is_active: self.is_active,
            last_generated: self
                .last_generated
                .as_deref()
                .map(decode_timestamp)
                .transpose()?,
        })
    }
}

pub struct RawDebt {
    id: i64,
    user_id: i64,
    name: String,
    kind: String,
    original_amount: String,
    current_balance: String,
    interest_rate: String,
    minimum_payment: String,
    currency: String,
    due_day: u32,
    start_date: String,
}

impl RawDebt {
    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawDebt {
            id: r.get(0)?,
            user_id: r.get(1)?,
            name: r.get(2)?,
            kind: r.get(3)?,
            original_amount: r.get(4)?,
            current_balance: r.get(5)?,
            interest_rate: r.get(6)?,
            minimum_payment: r.get(7)?,
            currency: r.get(8)?,
            due_day: r.get(9)?,
            start_date: r.get(10)?,
        })
    }

    pub fn decode(self) -> EngineResult<Debt> {
        let kind = self
            .kind
            .parse::<DebtKind>()
            .map_err(|_| EngineError::Corrupt(format!("debt type '{}'", self.kind)))?;
        Ok(Debt {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            kind,
            original_amount: decode_decimal(&self.original_amount, "original_amount")?,
            current_balance: decode_decimal(&self.current_balance, "current_balance")?,
            annual_rate: decode_decimal(&self.interest_rate, "interest_rate")?,
            minimum_payment: decode_decimal(&self.minimum_payment, "minimum_payment")?,
            currency: self.currency,
            due_day: self.due_day,
            start_date: decode_date(&self.start_date, "start_date")?,
        })
    }
}

pub(crate) fn payment_from_row(r: &Row<'_>) -> rusqlite::Result<(i64, i64, [String; 4])> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        [r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?],
    ))
}

pub(crate) fn decode_payment(raw: (i64, i64, [String; 4])) -> EngineResult<DebtPayment> {
    let (id, debt_id, [amount, principal, interest, date]) = raw;
    Ok(DebtPayment {
        id,
        debt_id,
        amount: decode_decimal(&amount, "amount")?,
        principal: decode_decimal(&principal, "principal")?,
        interest: decode_decimal(&interest, "interest")?,
        date: decode_date(&date, "date")?,
    })
}

pub struct RawTransaction {
    id: i64,
    user_id: i64,
    r#type: String,
    amount: String,
    currency: String,
    category: String,
    description: String,
    date: String,
    recurring_id: Option<i64>,
    source: String,
}

impl RawTransaction {
    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawTransaction {
            id: r.get(0)?,
            user_id: r.get(1)?,
            r#type: r.get(2)?,
            amount: r.get(3)?,
            currency: r.get(4)?,
            category: r.get(5)?,
            description: r.get(6)?,
            date: r.get(7)?,
            recurring_id: r.get(8)?,
            source: r.get(9)?,
        })
    }

    pub fn decode(self) -> EngineResult<LedgerTransaction> {
        Ok(LedgerTransaction {
            id: self.id,
            user_id: self.user_id,
            r#type: self
                .r#type
                .parse()
                .map_err(|_| EngineError::Corrupt(format!("type '{}'", self.r#type)))?,
            amount: decode_decimal(&self.amount, "amount")?,
            currency: self.currency,
            category: self.category,
            description: self.description,
            date: decode_date(&self.date, "date")?,
            recurring_id: self.recurring_id,
            source: self.source,
        })
    }
}

pub struct RawSavingsGoal {
    id: i64,
    user_id: i64,
    name: String,
    target_amount: String,
    current_amount: String,
    currency: String,
    target_date: Option<String>,
}

impl RawSavingsGoal {
    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawSavingsGoal {
            id: r.get(0)?,
            user_id: r.get(1)?,
            name: r.get(2)?,
            target_amount: r.get(3)?,
            current_amount: r.get(4)?,
            currency: r.get(5)?,
            target_date: r.get(6)?,
        })
    }

    pub fn decode(self) -> EngineResult<SavingsGoal> {
        Ok(SavingsGoal {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            target_amount: decode_decimal(&self.target_amount, "target_amount")?,
            current_amount: decode_decimal(&self.current_amount, "current_amount")?,
            currency: self.currency,
            target_date: self
                .target_date
                .as_deref()
                .map(|raw| decode_date(raw, "target_date"))
                .transpose()?,
        })
    }
}

/// Scheduler collaborator backed by one SQLite connection.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteStore { conn }
    }

    pub fn ledger_for_user(&self, user_id: i64, limit: usize) -> EngineResult<Vec<LedgerTransaction>> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE user_id=?1 ORDER BY date DESC, id DESC LIMIT ?2",
            TRANSACTION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![user_id, limit], RawTransaction::from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.decode()?);
        }
        Ok(out)
    }
}

impl RecurringStore for SqliteStore<'_> {
    fn due_definitions(&self, now: DateTime<Utc>) -> EngineResult<Vec<DueDefinition>> {
        let sql = format!(
            "SELECT {} FROM recurring_transactions
             WHERE is_active=1 AND next_occurrence<=?1
               AND (end_date IS NULL OR end_date>=next_occurrence)
             ORDER BY next_occurrence, id",
            RECURRING_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![encode_date(now.date_naive())], RawRecurring::from_row)?;
        let mut due = Vec::new();
        for row in rows {
            let raw = row?;
            let recurring_id = raw.id;
            due.push(
                raw.decode()
                    .map_err(|error| UnreadableDefinition { recurring_id, error }),
            );
        }
        Ok(due)
    }

    fn advance(
        &self,
        recurring_id: i64,
        generated_at: DateTime<Utc>,
        next_occurrence: NaiveDate,
    ) -> EngineResult<()> {
        // The pointer only moves forward.
        let changed = self.conn.execute(
            "UPDATE recurring_transactions SET next_occurrence=?1, last_generated=?2
             WHERE id=?3 AND next_occurrence<?1",
            params![
                encode_date(next_occurrence),
                encode_timestamp(generated_at),
                recurring_id
            ],
        )?;
        if changed == 0 {
            return Err(EngineError::not_found(format!(
                "recurring transaction {} with a pointer before {}",
                recurring_id, next_occurrence
            )));
        }
        Ok(())
    }
}

impl LedgerSink for SqliteStore<'_> {
    fn create_transaction(&self, tx: &NewLedgerTransaction) -> EngineResult<i64> {
        self.conn.execute(
            "INSERT INTO transactions(user_id, type, amount, currency, category, description, date, recurring_id, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'recurring')",
            params![
                tx.user_id,
                tx.r#type.as_str(),
                tx.amount.to_string(),
                tx.currency,
                tx.category,
                tx.description,
                encode_date(tx.date),
                tx.recurring_id
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
