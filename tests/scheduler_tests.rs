// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use rust_decimal_macros::dec;
use wealthpath::commands::recurring::{self, CreateRecurring};
use wealthpath::config::Config;
use wealthpath::engine::{DefinitionOutcome, RecurringScheduler};
use wealthpath::models::{Frequency, TransactionType};
use wealthpath::store::SqliteStore;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    wealthpath::db::init_schema(&conn).unwrap();
    conn
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn monthly(conn: &Connection, start: NaiveDate, end: Option<NaiveDate>) -> i64 {
    let input = CreateRecurring {
        r#type: TransactionType::Expense,
        amount: dec!(1500),
        currency: Some("USD".into()),
        category: "Housing".into(),
        description: "Rent".into(),
        frequency: Frequency::Monthly,
        start_date: start,
        end_date: end,
    };
    recurring::create_recurring(conn, &Config::default(), 1, input)
        .unwrap()
        .id
}

fn tick(conn: &Connection, y: i32, m: u32, day: u32) -> Vec<DefinitionOutcome> {
    let store = SqliteStore::new(conn);
    let now = Utc.with_ymd_and_hms(y, m, day, 6, 0, 0).unwrap();
    RecurringScheduler::new(&store, &store)
        .process_due(now)
        .unwrap()
        .outcomes
}

#[test]
fn each_tick_catches_up_one_period() {
    let conn = setup();
    let id = monthly(&conn, d(2024, 1, 15), None);

    let first = tick(&conn, 2024, 3, 1);
    assert_eq!(first.len(), 1);
    match &first[0] {
        DefinitionOutcome::Advanced {
            recurring_id,
            occurred_on,
            next_occurrence,
            ..
        } => {
            assert_eq!(*recurring_id, id);
            assert_eq!(*occurred_on, d(2024, 1, 15));
            assert_eq!(*next_occurrence, d(2024, 2, 15));
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let second = tick(&conn, 2024, 3, 1);
    assert!(matches!(
        second.as_slice(),
        [DefinitionOutcome::Advanced { occurred_on, next_occurrence, .. }]
            if *occurred_on == d(2024, 2, 15) && *next_occurrence == d(2024, 3, 15)
    ));

    assert!(tick(&conn, 2024, 3, 1).is_empty());

    let def = recurring::get_recurring(&conn, 1, id).unwrap();
    assert_eq!(def.next_occurrence, d(2024, 3, 15));
    assert!(def.last_generated.is_some());

    let ledger = SqliteStore::new(&conn).ledger_for_user(1, 10).unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].date, d(2024, 2, 15));
    assert_eq!(ledger[1].date, d(2024, 1, 15));
    for tx in &ledger {
        assert_eq!(tx.description, "Rent (recurring)");
        assert_eq!(tx.recurring_id, Some(id));
        assert_eq!(tx.source, "recurring");
        assert_eq!(tx.amount, dec!(1500));
        assert_eq!(tx.r#type, TransactionType::Expense);
    }
}

#[test]
fn nothing_due_before_start() {
    let conn = setup();
    monthly(&conn, d(2024, 5, 1), None);
    assert!(tick(&conn, 2024, 4, 30).is_empty());
    assert_eq!(tick(&conn, 2024, 5, 1).len(), 1);
}

#[test]
fn end_date_stops_generation() {
    let conn = setup();
    let id = monthly(&conn, d(2024, 1, 15), Some(d(2024, 2, 1)));
    assert_eq!(tick(&conn, 2024, 6, 1).len(), 1);
    assert!(tick(&conn, 2024, 6, 1).is_empty());
    let def = recurring::get_recurring(&conn, 1, id).unwrap();
    assert_eq!(def.next_occurrence, d(2024, 2, 15));
}

#[test]
fn paused_definitions_are_left_alone() {
    let conn = setup();
    let id = monthly(&conn, d(2024, 1, 15), None);
    recurring::pause_recurring(&conn, 1, id).unwrap();
    assert!(tick(&conn, 2024, 3, 1).is_empty());

    recurring::resume_recurring(&conn, 1, id).unwrap();
    let outcomes = tick(&conn, 2024, 3, 1);
    assert!(matches!(
        outcomes.as_slice(),
        [DefinitionOutcome::Advanced { occurred_on, .. }] if *occurred_on == d(2024, 1, 15)
    ));
}

#[test]
fn month_end_clamps_from_the_current_pointer() {
    let conn = setup();
    let id = monthly(&conn, d(2024, 1, 31), None);
    tick(&conn, 2024, 12, 31);
    assert_eq!(recurring::get_recurring(&conn, 1, id).unwrap().next_occurrence, d(2024, 2, 29));
    tick(&conn, 2024, 12, 31);
    assert_eq!(recurring::get_recurring(&conn, 1, id).unwrap().next_occurrence, d(2024, 3, 29));
}

#[test]
fn definitions_are_processed_independently() {
    let conn = setup();
    let a = monthly(&conn, d(2024, 1, 10), None);
    let b = monthly(&conn, d(2024, 2, 20), None);
    // Corrupt one row's frequency; the other still advances.
    conn.execute(
        "UPDATE recurring_transactions SET frequency='fortnightly' WHERE id=?1",
        [b],
    )
    .unwrap();

    let outcomes = tick(&conn, 2024, 3, 1);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_advanced()));
    assert_eq!(recurring::get_recurring(&conn, 1, a).unwrap().next_occurrence, d(2024, 2, 10));
    // Unknown frequencies advance monthly.
    assert_eq!(recurring::get_recurring(&conn, 1, b).unwrap().next_occurrence, d(2024, 3, 20));
}

#[test]
fn undecodable_row_does_not_block_the_tick() {
    let conn = setup();
    let healthy = monthly(&conn, d(2024, 1, 10), None);
    let broken = monthly(&conn, d(2024, 1, 20), None);
    conn.execute(
        "UPDATE recurring_transactions SET amount='abc' WHERE id=?1",
        [broken],
    )
    .unwrap();

    let outcomes = tick(&conn, 2024, 3, 1);
    assert_eq!(outcomes.len(), 2);
    let skipped: Vec<_> = outcomes.iter().filter(|o| !o.is_advanced()).collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].recurring_id(), broken);
    assert_eq!(
        recurring::get_recurring(&conn, 1, healthy).unwrap().next_occurrence,
        d(2024, 2, 10)
    );

    // The broken row keeps being reported while the healthy one catches up.
    let outcomes = tick(&conn, 2024, 3, 1);
    assert_eq!(outcomes.iter().filter(|o| o.is_advanced()).count(), 1);
    let ledger = SqliteStore::new(&conn).ledger_for_user(1, 10).unwrap();
    assert!(ledger.iter().all(|tx| tx.recurring_id == Some(healthy)));
    assert_eq!(ledger.len(), 2);
}
