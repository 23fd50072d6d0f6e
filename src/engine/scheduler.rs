// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Materializes due recurring definitions into ledger transactions.
//!
//! One tick advances every due definition by exactly one period, dating the
//! new transaction at the occurrence it stands for. A definition that is
//! several periods behind needs several ticks to catch up.
//!
//! Ticks must not overlap: two concurrent ticks can both see the same
//! definition as due and write it twice. The deployment owns that guarantee.

use super::occurrence::next_occurrence;
use crate::errors::{EngineError, EngineResult};
use crate::models::{NewLedgerTransaction, RecurringDefinition};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// A due row the store could not turn into a definition.
#[derive(Debug)]
pub struct UnreadableDefinition {
    pub recurring_id: i64,
    pub error: EngineError,
}

pub type DueDefinition = Result<RecurringDefinition, UnreadableDefinition>;

/// Source of recurring definitions and owner of their scheduling pointer.
pub trait RecurringStore {
    /// Active definitions whose next occurrence is on or before `now` and
    /// whose end date, if any, has not passed that occurrence. A row that
    /// fails to decode comes back as `Err` so the rest of the tick proceeds.
    fn due_definitions(&self, now: DateTime<Utc>) -> EngineResult<Vec<DueDefinition>>;

    /// Moves the pointer forward and stamps the generation time.
    fn advance(
        &self,
        recurring_id: i64,
        generated_at: DateTime<Utc>,
        next_occurrence: NaiveDate,
    ) -> EngineResult<()>;
}

/// Ledger that receives generated transactions.
pub trait LedgerSink {
    /// Returns the id of the new ledger transaction.
    fn create_transaction(&self, tx: &NewLedgerTransaction) -> EngineResult<i64>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DefinitionOutcome {
    Advanced {
        recurring_id: i64,
        transaction_id: i64,
        occurred_on: NaiveDate,
        next_occurrence: NaiveDate,
    },
    Skipped {
        recurring_id: i64,
        reason: String,
    },
}

impl DefinitionOutcome {
    pub fn recurring_id(&self) -> i64 {
        match self {
            DefinitionOutcome::Advanced { recurring_id, .. }
            | DefinitionOutcome::Skipped { recurring_id, .. } => *recurring_id,
        }
    }

    pub fn is_advanced(&self) -> bool {
        matches!(self, DefinitionOutcome::Advanced { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub processed_at: DateTime<Utc>,
    pub outcomes: Vec<DefinitionOutcome>,
}

impl ProcessReport {
    pub fn advanced_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_advanced()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.advanced_count()
    }
}

pub struct RecurringScheduler<'a, S, L> {
    store: &'a S,
    ledger: &'a L,
}

impl<'a, S, L> RecurringScheduler<'a, S, L>
where
    S: RecurringStore,
    L: LedgerSink,
{
    pub fn new(store: &'a S, ledger: &'a L) -> Self {
        RecurringScheduler { store, ledger }
    }

    /// Runs one tick.
    ///
    /// Only a failure to list due definitions aborts the tick. Anything that
    /// goes wrong for a single definition is recorded as `Skipped` and its
    /// pointer stays put, so the next tick retries it.
    pub fn process_due(&self, now: DateTime<Utc>) -> EngineResult<ProcessReport> {
        let due = self.store.due_definitions(now)?;
        debug!(due = due.len(), %now, "processing recurring definitions");

        let outcomes: Vec<DefinitionOutcome> = due
            .iter()
            .map(|entry| match entry {
                Ok(def) => self.process_one(def, now),
                Err(bad) => {
                    warn!(
                        recurring_id = bad.recurring_id,
                        persistence = bad.error.is_persistence(),
                        error = %bad.error,
                        "skipping unreadable recurring definition"
                    );
                    DefinitionOutcome::Skipped {
                        recurring_id: bad.recurring_id,
                        reason: format!("definition unreadable: {}", bad.error),
                    }
                }
            })
            .collect();

        let report = ProcessReport {
            processed_at: now,
            outcomes,
        };
        info!(
            due = due.len(),
            advanced = report.advanced_count(),
            skipped = report.skipped_count(),
            "recurring tick finished"
        );
        Ok(report)
    }

    fn process_one(&self, def: &RecurringDefinition, now: DateTime<Utc>) -> DefinitionOutcome {
        let skipped = |reason: String, persistence: bool| {
            warn!(recurring_id = def.id, persistence, %reason, "skipping recurring definition");
            DefinitionOutcome::Skipped {
                recurring_id: def.id,
                reason,
            }
        };

        // From the pending occurrence, never from `now`.
        let next = match next_occurrence(def.next_occurrence, def.frequency) {
            Ok(next) => next,
            Err(err) => return skipped(err.to_string(), err.is_persistence()),
        };

        let tx = NewLedgerTransaction::from_definition(def);
        let transaction_id = match self.ledger.create_transaction(&tx) {
            Ok(id) => id,
            Err(err) => {
                return skipped(
                    format!("transaction not created: {}", err),
                    err.is_persistence(),
                );
            }
        };

        if let Err(err) = self.store.advance(def.id, now, next) {
            error!(
                recurring_id = def.id,
                transaction_id,
                error = %err,
                "transaction created but pointer not advanced"
            );
            return DefinitionOutcome::Skipped {
                recurring_id: def.id,
                reason: format!(
                    "transaction {} created but pointer not advanced: {}",
                    transaction_id, err
                ),
            };
        }

        debug!(
            recurring_id = def.id,
            transaction_id,
            occurred_on = %def.next_occurrence,
            next_occurrence = %next,
            "recurring definition advanced"
        );
        DefinitionOutcome::Advanced {
            recurring_id: def.id,
            transaction_id,
            occurred_on: def.next_occurrence,
            next_occurrence: next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, TransactionType};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::collections::HashSet;

    struct MemoryStore {
        defs: RefCell<Vec<RecurringDefinition>>,
        fail_advance: HashSet<i64>,
        unreadable: Vec<i64>,
    }

    impl RecurringStore for MemoryStore {
        fn due_definitions(&self, now: DateTime<Utc>) -> EngineResult<Vec<DueDefinition>> {
            let today = now.date_naive();
            let unreadable = self.unreadable.iter().map(|&id| {
                Err(UnreadableDefinition {
                    recurring_id: id,
                    error: EngineError::Corrupt(format!("amount 'x{}'", id)),
                })
            });
            Ok(self
                .defs
                .borrow()
                .iter()
                .filter(|d| d.is_active && d.next_occurrence <= today)
                .cloned()
                .map(Ok)
                .chain(unreadable)
                .collect())
        }

        fn advance(&self, id: i64, at: DateTime<Utc>, next: NaiveDate) -> EngineResult<()> {
            if self.fail_advance.contains(&id) {
                return Err(EngineError::Persistence(rusqlite::Error::QueryReturnedNoRows));
            }
            let mut defs = self.defs.borrow_mut();
            let def = defs.iter_mut().find(|d| d.id == id).unwrap();
            def.next_occurrence = next;
            def.last_generated = Some(at);
            Ok(())
        }
    }

    struct MemoryLedger {
        created: RefCell<Vec<NewLedgerTransaction>>,
        reject_category: Option<&'static str>,
    }

    impl LedgerSink for MemoryLedger {
        fn create_transaction(&self, tx: &NewLedgerTransaction) -> EngineResult<i64> {
            if self.reject_category == Some(tx.category.as_str()) {
                return Err(EngineError::Persistence(rusqlite::Error::InvalidQuery));
            }
            let mut created = self.created.borrow_mut();
            created.push(tx.clone());
            Ok(created.len() as i64)
        }
    }

    fn def(id: i64, category: &str, next: NaiveDate) -> RecurringDefinition {
        RecurringDefinition {
            id,
            user_id: 1,
            r#type: TransactionType::Expense,
            amount: dec!(42.50),
            currency: "USD".into(),
            category: category.into(),
            description: "Gym".into(),
            frequency: Frequency::Monthly,
            start_date: next,
            end_date: None,
            next_occurrence: next,
            is_active: true,
            last_generated: None,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap()
    }

    #[test]
    fn failed_creation_leaves_pointer() {
        let store = MemoryStore {
            defs: RefCell::new(vec![
                def(1, "health", ymd(2024, 2, 1)),
                def(2, "broken", ymd(2024, 2, 1)),
            ]),
            fail_advance: HashSet::new(),
            unreadable: Vec::new(),
        };
        let ledger = MemoryLedger {
            created: RefCell::new(Vec::new()),
            reject_category: Some("broken"),
        };
        let report = RecurringScheduler::new(&store, &ledger).process_due(now()).unwrap();

        assert_eq!(report.advanced_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        let skipped = report.outcomes.iter().find(|o| !o.is_advanced()).unwrap();
        assert_eq!(skipped.recurring_id(), 2);
        let defs = store.defs.borrow();
        assert_eq!(defs[0].next_occurrence, ymd(2024, 3, 1));
        assert_eq!(defs[1].next_occurrence, ymd(2024, 2, 1));
        assert!(defs[1].last_generated.is_none());
    }

    #[test]
    fn failed_advance_is_reported_as_skip() {
        let store = MemoryStore {
            defs: RefCell::new(vec![def(7, "health", ymd(2024, 2, 1))]),
            fail_advance: HashSet::from([7]),
            unreadable: Vec::new(),
        };
        let ledger = MemoryLedger {
            created: RefCell::new(Vec::new()),
            reject_category: None,
        };
        let report = RecurringScheduler::new(&store, &ledger).process_due(now()).unwrap();
        assert_eq!(report.advanced_count(), 0);
        match &report.outcomes[0] {
            DefinitionOutcome::Skipped { reason, .. } => {
                assert!(reason.contains("transaction 1 created"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn generated_transaction_mirrors_definition() {
        let store = MemoryStore {
            defs: RefCell::new(vec![def(3, "health", ymd(2024, 1, 15))]),
            fail_advance: HashSet::new(),
            unreadable: Vec::new(),
        };
        let ledger = MemoryLedger {
            created: RefCell::new(Vec::new()),
            reject_category: None,
        };
        RecurringScheduler::new(&store, &ledger).process_due(now()).unwrap();
        let created = ledger.created.borrow();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].date, ymd(2024, 1, 15));
        assert_eq!(created[0].description, "Gym (recurring)");
        assert_eq!(created[0].recurring_id, 3);
        assert_eq!(created[0].amount, dec!(42.50));
    }

    #[test]
    fn unreadable_row_is_skipped_not_fatal() {
        let store = MemoryStore {
            defs: RefCell::new(vec![def(4, "health", ymd(2024, 2, 1))]),
            fail_advance: HashSet::new(),
            unreadable: vec![9],
        };
        let ledger = MemoryLedger {
            created: RefCell::new(Vec::new()),
            reject_category: None,
        };
        let report = RecurringScheduler::new(&store, &ledger).process_due(now()).unwrap();
        assert_eq!(report.advanced_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        match report.outcomes.iter().find(|o| o.recurring_id() == 9) {
            Some(DefinitionOutcome::Skipped { reason, .. }) => assert!(reason.contains("unreadable")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(ledger.created.borrow().len(), 1);
    }
}
