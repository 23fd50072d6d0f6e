// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Financial projection engine.
//!
//! `interest`, `amortization` and `occurrence` are pure and stateless. The
//! `scheduler` is the only part that writes, and it does so through the
//! [`scheduler::RecurringStore`] and [`scheduler::LedgerSink`] traits.

pub mod amortization;
pub mod interest;
pub mod occurrence;
pub mod scheduler;

pub use amortization::{MAX_PAYOFF_MONTHS, PayoffInput, calculate_payoff_plan};
pub use interest::{InterestInput, PaymentType, calculate_interest};
pub use occurrence::{add_months, next_occurrence};
pub use scheduler::{
    DefinitionOutcome, DueDefinition, LedgerSink, ProcessReport, RecurringScheduler,
    RecurringStore, UnreadableDefinition,
};
