// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::EngineError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(EngineError::invalid(format!(
                "type must be 'income' or 'expense', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a recurring definition fires.
///
/// `Unrecognized` stands for any stored value outside the allow-list. It is
/// never accepted on create or update, but rows carrying it still schedule as
/// monthly instead of failing the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
    #[serde(other)]
    Unrecognized,
}

impl Frequency {
    pub const ALLOWED: [Frequency; 5] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
            Frequency::Unrecognized => "unrecognized",
        }
    }

    /// Lenient decoding for values read back from the store.
    pub fn from_stored(s: &str) -> Frequency {
        s.parse().unwrap_or(Frequency::Unrecognized)
    }
}

impl FromStr for Frequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Frequency::ALLOWED
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| EngineError::invalid(format!("invalid frequency '{}'", s.trim())))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtKind {
    Mortgage,
    AutoLoan,
    StudentLoan,
    CreditCard,
    PersonalLoan,
    Other,
}

impl DebtKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtKind::Mortgage => "mortgage",
            DebtKind::AutoLoan => "auto_loan",
            DebtKind::StudentLoan => "student_loan",
            DebtKind::CreditCard => "credit_card",
            DebtKind::PersonalLoan => "personal_loan",
            DebtKind::Other => "other",
        }
    }
}

impl FromStr for DebtKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "mortgage" => Ok(DebtKind::Mortgage),
            "auto_loan" => Ok(DebtKind::AutoLoan),
            "student_loan" => Ok(DebtKind::StudentLoan),
            "credit_card" => Ok(DebtKind::CreditCard),
            "personal_loan" => Ok(DebtKind::PersonalLoan),
            "other" => Ok(DebtKind::Other),
            other => Err(EngineError::invalid(format!("unknown debt type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debt {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub kind: DebtKind,
    pub original_amount: Decimal,
    pub current_balance: Decimal,
    pub annual_rate: Decimal, // percentage points
    pub minimum_payment: Decimal,
    pub currency: String,
    pub due_day: u32,
    pub start_date: NaiveDate,
}

/// Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtPayment {
    pub id: i64,
    pub debt_id: i64,
    pub amount: Decimal,
    pub principal: Decimal,
    pub interest: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: Decimal,
    pub principal: Decimal,
    pub interest: Decimal,
    pub remaining_balance: Decimal,
}

/// Derived repayment simulation; recomputed on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffPlan {
    pub debt_id: Option<i64>,
    pub current_balance: Decimal,
    pub monthly_payment: Decimal,
    pub total_interest: Decimal,
    pub total_payment: Decimal,
    pub months_to_payoff: u32,
    pub payoff_date: NaiveDate,
    pub amortization: Vec<AmortizationRow>,
}

impl PayoffPlan {
    /// Balance left after the last simulated month.
    pub fn final_balance(&self) -> Decimal {
        self.amortization
            .last()
            .map(|row| row.remaining_balance)
            .unwrap_or(self.current_balance)
    }

    /// False when the cap was reached with money still owed.
    pub fn pays_off(&self) -> bool {
        self.final_balance() <= Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestCalculatorResult {
    pub monthly_payment: Decimal,
    pub total_payment: Decimal,
    pub total_interest: Decimal,
    pub payoff_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringDefinition {
    pub id: i64,
    pub user_id: i64,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_occurrence: NaiveDate,
    pub is_active: bool,
    pub last_generated: Option<DateTime<Utc>>,
}

/// Ledger entry materialized by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLedgerTransaction {
    pub user_id: i64,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub recurring_id: i64,
}

impl NewLedgerTransaction {
    pub fn from_definition(def: &RecurringDefinition) -> Self {
        NewLedgerTransaction {
            user_id: def.user_id,
            r#type: def.r#type,
            amount: def.amount,
            currency: def.currency.clone(),
            category: def.category.clone(),
            description: format!("{} (recurring)", def.description),
            date: def.next_occurrence,
            recurring_id: def.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: i64,
    pub user_id: i64,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub recurring_id: Option<i64>,
    pub source: String, // "manual" | "recurring"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpcomingBill {
    pub recurring_id: i64,
    pub r#type: TransactionType,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub currency: String,
    pub frequency: Frequency,
    pub due_date: NaiveDate,
    pub days_until: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub currency: String,
    pub target_date: Option<NaiveDate>,
}

impl SavingsGoal {
    /// Still to save; zero once the target is met.
    pub fn remaining(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }

    /// Percent of the target saved, to two places, capped at 100.
    pub fn progress_percent(&self) -> Decimal {
        if self.target_amount <= Decimal::ZERO {
            return Decimal::ONE_HUNDRED;
        }
        let pct = self.current_amount / self.target_amount * Decimal::ONE_HUNDRED;
        crate::money::round_money(pct.min(Decimal::ONE_HUNDRED))
    }

    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_allow_list_is_strict() {
        assert_eq!("Weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert!("fortnightly".parse::<Frequency>().is_err());
        assert!("unrecognized".parse::<Frequency>().is_err());
        assert_eq!(Frequency::from_stored("fortnightly"), Frequency::Unrecognized);
    }

    #[test]
    fn frequency_serde_falls_back() {
        let f: Frequency = serde_json::from_str("\"quarterly\"").unwrap();
        assert_eq!(f, Frequency::Unrecognized);
        assert_eq!(serde_json::to_string(&Frequency::Biweekly).unwrap(), "\"biweekly\"");
    }

    #[test]
    fn debt_kind_accepts_dashes() {
        assert_eq!("credit-card".parse::<DebtKind>().unwrap(), DebtKind::CreditCard);
        assert!("timeshare".parse::<DebtKind>().is_err());
    }

    #[test]
    fn savings_progress_is_capped() {
        let mut goal = SavingsGoal {
            id: 1,
            user_id: 1,
            name: "Trip".into(),
            target_amount: Decimal::new(3000, 0),
            current_amount: Decimal::new(1000, 0),
            currency: "USD".into(),
            target_date: None,
        };
        assert_eq!(goal.progress_percent(), Decimal::new(3333, 2));
        assert_eq!(goal.remaining(), Decimal::new(2000, 0));
        goal.current_amount = Decimal::new(3500, 0);
        assert_eq!(goal.progress_percent(), Decimal::ONE_HUNDRED);
        assert!(goal.remaining().is_zero());
        assert!(goal.is_reached());
    }
}
