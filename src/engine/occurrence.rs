// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{EngineError, EngineResult};
use crate::models::Frequency;
use chrono::{Duration, Months, NaiveDate};

/// Adds calendar months, clamping the day to the end of a shorter target month
/// (Jan 31 + 1 month is Feb 28, or Feb 29 in a leap year).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Next scheduled date after `from`.
///
/// Monthly and yearly steps clamp to month end and are taken from `from`
/// itself, so a series started on the 31st settles on the 28th after February.
pub fn next_occurrence(from: NaiveDate, frequency: Frequency) -> EngineResult<NaiveDate> {
    let next = match frequency {
        Frequency::Daily => from.checked_add_signed(Duration::days(1)),
        Frequency::Weekly => from.checked_add_signed(Duration::days(7)),
        Frequency::Biweekly => from.checked_add_signed(Duration::days(14)),
        Frequency::Monthly => add_months(from, 1),
        Frequency::Yearly => add_months(from, 12),
        // Stored values outside the allow-list schedule monthly.
        Frequency::Unrecognized => add_months(from, 1),
    };
    next.ok_or_else(|| EngineError::invalid(format!("no {} occurrence after {}", frequency, from)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fixed_day_steps() {
        let start = d(2024, 12, 28);
        assert_eq!(next_occurrence(start, Frequency::Daily).unwrap(), d(2024, 12, 29));
        assert_eq!(next_occurrence(start, Frequency::Weekly).unwrap(), d(2025, 1, 4));
        assert_eq!(next_occurrence(start, Frequency::Biweekly).unwrap(), d(2025, 1, 11));
    }

    #[test]
    fn calendar_steps_clamp_to_month_end() {
        assert_eq!(next_occurrence(d(2024, 1, 31), Frequency::Monthly).unwrap(), d(2024, 2, 29));
        assert_eq!(next_occurrence(d(2023, 1, 31), Frequency::Monthly).unwrap(), d(2023, 2, 28));
        assert_eq!(next_occurrence(d(2024, 2, 29), Frequency::Yearly).unwrap(), d(2025, 2, 28));
        assert_eq!(next_occurrence(d(2024, 12, 15), Frequency::Monthly).unwrap(), d(2025, 1, 15));
    }

    #[test]
    fn unrecognized_behaves_like_monthly() {
        let from = d(2024, 3, 10);
        assert_eq!(
            next_occurrence(from, Frequency::Unrecognized).unwrap(),
            next_occurrence(from, Frequency::Monthly).unwrap()
        );
    }

    #[test]
    fn twelve_months_equal_one_year() {
        for day in [1, 9, 15, 28] {
            for month in 1..=12 {
                let start = d(2023, month, day);
                let mut monthly = start;
                for _ in 0..12 {
                    monthly = next_occurrence(monthly, Frequency::Monthly).unwrap();
                }
                assert_eq!(monthly, next_occurrence(start, Frequency::Yearly).unwrap());
            }
        }
    }

    #[test]
    fn overflow_is_reported() {
        assert!(next_occurrence(NaiveDate::MAX, Frequency::Daily).is_err());
    }
}
