//! Calendar heat-map aggregation and date selection.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Direction, Transaction};

/// Errors raised when addressing a calendar month.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// The year/month pair does not name a real month.
    #[error("no such month: {year}-{month:02}")]
    InvalidMonth {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },
}

/// Colour of a calendar cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// Net zero or above.
    Positive,
    /// Net below zero.
    Negative,
}

/// Activity of a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayActivity {
    /// Calendar day.
    pub date: NaiveDate,
    /// Sum of expenses.
    pub spent: Decimal,
    /// Sum of income.
    pub received: Decimal,
    /// `received - spent`.
    pub net: Decimal,
    /// Number of transactions on the day.
    pub count: usize,
    /// Cell colour.
    pub indicator: Indicator,
}

impl DayActivity {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            spent: Decimal::ZERO,
            received: Decimal::ZERO,
            net: Decimal::ZERO,
            count: 0,
            indicator: Indicator::Positive,
        }
    }

    fn add(&mut self, transaction: &Transaction) {
        match transaction.direction {
            Direction::Spent => self.spent += transaction.amount.value(),
            Direction::Received => self.received += transaction.amount.value(),
        }
        self.count += 1;
        self.net = self.received - self.spent;
        self.indicator = if self.net < Decimal::ZERO {
            Indicator::Negative
        } else {
            Indicator::Positive
        };
    }
}

/// Activity for `date`, or `None` when nothing happened that day.
pub fn day_activity(transactions: &[Transaction], date: NaiveDate) -> Option<DayActivity> {
    let mut activity = DayActivity::empty(date);
    transactions
        .iter()
        .filter(|t| t.date == date)
        .for_each(|t| activity.add(t));
    (activity.count > 0).then_some(activity)
}

/// Activity for every day of a month that has transactions, oldest first.
///
/// # Errors
/// [`CalendarError::InvalidMonth`] when `month` is outside `1..=12` or the
/// year is out of range.
pub fn month_activity(
    transactions: &[Transaction],
    year: i32,
    month: u32,
) -> Result<Vec<DayActivity>, CalendarError> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(CalendarError::InvalidMonth { year, month })?;
    let mut days: BTreeMap<NaiveDate, DayActivity> = BTreeMap::new();
    for transaction in transactions
        .iter()
        .filter(|t| t.date.year() == year && t.date.month() == month)
    {
        days.entry(transaction.date)
            .or_insert_with(|| DayActivity::empty(transaction.date))
            .add(transaction);
    }
    Ok(days.into_values().collect())
}

/// Transactions on `date`, in ledger order.
pub fn day_detail(transactions: &[Transaction], date: NaiveDate) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.date == date)
        .cloned()
        .collect()
}

/// Selected calendar day of a client; selecting it again clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateSelection(Option<NaiveDate>);

impl DateSelection {
    /// Select `date`, or clear the selection when it is already selected.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use tally::domain::DateSelection;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 5, 17).expect("date");
    /// let mut selection = DateSelection::default();
    /// assert_eq!(selection.toggle(day), Some(day));
    /// assert_eq!(selection.toggle(day), None);
    /// ```
    pub fn toggle(&mut self, date: NaiveDate) -> Option<NaiveDate> {
        self.0 = if self.0 == Some(date) { None } else { Some(date) };
        self.0
    }

    /// Currently selected day.
    pub fn selected(&self) -> Option<NaiveDate> {
        self.0
    }
}
