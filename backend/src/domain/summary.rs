//! Today / this month / this year totals.
//!
//! Each recompute is a linear scan over the full transaction sequence, so
//! cost grows with the user's history. Callers cache the result per change.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CurrencyCode, Direction, Transaction, format_amount};

/// Aggregation window ending at (and including) today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Since midnight today.
    Today,
    /// Since the first of the current month.
    ThisMonth,
    /// Since January 1st of the current year.
    ThisYear,
}

impl Period {
    /// Every period, in card order.
    pub const ALL: [Period; 3] = [Period::Today, Period::ThisMonth, Period::ThisYear];

    /// First day included in the period.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use tally::domain::Period;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 5, 17).expect("date");
    /// assert_eq!(Period::ThisMonth.cutoff(today), NaiveDate::from_ymd_opt(2024, 5, 1).expect("date"));
    /// ```
    pub fn cutoff(self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::ThisMonth => today.with_day(1).unwrap_or(today),
            Self::ThisYear => today.with_ordinal(1).unwrap_or(today),
        }
    }

    /// Card title.
    pub fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::ThisMonth => "This Month",
            Self::ThisYear => "This Year",
        }
    }
}

/// Spent and received sums for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    /// Sum of expenses.
    pub spent: Decimal,
    /// Sum of income.
    pub received: Decimal,
    /// Number of transactions included.
    pub count: usize,
}

impl Totals {
    /// `received - spent`.
    pub fn net(&self) -> Decimal {
        self.received - self.spent
    }

    fn add(&mut self, transaction: &Transaction) {
        match transaction.direction {
            Direction::Spent => self.spent += transaction.amount.value(),
            Direction::Received => self.received += transaction.amount.value(),
        }
        self.count += 1;
    }
}

/// Totals for every [`Period`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Today.
    pub today: Totals,
    /// Current month.
    pub this_month: Totals,
    /// Current year.
    pub this_year: Totals,
}

impl Summary {
    /// Totals of one period.
    pub fn totals(&self, period: Period) -> &Totals {
        match period {
            Period::Today => &self.today,
            Period::ThisMonth => &self.this_month,
            Period::ThisYear => &self.this_year,
        }
    }
}

/// Aggregate `transactions` into today/month/year buckets.
///
/// A transaction belongs to a bucket when its date is on or after the
/// bucket's cutoff. Future-dated transactions therefore count everywhere.
pub fn summarize(transactions: &[Transaction], today: NaiveDate) -> Summary {
    let mut summary = Summary::default();
    let month = Period::ThisMonth.cutoff(today);
    let year = Period::ThisYear.cutoff(today);
    for transaction in transactions {
        if transaction.date >= today {
            summary.today.add(transaction);
        }
        if transaction.date >= month {
            summary.this_month.add(transaction);
        }
        if transaction.date >= year {
            summary.this_year.add(transaction);
        }
    }
    summary
}

/// Display-ready summary card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCard {
    /// Period covered.
    pub period: Period,
    /// Card title.
    pub label: &'static str,
    /// Sum of expenses.
    pub spent: Decimal,
    /// Sum of income.
    pub received: Decimal,
    /// `received - spent`.
    pub net: Decimal,
    /// Number of transactions in the period.
    pub count: usize,
    /// Formatted `spent`.
    pub spent_display: String,
    /// Formatted `received`.
    pub received_display: String,
    /// Formatted `net`, signed when negative.
    pub net_display: String,
    /// Whether `net` is zero or above.
    pub net_positive: bool,
}

impl SummaryCard {
    /// Format one period of `summary` in `currency`.
    pub fn new(summary: &Summary, period: Period, currency: &CurrencyCode) -> Self {
        let totals = summary.totals(period);
        let net = totals.net();
        Self {
            period,
            label: period.label(),
            spent: totals.spent,
            received: totals.received,
            net,
            count: totals.count,
            spent_display: format_amount(totals.spent, currency),
            received_display: format_amount(totals.received, currency),
            net_display: format_amount(net, currency),
            net_positive: !net.is_sign_negative() || net.is_zero(),
        }
    }

    /// Cards for every period.
    pub fn all(summary: &Summary, currency: &CurrencyCode) -> Vec<Self> {
        Period::ALL
            .into_iter()
            .map(|period| Self::new(summary, period, currency))
            .collect()
    }
}
