//! Signed-in user's dashboard: categories, ledger and calendar selection.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{CategoryRepository, TransactionRepository};
use crate::domain::{
    CategoryBook, DateSelection, DayActivity, Error, Ledger, Transaction, TransactionDraft, UserId,
    day_detail, month_activity,
};

/// Document-store collaborators a dashboard reads from.
#[derive(Clone)]
pub struct DashboardStores {
    /// Category documents.
    pub categories: Arc<dyn CategoryRepository>,
    /// Transaction documents.
    pub transactions: Arc<dyn TransactionRepository>,
    /// Source of "today".
    pub clock: Arc<dyn Clock + Send + Sync>,
}

/// Validated transaction entry naming its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEntry {
    /// Amount, direction, note and date.
    pub draft: TransactionDraft,
    /// Category name, matched ignoring case.
    pub category: String,
}

/// Live dashboard state of one user in one client.
pub struct Dashboard {
    categories: CategoryBook,
    ledger: Ledger,
    selection: Mutex<DateSelection>,
}

impl Dashboard {
    /// Subscribe to `user_id`'s documents and seed default categories.
    pub async fn open(user_id: UserId, stores: &DashboardStores) -> Result<Self, Error> {
        let categories =
            CategoryBook::open(user_id.clone(), Arc::clone(&stores.categories)).await?;
        categories.sync().await?;
        let ledger = Ledger::open(
            user_id,
            Arc::clone(&stores.transactions),
            Arc::clone(&stores.clock),
        )
        .await?;
        Ok(Self {
            categories,
            ledger,
            selection: Mutex::new(DateSelection::default()),
        })
    }

    /// Owner of the dashboard.
    pub fn user_id(&self) -> &UserId {
        self.categories.user_id()
    }

    /// Category view-model.
    pub fn categories(&self) -> &CategoryBook {
        &self.categories
    }

    /// Transaction view-model.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Record a transaction under an existing category.
    ///
    /// # Errors
    /// `invalid_request` when no category matches `entry.category`.
    pub async fn record(&self, entry: TransactionEntry) -> Result<Transaction, Error> {
        let Some(category) = self.categories.find(&entry.category) else {
            return Err(Error::invalid_request(format!(
                "unknown category: {}",
                entry.category.trim()
            )));
        };
        self.ledger.add_transaction(entry.draft, &category).await
    }

    /// Toggle the calendar selection; returns the new selection.
    pub fn toggle_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut selection = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
        let selected = selection.toggle(date);
        debug!(user_id = %self.user_id(), ?selected, "calendar selection changed");
        selected
    }

    /// Currently selected day.
    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .selected()
    }

    /// Transactions of the selected day, if a day is selected.
    pub fn selected_day(&self) -> Option<(NaiveDate, Vec<Transaction>)> {
        let date = self.selected_date()?;
        Some((date, day_detail(&self.ledger.transactions(), date)))
    }

    /// Heat-map cells for a month.
    pub fn month(&self, year: i32, month: u32) -> Result<Vec<DayActivity>, Error> {
        month_activity(&self.ledger.transactions(), year, month)
            .map_err(|err| Error::invalid_request(err.to_string()))
    }
}
