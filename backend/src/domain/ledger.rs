//! Live transaction sequence of one user, with cached aggregates.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use mockable::Clock;
use tokio::sync::watch;
use tracing::info;

use crate::domain::ports::{TransactionRepository, TransactionRepositoryError};
use crate::domain::{
    Amount, Category, CategorySnapshot, CurrencyCode, Direction, Error, NewTransaction, Note,
    Summary, SummaryCard, Transaction, TransactionId, UserId, summarize,
};

/// User input for a new transaction, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    /// Non-negative amount.
    pub amount: Amount,
    /// Expense or income.
    pub direction: Direction,
    /// Free-text note.
    pub note: Note,
    /// Calendar day.
    pub date: NaiveDate,
}

struct CachedSummary {
    today: NaiveDate,
    summary: Summary,
}

/// View-model over a user's transactions.
///
/// The sequence arrives newest date first and is replaced on every store
/// change. Aggregates are a full O(n) rescan, cached until the sequence or
/// the current day changes. "Today" is the UTC calendar day of the clock.
pub struct Ledger {
    user_id: UserId,
    repository: Arc<dyn TransactionRepository>,
    clock: Arc<dyn Clock + Send + Sync>,
    live: Mutex<watch::Receiver<Vec<Transaction>>>,
    cache: Mutex<Option<CachedSummary>>,
}

impl Ledger {
    /// Subscribe to `user_id`'s transactions.
    pub async fn open(
        user_id: UserId,
        repository: Arc<dyn TransactionRepository>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, Error> {
        let live = repository
            .subscribe(&user_id)
            .await
            .map_err(map_transaction_error)?;
        Ok(Self {
            user_id,
            repository,
            clock,
            live: Mutex::new(live),
            cache: Mutex::new(None),
        })
    }

    /// Current calendar day.
    pub fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    /// Full sequence, newest date first.
    pub fn transactions(&self) -> Vec<Transaction> {
        let live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        let current = live.borrow().clone();
        current
    }

    /// Transactions dated `date`.
    pub fn transactions_on(&self, date: NaiveDate) -> Vec<Transaction> {
        self.transactions()
            .into_iter()
            .filter(|transaction| transaction.date == date)
            .collect()
    }

    /// Today / this month / this year totals.
    pub fn summary(&self) -> Summary {
        let today = self.today();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = live.has_changed().unwrap_or(false);
        if let Some(cached) = cache.as_ref().filter(|c| !changed && c.today == today) {
            return cached.summary;
        }
        let summary = summarize(&live.borrow_and_update(), today);
        *cache = Some(CachedSummary { today, summary });
        summary
    }

    /// Summary cards formatted in `currency`.
    pub fn summary_cards(&self, currency: &CurrencyCode) -> Vec<SummaryCard> {
        SummaryCard::all(&self.summary(), currency)
    }

    /// Record a transaction under `category`.
    pub async fn add_transaction(
        &self,
        draft: TransactionDraft,
        category: &Category,
    ) -> Result<Transaction, Error> {
        let transaction = self
            .repository
            .insert(NewTransaction {
                user_id: self.user_id.clone(),
                amount: draft.amount,
                direction: draft.direction,
                note: draft.note,
                date: draft.date,
                category: CategorySnapshot::from(category),
            })
            .await
            .map_err(map_transaction_error)?;
        info!(
            user_id = %self.user_id,
            transaction_id = %transaction.id,
            direction = ?transaction.direction,
            "transaction added"
        );
        Ok(transaction)
    }

    /// Permanently remove a transaction.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), Error> {
        self.repository
            .delete(&self.user_id, id)
            .await
            .map_err(map_transaction_error)?;
        info!(user_id = %self.user_id, transaction_id = %id, "transaction deleted");
        Ok(())
    }
}

fn map_transaction_error(error: TransactionRepositoryError) -> Error {
    match error {
        TransactionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("transaction store unavailable: {message}"))
        }
        TransactionRepositoryError::Query { message } => {
            Error::internal(format!("transaction store error: {message}"))
        }
        TransactionRepositoryError::NotFound { .. } => Error::not_found("Transaction not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockTransactionRepository;
    use crate::domain::{CategoryId, CategoryName, ErrorCode};
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rust_decimal::Decimal;

    struct FixtureClock(DateTime<Utc>);

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn clock() -> Arc<dyn Clock + Send + Sync> {
        let now = Utc
            .with_ymd_and_hms(2024, 5, 17, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        Arc::new(FixtureClock(now))
    }

    fn owner() -> UserId {
        UserId::new("uid-1").expect("id")
    }

    fn food() -> Category {
        Category {
            id: CategoryId::random(),
            name: CategoryName::new("Food").expect("name"),
            glyph: "🍔".into(),
            is_default: true,
            user_id: owner(),
        }
    }

    fn draft(cents: i64, direction: Direction, date: NaiveDate) -> TransactionDraft {
        TransactionDraft {
            amount: Amount::new(Decimal::new(cents, 2)).expect("amount"),
            direction,
            note: Note::new("lunch").expect("note"),
            date,
        }
    }

    /// Mock that keeps a live, date-descending sequence like the real store.
    fn live_repository() -> MockTransactionRepository {
        let (tx, rx) = watch::channel(Vec::<Transaction>::new());
        let tx = Arc::new(tx);
        let mut repository = MockTransactionRepository::new();
        repository.expect_subscribe().returning(move |_| Ok(rx.clone()));
        let inserts = Arc::clone(&tx);
        repository.expect_insert().returning(move |new| {
            let transaction = Transaction {
                id: TransactionId::random(),
                amount: new.amount,
                direction: new.direction,
                note: new.note,
                date: new.date,
                category: new.category,
                user_id: new.user_id,
            };
            inserts.send_modify(|seq| {
                seq.push(transaction.clone());
                seq.sort_by(|a, b| b.date.cmp(&a.date));
            });
            Ok(transaction)
        });
        repository.expect_delete().returning(move |_, id| {
            let mut found = false;
            tx.send_modify(|seq| {
                let before = seq.len();
                seq.retain(|t| t.id != id);
                found = seq.len() != before;
            });
            if found {
                Ok(())
            } else {
                Err(TransactionRepositoryError::not_found(id.to_string()))
            }
        });
        repository
    }

    async fn ledger() -> Ledger {
        Ledger::open(owner(), Arc::new(live_repository()), clock())
            .await
            .expect("subscribed")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).expect("date")
    }

    #[tokio::test]
    async fn adding_snapshots_the_category_and_updates_totals() {
        let ledger = ledger().await;
        assert_eq!(ledger.summary(), Summary::default());

        let added = ledger
            .add_transaction(draft(4250, Direction::Spent, day(17)), &food())
            .await
            .expect("added");

        assert_eq!(added.category.name, "Food");
        assert_eq!(added.category.glyph, "🍔");
        let summary = ledger.summary();
        assert_eq!(summary.today.spent, Decimal::new(4250, 2));
        assert_eq!(summary.this_year.net(), Decimal::new(-4250, 2));
    }

    #[tokio::test]
    async fn sequence_is_newest_date_first() {
        let ledger = ledger().await;
        for d in [3, 17, 9] {
            ledger
                .add_transaction(draft(100, Direction::Received, day(d)), &food())
                .await
                .expect("added");
        }

        let dates: Vec<_> = ledger.transactions().iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![day(17), day(9), day(3)]);
        assert_eq!(ledger.transactions_on(day(9)).len(), 1);
    }

    #[tokio::test]
    async fn deleting_removes_from_sequence_and_buckets() {
        let ledger = ledger().await;
        let keep = ledger
            .add_transaction(draft(1000, Direction::Spent, day(17)), &food())
            .await
            .expect("added");
        let gone = ledger
            .add_transaction(draft(500, Direction::Spent, day(17)), &food())
            .await
            .expect("added");
        assert_eq!(ledger.summary().today.count, 2);

        ledger.delete_transaction(gone.id).await.expect("deleted");

        let ids: Vec<_> = ledger.transactions().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![keep.id]);
        let summary = ledger.summary();
        assert_eq!(summary.today.count, 1);
        assert_eq!(summary.today.spent, Decimal::new(1000, 2));
        assert_eq!(summary.this_month.spent, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn deleting_unknown_ids_is_not_found() {
        let ledger = ledger().await;
        let err = ledger
            .delete_transaction(TransactionId::random())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn cards_format_in_the_user_currency() {
        let ledger = ledger().await;
        ledger
            .add_transaction(draft(4250, Direction::Spent, day(17)), &food())
            .await
            .expect("added");

        let cards = ledger.summary_cards(&CurrencyCode::new("EUR").expect("code"));

        assert!(cards.iter().all(|c| c.spent_display == "€42.50"));
        assert!(cards.iter().all(|c| c.net_display == "-€42.50"));
    }
}
