//! Document store with live per-user queries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::ports::{
    CategoryRepository, CategoryRepositoryError, ProfileRepository, ProfileRepositoryError,
    TransactionRepository, TransactionRepositoryError,
};
use crate::domain::{
    Category, CategoryId, NewCategory, NewTransaction, Transaction, TransactionId, UserId,
    UserProfile,
};

const OFFLINE: &str = "document store offline";

/// Profiles, categories and transactions held in process memory.
///
/// Each user's categories and transactions sit behind a `watch` channel, so
/// every write is delivered to live subscribers as a full replacement set.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    online: AtomicBool,
    profiles: Mutex<HashMap<UserId, UserProfile>>,
    categories: Mutex<HashMap<UserId, watch::Sender<Vec<Category>>>>,
    transactions: Mutex<HashMap<UserId, watch::Sender<Vec<Transaction>>>>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self {
            online: AtomicBool::new(true),
            profiles: Mutex::default(),
            categories: Mutex::default(),
            transactions: Mutex::default(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn channel_for<T>(
    channels: &mut HashMap<UserId, watch::Sender<Vec<T>>>,
    user_id: &UserId,
) -> watch::Sender<Vec<T>> {
    channels
        .entry(user_id.clone())
        .or_insert_with(|| watch::channel(Vec::new()).0)
        .clone()
}

impl MemoryDocumentStore {
    /// Empty, reachable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store becoming unreachable (or reachable again).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileRepository for MemoryDocumentStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        if !self.is_online() {
            return Err(ProfileRepositoryError::connection(OFFLINE));
        }
        Ok(lock(&self.profiles).get(id).cloned())
    }

    async fn save(&self, profile: &UserProfile) -> Result<(), ProfileRepositoryError> {
        if !self.is_online() {
            return Err(ProfileRepositoryError::connection(OFFLINE));
        }
        lock(&self.profiles).insert(profile.id.clone(), profile.clone());
        debug!(user_id = %profile.id, "profile document written");
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for MemoryDocumentStore {
    async fn subscribe(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<Vec<Category>>, CategoryRepositoryError> {
        if !self.is_online() {
            return Err(CategoryRepositoryError::connection(OFFLINE));
        }
        Ok(channel_for(&mut lock(&self.categories), user_id).subscribe())
    }

    async fn insert(&self, category: NewCategory) -> Result<Category, CategoryRepositoryError> {
        if !self.is_online() {
            return Err(CategoryRepositoryError::connection(OFFLINE));
        }
        let stored = Category {
            id: CategoryId::random(),
            name: category.name,
            glyph: category.glyph,
            is_default: category.is_default,
            user_id: category.user_id,
        };
        let sender = channel_for(&mut lock(&self.categories), &stored.user_id);
        sender.send_modify(|set| set.push(stored.clone()));
        Ok(stored)
    }
}

#[async_trait]
impl TransactionRepository for MemoryDocumentStore {
    async fn subscribe(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<Vec<Transaction>>, TransactionRepositoryError> {
        if !self.is_online() {
            return Err(TransactionRepositoryError::connection(OFFLINE));
        }
        Ok(channel_for(&mut lock(&self.transactions), user_id).subscribe())
    }

    async fn insert(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepositoryError> {
        if !self.is_online() {
            return Err(TransactionRepositoryError::connection(OFFLINE));
        }
        let stored = Transaction {
            id: TransactionId::random(),
            amount: transaction.amount,
            direction: transaction.direction,
            note: transaction.note,
            date: transaction.date,
            category: transaction.category,
            user_id: transaction.user_id,
        };
        let sender = channel_for(&mut lock(&self.transactions), &stored.user_id);
        sender.send_modify(|sequence| {
            // Newest date first; a new entry precedes older entries of its day.
            let at = sequence
                .iter()
                .position(|existing| existing.date <= stored.date)
                .unwrap_or(sequence.len());
            sequence.insert(at, stored.clone());
        });
        Ok(stored)
    }

    async fn delete(
        &self,
        user_id: &UserId,
        id: TransactionId,
    ) -> Result<(), TransactionRepositoryError> {
        if !self.is_online() {
            return Err(TransactionRepositoryError::connection(OFFLINE));
        }
        let sender = lock(&self.transactions).get(user_id).cloned();
        let removed = sender.is_some_and(|sender| {
            sender.send_if_modified(|sequence| {
                let before = sequence.len();
                sequence.retain(|existing| existing.id != id);
                sequence.len() != before
            })
        });
        if removed {
            Ok(())
        } else {
            Err(TransactionRepositoryError::not_found(id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Amount, CategoryName, CategorySnapshot, CurrencyCode, Direction, Note, Principal,
    };
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;

    #[fixture]
    fn store() -> MemoryDocumentStore {
        MemoryDocumentStore::new()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).expect("id")
    }

    fn new_tx(owner: &UserId, day: u32, note: &str) -> NewTransaction {
        NewTransaction {
            user_id: owner.clone(),
            amount: Amount::new(Decimal::ONE).expect("amount"),
            direction: Direction::Spent,
            note: Note::new(note).expect("note"),
            date: NaiveDate::from_ymd_opt(2024, 5, day).expect("date"),
            category: CategorySnapshot {
                name: "Food".into(),
                glyph: "🍔".into(),
            },
        }
    }

    #[rstest]
    #[tokio::test]
    async fn profiles_round_trip(store: MemoryDocumentStore) {
        let principal = Principal::new(user("uid-1"));
        let mut profile = UserProfile::provisional(&principal);
        assert_eq!(store.find_by_id(&principal.uid).await, Ok(None));

        profile.currency = CurrencyCode::new("GBP").expect("code");
        store.save(&profile).await.expect("saved");

        assert_eq!(store.find_by_id(&principal.uid).await, Ok(Some(profile)));
    }

    #[rstest]
    #[tokio::test]
    async fn category_subscriptions_see_inserts_for_their_owner_only(store: MemoryDocumentStore) {
        let alice = user("alice");
        let bob = user("bob");
        let mut live = CategoryRepository::subscribe(&store, &alice)
            .await
            .expect("subscribed");

        for owner in [&alice, &bob] {
            CategoryRepository::insert(
                &store,
                NewCategory {
                    user_id: owner.clone(),
                    name: CategoryName::new("Coffee").expect("name"),
                    glyph: "☕".into(),
                    is_default: false,
                },
            )
            .await
            .expect("inserted");
        }

        assert!(live.has_changed().expect("sender alive"));
        let set = live.borrow_and_update().clone();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].user_id, alice);
    }

    #[rstest]
    #[tokio::test]
    async fn transactions_are_newest_date_first(store: MemoryDocumentStore) {
        let owner = user("alice");
        for (day, note) in [(3, "a"), (9, "b"), (3, "c"), (1, "d")] {
            TransactionRepository::insert(&store, new_tx(&owner, day, note))
                .await
                .expect("inserted");
        }
        let live = TransactionRepository::subscribe(&store, &owner)
            .await
            .expect("subscribed");

        let notes: Vec<String> = live
            .borrow()
            .iter()
            .map(|t| t.note.as_ref().to_owned())
            .collect();
        assert_eq!(notes, vec!["b", "c", "a", "d"]);
    }

    #[rstest]
    #[tokio::test]
    async fn deletes_are_owner_scoped(store: MemoryDocumentStore) {
        let alice = user("alice");
        let bob = user("bob");
        let stored = TransactionRepository::insert(&store, new_tx(&alice, 1, "rent"))
            .await
            .expect("inserted");

        let foreign = store.delete(&bob, stored.id).await;
        assert!(matches!(foreign, Err(TransactionRepositoryError::NotFound { .. })));

        store.delete(&alice, stored.id).await.expect("deleted");
        let again = store.delete(&alice, stored.id).await;
        assert!(matches!(again, Err(TransactionRepositoryError::NotFound { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn offline_store_reports_connection_errors(store: MemoryDocumentStore) {
        store.set_online(false);
        let result = store.find_by_id(&user("alice")).await;
        assert!(matches!(result, Err(ProfileRepositoryError::Connection { .. })));

        store.set_online(true);
        assert_eq!(store.find_by_id(&user("alice")).await, Ok(None));
    }
}
