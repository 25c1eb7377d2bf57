//! Live category set of one user.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::ports::{CategoryRepository, CategoryRepositoryError};
use crate::domain::{
    Category, CategoryName, Error, NewCategory, UserId, glyph_or_default,
};

/// View-model over a user's categories.
///
/// The set is read from a live subscription; every store change replaces it
/// wholesale. An empty set is seeded with the defaults once per book.
/// Uniqueness is checked against the live set before inserting, so two
/// clients adding the same name at the same moment can both succeed.
pub struct CategoryBook {
    user_id: UserId,
    repository: Arc<dyn CategoryRepository>,
    live: watch::Receiver<Vec<Category>>,
    seeded: AtomicBool,
    seed_gate: tokio::sync::Mutex<()>,
}

impl CategoryBook {
    /// Subscribe to `user_id`'s categories.
    pub async fn open(
        user_id: UserId,
        repository: Arc<dyn CategoryRepository>,
    ) -> Result<Self, Error> {
        let live = repository
            .subscribe(&user_id)
            .await
            .map_err(map_category_error)?;
        Ok(Self {
            user_id,
            repository,
            live,
            seeded: AtomicBool::new(false),
            seed_gate: tokio::sync::Mutex::new(()),
        })
    }

    /// Owner of the book.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Observe the latest set, seeding defaults when it is empty.
    pub async fn sync(&self) -> Result<Vec<Category>, Error> {
        if self.live.borrow().is_empty() && !self.seeded.load(Ordering::Acquire) {
            let _gate = self.seed_gate.lock().await;
            if self.live.borrow().is_empty() && !self.seeded.load(Ordering::Acquire) {
                self.seed_defaults().await?;
            }
        }
        Ok(self.categories())
    }

    async fn seed_defaults(&self) -> Result<(), Error> {
        for category in NewCategory::defaults_for(&self.user_id) {
            self.repository
                .insert(category)
                .await
                .map_err(|err| {
                    warn!(user_id = %self.user_id, error = %err, "default category seeding failed");
                    map_category_error(err)
                })?;
        }
        self.seeded.store(true, Ordering::Release);
        info!(user_id = %self.user_id, "seeded default categories");
        Ok(())
    }

    /// Current set, as last delivered by the subscription.
    pub fn categories(&self) -> Vec<Category> {
        self.live.borrow().clone()
    }

    /// Categories the user created.
    pub fn custom_categories(&self) -> Vec<Category> {
        self.live
            .borrow()
            .iter()
            .filter(|category| !category.is_default)
            .cloned()
            .collect()
    }

    /// Look up a category by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<Category> {
        self.live
            .borrow()
            .iter()
            .find(|category| category.name.matches(name))
            .cloned()
    }

    /// Create a custom category.
    ///
    /// # Errors
    /// `invalid_request` for a blank name, `conflict` when a category with
    /// the same name (any case) exists.
    pub async fn add_category(&self, name: &str, glyph: Option<&str>) -> Result<Category, Error> {
        let name = CategoryName::new(name).map_err(|err| Error::invalid_request(err.to_string()))?;
        if self.find(name.as_ref()).is_some() {
            return Err(Error::conflict("Category already exists"));
        }
        let category = self
            .repository
            .insert(NewCategory {
                user_id: self.user_id.clone(),
                name,
                glyph: glyph_or_default(glyph),
                is_default: false,
            })
            .await
            .map_err(map_category_error)?;
        info!(user_id = %self.user_id, category = %category.name, "category added");
        Ok(category)
    }
}

fn map_category_error(error: CategoryRepositoryError) -> Error {
    match error {
        CategoryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("category store unavailable: {message}"))
        }
        CategoryRepositoryError::Query { message } => {
            Error::internal(format!("category store error: {message}"))
        }
    }
}
