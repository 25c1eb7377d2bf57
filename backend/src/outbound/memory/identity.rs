//! Scriptable identity provider for development and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;
use url::Url;

use crate::domain::Principal;
use crate::domain::ports::{IdentityConnector, IdentityProvider, IdentityProviderError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Script {
    popup_failures: VecDeque<IdentityProviderError>,
    redirect_failures: VecDeque<IdentityProviderError>,
    pending_redirect: Option<Principal>,
}

/// One client's provider session, signing in a fixed account.
///
/// Failures can be queued per flow; each queued failure is consumed by the
/// next call of that flow. A started redirect resolves exactly once.
#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    account: Principal,
    consent_url: Url,
    feed: watch::Sender<Option<Principal>>,
    script: Mutex<Script>,
}

impl InMemoryIdentityProvider {
    /// Signed-out session for `account`.
    pub fn new(account: Principal, consent_url: Url) -> Self {
        Self {
            account,
            consent_url,
            feed: watch::channel(None).0,
            script: Mutex::default(),
        }
    }

    /// Make the next popup attempt fail.
    pub fn fail_next_popup(&self, error: IdentityProviderError) {
        lock(&self.script).popup_failures.push_back(error);
    }

    /// Make the next redirect attempt fail.
    pub fn fail_next_redirect(&self, error: IdentityProviderError) {
        lock(&self.script).redirect_failures.push_back(error);
    }

    /// Publish a principal change without any sign-in call, as the provider
    /// does when a persisted session is restored or a token refreshes.
    pub fn emit(&self, principal: Option<Principal>) {
        self.feed.send_replace(principal);
    }

    fn signed_in(&self) -> Principal {
        self.feed.send_replace(Some(self.account.clone()));
        debug!(uid = %self.account.uid, "identity session established");
        self.account.clone()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in_with_popup(&self) -> Result<Principal, IdentityProviderError> {
        if let Some(error) = lock(&self.script).popup_failures.pop_front() {
            return Err(error);
        }
        Ok(self.signed_in())
    }

    async fn sign_in_with_redirect(&self) -> Result<Url, IdentityProviderError> {
        let mut script = lock(&self.script);
        if let Some(error) = script.redirect_failures.pop_front() {
            return Err(error);
        }
        script.pending_redirect = Some(self.account.clone());
        Ok(self.consent_url.clone())
    }

    async fn resolve_redirect_result(&self) -> Result<Option<Principal>, IdentityProviderError> {
        let pending = lock(&self.script).pending_redirect.take();
        Ok(pending.map(|_| self.signed_in()))
    }

    fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.feed.subscribe()
    }

    async fn sign_out(&self) -> Result<(), IdentityProviderError> {
        lock(&self.script).pending_redirect = None;
        self.feed.send_replace(None);
        Ok(())
    }
}

/// Connector that gives every client a fresh provider session for the same
/// configured account.
#[derive(Debug)]
pub struct InMemoryIdentityConnector {
    account: Principal,
    consent_url: Url,
    sessions: Mutex<Vec<Weak<InMemoryIdentityProvider>>>,
}

impl InMemoryIdentityConnector {
    /// Connector signing in `account`; redirects point at `consent_url`.
    pub fn new(account: Principal, consent_url: Url) -> Self {
        Self {
            account,
            consent_url,
            sessions: Mutex::default(),
        }
    }

    /// Most recently connected session that is still alive.
    pub fn latest(&self) -> Option<Arc<InMemoryIdentityProvider>> {
        let mut sessions = lock(&self.sessions);
        sessions.retain(|session| session.strong_count() > 0);
        sessions.last().and_then(Weak::upgrade)
    }
}

impl IdentityConnector for InMemoryIdentityConnector {
    fn connect(&self) -> Arc<dyn IdentityProvider> {
        let session = Arc::new(InMemoryIdentityProvider::new(
            self.account.clone(),
            self.consent_url.clone(),
        ));
        let mut sessions = lock(&self.sessions);
        sessions.retain(|existing| existing.strong_count() > 0);
        sessions.push(Arc::downgrade(&session));
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use rstest::{fixture, rstest};

    #[fixture]
    fn provider() -> InMemoryIdentityProvider {
        let mut account = Principal::new(UserId::new("dev-user").expect("id"));
        account.display_name = Some("Dev User".into());
        InMemoryIdentityProvider::new(
            account,
            Url::parse("https://identity.example/consent").expect("url"),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn popup_publishes_the_principal(provider: InMemoryIdentityProvider) {
        let feed = provider.subscribe();
        assert!(feed.borrow().is_none());

        let principal = provider.sign_in_with_popup().await.expect("signed in");

        assert_eq!(principal.uid.as_ref(), "dev-user");
        assert_eq!(feed.borrow().as_ref(), Some(&principal));
    }

    #[rstest]
    #[tokio::test]
    async fn queued_failures_are_consumed_once(provider: InMemoryIdentityProvider) {
        provider.fail_next_popup(IdentityProviderError::popup_blocked());

        assert_eq!(
            provider.sign_in_with_popup().await,
            Err(IdentityProviderError::PopupBlocked)
        );
        assert!(provider.sign_in_with_popup().await.is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn redirect_resolves_exactly_once(provider: InMemoryIdentityProvider) {
        assert_eq!(provider.resolve_redirect_result().await, Ok(None));

        let url = provider.sign_in_with_redirect().await.expect("consent url");
        assert_eq!(url.host_str(), Some("identity.example"));

        let resolved = provider.resolve_redirect_result().await.expect("resolved");
        assert!(resolved.is_some());
        assert!(provider.subscribe().borrow().is_some());
        assert_eq!(provider.resolve_redirect_result().await, Ok(None));
    }

    #[rstest]
    #[tokio::test]
    async fn sign_out_clears_the_feed(provider: InMemoryIdentityProvider) {
        provider.sign_in_with_popup().await.expect("signed in");
        let mut feed = provider.subscribe();

        provider.sign_out().await.expect("signed out");

        assert!(feed.has_changed().expect("sender alive"));
        assert!(feed.borrow_and_update().is_none());
    }

    #[test]
    fn connector_hands_out_independent_sessions() {
        let connector = InMemoryIdentityConnector::new(
            Principal::new(UserId::new("dev-user").expect("id")),
            Url::parse("https://identity.example/consent").expect("url"),
        );
        let first = connector.connect();
        let second = connector.connect();

        let latest = connector.latest().expect("live session");
        latest.emit(Some(Principal::new(UserId::new("dev-user").expect("id"))));

        assert!(second.subscribe().borrow().is_some());
        assert!(first.subscribe().borrow().is_none());
        drop(second);
        drop(latest);
        assert!(connector.latest().is_some());
    }
}
