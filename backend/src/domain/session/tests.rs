//! Behaviour of the sign-in reconciler against mocked collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rstest::{fixture, rstest};
use tokio::sync::watch;

use super::*;
use crate::domain::ports::{MockIdentityProvider, MockProfileRepository, ProfileRepositoryError};

const UID: &str = "uid-alex";

fn principal() -> Principal {
    let mut principal = Principal::new(UserId::new(UID).expect("valid uid"));
    principal.display_name = Some("Alex G".into());
    principal.email = Some("alex@example.com".into());
    principal
}

fn stored_profile() -> UserProfile {
    UserProfile::provisional(&principal()).completed(
        DisplayName::new("Alex").expect("name"),
        CurrencyCode::new("EUR").expect("code"),
    )
}

fn consent_url() -> Url {
    Url::parse("https://accounts.example.com/consent").expect("valid url")
}

#[fixture]
fn desktop() -> DeviceProfile {
    DeviceProfile {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0".into(),
        viewport_width: Some(1440),
        touch: false,
    }
}

fn identity_with_feed(feed: &watch::Sender<Option<Principal>>) -> MockIdentityProvider {
    let rx = feed.subscribe();
    let mut identity = MockIdentityProvider::new();
    identity.expect_subscribe().returning(move || rx.clone());
    identity
}

fn reconciler(identity: MockIdentityProvider, profiles: MockProfileRepository) -> SessionReconciler {
    SessionReconciler::new(Arc::new(identity), Arc::new(profiles))
}

fn counting_lookup(
    profiles: &mut MockProfileRepository,
    found: Option<UserProfile>,
) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    profiles.expect_find_by_id().returning(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(found.clone())
    });
    calls
}

#[rstest]
#[tokio::test]
async fn popup_sign_in_creates_profile_for_new_user(desktop: DeviceProfile) {
    let (feed, _) = watch::channel(None);
    let mut identity = identity_with_feed(&feed);
    identity
        .expect_sign_in_with_popup()
        .times(1)
        .return_once(|| Ok(principal()));
    let mut profiles = MockProfileRepository::new();
    profiles
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(None));
    profiles
        .expect_save()
        .withf(|profile| profile.id.as_ref() == UID && profile.currency.as_ref() == "USD")
        .times(1)
        .return_once(|_| Ok(()));
    let session = reconciler(identity, profiles);

    let outcome = session.sign_in(&desktop).await;

    assert_eq!(outcome, SignInOutcome::Completed);
    let snapshot = session.snapshot();
    assert!(snapshot.is_new_user);
    assert_eq!(snapshot.phase, SignInPhase::Resolved);
    assert_eq!(
        snapshot.user.as_ref().map(|u| u.name.clone()),
        Some("Alex G".to_owned())
    );
    assert_eq!(snapshot.landing(), LandingView::ProfileCompletion);
}

#[tokio::test]
async fn returning_user_never_becomes_new() {
    let (feed, _) = watch::channel(Some(principal()));
    let identity = identity_with_feed(&feed);
    let mut profiles = MockProfileRepository::new();
    let lookups = counting_lookup(&mut profiles, Some(stored_profile()));
    profiles.expect_save().never();
    let session = reconciler(identity, profiles);

    session.sync_listener().await;
    session.accept_principal(principal()).await;
    session.accept_principal(principal()).await;

    let snapshot = session.snapshot();
    assert!(!snapshot.is_new_user);
    assert_eq!(snapshot.user, Some(stored_profile()));
    assert_eq!(lookups.load(Ordering::SeqCst), 1);
    assert_eq!(snapshot.landing(), LandingView::Dashboard);
}

#[rstest]
#[tokio::test]
async fn second_sign_in_for_the_same_principal_resolves(desktop: DeviceProfile) {
    let (feed, _) = watch::channel(None);
    let mut identity = identity_with_feed(&feed);
    identity
        .expect_sign_in_with_popup()
        .times(2)
        .returning(|| Ok(principal()));
    let mut profiles = MockProfileRepository::new();
    let lookups = counting_lookup(&mut profiles, Some(stored_profile()));
    let session = reconciler(identity, profiles);

    session.sign_in(&desktop).await;
    let outcome = session.sign_in(&desktop).await;

    assert_eq!(outcome, SignInOutcome::Completed);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SignInPhase::Resolved);
    assert_eq!(snapshot.landing(), LandingView::Dashboard);
    assert_eq!(lookups.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test]
async fn racing_popup_and_listener_write_once(desktop: DeviceProfile) {
    let (feed, _) = watch::channel(Some(principal()));
    let mut identity = identity_with_feed(&feed);
    identity
        .expect_sign_in_with_popup()
        .times(1)
        .return_once(|| Ok(principal()));
    let mut profiles = MockProfileRepository::new();
    let lookups = counting_lookup(&mut profiles, None);
    profiles.expect_save().times(1).return_once(|_| Ok(()));
    let session = reconciler(identity, profiles);

    let (outcome, ()) = tokio::join!(session.sign_in(&desktop), session.sync_listener());

    assert_eq!(outcome, SignInOutcome::Completed);
    assert_eq!(lookups.load(Ordering::SeqCst), 1);
    assert!(session.snapshot().is_new_user);
}

#[tokio::test]
async fn ambient_restoration_runs_once_per_page_load() {
    let (feed, _) = watch::channel(None);
    let mut identity = identity_with_feed(&feed);
    identity
        .expect_resolve_redirect_result()
        .times(2)
        .returning(|| Ok(None));
    let session = reconciler(identity, MockProfileRepository::new());

    assert!(session.snapshot().is_loading);
    let first = session.restore_ambient().await;
    session.restore_ambient().await;
    session.begin_page_load();
    let reloaded = session.restore_ambient().await;

    assert!(!first.is_loading);
    assert_eq!(first.phase, SignInPhase::Idle);
    assert_eq!(first.landing(), LandingView::SignIn);
    assert!(!reloaded.is_loading);
}

#[tokio::test]
async fn redirect_result_and_listener_agree() {
    let (feed, _) = watch::channel(None);
    let mut identity = identity_with_feed(&feed);
    identity
        .expect_resolve_redirect_result()
        .times(1)
        .return_once(|| Ok(Some(principal())));
    let mut profiles = MockProfileRepository::new();
    let lookups = counting_lookup(&mut profiles, Some(stored_profile()));
    let session = reconciler(identity, profiles);

    feed.send_replace(Some(principal()));
    let snapshot = session.restore_ambient().await;

    assert_eq!(lookups.load(Ordering::SeqCst), 1);
    assert!(!snapshot.is_new_user);
    assert_eq!(snapshot.phase, SignInPhase::Resolved);
}

#[rstest]
#[tokio::test]
async fn blocked_popup_falls_back_to_redirect(desktop: DeviceProfile) {
    let (feed, _) = watch::channel(None);
    let mut identity = identity_with_feed(&feed);
    identity
        .expect_sign_in_with_popup()
        .return_once(|| Err(IdentityProviderError::popup_blocked()));
    identity
        .expect_sign_in_with_redirect()
        .times(1)
        .return_once(|| Ok(consent_url()));
    let session = reconciler(identity, MockProfileRepository::new());

    let outcome = session.sign_in(&desktop).await;

    assert_eq!(outcome, SignInOutcome::Redirecting { url: consent_url() });
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SignInPhase::AwaitingAmbient);
    assert!(snapshot.last_error.is_none());
}

#[rstest]
#[tokio::test]
async fn blocked_popup_with_failed_fallback_reports_blocked(desktop: DeviceProfile) {
    let (feed, _) = watch::channel(None);
    let mut identity = identity_with_feed(&feed);
    identity
        .expect_sign_in_with_popup()
        .return_once(|| Err(IdentityProviderError::popup_blocked()));
    identity
        .expect_sign_in_with_redirect()
        .return_once(|| Err(IdentityProviderError::network_failure()));
    let session = reconciler(identity, MockProfileRepository::new());

    let outcome = session.sign_in(&desktop).await;

    let SignInOutcome::Failed(error) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(error.message(), "Sign-in popup was blocked by the browser");
    assert_eq!(error.kind(), FailureKind::Interaction);
    assert_eq!(session.snapshot().phase, SignInPhase::Failed);
}

#[tokio::test]
async fn mobile_devices_skip_the_popup() {
    let (feed, _) = watch::channel(None);
    let mut identity = identity_with_feed(&feed);
    identity.expect_sign_in_with_popup().never();
    identity
        .expect_sign_in_with_redirect()
        .times(1)
        .return_once(|| Ok(consent_url()));
    let session = reconciler(identity, MockProfileRepository::new());
    let phone = DeviceProfile {
        user_agent: "Mozilla/5.0 (Linux; Android 14)".into(),
        viewport_width: Some(412),
        touch: true,
    };

    let outcome = session.sign_in(&phone).await;

    assert!(matches!(outcome, SignInOutcome::Redirecting { .. }));
}

#[rstest]
#[case(IdentityProviderError::network_failure(), "Network error. Please check your connection", FailureKind::Transport)]
#[case(IdentityProviderError::rate_limited(), "Too many attempts. Please try again later", FailureKind::Transport)]
#[case(IdentityProviderError::popup_closed(), "Sign-in was cancelled", FailureKind::Interaction)]
#[case(IdentityProviderError::provider_disabled(), "Sign-in is not enabled for this application. Please contact support", FailureKind::Interaction)]
#[case(IdentityProviderError::storage_unsupported(), "Your browser doesn't support web storage. Please enable cookies and try again", FailureKind::Interaction)]
#[case(IdentityProviderError::provider("Quota exceeded"), "Quota exceeded", FailureKind::Transport)]
#[case(IdentityProviderError::provider(""), "Unknown authentication error", FailureKind::Transport)]
fn provider_errors_map_to_messages(
    #[case] error: IdentityProviderError,
    #[case] message: &str,
    #[case] kind: FailureKind,
) {
    let mapped = SessionError::from_provider(&error);
    assert_eq!(mapped.message(), message);
    assert_eq!(mapped.kind(), kind);
}

#[rstest]
#[tokio::test]
async fn failures_leave_signed_out_state_and_can_be_dismissed(desktop: DeviceProfile) {
    let (feed, _) = watch::channel(None);
    let mut identity = identity_with_feed(&feed);
    identity
        .expect_sign_in_with_popup()
        .return_once(|| Err(IdentityProviderError::popup_closed()));
    let session = reconciler(identity, MockProfileRepository::new());

    session.sign_in(&desktop).await;
    let failed = session.snapshot();
    assert!(failed.user.is_none());
    assert_eq!(failed.phase, SignInPhase::Failed);

    session.clear_error();
    let cleared = session.snapshot();
    assert!(cleared.last_error.is_none());
    assert_eq!(cleared.phase, SignInPhase::Idle);
}

#[tokio::test]
async fn profile_load_failure_blocks_dashboard_until_retried() {
    let (feed, _) = watch::channel(None);
    let identity = identity_with_feed(&feed);
    let mut profiles = MockProfileRepository::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    profiles.expect_find_by_id().returning(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(ProfileRepositoryError::connection("store offline"))
        } else {
            Ok(Some(stored_profile()))
        }
    });
    let session = reconciler(identity, profiles);

    session.accept_principal(principal()).await;
    let blocked = session.snapshot();
    assert_eq!(
        blocked.last_error.as_ref().map(SessionError::message),
        Some("Failed to load user profile")
    );
    assert_eq!(blocked.landing(), LandingView::ProfileUnavailable);

    let recovered = session.retry_profile_load().await;
    assert!(recovered.last_error.is_none());
    assert_eq!(recovered.landing(), LandingView::Dashboard);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn dismissing_a_load_failure_keeps_the_dashboard_blocked() {
    let (feed, _) = watch::channel(None);
    let identity = identity_with_feed(&feed);
    let mut profiles = MockProfileRepository::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    profiles.expect_find_by_id().returning(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(ProfileRepositoryError::connection("store offline"))
        } else {
            Ok(Some(stored_profile()))
        }
    });
    profiles.expect_save().never();
    let session = reconciler(identity, profiles);

    session.accept_principal(principal()).await;
    session.clear_error();
    let dismissed = session.snapshot();
    assert!(dismissed.last_error.is_none());
    assert!(dismissed.profile_unresolved);
    assert_eq!(dismissed.landing(), LandingView::ProfileUnavailable);

    let err = session
        .complete_profile(
            DisplayName::new("Alex").expect("name"),
            CurrencyCode::new("USD").expect("code"),
        )
        .await
        .expect_err("profile still unresolved");
    assert_eq!(err.code(), SessionErrorCode::ProfileLoad);

    let recovered = session.retry_profile_load().await;
    assert_eq!(recovered.landing(), LandingView::Dashboard);
    assert_eq!(
        recovered.user.as_ref().map(|u| u.currency.as_ref()),
        Some("EUR")
    );
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn completing_profile_clears_new_user_flag() {
    let (feed, _) = watch::channel(None);
    let identity = identity_with_feed(&feed);
    let mut profiles = MockProfileRepository::new();
    counting_lookup(&mut profiles, None);
    profiles.expect_save().times(2).returning(|_| Ok(()));
    let session = reconciler(identity, profiles);

    session.accept_principal(principal()).await;
    let profile = session
        .complete_profile(
            DisplayName::new(" Alex ").expect("name"),
            CurrencyCode::new("eur").expect("code"),
        )
        .await
        .expect("profile saved");

    assert_eq!(profile.name, "Alex");
    assert_eq!(profile.currency.as_ref(), "EUR");
    let snapshot = session.snapshot();
    assert!(!snapshot.is_new_user);
    assert_eq!(snapshot.landing(), LandingView::Dashboard);
}

#[tokio::test]
async fn completing_profile_requires_a_principal() {
    let (feed, _) = watch::channel(None);
    let identity = identity_with_feed(&feed);
    let mut profiles = MockProfileRepository::new();
    profiles.expect_save().never();
    let session = reconciler(identity, profiles);

    let err = session
        .complete_profile(
            DisplayName::new("Alex").expect("name"),
            CurrencyCode::new("EUR").expect("code"),
        )
        .await
        .expect_err("no principal");

    assert_eq!(err.kind(), FailureKind::DataIntegrity);
    assert_eq!(err.code(), SessionErrorCode::NotSignedIn);
}

#[tokio::test]
async fn failed_completion_keeps_the_form() {
    let (feed, _) = watch::channel(None);
    let identity = identity_with_feed(&feed);
    let mut profiles = MockProfileRepository::new();
    counting_lookup(&mut profiles, None);
    let saves = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&saves);
    profiles.expect_save().returning(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(())
        } else {
            Err(ProfileRepositoryError::query("write rejected"))
        }
    });
    let session = reconciler(identity, profiles);

    session.accept_principal(principal()).await;
    let result = session
        .complete_profile(
            DisplayName::new("Alex").expect("name"),
            CurrencyCode::new("EUR").expect("code"),
        )
        .await;

    assert!(result.is_err());
    let snapshot = session.snapshot();
    assert!(snapshot.is_new_user);
    assert_eq!(snapshot.landing(), LandingView::ProfileCompletion);
}

#[tokio::test]
async fn sign_out_clears_state_and_guards() {
    let (feed, _) = watch::channel(None);
    let mut identity = identity_with_feed(&feed);
    identity.expect_sign_out().times(1).return_once(|| Ok(()));
    let mut profiles = MockProfileRepository::new();
    let lookups = counting_lookup(&mut profiles, Some(stored_profile()));
    let session = reconciler(identity, profiles);

    session.accept_principal(principal()).await;
    session.sign_out().await.expect("sign-out succeeds");
    let signed_out = session.snapshot();
    assert!(signed_out.user.is_none());
    assert_eq!(signed_out.phase, SignInPhase::Idle);
    assert!(session.current_user_id().is_none());

    session.accept_principal(principal()).await;
    assert_eq!(lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_sign_out_keeps_the_user() {
    let (feed, _) = watch::channel(None);
    let mut identity = identity_with_feed(&feed);
    identity
        .expect_sign_out()
        .return_once(|| Err(IdentityProviderError::network_failure()));
    let mut profiles = MockProfileRepository::new();
    counting_lookup(&mut profiles, Some(stored_profile()));
    let session = reconciler(identity, profiles);

    session.accept_principal(principal()).await;
    let err = session.sign_out().await.expect_err("sign-out fails");

    assert_eq!(err.kind(), FailureKind::Transport);
    assert_eq!(session.snapshot().user, Some(stored_profile()));
}

#[tokio::test]
async fn listener_sign_out_event_clears_session() {
    let (feed, _) = watch::channel(Some(principal()));
    let identity = identity_with_feed(&feed);
    let mut profiles = MockProfileRepository::new();
    counting_lookup(&mut profiles, Some(stored_profile()));
    let session = reconciler(identity, profiles);

    session.sync_listener().await;
    assert!(session.snapshot().user.is_some());

    feed.send_replace(None);
    session.sync_listener().await;

    let snapshot = session.snapshot();
    assert!(snapshot.user.is_none());
    assert_eq!(snapshot.landing(), LandingView::SignIn);
}

async fn wait_for<F>(session: &SessionReconciler, predicate: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    for _ in 0..100 {
        let snapshot = session.snapshot();
        if predicate(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session never reached the expected state");
}

#[tokio::test]
async fn spawned_listener_follows_the_feed() {
    let (feed, _) = watch::channel(None);
    let identity = identity_with_feed(&feed);
    let mut profiles = MockProfileRepository::new();
    counting_lookup(&mut profiles, Some(stored_profile()));
    let session = Arc::new(reconciler(identity, profiles));

    let handle = session.spawn_listener();
    wait_for(&session, |s| !s.is_loading).await;
    feed.send_replace(Some(principal()));
    let signed_in = wait_for(&session, |s| s.user.is_some()).await;
    assert_eq!(signed_in.user, Some(stored_profile()));

    drop(handle);
}

#[tokio::test]
async fn dropping_the_handle_stops_the_listener() {
    let (feed, _) = watch::channel(None);
    let identity = identity_with_feed(&feed);
    let mut profiles = MockProfileRepository::new();
    profiles.expect_find_by_id().never();
    let session = Arc::new(reconciler(identity, profiles));

    let handle = session.spawn_listener();
    drop(handle);
    feed.send_replace(Some(principal()));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(session.snapshot().user.is_none());
}
