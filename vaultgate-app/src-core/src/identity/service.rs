//! Identity cache and session controller.
//!
//! [`IdentityService`] owns the in-memory session (profile + token) and sits
//! between callers, the data service, secure storage and the vault:
//! - `get` serves the cached profile, fetching `users/current` on a miss
//! - `set` / `login` replace the session and persist it
//! - `remove` / `logout` end the session locally and with the provider
//! - `on_vault_locked` sends the user back to the login screen

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vaultgate_secret::SecretStore;

use super::models::{AuthToken, LoginResponse, UserProfile};
use super::persistence::{delete_session, load_session, save_session};
use crate::api::{AuthProvider, DataService};
use crate::error::{Result, VaultgateError};
use crate::navigation::Navigator;
use crate::storage::LockPolicy;
use crate::vault::VaultEvent;

#[derive(Debug, Default)]
struct SessionCache {
    profile: Option<UserProfile>,
    token: Option<AuthToken>,
}

impl SessionCache {
    fn is_authenticated(&self) -> bool {
        self.profile.is_some() || self.token.is_some()
    }
}

pub struct IdentityService {
    api: Arc<dyn DataService>,
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn SecretStore>,
    navigator: Arc<dyn Navigator>,
    lock_policy: LockPolicy,
    cache: RwLock<SessionCache>,
    /// Serialises cache-miss fetches so concurrent `get`s share one request.
    fetch_gate: Mutex<()>,
    /// Bumped under the cache write lock whenever the session is replaced or
    /// cleared. A fetch only caches its result if the epoch is unchanged.
    epoch: AtomicU64,
    authenticated: watch::Sender<bool>,
}

impl IdentityService {
    pub fn new(
        api: Arc<dyn DataService>,
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn SecretStore>,
        navigator: Arc<dyn Navigator>,
        lock_policy: LockPolicy,
    ) -> Self {
        let (authenticated, _) = watch::channel(false);
        Self {
            api,
            auth,
            store,
            navigator,
            lock_policy,
            cache: RwLock::new(SessionCache::default()),
            fetch_gate: Mutex::new(()),
            epoch: AtomicU64::new(0),
            authenticated,
        }
    }

    /// Return the current user, fetching it on a cache miss.
    ///
    /// A 401 from the data service also navigates to the login screen. On any
    /// failure the cache is left empty so the next call retries.
    pub async fn get(&self) -> Result<UserProfile> {
        if let Some(profile) = self.cached_profile().await {
            return Ok(profile);
        }

        let _gate = self.fetch_gate.lock().await;

        // Another caller may have filled the cache while we waited.
        if let Some(profile) = self.cached_profile().await {
            debug!("Profile cached by a concurrent fetch");
            return Ok(profile);
        }

        let (epoch, token) = {
            let cache = self.cache.read().await;
            (self.epoch.load(Ordering::SeqCst), cache.token.clone())
        };

        debug!("Profile cache miss, fetching current user");
        match self.api.current_user(token.as_ref()).await {
            Ok(profile) => {
                let stored = {
                    let mut cache = self.cache.write().await;
                    if self.epoch.load(Ordering::SeqCst) == epoch {
                        cache.profile = Some(profile.clone());
                        true
                    } else {
                        false
                    }
                };

                if stored {
                    info!("Fetched profile for user {}", profile.id);
                    self.publish().await;
                } else {
                    debug!("Session changed during fetch, not caching result");
                }
                Ok(profile)
            }
            Err(VaultgateError::Unauthorized) => {
                warn!("Data service rejected the session, navigating to login");
                self.discard_rejected_session(epoch).await;
                self.navigator.navigate_to_login();
                Err(VaultgateError::Unauthorized)
            }
            Err(e) => {
                warn!("Failed to fetch current user: {}", e);
                Err(e)
            }
        }
    }

    /// Replace the session with `profile` and `token`.
    ///
    /// The cache is updated first; persisting to secure storage is best
    /// effort and a failure is only logged.
    pub async fn set(&self, profile: UserProfile, token: AuthToken) {
        {
            let mut cache = self.cache.write().await;
            self.epoch.fetch_add(1, Ordering::SeqCst);
            cache.profile = Some(profile.clone());
            cache.token = Some(token.clone());
        }
        info!("Session set for user {}", profile.id);
        self.publish().await;

        if let Err(e) = save_session(self.store.as_ref(), &token, Some(&profile)).await {
            warn!("Failed to persist session: {}", e);
        }
    }

    /// Clear the local session, then end it with the provider.
    ///
    /// The cache is already empty when the logout step runs, so an error from
    /// it leaves the user signed out locally.
    pub async fn remove(&self) -> Result<()> {
        let token = self.clear_cache().await;
        info!("Session removed");
        self.end_session(token.as_ref()).await
    }

    /// End the session with the provider using the held token, delete the
    /// persisted session and drop the in-memory one.
    ///
    /// The local session is dropped even when the provider call fails.
    pub async fn logout(&self) -> Result<()> {
        let token = self.token().await;
        let ended = self.end_session(token.as_ref()).await;
        self.clear_cache().await;
        ended
    }

    /// React to the vault locking: navigate to the login screen once.
    ///
    /// Under [`LockPolicy::ClearSession`] the in-memory session is dropped as
    /// well. Nothing is sent to the provider.
    pub async fn on_vault_locked(&self) {
        if self.lock_policy == LockPolicy::ClearSession {
            self.clear_cache().await;
            debug!("Cleared session on vault lock");
        }
        info!("Vault locked, navigating to login");
        self.navigator.navigate_to_login();
    }

    /// Authenticate with the provider and adopt the returned session.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(VaultgateError::InvalidInput(
                "Email and password are required".into(),
            ));
        }

        let LoginResponse { token, user } = self.auth.login(email.trim(), password).await?;
        self.set(user.clone(), token).await;
        Ok(user)
    }

    /// Load the persisted session into the cache.
    ///
    /// Returns the restored profile; a session persisted without one only
    /// restores the token, and the next `get` fetches the profile with it.
    pub async fn restore(&self) -> Result<Option<UserProfile>> {
        let Some(session) = load_session(self.store.as_ref()).await? else {
            debug!("No persisted session to restore");
            return Ok(None);
        };

        let profile = session.profile.clone();
        {
            let mut cache = self.cache.write().await;
            self.epoch.fetch_add(1, Ordering::SeqCst);
            cache.profile = session.profile.clone();
            cache.token = Some(session.token.clone());
        }
        info!("Restored session saved at {}", session.saved_at);
        self.publish().await;
        Ok(profile)
    }

    pub async fn token(&self) -> Option<AuthToken> {
        self.cache.read().await.token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    /// Watch authenticated/unauthenticated transitions.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    /// Call [`on_vault_locked`](Self::on_vault_locked) for every `Locked`
    /// event received on `events`.
    ///
    /// The task holds a weak reference and stops when the service is dropped
    /// or the vault's channel closes.
    pub fn watch_vault(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<VaultEvent>,
    ) -> JoinHandle<()> {
        let service = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(VaultEvent::Locked(reason)) => {
                        let Some(service) = service.upgrade() else { break };
                        debug!("Vault lock event ({})", reason);
                        service.on_vault_locked().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Missed {} vault events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Vault watcher stopped");
        })
    }

    async fn cached_profile(&self) -> Option<UserProfile> {
        self.cache.read().await.profile.clone()
    }

    /// Drop the in-memory session, returning the token it held.
    async fn clear_cache(&self) -> Option<AuthToken> {
        let token = {
            let mut cache = self.cache.write().await;
            self.epoch.fetch_add(1, Ordering::SeqCst);
            cache.profile = None;
            cache.token.take()
        };
        self.publish().await;
        token
    }

    /// Forget a token the data service refused, unless the session was
    /// replaced while the request was in flight.
    async fn discard_rejected_session(&self, epoch: u64) {
        let discarded = {
            let mut cache = self.cache.write().await;
            if self.epoch.load(Ordering::SeqCst) != epoch {
                false
            } else {
                self.epoch.fetch_add(1, Ordering::SeqCst);
                cache.profile = None;
                cache.token.take().is_some()
            }
        };
        if !discarded {
            return;
        }

        self.publish().await;
        if let Err(e) = delete_session(self.store.as_ref()).await {
            warn!("Failed to delete rejected session: {}", e);
        }
        debug!("Discarded rejected token");
    }

    async fn end_session(&self, token: Option<&AuthToken>) -> Result<()> {
        let revoked = self.auth.logout(token).await;
        let deleted = delete_session(self.store.as_ref()).await;

        if let Err(e) = &revoked {
            warn!("Provider logout failed: {}", e);
        }
        revoked?;
        deleted?;
        info!("Logged out");
        Ok(())
    }

    async fn publish(&self) {
        let authenticated = self.cache.read().await.is_authenticated();
        self.authenticated.send_if_modified(|current| {
            if *current == authenticated {
                false
            } else {
                *current = authenticated;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use vaultgate_secret::MemoryStore;

    use crate::navigation::{ChannelNavigator, RecordingNavigator};
    use crate::vault::{AuthMethod, LockReason, SessionVault};

    fn douglas() -> UserProfile {
        UserProfile {
            id: 42,
            first_name: "Douglas".into(),
            last_name: "Adams".into(),
            email: "thank.you@forthefish.com".into(),
        }
    }

    fn sherry() -> UserProfile {
        UserProfile {
            id: 314159,
            first_name: "Sherry".into(),
            last_name: "Pigh".into(),
            email: "alamode@test.org".into(),
        }
    }

    enum Reply {
        Profile(UserProfile),
        Fail,
        Unauthorized,
    }

    /// Answers with queued replies, then Douglas.
    #[derive(Default)]
    struct FakeDataService {
        calls: AtomicUsize,
        replies: std::sync::Mutex<VecDeque<Reply>>,
        last_token: std::sync::Mutex<Option<AuthToken>>,
        /// When set, each call signals `started` and waits for `release`.
        hold: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl FakeDataService {
        fn queue(&self, reply: Reply) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DataService for FakeDataService {
        async fn current_user(&self, token: Option<&AuthToken>) -> Result<UserProfile> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_token.lock().unwrap() = token.cloned();

            if let Some((started, release)) = &self.hold {
                started.notify_one();
                release.notified().await;
            }
            tokio::task::yield_now().await;

            let reply = self.replies.lock().unwrap().pop_front();
            match reply.unwrap_or_else(|| Reply::Profile(douglas())) {
                Reply::Profile(profile) => Ok(profile),
                Reply::Fail => Err(VaultgateError::Fetch("HTTP 500".into())),
                Reply::Unauthorized => Err(VaultgateError::Unauthorized),
            }
        }
    }

    #[derive(Default)]
    struct FakeAuth {
        logouts: AtomicUsize,
        last_logout_token: std::sync::Mutex<Option<AuthToken>>,
        fail_logout: AtomicBool,
    }

    #[async_trait]
    impl AuthProvider for FakeAuth {
        async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
            if email == "alamode@test.org" && password == "pie" {
                Ok(LoginResponse {
                    token: AuthToken::new("sherry-token"),
                    user: sherry(),
                })
            } else {
                Err(VaultgateError::Unauthorized)
            }
        }

        async fn logout(&self, token: Option<&AuthToken>) -> Result<()> {
            self.logouts.fetch_add(1, Ordering::SeqCst);
            *self.last_logout_token.lock().unwrap() = token.cloned();
            if self.fail_logout.load(Ordering::SeqCst) {
                return Err(VaultgateError::Logout("HTTP 503".into()));
            }
            Ok(())
        }
    }

    struct Harness {
        api: Arc<FakeDataService>,
        auth: Arc<FakeAuth>,
        store: Arc<MemoryStore>,
        nav: Arc<RecordingNavigator>,
        service: Arc<IdentityService>,
    }

    fn harness_with(api: FakeDataService, store: Arc<MemoryStore>, policy: LockPolicy) -> Harness {
        let api = Arc::new(api);
        let auth = Arc::new(FakeAuth::default());
        let nav = Arc::new(RecordingNavigator::new());
        let service = Arc::new(IdentityService::new(
            api.clone(),
            auth.clone(),
            store.clone(),
            nav.clone(),
            policy,
        ));
        Harness {
            api,
            auth,
            store,
            nav,
            service,
        }
    }

    fn harness() -> Harness {
        harness_with(
            FakeDataService::default(),
            Arc::new(MemoryStore::new()),
            LockPolicy::KeepSession,
        )
    }

    #[tokio::test]
    async fn test_get_fetches_once_then_serves_cache() {
        let h = harness();

        let first = h.service.get().await.unwrap();
        assert_eq!(first, douglas());
        assert_eq!(h.api.calls(), 1);

        let second = h.service.get().await.unwrap();
        assert_eq!(second, douglas());
        assert_eq!(h.api.calls(), 1, "cached profile must not hit the network");
        assert!(h.service.is_authenticated());
    }

    #[tokio::test]
    async fn test_set_serves_profile_without_network() {
        let h = harness();

        h.service.set(sherry(), AuthToken::new("token")).await;
        assert_eq!(h.service.get().await.unwrap(), sherry());
        assert_eq!(h.api.calls(), 0);
        assert_eq!(h.service.token().await, Some(AuthToken::new("token")));
    }

    #[tokio::test]
    async fn test_remove_forces_refetch_and_logs_out() {
        let h = harness();
        h.service.set(sherry(), AuthToken::new("token")).await;

        h.service.remove().await.unwrap();
        assert_eq!(h.auth.logouts.load(Ordering::SeqCst), 1);
        assert_eq!(
            *h.auth.last_logout_token.lock().unwrap(),
            Some(AuthToken::new("token"))
        );
        assert!(h.service.token().await.is_none());
        assert!(h.store.is_empty().await, "persisted session must be deleted");

        assert_eq!(h.service.get().await.unwrap(), douglas());
        assert_eq!(h.api.calls(), 1);
        assert_eq!(*h.api.last_token.lock().unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_surfaces_logout_error_after_clearing() {
        let h = harness();
        h.service.set(sherry(), AuthToken::new("token")).await;
        h.auth.fail_logout.store(true, Ordering::SeqCst);

        assert!(matches!(
            h.service.remove().await,
            Err(VaultgateError::Logout(_))
        ));
        assert!(h.service.token().await.is_none());
        assert!(!h.service.is_authenticated());
    }

    #[tokio::test]
    async fn test_on_vault_locked_navigates_once_per_call() {
        let h = harness();
        h.service.set(sherry(), AuthToken::new("token")).await;

        h.service.on_vault_locked().await;
        assert_eq!(h.nav.count(&["login"]), 1);
        h.service.on_vault_locked().await;
        assert_eq!(h.nav.count(&["login"]), 2);

        // keep_session leaves the cache alone
        assert_eq!(h.service.get().await.unwrap(), sherry());
        assert_eq!(h.api.calls(), 0);
        assert_eq!(h.auth.logouts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_clear_session_policy_drops_cache_on_lock() {
        let h = harness_with(
            FakeDataService::default(),
            Arc::new(MemoryStore::new()),
            LockPolicy::ClearSession,
        );
        h.service.set(sherry(), AuthToken::new("token")).await;

        h.service.on_vault_locked().await;
        assert_eq!(h.nav.count(&["login"]), 1);
        assert!(h.service.token().await.is_none());
        assert_eq!(h.auth.logouts.load(Ordering::SeqCst), 0);

        assert_eq!(h.service.get().await.unwrap(), douglas());
        assert_eq!(h.api.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_gets_share_one_fetch() {
        let h = harness();

        let (a, b) = futures::future::join(h.service.get(), h.service.get()).await;
        assert_eq!(a.unwrap(), douglas());
        assert_eq!(b.unwrap(), douglas());
        assert_eq!(h.api.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_empty() {
        let h = harness();
        h.api.queue(Reply::Fail);

        assert!(matches!(h.service.get().await, Err(VaultgateError::Fetch(_))));
        assert!(!h.service.is_authenticated());
        assert!(h.nav.routes().is_empty());

        assert_eq!(h.service.get().await.unwrap(), douglas());
        assert_eq!(h.api.calls(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_fetch_navigates_to_login() {
        let h = harness();
        h.api.queue(Reply::Unauthorized);

        assert!(matches!(
            h.service.get().await,
            Err(VaultgateError::Unauthorized)
        ));
        assert_eq!(h.nav.count(&["login"]), 1);

        h.api.queue(Reply::Profile(sherry()));
        assert_eq!(h.service.get().await.unwrap(), sherry());
        assert_eq!(h.api.calls(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_fetch_drops_rejected_token() {
        let h = harness();
        h.store
            .set(
                crate::identity::persistence::SESSION_KEY,
                r#"{"token":"stale","savedAt":"2024-01-01T00:00:00Z"}"#,
            )
            .await
            .unwrap();
        h.service.restore().await.unwrap();
        assert!(h.service.is_authenticated());

        h.api.queue(Reply::Unauthorized);
        assert!(matches!(
            h.service.get().await,
            Err(VaultgateError::Unauthorized)
        ));
        assert_eq!(
            *h.api.last_token.lock().unwrap(),
            Some(AuthToken::new("stale"))
        );
        assert!(h.service.token().await.is_none());
        assert!(!h.service.is_authenticated());
        assert!(h.store.is_empty().await, "rejected session must not be restorable");
        assert_eq!(h.service.restore().await.unwrap(), None);

        // The next fetch goes out without the dead token
        h.service.get().await.unwrap();
        assert_eq!(*h.api.last_token.lock().unwrap(), None);
        assert_eq!(h.nav.count(&["login"]), 1);
    }

    #[tokio::test]
    async fn test_fetch_result_discarded_when_session_replaced() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let api = FakeDataService {
            hold: Some((started.clone(), release.clone())),
            ..FakeDataService::default()
        };
        let h = harness_with(api, Arc::new(MemoryStore::new()), LockPolicy::KeepSession);

        let service = h.service.clone();
        let pending = tokio::spawn(async move { service.get().await });

        started.notified().await;
        h.service.set(sherry(), AuthToken::new("token")).await;
        release.notify_one();

        // The caller still gets what was fetched...
        assert_eq!(pending.await.unwrap().unwrap(), douglas());
        // ...but the newer session wins the cache.
        assert_eq!(h.service.get().await.unwrap(), sherry());
        assert_eq!(h.api.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_sends_held_token() {
        let h = harness();
        h.store
            .set(
                crate::identity::persistence::SESSION_KEY,
                r#"{"token":"restored","savedAt":"2024-01-01T00:00:00Z"}"#,
            )
            .await
            .unwrap();

        assert_eq!(h.service.restore().await.unwrap(), None);
        assert!(h.service.is_authenticated());

        assert_eq!(h.service.get().await.unwrap(), douglas());
        assert_eq!(
            *h.api.last_token.lock().unwrap(),
            Some(AuthToken::new("restored"))
        );
        assert_eq!(h.service.token().await, Some(AuthToken::new("restored")));
    }

    #[tokio::test]
    async fn test_set_persists_for_restore_and_logout_clears() {
        let store = Arc::new(MemoryStore::new());
        let first = harness_with(
            FakeDataService::default(),
            store.clone(),
            LockPolicy::KeepSession,
        );
        first.service.set(sherry(), AuthToken::new("token")).await;

        let second = harness_with(FakeDataService::default(), store, LockPolicy::KeepSession);
        assert_eq!(second.service.restore().await.unwrap(), Some(sherry()));
        assert_eq!(second.service.token().await, Some(AuthToken::new("token")));
        assert_eq!(second.service.get().await.unwrap(), sherry());
        assert_eq!(second.api.calls(), 0);

        let mut rx = second.service.subscribe();
        second.service.logout().await.unwrap();
        assert_eq!(
            *second.auth.last_logout_token.lock().unwrap(),
            Some(AuthToken::new("token"))
        );
        assert!(second.store.is_empty().await);
        assert!(second.service.token().await.is_none());
        assert!(!second.service.is_authenticated());
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());

        // Logged out: the next get fetches instead of serving the old profile
        assert_eq!(second.service.get().await.unwrap(), douglas());
        assert_eq!(second.api.calls(), 1);
    }

    #[tokio::test]
    async fn test_logout_drops_local_session_when_provider_fails() {
        let h = harness();
        h.service.set(sherry(), AuthToken::new("token")).await;
        h.auth.fail_logout.store(true, Ordering::SeqCst);

        assert!(matches!(
            h.service.logout().await,
            Err(VaultgateError::Logout(_))
        ));
        assert!(h.service.token().await.is_none());
        assert!(!h.service.is_authenticated());
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_restore_reports_unreadable_session() {
        let h = harness();
        h.store
            .set(super::super::persistence::SESSION_KEY, "{not json")
            .await
            .unwrap();

        assert!(matches!(
            h.service.restore().await,
            Err(VaultgateError::Storage(_))
        ));
        assert!(h.service.token().await.is_none());
        assert!(!h.service.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_adopts_session_and_notifies() {
        let h = harness();
        let mut rx = h.service.subscribe();
        assert!(!*rx.borrow());

        assert!(matches!(
            h.service.login("alamode@test.org", "wrong").await,
            Err(VaultgateError::Unauthorized)
        ));
        assert!(matches!(
            h.service.login("  ", "pie").await,
            Err(VaultgateError::InvalidInput(_))
        ));

        let user = h.service.login("alamode@test.org", "pie").await.unwrap();
        assert_eq!(user, sherry());
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
        assert_eq!(h.service.token().await, Some(AuthToken::new("sherry-token")));

        h.service.remove().await.unwrap();
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());
    }

    #[tokio::test]
    async fn test_vault_lock_event_navigates_through_subscription() {
        let store = Arc::new(MemoryStore::new());
        let nav = Arc::new(ChannelNavigator::new());
        let mut routes = nav.subscribe();
        let service = Arc::new(IdentityService::new(
            Arc::new(FakeDataService::default()),
            Arc::new(FakeAuth::default()),
            store.clone(),
            nav.clone(),
            LockPolicy::KeepSession,
        ));

        let vault = SessionVault::open(store).await.unwrap();
        let watcher = service.watch_vault(vault.subscribe());
        vault.setup(AuthMethod::SecureStorage, None).await.unwrap();

        assert!(vault.lock(LockReason::Manual).await);
        let route = tokio::time::timeout(Duration::from_secs(1), routes.recv())
            .await
            .expect("navigation after lock")
            .unwrap();
        assert_eq!(route, vec!["login".to_string()]);

        // Already locked: no event, no navigation
        assert!(!vault.lock(LockReason::Manual).await);
        assert!(
            tokio::time::timeout(Duration::from_millis(100), routes.recv())
                .await
                .is_err()
        );

        watcher.abort();
    }
}
