use std::future::Future;

use chrono::Duration;
use tracing::{debug, error, info, warn};

use crate::api::ApiError;
use crate::auth::{AuthProvider, TokenStore};
use crate::cache::ClientCache;
use crate::models::Profile;
use crate::store::{Snapshot, SnapshotStore};

/// Navigation targets the store can force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
}

/// Hard-navigation seam, injected at construction so tests can record
/// redirects instead of performing them.
pub trait Navigator: Send {
    fn redirect(&mut self, route: Route);
}

/// Navigator that drops redirects, for contexts without routing.
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect(&mut self, _route: Route) {}
}

/// Mutation notifications delivered synchronously to subscribers within
/// the same turn as the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    ActorChanged,
    SessionExpired,
    CacheCleared,
}

type SubscriberFn = Box<dyn FnMut(StoreEvent) + Send>;

/// Single source of truth for the authenticated actor, plus lifecycle
/// flags and the embedded client cache.
///
/// All writes go through the designated entry points; reads are plain
/// accessors. The store is an explicit instance handed to its owner, not
/// an ambient global, so tests construct isolated stores.
pub struct IdentityStore {
    actor: Option<Profile>,
    initialized: bool,
    session_expired: bool,
    cache: ClientCache,
    snapshot: SnapshotStore,
    navigator: Box<dyn Navigator>,
    subscribers: Vec<SubscriberFn>,
    // Survives actor clearing so expiry can still purge the keychain
    // entry.
    last_user_id: Option<String>,
}

impl IdentityStore {
    pub fn new(snapshot: SnapshotStore, navigator: Box<dyn Navigator>) -> Self {
        Self {
            actor: None,
            initialized: false,
            session_expired: false,
            cache: ClientCache::new(),
            snapshot,
            navigator,
            subscribers: Vec::new(),
            last_user_id: None,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn actor(&self) -> Option<&Profile> {
        self.actor.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn session_expired(&self) -> bool {
        self.session_expired
    }

    /// One-shot read of the expired flag, so the login screen shows the
    /// "session expired" notice exactly once.
    pub fn take_session_expired(&mut self) -> bool {
        std::mem::take(&mut self.session_expired)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Resolve an existing provider session into an actor. Idempotent;
    /// the second call is a no-op.
    ///
    /// The persisted snapshot is restored optimistically before the
    /// provider confirms the session, so a restored actor may be trusted
    /// briefly until the first monitor poll refutes it. Any failure
    /// degrades to "treat as unauthenticated" but the initialization
    /// flag is always set so callers never block on the store.
    pub async fn initialize(&mut self, provider: &dyn AuthProvider) {
        if self.initialized {
            return;
        }

        match self.snapshot.load() {
            Ok(Some(snapshot)) => {
                debug!(
                    has_actor = snapshot.actor.is_some(),
                    cache_entries = snapshot.cache.len(),
                    "Restoring persisted snapshot"
                );
                if let Some(actor) = snapshot.actor {
                    self.last_user_id = Some(actor.id.clone());
                    self.actor = Some(actor);
                }
                self.cache.import(snapshot.cache);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load snapshot, starting empty"),
        }

        match self.resolve_session(provider).await {
            Ok(Some(profile)) => self.set_actor(Some(profile)),
            // No provider session: keep the optimistically restored
            // actor; the first monitor poll settles it.
            Ok(None) => debug!("No provider session at initialization"),
            Err(e) => error!(error = %e, "Initialization error"),
        }

        self.initialized = true;
    }

    async fn resolve_session(
        &self,
        provider: &dyn AuthProvider,
    ) -> Result<Option<Profile>, ApiError> {
        let session = match provider.get_session().await? {
            Some(session) if !session.is_expired() => session,
            _ => return Ok(None),
        };
        provider.fetch_profile(&session.user_id).await
    }

    /// Unconditional actor overwrite; subscribers re-evaluate in this turn.
    pub fn set_actor(&mut self, actor: Option<Profile>) {
        if let Some(ref profile) = actor {
            self.last_user_id = Some(profile.id.clone());
        }
        self.actor = actor;
        self.persist();
        self.notify(StoreEvent::ActorChanged);
    }

    /// Single convergence point for every expiry-detecting code path.
    ///
    /// Clears actor and cache together, sets the expired flag, purges
    /// persisted credential remnants, and only then issues the redirect,
    /// so nothing mounting on the login screen observes a stale actor.
    /// Safe to invoke against an already-cleared store.
    pub fn handle_expiration(&mut self) {
        if self.actor.is_none() && self.cache.is_empty() && self.session_expired {
            debug!("Expiration re-signalled on an already-cleared store");
            return;
        }

        info!("Session expired, clearing state and redirecting to login");

        self.actor = None;
        self.cache.clear();
        self.session_expired = true;
        self.purge_remnants();

        self.notify(StoreEvent::SessionExpired);
        self.navigator.redirect(Route::Login);
    }

    /// Explicit sign-out. Same cleanup as expiry but without the expired
    /// flag, so the login screen shows no notice.
    pub async fn logout(&mut self, provider: &dyn AuthProvider) {
        if let Err(e) = provider.sign_out().await {
            warn!(error = %e, "Error during logout, clearing local state anyway");
        }

        self.actor = None;
        self.cache.clear();
        self.session_expired = false;
        self.purge_remnants();

        self.notify(StoreEvent::CacheCleared);
        self.notify(StoreEvent::ActorChanged);
        self.navigator.redirect(Route::Login);
    }

    fn purge_remnants(&mut self) {
        if let Err(e) = self.snapshot.purge() {
            warn!(error = %e, "Failed to purge snapshot");
        }
        if let Some(ref user_id) = self.last_user_id {
            if let Err(e) = TokenStore::delete(user_id) {
                debug!(error = %e, "No keychain token to purge");
            }
        }
    }

    // =========================================================================
    // Cache entry points
    // =========================================================================

    /// Store an actor-scoped value with the default TTL.
    pub fn set_cache_item(&mut self, key: &str, value: serde_json::Value) {
        self.cache.set_item(key, value);
        self.persist();
    }

    /// Store an actor-scoped value with an explicit TTL.
    pub fn set_cache_item_with_ttl(
        &mut self,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) {
        self.cache.set_item_with_ttl(key, value, ttl);
        self.persist();
    }

    /// Fetch a cached value if still live; expired entries are evicted.
    pub fn get_cache_item(&mut self, key: &str) -> Option<serde_json::Value> {
        self.cache.get_item(key).cloned()
    }

    /// Drop every cache entry.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.persist();
        self.notify(StoreEvent::CacheCleared);
    }

    #[cfg(test)]
    pub(crate) fn cache_len(&self) -> usize {
        self.cache.len()
    }

    #[cfg(test)]
    pub(crate) fn mark_initialized_for_tests(&mut self) {
        self.initialized = true;
    }

    // =========================================================================
    // Auth-checked data calls
    // =========================================================================

    /// Run a data call behind a session check.
    ///
    /// A missing or lapsed session, or an auth failure reported by the
    /// call itself, funnels into `handle_expiration`; every other error
    /// is logged and normalized to `None`. Nothing here surfaces an
    /// error to UI code.
    pub async fn with_auth_check<T, Fut>(
        &mut self,
        provider: &dyn AuthProvider,
        call: impl FnOnce() -> Fut,
    ) -> Option<T>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match provider.get_session().await {
            Ok(Some(session)) if !session.is_expired() => {}
            Ok(_) => {
                debug!("No valid session for data call, redirecting to login");
                self.handle_expiration();
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Session check failed, treating as expired");
                self.handle_expiration();
                return None;
            }
        }

        match call().await {
            Ok(value) => Some(value),
            Err(e) if e.is_auth_failure() => {
                debug!("Authentication failure from data call, redirecting to login");
                self.handle_expiration();
                None
            }
            Err(e) => {
                warn!(error = %e, "Data call failed");
                None
            }
        }
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register an observer; notified synchronously on every mutation.
    pub fn subscribe(&mut self, subscriber: impl FnMut(StoreEvent) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn notify(&mut self, event: StoreEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(event);
        }
    }

    /// Best-effort persistence of {actor, cache}; a write failure only
    /// costs the restore-on-start optimization.
    fn persist(&self) {
        let snapshot = Snapshot {
            actor: self.actor.clone(),
            cache: self.cache.export(),
        };
        if let Err(e) = self.snapshot.save(&snapshot) {
            warn!(error = %e, "Failed to persist snapshot");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use serde_json::json;

    use crate::auth::ProviderSession;
    use crate::models::Role;

    struct RecordingNavigator(Arc<Mutex<Vec<Route>>>);

    impl Navigator for RecordingNavigator {
        fn redirect(&mut self, route: Route) {
            self.0.lock().unwrap().push(route);
        }
    }

    /// Scripted provider: each field controls one boundary call.
    struct FakeProvider {
        session: Option<ProviderSession>,
        session_error: bool,
        profile: Option<Profile>,
    }

    impl FakeProvider {
        fn without_session() -> Self {
            Self {
                session: None,
                session_error: false,
                profile: None,
            }
        }

        fn with_session(profile: Profile) -> Self {
            Self {
                session: Some(ProviderSession {
                    access_token: "tok".into(),
                    refresh_token: None,
                    user_id: profile.id.clone(),
                    expires_at: Utc::now() + Duration::hours(1),
                }),
                session_error: false,
                profile: Some(profile),
            }
        }

        fn erroring() -> Self {
            Self {
                session: None,
                session_error: true,
                profile: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl AuthProvider for FakeProvider {
        async fn get_session(&self) -> Result<Option<ProviderSession>, ApiError> {
            if self.session_error {
                return Err(ApiError::ServerError("boom".into()));
            }
            Ok(self.session.clone())
        }

        async fn refresh_session(&self) -> Result<ProviderSession, ApiError> {
            self.session.clone().ok_or(ApiError::Unauthorized)
        }

        async fn sign_out(&self) -> Result<(), ApiError> {
            Ok(())
        }

        async fn fetch_profile(&self, _user_id: &str) -> Result<Option<Profile>, ApiError> {
            Ok(self.profile.clone())
        }
    }

    fn profile(role: Role) -> Profile {
        Profile {
            id: "u1".into(),
            full_name: "Dana Reyes".into(),
            role,
            manager_id: None,
            team: "Platform".into(),
            force_password_change: false,
            created_at: None,
            updated_at: None,
        }
    }

    fn store_with_recorder(
        dir: &std::path::Path,
    ) -> (IdentityStore, Arc<Mutex<Vec<Route>>>) {
        let redirects = Arc::new(Mutex::new(Vec::new()));
        let store = IdentityStore::new(
            SnapshotStore::new(dir.to_path_buf()),
            Box::new(RecordingNavigator(redirects.clone())),
        );
        (store, redirects)
    }

    #[tokio::test]
    async fn test_initialize_resolves_session_into_actor() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = store_with_recorder(dir.path());
        let provider = FakeProvider::with_session(profile(Role::Employee));

        store.initialize(&provider).await;

        assert!(store.is_initialized());
        assert_eq!(store.actor().unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_initialize_marks_done_even_on_provider_error() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = store_with_recorder(dir.path());

        store.initialize(&FakeProvider::erroring()).await;

        assert!(store.is_initialized());
        assert!(store.actor().is_none());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = store_with_recorder(dir.path());

        store.initialize(&FakeProvider::without_session()).await;
        // Second call with a live session must not re-run resolution
        store
            .initialize(&FakeProvider::with_session(profile(Role::Admin)))
            .await;

        assert!(store.actor().is_none());
    }

    #[tokio::test]
    async fn test_initialize_restores_actor_from_snapshot() {
        let dir = tempfile::tempdir().unwrap();

        // A previous process persisted an actor
        {
            let (mut store, _) = store_with_recorder(dir.path());
            store.set_actor(Some(profile(Role::Manager)));
        }

        let (mut store, _) = store_with_recorder(dir.path());
        store.initialize(&FakeProvider::without_session()).await;

        // Restored optimistically despite the absent session; the first
        // monitor poll is what refutes it.
        assert_eq!(store.actor().unwrap().role, Role::Manager);
    }

    #[tokio::test]
    async fn test_handle_expiration_clears_everything_then_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, redirects) = store_with_recorder(dir.path());
        store.set_actor(Some(profile(Role::Employee)));
        store.set_cache_item("k", json!(1));

        let observed = Arc::new(Mutex::new(Vec::new()));
        let observed_clone = observed.clone();
        store.subscribe(move |event| observed_clone.lock().unwrap().push(event));

        store.handle_expiration();

        assert!(store.actor().is_none());
        assert_eq!(store.cache_len(), 0);
        assert!(store.session_expired());
        assert_eq!(*redirects.lock().unwrap(), vec![Route::Login]);
        assert_eq!(
            *observed.lock().unwrap(),
            vec![StoreEvent::SessionExpired]
        );

        // Snapshot remnants are gone
        let snapshot = SnapshotStore::new(dir.path().to_path_buf());
        assert!(snapshot.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_handle_expiration_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, redirects) = store_with_recorder(dir.path());
        store.set_actor(Some(profile(Role::Employee)));

        store.handle_expiration();
        store.handle_expiration();

        assert!(store.actor().is_none());
        assert!(store.session_expired());
        // Second invocation is a no-op: one redirect
        assert_eq!(redirects.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_expiration_on_never_populated_store_still_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, redirects) = store_with_recorder(dir.path());

        store.handle_expiration();

        assert!(store.session_expired());
        assert_eq!(redirects.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_take_session_expired_reads_once() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = store_with_recorder(dir.path());
        store.handle_expiration();

        assert!(store.take_session_expired());
        assert!(!store.take_session_expired());
    }

    #[tokio::test]
    async fn test_logout_clears_state_without_expired_flag() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, redirects) = store_with_recorder(dir.path());
        store.set_actor(Some(profile(Role::Hr)));
        store.set_cache_item("k", json!("v"));

        store
            .logout(&FakeProvider::with_session(profile(Role::Hr)))
            .await;

        assert!(store.actor().is_none());
        assert_eq!(store.cache_len(), 0);
        assert!(!store.session_expired());
        assert_eq!(*redirects.lock().unwrap(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_logout_notifies_cache_observers() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = store_with_recorder(dir.path());
        store.set_actor(Some(profile(Role::Hr)));
        store.set_cache_item("k", json!("v"));

        let observed = Arc::new(Mutex::new(Vec::new()));
        let observed_clone = observed.clone();
        store.subscribe(move |event| observed_clone.lock().unwrap().push(event));

        store
            .logout(&FakeProvider::with_session(profile(Role::Hr)))
            .await;

        // Cache observers see the wipe before the actor change lands
        assert_eq!(
            *observed.lock().unwrap(),
            vec![StoreEvent::CacheCleared, StoreEvent::ActorChanged]
        );
    }

    #[tokio::test]
    async fn test_with_auth_check_runs_call_under_valid_session() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = store_with_recorder(dir.path());
        let provider = FakeProvider::with_session(profile(Role::Employee));

        let result = store
            .with_auth_check(&provider, || async { Ok::<_, ApiError>(7) })
            .await;

        assert_eq!(result, Some(7));
    }

    #[tokio::test]
    async fn test_with_auth_check_expires_on_missing_session() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, redirects) = store_with_recorder(dir.path());
        store.set_actor(Some(profile(Role::Employee)));

        let result = store
            .with_auth_check(&FakeProvider::without_session(), || async {
                Ok::<_, ApiError>(7)
            })
            .await;

        assert_eq!(result, None);
        assert!(store.actor().is_none());
        assert_eq!(*redirects.lock().unwrap(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_with_auth_check_funnels_auth_failure_from_call() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = store_with_recorder(dir.path());
        store.set_actor(Some(profile(Role::Employee)));
        let provider = FakeProvider::with_session(profile(Role::Employee));

        let result: Option<i32> = store
            .with_auth_check(&provider, || async { Err(ApiError::Unauthorized) })
            .await;

        assert_eq!(result, None);
        assert!(store.session_expired());
    }

    #[tokio::test]
    async fn test_with_auth_check_normalizes_other_errors() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = store_with_recorder(dir.path());
        store.set_actor(Some(profile(Role::Employee)));
        let provider = FakeProvider::with_session(profile(Role::Employee));

        let result: Option<i32> = store
            .with_auth_check(&provider, || async {
                Err(ApiError::ServerError("503".into()))
            })
            .await;

        // Transient data failure is not an expiry
        assert_eq!(result, None);
        assert!(store.actor().is_some());
        assert!(!store.session_expired());
    }
}
