//! Session identity: anonymous, authenticating, authenticated.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::ClientResult;
use crate::notify::Notifier;
use crate::session::PersistedSession;
use crate::types::{Credentials, UserProfile};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// In-memory auth state. Only `{user, token, is_authenticated}` is persisted.
#[derive(Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl AuthState {
    pub fn phase(&self) -> AuthPhase {
        if self.is_loading {
            AuthPhase::Authenticating
        } else if self.is_authenticated {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Anonymous
        }
    }

    fn from_persisted(session: PersistedSession) -> Self {
        let session = session.normalized();
        Self {
            user: session.user,
            token: session.token,
            is_authenticated: session.is_authenticated,
            is_loading: false,
        }
    }

    fn persisted(&self) -> PersistedSession {
        PersistedSession {
            user: self.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.is_authenticated,
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("is_authenticated", &self.is_authenticated)
            .field("is_loading", &self.is_loading)
            .finish()
    }
}

/// Owns the session. The API client reads the token through the shared
/// [`SessionToken`](crate::auth::SessionToken); this store is its only
/// writer outside of 401 teardown.
#[derive(Debug)]
pub struct AuthStore {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    state: RwLock<AuthState>,
}

impl AuthStore {
    /// Create the store and hydrate it from persisted storage.
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        let persisted = match api.storage().load() {
            Ok(session) => session.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable persisted session");
                PersistedSession::default()
            }
        };
        let state = AuthState::from_persisted(persisted);

        match &state.token {
            Some(token) => api.token().set(token.clone()),
            None => {
                api.token().clear();
            }
        }
        debug!(authenticated = state.is_authenticated, "auth store hydrated");

        Self {
            api,
            notifier,
            state: RwLock::new(state),
        }
    }

    /// Current state.
    pub fn state(&self) -> AuthState {
        self.sync_with_token();
        self.read().clone()
    }

    pub fn phase(&self) -> AuthPhase {
        self.state().phase()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state().user
    }

    /// Log in and load the profile.
    ///
    /// On failure the store ends anonymous and the error is surfaced and
    /// returned.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
        self.write().is_loading = true;
        let credentials = Credentials::new(email, password);

        match self.authenticate(&credentials).await {
            Ok(user) => {
                info!(email = %user.email, "logged in");
                self.notifier.success("Login successful");
                Ok(user)
            }
            Err(e) => {
                self.api.token().clear();
                self.write().reset();
                self.clear_persisted();
                self.notifier.error(&e.user_message());
                Err(e)
            }
        }
    }

    async fn authenticate(&self, credentials: &Credentials) -> ClientResult<UserProfile> {
        let access = self.api.login(credentials).await?;
        self.api.token().set(access.access_token.clone());

        let user = self.api.profile().await?;

        let snapshot = {
            let mut state = self.write();
            state.user = Some(user.clone());
            state.token = Some(access.access_token);
            state.is_authenticated = true;
            state.is_loading = false;
            state.clone()
        };
        self.persist(&snapshot);

        Ok(user)
    }

    /// Create an account, then log in with the same credentials.
    ///
    /// The store reads as authenticating for the whole sequence. A failed
    /// registration leaves the rest of the state untouched.
    pub async fn register(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
        self.write().is_loading = true;
        let credentials = Credentials::new(email, password);

        match self.api.register(&credentials).await {
            Ok(account) => {
                info!(email = %account.email, "account registered");
                self.notifier.success("Registration successful");
            }
            Err(e) => {
                self.write().is_loading = false;
                self.notifier.error(&e.user_message());
                return Err(e);
            }
        }

        self.login(email, password).await
    }

    /// Tear the session down locally, then ask the server to invalidate the
    /// old token in the background.
    ///
    /// Local teardown completes before this returns. The server call never
    /// blocks it and its failure is swallowed. Returns the background task
    /// when one was started.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        let token = self.api.token().clear();
        self.write().reset();
        self.clear_persisted();
        self.notifier.success("Logged out");

        let token = token?;
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                debug!("no runtime, skipping server-side logout");
                return None;
            }
        };

        let api = self.api.clone();
        Some(runtime.spawn(async move {
            if let Err(e) = api.logout_token(&token).await {
                debug!(error = %e, "server-side logout failed");
            }
        }))
    }

    /// Verify the persisted session against the server.
    ///
    /// No token: anonymous, no network call. Token accepted: authenticated
    /// with a fresh profile. Token rejected: token cleared, anonymous.
    /// Safe to call repeatedly.
    pub async fn check_auth(&self) -> AuthPhase {
        self.sync_with_token();
        if self.api.token().get().is_none() {
            let mut state = self.write();
            if state.is_authenticated || state.user.is_some() {
                state.reset();
            }
            return AuthPhase::Anonymous;
        }

        match self.api.profile().await {
            Ok(user) => {
                let snapshot = {
                    let mut state = self.write();
                    state.user = Some(user);
                    state.token = self.api.token().get();
                    state.is_authenticated = state.token.is_some();
                    state.clone()
                };
                self.persist(&snapshot);
                snapshot.phase()
            }
            Err(e) => {
                debug!(error = %e, "stored session rejected");
                self.api.token().clear();
                self.write().reset();
                self.clear_persisted();
                AuthPhase::Anonymous
            }
        }
    }

    // A 401 anywhere clears the shared token without going through the
    // store; fold that into the in-memory state.
    fn sync_with_token(&self) {
        let current = self.api.token().get();
        let mut state = self.write();
        if state.token.is_some() && state.token != current && !state.is_loading {
            debug!("session token revoked, resetting auth state");
            state.reset();
        }
    }

    fn persist(&self, state: &AuthState) {
        if let Err(e) = self.api.storage().save(&state.persisted()) {
            warn!(error = %e, "failed to persist session");
        }
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.api.storage().clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
