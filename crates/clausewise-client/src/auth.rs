//! Bearer-token plumbing shared between the API client and the auth store.
//!
//! The auth store owns the session and is the only writer of the token in
//! the normal flow. The API client reads it for every request and clears it
//! when the server answers 401, then hands control to a [`LoginRedirect`].

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared, cheaply clonable handle to the current bearer token.
#[derive(Clone, Default)]
pub struct SessionToken {
    slot: Arc<RwLock<Option<String>>>,
}

impl SessionToken {
    /// Empty token slot (anonymous).
    pub fn new() -> Self {
        Self::default()
    }

    /// Token slot pre-filled with `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let handle = Self::new();
        handle.set(token);
        handle
    }

    /// Current token, if any.
    pub fn get(&self) -> Option<String> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    /// Remove the token, returning the previous value.
    pub fn clear(&self) -> Option<String> {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn is_present(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_present() { "<set>" } else { "<none>" };
        f.debug_struct("SessionToken").field("token", &state).finish()
    }
}

/// Side effect fired after a 401 has torn the session down.
///
/// A browser front end navigates to its login page here; a CLI tells the
/// user to log in again.
pub trait LoginRedirect: Send + Sync + fmt::Debug {
    fn redirect_to_login(&self);
}

/// Default redirect: records the event in the log.
#[derive(Debug, Clone)]
pub struct LogRedirect {
    login_path: String,
}

impl LogRedirect {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }
}

impl Default for LogRedirect {
    fn default() -> Self {
        Self::new("/login")
    }
}

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self) {
        tracing::warn!(login_path = %self.login_path, "session rejected by server, redirecting to login");
    }
}
