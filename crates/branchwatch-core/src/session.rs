// ── Persisted login session ──
//
// The backend token, the user it belongs to and the time of the last
// batch check survive restarts through a `SessionStore`. The file-backed
// implementation lives in branchwatch-config; core only sees the trait.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use branchwatch_api::models::User;

use crate::error::CoreError;

/// An authenticated session.
#[derive(Debug)]
pub struct Session {
    pub token: SecretString,
    pub user: Option<User>,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: SecretString, user: Option<User>) -> Self {
        Self {
            token,
            user,
            logged_in_at: Utc::now(),
        }
    }

    /// Copy of the token for installing on a client.
    pub fn token_copy(&self) -> SecretString {
        SecretString::from(self.token.expose_secret().to_owned())
    }
}

/// Where sessions and the last-check timestamp are kept between runs.
///
/// `clear` forgets the token and user only; the last-check time is
/// independent of who is logged in.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, CoreError>;
    fn save(&self, session: &Session) -> Result<(), CoreError>;
    fn clear(&self) -> Result<(), CoreError>;
    fn last_check(&self) -> Result<Option<DateTime<Utc>>, CoreError>;
    fn record_check(&self, at: DateTime<Utc>) -> Result<(), CoreError>;
}

#[derive(Default)]
struct MemoryState {
    token: Option<String>,
    user: Option<User>,
    logged_in_at: Option<DateTime<Utc>>,
    last_check: Option<DateTime<Utc>>,
}

/// In-process session store for tests and throwaway runs.
#[derive(Default)]
pub struct MemorySessionStore {
    state: Mutex<MemoryState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, CoreError> {
        let state = self.state();
        Ok(state.token.as_ref().map(|token| Session {
            token: SecretString::from(token.clone()),
            user: state.user.clone(),
            logged_in_at: state.logged_in_at.unwrap_or_else(Utc::now),
        }))
    }

    fn save(&self, session: &Session) -> Result<(), CoreError> {
        let mut state = self.state();
        state.token = Some(session.token.expose_secret().to_owned());
        state.user.clone_from(&session.user);
        state.logged_in_at = Some(session.logged_in_at);
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        let mut state = self.state();
        state.token = None;
        state.user = None;
        state.logged_in_at = None;
        Ok(())
    }

    fn last_check(&self) -> Result<Option<DateTime<Utc>>, CoreError> {
        Ok(self.state().last_check)
    }

    fn record_check(&self, at: DateTime<Utc>) -> Result<(), CoreError> {
        self.state().last_check = Some(at);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clear_keeps_last_check() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        store
            .save(&Session::new(SecretString::from("t".to_string()), None))
            .unwrap();
        store.record_check(now).unwrap();

        store.clear().unwrap();

        assert!(store.load().unwrap().is_none());
        assert_eq!(store.last_check().unwrap(), Some(now));
    }

    #[test]
    fn load_round_trips_token_and_user() {
        let store = MemorySessionStore::new();
        let user = User {
            email: "ops@example.com".into(),
            ..User::default()
        };
        store
            .save(&Session::new(
                SecretString::from("abc".to_string()),
                Some(user.clone()),
            ))
            .unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token.expose_secret(), "abc");
        assert_eq!(loaded.user, Some(user));
    }
}
