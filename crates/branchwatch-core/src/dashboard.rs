// ── Dashboard facade ──
//
// Everything the frontends do goes through `Dashboard`: login and
// session persistence, listing and editing restaurants and branches,
// and triggering platform status checks. A 401 from any call drops the
// stored session and surfaces `CoreError::SessionExpired`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use branchwatch_api::models::User;
use branchwatch_api::{ApiClient, TlsMode, TransportConfig};

use crate::config::{ServiceConfig, TlsVerification};
use crate::convert::check_outcome;
use crate::error::CoreError;
use crate::form::{LoginForm, NewBranch, NewRestaurantForm, RegisterForm};
use crate::model::{BatchReport, Branch, CheckOutcome, EntityId, Overview, Restaurant};
use crate::session::{Session, SessionStore};
use crate::store::DataStore;
use crate::stream::EntityStream;

// ── AuthState ────────────────────────────────────────────────────────

/// Login state observable by frontends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    LoggedIn { user: Option<User> },
    /// The backend rejected the stored token; the user must log in again.
    Expired,
}

// ── Dashboard ────────────────────────────────────────────────────────

/// The main entry point for frontends.
///
/// Cheaply cloneable via `Arc<DashboardInner>`.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: ServiceConfig,
    client: ApiClient,
    sessions: Arc<dyn SessionStore>,
    store: Arc<DataStore>,
    auth_state: watch::Sender<AuthState>,
    /// Set while a batch check is running.
    checking: AtomicBool,
}

/// Clears the in-flight flag when a batch ends, however it ends.
struct BatchGuard<'a>(&'a AtomicBool);

impl<'a> BatchGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Dashboard {
    /// Build the HTTP client from `config` and restore any saved session.
    pub fn new(config: ServiceConfig, sessions: Arc<dyn SessionStore>) -> Result<Self, CoreError> {
        let client = ApiClient::new(config.url.clone(), &build_transport(&config))?;
        Self::with_client(config, client, sessions)
    }

    /// Use a pre-built client (tests, custom transports).
    pub fn with_client(
        config: ServiceConfig,
        client: ApiClient,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, CoreError> {
        let state = match sessions.load()? {
            Some(session) => {
                debug!("restored saved session");
                client.set_token(Some(session.token_copy()));
                AuthState::LoggedIn { user: session.user }
            }
            None => AuthState::LoggedOut,
        };
        let (auth_state, _) = watch::channel(state);

        Ok(Self {
            inner: Arc::new(DashboardInner {
                config,
                client,
                sessions,
                store: Arc::new(DataStore::new()),
                auth_state,
                checking: AtomicBool::new(false),
            }),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Log in and persist the session.
    pub async fn login(&self, form: &LoginForm) -> Result<User, CoreError> {
        let (email, password) = form.validate()?;
        let login = self.inner.client.login(&email, &password).await?;

        let user = login.user.unwrap_or_else(|| User {
            email: email.clone(),
            ..User::default()
        });
        let session = Session::new(login.token, Some(user.clone()));
        self.inner.client.set_token(Some(session.token_copy()));
        self.inner.sessions.save(&session)?;
        self.inner.auth_state.send_replace(AuthState::LoggedIn {
            user: Some(user.clone()),
        });

        info!(email = %user.email, "logged in");
        Ok(user)
    }

    /// Create an operator account. Does not log in.
    pub async fn register(&self, form: &RegisterForm) -> Result<User, CoreError> {
        let request = form.validate()?;
        let user = self.track(self.inner.client.register(&request).await)?;
        info!(email = %user.email, "account registered");
        Ok(user)
    }

    /// Revoke the token on the backend if possible, then forget it locally.
    ///
    /// Backend failures are logged and ignored.
    pub async fn logout(&self) -> Result<(), CoreError> {
        if self.inner.client.has_token() {
            if let Err(e) = self.inner.client.logout().await {
                warn!(error = %e, "backend logout failed; clearing local session anyway");
            }
        }
        self.inner.client.set_token(None);
        self.inner.store.clear();
        self.inner.auth_state.send_replace(AuthState::LoggedOut);
        self.inner.sessions.clear()?;
        info!("logged out");
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        match &*self.inner.auth_state.borrow() {
            AuthState::LoggedIn { user } => user.clone(),
            _ => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.client.has_token()
    }

    pub fn auth_state(&self) -> AuthState {
        self.inner.auth_state.borrow().clone()
    }

    pub fn subscribe_auth_state(&self) -> watch::Receiver<AuthState> {
        self.inner.auth_state.subscribe()
    }

    // ── Listing ──────────────────────────────────────────────────────

    pub async fn restaurants(&self) -> Result<Vec<Restaurant>, CoreError> {
        self.require_session()?;
        let dtos = self.track(self.inner.client.list_restaurants().await)?;
        let restaurants: Vec<Restaurant> = dtos.into_iter().map(Restaurant::from).collect();
        self.inner.store.apply_restaurants(restaurants.clone());
        Ok(restaurants)
    }

    pub async fn branches(&self) -> Result<Vec<Branch>, CoreError> {
        self.require_session()?;
        let dtos = self.track(self.inner.client.list_branches().await)?;
        let branches: Vec<Branch> = dtos.into_iter().map(Branch::from).collect();
        self.inner.store.apply_branches(branches.clone());
        Ok(branches)
    }

    /// Fetch restaurants, then branches, and publish both.
    pub async fn refresh(&self) -> Result<Overview, CoreError> {
        self.require_session()?;
        let restaurants = self.track(self.inner.client.list_restaurants().await)?;
        let branches = self.track(self.inner.client.list_branches().await)?;
        self.inner.store.apply_refresh(
            restaurants.into_iter().map(Restaurant::from).collect(),
            branches.into_iter().map(Branch::from).collect(),
        );
        let overview = self.inner.store.overview();
        debug!(
            restaurants = overview.total_restaurants,
            branches = overview.total_branches,
            "refresh complete"
        );
        Ok(overview)
    }

    /// Counts from the latest snapshots; no request is made.
    pub fn overview(&self) -> Overview {
        self.inner.store.overview()
    }

    pub fn restaurants_snapshot(&self) -> Arc<Vec<Arc<Restaurant>>> {
        self.inner.store.restaurants_snapshot()
    }

    pub fn branches_snapshot(&self) -> Arc<Vec<Arc<Branch>>> {
        self.inner.store.branches_snapshot()
    }

    pub fn restaurants_stream(&self) -> EntityStream<Restaurant> {
        self.inner.store.subscribe_restaurants()
    }

    pub fn branches_stream(&self) -> EntityStream<Branch> {
        self.inner.store.subscribe_branches()
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn create_restaurant(&self, name: &str) -> Result<Restaurant, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "Restaurant name: required".into(),
            });
        }
        self.require_session()?;
        let dto = self.track(self.inner.client.create_restaurant(name).await)?;
        let restaurant = Restaurant::from(dto);
        self.inner
            .store
            .restaurants
            .upsert(restaurant.id, restaurant.clone());
        info!(id = restaurant.id, name = %restaurant.name, "restaurant created");
        Ok(restaurant)
    }

    pub async fn create_branch(&self, branch: &NewBranch) -> Result<Branch, CoreError> {
        branch.validate()?;
        self.require_session()?;
        let request = branch.fields.to_request(branch.restaurant);
        let dto = self.track(self.inner.client.create_branch(&request).await)?;
        let created = Branch::from(dto);
        self.inner.store.branches.upsert(created.id, created.clone());
        info!(id = created.id, restaurant = branch.restaurant, name = %created.name, "branch created");
        Ok(created)
    }

    /// Create a restaurant and its first branch, then refresh.
    ///
    /// The whole form is validated before any request. If the branch
    /// cannot be created the restaurant stays on the backend.
    pub async fn add_restaurant(
        &self,
        form: &NewRestaurantForm,
    ) -> Result<(Restaurant, Branch), CoreError> {
        form.validate()?;
        self.require_session()?;

        let restaurant = self.create_restaurant(&form.restaurant_name).await?;
        let branch = NewBranch {
            restaurant: restaurant.id,
            fields: form.branch.clone(),
        };
        let branch = match self.create_branch(&branch).await {
            Ok(branch) => branch,
            Err(e) => {
                warn!(
                    restaurant_id = restaurant.id,
                    error = %e,
                    "restaurant created but its first branch was not"
                );
                return Err(e);
            }
        };

        self.refresh().await?;
        Ok((restaurant, branch))
    }

    pub async fn delete_restaurant(&self, id: EntityId) -> Result<(), CoreError> {
        self.require_session()?;
        let result = self.inner.client.delete_restaurant(id).await;
        self.track_lookup(result, "restaurant", id)?;
        info!(id, "restaurant deleted");
        self.refresh().await.map(|_| ())
    }

    pub async fn delete_branch(&self, id: EntityId) -> Result<(), CoreError> {
        self.require_session()?;
        let result = self.inner.client.delete_branch(id).await;
        self.track_lookup(result, "branch", id)?;
        info!(id, "branch deleted");
        self.refresh().await.map(|_| ())
    }

    // ── Status checks ────────────────────────────────────────────────

    /// Ask the backend to re-check one branch, then refresh branches.
    pub async fn check_branch(&self, id: EntityId) -> Result<CheckOutcome, CoreError> {
        self.require_session()?;
        let name = self
            .inner
            .store
            .branch(id)
            .map(|b| b.name.clone())
            .unwrap_or_default();
        let result = self.inner.client.check_branch_status(id).await;
        let response = self.track_lookup(result, "branch", id)?;
        let mut outcome = check_outcome(id, name, response);

        let branches = self.branches().await?;
        if outcome.branch_name.is_empty() {
            if let Some(b) = branches.iter().find(|b| b.id == id) {
                outcome.branch_name.clone_from(&b.name);
            }
        }
        Ok(outcome)
    }

    /// Re-check every branch, one request at a time.
    ///
    /// Records the check time first. The first failure aborts the rest
    /// of the batch. `progress` sees each outcome as it arrives. Only
    /// one batch may run at a time; a second caller gets
    /// `CoreError::CheckInProgress`.
    pub async fn check_all<F>(&self, mut progress: F) -> Result<BatchReport, CoreError>
    where
        F: FnMut(&CheckOutcome) + Send,
    {
        self.require_session()?;
        let _guard = BatchGuard::acquire(&self.inner.checking).ok_or(CoreError::CheckInProgress)?;

        let started_at = Utc::now();
        if let Err(e) = self.inner.sessions.record_check(started_at) {
            warn!(error = %e, "could not persist last check time");
        }

        let branches = self.branches().await?;
        debug!(count = branches.len(), "batch check started");

        let mut outcomes = Vec::with_capacity(branches.len());
        for branch in branches {
            let result = self.inner.client.check_branch_status(branch.id).await;
            let response = match self.track(result) {
                Ok(response) => response,
                Err(e) => {
                    warn!(branch = branch.id, error = %e, "batch check aborted");
                    return Err(e);
                }
            };
            let outcome = check_outcome(branch.id, branch.name, response);
            progress(&outcome);
            outcomes.push(outcome);
        }

        self.branches().await?;
        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(checked = report.checked(), "batch check finished");
        Ok(report)
    }

    /// Whether a batch check is running right now.
    pub fn is_checking(&self) -> bool {
        self.inner.checking.load(Ordering::Acquire)
    }

    pub fn last_check(&self) -> Result<Option<DateTime<Utc>>, CoreError> {
        self.inner.sessions.last_check()
    }

    pub fn record_check(&self, at: DateTime<Utc>) -> Result<(), CoreError> {
        self.inner.sessions.record_check(at)
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn require_session(&self) -> Result<(), CoreError> {
        if self.inner.client.has_token() {
            Ok(())
        } else {
            Err(CoreError::NotLoggedIn)
        }
    }

    /// Convert an API result, dropping the session on a 401.
    fn track<T>(&self, result: Result<T, branchwatch_api::Error>) -> Result<T, CoreError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if e.is_auth_expired() => {
                self.expire();
                Err(CoreError::SessionExpired)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Like `track`, but a 404 names the missing entity.
    fn track_lookup<T>(
        &self,
        result: Result<T, branchwatch_api::Error>,
        entity_type: &str,
        id: EntityId,
    ) -> Result<T, CoreError> {
        match result {
            Err(e) if e.is_not_found() => Err(CoreError::NotFound {
                entity_type: entity_type.to_owned(),
                identifier: id.to_string(),
            }),
            other => self.track(other),
        }
    }

    fn expire(&self) {
        warn!("backend rejected the session token; logging out");
        self.inner.client.set_token(None);
        if let Err(e) = self.inner.sessions.clear() {
            warn!(error = %e, "could not clear stored session");
        }
        self.inner.store.clear();
        self.inner.auth_state.send_replace(AuthState::Expired);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_transport(config: &ServiceConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::session::MemorySessionStore;

    fn config() -> ServiceConfig {
        ServiceConfig::new("http://127.0.0.1:9".parse().unwrap())
    }

    #[test]
    fn batch_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = BatchGuard::acquire(&flag).unwrap();
        assert!(BatchGuard::acquire(&flag).is_none());
        drop(first);
        assert!(BatchGuard::acquire(&flag).is_some());
    }

    #[test]
    fn saved_session_is_restored() {
        let sessions = Arc::new(MemorySessionStore::new());
        sessions
            .save(&Session::new(SecretString::from("t".to_string()), None))
            .unwrap();

        let dashboard = Dashboard::new(config(), sessions).unwrap();
        assert!(dashboard.is_logged_in());
        assert_eq!(dashboard.auth_state(), AuthState::LoggedIn { user: None });
    }

    #[tokio::test]
    async fn listing_without_session_is_rejected() {
        let dashboard = Dashboard::new(config(), Arc::new(MemorySessionStore::new())).unwrap();
        assert!(matches!(
            dashboard.restaurants().await,
            Err(CoreError::NotLoggedIn)
        ));
    }

    #[test]
    fn tls_modes_map_one_to_one() {
        assert!(matches!(
            tls_to_transport(&TlsVerification::DangerAcceptInvalid),
            TlsMode::DangerAcceptInvalid
        ));
        assert!(matches!(
            tls_to_transport(&TlsVerification::SystemDefaults),
            TlsMode::System
        ));
    }
}
