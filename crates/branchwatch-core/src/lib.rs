//! Domain layer between `branchwatch-api` and the frontends (CLI / TUI).
//!
//! - **[`Dashboard`]**: the facade. Logs in, persists the session through a
//!   [`SessionStore`], lists and edits restaurants and branches, and runs
//!   status checks. A 401 from any request clears the stored session and
//!   surfaces [`CoreError::SessionExpired`].
//!
//! - **[`DataStore`]**: reactive snapshots of the latest listings built on
//!   `DashMap` and `tokio::sync::watch`. [`EntityStream<T>`] exposes
//!   `current()` / `latest()` / `changed()` for reactive rendering.
//!
//! - **[`StatusPoller`]**: background task driving the [`Countdown`] to the
//!   next "check all branches" batch, reporting progress as [`PollEvent`]s.
//!
//! - **Forms** ([`form`]): validation that runs before anything is sent.

pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod form;
pub mod model;
pub mod poller;
pub mod search;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_CHECK_INTERVAL, DEFAULT_SERVER, ServiceConfig, TlsVerification};
pub use dashboard::{AuthState, Dashboard};
pub use error::CoreError;
pub use form::{BranchFields, FormField, LoginForm, NewBranch, NewRestaurantForm, RegisterForm, Role};
pub use poller::{Countdown, PollEvent, StatusPoller};
pub use search::filter_branches;
pub use session::{MemorySessionStore, Session, SessionStore};
pub use store::DataStore;
pub use stream::EntityStream;

pub use model::{
    BatchReport, Branch, CheckOutcome, EntityId, Overview, Platform, PlatformState,
    PlatformStatus, Restaurant, StatusTone,
};

// Frontends render the logged-in user without depending on the api crate.
pub use branchwatch_api::models::User;
