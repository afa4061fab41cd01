// branchwatch-api: Async Rust client for the restaurant status backend

pub mod auth;
pub mod branches;
pub mod client;
pub mod error;
pub mod models;
pub mod restaurants;
pub mod transport;

pub use client::ApiClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
