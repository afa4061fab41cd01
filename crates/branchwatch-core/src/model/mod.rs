// ── Domain model ──

pub mod platform;
pub mod restaurant;

pub use platform::{Platform, PlatformStatus, StatusTone};
pub use restaurant::{
    BatchReport, Branch, CheckOutcome, EntityId, Overview, PlatformState, Restaurant,
};
