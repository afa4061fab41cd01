// ── Restaurant and branch domain types ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::platform::{Platform, PlatformStatus};

/// Backend-assigned numeric identifier.
pub type EntityId = i64;

/// A restaurant with the branch counts aggregated by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: EntityId,
    pub name: String,
    pub branch_ids: Vec<EntityId>,
    pub total_branches: u32,
    pub online_branches: u32,
    pub offline_branches: u32,
}

/// Per-platform state of a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformState {
    pub status: PlatformStatus,
    /// Whether the branch has a URL or credentials stored for the platform.
    pub configured: bool,
}

/// A physical restaurant location tracked for platform availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: EntityId,
    pub restaurant_id: EntityId,
    pub restaurant_name: String,
    pub name: String,
    pub address: String,
    pub manager_name: Option<String>,
    pub notification_email: Option<String>,
    pub telegram_username: Option<String>,
    /// True when at least one platform reports the branch online.
    pub is_online: bool,
    pub last_status_change: Option<DateTime<Utc>>,
    pub platforms: BTreeMap<Platform, PlatformState>,
}

impl Branch {
    /// Status for one platform; platforms the backend left out read as not configured.
    pub fn status(&self, platform: Platform) -> PlatformStatus {
        self.platforms
            .get(&platform)
            .map_or(PlatformStatus::NotConfigured, |s| s.status.clone())
    }
}

/// Headline counts shown above the dashboard tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub total_restaurants: usize,
    pub total_branches: usize,
    pub online_branches: usize,
    pub offline_branches: usize,
}

impl Overview {
    /// Count branches by their `is_online` flag.
    pub fn compute<'a>(
        restaurant_count: usize,
        branches: impl IntoIterator<Item = &'a Branch>,
    ) -> Self {
        let mut overview = Self {
            total_restaurants: restaurant_count,
            ..Self::default()
        };
        for branch in branches {
            overview.total_branches += 1;
            if branch.is_online {
                overview.online_branches += 1;
            } else {
                overview.offline_branches += 1;
            }
        }
        overview
    }
}

/// Result of asking the backend to re-check one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub branch_id: EntityId,
    pub branch_name: String,
    pub statuses: BTreeMap<Platform, PlatformStatus>,
}

impl CheckOutcome {
    pub fn any_online(&self) -> bool {
        self.statuses.values().any(PlatformStatus::is_online)
    }
}

/// Summary of a finished "check all branches" batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<CheckOutcome>,
}

impl BatchReport {
    pub fn checked(&self) -> usize {
        self.outcomes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(id: EntityId, online: bool) -> Branch {
        Branch {
            id,
            restaurant_id: 1,
            restaurant_name: "Kebapci".into(),
            name: format!("Branch {id}"),
            address: String::new(),
            manager_name: None,
            notification_email: None,
            telegram_username: None,
            is_online: online,
            last_status_change: None,
            platforms: BTreeMap::new(),
        }
    }

    #[test]
    fn overview_counts_add_up() {
        let branches = [branch(1, true), branch(2, false), branch(3, true)];
        let overview = Overview::compute(2, branches.iter());

        assert_eq!(overview.total_restaurants, 2);
        assert_eq!(overview.total_branches, 3);
        assert_eq!(overview.online_branches, 2);
        assert_eq!(overview.offline_branches, 1);
        assert_eq!(
            overview.online_branches + overview.offline_branches,
            overview.total_branches
        );
    }

    #[test]
    fn overview_of_nothing_is_zero() {
        assert_eq!(Overview::compute(0, std::iter::empty()), Overview::default());
    }

    #[test]
    fn missing_platform_reads_as_not_configured() {
        assert_eq!(
            branch(1, false).status(Platform::Getir),
            PlatformStatus::NotConfigured
        );
    }
}
