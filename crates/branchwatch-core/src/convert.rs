// ── API-to-domain type conversions ──
//
// Bridges raw `branchwatch_api::models` DTOs into the canonical domain
// types. Blank strings become `None`, timestamps are parsed leniently, and
// platform state falls back to the flat `*_status` booleans when the
// backend omits `platform_statuses`.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};

use branchwatch_api::models::{BranchDto, CheckStatusResponse, RestaurantDto};

use crate::model::{
    Branch, CheckOutcome, EntityId, Platform, PlatformState, PlatformStatus, Restaurant,
};

// ── Helpers ────────────────────────────────────────────────────────

fn non_empty(raw: Option<&String>) -> Option<String> {
    raw.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Parse an RFC 3339 timestamp, accepting offset-less values as UTC.
pub(crate) fn parse_timestamp(raw: Option<&String>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whether the branch has the URL or credentials the platform needs.
fn is_configured(dto: &BranchDto, platform: Platform) -> bool {
    let entry = dto.platform_statuses.get(platform.wire_name());
    let field = |flat: Option<&String>, nested: Option<&Option<String>>| {
        non_empty(flat).or_else(|| non_empty(nested.and_then(Option::as_ref)))
    };

    match platform {
        Platform::Yemeksepeti => field(
            dto.yemeksepeti_url.as_ref(),
            entry.map(|e| &e.url),
        )
        .is_some(),
        Platform::Getir => field(dto.getir_url.as_ref(), entry.map(|e| &e.url)).is_some(),
        Platform::Migros => {
            field(dto.migros_api_key.as_ref(), entry.map(|e| &e.api_key)).is_some()
                && field(
                    dto.migros_restaurant_id.as_ref(),
                    entry.map(|e| &e.restaurant_id),
                )
                .is_some()
        }
        Platform::Trendyol => {
            field(dto.trendyol_supplier_id.as_ref(), entry.map(|e| &e.supplier_id)).is_some()
                && field(dto.trendyol_api_key.as_ref(), entry.map(|e| &e.api_key)).is_some()
                && field(dto.trendyol_api_secret.as_ref(), entry.map(|e| &e.api_secret))
                    .is_some()
        }
    }
}

fn flat_online(dto: &BranchDto, platform: Platform) -> bool {
    match platform {
        Platform::Yemeksepeti => dto.yemeksepeti_status,
        Platform::Migros => dto.migros_status,
        Platform::Getir => dto.getir_status,
        Platform::Trendyol => dto.trendyol_status,
    }
}

fn platform_state(dto: &BranchDto, platform: Platform) -> PlatformState {
    let configured = is_configured(dto, platform);
    let status = match dto.platform_statuses.get(platform.wire_name()) {
        Some(entry) => PlatformStatus::parse(&entry.status),
        None if flat_online(dto, platform) => PlatformStatus::Online,
        None if configured => PlatformStatus::Offline,
        None => PlatformStatus::NotConfigured,
    };
    PlatformState { status, configured }
}

// ── Restaurants ────────────────────────────────────────────────────

impl From<RestaurantDto> for Restaurant {
    fn from(dto: RestaurantDto) -> Self {
        Restaurant {
            id: dto.id,
            name: dto.name,
            branch_ids: dto.branches.iter().map(|b| b.id).collect(),
            total_branches: dto.total_branches,
            online_branches: dto.online_branches,
            offline_branches: dto.offline_branches,
        }
    }
}

// ── Branches ───────────────────────────────────────────────────────

impl From<BranchDto> for Branch {
    fn from(dto: BranchDto) -> Self {
        let platforms = Platform::all()
            .map(|p| (p, platform_state(&dto, p)))
            .collect();

        Branch {
            id: dto.id,
            restaurant_id: dto.restaurant,
            restaurant_name: dto.restaurant_name.clone(),
            name: dto.name.clone(),
            address: dto.address.clone(),
            manager_name: non_empty(dto.manager_name.as_ref()),
            notification_email: non_empty(dto.notification_email.as_ref()),
            telegram_username: non_empty(dto.telegram_username.as_ref()),
            is_online: dto.is_online,
            last_status_change: parse_timestamp(dto.last_status_change.as_ref()),
            platforms,
        }
    }
}

// ── Status checks ──────────────────────────────────────────────────

/// Turn a `check_status` response into per-platform statuses.
///
/// Keys the backend sends that aren't known platforms are dropped.
pub(crate) fn check_outcome(
    branch_id: EntityId,
    branch_name: String,
    response: CheckStatusResponse,
) -> CheckOutcome {
    let statuses: BTreeMap<Platform, PlatformStatus> = response
        .into_iter()
        .filter_map(|(key, check)| {
            let platform = key.parse::<Platform>().ok()?;
            Some((platform, PlatformStatus::parse(&check.status)))
        })
        .collect();

    CheckOutcome {
        branch_id,
        branch_name,
        statuses,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use branchwatch_api::models::PlatformCheck;
    use serde_json::json;

    use super::*;

    fn dto(value: serde_json::Value) -> BranchDto {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn branch_uses_platform_statuses() {
        let branch = Branch::from(dto(json!({
            "id": 3,
            "restaurant": 1,
            "restaurant_name": "Kebapci",
            "name": "Moda",
            "address": "Moda Cd.",
            "is_online": true,
            "telegram_username": "",
            "getir_url": "https://getir.example/x",
            "platform_statuses": {
                "yemeksepeti": { "url": null, "status": "URL Yok" },
                "getir": { "url": "https://getir.example/x", "status": "Online" },
                "migros": { "status": "Auth Error" },
                "trendyol": { "status": "Rate Limited" }
            }
        })));

        assert_eq!(branch.status(Platform::Getir), PlatformStatus::Online);
        assert_eq!(branch.status(Platform::Yemeksepeti), PlatformStatus::NotConfigured);
        assert_eq!(branch.status(Platform::Migros), PlatformStatus::AuthError);
        assert_eq!(branch.status(Platform::Trendyol), PlatformStatus::RateLimited);
        assert!(branch.platforms[&Platform::Getir].configured);
        assert!(!branch.platforms[&Platform::Yemeksepeti].configured);
        assert!(branch.telegram_username.is_none());
    }

    #[test]
    fn branch_falls_back_to_flat_flags() {
        let branch = Branch::from(dto(json!({
            "id": 4,
            "name": "Bebek",
            "migros_api_key": "k",
            "migros_restaurant_id": "r",
            "trendyol_status": true
        })));

        assert_eq!(branch.status(Platform::Migros), PlatformStatus::Offline);
        assert_eq!(branch.status(Platform::Trendyol), PlatformStatus::Online);
        assert_eq!(branch.status(Platform::Getir), PlatformStatus::NotConfigured);
    }

    #[test]
    fn timestamps_accept_offsets_and_naive_values() {
        let with_offset = "2024-05-01T12:30:00.123456+03:00".to_string();
        let naive = "2024-05-01T09:30:00".to_string();

        assert_eq!(
            parse_timestamp(Some(&with_offset)).unwrap().to_rfc3339(),
            "2024-05-01T09:30:00.123456+00:00"
        );
        assert_eq!(
            parse_timestamp(Some(&naive)).unwrap().to_rfc3339(),
            "2024-05-01T09:30:00+00:00"
        );
        assert!(parse_timestamp(Some(&"yesterday".to_string())).is_none());
    }

    #[test]
    fn check_outcome_ignores_unknown_keys() {
        let mut response = CheckStatusResponse::new();
        response.insert(
            "getir".into(),
            PlatformCheck {
                status: "Offline".into(),
                ..PlatformCheck::default()
            },
        );
        response.insert(
            "status".into(),
            PlatformCheck {
                status: "whatever".into(),
                ..PlatformCheck::default()
            },
        );

        let outcome = check_outcome(9, "Moda".into(), response);

        assert_eq!(outcome.statuses.len(), 1);
        assert_eq!(outcome.statuses[&Platform::Getir], PlatformStatus::Offline);
        assert!(!outcome.any_online());
    }
}
