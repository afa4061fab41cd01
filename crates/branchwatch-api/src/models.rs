// Backend request/response types
//
// Mirrors the DRF serializers of the restaurant status backend. Response
// fields use `#[serde(default)]` liberally: the backend omits or nulls
// fields depending on which platforms a branch has credentials for.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Accounts ─────────────────────────────────────────────────────────

/// The authenticated operator, as returned by login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl User {
    /// `"First Last"`, falling back to the email when both names are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_owned()
        }
    }
}

/// `POST /api/auth/login/` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// `POST /api/auth/register/` body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

// ── Restaurants ──────────────────────────────────────────────────────

/// Restaurant with nested branches and backend-aggregated counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestaurantDto {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub branches: Vec<BranchDto>,
    #[serde(default)]
    pub total_branches: u32,
    #[serde(default)]
    pub online_branches: u32,
    #[serde(default)]
    pub offline_branches: u32,
}

/// `POST /api/restaurants/restaurants/` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRestaurantRequest {
    pub name: String,
}

// ── Branches ─────────────────────────────────────────────────────────

/// Branch as serialized by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchDto {
    pub id: i64,
    #[serde(default)]
    pub restaurant: i64,
    #[serde(default)]
    pub restaurant_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub manager: Option<i64>,
    #[serde(default)]
    pub manager_name: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notification_email: Option<String>,
    #[serde(default)]
    pub telegram_username: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    /// Timestamps are kept as sent; the backend may or may not include an offset.
    #[serde(default)]
    pub last_status_change: Option<String>,
    #[serde(default)]
    pub yemeksepeti_url: Option<String>,
    #[serde(default)]
    pub yemeksepeti_status: bool,
    #[serde(default)]
    pub getir_url: Option<String>,
    #[serde(default)]
    pub getir_status: bool,
    #[serde(default)]
    pub migros_api_key: Option<String>,
    #[serde(default)]
    pub migros_restaurant_id: Option<String>,
    #[serde(default)]
    pub migros_status: bool,
    #[serde(default)]
    pub trendyol_supplier_id: Option<String>,
    #[serde(default)]
    pub trendyol_api_key: Option<String>,
    #[serde(default)]
    pub trendyol_api_secret: Option<String>,
    #[serde(default)]
    pub trendyol_status: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Keyed by platform wire name (`yemeksepeti`, `getir`, `migros`, `trendyol`).
    #[serde(default)]
    pub platform_statuses: BTreeMap<String, PlatformStatusDto>,
}

/// One entry of `platform_statuses`.
///
/// `status` is a display string (`"Online"`, `"Offline"`, `"URL Yok"`, ...);
/// the credential fields are only present for the platforms that use them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformStatusDto {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
}

/// `POST /api/restaurants/branches/` body.
///
/// Optional credentials are sent as empty strings, matching the backend's
/// `blank=True` columns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateBranchRequest {
    pub restaurant: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<i64>,
    pub address: String,
    pub notification_email: String,
    pub telegram_username: String,
    pub yemeksepeti_url: String,
    pub getir_url: String,
    pub migros_api_key: String,
    pub migros_restaurant_id: String,
    pub trendyol_supplier_id: String,
    pub trendyol_api_key: String,
    pub trendyol_api_secret: String,
}

/// Result of a single platform probe inside a `check_status` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformCheck {
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `POST /api/restaurants/branches/{id}/check_status/` response, keyed by platform.
pub type CheckStatusResponse = BTreeMap<String, PlatformCheck>;
