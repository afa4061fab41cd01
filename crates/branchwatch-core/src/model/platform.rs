// ── Delivery platform types ──

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{EnumIter, EnumString, IntoEnumIterator};

/// A third-party delivery platform a branch can be listed on.
///
/// Declaration order is display order (dashboard columns), and the derived
/// `Ord` keeps `BTreeMap<Platform, _>` in that order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Platform {
    Yemeksepeti,
    Migros,
    Getir,
    Trendyol,
}

impl Platform {
    /// All platforms in display order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Wire name used in `platform_statuses` and `check_status` payloads.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Yemeksepeti => "yemeksepeti",
            Self::Migros => "migros",
            Self::Getir => "getir",
            Self::Trendyol => "trendyol",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Yemeksepeti => "Yemeksepeti",
            Self::Migros => "Migros",
            Self::Getir => "Getir",
            Self::Trendyol => "Trendyol",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of one platform for one branch, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlatformStatus {
    Online,
    Offline,
    AuthError,
    ApiError,
    RateLimited,
    /// The scraper failed without a more specific classification.
    Error,
    /// No URL or credentials stored for this platform.
    NotConfigured,
    /// Anything the backend sends that we don't recognise, kept verbatim.
    Unknown(String),
}

/// Visual class of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Good,
    Bad,
    Alert,
    Warning,
    Neutral,
}

impl PlatformStatus {
    /// Parse the backend's display string.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Online" => Self::Online,
            "Offline" => Self::Offline,
            "Auth Error" => Self::AuthError,
            "API Error" => Self::ApiError,
            "Rate Limited" => Self::RateLimited,
            "Error" => Self::Error,
            "" | "URL Yok" | "Bilgi Yok" => Self::NotConfigured,
            other => Self::Unknown(other.to_owned()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Online => "Online",
            Self::Offline => "Offline",
            Self::AuthError => "Auth Error",
            Self::ApiError => "API Error",
            Self::RateLimited => "Rate Limited",
            Self::Error => "Error",
            Self::NotConfigured => "Not configured",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn tone(&self) -> StatusTone {
        match self {
            Self::Online => StatusTone::Good,
            Self::Offline => StatusTone::Bad,
            Self::AuthError => StatusTone::Alert,
            Self::ApiError | Self::RateLimited => StatusTone::Warning,
            Self::Error | Self::NotConfigured | Self::Unknown(_) => StatusTone::Neutral,
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PlatformStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for PlatformStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == "Not configured" {
            Self::NotConfigured
        } else {
            Self::parse(&raw)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_strings() {
        assert_eq!(PlatformStatus::parse("Online"), PlatformStatus::Online);
        assert_eq!(PlatformStatus::parse("Auth Error"), PlatformStatus::AuthError);
        assert_eq!(PlatformStatus::parse("Rate Limited"), PlatformStatus::RateLimited);
        assert_eq!(PlatformStatus::parse("URL Yok"), PlatformStatus::NotConfigured);
        assert_eq!(PlatformStatus::parse("Bilgi Yok"), PlatformStatus::NotConfigured);
        assert_eq!(
            PlatformStatus::parse("Maintenance"),
            PlatformStatus::Unknown("Maintenance".into())
        );
    }

    #[test]
    fn tones_follow_badge_colours() {
        assert_eq!(PlatformStatus::Online.tone(), StatusTone::Good);
        assert_eq!(PlatformStatus::Offline.tone(), StatusTone::Bad);
        assert_eq!(PlatformStatus::AuthError.tone(), StatusTone::Alert);
        assert_eq!(PlatformStatus::ApiError.tone(), StatusTone::Warning);
        assert_eq!(PlatformStatus::RateLimited.tone(), StatusTone::Warning);
        assert_eq!(PlatformStatus::Unknown("x".into()).tone(), StatusTone::Neutral);
    }

    #[test]
    fn unknown_status_displays_verbatim() {
        assert_eq!(PlatformStatus::Unknown("Kapalı".into()).to_string(), "Kapalı");
    }

    #[test]
    fn platform_order_matches_dashboard_columns() {
        let order: Vec<_> = Platform::all().collect();
        assert_eq!(
            order,
            vec![
                Platform::Yemeksepeti,
                Platform::Migros,
                Platform::Getir,
                Platform::Trendyol
            ]
        );
    }

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("Getir".parse::<Platform>().unwrap(), Platform::Getir);
        assert_eq!("trendyol".parse::<Platform>().unwrap(), Platform::Trendyol);
    }

    #[test]
    fn status_serializes_as_label() {
        let json = serde_json::to_string(&PlatformStatus::RateLimited).unwrap();
        assert_eq!(json, "\"Rate Limited\"");
    }
}
