// ── Form validation ──
//
// Input checks that run before any request leaves the process. A form
// with problems never reaches the backend.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use branchwatch_api::models::{CreateBranchRequest, RegisterRequest};

use crate::error::CoreError;
use crate::model::EntityId;

/// One input of the "add restaurant" form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum FormField {
    RestaurantName,
    BranchName,
    Address,
    NotificationEmail,
    TelegramUsername,
    YemeksepetiUrl,
    GetirUrl,
    MigrosApiKey,
    MigrosRestaurantId,
    TrendyolSupplierId,
    TrendyolApiKey,
    TrendyolApiSecret,
}

impl FormField {
    /// Every field in on-screen order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RestaurantName => "Restaurant name",
            Self::BranchName => "Branch name",
            Self::Address => "Address",
            Self::NotificationEmail => "Notification email",
            Self::TelegramUsername => "Telegram username",
            Self::YemeksepetiUrl => "Yemeksepeti URL",
            Self::GetirUrl => "Getir URL",
            Self::MigrosApiKey => "Migros API key",
            Self::MigrosRestaurantId => "Migros restaurant ID",
            Self::TrendyolSupplierId => "Trendyol supplier ID",
            Self::TrendyolApiKey => "Trendyol API key",
            Self::TrendyolApiSecret => "Trendyol API secret",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(
            self,
            Self::RestaurantName | Self::BranchName | Self::Address | Self::NotificationEmail
        )
    }

    /// Credentials that should be masked when echoed back.
    pub fn is_secret(self) -> bool {
        matches!(self, Self::MigrosApiKey | Self::TrendyolApiKey | Self::TrendyolApiSecret)
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn into_result(problems: Vec<FieldError>) -> Result<(), CoreError> {
    if problems.is_empty() {
        return Ok(());
    }
    let message = problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(CoreError::ValidationFailed { message })
}

fn require(problems: &mut Vec<FieldError>, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        problems.push(FieldError {
            field,
            message: "required",
        });
        false
    } else {
        true
    }
}

/// Loose shape check: one `@`, something before it, a dotted domain after.
pub fn looks_like_email(raw: &str) -> bool {
    let raw = raw.trim();
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !raw.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn require_email(problems: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if require(problems, field, value) && !looks_like_email(value) {
        problems.push(FieldError {
            field,
            message: "not a valid email address",
        });
    }
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Trimmed email and the password exactly as typed.
    ///
    /// A whitespace-only password counts as missing, but surrounding
    /// spaces in a real one are kept so login matches registration.
    pub fn validate(&self) -> Result<(String, SecretString), CoreError> {
        let mut problems = Vec::new();
        require(&mut problems, "Email", &self.email);
        require(&mut problems, "Password", &self.password);
        into_result(problems)?;
        Ok((
            self.email.trim().to_owned(),
            SecretString::from(self.password.clone()),
        ))
    }
}

// ── Branches ─────────────────────────────────────────────────────────

/// Everything needed to create one branch, minus its restaurant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchFields {
    pub name: String,
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

impl BranchFields {
    pub fn problems(&self) -> Vec<FieldError> {
        let mut problems = Vec::new();
        require(&mut problems, FormField::BranchName.label(), &self.name);
        require(&mut problems, FormField::Address.label(), &self.address);
        require_email(
            &mut problems,
            FormField::NotificationEmail.label(),
            &self.notification_email,
        );
        problems
    }

    pub(crate) fn to_request(&self, restaurant: EntityId) -> CreateBranchRequest {
        let t = |s: &String| s.trim().to_owned();
        CreateBranchRequest {
            restaurant,
            name: t(&self.name),
            manager: None,
            address: t(&self.address),
            notification_email: t(&self.notification_email),
            telegram_username: t(&self.telegram_username),
            yemeksepeti_url: t(&self.yemeksepeti_url),
            getir_url: t(&self.getir_url),
            migros_api_key: t(&self.migros_api_key),
            migros_restaurant_id: t(&self.migros_restaurant_id),
            trendyol_supplier_id: t(&self.trendyol_supplier_id),
            trendyol_api_key: t(&self.trendyol_api_key),
            trendyol_api_secret: t(&self.trendyol_api_secret),
        }
    }
}

/// A branch to add under an existing restaurant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBranch {
    pub restaurant: EntityId,
    pub fields: BranchFields,
}

impl NewBranch {
    pub fn validate(&self) -> Result<(), CoreError> {
        into_result(self.fields.problems())
    }
}

/// The "add restaurant" form: a restaurant plus its first branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRestaurantForm {
    pub restaurant_name: String,
    pub branch: BranchFields,
}

impl NewRestaurantForm {
    pub fn problems(&self) -> Vec<FieldError> {
        let mut problems = Vec::new();
        require(
            &mut problems,
            FormField::RestaurantName.label(),
            &self.restaurant_name,
        );
        problems.extend(self.branch.problems());
        problems
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        into_result(self.problems())
    }

    pub fn get(&self, field: FormField) -> &str {
        let b = &self.branch;
        match field {
            FormField::RestaurantName => &self.restaurant_name,
            FormField::BranchName => &b.name,
            FormField::Address => &b.address,
            FormField::NotificationEmail => &b.notification_email,
            FormField::TelegramUsername => &b.telegram_username,
            FormField::YemeksepetiUrl => &b.yemeksepeti_url,
            FormField::GetirUrl => &b.getir_url,
            FormField::MigrosApiKey => &b.migros_api_key,
            FormField::MigrosRestaurantId => &b.migros_restaurant_id,
            FormField::TrendyolSupplierId => &b.trendyol_supplier_id,
            FormField::TrendyolApiKey => &b.trendyol_api_key,
            FormField::TrendyolApiSecret => &b.trendyol_api_secret,
        }
    }

    pub fn set(&mut self, field: FormField, value: String) {
        let b = &mut self.branch;
        let slot = match field {
            FormField::RestaurantName => &mut self.restaurant_name,
            FormField::BranchName => &mut b.name,
            FormField::Address => &mut b.address,
            FormField::NotificationEmail => &mut b.notification_email,
            FormField::TelegramUsername => &mut b.telegram_username,
            FormField::YemeksepetiUrl => &mut b.yemeksepeti_url,
            FormField::GetirUrl => &mut b.getir_url,
            FormField::MigrosApiKey => &mut b.migros_api_key,
            FormField::MigrosRestaurantId => &mut b.migros_restaurant_id,
            FormField::TrendyolSupplierId => &mut b.trendyol_supplier_id,
            FormField::TrendyolApiKey => &mut b.trendyol_api_key,
            FormField::TrendyolApiSecret => &mut b.trendyol_api_secret,
        };
        *slot = value;
    }
}

// ── Registration ─────────────────────────────────────────────────────

/// Account roles known to the backend.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    RestaurantOwner,
    #[default]
    BranchManager,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest, CoreError> {
        let mut problems = Vec::new();
        require_email(&mut problems, "Email", &self.email);
        require(&mut problems, "First name", &self.first_name);
        require(&mut problems, "Last name", &self.last_name);
        if require(&mut problems, "Password", &self.password) && self.password != self.password2 {
            problems.push(FieldError {
                field: "Password",
                message: "passwords do not match",
            });
        }
        into_result(problems)?;

        Ok(RegisterRequest {
            email: self.email.trim().to_owned(),
            password: self.password.clone(),
            password2: self.password2.clone(),
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            role: self.role.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn filled() -> NewRestaurantForm {
        NewRestaurantForm {
            restaurant_name: "Kebapci".into(),
            branch: BranchFields {
                name: "Moda".into(),
                address: "Moda Cd. 1".into(),
                notification_email: "ops@example.com".into(),
                ..BranchFields::default()
            },
        }
    }

    #[test]
    fn empty_form_lists_every_required_field() {
        let problems = NewRestaurantForm::default().problems();
        let fields: Vec<_> = problems.iter().map(|p| p.field).collect();
        assert_eq!(
            fields,
            vec![
                "Restaurant name",
                "Branch name",
                "Address",
                "Notification email"
            ]
        );
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let mut form = filled();
        form.branch.address = "   ".into();
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Address: required");
    }

    #[test]
    fn invalid_email_is_rejected() {
        let mut form = filled();
        form.branch.notification_email = "ops-at-example".into();
        assert_eq!(
            form.problems(),
            vec![FieldError {
                field: "Notification email",
                message: "not a valid email address"
            }]
        );
    }

    #[test]
    fn optional_fields_may_stay_empty() {
        assert!(filled().validate().is_ok());
    }

    #[test]
    fn request_is_trimmed() {
        let mut form = filled();
        form.branch.getir_url = "  https://getir.example/x  ".into();
        let req = form.branch.to_request(5);
        assert_eq!(req.restaurant, 5);
        assert_eq!(req.getir_url, "https://getir.example/x");
        assert_eq!(req.trendyol_api_key, "");
    }

    #[test]
    fn get_and_set_address_every_field() {
        let mut form = NewRestaurantForm::default();
        for (i, field) in FormField::all().enumerate() {
            form.set(field, format!("v{i}"));
        }
        for (i, field) in FormField::all().enumerate() {
            assert_eq!(form.get(field), format!("v{i}"));
        }
    }

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("a@b.co"));
        assert!(looks_like_email(" ops@example.com "));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a@@b.co"));
        assert!(!looks_like_email("a b@c.co"));
    }

    #[test]
    fn login_form_trims_email_only() {
        let (email, password) = LoginForm::new("  ops@example.com ", " pw ")
            .validate()
            .unwrap();
        assert_eq!(email, "ops@example.com");
        assert_eq!(password.expose_secret(), " pw ");

        let err = LoginForm::new("ops@example.com", "   ").validate().unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Password: required");

        let err = LoginForm::new("", "").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Email: required; Password: required"
        );
    }

    #[test]
    fn register_requires_matching_passwords() {
        let form = RegisterForm {
            email: "new@example.com".into(),
            password: "a".into(),
            password2: "b".into(),
            first_name: "New".into(),
            last_name: "User".into(),
            role: Role::Admin,
        };
        assert!(form.validate().is_err());

        let ok = RegisterForm {
            password2: "a".into(),
            ..form
        };
        let req = ok.validate().unwrap();
        assert_eq!(req.role, "admin");
    }

    #[test]
    fn role_parses_snake_case() {
        assert_eq!("restaurant_owner".parse::<Role>().unwrap(), Role::RestaurantOwner);
    }
}
