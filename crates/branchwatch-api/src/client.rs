// Backend HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, `Token` authentication
// and DRF-style error extraction. Endpoint groups (auth, restaurants,
// branches) are inherent methods implemented in their own files.

use std::sync::{PoisonError, RwLock};

use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Characters of a non-JSON error body kept in the error message.
const BODY_PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the restaurant status backend.
///
/// Every request made while a token is set carries
/// `Authorization: Token <token>`. A 401 on any authenticated call is
/// reported as [`Error::SessionExpired`]; other failures carry the
/// backend's own message.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
}

impl ApiClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root (e.g. `http://127.0.0.1:8000`); the
    /// `/api/` prefix is added per request.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(None),
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Token management ─────────────────────────────────────────────

    /// Install (or drop) the token sent with every request.
    pub fn set_token(&self, token: Option<SecretString>) {
        debug!(present = token.is_some(), "updating auth token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Whether a token is currently installed.
    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(token) => builder.header(AUTHORIZATION, format!("Token {}", token.expose_secret())),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_json(resp).await
    }

    /// Send an authenticated POST with a JSON body and decode the response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .authorize(self.http.post(url).json(body))
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_json(resp).await
    }

    /// Send an authenticated DELETE. The body (empty or JSON) is discarded.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);

        let resp = self
            .authorize(self.http.delete(url))
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::success_body(resp).await.map(|_| ())
    }

    /// Return the body of a 2xx response, or classify the failure.
    async fn success_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(status = status.as_u16(), len = body.len(), "response received");

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        Ok(body)
    }

    async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = Self::success_body(resp).await?;
        decode(&body)
    }
}

/// Decode a JSON body, keeping the raw text on failure.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

/// Pull the human-readable message out of a backend error body.
///
/// Field precedence: `detail`, `error`, `message`, `non_field_errors[0]`,
/// then the first `field: [msg, ..]` validation error. Non-JSON bodies are
/// returned truncated; an empty body becomes `HTTP <status>`.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Some(message) = backend_message(body) {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        preview(trimmed).to_owned()
    }
}

pub(crate) fn backend_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;

    for key in ["detail", "error", "message", "non_field_errors"] {
        if let Some(message) = obj.get(key).and_then(first_text) {
            return Some(message);
        }
    }

    obj.iter()
        .find_map(|(field, v)| first_text(v).map(|msg| format!("{field}: {msg}")))
}

/// A non-empty string, or the first non-empty string of an array.
fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn detail_wins_over_other_fields() {
        let body = r#"{"error": "second", "detail": "first", "non_field_errors": ["third"]}"#;
        assert_eq!(backend_message(body).as_deref(), Some("first"));
    }

    #[test]
    fn error_wins_over_non_field_errors() {
        let body = r#"{"non_field_errors": ["later"], "error": "sooner"}"#;
        assert_eq!(backend_message(body).as_deref(), Some("sooner"));
    }

    #[test]
    fn non_field_errors_takes_first_entry() {
        let body = r#"{"non_field_errors": ["Invalid credentials", "other"]}"#;
        assert_eq!(
            backend_message(body).as_deref(),
            Some("Invalid credentials")
        );
    }

    #[test]
    fn field_errors_are_prefixed_with_field_name() {
        let body = r#"{"name": ["This field is required."]}"#;
        assert_eq!(
            backend_message(body).as_deref(),
            Some("name: This field is required.")
        );
    }

    #[test]
    fn non_json_body_is_truncated() {
        let body = "ş".repeat(500);
        let message = error_message(StatusCode::BAD_GATEWAY, &body);
        assert_eq!(message.chars().count(), BODY_PREVIEW_LEN);
    }

    #[test]
    fn empty_body_reports_status() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "  "),
            "HTTP 500"
        );
    }

    #[test]
    fn api_url_joins_without_double_slashes() {
        let client = ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost:8000/").unwrap(),
        );
        let url = client.api_url("/restaurants/branches/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/restaurants/branches/");
    }
}
