// Token authentication
//
// Login exchanges email/password for a DRF token; the caller decides
// whether to install it on the client and where to persist it.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::{ApiClient, backend_message, decode};
use crate::error::Error;
use crate::models::{LoginResponse, RegisterRequest, User};

/// A successful login: the issued token and the profile sent alongside it.
#[derive(Debug)]
pub struct LoginSession {
    pub token: SecretString,
    pub user: Option<User>,
}

impl ApiClient {
    /// Exchange credentials for a token.
    ///
    /// `POST /api/auth/login/` with `{email, password}`. Any non-2xx answer,
    /// 401 included, is a rejected login rather than an expired session. A
    /// 2xx without a token is treated as a failure too.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginSession, Error> {
        let url = self.api_url("auth/login/")?;
        debug!(email, "logging in at {}", url);

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            let message = backend_message(&text)
                .unwrap_or_else(|| format!("login failed (HTTP {})", status.as_u16()));
            return Err(Error::Authentication { message });
        }

        let parsed: LoginResponse = decode(&text)?;
        let Some(token) = parsed.token.filter(|t| !t.is_empty()) else {
            return Err(Error::Authentication {
                message: "login succeeded but no token was returned".into(),
            });
        };

        debug!("login successful");
        Ok(LoginSession {
            token: SecretString::from(token),
            user: parsed.user,
        })
    }

    /// Create a new operator account.
    ///
    /// `POST /api/auth/register/`. The backend echoes the created user.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, Error> {
        let url = self.api_url("auth/register/")?;
        debug!(email = %request.email, role = %request.role, "registering user");
        self.post(url, request).await
    }

    /// Revoke the current token on the backend.
    ///
    /// `POST /api/auth/logout/`. The locally installed token is left in
    /// place; the caller clears it.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("auth/logout/")?;
        debug!("logging out at {}", url);
        let _: serde_json::Value = self.post(url, &json!({})).await?;
        debug!("logout complete");
        Ok(())
    }
}
