use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::config;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity service unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("identity service error {status}: {message}")]
    Upstream { status: StatusCode, message: String },
}

/// Thin proxy to the external identity service.
///
/// This API never inspects credentials or issues tokens itself; it forwards
/// login/register calls and verifies bearer tokens by asking the identity
/// service for the profile behind them.
pub struct IdentityClient {
    base_url: String,
    timeout: Duration,
}

impl IdentityClient {
    pub fn new() -> Self {
        let auth = &config::config().auth;
        Self {
            base_url: auth.service_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(auth.request_timeout_secs),
        }
    }

    pub async fn login(&self, credentials: Value) -> Result<Value, IdentityError> {
        info!("Proxying login request to identity service");
        let res = HTTP_CLIENT
            .post(format!("{}/api/auth/login", self.base_url))
            .timeout(self.timeout)
            .json(&credentials)
            .send()
            .await?;
        Self::handle(res).await
    }

    pub async fn register(&self, data: Value) -> Result<Value, IdentityError> {
        info!("Proxying register request to identity service");
        let res = HTTP_CLIENT
            .post(format!("{}/api/auth/register", self.base_url))
            .timeout(self.timeout)
            .json(&data)
            .send()
            .await?;
        Self::handle(res).await
    }

    /// Resolve the profile behind a bearer token. A 401/403 here means the
    /// token is invalid or expired.
    pub async fn profile(&self, token: &str) -> Result<Value, IdentityError> {
        let res = HTTP_CLIENT
            .get(format!("{}/api/auth/profile", self.base_url))
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;
        Self::handle(res).await
    }

    async fn handle(res: reqwest::Response) -> Result<Value, IdentityError> {
        let status = res.status();
        let text = res.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(body);
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| body.get("error").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", status));

        Err(IdentityError::Upstream { status, message })
    }
}

impl Default for IdentityClient {
    fn default() -> Self {
        Self::new()
    }
}
