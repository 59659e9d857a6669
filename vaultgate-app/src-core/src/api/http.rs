use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde_json::json;
use tracing::{debug, warn};

use super::{AuthProvider, DataService};
use crate::error::{Result, VaultgateError};
use crate::identity::{AuthToken, LoginResponse, UserProfile};

pub const CURRENT_USER_PATH: &str = "users/current";
pub const LOGIN_PATH: &str = "login";
pub const LOGOUT_PATH: &str = "logout";

/// reqwest-backed client for the data service.
///
/// Every request carries `Authorization: Bearer <token>` when a token is
/// supplied. A 401 is reported as [`VaultgateError::Unauthorized`] so callers
/// can send the user back to the login screen.
#[derive(Debug, Clone)]
pub struct HttpDataService {
    base: String,
    client: reqwest::Client,
}

impl HttpDataService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = base_url.trim_end_matches('/').to_string();
        Url::parse(&base).map_err(|e| {
            VaultgateError::Config(format!("Invalid data service URL '{}': {}", base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VaultgateError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// `{base}/{path}`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn authorize(request: RequestBuilder, token: Option<&AuthToken>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }
}

#[async_trait]
impl DataService for HttpDataService {
    async fn current_user(&self, token: Option<&AuthToken>) -> Result<UserProfile> {
        let url = self.endpoint(CURRENT_USER_PATH);
        debug!("GET {}", url);

        let response = Self::authorize(self.client.get(&url), token)
            .send()
            .await
            .map_err(|e| VaultgateError::Fetch(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(VaultgateError::Unauthorized);
        }
        if !status.is_success() {
            return Err(VaultgateError::Fetch(format!("HTTP {} from {}", status, url)));
        }

        response
            .json::<UserProfile>()
            .await
            .map_err(|e| VaultgateError::Fetch(format!("Invalid user payload: {}", e)))
    }
}

#[async_trait]
impl AuthProvider for HttpDataService {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let url = self.endpoint(LOGIN_PATH);
        debug!("POST {} for {}", url, email);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| VaultgateError::Login(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(VaultgateError::Unauthorized);
        }
        if !status.is_success() {
            return Err(VaultgateError::Login(format!("HTTP {} from {}", status, url)));
        }

        response
            .json::<LoginResponse>()
            .await
            .map_err(|e| VaultgateError::Login(format!("Invalid login payload: {}", e)))
    }

    async fn logout(&self, token: Option<&AuthToken>) -> Result<()> {
        let Some(token) = token else {
            debug!("No token held, nothing to revoke");
            return Ok(());
        };

        let url = self.endpoint(LOGOUT_PATH);
        debug!("POST {}", url);

        let response = Self::authorize(self.client.post(&url), Some(token))
            .send()
            .await
            .map_err(|e| VaultgateError::Logout(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // The server no longer knows this token; the session is already over.
            warn!("Logout returned 401, treating session as ended");
            return Ok(());
        }
        if !status.is_success() {
            return Err(VaultgateError::Logout(format!("HTTP {} from {}", status, url)));
        }

        Ok(())
    }
}
