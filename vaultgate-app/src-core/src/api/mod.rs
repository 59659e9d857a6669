//! Remote data service access.
//!
//! The identity controller only sees the two traits below; [`HttpDataService`]
//! implements both against the real HTTP API.

mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::identity::{AuthToken, LoginResponse, UserProfile};

pub use http::{HttpDataService, CURRENT_USER_PATH, LOGIN_PATH, LOGOUT_PATH};

/// Source of the current user's profile.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Fetch the signed-in user. `token`, when present, is sent as a bearer
    /// credential.
    async fn current_user(&self, token: Option<&AuthToken>) -> Result<UserProfile>;
}

/// Provider-level authentication: obtaining and ending sessions.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;

    /// End the session identified by `token` with the provider.
    /// With no token there is nothing to revoke and this succeeds.
    async fn logout(&self, token: Option<&AuthToken>) -> Result<()>;
}
