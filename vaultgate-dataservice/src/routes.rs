//! HTTP handlers.
//!
//! - `POST /login`         `{email, password}` -> `{token, user}`
//! - `GET  /users/current` bearer token -> user
//! - `POST /logout`        bearer token -> 204
//! - `GET  /health`, `GET /stats`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::sessions::SessionBook;
use crate::users::{User, UserDirectory};

/// Request counters, exposed on `/stats`.
#[derive(Debug, Default)]
pub struct ServiceStats {
    pub logins: AtomicU64,
    pub current_user_requests: AtomicU64,
    pub logouts: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub logins: u64,
    pub current_user_requests: u64,
    pub logouts: u64,
}

impl ServiceStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            logins: self.logins.load(Ordering::Relaxed),
            current_user_requests: self.current_user_requests.load(Ordering::Relaxed),
            logouts: self.logouts.load(Ordering::Relaxed),
        }
    }
}

pub struct ServiceState {
    pub users: UserDirectory,
    pub sessions: SessionBook,
    pub stats: ServiceStats,
}

impl ServiceState {
    pub fn new(users: UserDirectory, sessions: SessionBook) -> Self {
        Self {
            users,
            sessions,
            stats: ServiceStats::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Error response: a status code plus `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "unauthorized",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn login(
    State(state): State<Arc<ServiceState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    state.stats.logins.fetch_add(1, Ordering::Relaxed);

    let user = state
        .users
        .authenticate(&request.email, &request.password)
        .cloned()
        .ok_or_else(|| {
            warn!("Rejected login for {}", request.email);
            ApiError::unauthorized()
        })?;

    let token = state.sessions.issue(user.id).await;
    info!("User {} logged in", user.id);
    Ok(Json(LoginResponse { token, user }))
}

async fn current_user(
    State(state): State<Arc<ServiceState>>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    state
        .stats
        .current_user_requests
        .fetch_add(1, Ordering::Relaxed);

    let token = bearer_token(&headers).ok_or_else(ApiError::unauthorized)?;
    let user_id = state
        .sessions
        .validate(token)
        .await
        .ok_or_else(ApiError::unauthorized)?;

    let user = state
        .users
        .find(user_id)
        .cloned()
        .ok_or_else(ApiError::unauthorized)?;

    debug!("Served current user {}", user.id);
    Ok(Json(user))
}

async fn logout(State(state): State<Arc<ServiceState>>, headers: HeaderMap) -> StatusCode {
    state.stats.logouts.fetch_add(1, Ordering::Relaxed);

    if let Some(token) = bearer_token(&headers) {
        if state.sessions.revoke(token).await {
            info!("Session revoked");
        }
    }
    StatusCode::NO_CONTENT
}

async fn stats(State(state): State<Arc<ServiceState>>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}

/// Build the data service router.
pub fn router(state: Arc<ServiceState>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/users/current", get(current_user))
        .route("/logout", post(logout))
        .route("/stats", get(stats))
        .route(
            "/health",
            get(|| async { Json(json!({ "status": "healthy" })) }),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = ServiceStats::default();
        stats.current_user_requests.fetch_add(2, Ordering::Relaxed);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.current_user_requests, 2);
        assert_eq!(snapshot.logins, 0);
    }
}
