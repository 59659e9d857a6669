//! Vaultgate development data service.
//!
//! Serves the HTTP contract the Vaultgate client expects (`/login`,
//! `/users/current`, `/logout`) from an in-memory user directory. Meant for
//! local development and end-to-end tests, not production.

pub mod routes;
pub mod sessions;
pub mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

pub use routes::{router, LoginRequest, LoginResponse, ServiceState, StatsSnapshot};
pub use sessions::{SessionBook, DEFAULT_SESSION_TTL};
pub use users::{User, UserDirectory};

/// Bind `addr` and serve until the task is dropped or the listener fails.
///
/// Returns the bound address (useful with port 0) and the server task.
pub async fn spawn(
    addr: SocketAddr,
    state: Arc<ServiceState>,
) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<std::io::Result<()>>)> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!("Data service listening on {}", local_addr);

    let app = router(state);
    let handle = tokio::spawn(async move { axum::serve(listener, app).await });
    Ok((local_addr, handle))
}
