//! User identity: the cached profile and token, their persistence, and the
//! controller that keeps them in step with the data service and the vault.

pub mod models;
pub mod persistence;
pub mod service;

pub use models::{AuthToken, LoginResponse, PersistedSession, UserProfile};
pub use service::IdentityService;
