//! Session vault.
//!
//! The vault decides whether the current session may be used. It is set up
//! once with either device secure storage or a user PIN (checked through an
//! Argon2id verifier), locks on request or after inactivity, and broadcasts
//! [`VaultEvent`]s that the identity controller listens to.

pub mod auth;
pub mod error;
pub mod manager;
pub mod pin;

pub use auth::{AuthMethod, LockReason, VaultEvent, VaultStatus};
pub use error::{VaultError, VaultResult};
pub use manager::SessionVault;
pub use pin::KdfParams;
