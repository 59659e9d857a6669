//! Vault state, authentication method, and lock event types.

use serde::{Deserialize, Serialize};

/// Represents the current state of the vault.
///
/// The vault transitions between these states:
/// - `NotSetup` → `Unlocked` (after first-time setup with SecureStorage or PIN)
/// - `Unlocked` → `Locked` (manual lock, inactivity timeout)
/// - `Locked` → `Unlocked` (after successful auth via secure storage or PIN)
/// - any → `NotSetup` (reset)
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum VaultStatus {
    /// Vault has not been created yet (first-time user)
    #[default]
    NotSetup,
    /// Vault exists but is locked (requires authentication)
    Locked,
    /// Vault is open and the session may be used
    Unlocked,
}

/// How the vault is unlocked.
///
/// - `SecureStorage`: possession of the device's secure storage is enough
/// - `Pin`: a 4-8 digit PIN checked against an Argon2id verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    SecureStorage,
    Pin,
}

/// Why the vault decided the session is no longer authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    /// Locked on request (user action or app going to background).
    Manual,
    /// No activity within the configured lock-after window.
    Timeout,
    /// An unlock attempt was rejected.
    FailedUnlock,
}

/// Events broadcast by the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "reason", rename_all = "snake_case")]
pub enum VaultEvent {
    Locked(LockReason),
    Unlocked,
    Reset,
}

impl std::fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSetup => write!(f, "NotSetup"),
            Self::Locked => write!(f, "Locked"),
            Self::Unlocked => write!(f, "Unlocked"),
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SecureStorage => write!(f, "secure_storage"),
            Self::Pin => write!(f, "pin"),
        }
    }
}

impl std::fmt::Display for LockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Timeout => write!(f, "timeout"),
            Self::FailedUnlock => write!(f, "failed unlock"),
        }
    }
}
