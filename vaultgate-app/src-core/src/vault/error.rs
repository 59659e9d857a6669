//! Vault-specific error types.
//!
//! Granular enough for programmatic handling (a UI can tell a wrong PIN from
//! a corrupted vault) and convertible to the main application error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    /// The provided PIN is incorrect.
    #[error("Invalid PIN")]
    InvalidPin,

    /// The vault has not been set up yet.
    #[error("Vault not set up")]
    NotSetup,

    /// The vault is locked and requires authentication.
    #[error("Vault is locked")]
    Locked,

    /// Setup was requested but a vault configuration already exists.
    #[error("Vault already exists")]
    AlreadyExists,

    /// Malformed PIN or missing PIN for a PIN vault.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored vault configuration is missing pieces or unreadable.
    #[error("Vault data is corrupted: {0}")]
    Corrupted(String),

    /// Key derivation failed (Argon2 error).
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// The secure storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] vaultgate_secret::Error),
}

/// Result type alias for vault operations.
pub type VaultResult<T> = std::result::Result<T, VaultError>;

// ============================================================================
// Conversions to main application error type
// ============================================================================

impl From<VaultError> for crate::error::VaultgateError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::InvalidPin => crate::error::VaultgateError::InvalidPin,
            VaultError::InvalidInput(msg) => crate::error::VaultgateError::InvalidInput(msg),
            VaultError::Storage(e) => crate::error::VaultgateError::Storage(e.to_string()),
            other => crate::error::VaultgateError::Vault(other.to_string()),
        }
    }
}

// ============================================================================
// Serialization for UI consumption
// ============================================================================

impl serde::Serialize for VaultError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("VaultError", 2)?;

        // Error code for programmatic handling
        let code = match self {
            VaultError::InvalidPin => "INVALID_PIN",
            VaultError::NotSetup => "NOT_SETUP",
            VaultError::Locked => "LOCKED",
            VaultError::AlreadyExists => "ALREADY_EXISTS",
            VaultError::InvalidInput(_) => "INVALID_INPUT",
            VaultError::Corrupted(_) => "CORRUPTED",
            VaultError::KeyDerivation(_) => "KEY_DERIVATION_ERROR",
            VaultError::Storage(_) => "STORAGE_ERROR",
        };

        state.serialize_field("code", code)?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
