//! Data types describing secret storage backends.

use serde::{Deserialize, Serialize};

/// The method used for secure secret storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecretStorageMethod {
    /// In-process map, lost on exit.
    Memory,
    /// JSON file in the application data directory (owner-only permissions).
    File,
    /// macOS Keychain.
    MacOSKeychain,
    /// Windows Credential Manager.
    WindowsCredentialManager,
    /// Linux Secret Service API (GNOME Keyring, KWallet, etc.)
    LinuxSecretService,
}

impl SecretStorageMethod {
    /// Whether secrets stored with this method survive a process restart.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, Self::Memory)
    }
}

/// Status of secure secret storage availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretStorageStatus {
    /// Whether secure storage is available and can be used.
    pub available: bool,
    /// The method that will be used (if available).
    pub method: Option<SecretStorageMethod>,
    /// Why secure storage is unavailable (if not available).
    pub unavailable_reason: Option<String>,
}

impl SecretStorageStatus {
    /// Create a status indicating secure storage is available.
    pub fn available(method: SecretStorageMethod) -> Self {
        Self {
            available: true,
            method: Some(method),
            unavailable_reason: None,
        }
    }

    /// Create a status indicating secure storage is unavailable.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            method: None,
            unavailable_reason: Some(reason.into()),
        }
    }
}
