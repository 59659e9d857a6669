//! Desktop secret storage using the OS keyring.
//!
//! - **macOS**: Keychain Access
//! - **Windows**: Credential Manager
//! - **Linux**: Secret Service API (GNOME Keyring, KWallet)
//!
//! Each key is stored as a separate keyring account under one service name.
//! Keyring calls block, so they run on the blocking thread pool.

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, error, warn};

use crate::{Error, Result, SecretStorageMethod, SecretStorageStatus, SecretStore};

/// Service name used for keyring entries.
pub const DEFAULT_SERVICE_NAME: &str = "com.vaultgate.session";

/// Account read to check availability.
const CHECK_ACCOUNT: &str = "vault.method";

#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Check whether the keyring can actually be reached.
    pub async fn check_availability(&self) -> SecretStorageStatus {
        let service = self.service.clone();
        let check = tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, CHECK_ACCOUNT)?;
            match entry.get_password() {
                Ok(_) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(e),
            }
        })
        .await;

        match check {
            Ok(Ok(())) => {
                debug!("Keyring available, method: {:?}", platform_method());
                SecretStorageStatus::available(platform_method())
            }
            Ok(Err(e)) => {
                warn!("Keyring not accessible: {:?}", e);
                SecretStorageStatus::unavailable(format!("OS keyring not accessible: {}", e))
            }
            Err(e) => SecretStorageStatus::unavailable(format!("Keyring check failed: {}", e)),
        }
    }

    fn entry(service: &str, key: &str) -> Result<Entry> {
        Entry::new(service, key).map_err(|e| {
            error!("Failed to create keyring entry for '{}': {}", key, e);
            map_keyring_error(e)
        })
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            match Self::entry(&service, &key)?.get_password() {
                Ok(value) => Ok(Some(value)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => {
                    error!("Failed to read '{}' from keyring: {:?}", key, e);
                    Err(map_keyring_error(e))
                }
            }
        })
        .await?
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let service = self.service.clone();
        let key = key.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || {
            Self::entry(&service, &key)?
                .set_password(&value)
                .map_err(map_keyring_error)?;
            debug!("Stored '{}' in OS keyring", key);
            Ok(())
        })
        .await?
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            // delete_credential errors on a missing entry; removal is idempotent here
            match Self::entry(&service, &key)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(map_keyring_error(e)),
            }
        })
        .await?
    }

    fn status(&self) -> SecretStorageStatus {
        SecretStorageStatus::available(platform_method())
    }
}

/// Get the appropriate storage method for the current platform.
fn platform_method() -> SecretStorageMethod {
    #[cfg(target_os = "macos")]
    {
        SecretStorageMethod::MacOSKeychain
    }
    #[cfg(target_os = "windows")]
    {
        SecretStorageMethod::WindowsCredentialManager
    }
    #[cfg(target_os = "linux")]
    {
        SecretStorageMethod::LinuxSecretService
    }
}

/// Map keyring errors to our error type.
fn map_keyring_error(err: keyring::Error) -> Error {
    match err {
        keyring::Error::NoStorageAccess(e) => {
            Error::NotAvailable(format!("Keyring access denied: {:?}", e))
        }
        keyring::Error::PlatformFailure(e) => {
            let msg = format!("{:?}", e);
            if msg.contains("Dbus") || msg.contains("dbus") || msg.contains("D-Bus") {
                Error::NotAvailable(format!(
                    "System keyring not available (D-Bus error): {}",
                    msg
                ))
            } else {
                Error::Internal(format!("Keyring error: {}", msg))
            }
        }
        keyring::Error::BadEncoding(_) => Error::Corrupted("Keyring entry is not UTF-8".into()),
        _ => Error::Internal(format!("Keyring error: {}", err)),
    }
}
