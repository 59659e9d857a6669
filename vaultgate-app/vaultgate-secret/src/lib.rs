//! Secure key-value storage for session secrets.
//!
//! The [`SecretStore`] trait is the only thing the rest of Vaultgate depends
//! on. Backends:
//! - [`MemoryStore`]: in-process map, for tests and throwaway sessions
//! - [`FileStore`]: JSON file in the data directory, owner-only permissions
//! - `KeyringStore` (feature `os-keyring`): the platform keyring
//!
//! Writes are last-write-wins; there are no transactions across keys.

use async_trait::async_trait;

mod error;
mod file;
mod memory;
mod models;

#[cfg(all(
    feature = "os-keyring",
    any(target_os = "macos", target_os = "windows", target_os = "linux")
))]
mod keyring_store;

pub use error::{Error, Result};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use models::{SecretStorageMethod, SecretStorageStatus};

#[cfg(all(
    feature = "os-keyring",
    any(target_os = "macos", target_os = "windows", target_os = "linux")
))]
pub use keyring_store::KeyringStore;

/// Async key-value access to a secure storage backend.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Report which backend is in use and whether it is usable.
    fn status(&self) -> SecretStorageStatus;
}
