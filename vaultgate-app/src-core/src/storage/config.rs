use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, VaultgateError};

/// Overrides `data_service_url`.
pub const DATA_SERVICE_ENV: &str = "VAULTGATE_DATA_SERVICE";
/// Overrides the data directory.
pub const DATA_DIR_ENV: &str = "VAULTGATE_DATA_DIR";

const SETTINGS_FILE: &str = "settings.json";

/// What happens to the cached session when the vault locks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockPolicy {
    /// Navigate to login but keep the cached profile and token.
    #[default]
    KeepSession,
    /// Navigate to login and drop the in-memory session.
    ClearSession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub data_service_url: String,
    pub request_timeout_secs: u64,
    /// Lock the vault after this many idle seconds. `None` disables it.
    pub lock_after_secs: Option<u64>,
    pub lock_policy: LockPolicy,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_service_url: "http://127.0.0.1:8787".to_string(),
            request_timeout_secs: 30,
            lock_after_secs: Some(300),
            lock_policy: LockPolicy::KeepSession,
        }
    }
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn lock_after(&self) -> Option<Duration> {
        self.lock_after_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// `$VAULTGATE_DATA_DIR`, falling back to `~/.vaultgate`.
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(".vaultgate"))
        .ok_or_else(|| {
            VaultgateError::Config(format!(
                "Could not determine data directory; set {}",
                DATA_DIR_ENV
            ))
        })
}

/// Create the data directory if it does not exist yet.
pub fn init_data_dir(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    debug!("Using data directory {}", data_dir.display());
    Ok(())
}

fn get_settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

pub fn load_settings(data_dir: &Path) -> Result<AppSettings> {
    let path = get_settings_path(data_dir);

    if !path.exists() {
        return Ok(AppSettings::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let settings: AppSettings = serde_json::from_str(&content)?;
    Ok(settings)
}

pub fn save_settings(data_dir: &Path, settings: &AppSettings) -> Result<()> {
    let path = get_settings_path(data_dir);
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(&path, content)?;
    info!("Saved settings to {}", path.display());
    Ok(())
}

/// Apply `VAULTGATE_DATA_SERVICE` on top of loaded settings.
pub fn apply_env_overrides(settings: &mut AppSettings) {
    if let Ok(url) = std::env::var(DATA_SERVICE_ENV) {
        if !url.trim().is_empty() {
            debug!("Data service overridden by {}", DATA_SERVICE_ENV);
            settings.data_service_url = url.trim().to_string();
        }
    }
}
