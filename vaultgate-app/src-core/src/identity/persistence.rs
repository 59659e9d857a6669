//! Session persistence in secure storage.
//!
//! The token (and the profile it belongs to, when known) is stored as one
//! JSON record so they are always written and cleared together.

use chrono::Utc;

use vaultgate_secret::SecretStore;

use super::models::{AuthToken, PersistedSession, UserProfile};
use crate::error::{Result, VaultgateError};

/// Secure storage key for the persisted session.
pub const SESSION_KEY: &str = "session";

/// Load the persisted session.
///
/// Returns `None` if nothing is stored (never logged in, or logged out).
///
/// # Errors
/// Returns an error if the record exists but cannot be read or parsed.
pub async fn load_session(store: &dyn SecretStore) -> Result<Option<PersistedSession>> {
    let Some(content) = store.get(SESSION_KEY).await? else {
        return Ok(None);
    };

    let session: PersistedSession = serde_json::from_str(&content).map_err(|e| {
        VaultgateError::Storage(format!("Failed to parse persisted session: {}", e))
    })?;

    Ok(Some(session))
}

/// Save the token and profile, replacing any previous record.
pub async fn save_session(
    store: &dyn SecretStore,
    token: &AuthToken,
    profile: Option<&UserProfile>,
) -> Result<()> {
    let record = PersistedSession {
        token: token.clone(),
        profile: profile.cloned(),
        saved_at: Utc::now(),
    };

    let content = serde_json::to_string(&record)?;
    store.set(SESSION_KEY, &content).await?;
    Ok(())
}

/// Delete the persisted session. Idempotent.
pub async fn delete_session(store: &dyn SecretStore) -> Result<()> {
    store.remove(SESSION_KEY).await?;
    Ok(())
}
