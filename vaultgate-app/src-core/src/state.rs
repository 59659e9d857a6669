use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use vaultgate_secret::SecretStore;

use crate::api::HttpDataService;
use crate::error::Result;
use crate::identity::IdentityService;
use crate::navigation::Navigator;
use crate::storage::AppSettings;
use crate::vault::{KdfParams, SessionVault};

/// Everything a running Vaultgate client needs, wired together.
///
/// Background tasks (vault-lock subscription, idle watcher) are aborted when
/// the state is dropped.
pub struct AppState {
    pub settings: AppSettings,
    pub store: Arc<dyn SecretStore>,
    pub api: Arc<HttpDataService>,
    pub vault: Arc<SessionVault>,
    pub identity: Arc<IdentityService>,
    tasks: Vec<JoinHandle<()>>,
}

impl AppState {
    pub async fn start(
        settings: AppSettings,
        store: Arc<dyn SecretStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        Self::start_with_kdf(settings, store, navigator, KdfParams::default()).await
    }

    /// Like [`start`](Self::start) with explicit PIN derivation costs.
    pub async fn start_with_kdf(
        settings: AppSettings,
        store: Arc<dyn SecretStore>,
        navigator: Arc<dyn Navigator>,
        kdf: KdfParams,
    ) -> Result<Self> {
        let api = Arc::new(HttpDataService::new(
            &settings.data_service_url,
            settings.request_timeout(),
        )?);

        let vault = Arc::new(SessionVault::open(store.clone()).await?.with_kdf_params(kdf));

        let identity = Arc::new(IdentityService::new(
            api.clone(),
            api.clone(),
            store.clone(),
            navigator,
            settings.lock_policy,
        ));

        let mut tasks = vec![identity.watch_vault(vault.subscribe())];
        if let Some(lock_after) = settings.lock_after() {
            info!("Vault locks after {}s of inactivity", lock_after.as_secs());
            tasks.push(vault.spawn_idle_watch(lock_after));
        }

        info!("Vaultgate started against {}", api.base_url());
        Ok(Self {
            settings,
            store,
            api,
            vault,
            identity,
            tasks,
        })
    }

    /// Record user activity so the vault stays unlocked.
    ///
    /// Activity while the vault is locked does not count; the user has to
    /// unlock first.
    pub async fn touch(&self) -> Result<()> {
        self.vault.ensure_unlocked().await?;
        self.vault.touch().await;
        Ok(())
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use vaultgate_secret::MemoryStore;

    use crate::error::VaultgateError;
    use crate::navigation::RecordingNavigator;
    use crate::storage::LockPolicy;
    use crate::vault::{AuthMethod, LockReason, VaultStatus};

    fn settings() -> AppSettings {
        AppSettings {
            data_service_url: "http://127.0.0.1:9".into(),
            lock_after_secs: None,
            ..AppSettings::default()
        }
    }

    async fn wait_for_login(nav: &RecordingNavigator, expected: usize) {
        for _ in 0..100 {
            if nav.count(&["login"]) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} login navigations, saw {}", expected, nav.count(&["login"]));
    }

    #[tokio::test]
    async fn test_start_wires_vault_lock_to_navigation() {
        let nav = Arc::new(RecordingNavigator::new());
        let state = AppState::start(settings(), Arc::new(MemoryStore::new()), nav.clone())
            .await
            .unwrap();
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.vault.status().await, VaultStatus::NotSetup);
        assert!(matches!(state.touch().await, Err(VaultgateError::Vault(_))));

        state
            .vault
            .setup(AuthMethod::SecureStorage, None)
            .await
            .unwrap();
        state.touch().await.unwrap();
        state.vault.lock(LockReason::Manual).await;
        wait_for_login(&nav, 1).await;
    }

    #[tokio::test]
    async fn test_clear_session_policy_applies_on_lock() {
        let nav = Arc::new(RecordingNavigator::new());
        let state = AppState::start(
            AppSettings {
                lock_policy: LockPolicy::ClearSession,
                ..settings()
            },
            Arc::new(MemoryStore::new()),
            nav.clone(),
        )
        .await
        .unwrap();

        state.vault.setup(AuthMethod::SecureStorage, None).await.unwrap();
        state
            .identity
            .set(
                crate::identity::UserProfile {
                    id: 42,
                    first_name: "Douglas".into(),
                    last_name: "Adams".into(),
                    email: "thank.you@forthefish.com".into(),
                },
                "token".into(),
            )
            .await;

        state.vault.lock(LockReason::Manual).await;
        wait_for_login(&nav, 1).await;
        assert!(state.identity.token().await.is_none());
    }

    #[tokio::test]
    async fn test_idle_watch_started_when_configured() {
        let state = AppState::start(
            AppSettings::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNavigator::new()),
        )
        .await
        .unwrap();
        assert_eq!(state.tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_bad_url_is_a_config_error() {
        let result = AppState::start(
            AppSettings {
                data_service_url: "not a url".into(),
                ..settings()
            },
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNavigator::new()),
        )
        .await;
        assert!(matches!(result, Err(VaultgateError::Config(_))));
    }
}
