//! SessionVault - the secure-session guard.
//!
//! This module provides the SessionVault struct that handles:
//! - First-time setup with either secure storage or a PIN
//! - Unlocking (PIN verification via Argon2id, constant-time compare)
//! - Locking on request or after a period of inactivity
//! - Resetting all vault configuration
//! - Broadcasting lock/unlock events to subscribers
//!
//! Vault configuration lives in the [`SecretStore`] so it shares the same
//! protection as the session token.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use vaultgate_secret::SecretStore;

use super::auth::{AuthMethod, LockReason, VaultEvent, VaultStatus};
use super::error::{VaultError, VaultResult};
use super::pin::{
    decode_salt, derive_verifier, generate_salt, validate_pin, KdfParams, PinVerifier,
};

/// Secure storage keys for vault configuration.
pub const METHOD_KEY: &str = "vault.method";
pub const SALT_KEY: &str = "vault.salt";
pub const VERIFIER_KEY: &str = "vault.verifier";

/// Capacity of the event channel. Subscribers that fall further behind see
/// `Lagged` and skip ahead.
const EVENT_CHANNEL_CAPACITY: usize = 16;

pub struct SessionVault {
    store: Arc<dyn SecretStore>,
    kdf: KdfParams,
    status: RwLock<VaultStatus>,
    method: RwLock<Option<AuthMethod>>,
    last_activity: RwLock<Instant>,
    /// Wakes the idle watcher when activity or an unlock moves its deadline.
    activity: Arc<Notify>,
    failed_attempts: AtomicU32,
    events: broadcast::Sender<VaultEvent>,
}

impl SessionVault {
    /// Open the vault backed by `store`.
    ///
    /// A vault that was set up before starts `Locked`; otherwise `NotSetup`.
    pub async fn open(store: Arc<dyn SecretStore>) -> VaultResult<Self> {
        let method = match store.get(METHOD_KEY).await? {
            Some(raw) => Some(serde_json::from_str::<AuthMethod>(&raw).map_err(|e| {
                VaultError::Corrupted(format!("Unknown auth method '{}': {}", raw, e))
            })?),
            None => None,
        };

        let status = if method.is_some() {
            VaultStatus::Locked
        } else {
            VaultStatus::NotSetup
        };
        info!("Opened vault (status: {})", status);

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            store,
            kdf: KdfParams::default(),
            status: RwLock::new(status),
            method: RwLock::new(method),
            last_activity: RwLock::new(Instant::now()),
            activity: Arc::new(Notify::new()),
            failed_attempts: AtomicU32::new(0),
            events,
        })
    }

    /// Override the Argon2id cost parameters.
    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub async fn status(&self) -> VaultStatus {
        *self.status.read().await
    }

    pub async fn auth_method(&self) -> Option<AuthMethod> {
        *self.method.read().await
    }

    /// Fail unless the vault is unlocked.
    pub async fn ensure_unlocked(&self) -> VaultResult<()> {
        match self.status().await {
            VaultStatus::Unlocked => Ok(()),
            VaultStatus::Locked => Err(VaultError::Locked),
            VaultStatus::NotSetup => Err(VaultError::NotSetup),
        }
    }

    /// Unlock attempts rejected since the last successful unlock.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: VaultEvent) {
        // No subscribers is fine; the event simply has no audience.
        if self.events.send(event).is_err() {
            debug!("Vault event {:?} had no subscribers", event);
        }
    }

    /// Set up a new vault during first-time onboarding.
    ///
    /// `pin` is required for [`AuthMethod::Pin`] and ignored otherwise.
    /// Leaves the vault unlocked. The method lock is held throughout so a
    /// concurrent setup sees the first one's method.
    pub async fn setup(&self, method: AuthMethod, pin: Option<&str>) -> VaultResult<()> {
        let mut current = self.method.write().await;
        if current.is_some() {
            return Err(VaultError::AlreadyExists);
        }

        info!("Setting up vault with {} auth", method);

        if method == AuthMethod::Pin {
            let pin = pin.ok_or_else(|| VaultError::InvalidInput("PIN required".into()))?;
            validate_pin(pin)?;

            let salt = generate_salt();
            let verifier = self.derive(pin, salt).await?;
            self.store.set(SALT_KEY, &hex::encode(salt)).await?;
            self.store.set(VERIFIER_KEY, &verifier.to_hex()).await?;
        }

        let stored_method = serde_json::to_string(&method)
            .map_err(|e| VaultError::Corrupted(format!("Failed to encode auth method: {}", e)))?;
        self.store.set(METHOD_KEY, &stored_method).await?;

        *current = Some(method);
        drop(current);
        self.mark_unlocked().await;
        info!("Vault setup completed");
        Ok(())
    }

    /// Unlock the vault.
    ///
    /// A rejected PIN counts as a failed attempt and broadcasts
    /// `Locked(FailedUnlock)` so listeners treat the session as
    /// unauthenticated.
    pub async fn unlock(&self, pin: Option<&str>) -> VaultResult<()> {
        let method = self.auth_method().await.ok_or(VaultError::NotSetup)?;

        if self.status().await == VaultStatus::Unlocked {
            self.touch().await;
            return Ok(());
        }

        match method {
            AuthMethod::SecureStorage => {
                let status = self.store.status();
                if !status.available {
                    return Err(VaultError::Storage(vaultgate_secret::Error::NotAvailable(
                        status.unavailable_reason.unwrap_or_default(),
                    )));
                }
            }
            AuthMethod::Pin => {
                let pin = pin.ok_or_else(|| VaultError::InvalidInput("PIN required".into()))?;
                if !self.verify_pin(pin).await? {
                    let attempts = self.failed_attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    warn!("Rejected vault unlock (attempt {})", attempts);
                    self.emit(VaultEvent::Locked(LockReason::FailedUnlock));
                    return Err(VaultError::InvalidPin);
                }
            }
        }

        self.failed_attempts.store(0, Ordering::SeqCst);
        self.mark_unlocked().await;
        info!("Vault unlocked");
        Ok(())
    }

    /// Lock the vault.
    ///
    /// Returns `true` if the vault was unlocked and is now locked. Locking a
    /// vault that is not unlocked does nothing and emits nothing.
    pub async fn lock(&self, reason: LockReason) -> bool {
        {
            let mut status = self.status.write().await;
            if *status != VaultStatus::Unlocked {
                return false;
            }
            *status = VaultStatus::Locked;
        }

        info!("Vault locked ({})", reason);
        self.emit(VaultEvent::Locked(reason));
        self.activity.notify_one();
        true
    }

    /// Record user activity, pushing back the idle lock.
    pub async fn touch(&self) {
        *self.last_activity.write().await = Instant::now();
        self.activity.notify_one();
    }

    /// How long since the last recorded activity.
    pub async fn idle_for(&self) -> Duration {
        self.last_activity.read().await.elapsed()
    }

    /// Destroy the vault configuration.
    ///
    /// After reset the vault is `NotSetup` and must go through setup again.
    pub async fn reset(&self) -> VaultResult<()> {
        warn!("Resetting vault configuration");

        self.store.remove(VERIFIER_KEY).await?;
        self.store.remove(SALT_KEY).await?;
        self.store.remove(METHOD_KEY).await?;

        *self.method.write().await = None;
        *self.status.write().await = VaultStatus::NotSetup;
        self.failed_attempts.store(0, Ordering::SeqCst);

        self.emit(VaultEvent::Reset);
        self.activity.notify_one();
        info!("Vault reset completed");
        Ok(())
    }

    /// Lock the vault after `lock_after` without activity.
    ///
    /// The watcher holds only a weak reference and exits once the vault is
    /// dropped (at its next wake-up).
    pub fn spawn_idle_watch(self: &Arc<Self>, lock_after: Duration) -> JoinHandle<()> {
        let vault = Arc::downgrade(self);
        let activity = self.activity.clone();

        tokio::spawn(async move {
            loop {
                let deadline = {
                    let Some(vault) = vault.upgrade() else { break };
                    if vault.status().await == VaultStatus::Unlocked {
                        Some(*vault.last_activity.read().await + lock_after)
                    } else {
                        None
                    }
                };

                match deadline {
                    Some(deadline) => {
                        tokio::select! {
                            _ = tokio::time::sleep_until(deadline) => {}
                            _ = activity.notified() => continue,
                        }
                    }
                    None => {
                        activity.notified().await;
                        continue;
                    }
                }

                let Some(vault) = vault.upgrade() else { break };
                if vault.idle_for().await >= lock_after {
                    vault.lock(LockReason::Timeout).await;
                }
            }
            debug!("Idle watcher stopped");
        })
    }

    async fn mark_unlocked(&self) {
        *self.status.write().await = VaultStatus::Unlocked;
        self.touch().await;
        self.emit(VaultEvent::Unlocked);
    }

    async fn derive(&self, pin: &str, salt: [u8; 16]) -> VaultResult<PinVerifier> {
        let pin = Zeroizing::new(pin.to_string());
        let kdf = self.kdf;
        tokio::task::spawn_blocking(move || derive_verifier(&pin, &salt, &kdf))
            .await
            .map_err(|e| VaultError::KeyDerivation(format!("Derivation task failed: {}", e)))?
    }

    async fn verify_pin(&self, pin: &str) -> VaultResult<bool> {
        let salt = self
            .store
            .get(SALT_KEY)
            .await?
            .ok_or_else(|| VaultError::Corrupted("Salt missing".into()))?;
        let expected = self
            .store
            .get(VERIFIER_KEY)
            .await?
            .ok_or_else(|| VaultError::Corrupted("PIN verifier missing".into()))?;

        let salt = decode_salt(&salt)?;
        let expected = PinVerifier::from_hex(&expected)?;
        let supplied = self.derive(pin, salt).await?;
        Ok(supplied.matches(&expected))
    }
}
