//! Vaultgate command-line client.
//!
//! Signs in against the data service, keeps the session in secure storage
//! behind the vault, and reports who is signed in.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};

use vaultgate_app_lib::storage::{
    apply_env_overrides, default_data_dir, init_data_dir, load_settings, DATA_DIR_ENV,
    DATA_SERVICE_ENV,
};
use vaultgate_app_lib::{AppState, AuthMethod, RecordingNavigator, VaultStatus};
use vaultgate_secret::{FileStore, SecretStore};

#[derive(Parser, Debug)]
#[command(name = "vaultgate", author, version, about)]
struct Cli {
    /// Directory holding settings and the file-backed secret store
    #[arg(long, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Base URL of the data service (overrides settings)
    #[arg(long, env = DATA_SERVICE_ENV)]
    data_service: Option<String>,

    /// Keep secrets in the OS keyring instead of a file
    #[cfg(feature = "os-keyring")]
    #[arg(long)]
    keyring: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Protect the session with a PIN (first login) or unlock with it
        #[arg(long)]
        pin: Option<String>,
    },
    /// Print the signed-in user
    Whoami {
        #[arg(long)]
        pin: Option<String>,
    },
    /// End the session locally and with the data service
    Logout,
    /// Show vault, session and storage status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    vaultgate_app_lib::init_tracing();

    let cli = Cli::parse();

    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    init_data_dir(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let mut settings = load_settings(&data_dir).context("Failed to load settings")?;
    apply_env_overrides(&mut settings);
    if let Some(url) = &cli.data_service {
        settings.data_service_url = url.clone();
    }

    let store = open_store(&cli, &data_dir).await;
    let navigator = Arc::new(RecordingNavigator::new());
    let state = AppState::start(settings, store, navigator.clone())
        .await
        .context("Failed to start Vaultgate")?;

    let output = match cli.command {
        Command::Login {
            email,
            password,
            pin,
        } => {
            open_vault(&state, pin.as_deref(), true).await?;
            let user = state
                .identity
                .login(&email, &password)
                .await
                .context("Login failed")?;
            json!({ "user": user })
        }
        Command::Whoami { pin } => {
            open_vault(&state, pin.as_deref(), false).await?;
            if state.identity.restore().await?.is_none() && state.identity.token().await.is_none()
            {
                bail!("Not logged in");
            }
            let user = state
                .identity
                .get()
                .await
                .context("Failed to fetch current user")?;
            json!({ "user": user, "displayName": user.display_name() })
        }
        Command::Logout => {
            state.identity.restore().await?;
            state.identity.remove().await.context("Logout failed")?;
            json!({ "loggedOut": true })
        }
        Command::Status => {
            let (restored, session_error) = match state.identity.restore().await {
                Ok(user) => (user, None),
                Err(e) => {
                    warn!("Failed to restore session: {}", e);
                    (None, Some(e.to_string()))
                }
            };
            let storage = state.store.status();
            let persistent = storage.method.is_some_and(|m| m.is_persistent());
            json!({
                "dataService": state.api.base_url(),
                "vault": state.vault.status().await,
                "authMethod": state.vault.auth_method().await,
                "lockPolicy": state.settings.lock_policy,
                "user": restored,
                "sessionError": session_error,
                "storage": storage,
                "persistent": persistent,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    for route in navigator.routes() {
        info!("Navigation requested: /{}", route.join("/"));
    }
    Ok(())
}

#[cfg(feature = "os-keyring")]
async fn open_store(cli: &Cli, data_dir: &std::path::Path) -> Arc<dyn SecretStore> {
    if cli.keyring {
        let keyring = vaultgate_secret::KeyringStore::new();
        let status = keyring.check_availability().await;
        if status.available {
            return Arc::new(keyring);
        }
        warn!(
            "OS keyring unavailable ({}), using file storage",
            status.unavailable_reason.unwrap_or_default()
        );
    }
    Arc::new(FileStore::in_dir(data_dir))
}

#[cfg(not(feature = "os-keyring"))]
async fn open_store(_cli: &Cli, data_dir: &std::path::Path) -> Arc<dyn SecretStore> {
    Arc::new(FileStore::in_dir(data_dir))
}

/// Make sure the vault is unlocked, setting it up on first use when
/// `allow_setup` is set.
async fn open_vault(state: &AppState, pin: Option<&str>, allow_setup: bool) -> Result<()> {
    match state.vault.status().await {
        VaultStatus::Unlocked => Ok(()),
        VaultStatus::NotSetup if allow_setup => {
            let method = if pin.is_some() {
                AuthMethod::Pin
            } else {
                AuthMethod::SecureStorage
            };
            state
                .vault
                .setup(method, pin)
                .await
                .context("Vault setup failed")
        }
        VaultStatus::NotSetup => bail!("Not logged in"),
        VaultStatus::Locked => state
            .vault
            .unlock(pin)
            .await
            .context("Failed to unlock vault"),
    }
}
