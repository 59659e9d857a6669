pub mod api;
pub mod error;
pub mod identity;
pub mod navigation;
pub mod state;
pub mod storage;
pub mod vault;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use api::{AuthProvider, DataService, HttpDataService};
pub use error::{Result, VaultgateError};
pub use identity::{AuthToken, IdentityService, UserProfile};
pub use navigation::{ChannelNavigator, Navigator, RecordingNavigator};
pub use state::AppState;
pub use storage::{AppSettings, LockPolicy};
pub use vault::{AuthMethod, LockReason, SessionVault, VaultEvent, VaultStatus};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaultgate_app_lib=info,vaultgate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
