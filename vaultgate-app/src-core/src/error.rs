use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultgateError {
    /// The current-user request failed (transport error, non-2xx, bad body).
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The data service rejected our credentials or token (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Login error: {0}")]
    Login(String),

    /// Provider-level session termination failed.
    #[error("Logout error: {0}")]
    Logout(String),

    #[error("Vault error: {0}")]
    Vault(String),

    #[error("Invalid PIN")]
    InvalidPin,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<vaultgate_secret::Error> for VaultgateError {
    fn from(err: vaultgate_secret::Error) -> Self {
        VaultgateError::Storage(err.to_string())
    }
}

impl serde::Serialize for VaultgateError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VaultgateError>;
