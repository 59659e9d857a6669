//! Bearer-token session book.
//!
//! Tokens are 32 random bytes, hex encoded. A token is valid until it expires
//! or is revoked by logout. Only issued sessions are stored; revoking drops
//! the entry, so unknown tokens never add state.

use std::collections::HashMap;
use std::time::Duration;

use rand::RngCore;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: u64,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct SessionBook {
    ttl: Duration,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

fn generate_token() -> String {
    let mut buf = [0u8; 32];
    rand::rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

impl SessionBook {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a fresh token for `user_id`.
    pub async fn issue(&self, user_id: u64) -> String {
        let token = generate_token();
        let entry = SessionEntry {
            user_id,
            expires_at: Instant::now() + self.ttl,
        };
        self.sessions.write().await.insert(token.clone(), entry);
        debug!("Issued session for user {} (ttl {}s)", user_id, self.ttl.as_secs());
        token
    }

    /// Resolve a token to its user id. Expired tokens are pruned.
    pub async fn validate(&self, token: &str) -> Option<u64> {
        let now = Instant::now();
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(entry) if entry.expires_at > now => return Some(entry.user_id),
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.sessions.write().await.remove(token);
            debug!("Pruned expired session");
        }
        None
    }

    /// Revoke a token. Returns `true` if it was an active session.
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Number of sessions currently held (including not yet pruned expired ones).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionBook {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}
