//! In-memory user directory.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// User profile as served on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password_digest: [u8; 32],
}

fn digest(password: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(password.as_bytes()));
    out
}

#[derive(Debug, Default)]
pub struct UserDirectory {
    accounts: Vec<Account>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account. Emails match case-insensitively; the first match wins.
    pub fn with_user(mut self, user: User, password: &str) -> Self {
        self.accounts.push(Account {
            user,
            password_digest: digest(password),
        });
        self
    }

    /// Check credentials, returning the user on success.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<&User> {
        let account = self
            .accounts
            .iter()
            .find(|a| a.user.email.eq_ignore_ascii_case(email))?;

        let supplied = digest(password);
        if bool::from(account.password_digest.ct_eq(&supplied)) {
            Some(&account.user)
        } else {
            None
        }
    }

    pub fn find(&self, id: u64) -> Option<&User> {
        self.accounts.iter().map(|a| &a.user).find(|u| u.id == id)
    }
}
