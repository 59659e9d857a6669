//! PIN verification material.
//!
//! Each installation generates a random 16-byte salt. The PIN and salt go
//! through Argon2id; the output is stored as a verifier and compared in
//! constant time on unlock. The PIN itself is never stored.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::{VaultError, VaultResult};

/// Salt size in bytes (128 bits)
pub const SALT_SIZE: usize = 16;

/// Argon2id parameters for key derivation.
/// - Memory: 64 MB (provides strong resistance to GPU attacks)
/// - Time: 3 iterations
/// - Parallelism: 4 lanes
const ARGON2_MEMORY_COST: u32 = 65536; // 64 MB in KiB
const ARGON2_TIME_COST: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

const MIN_PIN_LEN: usize = 4;
const MAX_PIN_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: ARGON2_MEMORY_COST,
            iterations: ARGON2_TIME_COST,
            parallelism: ARGON2_PARALLELISM,
        }
    }
}

/// Argon2id output with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PinVerifier {
    bytes: [u8; ARGON2_OUTPUT_LEN],
}

impl PinVerifier {
    pub fn as_bytes(&self) -> &[u8; ARGON2_OUTPUT_LEN] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn from_hex(encoded: &str) -> VaultResult<Self> {
        let decoded = hex::decode(encoded.trim())
            .map_err(|e| VaultError::Corrupted(format!("Invalid verifier encoding: {}", e)))?;
        if decoded.len() != ARGON2_OUTPUT_LEN {
            return Err(VaultError::Corrupted(format!(
                "Invalid verifier size: expected {} bytes, got {}",
                ARGON2_OUTPUT_LEN,
                decoded.len()
            )));
        }
        let mut bytes = [0u8; ARGON2_OUTPUT_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self { bytes })
    }

    /// Constant-time comparison.
    pub fn matches(&self, other: &PinVerifier) -> bool {
        self.bytes[..].ct_eq(&other.bytes[..]).into()
    }
}

impl std::fmt::Debug for PinVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinVerifier")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Check that a PIN is 4-8 ASCII digits.
pub fn validate_pin(pin: &str) -> VaultResult<()> {
    if pin.len() < MIN_PIN_LEN || pin.len() > MAX_PIN_LEN || !pin.chars().all(|c| c.is_ascii_digit())
    {
        return Err(VaultError::InvalidInput("PIN must be 4-8 digits".into()));
    }
    Ok(())
}

/// Generate a cryptographically random installation salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rng().fill_bytes(&mut salt);
    salt
}

pub fn decode_salt(encoded: &str) -> VaultResult<[u8; SALT_SIZE]> {
    let bytes = hex::decode(encoded.trim())
        .map_err(|e| VaultError::Corrupted(format!("Invalid salt encoding: {}", e)))?;
    if bytes.len() != SALT_SIZE {
        return Err(VaultError::Corrupted(format!(
            "Invalid salt size: expected {} bytes, got {}",
            SALT_SIZE,
            bytes.len()
        )));
    }
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&bytes);
    Ok(salt)
}

/// Derive the verifier for `pin` with Argon2id.
///
/// Intentionally slow; call it from a blocking context.
pub fn derive_verifier(
    pin: &str,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> VaultResult<PinVerifier> {
    let params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| VaultError::KeyDerivation(format!("Invalid Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut bytes = [0u8; ARGON2_OUTPUT_LEN];
    argon2
        .hash_password_into(pin.as_bytes(), salt, &mut bytes)
        .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

    debug!("Derived {}-byte verifier from PIN", bytes.len());
    Ok(PinVerifier { bytes })
}

#[cfg(test)]
pub(crate) fn fast_params() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_verifier_deterministic() {
        let salt = [1u8; SALT_SIZE];
        let v1 = derive_verifier("1234", &salt, &fast_params()).unwrap();
        let v2 = derive_verifier("1234", &salt, &fast_params()).unwrap();
        assert!(v1.matches(&v2), "Same PIN and salt should produce same verifier");
    }

    #[test]
    fn test_derive_verifier_different_pins_and_salts() {
        let salt = [1u8; SALT_SIZE];
        let base = derive_verifier("1234", &salt, &fast_params()).unwrap();
        let other_pin = derive_verifier("5678", &salt, &fast_params()).unwrap();
        let other_salt = derive_verifier("1234", &[2u8; SALT_SIZE], &fast_params()).unwrap();
        assert!(!base.matches(&other_pin));
        assert!(!base.matches(&other_salt));
    }

    #[test]
    fn test_default_params_are_accepted() {
        let salt = generate_salt();
        let verifier = derive_verifier("2468", &salt, &KdfParams::default()).unwrap();
        assert_eq!(verifier.as_bytes().len(), ARGON2_OUTPUT_LEN);
    }

    #[test]
    fn test_verifier_hex_round_trip_and_corruption() {
        let verifier = derive_verifier("1234", &[3u8; SALT_SIZE], &fast_params()).unwrap();
        let restored = PinVerifier::from_hex(&verifier.to_hex()).unwrap();
        assert!(verifier.matches(&restored));
        assert!(matches!(
            PinVerifier::from_hex("abcd"),
            Err(VaultError::Corrupted(_))
        ));
        assert!(matches!(decode_salt("zz"), Err(VaultError::Corrupted(_))));
    }

    #[test]
    fn test_validate_pin() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("12345678").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("123456789").is_err());
        assert!(validate_pin("12a4").is_err());
    }
}
