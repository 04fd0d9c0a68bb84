/*
[INPUT]:  OS randomness source
[OUTPUT]: Per-attempt nonces embedded in challenges
[POS]:    Challenge layer - anti-replay token generation
[UPDATE]: When changing nonce length, alphabet or randomness source
*/

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{AuthError, Result};

/// Minimum nonce length allowed in an EIP-4361 message
pub const MIN_NONCE_LEN: usize = 8;

const NONCE_BYTES: usize = 16;

/// Opaque per-attempt token, alphanumeric and at least 8 characters long
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nonce(String);

impl Nonce {
    /// Validate an externally supplied nonce
    pub fn parse(value: &str) -> Result<Self> {
        if value.len() < MIN_NONCE_LEN {
            return Err(AuthError::InvalidMessage(format!(
                "nonce must be at least {MIN_NONCE_LEN} characters"
            )));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AuthError::InvalidMessage(
                "nonce must be alphanumeric".to_string(),
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh nonces
pub trait NonceGenerator: Send + Sync {
    fn next_nonce(&self) -> Nonce;
}

/// Nonce generator backed by the operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonceGenerator;

impl NonceGenerator for RandomNonceGenerator {
    fn next_nonce(&self) -> Nonce {
        let mut bytes = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Nonce(hex::encode(bytes))
    }
}
