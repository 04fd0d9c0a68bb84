/*
[INPUT]:  Connected account address, challenge configuration, nonce source
[OUTPUT]: Freshly minted single-use challenges
[POS]:    Challenge layer - challenge construction
[UPDATE]: When changing which fields are fixed by deployment vs. per call
*/

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::Address;
use chrono::{Duration, SubsecRound, Utc};

use crate::config::{ChallengeConfig, check_domain, check_uri};
use crate::error::{AuthError, Result};

use super::{Challenge, Nonce, NonceGenerator, RandomNonceGenerator};

/// Mints challenges with the deployment's fixed statement, version and chain id
#[derive(Clone)]
pub struct ChallengeFactory {
    config: ChallengeConfig,
    nonces: Arc<dyn NonceGenerator>,
}

impl ChallengeFactory {
    /// Create a factory drawing nonces from the OS CSPRNG
    pub fn new(config: ChallengeConfig) -> Result<Self> {
        Self::with_nonce_generator(config, Arc::new(RandomNonceGenerator))
    }

    /// Create a factory with an explicit nonce source
    pub fn with_nonce_generator(
        config: ChallengeConfig,
        nonces: Arc<dyn NonceGenerator>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, nonces })
    }

    pub fn config(&self) -> &ChallengeConfig {
        &self.config
    }

    /// Build a challenge for `address`, bound to `domain`, `uri` and `nonce`
    pub fn create(&self, address: &str, domain: &str, uri: &str, nonce: Nonce) -> Result<Challenge> {
        let address = normalize_address(address)?;
        check_domain(domain)?;
        check_uri(uri)?;

        let issued_at = Utc::now().trunc_subsecs(3);
        let expiration_time = match self.config.ttl_seconds {
            Some(ttl) => {
                let ttl = i64::try_from(ttl)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .ok_or_else(|| AuthError::Config(format!("ttl_seconds out of range: {ttl}")))?;
                let expires = issued_at
                    .checked_add_signed(ttl)
                    .ok_or_else(|| AuthError::Config("expiration time overflows".to_string()))?;
                Some(expires)
            }
            None => None,
        };

        Ok(Challenge {
            domain: domain.to_string(),
            address,
            statement: self.config.statement.clone(),
            uri: uri.to_string(),
            version: self.config.version.clone(),
            chain_id: self.config.chain_id,
            nonce,
            issued_at,
            expiration_time,
            not_before: None,
        })
    }

    /// Build a challenge for `address` with the configured domain/uri and a fresh nonce
    pub fn issue(&self, address: &str) -> Result<Challenge> {
        let nonce = self.nonces.next_nonce();
        self.create(address, &self.config.domain, &self.config.uri, nonce)
    }
}

/// Parse an EVM address and return its EIP-55 checksum form
pub(crate) fn normalize_address(address: &str) -> Result<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AuthError::InvalidAddress(
            "address must not be empty".to_string(),
        ));
    }
    let parsed = Address::from_str(address)
        .map_err(|e| AuthError::InvalidAddress(format!("{address}: {e}")))?;
    Ok(parsed.to_checksum(None))
}
