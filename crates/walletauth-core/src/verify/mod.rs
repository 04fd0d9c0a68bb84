/*
[INPUT]:  Issued challenge, returned signature, nonce recorded at issue time
[OUTPUT]: Boolean verification outcome with internal failure detail
[POS]:    Verification layer - anti-replay checks and capability dispatch
[UPDATE]: When adding verification checks or capability implementations
*/

pub mod eip191;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::challenge::{Challenge, Nonce};
use crate::error::{AuthError, Result};

pub use eip191::Eip191Verifier;
pub use remote::{ClientConfig, RemoteVerifier};

/// Cryptographic primitive that checks a signature over a message text
#[async_trait]
pub trait VerificationCapability: Send + Sync {
    /// Resolve `true` if `signature` was produced by the account named in
    /// `message` and the message carries `expected_nonce`
    async fn verify(&self, message: &str, signature: &str, expected_nonce: &Nonce)
    -> Result<bool>;
}

/// Why a verification did not succeed. Internal only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    NonceMismatch,
    DomainMismatch,
    Expired,
    NotYetValid,
    InvalidSignature,
    Fault(String),
}

/// Result of checking one signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub verified: bool,
    failure: Option<VerificationFailure>,
}

impl VerificationOutcome {
    pub fn success() -> Self {
        Self {
            verified: true,
            failure: None,
        }
    }

    pub fn failed(failure: VerificationFailure) -> Self {
        Self {
            verified: false,
            failure: Some(failure),
        }
    }

    pub fn failure(&self) -> Option<&VerificationFailure> {
        self.failure.as_ref()
    }

    /// Collapse into the outward error kinds, hiding which check failed
    pub fn into_result(self) -> Result<()> {
        match self.failure {
            None if self.verified => Ok(()),
            Some(VerificationFailure::Fault(_)) => Err(AuthError::VerificationFaulted),
            _ => Err(AuthError::VerificationFailed),
        }
    }
}

/// Validates signatures for challenges issued by this deployment
#[derive(Clone)]
pub struct SignatureVerifier {
    expected_domain: String,
    capability: Arc<dyn VerificationCapability>,
}

impl SignatureVerifier {
    pub fn new(expected_domain: &str, capability: Arc<dyn VerificationCapability>) -> Self {
        Self {
            expected_domain: expected_domain.to_string(),
            capability,
        }
    }

    /// Verifier backed by local EIP-191 signature recovery
    pub fn eip191(expected_domain: &str) -> Self {
        Self::new(expected_domain, Arc::new(Eip191Verifier))
    }

    pub fn expected_domain(&self) -> &str {
        &self.expected_domain
    }

    /// Check `signature` against `challenge` and the nonce recorded when it was minted
    pub async fn verify(
        &self,
        challenge: &Challenge,
        signature: &str,
        nonce: &Nonce,
    ) -> VerificationOutcome {
        self.verify_at(challenge, signature, nonce, Utc::now()).await
    }

    /// Same as [`verify`](Self::verify) with an explicit clock
    pub async fn verify_at(
        &self,
        challenge: &Challenge,
        signature: &str,
        nonce: &Nonce,
        now: DateTime<Utc>,
    ) -> VerificationOutcome {
        let outcome = self.check(challenge, signature, nonce, now).await;
        if let Some(failure) = outcome.failure() {
            debug!(
                address = %challenge.address(),
                nonce = %challenge.nonce(),
                failure = ?failure,
                "signature verification rejected"
            );
        }
        outcome
    }

    async fn check(
        &self,
        challenge: &Challenge,
        signature: &str,
        nonce: &Nonce,
        now: DateTime<Utc>,
    ) -> VerificationOutcome {
        if challenge.nonce() != nonce {
            return VerificationOutcome::failed(VerificationFailure::NonceMismatch);
        }
        if challenge.domain() != self.expected_domain {
            return VerificationOutcome::failed(VerificationFailure::DomainMismatch);
        }
        if let Some(expiration_time) = challenge.expiration_time() {
            if now >= expiration_time {
                return VerificationOutcome::failed(VerificationFailure::Expired);
            }
        }
        if let Some(not_before) = challenge.not_before() {
            if now < not_before {
                return VerificationOutcome::failed(VerificationFailure::NotYetValid);
            }
        }

        let message = challenge.message();
        match self.capability.verify(&message, signature, nonce).await {
            Ok(true) => VerificationOutcome::success(),
            Ok(false) => VerificationOutcome::failed(VerificationFailure::InvalidSignature),
            Err(err) => VerificationOutcome::failed(VerificationFailure::Fault(err.to_string())),
        }
    }
}
