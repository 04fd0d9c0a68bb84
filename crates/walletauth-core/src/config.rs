/*
[INPUT]:  Deployment settings (domain, origin, statement, chain)
[OUTPUT]: Validated challenge configuration
[POS]:    Configuration layer - fixed fields of every issued challenge
[UPDATE]: When adding new challenge fields or deployment options
*/

use serde::{Deserialize, Serialize};
use url::Url;

use crate::challenge::message::URI_TAG;
use crate::error::{AuthError, Result};

/// The only message version defined by EIP-4361
pub const SIWE_VERSION: &str = "1";

/// Deployment constants bound into every challenge.
///
/// Callers of the factory never supply these per call, so a compromised caller
/// cannot change what the user is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChallengeConfig {
    /// Host of the verifying party (e.g., "example.com")
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Origin the request comes from (e.g., "https://example.com")
    #[serde(default = "default_uri")]
    pub uri: String,
    /// Human-readable intent shown to the signer
    #[serde(default = "default_statement")]
    pub statement: Option<String>,
    /// Message version, always "1"
    #[serde(default = "default_version")]
    pub version: String,
    /// EIP-155 chain id
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Lifetime of an issued challenge; no expiration when unset
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            uri: default_uri(),
            statement: default_statement(),
            version: default_version(),
            chain_id: default_chain_id(),
            ttl_seconds: None,
        }
    }
}

impl ChallengeConfig {
    /// Config for a given domain, served over https from the same host
    pub fn for_domain(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            uri: format!("https://{domain}"),
            ..Self::default()
        }
    }

    /// Check the configuration can produce well-formed messages
    pub fn validate(&self) -> Result<()> {
        check_domain(&self.domain)?;
        check_uri(&self.uri)?;
        if self.version != SIWE_VERSION {
            return Err(AuthError::Config(format!(
                "unsupported message version {:?}, expected {SIWE_VERSION:?}",
                self.version
            )));
        }
        if let Some(statement) = &self.statement {
            check_statement(statement)?;
        }
        if self.ttl_seconds == Some(0) {
            return Err(AuthError::Config("ttl_seconds must be positive".to_string()));
        }
        Ok(())
    }
}

/// Domain is the first word of the header line
pub(crate) fn check_domain(domain: &str) -> Result<()> {
    if domain.trim().is_empty() {
        return Err(AuthError::Config("domain must not be empty".to_string()));
    }
    if domain.chars().any(char::is_whitespace) {
        return Err(AuthError::Config(format!(
            "domain must not contain whitespace: {domain:?}"
        )));
    }
    Ok(())
}

/// `Url::parse` drops tabs and newlines, so the raw text is checked as well
pub(crate) fn check_uri(uri: &str) -> Result<()> {
    if uri.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AuthError::Config(format!(
            "uri must not contain whitespace or control characters: {uri:?}"
        )));
    }
    Url::parse(uri)?;
    Ok(())
}

/// Statement occupies one line and must not read as the URI line
pub(crate) fn check_statement(statement: &str) -> Result<()> {
    if statement.contains(['\n', '\r']) {
        return Err(AuthError::Config(
            "statement must be a single line".to_string(),
        ));
    }
    if statement.starts_with(URI_TAG) {
        return Err(AuthError::Config(format!(
            "statement must not start with {:?}",
            URI_TAG.trim_end()
        )));
    }
    Ok(())
}

fn default_domain() -> String {
    "localhost".to_string()
}

fn default_uri() -> String {
    "http://localhost".to_string()
}

fn default_statement() -> Option<String> {
    Some("Please sign this message to confirm your identity.".to_string())
}

fn default_version() -> String {
    SIWE_VERSION.to_string()
}

fn default_chain_id() -> u64 {
    1
}
