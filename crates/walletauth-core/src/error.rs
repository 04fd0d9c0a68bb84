/*
[INPUT]:  Error sources (collaborators, verification capability, HTTP, serialization)
[OUTPUT]: Structured error types for the sign-in flow
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or outward-facing failure kinds
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::orchestrator::AuthPhase;

/// Main error type for walletauth
#[derive(Error, Debug)]
pub enum AuthError {
    /// The user abandoned or failed the wallet connection flow
    #[error("Wallet connection was declined")]
    ConnectionDeclined,

    /// The user rejected the signature prompt, or the signing device failed
    #[error("Message signing was declined")]
    SigningDeclined,

    /// The signature did not verify for the issued challenge
    #[error("Signature verification failed")]
    VerificationFailed,

    /// The verification capability itself raised an error
    #[error("Signature verification could not be completed")]
    VerificationFaulted,

    /// Address is not a usable account identifier
    #[error("Invalid account address: {0}")]
    InvalidAddress(String),

    /// Challenge text could not be parsed
    #[error("Invalid challenge message: {0}")]
    InvalidMessage(String),

    /// Orchestrator was asked to make a transition its table forbids
    #[error("Invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: AuthPhase, to: AuthPhase },

    /// Signer backend error (bad key, device failure)
    #[error("Signer error: {0}")]
    Signer(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote service returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Check if the user walked away from the flow (connect or sign prompt)
    pub fn is_user_abort(&self) -> bool {
        matches!(
            self,
            AuthError::ConnectionDeclined | AuthError::SigningDeclined
        )
    }

    /// Check if error is one of the verification outcomes
    pub fn is_verification_error(&self) -> bool {
        matches!(
            self,
            AuthError::VerificationFailed | AuthError::VerificationFaulted
        )
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        AuthError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for walletauth operations
pub type Result<T> = std::result::Result<T, AuthError>;
