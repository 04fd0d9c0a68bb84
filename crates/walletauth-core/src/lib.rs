/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public walletauth crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod challenge;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod verify;
pub mod wallet;

// Re-export commonly used types from challenge
pub use challenge::{Challenge, ChallengeFactory, Nonce, NonceGenerator, RandomNonceGenerator};

pub use config::ChallengeConfig;
pub use error::{AuthError, Result};

// Re-export commonly used types from orchestrator
pub use orchestrator::{
    AttemptId,
    AttemptOutcome,
    AuthHandler,
    AuthOrchestrator,
    AuthPhase,
    Collaborators,
};

// Re-export commonly used types from verify
pub use verify::{
    ClientConfig,
    Eip191Verifier,
    RemoteVerifier,
    SignatureVerifier,
    VerificationCapability,
    VerificationFailure,
    VerificationOutcome,
};

// Re-export commonly used types from wallet
pub use wallet::{
    AccountProvider,
    AccountState,
    ConnectionFlow,
    EvmWalletSigner,
    MockWalletSigner,
    WalletSigner,
};
