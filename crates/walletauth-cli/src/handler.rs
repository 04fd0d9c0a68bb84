/*
[INPUT]:  Attempt callbacks from the orchestrator
[OUTPUT]: Structured log lines and failure summaries for the sign-in runner
[POS]:    CLI callbacks
[UPDATE]: When the callback contract changes
*/

use tracing::{info, warn};
use walletauth_core::{AuthError, AuthHandler, Challenge};

/// Logs the outcome of each current attempt
#[derive(Debug, Default)]
pub struct ConsoleHandler;

impl AuthHandler for ConsoleHandler {
    fn on_success(&self, challenge: &Challenge, signature: &str) {
        info!(
            address = %challenge.address(),
            nonce = %challenge.nonce(),
            signature_len = signature.len(),
            "sign-in verified"
        );
    }

    fn on_error(&self) {
        warn!("sign-in failed");
    }
}

/// One-line reason for a failed attempt, shown above the error chain
pub fn failure_summary(err: &AuthError) -> &'static str {
    if err.is_user_abort() {
        "sign-in was cancelled in the wallet"
    } else if err.is_verification_error() {
        "signature was not accepted"
    } else {
        "sign-in attempt failed"
    }
}
