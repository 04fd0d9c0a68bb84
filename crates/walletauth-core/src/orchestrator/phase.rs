/*
[INPUT]:  Current attempt phase and requested next phase
[OUTPUT]: Validated sign-in phase transitions
[POS]:    Orchestrator layer - transition table for one attempt
[UPDATE]: When attempt phases or their ordering change
*/

use std::fmt;

/// Phase of the current sign-in attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthPhase {
    Idle,
    AwaitingConnection,
    ChallengeIssued,
    AwaitingSignature,
    Verifying,
    Succeeded,
    Failed,
}

impl AuthPhase {
    /// Succeeded and Failed end an attempt
    pub fn is_terminal(self) -> bool {
        matches!(self, AuthPhase::Succeeded | AuthPhase::Failed)
    }

    /// Check if an attempt in this phase may move to `next`
    pub fn can_advance_to(self, next: AuthPhase) -> bool {
        match (self, next) {
            (from, AuthPhase::Failed) => !from.is_terminal(),
            (AuthPhase::Idle, AuthPhase::AwaitingConnection) => true,
            (AuthPhase::Idle, AuthPhase::ChallengeIssued) => true,
            (AuthPhase::AwaitingConnection, AuthPhase::ChallengeIssued) => true,
            (AuthPhase::ChallengeIssued, AuthPhase::AwaitingSignature) => true,
            (AuthPhase::AwaitingSignature, AuthPhase::Verifying) => true,
            (AuthPhase::Verifying, AuthPhase::Succeeded) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthPhase::Idle => "idle",
            AuthPhase::AwaitingConnection => "awaiting_connection",
            AuthPhase::ChallengeIssued => "challenge_issued",
            AuthPhase::AwaitingSignature => "awaiting_signature",
            AuthPhase::Verifying => "verifying",
            AuthPhase::Succeeded => "succeeded",
            AuthPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}
