/*
[INPUT]:  Wallet collaborators, challenge factory, signature verifier, outcome handler
[OUTPUT]: Exactly one success/error callback per current sign-in attempt
[POS]:    Orchestrator layer - attempt-identity-tagged sign-in state machine
[UPDATE]: When attempt steps, supersession rules or callbacks change
*/

pub mod phase;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::challenge::{Challenge, ChallengeFactory};
use crate::error::AuthError;
use crate::verify::SignatureVerifier;
use crate::wallet::{AccountProvider, ConnectionFlow, WalletSigner};

pub use phase::AuthPhase;

/// Identity of one sign-in attempt; later attempts compare greater
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receives the outcome of each current attempt.
///
/// Callbacks run before any newer attempt may start, so the attempt they
/// report is still the current one. They may read `phase()` but must not
/// block.
pub trait AuthHandler: Send + Sync {
    /// The signature verified for `challenge`
    fn on_success(&self, challenge: &Challenge, signature: &str);

    /// The attempt failed; no detail is given
    fn on_error(&self);
}

/// What `start_attempt` resolved to
#[derive(Debug)]
pub enum AttemptOutcome {
    Succeeded {
        challenge: Challenge,
        signature: String,
    },
    Failed(AuthError),
    /// A newer attempt started before this one resolved; nothing was delivered
    Superseded,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Succeeded { .. })
    }
}

/// External parties the sign-in flow talks to
#[derive(Clone)]
pub struct Collaborators {
    pub account: Arc<dyn AccountProvider>,
    pub connector: Arc<dyn ConnectionFlow>,
    pub signer: Arc<dyn WalletSigner>,
}

impl Collaborators {
    /// Use one wallet object for all three roles
    pub fn from_wallet<W>(wallet: Arc<W>) -> Self
    where
        W: AccountProvider + ConnectionFlow + WalletSigner + 'static,
    {
        Self {
            account: wallet.clone(),
            connector: wallet.clone(),
            signer: wallet,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AttemptState {
    id: AttemptId,
    phase: AuthPhase,
}

enum Interrupt {
    Superseded,
    Failed(AuthError),
}

impl From<AuthError> for Interrupt {
    fn from(err: AuthError) -> Self {
        Interrupt::Failed(err)
    }
}

/// Drives connect -> issue challenge -> sign -> verify for the latest attempt.
///
/// Each attempt keeps its challenge and nonce in its own future. The shared
/// state is only the id and phase of the current attempt; an attempt that is
/// no longer current stops at its next step and never reaches the handler.
pub struct AuthOrchestrator {
    factory: ChallengeFactory,
    verifier: SignatureVerifier,
    collaborators: Collaborators,
    handler: Arc<dyn AuthHandler>,
    state: RwLock<AttemptState>,
    delivery: Mutex<()>,
}

impl AuthOrchestrator {
    pub fn new(
        factory: ChallengeFactory,
        verifier: SignatureVerifier,
        collaborators: Collaborators,
        handler: Arc<dyn AuthHandler>,
    ) -> Self {
        Self {
            factory,
            verifier,
            collaborators,
            handler,
            state: RwLock::new(AttemptState {
                id: AttemptId(0),
                phase: AuthPhase::Idle,
            }),
            delivery: Mutex::new(()),
        }
    }

    /// Phase of the current attempt
    pub fn phase(&self) -> AuthPhase {
        self.read_state().phase
    }

    /// Identity of the current attempt (0 before the first one)
    pub fn current_attempt(&self) -> AttemptId {
        self.read_state().id
    }

    /// Start a new attempt, superseding any attempt still in flight
    pub async fn start_attempt(&self) -> AttemptOutcome {
        let attempt = self.begin();
        info!(attempt = %attempt, "sign-in attempt started");

        match self.run(attempt).await {
            Ok((challenge, signature)) => {
                let delivery = self.lock_delivery();
                if let Err(interrupt) = self.advance(attempt, AuthPhase::Succeeded) {
                    drop(delivery);
                    return self.interrupted(attempt, interrupt);
                }
                info!(
                    attempt = %attempt,
                    address = %challenge.address(),
                    "sign-in attempt succeeded"
                );
                self.handler.on_success(&challenge, &signature);
                AttemptOutcome::Succeeded {
                    challenge,
                    signature,
                }
            }
            Err(interrupt) => self.interrupted(attempt, interrupt),
        }
    }

    async fn run(&self, attempt: AttemptId) -> Result<(Challenge, String), Interrupt> {
        let connected = self
            .collaborators
            .account
            .account()
            .connected_address()
            .map(str::to_string);
        let address = match connected {
            Some(address) => address,
            None => self.connect(attempt).await?,
        };

        let challenge = self.factory.issue(&address)?;
        let nonce = challenge.nonce().clone();
        self.advance(attempt, AuthPhase::ChallengeIssued)?;
        debug!(
            attempt = %attempt,
            address = %challenge.address(),
            nonce = %nonce,
            "challenge issued"
        );

        self.advance(attempt, AuthPhase::AwaitingSignature)?;
        let signed = self
            .collaborators
            .signer
            .sign_message(&challenge.message())
            .await;
        self.ensure_current(attempt)?;
        let signature = signed.map_err(|err| {
            warn!(attempt = %attempt, error = %err, "signing declined");
            AuthError::SigningDeclined
        })?;

        self.advance(attempt, AuthPhase::Verifying)?;
        let outcome = self.verifier.verify(&challenge, &signature, &nonce).await;
        self.ensure_current(attempt)?;
        outcome.into_result()?;

        Ok((challenge, signature))
    }

    async fn connect(&self, attempt: AttemptId) -> Result<String, Interrupt> {
        self.advance(attempt, AuthPhase::AwaitingConnection)?;
        let opened = self.collaborators.connector.open_connection_flow().await;
        self.ensure_current(attempt)?;
        if let Err(err) = opened {
            warn!(attempt = %attempt, error = %err, "connection declined");
            return Err(AuthError::ConnectionDeclined.into());
        }

        self.collaborators
            .account
            .account()
            .connected_address()
            .map(str::to_string)
            .ok_or_else(|| {
                warn!(attempt = %attempt, "connection flow ended without an address");
                AuthError::ConnectionDeclined.into()
            })
    }

    fn interrupted(&self, attempt: AttemptId, interrupt: Interrupt) -> AttemptOutcome {
        match interrupt {
            Interrupt::Superseded => {
                debug!(attempt = %attempt, "superseded attempt dropped");
                AttemptOutcome::Superseded
            }
            Interrupt::Failed(err) => {
                let _delivery = self.lock_delivery();
                if let Err(Interrupt::Superseded) = self.advance(attempt, AuthPhase::Failed) {
                    debug!(attempt = %attempt, "superseded attempt dropped");
                    return AttemptOutcome::Superseded;
                }
                warn!(attempt = %attempt, error = %err, "sign-in attempt failed");
                self.handler.on_error();
                AttemptOutcome::Failed(err)
            }
        }
    }

    fn begin(&self) -> AttemptId {
        let _delivery = self.lock_delivery();
        let mut state = self.write_state();
        let id = AttemptId(state.id.0 + 1);
        if !state.phase.is_terminal() && state.phase != AuthPhase::Idle {
            debug!(superseded = %state.id, phase = %state.phase, "superseding in-flight attempt");
        }
        *state = AttemptState {
            id,
            phase: AuthPhase::Idle,
        };
        id
    }

    fn advance(&self, attempt: AttemptId, next: AuthPhase) -> Result<(), Interrupt> {
        let mut state = self.write_state();
        if state.id != attempt {
            return Err(Interrupt::Superseded);
        }
        if !state.phase.can_advance_to(next) {
            return Err(Interrupt::Failed(AuthError::InvalidTransition {
                from: state.phase,
                to: next,
            }));
        }
        debug!(attempt = %attempt, from = %state.phase, to = %next, "phase transition");
        state.phase = next;
        Ok(())
    }

    fn ensure_current(&self, attempt: AttemptId) -> Result<(), Interrupt> {
        if self.read_state().id == attempt {
            Ok(())
        } else {
            Err(Interrupt::Superseded)
        }
    }

    fn read_state(&self) -> AttemptState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Held from settling an attempt until its callback returns, and by
    /// `begin`, so a newer attempt cannot start between the two
    fn lock_delivery(&self) -> MutexGuard<'_, ()> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, AttemptState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
