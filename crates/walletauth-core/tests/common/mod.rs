/*
[INPUT]:  Test configuration and scripted collaborator behaviour
[OUTPUT]: Shared test utilities, fixtures, and scripted wallets
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for walletauth-core tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::oneshot;
use walletauth_core::{
    AccountProvider, AccountState, AuthError, AuthHandler, AuthOrchestrator, Challenge,
    ChallengeConfig, ChallengeFactory, Collaborators, ConnectionFlow, Eip191Verifier,
    EvmWalletSigner, Nonce, NonceGenerator, RandomNonceGenerator, Result, SignatureVerifier,
    VerificationCapability, WalletSigner,
};

/// Well-known development key and its address
pub const PK: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const OTHER_ADDRESS: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const DOMAIN: &str = "example.com";

pub fn test_config() -> ChallengeConfig {
    ChallengeConfig::for_domain(DOMAIN)
}

/// Account whose state the test controls
#[derive(Default)]
pub struct ScriptedAccount {
    state: RwLock<AccountState>,
}

impl ScriptedAccount {
    pub fn new(state: AccountState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn set(&self, state: AccountState) {
        *self.state.write().unwrap() = state;
    }
}

impl AccountProvider for ScriptedAccount {
    fn account(&self) -> AccountState {
        self.state.read().unwrap().clone()
    }
}

/// Connection modal that either connects `address` or is abandoned
pub struct ScriptedConnector {
    account: Arc<ScriptedAccount>,
    connect_with: Option<String>,
    gates: Mutex<VecDeque<oneshot::Receiver<bool>>>,
    calls: AtomicUsize,
}

impl ScriptedConnector {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Hold the next connection modal open until the returned sender decides
    /// it (`true` follows the script, `false` abandons it)
    pub fn gate(&self) -> oneshot::Sender<bool> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub async fn wait_for_calls(&self, count: usize) {
        wait_until(|| self.calls() >= count, "connector calls").await;
    }
}

#[async_trait]
impl ConnectionFlow for ScriptedConnector {
    async fn open_connection_flow(&self) -> Result<()> {
        let gate = self.gates.lock().unwrap().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = gate {
            if !gate.await.unwrap_or(false) {
                return Err(AuthError::ConnectionDeclined);
            }
        }
        match &self.connect_with {
            Some(address) => {
                self.account.set(AccountState::connected(address));
                Ok(())
            }
            None => Err(AuthError::ConnectionDeclined),
        }
    }
}

/// Real EVM key whose signature prompts can be held open by the test
pub struct ScriptedSigner {
    wallet: EvmWalletSigner,
    gates: Mutex<VecDeque<oneshot::Receiver<bool>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedSigner {
    pub fn new() -> Self {
        Self {
            wallet: EvmWalletSigner::new(PK).unwrap(),
            gates: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Hold the next signature prompt until the returned sender decides it
    /// (`true` approves, `false` rejects)
    pub fn gate(&self) -> oneshot::Sender<bool> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn wait_for_requests(&self, count: usize) {
        wait_until(|| self.requests.lock().unwrap().len() >= count, "signature requests").await;
    }
}

#[async_trait]
impl WalletSigner for ScriptedSigner {
    fn address(&self) -> &str {
        self.wallet.address()
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        self.requests.lock().unwrap().push(message.to_string());
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            if !gate.await.unwrap_or(false) {
                return Err(AuthError::Signer("user rejected the request".to_string()));
            }
        }
        self.wallet.sign_message(message).await
    }
}

/// EIP-191 verification that records what it was asked and can be held open
#[derive(Default)]
pub struct CountingCapability {
    calls: Mutex<Vec<(String, Nonce)>>,
    gates: Mutex<VecDeque<oneshot::Receiver<bool>>>,
}

impl CountingCapability {
    pub fn calls(&self) -> Vec<(String, Nonce)> {
        self.calls.lock().unwrap().clone()
    }

    /// Hold the next verification until the returned sender decides it
    /// (`true` verifies for real, `false` reports a bad signature)
    pub fn gate(&self) -> oneshot::Sender<bool> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub async fn wait_for_calls(&self, count: usize) {
        wait_until(|| self.calls.lock().unwrap().len() >= count, "verifications").await;
    }
}

#[async_trait]
impl VerificationCapability for CountingCapability {
    async fn verify(&self, message: &str, signature: &str, expected_nonce: &Nonce) -> Result<bool> {
        let gate = self.gates.lock().unwrap().pop_front();
        self.calls
            .lock()
            .unwrap()
            .push((message.to_string(), expected_nonce.clone()));
        if let Some(gate) = gate {
            if !gate.await.unwrap_or(false) {
                return Ok(false);
            }
        }
        Eip191Verifier.verify(message, signature, expected_nonce).await
    }
}

/// Yield to spawned attempts until `done` holds
async fn wait_until(done: impl Fn() -> bool, what: &str) {
    for _ in 0..10_000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("timed out waiting for {what}");
}

/// Random nonces, counted
#[derive(Default)]
pub struct CountingNonces {
    issued: AtomicUsize,
}

impl CountingNonces {
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

impl NonceGenerator for CountingNonces {
    fn next_nonce(&self) -> Nonce {
        self.issued.fetch_add(1, Ordering::SeqCst);
        RandomNonceGenerator.next_nonce()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Success { nonce: Nonce, signature: String },
    Error,
}

/// Handler that records every callback
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<Event>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl AuthHandler for RecordingHandler {
    fn on_success(&self, challenge: &Challenge, signature: &str) {
        self.events.lock().unwrap().push(Event::Success {
            nonce: challenge.nonce().clone(),
            signature: signature.to_string(),
        });
    }

    fn on_error(&self) {
        self.events.lock().unwrap().push(Event::Error);
    }
}

/// Orchestrator wired to scripted collaborators
pub struct Harness {
    pub orchestrator: Arc<AuthOrchestrator>,
    pub account: Arc<ScriptedAccount>,
    pub connector: Arc<ScriptedConnector>,
    pub signer: Arc<ScriptedSigner>,
    pub capability: Arc<CountingCapability>,
    pub nonces: Arc<CountingNonces>,
    pub handler: Arc<RecordingHandler>,
}

impl Harness {
    /// `initial` is the account state at attempt start; `connect_with` is
    /// the address the connection modal yields, `None` to abandon it
    pub fn new(initial: AccountState, connect_with: Option<&str>) -> Self {
        let account = Arc::new(ScriptedAccount::new(initial));
        let connector = Arc::new(ScriptedConnector {
            account: account.clone(),
            connect_with: connect_with.map(str::to_string),
            gates: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        });
        let signer = Arc::new(ScriptedSigner::new());
        let capability = Arc::new(CountingCapability::default());
        let nonces = Arc::new(CountingNonces::default());
        let handler = Arc::new(RecordingHandler::default());

        let factory = ChallengeFactory::with_nonce_generator(test_config(), nonces.clone()).unwrap();
        let verifier = SignatureVerifier::new(DOMAIN, capability.clone());
        let collaborators = Collaborators {
            account: account.clone(),
            connector: connector.clone(),
            signer: signer.clone(),
        };
        let orchestrator = Arc::new(AuthOrchestrator::new(
            factory,
            verifier,
            collaborators,
            handler.clone(),
        ));

        Self {
            orchestrator,
            account,
            connector,
            signer,
            capability,
            nonces,
            handler,
        }
    }

    /// Wallet already connected as [`ADDRESS`]
    pub fn connected() -> Self {
        Self::new(AccountState::connected(ADDRESS), None)
    }
}
