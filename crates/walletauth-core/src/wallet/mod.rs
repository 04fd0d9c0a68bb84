/*
[INPUT]:  Account state, connection prompts and messages to sign
[OUTPUT]: Connected address and signature strings for the sign-in flow
[POS]:    Wallet layer - external collaborator abstraction
[UPDATE]: When adding new wallet types or changing collaborator contracts
*/

pub mod evm;

use async_trait::async_trait;

use crate::error::Result;

pub use evm::EvmWalletSigner;

/// Snapshot of the wallet account as seen by the sign-in flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountState {
    pub address: Option<String>,
    pub connected: bool,
}

impl AccountState {
    /// Account that is connected with the given address
    pub fn connected(address: &str) -> Self {
        Self {
            address: Some(address.to_string()),
            connected: true,
        }
    }

    /// Address usable for a challenge, only when connected and non-empty
    pub fn connected_address(&self) -> Option<&str> {
        if !self.connected {
            return None;
        }
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }
}

/// Read-only view of the current wallet account
///
/// The state may change between calls; the orchestrator reads it at attempt
/// start and again after a connection flow completes.
pub trait AccountProvider: Send + Sync {
    fn account(&self) -> AccountState;
}

/// Connection UI collaborator (e.g. a wallet picker modal)
#[async_trait]
pub trait ConnectionFlow: Send + Sync {
    /// Suspend until the user connects an account or abandons the flow
    ///
    /// An error means the user abandoned; `Ok` means the account provider
    /// should now report a connected address.
    async fn open_connection_flow(&self) -> Result<()>;
}

/// Trait for wallet signing operations
///
/// The trait is async to support hardware wallets and external signers.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Get the wallet address
    fn address(&self) -> &str;

    /// Sign a message and return the signature
    ///
    /// For EVM: Returns hex-encoded signature (0x...)
    async fn sign_message(&self, message: &str) -> Result<String>;
}

/// Mock wallet signer for testing
#[derive(Debug, Clone)]
pub struct MockWalletSigner {
    address: String,
    signature: String,
}

impl MockWalletSigner {
    /// Create a new mock signer with predetermined signature
    pub fn new(address: &str, signature: &str) -> Self {
        Self {
            address: address.to_string(),
            signature: signature.to_string(),
        }
    }
}

#[async_trait]
impl WalletSigner for MockWalletSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, _message: &str) -> Result<String> {
        Ok(self.signature.clone())
    }
}

impl AccountProvider for MockWalletSigner {
    fn account(&self) -> AccountState {
        AccountState::connected(&self.address)
    }
}
