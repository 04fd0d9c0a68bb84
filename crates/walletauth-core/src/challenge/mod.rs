/*
[INPUT]:  Account address and deployment configuration
[OUTPUT]: Single-use challenges, their nonces and canonical text
[POS]:    Challenge layer - what the wallet is asked to sign
[UPDATE]: When the message format or nonce policy changes
*/

pub mod factory;
pub mod message;
pub mod nonce;

pub use factory::ChallengeFactory;
pub use message::Challenge;
pub use nonce::{Nonce, NonceGenerator, RandomNonceGenerator};
