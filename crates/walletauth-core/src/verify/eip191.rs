/*
[INPUT]:  Challenge text, hex signature, expected nonce
[OUTPUT]: Whether the recovered EIP-191 signer matches the challenge address
[POS]:    Verification layer - local secp256k1 recovery capability
[UPDATE]: When supporting other signature schemes (e.g. EIP-1271 contract wallets)
*/

use std::str::FromStr;

use alloy_primitives::{Address, Signature};
use async_trait::async_trait;

use crate::challenge::{Challenge, Nonce};
use crate::error::{AuthError, Result};

use super::VerificationCapability;

/// Verifies `personal_sign` signatures by recovering the signer address
#[derive(Debug, Clone, Copy, Default)]
pub struct Eip191Verifier;

#[async_trait]
impl VerificationCapability for Eip191Verifier {
    async fn verify(
        &self,
        message: &str,
        signature: &str,
        expected_nonce: &Nonce,
    ) -> Result<bool> {
        let challenge = Challenge::from_str(message)?;
        if challenge.nonce() != expected_nonce {
            return Ok(false);
        }

        let expected = Address::from_str(challenge.address())
            .map_err(|e| AuthError::InvalidMessage(format!("bad address: {e}")))?;
        let signature = decode_signature(signature)?;
        let recovered = signature
            .recover_address_from_msg(message.as_bytes())
            .map_err(|e| AuthError::InvalidMessage(format!("signature recovery failed: {e}")))?;

        Ok(recovered == expected)
    }
}

fn decode_signature(signature: &str) -> Result<Signature> {
    let signature = signature.trim();
    let hex_part = signature
        .strip_prefix("0x")
        .or_else(|| signature.strip_prefix("0X"))
        .unwrap_or(signature);
    let bytes = hex::decode(hex_part)
        .map_err(|e| AuthError::InvalidMessage(format!("signature is not hex: {e}")))?;
    Signature::try_from(bytes.as_slice())
        .map_err(|e| AuthError::InvalidMessage(format!("malformed signature: {e}")))
}
