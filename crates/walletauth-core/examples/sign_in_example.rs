/*
[INPUT]:  Local development key and challenge configuration
[OUTPUT]: One complete sign-in attempt printed to stdout
[POS]:    Examples - sign-in flow demonstration
[UPDATE]: When the sign-in flow changes
*/

use std::sync::Arc;

use walletauth_core::*;

struct PrintHandler;

impl AuthHandler for PrintHandler {
    fn on_success(&self, challenge: &Challenge, signature: &str) {
        println!("✓ Signed in as {}", challenge.address());
        println!("  Signature: {}", signature);
    }

    fn on_error(&self) {
        println!("✗ Sign-in failed");
    }
}

/// Example: Sign-in flow
///
/// This example demonstrates the complete flow:
/// 1. Build a challenge factory and verifier for one domain
/// 2. Use a local EVM key as the connected wallet
/// 3. Issue a challenge, sign it and verify the signature
#[tokio::main]
async fn main() {
    println!("=== walletauth Sign-In Example ===\n");

    // Step 1: Factory and verifier share the domain
    let config = ChallengeConfig::for_domain("example.com");
    let factory = match ChallengeFactory::new(config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Invalid challenge config: {}", e);
            return;
        }
    };
    let verifier = SignatureVerifier::eip191("example.com");
    println!("✓ Challenge factory and verifier created");

    // Step 2: A well-known development key stands in for the user's wallet
    let wallet = match EvmWalletSigner::new(
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    ) {
        Ok(w) => Arc::new(w),
        Err(e) => {
            eprintln!("Failed to load wallet: {}", e);
            return;
        }
    };
    println!("✓ Wallet connected: {}", wallet.address());

    // Step 3: Run one attempt
    let orchestrator = AuthOrchestrator::new(
        factory,
        verifier,
        Collaborators::from_wallet(wallet),
        Arc::new(PrintHandler),
    );
    let outcome = orchestrator.start_attempt().await;

    if let AttemptOutcome::Succeeded { challenge, .. } = &outcome {
        println!("\nSigned message:\n{}\n", challenge);
    }
    println!("Final phase: {}", orchestrator.phase());
}
