/*
[INPUT]:  CLI arguments, optional YAML configuration file, private key
[OUTPUT]: One sign-in attempt, signed message and outcome on stdout
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags or the startup flow
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use walletauth_cli::{CliConfig, ConsoleHandler, failure_summary};
use walletauth_core::{
    AttemptOutcome, AuthOrchestrator, ChallengeFactory, Collaborators, EvmWalletSigner,
    SignatureVerifier, WalletSigner,
};

#[derive(Parser, Debug)]
#[command(name = "walletauth", version, about = "Sign in with an Ethereum key")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(
        long = "private-key",
        value_name = "HEX",
        env = "WALLETAUTH_PRIVATE_KEY",
        hide_env_values = true
    )]
    private_key: Option<String>,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    info!(
        config_path = ?args.config_path.as_ref().map(|p| p.display().to_string()),
        dry_run = args.dry_run,
        "starting walletauth"
    );

    let config = CliConfig::load(args.config_path.as_deref()).context("load config")?;
    let capability = config.verifier.capability()?;
    let factory = ChallengeFactory::new(config.challenge.clone()).context("build challenge factory")?;
    info!(
        domain = %config.challenge.domain,
        chain_id = config.challenge.chain_id,
        verifier = ?config.verifier.mode,
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let private_key = args
        .private_key
        .context("a private key is required (--private-key or WALLETAUTH_PRIVATE_KEY)")?;
    let wallet = Arc::new(EvmWalletSigner::new(&private_key).context("load private key")?);
    info!(address = %wallet.address(), "wallet loaded");

    let verifier = SignatureVerifier::new(&config.challenge.domain, capability);
    let orchestrator = AuthOrchestrator::new(
        factory,
        verifier,
        Collaborators::from_wallet(wallet),
        Arc::new(ConsoleHandler),
    );

    match orchestrator.start_attempt().await {
        AttemptOutcome::Succeeded {
            challenge,
            signature,
        } => {
            println!("{challenge}");
            println!();
            println!("signature: {signature}");
            println!("outcome: {}", orchestrator.phase());
            Ok(())
        }
        AttemptOutcome::Failed(err) => {
            println!("outcome: {}", orchestrator.phase());
            let summary = failure_summary(&err);
            Err(anyhow!(err)).context(summary)
        }
        AttemptOutcome::Superseded => bail!("sign-in attempt was superseded"),
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}
