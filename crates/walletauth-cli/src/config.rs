/*
[INPUT]:  Optional YAML configuration file, WALLETAUTH__* environment
[OUTPUT]: Parsed sign-in configuration
[POS]:    Configuration layer - CLI setup
[UPDATE]: When adding new configuration options
*/

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use walletauth_core::{
    ChallengeConfig, ClientConfig, Eip191Verifier, RemoteVerifier, VerificationCapability,
};

/// Top-level configuration for the sign-in runner
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    /// Fields of the issued challenge
    #[serde(default)]
    pub challenge: ChallengeConfig,
    /// Where signatures are checked
    #[serde(default)]
    pub verifier: VerifierConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifierMode {
    /// Recover the signer in-process
    #[default]
    Local,
    /// Delegate to a verification service
    Remote,
}

/// Verification backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerifierConfig {
    #[serde(default)]
    pub mode: VerifierMode,
    /// Base URL of the verification service, required in remote mode
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            mode: VerifierMode::default(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

impl VerifierConfig {
    /// Build the capability this configuration describes
    pub fn capability(&self) -> anyhow::Result<Arc<dyn VerificationCapability>> {
        match self.mode {
            VerifierMode::Local => Ok(Arc::new(Eip191Verifier)),
            VerifierMode::Remote => {
                let Some(endpoint) = self.endpoint.as_deref() else {
                    bail!("verifier.endpoint is required in remote mode");
                };
                if self.timeout_secs == 0 {
                    bail!("verifier.timeout_secs must be positive");
                }
                let client = ClientConfig {
                    timeout: std::time::Duration::from_secs(self.timeout_secs),
                    ..ClientConfig::default()
                };
                let remote = RemoteVerifier::with_config(endpoint, client)
                    .context("build remote verifier")?;
                Ok(Arc::new(remote))
            }
        }
    }
}

impl CliConfig {
    /// Load configuration from an optional YAML file, overridden by
    /// `WALLETAUTH__SECTION__KEY` environment variables
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            let path_str = path.to_str().context("config path must be valid utf-8")?;
            builder = builder.add_source(config::File::new(path_str, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("WALLETAUTH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("read configuration sources")?
            .try_deserialize()
            .context("parse configuration")?;
        config.challenge.validate().context("invalid challenge configuration")?;
        Ok(config)
    }
}
