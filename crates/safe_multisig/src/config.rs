use alloy_primitives::Address;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use url::Url;

use std::{fs::File, path::Path, time::Duration};

use crate::{
    consts::{
        DEFAULT_GAS_BUFFER_PERCENT, DEFAULT_RECEIPT_POLL_INTERVAL, DEFAULT_RECEIPT_TIMEOUT,
        DEFAULT_SIGNER_TIMEOUT, MAX_SIGNER_TIMEOUT_SECS, MIN_SIGNER_TIMEOUT_SECS,
    },
    orchestrator::AuthorizerOptions,
    signers::{BoxSignatureSource, HttpSigner, LocalKeySigner, SignerSlot},
};

/// Settings for one authorizer, usually read from a YAML file.
///
/// Keys never live in the file: local sources name the environment variable
/// holding their key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerConfig {
    pub chain_id: u64,
    pub safe_address: Address,
    pub rpc_url: Url,
    #[serde(default = "default_signer_timeout_secs")]
    pub signer_timeout_secs: u64,
    #[serde(default = "default_gas_buffer_percent")]
    pub gas_buffer_percent: u64,
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    pub slots: Vec<SlotConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub label: String,
    /// Primary source first, fallbacks after it.
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Local { private_key_env: String },
    Remote { url: Url },
    Hardware { url: Url },
}

fn default_signer_timeout_secs() -> u64 {
    DEFAULT_SIGNER_TIMEOUT.as_secs()
}

fn default_gas_buffer_percent() -> u64 {
    DEFAULT_GAS_BUFFER_PERCENT
}

fn default_receipt_timeout_secs() -> u64 {
    DEFAULT_RECEIPT_TIMEOUT.as_secs()
}

fn default_receipt_poll_interval_ms() -> u64 {
    DEFAULT_RECEIPT_POLL_INTERVAL.as_millis() as u64
}

impl AuthorizerConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).wrap_err_with(|| format!("failed to open {path:?}"))?;
        let config: Self = serde_yaml::from_reader(file)
            .wrap_err_with(|| format!("failed to parse {path:?}"))?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> eyre::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if !(MIN_SIGNER_TIMEOUT_SECS..=MAX_SIGNER_TIMEOUT_SECS).contains(&self.signer_timeout_secs) {
            eyre::bail!(
                "signer_timeout_secs must be between {MIN_SIGNER_TIMEOUT_SECS} and {MAX_SIGNER_TIMEOUT_SECS}, got {}",
                self.signer_timeout_secs
            );
        }

        if self.slots.is_empty() {
            eyre::bail!("at least one signer slot is required");
        }

        if self.receipt_poll_interval_ms == 0 {
            eyre::bail!("receipt_poll_interval_ms must be greater than zero");
        }

        for slot in &self.slots {
            if slot.sources.is_empty() {
                eyre::bail!("signer slot {:?} has no sources", slot.label);
            }

            for source in &slot.sources {
                if let SourceConfig::Local { private_key_env } = source {
                    if private_key_env.trim().is_empty() {
                        eyre::bail!("signer slot {:?} has a local source without private_key_env", slot.label);
                    }
                }
            }
        }

        Ok(())
    }

    pub fn signer_timeout(&self) -> Duration {
        Duration::from_secs(self.signer_timeout_secs)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn options(&self) -> AuthorizerOptions {
        AuthorizerOptions { gas_buffer_percent: self.gas_buffer_percent }
    }

    /// Instantiates every configured slot, resolving local keys from the
    /// environment.
    pub fn build_slots(&self) -> eyre::Result<Vec<SignerSlot>> {
        self.slots.iter().map(|slot| slot.build(self.signer_timeout())).collect()
    }
}

impl SlotConfig {
    pub fn build(&self, timeout: Duration) -> eyre::Result<SignerSlot> {
        let sources = self
            .sources
            .iter()
            .enumerate()
            .map(|(index, source)| source.build(&format!("{}#{index}", self.label), timeout))
            .collect::<eyre::Result<Vec<_>>>()?;

        Ok(SignerSlot::new(self.label.clone(), sources))
    }
}

impl SourceConfig {
    pub fn build(&self, name: &str, timeout: Duration) -> eyre::Result<BoxSignatureSource> {
        Ok(match self {
            Self::Local { private_key_env } => {
                Box::new(LocalKeySigner::from_env(name, private_key_env)?)
            }
            Self::Remote { url } => Box::new(HttpSigner::remote(name, url, timeout)?),
            Self::Hardware { url } => Box::new(HttpSigner::hardware(name, url, timeout)?),
        })
    }
}
