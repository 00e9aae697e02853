use alloy_provider::{ProviderBuilder, RootProvider};
use alloy_transport_http::Http;
use safe_multisig::{consts::chain_name, AuthorizerConfig, OnchainSafe, SafeWallet};
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::path::Path;

pub type HttpTransport = Http<reqwest::Client>;

pub type HttpSafe = OnchainSafe<RootProvider<HttpTransport>, HttpTransport>;

/// Installs the global tracing subscriber. `RUST_LOG` wins over `debug`.
pub fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

pub fn load_config(path: &Path) -> eyre::Result<AuthorizerConfig> {
    AuthorizerConfig::from_yaml_file(path)
}

/// Connects to the configured Safe and checks the node serves the expected chain.
pub async fn connect(config: &AuthorizerConfig) -> eyre::Result<HttpSafe> {
    let provider = ProviderBuilder::new().on_http(config.rpc_url.clone());

    let safe = OnchainSafe::<_, HttpTransport>::new(provider, config.safe_address)
        .await?
        .with_receipt_timeout(config.receipt_timeout(), config.receipt_poll_interval());

    if safe.chain_id() != config.chain_id {
        eyre::bail!(
            "RPC node is on chain {}, configuration expects {}",
            safe.chain_id(),
            config.chain_id
        );
    }

    info!(
        safe = %config.safe_address,
        chain = chain_name(config.chain_id).unwrap_or("unknown"),
        "connected"
    );

    Ok(safe)
}
