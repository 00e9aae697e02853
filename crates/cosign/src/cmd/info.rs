use clap::Parser;
use colored::Colorize;
use safe_multisig::{AuthorizerConfig, SafeWallet};

use crate::utils::connect;

#[derive(Debug, Parser)]
#[clap(about = "Shows version, owners, threshold and nonce of the configured Safe.")]
pub struct InfoCommand {}

impl InfoCommand {
    pub async fn execute(self, config: AuthorizerConfig) -> eyre::Result<()> {
        let safe = connect(&config).await?;

        let version = safe.version().await?;
        let owners = safe.get_owners().await?;
        let threshold = safe.get_threshold().await?;
        let nonce = safe.get_nonce().await?;

        println!("{}", format!("Safe {} (v{version})", safe.address()).bright_cyan());
        println!("  threshold: {threshold} of {}", owners.len());
        println!("  nonce:     {nonce}");
        for owner in owners {
            println!("  owner:     {owner}");
        }

        Ok(())
    }
}
