use alloy_primitives::{Bytes, U256};
use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use colored::Colorize;
use eyre::WrapErr;
use safe_multisig::{AuthorizationRound, Authorizer, AuthorizerConfig, SafeTransactionRequest};

use std::str::FromStr;

use crate::utils::connect;

#[derive(Debug, Parser)]
#[clap(about = "Creates a Safe transaction, collects owner signatures and executes it.")]
pub struct AuthorizeCommand {
    #[arg(long, value_name = "ADDRESS", help = "Recipient of the transaction.")]
    to: String,

    #[arg(long, value_name = "WEI", help = "Amount of wei to send.")]
    value: U256,

    #[arg(long, value_name = "HEX", default_value = "0x", help = "Calldata of the inner call.")]
    data: Bytes,

    #[arg(
        long,
        value_name = "VAR",
        default_value = "EXECUTOR_PK",
        help = "Environment variable holding the executor's private key."
    )]
    executor_key_env: String,
}

impl AuthorizeCommand {
    pub async fn execute(self, config: AuthorizerConfig) -> eyre::Result<()> {
        let Self { to, value, data, executor_key_env } = self;

        let executor_key = std::env::var(&executor_key_env)
            .wrap_err_with(|| format!("{executor_key_env} is not set"))?;
        let executor = PrivateKeySigner::from_str(executor_key.trim())
            .wrap_err("invalid executor private key")?;

        let safe = connect(&config).await?;
        let authorizer = Authorizer::new(safe, config.build_slots()?, config.options());

        let request = SafeTransactionRequest::new(to, value, data);

        let mut round = authorizer.create(&request).await?;
        print_round(&round);

        let collected = authorizer.collect_signatures(&mut round).await?;
        for sig in collected {
            println!("  {} signed by {} ({})", sig.slot, sig.source, sig.kind);
        }

        let signed = authorizer.validate_and_pack(&mut round).await?;
        println!("{}", format!("Packed signatures: {}", signed.packed_signatures()).bright_cyan());

        let receipt = authorizer.execute(&mut round, signed, &executor).await?;
        println!(
            "{}",
            format!(
                "Transaction {:#x} confirmed in block {}",
                receipt.tx_hash,
                receipt.block_number.map(|b| b.to_string()).unwrap_or_else(|| "?".to_string())
            )
            .bright_green()
        );

        Ok(())
    }
}

fn print_round(round: &AuthorizationRound) {
    let record = round.record();
    println!("{}", format!("Safe transaction {}", round.digest()).bright_cyan());
    println!("  to:    {}", record.to);
    println!("  value: {}", record.value);
    println!("  nonce: {}", record.nonce);
}
