use alloy_primitives::{Address, Bytes, U256};
use clap::Parser;
use safe_multisig::{
    eip712::safe_tx_hash, transaction_data::SafeTransactionData, AuthorizerConfig,
    SafeTransactionRequest,
};

#[derive(Debug, Parser)]
#[clap(about = "Computes the EIP-712 digest of a Safe transaction without touching the chain.")]
pub struct DigestCommand {
    #[arg(long, value_name = "ADDRESS", help = "Recipient of the transaction.")]
    to: String,

    #[arg(long, value_name = "WEI", help = "Amount of wei to send.")]
    value: U256,

    #[arg(long, value_name = "HEX", default_value = "0x", help = "Calldata of the inner call.")]
    data: Bytes,

    #[arg(long, help = "Safe nonce the transaction will use.")]
    nonce: U256,

    #[arg(long, value_name = "ADDRESS", help = "Overrides the Safe from the configuration.")]
    safe: Option<Address>,
}

impl DigestCommand {
    pub fn execute(self, config: AuthorizerConfig) -> eyre::Result<()> {
        let Self { to, value, data, nonce, safe } = self;

        let meta = SafeTransactionRequest::new(to, value, data).validate()?;
        let record = SafeTransactionData::call(&meta, nonce);
        let safe = safe.unwrap_or(config.safe_address);

        println!("{}", safe_tx_hash(&record, config.chain_id, safe));

        Ok(())
    }
}
