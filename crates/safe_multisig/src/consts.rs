use std::time::Duration;

use chains::{mainnet, sepolia};

pub mod chains {
    pub mod mainnet {
        pub const CHAIN_ID: u64 = 1;

        pub const NAME: &str = "mainnet";
    }

    pub mod sepolia {
        pub const CHAIN_ID: u64 = 11155111;

        pub const NAME: &str = "sepolia";
    }
}

/// Timeout applied to every remote or hardware signer request.
pub const DEFAULT_SIGNER_TIMEOUT: Duration = Duration::from_secs(8);

/// Signer timeouts outside this range are rejected when loading configuration.
pub const MIN_SIGNER_TIMEOUT_SECS: u64 = 1;
pub const MAX_SIGNER_TIMEOUT_SECS: u64 = 30;

/// Headroom added on top of the node's gas estimate for `execTransaction`.
pub const DEFAULT_GAS_BUFFER_PERCENT: u64 = 20;

pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub fn chain_name(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        mainnet::CHAIN_ID => Some(mainnet::NAME),
        sepolia::CHAIN_ID => Some(sepolia::NAME),
        _ => None,
    }
}
