pub mod aggregator;
pub mod calls;
pub mod config;
pub mod consts;
pub mod eip712;
pub mod error;
pub mod orchestrator;
pub mod recovery;
pub mod signature;
pub mod signers;
pub mod transaction_data;
pub mod wallet;

mod contracts;
#[cfg(test)]
mod test_utils;

pub use aggregator::{aggregate, OwnerSet};
pub use config::AuthorizerConfig;
pub use error::{AuthorizationError, Result};
pub use orchestrator::{AuthorizationRound, Authorizer, AuthorizerOptions, RoundState};
pub use recovery::{recover, DigestScheme, RecoveredSignature};
pub use signature::{normalize_recovery_id, pack, SafeSignature};
pub use signers::{HttpSigner, LocalKeySigner, SignatureSource, SignerKind, SignerSlot};
pub use transaction_data::{
    ExecutionReceipt, SafeTransactionData, SafeTransactionRequest, SignedSafeTransaction,
};
pub use wallet::{OnchainSafe, SafeWallet};
