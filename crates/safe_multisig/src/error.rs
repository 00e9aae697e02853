use alloy_primitives::Address;

use crate::orchestrator::RoundState;

pub type Result<T, E = AuthorizationError> = std::result::Result<T, E>;

/// Errors raised while authorizing a Safe transaction.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    #[error("invalid transaction request: {0}")]
    InvalidRequest(String),

    #[error("signer {signer} is unavailable: {reason}")]
    SignerUnavailable { signer: String, reason: String },

    #[error("signature does not recover to an owner (recovered: {recovered:?})")]
    SignerNotAuthorized { recovered: Option<Address> },

    #[error("not enough valid owner signatures (have {have}, need {need})")]
    InsufficientSignatures { have: usize, need: usize },

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("invalid owner set: {0}")]
    InvalidOwnerSet(String),

    #[error("round is {actual:?}, expected {expected:?}")]
    InvalidState { expected: RoundState, actual: RoundState },

    #[error("wallet query failed: {0:#}")]
    Wallet(eyre::Report),
}

impl AuthorizationError {
    /// Per-signature failures. These are logged and dropped and only matter
    /// once they push a round below its threshold.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SignerUnavailable { .. } | Self::SignerNotAuthorized { .. } | Self::MalformedSignature(_)
        )
    }

    pub(crate) fn unavailable(signer: impl Into<String>, reason: impl ToString) -> Self {
        Self::SignerUnavailable { signer: signer.into(), reason: reason.to_string() }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn recoverable_errors() {
        assert!(AuthorizationError::unavailable("tpm", "timeout").is_recoverable());
        assert!(AuthorizationError::SignerNotAuthorized { recovered: None }.is_recoverable());
        assert!(AuthorizationError::MalformedSignature("short".into()).is_recoverable());

        assert!(!AuthorizationError::InsufficientSignatures { have: 1, need: 2 }.is_recoverable());
        assert!(!AuthorizationError::ExecutionFailed("reverted".into()).is_recoverable());
        assert!(!AuthorizationError::InvalidRequest("zero value".into()).is_recoverable());
    }

    #[test]
    fn insufficient_signatures_message() {
        let err = AuthorizationError::InsufficientSignatures { have: 1, need: 2 };
        assert_eq!(err.to_string(), "not enough valid owner signatures (have 1, need 2)");
    }
}
