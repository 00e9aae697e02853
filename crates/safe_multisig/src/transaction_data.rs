use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use std::str::FromStr;

use crate::error::{AuthorizationError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    #[default]
    Call = 0,
    DelegateCall = 1,
}

impl From<OperationType> for u8 {
    fn from(op: OperationType) -> Self {
        op as u8
    }
}

/// A transfer or call as requested by a caller, before any validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransactionRequest {
    pub to: String,
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
}

impl SafeTransactionRequest {
    pub fn new(to: impl Into<String>, value: U256, data: Bytes) -> Self {
        Self { to: to.into(), value, data }
    }

    /// Checks the request and turns it into a typed meta transaction.
    /// Zero-value requests are rejected.
    pub fn validate(&self) -> Result<SafeMetaTransaction> {
        let to = parse_recipient(self.to.trim()).map_err(|e| {
            AuthorizationError::InvalidRequest(format!("invalid recipient {:?}: {e}", self.to))
        })?;

        if self.value.is_zero() {
            return Err(AuthorizationError::InvalidRequest(
                "transaction value must be greater than zero".to_string(),
            ));
        }

        Ok(SafeMetaTransaction { to, value: self.value, input: self.data.clone() })
    }
}

/// Mixed-case input must carry a valid EIP-55 checksum, single-case input is
/// taken as is.
fn parse_recipient(to: &str) -> std::result::Result<Address, String> {
    let hex = to.strip_prefix("0x").unwrap_or(to);
    let mixed_case = hex.chars().any(|c| c.is_ascii_lowercase())
        && hex.chars().any(|c| c.is_ascii_uppercase());

    if mixed_case {
        Address::parse_checksummed(format!("0x{hex}"), None).map_err(|e| e.to_string())
    } else {
        Address::from_str(to).map_err(|e| e.to_string())
    }
}

/// The inner call a Safe transaction performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeMetaTransaction {
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

/// The Safe transaction exactly as the contract hashes and executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransactionData {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: u8,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: U256,
}

impl SafeTransactionData {
    /// A plain call with no gas refund, as the wallet SDK builds it.
    pub fn call(meta: &SafeMetaTransaction, nonce: U256) -> Self {
        Self {
            to: meta.to,
            value: meta.value,
            data: meta.input.clone(),
            operation: OperationType::Call.into(),
            safe_tx_gas: U256::ZERO,
            base_gas: U256::ZERO,
            gas_price: U256::ZERO,
            gas_token: Address::ZERO,
            refund_receiver: Address::ZERO,
            nonce,
        }
    }
}

/// A Safe transaction with the owner signatures authorizing it.
///
/// The digest is the one produced when the record was created and is never
/// recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedSafeTransaction {
    record: SafeTransactionData,
    digest: B256,
    packed_signatures: Bytes,
}

impl SignedSafeTransaction {
    pub const fn new(record: SafeTransactionData, digest: B256, packed_signatures: Bytes) -> Self {
        Self { record, digest, packed_signatures }
    }

    pub const fn record(&self) -> &SafeTransactionData {
        &self.record
    }

    pub const fn digest(&self) -> &B256 {
        &self.digest
    }

    pub const fn packed_signatures(&self) -> &Bytes {
        &self.packed_signatures
    }

    pub fn into_parts(self) -> (SafeTransactionData, B256, Bytes) {
        (self.record, self.digest, self.packed_signatures)
    }
}

/// `execTransaction` calldata ready to be sent to the Safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableSafeTransaction {
    pub safe_address: Address,
    pub input_data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}
