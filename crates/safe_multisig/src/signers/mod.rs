use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::{error::Result, signature::SafeSignature};

pub use http::HttpSigner;
pub use local::LocalKeySigner;
pub use slot::{SignerSlot, SlotSignature};

mod http;
mod local;
mod slot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerKind {
    /// Key material held in process memory.
    Local,
    /// A signing service reached over the network.
    Remote,
    /// A co-process keeping the key inside a hardware security boundary.
    Hardware,
}

impl fmt::Display for SignerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
            Self::Hardware => f.write_str("hardware"),
        }
    }
}

/// Something that can sign a Safe transaction digest.
///
/// Implementations convert whatever their backend returns into a
/// [`SafeSignature`] once, at this boundary. Failing to produce one is reported
/// as [`AuthorizationError::SignerUnavailable`](crate::AuthorizationError) or
/// [`AuthorizationError::MalformedSignature`](crate::AuthorizationError), both
/// of which let the caller fall back to another source.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait SignatureSource: Send + Sync {
    fn name(&self) -> String;

    fn kind(&self) -> SignerKind;

    /// Address the source signs for.
    async fn address(&self) -> Result<Address>;

    async fn sign(&self, digest: &B256) -> Result<SafeSignature>;
}

pub type BoxSignatureSource = Box<dyn SignatureSource>;
