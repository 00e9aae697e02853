use alloy_primitives::{Address, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use eyre::WrapErr;

use std::{fmt, str::FromStr};

use super::{SignatureSource, SignerKind};
use crate::{
    error::{AuthorizationError, Result},
    signature::SafeSignature,
};

/// Signs with a private key held in memory.
///
/// The digest bytes are signed as-is, without the personal message prefix,
/// which is what the Safe contract verifies for `v ∈ {27, 28}`.
pub struct LocalKeySigner {
    name: String,
    signer: PrivateKeySigner,
}

impl LocalKeySigner {
    pub fn new(name: impl Into<String>, signer: PrivateKeySigner) -> Self {
        Self { name: name.into(), signer }
    }

    pub fn from_private_key(name: impl Into<String>, key: &str) -> eyre::Result<Self> {
        let name = name.into();
        let signer = PrivateKeySigner::from_str(key.trim())
            .wrap_err_with(|| format!("invalid private key for signer {name}"))?;
        Ok(Self { name, signer })
    }

    /// Reads the hex private key from the environment variable `var`.
    pub fn from_env(name: impl Into<String>, var: &str) -> eyre::Result<Self> {
        let key = std::env::var(var).wrap_err_with(|| format!("{var} is not set"))?;
        Self::from_private_key(name, &key)
    }

    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }
}

impl fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("name", &self.name)
            .field("address", &self.signer.address())
            .finish()
    }
}

#[async_trait]
impl SignatureSource for LocalKeySigner {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> SignerKind {
        SignerKind::Local
    }

    async fn address(&self) -> Result<Address> {
        Ok(self.signer.address())
    }

    async fn sign(&self, digest: &B256) -> Result<SafeSignature> {
        let signature = self
            .signer
            .sign_hash_sync(digest)
            .map_err(|e| AuthorizationError::unavailable(&self.name, e))?;

        SafeSignature::from_slice(&signature.as_bytes(), None)
    }
}
