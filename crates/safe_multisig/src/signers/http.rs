use alloy_primitives::{hex, Address, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use std::time::Duration;

use super::{SignatureSource, SignerKind};
use crate::{
    error::{AuthorizationError, Result},
    signature::SafeSignature,
};

/// Signs through an HTTP signing service.
///
/// Both the remote signing service and the hardware signing agent speak the
/// same protocol (`POST /sign`, `GET /address`), so one client serves both.
/// Every call is bounded by the configured timeout; transport errors,
/// timeouts and non-2xx answers all surface as `SignerUnavailable`.
#[derive(Debug, Clone)]
pub struct HttpSigner {
    name: String,
    kind: SignerKind,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    digest_hex: String,
    /// Field name the hardware signing agent reads.
    tx_hash_hex: String,
}

/// Response of `POST /sign`. The hardware agent fills every field, simpler
/// services may return just `signature`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub signature_with_v: Option<String>,
    #[serde(default)]
    pub v: Option<u8>,
    #[serde(default)]
    pub r: Option<String>,
    #[serde(default)]
    pub s: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    address: Address,
}

impl SignResponse {
    pub fn into_signature(self) -> Result<SafeSignature> {
        if let Some(sig) = self.signature_with_v {
            return SafeSignature::from_hex(&sig, None);
        }

        if let Some(sig) = self.signature {
            return SafeSignature::from_hex(&sig, self.v);
        }

        match (self.r, self.s) {
            (Some(r), Some(s)) => {
                let mut bytes = decode_word(&r)?.to_vec();
                bytes.extend_from_slice(decode_word(&s)?.as_slice());
                SafeSignature::from_slice(&bytes, self.v)
            }
            _ => Err(AuthorizationError::MalformedSignature(
                "response carries no signature".to_string(),
            )),
        }
    }
}

fn decode_word(value: &str) -> Result<B256> {
    let bytes =
        hex::decode(value).map_err(|e| AuthorizationError::MalformedSignature(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(AuthorizationError::MalformedSignature(format!(
            "expected 32-byte component, got {}",
            bytes.len()
        )));
    }
    Ok(B256::from_slice(&bytes))
}

impl HttpSigner {
    pub fn new(
        name: impl Into<String>,
        kind: SignerKind,
        base_url: &Url,
        timeout: Duration,
    ) -> eyre::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            name: name.into(),
            kind,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn remote(name: impl Into<String>, base_url: &Url, timeout: Duration) -> eyre::Result<Self> {
        Self::new(name, SignerKind::Remote, base_url, timeout)
    }

    pub fn hardware(
        name: impl Into<String>,
        base_url: &Url,
        timeout: Duration,
    ) -> eyre::Result<Self> {
        Self::new(name, SignerKind::Hardware, base_url, timeout)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn unavailable(&self, reason: impl ToString) -> AuthorizationError {
        AuthorizationError::unavailable(&self.name, reason)
    }

    async fn checked(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(self.unavailable(format!("{status}: {}", text.trim())))
    }
}

#[async_trait]
impl SignatureSource for HttpSigner {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> SignerKind {
        self.kind
    }

    async fn address(&self) -> Result<Address> {
        let response = self
            .client
            .get(self.endpoint("address"))
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let AddressResponse { address } = self
            .checked(response)
            .await?
            .json()
            .await
            .map_err(|e| self.unavailable(e))?;

        Ok(address)
    }

    async fn sign(&self, digest: &B256) -> Result<SafeSignature> {
        let digest_hex = digest.to_string();
        let body = SignRequest { digest_hex: digest_hex.clone(), tx_hash_hex: digest_hex };

        debug!(signer = %self.name, kind = %self.kind, %digest, "requesting signature");

        let response = self
            .client
            .post(self.endpoint("sign"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let response: SignResponse = self
            .checked(response)
            .await?
            .json()
            .await
            .map_err(|e| self.unavailable(e))?;

        if let Some(warning) = &response.warning {
            warn!(signer = %self.name, %warning, "signer returned a warning");
        }

        response.into_signature()
    }
}
