use alloy_primitives::{hex, Address, Bytes, PrimitiveSignature, B256, U256};

use std::{fmt, str::FromStr};

use crate::error::{AuthorizationError, Result};

/// Length of a packed `r ‖ s ‖ v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Length of an `r ‖ s` signature whose recovery id travels out of band.
pub const COMPACT_SIGNATURE_LENGTH: usize = 64;

/// Offset added to raw ECDSA recovery ids (`0`/`1`) by the `{27, 28}` convention.
const RECOVERY_ID_OFFSET: u8 = 27;

/// Added to `v` for signatures over the EIP-191 wrapped digest. Safe reads
/// `v > 30` as "recover against `eth_sign` of the digest".
pub const ETH_SIGN_V_OFFSET: u8 = 4;

/// An ECDSA signature as Safe contracts consume it.
///
/// Values are normalized to the `{27, 28}` recovery id convention on every
/// decode, so anything produced by [`SafeSignature::from_slice`] is ready for
/// recovery and packing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SafeSignature {
    r: B256,
    s: B256,
    v: u8,
}

impl SafeSignature {
    pub const fn new(r: B256, s: B256, v: u8) -> Self {
        Self { r, s, v }
    }

    pub const fn r(&self) -> B256 {
        self.r
    }

    pub const fn s(&self) -> B256 {
        self.s
    }

    pub const fn v(&self) -> u8 {
        self.v
    }

    /// Decodes either wire width: 65 bytes `r ‖ s ‖ v`, or 64 bytes `r ‖ s`
    /// with `v` supplied separately. An explicit `v` always wins over a
    /// trailing byte.
    pub fn from_slice(bytes: &[u8], v: Option<u8>) -> Result<Self> {
        let v = match (bytes.len(), v) {
            (SIGNATURE_LENGTH, Some(v)) => v,
            (SIGNATURE_LENGTH, None) => bytes[64],
            (COMPACT_SIGNATURE_LENGTH, Some(v)) => v,
            (COMPACT_SIGNATURE_LENGTH, None) => {
                return Err(AuthorizationError::MalformedSignature(
                    "64-byte signature without a recovery id".to_string(),
                ))
            }
            (len, _) => {
                return Err(AuthorizationError::MalformedSignature(format!(
                    "expected {COMPACT_SIGNATURE_LENGTH} or {SIGNATURE_LENGTH} bytes, got {len}"
                )))
            }
        };

        let sig = Self {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
            v,
        };

        Ok(normalize_recovery_id(sig))
    }

    pub fn from_hex(value: &str, v: Option<u8>) -> Result<Self> {
        let bytes = hex::decode(value.trim())
            .map_err(|e| AuthorizationError::MalformedSignature(e.to_string()))?;
        Self::from_slice(&bytes, v)
    }

    pub fn as_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(self.r.as_slice());
        out[32..64].copy_from_slice(self.s.as_slice());
        out[64] = self.v;
        out
    }

    /// y-parity of the signature. Only the `{27, 28}` convention is accepted.
    pub fn y_parity(&self) -> Result<bool> {
        match self.v {
            27 => Ok(false),
            28 => Ok(true),
            v => Err(AuthorizationError::MalformedSignature(format!(
                "unsupported recovery id {v}"
            ))),
        }
    }

    /// Recovers the address that signed `hash` exactly as given, with no
    /// further hashing.
    pub fn recover_address_from_prehash(&self, hash: &B256) -> Result<Address> {
        let sig = PrimitiveSignature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            self.y_parity()?,
        );

        sig.recover_address_from_prehash(hash)
            .map_err(|e| AuthorizationError::MalformedSignature(e.to_string()))
    }
}

impl fmt::Debug for SafeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_prefixed(self.as_bytes()))
    }
}

impl fmt::Display for SafeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for SafeSignature {
    type Err = AuthorizationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s, None)
    }
}

impl From<PrimitiveSignature> for SafeSignature {
    fn from(sig: PrimitiveSignature) -> Self {
        Self {
            r: B256::from(sig.r().to_be_bytes::<32>()),
            s: B256::from(sig.s().to_be_bytes::<32>()),
            v: RECOVERY_ID_OFFSET + sig.v() as u8,
        }
    }
}

/// Rewrites a raw ECDSA recovery id (`0`/`1`) into the `{27, 28}` convention.
/// Any other value passes through untouched.
pub fn normalize_recovery_id(sig: SafeSignature) -> SafeSignature {
    match sig.v {
        0 | 1 => SafeSignature { v: sig.v + RECOVERY_ID_OFFSET, ..sig },
        _ => sig,
    }
}

/// Concatenates `r ‖ s ‖ v` of every signature in the order given, with no
/// separators. Ordering is the caller's responsibility.
///
/// Accepts `v` in `{27, 28}` and its `eth_sign` form `{31, 32}`.
pub fn pack(signatures: &[(Address, SafeSignature)]) -> Result<Bytes> {
    let mut packed = Vec::with_capacity(signatures.len() * SIGNATURE_LENGTH);

    for (signer, signature) in signatures {
        let signature = normalize_recovery_id(*signature);
        if !matches!(signature.v, 27 | 28 | 31 | 32) {
            return Err(AuthorizationError::MalformedSignature(format!(
                "signature from {signer} has recovery id {}",
                signature.v
            )));
        }
        packed.extend_from_slice(&signature.as_bytes());
    }

    Ok(packed.into())
}
