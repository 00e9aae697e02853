use alloy_primitives::B256;
use tracing::{debug, error, warn};

use super::{BoxSignatureSource, SignerKind};
use crate::signature::SafeSignature;

/// One logical co-signer, backed by an ordered list of sources.
///
/// The first source is the primary; the rest are tried in order when the
/// previous one cannot produce a signature. A hardware signer backed by a
/// local key for the same owner is the typical setup.
pub struct SignerSlot {
    label: String,
    sources: Vec<BoxSignatureSource>,
}

/// A signature collected for a slot, with the source that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotSignature {
    pub slot: String,
    pub source: String,
    pub kind: SignerKind,
    pub signature: SafeSignature,
}

impl SignerSlot {
    pub fn new(label: impl Into<String>, sources: Vec<BoxSignatureSource>) -> Self {
        Self { label: label.into(), sources }
    }

    pub fn single(label: impl Into<String>, source: BoxSignatureSource) -> Self {
        Self::new(label, vec![source])
    }

    /// Appends a fallback source.
    pub fn with_fallback(mut self, source: BoxSignatureSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sources(&self) -> &[BoxSignatureSource] {
        &self.sources
    }

    /// Asks each source in turn, returning the first signature produced.
    /// Only recoverable errors move on to the next source. `None` once every
    /// source has failed or one failed for good.
    pub async fn sign(&self, digest: &B256) -> Option<SlotSignature> {
        for source in &self.sources {
            let name = source.name();

            match source.sign(digest).await {
                Ok(signature) => {
                    debug!(slot = %self.label, source = %name, "collected signature");
                    return Some(SlotSignature {
                        slot: self.label.clone(),
                        source: name,
                        kind: source.kind(),
                        signature,
                    });
                }
                Err(e) if e.is_recoverable() => {
                    warn!(slot = %self.label, source = %name, error = %e, "signer failed, trying next source");
                }
                Err(e) => {
                    error!(slot = %self.label, source = %name, error = %e, "signer failed, abandoning slot");
                    return None;
                }
            }
        }

        None
    }
}

impl std::fmt::Debug for SignerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerSlot")
            .field("label", &self.label)
            .field("sources", &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::AuthorizationError,
        signers::{LocalKeySigner, MockSignatureSource},
    };
    use alloy_primitives::keccak256;
    use alloy_signer_local::PrivateKeySigner;

    fn unavailable_hardware() -> MockSignatureSource {
        let mut hardware = MockSignatureSource::new();
        hardware.expect_name().return_const("tpm".to_string());
        hardware.expect_kind().return_const(SignerKind::Hardware);
        hardware
            .expect_sign()
            .times(1)
            .returning(|_| Err(AuthorizationError::unavailable("tpm", "timed out")));
        hardware
    }

    #[tokio::test]
    async fn primary_source_wins() {
        let key = PrivateKeySigner::random();
        let mut unused = MockSignatureSource::new();
        unused.expect_sign().never();

        let slot = SignerSlot::single("owner-1", Box::new(LocalKeySigner::new("key-1", key.clone())))
            .with_fallback(Box::new(unused));

        let collected = slot.sign(&keccak256("tx")).await.unwrap();

        assert_eq!(collected.source, "key-1");
        assert_eq!(collected.kind, SignerKind::Local);
        assert_eq!(
            collected.signature.recover_address_from_prehash(&keccak256("tx")).unwrap(),
            key.address()
        );
    }

    #[tokio::test]
    async fn falls_back_when_primary_unavailable() {
        let key = PrivateKeySigner::random();
        let slot = SignerSlot::single("owner-2", Box::new(unavailable_hardware()))
            .with_fallback(Box::new(LocalKeySigner::new("backup-key", key)));

        let collected = slot.sign(&keccak256("tx")).await.unwrap();

        assert_eq!(collected.slot, "owner-2");
        assert_eq!(collected.source, "backup-key");
    }

    #[tokio::test]
    async fn exhausted_slot_yields_nothing() {
        let slot = SignerSlot::single("owner-2", Box::new(unavailable_hardware()));

        assert!(slot.sign(&keccak256("tx")).await.is_none());
    }

    #[tokio::test]
    async fn fatal_error_stops_fallback() {
        let mut broken = MockSignatureSource::new();
        broken.expect_name().return_const("broken".to_string());
        broken
            .expect_sign()
            .times(1)
            .returning(|_| Err(AuthorizationError::InvalidRequest("digest rejected".into())));
        let mut backup = MockSignatureSource::new();
        backup.expect_name().return_const("backup".to_string());
        backup.expect_sign().never();

        let slot = SignerSlot::single("owner-3", Box::new(broken)).with_fallback(Box::new(backup));

        assert!(slot.sign(&keccak256("tx")).await.is_none());
    }
}
