use alloy_primitives::{eip191_hash_message, Address, B256};
use tracing::{debug, warn};

use crate::{
    error::{AuthorizationError, Result},
    signature::{SafeSignature, ETH_SIGN_V_OFFSET},
};

/// What a signer actually hashed before signing a Safe transaction digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestScheme {
    /// The 32 digest bytes were signed directly.
    Raw,
    /// The digest was signed as an EIP-191 personal message
    /// (`"\x19Ethereum Signed Message:\n32" ‖ digest`).
    PersonalMessage,
}

/// A signature together with the owner it recovered to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoveredSignature {
    pub signer: Address,
    pub signature: SafeSignature,
    pub scheme: DigestScheme,
}

impl RecoveredSignature {
    /// The signature in the form `execTransaction` verifies. Personal-message
    /// signatures get the `eth_sign` recovery id (`v + 4`).
    pub fn contract_signature(&self) -> SafeSignature {
        match self.scheme {
            DigestScheme::Raw => self.signature,
            DigestScheme::PersonalMessage => SafeSignature::new(
                self.signature.r(),
                self.signature.s(),
                self.signature.v() + ETH_SIGN_V_OFFSET,
            ),
        }
    }
}

/// Recovers the owner that produced `signature` over `digest`.
///
/// Local keys sign the raw digest while some hardware and SDK signers sign it
/// as a personal message, so both are tried. Whichever recovers to a member of
/// `owners` wins. If both recover to (different) owners the raw digest is
/// preferred, since that is what the Safe contract verifies for `v ∈ {27, 28}`.
pub fn recover(
    digest: &B256,
    signature: &SafeSignature,
    owners: &[Address],
) -> Result<RecoveredSignature> {
    let raw = signature.recover_address_from_prehash(digest)?;
    let message = signature.recover_address_from_prehash(&eip191_hash_message(digest))?;

    let raw_is_owner = owners.contains(&raw);
    let message_is_owner = owners.contains(&message);

    let (signer, scheme) = match (raw_is_owner, message_is_owner) {
        (true, true) if raw != message => {
            warn!(raw = %raw, message = %message, "signature recovers to two owners, using raw digest");
            (raw, DigestScheme::Raw)
        }
        (true, _) => (raw, DigestScheme::Raw),
        (false, true) => (message, DigestScheme::PersonalMessage),
        (false, false) => {
            debug!(raw = %raw, message = %message, "signature recovers to no owner");
            return Err(AuthorizationError::SignerNotAuthorized { recovered: Some(raw) });
        }
    };

    Ok(RecoveredSignature { signer, signature: *signature, scheme })
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::keccak256;
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    fn digest() -> B256 {
        keccak256("SafeTx")
    }

    #[test]
    fn recovers_raw_digest_signature() {
        let owner = PrivateKeySigner::random();
        let sig: SafeSignature = owner.sign_hash_sync(&digest()).unwrap().into();

        let recovered = recover(&digest(), &sig, &[Address::repeat_byte(1), owner.address()]).unwrap();

        assert_eq!(recovered.signer, owner.address());
        assert_eq!(recovered.scheme, DigestScheme::Raw);
    }

    #[test]
    fn recovers_personal_message_signature() {
        let owner = PrivateKeySigner::random();
        let sig: SafeSignature = owner.sign_message_sync(digest().as_slice()).unwrap().into();

        let recovered = recover(&digest(), &sig, &[owner.address()]).unwrap();

        assert_eq!(recovered.signer, owner.address());
        assert_eq!(recovered.scheme, DigestScheme::PersonalMessage);
    }

    #[test]
    fn contract_signature_marks_personal_message() {
        let owner = PrivateKeySigner::random();
        let raw: SafeSignature = owner.sign_hash_sync(&digest()).unwrap().into();
        let message: SafeSignature = owner.sign_message_sync(digest().as_slice()).unwrap().into();

        let raw = recover(&digest(), &raw, &[owner.address()]).unwrap();
        let message = recover(&digest(), &message, &[owner.address()]).unwrap();

        assert_eq!(raw.contract_signature(), raw.signature);
        assert_eq!(message.contract_signature().v(), message.signature.v() + 4);
        assert_eq!(message.contract_signature().r(), message.signature.r());
    }

    #[test]
    fn rejects_non_owner() {
        let owner = PrivateKeySigner::random();
        let stranger = PrivateKeySigner::random();
        let sig: SafeSignature = stranger.sign_hash_sync(&digest()).unwrap().into();

        let err = recover(&digest(), &sig, &[owner.address()]).unwrap_err();

        assert!(matches!(
            err,
            AuthorizationError::SignerNotAuthorized { recovered: Some(addr) } if addr == stranger.address()
        ));
    }

    #[test]
    fn prefers_raw_digest_when_both_match() {
        let owner = PrivateKeySigner::random();
        let sig: SafeSignature = owner.sign_hash_sync(&digest()).unwrap().into();

        // Whoever the personal-message interpretation points at, make them an
        // owner too.
        let other = sig.recover_address_from_prehash(&eip191_hash_message(digest())).unwrap();

        let recovered = recover(&digest(), &sig, &[other, owner.address()]).unwrap();

        assert_eq!(recovered.signer, owner.address());
        assert_eq!(recovered.scheme, DigestScheme::Raw);
    }

    #[test]
    fn signature_over_other_digest_is_rejected() {
        let owner = PrivateKeySigner::random();
        let sig: SafeSignature = owner.sign_hash_sync(&keccak256("other")).unwrap().into();

        assert!(recover(&digest(), &sig, &[owner.address()]).is_err());
    }
}
