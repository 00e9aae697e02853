use alloy_primitives::{Address, Bytes, B256};
use tracing::{debug, warn};

use std::collections::HashSet;

use crate::{
    error::{AuthorizationError, Result},
    recovery::{recover, RecoveredSignature},
    signature::{pack, SafeSignature},
};

/// The wallet's owner roster and quorum, as read for a single round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerSet {
    owners: Vec<Address>,
    threshold: usize,
}

impl OwnerSet {
    pub fn new(owners: Vec<Address>, threshold: usize) -> Result<Self> {
        let mut seen = HashSet::with_capacity(owners.len());
        if let Some(dup) = owners.iter().find(|owner| !seen.insert(**owner)) {
            return Err(AuthorizationError::InvalidOwnerSet(format!("duplicate owner {dup}")));
        }

        if threshold == 0 || threshold > owners.len() {
            return Err(AuthorizationError::InvalidOwnerSet(format!(
                "threshold {threshold} with {} owners",
                owners.len()
            )));
        }

        Ok(Self { owners, threshold })
    }

    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.owners.contains(address)
    }
}

/// Turns a bag of signatures into the packed blob `execTransaction` expects.
///
/// Signatures that fail recovery or do not belong to an owner are dropped,
/// and only the first signature per owner counts. The survivors are sorted by
/// signer address ascending, which the Safe contract requires. Signatures over
/// the personal-message digest are packed with the `eth_sign` recovery id.
pub fn aggregate(digest: &B256, signatures: &[SafeSignature], owners: &OwnerSet) -> Result<Bytes> {
    let valid = recover_valid(digest, signatures, owners);

    if valid.len() < owners.threshold() {
        return Err(AuthorizationError::InsufficientSignatures {
            have: valid.len(),
            need: owners.threshold(),
        });
    }

    let mut sorted: Vec<(Address, SafeSignature)> =
        valid.iter().map(|r| (r.signer, r.contract_signature())).collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    debug!(signers = ?sorted.iter().map(|(a, _)| a).collect::<Vec<_>>(), "packing signatures");

    pack(&sorted)
}

/// Recovers every signature against the owner set, keeping the first
/// signature per owner in input order.
pub fn recover_valid(
    digest: &B256,
    signatures: &[SafeSignature],
    owners: &OwnerSet,
) -> Vec<RecoveredSignature> {
    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(signatures.len());

    for (index, signature) in signatures.iter().enumerate() {
        match recover(digest, signature, owners.owners()) {
            Ok(recovered) if seen.insert(recovered.signer) => valid.push(recovered),
            Ok(recovered) => {
                warn!(index, signer = %recovered.signer, "dropping duplicate signature");
            }
            Err(e) => warn!(index, error = %e, "dropping signature"),
        }
    }

    valid
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::signature::SIGNATURE_LENGTH;
    use alloy_primitives::{eip191_hash_message, keccak256};
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    struct Fixture {
        digest: B256,
        low: PrivateKeySigner,
        high: PrivateKeySigner,
        third: PrivateKeySigner,
    }

    impl Fixture {
        fn new() -> Self {
            let mut keys: Vec<_> = (0..3).map(|_| PrivateKeySigner::random()).collect();
            keys.sort_by_key(|k| k.address());
            let third = keys.pop().unwrap();
            let high = keys.pop().unwrap();
            let low = keys.pop().unwrap();

            Self { digest: keccak256("transfer 1000000000000000 wei"), low, high, third }
        }

        fn sign(&self, signer: &PrivateKeySigner) -> SafeSignature {
            signer.sign_hash_sync(&self.digest).unwrap().into()
        }

        fn owners(&self, threshold: usize) -> OwnerSet {
            OwnerSet::new(
                vec![self.high.address(), self.third.address(), self.low.address()],
                threshold,
            )
            .unwrap()
        }
    }

    #[test]
    fn owner_set_validation() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);

        assert!(OwnerSet::new(vec![a, b], 2).is_ok());
        assert!(matches!(OwnerSet::new(vec![a, b], 0), Err(AuthorizationError::InvalidOwnerSet(_))));
        assert!(matches!(OwnerSet::new(vec![a, b], 3), Err(AuthorizationError::InvalidOwnerSet(_))));
        assert!(matches!(OwnerSet::new(vec![a, a], 1), Err(AuthorizationError::InvalidOwnerSet(_))));
    }

    #[test]
    fn packs_in_ascending_signer_order() {
        let f = Fixture::new();
        let sig_low = f.sign(&f.low);
        let sig_high = f.sign(&f.high);

        let packed = aggregate(&f.digest, &[sig_high, sig_low], &f.owners(2)).unwrap();

        let mut expected = sig_low.as_bytes().to_vec();
        expected.extend_from_slice(&sig_high.as_bytes());
        assert_eq!(packed.to_vec(), expected);
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let f = Fixture::new();
        let sigs = [f.sign(&f.low), f.sign(&f.high), f.sign(&f.third)];

        let forward = aggregate(&f.digest, &sigs, &f.owners(2)).unwrap();
        let reversed = aggregate(&f.digest, &[sigs[2], sigs[0], sigs[1]], &f.owners(2)).unwrap();

        assert_eq!(forward, reversed);
        assert_eq!(forward.len(), 3 * SIGNATURE_LENGTH);
    }

    #[test]
    fn fails_below_threshold() {
        let f = Fixture::new();

        let err = aggregate(&f.digest, &[f.sign(&f.low)], &f.owners(2)).unwrap_err();

        assert!(matches!(err, AuthorizationError::InsufficientSignatures { have: 1, need: 2 }));
    }

    #[test]
    fn unauthorized_signer_is_dropped() {
        let f = Fixture::new();
        let stranger = PrivateKeySigner::random();

        let err = aggregate(&f.digest, &[f.sign(&stranger), f.sign(&f.high)], &f.owners(2))
            .unwrap_err();

        assert!(matches!(err, AuthorizationError::InsufficientSignatures { have: 1, need: 2 }));
    }

    #[test]
    fn unauthorized_signer_does_not_block_quorum() {
        let f = Fixture::new();
        let stranger = PrivateKeySigner::random();
        let sigs = [f.sign(&stranger), f.sign(&f.high), f.sign(&f.low)];

        let packed = aggregate(&f.digest, &sigs, &f.owners(2)).unwrap();

        assert_eq!(packed.len(), 2 * SIGNATURE_LENGTH);
    }

    #[test]
    fn duplicates_count_once() {
        let f = Fixture::new();
        let sig = f.sign(&f.low);

        let err = aggregate(&f.digest, &[sig, sig], &f.owners(2)).unwrap_err();
        assert!(matches!(err, AuthorizationError::InsufficientSignatures { have: 1, need: 2 }));

        let valid = recover_valid(&f.digest, &[sig, f.sign(&f.high), sig], &f.owners(2));
        assert_eq!(valid.len(), 2);
    }

    #[test]
    fn malformed_signature_is_dropped() {
        let f = Fixture::new();
        let garbage = SafeSignature::new(B256::repeat_byte(1), B256::repeat_byte(2), 40);

        let packed =
            aggregate(&f.digest, &[garbage, f.sign(&f.low), f.sign(&f.high)], &f.owners(2)).unwrap();

        assert_eq!(packed.len(), 2 * SIGNATURE_LENGTH);
    }

    /// Replays the contract's ECDSA branch over a packed blob and returns the
    /// addresses it would recover.
    fn contract_signers(digest: &B256, packed: &[u8]) -> Vec<Address> {
        packed
            .chunks(SIGNATURE_LENGTH)
            .map(|entry| {
                let v = entry[64];
                let (hash, v) = match v > 30 {
                    true => (eip191_hash_message(digest), v - 4),
                    false => (*digest, v),
                };
                SafeSignature::from_slice(&entry[..64], Some(v))
                    .unwrap()
                    .recover_address_from_prehash(&hash)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn personal_message_signature_is_contract_verifiable() {
        let f = Fixture::new();
        let raw = f.sign(&f.low);
        let message: SafeSignature =
            f.high.sign_message_sync(f.digest.as_slice()).unwrap().into();

        let packed = aggregate(&f.digest, &[message, raw], &f.owners(2)).unwrap();

        assert!(matches!(packed[64], 27 | 28));
        assert!(matches!(packed[129], 31 | 32));
        assert_eq!(contract_signers(&f.digest, &packed), vec![f.low.address(), f.high.address()]);
    }
}
