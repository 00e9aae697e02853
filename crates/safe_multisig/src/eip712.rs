use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};

use crate::transaction_data::SafeTransactionData;

sol! {
    #[allow(missing_docs)]
    struct SafeTx {
        address to;
        uint256 value;
        bytes data;
        uint8 operation;
        uint256 safeTxGas;
        uint256 baseGas;
        uint256 gasPrice;
        address gasToken;
        address refundReceiver;
        uint256 nonce;
    }
}

// TODO: Safes older than v1.3.0 use a domain without the chain id
/// EIP-712 domain of a v1.3.0+ Safe.
pub fn safe_domain(chain_id: u64, safe: Address) -> Eip712Domain {
    Eip712Domain::new(None, None, Some(U256::from(chain_id)), Some(safe), None)
}

impl From<&SafeTransactionData> for SafeTx {
    fn from(tx: &SafeTransactionData) -> Self {
        Self {
            to: tx.to,
            value: tx.value,
            data: tx.data.clone(),
            operation: tx.operation,
            safeTxGas: tx.safe_tx_gas,
            baseGas: tx.base_gas,
            gasPrice: tx.gas_price,
            gasToken: tx.gas_token,
            refundReceiver: tx.refund_receiver,
            nonce: tx.nonce,
        }
    }
}

/// Computes the `safeTxHash` owners sign, without asking the contract.
pub fn safe_tx_hash(tx: &SafeTransactionData, chain_id: u64, safe: Address) -> B256 {
    SafeTx::from(tx).eip712_signing_hash(&safe_domain(chain_id, safe))
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::{b256, keccak256, Bytes};
    use alloy_sol_types::SolValue;

    fn record(nonce: u64) -> SafeTransactionData {
        SafeTransactionData {
            to: Address::repeat_byte(0xab),
            value: U256::from(1_000_000_000_000_000u64),
            data: Bytes::new(),
            operation: 0,
            safe_tx_gas: U256::ZERO,
            base_gas: U256::ZERO,
            gas_price: U256::ZERO,
            gas_token: Address::ZERO,
            refund_receiver: Address::ZERO,
            nonce: U256::from(nonce),
        }
    }

    #[test]
    fn safe_tx_type_hash() {
        let tx = SafeTx::from(&record(0));

        assert_eq!(
            tx.eip712_type_hash(),
            b256!("bb8310d486368db6bd6f849402fdd73ad53d316b5a4b2644ad6efe0f941286d8")
        );
    }

    #[test]
    fn domain_separator() {
        let safe = Address::repeat_byte(0x5a);
        let type_hash = keccak256("EIP712Domain(uint256 chainId,address verifyingContract)");
        assert_eq!(
            type_hash,
            b256!("47e79534a245952e8b16893a336b85a3d9ea9fa8c573f3d803afb92a79469218")
        );

        let expected = keccak256((type_hash, U256::from(11155111u64), safe).abi_encode());

        assert_eq!(safe_domain(11155111, safe).hash_struct(), expected);
    }

    #[test]
    fn hash_binds_nonce_chain_and_safe() {
        let safe = Address::repeat_byte(0x5a);
        let base = safe_tx_hash(&record(0), 1, safe);

        assert_eq!(base, safe_tx_hash(&record(0), 1, safe));
        assert_ne!(base, safe_tx_hash(&record(1), 1, safe));
        assert_ne!(base, safe_tx_hash(&record(0), 11155111, safe));
        assert_ne!(base, safe_tx_hash(&record(0), 1, Address::repeat_byte(0x5b)));
    }
}
