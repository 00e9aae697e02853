use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use alloy_transport::Transport;

use crate::{
    contracts::Safe,
    transaction_data::{ExecutableSafeTransaction, SafeTransactionData},
};

/// Encodes `execTransaction` for `safe_tx` with the packed owner signatures.
pub fn exec_transaction(
    safe_tx: &SafeTransactionData,
    signatures: &Bytes,
    safe: Address,
) -> ExecutableSafeTransaction {
    let call = Safe::execTransactionCall::new((
        safe_tx.to,
        safe_tx.value,
        safe_tx.data.clone(),
        safe_tx.operation,
        safe_tx.safe_tx_gas,
        safe_tx.base_gas,
        safe_tx.gas_price,
        safe_tx.gas_token,
        safe_tx.refund_receiver,
        signatures.clone(),
    ));

    ExecutableSafeTransaction { safe_address: safe, input_data: call.abi_encode().into() }
}

pub async fn get_nonce<T, P>(safe: Address, provider: &P) -> eyre::Result<U256>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let call = Safe::nonceCall::new(());

    let Safe::nonceReturn { _0: nonce } = call_and_decode(call, safe, provider).await?;

    Ok(nonce)
}

pub async fn get_owners<T, P>(safe: Address, provider: &P) -> eyre::Result<Vec<Address>>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let call = Safe::getOwnersCall::new(());

    let Safe::getOwnersReturn { _0: owners } = call_and_decode(call, safe, provider).await?;

    Ok(owners)
}

pub async fn get_threshold<T, P>(safe: Address, provider: &P) -> eyre::Result<U256>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let call = Safe::getThresholdCall::new(());

    let Safe::getThresholdReturn { _0: threshold } = call_and_decode(call, safe, provider).await?;

    Ok(threshold)
}

pub async fn get_transaction_hash<T, P>(
    safe_tx: &SafeTransactionData,
    safe: Address,
    provider: &P,
) -> eyre::Result<B256>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let call = Safe::getTransactionHashCall::new((
        safe_tx.to,
        safe_tx.value,
        safe_tx.data.clone(),
        safe_tx.operation,
        safe_tx.safe_tx_gas,
        safe_tx.base_gas,
        safe_tx.gas_price,
        safe_tx.gas_token,
        safe_tx.refund_receiver,
        safe_tx.nonce,
    ));

    let Safe::getTransactionHashReturn { _0: tx_hash } =
        call_and_decode(call, safe, provider).await?;

    Ok(tx_hash)
}

pub async fn get_version<T, P>(safe: Address, provider: &P) -> eyre::Result<String>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let call = Safe::VERSIONCall::new(());

    let Safe::VERSIONReturn { _0: version } = call_and_decode(call, safe, provider).await?;

    Ok(version)
}

pub async fn is_owner<T, P>(address: Address, safe: Address, provider: &P) -> eyre::Result<bool>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let call = Safe::isOwnerCall::new((address,));

    let Safe::isOwnerReturn { _0: is_owner } = call_and_decode(call, safe, provider).await?;

    Ok(is_owner)
}

/// Private function to make a contract call and decode the response
async fn call_and_decode<C, T, P>(call: C, to: Address, provider: &P) -> eyre::Result<C::Return>
where
    C: SolCall,
    T: Transport + Clone,
    P: Provider<T>,
{
    let req = TransactionRequest::default().with_to(to).with_input(call.abi_encode());

    let data = provider.call(&req).await?;
    let data = C::abi_decode_returns(data.as_ref(), true)?;

    Ok(data)
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn exec_transaction_calldata() {
        let record = SafeTransactionData {
            to: Address::repeat_byte(0xab),
            value: U256::from(1_000_000_000_000_000u64),
            data: Bytes::new(),
            operation: 0,
            safe_tx_gas: U256::ZERO,
            base_gas: U256::ZERO,
            gas_price: U256::ZERO,
            gas_token: Address::ZERO,
            refund_receiver: Address::ZERO,
            nonce: U256::from(3),
        };
        let signatures = Bytes::from(vec![0x11; 130]);
        let safe = Address::repeat_byte(0x5a);

        let exec = exec_transaction(&record, &signatures, safe);

        assert_eq!(exec.safe_address, safe);
        // execTransaction(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,bytes)
        assert_eq!(hex::encode(&exec.input_data[..4]), "6a761202");

        let decoded = Safe::execTransactionCall::abi_decode(&exec.input_data, true).unwrap();
        assert_eq!(decoded.to, record.to);
        assert_eq!(decoded.value, record.value);
        assert_eq!(decoded.signatures, signatures);
    }
}
