use alloy_primitives::B256;
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    aggregator::{aggregate, OwnerSet},
    calls::exec_transaction,
    consts::DEFAULT_GAS_BUFFER_PERCENT,
    error::{AuthorizationError, Result},
    signature::SafeSignature,
    signers::{SignerSlot, SlotSignature},
    transaction_data::{
        ExecutionReceipt, SafeTransactionData, SafeTransactionRequest, SignedSafeTransaction,
    },
    wallet::SafeWallet,
};

/// Where an authorization round stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    Created,
    AwaitingSignatures,
    Aggregated,
    Executing,
    Executed,
    Failed,
}

/// One attempt at authorizing and executing a Safe transaction.
///
/// Record and digest are fixed at creation. A failed round is never resumed;
/// the caller starts over with [`Authorizer::create`], which picks up the
/// wallet's current nonce.
#[derive(Debug, Clone)]
pub struct AuthorizationRound {
    record: SafeTransactionData,
    digest: B256,
    signatures: Vec<SlotSignature>,
    state: RoundState,
}

impl AuthorizationRound {
    fn new(record: SafeTransactionData, digest: B256) -> Self {
        Self { record, digest, signatures: Vec::new(), state: RoundState::Created }
    }

    pub fn record(&self) -> &SafeTransactionData {
        &self.record
    }

    pub fn digest(&self) -> &B256 {
        &self.digest
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn signatures(&self) -> &[SlotSignature] {
        &self.signatures
    }

    fn expect_state(&self, expected: RoundState) -> Result<()> {
        if self.state != expected {
            return Err(AuthorizationError::InvalidState { expected, actual: self.state });
        }
        Ok(())
    }

    fn transition(&mut self, next: RoundState) {
        debug!(digest = %self.digest, from = ?self.state, to = ?next, "round transition");
        self.state = next;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizerOptions {
    /// Percentage added on top of the gas estimate.
    pub gas_buffer_percent: u64,
}

impl Default for AuthorizerOptions {
    fn default() -> Self {
        Self { gas_buffer_percent: DEFAULT_GAS_BUFFER_PERCENT }
    }
}

/// Drives a Safe transaction from request to execution.
///
/// The signer slots are asked in order, one at a time, and each slot falls
/// back through its own sources. Rounds for the same Safe must not run
/// concurrently, they would race for the same nonce.
pub struct Authorizer<W> {
    wallet: W,
    slots: Vec<SignerSlot>,
    options: AuthorizerOptions,
}

impl<W: SafeWallet> Authorizer<W> {
    pub fn new(wallet: W, slots: Vec<SignerSlot>, options: AuthorizerOptions) -> Self {
        Self { wallet, slots, options }
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn slots(&self) -> &[SignerSlot] {
        &self.slots
    }

    /// Builds the Safe transaction and its digest.
    pub async fn create(&self, request: &SafeTransactionRequest) -> Result<AuthorizationRound> {
        let meta = request.validate()?;

        let record =
            self.wallet.create_transaction(&meta).await.map_err(AuthorizationError::Wallet)?;
        let digest =
            self.wallet.get_transaction_hash(&record).await.map_err(AuthorizationError::Wallet)?;

        info!(
            safe = %self.wallet.address(),
            to = %record.to,
            value = %record.value,
            nonce = %record.nonce,
            %digest,
            "created safe transaction"
        );

        Ok(AuthorizationRound::new(record, digest))
    }

    /// Collects one signature per slot over the round's digest. Slots whose
    /// sources all fail are skipped; the threshold is enforced later.
    pub async fn collect_signatures<'a>(
        &self,
        round: &'a mut AuthorizationRound,
    ) -> Result<&'a [SlotSignature]> {
        round.expect_state(RoundState::Created)?;
        round.transition(RoundState::AwaitingSignatures);

        for slot in &self.slots {
            match slot.sign(&round.digest).await {
                Some(signature) => round.signatures.push(signature),
                None => warn!(slot = %slot.label(), "no signature collected for slot"),
            }
        }

        info!(
            collected = round.signatures.len(),
            slots = self.slots.len(),
            "signature collection finished"
        );

        Ok(&round.signatures)
    }

    /// Reads the current owners and threshold from the wallet.
    pub async fn owner_set(&self) -> Result<OwnerSet> {
        let owners = self.wallet.get_owners().await.map_err(AuthorizationError::Wallet)?;
        let threshold = self.wallet.get_threshold().await.map_err(AuthorizationError::Wallet)?;

        OwnerSet::new(owners, threshold)
    }

    /// Checks the collected signatures against the wallet's owners and packs
    /// them. Falling short of the threshold fails the round.
    pub async fn validate_and_pack(
        &self,
        round: &mut AuthorizationRound,
    ) -> Result<SignedSafeTransaction> {
        round.expect_state(RoundState::AwaitingSignatures)?;

        let owners = self.owner_set().await?;
        let signatures: Vec<SafeSignature> =
            round.signatures.iter().map(|s| s.signature).collect();

        match aggregate(&round.digest, &signatures, &owners) {
            Ok(packed) => {
                round.transition(RoundState::Aggregated);
                info!(digest = %round.digest, threshold = owners.threshold(), "signatures aggregated");

                Ok(SignedSafeTransaction::new(round.record.clone(), round.digest, packed))
            }
            Err(e) => {
                round.transition(RoundState::Failed);
                error!(digest = %round.digest, error = %e, "signature validation failed");

                Err(e)
            }
        }
    }

    /// Submits `signed` from the executor account and waits for one
    /// confirmation. Never retried: a failed execution may already have
    /// consumed the nonce.
    pub async fn execute(
        &self,
        round: &mut AuthorizationRound,
        signed: SignedSafeTransaction,
        executor: &PrivateKeySigner,
    ) -> Result<ExecutionReceipt> {
        round.expect_state(RoundState::Aggregated)?;
        if *signed.digest() != round.digest || *signed.record() != round.record {
            return Err(AuthorizationError::InvalidRequest(format!(
                "signed transaction {} does not belong to round {}",
                signed.digest(),
                round.digest
            )));
        }

        round.transition(RoundState::Executing);

        match self.submit(signed, executor).await {
            Ok(receipt) => {
                round.transition(RoundState::Executed);
                info!(tx_hash = %receipt.tx_hash, block = ?receipt.block_number, "safe transaction executed");

                Ok(receipt)
            }
            Err(e) => {
                round.transition(RoundState::Failed);
                error!(digest = %round.digest, error = %e, "safe transaction execution failed");

                Err(e)
            }
        }
    }

    async fn submit(
        &self,
        signed: SignedSafeTransaction,
        executor: &PrivateKeySigner,
    ) -> Result<ExecutionReceipt> {
        let (record, _, packed) = signed.into_parts();
        let exec = exec_transaction(&record, &packed, self.wallet.address());

        let gas_limit = match self.wallet.estimate_gas(&exec).await {
            Ok(estimate) => {
                let gas_limit = with_gas_buffer(estimate, self.options.gas_buffer_percent);
                debug!(estimate, gas_limit, "estimated execTransaction gas");
                Some(gas_limit)
            }
            Err(e) => {
                warn!(error = %e, "gas estimation failed, submitting without a gas limit");
                None
            }
        };

        let tx_hash = self
            .wallet
            .submit(&exec, gas_limit, executor)
            .await
            .map_err(|e| AuthorizationError::ExecutionFailed(format!("{e:#}")))?;

        let receipt = self
            .wallet
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| AuthorizationError::ExecutionFailed(format!("{e:#}")))?;

        if !receipt.success {
            return Err(AuthorizationError::ExecutionFailed(format!(
                "transaction {tx_hash} reverted"
            )));
        }

        Ok(receipt)
    }

    /// Runs a whole round: create, collect, validate and execute.
    pub async fn authorize(
        &self,
        request: &SafeTransactionRequest,
        executor: &PrivateKeySigner,
    ) -> Result<ExecutionReceipt> {
        let mut round = self.create(request).await?;
        self.collect_signatures(&mut round).await?;
        let signed = self.validate_and_pack(&mut round).await?;
        self.execute(&mut round, signed, executor).await
    }
}

fn with_gas_buffer(estimate: u64, percent: u64) -> u64 {
    let buffered = u128::from(estimate) * u128::from(100 + percent) / 100;
    u64::try_from(buffered).unwrap_or(u64::MAX)
}
