//! Bitoku client.
//!
//! Runs one operation at a time: encode, fetch a blockhash, sign, submit and
//! wait for confirmation before returning. The request PDA is a per-caller
//! serialization point, so operations for one caller must not overlap.

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tracing::{info, warn};

use crate::config::{ClientConfig, RetryPolicy, SubmitPolicy};
use crate::error::{BitokuError, BitokuResult};
use crate::instruction::{BitokuInstruction, InstructionEncoder, SendRequestArgs};
use crate::keys::KeyProvider;
use crate::network::{Network, RpcNetwork};
use crate::pda::{self, ClientPdas};
use crate::state::{Bookkeeper, RequestRecord};
use crate::submitter::{retry_transient, Submitter};
use crate::transaction::TransactionAssembler;

pub struct BitokuClient<N: ?Sized, K> {
    encoder: InstructionEncoder,
    assembler: TransactionAssembler,
    submitter: Submitter<N>,
    network: Arc<N>,
    signer: K,
}

impl<K: KeyProvider> BitokuClient<RpcNetwork, K> {
    /// Build a client talking JSON-RPC to `config.rpc_url`.
    pub fn from_config(config: &ClientConfig, signer: K) -> BitokuResult<Self> {
        config.validate()?;
        let network = Arc::new(RpcNetwork::new(&config.rpc_url, config.commitment()?));
        Ok(Self::new(
            network,
            signer,
            config.program_id()?,
            config.compute_unit_limit,
            config.submit.clone(),
        ))
    }
}

impl<N: Network + ?Sized, K: KeyProvider> BitokuClient<N, K> {
    pub fn new(
        network: Arc<N>,
        signer: K,
        program_id: Pubkey,
        compute_unit_limit: u32,
        policy: SubmitPolicy,
    ) -> Self {
        Self {
            encoder: InstructionEncoder::new(program_id),
            assembler: TransactionAssembler::new(compute_unit_limit),
            submitter: Submitter::new(network.clone(), policy),
            network,
            signer,
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        self.encoder.program_id()
    }

    pub fn caller(&self) -> Pubkey {
        self.signer.pubkey()
    }

    pub fn pdas(&self) -> BitokuResult<ClientPdas> {
        pda::pdas_for_client(self.program_id(), &self.caller())
    }

    /// Create the global bookkeeper account. Run once per program.
    pub async fn initialize(&self) -> BitokuResult<Signature> {
        self.execute(&BitokuInstruction::Initialize).await
    }

    pub async fn create_client_account(&self) -> BitokuResult<Signature> {
        self.execute(&BitokuInstruction::CreateClientAccount).await
    }

    pub async fn delete_client(&self, client_id: u8) -> BitokuResult<Signature> {
        self.execute(&BitokuInstruction::DeleteClient { client_id }).await
    }

    pub async fn send_request(&self, args: SendRequestArgs) -> BitokuResult<Signature> {
        if !args.name.is_program_safe() {
            warn!(name = %args.name, "name contains characters the program rejects");
        }
        self.execute(&BitokuInstruction::SendRequest(args)).await
    }

    /// Encode, sign, submit and confirm a single instruction.
    ///
    /// A stale blockhash, rejected at send or expired while in flight,
    /// triggers re-assembly against a fresh one, up to
    /// `max_checkpoint_retries` times.
    pub async fn execute(&self, ix: &BitokuInstruction) -> BitokuResult<Signature> {
        let caller = self.caller();
        let program_ix = self.encoder.encode(&caller, ix)?;
        let policy = self.submitter.policy();
        info!(
            opcode = ix.opcode().as_str(),
            program_id = %self.program_id(),
            %caller,
            "submitting instruction"
        );

        let mut stale = 0;
        loop {
            let network = &self.network;
            let checkpoint =
                retry_transient("latest_blockhash", &policy.retry, move || network.latest_blockhash())
                    .await?;
            let envelope = self
                .assembler
                .assemble(program_ix.clone(), &self.signer, checkpoint)?;

            match self.submitter.submit(&envelope).await {
                Err(BitokuError::StaleCheckpoint) if stale < policy.max_checkpoint_retries => {
                    stale += 1;
                    warn!(
                        blockhash = %checkpoint.blockhash,
                        attempt = stale,
                        max = policy.max_checkpoint_retries,
                        "blockhash expired, re-signing with a fresh one"
                    );
                }
                other => return other,
            }
        }
    }

    pub fn state_reader(&self) -> StateReader<N> {
        StateReader::new(
            self.network.clone(),
            *self.program_id(),
            self.submitter.policy().retry.clone(),
        )
    }

    pub async fn fetch_bookkeeper(&self) -> BitokuResult<Option<Bookkeeper>> {
        self.state_reader().fetch_bookkeeper().await
    }

    /// Request record of `owner`, `None` if it has not registered.
    pub async fn fetch_request_record(&self, owner: &Pubkey) -> BitokuResult<Option<RequestRecord>> {
        self.state_reader().fetch_request_record(owner).await
    }
}

/// Read-only access to program accounts; needs no signer.
pub struct StateReader<N: ?Sized> {
    network: Arc<N>,
    program_id: Pubkey,
    retry: RetryPolicy,
}

impl<N: Network + ?Sized> StateReader<N> {
    pub fn new(network: Arc<N>, program_id: Pubkey, retry: RetryPolicy) -> Self {
        Self { network, program_id, retry }
    }

    pub async fn fetch_bookkeeper(&self) -> BitokuResult<Option<Bookkeeper>> {
        let (address, _) = pda::derive_bookkeeper(&self.program_id)?;
        self.fetch_account(&address)
            .await?
            .map(|data| Bookkeeper::unpack(&data))
            .transpose()
    }

    pub async fn fetch_request_record(&self, owner: &Pubkey) -> BitokuResult<Option<RequestRecord>> {
        let (address, _) = pda::derive_request(&self.program_id, owner)?;
        self.fetch_account(&address)
            .await?
            .map(|data| RequestRecord::unpack(&data))
            .transpose()
    }

    async fn fetch_account(&self, address: &Pubkey) -> BitokuResult<Option<Vec<u8>>> {
        let network = &self.network;
        retry_transient("account_data", &self.retry, move || network.account_data(address)).await
    }
}
