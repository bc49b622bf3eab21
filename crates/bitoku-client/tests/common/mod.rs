//! In-memory ledger used by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bitoku_client::{
    BitokuError, BitokuResult, Checkpoint, Network, RetryPolicy, SignatureState, SubmitPolicy,
};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

#[derive(Debug, Clone)]
pub enum Finality {
    /// Confirmed on the n-th status poll (1-based), processed before that.
    ConfirmAfter(u32),
    /// Processed but never reaches the requested commitment.
    Never,
    Fail(BitokuError),
}

#[derive(Default)]
struct Inner {
    blockhashes: VecDeque<Hash>,
    expired: HashSet<Hash>,
    send_failures: VecDeque<BitokuError>,
    poll_failures: VecDeque<BitokuError>,
    polls: HashMap<Signature, u32>,
    accounts: HashMap<Pubkey, Vec<u8>>,
    /// Advances by one on every status poll.
    block_height: u64,
    validity: u64,
    drop_sends: u32,
    dropped: HashSet<Signature>,
    sent: Vec<Transaction>,
    blockhash_fetches: u32,
    send_calls: u32,
}

pub struct MockNetwork {
    inner: Mutex<Inner>,
    finality: Finality,
}

impl MockNetwork {
    pub fn new(finality: Finality) -> Self {
        let inner = Inner { validity: 150, ..Inner::default() };
        Self { inner: Mutex::new(inner), finality }
    }

    /// Blocks a handed-out blockhash stays valid for.
    pub fn with_validity(self, blocks: u64) -> Self {
        self.inner.lock().unwrap().validity = blocks;
        self
    }

    /// Accept the next `n` sends but never let them land.
    pub fn drop_next_sends(&self, n: u32) {
        self.inner.lock().unwrap().drop_sends += n;
    }

    pub fn confirming() -> Self {
        Self::new(Finality::ConfirmAfter(1))
    }

    /// Queue blockhashes handed out by `latest_blockhash`, in order.
    pub fn push_blockhash(&self, hash: Hash) {
        self.inner.lock().unwrap().blockhashes.push_back(hash);
    }

    pub fn expire(&self, hash: Hash) {
        self.inner.lock().unwrap().expired.insert(hash);
    }

    pub fn fail_next_send(&self, err: BitokuError) {
        self.inner.lock().unwrap().send_failures.push_back(err);
    }

    pub fn fail_next_poll(&self, err: BitokuError) {
        self.inner.lock().unwrap().poll_failures.push_back(err);
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.inner.lock().unwrap().accounts.insert(address, data);
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn blockhash_fetches(&self) -> u32 {
        self.inner.lock().unwrap().blockhash_fetches
    }

    pub fn send_calls(&self) -> u32 {
        self.inner.lock().unwrap().send_calls
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn latest_blockhash(&self) -> BitokuResult<Checkpoint> {
        let mut inner = self.inner.lock().unwrap();
        inner.blockhash_fetches += 1;
        let blockhash = inner.blockhashes.pop_front().unwrap_or_else(Hash::new_unique);
        Ok(Checkpoint {
            blockhash,
            last_valid_block_height: inner.block_height + inner.validity,
        })
    }

    async fn block_height(&self) -> BitokuResult<u64> {
        Ok(self.inner.lock().unwrap().block_height)
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> BitokuResult<Signature> {
        let mut inner = self.inner.lock().unwrap();
        inner.send_calls += 1;
        if let Some(err) = inner.send_failures.pop_front() {
            return Err(err);
        }
        let tx: Transaction = bincode::deserialize(wire)
            .map_err(|e| BitokuError::RemoteRejection { reason: e.to_string(), program_error: None })?;
        tx.verify()
            .map_err(|e| BitokuError::RemoteRejection { reason: e.to_string(), program_error: None })?;
        if inner.expired.contains(&tx.message.recent_blockhash) {
            return Err(BitokuError::StaleCheckpoint);
        }
        let signature = tx.signatures[0];
        if inner.drop_sends > 0 {
            inner.drop_sends -= 1;
            inner.dropped.insert(signature);
        }
        inner.sent.push(tx);
        Ok(signature)
    }

    async fn signature_state(&self, signature: &Signature) -> BitokuResult<SignatureState> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.poll_failures.pop_front() {
            return Err(err);
        }
        inner.block_height += 1;
        if inner.dropped.contains(signature) {
            return Ok(SignatureState::Pending);
        }
        let polls = inner.polls.entry(*signature).or_insert(0);
        *polls += 1;
        Ok(match &self.finality {
            Finality::ConfirmAfter(n) if *polls >= *n => SignatureState::Confirmed,
            Finality::ConfirmAfter(_) | Finality::Never => SignatureState::Processed,
            Finality::Fail(err) => SignatureState::Failed(err.clone()),
        })
    }

    async fn account_data(&self, address: &Pubkey) -> BitokuResult<Option<Vec<u8>>> {
        Ok(self.inner.lock().unwrap().accounts.get(address).cloned())
    }
}

pub fn fast_policy() -> SubmitPolicy {
    SubmitPolicy {
        confirm_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(100),
        max_checkpoint_retries: 2,
        retry: RetryPolicy {
            max_attempts: 3,
            base_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
            jitter_factor: 0.0,
        },
    }
}
