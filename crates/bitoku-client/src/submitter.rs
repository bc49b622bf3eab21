//! Submission and confirmation.
//!
//! `submit` sends the envelope, then polls the signature until it reaches
//! the configured commitment, fails on-chain, is dropped, or the
//! confirmation timeout expires. A signature still unknown to the node once
//! the block height passes the envelope's last valid height was dropped and
//! is reported as `StaleCheckpoint`. A timeout is reported as
//! `ConfirmationTimeout`, never as a failure: the transaction may still land.

use std::future::Future;
use std::sync::Arc;

use solana_sdk::signature::Signature;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::{RetryPolicy, SubmitPolicy};
use crate::error::{BitokuError, BitokuResult};
use crate::network::{Network, SignatureState};
use crate::transaction::SignedEnvelope;

/// Run `operation`, retrying transport errors with backoff.
///
/// Any other error is returned immediately.
pub async fn retry_transient<T, F, Fut>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> BitokuResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BitokuResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation = operation_name, attempts = attempt + 1, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && attempt + 1 < policy.max_attempts => {
                let backoff = policy.backoff(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "transient error, retrying"
                );
                sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

pub struct Submitter<N: ?Sized> {
    network: Arc<N>,
    policy: SubmitPolicy,
}

impl<N: Network + ?Sized> Submitter<N> {
    pub fn new(network: Arc<N>, policy: SubmitPolicy) -> Self {
        Self { network, policy }
    }

    pub fn policy(&self) -> &SubmitPolicy {
        &self.policy
    }

    pub async fn submit(&self, envelope: &SignedEnvelope) -> BitokuResult<Signature> {
        let network = &self.network;
        let signature = retry_transient("send_transaction", &self.policy.retry, move || {
            network.send_raw_transaction(&envelope.wire)
        })
        .await?;

        if signature != envelope.signature {
            warn!(
                expected = %envelope.signature,
                returned = %signature,
                "node returned an unexpected signature"
            );
        }
        info!(%signature, "transaction sent, awaiting confirmation");

        self.await_confirmation(&signature, envelope.checkpoint.last_valid_block_height)
            .await?;
        Ok(signature)
    }

    /// Poll until confirmed, failed, dropped, or the confirmation timeout elapses.
    pub async fn await_confirmation(
        &self,
        signature: &Signature,
        last_valid_block_height: u64,
    ) -> BitokuResult<()> {
        let started_at = Instant::now();
        let mut polls = 0u32;

        let poll = async {
            loop {
                polls += 1;
                match self.network.signature_state(signature).await {
                    Ok(SignatureState::Confirmed) => {
                        info!(
                            %signature,
                            polls,
                            latency_ms = started_at.elapsed().as_millis() as u64,
                            "transaction confirmed"
                        );
                        return Ok(());
                    }
                    Ok(SignatureState::Failed(err)) => {
                        warn!(%signature, error = %err, "transaction failed");
                        return Err(err);
                    }
                    Ok(SignatureState::Processed) => {
                        debug!(%signature, polls, "processed, awaiting commitment");
                    }
                    Ok(SignatureState::Pending) => {
                        if self.expired(signature, last_valid_block_height).await? {
                            warn!(%signature, last_valid_block_height, "transaction dropped, blockhash expired");
                            return Err(BitokuError::StaleCheckpoint);
                        }
                        debug!(%signature, polls, "not seen yet");
                    }
                    Err(err) if err.is_transient() => {
                        warn!(%signature, error = %err, "status poll failed, repolling");
                    }
                    Err(err) => return Err(err),
                }
                sleep(self.policy.poll_interval).await;
            }
        };

        match timeout(self.policy.confirm_timeout, poll).await {
            Ok(result) => result,
            Err(_) => {
                let waited = started_at.elapsed();
                warn!(%signature, waited_ms = waited.as_millis() as u64, "confirmation timed out");
                Err(BitokuError::ConfirmationTimeout { signature: *signature, waited })
            }
        }
    }

    /// Whether the block height has passed `last_valid_block_height` while
    /// the signature is still unknown. Transport errors count as not expired.
    async fn expired(&self, signature: &Signature, last_valid_block_height: u64) -> BitokuResult<bool> {
        let height = match self.network.block_height().await {
            Ok(height) => height,
            Err(err) if err.is_transient() => return Ok(false),
            Err(err) => return Err(err),
        };
        if height <= last_valid_block_height {
            return Ok(false);
        }
        // it may have landed between the two reads
        match self.network.signature_state(signature).await {
            Ok(SignatureState::Pending) => Ok(true),
            Ok(_) => Ok(false),
            Err(err) if err.is_transient() => Ok(false),
            Err(err) => Err(err),
        }
    }
}
