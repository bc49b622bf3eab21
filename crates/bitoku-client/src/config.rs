//! Client configuration.
//!
//! All values are supplied by the caller; this crate does not read the
//! environment. Durations are serialized as milliseconds.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::pubkey::Pubkey;

use crate::constants::{default_program_id, DEFAULT_COMPUTE_UNIT_LIMIT};
use crate::error::{BitokuError, BitokuResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base58 program id.
    pub program_id: String,
    pub rpc_url: String,
    /// processed | confirmed | finalized
    pub commitment: String,
    pub compute_unit_limit: u32,
    pub submit: SubmitPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program_id: default_program_id().to_string(),
            rpc_url: "http://127.0.0.1:8899".to_string(),
            commitment: "confirmed".to_string(),
            compute_unit_limit: DEFAULT_COMPUTE_UNIT_LIMIT,
            submit: SubmitPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn program_id(&self) -> BitokuResult<Pubkey> {
        self.program_id
            .parse()
            .map_err(|_| BitokuError::invalid_config(format!("invalid program id: {}", self.program_id)))
    }

    pub fn commitment(&self) -> BitokuResult<CommitmentConfig> {
        let commitment: CommitmentLevel = self
            .commitment
            .parse()
            .map_err(|_| BitokuError::invalid_config(format!("invalid commitment: {}", self.commitment)))?;
        Ok(CommitmentConfig { commitment })
    }

    pub fn validate(&self) -> BitokuResult<()> {
        self.program_id()?;
        self.commitment()?;
        if self.rpc_url.trim().is_empty() {
            return Err(BitokuError::invalid_config("rpc_url must not be empty"));
        }
        if self.compute_unit_limit == 0 {
            return Err(BitokuError::invalid_config("compute_unit_limit must be greater than zero"));
        }
        self.submit.validate()
    }
}

/// Confirmation and retry bounds for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitPolicy {
    #[serde(with = "millis")]
    pub confirm_timeout: Duration,
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    /// Re-assemblies allowed after a stale blockhash.
    pub max_checkpoint_retries: u32,
    pub retry: RetryPolicy,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            confirm_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
            max_checkpoint_retries: 3,
            retry: RetryPolicy::default(),
        }
    }
}

impl SubmitPolicy {
    pub fn validate(&self) -> BitokuResult<()> {
        if self.confirm_timeout.is_zero() {
            return Err(BitokuError::invalid_config("confirm_timeout must be greater than zero"));
        }
        if self.poll_interval.is_zero() || self.poll_interval > self.confirm_timeout {
            return Err(BitokuError::invalid_config(
                "poll_interval must be non-zero and not exceed confirm_timeout",
            ));
        }
        self.retry.validate()
    }
}

/// Backoff for transient transport errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Includes the first attempt.
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub base_backoff: Duration,
    #[serde(with = "millis")]
    pub max_backoff: Duration,
    /// 0.0 to 1.0
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            jitter_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> BitokuResult<()> {
        if self.max_attempts == 0 {
            return Err(BitokuError::invalid_config("retry.max_attempts must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(BitokuError::invalid_config("retry.jitter_factor must be within 0.0..=1.0"));
        }
        if self.base_backoff > self.max_backoff {
            return Err(BitokuError::invalid_config("retry.base_backoff must not exceed max_backoff"));
        }
        Ok(())
    }

    /// Backoff before retry number `attempt` (0-indexed), jittered.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.base_backoff.as_millis() as f64 * 2f64.powi(attempt.min(31) as i32);
        let capped = exp.min(self.max_backoff.as_millis() as f64);
        let range = capped * self.jitter_factor;
        let jitter = if range > 0.0 {
            rand::thread_rng().gen_range(-range..=range)
        } else {
            0.0
        };
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
