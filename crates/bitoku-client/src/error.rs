//! Error taxonomy for the Bitoku client.
//!
//! Local failures (encoding, derivation, signing, config) are raised
//! synchronously and never reach the network. Only `NetworkTransport` is
//! retried automatically; `StaleCheckpoint` is recovered by re-assembling
//! against a fresh blockhash.

use std::fmt;
use std::time::Duration;

use solana_sdk::instruction::InstructionError;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionError;
use thiserror::Error;

pub type BitokuResult<T> = Result<T, BitokuError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitokuError {
    /// A fixed-width field was handed more bytes than its wire slot holds.
    #[error("{field} is {len} bytes, maximum is {max}")]
    InvalidInput {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("no valid program address for seeds {seeds}")]
    AddressDerivation { seeds: String },

    #[error("blockhash expired before the transaction landed")]
    StaleCheckpoint,

    #[error("network transport error: {0}")]
    NetworkTransport(String),

    #[error("transaction rejected: {reason}")]
    RemoteRejection {
        reason: String,
        program_error: Option<ProgramErrorCode>,
    },

    /// Neither confirmed nor failed; the transaction may still land.
    #[error("no confirmation for {signature} after {waited:?}")]
    ConfirmationTimeout {
        signature: Signature,
        waited: Duration,
    },

    /// Client-side RPC failure that retrying will not fix.
    #[error("rpc client error: {0}")]
    Rpc(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid instruction data: {0}")]
    InvalidInstruction(String),

    #[error("invalid account data: {0}")]
    InvalidAccountData(String),
}

impl BitokuError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn transport(msg: impl fmt::Display) -> Self {
        Self::NetworkTransport(msg.to_string())
    }

    /// Whether the failure is a transient transport fault worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkTransport(_))
    }

    /// Whether the outcome of the submitted transaction is unknown.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, Self::ConfirmationTimeout { .. })
    }

    /// Map an on-chain transaction error onto the client taxonomy.
    pub fn from_transaction_error(err: &TransactionError) -> Self {
        match err {
            TransactionError::BlockhashNotFound => Self::StaleCheckpoint,
            TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
                let program_error = ProgramErrorCode::from_code(*code);
                let reason = match program_error {
                    Some(pe) => format!("{err}: {pe}"),
                    None => err.to_string(),
                };
                Self::RemoteRejection { reason, program_error }
            }
            other => Self::RemoteRejection {
                reason: other.to_string(),
                program_error: None,
            },
        }
    }
}

/// Custom error codes reported by the Bitoku program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ProgramErrorCode {
    InvalidInstruction = 0,
    InvalidInstructionData = 1,
    NoAvailableClients = 2,
    Overflow = 3,
    UnregisteredClient = 4,
    InvalidName = 5,
    InvalidAccount = 6,
    InvalidClientId = 7,
    InvalidFileId = 8,
    InvalidPosition = 9,
    ClientMismatch = 10,
}

impl ProgramErrorCode {
    pub fn from_code(code: u32) -> Option<Self> {
        use ProgramErrorCode::*;
        Some(match code {
            0 => InvalidInstruction,
            1 => InvalidInstructionData,
            2 => NoAvailableClients,
            3 => Overflow,
            4 => UnregisteredClient,
            5 => InvalidName,
            6 => InvalidAccount,
            7 => InvalidClientId,
            8 => InvalidFileId,
            9 => InvalidPosition,
            10 => ClientMismatch,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInstruction => "instruction is not valid",
            Self::InvalidInstructionData => "instruction data is invalid",
            Self::NoAvailableClients => "client limit reached",
            Self::Overflow => "numbers overflow",
            Self::UnregisteredClient => "client is not registered",
            Self::InvalidName => "name is not valid",
            Self::InvalidAccount => "account is not valid",
            Self::InvalidClientId => "client is not valid",
            Self::InvalidFileId => "file id is not valid",
            Self::InvalidPosition => "provided position is not valid",
            Self::ClientMismatch => "client id mismatch",
        }
    }
}

impl fmt::Display for ProgramErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), *self as u32)
    }
}
