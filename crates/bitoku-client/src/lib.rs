//! bitoku-client
//!
//! A small, focused Rust client for the Bitoku on-chain storage program.
//!
//! It includes:
//! - PDA derivation for the bookkeeper and per-caller request accounts
//! - fixed-layout instruction encoding (and a reference decoder)
//! - transaction assembly with a compute unit limit, signed by a `KeyProvider`
//! - submission with blockhash refresh, transport retries and bounded
//!   confirmation polling
//! - decoding of the program's account state
//!
//! The program id is supplied by the consumer; the default in `constants`
//! is a placeholder for local development.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod instruction;
pub mod keys;
pub mod network;
pub mod pda;
pub mod state;
pub mod submitter;
pub mod transaction;
pub mod types;

pub use client::{BitokuClient, StateReader};
pub use config::{ClientConfig, RetryPolicy, SubmitPolicy};
pub use constants::*;
pub use error::{BitokuError, BitokuResult, ProgramErrorCode};
pub use instruction::{BitokuInstruction, InstructionEncoder, Opcode, RequestType, SendRequestArgs};
pub use keys::{KeyProvider, KeypairProvider};
pub use network::{Checkpoint, Network, RpcNetwork, SignatureState};
pub use pda::*;
pub use state::{Bookkeeper, RequestRecord};
pub use submitter::Submitter;
pub use transaction::{SignedEnvelope, TransactionAssembler};
pub use types::{Data, Name};
