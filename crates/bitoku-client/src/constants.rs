//! Constants shared between the on-chain program and clients.
//!
//! Keep these stable because they affect PDA derivation and the instruction
//! wire layout.

use solana_program::pubkey::Pubkey;

/// PDA seed for the global bookkeeper account.
pub const SEED_BOOKKEEPER: &[u8] = b"bookkeeper";

/// PDA seed for per-caller request accounts.
pub const SEED_REQUEST: &[u8] = b"request";

/// Wire width of a bucket/resource name.
pub const NAME_LEN: usize = 128;

/// Wire width of a write payload.
pub const DATA_LEN: usize = 512;

/// Compute unit ceiling requested ahead of every program instruction.
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 400_000;

/// Default program id (placeholder).
///
/// Replace this with the deployed program id, or pass one explicitly.
pub const DEFAULT_PROGRAM_ID: &str = "Bitoku1111111111111111111111111111111111111";

pub fn default_program_id() -> Pubkey {
    DEFAULT_PROGRAM_ID.parse().unwrap_or_else(|_| Pubkey::default())
}
