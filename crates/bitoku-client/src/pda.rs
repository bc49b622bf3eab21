//! PDA derivation helpers for the Bitoku program.
//!
//! These must match the seeds the on-chain program checks. Addresses are
//! always recomputed from seeds and never cached across program ids.

use solana_program::pubkey::Pubkey;

use crate::constants::{SEED_BOOKKEEPER, SEED_REQUEST};
use crate::error::{BitokuError, BitokuResult};

/// Addresses touched by the per-caller instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientPdas {
    pub bookkeeper: (Pubkey, u8),
    pub request: (Pubkey, u8),
}

/// Derive a program address from arbitrary seeds.
pub fn derive(program_id: &Pubkey, seeds: &[&[u8]]) -> BitokuResult<(Pubkey, u8)> {
    Pubkey::try_find_program_address(seeds, program_id).ok_or_else(|| {
        let seeds = seeds
            .iter()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        BitokuError::AddressDerivation { seeds }
    })
}

/// Derive the global bookkeeper PDA.
pub fn derive_bookkeeper(program_id: &Pubkey) -> BitokuResult<(Pubkey, u8)> {
    derive(program_id, &[SEED_BOOKKEEPER])
}

/// Derive the request PDA owned by `caller`.
pub fn derive_request(program_id: &Pubkey, caller: &Pubkey) -> BitokuResult<(Pubkey, u8)> {
    derive(program_id, &[SEED_REQUEST, caller.as_ref()])
}

pub fn pdas_for_client(program_id: &Pubkey, caller: &Pubkey) -> BitokuResult<ClientPdas> {
    Ok(ClientPdas {
        bookkeeper: derive_bookkeeper(program_id)?,
        request: derive_request(program_id, caller)?,
    })
}
