//! Key custody boundary.
//!
//! The assembler only ever sees a public identity and a signing capability.

use std::path::Path;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};

use crate::error::{BitokuError, BitokuResult};

pub trait KeyProvider: Send + Sync {
    /// Public address of the caller; also the fee payer.
    fn pubkey(&self) -> Pubkey;

    /// Sign serialized message bytes.
    fn sign_message(&self, message: &[u8]) -> BitokuResult<Signature>;
}

/// Local keypair signer.
pub struct KeypairProvider {
    keypair: Keypair,
}

impl KeypairProvider {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Load a JSON keypair file as written by `solana-keygen`.
    pub fn from_file(path: impl AsRef<Path>) -> BitokuResult<Self> {
        let path = path.as_ref();
        let keypair = read_keypair_file(path)
            .map_err(|e| BitokuError::Signing(format!("read keypair {}: {e}", path.display())))?;
        Ok(Self::new(keypair))
    }
}

impl KeyProvider for KeypairProvider {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign_message(&self, message: &[u8]) -> BitokuResult<Signature> {
        self.keypair
            .try_sign_message(message)
            .map_err(|e| BitokuError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for KeypairProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairProvider").field("pubkey", &self.pubkey()).finish()
    }
}
