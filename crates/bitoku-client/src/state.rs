//! Read-side decoding of Bitoku program accounts.
//!
//! Bookkeeper layout (33 bytes): `[status:32][next_id:1]`, where `status` is
//! a bitmap of registered client ids.
//!
//! Request account layout (675 bytes):
//! `[client_id:1][requester:32][request_type:1][name:128][file_id:1][tail:512]`.
//! The tail holds the write payload, or the little-endian position for
//! `SetPosition` requests.

use solana_sdk::pubkey::Pubkey;

use crate::constants::{DATA_LEN, NAME_LEN};
use crate::error::{BitokuError, BitokuResult};
use crate::instruction::RequestType;
use crate::types::{Data, Name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookkeeper {
    pub status: [u8; 32],
    pub next_id: u8,
}

impl Bookkeeper {
    pub const LEN: usize = 33;

    pub fn unpack(src: &[u8]) -> BitokuResult<Self> {
        if src.len() < Self::LEN {
            return Err(BitokuError::InvalidAccountData(format!(
                "bookkeeper is {} bytes, expected {}",
                src.len(),
                Self::LEN
            )));
        }
        let mut status = [0u8; 32];
        status.copy_from_slice(&src[..32]);
        Ok(Self { status, next_id: src[32] })
    }

    pub fn is_registered(&self, client_id: u8) -> bool {
        let byte = self.status[(client_id / 8) as usize];
        (byte >> (client_id % 8)) & 1 == 1
    }

    pub fn registered_ids(&self) -> Vec<u8> {
        (0..=u8::MAX).filter(|id| self.is_registered(*id)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub client_id: u8,
    pub requester: Pubkey,
    pub request_type: RequestType,
    pub name: Name,
    pub file_id: u8,
    pub tail: Data,
}

impl RequestRecord {
    pub const LEN: usize = 1 + 32 + 1 + NAME_LEN + 1 + DATA_LEN;

    pub fn unpack(src: &[u8]) -> BitokuResult<Self> {
        if src.len() < Self::LEN {
            return Err(BitokuError::InvalidAccountData(format!(
                "request account is {} bytes, expected {}",
                src.len(),
                Self::LEN
            )));
        }
        let request_type = RequestType::from_u8(src[33]).ok_or_else(|| {
            BitokuError::InvalidAccountData(format!("unknown request type {}", src[33]))
        })?;

        let mut requester = [0u8; 32];
        requester.copy_from_slice(&src[1..33]);
        let mut name = [0u8; NAME_LEN];
        name.copy_from_slice(&src[34..34 + NAME_LEN]);
        let file_id = src[34 + NAME_LEN];
        let tail_at = 35 + NAME_LEN;
        let mut tail = [0u8; DATA_LEN];
        tail.copy_from_slice(&src[tail_at..tail_at + DATA_LEN]);

        Ok(Self {
            client_id: src[0],
            requester: Pubkey::new_from_array(requester),
            request_type,
            name: Name::from_wire(name),
            file_id,
            tail: Data::from_wire(tail),
        })
    }

    /// Stored position, only meaningful for `SetPosition` requests.
    pub fn position(&self) -> Option<u64> {
        if self.request_type != RequestType::SetPosition {
            return None;
        }
        let mut le = [0u8; 8];
        le.copy_from_slice(&self.tail.as_wire()[..8]);
        Some(u64::from_le_bytes(le))
    }
}
