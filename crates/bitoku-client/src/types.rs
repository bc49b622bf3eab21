//! Fixed-width instruction fields.
//!
//! `Name` and `Data` carry their full wire width at all times. Construction
//! rejects oversized input; shorter input is right-padded with zero bytes.

use std::fmt;

use crate::constants::{DATA_LEN, NAME_LEN};
use crate::error::{BitokuError, BitokuResult};

fn pad<const N: usize>(field: &'static str, bytes: &[u8]) -> BitokuResult<[u8; N]> {
    if bytes.len() > N {
        return Err(BitokuError::InvalidInput { field, len: bytes.len(), max: N });
    }
    let mut out = [0u8; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// Length of the prefix before the first zero byte.
fn content_len(bytes: &[u8]) -> usize {
    bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len())
}

/// Bucket or resource name, zero padded to 128 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name([u8; NAME_LEN]);

impl Name {
    pub fn new(name: &str) -> BitokuResult<Self> {
        Self::from_bytes(name.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> BitokuResult<Self> {
        pad::<NAME_LEN>("name", bytes).map(Self)
    }

    pub fn from_wire(wire: [u8; NAME_LEN]) -> Self {
        Self(wire)
    }

    pub fn as_wire(&self) -> &[u8; NAME_LEN] {
        &self.0
    }

    /// Name bytes without the zero padding.
    pub fn content(&self) -> &[u8] {
        &self.0[..content_len(&self.0)]
    }

    /// Whether the program's name check will accept this name.
    ///
    /// The program only admits `[A-Za-z0-9./_+-]` before the first zero byte.
    pub fn is_program_safe(&self) -> bool {
        self.content()
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'/' | b'_' | b'+' | b'-'))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.content()))
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.to_string())
    }
}

/// Write payload, zero padded to 512 bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Data([u8; DATA_LEN]);

impl Data {
    pub fn new(bytes: &[u8]) -> BitokuResult<Self> {
        pad::<DATA_LEN>("data", bytes).map(Self)
    }

    pub fn empty() -> Self {
        Self([0u8; DATA_LEN])
    }

    pub fn from_wire(wire: [u8; DATA_LEN]) -> Self {
        Self(wire)
    }

    pub fn as_wire(&self) -> &[u8; DATA_LEN] {
        &self.0
    }

    /// Payload bytes up to the first zero byte.
    pub fn content(&self) -> &[u8] {
        &self.0[..content_len(&self.0)]
    }
}

impl Default for Data {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data({} bytes)", self.content().len())
    }
}
