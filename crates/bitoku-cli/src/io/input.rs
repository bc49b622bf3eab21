use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;

pub fn read_json_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| anyhow!("read {}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| anyhow!("invalid json in {}: {e}", path.display()))
}

/// Raw payload bytes for a write request.
pub fn read_payload<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| anyhow!("read {}: {e}", path.display()))
}

/// `~/.config/solana/id.json`, the solana CLI default.
pub fn default_keypair_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .ok_or_else(|| anyhow!("cannot locate home directory; pass --keypair"))?;
    Ok(PathBuf::from(home).join(".config").join("solana").join("id.json"))
}
