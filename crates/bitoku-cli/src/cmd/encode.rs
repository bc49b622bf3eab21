use anyhow::Result;
use serde::Serialize;

use bitoku_client::InstructionEncoder;

use crate::args::{Cli, Operation};
use crate::cmd;
use crate::output;

#[derive(Debug, Serialize)]
pub struct AccountOut {
    pub pubkey: String,
    pub signer: bool,
    pub writable: bool,
}

#[derive(Debug, Serialize)]
pub struct EncodeOut {
    pub opcode: u8,
    pub operation: String,
    pub program_id: String,
    pub payload_len: usize,
    pub payload_hex: String,
    pub accounts: Vec<AccountOut>,
}

pub fn run(cli: &Cli, caller: Option<&str>, op: &Operation) -> Result<()> {
    let cfg = cmd::resolve_config(cli)?;
    let caller = cmd::resolve_address(cli, caller)?;
    let ix = cmd::instruction_for(op)?;

    let encoded = InstructionEncoder::new(cfg.program_id()?).encode(&caller, &ix)?;

    output::print(&EncodeOut {
        opcode: ix.opcode() as u8,
        operation: ix.opcode().as_str().to_string(),
        program_id: encoded.program_id.to_string(),
        payload_len: encoded.data.len(),
        payload_hex: hex::encode(&encoded.data),
        accounts: encoded
            .accounts
            .iter()
            .map(|m| AccountOut {
                pubkey: m.pubkey.to_string(),
                signer: m.is_signer,
                writable: m.is_writable,
            })
            .collect(),
    })
}
