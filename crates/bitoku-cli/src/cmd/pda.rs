use anyhow::Result;
use serde::Serialize;

use bitoku_client::pdas_for_client;

use crate::args::Cli;
use crate::cmd;
use crate::output;

#[derive(Debug, Serialize)]
pub struct Derived {
    pub address: String,
    pub bump: u8,
}

#[derive(Debug, Serialize)]
pub struct PdaOut {
    pub program_id: String,
    pub caller: String,
    pub bookkeeper: Derived,
    pub request: Derived,
}

pub fn run(cli: &Cli, caller: Option<&str>) -> Result<()> {
    let cfg = cmd::resolve_config(cli)?;
    let program_id = cfg.program_id()?;
    let caller = cmd::resolve_address(cli, caller)?;
    let pdas = pdas_for_client(&program_id, &caller)?;

    output::print(&PdaOut {
        program_id: program_id.to_string(),
        caller: caller.to_string(),
        bookkeeper: Derived { address: pdas.bookkeeper.0.to_string(), bump: pdas.bookkeeper.1 },
        request: Derived { address: pdas.request.0.to_string(), bump: pdas.request.1 },
    })
}
