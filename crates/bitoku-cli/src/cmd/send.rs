use anyhow::{anyhow, Result};
use serde::Serialize;

use bitoku_client::{BitokuClient, BitokuError, KeyProvider};

use crate::args::{Cli, Operation};
use crate::cmd;
use crate::output;

#[derive(Debug, Serialize)]
pub struct SendOut {
    pub ok: bool,
    pub operation: String,
    /// confirmed | failed | unknown
    pub outcome: String,
    pub signature: Option<String>,
    pub caller: String,
    pub program_id: String,
    pub error: Option<String>,
}

pub async fn run(cli: &Cli, op: &Operation) -> Result<()> {
    let cfg = cmd::resolve_config(cli)?;
    let signer = cmd::load_signer(cli)?;
    let ix = cmd::instruction_for(op)?;

    let caller = signer.pubkey();
    let client = BitokuClient::from_config(&cfg, signer)?;

    let operation = ix.opcode().as_str().to_string();
    let spinner = output::spinner(&format!("{operation}: submitting"));
    let result = client.execute(&ix).await;
    spinner.finish_and_clear();

    let mut out = SendOut {
        ok: result.is_ok(),
        operation,
        outcome: String::new(),
        signature: None,
        caller: caller.to_string(),
        program_id: client.program_id().to_string(),
        error: None,
    };

    match result {
        Ok(signature) => {
            out.outcome = "confirmed".to_string();
            out.signature = Some(signature.to_string());
            output::status(true, &format!("{} confirmed", out.operation))?;
            output::print(&out)
        }
        Err(err) => {
            out.outcome = if err.is_outcome_unknown() { "unknown" } else { "failed" }.to_string();
            if let BitokuError::ConfirmationTimeout { signature, .. } = &err {
                out.signature = Some(signature.to_string());
            }
            out.error = Some(err.to_string());
            output::status(false, &format!("{} {}", out.operation, out.outcome))?;
            output::print(&out)?;
            Err(anyhow!(err))
        }
    }
}
