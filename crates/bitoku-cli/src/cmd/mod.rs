use std::time::Duration;

use anyhow::{anyhow, Result};
use solana_sdk::pubkey::Pubkey;

use bitoku_client::{
    BitokuInstruction, ClientConfig, Data, KeyProvider, KeypairProvider, Name, SendRequestArgs,
};

use crate::args::{Cli, Command, Operation, RequestArgs};
use crate::io::input;
use crate::output;

mod encode;
mod inspect;
mod pda;
mod send;

pub async fn dispatch(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Op(op) => send::run(&cli, op).await,
        Command::Encode { caller, op } => encode::run(&cli, caller.as_deref(), op),
        Command::Pda { caller } => pda::run(&cli, caller.as_deref()),
        Command::Inspect { owner } => inspect::run(&cli, owner.as_deref()).await,
    }
}

/// Config file (if any), then flags on top, then validation.
pub fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let mut cfg = match &cli.config {
        Some(path) => input::read_json_file(path)?,
        None => ClientConfig::default(),
    };

    if let Some(url) = &cli.url {
        cfg.rpc_url = url.clone();
    }
    if let Some(program_id) = &cli.program_id {
        cfg.program_id = program_id.clone();
    }
    if let Some(commitment) = &cli.commitment {
        cfg.commitment = commitment.clone();
    }
    if let Some(limit) = cli.compute_unit_limit {
        cfg.compute_unit_limit = limit;
    }
    if let Some(secs) = cli.timeout_secs {
        cfg.submit.confirm_timeout = Duration::from_secs(secs);
    }

    url::Url::parse(&cfg.rpc_url).map_err(|e| anyhow!("invalid rpc url {}: {e}", cfg.rpc_url))?;
    cfg.validate()?;
    tracing::debug!(
        rpc_url = %cfg.rpc_url,
        program_id = %cfg.program_id,
        commitment = %cfg.commitment,
        "resolved config"
    );
    Ok(cfg)
}

pub fn load_signer(cli: &Cli) -> Result<KeypairProvider> {
    let path = match &cli.keypair {
        Some(p) => p.into(),
        None => input::default_keypair_path()?,
    };
    Ok(KeypairProvider::from_file(path)?)
}

/// Explicit address if given, otherwise the keypair's.
pub fn resolve_address(cli: &Cli, explicit: Option<&str>) -> Result<Pubkey> {
    match explicit {
        Some(s) => s.parse().map_err(|_| anyhow!("invalid address: {s}")),
        None => Ok(load_signer(cli)?.pubkey()),
    }
}

pub fn instruction_for(op: &Operation) -> Result<BitokuInstruction> {
    Ok(match op {
        Operation::Init => BitokuInstruction::Initialize,
        Operation::Register => BitokuInstruction::CreateClientAccount,
        Operation::Remove { client_id } => BitokuInstruction::DeleteClient { client_id: *client_id },
        Operation::Request(args) => BitokuInstruction::SendRequest(request_args(args)?),
    })
}

fn request_args(args: &RequestArgs) -> Result<SendRequestArgs> {
    let name = Name::new(&args.name)?;
    if !name.is_program_safe() {
        output::eprintln_line(&format!(
            "warning: name {:?} has characters outside [A-Za-z0-9./_+-]; the program will reject it",
            args.name
        ));
    }

    let payload = match (&args.data, &args.data_file) {
        (Some(inline), _) => inline.as_bytes().to_vec(),
        (None, Some(path)) => input::read_payload(path)?,
        (None, None) => Vec::new(),
    };

    Ok(SendRequestArgs::new(args.kind.into(), name)
        .client_id(args.client_id)
        .file_id(args.file_id)
        .position(args.position)
        .data(Data::new(&payload)?))
}
