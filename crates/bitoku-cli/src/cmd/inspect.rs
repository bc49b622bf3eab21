use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use bitoku_client::{pda, RpcNetwork, StateReader};

use crate::args::Cli;
use crate::cmd;
use crate::output;

#[derive(Debug, Serialize)]
pub struct BookkeeperOut {
    pub address: String,
    pub next_id: u8,
    pub registered: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct RecordOut {
    pub address: String,
    pub client_id: u8,
    pub requester: String,
    pub request_type: String,
    pub name: String,
    pub file_id: u8,
    pub position: Option<u64>,
    pub data_preview_hex: String,
}

#[derive(Debug, Serialize)]
pub struct InspectOut {
    pub program_id: String,
    pub owner: String,
    pub bookkeeper: Option<BookkeeperOut>,
    pub request: Option<RecordOut>,
}

pub async fn run(cli: &Cli, owner: Option<&str>) -> Result<()> {
    let cfg = cmd::resolve_config(cli)?;
    let program_id = cfg.program_id()?;
    let owner = cmd::resolve_address(cli, owner)?;
    let network = Arc::new(RpcNetwork::new(&cfg.rpc_url, cfg.commitment()?));
    let reader = StateReader::new(network, program_id, cfg.submit.retry.clone());

    let (bk_addr, _) = pda::derive_bookkeeper(&program_id)?;
    let (req_addr, _) = pda::derive_request(&program_id, &owner)?;

    let bookkeeper = reader.fetch_bookkeeper().await?.map(|bk| BookkeeperOut {
        address: bk_addr.to_string(),
        next_id: bk.next_id,
        registered: bk.registered_ids(),
    });

    let request = reader.fetch_request_record(&owner).await?.map(|rec| {
        let tail = rec.tail.content();
        RecordOut {
            address: req_addr.to_string(),
            client_id: rec.client_id,
            requester: rec.requester.to_string(),
            request_type: rec.request_type.as_str().to_string(),
            name: rec.name.to_string(),
            file_id: rec.file_id,
            position: rec.position(),
            data_preview_hex: hex::encode(&tail[..tail.len().min(64)]),
        }
    });

    if bookkeeper.is_none() {
        output::status(false, "bookkeeper account not found; run `bitoku init`")?;
    }
    output::print(&InspectOut {
        program_id: program_id.to_string(),
        owner: owner.to_string(),
        bookkeeper,
        request,
    })
}
