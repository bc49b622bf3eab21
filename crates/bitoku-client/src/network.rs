//! Ledger network boundary.
//!
//! `Network` is the collaborator the submitter drives; `RpcNetwork` is the
//! JSON-RPC implementation. Errors are already classified into the client
//! taxonomy so callers can decide on retries without inspecting RPC details.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::{RpcError, RpcRequest, RpcResponseErrorData};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::error::{BitokuError, BitokuResult};

// JSON-RPC server errors that clear up once the node catches up.
const NODE_UNHEALTHY: i64 = -32005;
const BLOCK_NOT_AVAILABLE: i64 = -32004;
const SLOT_SKIPPED: i64 = -32007;
const BLOCK_STATUS_NOT_AVAILABLE_YET: i64 = -32014;
const MIN_CONTEXT_SLOT_NOT_REACHED: i64 = -32016;

/// A blockhash and the last block height at which it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Finality of a submitted signature as last observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// Unknown to the node.
    Pending,
    /// Landed, but below the requested commitment.
    Processed,
    Confirmed,
    /// Landed and failed; carries the classified failure.
    Failed(BitokuError),
}

#[async_trait]
pub trait Network: Send + Sync {
    /// Most recent blockhash to stamp the next envelope with.
    async fn latest_blockhash(&self) -> BitokuResult<Checkpoint>;

    /// Current block height, compared against `Checkpoint::last_valid_block_height`.
    async fn block_height(&self) -> BitokuResult<u64>;

    /// Submit wire bytes; returns as soon as the node accepts them.
    async fn send_raw_transaction(&self, wire: &[u8]) -> BitokuResult<Signature>;

    async fn signature_state(&self, signature: &Signature) -> BitokuResult<SignatureState>;

    /// Raw account data, `None` when the account does not exist.
    async fn account_data(&self, address: &Pubkey) -> BitokuResult<Option<Vec<u8>>>;
}

pub struct RpcNetwork {
    rpc: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcNetwork {
    pub fn new(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
            commitment,
        }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait]
impl Network for RpcNetwork {
    async fn latest_blockhash(&self) -> BitokuResult<Checkpoint> {
        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(classify)?;
        Ok(Checkpoint { blockhash, last_valid_block_height })
    }

    async fn block_height(&self) -> BitokuResult<u64> {
        self.rpc
            .get_block_height_with_commitment(self.commitment)
            .await
            .map_err(classify)
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> BitokuResult<Signature> {
        let params = json!([
            BASE64.encode(wire),
            {
                "encoding": "base64",
                "preflightCommitment": self.commitment.commitment.to_string(),
            }
        ]);
        let sig: String = self
            .rpc
            .send(RpcRequest::SendTransaction, params)
            .await
            .map_err(classify)?;
        sig.parse()
            .map_err(|e| BitokuError::transport(format!("node returned bad signature {sig}: {e}")))
    }

    async fn signature_state(&self, signature: &Signature) -> BitokuResult<SignatureState> {
        let statuses = self
            .rpc
            .get_signature_statuses(&[*signature])
            .await
            .map_err(classify)?
            .value;

        Ok(match statuses.into_iter().next().flatten() {
            None => SignatureState::Pending,
            Some(status) => match &status.err {
                Some(err) => SignatureState::Failed(BitokuError::from_transaction_error(err)),
                None if status.satisfies_commitment(self.commitment) => SignatureState::Confirmed,
                None => SignatureState::Processed,
            },
        })
    }

    async fn account_data(&self, address: &Pubkey) -> BitokuResult<Option<Vec<u8>>> {
        let account = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(classify)?
            .value;
        Ok(account.map(|a| a.data))
    }
}

/// Sort an RPC client error into stale / rejected / transient / local.
fn classify(err: ClientError) -> BitokuError {
    if let Some(tx_err) = err.get_transaction_error() {
        return BitokuError::from_transaction_error(&tx_err);
    }
    match err.kind() {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) | ClientErrorKind::Middleware(_) => {
            BitokuError::transport(&err)
        }
        ClientErrorKind::RpcError(RpcError::RpcRequestError(_)) => BitokuError::transport(&err),
        ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, data }) => {
            if matches!(data, RpcResponseErrorData::NodeUnhealthy { .. })
                || matches!(
                    *code,
                    NODE_UNHEALTHY
                        | BLOCK_NOT_AVAILABLE
                        | SLOT_SKIPPED
                        | BLOCK_STATUS_NOT_AVAILABLE_YET
                        | MIN_CONTEXT_SLOT_NOT_REACHED
                )
            {
                BitokuError::transport(message)
            } else if message.contains("Blockhash not found") {
                BitokuError::StaleCheckpoint
            } else {
                BitokuError::RemoteRejection {
                    reason: message.clone(),
                    program_error: None,
                }
            }
        }
        ClientErrorKind::SigningError(e) => BitokuError::Signing(e.to_string()),
        _ => BitokuError::Rpc(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_client::rpc_response::RpcSimulateTransactionResult;
    use solana_sdk::instruction::InstructionError;
    use solana_sdk::transaction::TransactionError;

    use crate::error::ProgramErrorCode;

    fn rpc_error(err: RpcError) -> ClientError {
        ClientError::from(ClientErrorKind::RpcError(err))
    }

    fn preflight_failure(err: serde_json::Value) -> ClientError {
        let result: RpcSimulateTransactionResult =
            serde_json::from_value(json!({
                "err": err,
                "logs": [],
                "accounts": null,
                "unitsConsumed": null,
                "returnData": null,
                "innerInstructions": null,
                "replacementBlockhash": null,
            }))
            .unwrap();
        rpc_error(RpcError::RpcResponseError {
            code: -32002,
            message: "Transaction simulation failed".to_string(),
            data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
        })
    }

    #[test]
    fn preflight_blockhash_not_found_is_stale() {
        let err = classify(preflight_failure(json!("BlockhashNotFound")));
        assert_eq!(err, BitokuError::StaleCheckpoint);
    }

    #[test]
    fn preflight_custom_error_is_rejection_with_program_code() {
        let err = classify(preflight_failure(json!({ "InstructionError": [1, { "Custom": 7 }] })));
        assert!(!err.is_transient());
        match err {
            BitokuError::RemoteRejection { program_error, .. } => {
                assert_eq!(program_error, Some(ProgramErrorCode::InvalidClientId));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn transaction_error_kind_is_decoded() {
        let err = classify(ClientError::from(ClientErrorKind::TransactionError(
            TransactionError::InstructionError(0, InstructionError::Custom(4)),
        )));
        assert!(matches!(
            err,
            BitokuError::RemoteRejection { program_error: Some(ProgramErrorCode::UnregisteredClient), .. }
        ));
    }

    #[test]
    fn blockhash_not_found_message_is_stale() {
        let err = classify(rpc_error(RpcError::RpcResponseError {
            code: -32002,
            message: "Blockhash not found".to_string(),
            data: RpcResponseErrorData::Empty,
        }));
        assert_eq!(err, BitokuError::StaleCheckpoint);
    }

    #[test]
    fn io_and_request_errors_are_transient() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        assert!(classify(ClientError::from(ClientErrorKind::Io(io))).is_transient());
        assert!(classify(rpc_error(RpcError::RpcRequestError(
            "Failed to deserialize RPC error response".to_string()
        )))
        .is_transient());
    }

    #[test]
    fn unhealthy_node_is_transient() {
        let err = classify(rpc_error(RpcError::RpcResponseError {
            code: NODE_UNHEALTHY,
            message: "Node is behind by 42 slots".to_string(),
            data: RpcResponseErrorData::NodeUnhealthy { num_slots_behind: Some(42) },
        }));
        assert!(err.is_transient(), "{err:?}");

        for code in [BLOCK_NOT_AVAILABLE, SLOT_SKIPPED, MIN_CONTEXT_SLOT_NOT_REACHED] {
            let err = classify(rpc_error(RpcError::RpcResponseError {
                code,
                message: "try again".to_string(),
                data: RpcResponseErrorData::Empty,
            }));
            assert!(err.is_transient(), "code {code}: {err:?}");
        }
    }

    #[test]
    fn other_response_errors_are_rejections() {
        let err = classify(rpc_error(RpcError::RpcResponseError {
            code: -32602,
            message: "Invalid params".to_string(),
            data: RpcResponseErrorData::Empty,
        }));
        assert!(matches!(err, BitokuError::RemoteRejection { program_error: None, .. }));
    }

    #[test]
    fn local_client_errors_are_not_retried() {
        let err = classify(rpc_error(RpcError::ForUser("bad argument".to_string())));
        assert!(matches!(err, BitokuError::Rpc(_)));
        assert!(!err.is_transient());

        let serde_err = serde_json::from_str::<u64>("not json").unwrap_err();
        let err = classify(ClientError::from(ClientErrorKind::SerdeJson(serde_err)));
        assert!(matches!(err, BitokuError::Rpc(_)));

        let err = classify(rpc_error(RpcError::ParseError("u64".to_string())));
        assert!(!err.is_transient());
    }
}
