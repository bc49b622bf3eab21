//! Submission against an in-memory ledger: stale blockhash recovery,
//! dropped transactions, confirmation timeout, on-chain failures and
//! transport retries.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use bitoku_client::{
    pda, BitokuClient, BitokuError, BitokuInstruction, Bookkeeper, Checkpoint,
    InstructionEncoder, KeyProvider, KeypairProvider, Name, ProgramErrorCode, RequestRecord, RequestType,
    SendRequestArgs, Submitter, TransactionAssembler,
};
use common::{fast_policy, Finality, MockNetwork};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;

fn client(network: Arc<MockNetwork>) -> BitokuClient<MockNetwork, KeypairProvider> {
    BitokuClient::new(
        network,
        KeypairProvider::new(Keypair::new()),
        Pubkey::new_unique(),
        200_000,
        fast_policy(),
    )
}

#[tokio::test(start_paused = true)]
async fn expired_blockhash_is_stale_then_fresh_one_succeeds() {
    let network = Arc::new(MockNetwork::confirming());
    let signer = KeypairProvider::new(Keypair::new());
    let ix = InstructionEncoder::new(Pubkey::new_unique())
        .encode(&signer.pubkey(), &BitokuInstruction::CreateClientAccount)
        .unwrap();

    let expired = Hash::new_unique();
    network.expire(expired);
    let checkpoint = Checkpoint { blockhash: expired, last_valid_block_height: 150 };
    let envelope = TransactionAssembler::new(200_000)
        .assemble(ix, &signer, checkpoint)
        .unwrap();

    let submitter = Submitter::new(network.clone(), fast_policy());
    assert_eq!(submitter.submit(&envelope).await, Err(BitokuError::StaleCheckpoint));
}

#[tokio::test(start_paused = true)]
async fn client_resigns_after_stale_blockhash() {
    let network = Arc::new(MockNetwork::confirming());
    let expired = Hash::new_unique();
    let fresh = Hash::new_unique();
    network.expire(expired);
    network.push_blockhash(expired);
    network.push_blockhash(fresh);

    let client = client(network.clone());
    let signature = client.create_client_account().await.unwrap();

    assert_eq!(network.blockhash_fetches(), 2);
    let sent = network.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message.recent_blockhash, fresh);
    assert_eq!(sent[0].signatures[0], signature);
}

#[tokio::test(start_paused = true)]
async fn stale_retries_are_bounded() {
    let network = Arc::new(MockNetwork::confirming());
    for _ in 0..3 {
        let h = Hash::new_unique();
        network.expire(h);
        network.push_blockhash(h);
    }
    let client = client(network.clone());

    assert_eq!(client.delete_client(0).await, Err(BitokuError::StaleCheckpoint));
    // first attempt plus max_checkpoint_retries
    assert_eq!(network.blockhash_fetches(), 3);
    assert!(network.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unresolved_confirmation_times_out_as_unknown() {
    let network = Arc::new(MockNetwork::new(Finality::Never));
    let client = client(network.clone());

    let err = client.create_client_account().await.unwrap_err();
    assert!(err.is_outcome_unknown());
    assert_matches!(err, BitokuError::ConfirmationTimeout { waited, .. } if waited >= Duration::from_secs(5));
    assert_eq!(network.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_confirmation_still_succeeds() {
    let network = Arc::new(MockNetwork::new(Finality::ConfirmAfter(10)));
    let client = client(network);
    assert!(client.delete_client(0).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn on_chain_failure_is_not_retried() {
    let rejection = BitokuError::RemoteRejection {
        reason: "custom program error: 0xa".to_string(),
        program_error: Some(ProgramErrorCode::ClientMismatch),
    };
    let network = Arc::new(MockNetwork::new(Finality::Fail(rejection.clone())));
    let client = client(network.clone());

    let args = SendRequestArgs::new(RequestType::CreateBucket, Name::new("bucket").unwrap());
    assert_eq!(client.send_request(args).await, Err(rejection));
    assert_eq!(network.send_calls(), 1);
    assert_eq!(network.blockhash_fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_send_and_poll_errors_are_retried() {
    let network = Arc::new(MockNetwork::confirming());
    network.fail_next_send(BitokuError::transport("connection reset"));
    network.fail_next_send(BitokuError::transport("connection reset"));
    network.fail_next_poll(BitokuError::transport("timeout"));
    let client = client(network.clone());

    assert!(client.create_client_account().await.is_ok());
    assert_eq!(network.send_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn transport_errors_surface_after_max_attempts() {
    let network = Arc::new(MockNetwork::confirming());
    for _ in 0..3 {
        network.fail_next_send(BitokuError::transport("refused"));
    }
    let client = client(network.clone());

    assert_matches!(client.create_client_account().await, Err(BitokuError::NetworkTransport(_)));
    assert_eq!(network.send_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn dropped_transaction_is_resigned_after_blockhash_expiry() {
    let network = Arc::new(MockNetwork::confirming().with_validity(3));
    network.drop_next_sends(1);
    let client = client(network.clone());

    let signature = client.create_client_account().await.unwrap();

    assert_eq!(network.blockhash_fetches(), 2);
    let sent = network.sent();
    assert_eq!(sent.len(), 2);
    assert_ne!(sent[0].message.recent_blockhash, sent[1].message.recent_blockhash);
    assert_eq!(sent[1].signatures[0], signature);
}

#[tokio::test(start_paused = true)]
async fn repeatedly_dropped_transaction_stops_at_the_retry_bound() {
    let network = Arc::new(MockNetwork::confirming().with_validity(3));
    network.drop_next_sends(3);
    let client = client(network.clone());

    let err = client.delete_client(0).await.unwrap_err();
    assert_eq!(err, BitokuError::StaleCheckpoint);
    assert!(!err.is_outcome_unknown());
    assert_eq!(network.blockhash_fetches(), 3);
    assert_eq!(network.sent().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn landed_but_uncommitted_is_not_treated_as_dropped() {
    let network = Arc::new(MockNetwork::new(Finality::ConfirmAfter(20)).with_validity(3));
    let client = client(network.clone());

    assert!(client.create_client_account().await.is_ok());
    assert_eq!(network.blockhash_fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn envelope_carries_compute_limit_then_program_instruction() {
    let network = Arc::new(MockNetwork::confirming());
    let client = client(network.clone());
    client.create_client_account().await.unwrap();

    let tx = &network.sent()[0];
    assert_eq!(tx.message.instructions.len(), 2);
    let first_program = tx.message.account_keys[tx.message.instructions[0].program_id_index as usize];
    let second_program = tx.message.account_keys[tx.message.instructions[1].program_id_index as usize];
    assert_eq!(first_program, solana_sdk::compute_budget::id());
    assert_eq!(second_program, *client.program_id());
    assert_eq!(tx.message.instructions[1].data, vec![1]);
    assert_eq!(tx.message.account_keys[0], client.caller());
}

#[tokio::test(start_paused = true)]
async fn reads_program_state() {
    let network = Arc::new(MockNetwork::confirming());
    let client = client(network.clone());
    assert_eq!(client.fetch_bookkeeper().await, Ok(None));

    let (bookkeeper, _) = pda::derive_bookkeeper(client.program_id()).unwrap();
    let mut raw = vec![0u8; Bookkeeper::LEN];
    raw[0] = 1;
    raw[32] = 1;
    network.set_account(bookkeeper, raw);

    let bk = client.fetch_bookkeeper().await.unwrap().unwrap();
    assert_eq!(bk.registered_ids(), vec![0]);

    let caller = client.caller();
    let (request, _) = pda::derive_request(client.program_id(), &caller).unwrap();
    let mut raw = vec![0u8; RequestRecord::LEN];
    raw[1..33].copy_from_slice(caller.as_ref());
    raw[34..40].copy_from_slice(b"bucket");
    network.set_account(request, raw);

    let rec = client.fetch_request_record(&caller).await.unwrap().unwrap();
    assert_eq!(rec.requester, caller);
    assert_eq!(rec.request_type, RequestType::CreateBucket);
    assert_eq!(rec.name.to_string(), "bucket");
}
