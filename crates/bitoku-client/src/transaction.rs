//! Transaction assembly.
//!
//! Instruction order inside the envelope:
//! 1. compute unit limit
//! 2. the Bitoku program instruction

use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tracing::debug;

use crate::error::{BitokuError, BitokuResult};
use crate::keys::KeyProvider;
use crate::network::Checkpoint;

/// A signed transaction and its wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub signature: Signature,
    /// Blockhash the message was signed against, and how long it stays valid.
    pub checkpoint: Checkpoint,
    pub wire: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct TransactionAssembler {
    compute_unit_limit: u32,
}

impl TransactionAssembler {
    pub fn new(compute_unit_limit: u32) -> Self {
        Self { compute_unit_limit }
    }

    /// Instructions in envelope order.
    pub fn plan(&self, program_ix: Instruction) -> Vec<Instruction> {
        vec![
            ComputeBudgetInstruction::set_compute_unit_limit(self.compute_unit_limit),
            program_ix,
        ]
    }

    pub fn assemble(
        &self,
        program_ix: Instruction,
        signer: &dyn KeyProvider,
        checkpoint: Checkpoint,
    ) -> BitokuResult<SignedEnvelope> {
        let payer = signer.pubkey();
        let blockhash = checkpoint.blockhash;
        let message = Message::new_with_blockhash(&self.plan(program_ix), Some(&payer), &blockhash);
        if message.header.num_required_signatures != 1 {
            return Err(BitokuError::Signing(format!(
                "expected the fee payer as sole signer, message requires {}",
                message.header.num_required_signatures
            )));
        }

        let mut tx = Transaction::new_unsigned(message);
        let signature = signer.sign_message(&tx.message_data())?;
        tx.signatures = vec![signature];
        tx.verify()
            .map_err(|e| BitokuError::Signing(format!("signature does not verify: {e}")))?;

        let wire = bincode::serialize(&tx)
            .map_err(|e| BitokuError::Signing(format!("serialize transaction: {e}")))?;

        debug!(
            %signature,
            %blockhash,
            last_valid_block_height = checkpoint.last_valid_block_height,
            bytes = wire.len(),
            "assembled transaction"
        );
        Ok(SignedEnvelope { signature, checkpoint, wire })
    }
}
