//! Transaction submission pipeline
//!
//! One attempt per call: fetch a blockhash, hand the assembled message to
//! an external signer/broadcaster, then poll until the signature reaches
//! commitment or the blockhash validity window closes. No internal retry;
//! blind resubmission of a state-mutating instruction belongs to the
//! caller, who can first re-check on-chain state.

use std::thread;
use std::time::Duration;

use log::debug;
use solana_client::rpc_client::RpcClient;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::error::{ClientError, Result};

/// Lifecycle of a single submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    BlockhashFetched {
        blockhash: Hash,
        last_valid_block_height: u64,
    },
    Sent {
        signature: Signature,
        last_valid_block_height: u64,
    },
    Confirmed {
        signature: Signature,
    },
    Failed {
        message: String,
    },
    Expired {
        last_valid_block_height: u64,
        observed_height: u64,
    },
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::BlockhashFetched { .. } => "blockhash_fetched",
            SubmissionState::Sent { .. } => "sent",
            SubmissionState::Confirmed { .. } => "confirmed",
            SubmissionState::Failed { .. } => "failed",
            SubmissionState::Expired { .. } => "expired",
        }
    }
}

/// Network reads the pipeline needs. Implemented for [`RpcClient`];
/// tests swap in a scripted fake.
pub trait ChainClient {
    /// A recent blockhash and the last block height at which it is valid.
    fn latest_blockhash(&self) -> Result<(Hash, u64)>;

    /// Current block height at the client's commitment.
    fn block_height(&self) -> Result<u64>;

    /// Status of a submitted signature: `None` while unobserved,
    /// `Some(Err(msg))` when execution failed on-chain.
    fn signature_status(&self, signature: &Signature)
        -> Result<Option<std::result::Result<(), String>>>;
}

impl ChainClient for RpcClient {
    fn latest_blockhash(&self) -> Result<(Hash, u64)> {
        Ok(self.get_latest_blockhash_with_commitment(self.commitment())?)
    }

    fn block_height(&self) -> Result<u64> {
        Ok(self.get_block_height()?)
    }

    fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<std::result::Result<(), String>>> {
        let status = self.get_signature_status_with_commitment(signature, self.commitment())?;
        Ok(status.map(|r| r.map_err(|e| e.to_string())))
    }
}

/// External signing and broadcast. The pipeline never holds key material.
pub trait TransactionSender {
    fn sign_and_send(&self, message: Message) -> Result<Signature>;
}

/// Split an RPC send failure into an explicit cluster rejection versus a
/// transport problem. Sender implementations use this so preflight and
/// execution errors surface verbatim as [`ClientError::SubmissionRejected`].
pub fn classify_send_error(err: solana_client::client_error::ClientError) -> ClientError {
    match err.get_transaction_error() {
        Some(tx_err) => ClientError::SubmissionRejected {
            message: tx_err.to_string(),
        },
        None => ClientError::Rpc(err),
    }
}

#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Delay between confirmation polls.
    pub poll_interval: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Submit one instruction (with optional setup instructions ahead of it)
/// and block until it confirms, fails, or its blockhash expires.
///
/// Instruction order in the message is the caller's `setup` order followed
/// by `primary`; the fee payer is `payer`. On expiry the outcome is
/// unknown: the transaction may still land, so callers re-check state
/// before retrying.
pub fn submit_instruction<C: ChainClient, S: TransactionSender>(
    chain: &C,
    sender: &S,
    payer: &Pubkey,
    setup: &[Instruction],
    primary: Instruction,
    options: &SubmitOptions,
) -> Result<Signature> {
    let (blockhash, last_valid_block_height) = chain.latest_blockhash()?;
    let mut state = SubmissionState::BlockhashFetched {
        blockhash,
        last_valid_block_height,
    };
    debug!(
        "{}: blockhash {} valid through height {}",
        state.name(),
        blockhash,
        last_valid_block_height
    );

    let mut instructions = setup.to_vec();
    instructions.push(primary);
    let message = Message::new_with_blockhash(&instructions, Some(payer), &blockhash);

    let signature = sender.sign_and_send(message)?;
    state = SubmissionState::Sent {
        signature,
        last_valid_block_height,
    };
    debug!("{}: {}", state.name(), signature);

    state = confirm_signature(chain, &signature, last_valid_block_height, options)?;
    debug!("{}: {}", state.name(), signature);
    match state {
        SubmissionState::Confirmed { signature } => Ok(signature),
        SubmissionState::Failed { message } => Err(ClientError::SubmissionRejected { message }),
        SubmissionState::Expired {
            last_valid_block_height,
            observed_height,
        } => Err(ClientError::Expired {
            last_valid_block_height,
            observed_height,
        }),
        // confirm_signature only returns terminal states
        other => unreachable!("non-terminal state {}", other.name()),
    }
}

/// Poll a signature until it reaches commitment or the validity window
/// closes, returning the terminal [`SubmissionState`]. Expiry is strict:
/// `height == last_valid_block_height` still polls; only
/// `height > last_valid_block_height` expires the attempt.
pub fn confirm_signature<C: ChainClient>(
    chain: &C,
    signature: &Signature,
    last_valid_block_height: u64,
    options: &SubmitOptions,
) -> Result<SubmissionState> {
    loop {
        match chain.signature_status(signature)? {
            Some(Ok(())) => {
                return Ok(SubmissionState::Confirmed {
                    signature: *signature,
                });
            }
            Some(Err(message)) => {
                return Ok(SubmissionState::Failed { message });
            }
            None => {
                let observed_height = chain.block_height()?;
                if observed_height > last_valid_block_height {
                    return Ok(SubmissionState::Expired {
                        last_valid_block_height,
                        observed_height,
                    });
                }
                thread::sleep(options.poll_interval);
            }
        }
    }
}
