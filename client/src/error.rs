//! Client error taxonomy

use thiserror::Error;

/// Errors surfaced by the client library.
///
/// Decode and encode failures are local and recoverable: no partial
/// structure is ever returned. Submission failures are always surfaced to
/// the caller with the underlying message intact — nothing is retried
/// internally and nothing is swallowed.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The slab buffer is too short for a fixed region, or the accounts
    /// table is inconsistent with `max_accounts`. Treat as "no data yet"
    /// and retry the fetch.
    #[error("malformed slab: {reason}")]
    MalformedSlab { reason: &'static str },

    /// Supplied pubkey list does not match an instruction's account spec.
    /// Raised before any network call.
    #[error("account count mismatch: expected {expected}, got {got}")]
    MalformedInstruction { expected: usize, got: usize },

    /// The cluster explicitly rejected the transaction (simulation or
    /// execution failure). Message is the underlying error, verbatim.
    #[error("transaction rejected: {message}")]
    SubmissionRejected { message: String },

    /// The blockhash validity window elapsed without a definitive result.
    /// Unknown outcome: re-check on-chain state before retrying.
    #[error(
        "blockhash expired: observed height {observed_height} > last valid {last_valid_block_height}"
    )]
    Expired {
        last_valid_block_height: u64,
        observed_height: u64,
    },

    /// RPC transport failure.
    #[error("rpc error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
