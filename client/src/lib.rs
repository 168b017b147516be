//! Client-side core for Percolator perpetual markets.
//!
//! Everything a front-end, keeper, or monitor needs short of key custody:
//! decoding the market's single slab account into typed state, encoding
//! program instructions with their account specs, margin-ratio math, and a
//! one-shot transaction submission pipeline with blockhash-expiry
//! tracking. Signing stays behind the [`tx::TransactionSender`] trait.

pub mod abi;
pub mod error;
pub mod health;
pub mod pda;
pub mod slab;
pub mod tx;
pub mod units;

pub use error::{ClientError, Result};
pub use health::{compute_health, AccountHealth, RiskLevel};
pub use pda::derive_vault_authority;
pub use slab::{Account, AccountKind, Slab};
pub use tx::{submit_instruction, ChainClient, SubmissionState, SubmitOptions, TransactionSender};
