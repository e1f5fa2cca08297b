//! Error kinds for the mint pipeline.
//!
//! `MintError` covers everything that aborts a request before (or instead of)
//! submission. `LedgerError` is what the ledger client reports once a package
//! has been handed over; the orchestrator folds it into a failed `MintResult`.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Failures reported by a [`LedgerClient`](crate::minter::ledger::LedgerClient).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Transport failure: connection refused, DNS, malformed response.
    #[error("network error: {0}")]
    Network(String),

    /// The cluster or the target program refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// No confirmation within the client timeout or the caller deadline.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl LedgerError {
    /// Short stable name of the error kind, used in summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Network(_) => "network",
            LedgerError::Rejected(_) => "rejected",
            LedgerError::Timeout(_) => "timeout",
        }
    }
}

/// Errors that abort a mint or deploy operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MintError {
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("no bump seed produced an off-curve address")]
    DerivationExhausted,

    #[error("account {0} must sign but no signer was supplied for it")]
    MissingSigner(Pubkey),

    #[error("cannot load keypair from {path}: {reason}")]
    InvalidKeyFile { path: String, reason: String },

    #[error("invalid program IDL: {0}")]
    InvalidIdl(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl MintError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        MintError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MintError>;
