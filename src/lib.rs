//! nft-minter - Mint single-edition NFTs through the `nft_mint` Solana program
//!
//! A mint is one atomic transaction: create the mint account, initialize it,
//! create the recipient's associated token account, mint one unit and record
//! the Metaplex metadata and master edition through the program.

pub mod minter;
pub mod types;

// Re-export main types for convenience
pub use minter::{Minter, MinterBuilder, MintError, LedgerError};
pub use types::{MintRequest, MintResult, MintSummary, SignerRef, TransactionPackage};
