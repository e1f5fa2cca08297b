//! Program ids, seed constants and configuration for the minter.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::minter::error::{MintError, Result};

/// Declared id of the `nft_mint` program.
pub const NFT_MINT_PROGRAM_ID: Pubkey = pubkey!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

/// Metaplex token metadata program.
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Seed of the program-wide configuration account.
pub const CONFIG_SEED: &[u8] = b"mint";
pub const METADATA_SEED: &[u8] = b"metadata";
pub const EDITION_SEED: &[u8] = b"edition";

// Bounds enforced by the metadata program on `create_metadata_accounts`.
pub const MAX_NAME_LENGTH: usize = 32;
pub const MAX_SYMBOL_LENGTH: usize = 10;
pub const MAX_URI_LENGTH: usize = 200;

/// A program-derived address and the bump that pushed it off the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramAddress {
    pub address: Pubkey,
    pub bump: u8,
}

/// Public Solana clusters the CLI can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    MainnetBeta,
    Testnet,
    Devnet,
}

impl Cluster {
    /// Public RPC endpoint for the cluster.
    pub fn url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Testnet => "testnet",
            Cluster::Devnet => "devnet",
        };
        f.write_str(name)
    }
}

/// Minter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MintConfig {
    /// Target cluster
    pub cluster: Cluster,
    /// Explicit RPC endpoint, overrides the cluster url
    pub rpc_url: Option<String>,
    /// Id of the deployed `nft_mint` program (base58)
    pub program_id: String,
    /// Id of the token metadata program (base58)
    pub metadata_program_id: String,
    /// RPC request timeout in seconds
    pub rpc_timeout_seconds: u64,
    /// Default deadline for a single submission, if the request sets none
    pub submit_deadline_seconds: Option<u64>,
    /// Max entries held by the address cache
    pub max_cache_entries: u64,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            rpc_url: None,
            program_id: NFT_MINT_PROGRAM_ID.to_string(),
            metadata_program_id: TOKEN_METADATA_PROGRAM_ID.to_string(),
            rpc_timeout_seconds: 30,
            submit_deadline_seconds: Some(60),
            max_cache_entries: 10_000,
        }
    }
}

impl MintConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MintError::invalid("config", format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            MintError::invalid("config", format!("malformed {}: {}", path.display(), e))
        })
    }

    /// RPC endpoint: the explicit url if set, else the cluster default.
    pub fn endpoint(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.cluster.url().to_string())
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_seconds)
    }

    pub fn submit_deadline(&self) -> Option<Duration> {
        self.submit_deadline_seconds.map(Duration::from_secs)
    }

    pub fn program_id(&self) -> Result<Pubkey> {
        parse_program_id("program_id", &self.program_id)
    }

    pub fn metadata_program_id(&self) -> Result<Pubkey> {
        parse_program_id("metadata_program_id", &self.metadata_program_id)
    }
}

fn parse_program_id(field: &'static str, value: &str) -> Result<Pubkey> {
    value
        .parse()
        .map_err(|e| MintError::invalid(field, format!("`{}` is not a valid address: {}", value, e)))
}
