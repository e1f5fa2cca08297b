//! NFT minting against the `nft_mint` Anchor program.
//!
//! [`MinterBuilder`] wires the pieces together: a [`ProgramHandle`] built from
//! the program id and IDL, an [`AddressCache`], a [`LedgerClient`] and a
//! [`DiagnosticSink`].

pub mod address;
pub mod deploy;
pub mod error;
pub mod idl;
pub mod instructions;
pub mod ledger;
pub mod orchestrator;
pub mod signer;
pub mod types;

pub use address::AddressCache;
pub use error::{LedgerError, MintError, Result};
pub use idl::{ProgramHandle, ProgramIdl};
pub use instructions::{MintPlan, MintStep};
pub use ledger::{LedgerClient, RpcLedgerClient};
pub use orchestrator::{DiagnosticSink, FailureContext, Minter, TracingDiagnostics};
pub use signer::{KeypairFile, SignerProvider};
pub use types::{Cluster, MintConfig, ProgramAddress};

use std::sync::Arc;
use tracing::info;

/// Builder for creating a [`Minter`] with custom configuration.
pub struct MinterBuilder {
    config: MintConfig,
    idl: Option<ProgramIdl>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl MinterBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: MintConfig::default(),
            idl: None,
            diagnostics: None,
        }
    }

    /// Start from an existing configuration.
    pub fn with_config(mut self, config: MintConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cluster(mut self, cluster: Cluster) -> Self {
        self.config.cluster = cluster;
        self
    }

    /// Override the cluster's RPC endpoint.
    pub fn with_rpc_url(mut self, url: String) -> Self {
        self.config.rpc_url = Some(url);
        self
    }

    pub fn with_program_id(mut self, program_id: String) -> Self {
        self.config.program_id = program_id;
        self
    }

    pub fn with_metadata_program_id(mut self, program_id: String) -> Self {
        self.config.metadata_program_id = program_id;
        self
    }

    /// Set RPC request timeout in seconds.
    pub fn with_rpc_timeout(mut self, seconds: u64) -> Self {
        self.config.rpc_timeout_seconds = seconds;
        self
    }

    /// Set the default submission deadline in seconds, `None` for unbounded.
    pub fn with_submit_deadline(mut self, seconds: Option<u64>) -> Self {
        self.config.submit_deadline_seconds = seconds;
        self
    }

    pub fn with_max_cache_entries(mut self, max_entries: u64) -> Self {
        self.config.max_cache_entries = max_entries;
        self
    }

    /// Use this IDL instead of the bundled one.
    pub fn with_idl(mut self, idl: ProgramIdl) -> Self {
        self.idl = Some(idl);
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Build the minter configuration.
    pub fn build_config(&self) -> MintConfig {
        self.config.clone()
    }

    /// Build a minter on top of the given ledger.
    pub fn build(self, ledger: Arc<dyn LedgerClient>) -> Result<Minter> {
        let program_id = self.config.program_id()?;
        let metadata_program_id = self.config.metadata_program_id()?;
        let idl = match self.idl {
            Some(idl) => idl,
            None => ProgramIdl::bundled()?,
        };
        info!("Minter for program {} ({} v{})", program_id, idl.name, idl.version);

        Ok(Minter::new(
            ProgramHandle::new(program_id, idl),
            metadata_program_id,
            ledger,
            AddressCache::new(self.config.max_cache_entries),
            self.diagnostics.unwrap_or_else(|| Arc::new(TracingDiagnostics)),
            self.config.submit_deadline(),
        ))
    }

    /// Build a minter talking to the configured RPC endpoint.
    pub fn connect(self) -> Result<Minter> {
        let ledger = RpcLedgerClient::new(self.config.endpoint(), self.config.rpc_timeout());
        self.build(Arc::new(ledger))
    }
}

impl Default for MinterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minter_builder() {
        let config = MinterBuilder::new()
            .with_cluster(Cluster::Devnet)
            .with_rpc_timeout(5)
            .with_submit_deadline(None)
            .with_max_cache_entries(16)
            .build_config();

        assert_eq!(config.cluster, Cluster::Devnet);
        assert_eq!(config.endpoint(), "https://api.devnet.solana.com");
        assert_eq!(config.rpc_timeout_seconds, 5);
        assert_eq!(config.submit_deadline(), None);
        assert_eq!(config.max_cache_entries, 16);
    }

    #[test]
    fn test_minter_builder_defaults() {
        let config = MinterBuilder::new().build_config();

        assert_eq!(config.cluster, Cluster::MainnetBeta);
        assert_eq!(config.program_id().unwrap(), types::NFT_MINT_PROGRAM_ID);
        assert_eq!(config.metadata_program_id().unwrap(), types::TOKEN_METADATA_PROGRAM_ID);
        assert_eq!(config.rpc_timeout_seconds, 30);
    }

    #[test]
    fn test_build_rejects_bad_program_id() {
        let ledger: Arc<dyn LedgerClient> = Arc::new(RpcLedgerClient::new(
            "http://127.0.0.1:8899".to_string(),
            std::time::Duration::from_secs(1),
        ));
        let result = MinterBuilder::new()
            .with_program_id("not-a-key".to_string())
            .build(ledger);

        assert!(matches!(result, Err(MintError::InvalidParameter { field: "program_id", .. })));
    }
}
