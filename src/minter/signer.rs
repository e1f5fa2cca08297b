//! Loading the service signer.

use solana_sdk::signature::{read_keypair_file, Keypair, Signer};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::minter::error::{MintError, Result};

/// Source of the service keypair.
pub trait SignerProvider {
    fn load(&self) -> Result<Keypair>;
}

/// A Solana CLI key file: a JSON array of the 64 secret key bytes.
#[derive(Debug, Clone)]
pub struct KeypairFile {
    path: PathBuf,
}

impl KeypairFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, reason: impl Into<String>) -> MintError {
        MintError::InvalidKeyFile {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl SignerProvider for KeypairFile {
    fn load(&self) -> Result<Keypair> {
        if self.path.as_os_str().is_empty() {
            return Err(self.error("a keypair path is required"));
        }
        if !self.path.is_file() {
            return Err(self.error("file not found"));
        }
        let keypair = read_keypair_file(&self.path).map_err(|e| self.error(e.to_string()))?;
        info!("Loaded signer {} from {}", keypair.pubkey(), self.path.display());
        Ok(keypair)
    }
}
