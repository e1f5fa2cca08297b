//! Core request, result and transaction types of the minter.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Signature, Signer};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use crate::minter::error::{LedgerError, MintError, Result};

/// Borrowed signer usable across await points.
pub type SignerRef<'a> = &'a (dyn Signer + Send + Sync);

/// An ordered batch of instructions plus the signers that authorize it.
///
/// Every account flagged `is_signer` has a matching signer, and every signer
/// is required by some instruction. The first signer pays the fees.
pub struct TransactionPackage<'a> {
    instructions: NonEmpty<Instruction>,
    signers: Vec<SignerRef<'a>>,
}

impl<'a> TransactionPackage<'a> {
    pub fn new(instructions: Vec<Instruction>, signers: Vec<SignerRef<'a>>) -> Result<Self> {
        let instructions = NonEmpty::from_vec(instructions)
            .ok_or_else(|| MintError::invalid("instructions", "a transaction needs at least one instruction"))?;
        if signers.is_empty() {
            return Err(MintError::invalid("signers", "a fee payer is required"));
        }

        let provided: HashSet<Pubkey> = signers.iter().map(|signer| signer.pubkey()).collect();
        let mut required = HashSet::new();
        for ix in instructions.iter() {
            for meta in ix.accounts.iter().filter(|meta| meta.is_signer) {
                if !provided.contains(&meta.pubkey) {
                    return Err(MintError::MissingSigner(meta.pubkey));
                }
                required.insert(meta.pubkey);
            }
        }
        if let Some(unused) = provided.iter().find(|key| !required.contains(*key)) {
            return Err(MintError::invalid(
                "signers",
                format!("{} signs but no instruction requires it", unused),
            ));
        }

        Ok(Self {
            instructions,
            signers,
        })
    }

    pub fn instructions(&self) -> &NonEmpty<Instruction> {
        &self.instructions
    }

    pub fn signers(&self) -> &[SignerRef<'a>] {
        &self.signers
    }

    pub fn fee_payer(&self) -> Pubkey {
        self.signers[0].pubkey()
    }

    pub fn signer_pubkeys(&self) -> Vec<Pubkey> {
        self.signers.iter().map(|signer| signer.pubkey()).collect()
    }
}

impl fmt::Debug for TransactionPackage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionPackage")
            .field("instructions", &self.instructions.len())
            .field("signers", &self.signer_pubkeys())
            .finish()
    }
}

/// One mint call: who receives the NFT, its metadata and who pays.
pub struct MintRequest<'a> {
    /// Recipient wallet (base58)
    pub recipient: String,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    /// Service signer: fee payer, mint and freeze authority
    pub signer: SignerRef<'a>,
    /// Upper bound on the submission round trip
    pub deadline: Option<Duration>,
}

impl<'a> MintRequest<'a> {
    pub fn new(
        recipient: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        uri: impl Into<String>,
        signer: SignerRef<'a>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            name: name.into(),
            symbol: symbol.into(),
            uri: uri.into(),
            signer,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Outcome of a submitted mint. A failed mint never reports an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintResult {
    Minted {
        tx_id: Signature,
        nft_address: Pubkey,
    },
    Failed {
        cause: LedgerError,
    },
}

impl MintResult {
    pub fn success(&self) -> bool {
        matches!(self, MintResult::Minted { .. })
    }

    pub fn tx_id(&self) -> Option<String> {
        match self {
            MintResult::Minted { tx_id, .. } => Some(tx_id.to_string()),
            MintResult::Failed { .. } => None,
        }
    }

    pub fn nft_address(&self) -> Option<Pubkey> {
        match self {
            MintResult::Minted { nft_address, .. } => Some(*nft_address),
            MintResult::Failed { .. } => None,
        }
    }

    pub fn cause(&self) -> Option<&LedgerError> {
        match self {
            MintResult::Minted { .. } => None,
            MintResult::Failed { cause } => Some(cause),
        }
    }

    pub fn summary(&self) -> MintSummary {
        MintSummary {
            success: self.success(),
            tx_id: self.tx_id(),
            nft_address: self.nft_address().map(|key| key.to_string()),
            error: self.cause().map(|cause| cause.to_string()),
            error_kind: self.cause().map(|cause| cause.kind().to_string()),
        }
    }
}

/// Flat, serializable view of a [`MintResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintSummary {
    pub success: bool,
    pub tx_id: Option<String>,
    pub nft_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}
