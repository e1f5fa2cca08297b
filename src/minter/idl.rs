//! Anchor IDL loading and instruction encoding for the mint program.
//!
//! The IDL is the source of truth for instruction names, account order and
//! account flags. Instruction data is the 8-byte Anchor sighash followed by
//! the borsh-encoded arguments.

use borsh::BorshSerialize;
use serde::Deserialize;
use solana_sdk::hash::hashv;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::minter::error::{MintError, Result};

const BUNDLED_IDL: &str = include_str!("../../idl/nft_mint.json");

/// Parsed Anchor IDL (only the parts the client needs).
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramIdl {
    pub version: String,
    pub name: String,
    pub instructions: Vec<IdlInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdlInstruction {
    pub name: String,
    pub accounts: Vec<IdlAccountItem>,
    #[serde(default)]
    pub args: Vec<IdlField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdlAccountItem {
    pub name: String,
    pub is_mut: bool,
    pub is_signer: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdlField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: serde_json::Value,
}

impl ProgramIdl {
    /// The IDL of the `nft_mint` program shipped with this crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_IDL)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| MintError::InvalidIdl(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MintError::InvalidIdl(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn instruction(&self, name: &str) -> Result<&IdlInstruction> {
        self.instructions
            .iter()
            .find(|ix| ix.name == name)
            .ok_or_else(|| {
                MintError::invalid(
                    "instruction",
                    format!("`{}` is not an instruction of program `{}`", name, self.name),
                )
            })
    }
}

/// Arguments of one program instruction, encoded in declaration order.
pub trait InstructionArgs: BorshSerialize {
    /// Instruction name as it appears in the IDL.
    const NAME: &'static str;
    /// Number of arguments the encoding carries.
    const ARG_COUNT: usize;
}

/// Anchor sighash: first 8 bytes of `sha256("global:<snake_name>")`.
pub fn discriminator(idl_name: &str) -> [u8; 8] {
    let preimage = format!("global:{}", to_snake_case(idl_name));
    let hash = hashv(&[preimage.as_bytes()]);
    let mut sighash = [0u8; 8];
    sighash.copy_from_slice(&hash.to_bytes()[..8]);
    sighash
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// A deployed program together with its IDL.
#[derive(Debug, Clone)]
pub struct ProgramHandle {
    pub program_id: Pubkey,
    idl: Arc<ProgramIdl>,
}

impl ProgramHandle {
    pub fn new(program_id: Pubkey, idl: ProgramIdl) -> Self {
        Self {
            program_id,
            idl: Arc::new(idl),
        }
    }

    pub fn idl(&self) -> &ProgramIdl {
        &self.idl
    }

    /// Encode `args` and resolve `accounts` (by IDL name) into an instruction.
    ///
    /// Accounts follow IDL order and flags. Supplied accounts the IDL does not
    /// name are appended read-only after the declared ones.
    pub fn instruction<A: InstructionArgs>(
        &self,
        args: &A,
        accounts: &[(&str, Pubkey)],
    ) -> Result<Instruction> {
        let declared = self.idl.instruction(A::NAME)?;
        if declared.args.len() != A::ARG_COUNT {
            return Err(MintError::invalid(
                "args",
                format!(
                    "`{}` takes {} arguments in the IDL, {} supplied",
                    A::NAME,
                    declared.args.len(),
                    A::ARG_COUNT
                ),
            ));
        }

        let mut metas = Vec::with_capacity(accounts.len().max(declared.accounts.len()));
        for item in &declared.accounts {
            let (_, pubkey) = accounts
                .iter()
                .find(|(name, _)| *name == item.name)
                .ok_or_else(|| {
                    MintError::invalid(
                        "accounts",
                        format!("`{}` requires account `{}`", A::NAME, item.name),
                    )
                })?;
            metas.push(AccountMeta {
                pubkey: *pubkey,
                is_signer: item.is_signer,
                is_writable: item.is_mut,
            });
        }
        for (name, pubkey) in accounts {
            if !declared.accounts.iter().any(|item| item.name == *name) {
                debug!("Passing `{}` as a trailing account of `{}`", name, A::NAME);
                metas.push(AccountMeta::new_readonly(*pubkey, false));
            }
        }

        let mut data = discriminator(A::NAME).to_vec();
        args.serialize(&mut data)
            .map_err(|e| MintError::invalid("args", e.to_string()))?;

        Ok(Instruction {
            program_id: self.program_id,
            accounts: metas,
            data,
        })
    }
}
