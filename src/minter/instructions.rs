//! Instruction assembly for minting and for the configuration account.
//!
//! Nothing here performs I/O. Minting is modelled as five explicit steps that
//! must land in one transaction and in this order, since each step consumes
//! state created by the previous one.

use borsh::BorshSerialize;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::{system_program, sysvar};
use spl_token::solana_program::program_pack::Pack;
use std::fmt;
use tracing::{debug, instrument};

use crate::minter::error::{MintError, Result};
use crate::minter::idl::{InstructionArgs, ProgramHandle};
use crate::minter::types::{ProgramAddress, MAX_NAME_LENGTH, MAX_SYMBOL_LENGTH, MAX_URI_LENGTH};

/// NFTs have no fractional units.
pub const NFT_DECIMALS: u8 = 0;
/// Supply minted to the recipient.
pub const NFT_SUPPLY: u64 = 1;

/// The stages of a mint, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MintStep {
    /// Allocate and fund the mint account, owned by the token program
    CreateMintAccount,
    /// Initialize the account as a zero-decimal mint
    InitializeMint,
    /// Create the recipient's associated token account if missing
    CreateAssociatedAccount,
    /// Mint the single unit to the recipient
    MintOne,
    /// Call the mint program to write metadata and master edition
    RecordMetadata,
}

impl MintStep {
    pub const ALL: [MintStep; 5] = [
        MintStep::CreateMintAccount,
        MintStep::InitializeMint,
        MintStep::CreateAssociatedAccount,
        MintStep::MintOne,
        MintStep::RecordMetadata,
    ];

    /// Index of the step within a submitted transaction.
    pub fn position(&self) -> usize {
        match self {
            MintStep::CreateMintAccount => 0,
            MintStep::InitializeMint => 1,
            MintStep::CreateAssociatedAccount => 2,
            MintStep::MintOne => 3,
            MintStep::RecordMetadata => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MintStep::CreateMintAccount => "create_mint_account",
            MintStep::InitializeMint => "initialize_mint",
            MintStep::CreateAssociatedAccount => "create_associated_account",
            MintStep::MintOne => "mint_one",
            MintStep::RecordMetadata => "record_metadata",
        }
    }
}

impl fmt::Display for MintStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of the program's `minting_nft` instruction.
#[derive(Debug, Clone, BorshSerialize)]
pub struct MintingNftArgs {
    pub nonce_config: u8,
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

impl InstructionArgs for MintingNftArgs {
    const NAME: &'static str = "mintingNft";
    const ARG_COUNT: usize = 4;
}

/// Arguments of the program's `initialize` instruction.
#[derive(Debug, Clone, BorshSerialize)]
pub struct InitializeArgs {
    pub config_nonce: u8,
    pub update_authority: Pubkey,
}

impl InstructionArgs for InitializeArgs {
    const NAME: &'static str = "initialize";
    const ARG_COUNT: usize = 2;
}

/// Arguments of the program's `update_config` instruction.
#[derive(Debug, Clone, BorshSerialize)]
pub struct UpdateConfigArgs {
    pub config_nonce: u8,
    pub update_authority: Pubkey,
}

impl InstructionArgs for UpdateConfigArgs {
    const NAME: &'static str = "updateConfig";
    const ARG_COUNT: usize = 2;
}

/// Everything the builder needs for one mint. Addresses are already derived.
#[derive(Debug, Clone)]
pub struct MintParams {
    /// Service signer: fee payer, mint and freeze authority
    pub authority: Pubkey,
    /// Fresh mint address (ephemeral keypair)
    pub mint: Pubkey,
    pub recipient: Pubkey,
    pub recipient_token_account: Pubkey,
    pub config: ProgramAddress,
    pub metadata: Pubkey,
    pub master_edition: Pubkey,
    pub metadata_program_id: Pubkey,
    /// Rent-exempt balance for a mint account
    pub rent_lamports: u64,
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

/// The five mint instructions, tagged with their step.
#[derive(Debug, Clone)]
pub struct MintPlan {
    steps: [(MintStep, Instruction); 5],
}

impl MintPlan {
    /// Steps with their instructions, in submission order.
    pub fn steps(&self) -> impl Iterator<Item = (MintStep, &Instruction)> {
        self.steps.iter().map(|(step, ix)| (*step, ix))
    }

    pub fn step(&self, step: MintStep) -> &Instruction {
        &self.steps[step.position()].1
    }

    pub fn instructions(&self) -> Vec<Instruction> {
        self.steps.iter().map(|(_, ix)| ix.clone()).collect()
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.steps.into_iter().map(|(_, ix)| ix).collect()
    }
}

/// Check metadata fields against the metadata program's limits.
pub fn validate_metadata(name: &str, symbol: &str, uri: &str) -> Result<()> {
    check_len("name", name, MAX_NAME_LENGTH)?;
    check_len("symbol", symbol, MAX_SYMBOL_LENGTH)?;
    check_len("uri", uri, MAX_URI_LENGTH)?;
    Ok(())
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(MintError::invalid(
            field,
            format!("{} bytes, at most {} allowed", value.len(), max),
        ));
    }
    Ok(())
}

/// Assemble the mint plan.
#[instrument(skip_all, fields(mint = %params.mint, recipient = %params.recipient))]
pub fn build(program: &ProgramHandle, params: &MintParams) -> Result<MintPlan> {
    validate_metadata(&params.name, &params.symbol, &params.uri)?;

    let token_program = spl_token::id();

    let create_mint_account = create_account(
        &params.authority,
        &params.mint,
        params.rent_lamports,
        spl_token::state::Mint::LEN as u64,
        &token_program,
    );

    let initialize_mint = spl_token::instruction::initialize_mint(
        &token_program,
        &params.mint,
        &params.authority,
        Some(&params.authority),
        NFT_DECIMALS,
    )
    .map_err(|e| MintError::invalid("mint", e.to_string()))?;

    // A no-op on-chain when the recipient already holds an account for the mint.
    let create_associated_account =
        spl_associated_token_account::instruction::create_associated_token_account_idempotent(
            &params.authority,
            &params.recipient,
            &params.mint,
            &token_program,
        );

    let mint_one = spl_token::instruction::mint_to(
        &token_program,
        &params.mint,
        &params.recipient_token_account,
        &params.authority,
        &[],
        NFT_SUPPLY,
    )
    .map_err(|e| MintError::invalid("mint", e.to_string()))?;

    let record_metadata = minting_nft(program, params)?;

    debug!("Built mint plan for {}", params.mint);

    Ok(MintPlan {
        steps: [
            (MintStep::CreateMintAccount, create_mint_account),
            (MintStep::InitializeMint, initialize_mint),
            (MintStep::CreateAssociatedAccount, create_associated_account),
            (MintStep::MintOne, mint_one),
            (MintStep::RecordMetadata, record_metadata),
        ],
    })
}

#[allow(deprecated)]
fn create_account(
    payer: &Pubkey,
    new_account: &Pubkey,
    lamports: u64,
    space: u64,
    owner: &Pubkey,
) -> Instruction {
    solana_sdk::system_instruction::create_account(payer, new_account, lamports, space, owner)
}

#[allow(deprecated)]
fn minting_nft(program: &ProgramHandle, params: &MintParams) -> Result<Instruction> {
    let args = MintingNftArgs {
        nonce_config: params.config.bump,
        name: params.name.clone(),
        symbol: params.symbol.clone(),
        uri: params.uri.clone(),
    };
    program.instruction(
        &args,
        &[
            ("signer", params.authority),
            ("configuration", params.config.address),
            ("mint", params.mint),
            ("metadata", params.metadata),
            ("masteredition", params.master_edition),
            ("tokenMetadataProgram", params.metadata_program_id),
            ("tokenProgram", spl_token::id()),
            ("systemProgram", system_program::ID),
            ("rent", sysvar::rent::ID),
            ("clock", sysvar::clock::ID),
            ("recentBlockhashes", sysvar::recent_blockhashes::ID),
            ("instructionSysvarAccount", sysvar::instructions::ID),
        ],
    )
}

/// The single instruction that creates the program configuration account.
pub fn initialize_config(
    program: &ProgramHandle,
    signer: &Pubkey,
    config: &ProgramAddress,
    update_authority: &Pubkey,
) -> Result<Instruction> {
    let args = InitializeArgs {
        config_nonce: config.bump,
        update_authority: *update_authority,
    };
    program.instruction(
        &args,
        &[
            ("signer", *signer),
            ("configuration", config.address),
            ("tokenProgram", spl_token::id()),
            ("systemProgram", system_program::ID),
            ("rent", sysvar::rent::ID),
        ],
    )
}

/// Replace owner and update authority of an existing configuration account.
pub fn update_config(
    program: &ProgramHandle,
    signer: &Pubkey,
    config: &ProgramAddress,
    update_authority: &Pubkey,
) -> Result<Instruction> {
    let args = UpdateConfigArgs {
        config_nonce: config.bump,
        update_authority: *update_authority,
    };
    program.instruction(
        &args,
        &[("signer", *signer), ("configuration", config.address)],
    )
}
