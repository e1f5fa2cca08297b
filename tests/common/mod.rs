//! In-memory ledger and diagnostics shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use nft_minter::minter::idl::discriminator;
use nft_minter::minter::types::NFT_MINT_PROGRAM_ID;
use nft_minter::minter::{DiagnosticSink, FailureContext, LedgerClient, Minter, MinterBuilder};
use nft_minter::{LedgerError, TransactionPackage};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_program;
use spl_token::instruction::TokenInstruction;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RENT_LAMPORTS: u64 = 1_461_600;

/// How the ledger answers the next submissions.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Apply and confirm
    Confirm,
    /// Fail every call with this error
    Fail(LedgerError),
    /// Wait before answering a submission
    Delay(Duration),
}

/// What a submission carried.
#[derive(Debug, Clone)]
pub struct Submission {
    pub instructions: Vec<Instruction>,
    pub signers: Vec<Pubkey>,
}

#[derive(Debug, Clone, Default)]
struct State {
    /// account -> owner
    accounts: HashMap<Pubkey, Pubkey>,
    /// token account -> amount
    balances: HashMap<Pubkey, u64>,
}

/// Ledger that applies a package all-or-nothing against an account map.
pub struct MemoryLedger {
    behavior: Mutex<Behavior>,
    state: Mutex<State>,
    submissions: Mutex<Vec<Submission>>,
    rent_calls: Mutex<usize>,
    rent_delay: Mutex<Option<Duration>>,
}

impl MemoryLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(Behavior::Confirm),
            state: Mutex::new(State::default()),
            submissions: Mutex::new(Vec::new()),
            rent_calls: Mutex::new(0),
            rent_delay: Mutex::new(None),
        })
    }

    /// Make the rent query take `wait` before answering.
    pub fn set_rent_delay(&self, wait: Duration) {
        *self.rent_delay.lock().unwrap() = Some(wait);
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn rent_calls(&self) -> usize {
        *self.rent_calls.lock().unwrap()
    }

    pub fn owner_of(&self, account: &Pubkey) -> Option<Pubkey> {
        self.state.lock().unwrap().accounts.get(account).copied()
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().unwrap().accounts.len()
    }

    pub fn balance_of(&self, token_account: &Pubkey) -> Option<u64> {
        self.state.lock().unwrap().balances.get(token_account).copied()
    }

    fn apply(&self, instructions: &[Instruction]) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        let mut staged = state.clone();
        for (index, ix) in instructions.iter().enumerate() {
            apply_instruction(&mut staged, ix)
                .map_err(|reason| LedgerError::Rejected(format!("instruction {}: {}", index, reason)))?;
        }
        *state = staged;
        Ok(())
    }
}

fn create(state: &mut State, account: Pubkey, owner: Pubkey) -> Result<(), String> {
    if state.accounts.contains_key(&account) {
        return Err(format!("account {} already in use", account));
    }
    state.accounts.insert(account, owner);
    Ok(())
}

fn apply_instruction(state: &mut State, ix: &Instruction) -> Result<(), String> {
    let key = |i: usize| ix.accounts.get(i).map(|meta| meta.pubkey).ok_or("missing account");

    if ix.program_id == system_program::ID {
        // CreateAccount: u32 tag, u64 lamports, u64 space, owner
        let owner = Pubkey::try_from(&ix.data[20..52]).map_err(|e| e.to_string())?;
        return create(state, key(1)?, owner);
    }
    if ix.program_id == spl_token::id() {
        return match TokenInstruction::unpack(&ix.data).map_err(|e| e.to_string())? {
            TokenInstruction::InitializeMint { .. } => match state.accounts.get(&key(0)?) {
                Some(owner) if *owner == spl_token::id() => Ok(()),
                _ => Err("mint account not allocated".to_string()),
            },
            TokenInstruction::MintTo { amount } => {
                let target = key(1)?;
                if !state.accounts.contains_key(&target) {
                    return Err("token account missing".to_string());
                }
                *state.balances.entry(target).or_default() += amount;
                Ok(())
            }
            other => Err(format!("unexpected token instruction {:?}", other)),
        };
    }
    if ix.program_id == spl_associated_token_account::id() {
        let account = key(1)?;
        state.accounts.entry(account).or_insert_with(spl_token::id);
        return Ok(());
    }
    if ix.program_id == NFT_MINT_PROGRAM_ID {
        let tag: [u8; 8] = ix.data[..8].try_into().map_err(|_| "short data".to_string())?;
        let config = key(1)?;
        if tag == discriminator("initialize") {
            return create(state, config, NFT_MINT_PROGRAM_ID);
        }
        if !state.accounts.contains_key(&config) {
            return Err("configuration account not initialized".to_string());
        }
        if tag == discriminator("updateConfig") {
            return Ok(());
        }
        if tag == discriminator("mintingNft") {
            create(state, key(3)?, Pubkey::default())?;
            return create(state, key(4)?, Pubkey::default());
        }
        return Err("unknown instruction".to_string());
    }
    Err(format!("unknown program {}", ix.program_id))
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn minimum_balance_for_rent_exemption(&self, _data_len: usize) -> Result<u64, LedgerError> {
        *self.rent_calls.lock().unwrap() += 1;
        let delay = *self.rent_delay.lock().unwrap();
        if let Some(wait) = delay {
            tokio::time::sleep(wait).await;
        }
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Fail(e) => Err(e),
            _ => Ok(RENT_LAMPORTS),
        }
    }

    async fn submit(&self, package: &TransactionPackage<'_>) -> Result<Signature, LedgerError> {
        let instructions: Vec<Instruction> = package.instructions().iter().cloned().collect();
        self.submissions.lock().unwrap().push(Submission {
            instructions: instructions.clone(),
            signers: package.signer_pubkeys(),
        });

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Fail(e) => return Err(e),
            Behavior::Delay(wait) => tokio::time::sleep(wait).await,
            Behavior::Confirm => {}
        }
        self.apply(&instructions)?;
        Ok(Signature::new_unique())
    }

    async fn token_balance(&self, token_account: &Pubkey) -> Result<u64, LedgerError> {
        self.balance_of(token_account)
            .ok_or_else(|| LedgerError::Rejected(format!("could not find account {}", token_account)))
    }
}

/// Sink that keeps every reported failure.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(FailureContext, LedgerError)>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<(FailureContext, LedgerError)> {
        self.events.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn submission_failed(&self, context: &FailureContext, cause: &LedgerError) {
        self.events.lock().unwrap().push((context.clone(), cause.clone()));
    }
}

pub fn test_minter(ledger: &Arc<MemoryLedger>, sink: &Arc<RecordingSink>) -> Minter {
    MinterBuilder::new()
        .with_submit_deadline(None)
        .with_diagnostics(sink.clone())
        .build(ledger.clone())
        .expect("minter")
}
