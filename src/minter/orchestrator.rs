//! Mint orchestration: validate, derive, build, submit.
//!
//! Input and derivation problems abort with a `MintError` before anything is
//! sent. Once a package reaches the ledger, failures are reported as
//! `MintResult::Failed` carrying the ledger's error kind, and are also handed
//! to the configured `DiagnosticSink`.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use spl_token::solana_program::program_pack::Pack;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::minter::address::{self, AddressCache};
use crate::minter::error::{LedgerError, Result};
use crate::minter::idl::ProgramHandle;
use crate::minter::instructions::{self, MintParams};
use crate::minter::ledger::LedgerClient;
use crate::types::{MintRequest, MintResult, SignerRef, TransactionPackage};

/// Where the orchestrator reports ledger failures it does not propagate.
pub trait DiagnosticSink: Send + Sync {
    fn submission_failed(&self, context: &FailureContext, cause: &LedgerError);
}

/// What was being attempted when the ledger failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    pub operation: &'static str,
    pub mint: Option<Pubkey>,
    pub recipient: Option<Pubkey>,
}

/// Default sink: log through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn submission_failed(&self, context: &FailureContext, cause: &LedgerError) {
        warn!(
            operation = context.operation,
            mint = ?context.mint,
            recipient = ?context.recipient,
            kind = cause.kind(),
            "Ledger failure: {}",
            cause
        );
    }
}

/// Mints NFTs through the `nft_mint` program.
pub struct Minter {
    pub(crate) program: ProgramHandle,
    pub(crate) metadata_program_id: Pubkey,
    pub(crate) ledger: Arc<dyn LedgerClient>,
    pub(crate) addresses: AddressCache,
    pub(crate) diagnostics: Arc<dyn DiagnosticSink>,
    pub(crate) default_deadline: Option<Duration>,
}

impl Minter {
    pub fn new(
        program: ProgramHandle,
        metadata_program_id: Pubkey,
        ledger: Arc<dyn LedgerClient>,
        addresses: AddressCache,
        diagnostics: Arc<dyn DiagnosticSink>,
        default_deadline: Option<Duration>,
    ) -> Self {
        Self {
            program,
            metadata_program_id,
            ledger,
            addresses,
            diagnostics,
            default_deadline,
        }
    }

    pub fn program(&self) -> &ProgramHandle {
        &self.program
    }

    pub fn addresses(&self) -> &AddressCache {
        &self.addresses
    }

    /// Mint one NFT to `request.recipient`.
    ///
    /// Returns `Err` only for problems detected before submission. Ledger
    /// failures produce `Ok(MintResult::Failed { .. })`.
    #[instrument(skip(self, request), fields(recipient = %request.recipient))]
    pub async fn mint_nft(&self, request: MintRequest<'_>) -> Result<MintResult> {
        // One budget for the whole mint, shared by every ledger call below.
        let deadline = request.deadline.or(self.default_deadline).map(Deadline::after);
        let recipient = self.addresses.parse("recipient", &request.recipient)?;
        instructions::validate_metadata(&request.name, &request.symbol, &request.uri)?;
        let authority = request.signer.pubkey();

        // Lives for this call only; signs the create and initialize steps.
        let mint = Keypair::new();
        let mint_key = mint.pubkey();

        let config = self.addresses.config_address(&self.program.program_id)?;
        let metadata = address::metadata_address(&self.metadata_program_id, &mint_key)?;
        let master_edition = address::master_edition_address(&self.metadata_program_id, &mint_key)?;
        let recipient_token_account = address::associated_token_address(&recipient, &mint_key);

        let context = FailureContext {
            operation: "mint_nft",
            mint: Some(mint_key),
            recipient: Some(recipient),
        };

        let rent_lamports = match with_deadline(
            deadline,
            self.ledger
                .minimum_balance_for_rent_exemption(spl_token::state::Mint::LEN),
        )
        .await
        {
            Ok(lamports) => lamports,
            Err(cause) => return Ok(self.failed(&context, cause)),
        };

        let params = MintParams {
            authority,
            mint: mint_key,
            recipient,
            recipient_token_account,
            config,
            metadata: metadata.address,
            master_edition: master_edition.address,
            metadata_program_id: self.metadata_program_id,
            rent_lamports,
            name: request.name,
            symbol: request.symbol,
            uri: request.uri,
        };
        let plan = instructions::build(&self.program, &params)?;

        let mint_signer: SignerRef = &mint;
        let package = TransactionPackage::new(plan.into_instructions(), vec![request.signer, mint_signer])?;
        debug!("Submitting {:?}", package);

        match with_deadline(deadline, self.ledger.submit(&package)).await {
            Ok(tx_id) => {
                info!("Minted {} to {} in {}", mint_key, recipient, tx_id);
                Ok(MintResult::Minted {
                    tx_id,
                    nft_address: mint_key,
                })
            }
            Err(cause) => Ok(self.failed(&context, cause)),
        }
    }

    /// Balance of `mint` held in `owner`'s associated token account.
    pub async fn token_balance(&self, mint: &str, owner: &str) -> Result<u64> {
        let mint = self.addresses.parse("mint", mint)?;
        let owner = self.addresses.parse("owner", owner)?;
        let account = address::associated_token_address(&owner, &mint);
        let deadline = self.default_deadline.map(Deadline::after);
        let balance = with_deadline(deadline, self.ledger.token_balance(&account)).await?;
        Ok(balance)
    }

    fn failed(&self, context: &FailureContext, cause: LedgerError) -> MintResult {
        self.diagnostics.submission_failed(context, &cause);
        MintResult::Failed { cause }
    }
}

/// Instant by which an operation must be done, fixed when it starts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub(crate) fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }
}

/// Bound a ledger call by the time left until `deadline`, if any.
pub(crate) async fn with_deadline<T, F>(
    deadline: Option<Deadline>,
    call: F,
) -> std::result::Result<T, LedgerError>
where
    F: Future<Output = std::result::Result<T, LedgerError>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline.at, call)
            .await
            .map_err(|_| LedgerError::Timeout(format!("no confirmation within {:?}", deadline.budget)))?,
        None => call.await,
    }
}
