//! One-off administration of the program configuration account.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tracing::{info, instrument};

use crate::minter::error::Result;
use crate::minter::instructions;
use crate::minter::orchestrator::{with_deadline, Deadline, FailureContext, Minter};
use crate::types::{SignerRef, TransactionPackage};

impl Minter {
    /// Create the configuration account owned by `authority`.
    ///
    /// Fails with a `Rejected` ledger error if the account already exists.
    #[instrument(skip(self, authority), fields(authority = %authority.pubkey()))]
    pub async fn initialize(&self, authority: SignerRef<'_>, update_authority: Pubkey) -> Result<Signature> {
        let config = self.addresses.config_address(&self.program.program_id)?;
        let ix = instructions::initialize_config(&self.program, &authority.pubkey(), &config, &update_authority)?;
        let signature = self.submit_config(ix, authority, "initialize").await?;
        info!("Configuration {} initialized in {}", config.address, signature);
        Ok(signature)
    }

    /// Hand the configuration account over to `authority` with a new update authority.
    #[instrument(skip(self, authority), fields(authority = %authority.pubkey()))]
    pub async fn update_config(&self, authority: SignerRef<'_>, update_authority: Pubkey) -> Result<Signature> {
        let config = self.addresses.config_address(&self.program.program_id)?;
        let ix = instructions::update_config(&self.program, &authority.pubkey(), &config, &update_authority)?;
        let signature = self.submit_config(ix, authority, "update_config").await?;
        info!("Configuration {} updated in {}", config.address, signature);
        Ok(signature)
    }

    async fn submit_config(
        &self,
        ix: solana_sdk::instruction::Instruction,
        authority: SignerRef<'_>,
        operation: &'static str,
    ) -> Result<Signature> {
        let package = TransactionPackage::new(vec![ix], vec![authority])?;
        let deadline = self.default_deadline.map(Deadline::after);
        match with_deadline(deadline, self.ledger.submit(&package)).await {
            Ok(signature) => Ok(signature),
            Err(cause) => {
                let context = FailureContext {
                    operation,
                    mint: None,
                    recipient: None,
                };
                self.diagnostics.submission_failed(&context, &cause);
                Err(cause.into())
            }
        }
    }
}
