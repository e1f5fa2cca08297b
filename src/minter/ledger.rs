//! Ledger client abstraction and its Solana RPC implementation.
//!
//! The minter only needs three things from the network: the rent-exempt
//! balance for a new account, atomic submission of a signed package, and a
//! token account balance.

use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::RpcError;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::minter::error::LedgerError;
use crate::types::TransactionPackage;

/// Contract for the network side of minting.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Minimum lamports for an account of `data_len` bytes to be rent exempt.
    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, LedgerError>;

    /// Sign and submit all instructions of `package` as one transaction and
    /// wait for confirmation. Either every instruction lands or none does.
    async fn submit(&self, package: &TransactionPackage<'_>) -> Result<Signature, LedgerError>;

    /// Raw token amount held by a token account.
    async fn token_balance(&self, token_account: &Pubkey) -> Result<u64, LedgerError>;
}

/// [`LedgerClient`] backed by a Solana JSON-RPC endpoint.
pub struct RpcLedgerClient {
    rpc: Arc<RpcClient>,
}

impl RpcLedgerClient {
    /// Connect to `endpoint` with a per-request timeout, confirming at
    /// `confirmed` commitment.
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        info!("Using RPC endpoint {}", endpoint);
        let rpc = RpcClient::new_with_timeout_and_commitment(
            endpoint,
            timeout,
            CommitmentConfig::confirmed(),
        );
        Self { rpc: Arc::new(rpc) }
    }

    pub fn from_rpc(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, LedgerError> {
        self.rpc
            .get_minimum_balance_for_rent_exemption(data_len)
            .await
            .map_err(classify_client_error)
    }

    #[instrument(skip(self, package), fields(payer = %package.fee_payer()))]
    async fn submit(&self, package: &TransactionPackage<'_>) -> Result<Signature, LedgerError> {
        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(classify_client_error)?;

        let instructions: Vec<Instruction> = package.instructions().iter().cloned().collect();
        let payer = package.fee_payer();
        let mut transaction = Transaction::new_with_payer(&instructions, Some(&payer));

        // Sign from the `Send + Sync` refs; this future must stay `Send`.
        transaction
            .try_sign(package.signers(), blockhash)
            .map_err(|e| LedgerError::Rejected(format!("signing failed: {}", e)))?;

        debug!(
            "Sending transaction with {} instructions and {} signers",
            instructions.len(),
            package.signers().len()
        );

        match self.rpc.send_and_confirm_transaction(&transaction).await {
            Ok(signature) => {
                info!("Transaction {} confirmed", signature);
                Ok(signature)
            }
            Err(e) => {
                let error = classify_client_error(e);
                warn!("Transaction failed: {}", error);
                Err(error)
            }
        }
    }

    async fn token_balance(&self, token_account: &Pubkey) -> Result<u64, LedgerError> {
        let balance = self
            .rpc
            .get_token_account_balance(token_account)
            .await
            .map_err(classify_client_error)?;
        balance
            .amount
            .parse()
            .map_err(|e| LedgerError::Network(format!("malformed token amount `{}`: {}", balance.amount, e)))
    }
}

/// Map an RPC client error onto the ledger error kinds.
pub fn classify_client_error(err: ClientError) -> LedgerError {
    let message = err.to_string();
    match err.kind() {
        ClientErrorKind::TransactionError(_) => LedgerError::Rejected(message),
        // Preflight simulation failures come back as RPC response errors.
        ClientErrorKind::RpcError(RpcError::RpcResponseError { .. }) => LedgerError::Rejected(message),
        ClientErrorKind::RpcError(RpcError::ForUser(detail))
            if detail.to_lowercase().contains("unable to confirm") =>
        {
            LedgerError::Timeout(message)
        }
        ClientErrorKind::Reqwest(e) if e.is_timeout() => LedgerError::Timeout(message),
        _ => LedgerError::Network(message),
    }
}
