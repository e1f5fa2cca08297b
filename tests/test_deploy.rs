//! Tests for configuration account administration

mod common;

use common::{test_minter, Behavior, MemoryLedger, RecordingSink};
use nft_minter::minter::address;
use nft_minter::minter::types::NFT_MINT_PROGRAM_ID;
use nft_minter::{LedgerError, MintError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::sync::Arc;

#[tokio::test]
async fn test_initialize_creates_configuration() {
    let ledger = MemoryLedger::new();
    let sink = Arc::new(RecordingSink::default());
    let minter = test_minter(&ledger, &sink);
    let authority = Keypair::new();

    let signature = minter.initialize(&authority, authority.pubkey()).await.unwrap();
    assert_ne!(signature.to_string(), "");

    let config = address::config_address(&NFT_MINT_PROGRAM_ID).unwrap();
    assert_eq!(ledger.owner_of(&config.address), Some(NFT_MINT_PROGRAM_ID));

    let submission = ledger.submissions().pop().unwrap();
    assert_eq!(submission.instructions.len(), 1);
    assert_eq!(submission.signers, vec![authority.pubkey()]);
    assert_eq!(submission.instructions[0].accounts.len(), 5);
    // config_nonce is the first borsh arg after the discriminator
    assert_eq!(submission.instructions[0].data[8], config.bump);
}

#[tokio::test]
async fn test_reinitialize_is_rejected() {
    let ledger = MemoryLedger::new();
    let sink = Arc::new(RecordingSink::default());
    let minter = test_minter(&ledger, &sink);
    let authority = Keypair::new();

    minter.initialize(&authority, authority.pubkey()).await.unwrap();
    let err = minter.initialize(&authority, authority.pubkey()).await.unwrap_err();

    assert!(matches!(err, MintError::Ledger(LedgerError::Rejected(_))));
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0.operation, "initialize");
}

#[tokio::test]
async fn test_update_config() {
    let ledger = MemoryLedger::new();
    let sink = Arc::new(RecordingSink::default());
    let minter = test_minter(&ledger, &sink);
    let authority = Keypair::new();
    let next_authority = Pubkey::new_unique();

    let err = minter.update_config(&authority, next_authority).await.unwrap_err();
    assert!(matches!(err, MintError::Ledger(LedgerError::Rejected(_))));

    minter.initialize(&authority, authority.pubkey()).await.unwrap();
    minter.update_config(&authority, next_authority).await.unwrap();

    let submission = ledger.submissions().pop().unwrap();
    assert_eq!(submission.instructions[0].accounts.len(), 2);
    assert_eq!(&submission.instructions[0].data[9..41], next_authority.as_ref());
}

#[tokio::test]
async fn test_initialize_network_failure() {
    let ledger = MemoryLedger::new();
    let sink = Arc::new(RecordingSink::default());
    let minter = test_minter(&ledger, &sink);
    ledger.set_behavior(Behavior::Fail(LedgerError::Network("connection reset".to_string())));

    let authority = Keypair::new();
    let err = minter.initialize(&authority, authority.pubkey()).await.unwrap_err();

    assert_eq!(err, MintError::Ledger(LedgerError::Network("connection reset".to_string())));
    assert_eq!(ledger.account_count(), 0);
}

#[tokio::test]
async fn test_balance_of_unknown_account() {
    let ledger = MemoryLedger::new();
    let sink = Arc::new(RecordingSink::default());
    let minter = test_minter(&ledger, &sink);

    let err = minter
        .token_balance(&Pubkey::new_unique().to_string(), &Pubkey::new_unique().to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, MintError::Ledger(LedgerError::Rejected(_))));

    let err = minter.token_balance("bogus", "bogus").await.unwrap_err();
    assert!(matches!(err, MintError::InvalidParameter { field: "mint", .. }));
}
