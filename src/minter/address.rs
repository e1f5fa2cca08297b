//! Program-derived address search and the address cache.
//!
//! Derivation walks bump seeds from 255 down to 0 and keeps the first
//! candidate that is off the ed25519 curve, so the result has no private key.

use moka::sync::Cache;
use solana_sdk::pubkey::{Pubkey, PubkeyError, MAX_SEEDS, MAX_SEED_LEN};
use tracing::{debug, instrument};

use crate::minter::error::{MintError, Result};
use crate::minter::types::{ProgramAddress, CONFIG_SEED, EDITION_SEED, METADATA_SEED};

/// Derive the program address for `seeds` under `owner`.
pub fn derive(seeds: &[&[u8]], owner: &Pubkey) -> Result<ProgramAddress> {
    derive_with(seeds, owner, Pubkey::create_program_address)
}

fn derive_with<F>(seeds: &[&[u8]], owner: &Pubkey, mut create: F) -> Result<ProgramAddress>
where
    F: FnMut(&[&[u8]], &Pubkey) -> std::result::Result<Pubkey, PubkeyError>,
{
    // One slot is reserved for the bump.
    if seeds.len() >= MAX_SEEDS {
        return Err(MintError::invalid(
            "seeds",
            format!("{} seeds given, at most {} allowed", seeds.len(), MAX_SEEDS - 1),
        ));
    }
    if let Some(seed) = seeds.iter().find(|seed| seed.len() > MAX_SEED_LEN) {
        return Err(MintError::invalid(
            "seeds",
            format!("seed of {} bytes exceeds {} bytes", seed.len(), MAX_SEED_LEN),
        ));
    }

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut candidate: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
        candidate.extend_from_slice(seeds);
        candidate.push(&bump_seed);

        match create(&candidate, owner) {
            Ok(address) => return Ok(ProgramAddress { address, bump }),
            Err(PubkeyError::InvalidSeeds) => continue,
            Err(e) => return Err(MintError::invalid("seeds", e.to_string())),
        }
    }

    Err(MintError::DerivationExhausted)
}

/// Program-wide configuration account of the mint program.
pub fn config_address(program_id: &Pubkey) -> Result<ProgramAddress> {
    derive(&[CONFIG_SEED], program_id)
}

/// Metadata account of `mint` under the token metadata program.
pub fn metadata_address(metadata_program_id: &Pubkey, mint: &Pubkey) -> Result<ProgramAddress> {
    derive(
        &[METADATA_SEED, metadata_program_id.as_ref(), mint.as_ref()],
        metadata_program_id,
    )
}

/// Master edition account of `mint` under the token metadata program.
pub fn master_edition_address(
    metadata_program_id: &Pubkey,
    mint: &Pubkey,
) -> Result<ProgramAddress> {
    derive(
        &[
            METADATA_SEED,
            metadata_program_id.as_ref(),
            mint.as_ref(),
            EDITION_SEED,
        ],
        metadata_program_id,
    )
}

/// Associated token account holding `mint` for `wallet`.
pub fn associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(wallet, mint)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DerivationKey {
    owner: Pubkey,
    seeds: Vec<Vec<u8>>,
}

/// Memoizes parsed address strings and derived program addresses.
///
/// Entries never change once computed, so a racing duplicate insert stores
/// the same value twice. Clones share the same underlying storage.
#[derive(Clone)]
pub struct AddressCache {
    parsed: Cache<String, Pubkey>,
    derived: Cache<DerivationKey, ProgramAddress>,
}

impl AddressCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            parsed: Cache::new(max_entries),
            derived: Cache::new(max_entries),
        }
    }

    /// Parse a base58 address, reusing earlier results for the same string.
    pub fn parse(&self, field: &'static str, value: &str) -> Result<Pubkey> {
        if let Some(key) = self.parsed.get(value) {
            return Ok(key);
        }
        let key: Pubkey = value.parse().map_err(|e| {
            MintError::invalid(field, format!("`{}` is not a valid address: {}", value, e))
        })?;
        self.parsed.insert(value.to_string(), key);
        Ok(key)
    }

    /// Memoized [`derive`].
    #[instrument(skip(self, seeds), fields(owner = %owner))]
    pub fn derive(&self, seeds: &[&[u8]], owner: &Pubkey) -> Result<ProgramAddress> {
        let key = DerivationKey {
            owner: *owner,
            seeds: seeds.iter().map(|seed| seed.to_vec()).collect(),
        };
        if let Some(found) = self.derived.get(&key) {
            return Ok(found);
        }
        let found = derive(seeds, owner)?;
        debug!("Derived {} (bump {})", found.address, found.bump);
        self.derived.insert(key, found);
        Ok(found)
    }

    /// Memoized [`config_address`].
    pub fn config_address(&self, program_id: &Pubkey) -> Result<ProgramAddress> {
        self.derive(&[CONFIG_SEED], program_id)
    }
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}
