//! Program-derived holding authority.
//!
//! The holding account's owner authority is an address derived from a fixed
//! seed and the program id. It has no private key; the runtime accepts it as a
//! signer only when this program invokes with the matching seeds.

use solana_program::pubkey::Pubkey;

use crate::{error::EscrowError, state::seeds};

/// Derives the program address and bump for `seed` under `program_id`.
pub fn derive(seed: &[u8], program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seed], program_id)
}

/// Derives the escrow holding authority for `program_id`.
pub fn derive_authority(program_id: &Pubkey) -> (Pubkey, u8) {
    derive(seeds::AUTHORITY_SEED, program_id)
}

/// Checks a supplied address against the derivation and returns the bump
/// needed to sign for it.
pub fn verify_authority(supplied: &Pubkey, program_id: &Pubkey) -> Result<u8, EscrowError> {
    let (expected, bump) = derive_authority(program_id);
    if expected != *supplied {
        return Err(EscrowError::AuthorityMismatch);
    }
    Ok(bump)
}
