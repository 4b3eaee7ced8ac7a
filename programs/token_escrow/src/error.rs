//! Error types

use solana_program::program_error::ProgramError;
use thiserror::Error;

/// Failures surfaced by the escrow state machine.
///
/// Each variant maps to a stable `ProgramError::Custom` code given by its
/// position, so variants must only ever be appended.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    #[error("Malformed escrow record")]
    MalformedRecord,

    #[error("Required signer is missing")]
    NotSigner,

    #[error("Escrow already initialized")]
    AlreadyInitialized,

    #[error("Escrow not initialized")]
    NotInitialized,

    #[error("Invalid escrow account size")]
    InvalidAccountSize,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Amount does not match the expected amount")]
    AmountMismatch,

    #[error("Account does not match the escrow record")]
    AccountMismatch,

    #[error("Program authority does not match the derived address")]
    AuthorityMismatch,

    #[error("Escrow account is not rent exempt")]
    NotRentExempt,

    #[error("Invalid account owner")]
    InvalidAccountOwner,

    #[error("Amount overflow")]
    AmountOverflow,
}

/// Coarse failure classes reported to clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing signer or wrong derived authority
    Authorization,
    /// Record is in the wrong lifecycle state for the transition
    State,
    /// Account cross-references, ownership or sizes are wrong
    Integrity,
    /// Zero or mismatching amounts
    Value,
}

impl EscrowError {
    pub fn class(&self) -> ErrorClass {
        match self {
            EscrowError::NotSigner | EscrowError::AuthorityMismatch => ErrorClass::Authorization,
            EscrowError::AlreadyInitialized | EscrowError::NotInitialized => ErrorClass::State,
            EscrowError::InvalidInstructionData
            | EscrowError::MalformedRecord
            | EscrowError::InvalidAccountSize
            | EscrowError::AccountMismatch
            | EscrowError::NotRentExempt
            | EscrowError::InvalidAccountOwner => ErrorClass::Integrity,
            EscrowError::ZeroAmount | EscrowError::AmountMismatch | EscrowError::AmountOverflow => {
                ErrorClass::Value
            }
        }
    }
}

impl From<EscrowError> for ProgramError {
    fn from(e: EscrowError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
