//! Token Escrow Program (Native Solana)
//!
//! Two-party escrow: the initializer parks tokens in a holding account whose
//! owner authority is handed to a program-derived address, and a taker later
//! swaps the expected amount for them in a single atomic transaction.

pub mod authority;
pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

pub use solana_program;

// Re-export for tests and clients
pub use error::{ErrorClass, EscrowError};
pub use instruction::EscrowInstruction;
pub use state::EscrowRecord;

solana_program::declare_id!("CCFRSaHpLGbGnFkTRaeSxYdBZtGP9sa6LhPHBNRqtFu8");
