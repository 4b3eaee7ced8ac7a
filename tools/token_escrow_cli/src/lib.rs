//! Ledger client for the token escrow program
//!
//! Builds and submits Initialize/Exchange transactions over RPC and reads
//! escrow records back.

pub mod client;
pub mod config;

pub use client::{exchange_instruction, EscrowClient};
pub use config::ClientConfig;
