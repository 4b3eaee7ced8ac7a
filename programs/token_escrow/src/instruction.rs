//! Instruction definitions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    sysvar,
};

use crate::error::EscrowError;

/// Wire format is `[discriminant: u8][amount: u64 LE]`, which is exactly the
/// borsh encoding of this enum.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Lock the holding account under the program authority and activate the record
    ///
    /// Accounts expected:
    /// 0. `[signer]` Initializer
    /// 1. `[writable]` Holding token account (owned by the initializer)
    /// 2. `[]` Initializer's receiving token account
    /// 3. `[writable]` Escrow record account (105 bytes, owned by this program)
    /// 4. `[]` Rent sysvar
    /// 5. `[]` Token program
    Initialize { amount: u64 },

    /// Swap the taker's payment for the held tokens and close the escrow
    ///
    /// Accounts expected:
    /// 0. `[signer]` Taker
    /// 1. `[writable]` Taker's receiving token account
    /// 2. `[writable]` Taker's sending token account
    /// 3. `[writable]` Escrow record account
    /// 4. `[]` Program authority (PDA)
    /// 5. `[writable]` Holding token account
    /// 6. `[writable]` Initializer's receiving token account
    /// 7. `[writable]` Initializer (receives reclaimed rent)
    /// 8. `[]` Token program
    Exchange { amount: u64 },
}

impl EscrowInstruction {
    pub const LEN: usize = 1 + 8;

    pub fn unpack(input: &[u8]) -> Result<Self, EscrowError> {
        if input.len() != Self::LEN {
            return Err(EscrowError::InvalidInstructionData);
        }
        Self::try_from_slice(input).map_err(|_| EscrowError::InvalidInstructionData)
    }

    pub fn pack(&self) -> Vec<u8> {
        let (tag, amount) = match self {
            EscrowInstruction::Initialize { amount } => (0u8, amount),
            EscrowInstruction::Exchange { amount } => (1u8, amount),
        };
        let mut buf = Vec::with_capacity(Self::LEN);
        buf.push(tag);
        buf.extend_from_slice(&amount.to_le_bytes());
        buf
    }

    pub fn amount(&self) -> u64 {
        match self {
            EscrowInstruction::Initialize { amount } | EscrowInstruction::Exchange { amount } => {
                *amount
            }
        }
    }
}

/// Builds an `Initialize` instruction.
pub fn initialize(
    program_id: &Pubkey,
    initializer: &Pubkey,
    holding_account: &Pubkey,
    receiving_account: &Pubkey,
    record_account: &Pubkey,
    amount: u64,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*initializer, true),
            AccountMeta::new(*holding_account, false),
            AccountMeta::new_readonly(*receiving_account, false),
            AccountMeta::new(*record_account, false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: EscrowInstruction::Initialize { amount }.pack(),
    }
}

/// Account set for an `Exchange` instruction.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeAccounts {
    pub taker: Pubkey,
    pub taker_receiving_account: Pubkey,
    pub taker_sending_account: Pubkey,
    pub record_account: Pubkey,
    pub program_authority: Pubkey,
    pub holding_account: Pubkey,
    pub initializer_receiving_account: Pubkey,
    pub initializer: Pubkey,
}

/// Builds an `Exchange` instruction.
pub fn exchange(program_id: &Pubkey, accounts: &ExchangeAccounts, amount: u64) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(accounts.taker, true),
            AccountMeta::new(accounts.taker_receiving_account, false),
            AccountMeta::new(accounts.taker_sending_account, false),
            AccountMeta::new(accounts.record_account, false),
            AccountMeta::new_readonly(accounts.program_authority, false),
            AccountMeta::new(accounts.holding_account, false),
            AccountMeta::new(accounts.initializer_receiving_account, false),
            AccountMeta::new(accounts.initializer, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: EscrowInstruction::Exchange { amount }.pack(),
    }
}
