//! Account state definitions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::EscrowError;

/// Escrow record stored verbatim as the data of the record account.
///
/// Layout (105 bytes, integers little-endian, keys raw 32 bytes):
///
/// | offset | size | field               |
/// |--------|------|---------------------|
/// | 0      | 32   | `initializer`       |
/// | 32     | 1    | `is_initialized`    |
/// | 33     | 32   | `holding_account`   |
/// | 65     | 32   | `receiving_account` |
/// | 97     | 8    | `expected_amount`   |
///
/// There is no version field; any change to this layout needs a new program id.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EscrowRecord {
    /// Party who funded the holding account
    pub initializer: Pubkey,
    /// 0 = uninitialized, 1 = active
    pub is_initialized: u8,
    /// Token account custodying the deposit, owned by the program authority
    pub holding_account: Pubkey,
    /// Initializer's token account that receives the taker's payment
    pub receiving_account: Pubkey,
    /// Exact amount the taker must supply
    pub expected_amount: u64,
}

impl EscrowRecord {
    pub const LEN: usize = 32 + 1 + 32 + 32 + 8; // 105 bytes

    pub const UNINITIALIZED: u8 = 0;
    pub const ACTIVE: u8 = 1;

    pub fn new(
        initializer: Pubkey,
        holding_account: Pubkey,
        receiving_account: Pubkey,
        expected_amount: u64,
    ) -> Self {
        Self {
            initializer,
            is_initialized: Self::ACTIVE,
            holding_account,
            receiving_account,
            expected_amount,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized == Self::ACTIVE
    }

    pub fn is_uninitialized(&self) -> bool {
        self.is_initialized == Self::UNINITIALIZED
    }

    /// Encodes the record into its fixed 105-byte layout.
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        // Every field is fixed-size, so the buffer is always filled exactly
        let _ = self.serialize(&mut &mut buf[..]);
        buf
    }

    /// Decodes a record. Fails only when the input is not exactly 105 bytes;
    /// the flag byte is returned as stored.
    pub fn decode(src: &[u8]) -> Result<Self, EscrowError> {
        if src.len() != Self::LEN {
            return Err(EscrowError::MalformedRecord);
        }
        Self::try_from_slice(src).map_err(|_| EscrowError::MalformedRecord)
    }

    /// Writes the encoded record into account data of exactly `LEN` bytes.
    pub fn pack_into(&self, dst: &mut [u8]) -> Result<(), EscrowError> {
        if dst.len() != Self::LEN {
            return Err(EscrowError::InvalidAccountSize);
        }
        dst.copy_from_slice(&self.encode());
        Ok(())
    }
}

/// Seeds for PDA derivation
pub mod seeds {
    pub const AUTHORITY_SEED: &[u8] = b"token";
}
