//! Instruction processing

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    sysvar::Sysvar,
};
use spl_token::{instruction::AuthorityType, state::Account as TokenAccount};

use crate::{
    authority,
    error::EscrowError,
    instruction::EscrowInstruction,
    state::{seeds, EscrowRecord},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = EscrowInstruction::unpack(instruction_data)?;

        match instruction {
            EscrowInstruction::Initialize { amount } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(program_id, accounts, amount)
            }
            EscrowInstruction::Exchange { amount } => {
                msg!("Instruction: Exchange");
                Self::process_exchange(program_id, accounts, amount)
            }
        }
    }

    fn process_initialize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let initializer = next_account_info(account_info_iter)?;
        let holding_account = next_account_info(account_info_iter)?;
        let receiving_account = next_account_info(account_info_iter)?;
        let record_account = next_account_info(account_info_iter)?;
        let rent_sysvar = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        // Validate inputs
        if !initializer.is_signer {
            msg!("Initializer must sign");
            return Err(EscrowError::NotSigner.into());
        }
        if amount == 0 {
            return Err(EscrowError::ZeroAmount.into());
        }
        if *token_program.key != spl_token::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        // Validate record allocation
        if record_account.owner != program_id {
            return Err(EscrowError::InvalidAccountOwner.into());
        }
        if record_account.data_len() != EscrowRecord::LEN {
            msg!(
                "Record account has {} bytes, expected {}",
                record_account.data_len(),
                EscrowRecord::LEN
            );
            return Err(EscrowError::InvalidAccountSize.into());
        }
        let rent = Rent::from_account_info(rent_sysvar)?;
        if !rent.is_exempt(record_account.lamports(), record_account.data_len()) {
            return Err(EscrowError::NotRentExempt.into());
        }

        // Both token accounts must belong to the token program
        if *holding_account.owner != spl_token::id() || *receiving_account.owner != spl_token::id()
        {
            return Err(EscrowError::InvalidAccountOwner.into());
        }

        let existing = EscrowRecord::decode(&record_account.data.borrow())?;
        if !existing.is_uninitialized() {
            return Err(EscrowError::AlreadyInitialized.into());
        }

        // The deposit must equal the amount Exchange will later demand
        let deposited = TokenAccount::unpack(&holding_account.data.borrow())?.amount;
        if deposited != amount {
            msg!(
                "Holding balance {} does not match declared amount {}",
                deposited,
                amount
            );
            return Err(EscrowError::AmountMismatch.into());
        }

        // Write record
        let record = EscrowRecord::new(
            *initializer.key,
            *holding_account.key,
            *receiving_account.key,
            amount,
        );
        record.pack_into(&mut record_account.data.borrow_mut()[..])?;

        // Hand the holding account over to the program authority
        let (program_authority, _bump) = authority::derive_authority(program_id);
        invoke(
            &spl_token::instruction::set_authority(
                token_program.key,
                holding_account.key,
                Some(&program_authority),
                AuthorityType::AccountOwner,
                initializer.key,
                &[],
            )?,
            &[
                holding_account.clone(),
                initializer.clone(),
                token_program.clone(),
            ],
        )?;

        msg!(
            "Escrow initialized: record={}, holding={}, expected_amount={}",
            record_account.key,
            holding_account.key,
            amount
        );
        Ok(())
    }

    fn process_exchange(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let taker = next_account_info(account_info_iter)?;
        let taker_receiving_account = next_account_info(account_info_iter)?;
        let taker_sending_account = next_account_info(account_info_iter)?;
        let record_account = next_account_info(account_info_iter)?;
        let program_authority = next_account_info(account_info_iter)?;
        let holding_account = next_account_info(account_info_iter)?;
        let initializer_receiving_account = next_account_info(account_info_iter)?;
        let initializer = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        if !taker.is_signer {
            msg!("Taker must sign");
            return Err(EscrowError::NotSigner.into());
        }
        if *token_program.key != spl_token::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        // A closed record comes back empty and owned by the system program
        if record_account.data_is_empty() {
            msg!("Escrow record {} is closed", record_account.key);
            return Err(EscrowError::NotInitialized.into());
        }
        if record_account.owner != program_id {
            return Err(EscrowError::InvalidAccountOwner.into());
        }

        let record = EscrowRecord::decode(&record_account.data.borrow())?;
        if !record.is_initialized() {
            return Err(EscrowError::NotInitialized.into());
        }
        if amount != record.expected_amount {
            msg!(
                "Declared amount {} does not match expected {}",
                amount,
                record.expected_amount
            );
            return Err(EscrowError::AmountMismatch.into());
        }

        // Reference integrity against the record
        if record.holding_account != *holding_account.key {
            return Err(EscrowError::AccountMismatch.into());
        }
        if record.receiving_account != *initializer_receiving_account.key {
            return Err(EscrowError::AccountMismatch.into());
        }
        if record.initializer != *initializer.key {
            return Err(EscrowError::AccountMismatch.into());
        }

        let bump = authority::verify_authority(program_authority.key, program_id)?;

        let held_amount = {
            let holding = TokenAccount::unpack(&holding_account.data.borrow())?;
            if holding.owner != *program_authority.key {
                return Err(EscrowError::AuthorityMismatch.into());
            }
            holding.amount
        };
        if held_amount != record.expected_amount {
            msg!(
                "Holding balance {} does not match expected {}",
                held_amount,
                record.expected_amount
            );
            return Err(EscrowError::AmountMismatch.into());
        }

        // Taker pays the initializer
        invoke(
            &spl_token::instruction::transfer(
                token_program.key,
                taker_sending_account.key,
                initializer_receiving_account.key,
                taker.key,
                &[],
                amount,
            )?,
            &[
                taker_sending_account.clone(),
                initializer_receiving_account.clone(),
                taker.clone(),
                token_program.clone(),
            ],
        )?;

        let bump_seed = [bump];
        let authority_seeds: &[&[u8]] = &[seeds::AUTHORITY_SEED, &bump_seed];

        // Release the held tokens to the taker
        invoke_signed(
            &spl_token::instruction::transfer(
                token_program.key,
                holding_account.key,
                taker_receiving_account.key,
                program_authority.key,
                &[],
                held_amount,
            )?,
            &[
                holding_account.clone(),
                taker_receiving_account.clone(),
                program_authority.clone(),
                token_program.clone(),
            ],
            &[authority_seeds],
        )?;

        // Close the holding account, rent goes back to the initializer
        invoke_signed(
            &spl_token::instruction::close_account(
                token_program.key,
                holding_account.key,
                initializer.key,
                program_authority.key,
                &[],
            )?,
            &[
                holding_account.clone(),
                initializer.clone(),
                program_authority.clone(),
                token_program.clone(),
            ],
            &[authority_seeds],
        )?;

        Self::close_record(record_account, initializer)?;

        msg!(
            "Escrow exchanged: record={}, amount={}",
            record_account.key,
            amount
        );
        Ok(())
    }

    /// Drains the record's lamports into `destination` and clears its data.
    fn close_record(record_account: &AccountInfo, destination: &AccountInfo) -> ProgramResult {
        let reclaimed = record_account.lamports();
        let credited = destination
            .lamports()
            .checked_add(reclaimed)
            .ok_or(EscrowError::AmountOverflow)?;

        **destination.lamports.borrow_mut() = credited;
        **record_account.lamports.borrow_mut() = 0;
        record_account.data.borrow_mut().fill(0);
        Ok(())
    }
}
