//! RPC client for the escrow program

#![allow(deprecated)] // system_instruction deprecation - will migrate when solana_system_interface is stable

use anyhow::{Context, Result};
use solana_client::rpc_client::RpcClient;
use solana_program::program_pack::Pack;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_instruction,
    transaction::Transaction,
};
use spl_token::state::Account as TokenAccount;
use token_escrow::{
    authority::derive_authority,
    instruction::{self, ExchangeAccounts},
    state::EscrowRecord,
};
use tracing::{debug, info};

use crate::config::ClientConfig;

pub struct EscrowClient {
    rpc_client: RpcClient,
    program_id: Pubkey,
}

impl EscrowClient {
    /// Creates a client for the endpoint and program named in `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let program_id = config.program_id()?;
        let rpc_client =
            RpcClient::new_with_commitment(config.endpoint.clone(), CommitmentConfig::confirmed());

        debug!("Escrow client for program {} at {}", program_id, config.endpoint);
        Ok(Self {
            rpc_client,
            program_id,
        })
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Program-derived authority that owns every active holding account.
    pub fn program_authority(&self) -> Pubkey {
        derive_authority(&self.program_id).0
    }

    /// Allocates a fresh record account and initializes the escrow in one transaction.
    ///
    /// The holding account must already be funded with `amount` and owned by the
    /// initializer. Returns the transaction signature and the record address.
    pub fn initialize(
        &self,
        payer: &Keypair,
        initializer: &Keypair,
        holding_account: Pubkey,
        receiving_account: Pubkey,
        amount: u64,
    ) -> Result<(Signature, Pubkey)> {
        let record = Keypair::new();
        let lamports = self
            .rpc_client
            .get_minimum_balance_for_rent_exemption(EscrowRecord::LEN)
            .context("Failed to fetch rent-exempt minimum")?;

        let create_ix = system_instruction::create_account(
            &initializer.pubkey(),
            &record.pubkey(),
            lamports,
            EscrowRecord::LEN as u64,
            &self.program_id,
        );
        let init_ix = instruction::initialize(
            &self.program_id,
            &initializer.pubkey(),
            &holding_account,
            &receiving_account,
            &record.pubkey(),
            amount,
        );

        let signature = self.send_tx(&[create_ix, init_ix], payer, &[initializer, &record])?;
        info!(
            "Escrow initialized: record={}, holding={}, amount={}",
            record.pubkey(),
            holding_account,
            amount
        );
        Ok((signature, record.pubkey()))
    }

    /// Completes the escrow stored at `record` as `taker`.
    ///
    /// Initializer, holding and receiving references are read from the record.
    /// When `amount` is `None` the record's expected amount is declared.
    pub fn exchange(
        &self,
        payer: &Keypair,
        taker: &Keypair,
        record: Pubkey,
        taker_sending_account: Pubkey,
        taker_receiving_account: Pubkey,
        amount: Option<u64>,
    ) -> Result<Signature> {
        let escrow = self.get_escrow(record)?;
        let exchange_ix = exchange_instruction(
            &self.program_id,
            record,
            &escrow,
            taker.pubkey(),
            taker_sending_account,
            taker_receiving_account,
            amount,
        )?;

        let signature = self.send_tx(&[exchange_ix], payer, &[taker])?;
        info!(
            "Escrow exchanged: record={}, amount={}",
            record,
            amount.unwrap_or(escrow.expected_amount)
        );
        Ok(signature)
    }

    /// Fetches and decodes an escrow record.
    pub fn get_escrow(&self, record: Pubkey) -> Result<EscrowRecord> {
        let account = self
            .rpc_client
            .get_account(&record)
            .with_context(|| format!("Failed to fetch escrow record {}", record))?;
        if account.owner != self.program_id {
            anyhow::bail!(
                "Account {} is owned by {}, not the escrow program",
                record,
                account.owner
            );
        }
        let escrow = EscrowRecord::decode(&account.data)
            .map_err(|e| anyhow::anyhow!("Failed to decode escrow record {}: {}", record, e))?;
        Ok(escrow)
    }

    /// SPL token balance of `token_account`.
    pub fn token_balance(&self, token_account: Pubkey) -> Result<u64> {
        let account = self
            .rpc_client
            .get_account(&token_account)
            .with_context(|| format!("Failed to fetch token account {}", token_account))?;
        let state = TokenAccount::unpack(&account.data)
            .with_context(|| format!("{} is not an SPL token account", token_account))?;
        Ok(state.amount)
    }

    fn send_tx(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> Result<Signature> {
        let blockhash = self
            .rpc_client
            .get_latest_blockhash()
            .context("Failed to fetch latest blockhash")?;
        let mut all_signers = Vec::with_capacity(signers.len() + 1);
        all_signers.push(payer);
        for signer in signers {
            if signer.pubkey() != payer.pubkey() {
                all_signers.push(*signer);
            }
        }

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            &all_signers,
            blockhash,
        );
        let signature = self
            .rpc_client
            .send_and_confirm_transaction(&tx)
            .context("Transaction rejected")?;
        debug!("Transaction confirmed: {}", signature);
        Ok(signature)
    }
}

/// Builds the Exchange instruction for the escrow stored at `record_key`.
///
/// Holding, receiving and initializer accounts come from the decoded record.
/// Inactive records are refused before anything is sent.
pub fn exchange_instruction(
    program_id: &Pubkey,
    record_key: Pubkey,
    escrow: &EscrowRecord,
    taker: Pubkey,
    taker_sending_account: Pubkey,
    taker_receiving_account: Pubkey,
    amount: Option<u64>,
) -> Result<Instruction> {
    if !escrow.is_initialized() {
        anyhow::bail!("Escrow record {} is not active", record_key);
    }
    let accounts = ExchangeAccounts {
        taker,
        taker_receiving_account,
        taker_sending_account,
        record_account: record_key,
        program_authority: derive_authority(program_id).0,
        holding_account: escrow.holding_account,
        initializer_receiving_account: escrow.receiving_account,
        initializer: escrow.initializer,
    };
    let amount = amount.unwrap_or(escrow.expected_amount);
    Ok(instruction::exchange(program_id, &accounts, amount))
}
