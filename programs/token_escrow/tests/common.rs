#![allow(dead_code)]
#![allow(deprecated)]

use solana_program::program_pack::Pack;
use solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::system_instruction;
use solana_sdk::{
    account::Account,
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};

use token_escrow::{
    authority::derive_authority,
    instruction::{self, ExchangeAccounts},
    state::EscrowRecord,
    EscrowError,
};

// ============================================================================
// TEST PROGRAM ID
// ============================================================================

/// Fixed program ID for testing. The deployed id comes from the deployment
/// keypair, not this value.
pub fn test_program_id() -> Pubkey {
    solana_sdk::pubkey!("Escrow11111111111111111111111111111111111111")
}

// ============================================================================
// TEST HARNESS HELPERS
// ============================================================================

/// Helper: Build a ProgramTest instance with token_escrow + spl_token
pub fn program_test() -> ProgramTest {
    let program_id = test_program_id();
    let mut program_test = ProgramTest::new(
        "token_escrow",
        program_id,
        processor!(token_escrow::processor::Processor::process),
    );
    program_test.add_program(
        "spl_token",
        spl_token::id(),
        processor!(spl_token::processor::Processor::process),
    );
    program_test
}

/// Helper: Sign and submit a transaction, returning the raw result
pub async fn try_send_tx(
    context: &mut ProgramTestContext,
    payer: &Keypair,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let blockhash = context.banks_client.get_latest_blockhash().await.unwrap();
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
    context.banks_client.process_transaction(tx).await
}

/// Helper: Send a transaction that is expected to succeed
pub async fn send_tx(
    context: &mut ProgramTestContext,
    payer: &Keypair,
    instructions: &[Instruction],
    signers: &[&Keypair],
) {
    try_send_tx(context, payer, instructions, signers)
        .await
        .unwrap();
}

/// Helper: Assert that a transaction failed with the given escrow error
pub fn assert_escrow_error(result: Result<(), BanksClientError>, expected: EscrowError) {
    let error = result.expect_err("transaction should have failed").unwrap();
    match error {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
            assert_eq!(code, expected as u32, "expected {:?}", expected);
        }
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

// ============================================================================
// SPL TOKEN HELPERS
// ============================================================================

/// Helper: Create a new SPL token mint
pub async fn create_mint(
    context: &mut ProgramTestContext,
    payer: &Keypair,
    mint_authority: &Keypair,
    decimals: u8,
) -> Pubkey {
    let mint = Keypair::new();
    let rent = context.banks_client.get_rent().await.unwrap();
    let mint_rent = rent.minimum_balance(spl_token::state::Mint::LEN);

    let create_mint_ix = system_instruction::create_account(
        &payer.pubkey(),
        &mint.pubkey(),
        mint_rent,
        spl_token::state::Mint::LEN as u64,
        &spl_token::id(),
    );
    let init_mint_ix = spl_token::instruction::initialize_mint2(
        &spl_token::id(),
        &mint.pubkey(),
        &mint_authority.pubkey(),
        None,
        decimals,
    )
    .unwrap();

    send_tx(context, payer, &[create_mint_ix, init_mint_ix], &[&mint]).await;
    mint.pubkey()
}

/// Helper: Create an SPL token account for a given mint and owner
pub async fn create_token_account(
    context: &mut ProgramTestContext,
    payer: &Keypair,
    mint: Pubkey,
    owner: Pubkey,
) -> Pubkey {
    let token_account = Keypair::new();
    let rent = context.banks_client.get_rent().await.unwrap();
    let token_rent = rent.minimum_balance(spl_token::state::Account::LEN);

    let create_ix = system_instruction::create_account(
        &payer.pubkey(),
        &token_account.pubkey(),
        token_rent,
        spl_token::state::Account::LEN as u64,
        &spl_token::id(),
    );
    let init_ix = spl_token::instruction::initialize_account3(
        &spl_token::id(),
        &token_account.pubkey(),
        &mint,
        &owner,
    )
    .unwrap();

    send_tx(context, payer, &[create_ix, init_ix], &[&token_account]).await;
    token_account.pubkey()
}

/// Helper: Mint tokens to a token account
pub async fn mint_to(
    context: &mut ProgramTestContext,
    payer: &Keypair,
    mint: Pubkey,
    mint_authority: &Keypair,
    destination: Pubkey,
    amount: u64,
) {
    let ix = spl_token::instruction::mint_to(
        &spl_token::id(),
        &mint,
        &destination,
        &mint_authority.pubkey(),
        &[],
        amount,
    )
    .unwrap();

    send_tx(context, payer, &[ix], &[mint_authority]).await;
}

/// Helper: Read SPL token account state
pub async fn get_token_account(
    context: &mut ProgramTestContext,
    token_account: Pubkey,
) -> spl_token::state::Account {
    let account = context
        .banks_client
        .get_account(token_account)
        .await
        .unwrap()
        .unwrap();
    spl_token::state::Account::unpack(&account.data).unwrap()
}

/// Helper: Read SPL token account balance
pub async fn get_token_balance(context: &mut ProgramTestContext, token_account: Pubkey) -> u64 {
    get_token_account(context, token_account).await.amount
}

/// Helper: Lamport balance, zero for accounts that no longer exist
pub async fn get_lamports(context: &mut ProgramTestContext, address: Pubkey) -> u64 {
    context
        .banks_client
        .get_account(address)
        .await
        .unwrap()
        .map(|account| account.lamports)
        .unwrap_or(0)
}

/// Helper: True once an account has been closed and purged
pub async fn is_closed(context: &mut ProgramTestContext, address: Pubkey) -> bool {
    match context.banks_client.get_account(address).await.unwrap() {
        None => true,
        Some(account) => account.lamports == 0,
    }
}

// ============================================================================
// PROGRAM HELPERS
// ============================================================================

/// Helper: Build the system instruction allocating a record account of `space` bytes
pub async fn create_record_account_ix(
    context: &mut ProgramTestContext,
    payer: &Pubkey,
    record: &Pubkey,
    program_id: &Pubkey,
    space: usize,
) -> Instruction {
    let rent = context.banks_client.get_rent().await.unwrap();
    create_funded_record_account_ix(payer, record, program_id, space, rent.minimum_balance(space))
}

/// Helper: Build the system instruction allocating a record account with explicit funding
pub fn create_funded_record_account_ix(
    payer: &Pubkey,
    record: &Pubkey,
    program_id: &Pubkey,
    space: usize,
    lamports: u64,
) -> Instruction {
    system_instruction::create_account(payer, record, lamports, space as u64, program_id)
}

/// Helper: Place a rent-exempt account holding `record` at `address`, owned by `owner`
pub async fn set_record_account(
    context: &mut ProgramTestContext,
    address: Pubkey,
    owner: Pubkey,
    record: &EscrowRecord,
) {
    let rent = context.banks_client.get_rent().await.unwrap();
    let account = Account {
        lamports: rent.minimum_balance(EscrowRecord::LEN),
        data: record.encode().to_vec(),
        owner,
        executable: false,
        rent_epoch: 0,
    };
    context.set_account(&address, &account.into());
}

/// Helper: Read the escrow record from the record account
pub async fn read_record(context: &mut ProgramTestContext, record: Pubkey) -> EscrowRecord {
    let account = context
        .banks_client
        .get_account(record)
        .await
        .unwrap()
        .unwrap();
    EscrowRecord::decode(&account.data).unwrap()
}

// ============================================================================
// TEST ENVIRONMENT
// ============================================================================

/// Test environment with both parties and their token accounts.
///
/// Mint X is deposited by the initializer, mint Y is paid by the taker.
pub struct TestEnv {
    pub program_id: Pubkey,
    pub initializer: Keypair,
    pub taker: Keypair,
    pub mint_authority: Keypair,
    pub mint_x: Pubkey,
    pub mint_y: Pubkey,
    /// Initializer's X account that funds the holding account
    pub initializer_x: Pubkey,
    /// Initializer's Y account that receives the taker's payment
    pub initializer_y: Pubkey,
    /// Holding account (mint X), initially owned by the initializer
    pub holding: Pubkey,
    pub taker_x: Pubkey,
    pub taker_y: Pubkey,
    pub record: Keypair,
}

impl TestEnv {
    pub fn program_authority(&self) -> Pubkey {
        derive_authority(&self.program_id).0
    }

    pub fn exchange_accounts(&self) -> ExchangeAccounts {
        ExchangeAccounts {
            taker: self.taker.pubkey(),
            taker_receiving_account: self.taker_x,
            taker_sending_account: self.taker_y,
            record_account: self.record.pubkey(),
            program_authority: self.program_authority(),
            holding_account: self.holding,
            initializer_receiving_account: self.initializer_y,
            initializer: self.initializer.pubkey(),
        }
    }
}

/// Helper: Create a baseline environment used by most tests.
///
/// The holding account is funded with `deposit` units of X and the taker
/// holds `taker_balance` units of Y. No escrow is initialized yet.
pub async fn setup_env(
    context: &mut ProgramTestContext,
    deposit: u64,
    taker_balance: u64,
) -> TestEnv {
    let payer = context.payer.insecure_clone();
    let payer_pubkey = payer.pubkey();
    let program_id = test_program_id();
    let initializer = Keypair::new();
    let taker = Keypair::new();
    let mint_authority = Keypair::new();

    // Fund both parties
    let fund_ix =
        system_instruction::transfer(&payer_pubkey, &initializer.pubkey(), 2_000_000_000);
    let fund_ix2 = system_instruction::transfer(&payer_pubkey, &taker.pubkey(), 2_000_000_000);
    send_tx(context, &payer, &[fund_ix, fund_ix2], &[]).await;

    // Mints and token accounts
    let mint_x = create_mint(context, &payer, &mint_authority, 6).await;
    let mint_y = create_mint(context, &payer, &mint_authority, 6).await;
    let initializer_x = create_token_account(context, &payer, mint_x, initializer.pubkey()).await;
    let initializer_y = create_token_account(context, &payer, mint_y, initializer.pubkey()).await;
    let holding = create_token_account(context, &payer, mint_x, initializer.pubkey()).await;
    let taker_x = create_token_account(context, &payer, mint_x, taker.pubkey()).await;
    let taker_y = create_token_account(context, &payer, mint_y, taker.pubkey()).await;

    // Initializer deposits into the holding account
    if deposit > 0 {
        mint_to(context, &payer, mint_x, &mint_authority, initializer_x, deposit).await;
        let transfer_ix = spl_token::instruction::transfer(
            &spl_token::id(),
            &initializer_x,
            &holding,
            &initializer.pubkey(),
            &[],
            deposit,
        )
        .unwrap();
        send_tx(context, &payer, &[transfer_ix], &[&initializer]).await;
    }
    if taker_balance > 0 {
        mint_to(context, &payer, mint_y, &mint_authority, taker_y, taker_balance).await;
    }

    TestEnv {
        program_id,
        initializer,
        taker,
        mint_authority,
        mint_x,
        mint_y,
        initializer_x,
        initializer_y,
        holding,
        taker_x,
        taker_y,
        record: Keypair::new(),
    }
}

/// Helper: Build the allocate + Initialize instructions for `env.record`
pub async fn initialize_ixs(
    context: &mut ProgramTestContext,
    env: &TestEnv,
    amount: u64,
) -> Vec<Instruction> {
    let create_ix = create_record_account_ix(
        context,
        &env.initializer.pubkey(),
        &env.record.pubkey(),
        &env.program_id,
        EscrowRecord::LEN,
    )
    .await;
    let init_ix = instruction::initialize(
        &env.program_id,
        &env.initializer.pubkey(),
        &env.holding,
        &env.initializer_y,
        &env.record.pubkey(),
        amount,
    );
    vec![create_ix, init_ix]
}

/// Helper: Allocate the record and run Initialize as the initializer
pub async fn initialize_escrow(context: &mut ProgramTestContext, env: &TestEnv, amount: u64) {
    let ixs = initialize_ixs(context, env, amount).await;
    send_tx(context, &env.initializer, &ixs, &[&env.record]).await;
}

/// Helper: Submit Exchange as the taker
pub async fn try_exchange(
    context: &mut ProgramTestContext,
    env: &TestEnv,
    accounts: &ExchangeAccounts,
    amount: u64,
) -> Result<(), BanksClientError> {
    let ix = instruction::exchange(&env.program_id, accounts, amount);
    try_send_tx(context, &env.taker, &[ix], &[]).await
}

/// Snapshot of every token balance touched by Exchange
#[derive(Debug, PartialEq, Eq)]
pub struct Balances {
    pub holding: u64,
    pub initializer_y: u64,
    pub taker_x: u64,
    pub taker_y: u64,
}

/// Helper: Snapshot the balances of the accounts involved in an exchange
pub async fn balances(context: &mut ProgramTestContext, env: &TestEnv) -> Balances {
    Balances {
        holding: get_token_balance(context, env.holding).await,
        initializer_y: get_token_balance(context, env.initializer_y).await,
        taker_x: get_token_balance(context, env.taker_x).await,
        taker_y: get_token_balance(context, env.taker_y).await,
    }
}
