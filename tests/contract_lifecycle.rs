// A crowdfunding project end to end: registration, investments, payout,
// all under full chain validation

use crowdchain::chain::Chain;
use crowdchain::consensus::{ChainErrorKind, validate_chain};
use crowdchain::contract::{self, ContractError};
use crowdchain::core::{Block, BlockBody, Contract, HashedBlock, Output, Transaction};
use crowdchain::wallet::{RsaKeys, Wallet};

const ALICE_PUBLIC: &[u8] = include_bytes!("data/alice_public.der");
const ALICE_PRIVATE: &[u8] = include_bytes!("data/alice_private.der");
const BOB_PUBLIC: &[u8] = include_bytes!("data/bob_public.der");
const BOB_PRIVATE: &[u8] = include_bytes!("data/bob_private.der");
const CAROL_PUBLIC: &[u8] = include_bytes!("data/carol_public.der");
const CAROL_PRIVATE: &[u8] = include_bytes!("data/carol_private.der");

const BLOCK_REWARD: u64 = 500;
const DEADLINE: i64 = 10_000;
const GOAL: u64 = 400;

fn mined(block: Block, timestamp: i64) -> HashedBlock {
    let hash = block.hash_with(timestamp, 0);
    block.into_hashed(timestamp, 0, hash)
}

fn wallet(public: &[u8], private: &[u8]) -> Wallet {
    Wallet::new(RsaKeys::from_der(public, private).unwrap())
}

/// Chain with a funded project: carol owns a contract with a 400 goal,
/// alice invested 200 and bob 500 before the deadline.
fn funded_project() -> (Chain, Contract) {
    let carol = wallet(CAROL_PUBLIC, CAROL_PRIVATE);
    let contract = carol
        .build_contract("Kettle".into(), "A solar kettle".into(), GOAL, DEADLINE, 1_600)
        .unwrap();
    let address = contract.id();

    let mut chain = Chain::new(vec![mined(Block::genesis(), 1_000)]);

    // Coinbase for alice, the contract registers alongside
    let coinbase = Transaction::coinbase(1_500, BLOCK_REWARD, b"r1", ALICE_PUBLIC.to_vec());
    let block = chain.next_block(BlockBody::new(vec![coinbase], vec![contract.clone()]));
    chain.push(mined(block, 2_000));

    // Coinbase for bob, alice invests 200
    let alice_investment = wallet(ALICE_PUBLIC, ALICE_PRIVATE)
        .build_investment(&chain, &address, 200, 2_600)
        .unwrap();
    let coinbase = Transaction::coinbase(2_500, BLOCK_REWARD, b"r2", BOB_PUBLIC.to_vec());
    let block = chain.next_block(BlockBody::new(vec![coinbase, alice_investment], Vec::new()));
    chain.push(mined(block, 3_000));

    // Coinbase for carol, bob invests everything
    let bob_investment = wallet(BOB_PUBLIC, BOB_PRIVATE)
        .build_investment(&chain, &address, 500, 3_600)
        .unwrap();
    let coinbase = Transaction::coinbase(3_500, BLOCK_REWARD, b"r3", CAROL_PUBLIC.to_vec());
    let block = chain.next_block(BlockBody::new(vec![coinbase, bob_investment], Vec::new()));
    chain.push(mined(block, 4_000));

    assert_eq!(validate_chain(&chain, BLOCK_REWARD), Ok(()));
    (chain, contract)
}

#[test]
fn test_owner_payout_validates_on_chain() {
    let (mut chain, contract) = funded_project();
    let address = contract.id();
    let carol = wallet(CAROL_PUBLIC, CAROL_PRIVATE);

    // After the deadline the owner asks for the payout
    let withdrawal = carol.build_withdrawal(&chain, &address, 11_200).unwrap();
    let produced = contract::run(&chain, &contract, &withdrawal).unwrap();

    // One settlement moving both investments to the owner
    assert_eq!(produced.len(), 1);
    let payout = &produced[0];
    assert!(payout.is_contract_formatted());
    assert_eq!(payout.inputs.len(), 2);
    assert_eq!(payout.outputs, vec![Output::new(700, CAROL_PUBLIC.to_vec())]);

    let coinbase = Transaction::coinbase(11_000, BLOCK_REWARD, b"r4", ALICE_PUBLIC.to_vec());
    let mut transactions = vec![coinbase, withdrawal];
    transactions.extend(produced);
    let block = chain.next_block(BlockBody::new(transactions, Vec::new()));
    chain.push(mined(block, 11_500));

    assert_eq!(validate_chain(&chain, BLOCK_REWARD), Ok(()));

    // The payout is now spendable owner money
    assert_eq!(carol.balance(&chain), 500 + 700);

    // A second withdrawal attempt is refused by the contract
    let again = carol.build_withdrawal(&chain, &address, 12_000).unwrap();
    assert_eq!(
        contract::run(&chain, &contract, &again),
        Err(ContractError::AlreadyWithdrawn)
    );
}

#[test]
fn test_tampered_payout_fails_validation() {
    let (chain, contract) = funded_project();
    let address = contract.id();
    let carol = wallet(CAROL_PUBLIC, CAROL_PRIVATE);

    let withdrawal = carol.build_withdrawal(&chain, &address, 11_200).unwrap();
    let mut produced = contract::run(&chain, &contract, &withdrawal).unwrap();
    // Skim one coin off the settlement
    produced[0].outputs[0].amount -= 1;

    let mut forged = chain.clone();
    let coinbase = Transaction::coinbase(11_000, BLOCK_REWARD, b"r4", ALICE_PUBLIC.to_vec());
    let mut transactions = vec![coinbase, withdrawal];
    transactions.extend(produced);
    let block = forged.next_block(BlockBody::new(transactions, Vec::new()));
    forged.push(mined(block, 11_500));

    let error = validate_chain(&forged, BLOCK_REWARD).unwrap_err();
    assert_eq!(error.kind, ChainErrorKind::InvalidContractResult);
}

#[test]
fn test_missing_payout_fails_validation() {
    let (mut chain, contract) = funded_project();
    let address = contract.id();
    let carol = wallet(CAROL_PUBLIC, CAROL_PRIVATE);

    // The withdrawal lands on the chain without the settlement it triggers
    let withdrawal = carol.build_withdrawal(&chain, &address, 11_200).unwrap();
    let coinbase = Transaction::coinbase(11_000, BLOCK_REWARD, b"r4", ALICE_PUBLIC.to_vec());
    let block = chain.next_block(BlockBody::new(vec![coinbase, withdrawal], Vec::new()));
    chain.push(mined(block, 11_500));

    let error = validate_chain(&chain, BLOCK_REWARD).unwrap_err();
    assert_eq!(error.kind, ChainErrorKind::InvalidContractResult);
}

#[test]
fn test_withdraw_before_deadline_is_refused() {
    let (chain, contract) = funded_project();
    let carol = wallet(CAROL_PUBLIC, CAROL_PRIVATE);
    let withdrawal = carol.build_withdrawal(&chain, &contract.id(), 5_000).unwrap();
    assert_eq!(
        contract::run(&chain, &contract, &withdrawal),
        Err(ContractError::ProjectRunning)
    );
}

#[test]
fn test_non_owner_cannot_collect_funded_project() {
    let (chain, contract) = funded_project();
    let alice = wallet(ALICE_PUBLIC, ALICE_PRIVATE);
    let withdrawal = alice.build_withdrawal(&chain, &contract.id(), 11_200).unwrap();
    assert_eq!(
        contract::run(&chain, &contract, &withdrawal),
        Err(ContractError::ProjectSuccessOwnerOnly)
    );
}
