// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Full protocol walkthroughs: purchase, attested claim, duplicate claim,
//! and a claim below the delay threshold.

use delaycover_policy::{
    attestation_digest, ClaimProof, PayoutSink, PolicyContract, PolicyError, PolicyParams,
    TransferError,
};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TxHash, U256};

#[derive(Default)]
struct RecordingSink {
    transfers: Vec<(Address, U256)>,
}

impl PayoutSink for RecordingSink {
    fn transfer(&mut self, to: Address, amount: U256) -> Result<(), TransferError> {
        self.transfers.push((to, amount));
        Ok(())
    }
}

fn one_ether() -> U256 {
    U256::exp10(18)
}

fn tenth_ether() -> U256 {
    U256::exp10(17)
}

fn sign_claim(attester: &LocalWallet, tx_id: TxHash, b: u64, c: u64) -> ClaimProof {
    let digest = attestation_digest(tx_id, b, c);
    ClaimProof {
        transaction_id: tx_id,
        broadcast_height: b,
        confirmation_height: c,
        signature: attester.sign_hash(digest).unwrap(),
    }
}

/// threshold 10, premium 1%, protocol fee 10%, payout 0.1 ETH
fn deploy() -> (PolicyContract, LocalWallet, Address) {
    let attester = LocalWallet::new(&mut rand::thread_rng());
    let owner = Address::repeat_byte(0xf0);
    let params = PolicyParams::new(10, 100, 1000, tenth_ether(), attester.address()).unwrap();
    (PolicyContract::new(owner, params).unwrap(), attester, owner)
}

#[test]
fn accepted_claim_then_rejected_duplicate() {
    let (mut contract, attester, _) = deploy();
    let user = Address::repeat_byte(0x01);
    let mut sink = RecordingSink::default();

    // 1 ETH purchase: 10 incidents, 0.1 ETH protocol fee, 0.9 ETH to pool.
    let receipt = contract.purchase_share(user, one_ether()).unwrap();
    assert_eq!(receipt.incidents_added, 10);
    assert_eq!(receipt.protocol_fee, tenth_ether());
    assert_eq!(receipt.to_pool, one_ether() - tenth_ether());
    let stats = contract.get_contract_stats();
    assert_eq!(stats.total_pool, one_ether() - tenth_ether());
    assert_eq!(stats.total_protocol_fees, tenth_ether());

    // A transaction broadcast at 1000 and confirmed at 1016: delay 16 > 10.
    let tx_id = TxHash::repeat_byte(0x5a);
    let proof = sign_claim(&attester, tx_id, 1000, 1016);
    let claim = contract.submit_claim(user, &proof, 1020, &mut sink).unwrap();
    assert_eq!(claim.payout, tenth_ether());
    assert_eq!(claim.incidents_remaining, 9);
    assert_eq!(sink.transfers, vec![(user, tenth_ether())]);

    // Pool decreased by exactly one payout.
    let stats = contract.get_contract_stats();
    assert_eq!(stats.total_pool, one_ether() - tenth_ether() - tenth_ether());
    assert_eq!(stats.processed_claims, 1);

    // The same proof again: rejected, nothing moves.
    let duplicate = contract.submit_claim(user, &proof, 1021, &mut sink);
    assert_eq!(duplicate, Err(PolicyError::AlreadyProcessed));
    assert_eq!(duplicate.unwrap_err().to_string(), "already processed");
    assert_eq!(sink.transfers.len(), 1);
    assert_eq!(contract.get_user_insurance(user).incidents_remaining, 9);
}

#[test]
fn claim_below_threshold_rejected() {
    let (mut contract, attester, _) = deploy();
    let user = Address::repeat_byte(0x02);
    let mut sink = RecordingSink::default();
    contract.purchase_share(user, one_ether()).unwrap();

    // Delay 9 with a perfectly valid signature: below the threshold of 10.
    let proof = sign_claim(&attester, TxHash::repeat_byte(0x5b), 1000, 1009);
    let result = contract.submit_claim(user, &proof, 1020, &mut sink);
    assert_eq!(result, Err(PolicyError::DelayNotSufficient));
    assert_eq!(result.unwrap_err().to_string(), "delay not sufficient");

    // Nothing was paid and the claim is not marked processed.
    assert!(sink.transfers.is_empty());
    assert!(!contract.is_claim_processed(&TxHash::repeat_byte(0x5b)));
    assert_eq!(contract.get_user_insurance(user).incidents_remaining, 10);
}

#[test]
fn coverage_exhausts_after_all_incidents() {
    let (mut contract, attester, _) = deploy();
    let user = Address::repeat_byte(0x03);
    let mut sink = RecordingSink::default();

    // 0.2 ETH: 2 incidents, 0.18 ETH pool. Top up the pool with a second
    // purchaser so both payouts are funded.
    contract.purchase_share(user, tenth_ether() * 2).unwrap();
    contract
        .purchase_share(Address::repeat_byte(0x04), one_ether())
        .unwrap();

    for (i, (b, c)) in [(100u64, 120u64), (200, 230)].iter().enumerate() {
        let proof = sign_claim(&attester, TxHash::repeat_byte(0x60 + i as u8), *b, *c);
        contract.submit_claim(user, &proof, *c + 5, &mut sink).unwrap();
    }
    assert_eq!(contract.get_user_insurance(user).incidents_remaining, 0);

    // Third claim fails with no coverage left, before signature checks.
    let proof = sign_claim(&attester, TxHash::repeat_byte(0x6f), 300, 330);
    assert_eq!(
        contract.submit_claim(user, &proof, 340, &mut sink),
        Err(PolicyError::NoIncidentsRemaining)
    );
    assert_eq!(sink.transfers.len(), 2);
}
