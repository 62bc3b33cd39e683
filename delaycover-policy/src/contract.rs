// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Coverage ledger, shared pool, and the claim/payout state machine.
//!
//! Every operation is an atomic state transition: any violated precondition
//! aborts with no partial writes. The only external effect is the value
//! transfer through a [`PayoutSink`], and the processed-claims mark is
//! written before that call; a failed transfer rolls back every provisional
//! write so the claim tuple stays resubmittable.

use crate::attestation::{recover_attester, ClaimProof};
use crate::error::{PolicyError, PolicyResult, TransferError};
use crate::policy::{PolicyParams, BPS_DENOMINATOR};
use ethers::types::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Moves native value out of the contract. The host environment decides what
/// a transfer means (chain-native send, simulator credit, test recording).
pub trait PayoutSink {
    fn transfer(&mut self, to: Address, amount: U256) -> Result<(), TransferError>;
}

/// Per-purchaser coverage state. `deposited_value` is monotonically
/// non-decreasing; only purchases add to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCoverage {
    pub deposited_value: U256,
    pub incidents_remaining: u64,
    pub last_claim_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareQuote {
    /// Premium scales with the current pool size, not the purchase amount.
    pub premium: U256,
    pub incidents_covered: u64,
    pub protocol_fee: U256,
    pub to_pool: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub incidents_added: u64,
    pub to_pool: U256,
    pub protocol_fee: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub transaction_id: TxHash,
    pub payout: U256,
    pub incidents_remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractStats {
    pub total_pool: U256,
    pub total_protocol_fees: U256,
    pub covered_users: u64,
    pub processed_claims: u64,
    pub active: bool,
}

/// One deployed policy instance.
#[derive(Debug)]
pub struct PolicyContract {
    params: PolicyParams,
    owner: Address,
    coverage: HashMap<Address, UserCoverage>,
    total_pool: U256,
    total_protocol_fees: U256,
    /// Membership is permanent: no un-marking, no TTL. This set is the
    /// double-spend guard for claims.
    processed_claims: HashSet<TxHash>,
    rpc_proxy_address: Option<Address>,
    /// Exclusive in-call lock around external transfers; a reentrant call
    /// during the locked window fails fast.
    entered: bool,
}

impl PolicyContract {
    pub fn new(owner: Address, params: PolicyParams) -> PolicyResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            owner,
            coverage: HashMap::new(),
            total_pool: U256::zero(),
            total_protocol_fees: U256::zero(),
            processed_claims: HashSet::new(),
            rpc_proxy_address: None,
            entered: false,
        })
    }

    // ---------- views ----------

    pub fn get_share_quote(&self, value: U256) -> PolicyResult<ShareQuote> {
        let premium = self
            .total_pool
            .checked_mul(U256::from(self.params.premium_bps))
            .ok_or(PolicyError::Overflow)?
            / U256::from(BPS_DENOMINATOR);
        let (protocol_fee, to_pool) = self.split_purchase(value)?;
        Ok(ShareQuote {
            premium,
            incidents_covered: self.incidents_for(value),
            protocol_fee,
            to_pool,
        })
    }

    pub fn get_user_insurance(&self, user: Address) -> UserCoverage {
        self.coverage.get(&user).cloned().unwrap_or_default()
    }

    pub fn get_policy_details(&self) -> &PolicyParams {
        &self.params
    }

    pub fn get_contract_stats(&self) -> ContractStats {
        ContractStats {
            total_pool: self.total_pool,
            total_protocol_fees: self.total_protocol_fees,
            covered_users: self.coverage.len() as u64,
            processed_claims: self.processed_claims.len() as u64,
            active: self.params.active,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn rpc_proxy_address(&self) -> Option<Address> {
        self.rpc_proxy_address
    }

    pub fn is_claim_processed(&self, transaction_id: &TxHash) -> bool {
        self.processed_claims.contains(transaction_id)
    }

    // ---------- purchase ----------

    pub fn purchase_share(&mut self, caller: Address, value: U256) -> PolicyResult<PurchaseReceipt> {
        if !self.params.active {
            return Err(PolicyError::NotActive);
        }
        if value.is_zero() {
            return Err(PolicyError::ZeroValue);
        }
        let incidents = self.incidents_for(value);
        if incidents == 0 {
            return Err(PolicyError::AmountTooSmall);
        }
        let (protocol_fee, to_pool) = self.split_purchase(value)?;

        // All checked arithmetic happens before any write so an overflow
        // cannot leave a half-credited purchase.
        let entry = self.coverage.entry(caller).or_default();
        let new_deposited = entry
            .deposited_value
            .checked_add(value)
            .ok_or(PolicyError::Overflow)?;
        let new_incidents = entry
            .incidents_remaining
            .checked_add(incidents)
            .ok_or(PolicyError::Overflow)?;
        let new_pool = self
            .total_pool
            .checked_add(to_pool)
            .ok_or(PolicyError::Overflow)?;
        let new_fees = self
            .total_protocol_fees
            .checked_add(protocol_fee)
            .ok_or(PolicyError::Overflow)?;

        entry.deposited_value = new_deposited;
        entry.incidents_remaining = new_incidents;
        self.total_pool = new_pool;
        self.total_protocol_fees = new_fees;

        Ok(PurchaseReceipt {
            incidents_added: incidents,
            to_pool,
            protocol_fee,
        })
    }

    // ---------- claims ----------

    /// Verify a claim and pay out one incident.
    ///
    /// Preconditions are checked in order: active policy, unused transaction
    /// id, remaining coverage, strict delay threshold, attester signature.
    /// Pool sufficiency is checked before the claim is marked processed so an
    /// underfunded rejection leaves the claim resubmittable.
    pub fn submit_claim(
        &mut self,
        caller: Address,
        proof: &ClaimProof,
        current_height: u64,
        sink: &mut dyn PayoutSink,
    ) -> PolicyResult<ClaimReceipt> {
        if self.entered {
            return Err(PolicyError::Reentrancy);
        }
        self.entered = true;
        let result = self.submit_claim_locked(caller, proof, current_height, sink);
        self.entered = false;
        result
    }

    fn submit_claim_locked(
        &mut self,
        caller: Address,
        proof: &ClaimProof,
        current_height: u64,
        sink: &mut dyn PayoutSink,
    ) -> PolicyResult<ClaimReceipt> {
        if !self.params.active {
            return Err(PolicyError::NotActive);
        }
        if self.processed_claims.contains(&proof.transaction_id) {
            return Err(PolicyError::AlreadyProcessed);
        }
        let incidents_remaining = self
            .coverage
            .get(&caller)
            .map(|c| c.incidents_remaining)
            .unwrap_or(0);
        if incidents_remaining == 0 {
            return Err(PolicyError::NoIncidentsRemaining);
        }
        // Strictly greater-than: a delay equal to the threshold does not
        // qualify. Inconsistent heights (confirmation before broadcast)
        // cannot qualify either.
        match proof.delay() {
            Some(delay) if delay > self.params.delay_threshold => {}
            _ => return Err(PolicyError::DelayNotSufficient),
        }
        if recover_attester(proof) != Some(self.params.attester_address) {
            return Err(PolicyError::InvalidSignature);
        }

        let payout = self.params.payout_per_incident;
        if self.total_pool < payout {
            // Rejected before any state is written: the same proof can be
            // resubmitted once the pool is replenished.
            return Err(PolicyError::InsufficientPoolFunds);
        }

        // All provisional writes happen before the external transfer so a
        // reentrant observer already sees the claim as processed.
        let coverage = self
            .coverage
            .get_mut(&caller)
            .ok_or(PolicyError::NoIncidentsRemaining)?;
        let prev_last_claim_height = coverage.last_claim_height;
        coverage.incidents_remaining -= 1;
        coverage.last_claim_height = current_height;
        let incidents_remaining = coverage.incidents_remaining;
        self.processed_claims.insert(proof.transaction_id);
        self.total_pool -= payout;

        if let Err(e) = sink.transfer(caller, payout) {
            // Revert the whole transition; the failing branch must not leave
            // the claim marked processed.
            self.processed_claims.remove(&proof.transaction_id);
            if let Some(coverage) = self.coverage.get_mut(&caller) {
                coverage.incidents_remaining += 1;
                coverage.last_claim_height = prev_last_claim_height;
            }
            self.total_pool += payout;
            return Err(PolicyError::TransferFailed(e));
        }

        Ok(ClaimReceipt {
            transaction_id: proof.transaction_id,
            payout,
            incidents_remaining,
        })
    }

    // ---------- owner operations ----------

    pub fn configure_policy_params(
        &mut self,
        caller: Address,
        params: PolicyParams,
    ) -> PolicyResult<()> {
        self.require_owner(caller)?;
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn set_rpc_proxy_address(&mut self, caller: Address, addr: Address) -> PolicyResult<()> {
        self.require_owner(caller)?;
        self.rpc_proxy_address = Some(addr);
        Ok(())
    }

    pub fn toggle_policy_status(&mut self, caller: Address) -> PolicyResult<bool> {
        self.require_owner(caller)?;
        self.params.active = !self.params.active;
        Ok(self.params.active)
    }

    /// Pay accumulated protocol fees to the owner. Same write-before-transfer
    /// discipline as claims: the counter is zeroed first and restored if the
    /// transfer fails.
    pub fn withdraw_protocol_fees(
        &mut self,
        caller: Address,
        sink: &mut dyn PayoutSink,
    ) -> PolicyResult<U256> {
        self.require_owner(caller)?;
        if self.entered {
            return Err(PolicyError::Reentrancy);
        }
        if self.total_protocol_fees.is_zero() {
            return Err(PolicyError::NoFeesToWithdraw);
        }
        self.entered = true;
        let amount = self.total_protocol_fees;
        self.total_protocol_fees = U256::zero();
        let result = sink.transfer(self.owner, amount);
        self.entered = false;
        if let Err(e) = result {
            self.total_protocol_fees = amount;
            return Err(PolicyError::TransferFailed(e));
        }
        Ok(amount)
    }

    // ---------- internals ----------

    fn require_owner(&self, caller: Address) -> PolicyResult<()> {
        if caller != self.owner {
            return Err(PolicyError::NotOwner);
        }
        Ok(())
    }

    fn incidents_for(&self, value: U256) -> u64 {
        let incidents = value / self.params.payout_per_incident;
        // Purchases large enough to overflow u64 incidents are unreachable
        // with real native-currency values.
        u64::try_from(incidents).unwrap_or(u64::MAX)
    }

    fn split_purchase(&self, value: U256) -> PolicyResult<(U256, U256)> {
        let protocol_fee = value
            .checked_mul(U256::from(self.params.protocol_fee_bps))
            .ok_or(PolicyError::Overflow)?
            / U256::from(BPS_DENOMINATOR);
        Ok((protocol_fee, value - protocol_fee))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::attestation_digest;
    use ethers::signers::{LocalWallet, Signer};

    /// Records transfers instead of moving value.
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

    /// Rejects every transfer, like a recipient contract that refuses funds.
    struct RejectingSink;

    impl PayoutSink for RejectingSink {
        fn transfer(&mut self, _to: Address, _amount: U256) -> Result<(), TransferError> {
            Err(TransferError("recipient rejected funds".to_string()))
        }
    }

    fn eth(tenths: u64) -> U256 {
        // 0.1 ETH units
        U256::exp10(17) * tenths
    }

    fn setup() -> (PolicyContract, LocalWallet, Address, Address) {
        let attester = LocalWallet::new(&mut rand::thread_rng());
        let owner = Address::repeat_byte(0x01);
        let user = Address::repeat_byte(0x02);
        // threshold=10, premium=1%, protocol fee=10%, payout=0.1 ETH
        let params = PolicyParams::new(10, 100, 1000, eth(1), attester.address()).unwrap();
        let contract = PolicyContract::new(owner, params).unwrap();
        (contract, attester, owner, user)
    }

    fn signed_proof(attester: &LocalWallet, tx_id: TxHash, b: u64, c: u64) -> ClaimProof {
        let digest = attestation_digest(tx_id, b, c);
        ClaimProof {
            transaction_id: tx_id,
            broadcast_height: b,
            confirmation_height: c,
            signature: attester.sign_hash(digest).unwrap(),
        }
    }

    #[test]
    fn test_quote_incidents_scale_with_payout_multiples() {
        let (mut contract, _, _, user) = setup();
        for k in 1u64..=5 {
            let quote = contract.get_share_quote(eth(k)).unwrap();
            assert_eq!(quote.incidents_covered, k);
        }
        // Premium scales with pool size, not purchase size.
        assert!(contract.get_share_quote(eth(1)).unwrap().premium.is_zero());
        contract.purchase_share(user, eth(10)).unwrap();
        // pool = 0.9 ETH, premium = 1% of pool
        let quote = contract.get_share_quote(eth(1)).unwrap();
        assert_eq!(quote.premium, eth(9) / 100);
    }

    #[test]
    fn test_purchase_splits_fee_and_pool() {
        let (mut contract, _, _, user) = setup();
        // 1 ETH deposit: 10 incidents, 0.1 ETH fee, 0.9 ETH to pool.
        let receipt = contract.purchase_share(user, eth(10)).unwrap();
        assert_eq!(receipt.incidents_added, 10);
        assert_eq!(receipt.protocol_fee, eth(1));
        assert_eq!(receipt.to_pool, eth(9));

        let stats = contract.get_contract_stats();
        assert_eq!(stats.total_pool, eth(9));
        assert_eq!(stats.total_protocol_fees, eth(1));

        let cov = contract.get_user_insurance(user);
        assert_eq!(cov.deposited_value, eth(10));
        assert_eq!(cov.incidents_remaining, 10);
    }

    #[test]
    fn test_purchase_rejections() {
        let (mut contract, _, owner, user) = setup();
        assert_eq!(
            contract.purchase_share(user, U256::zero()),
            Err(PolicyError::ZeroValue)
        );
        // Below one payout unit: no coverage.
        assert_eq!(
            contract.purchase_share(user, eth(1) - 1),
            Err(PolicyError::AmountTooSmall)
        );
        contract.toggle_policy_status(owner).unwrap();
        assert_eq!(
            contract.purchase_share(user, eth(10)),
            Err(PolicyError::NotActive)
        );
    }

    #[test]
    fn test_purchase_incident_overflow_rejected_atomically() {
        let attester = LocalWallet::new(&mut rand::thread_rng());
        let owner = Address::repeat_byte(0x01);
        let user = Address::repeat_byte(0x02);
        // 1-wei payout so the incident count tracks the raw deposit value.
        let params = PolicyParams::new(10, 100, 1000, U256::one(), attester.address()).unwrap();
        let mut contract = PolicyContract::new(owner, params).unwrap();

        contract.purchase_share(user, U256::from(u64::MAX)).unwrap();
        assert_eq!(
            contract.get_user_insurance(user).incidents_remaining,
            u64::MAX
        );

        // One more incident cannot be represented; nothing may move.
        let before = contract.get_contract_stats();
        assert_eq!(
            contract.purchase_share(user, U256::one()),
            Err(PolicyError::Overflow)
        );
        let cov = contract.get_user_insurance(user);
        assert_eq!(cov.incidents_remaining, u64::MAX);
        assert_eq!(cov.deposited_value, U256::from(u64::MAX));
        let after = contract.get_contract_stats();
        assert_eq!(after.total_pool, before.total_pool);
        assert_eq!(after.total_protocol_fees, before.total_protocol_fees);
    }

    #[test]
    fn test_claim_succeeds_and_pays_out() {
        let (mut contract, attester, _, user) = setup();
        contract.purchase_share(user, eth(10)).unwrap();

        let proof = signed_proof(&attester, TxHash::repeat_byte(0xaa), 100, 116);
        let mut sink = RecordingSink::default();
        let receipt = contract.submit_claim(user, &proof, 200, &mut sink).unwrap();

        assert_eq!(receipt.payout, eth(1));
        assert_eq!(receipt.incidents_remaining, 9);
        assert_eq!(sink.transfers, vec![(user, eth(1))]);
        assert_eq!(contract.get_contract_stats().total_pool, eth(8));
        let cov = contract.get_user_insurance(user);
        assert_eq!(cov.incidents_remaining, 9);
        assert_eq!(cov.last_claim_height, 200);
        assert!(contract.is_claim_processed(&proof.transaction_id));
    }

    #[test]
    fn test_threshold_is_strict() {
        let (mut contract, attester, _, user) = setup();
        contract.purchase_share(user, eth(10)).unwrap();
        let mut sink = RecordingSink::default();

        // delay == threshold: rejected even with a valid signature.
        let at_threshold = signed_proof(&attester, TxHash::repeat_byte(0x01), 100, 110);
        assert_eq!(
            contract.submit_claim(user, &at_threshold, 200, &mut sink),
            Err(PolicyError::DelayNotSufficient)
        );
        // delay == threshold + 1: accepted.
        let over_threshold = signed_proof(&attester, TxHash::repeat_byte(0x02), 100, 111);
        assert!(contract
            .submit_claim(user, &over_threshold, 200, &mut sink)
            .is_ok());
    }

    #[test]
    fn test_inverted_heights_rejected_as_insufficient_delay() {
        let (mut contract, attester, _, user) = setup();
        contract.purchase_share(user, eth(10)).unwrap();
        let proof = signed_proof(&attester, TxHash::repeat_byte(0x03), 116, 100);
        let mut sink = RecordingSink::default();
        assert_eq!(
            contract.submit_claim(user, &proof, 200, &mut sink),
            Err(PolicyError::DelayNotSufficient)
        );
    }

    #[test]
    fn test_wrong_signer_rejected() {
        let (mut contract, _, _, user) = setup();
        contract.purchase_share(user, eth(10)).unwrap();
        let rogue = LocalWallet::new(&mut rand::thread_rng());
        let proof = signed_proof(&rogue, TxHash::repeat_byte(0x04), 100, 120);
        let mut sink = RecordingSink::default();
        assert_eq!(
            contract.submit_claim(user, &proof, 200, &mut sink),
            Err(PolicyError::InvalidSignature)
        );
    }

    #[test]
    fn test_no_double_payout() {
        let (mut contract, attester, _, user) = setup();
        contract.purchase_share(user, eth(10)).unwrap();
        let proof = signed_proof(&attester, TxHash::repeat_byte(0x05), 100, 120);
        let mut sink = RecordingSink::default();

        contract.submit_claim(user, &proof, 200, &mut sink).unwrap();
        let pool_after = contract.get_contract_stats().total_pool;
        let incidents_after = contract.get_user_insurance(user).incidents_remaining;

        assert_eq!(
            contract.submit_claim(user, &proof, 201, &mut sink),
            Err(PolicyError::AlreadyProcessed)
        );
        // State unchanged by the rejected duplicate.
        assert_eq!(contract.get_contract_stats().total_pool, pool_after);
        assert_eq!(
            contract.get_user_insurance(user).incidents_remaining,
            incidents_after
        );
        assert_eq!(sink.transfers.len(), 1);
    }

    #[test]
    fn test_underfunded_pool_rejection_is_atomic() {
        let (mut contract, attester, _, user) = setup();
        // Smallest possible purchase: 1 incident, 0.09 ETH to pool — less
        // than the 0.1 ETH payout.
        contract.purchase_share(user, eth(1)).unwrap();
        assert!(contract.get_contract_stats().total_pool < eth(1));

        let proof = signed_proof(&attester, TxHash::repeat_byte(0x06), 100, 120);
        let mut sink = RecordingSink::default();
        assert_eq!(
            contract.submit_claim(user, &proof, 200, &mut sink),
            Err(PolicyError::InsufficientPoolFunds)
        );
        // Not marked processed: resubmission succeeds once replenished.
        assert!(!contract.is_claim_processed(&proof.transaction_id));
        contract.purchase_share(user, eth(10)).unwrap();
        assert!(contract.submit_claim(user, &proof, 210, &mut sink).is_ok());
    }

    #[test]
    fn test_failed_transfer_rolls_back_everything() {
        let (mut contract, attester, _, user) = setup();
        contract.purchase_share(user, eth(10)).unwrap();
        let pool_before = contract.get_contract_stats().total_pool;
        let cov_before = contract.get_user_insurance(user);

        let proof = signed_proof(&attester, TxHash::repeat_byte(0x07), 100, 120);
        let result = contract.submit_claim(user, &proof, 200, &mut RejectingSink);
        assert!(matches!(result, Err(PolicyError::TransferFailed(_))));

        assert!(!contract.is_claim_processed(&proof.transaction_id));
        assert_eq!(contract.get_contract_stats().total_pool, pool_before);
        assert_eq!(contract.get_user_insurance(user), cov_before);

        // Retriable with a payable recipient.
        let mut sink = RecordingSink::default();
        assert!(contract.submit_claim(user, &proof, 201, &mut sink).is_ok());
    }

    #[test]
    fn test_claim_without_coverage_rejected() {
        let (mut contract, attester, _, user) = setup();
        let proof = signed_proof(&attester, TxHash::repeat_byte(0x08), 100, 120);
        let mut sink = RecordingSink::default();
        assert_eq!(
            contract.submit_claim(user, &proof, 200, &mut sink),
            Err(PolicyError::NoIncidentsRemaining)
        );
    }

    #[test]
    fn test_owner_operations() {
        let (mut contract, attester, owner, user) = setup();
        contract.purchase_share(user, eth(10)).unwrap();

        // Non-owner rejected everywhere.
        assert_eq!(
            contract.toggle_policy_status(user),
            Err(PolicyError::NotOwner)
        );
        assert_eq!(
            contract.set_rpc_proxy_address(user, Address::repeat_byte(0x55)),
            Err(PolicyError::NotOwner)
        );

        contract
            .set_rpc_proxy_address(owner, Address::repeat_byte(0x55))
            .unwrap();
        assert_eq!(
            contract.rpc_proxy_address(),
            Some(Address::repeat_byte(0x55))
        );

        // Fee withdrawal pays the owner and zeroes the counter.
        let mut sink = RecordingSink::default();
        let amount = contract.withdraw_protocol_fees(owner, &mut sink).unwrap();
        assert_eq!(amount, eth(1));
        assert_eq!(sink.transfers, vec![(owner, eth(1))]);
        assert_eq!(
            contract.withdraw_protocol_fees(owner, &mut sink),
            Err(PolicyError::NoFeesToWithdraw)
        );

        // Failed withdrawal restores the counter.
        contract.purchase_share(user, eth(10)).unwrap();
        assert!(matches!(
            contract.withdraw_protocol_fees(owner, &mut RejectingSink),
            Err(PolicyError::TransferFailed(_))
        ));
        assert_eq!(contract.get_contract_stats().total_protocol_fees, eth(1));

        // Reconfiguration re-validates.
        let bad = PolicyParams {
            delay_threshold: 0,
            ..contract.get_policy_details().clone()
        };
        assert!(matches!(
            contract.configure_policy_params(owner, bad),
            Err(PolicyError::InvalidParameter(_))
        ));
        let good = PolicyParams {
            delay_threshold: 20,
            ..contract.get_policy_details().clone()
        };
        contract.configure_policy_params(owner, good).unwrap();
        assert_eq!(contract.get_policy_details().delay_threshold, 20);
        let _ = attester;
    }

    #[test]
    fn test_inactive_policy_rejects_claims() {
        let (mut contract, attester, owner, user) = setup();
        contract.purchase_share(user, eth(10)).unwrap();
        contract.toggle_policy_status(owner).unwrap();
        let proof = signed_proof(&attester, TxHash::repeat_byte(0x09), 100, 120);
        let mut sink = RecordingSink::default();
        assert_eq!(
            contract.submit_claim(user, &proof, 200, &mut sink),
            Err(PolicyError::NotActive)
        );
    }
}
