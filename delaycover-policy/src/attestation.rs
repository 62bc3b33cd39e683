// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Delay-attestation digest and signer recovery.
//!
//! The digest binds (transaction id, broadcast height, confirmation height)
//! with a fixed, order-sensitive packed encoding. Both the off-chain signer
//! and the claim verifier go through [`attestation_digest`], so a signature
//! can never be replayed against a different height pair.

use ethers::types::{Address, RecoveryMessage, Signature, TxHash, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

/// The claim evidence a purchaser submits: the three attested fields plus the
/// attester's recoverable signature over their digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimProof {
    pub transaction_id: TxHash,
    pub broadcast_height: u64,
    pub confirmation_height: u64,
    pub signature: Signature,
}

impl ClaimProof {
    /// Confirmation delay in blocks. `None` if the heights are inconsistent
    /// (confirmation before broadcast), which a verifier treats as
    /// insufficient delay rather than an error.
    pub fn delay(&self) -> Option<u64> {
        self.confirmation_height.checked_sub(self.broadcast_height)
    }
}

/// The signed bundle produced by the attester, returned to clients from the
/// proof endpoint. Ephemeral: never persisted beyond the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayAttestation {
    pub transaction_id: TxHash,
    pub broadcast_height: u64,
    pub confirmation_height: u64,
    pub signature: Signature,
    pub signer_address: Address,
    pub digest_hash: H256,
}

impl DelayAttestation {
    pub fn to_claim_proof(&self) -> ClaimProof {
        ClaimProof {
            transaction_id: self.transaction_id,
            broadcast_height: self.broadcast_height,
            confirmation_height: self.confirmation_height,
            signature: self.signature,
        }
    }
}

/// Keccak-256 over `tx_id (32) ‖ broadcast_height (32, BE) ‖
/// confirmation_height (32, BE)`. Heights are widened to 32-byte big-endian
/// words so the encoding has no ambiguous boundaries.
pub fn attestation_digest(
    transaction_id: TxHash,
    broadcast_height: u64,
    confirmation_height: u64,
) -> H256 {
    let mut buf = [0u8; 96];
    buf[..32].copy_from_slice(transaction_id.as_bytes());
    U256::from(broadcast_height).to_big_endian(&mut buf[32..64]);
    U256::from(confirmation_height).to_big_endian(&mut buf[64..96]);
    H256::from(keccak256(buf))
}

/// Recompute the digest from the proof's three fields and recover the signer
/// address. Never panics: a malformed signature yields `None`, which callers
/// treat as "invalid" rather than a propagated parse error.
pub fn recover_attester(proof: &ClaimProof) -> Option<Address> {
    let digest = attestation_digest(
        proof.transaction_id,
        proof.broadcast_height,
        proof.confirmation_height,
    );
    proof
        .signature
        .recover(RecoveryMessage::Hash(digest))
        .ok()
}
