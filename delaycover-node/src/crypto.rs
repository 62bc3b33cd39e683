// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Attestation signing.
//!
//! The attester key is a secp256k1 key loaded from a hex key file at startup;
//! a missing or malformed key is fatal, the node must not serve without it.
//! Signing goes through the digest encoding shared with the claim verifier in
//! `delaycover-policy`.

use crate::error::{CoverError, CoverResult};
use crate::metrics::CoverMetrics;
use anyhow::{anyhow, Context};
use delaycover_policy::{attestation_digest, recover_attester, DelayAttestation};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TxHash};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

const SIGNED_PROOF_CACHE_SIZE: usize = 1000;

/// Read a secp256k1 private key from a file containing its hex encoding,
/// with or without a 0x prefix.
pub fn read_attester_key(path: &Path) -> anyhow::Result<LocalWallet> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read attester key file {:?}", path))?;
    let hex_str = raw.trim().trim_start_matches("0x");
    let bytes = hex::decode(hex_str)
        .with_context(|| format!("attester key file {:?} is not valid hex", path))?;
    let wallet = LocalWallet::from_bytes(&bytes)
        .map_err(|e| anyhow!("attester key file {:?} holds an invalid key: {}", path, e))?;
    info!(
        "Loaded attester key from {:?}, address {:?}",
        path,
        wallet.address()
    );
    Ok(wallet)
}

/// Signs delay attestations, caching by transaction hash.
///
/// The attested heights for a hash never change once confirmed, so repeated
/// proof requests for the same transaction are served from cache without
/// touching the key again.
pub struct ProofSigner {
    wallet: LocalWallet,
    cache: Mutex<LruCache<TxHash, DelayAttestation>>,
    metrics: Arc<CoverMetrics>,
}

impl ProofSigner {
    pub fn new(wallet: LocalWallet, metrics: Arc<CoverMetrics>) -> Self {
        Self {
            wallet,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(SIGNED_PROOF_CACHE_SIZE).unwrap(),
            )),
            metrics,
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn sign_delay_proof(
        &self,
        transaction_id: TxHash,
        broadcast_height: u64,
        confirmation_height: u64,
    ) -> CoverResult<DelayAttestation> {
        {
            let mut cache = self.cache.lock().expect("proof cache lock poisoned");
            if let Some(cached) = cache.get(&transaction_id) {
                if cached.broadcast_height == broadcast_height
                    && cached.confirmation_height == confirmation_height
                {
                    self.metrics.signer_cache_hit.inc();
                    return Ok(cached.clone());
                }
            }
        }
        self.metrics.signer_cache_miss.inc();

        let digest = attestation_digest(transaction_id, broadcast_height, confirmation_height);
        let signature = self
            .wallet
            .sign_hash(digest)
            .map_err(|e| CoverError::SigningError(e.to_string()))?;
        let attestation = DelayAttestation {
            transaction_id,
            broadcast_height,
            confirmation_height,
            signature,
            signer_address: self.wallet.address(),
            digest_hash: digest,
        };
        self.metrics.proofs_signed.inc();

        let mut cache = self.cache.lock().expect("proof cache lock poisoned");
        cache.put(transaction_id, attestation.clone());
        Ok(attestation)
    }
}

/// Self-consistency check: the attestation's signature must recover to the
/// expected attester over the recomputed digest. Malformed input is simply
/// invalid, never an error.
pub fn verify_delay_proof(attestation: &DelayAttestation, expected_attester: Address) -> bool {
    attestation.signer_address == expected_attester
        && recover_attester(&attestation.to_claim_proof()) == Some(expected_attester)
}
