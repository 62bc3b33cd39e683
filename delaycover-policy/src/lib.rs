// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Deterministic state machine for confirmation-delay coverage.
//!
//! This crate holds everything the claim side of the protocol must agree on:
//! the attestation digest encoding, signer recovery, policy parameters, and
//! the coverage/pool/claim state machine. It performs no I/O and spawns no
//! tasks, so it can be driven by a chain runtime, a simulator, or plain
//! tests. The off-chain witness (`delaycover-node`) depends on this crate so
//! that the attestation signer and the claim verifier can never drift apart
//! on the digest encoding.

pub mod attestation;
pub mod contract;
pub mod error;
pub mod policy;

pub use attestation::{attestation_digest, recover_attester, ClaimProof, DelayAttestation};
pub use contract::{
    ClaimReceipt, ContractStats, PayoutSink, PolicyContract, PurchaseReceipt, ShareQuote,
    UserCoverage,
};
pub use error::{PolicyError, PolicyResult, TransferError};
pub use policy::PolicyParams;
