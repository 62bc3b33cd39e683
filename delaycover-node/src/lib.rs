// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Off-chain witness node for confirmation-delay coverage.
//!
//! The node sits between a wallet and an Ethereum JSON-RPC endpoint. It
//! forwards traffic, intercepts transaction broadcasts to record the chain
//! height at submission, watches for confirmations, and signs delay
//! attestations that the on-chain policy (`delaycover-policy`) accepts as
//! claim evidence.

pub mod config;
pub mod crypto;
pub mod error;
pub mod eth_client;
pub mod interceptor;
pub mod ledger;
pub mod metrics;
pub mod node;
pub mod server;
pub mod types;
