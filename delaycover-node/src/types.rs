// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{CoverError, CoverResult};
use ethers::types::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lifecycle of a tracked transaction. `Confirmed` and `Failed` are terminal;
/// the ledger never transitions a record out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Broadcast,
    Confirmed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Confirmed | TransactionStatus::Failed)
    }
}

impl FromStr for TransactionStatus {
    type Err = CoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broadcast" => Ok(TransactionStatus::Broadcast),
            "confirmed" => Ok(TransactionStatus::Confirmed),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(CoverError::InvalidClientRequest(format!(
                "unknown status filter: {}",
                other
            ))),
        }
    }
}

/// One tracked transaction in the ledger.
///
/// `first_seen_ms` is fixed at the first write for this hash and drives
/// eviction. `delay_blocks` is computed exactly once, at confirmation, and is
/// present iff the record is `Confirmed` with both heights known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub tx_hash: TxHash,
    pub status: TransactionStatus,
    pub broadcast_height: Option<u64>,
    pub broadcast_at_ms: Option<u64>,
    pub first_seen_ms: u64,
    pub confirmation_height: Option<u64>,
    pub confirmation_at_ms: Option<u64>,
    pub delay_blocks: Option<u64>,
    pub last_error: Option<String>,
}

/// Counts returned by `GET /stats`, one bucket per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub total: u64,
    pub broadcast: u64,
    pub confirmed: u64,
    pub failed: u64,
}

// ---------- HTTP request/response types ----------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub to: Option<String>,
    pub value: Option<String>,
    pub data: Option<String>,
    pub gas_limit: Option<String>,
    pub gas_price: Option<String>,
    pub max_fee_per_gas: Option<String>,
    pub max_priority_fee_per_gas: Option<String>,
    pub nonce: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    pub tx_hash: TxHash,
    pub broadcast_height: u64,
    pub timestamp_ms: u64,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp_ms: u64,
    pub network: String,
    pub ledger: LedgerStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResponse {
    pub network: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub signer_address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentBlockResponse {
    pub block_number: u64,
    pub timestamp_ms: u64,
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Parse a quantity from either 0x-prefixed hex or decimal, the two forms
/// wallets actually send.
pub fn parse_u256(field: &str, raw: &str) -> CoverResult<U256> {
    let parsed = if let Some(hex_part) = raw.strip_prefix("0x") {
        U256::from_str_radix(hex_part, 16).ok()
    } else {
        U256::from_dec_str(raw).ok()
    };
    parsed.ok_or_else(|| {
        CoverError::InvalidClientRequest(format!("invalid value for {}: {}", field, raw))
    })
}

pub fn parse_tx_hash(tx_hash_hex: &str) -> CoverResult<TxHash> {
    TxHash::from_str(tx_hash_hex).map_err(|_| CoverError::InvalidTxHash)
}

pub fn parse_address(field: &str, raw: &str) -> CoverResult<Address> {
    Address::from_str(raw).map_err(|_| {
        CoverError::InvalidClientRequest(format!("invalid address for {}: {}", field, raw))
    })
}
