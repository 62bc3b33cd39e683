// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

//! A mock implementation for `NodeRequestHandlerTrait` that serves preset
//! ledger records from memory, for router tests.

use crate::error::CoverError;
use crate::metrics::CoverMetrics;
use crate::server::handler::NodeRequestHandlerTrait;
use crate::types::{
    now_ms, parse_tx_hash, BroadcastRequest, BroadcastResponse, CurrentBlockResponse,
    HealthResponse, LedgerStats, NetworkResponse, TransactionRecord, TransactionStatus,
};
use async_trait::async_trait;
use axum::Json;
use delaycover_policy::DelayAttestation;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::TxHash;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockNodeRequestHandler {
    wallet: LocalWallet,
    transactions: Arc<Mutex<HashMap<TxHash, TransactionRecord>>>,
    metrics: Arc<CoverMetrics>,
}

impl MockNodeRequestHandler {
    pub fn new() -> Self {
        Self {
            wallet: LocalWallet::new(&mut rand::thread_rng()),
            transactions: Arc::new(Mutex::new(HashMap::new())),
            metrics: Arc::new(CoverMetrics::new_for_testing()),
        }
    }

    pub fn set_transaction(&self, record: TransactionRecord) {
        self.transactions
            .lock()
            .unwrap()
            .insert(record.tx_hash, record);
    }

    fn stats_inner(&self) -> LedgerStats {
        let transactions = self.transactions.lock().unwrap();
        let mut stats = LedgerStats {
            total: transactions.len() as u64,
            ..Default::default()
        };
        for record in transactions.values() {
            match record.status {
                TransactionStatus::Broadcast => stats.broadcast += 1,
                TransactionStatus::Confirmed => stats.confirmed += 1,
                TransactionStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

impl Default for MockNodeRequestHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeRequestHandlerTrait for MockNodeRequestHandler {
    async fn health(&self) -> Result<Json<HealthResponse>, CoverError> {
        Ok(Json(HealthResponse {
            status: "ok",
            timestamp_ms: now_ms(),
            network: "mock".to_string(),
            ledger: self.stats_inner(),
        }))
    }

    async fn network(&self) -> Result<Json<NetworkResponse>, CoverError> {
        Ok(Json(NetworkResponse {
            network: "mock".to_string(),
            chain_id: 31337,
            rpc_url: "mock://localhost".to_string(),
            signer_address: self.wallet.address(),
        }))
    }

    async fn current_block(&self) -> Result<Json<CurrentBlockResponse>, CoverError> {
        Ok(Json(CurrentBlockResponse {
            block_number: 1,
            timestamp_ms: now_ms(),
        }))
    }

    async fn broadcast(
        &self,
        _request: BroadcastRequest,
    ) -> Result<Json<BroadcastResponse>, CoverError> {
        unimplemented!()
    }

    async fn get_transaction(
        &self,
        tx_hash_hex: String,
    ) -> Result<Json<TransactionRecord>, CoverError> {
        let tx_hash = parse_tx_hash(&tx_hash_hex)?;
        self.transactions
            .lock()
            .unwrap()
            .get(&tx_hash)
            .cloned()
            .map(Json)
            .ok_or(CoverError::TxNotFound)
    }

    async fn get_proof(
        &self,
        tx_hash_hex: String,
    ) -> Result<Json<DelayAttestation>, CoverError> {
        let tx_hash = parse_tx_hash(&tx_hash_hex)?;
        let record = self
            .transactions
            .lock()
            .unwrap()
            .get(&tx_hash)
            .cloned()
            .ok_or(CoverError::TxNotFound)?;
        if record.status != TransactionStatus::Confirmed {
            return Err(CoverError::TxNotYetConfirmed);
        }
        let broadcast_height = record
            .broadcast_height
            .ok_or(CoverError::MissingBroadcastHeight)?;
        let confirmation_height = record.confirmation_height.unwrap_or(0);
        let signer = crate::crypto::ProofSigner::new(self.wallet.clone(), self.metrics.clone());
        Ok(Json(signer.sign_delay_proof(
            tx_hash,
            broadcast_height,
            confirmation_height,
        )?))
    }

    async fn rpc(
        &self,
        request: serde_json::Value,
    ) -> Result<Json<serde_json::Value>, CoverError> {
        // Echo the request id with a null result; enough for routing tests.
        let id = request.get("id").cloned().unwrap_or(serde_json::Value::Null);
        Ok(Json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": null,
        })))
    }

    async fn stats(&self) -> Result<Json<LedgerStats>, CoverError> {
        Ok(Json(self.stats_inner()))
    }

    async fn list_transactions(
        &self,
        status: Option<String>,
        limit: Option<usize>,
    ) -> Result<Json<Vec<TransactionRecord>>, CoverError> {
        use std::str::FromStr;
        let status = status
            .as_deref()
            .map(TransactionStatus::from_str)
            .transpose()?;
        let records = self
            .transactions
            .lock()
            .unwrap()
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .take(limit.unwrap_or(100))
            .cloned()
            .collect();
        Ok(Json(records))
    }
}
