// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::crypto::ProofSigner;
use crate::error::CoverError;
use crate::eth_client::EthClient;
use crate::interceptor::BroadcastInterceptor;
use crate::ledger::TransactionLedger;
use crate::metrics::CoverMetrics;
use crate::server::rpc::{RpcRequest, RpcResponse};
use crate::types::{
    now_ms, parse_tx_hash, BroadcastRequest, BroadcastResponse, CurrentBlockResponse,
    HealthResponse, LedgerStats, NetworkResponse, TransactionRecord, TransactionStatus,
};
use async_trait::async_trait;
use axum::Json;
use delaycover_policy::DelayAttestation;
use ethers::providers::JsonRpcClient;
use ethers::types::Bytes;
use futures::future::join_all;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_LIST_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 1000;

#[async_trait]
pub trait NodeRequestHandlerTrait {
    async fn health(&self) -> Result<Json<HealthResponse>, CoverError>;
    async fn network(&self) -> Result<Json<NetworkResponse>, CoverError>;
    async fn current_block(&self) -> Result<Json<CurrentBlockResponse>, CoverError>;
    // Build, sign and broadcast a transaction described by the request body
    async fn broadcast(
        &self,
        request: BroadcastRequest,
    ) -> Result<Json<BroadcastResponse>, CoverError>;
    // Look up a tracked transaction, falling back to a direct chain query
    // for hashes the ledger has never seen
    async fn get_transaction(
        &self,
        tx_hash_hex: String,
    ) -> Result<Json<TransactionRecord>, CoverError>;
    // Sign and return the delay attestation for a confirmed transaction
    async fn get_proof(&self, tx_hash_hex: String)
        -> Result<Json<DelayAttestation>, CoverError>;
    // JSON-RPC endpoint: intercepts eth_sendRawTransaction, answers
    // eth_chainId/net_version locally, forwards everything else
    async fn rpc(&self, request: serde_json::Value)
        -> Result<Json<serde_json::Value>, CoverError>;
    async fn stats(&self) -> Result<Json<LedgerStats>, CoverError>;
    async fn list_transactions(
        &self,
        status: Option<String>,
        limit: Option<usize>,
    ) -> Result<Json<Vec<TransactionRecord>>, CoverError>;
}

pub struct NodeRequestHandler<P> {
    eth_client: Arc<EthClient<P>>,
    ledger: Arc<TransactionLedger>,
    interceptor: Arc<BroadcastInterceptor<P>>,
    signer: Arc<ProofSigner>,
    network: String,
    chain_id: u64,
    metrics: Arc<CoverMetrics>,
}

impl<P> NodeRequestHandler<P>
where
    P: JsonRpcClient + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        eth_client: Arc<EthClient<P>>,
        ledger: Arc<TransactionLedger>,
        interceptor: Arc<BroadcastInterceptor<P>>,
        signer: Arc<ProofSigner>,
        network: String,
        chain_id: u64,
        metrics: Arc<CoverMetrics>,
    ) -> Self {
        Self {
            eth_client,
            ledger,
            interceptor,
            signer,
            network,
            chain_id,
            metrics,
        }
    }

    async fn rpc_single(&self, raw: serde_json::Value) -> serde_json::Value {
        let request: RpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => {
                return RpcResponse::error(
                    serde_json::Value::Null,
                    -32600,
                    format!("invalid request: {}", e),
                )
                .into_value()
            }
        };
        self.metrics
            .rpc_passthrough_requests
            .with_label_values(&[&request.method])
            .inc();

        let id = request.id.clone();
        match request.method.as_str() {
            // Answered locally so wallets pointed at the node never round-trip
            // for network identity.
            "eth_chainId" => {
                RpcResponse::result(id, serde_json::json!(format!("0x{:x}", self.chain_id)))
                    .into_value()
            }
            "net_version" => {
                RpcResponse::result(id, serde_json::json!(self.chain_id.to_string()))
                    .into_value()
            }
            "eth_sendRawTransaction" => match self.intercept_send_raw(&request).await {
                Ok(tx_hash) => {
                    RpcResponse::result(id, serde_json::json!(tx_hash)).into_value()
                }
                Err(CoverError::InvalidClientRequest(msg)) => {
                    RpcResponse::error(id, -32602, msg).into_value()
                }
                Err(e) => RpcResponse::error(id, -32603, format!("{:?}", e)).into_value(),
            },
            method => {
                let params = request.params.unwrap_or_else(|| serde_json::json!([]));
                match self.eth_client.raw_request(method, params).await {
                    Ok(result) => RpcResponse::result(id, result).into_value(),
                    Err(e) => RpcResponse::error(id, -32603, format!("{:?}", e)).into_value(),
                }
            }
        }
    }

    async fn intercept_send_raw(
        &self,
        request: &RpcRequest,
    ) -> Result<ethers::types::TxHash, CoverError> {
        let raw_hex = request
            .params
            .as_ref()
            .and_then(|p| p.get(0))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                CoverError::InvalidClientRequest(
                    "eth_sendRawTransaction expects one hex string param".to_string(),
                )
            })?;
        let raw_tx = Bytes::from_str(raw_hex).map_err(|_| {
            CoverError::InvalidClientRequest("raw transaction is not valid hex".to_string())
        })?;
        let (tx_hash, _) = self.interceptor.submit_and_track(raw_tx).await?;
        Ok(tx_hash)
    }
}

#[async_trait]
impl<P> NodeRequestHandlerTrait for NodeRequestHandler<P>
where
    P: JsonRpcClient + Send + Sync + 'static,
{
    async fn health(&self) -> Result<Json<HealthResponse>, CoverError> {
        Ok(Json(HealthResponse {
            status: "ok",
            timestamp_ms: now_ms(),
            network: self.network.clone(),
            ledger: self.ledger.stats().await,
        }))
    }

    async fn network(&self) -> Result<Json<NetworkResponse>, CoverError> {
        Ok(Json(NetworkResponse {
            network: self.network.clone(),
            chain_id: self.chain_id,
            rpc_url: self.eth_client.rpc_url().to_string(),
            signer_address: self.signer.address(),
        }))
    }

    async fn current_block(&self) -> Result<Json<CurrentBlockResponse>, CoverError> {
        let block_number = self.eth_client.get_block_number().await?;
        Ok(Json(CurrentBlockResponse {
            block_number,
            timestamp_ms: now_ms(),
        }))
    }

    async fn broadcast(
        &self,
        request: BroadcastRequest,
    ) -> Result<Json<BroadcastResponse>, CoverError> {
        Ok(Json(self.interceptor.build_and_track(request).await?))
    }

    async fn get_transaction(
        &self,
        tx_hash_hex: String,
    ) -> Result<Json<TransactionRecord>, CoverError> {
        let tx_hash = parse_tx_hash(&tx_hash_hex)?;
        if let Some(record) = self.ledger.get(&tx_hash).await {
            return Ok(Json(record));
        }
        // The ledger never saw this hash; the chain may still know it
        // (broadcast through another node, or evicted here).
        match self.eth_client.get_transaction_receipt(tx_hash).await? {
            Some(receipt) => match receipt.block_number {
                Some(block) => {
                    let confirmation_height = block.as_u64();
                    warn!(
                        "[Server] Resolving unknown tx from chain receipt: tx={:?}, height={}",
                        tx_hash, confirmation_height
                    );
                    self.ledger
                        .store_confirmation(tx_hash, confirmation_height, now_ms())
                        .await;
                    self.ledger
                        .get(&tx_hash)
                        .await
                        .map(Json)
                        .ok_or_else(|| CoverError::InternalError("record vanished".to_string()))
                }
                // The chain knows the hash but it has not mined yet; report
                // it as in flight without committing a confirmation.
                None => Ok(Json(TransactionRecord {
                    tx_hash,
                    status: TransactionStatus::Broadcast,
                    broadcast_height: None,
                    broadcast_at_ms: None,
                    first_seen_ms: now_ms(),
                    confirmation_height: None,
                    confirmation_at_ms: None,
                    delay_blocks: None,
                    last_error: None,
                })),
            },
            None => Err(CoverError::TxNotFound),
        }
    }

    async fn get_proof(
        &self,
        tx_hash_hex: String,
    ) -> Result<Json<DelayAttestation>, CoverError> {
        let tx_hash = parse_tx_hash(&tx_hash_hex)?;
        let record = self
            .ledger
            .get(&tx_hash)
            .await
            .ok_or(CoverError::TxNotFound)?;
        if record.status != TransactionStatus::Confirmed {
            return Err(CoverError::TxNotYetConfirmed);
        }
        let broadcast_height = record
            .broadcast_height
            .ok_or(CoverError::MissingBroadcastHeight)?;
        let confirmation_height = record
            .confirmation_height
            .ok_or(CoverError::InternalError(
                "confirmed record without confirmation height".to_string(),
            ))?;

        let attestation =
            self.signer
                .sign_delay_proof(tx_hash, broadcast_height, confirmation_height)?;
        info!(
            "[Server] Signed delay proof: tx={:?}, broadcast={}, confirmation={}",
            tx_hash, broadcast_height, confirmation_height
        );
        Ok(Json(attestation))
    }

    async fn rpc(
        &self,
        request: serde_json::Value,
    ) -> Result<Json<serde_json::Value>, CoverError> {
        let response = match request {
            serde_json::Value::Array(batch) => {
                let futures = batch.into_iter().map(|entry| self.rpc_single(entry));
                serde_json::Value::Array(join_all(futures).await)
            }
            single => self.rpc_single(single).await,
        };
        Ok(Json(response))
    }

    async fn stats(&self) -> Result<Json<LedgerStats>, CoverError> {
        Ok(Json(self.ledger.stats().await))
    }

    async fn list_transactions(
        &self,
        status: Option<String>,
        limit: Option<usize>,
    ) -> Result<Json<Vec<TransactionRecord>>, CoverError> {
        let status = status
            .as_deref()
            .map(TransactionStatus::from_str)
            .transpose()?;
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        Ok(Json(self.ledger.list(status, limit).await))
    }
}
