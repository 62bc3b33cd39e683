// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::with_metrics;
use crate::{
    error::CoverError,
    metrics::CoverMetrics,
    types::{
        BroadcastRequest, BroadcastResponse, CurrentBlockResponse, HealthResponse, LedgerStats,
        NetworkResponse, TransactionRecord,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use delaycover_policy::DelayAttestation;
use ethers::providers::JsonRpcClient;
use prometheus::{Encoder, Registry, TextEncoder};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, instrument};

pub mod handler;
pub mod rpc;

#[cfg(test)]
pub(crate) mod mock_handler;

pub use handler::{NodeRequestHandler, NodeRequestHandlerTrait};

pub const HEALTH_PATH: &str = "/health";
pub const NETWORK_PATH: &str = "/network";
pub const CURRENT_BLOCK_PATH: &str = "/block/current";
pub const BROADCAST_PATH: &str = "/tx/broadcast";
// Note: using :param syntax for axum 0.7.x
pub const TRANSACTION_PATH: &str = "/tx/:tx_hash";
pub const PROOF_PATH: &str = "/tx/:tx_hash/proof";
pub const STATS_PATH: &str = "/stats";
pub const TRANSACTIONS_PATH: &str = "/transactions";
pub const METRICS_PATH: &str = "/metrics";

pub fn run_server<P: JsonRpcClient + 'static>(
    socket_address: &SocketAddr,
    handler: NodeRequestHandler<P>,
    metrics: Arc<CoverMetrics>,
    registry: Registry,
) -> tokio::task::JoinHandle<()> {
    let socket_address = *socket_address;
    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(socket_address).await.unwrap();
        axum::serve(
            listener,
            make_router(Arc::new(handler), metrics, registry).into_make_service(),
        )
        .await
        .unwrap();
    })
}

pub(crate) fn make_router(
    handler: Arc<impl NodeRequestHandlerTrait + Sync + Send + 'static>,
    metrics: Arc<CoverMetrics>,
    registry: Registry,
) -> Router {
    Router::new()
        .route("/", post(handle_rpc))
        .route(HEALTH_PATH, get(handle_health))
        .route(NETWORK_PATH, get(handle_network))
        .route(CURRENT_BLOCK_PATH, get(handle_current_block))
        .route(BROADCAST_PATH, post(handle_broadcast))
        .route(TRANSACTION_PATH, get(handle_get_transaction))
        .route(PROOF_PATH, get(handle_get_proof))
        .route(STATS_PATH, get(handle_stats))
        .route(TRANSACTIONS_PATH, get(handle_list_transactions))
        .route(METRICS_PATH, get(handle_metrics))
        .with_state((handler, metrics, Arc::new(registry)))
}

impl axum::response::IntoResponse for CoverError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            CoverError::InvalidTxHash
            | CoverError::InvalidClientRequest(_)
            | CoverError::TxNotYetConfirmed
            | CoverError::MissingBroadcastHeight => StatusCode::BAD_REQUEST,
            CoverError::TxNotFound => StatusCode::NOT_FOUND,
            CoverError::TransientProviderError(_) | CoverError::ProviderError(_) => {
                StatusCode::BAD_GATEWAY
            }
            CoverError::SigningError(_)
            | CoverError::InternalError(_)
            | CoverError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(serde_json::json!({
                "error": self.error_type(),
                "message": format!("{:?}", self),
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for CoverError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Generic(err.into().to_string())
    }
}

type ServerState<H> = (Arc<H>, Arc<CoverMetrics>, Arc<Registry>);

async fn handle_health(
    State((handler, metrics, _)): State<ServerState<impl NodeRequestHandlerTrait + Sync + Send>>,
) -> Result<Json<HealthResponse>, CoverError> {
    let future = async { handler.health().await };
    with_metrics!(metrics.clone(), "health", future).await
}

async fn handle_network(
    State((handler, metrics, _)): State<ServerState<impl NodeRequestHandlerTrait + Sync + Send>>,
) -> Result<Json<NetworkResponse>, CoverError> {
    let future = async { handler.network().await };
    with_metrics!(metrics.clone(), "network", future).await
}

async fn handle_current_block(
    State((handler, metrics, _)): State<ServerState<impl NodeRequestHandlerTrait + Sync + Send>>,
) -> Result<Json<CurrentBlockResponse>, CoverError> {
    let future = async { handler.current_block().await };
    with_metrics!(metrics.clone(), "current_block", future).await
}

async fn handle_broadcast(
    State((handler, metrics, _)): State<ServerState<impl NodeRequestHandlerTrait + Sync + Send>>,
    Json(request): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, CoverError> {
    let future = async { handler.broadcast(request).await };
    with_metrics!(metrics.clone(), "broadcast", future).await
}

#[instrument(level = "error", skip_all, fields(tx_hash_hex = tx_hash_hex))]
async fn handle_get_transaction(
    Path(tx_hash_hex): Path<String>,
    State((handler, metrics, _)): State<ServerState<impl NodeRequestHandlerTrait + Sync + Send>>,
) -> Result<Json<TransactionRecord>, CoverError> {
    let future = async { handler.get_transaction(tx_hash_hex).await };
    with_metrics!(metrics.clone(), "get_transaction", future).await
}

#[instrument(level = "error", skip_all, fields(tx_hash_hex = tx_hash_hex))]
async fn handle_get_proof(
    Path(tx_hash_hex): Path<String>,
    State((handler, metrics, _)): State<ServerState<impl NodeRequestHandlerTrait + Sync + Send>>,
) -> Result<Json<DelayAttestation>, CoverError> {
    let future = async { handler.get_proof(tx_hash_hex).await };
    with_metrics!(metrics.clone(), "get_proof", future).await
}

async fn handle_rpc(
    State((handler, metrics, _)): State<ServerState<impl NodeRequestHandlerTrait + Sync + Send>>,
    Json(request): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, CoverError> {
    let future = async { handler.rpc(request).await };
    with_metrics!(metrics.clone(), "rpc", future).await
}

async fn handle_stats(
    State((handler, metrics, _)): State<ServerState<impl NodeRequestHandlerTrait + Sync + Send>>,
) -> Result<Json<LedgerStats>, CoverError> {
    let future = async { handler.stats().await };
    with_metrics!(metrics.clone(), "stats", future).await
}

async fn handle_list_transactions(
    Query(params): Query<HashMap<String, String>>,
    State((handler, metrics, _)): State<ServerState<impl NodeRequestHandlerTrait + Sync + Send>>,
) -> Result<Json<Vec<TransactionRecord>>, CoverError> {
    let status = params.get("status").cloned();
    let limit = match params.get("limit") {
        Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
            CoverError::InvalidClientRequest(format!("invalid limit: {}", raw))
        })?),
        None => None,
    };
    let future = async { handler.list_transactions(status, limit).await };
    with_metrics!(metrics.clone(), "list_transactions", future).await
}

async fn handle_metrics(
    State((_, _, registry)): State<ServerState<impl NodeRequestHandlerTrait + Sync + Send>>,
) -> Result<String, CoverError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| CoverError::InternalError(e.to_string()))?;
    Ok(String::from_utf8(buffer).map_err(|e| CoverError::InternalError(e.to_string()))?)
}

#[macro_export]
macro_rules! with_metrics {
    ($metrics:expr, $type_:expr, $func:expr) => {
        async move {
            info!("Received {} request", $type_);
            $metrics
                .requests_received
                .with_label_values(&[$type_])
                .inc();
            $metrics
                .requests_inflight
                .with_label_values(&[$type_])
                .inc();

            let result = $func.await;

            match &result {
                Ok(_) => {
                    info!("{} request succeeded", $type_);
                    $metrics.requests_ok.with_label_values(&[$type_]).inc();
                }
                Err(e) => {
                    info!("{} request failed: {:?}", $type_, e);
                    $metrics.err_requests.with_label_values(&[$type_]).inc();
                }
            }

            $metrics
                .requests_inflight
                .with_label_values(&[$type_])
                .dec();
            result
        }
    };
}
