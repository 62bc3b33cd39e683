// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::config::NodeConfig;
use crate::crypto::ProofSigner;
use crate::interceptor::BroadcastInterceptor;
use crate::ledger::TransactionLedger;
use crate::metrics::CoverMetrics;
use crate::server::{run_server, NodeRequestHandler};
use prometheus::Registry;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::info;

/// Wire up the ledger, eviction task, interceptor, signer, and HTTP server.
/// Returns the server join handle; everything else is owned by the spawned
/// tasks.
pub async fn run_node(
    config: NodeConfig,
    registry: Registry,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let metrics = Arc::new(CoverMetrics::new(&registry));
    let runtime = config.validate(metrics.clone()).await?;

    let ledger = Arc::new(TransactionLedger::new(metrics.clone()));
    ledger
        .clone()
        .spawn_eviction_task(runtime.eviction_interval, runtime.ledger_max_age);

    let signer = Arc::new(ProofSigner::new(runtime.wallet.clone(), metrics.clone()));
    let interceptor = Arc::new(BroadcastInterceptor::new(
        runtime.eth_client.clone(),
        ledger.clone(),
        runtime.wallet.clone(),
        runtime.chain_id,
        runtime.network_name.clone(),
        runtime.poll_interval,
        runtime.max_poll_attempts,
        metrics.clone(),
    ));
    let handler = NodeRequestHandler::new(
        runtime.eth_client.clone(),
        ledger,
        interceptor,
        signer,
        runtime.network_name.clone(),
        runtime.chain_id,
        metrics.clone(),
    );

    let socket_address = SocketAddr::new(
        IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
        runtime.server_listen_port,
    );
    info!(
        "Starting delaycover node on {} (network {}, chain id {})",
        socket_address, runtime.network_name, runtime.chain_id
    );
    Ok(run_server(&socket_address, handler, metrics, registry))
}
