// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_vec_with_registry,
    register_int_gauge_with_registry, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Registry,
};

const FINE_GRAINED_LATENCY_SEC_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.05, 0.1, 0.15, 0.2, 0.25, 0.3, 0.4, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 5.0,
    7.5, 10., 15., 20., 30., 60., 120., 300.,
];

#[derive(Clone, Debug)]
pub struct CoverMetrics {
    pub(crate) requests_received: IntCounterVec,
    pub(crate) requests_ok: IntCounterVec,
    pub(crate) err_requests: IntCounterVec,
    pub(crate) requests_inflight: IntGaugeVec,

    pub(crate) txs_broadcast: IntCounter,
    pub(crate) txs_confirmed: IntCounter,
    pub(crate) txs_failed: IntCounter,
    pub(crate) monitor_polls: IntCounter,
    pub(crate) confirmation_delay_blocks: HistogramVec,

    pub(crate) proofs_signed: IntCounter,
    pub(crate) signer_cache_hit: IntCounter,
    pub(crate) signer_cache_miss: IntCounter,

    pub(crate) ledger_size: IntGauge,
    pub(crate) ledger_evicted_records: IntCounter,

    pub(crate) rpc_passthrough_requests: IntCounterVec,
    pub(crate) eth_rpc_queries: IntCounterVec,
    pub(crate) eth_rpc_queries_latency: HistogramVec,
    pub(crate) current_block: IntGauge,
}

impl CoverMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            requests_received: register_int_counter_vec_with_registry!(
                "cover_requests_received",
                "Total number of requests received in Server, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            requests_ok: register_int_counter_vec_with_registry!(
                "cover_requests_ok",
                "Total number of ok requests, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            err_requests: register_int_counter_vec_with_registry!(
                "cover_err_requests",
                "Total number of erred requests, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            requests_inflight: register_int_gauge_vec_with_registry!(
                "cover_requests_inflight",
                "Total number of inflight requests, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            txs_broadcast: register_int_counter_with_registry!(
                "cover_txs_broadcast",
                "Total number of transactions intercepted and broadcast",
                registry,
            )
            .unwrap(),
            txs_confirmed: register_int_counter_with_registry!(
                "cover_txs_confirmed",
                "Total number of tracked transactions observed confirmed",
                registry,
            )
            .unwrap(),
            txs_failed: register_int_counter_with_registry!(
                "cover_txs_failed",
                "Total number of tracked transactions marked failed",
                registry,
            )
            .unwrap(),
            monitor_polls: register_int_counter_with_registry!(
                "cover_monitor_polls",
                "Total number of receipt polls issued by confirmation monitors",
                registry,
            )
            .unwrap(),
            confirmation_delay_blocks: register_histogram_vec_with_registry!(
                "cover_confirmation_delay_blocks",
                "Observed confirmation delay in blocks, by network",
                &["network"],
                vec![0., 1., 2., 3., 5., 8., 10., 12., 16., 20., 32., 64., 128.],
                registry,
            )
            .unwrap(),
            proofs_signed: register_int_counter_with_registry!(
                "cover_proofs_signed",
                "Total number of delay attestations signed",
                registry,
            )
            .unwrap(),
            signer_cache_hit: register_int_counter_with_registry!(
                "cover_signer_cache_hit",
                "Total number of hits in the attestation signer cache",
                registry,
            )
            .unwrap(),
            signer_cache_miss: register_int_counter_with_registry!(
                "cover_signer_cache_miss",
                "Total number of misses in the attestation signer cache",
                registry,
            )
            .unwrap(),
            ledger_size: register_int_gauge_with_registry!(
                "cover_ledger_size",
                "Current number of records in the transaction ledger",
                registry,
            )
            .unwrap(),
            ledger_evicted_records: register_int_counter_with_registry!(
                "cover_ledger_evicted_records",
                "Total number of ledger records evicted for age",
                registry,
            )
            .unwrap(),
            rpc_passthrough_requests: register_int_counter_vec_with_registry!(
                "cover_rpc_passthrough_requests",
                "Total number of JSON-RPC requests handled, by method",
                &["method"],
                registry,
            )
            .unwrap(),
            eth_rpc_queries: register_int_counter_vec_with_registry!(
                "cover_eth_rpc_queries",
                "Total number of queries issued to the eth provider, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            eth_rpc_queries_latency: register_histogram_vec_with_registry!(
                "cover_eth_rpc_queries_latency",
                "Latency of queries issued to the eth provider, by request type",
                &["type"],
                FINE_GRAINED_LATENCY_SEC_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
            current_block: register_int_gauge_with_registry!(
                "cover_current_block",
                "Latest block number observed on the upstream chain",
                registry,
            )
            .unwrap(),
        }
    }

    pub fn new_for_testing() -> Self {
        let registry = Registry::new();
        Self::new(&registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_construction() {
        let registry = Registry::new();
        let metrics = CoverMetrics::new(&registry);

        metrics.txs_broadcast.inc();
        metrics.txs_confirmed.inc();
        metrics
            .rpc_passthrough_requests
            .with_label_values(&["eth_getBalance"])
            .inc();
        assert_eq!(metrics.txs_broadcast.get(), 1);
    }

    #[test]
    fn test_metrics_are_registered() {
        let registry = Registry::new();
        let metrics = CoverMetrics::new(&registry);
        metrics.txs_broadcast.inc();

        let families = registry.gather();
        assert!(families
            .iter()
            .any(|mf| mf.get_name() == "cover_txs_broadcast"));
    }

    #[test]
    fn test_new_for_testing_registries_are_independent() {
        let a = CoverMetrics::new_for_testing();
        let b = CoverMetrics::new_for_testing();
        a.txs_broadcast.inc();
        assert_eq!(a.txs_broadcast.get(), 1);
        assert_eq!(b.txs_broadcast.get(), 0);
    }
}
