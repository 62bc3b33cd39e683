// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory transaction ledger.
//!
//! One `TransactionLedger` instance is owned per node and shared by `Arc`
//! between the interceptor, the confirmation monitors, and the HTTP server.
//! Records are keyed by transaction hash. `Confirmed` and `Failed` are
//! terminal; writes against a terminal record are logged and dropped.

use crate::metrics::CoverMetrics;
use crate::types::{now_ms, LedgerStats, TransactionRecord, TransactionStatus};
use ethers::types::TxHash;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct TransactionLedger {
    records: RwLock<HashMap<TxHash, TransactionRecord>>,
    metrics: Arc<CoverMetrics>,
}

impl TransactionLedger {
    pub fn new(metrics: Arc<CoverMetrics>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            metrics,
        }
    }

    /// Record a broadcast observation. Re-broadcasts of the same hash
    /// overwrite the broadcast fields (last write wins) but keep the original
    /// `first_seen_ms`, so eviction age is measured from the first sighting.
    pub async fn store_broadcast(&self, tx_hash: TxHash, broadcast_height: u64, at_ms: u64) {
        let mut records = self.records.write().await;
        match records.get_mut(&tx_hash) {
            Some(existing) if existing.status.is_terminal() => {
                warn!(
                    "[Ledger] Ignoring broadcast for terminal record: tx={:?}, status={:?}",
                    tx_hash, existing.status
                );
                return;
            }
            Some(existing) => {
                existing.broadcast_height = Some(broadcast_height);
                existing.broadcast_at_ms = Some(at_ms);
            }
            None => {
                records.insert(
                    tx_hash,
                    TransactionRecord {
                        tx_hash,
                        status: TransactionStatus::Broadcast,
                        broadcast_height: Some(broadcast_height),
                        broadcast_at_ms: Some(at_ms),
                        first_seen_ms: at_ms,
                        confirmation_height: None,
                        confirmation_at_ms: None,
                        delay_blocks: None,
                        last_error: None,
                    },
                );
            }
        }
        self.metrics.ledger_size.set(records.len() as i64);
        info!(
            "[Ledger] Stored broadcast: tx={:?}, height={}",
            tx_hash, broadcast_height
        );
    }

    /// Record a confirmation. The delay is computed here, exactly once; it is
    /// `None` when the broadcast height was never observed (the record is
    /// still created so the confirmation itself is not lost).
    pub async fn store_confirmation(&self, tx_hash: TxHash, confirmation_height: u64, at_ms: u64) {
        let mut records = self.records.write().await;
        match records.get_mut(&tx_hash) {
            Some(existing) if existing.status.is_terminal() => {
                warn!(
                    "[Ledger] Ignoring confirmation for terminal record: tx={:?}, status={:?}",
                    tx_hash, existing.status
                );
                return;
            }
            Some(existing) => {
                let delay = existing
                    .broadcast_height
                    .and_then(|b| confirmation_height.checked_sub(b));
                existing.status = TransactionStatus::Confirmed;
                existing.confirmation_height = Some(confirmation_height);
                existing.confirmation_at_ms = Some(at_ms);
                existing.delay_blocks = delay;
                info!(
                    "[Ledger] Stored confirmation: tx={:?}, height={}, delay={:?}",
                    tx_hash, confirmation_height, delay
                );
            }
            None => {
                warn!(
                    "[Ledger] Confirmation for unknown broadcast: tx={:?}, height={}",
                    tx_hash, confirmation_height
                );
                records.insert(
                    tx_hash,
                    TransactionRecord {
                        tx_hash,
                        status: TransactionStatus::Confirmed,
                        broadcast_height: None,
                        broadcast_at_ms: None,
                        first_seen_ms: at_ms,
                        confirmation_height: Some(confirmation_height),
                        confirmation_at_ms: Some(at_ms),
                        delay_blocks: None,
                        last_error: None,
                    },
                );
            }
        }
        self.metrics.ledger_size.set(records.len() as i64);
    }

    pub async fn store_failure(&self, tx_hash: TxHash, error: String) {
        let mut records = self.records.write().await;
        match records.get_mut(&tx_hash) {
            Some(existing) if existing.status.is_terminal() => {
                warn!(
                    "[Ledger] Ignoring failure for terminal record: tx={:?}, status={:?}",
                    tx_hash, existing.status
                );
            }
            Some(existing) => {
                existing.status = TransactionStatus::Failed;
                existing.last_error = Some(error);
                warn!("[Ledger] Stored failure: tx={:?}", tx_hash);
            }
            None => {
                warn!(
                    "[Ledger] Failure for unknown broadcast: tx={:?}, error={}",
                    tx_hash, error
                );
            }
        }
    }

    pub async fn get(&self, tx_hash: &TxHash) -> Option<TransactionRecord> {
        self.records.read().await.get(tx_hash).cloned()
    }

    /// Records filtered by status, newest first, capped at `limit`.
    pub async fn list(
        &self,
        status: Option<TransactionStatus>,
        limit: usize,
    ) -> Vec<TransactionRecord> {
        let records = self.records.read().await;
        let mut matching: Vec<TransactionRecord> = records
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.first_seen_ms.cmp(&a.first_seen_ms));
        matching.truncate(limit);
        matching
    }

    pub async fn stats(&self) -> LedgerStats {
        let records = self.records.read().await;
        let mut stats = LedgerStats {
            total: records.len() as u64,
            ..Default::default()
        };
        for record in records.values() {
            match record.status {
                TransactionStatus::Broadcast => stats.broadcast += 1,
                TransactionStatus::Confirmed => stats.confirmed += 1,
                TransactionStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Drop records whose first sighting is older than `max_age`, regardless
    /// of status. Returns the number evicted.
    pub async fn evict_stale(&self, max_age: Duration) -> usize {
        let cutoff = now_ms().saturating_sub(max_age.as_millis() as u64);
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.first_seen_ms >= cutoff);
        let evicted = before - records.len();
        if evicted > 0 {
            info!("[Ledger] Evicted {} stale records", evicted);
            self.metrics.ledger_evicted_records.inc_by(evicted as u64);
        }
        self.metrics.ledger_size.set(records.len() as i64);
        evicted
    }

    /// Background eviction loop. Spawned once per ledger at node startup.
    pub fn spawn_eviction_task(
        self: Arc<Self>,
        interval: Duration,
        max_age: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a fresh ledger is
            // not scanned at startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.evict_stale(max_age).await;
            }
        })
    }
}
