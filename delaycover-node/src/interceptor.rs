// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Broadcast interception and confirmation monitoring.
//!
//! The interceptor records the chain height BEFORE forwarding a transaction,
//! so the attested broadcast height can never be later than the block the
//! transaction lands in. Each successful broadcast spawns a fire-and-forget
//! monitor task that polls for the receipt and writes the confirmation (or a
//! failure) back to the ledger, then terminates on its own.

use crate::error::{CoverError, CoverResult};
use crate::eth_client::EthClient;
use crate::ledger::TransactionLedger;
use crate::metrics::CoverMetrics;
use crate::types::{now_ms, parse_address, parse_u256, BroadcastRequest, BroadcastResponse, TransactionStatus};
use ethers::providers::JsonRpcClient;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Bytes, Eip1559TransactionRequest, TransactionRequest, TxHash, U256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct BroadcastInterceptor<P> {
    eth_client: Arc<EthClient<P>>,
    ledger: Arc<TransactionLedger>,
    wallet: LocalWallet,
    chain_id: u64,
    network: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
    metrics: Arc<CoverMetrics>,
}

impl<P> BroadcastInterceptor<P>
where
    P: JsonRpcClient + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        eth_client: Arc<EthClient<P>>,
        ledger: Arc<TransactionLedger>,
        wallet: LocalWallet,
        chain_id: u64,
        network: String,
        poll_interval: Duration,
        max_poll_attempts: u32,
        metrics: Arc<CoverMetrics>,
    ) -> Self {
        Self {
            eth_client,
            ledger,
            wallet,
            chain_id,
            network,
            poll_interval,
            max_poll_attempts,
            metrics,
        }
    }

    pub fn signer_address(&self) -> ethers::types::Address {
        self.wallet.address()
    }

    /// Forward a raw signed transaction, tracking it in the ledger.
    ///
    /// The current height is captured before the forward so a transaction
    /// included in the very next block still shows a non-negative delay. The
    /// ledger is only written when the forward succeeded; a rejected
    /// transaction leaves no record.
    pub async fn submit_and_track(&self, raw_tx: Bytes) -> CoverResult<(TxHash, u64)> {
        let broadcast_height = self.eth_client.get_block_number().await?;
        let tx_hash = self.eth_client.send_raw_transaction(raw_tx).await?;

        self.ledger
            .store_broadcast(tx_hash, broadcast_height, now_ms())
            .await;
        self.metrics.txs_broadcast.inc();
        info!(
            "[Interceptor] Broadcast tx={:?} at height {}",
            tx_hash, broadcast_height
        );

        self.spawn_confirmation_monitor(tx_hash);
        Ok((tx_hash, broadcast_height))
    }

    /// Build, sign, and broadcast a transaction described by the REST
    /// broadcast request, then track it like any intercepted transaction.
    pub async fn build_and_track(&self, request: BroadcastRequest) -> CoverResult<BroadcastResponse> {
        let to = match request.to.as_deref() {
            Some(raw) => parse_address("to", raw)?,
            None => {
                return Err(CoverError::InvalidClientRequest(
                    "field 'to' is required".to_string(),
                ))
            }
        };
        let value = match request.value.as_deref() {
            Some(raw) => parse_u256("value", raw)?,
            None => U256::zero(),
        };
        let data = match request.data.as_deref() {
            Some(raw) => {
                let bytes = hex::decode(raw.trim_start_matches("0x")).map_err(|_| {
                    CoverError::InvalidClientRequest("field 'data' is not valid hex".to_string())
                })?;
                Bytes::from(bytes)
            }
            None => Bytes::default(),
        };
        let nonce = match request.nonce.as_deref() {
            Some(raw) => parse_u256("nonce", raw)?,
            None => {
                self.eth_client
                    .get_transaction_count(self.wallet.address())
                    .await?
            }
        };

        // EIP-1559 when the caller supplies either fee-market field,
        // otherwise legacy with an explicit or fetched gas price.
        let mut tx: TypedTransaction = if request.max_fee_per_gas.is_some()
            || request.max_priority_fee_per_gas.is_some()
        {
            let mut eip1559 = Eip1559TransactionRequest::new()
                .to(to)
                .value(value)
                .data(data)
                .nonce(nonce)
                .chain_id(self.chain_id);
            if let Some(raw) = request.max_fee_per_gas.as_deref() {
                eip1559 = eip1559.max_fee_per_gas(parse_u256("maxFeePerGas", raw)?);
            }
            if let Some(raw) = request.max_priority_fee_per_gas.as_deref() {
                eip1559 =
                    eip1559.max_priority_fee_per_gas(parse_u256("maxPriorityFeePerGas", raw)?);
            }
            eip1559.into()
        } else {
            let gas_price = match request.gas_price.as_deref() {
                Some(raw) => parse_u256("gasPrice", raw)?,
                None => self.eth_client.get_gas_price().await?,
            };
            TransactionRequest::new()
                .to(to)
                .value(value)
                .data(data)
                .nonce(nonce)
                .gas_price(gas_price)
                .chain_id(self.chain_id)
                .into()
        };

        let gas = match request.gas_limit.as_deref() {
            Some(raw) => parse_u256("gasLimit", raw)?,
            None => self.eth_client.estimate_gas(&tx).await?,
        };
        tx.set_gas(gas);

        let signature = self
            .wallet
            .sign_transaction(&tx)
            .await
            .map_err(|e| CoverError::SigningError(e.to_string()))?;
        let raw_tx = tx.rlp_signed(&signature);

        let (tx_hash, broadcast_height) = self.submit_and_track(raw_tx).await?;
        Ok(BroadcastResponse {
            tx_hash,
            broadcast_height,
            timestamp_ms: now_ms(),
            status: TransactionStatus::Broadcast,
        })
    }

    /// Poll for the receipt until it appears or the attempt budget runs out.
    ///
    /// An exhausted budget without a receipt leaves the record in Broadcast,
    /// the transaction may still confirm later. The record is only marked
    /// failed when every poll in the budget errored.
    fn spawn_confirmation_monitor(&self, tx_hash: TxHash) {
        let eth_client = self.eth_client.clone();
        let ledger = self.ledger.clone();
        let metrics = self.metrics.clone();
        let network = self.network.clone();
        let poll_interval = self.poll_interval;
        let max_poll_attempts = self.max_poll_attempts;

        tokio::spawn(async move {
            let mut consecutive_errors = 0u32;
            for attempt in 1..=max_poll_attempts {
                tokio::time::sleep(poll_interval).await;
                metrics.monitor_polls.inc();
                match eth_client.get_transaction_receipt(tx_hash).await {
                    // A receipt without a block number is still pending;
                    // treat it like no receipt at all and keep polling.
                    Ok(Some(receipt)) if receipt.block_number.is_some() => {
                        let confirmation_height =
                            receipt.block_number.map(|b| b.as_u64()).unwrap_or_default();
                        ledger
                            .store_confirmation(tx_hash, confirmation_height, now_ms())
                            .await;
                        metrics.txs_confirmed.inc();
                        if let Some(delay) = ledger
                            .get(&tx_hash)
                            .await
                            .and_then(|r| r.delay_blocks)
                        {
                            metrics
                                .confirmation_delay_blocks
                                .with_label_values(&[&network])
                                .observe(delay as f64);
                        }
                        info!(
                            "[Monitor] Confirmed tx={:?} at height {} (attempt {})",
                            tx_hash, confirmation_height, attempt
                        );
                        return;
                    }
                    Ok(_) => {
                        consecutive_errors = 0;
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        warn!(
                            "[Monitor] Receipt poll error for tx={:?} (attempt {}): {:?}",
                            tx_hash, attempt, e
                        );
                    }
                }
            }
            if consecutive_errors >= max_poll_attempts {
                ledger
                    .store_failure(
                        tx_hash,
                        format!(
                            "receipt polling errored {} consecutive times",
                            consecutive_errors
                        ),
                    )
                    .await;
                metrics.txs_failed.inc();
            } else {
                info!(
                    "[Monitor] No receipt for tx={:?} after {} attempts, leaving as broadcast",
                    tx_hash, max_poll_attempts
                );
            }
        });
    }
}
