// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{CoverError, CoverResult};
use crate::metrics::CoverMetrics;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TxHash, U256};
use std::sync::Arc;
use tap::TapFallible;
use tracing::{error, info};

#[cfg(test)]
use ethers::providers::MockProvider;

/// Thin Ethereum JSON-RPC client, generic over the transport so tests run
/// against a mock provider.
pub struct EthClient<P> {
    provider: Provider<P>,
    rpc_url: String,
    expected_chain_id: Option<u64>,
    metrics: Arc<CoverMetrics>,
}

impl EthClient<Http> {
    pub async fn new(
        rpc_url: &str,
        expected_chain_id: Option<u64>,
        metrics: Arc<CoverMetrics>,
    ) -> anyhow::Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)?;
        let self_ = Self {
            provider,
            rpc_url: rpc_url.to_string(),
            expected_chain_id,
            metrics,
        };
        self_.describe().await?;
        Ok(self_)
    }
}

#[cfg(test)]
impl EthClient<MockProvider> {
    pub fn new_mocked(metrics: Arc<CoverMetrics>) -> (Self, MockProvider) {
        let (provider, mock) = Provider::mocked();
        (
            Self {
                provider,
                rpc_url: "mock://localhost".to_string(),
                expected_chain_id: None,
                metrics,
            },
            mock,
        )
    }
}

impl<P> EthClient<P>
where
    P: JsonRpcClient + 'static,
{
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    // Validate chain identifier and log connection info
    pub async fn describe(&self) -> anyhow::Result<()> {
        let chain_id = self
            .get_chain_id()
            .await
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let block_number = self
            .get_block_number()
            .await
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        if let Some(expected) = self.expected_chain_id {
            if chain_id != expected {
                return Err(anyhow::anyhow!(
                    "Chain ID mismatch: expected {}, got {}. Refusing to serve against the wrong network",
                    expected,
                    chain_id
                ));
            }
        }
        info!(
            "EthClient connected to chain {}, current block: {}",
            chain_id, block_number
        );
        Ok(())
    }

    pub async fn get_chain_id(&self) -> CoverResult<u64> {
        let _timer = self.query_timer("get_chain_id");
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| CoverError::ProviderError(e.to_string()))?;
        Ok(chain_id.as_u64())
    }

    pub async fn get_block_number(&self) -> CoverResult<u64> {
        let _timer = self.query_timer("get_block_number");
        let block_number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| CoverError::TransientProviderError(e.to_string()))?
            .as_u64();
        self.metrics.current_block.set(block_number as i64);
        Ok(block_number)
    }

    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> CoverResult<Option<TransactionReceipt>> {
        let _timer = self.query_timer("get_transaction_receipt");
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| CoverError::TransientProviderError(e.to_string()))
    }

    pub async fn send_raw_transaction(&self, raw_tx: Bytes) -> CoverResult<TxHash> {
        let _timer = self.query_timer("send_raw_transaction");
        let pending = self
            .provider
            .send_raw_transaction(raw_tx)
            .await
            .tap_err(|e| error!("[EthClient] send_raw_transaction failed: {:?}", e))
            .map_err(|e| CoverError::ProviderError(e.to_string()))?;
        Ok(pending.tx_hash())
    }

    pub async fn get_transaction_count(&self, address: Address) -> CoverResult<U256> {
        let _timer = self.query_timer("get_transaction_count");
        self.provider
            .get_transaction_count(address, None)
            .await
            .map_err(|e| CoverError::ProviderError(e.to_string()))
    }

    pub async fn estimate_gas(&self, tx: &TypedTransaction) -> CoverResult<U256> {
        let _timer = self.query_timer("estimate_gas");
        self.provider
            .estimate_gas(tx, None)
            .await
            .map_err(|e| CoverError::ProviderError(e.to_string()))
    }

    pub async fn get_gas_price(&self) -> CoverResult<U256> {
        let _timer = self.query_timer("get_gas_price");
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| CoverError::ProviderError(e.to_string()))
    }

    /// Forward an arbitrary JSON-RPC call verbatim. Used by the passthrough
    /// endpoint for every method the node does not intercept.
    pub async fn raw_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> CoverResult<serde_json::Value> {
        let _timer = self.query_timer("raw_request");
        self.provider
            .request(method, params)
            .await
            .map_err(|e| CoverError::ProviderError(e.to_string()))
    }

    fn query_timer(&self, query_type: &str) -> prometheus::HistogramTimer {
        self.metrics
            .eth_rpc_queries
            .with_label_values(&[query_type])
            .inc();
        self.metrics
            .eth_rpc_queries_latency
            .with_label_values(&[query_type])
            .start_timer()
    }
}
