// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::crypto::read_attester_key;
use crate::eth_client::EthClient;
use crate::metrics::CoverMetrics;
use ethers::providers::Http;
use ethers::signers::{LocalWallet, Signer};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Load/save support for on-disk config files. YAML is the canonical format;
/// JSON parses through the same path since YAML is a superset.
pub trait Config
where
    Self: DeserializeOwned + Serialize,
{
    fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let reader = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("unable to load config from {:?}: {}", path, e))?;
        Ok(serde_yaml::from_reader(reader)?)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let config = serde_yaml::to_string(&self)?;
        std::fs::write(path, config)
            .map_err(|e| anyhow::anyhow!("unable to save config to {:?}: {}", path, e))
    }
}

fn default_poll_interval_ms() -> u64 {
    4_000
}

fn default_max_poll_attempts() -> u32 {
    30
}

fn default_ledger_max_age_secs() -> u64 {
    86_400
}

fn default_eviction_interval_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeConfig {
    // The port that the server listens on.
    pub server_listen_port: u16,
    // Rpc url for the Eth fullnode, used for queries and broadcasts.
    pub eth_rpc_url: String,
    // Human-readable network name reported by /network and /health.
    pub network_name: String,
    // If set, startup fails unless the upstream chain reports this id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_chain_id: Option<u64>,
    // Path of the file where the attester key (Secp256k1, hex) is stored.
    pub attester_key_path: PathBuf,
    // Confirmation monitor poll interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    // Receipt polls per tracked transaction before the monitor gives up.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    // Ledger records older than this are evicted regardless of status.
    #[serde(default = "default_ledger_max_age_secs")]
    pub ledger_max_age_secs: u64,
    #[serde(default = "default_eviction_interval_secs")]
    pub eviction_interval_secs: u64,
}

impl Config for NodeConfig {}

/// Validated, live runtime configuration. Construction proves the key loads
/// and the upstream chain is reachable with the expected identity.
pub struct RuntimeConfig {
    pub server_listen_port: u16,
    pub eth_client: Arc<EthClient<Http>>,
    pub wallet: LocalWallet,
    pub chain_id: u64,
    pub network_name: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub ledger_max_age: Duration,
    pub eviction_interval: Duration,
}

impl NodeConfig {
    pub async fn validate(&self, metrics: Arc<CoverMetrics>) -> anyhow::Result<RuntimeConfig> {
        info!("Starting config validation");
        if self.max_poll_attempts == 0 {
            return Err(anyhow::anyhow!("max-poll-attempts must be > 0"));
        }

        // A node that cannot sign must not serve.
        let wallet = read_attester_key(&self.attester_key_path)?;

        // Connects and validates the expected chain id.
        let eth_client =
            EthClient::new(&self.eth_rpc_url, self.expected_chain_id, metrics).await?;
        let chain_id = eth_client
            .get_chain_id()
            .await
            .map_err(|e| anyhow::anyhow!("failed to query chain id: {:?}", e))?;
        let wallet = wallet.with_chain_id(chain_id);

        Ok(RuntimeConfig {
            server_listen_port: self.server_listen_port,
            eth_client: Arc::new(eth_client),
            wallet,
            chain_id,
            network_name: self.network_name.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_poll_attempts: self.max_poll_attempts,
            ledger_max_age: Duration::from_secs(self.ledger_max_age_secs),
            eviction_interval: Duration::from_secs(self.eviction_interval_secs),
        })
    }
}
