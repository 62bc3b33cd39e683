// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use delaycover_node::config::{Config, NodeConfig};
use delaycover_node::node::run_node;
use prometheus::Registry;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(rename_all = "kebab-case")]
#[clap(name = env!("CARGO_BIN_NAME"))]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[clap(long)]
    pub config_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = NodeConfig::load(&args.config_path)?;
    let registry = Registry::new();

    let handle = run_node(config, registry).await?;
    handle
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
}
