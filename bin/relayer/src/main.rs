use std::sync::Arc;

use clap::Parser;
use relay_btc_source::EsploraClient;
use relay_common::logging::{self, LoggerConfig};
use relay_config::Config;
use relay_core::RelaySupervisor;
use relay_evm_source::AlloyEvmSourceClient;
use relay_registry::AgentRegistry;
use relay_settlement::{AgentSourceAdapter, RestSettlementClient, SettlementClient};
use relay_store::DepositStore;
use tracing::{error, info};

mod args;
mod refresh_balances;

use args::{Args, Command};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Err(err) = main_inner(args) {
        error!(%err, "fatal error");
        return Err(err);
    }
    Ok(())
}

fn main_inner(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Start { config } => run_start(config),
        Command::RefreshBalances { config } => run_refresh_balances(config),
    }
}

fn load_config(path: std::path::PathBuf) -> anyhow::Result<Config> {
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("reading config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}

fn run_start(config_path: std::path::PathBuf) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("relayer-rt")
        .build()
        .expect("init: build tokio runtime");

    logging::init(LoggerConfig::new("relayer".to_owned()));

    runtime.block_on(run_start_async(config, runtime.handle().clone()))?;

    logging::finalize();
    Ok(())
}

async fn run_start_async(config: Config, handle: tokio::runtime::Handle) -> anyhow::Result<()> {
    let store = Arc::new(DepositStore::connect(&config.database.connection_url()).await?);
    store.migrate().await?;

    let settlement: Arc<dyn SettlementClient> = Arc::new(RestSettlementClient::from_config(&config.settlement));

    let registry = Arc::new(AgentRegistry::bootstrap(&AgentSourceAdapter(settlement.as_ref())).await?);

    let btc_client: Arc<dyn relay_btc_source::BtcSourceClient> =
        Arc::new(EsploraClient::new(config.btc_source.api_endpoint.clone()));

    let rpc_url: reqwest::Url = config.evm_source.rpc_url.parse()?;
    let evm_client: Arc<dyn relay_evm_source::EvmSourceClient> =
        Arc::new(AlloyEvmSourceClient::connect_http(rpc_url));

    let staking_params = settlement.query_btc_staking_params().await?;

    let configured_hub = config.evm_source.stake_plan_hub_address.parse::<alloy_primitives::Address>()?;
    let stake_plan_hub_address = match settlement.bnb_light_client_params().await {
        Ok(params) => params
            .stake_plan_hub_address
            .parse::<alloy_primitives::Address>()
            .unwrap_or(configured_hub),
        Err(err) => {
            info!(%err, "falling back to configured stake_plan_hub_address");
            configured_hub
        }
    };

    let btc_scan_config = relay_btc_source::BtcScannerConfig {
        network: config.btc_source.network,
        confirmation_depth: config.btc_source.confirmation_depth,
        start_block_height: config.btc_source.start_block_height,
    };
    let evm_scan_config = relay_evm_source::EvmScannerConfig {
        stake_plan_hub_address,
        confirmation_depth: config.evm_source.confirmation_depth,
        start_block_height: config.evm_source.start_block_height,
    };

    let btc_supervisor = RelaySupervisor::start_btc(
        handle.clone(),
        store.clone(),
        btc_client,
        settlement.clone(),
        registry.clone(),
        btc_scan_config,
        staking_params.btc_confirmations_depth,
    );
    let bnb_supervisor = RelaySupervisor::start_bnb(
        handle,
        store,
        evm_client,
        settlement,
        evm_scan_config,
    );

    info!("relay instances started for btc and bnb");

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, stopping relay instances");

    btc_supervisor.stop();
    bnb_supervisor.stop();
    btc_supervisor.wait_for_shutdown().await;
    bnb_supervisor.wait_for_shutdown().await;

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn run_refresh_balances(config_path: std::path::PathBuf) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let refresher_config = config
        .balance_refresher
        .clone()
        .ok_or_else(|| anyhow::anyhow!("balance_refresher section is not configured"))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("relayer-refresh-rt")
        .build()
        .expect("init: build tokio runtime");

    logging::init(LoggerConfig::new("relayer-refresh-balances".to_owned()));

    runtime.block_on(async move {
        let settlement: Arc<dyn SettlementClient> = Arc::new(RestSettlementClient::from_config(&config.settlement));
        let registry = AgentRegistry::bootstrap(&AgentSourceAdapter(settlement.as_ref())).await?;
        refresh_balances::refresh_balances(&refresher_config.explorer_url, &registry).await
    })?;

    logging::finalize();
    Ok(())
}
