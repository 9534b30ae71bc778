//! C5 Relay Supervisor: owns the scan+submit task pair for one source
//! chain, its own shutdown signal, and a wait handle, per `SPEC_FULL.md`
//! §4.5. Grounded on `crates/bridge-relay/src/relayer.rs`'s
//! `start_bridge_relayer_task`/`RelayerHandle` (task-spawn-and-return-a-handle
//! shape) and `bin/strata-client/src/main.rs`'s `start_core_tasks`
//! (multi-task process startup using `TaskExecutor`).

use std::sync::Arc;

use relay_btc_source::{scan_forever as btc_scan_forever, BtcScannerConfig, BtcSourceClient};
use relay_evm_source::{scan_forever as evm_scan_forever, EvmScannerConfig, EvmSourceClient};
use relay_primitives::chain::Chain;
use relay_registry::AgentRegistry;
use relay_settlement::SettlementClient;
use relay_store::DepositStore;
use relay_submitter::{submit_bnb_forever, submit_btc_forever};
use relay_tasks::TaskManager;

/// Owns the scan + submit tasks for one source chain. Each supervisor keeps
/// its own `TaskManager` scoped to its two tasks, so `Stop`/`WaitForShutdown`
/// on one chain never block on the other — they share the process's tokio
/// runtime `Handle` (cheap to clone) but not its shutdown signal.
pub struct RelaySupervisor {
    chain: Chain,
    tasks: TaskManager,
}

impl RelaySupervisor {
    /// Spawns the BTC scan + submit tasks and returns a handle to them.
    pub fn start_btc(
        runtime: tokio::runtime::Handle,
        store: Arc<DepositStore>,
        source: Arc<dyn BtcSourceClient>,
        settlement: Arc<dyn SettlementClient>,
        registry: Arc<AgentRegistry>,
        scan_config: BtcScannerConfig,
        confirmation_depth: u32,
    ) -> Self {
        let tasks = TaskManager::new(runtime);
        let executor = tasks.executor();

        let scan_shutdown = executor.shutdown_signal();
        executor.spawn_critical_async(
            "btc-scan",
            btc_scan_forever(source.clone(), store.clone(), registry.clone(), scan_config, scan_shutdown),
        );

        let submit_shutdown = executor.shutdown_signal();
        executor.spawn_critical_async(
            "btc-submit",
            submit_btc_forever(store, settlement, source, registry, confirmation_depth, submit_shutdown),
        );

        Self {
            chain: Chain::Btc,
            tasks,
        }
    }

    /// Spawns the BNB scan + submit tasks and returns a handle to them.
    pub fn start_bnb(
        runtime: tokio::runtime::Handle,
        store: Arc<DepositStore>,
        source: Arc<dyn EvmSourceClient>,
        settlement: Arc<dyn SettlementClient>,
        scan_config: EvmScannerConfig,
    ) -> Self {
        let tasks = TaskManager::new(runtime);
        let executor = tasks.executor();

        let scan_shutdown = executor.shutdown_signal();
        executor.spawn_critical_async("bnb-scan", evm_scan_forever(source, store.clone(), scan_config, scan_shutdown));

        let submit_shutdown = executor.shutdown_signal();
        executor.spawn_critical_async("bnb-submit", submit_bnb_forever(store, settlement, submit_shutdown));

        Self {
            chain: Chain::Bnb,
            tasks,
        }
    }

    pub fn chain_name(&self) -> &'static str {
        self.chain.as_str()
    }

    /// Signals cooperative shutdown to both of this chain's tasks.
    pub fn stop(&self) {
        self.tasks.initiate_shutdown();
    }

    /// Blocks until both of this chain's tasks have returned.
    pub async fn wait_for_shutdown(&self) {
        self.tasks.wait_for_shutdown().await;
    }
}
