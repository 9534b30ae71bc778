//! C4 Agent/Receiver Registry: a bootstrap-time full scan of the settlement
//! chain's agent list, cached in memory and exposed by BTC receiving
//! address. Refresh is copy-on-publish: readers see either the old snapshot
//! or the new one in full, never a partial update.
//!
//! Grounded on `crates/bridge-relay/src/relayer.rs`'s
//! `status_channel.operator_table()` snapshot-read pattern; that crate's
//! `StatusChannel` ships no source in this retrieval, so the publish side is
//! reconstructed directly on `std::sync::RwLock<Arc<_>>` rather than reusing
//! an unavailable broadcast-channel type.

pub mod errors;
pub mod source;

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use relay_primitives::prelude::AgentRecord;
use tracing::info;

use crate::{
    errors::RegistryError,
    source::{AgentPage, SettlementAgentSource},
};

struct Snapshot {
    by_address: HashMap<String, AgentRecord>,
}

/// See the "Open question — receiver-list refresh" decision in `DESIGN.md`:
/// a [`refresh`](AgentRegistry::refresh) entry point exists but nothing in
/// this workspace schedules it automatically.
pub struct AgentRegistry {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl AgentRegistry {
    /// Pages through the full agent list via `source` and builds the initial
    /// snapshot. Call once at process startup.
    pub async fn bootstrap(source: &dyn SettlementAgentSource) -> Result<Self, RegistryError> {
        let by_address = scan_all(source).await?;
        info!(count = by_address.len(), "agent registry bootstrapped");
        Ok(Self {
            snapshot: RwLock::new(Arc::new(Snapshot { by_address })),
        })
    }

    /// Re-pages the full agent list and atomically publishes the result.
    /// Readers in flight continue to see the snapshot they acquired; new
    /// reads see the fresh one.
    pub async fn refresh(&self, source: &dyn SettlementAgentSource) -> Result<(), RegistryError> {
        let by_address = scan_all(source).await?;
        info!(count = by_address.len(), "agent registry refreshed");
        let new_snapshot = Arc::new(Snapshot { by_address });
        *self.snapshot.write().unwrap() = new_snapshot;
        Ok(())
    }

    /// Returns `None` when `btc_address` is not a recognized receiver.
    pub fn get_agent_by_address(&self, btc_address: &str) -> Option<AgentRecord> {
        let snapshot = self.snapshot.read().unwrap().clone();
        snapshot.by_address.get(btc_address).cloned()
    }

    /// All currently known agents, in no particular order. Used by the
    /// balance-refresher subcommand, which has to visit every recognized
    /// receiver rather than look one up.
    pub fn all(&self) -> Vec<AgentRecord> {
        self.snapshot.read().unwrap().by_address.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().unwrap().by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn scan_all(
    source: &dyn SettlementAgentSource,
) -> Result<HashMap<String, AgentRecord>, RegistryError> {
    let mut by_address = HashMap::new();
    let mut key: Option<String> = None;

    loop {
        let AgentPage { agents, next_key } = source.agents_page(key.as_deref()).await?;
        for agent in agents {
            by_address.insert(agent.btc_receiving_address.clone(), agent);
        }
        match next_key {
            Some(next) => key = Some(next),
            None => break,
        }
    }

    Ok(by_address)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use relay_test_utils::agent_fixture;

    use super::*;

    struct PagedSource {
        pages: Vec<AgentPage>,
    }

    #[async_trait]
    impl SettlementAgentSource for PagedSource {
        async fn agents_page(&self, key: Option<&str>) -> Result<AgentPage, RegistryError> {
            let idx: usize = key.map(|k| k.parse().unwrap()).unwrap_or(0);
            let page = &self.pages[idx];
            Ok(AgentPage {
                agents: page.agents.clone(),
                next_key: page.next_key.clone(),
            })
        }
    }

    fn two_page_source() -> PagedSource {
        PagedSource {
            pages: vec![
                AgentPage {
                    agents: vec![agent_fixture(1, "bc1qone", "")],
                    next_key: Some("1".to_owned()),
                },
                AgentPage {
                    agents: vec![agent_fixture(2, "bc1qtwo", "0xabc")],
                    next_key: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn bootstrap_pages_through_full_list() {
        let registry = AgentRegistry::bootstrap(&two_page_source()).await.unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get_agent_by_address("bc1qone").is_some());
        assert!(registry.get_agent_by_address("bc1qtwo").is_some());
        assert!(registry.get_agent_by_address("bc1qunknown").is_none());
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot_atomically() {
        let registry = AgentRegistry::bootstrap(&two_page_source()).await.unwrap();

        let updated = PagedSource {
            pages: vec![AgentPage {
                agents: vec![agent_fixture(3, "bc1qthree", "")],
                next_key: None,
            }],
        };
        registry.refresh(&updated).await.unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get_agent_by_address("bc1qone").is_none());
        assert!(registry.get_agent_by_address("bc1qthree").is_some());
    }
}
