use async_trait::async_trait;
use relay_primitives::prelude::AgentRecord;

use crate::errors::RegistryError;

/// One page of the settlement chain's agent list. `next_key` is `None` once
/// the scan has reached the end (mirrors a Cosmos-SDK paginated query with no
/// key meaning "start from the beginning").
pub struct AgentPage {
    pub agents: Vec<AgentRecord>,
    pub next_key: Option<String>,
}

/// The settlement chain's agent-list query, consumed as an opaque external
/// collaborator (the actual client lives in `relay-settlement`).
#[async_trait]
pub trait SettlementAgentSource: Send + Sync {
    async fn agents_page(&self, key: Option<&str>) -> Result<AgentPage, RegistryError>;
}
