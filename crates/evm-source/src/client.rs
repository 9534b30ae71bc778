use alloy_consensus::Header;
use alloy_primitives::{Address, BlockHash, B256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types_eth::{BlockId, Filter, Log, TransactionReceipt};
use async_trait::async_trait;

use crate::errors::EvmSourceError;

/// Query capability against an EVM JSON-RPC endpoint, consumed as an opaque
/// external collaborator per `SPEC_FULL.md` §6. Adapted from
/// `crates/btcio/src/rpc/traits.rs`'s thin-async-trait shape, here wrapping
/// `alloy_provider::Provider` the way `examples/kien-caliber-block-stm-revm`'s
/// `ProviderBuilder::new().on_http(url)` does for a plain JSON-RPC HTTP
/// transport.
#[async_trait]
pub trait EvmSourceClient: Send + Sync + 'static {
    async fn tip_height(&self) -> Result<u64, EvmSourceError>;

    async fn get_logs(&self, filter: Filter) -> Result<Vec<Log>, EvmSourceError>;

    async fn get_block_receipts(
        &self,
        block_hash: BlockHash,
    ) -> Result<Vec<TransactionReceipt>, EvmSourceError>;

    async fn get_header(&self, block_hash: BlockHash) -> Result<Header, EvmSourceError>;
}

pub struct AlloyEvmSourceClient<P> {
    provider: P,
}

impl AlloyEvmSourceClient<alloy_provider::RootProvider<alloy_transport_http::Http<reqwest::Client>>> {
    pub fn connect_http(rpc_url: reqwest::Url) -> Self {
        let provider = ProviderBuilder::new().on_http(rpc_url);
        Self { provider }
    }
}

#[async_trait]
impl<P> EvmSourceClient for AlloyEvmSourceClient<P>
where
    P: Provider + Send + Sync + 'static,
{
    async fn tip_height(&self) -> Result<u64, EvmSourceError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| EvmSourceError::Rpc(e.to_string()))
    }

    async fn get_logs(&self, filter: Filter) -> Result<Vec<Log>, EvmSourceError> {
        self.provider
            .get_logs(&filter)
            .await
            .map_err(|e| EvmSourceError::Rpc(e.to_string()))
    }

    async fn get_block_receipts(
        &self,
        block_hash: BlockHash,
    ) -> Result<Vec<TransactionReceipt>, EvmSourceError> {
        self.provider
            .get_block_receipts(BlockId::Hash(block_hash.into()))
            .await
            .map_err(|e| EvmSourceError::Rpc(e.to_string()))?
            .ok_or_else(|| EvmSourceError::Rpc(format!("unknown block {block_hash}")))
    }

    async fn get_header(&self, block_hash: BlockHash) -> Result<Header, EvmSourceError> {
        let block = self
            .provider
            .get_block_by_hash(block_hash)
            .await
            .map_err(|e| EvmSourceError::Rpc(e.to_string()))?
            .ok_or_else(|| EvmSourceError::Rpc(format!("unknown block {block_hash}")))?;
        Ok(block.header.inner)
    }
}

/// `StakePlanHub` event topic computed by the `sol!`-generated
/// [`crate::event::StakeEvent`] — re-exported here since callers building a
/// [`Filter`] need it without importing the event module directly.
pub fn stake_event_topic() -> B256 {
    use alloy_sol_types::SolEvent;
    crate::event::StakeEvent::SIGNATURE_HASH
}

pub fn stake_plan_hub_filter(address: Address, from_block: u64, to_block: u64) -> Filter {
    Filter::new()
        .address(address)
        .from_block(from_block)
        .to_block(to_block)
        .event_signature(stake_event_topic())
}
