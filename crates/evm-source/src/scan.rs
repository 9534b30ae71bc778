use std::{
    collections::HashSet,
    num::NonZeroUsize,
    sync::Arc,
};

use alloy_consensus::Header;
use alloy_primitives::{Address, BlockHash, TxHash};
use alloy_provider::network::eip2718::Encodable2718;
use alloy_rpc_types_eth::TransactionReceipt;
use alloy_sol_types::SolEvent;
use chrono::{TimeZone, Utc};
use lru::LruCache;
use relay_common::retry::{retry_indefinitely, TRANSIENT_RETRY_DELAY};
use relay_primitives::{chain::Chain, deposit::Payload, prelude::NewDeposit};
use relay_store::DepositStore;
use tokio::time::sleep;
use tracing::info;

use crate::{
    client::{stake_plan_hub_filter, EvmSourceClient},
    errors::EvmSourceError,
    event::StakeEvent,
    receipt_proof::{build_receipt_proof, encode_proof_bytes},
};

/// Upper bound on blocks scanned per `eth_getLogs` window (`SPEC_FULL.md`
/// §4.1).
pub const EVM_SCAN_BATCH: u64 = 1000;

/// Size of the receipt/header LRU caches (§4.1, §9 cache-coherence note).
const CACHE_SIZE: usize = 100;

pub const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);

/// The inclusive end of the next scan window: at most [`EVM_SCAN_BATCH`]
/// blocks starting at `start`, clamped to `max_eligible`. `start ==
/// max_eligible` yields a single-block window (§8 boundary: "a batch of EVM
/// logs where start == end must still be processed").
fn window_end(start: u64, max_eligible: u64) -> u64 {
    (start + EVM_SCAN_BATCH - 1).min(max_eligible)
}

pub struct EvmScannerConfig {
    pub stake_plan_hub_address: Address,
    pub confirmation_depth: u32,
    pub start_block_height: u64,
}

/// C1 EVM scanner: windowed `eth_getLogs` over up to [`EVM_SCAN_BATCH`]
/// blocks per cycle, gated on `source_tip >= end + D`. Grounded on
/// `crates/btcio/src/reader/mod.rs`'s loop shape, adapted for windowed
/// rather than single-block advance.
pub async fn scan_forever(
    client: Arc<dyn EvmSourceClient>,
    store: Arc<DepositStore>,
    config: EvmScannerConfig,
    mut shutdown: relay_tasks::ShutdownSignal,
) -> anyhow::Result<()> {
    let cursor = store.get_scan_cursor(Chain::Bnb).await?;
    let mut next_height = if cursor == 0 {
        config.start_block_height
    } else {
        cursor + 1
    };

    let mut receipt_cache: LruCache<BlockHash, Vec<TransactionReceipt>> =
        LruCache::new(NonZeroUsize::new(CACHE_SIZE).unwrap());
    let mut header_cache: LruCache<BlockHash, Header> =
        LruCache::new(NonZeroUsize::new(CACHE_SIZE).unwrap());

    loop {
        if shutdown.is_shutdown() {
            return Ok(());
        }

        let tip = retry_indefinitely("evm_tip_height", TRANSIENT_RETRY_DELAY, || {
            let client = client.clone();
            async move { client.tip_height().await }
        })
        .await;

        let max_eligible = tip.saturating_sub(config.confirmation_depth as u64);
        if max_eligible < next_height {
            sleep(POLL_INTERVAL).await;
            continue;
        }

        let end = window_end(next_height, max_eligible);
        let filter = stake_plan_hub_filter(config.stake_plan_hub_address, next_height, end);

        let logs = retry_indefinitely("evm_get_logs", TRANSIENT_RETRY_DELAY, || {
            let client = client.clone();
            let filter = filter.clone();
            async move { client.get_logs(filter).await }
        })
        .await;

        let mut deposits = Vec::new();
        let mut seen: HashSet<(BlockHash, TxHash)> = HashSet::new();

        for log in logs {
            let Some(block_hash) = log.block_hash else {
                continue;
            };
            let Some(tx_hash) = log.transaction_hash else {
                continue;
            };
            if !seen.insert((block_hash, tx_hash)) {
                continue;
            }

            let deposit = build_deposit_for_log(
                &log,
                block_hash,
                tx_hash,
                &client,
                &mut receipt_cache,
                &mut header_cache,
            )
            .await?;
            deposits.push(deposit);
        }

        if !deposits.is_empty() {
            info!(
                start = next_height,
                end, count = deposits.len(),
                "bnb deposits found"
            );
            retry_indefinitely("store_insert_deposits_bnb", TRANSIENT_RETRY_DELAY, || {
                let store = store.clone();
                let deposits = deposits.clone();
                async move { store.insert_deposits(&deposits).await }
            })
            .await;
        }

        retry_indefinitely("store_set_scan_cursor_bnb", TRANSIENT_RETRY_DELAY, || {
            let store = store.clone();
            async move { store.set_scan_cursor(Chain::Bnb, end).await }
        })
        .await;
        next_height = end + 1;
    }
}

async fn build_deposit_for_log(
    log: &alloy_rpc_types_eth::Log,
    block_hash: BlockHash,
    tx_hash: TxHash,
    client: &Arc<dyn EvmSourceClient>,
    receipt_cache: &mut LruCache<BlockHash, Vec<TransactionReceipt>>,
    header_cache: &mut LruCache<BlockHash, Header>,
) -> Result<NewDeposit, EvmSourceError> {
    if receipt_cache.get(&block_hash).is_none() {
        let receipts = client.get_block_receipts(block_hash).await?;
        receipt_cache.put(block_hash, receipts);
    }
    let receipts = receipt_cache.get(&block_hash).expect("just inserted");

    let receipt = receipts
        .iter()
        .find(|r| r.transaction_hash == tx_hash)
        .ok_or_else(|| EvmSourceError::ReceiptNotFound {
            block_hash: block_hash.to_string(),
            tx_hash: tx_hash.to_string(),
        })?
        .clone();

    if header_cache.get(&block_hash).is_none() {
        let header = client.get_header(block_hash).await?;
        header_cache.put(block_hash, header);
    }
    let header = header_cache.get(&block_hash).expect("just inserted").clone();

    // Each receipt's EIP-2718 envelope encoding is the trie leaf value a
    // receipts-root proof is built over.
    let receipts_rlp: Vec<Vec<u8>> = receipts
        .iter()
        .map(|r| r.inner.encoded_2718())
        .collect();

    let tx_index = receipt.transaction_index.unwrap_or_default() as usize;
    let (_root, proof) = build_receipt_proof(&receipts_rlp, tx_index)
        .map_err(|e| EvmSourceError::ProofConstruction(e.to_string()))?;
    let proof_bytes = encode_proof_bytes(&proof);

    let decoded = StakeEvent::decode_log(&log.inner, true)
        .map_err(|e| EvmSourceError::ProofConstruction(format!("event decode: {e}")))?;
    let receiver_address = format!("{:#x}", decoded.user);

    let block_time = Utc
        .timestamp_opt(header.timestamp as i64, 0)
        .single()
        .unwrap_or_else(Utc::now);

    Ok(NewDeposit {
        chain: Chain::Bnb,
        txid: tx_hash.to_string(),
        height: receipt.block_number.unwrap_or_default(),
        block_hash: block_hash.to_string(),
        block_time,
        agent_id: None,
        receiver_name: receiver_address.clone(),
        receiver_address,
        amount: 0,
        payload: Payload::evm(hex::encode(&receipts_rlp[tx_index]), hex::encode(proof_bytes)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_spans_up_to_batch_size() {
        assert_eq!(window_end(100, 10_000), 100 + EVM_SCAN_BATCH - 1);
    }

    #[test]
    fn window_clamps_to_max_eligible() {
        assert_eq!(window_end(100, 150), 150);
    }

    #[test]
    fn window_start_equals_end_is_a_single_block_window() {
        assert_eq!(window_end(500, 500), 500);
    }
}
