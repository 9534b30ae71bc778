use std::sync::Arc;

use relay_btc_source::BtcSourceClient;
use relay_common::retry::{retry_indefinitely, GATE_RECHECK_DELAY, TRANSIENT_RETRY_DELAY};
use relay_primitives::{chain::Chain, deposit::DepositStatus};
use relay_registry::AgentRegistry;
use relay_settlement::{CreateBtcStaking, CreateBtcbStaking, SettlementClient, StakingTx};
use relay_store::DepositStore;
use tracing::{info, warn};

use crate::{
    classify::{classify_outcome, Outcome},
    errors::SubmitterError,
};

pub const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

/// Updates a row's status, logging and continuing past the failure rather
/// than killing the task: a transient DB hiccup is caught again on the next
/// pass through the loop (the row stays `Pending` and gets re-handled), and
/// a [`relay_store::StoreError::StatusDowngrade`] would never succeed no
/// matter how many times it's retried.
async fn mark_status_logged(store: &DepositStore, chain: Chain, txid: &str, status: DepositStatus) {
    if let Err(err) = store.mark_status(chain, txid, status).await {
        warn!(%txid, chain = %chain, status = status.as_str(), %err, "failed to update deposit status");
    }
}

/// Drains Pending BTC rows: dedup check, fetch merkle-block proof + raw tx,
/// resolve `agent_id`, submit `CreateBTCStaking`, classify. See
/// `SPEC_FULL.md` §4.3.
pub async fn submit_btc_forever(
    store: Arc<DepositStore>,
    settlement: Arc<dyn SettlementClient>,
    btc_client: Arc<dyn BtcSourceClient>,
    registry: Arc<AgentRegistry>,
    confirmation_depth: u32,
    mut shutdown: relay_tasks::ShutdownSignal,
) -> anyhow::Result<()> {
    let signer = settlement.must_get_addr().await?;

    loop {
        if shutdown.is_shutdown() {
            return Ok(());
        }

        let h_min = retry_indefinitely("store_min_pending_height_btc", TRANSIENT_RETRY_DELAY, || {
            let store = store.clone();
            async move { store.min_pending_height(Chain::Btc).await }
        })
        .await;
        let Some(h_min) = h_min else {
            tokio::time::sleep(POLL_INTERVAL).await;
            continue;
        };

        let tip = retry_indefinitely("settlement_btc_header_chain_tip", TRANSIENT_RETRY_DELAY, || {
            let settlement = settlement.clone();
            async move { settlement.btc_header_chain_tip().await }
        })
        .await
        .height;
        if tip < h_min + confirmation_depth as u64 {
            tokio::time::sleep(GATE_RECHECK_DELAY).await;
            continue;
        }

        let max_eligible_height = tip - confirmation_depth as u64;
        let rows = retry_indefinitely("store_get_unhandled_btc", TRANSIENT_RETRY_DELAY, || {
            let store = store.clone();
            async move { store.get_unhandled(Chain::Btc, max_eligible_height).await }
        })
        .await;

        for row in rows {
            if shutdown.is_shutdown() {
                return Ok(());
            }

            let dedup_hit = retry_indefinitely("settlement_get_btc_staking_record", TRANSIENT_RETRY_DELAY, || {
                let settlement = settlement.clone();
                let txid = row.txid.clone();
                async move { settlement.get_btc_staking_record(&txid).await }
            })
            .await;
            if dedup_hit.is_some() {
                mark_status_logged(&store, Chain::Btc, &row.txid, DepositStatus::Success).await;
                continue;
            }

            let agent_id = match row.agent_id {
                Some(id) => id,
                None => match registry.get_agent_by_address(&row.receiver_address) {
                    Some(agent) => agent.id,
                    None => {
                        warn!(txid = %row.txid, "receiver does not belong to any registered agent");
                        mark_status_logged(
                            &store,
                            Chain::Btc,
                            &row.txid,
                            DepositStatus::ReceiverNotBelongsToAgent,
                        )
                        .await;
                        continue;
                    }
                },
            };

            let proof = retry_indefinitely("btc_merkle_block_proof", TRANSIENT_RETRY_DELAY, || {
                let btc_client = btc_client.clone();
                let txid = row.txid.clone();
                async move {
                    btc_client
                        .merkle_block_proof(&txid)
                        .await
                        .map_err(|e| SubmitterError::Source(e.to_string()))
                }
            })
            .await;
            let tx_bytes = retry_indefinitely("btc_tx_raw", TRANSIENT_RETRY_DELAY, || {
                let btc_client = btc_client.clone();
                let txid = row.txid.clone();
                async move {
                    btc_client
                        .tx_raw(&txid)
                        .await
                        .map_err(|e| SubmitterError::Source(e.to_string()))
                }
            })
            .await;

            let msg = CreateBtcStaking {
                signer: signer.clone(),
                agent_id,
                staking_tx: StakingTx {
                    index: proof.index,
                    block_hash: proof.block_hash,
                    proof_bytes: proof.proof_bytes,
                    tx_bytes,
                },
            };

            loop {
                let result = settlement.create_btc_staking(msg.clone()).await;
                match classify_outcome(&result) {
                    Outcome::Success => {
                        info!(txid = %row.txid, "btc staking submitted");
                        mark_status_logged(&store, Chain::Btc, &row.txid, DepositStatus::Success).await;
                        break;
                    }
                    Outcome::Retryable => {
                        warn!(txid = %row.txid, err = ?result.err(), "retryable submission error");
                        tokio::time::sleep(TRANSIENT_RETRY_DELAY).await;
                    }
                    Outcome::Terminal => {
                        warn!(txid = %row.txid, err = ?result.err(), "terminal submission error");
                        mark_status_logged(&store, Chain::Btc, &row.txid, DepositStatus::Invalid).await;
                        break;
                    }
                }
            }
        }
    }
}

/// Drains Pending BNB rows: dedup check, decode the stored receipt/proof
/// hex, submit `CreateBTCBStaking`, classify. See `SPEC_FULL.md` §4.3.
pub async fn submit_bnb_forever(
    store: Arc<DepositStore>,
    settlement: Arc<dyn SettlementClient>,
    mut shutdown: relay_tasks::ShutdownSignal,
) -> anyhow::Result<()> {
    let signer = settlement.must_get_addr().await?;

    loop {
        if shutdown.is_shutdown() {
            return Ok(());
        }

        let h_min = retry_indefinitely("store_min_pending_height_bnb", TRANSIENT_RETRY_DELAY, || {
            let store = store.clone();
            async move { store.min_pending_height(Chain::Bnb).await }
        })
        .await;
        let Some(h_min) = h_min else {
            tokio::time::sleep(POLL_INTERVAL).await;
            continue;
        };

        let tip = retry_indefinitely("settlement_bnb_latest_header", TRANSIENT_RETRY_DELAY, || {
            let settlement = settlement.clone();
            async move { settlement.bnb_latest_header().await }
        })
        .await
        .number;
        if tip < h_min {
            tokio::time::sleep(GATE_RECHECK_DELAY).await;
            continue;
        }

        let rows = retry_indefinitely("store_get_unhandled_bnb", TRANSIENT_RETRY_DELAY, || {
            let store = store.clone();
            async move { store.get_unhandled(Chain::Bnb, tip).await }
        })
        .await;

        for row in rows {
            if shutdown.is_shutdown() {
                return Ok(());
            }

            let dedup_hit = retry_indefinitely("settlement_get_btc_staking_record", TRANSIENT_RETRY_DELAY, || {
                let settlement = settlement.clone();
                let txid = row.txid.clone();
                async move { settlement.get_btc_staking_record(&txid).await }
            })
            .await;
            if dedup_hit.is_some() {
                mark_status_logged(&store, Chain::Bnb, &row.txid, DepositStatus::Success).await;
                continue;
            }

            let (Some(receipt_hex), Some(proof_hex)) =
                (row.payload.receipt_hex.clone(), row.payload.proof_hex.clone())
            else {
                warn!(txid = %row.txid, "bnb row missing receipt/proof payload");
                mark_status_logged(&store, Chain::Bnb, &row.txid, DepositStatus::Invalid).await;
                continue;
            };

            let receipt_bytes = match hex::decode(&receipt_hex) {
                Ok(bytes) => bytes,
                Err(_) => {
                    mark_status_logged(&store, Chain::Bnb, &row.txid, DepositStatus::Invalid).await;
                    continue;
                }
            };
            let proof_bytes = match hex::decode(&proof_hex) {
                Ok(bytes) => bytes,
                Err(_) => {
                    mark_status_logged(&store, Chain::Bnb, &row.txid, DepositStatus::Invalid).await;
                    continue;
                }
            };

            let msg = CreateBtcbStaking {
                signer: signer.clone(),
                number: row.height,
                receipt_bytes,
                proof_bytes,
            };

            loop {
                let result = settlement.create_btcb_staking(msg.clone()).await;
                match classify_outcome(&result) {
                    Outcome::Success => {
                        info!(txid = %row.txid, "btcb staking submitted");
                        mark_status_logged(&store, Chain::Bnb, &row.txid, DepositStatus::Success).await;
                        break;
                    }
                    Outcome::Retryable => {
                        warn!(txid = %row.txid, err = ?result.err(), "retryable submission error");
                        tokio::time::sleep(TRANSIENT_RETRY_DELAY).await;
                    }
                    Outcome::Terminal => {
                        warn!(txid = %row.txid, err = ?result.err(), "terminal submission error");
                        mark_status_logged(&store, Chain::Bnb, &row.txid, DepositStatus::Invalid).await;
                        break;
                    }
                }
            }
        }
    }
}
