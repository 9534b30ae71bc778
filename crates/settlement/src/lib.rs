//! The settlement chain as an external collaborator: query/submission
//! client (`RestSettlementClient`) plus the DTOs its LCD-style REST gateway
//! exchanges. Consumed by `relay-registry` (agent list bootstrap/refresh)
//! and `relay-submitter` (dedup check, proof submission, gating reads).

pub mod client;
pub mod errors;
pub mod types;

pub use client::{AgentSourceAdapter, RestSettlementClient, SettlementClient};
pub use errors::SettlementError;
pub use types::{
    BnbLatestHeader, BnbLightClientParams, BtcHeaderChainTip, BtcStakingParams, BtcStakingRecord,
    CreateBtcStaking, CreateBtcbStaking, MerkleBlockProof, StakingTx,
};

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use crate::{
        client::MockSettlementClient,
        types::{BtcHeaderChainTip, BtcStakingRecord},
    };

    #[tokio::test]
    async fn mock_client_reports_dedup_hit() {
        let mut mock = MockSettlementClient::new();
        mock.expect_get_btc_staking_record()
            .with(eq("deadbeef"))
            .returning(|_| {
                Box::pin(async {
                    Ok(Some(BtcStakingRecord {
                        txid: "deadbeef".to_owned(),
                    }))
                })
            });

        let record = mock.get_btc_staking_record("deadbeef").await.unwrap();
        assert_eq!(record.unwrap().txid, "deadbeef");
    }

    #[tokio::test]
    async fn mock_client_reports_chain_tip() {
        let mut mock = MockSettlementClient::new();
        mock.expect_btc_header_chain_tip()
            .returning(|| Box::pin(async { Ok(BtcHeaderChainTip { height: 850_000 }) }));

        let tip = mock.btc_header_chain_tip().await.unwrap();
        assert_eq!(tip.height, 850_000);
    }
}
