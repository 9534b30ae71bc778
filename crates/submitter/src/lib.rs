//! C3 Submitter: drains Pending deposit rows per chain, gates on the
//! settlement light-client tip, and submits the chain-specific staking
//! message. See `SPEC_FULL.md` §4.3.

pub mod classify;
pub mod errors;
pub mod submit;

pub use classify::{classify_outcome, Outcome};
pub use errors::SubmitterError;
pub use submit::{submit_bnb_forever, submit_btc_forever, POLL_INTERVAL};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use relay_settlement::client::MockSettlementClient;
    use relay_settlement::BnbLatestHeader;
    use relay_store::DepositStore;
    use relay_tasks::TaskManager;
    use relay_test_utils::evm_deposit_fixture;

    use crate::submit::submit_bnb_forever;

    // `submit_bnb_forever` needs a live Postgres-backed `DepositStore` —
    // there's no in-memory fake behind that trait — so this is `#[ignore]`d
    // and exercised manually with `TEST_DATABASE_URL` set, mirroring
    // `relay-store`'s own integration tests.
    async fn test_store() -> DepositStore {
        let url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set to run submitter integration tests");
        let store = DepositStore::connect(&url).await.expect("connect");
        store.migrate().await.expect("migrate");
        store
    }

    #[tokio::test]
    #[ignore]
    async fn bnb_row_marked_success_on_settlement_dedup() {
        let store = Arc::new(test_store().await);
        store
            .insert_deposits(&[evm_deposit_fixture(100, "0xaaaa")])
            .await
            .unwrap();

        let mut settlement = MockSettlementClient::new();
        settlement
            .expect_must_get_addr()
            .returning(|| Box::pin(async { Ok("relayer-signer".to_owned()) }));
        settlement
            .expect_bnb_latest_header()
            .returning(|| Box::pin(async { Ok(BnbLatestHeader { number: 1_000 }) }));
        settlement.expect_get_btc_staking_record().returning(|_| {
            Box::pin(async {
                Ok(Some(relay_settlement::BtcStakingRecord {
                    txid: "0xaaaa".to_owned(),
                }))
            })
        });

        let task_manager = TaskManager::new(tokio::runtime::Handle::current());
        let shutdown = task_manager.shutdown_signal();

        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            submit_bnb_forever(store.clone(), Arc::new(settlement), shutdown),
        )
        .await;

        let rows = store
            .get_unhandled(relay_primitives::chain::Chain::Bnb, 1_000)
            .await
            .unwrap();
        assert!(rows.is_empty(), "dedup-hit row should have been marked Success");
    }
}
