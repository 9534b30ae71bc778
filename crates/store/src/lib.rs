pub mod errors;
pub mod store;

pub use errors::StoreError;
pub use store::{DepositStore, UNHANDLED_BATCH_SIZE};

/// Integration tests that exercise a real Postgres instance. Ignored by
/// default since nothing in this workspace stands one up; run with
/// `TEST_DATABASE_URL` set and `cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use relay_primitives::{chain::Chain, deposit::DepositStatus};
    use relay_test_utils::btc_deposit_fixture;

    use crate::DepositStore;

    async fn test_store() -> DepositStore {
        let url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set to run store integration tests");
        let store = DepositStore::connect(&url).await.expect("connect");
        store.migrate().await.expect("migrate");
        store
    }

    #[tokio::test]
    #[ignore]
    async fn insert_is_idempotent_on_chain_txid() {
        let store = test_store().await;
        let dep = btc_deposit_fixture(100, "bc1qreceiver", 1000);

        store.insert_deposits(&[dep.clone()]).await.unwrap();
        store.insert_deposits(&[dep.clone()]).await.unwrap();

        let unhandled = store.get_unhandled(Chain::Btc, 100).await.unwrap();
        let matching: Vec<_> = unhandled.iter().filter(|d| d.txid == dep.txid).collect();
        assert_eq!(matching.len(), 1);
    }

    #[tokio::test]
    #[ignore]
    async fn mark_status_rejects_terminal_downgrade() {
        let store = test_store().await;
        let dep = btc_deposit_fixture(200, "bc1qreceiver", 500);
        store.insert_deposits(&[dep.clone()]).await.unwrap();

        store
            .mark_status(Chain::Btc, &dep.txid, DepositStatus::Success)
            .await
            .unwrap();

        let err = store
            .mark_status(Chain::Btc, &dep.txid, DepositStatus::Invalid)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::StoreError::StatusDowngrade { .. }));
    }

    #[tokio::test]
    #[ignore]
    async fn scan_cursor_round_trips() {
        let store = test_store().await;
        assert_eq!(store.get_scan_cursor(Chain::Bnb).await.unwrap(), 0);
        store.set_scan_cursor(Chain::Bnb, 42).await.unwrap();
        assert_eq!(store.get_scan_cursor(Chain::Bnb).await.unwrap(), 42);
    }
}
