use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitterError {
    #[error("source query: {0}")]
    Source(String),

    #[error(transparent)]
    Settlement(#[from] relay_settlement::SettlementError),

    #[error(transparent)]
    Store(#[from] relay_store::StoreError),
}
