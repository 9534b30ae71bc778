use thiserror::Error;

#[derive(Debug, Error)]
pub enum BtcSourceError {
    #[error("btc query endpoint: {0}")]
    Http(#[from] reqwest::Error),

    #[error("decoding response from btc query endpoint: {0}")]
    Decode(String),

    #[error("store: {0}")]
    Store(#[from] relay_store::StoreError),
}
