use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvmSourceError {
    #[error("evm rpc: {0}")]
    Rpc(String),

    #[error("block {block_hash} is missing receipt for tx {tx_hash}")]
    ReceiptNotFound {
        block_hash: String,
        tx_hash: String,
    },

    #[error("receipt trie proof construction: {0}")]
    ProofConstruction(String),

    #[error("store: {0}")]
    Store(#[from] relay_store::StoreError),
}
