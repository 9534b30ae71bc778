use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("postgres: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("attempted to move deposit {chain}/{txid} from terminal status {from} to {to}")]
    StatusDowngrade {
        chain: String,
        txid: String,
        from: String,
        to: String,
    },

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}
