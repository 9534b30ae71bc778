use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("settlement agent list query: {0}")]
    Source(String),
}
