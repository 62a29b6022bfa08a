use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Index operation failed: {0}")]
    Index(String),

    #[error("Document limit of {max} reached: {current} indexed, {requested} requested")]
    CapacityExceeded { current: usize, requested: usize, max: usize },
}

impl Error {
    /// Wrap an embedding provider failure, keeping the full `anyhow` context chain.
    pub fn embedding(err: &anyhow::Error) -> Self { Error::Embedding(format!("{err:#}")) }

    pub fn index(err: &anyhow::Error) -> Self { Error::Index(format!("{err:#}")) }
}

pub type Result<T> = std::result::Result<T, Error>;
