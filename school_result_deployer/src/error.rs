use ethers::types::H256;
use thiserror::Error;

use crate::{artifacts::ArtifactError, config::ConfigError};

#[derive(Debug, Error)]
pub enum DeployerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Failed to create signer: {0}")]
    Signer(String),
    #[error("Network '{0}' has no accounts configured")]
    NoAccounts(String),
    #[error("Contract call failed: {0}")]
    Contract(String),
    #[error("Transaction {0:?} was dropped from the mempool")]
    TransactionDropped(H256),
    #[error("Deployment transaction did not report a contract address")]
    MissingContractAddress,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = DeployerError> = std::result::Result<T, E>;
