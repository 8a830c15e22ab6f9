pub mod artifacts;
pub mod config;
pub mod contracts;
pub mod deployer;
pub mod error;
pub mod ethers_client;
pub mod fixtures;
pub mod gas_reporter;
pub mod utils;

pub use error::{DeployerError, Result};
