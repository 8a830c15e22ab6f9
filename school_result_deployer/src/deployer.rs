use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use ethers::{
    contract::{Contract, ContractFactory},
    providers::Middleware,
    types::{Address, H256, U256, U64},
};
use serde::{Deserialize, Serialize};

use crate::{
    artifacts::ContractArtifact,
    error::{DeployerError, Result},
    gas_reporter::GasReporter,
    utils::format_address,
};

pub struct Deployment<M> {
    pub contract: Contract<M>,
    pub contract_name: String,
    pub source_name: String,
    pub deployer: Address,
    pub transaction_hash: H256,
    pub block_number: Option<U64>,
    pub gas_used: Option<U256>,
}

impl<M: Middleware> Deployment<M> {
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub fn record(&self, network: &str, chain_id: u64, compiler: &str) -> DeploymentRecord {
        DeploymentRecord {
            contract_name: self.contract_name.clone(),
            source_name: self.source_name.clone(),
            network: network.to_owned(),
            chain_id,
            address: self.address(),
            deployer: self.deployer,
            transaction_hash: self.transaction_hash,
            block_number: self.block_number,
            gas_used: self.gas_used,
            compiler: compiler.to_owned(),
            deployed_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub source_name: String,
    pub network: String,
    pub chain_id: u64,
    pub address: Address,
    pub deployer: Address,
    pub transaction_hash: H256,
    pub block_number: Option<U64>,
    pub gas_used: Option<U256>,
    pub compiler: String,
    pub deployed_at: DateTime<Utc>,
}

impl DeploymentRecord {
    /// Writes `<dir>/<network>/<ContractName>.json`, replacing an earlier record.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let network_dir = dir.join(&self.network);
        fs::create_dir_all(&network_dir)?;

        let path = network_dir.join(format!("{}.json", self.contract_name));
        fs::write(&path, serde_json::to_string_pretty(self)?)?;

        tracing::info!(path = %path.display(), "saved deployment record");
        Ok(path)
    }
}

/// Sends the creation transaction for `artifact` (no constructor arguments)
/// and waits until it is mined.
pub async fn deploy_contract<M: Middleware + 'static>(
    client: Arc<M>,
    artifact: &ContractArtifact,
    gas_reporter: &GasReporter,
) -> Result<Deployment<M>> {
    let bytecode = artifact.creation_bytecode()?;
    let deployer = client
        .default_sender()
        .ok_or_else(|| DeployerError::Signer(String::from("client has no sender account")))?;

    tracing::info!(
        contract = %artifact.fully_qualified_name(),
        deployer = %format_address(&deployer),
        "deploying contract"
    );

    let factory = ContractFactory::new(artifact.abi.clone(), bytecode, client);
    let (contract, receipt) = factory
        .deploy(())
        .map_err(|e| DeployerError::Contract(e.to_string()))?
        .send_with_receipt()
        .await
        .map_err(|e| DeployerError::Contract(e.to_string()))?;

    if receipt.contract_address.is_none() {
        return Err(DeployerError::MissingContractAddress);
    }

    if let Some(gas_used) = receipt.gas_used {
        gas_reporter.record_deployment(&artifact.contract_name, gas_used.low_u64());
    }

    tracing::info!(
        contract = %artifact.contract_name,
        address = %format_address(&contract.address()),
        tx = ?receipt.transaction_hash,
        "contract deployed"
    );

    Ok(Deployment {
        contract,
        contract_name: artifact.contract_name.clone(),
        source_name: artifact.source_name.clone(),
        deployer,
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    })
}
