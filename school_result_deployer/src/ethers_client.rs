use std::{sync::Arc, time::Duration};

use ethers::{
    core::k256::ecdsa::SigningKey,
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer, Wallet},
};

use crate::{
    config::{Accounts, ResolvedNetwork, LOCAL_CHAIN_ID},
    error::{DeployerError, Result},
};

// local dev nodes mine instantly, no need to wait out the default 7s poll
const LOCAL_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub type EtherSigner = SignerMiddleware<Provider<Http>, Wallet<SigningKey>>;

/// Wallets for the configured accounts, in order. No chain id is set yet.
pub fn build_wallets(accounts: &Accounts) -> Result<Vec<LocalWallet>> {
    match accounts {
        Accounts::PrivateKeys(keys) => keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                key.parse::<LocalWallet>()
                    .map_err(|e| DeployerError::Signer(format!("account #{i}: {e}")))
            })
            .collect(),
        Accounts::Mnemonic(hd) => {
            let end = hd.initial_index.checked_add(hd.count).ok_or_else(|| {
                DeployerError::Signer(format!(
                    "mnemonic account range overflows: initial index {} + count {}",
                    hd.initial_index, hd.count
                ))
            })?;
            (hd.initial_index..end)
                .map(|index| {
                    MnemonicBuilder::<English>::default()
                        .phrase(hd.mnemonic.as_str())
                        .index(index)
                        .and_then(|builder| builder.build())
                        .map_err(|e| {
                            DeployerError::Signer(format!("mnemonic index {index}: {e}"))
                        })
                })
                .collect()
        }
    }
}

pub fn read_only_provider(network: &ResolvedNetwork) -> Result<Provider<Http>> {
    let mut provider = Provider::<Http>::try_from(network.rpc_url.as_str())
        .map_err(|e| DeployerError::Provider(e.to_string()))?;
    if network.chain_id == Some(LOCAL_CHAIN_ID) {
        provider.set_interval(LOCAL_POLL_INTERVAL);
    }
    Ok(provider)
}

/// One signing client per configured account, like `ethers.getSigners()`.
pub async fn get_signers(network: &ResolvedNetwork) -> Result<Vec<Arc<EtherSigner>>> {
    let wallets = build_wallets(&network.accounts)?;
    if wallets.is_empty() {
        return Err(DeployerError::NoAccounts(network.name.clone()));
    }

    let provider = read_only_provider(network)?;
    let chain_id = match network.chain_id {
        Some(chain_id) => chain_id,
        None => provider
            .get_chainid()
            .await
            .map_err(|e| DeployerError::Provider(e.to_string()))?
            .as_u64(),
    };

    tracing::debug!(
        network = %network.name,
        chain_id,
        accounts = wallets.len(),
        "connected signers"
    );

    Ok(wallets
        .into_iter()
        .map(|wallet| {
            let wallet = wallet.with_chain_id(chain_id);
            Arc::new(SignerMiddleware::new(provider.clone(), wallet))
        })
        .collect())
}
