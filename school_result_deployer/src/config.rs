use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "deployer.config.json";

/// Name of the local development network. It needs no url and no accounts.
pub const LOCAL_NETWORK: &str = "hardhat";
pub const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";
pub const LOCAL_CHAIN_ID: u64 = 31337;
/// Mnemonic the local development nodes (hardhat, anvil) fund by default.
pub const LOCAL_MNEMONIC: &str = "test test test test test test test test test test test junk";
const LOCAL_ACCOUNT_COUNT: u32 = 20;

const POLYGON_MUMBAI_NETWORK: &str = "polygon_mumbai";
const POLYGON_MUMBAI_RPC_URL: &str = "https://rpc-mumbai.maticvigil.com";
const DEPLOYER_KEY_PLACEHOLDER: &str = "${PRIVATE_KEY1}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unknown network '{name}'. Available networks: {}", .available.join(", "))]
    UnknownNetwork {
        name: String,
        available: Vec<String>,
    },
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Unterminated placeholder in config value: {0}")]
    InvalidPlaceholder(String),
    #[error("Invalid RPC url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolchainConfig {
    pub solidity: String,
    pub default_network: String,
    pub networks: BTreeMap<String, NetworkConfig>,
    #[serde(default)]
    pub gas_reporter: GasReporterConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Accounts>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accounts {
    PrivateKeys(Vec<String>),
    Mnemonic(HdAccounts),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HdAccounts {
    pub mnemonic: String,
    #[serde(default)]
    pub initial_index: u32,
    #[serde(default = "default_account_count")]
    pub count: u32,
}

fn default_account_count() -> u32 {
    LOCAL_ACCOUNT_COUNT
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasReporterConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    /// gwei. Without it only gas amounts are reported.
    #[serde(default)]
    pub gas_price: Option<u64>,
    #[serde(default)]
    pub enabled: bool,
    /// Price of one native token in `currency`.
    #[serde(default)]
    pub token_price: Option<f64>,
}

fn default_currency() -> String {
    String::from("USD")
}

impl Default for GasReporterConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            gas_price: None,
            enabled: false,
            token_price: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathsConfig {
    pub artifacts: PathBuf,
    pub deployments: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            artifacts: PathBuf::from("artifacts"),
            deployments: PathBuf::from("deployments"),
        }
    }
}

/// A network entry with every placeholder expanded and every default applied.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedNetwork {
    pub name: String,
    pub rpc_url: Url,
    pub chain_id: Option<u64>,
    pub accounts: Accounts,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(LOCAL_NETWORK.to_owned(), NetworkConfig::default());
        networks.insert(
            POLYGON_MUMBAI_NETWORK.to_owned(),
            NetworkConfig {
                url: Some(POLYGON_MUMBAI_RPC_URL.to_owned()),
                chain_id: None,
                accounts: Some(Accounts::PrivateKeys(vec![
                    DEPLOYER_KEY_PLACEHOLDER.to_owned()
                ])),
            },
        );

        Self {
            solidity: String::from("0.8.19"),
            default_network: LOCAL_NETWORK.to_owned(),
            networks,
            gas_reporter: GasReporterConfig {
                currency: String::from("CHF"),
                gas_price: Some(21),
                enabled: true,
                token_price: None,
            },
            paths: PathsConfig::default(),
        }
    }
}

impl ToolchainConfig {
    /// load from the given file, else `deployer.config.json`, else the built-in config
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // file configs are validated by `from_json_str`, the built-in one is valid
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => {
                tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using built-in config");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.networks.contains_key(&self.default_network) {
            return Err(self.unknown_network(&self.default_network));
        }
        Ok(())
    }

    pub fn resolve_network(&self, name: Option<&str>) -> Result<ResolvedNetwork, ConfigError> {
        self.resolve_network_with(name, |var| env::var(var).ok())
    }

    /// Same as [`Self::resolve_network`], reading placeholder values from `lookup`.
    pub fn resolve_network_with(
        &self,
        name: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ResolvedNetwork, ConfigError> {
        let name = name.unwrap_or(&self.default_network);
        let network = self
            .networks
            .get(name)
            .ok_or_else(|| self.unknown_network(name))?;

        let raw_url = match &network.url {
            Some(url) => interpolate_with(url, &lookup)?,
            None => LOCAL_RPC_URL.to_owned(),
        };
        let rpc_url = parse_rpc_url(&raw_url)?;

        let chain_id = match (network.chain_id, name) {
            (Some(chain_id), _) => Some(chain_id),
            (None, LOCAL_NETWORK) => Some(LOCAL_CHAIN_ID),
            (None, _) => None,
        };

        let accounts = match (&network.accounts, name) {
            (Some(Accounts::PrivateKeys(keys)), _) => Accounts::PrivateKeys(
                keys.iter()
                    .map(|key| interpolate_with(key, &lookup))
                    .collect::<Result<_, _>>()?,
            ),
            (Some(Accounts::Mnemonic(hd)), _) => Accounts::Mnemonic(HdAccounts {
                mnemonic: interpolate_with(&hd.mnemonic, &lookup)?,
                ..hd.clone()
            }),
            (None, LOCAL_NETWORK) => Accounts::Mnemonic(HdAccounts {
                mnemonic: LOCAL_MNEMONIC.to_owned(),
                initial_index: 0,
                count: LOCAL_ACCOUNT_COUNT,
            }),
            (None, _) => Accounts::PrivateKeys(Vec::new()),
        };

        Ok(ResolvedNetwork {
            name: name.to_owned(),
            rpc_url,
            chain_id,
            accounts,
        })
    }

    fn unknown_network(&self, name: &str) -> ConfigError {
        ConfigError::UnknownNetwork {
            name: name.to_owned(),
            available: self.networks.keys().cloned().collect(),
        }
    }
}

fn parse_rpc_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidUrl {
            url: raw.to_owned(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}

/// Expands every `${NAME}` in `value`.
fn interpolate_with(
    value: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ConfigError::InvalidPlaceholder(value.to_owned()))?;
        let var = &after[..end];
        let resolved = lookup(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_owned()))?;
        out.push_str(&resolved);
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_builtin_config_matches_toolchain_defaults() {
        let config = ToolchainConfig::default();

        assert_eq!(config.solidity, "0.8.19");
        assert_eq!(config.default_network, "hardhat");
        assert_eq!(
            config.networks.keys().collect::<Vec<_>>(),
            vec!["hardhat", "polygon_mumbai"]
        );
        assert_eq!(config.gas_reporter.currency, "CHF");
        assert_eq!(config.gas_reporter.gas_price, Some(21));
        assert!(config.gas_reporter.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_resolve_local_network_defaults() {
        let config = ToolchainConfig::default();
        let network = config.resolve_network_with(None, env_of(&[])).unwrap();

        assert_eq!(network.name, "hardhat");
        assert_eq!(network.rpc_url.as_str(), "http://127.0.0.1:8545/");
        assert_eq!(network.chain_id, Some(31337));
        let Accounts::Mnemonic(hd) = network.accounts else {
            panic!("local network should use the development mnemonic");
        };
        assert_eq!(hd.mnemonic, LOCAL_MNEMONIC);
        assert_eq!(hd.count, 20);
    }

    #[test]
    fn test_resolve_remote_network_reads_key_from_env() {
        let config = ToolchainConfig::default();
        let network = config
            .resolve_network_with(
                Some("polygon_mumbai"),
                env_of(&[("PRIVATE_KEY1", "0xabc123")]),
            )
            .unwrap();

        assert_eq!(network.rpc_url.host_str(), Some("rpc-mumbai.maticvigil.com"));
        assert_eq!(network.chain_id, None);
        assert_eq!(
            network.accounts,
            Accounts::PrivateKeys(vec![String::from("0xabc123")])
        );
    }

    #[test]
    fn test_resolve_remote_network_without_key_fails() {
        let config = ToolchainConfig::default();
        let err = config
            .resolve_network_with(Some("polygon_mumbai"), env_of(&[]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::MissingEnvVar(var) if var == "PRIVATE_KEY1"));
    }

    #[test]
    fn test_unknown_network_lists_available() {
        let config = ToolchainConfig::default();
        let err = config
            .resolve_network_with(Some("mainnet"), env_of(&[]))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unknown network 'mainnet'. Available networks: hardhat, polygon_mumbai"
        );
    }

    #[test]
    fn test_parse_config_file() {
        let raw = r#"{
            "solidity": "0.8.20",
            "defaultNetwork": "sepolia",
            "networks": {
                "sepolia": {
                    "url": "https://sepolia.example.org/${API_KEY}",
                    "chainId": 11155111,
                    "accounts": { "mnemonic": "${MNEMONIC}", "count": 2 }
                }
            },
            "gasReporter": { "currency": "EUR", "gasPrice": 3, "enabled": true, "tokenPrice": 2000.5 }
        }"#;

        let config = ToolchainConfig::from_json_str(raw).unwrap();
        assert_eq!(config.paths, PathsConfig::default());
        assert_eq!(config.gas_reporter.token_price, Some(2000.5));

        let network = config
            .resolve_network_with(
                None,
                env_of(&[("API_KEY", "secret"), ("MNEMONIC", "word word")]),
            )
            .unwrap();
        assert_eq!(network.rpc_url.as_str(), "https://sepolia.example.org/secret");
        assert_eq!(network.chain_id, Some(11155111));
        assert_eq!(
            network.accounts,
            Accounts::Mnemonic(HdAccounts {
                mnemonic: String::from("word word"),
                initial_index: 0,
                count: 2,
            })
        );
    }

    #[test]
    fn test_gas_reporter_currency_defaults_to_usd() {
        let raw = r#"{
            "solidity": "0.8.19",
            "defaultNetwork": "hardhat",
            "networks": { "hardhat": {} },
            "gasReporter": { "enabled": true, "gasPrice": 21 }
        }"#;

        let config = ToolchainConfig::from_json_str(raw).unwrap();
        assert_eq!(config.gas_reporter.currency, "USD");
        assert_eq!(config.gas_reporter.gas_price, Some(21));
        assert!(config.gas_reporter.enabled);
    }

    #[test]
    fn test_default_network_must_exist() {
        let raw = r#"{ "solidity": "0.8.19", "defaultNetwork": "nope", "networks": { "hardhat": {} } }"#;
        let err = ToolchainConfig::from_json_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNetwork { name, .. } if name == "nope"));
    }

    #[test]
    fn test_non_local_network_without_accounts_has_none() {
        let raw = r#"{
            "solidity": "0.8.19",
            "defaultNetwork": "hardhat",
            "networks": { "hardhat": {}, "staging": { "url": "http://10.0.0.2:8545" } }
        }"#;
        let config = ToolchainConfig::from_json_str(raw).unwrap();
        let network = config
            .resolve_network_with(Some("staging"), env_of(&[]))
            .unwrap();
        assert_eq!(network.accounts, Accounts::PrivateKeys(Vec::new()));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let raw = r#"{
            "solidity": "0.8.19",
            "defaultNetwork": "ws",
            "networks": { "ws": { "url": "ws://localhost:8546" } }
        }"#;
        let config = ToolchainConfig::from_json_str(raw).unwrap();
        let err = config.resolve_network_with(None, env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_interpolation() {
        let lookup = env_of(&[("A", "1"), ("B", "two")]);
        assert_eq!(interpolate_with("${A}-${B}-x", &lookup).unwrap(), "1-two-x");
        assert_eq!(interpolate_with("plain", &lookup).unwrap(), "plain");
        assert!(matches!(
            interpolate_with("${A", &lookup),
            Err(ConfigError::InvalidPlaceholder(_))
        ));
        assert!(matches!(
            interpolate_with("${C}", &lookup),
            Err(ConfigError::MissingEnvVar(var)) if var == "C"
        ));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let mut config = ToolchainConfig::default();
        config.gas_reporter.enabled = false;
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = ToolchainConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);

        let missing = ToolchainConfig::load(Some(&dir.path().join("missing.json")));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_rejects_file_with_unknown_default_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let mut config = ToolchainConfig::default();
        config.default_network = String::from("mainnet");
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let err = ToolchainConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNetwork { name, .. } if name == "mainnet"));
    }
}
