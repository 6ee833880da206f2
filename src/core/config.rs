use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::core::errors::{ClientError, ClientResult};
use crate::core::validation::{parse_address, parse_chain_id, validate_http_url};

pub const DEFAULT_CONFIG_PATH: &str = "ballot.toml";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xD4270b6F0aBCAE9EEE50f04E7d10a7286c7DeD4F";

/// Native currency metadata, as passed to `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// The one network the contract lives on.
///
/// Serializes to the EIP-3085 `AddEthereumChainParameter` shape, so it can be
/// handed to the wallet verbatim. Snake-case keys are accepted in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    /// Hex chain id, e.g. `0x1CBC67C35A`.
    #[serde(alias = "chain_id")]
    pub chain_id: String,
    #[serde(alias = "chain_name")]
    pub chain_name: String,
    #[serde(alias = "native_currency")]
    pub native_currency: NativeCurrency,
    #[serde(alias = "rpc_urls")]
    pub rpc_urls: Vec<String>,
    #[serde(alias = "block_explorer_urls")]
    pub block_explorer_urls: Vec<String>,
}

impl NetworkDescriptor {
    pub fn camp_basecamp() -> Self {
        Self {
            chain_id: "0x1CBC67C35A".to_string(),
            chain_name: "Camp Network Basecamp".to_string(),
            native_currency: NativeCurrency {
                name: "CAMP".to_string(),
                symbol: "CAMP".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://rpc.basecamp.t.raas.gelato.cloud".to_string()],
            block_explorer_urls: vec!["https://basecamp.cloud.blockscout.com/".to_string()],
        }
    }

    /// Case-insensitive comparison against a chain id reported by a wallet.
    pub fn matches_chain(&self, chain_id: &str) -> bool {
        self.chain_id.eq_ignore_ascii_case(chain_id.trim())
    }

    pub fn chain_id_u64(&self) -> ClientResult<u64> {
        parse_chain_id(&self.chain_id)
    }

    /// First RPC URL; reads go here.
    pub fn rpc_url(&self) -> ClientResult<&str> {
        self.rpc_urls
            .first()
            .map(String::as_str)
            .ok_or_else(|| ClientError::Config(format!("{} has no RPC URL", self.chain_name)))
    }

    pub fn explorer_url(&self) -> Option<&str> {
        self.block_explorer_urls.first().map(String::as_str)
    }
}

impl Default for NetworkDescriptor {
    fn default() -> Self {
        Self::camp_basecamp()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    pub address: Address,
}

impl ContractConfig {
    /// Block explorer page for the contract, when the network has an explorer.
    pub fn explorer_url(&self, network: &NetworkDescriptor) -> Option<String> {
        network.explorer_url().map(|base| {
            let base = base.trim_end_matches('/');
            format!("{}/address/{:?}", base, self.address)
        })
    }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONTRACT_ADDRESS
                .parse()
                .expect("built-in contract address is valid"),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub network: NetworkDescriptor,

    #[serde(default)]
    pub contract: ContractConfig,

    /// EIP-1193 wallet endpoint (JSON-RPC). Absent means no wallet provider.
    #[serde(default)]
    pub wallet_url: Option<String>,

    /// Confirmations to wait for on every write
    #[serde(default = "ClientConfig::default_confirmations")]
    pub confirmations: usize,

    /// HTTP timeout for RPC requests (seconds)
    #[serde(default = "ClientConfig::default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl ClientConfig {
    fn default_confirmations() -> usize { 1 }
    fn default_http_timeout_secs() -> u64 { 30 }

    /// Load from a TOML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        info!(path = %path.display(), network = %config.network.chain_name, "Loaded client config");
        Ok(config)
    }

    /// Load from `BALLOT_CONFIG` (or `ballot.toml`), apply env overrides, validate.
    pub fn from_env() -> ClientResult<Self> {
        let path =
            std::env::var("BALLOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_path_with_env(path)
    }

    /// Like [`ClientConfig::from_env`] with an explicit file path.
    pub fn from_path_with_env(path: impl AsRef<Path>) -> ClientResult<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> ClientResult<()> {
        if let Ok(url) = std::env::var("BALLOT_WALLET_URL") {
            let url = url.trim();
            self.wallet_url = if url.is_empty() { None } else { Some(url.to_string()) };
        }
        if let Ok(url) = std::env::var("BALLOT_RPC_URL") {
            // Override the read endpoint only; the list still goes to the wallet on add.
            self.network.rpc_urls.retain(|u| u != url.trim());
            self.network.rpc_urls.insert(0, url.trim().to_string());
        }
        if let Ok(addr) = std::env::var("BALLOT_CONTRACT_ADDRESS") {
            self.contract.address = parse_address(&addr)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> ClientResult<()> {
        self.network.chain_id_u64()?;
        if self.network.rpc_urls.is_empty() {
            return Err(ClientError::Config("network.rpc_urls must not be empty".into()));
        }
        for url in &self.network.rpc_urls {
            validate_http_url(url)?;
        }
        if let Some(url) = &self.wallet_url {
            validate_http_url(url)?;
        }
        if self.confirmations == 0 {
            return Err(ClientError::Config("confirmations must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: NetworkDescriptor::default(),
            contract: ContractConfig::default(),
            wallet_url: None,
            confirmations: Self::default_confirmations(),
            http_timeout_secs: Self::default_http_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_serializes_as_add_chain_parameter() {
        let value = serde_json::to_value(NetworkDescriptor::camp_basecamp()).unwrap();
        assert_eq!(
            value,
            json!({
                "chainId": "0x1CBC67C35A",
                "chainName": "Camp Network Basecamp",
                "nativeCurrency": {"name": "CAMP", "symbol": "CAMP", "decimals": 18},
                "rpcUrls": ["https://rpc.basecamp.t.raas.gelato.cloud"],
                "blockExplorerUrls": ["https://basecamp.cloud.blockscout.com/"]
            })
        );
    }

    #[test]
    fn chain_match_ignores_case() {
        let net = NetworkDescriptor::camp_basecamp();
        assert!(net.matches_chain("0x1cbc67c35a"));
        assert!(!net.matches_chain("0x1"));
        assert_eq!(net.chain_id_u64().unwrap(), 123_420_001_114);
    }

    #[test]
    fn contract_explorer_link() {
        let contract = ContractConfig::default();
        let url = contract.explorer_url(&NetworkDescriptor::default()).unwrap();
        assert_eq!(
            url,
            "https://basecamp.cloud.blockscout.com/address/0xd4270b6f0abcae9eee50f04e7d10a7286c7ded4f"
        );
    }

    #[test]
    fn defaults_validate() {
        ClientConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_confirmations_rejected() {
        let config = ClientConfig { confirmations: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }
}
