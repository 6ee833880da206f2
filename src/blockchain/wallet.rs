//! Wallet session: connection protocol against an EIP-1193 wallet.
//!
//! `disconnected -> requesting_accounts -> checking_network ->
//! {switching_network | adding_network} -> connected`, with terminal failures
//! `rejected`, `network_mismatch` and `provider_missing`. One switch-or-add
//! fallback, no retries.

use async_trait::async_trait;
use ethers::providers::{JsonRpcClient, Provider, ProviderError, RpcError};
use ethers::types::Address;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::blockchain::client::http_provider;
use crate::blockchain::traits::{ProviderRpcError, WalletProvider, NO_RPC_CODE};
use crate::core::config::{ClientConfig, NetworkDescriptor};
use crate::core::errors::{ClientError, ClientResult};

#[async_trait]
impl<P> WalletProvider for Provider<P>
where
    P: JsonRpcClient + 'static,
{
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        Provider::<P>::request::<Value, Value>(self, method, params)
            .await
            .map_err(|e| rpc_error_from(&e))
    }
}

/// Keep the wallet's JSON-RPC error code when there is one.
fn rpc_error_from(err: &ProviderError) -> ProviderRpcError {
    match err.as_error_response() {
        Some(resp) => ProviderRpcError {
            code: resp.code,
            message: resp.message.clone(),
            data: resp.data.clone(),
        },
        None => ProviderRpcError::new(NO_RPC_CODE, err.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    RequestingAccounts,
    CheckingNetwork,
    SwitchingNetwork,
    AddingNetwork,
    Connected,
    Rejected,
    NetworkMismatch,
    ProviderMissing,
}

impl ConnectionState {
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            ConnectionState::Rejected
                | ConnectionState::NetworkMismatch
                | ConnectionState::ProviderMissing
        )
    }

    fn after_failure(err: &ClientError) -> Self {
        match err {
            ClientError::ProviderMissing => ConnectionState::ProviderMissing,
            ClientError::ConnectionRejected | ClientError::ConnectionPending => {
                ConnectionState::Rejected
            }
            ClientError::WrongNetwork { .. } | ClientError::NetworkAddFailed { .. } => {
                ConnectionState::NetworkMismatch
            }
            _ => ConnectionState::Disconnected,
        }
    }
}

/// One wallet session per page/process. Operations that need the connected
/// account take it from here instead of re-querying a global provider.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    network: NetworkDescriptor,
    state: ConnectionState,
    account: Option<Address>,
}

impl WalletSession {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, network: NetworkDescriptor) -> Self {
        Self { provider, network, state: ConnectionState::Disconnected, account: None }
    }

    /// Session over the configured wallet endpoint, or without a provider when
    /// none is configured.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let provider = match config.wallet_url.as_deref() {
            Some(url) => {
                let wallet = http_provider(url, config.http_timeout_secs)?;
                Some(Arc::new(wallet) as Arc<dyn WalletProvider>)
            }
            None => None,
        };
        Ok(Self::new(provider, config.network.clone()))
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn disconnect(&mut self) {
        self.account = None;
        self.transition(ConnectionState::Disconnected);
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!(from = ?self.state, to = ?next, "wallet session state");
        self.state = next;
    }

    /// Connect the wallet and make sure it is on the required network.
    /// Returns the first account the wallet exposes.
    pub async fn connect(&mut self) -> ClientResult<Address> {
        let provider = match &self.provider {
            Some(p) => Arc::clone(p),
            None => {
                self.transition(ConnectionState::ProviderMissing);
                return Err(ClientError::ProviderMissing);
            }
        };

        match self.run_connect(provider.as_ref()).await {
            Ok(account) => {
                self.account = Some(account);
                self.transition(ConnectionState::Connected);
                info!(account = ?account, network = %self.network.chain_name, "Connected successfully");
                Ok(account)
            }
            Err(err) => {
                let err = translate_connect_error(err);
                self.account = None;
                self.transition(ConnectionState::after_failure(&err));
                warn!(error = %err, "Connection error");
                Err(err)
            }
        }
    }

    async fn run_connect(&mut self, provider: &dyn WalletProvider) -> ClientResult<Address> {
        self.transition(ConnectionState::RequestingAccounts);
        let accounts = parse_accounts(provider.request("eth_requestAccounts", json!([])).await?)?;
        let account = *accounts.first().ok_or(ClientError::ConnectionRejected)?;

        self.transition(ConnectionState::CheckingNetwork);
        let current = read_chain_id(provider).await?;
        debug!(current = %current, target = %self.network.chain_id, "checking network");
        if self.network.matches_chain(&current) {
            return Ok(account);
        }

        info!(current = %current, target = %self.network.chain_id, "Wrong network, switching");
        self.switch_or_add(provider).await?;

        let after = read_chain_id(provider).await?;
        if !self.network.matches_chain(&after) {
            return Err(ClientError::WrongNetwork {
                expected: self.network.chain_name.clone(),
                actual: after,
            });
        }
        Ok(account)
    }

    async fn switch_or_add(&mut self, provider: &dyn WalletProvider) -> ClientResult<()> {
        self.transition(ConnectionState::SwitchingNetwork);
        let params = json!([{ "chainId": self.network.chain_id }]);
        match provider.request("wallet_switchEthereumChain", params).await {
            Ok(_) => {
                info!(network = %self.network.chain_name, "Switched network");
                Ok(())
            }
            Err(switch_err) if switch_err.is_unrecognized_chain() => {
                debug!(error = %switch_err, "network unknown to wallet, adding it");
                self.transition(ConnectionState::AddingNetwork);
                let params = json!([serde_json::to_value(&self.network)?]);
                provider
                    .request("wallet_addEthereumChain", params)
                    .await
                    .map_err(|source| ClientError::NetworkAddFailed {
                        network: self.network.chain_name.clone(),
                        source,
                    })?;
                info!(network = %self.network.chain_name, "Network added");
                Ok(())
            }
            Err(switch_err) => Err(switch_err.into()),
        }
    }

    /// Re-read the wallet's account and chain after the user may have changed
    /// either. No account means disconnected; a foreign chain keeps the
    /// account but leaves the session in `network_mismatch`.
    pub async fn refresh(&mut self) -> ClientResult<ConnectionState> {
        let provider = match &self.provider {
            Some(p) => Arc::clone(p),
            None => {
                self.account = None;
                self.transition(ConnectionState::ProviderMissing);
                return Err(ClientError::ProviderMissing);
            }
        };

        let accounts = parse_accounts(provider.request("eth_accounts", json!([])).await?)?;
        let Some(account) = accounts.first().copied() else {
            if self.account.take().is_some() {
                info!("Wallet disconnected");
            }
            self.transition(ConnectionState::Disconnected);
            return Ok(self.state);
        };
        if self.account != Some(account) {
            info!(previous = ?self.account, account = ?account, "Account changed");
            self.account = Some(account);
        }

        let chain = read_chain_id(provider.as_ref()).await?;
        if self.network.matches_chain(&chain) {
            self.transition(ConnectionState::Connected);
        } else {
            warn!(chain = %chain, target = %self.network.chain_id, "Wallet left the election network");
            self.transition(ConnectionState::NetworkMismatch);
        }
        Ok(self.state)
    }

    /// Already-authorized account, without prompting. Errors read as "no account".
    pub async fn current_account(&self) -> Option<Address> {
        let provider = self.provider.as_ref()?;
        let accounts = match provider.request("eth_accounts", json!([])).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Error getting account");
                return None;
            }
        };
        match parse_accounts(accounts) {
            Ok(list) => list.into_iter().next(),
            Err(e) => {
                warn!(error = %e, "Error getting account");
                None
            }
        }
    }
}

/// Map the well-known wallet codes to descriptive connection errors.
fn translate_connect_error(err: ClientError) -> ClientError {
    match err {
        ClientError::Provider(e) if e.is_user_rejection() => ClientError::ConnectionRejected,
        ClientError::Provider(e) if e.is_pending_request() => ClientError::ConnectionPending,
        other => other,
    }
}

fn parse_accounts(value: Value) -> ClientResult<Vec<Address>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| ClientError::Decode(format!("accounts: {e}")))
}

async fn read_chain_id(provider: &dyn WalletProvider) -> ClientResult<String> {
    let value = provider.request("eth_chainId", json!([])).await?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ClientError::Decode(format!("eth_chainId returned {value}")))
}
