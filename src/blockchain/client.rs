// HTTP transport helpers shared by the wallet session and the contract client.

use ethers::providers::{Http, Middleware, Provider};
use ethers::types::U256;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::NetworkDescriptor;
use crate::core::errors::{ClientError, ClientResult};

/// Build a JSON-RPC provider over HTTP with a request timeout.
/// Honors `HTTPS_PROXY` / `HTTP_PROXY`.
pub fn http_provider(url: &str, timeout_secs: u64) -> ClientResult<Provider<Http>> {
    let url_clean = url.trim();
    let parsed_url = reqwest::Url::parse(url_clean).map_err(|e| {
        ClientError::Config(format!(
            "Invalid RPC URL '{}': {}. Please check ballot.toml or env vars.",
            url_clean, e
        ))
    })?;

    let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs));
    if let Ok(proxy) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("HTTP_PROXY")) {
        if let Ok(p) = reqwest::Proxy::all(proxy) {
            builder = builder.proxy(p);
        }
    }
    let client = builder
        .build()
        .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

    debug!(url = %parsed_url, timeout_secs, "HTTP provider ready");
    Ok(Provider::new(Http::new_with_client(parsed_url, client)))
}

/// Check that an RPC endpoint serves the expected chain.
///
/// Used for local-key signing, where there is no wallet to switch networks.
pub async fn ensure_rpc_chain<M: Middleware>(
    provider: &M,
    network: &NetworkDescriptor,
) -> ClientResult<()> {
    let expected = U256::from(network.chain_id_u64()?);
    let actual = provider.get_chainid().await.map_err(|e| {
        ClientError::TransactionFailed(format!(
            "Failed to get chain ID. This might be due to a network issue, firewall, or an invalid RPC URL: {}",
            e
        ))
    })?;

    // Ids beyond u64 are a mismatch too.
    if actual != expected {
        return Err(ClientError::WrongNetwork {
            expected: network.chain_name.clone(),
            actual: format!("0x{:x}", actual),
        });
    }
    info!("Connected to {} (Chain ID: {})", network.chain_name, actual);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::MockProvider;

    #[test]
    fn rejects_invalid_url() {
        assert!(matches!(http_provider("invalid url", 5), Err(ClientError::Config(_))));
    }

    #[test]
    fn builds_provider_for_local_node() {
        assert!(http_provider("http://127.0.0.1:8545", 5).is_ok());
    }

    #[tokio::test]
    async fn chain_check_passes_on_match() {
        let mock = MockProvider::new();
        mock.push::<U256, _>(U256::from(123_420_001_114u64)).unwrap();
        let provider = Provider::new(mock);
        ensure_rpc_chain(&provider, &NetworkDescriptor::camp_basecamp()).await.unwrap();
    }

    #[tokio::test]
    async fn chain_check_reports_wrong_network() {
        let mock = MockProvider::new();
        mock.push::<U256, _>(U256::from(1u64)).unwrap();
        let provider = Provider::new(mock);
        let err = ensure_rpc_chain(&provider, &NetworkDescriptor::camp_basecamp())
            .await
            .unwrap_err();
        match err {
            ClientError::WrongNetwork { actual, .. } => assert_eq!(actual, "0x1"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn chain_id_beyond_u64_is_a_mismatch() {
        let mock = MockProvider::new();
        mock.push::<U256, _>(U256::MAX).unwrap();
        let provider = Provider::new(mock);
        let err = ensure_rpc_chain(&provider, &NetworkDescriptor::camp_basecamp())
            .await
            .unwrap_err();
        match err {
            ClientError::WrongNetwork { actual, .. } => assert_eq!(actual, format!("0x{}", "f".repeat(64))),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
