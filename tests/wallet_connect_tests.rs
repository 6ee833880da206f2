mod util;

use ballot_wallet::blockchain::{ConnectionState, WalletProvider, WalletSession};
use ballot_wallet::core::config::NetworkDescriptor;
use ballot_wallet::core::errors::ClientError;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use util::{account, ScriptedWallet, CAMP_CHAIN_ID};

fn session(wallet: &Arc<ScriptedWallet>) -> WalletSession {
    let provider: Arc<dyn WalletProvider> = wallet.clone();
    WalletSession::new(Some(provider), NetworkDescriptor::camp_basecamp())
}

fn accounts() -> serde_json::Value {
    json!([format!("{:?}", account())])
}

#[tokio::test]
async fn connects_without_switch_on_matching_chain() {
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_requestAccounts", accounts())
            .ok("eth_chainId", json!("0x1cbc67c35a")),
    );
    let mut session = session(&wallet);

    let connected = session.connect().await.unwrap();

    assert_eq!(connected, account());
    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(session.account(), Some(account()));
    assert_eq!(wallet.methods(), vec!["eth_requestAccounts", "eth_chainId"]);
}

#[tokio::test]
async fn wrong_chain_switches_and_rereads() {
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_requestAccounts", accounts())
            .ok("eth_chainId", json!("0x1"))
            .ok("wallet_switchEthereumChain", json!(null))
            .ok("eth_chainId", json!(CAMP_CHAIN_ID)),
    );
    let mut session = session(&wallet);

    session.connect().await.unwrap();

    assert_eq!(
        wallet.methods(),
        vec!["eth_requestAccounts", "eth_chainId", "wallet_switchEthereumChain", "eth_chainId"]
    );
    let (_, params) = &wallet.calls()[2];
    assert_eq!(params, &json!([{ "chainId": CAMP_CHAIN_ID }]));
    assert_eq!(wallet.count("wallet_addEthereumChain"), 0);
}

#[tokio::test]
async fn unknown_chain_is_added_exactly_once() {
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_requestAccounts", accounts())
            .ok("eth_chainId", json!("0x1"))
            .err("wallet_switchEthereumChain", 4902, "Unrecognized chain ID")
            .ok("wallet_addEthereumChain", json!(null))
            .ok("eth_chainId", json!(CAMP_CHAIN_ID)),
    );
    let mut session = session(&wallet);

    session.connect().await.unwrap();

    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(wallet.count("wallet_switchEthereumChain"), 1);
    assert_eq!(wallet.count("wallet_addEthereumChain"), 1);
    let (_, params) = wallet
        .calls()
        .into_iter()
        .find(|(m, _)| m == "wallet_addEthereumChain")
        .unwrap();
    assert_eq!(params[0]["chainId"], json!(CAMP_CHAIN_ID));
    assert_eq!(params[0]["nativeCurrency"]["symbol"], json!("CAMP"));
    assert_eq!(params[0]["rpcUrls"][0], json!("https://rpc.basecamp.t.raas.gelato.cloud"));
}

#[tokio::test]
async fn internal_error_on_switch_also_falls_back_to_add() {
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_requestAccounts", accounts())
            .ok("eth_chainId", json!("0x1"))
            .err("wallet_switchEthereumChain", -32603, "Internal error")
            .ok("wallet_addEthereumChain", json!(null))
            .ok("eth_chainId", json!(CAMP_CHAIN_ID)),
    );
    let mut session = session(&wallet);

    session.connect().await.unwrap();
    assert_eq!(wallet.count("wallet_addEthereumChain"), 1);
}

#[tokio::test]
async fn failed_add_reports_network_add_failure() {
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_requestAccounts", accounts())
            .ok("eth_chainId", json!("0x1"))
            .err("wallet_switchEthereumChain", 4902, "Unrecognized chain ID")
            .err("wallet_addEthereumChain", -32000, "nope"),
    );
    let mut session = session(&wallet);

    let err = session.connect().await.unwrap_err();

    assert!(matches!(err, ClientError::NetworkAddFailed { .. }));
    assert_eq!(session.state(), ConnectionState::NetworkMismatch);
    assert_eq!(session.account(), None);
    assert_eq!(wallet.count("wallet_addEthereumChain"), 1);
}

#[tokio::test]
async fn chain_still_wrong_after_switch_is_a_mismatch() {
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_requestAccounts", accounts())
            .ok("eth_chainId", json!("0x1"))
            .ok("wallet_switchEthereumChain", json!(null))
            .ok("eth_chainId", json!("0x1")),
    );
    let mut session = session(&wallet);

    match session.connect().await.unwrap_err() {
        ClientError::WrongNetwork { expected, actual } => {
            assert_eq!(expected, "Camp Network Basecamp");
            assert_eq!(actual, "0x1");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(session.state(), ConnectionState::NetworkMismatch);
}

#[tokio::test]
async fn user_rejection_stops_before_network_check() {
    let wallet = Arc::new(ScriptedWallet::new().err(
        "eth_requestAccounts",
        4001,
        "User rejected the request.",
    ));
    let mut session = session(&wallet);

    let err = session.connect().await.unwrap_err();

    assert!(matches!(err, ClientError::ConnectionRejected));
    assert_eq!(session.state(), ConnectionState::Rejected);
    assert_eq!(wallet.methods(), vec!["eth_requestAccounts"]);
}

#[tokio::test]
async fn pending_request_is_reported() {
    let wallet = Arc::new(ScriptedWallet::new().err(
        "eth_requestAccounts",
        -32002,
        "Already processing eth_requestAccounts",
    ));
    let mut session = session(&wallet);

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, ClientError::ConnectionPending));
    assert!(err.is_connection_error());
}

#[tokio::test]
async fn empty_account_list_counts_as_rejection() {
    let wallet = Arc::new(ScriptedWallet::new().ok("eth_requestAccounts", json!([])));
    let mut session = session(&wallet);

    assert!(matches!(session.connect().await, Err(ClientError::ConnectionRejected)));
    assert_eq!(wallet.count("eth_chainId"), 0);
}

#[tokio::test]
async fn other_wallet_errors_pass_through_verbatim() {
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_requestAccounts", accounts())
            .err("eth_chainId", -32000, "header not found"),
    );
    let mut session = session(&wallet);

    let err = session.connect().await.unwrap_err();

    assert_eq!(err.to_string(), "header not found (code -32000)");
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(!session.state().is_terminal_failure());
}

#[tokio::test]
async fn disconnect_clears_account() {
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_requestAccounts", accounts())
            .ok("eth_chainId", json!(CAMP_CHAIN_ID)),
    );
    let mut session = session(&wallet);
    session.connect().await.unwrap();

    session.disconnect();

    assert_eq!(session.account(), None);
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn current_account_reads_without_prompting() {
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_accounts", accounts())
            .ok("eth_accounts", json!([]))
            .err("eth_accounts", -32603, "disconnected"),
    );
    let session = session(&wallet);

    assert_eq!(session.current_account().await, Some(account()));
    assert_eq!(session.current_account().await, None);
    assert_eq!(session.current_account().await, None);
    assert_eq!(wallet.count("eth_requestAccounts"), 0);
}

#[tokio::test]
async fn chain_still_wrong_after_add_is_a_mismatch() {
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_requestAccounts", accounts())
            .ok("eth_chainId", json!("0x1"))
            .err("wallet_switchEthereumChain", 4902, "Unrecognized chain ID")
            .ok("wallet_addEthereumChain", json!(null))
            .ok("eth_chainId", json!("0x1")),
    );
    let mut session = session(&wallet);

    match session.connect().await.unwrap_err() {
        ClientError::WrongNetwork { actual, .. } => assert_eq!(actual, "0x1"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(session.state(), ConnectionState::NetworkMismatch);
    assert_eq!(session.account(), None);
    assert_eq!(wallet.count("wallet_addEthereumChain"), 1);
    assert_eq!(wallet.count("wallet_switchEthereumChain"), 1);
}

#[tokio::test]
async fn malformed_account_is_a_decode_failure() {
    let wallet = Arc::new(ScriptedWallet::new().ok("eth_requestAccounts", json!(["not-an-address"])));
    let mut session = session(&wallet);

    assert!(matches!(session.connect().await, Err(ClientError::Decode(_))));
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(wallet.count("eth_chainId"), 0);
}

#[tokio::test]
async fn refresh_follows_account_and_chain_changes() {
    let other = "0xD4270b6F0aBCAE9EEE50f04E7d10a7286c7DeD4F";
    let wallet = Arc::new(
        ScriptedWallet::new()
            .ok("eth_requestAccounts", accounts())
            .ok("eth_chainId", json!(CAMP_CHAIN_ID))
            .ok("eth_accounts", json!([other]))
            .ok("eth_chainId", json!(CAMP_CHAIN_ID))
            .ok("eth_accounts", json!([other]))
            .ok("eth_chainId", json!("0x1"))
            .ok("eth_accounts", json!([])),
    );
    let mut session = session(&wallet);
    session.connect().await.unwrap();

    assert_eq!(session.refresh().await.unwrap(), ConnectionState::Connected);
    assert_eq!(session.account(), Some(other.parse().unwrap()));

    assert_eq!(session.refresh().await.unwrap(), ConnectionState::NetworkMismatch);
    assert_eq!(session.account(), Some(other.parse().unwrap()));

    assert_eq!(session.refresh().await.unwrap(), ConnectionState::Disconnected);
    assert_eq!(session.account(), None);
    assert_eq!(wallet.count("eth_requestAccounts"), 1);
    assert_eq!(wallet.count("wallet_switchEthereumChain"), 0);
}

#[tokio::test]
async fn refresh_without_provider_fails() {
    let mut session = WalletSession::new(None, NetworkDescriptor::camp_basecamp());
    assert!(matches!(session.refresh().await, Err(ClientError::ProviderMissing)));
    assert_eq!(session.state(), ConnectionState::ProviderMissing);
}
