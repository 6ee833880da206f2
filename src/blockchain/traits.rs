use async_trait::async_trait;
use ethers::types::{TransactionReceipt, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::blockchain::events::ElectionRecord;
use crate::core::errors::ClientResult;

/// User rejected the request.
pub const USER_REJECTED: i64 = 4001;
/// A request of the same kind is already waiting for the user.
pub const REQUEST_PENDING: i64 = -32002;
/// The wallet does not know the requested chain.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// Generic internal error; some wallets report unknown chains this way on switch.
pub const INTERNAL_ERROR: i64 = -32603;
/// Used for failures that never reached the wallet (transport, decoding).
pub const NO_RPC_CODE: i64 = 0;

/// Error object returned by an EIP-1193 `request` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message} (code {code})")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED
    }

    pub fn is_pending_request(&self) -> bool {
        self.code == REQUEST_PENDING
    }

    /// True for the two codes wallets use when a switch targets an unknown chain.
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == UNRECOGNIZED_CHAIN || self.code == INTERNAL_ERROR
    }
}

/// The request surface of a wallet (EIP-1193).
///
/// The session only needs `request`; account and chain change notifications are
/// observed by re-reading `eth_accounts` / `eth_chainId` in `WalletSession::refresh`.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError>;
}

/// State-changing calls needed to publish an election.
///
/// Each call returns only after its transaction is confirmed, which is what lets
/// [`crate::ballot::publish`] order dependent writes without timed delays.
#[async_trait]
pub trait ElectionWriter: Send + Sync {
    async fn create_election(
        &self,
        title: &str,
        description: &str,
        duration_minutes: u64,
        start_delay_minutes: u64,
    ) -> ClientResult<CreatedElection>;

    async fn add_candidate(&self, election_id: U256, name: &str)
        -> ClientResult<TransactionReceipt>;
}

/// Outcome of `createElection`: the receipt, plus the decoded `ElectionCreated`
/// event when the receipt carried one.
#[derive(Debug, Clone)]
pub struct CreatedElection {
    pub receipt: TransactionReceipt,
    pub election: Option<ElectionRecord>,
}

impl CreatedElection {
    pub fn election_id(&self) -> Option<U256> {
        self.election.as_ref().map(|e| e.election_id)
    }
}
