use ethers::types::H256;
use thiserror::Error;

use crate::blockchain::traits::ProviderRpcError;

/// Errors surfaced by the wallet session and the election contract client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No wallet endpoint is configured, so there is nothing to connect to.
    #[error("No wallet provider found. Configure a wallet endpoint to use this client.")]
    ProviderMissing,

    #[error("Connection rejected. Please approve the connection in your wallet.")]
    ConnectionRejected,

    #[error("Connection request pending. Please check your wallet.")]
    ConnectionPending,

    #[error("Please switch to {expected} in your wallet (active chain: {actual})")]
    WrongNetwork { expected: String, actual: String },

    #[error("Failed to add {network}. Please add it manually in your wallet.")]
    NetworkAddFailed {
        network: String,
        #[source]
        source: ProviderRpcError,
    },

    /// Any other wallet provider failure, passed through verbatim.
    #[error(transparent)]
    Provider(#[from] ProviderRpcError),

    /// Contract call or transaction failure (reverts, RPC errors, failed receipts).
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction {0:?} was dropped before it was confirmed")]
    TransactionDropped(H256),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Connection-stage failures the user can resolve in their wallet.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ClientError::ProviderMissing
                | ClientError::ConnectionRejected
                | ClientError::ConnectionPending
                | ClientError::WrongNetwork { .. }
                | ClientError::NetworkAddFailed { .. }
        )
    }

    /// Short machine-readable tag, used by the CLI when printing failures.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::ProviderMissing => "provider_missing",
            ClientError::ConnectionRejected => "connection_rejected",
            ClientError::ConnectionPending => "connection_pending",
            ClientError::WrongNetwork { .. } => "wrong_network",
            ClientError::NetworkAddFailed { .. } => "network_add_failed",
            ClientError::Provider(_)
            | ClientError::TransactionFailed(_)
            | ClientError::TransactionDropped(_) => "transaction_failed",
            ClientError::InvalidAddress(_) => "invalid_address",
            ClientError::Config(_) => "config",
            ClientError::Decode(_) => "decode",
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
