// tests/util.rs
// Shared test helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ballot_wallet::blockchain::traits::{CreatedElection, ElectionWriter};
use ballot_wallet::blockchain::{ElectionRecord, ProviderRpcError, WalletProvider};
use ballot_wallet::core::errors::{ClientError, ClientResult};
use ethers::types::{Address, TransactionReceipt, H256, U256};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub const CAMP_CHAIN_ID: &str = "0x1CBC67C35A";

pub fn account() -> Address {
    "0x742d35cc6634c0532925A3B8d400e8b78ffe4860".parse().unwrap()
}

/// In-memory EIP-1193 wallet. Each method answers from its own queue, in
/// order; every request is recorded.
#[derive(Default)]
pub struct ScriptedWallet {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, ProviderRpcError>>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, method: &str, value: Value) -> Self {
        self.push(method, Ok(value))
    }

    pub fn err(self, method: &str, code: i64, message: &str) -> Self {
        self.push(method, Err(ProviderRpcError::new(code, message)))
    }

    fn push(self, method: &str, response: Result<Value, ProviderRpcError>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(m, _)| m).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        self.calls.lock().unwrap().push((method.to_string(), params));
        self.responses
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ProviderRpcError::new(-32601, format!("{method} not scripted"))))
    }
}

/// Records every write; optionally fails the n-th `add_candidate`.
#[derive(Default)]
pub struct RecordingWriter {
    pub election_id: Option<U256>,
    pub fail_candidate_at: Option<usize>,
    pub log: Mutex<Vec<String>>,
}

impl RecordingWriter {
    pub fn new(election_id: u64) -> Self {
        Self { election_id: Some(U256::from(election_id)), ..Default::default() }
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

fn receipt(seq: usize) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: H256::from_low_u64_be(seq as u64 + 1),
        status: Some(1u64.into()),
        ..Default::default()
    }
}

#[async_trait]
impl ElectionWriter for RecordingWriter {
    async fn create_election(
        &self,
        title: &str,
        description: &str,
        duration_minutes: u64,
        start_delay_minutes: u64,
    ) -> ClientResult<CreatedElection> {
        let mut log = self.log.lock().unwrap();
        log.push(format!("create:{title}|{description}|{duration_minutes}|{start_delay_minutes}"));
        let election = self.election_id.map(|id| ElectionRecord {
            election_id: id,
            creator: account(),
            start_time: U256::zero(),
            end_time: U256::zero(),
            title: title.to_string(),
            description: description.to_string(),
            block_number: Some(1),
            transaction_hash: None,
        });
        Ok(CreatedElection { receipt: receipt(log.len()), election })
    }

    async fn add_candidate(&self, election_id: U256, name: &str) -> ClientResult<TransactionReceipt> {
        let mut log = self.log.lock().unwrap();
        let index = log.iter().filter(|l| l.starts_with("add:")).count();
        if self.fail_candidate_at == Some(index) {
            return Err(ClientError::TransactionFailed("addCandidate reverted: Not authorized".into()));
        }
        log.push(format!("add:{election_id}:{name}"));
        Ok(receipt(log.len()))
    }
}
