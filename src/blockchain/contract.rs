use async_trait::async_trait;
use ethers::abi::Detokenize;
use ethers::contract::{ContractCall, ContractError};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Filter, Log, TransactionReceipt, U256, U64};
use futures::StreamExt;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::blockchain::abi::ElectionVoting;
use crate::blockchain::client::{ensure_rpc_chain, http_provider};
use crate::blockchain::events::{
    self, candidate_filter, contract_filter, creator_filter, vote_filter, CandidateRecord,
    ContractEvent, ElectionRecord, LogRange, VoteRecord,
};
use crate::blockchain::traits::{CreatedElection, ElectionWriter};
use crate::core::config::ClientConfig;
use crate::core::errors::{ClientError, ClientResult};

pub type LocalSigner = SignerMiddleware<Provider<Http>, LocalWallet>;

/// On-chain election state as returned by the `elections` accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionDetails {
    pub start_time: U256,
    pub end_time: U256,
    pub finalized: bool,
    pub exists: bool,
    pub creator: Address,
}

/// Client for the election contract.
///
/// `S` submits transactions (wallet endpoint with the connected account as
/// default sender, or a local key); `R` is a plain read-only connection to the
/// network's RPC endpoint, used for every view call and log query.
#[derive(Clone)]
pub struct ElectionClient<S: Middleware, R: Middleware = Provider<Http>> {
    contract: Address,
    signer: Arc<S>,
    reader: Arc<R>,
    writer_contract: ElectionVoting<S>,
    reader_contract: ElectionVoting<R>,
    confirmations: usize,
}

impl<S, R> ElectionClient<S, R>
where
    S: Middleware + 'static,
    R: Middleware + 'static,
{
    pub fn new(contract: Address, signer: Arc<S>, reader: Arc<R>) -> Self {
        Self {
            contract,
            writer_contract: ElectionVoting::new(contract, Arc::clone(&signer)),
            reader_contract: ElectionVoting::new(contract, Arc::clone(&reader)),
            signer,
            reader,
            confirmations: 1,
        }
    }

    pub fn with_confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    /// Account transactions are sent from, if the signer has one.
    pub fn sender(&self) -> Option<Address> {
        self.signer.default_sender()
    }

    async fn submit<D: Detokenize>(
        &self,
        op: &'static str,
        call: ContractCall<S, D>,
    ) -> ClientResult<TransactionReceipt> {
        let pending = call.send().await.map_err(|e| contract_failure(op, e))?;
        let tx_hash = pending.tx_hash();
        info!(op, tx_hash = ?tx_hash, "Transaction sent, waiting for confirmation");

        let receipt = pending
            .confirmations(self.confirmations)
            .await
            .map_err(|e| ClientError::TransactionFailed(format!("{op}: {e}")))?
            .ok_or(ClientError::TransactionDropped(tx_hash))?;

        if receipt.status == Some(U64::zero()) {
            return Err(ClientError::TransactionFailed(format!(
                "{op}: transaction {tx_hash:?} reverted"
            )));
        }
        info!(op, tx_hash = ?tx_hash, block = ?receipt.block_number, "Transaction confirmed");
        Ok(receipt)
    }

    async fn view<D: Detokenize>(&self, op: &'static str, call: ContractCall<R, D>) -> ClientResult<D> {
        debug!(op, "contract read");
        call.call().await.map_err(|e| contract_failure(op, e))
    }

    async fn logs(&self, filter: &Filter) -> ClientResult<Vec<Log>> {
        let logs = self
            .reader
            .get_logs(filter)
            .await
            .map_err(|e| ClientError::TransactionFailed(format!("eth_getLogs: {e}")))?;
        debug!(count = logs.len(), "fetched logs");
        Ok(logs)
    }

    // ---- writes ----

    /// Create an election. The election id comes from the `ElectionCreated`
    /// event in the receipt; `election` is `None` if the receipt lacks it.
    pub async fn create_election(
        &self,
        title: &str,
        description: &str,
        duration_minutes: u64,
        start_delay_minutes: u64,
    ) -> ClientResult<CreatedElection> {
        info!(title, duration_minutes, start_delay_minutes, "Creating election");
        let call = self.writer_contract.create_election(
            title.to_string(),
            description.to_string(),
            U256::from(duration_minutes),
            U256::from(start_delay_minutes),
        );
        let receipt = self.submit("createElection", call).await?;
        let election = events::find_election_created(&receipt.logs);
        match &election {
            Some(e) => info!(election_id = %e.election_id, creator = ?e.creator, "Election created"),
            None => debug!("ElectionCreated not found in receipt logs"),
        }
        Ok(CreatedElection { receipt, election })
    }

    pub async fn add_candidate(&self, election_id: U256, name: &str) -> ClientResult<TransactionReceipt> {
        info!(election_id = %election_id, name, "Adding candidate");
        let call = self.writer_contract.add_candidate(election_id, name.to_string());
        self.submit("addCandidate", call).await
    }

    pub async fn cast_vote(&self, election_id: U256, candidate_id: U256) -> ClientResult<TransactionReceipt> {
        info!(election_id = %election_id, candidate_id = %candidate_id, "Casting vote");
        let call = self.writer_contract.vote(election_id, candidate_id);
        self.submit("vote", call).await
    }

    pub async fn finalize_election(&self, election_id: U256) -> ClientResult<TransactionReceipt> {
        info!(election_id = %election_id, "Finalizing election");
        let call = self.writer_contract.finalize_election(election_id);
        self.submit("finalizeElection", call).await
    }

    /// Admin only, enforced by the contract.
    pub async fn register_voter(&self, voter: Address) -> ClientResult<TransactionReceipt> {
        info!(voter = ?voter, "Registering voter");
        let call = self.writer_contract.register_voter(voter);
        self.submit("registerVoter", call).await
    }

    /// Admin only, enforced by the contract.
    pub async fn transfer_admin(&self, new_admin: Address) -> ClientResult<TransactionReceipt> {
        info!(new_admin = ?new_admin, "Transferring admin");
        let call = self.writer_contract.transfer_admin(new_admin);
        let receipt = self.submit("transferAdmin", call).await?;
        info!(new_admin = ?new_admin, "Admin transferred");
        Ok(receipt)
    }

    // ---- reads ----

    pub async fn election_status(&self, election_id: U256) -> ClientResult<String> {
        self.view("getElectionStatus", self.reader_contract.get_election_status(election_id)).await
    }

    pub async fn election_details(&self, election_id: U256) -> ClientResult<ElectionDetails> {
        let (start_time, end_time, finalized, exists, creator) =
            self.view("elections", self.reader_contract.elections(election_id)).await?;
        Ok(ElectionDetails { start_time, end_time, finalized, exists, creator })
    }

    pub async fn election_creator(&self, election_id: U256) -> ClientResult<Address> {
        self.view("getElectionCreator", self.reader_contract.get_election_creator(election_id)).await
    }

    pub async fn has_voted(&self, election_id: U256, voter: Address) -> ClientResult<bool> {
        self.view("hasVoterVoted", self.reader_contract.has_voter_voted(election_id, voter)).await
    }

    pub async fn is_registered(&self, voter: Address) -> ClientResult<bool> {
        self.view("isRegistered", self.reader_contract.is_registered(voter)).await
    }

    pub async fn is_valid_candidate(&self, election_id: U256, candidate_id: U256) -> ClientResult<bool> {
        self.view("validCandidate", self.reader_contract.valid_candidate(election_id, candidate_id))
            .await
    }

    pub async fn candidate_count(&self, election_id: U256) -> ClientResult<U256> {
        self.view("getCandidateCount", self.reader_contract.get_candidate_count(election_id)).await
    }

    pub async fn total_elections(&self) -> ClientResult<U256> {
        self.view("getTotalElections", self.reader_contract.get_total_elections()).await
    }

    pub async fn admin(&self) -> ClientResult<Address> {
        self.view("admin", self.reader_contract.admin()).await
    }

    // ---- role checks (informational; the contract is the authority) ----

    pub async fn is_admin(&self, account: Address) -> ClientResult<bool> {
        let admin = self.admin().await?;
        debug!(account = ?account, admin = ?admin, "admin check");
        Ok(admin == account)
    }

    pub async fn is_creator(&self, election_id: U256, account: Address) -> ClientResult<bool> {
        let creator = self.election_creator(election_id).await?;
        debug!(account = ?account, creator = ?creator, "creator check");
        Ok(creator == account)
    }

    /// Admin or creator of the election; mirrors what the contract accepts for
    /// `addCandidate` and `finalizeElection`.
    pub async fn can_manage(&self, election_id: U256, account: Address) -> ClientResult<bool> {
        if self.is_admin(account).await? {
            return Ok(true);
        }
        self.is_creator(election_id, account).await
    }

    // ---- event replay ----

    pub async fn election_votes(&self, election_id: U256, range: LogRange) -> ClientResult<Vec<VoteRecord>> {
        let logs = self.logs(&range.apply(vote_filter(self.contract, election_id))).await?;
        Ok(events::votes_from_logs(&logs))
    }

    pub async fn election_candidates(
        &self,
        election_id: U256,
        range: LogRange,
    ) -> ClientResult<Vec<CandidateRecord>> {
        let logs = self.logs(&range.apply(candidate_filter(self.contract, election_id))).await?;
        Ok(events::candidates_from_logs(&logs))
    }

    pub async fn elections_by_creator(
        &self,
        creator: Address,
        range: LogRange,
    ) -> ClientResult<Vec<ElectionRecord>> {
        let logs = self.logs(&range.apply(creator_filter(self.contract, creator))).await?;
        Ok(events::elections_from_logs(&logs))
    }

    /// Every event the contract emitted in `range`.
    pub async fn past_events(&self, range: LogRange) -> ClientResult<Vec<ContractEvent>> {
        let logs = self.logs(&range.apply(contract_filter(self.contract))).await?;
        Ok(events::events_from_logs(&logs))
    }

    pub async fn vote_tally(&self, election_id: U256) -> ClientResult<BTreeMap<U256, u64>> {
        let votes = self.election_votes(election_id, LogRange::default()).await?;
        Ok(events::tally_votes(&votes))
    }

    /// Poll for new votes and hand each one to `on_vote` until the filter stream ends.
    pub async fn follow_votes<F>(&self, election_id: U256, on_vote: F) -> ClientResult<()>
    where
        F: FnMut(VoteRecord) + Send,
    {
        info!(election_id = %election_id, "Following votes");
        self.follow(vote_filter(self.contract, election_id), events::decode_vote, on_vote).await
    }

    /// Like [`ElectionClient::follow_votes`], for every event the contract emits.
    pub async fn follow_events<F>(&self, on_event: F) -> ClientResult<()>
    where
        F: FnMut(ContractEvent) + Send,
    {
        info!(contract = ?self.contract, "Following contract events");
        self.follow(contract_filter(self.contract), events::decode_event, on_event).await
    }

    async fn follow<T, F>(
        &self,
        filter: Filter,
        decode: fn(&Log) -> Option<T>,
        mut on_item: F,
    ) -> ClientResult<()>
    where
        F: FnMut(T) + Send,
    {
        let watcher = self
            .reader
            .watch(&filter)
            .await
            .map_err(|e| ClientError::TransactionFailed(format!("eth_newFilter: {e}")))?;
        let mut stream = Box::pin(watcher);
        while let Some(log) = stream.next().await {
            match decode(&log) {
                Some(item) => on_item(item),
                None => debug!(tx_hash = ?log.transaction_hash, "skipping undecodable log"),
            }
        }
        Ok(())
    }
}

impl ElectionClient<Provider<Http>, Provider<Http>> {
    /// Sign through the wallet endpoint as `account` (a connected session's account).
    pub fn for_wallet(config: &ClientConfig, account: Address) -> ClientResult<Self> {
        let wallet_url = config.wallet_url.as_deref().ok_or(ClientError::ProviderMissing)?;
        let signer = http_provider(wallet_url, config.http_timeout_secs)?.with_sender(account);
        let reader = http_provider(config.network.rpc_url()?, config.http_timeout_secs)?;
        Ok(Self::new(config.contract.address, Arc::new(signer), Arc::new(reader))
            .with_confirmations(config.confirmations))
    }

    /// Reads only; writes through this client have no sender.
    pub fn read_only(config: &ClientConfig) -> ClientResult<Self> {
        let reader = Arc::new(http_provider(config.network.rpc_url()?, config.http_timeout_secs)?);
        Ok(Self::new(config.contract.address, Arc::clone(&reader), reader)
            .with_confirmations(config.confirmations))
    }
}

impl ElectionClient<LocalSigner, Provider<Http>> {
    /// Sign with a local private key against the network's RPC endpoint.
    pub async fn for_local_key(config: &ClientConfig, private_key: &[u8]) -> ClientResult<Self> {
        if private_key.len() != 32 {
            return Err(ClientError::Config("Private key must be 32 bytes".into()));
        }
        let chain_id = config.network.chain_id_u64()?;
        let wallet = LocalWallet::from_bytes(private_key)
            .map_err(|e| ClientError::Config(format!("Invalid private key: {e}")))?
            .with_chain_id(chain_id);

        let provider = http_provider(config.network.rpc_url()?, config.http_timeout_secs)?;
        ensure_rpc_chain(&provider, &config.network).await?;
        info!(account = ?wallet.address(), "Using local signer");

        let signer = SignerMiddleware::new(provider.clone(), wallet);
        Ok(Self::new(config.contract.address, Arc::new(signer), Arc::new(provider))
            .with_confirmations(config.confirmations))
    }
}

#[async_trait]
impl<S, R> ElectionWriter for ElectionClient<S, R>
where
    S: Middleware + 'static,
    R: Middleware + 'static,
{
    async fn create_election(
        &self,
        title: &str,
        description: &str,
        duration_minutes: u64,
        start_delay_minutes: u64,
    ) -> ClientResult<CreatedElection> {
        ElectionClient::create_election(self, title, description, duration_minutes, start_delay_minutes)
            .await
    }

    async fn add_candidate(&self, election_id: U256, name: &str) -> ClientResult<TransactionReceipt> {
        ElectionClient::add_candidate(self, election_id, name).await
    }
}

/// Surface revert reasons when the node returned one.
fn contract_failure<M: Middleware>(op: &str, err: ContractError<M>) -> ClientError {
    match err.decode_revert::<String>() {
        Some(reason) => ClientError::TransactionFailed(format!("{op} reverted: {reason}")),
        None => ClientError::TransactionFailed(format!("{op}: {err}")),
    }
}
