//! Read model over the contract's event log.
//!
//! Candidate lists, vote tallies and per-creator election lists are not
//! queryable on the contract; they are rebuilt by replaying logs. Everything in
//! this module is transport-free: filters are built here, fetched elsewhere,
//! and the resulting logs are folded by pure functions.

use std::collections::BTreeMap;

use ethers::abi::RawLog;
use ethers::contract::{EthEvent, EthLogDecode};
use ethers::types::{Address, BlockNumber, Filter, Log, Topic, ValueOrArray, H256, U256};
use serde::Serialize;

use crate::blockchain::abi::{
    CandidateAddedFilter, ElectionCreatedFilter, ElectionVotingEvents, VoteCastFilter,
};

/// Block range for log queries. Defaults to genesis..latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRange {
    pub from: BlockNumber,
    pub to: BlockNumber,
}

impl LogRange {
    pub fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self {
            from: from.map(BlockNumber::from).unwrap_or(BlockNumber::Number(0u64.into())),
            to: to.map(BlockNumber::from).unwrap_or(BlockNumber::Latest),
        }
    }

    pub fn apply(&self, filter: Filter) -> Filter {
        filter.from_block(self.from).to_block(self.to)
    }
}

impl Default for LogRange {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionRecord {
    pub election_id: U256,
    pub creator: Address,
    pub start_time: U256,
    pub end_time: U256,
    pub title: String,
    pub description: String,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<H256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRecord {
    pub election_id: U256,
    pub candidate_id: U256,
    pub name: String,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<H256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteRecord {
    pub election_id: U256,
    pub voter: Address,
    pub candidate_id: U256,
    pub timestamp: U256,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<H256>,
}

/// Any decoded contract event together with where it was emitted.
#[derive(Debug, Clone)]
pub struct ContractEvent {
    pub event: ElectionVotingEvents,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<H256>,
}

impl ContractEvent {
    /// Solidity event name.
    pub fn name(&self) -> &'static str {
        match &self.event {
            ElectionVotingEvents::CandidateAddedFilter(_) => "CandidateAdded",
            ElectionVotingEvents::ElectionCreatedFilter(_) => "ElectionCreated",
            ElectionVotingEvents::ElectionFinalizedFilter(_) => "ElectionFinalized",
            ElectionVotingEvents::VoteCastFilter(_) => "VoteCast",
            ElectionVotingEvents::VoterRegisteredFilter(_) => "VoterRegistered",
        }
    }
}

/// Indexed `uint256` topic value.
pub fn uint_topic(value: U256) -> Topic {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    ValueOrArray::Value(Some(H256::from(bytes)))
}

/// Indexed `address` topic value (left-padded to 32 bytes).
pub fn address_topic(address: Address) -> Topic {
    ValueOrArray::Value(Some(H256::from(address)))
}

fn event_topic(signature: H256) -> Topic {
    ValueOrArray::Value(Some(signature))
}

pub fn vote_filter(contract: Address, election_id: U256) -> Filter {
    Filter::new()
        .address(contract)
        .topic0(event_topic(VoteCastFilter::signature()))
        .topic1(uint_topic(election_id))
}

pub fn candidate_filter(contract: Address, election_id: U256) -> Filter {
    Filter::new()
        .address(contract)
        .topic0(event_topic(CandidateAddedFilter::signature()))
        .topic1(uint_topic(election_id))
}

pub fn creator_filter(contract: Address, creator: Address) -> Filter {
    Filter::new()
        .address(contract)
        .topic0(event_topic(ElectionCreatedFilter::signature()))
        .topic2(address_topic(creator))
}

pub fn contract_filter(contract: Address) -> Filter {
    Filter::new().address(contract)
}

fn raw(log: &Log) -> RawLog {
    RawLog { topics: log.topics.clone(), data: log.data.to_vec() }
}

fn block_of(log: &Log) -> Option<u64> {
    log.block_number.map(|b| b.as_u64())
}

pub fn decode_vote(log: &Log) -> Option<VoteRecord> {
    let ev = <VoteCastFilter as EthEvent>::decode_log(&raw(log)).ok()?;
    Some(VoteRecord {
        election_id: ev.election_id,
        voter: ev.voter,
        candidate_id: ev.candidate_id,
        timestamp: ev.timestamp,
        block_number: block_of(log),
        transaction_hash: log.transaction_hash,
    })
}

pub fn decode_candidate(log: &Log) -> Option<CandidateRecord> {
    let ev = <CandidateAddedFilter as EthEvent>::decode_log(&raw(log)).ok()?;
    Some(CandidateRecord {
        election_id: ev.election_id,
        candidate_id: ev.candidate_id,
        name: ev.name,
        block_number: block_of(log),
        transaction_hash: log.transaction_hash,
    })
}

pub fn decode_election(log: &Log) -> Option<ElectionRecord> {
    let ev = <ElectionCreatedFilter as EthEvent>::decode_log(&raw(log)).ok()?;
    Some(ElectionRecord {
        election_id: ev.election_id,
        creator: ev.creator,
        start_time: ev.start_time,
        end_time: ev.end_time,
        title: ev.title,
        description: ev.description,
        block_number: block_of(log),
        transaction_hash: log.transaction_hash,
    })
}

pub fn decode_event(log: &Log) -> Option<ContractEvent> {
    let event = <ElectionVotingEvents as EthLogDecode>::decode_log(&raw(log)).ok()?;
    Some(ContractEvent {
        event,
        block_number: block_of(log),
        transaction_hash: log.transaction_hash,
    })
}

/// Logs that don't decode as a vote are skipped.
pub fn votes_from_logs(logs: &[Log]) -> Vec<VoteRecord> {
    logs.iter().filter_map(decode_vote).collect()
}

pub fn candidates_from_logs(logs: &[Log]) -> Vec<CandidateRecord> {
    logs.iter().filter_map(decode_candidate).collect()
}

pub fn elections_from_logs(logs: &[Log]) -> Vec<ElectionRecord> {
    logs.iter().filter_map(decode_election).collect()
}

pub fn events_from_logs(logs: &[Log]) -> Vec<ContractEvent> {
    logs.iter().filter_map(decode_event).collect()
}

/// First `ElectionCreated` event among a receipt's logs.
pub fn find_election_created(logs: &[Log]) -> Option<ElectionRecord> {
    logs.iter().find_map(decode_election)
}

/// Votes per candidate id. Independent of the order of `votes`.
pub fn tally_votes(votes: &[VoteRecord]) -> BTreeMap<U256, u64> {
    votes.iter().fold(BTreeMap::new(), |mut tally, vote| {
        *tally.entry(vote.candidate_id).or_insert(0) += 1;
        tally
    })
}
