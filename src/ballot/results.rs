use std::collections::BTreeMap;

use ethers::types::U256;
use serde::Serialize;

use crate::blockchain::events::{tally_votes, CandidateRecord, VoteRecord};

/// Position used for candidate names without a `"Position: "` prefix.
pub const GENERAL_POSITION: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateResult {
    pub candidate_id: U256,
    /// Name as stored on chain, position prefix included.
    pub label: String,
    /// Name without the position prefix.
    pub name: String,
    pub votes: u64,
    /// Share of the position's votes, 0.0 when it has none.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionResult {
    pub title: String,
    pub total_votes: u64,
    /// Ordered by votes descending, then candidate id ascending.
    pub candidates: Vec<CandidateResult>,
    /// All candidates with the top count. Empty while nobody has votes.
    pub winners: Vec<U256>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectionResults {
    pub total_votes: u64,
    /// In order of first appearance in the candidate list.
    pub positions: Vec<PositionResult>,
    /// Votes for candidate ids that have no `CandidateAdded` event.
    pub unmatched_votes: u64,
}

/// Split `"President: Ada (Blue)"` into `("President", "Ada (Blue)")`.
pub fn split_label(label: &str) -> (&str, &str) {
    match label.split_once(": ") {
        Some((position, name)) if !position.trim().is_empty() => (position.trim(), name),
        _ => (GENERAL_POSITION, label),
    }
}

impl ElectionResults {
    pub fn build(candidates: &[CandidateRecord], votes: &[VoteRecord]) -> Self {
        let tally = tally_votes(votes);
        Self::from_tally(candidates, &tally)
    }

    pub fn from_tally(candidates: &[CandidateRecord], tally: &BTreeMap<U256, u64>) -> Self {
        let mut positions: Vec<PositionResult> = Vec::new();
        for candidate in candidates {
            let (title, name) = split_label(&candidate.name);
            let result = CandidateResult {
                candidate_id: candidate.candidate_id,
                label: candidate.name.clone(),
                name: name.to_string(),
                votes: tally.get(&candidate.candidate_id).copied().unwrap_or(0),
                percentage: 0.0,
            };
            match positions.iter_mut().find(|p| p.title == title) {
                Some(position) => position.candidates.push(result),
                None => positions.push(PositionResult {
                    title: title.to_string(),
                    total_votes: 0,
                    candidates: vec![result],
                    winners: Vec::new(),
                }),
            }
        }

        for position in &mut positions {
            position.finish();
        }

        let matched: u64 = positions.iter().map(|p| p.total_votes).sum();
        let total_votes: u64 = tally.values().sum();
        Self { total_votes, positions, unmatched_votes: total_votes.saturating_sub(matched) }
    }

    pub fn position(&self, title: &str) -> Option<&PositionResult> {
        self.positions.iter().find(|p| p.title == title)
    }
}

impl PositionResult {
    fn finish(&mut self) {
        self.candidates
            .sort_by(|a, b| b.votes.cmp(&a.votes).then(a.candidate_id.cmp(&b.candidate_id)));
        self.total_votes = self.candidates.iter().map(|c| c.votes).sum();

        if self.total_votes > 0 {
            let total = self.total_votes as f64;
            for c in &mut self.candidates {
                c.percentage = c.votes as f64 * 100.0 / total;
            }
            let top = self.candidates[0].votes;
            self.winners = self
                .candidates
                .iter()
                .take_while(|c| c.votes == top)
                .map(|c| c.candidate_id)
                .collect();
        }
    }
}
