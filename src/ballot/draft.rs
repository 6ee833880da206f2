use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Please fill in election title and description")]
    MissingDetails,
    #[error("Please add at least one position")]
    NoPositions,
    #[error("Please set start and end dates")]
    MissingSchedule,
    #[error("Invalid election draft: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub name: String,
    #[serde(default)]
    pub party: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub title: String,
    #[serde(default)]
    pub candidates: Vec<CandidateEntry>,
}

/// An election as entered by its creator, before anything is on chain.
///
/// The contract knows one flat candidate list per election, so positions are
/// encoded into candidate names (see [`candidate_label`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

/// Contract-level timing: minutes from now until voting opens, and how long it stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub start_delay_minutes: u64,
    pub duration_minutes: u64,
}

impl Schedule {
    /// Delay is clamped at zero (a start in the past opens immediately);
    /// duration is at least one minute.
    pub fn from_window(now: DateTime<Utc>, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        let delay = (starts_at - now).num_minutes().max(0);
        let duration = (ends_at - starts_at).num_minutes().max(1);
        Self { start_delay_minutes: delay as u64, duration_minutes: duration as u64 }
    }
}

/// `"Position: Name (Party)"`, or `"Position: Name"` without a party.
pub fn candidate_label(position: &str, candidate: &CandidateEntry) -> String {
    match candidate.party.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(party) => format!("{}: {} ({})", position, candidate.name, party),
        None => format!("{}: {}", position, candidate.name),
    }
}

impl ElectionDraft {
    pub fn from_toml_str(content: &str) -> Result<Self, DraftError> {
        toml::from_str(content).map_err(|e| DraftError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DraftError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DraftError::Parse(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(DraftError::MissingDetails);
        }
        if self.positions.is_empty() {
            return Err(DraftError::NoPositions);
        }
        if self.starts_at.is_none() || self.ends_at.is_none() {
            return Err(DraftError::MissingSchedule);
        }
        Ok(())
    }

    /// Description as stored on chain, with the organization appended.
    pub fn full_description(&self) -> String {
        match self.organization.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
            Some(org) => format!("{} | Organization: {}", self.description, org),
            None => self.description.clone(),
        }
    }

    pub fn schedule(&self, now: DateTime<Utc>) -> Result<Schedule, DraftError> {
        match (self.starts_at, self.ends_at) {
            (Some(start), Some(end)) => Ok(Schedule::from_window(now, start, end)),
            _ => Err(DraftError::MissingSchedule),
        }
    }

    /// Candidate names in submission order: positions in order, candidates in order.
    pub fn candidate_labels(&self) -> Vec<String> {
        self.positions
            .iter()
            .flat_map(|p| p.candidates.iter().map(move |c| candidate_label(&p.title, c)))
            .collect()
    }
}
