use chrono::{DateTime, Utc};
use ethers::types::{H256, U256};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::ballot::draft::{DraftError, ElectionDraft, Schedule};
use crate::blockchain::traits::ElectionWriter;
use crate::core::errors::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedCandidate {
    pub label: String,
    pub transaction_hash: H256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedElection {
    pub election_id: U256,
    pub transaction_hash: H256,
    pub schedule: Schedule,
    pub candidates: Vec<PublishedCandidate>,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("Failed to create election: {0}")]
    Create(#[source] ClientError),

    /// The election was created but its id could not be read from the receipt.
    #[error("Election created in transaction {0:?} but no ElectionCreated event was found")]
    MissingElectionId(H256),

    /// Election `election_id` exists on chain with `added` of `total` candidates.
    #[error("Failed to add candidate '{label}' to election {election_id} ({added}/{total} added): {source}")]
    Candidate {
        election_id: U256,
        label: String,
        added: usize,
        total: usize,
        #[source]
        source: ClientError,
    },
}

/// Publish a draft: one `createElection`, then one `addCandidate` per
/// candidate in draft order. Each write is confirmed before the next is sent;
/// the first failure stops the sequence.
pub async fn publish<W>(
    writer: &W,
    draft: &ElectionDraft,
    now: DateTime<Utc>,
) -> Result<PublishedElection, PublishError>
where
    W: ElectionWriter + ?Sized,
{
    draft.validate()?;
    let schedule = draft.schedule(now)?;
    let labels = draft.candidate_labels();

    info!(
        title = %draft.title,
        candidates = labels.len(),
        start_delay_minutes = schedule.start_delay_minutes,
        duration_minutes = schedule.duration_minutes,
        "Publishing election"
    );

    let created = writer
        .create_election(
            &draft.title,
            &draft.full_description(),
            schedule.duration_minutes,
            schedule.start_delay_minutes,
        )
        .await
        .map_err(PublishError::Create)?;
    let election_id = created
        .election_id()
        .ok_or(PublishError::MissingElectionId(created.receipt.transaction_hash))?;

    let total = labels.len();
    let mut candidates = Vec::with_capacity(total);
    for label in labels {
        match writer.add_candidate(election_id, &label).await {
            Ok(receipt) => candidates.push(PublishedCandidate {
                label,
                transaction_hash: receipt.transaction_hash,
            }),
            Err(source) => {
                error!(election_id = %election_id, label = %label, error = %source, "Candidate not added");
                return Err(PublishError::Candidate {
                    election_id,
                    label,
                    added: candidates.len(),
                    total,
                    source,
                });
            }
        }
    }

    info!(election_id = %election_id, candidates = total, "Election published");
    Ok(PublishedElection {
        election_id,
        transaction_hash: created.receipt.transaction_hash,
        schedule,
        candidates,
    })
}
