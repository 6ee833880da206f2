//! Election drafting, publishing and result views built on the contract client.

pub mod draft;
pub mod publish;
pub mod results;

pub use draft::{candidate_label, CandidateEntry, DraftError, ElectionDraft, Position, Schedule};
pub use publish::{publish, PublishError, PublishedCandidate, PublishedElection};
pub use results::{CandidateResult, ElectionResults, PositionResult};
