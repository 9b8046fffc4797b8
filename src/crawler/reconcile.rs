//! Reconciliation of fetched contributions against the store
//!
//! The store's primary key on `ref` decides the first step: a fresh ref is
//! simply inserted. On a collision the candidate may only replace the stored
//! row if it lives where its ref says it should, which keeps a fork or a
//! copy-pasted descriptor from hijacking an existing artifact.

use crate::contribution::Contribution;
use crate::storage::{ContributionStore, InsertOutcome, StorageError, StorageResult};
use crate::url::{expected_source_url, is_same_lineage};

/// Outcome of reconciling one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// New ref, row inserted
    Accepted,

    /// Known ref from the expected source, mutable fields refreshed
    Updated,

    /// Known ref, candidate left out of the store
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The ref has too few segments to locate a source
    UnlocatableRef,

    /// The candidate was found outside the source its ref points at
    ForeignSource { expected: String },
}

/// Writes `candidate` through the insert-then-update policy
///
/// Storage failures are returned as errors; a rejection is a normal outcome.
pub fn reconcile<S>(store: &mut S, candidate: &Contribution) -> StorageResult<Reconciliation>
where
    S: ContributionStore + ?Sized,
{
    if store.insert_contribution(candidate)? == InsertOutcome::Inserted {
        tracing::info!("Accepted {}", candidate.reference);
        return Ok(Reconciliation::Accepted);
    }

    let Some(expected) = expected_source_url(&candidate.reference) else {
        tracing::info!(
            "Rejected {} from {}: ref does not name a repository",
            candidate.reference,
            candidate.source_url
        );
        return Ok(Reconciliation::Rejected(RejectReason::UnlocatableRef));
    };

    if !is_same_lineage(&candidate.reference, &candidate.source_url) {
        tracing::info!(
            "Rejected {} from {}: expected source {}",
            candidate.reference,
            candidate.source_url,
            expected
        );
        return Ok(Reconciliation::Rejected(RejectReason::ForeignSource { expected }));
    }

    if !store.update_contribution(candidate)? {
        return Err(StorageError::NotFound(candidate.reference.clone()));
    }

    tracing::info!("Updated {}", candidate.reference);
    Ok(Reconciliation::Updated)
}
