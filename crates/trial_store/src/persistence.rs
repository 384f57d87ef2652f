//! Persistence collaborator contract.
//!
//! The engine owns no durable storage. A backend implements
//! [`PersistenceProvider`] and guarantees that, for one trial, the
//! load-statistics -> persist pair of one allocation is atomic relative to
//! other allocations on the same trial; the engine's per-trial critical
//! section (see the orchestrator) upholds its half of that contract by
//! never interleaving two allocations for one trial.
//!
//! Persistence failures are a distinct [`PersistenceError`], never folded
//! into allocation-logic errors: callers are expected to retry or report,
//! and the engine itself never retries (a silent retry of a random
//! allocation would double-count a participant).

use thiserror::Error;
use trial_core::types::{Arm, Participant, Trial};

use crate::statistics::StatisticsStore;

/// Failure inside a persistence backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// The trial has no registered statistics.
    #[error("trial '{0}' is not registered")]
    TrialNotRegistered(String),

    /// The trial is already registered.
    #[error("trial '{0}' is already registered")]
    AlreadyRegistered(String),

    /// Backend I/O or conflict failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Durable storage collaborator for trial statistics and assignments.
pub trait PersistenceProvider {
    /// Stores a newly registered trial's pre-populated statistics.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::AlreadyRegistered`] when the trial name
    /// is already present.
    fn register_trial(
        &self,
        trial: &Trial,
        statistics: StatisticsStore,
    ) -> Result<(), PersistenceError>;

    /// Loads the current statistics snapshot for a trial.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::TrialNotRegistered`] when the trial was
    /// never registered.
    fn load_statistics(&self, trial: &Trial) -> Result<StatisticsStore, PersistenceError>;

    /// Appends the `(participant, arm)` assignment record and stores the
    /// mutated statistics of one successful allocation.
    ///
    /// # Errors
    ///
    /// Any [`PersistenceError`]; on failure the allocation is reported as
    /// failed and nothing may be partially written.
    fn persist(
        &self,
        trial: &Trial,
        participant: &Participant,
        arm: &Arm,
        statistics: &StatisticsStore,
    ) -> Result<(), PersistenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_error_display() {
        let err = PersistenceError::TrialNotRegistered("t".to_string());
        assert_eq!(err.to_string(), "trial 't' is not registered");

        let err = PersistenceError::Storage("disk on fire".to_string());
        assert!(err.to_string().contains("disk on fire"));
    }
}
