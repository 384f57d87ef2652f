//! In-memory persistence backend.
//!
//! `MemoryConnector` holds per-trial statistics and an append-only
//! allocation log behind `RwLock`s. It is the reference implementation of
//! [`PersistenceProvider`], used by the engine's tests and benchmarks and
//! suitable for embedding wherever durability is someone else's problem.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;
use trial_core::types::{Arm, Participant, Trial};

use crate::persistence::{PersistenceError, PersistenceProvider};
use crate::statistics::StatisticsStore;

/// One recorded assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationRecord {
    /// Trial name.
    pub trial: String,
    /// Participant identifier.
    pub participant: u64,
    /// Chosen arm name.
    pub arm: String,
}

/// Thread-safe in-memory [`PersistenceProvider`].
///
/// # Examples
///
/// ```rust
/// use trial_core::types::{Arm, Trial};
/// use trial_store::{MemoryConnector, PersistenceProvider, StatisticsStore};
///
/// let trial = Trial::builder()
///     .name("t")
///     .strategy("SimpleRandomisation")
///     .arm(Arm::new("a", 1))
///     .build()
///     .unwrap();
///
/// let connector = MemoryConnector::new();
/// connector.register_trial(&trial, StatisticsStore::new()).unwrap();
/// assert!(connector.load_statistics(&trial).unwrap().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemoryConnector {
    statistics: RwLock<HashMap<String, StatisticsStore>>,
    allocations: RwLock<Vec<AllocationRecord>>,
}

impl MemoryConnector {
    /// Creates an empty connector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the allocation log, in assignment order.
    pub fn allocations(&self) -> Vec<AllocationRecord> {
        self.allocations.read().unwrap().clone()
    }

    /// Returns the number of recorded assignments for a trial.
    pub fn allocation_count(&self, trial: &str) -> usize {
        self.allocations
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.trial == trial)
            .count()
    }
}

impl PersistenceProvider for MemoryConnector {
    fn register_trial(
        &self,
        trial: &Trial,
        statistics: StatisticsStore,
    ) -> Result<(), PersistenceError> {
        let mut store = self.statistics.write().unwrap();
        if store.contains_key(trial.name()) {
            return Err(PersistenceError::AlreadyRegistered(trial.name().to_string()));
        }
        debug!(trial = trial.name(), seeded = statistics.len(), "registering trial");
        store.insert(trial.name().to_string(), statistics);
        Ok(())
    }

    fn load_statistics(&self, trial: &Trial) -> Result<StatisticsStore, PersistenceError> {
        self.statistics
            .read()
            .unwrap()
            .get(trial.name())
            .cloned()
            .ok_or_else(|| PersistenceError::TrialNotRegistered(trial.name().to_string()))
    }

    fn persist(
        &self,
        trial: &Trial,
        participant: &Participant,
        arm: &Arm,
        statistics: &StatisticsStore,
    ) -> Result<(), PersistenceError> {
        let mut store = self.statistics.write().unwrap();
        if !store.contains_key(trial.name()) {
            return Err(PersistenceError::TrialNotRegistered(trial.name().to_string()));
        }
        store.insert(trial.name().to_string(), statistics.clone());

        self.allocations.write().unwrap().push(AllocationRecord {
            trial: trial.name().to_string(),
            participant: participant.id(),
            arm: arm.name.clone(),
        });
        Ok(())
    }
}
