//! The allocation orchestrator.
//!
//! [`Allocator`] is the sole public entry point of the engine. For one
//! allocation it runs the whole critical section (load statistics, derive
//! the stratum, filter open arms, dispatch the strategy, increment the
//! allocation counter, persist) under a per-trial mutex, so at most one
//! allocation is ever in flight per trial while unrelated trials proceed
//! in parallel.
//!
//! Failure semantics: every error path returns before `persist` is called,
//! so stored statistics only ever change as the result of a fully
//! successful allocation. The trial-full fallback to the default arm is
//! deliberately not an allocation event: nothing is persisted and no
//! counter moves.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};
use trial_core::strata::stratum_key;
use trial_core::types::{Arm, Participant, Trial};
use trial_store::PersistenceProvider;

use crate::capacity::open_arms;
use crate::error::AllocationError;
use crate::rng::EngineRng;
use crate::strategy::{AllocationRequest, StrategyKind};

/// Orchestrates trial registration and participant allocation against a
/// persistence collaborator.
///
/// # Examples
///
/// ```rust
/// use trial_core::types::{Arm, Participant, Trial};
/// use trial_engine::Allocator;
/// use trial_store::MemoryConnector;
///
/// let trial = Trial::builder()
///     .name("t")
///     .strategy("SimpleRandomisation")
///     .arm(Arm::new("a", 1))
///     .arm(Arm::new("b", 1))
///     .build()
///     .unwrap();
///
/// let allocator = Allocator::with_seed(MemoryConnector::new(), 1);
/// allocator.register(&trial).unwrap();
/// let arm = allocator.allocate(&trial, &Participant::new(1)).unwrap();
/// assert!(arm.name == "a" || arm.name == "b");
/// ```
pub struct Allocator<P> {
    provider: P,
    rng: Mutex<EngineRng>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<P: PersistenceProvider> Allocator<P> {
    /// Creates an allocator drawing from OS entropy.
    pub fn new(provider: P) -> Self {
        Self::with_rng(provider, EngineRng::from_entropy())
    }

    /// Creates an allocator with a fixed seed, for reproducible
    /// allocation sequences in tests and audits.
    pub fn with_seed(provider: P, seed: u64) -> Self {
        Self::with_rng(provider, EngineRng::from_seed(seed))
    }

    fn with_rng(provider: P, rng: EngineRng) -> Self {
        debug!(seed = rng.seed(), "allocator initialised");
        Self {
            provider,
            rng: Mutex::new(rng),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the persistence collaborator.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Validates and registers a trial, seeding its stored parameters.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::UnknownStrategy`] when the trial names a
    ///   strategy not present in the registry
    /// - [`AllocationError::InvalidTrial`] when required parameters are
    ///   missing, unexpected parameters are supplied, or a strategy
    ///   structural precondition fails
    /// - [`AllocationError::Persistence`] from the backend
    ///
    /// A trial failing these checks is never allocatable.
    pub fn register(&self, trial: &Trial) -> Result<(), AllocationError> {
        let strategy = StrategyKind::from_identifier(trial.strategy())?;
        strategy.validate(trial)?;

        let stored = strategy.stored_parameters(trial);
        self.provider.register_trial(trial, stored)?;
        info!(
            trial = trial.name(),
            strategy = strategy.identifier(),
            "registered trial"
        );
        Ok(())
    }

    /// Allocates a participant to an arm.
    ///
    /// Either returns the chosen arm, with the assignment record and the
    /// mutated statistics already handed to the persistence collaborator,
    /// or fails with one typed [`AllocationError`] and leaves stored
    /// statistics untouched.
    ///
    /// When every arm is at capacity the configured default arm is
    /// returned *without* any statistics mutation or persistence call; a
    /// trial that is full with no default arm fails with
    /// [`AllocationError::TrialFull`].
    pub fn allocate(&self, trial: &Trial, participant: &Participant) -> Result<Arm, AllocationError> {
        let lock = self.trial_lock(trial.name());
        let _guard = lock.lock().unwrap();

        let strategy = StrategyKind::from_identifier(trial.strategy())?;
        let mut statistics = self.provider.load_statistics(trial)?;

        let stratum = stratum_key(trial, participant)?;
        let (open, counts) = open_arms(trial, &stratum, &statistics);

        if open.is_empty() {
            debug!(trial = trial.name(), stratum = %stratum, "trial full");
            return trial
                .default_arm()
                .cloned()
                .ok_or_else(|| AllocationError::TrialFull {
                    trial: trial.name().to_string(),
                });
        }

        let request = AllocationRequest {
            trial,
            participant,
            stratum,
            open_arms: open,
            counts,
        };

        let chosen = {
            let mut rng = self.rng.lock().unwrap();
            strategy.choose(&request, &mut statistics, &mut rng)?
        };

        statistics.increment_allocation(&request.stratum, &chosen.name);
        self.provider
            .persist(trial, participant, chosen, &statistics)?;

        debug!(
            trial = trial.name(),
            participant = participant.id(),
            arm = %chosen.name,
            "allocated"
        );
        Ok(chosen.clone())
    }

    /// Returns the mutex serialising allocations for one trial, creating
    /// it on first use. The map itself is only locked long enough to look
    /// the entry up, never across an allocation.
    fn trial_lock(&self, trial: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(
            locks
                .entry(trial.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}
