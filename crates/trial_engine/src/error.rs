//! Request-time error taxonomy.
//!
//! Every public engine operation either returns a chosen arm or fails with
//! exactly one of these variants, raised synchronously. All failure paths
//! leave the persisted statistics unmodified: mutations only reach the
//! persistence collaborator after a strategy has fully succeeded.

use thiserror::Error;
use trial_core::types::{InvalidTrialError, StratumError};
use trial_store::PersistenceError;

/// Failure of an allocation or registration request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    /// A stratification attribute could not be resolved for the
    /// participant; the request aborts before any strategy runs.
    #[error("cannot derive stratum: {0}")]
    MissingStratificationData(#[from] StratumError),

    /// Minimisation needs a factor response the participant did not give.
    #[error("participant has no usable response for minimisation factor '{attribute}'")]
    MissingResponse {
        /// The factor attribute whose response is missing or unmatched.
        attribute: String,
    },

    /// Every arm is at capacity and the trial configures no default arm.
    #[error("every arm of trial '{trial}' is at capacity and no default arm is configured")]
    TrialFull {
        /// The full trial.
        trial: String,
    },

    /// The trial names a strategy not present in the registry.
    #[error("unknown allocation strategy '{0}'")]
    UnknownStrategy(String),

    /// The trial failed a registration-time structural check.
    #[error(transparent)]
    InvalidTrial(#[from] InvalidTrialError),

    /// The persistence collaborator failed; the engine performs no
    /// implicit retry.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
