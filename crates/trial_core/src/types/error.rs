//! Error types for trial validation and stratum derivation.
//!
//! This module provides:
//! - `InvalidTrialError`: raised at trial-registration time when a trial's
//!   structure or strategy parameters are unusable
//! - `StratumError`: raised during allocation when a participant cannot be
//!   placed into a stratum
//!
//! Both are registration/request-scoped: a trial failing `InvalidTrialError`
//! checks must never become allocatable, and a `StratumError` aborts the
//! allocation request before any statistics mutation.

use thiserror::Error;

/// A trial definition that must not be registered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidTrialError {
    /// Trial has an empty name.
    #[error("trial name is empty")]
    EmptyName,

    /// Trial declares no arms.
    #[error("trial '{0}' declares no arms")]
    NoArms(String),

    /// Two arms share a name.
    #[error("duplicate arm name '{0}'")]
    DuplicateArm(String),

    /// An arm has weight zero.
    #[error("arm '{0}' has zero weight; weights must be at least 1")]
    ZeroWeightArm(String),

    /// An attribute declares no groups.
    #[error("attribute '{0}' declares no groups")]
    EmptyAttribute(String),

    /// Two range groups of one attribute overlap.
    #[error("attribute '{attribute}' has overlapping ranges '{first}' and '{second}'")]
    OverlappingGroups {
        /// The attribute owning the groups.
        attribute: String,
        /// First overlapping group name.
        first: String,
        /// Second overlapping group name.
        second: String,
    },

    /// The configured default arm is not an arm of the trial.
    #[error("default arm '{0}' is not an arm of the trial")]
    UnknownDefaultArm(String),

    /// A parameter the strategy requires was not supplied.
    #[error("strategy '{strategy}' requires parameter '{parameter}'")]
    MissingParameter {
        /// The declared strategy.
        strategy: String,
        /// The missing parameter name.
        parameter: String,
    },

    /// A supplied parameter is not expected by the declared strategy.
    #[error("strategy '{strategy}' does not expect parameter '{parameter}'")]
    UnexpectedParameter {
        /// The declared strategy.
        strategy: String,
        /// The unexpected parameter name.
        parameter: String,
    },

    /// A blocked-randomisation size parameter is not a multiple of the
    /// sum of arm weights.
    #[error(
        "parameter '{parameter}' ({value}) is not evenly divisible by the arm weight sum {weight_sum}"
    )]
    IndivisibleParameter {
        /// The offending parameter name (`blocksize` or `delta`).
        parameter: String,
        /// The supplied value.
        value: f64,
        /// The trial's sum of arm weights.
        weight_sum: u32,
    },

    /// A parameter value is outside its valid range.
    #[error("parameter '{parameter}' ({value}) is outside [{min}, {max}]")]
    ParameterOutOfRange {
        /// The offending parameter name.
        parameter: String,
        /// The supplied value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
}

/// A participant that cannot be placed into a stratum.
///
/// Allocation must not silently default a stratum, so either failure mode
/// is fatal to the request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StratumError {
    /// A stratification attribute has no response from the participant.
    #[error("participant has no response for stratification attribute '{0}'")]
    MissingResponse(String),

    /// The response matches none of the attribute's groups.
    #[error("response for stratification attribute '{attribute}' matches no group")]
    UnmatchedResponse {
        /// The attribute whose classification failed.
        attribute: String,
    },
}
