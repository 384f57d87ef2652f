//! Allocation strategies and their registry.
//!
//! The registry is [`StrategyKind`]: an enum with one variant per accepted
//! statistical allocation method, dispatching through `match` expressions.
//! This replaces the original system's runtime class-name lookup with an
//! explicit, statically checked mapping from strategy identifier to
//! implementation, while keeping strategies pluggable from configuration.
//!
//! Every strategy exposes the same three declarative contracts consumed at
//! trial registration:
//! - [`StrategyKind::required_parameters`]: parameter names the trial
//!   configuration must supply;
//! - [`StrategyKind::stored_parameters`]: statistic names with zero/default
//!   values to pre-populate for every stratum, arm and attribute-group
//!   combination the trial can produce;
//! - [`StrategyKind::validate`]: structural preconditions checked once, at
//!   registration, never at allocation time.

pub mod blocked;
pub mod minimisation;
pub mod simple;

use std::collections::BTreeMap;

use trial_core::types::{Arm, InvalidTrialError, Participant, Trial};
use trial_store::StatisticsStore;

use crate::error::AllocationError;
use crate::rng::EngineRng;

/// One allocation request, resolved by the orchestrator before dispatch.
///
/// Strategies receive the stratum key, the open arms in declaration order
/// and the per-arm allocation counts already computed; they never re-derive
/// capacity state themselves.
pub struct AllocationRequest<'t> {
    /// The trial being allocated for (read-only).
    pub trial: &'t Trial,
    /// The incoming participant.
    pub participant: &'t Participant,
    /// The participant's stratum key.
    pub stratum: String,
    /// Arms with remaining capacity, in declaration order; never empty.
    pub open_arms: Vec<&'t Arm>,
    /// Current allocation count for every arm, open or not.
    pub counts: BTreeMap<String, u64>,
}

/// The strategy registry: one variant per accepted allocation method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Simple weighted randomisation.
    Simple,
    /// Blocked randomisation with adaptive block sizing.
    Blocked,
    /// Taves / Pocock-Simon minimisation.
    Minimisation,
}

impl StrategyKind {
    /// Every registered strategy.
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Simple,
        StrategyKind::Blocked,
        StrategyKind::Minimisation,
    ];

    /// Resolves a strategy identifier from trial configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::UnknownStrategy`] for an identifier not
    /// present in the registry.
    pub fn from_identifier(identifier: &str) -> Result<Self, AllocationError> {
        match identifier {
            "SimpleRandomisation" => Ok(StrategyKind::Simple),
            "BlockedRandomisation" => Ok(StrategyKind::Blocked),
            "Minimisation" => Ok(StrategyKind::Minimisation),
            other => Err(AllocationError::UnknownStrategy(other.to_string())),
        }
    }

    /// Returns the configuration identifier of this strategy.
    pub fn identifier(&self) -> &'static str {
        match self {
            StrategyKind::Simple => "SimpleRandomisation",
            StrategyKind::Blocked => "BlockedRandomisation",
            StrategyKind::Minimisation => "Minimisation",
        }
    }

    /// Parameter names the trial configuration must supply.
    pub fn required_parameters(&self) -> &'static [&'static str] {
        match self {
            StrategyKind::Simple => &[],
            StrategyKind::Blocked => &[blocked::PARAM_BLOCK_SIZE, blocked::PARAM_DELTA],
            StrategyKind::Minimisation => &[minimisation::PARAM_CERTAINTY],
        }
    }

    /// Checks the trial's parameters and structure against this strategy.
    ///
    /// A trial is invalid when a required parameter is missing, a supplied
    /// parameter is not expected by the strategy, or a strategy-specific
    /// structural precondition fails (e.g. a block size not divisible by
    /// the arm weight sum).
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidTrialError`] encountered.
    pub fn validate(&self, trial: &Trial) -> Result<(), InvalidTrialError> {
        for required in self.required_parameters() {
            if trial.parameter(required).is_none() {
                return Err(InvalidTrialError::MissingParameter {
                    strategy: self.identifier().to_string(),
                    parameter: (*required).to_string(),
                });
            }
        }
        for supplied in trial.parameters().keys() {
            if !self.required_parameters().contains(&supplied.as_str()) {
                return Err(InvalidTrialError::UnexpectedParameter {
                    strategy: self.identifier().to_string(),
                    parameter: supplied.clone(),
                });
            }
        }

        match self {
            StrategyKind::Simple => Ok(()),
            StrategyKind::Blocked => blocked::validate(trial),
            StrategyKind::Minimisation => minimisation::validate(trial),
        }
    }

    /// Computes the statistics to pre-populate at registration time.
    ///
    /// Pre-population is what allows allocation-time lookups to safely
    /// default to zero instead of erroring; strategies still tolerate keys
    /// for strata added after registration.
    pub fn stored_parameters(&self, trial: &Trial) -> StatisticsStore {
        match self {
            StrategyKind::Simple => simple::stored_parameters(trial),
            StrategyKind::Blocked => blocked::stored_parameters(trial),
            StrategyKind::Minimisation => minimisation::stored_parameters(trial),
        }
    }

    /// Chooses an arm for the request, applying this strategy's own
    /// statistics mutations (block state, minimisation tallies).
    ///
    /// The shared `(arm, stratum)` allocation counter is incremented by
    /// the orchestrator after this returns, uniformly for all strategies.
    ///
    /// # Errors
    ///
    /// Strategy-specific; any error leaves `statistics` unmodified.
    pub fn choose<'t>(
        &self,
        request: &AllocationRequest<'t>,
        statistics: &mut StatisticsStore,
        rng: &mut EngineRng,
    ) -> Result<&'t Arm, AllocationError> {
        match self {
            StrategyKind::Simple => simple::choose(request, rng),
            StrategyKind::Blocked => blocked::choose(request, statistics, rng),
            StrategyKind::Minimisation => minimisation::choose(request, statistics, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_roundtrip() {
        for kind in StrategyKind::ALL {
            assert_eq!(
                StrategyKind::from_identifier(kind.identifier()).unwrap(),
                kind
            );
        }
    }

    #[test]
    fn test_unknown_identifier_rejected() {
        let err = StrategyKind::from_identifier("UrnRandomisation").unwrap_err();
        assert_eq!(
            err,
            AllocationError::UnknownStrategy("UrnRandomisation".to_string())
        );
    }

    #[test]
    fn test_missing_required_parameter_rejected() {
        let trial = Trial::builder()
            .name("t")
            .strategy("BlockedRandomisation")
            .arm(Arm::new("a", 1))
            .arm(Arm::new("b", 1))
            .parameter("blocksize", 4.0)
            .build()
            .unwrap();

        let err = StrategyKind::Blocked.validate(&trial).unwrap_err();
        assert_eq!(
            err,
            InvalidTrialError::MissingParameter {
                strategy: "BlockedRandomisation".to_string(),
                parameter: "delta".to_string(),
            }
        );
    }

    #[test]
    fn test_unexpected_parameter_rejected() {
        let trial = Trial::builder()
            .name("t")
            .strategy("SimpleRandomisation")
            .arm(Arm::new("a", 1))
            .parameter("blocksize", 4.0)
            .build()
            .unwrap();

        let err = StrategyKind::Simple.validate(&trial).unwrap_err();
        assert_eq!(
            err,
            InvalidTrialError::UnexpectedParameter {
                strategy: "SimpleRandomisation".to_string(),
                parameter: "blocksize".to_string(),
            }
        );
    }
}
