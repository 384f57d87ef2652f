//! Simple weighted randomisation.
//!
//! The unbiased coin flip of allocation methods: each open arm is chosen
//! with probability proportional to its weight, independently of every
//! previous allocation. No stored parameters beyond the shared allocation
//! counters, which are lazily zero-initialised per stratum and arm.

use tracing::debug;
use trial_core::strata::all_strata;
use trial_core::types::{Arm, Trial};
use trial_store::{keys, StatisticsStore};

use crate::error::AllocationError;
use crate::rng::EngineRng;
use crate::strategy::AllocationRequest;

/// Chooses among the open arms, weighted by arm weight.
///
/// Draws one integer roll uniformly from `[0, sum of open weights)` and
/// walks the open arms in declaration order, subtracting each weight until
/// the roll goes negative.
pub(crate) fn choose<'t>(
    request: &AllocationRequest<'t>,
    rng: &mut EngineRng,
) -> Result<&'t Arm, AllocationError> {
    let sum: u64 = request.open_arms.iter().map(|a| u64::from(a.weight)).sum();
    let mut roll = rng.roll(sum) as i64;
    debug!(stratum = %request.stratum, roll, sum, "simple randomisation roll");

    for &arm in &request.open_arms {
        roll -= i64::from(arm.weight);
        if roll < 0 {
            return Ok(arm);
        }
    }
    unreachable!("roll is bounded by the open-arm weight sum");
}

/// Allocation counters for every stratum and arm, zeroed.
pub(crate) fn stored_parameters(trial: &Trial) -> StatisticsStore {
    let mut statistics = StatisticsStore::new();
    for stratum in all_strata(trial) {
        for arm in trial.arms() {
            statistics.set(keys::allocation(&stratum, &arm.name), 0.0);
        }
    }
    statistics
}
