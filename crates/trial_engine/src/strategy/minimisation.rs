//! Taves / Pocock-Simon minimisation.
//!
//! Minimisation adaptively assigns each participant to the arm that
//! minimises imbalance across the trial's prognostic factors. For every
//! open arm the strategy scores how similar the arm's existing population
//! already is to the incoming participant: the running tally of earlier
//! participants sharing each factor group, scaled by the factor's weight,
//! summed over factors and divided by the arm's own weight. Lower is
//! better; the participant goes to an arm drawn from the minimum-score set.
//!
//! Pure minimisation is deterministic, which lets anyone with the
//! allocation history predict the next assignment. The `certainty`
//! parameter restores partial blinding: with probability `certainty` the
//! minimal set is used, otherwise the choice falls uniformly on the
//! remaining (non-minimal) open arms.

use tracing::debug;
use trial_core::strata::all_strata;
use trial_core::types::{Arm, Attribute, Group, InvalidTrialError, Trial};
use trial_store::{keys, StatisticsStore};

use crate::error::AllocationError;
use crate::rng::EngineRng;
use crate::strategy::AllocationRequest;

/// Probability of allocating to the truly-optimal arm.
pub(crate) const PARAM_CERTAINTY: &str = "certainty";

const DEFAULT_CERTAINTY: f64 = 1.0;

/// Chooses the arm minimising prognostic-factor imbalance.
///
/// # Errors
///
/// Fails with [`AllocationError::MissingResponse`] before any score is
/// computed or tally mutated when the participant lacks a usable response
/// for any non-stratification factor.
pub(crate) fn choose<'t>(
    request: &AllocationRequest<'t>,
    statistics: &mut StatisticsStore,
    rng: &mut EngineRng,
) -> Result<&'t Arm, AllocationError> {
    let trial = request.trial;
    let stratum = request.stratum.as_str();

    // Resolve every factor group up front so a missing response cannot
    // leave partial side effects behind.
    let matched = matched_factor_groups(trial, request)?;

    let scores: Vec<(&'t Arm, f64)> = request
        .open_arms
        .iter()
        .map(|arm| {
            let mut total = 0.0;
            for (attribute, group) in &matched {
                let tally =
                    statistics.factor_tally(stratum, &arm.name, attribute.name(), &group.name);
                total += tally as f64 * attribute.weight();
            }
            (*arm, total / f64::from(arm.weight))
        })
        .collect();

    let minimum = scores
        .iter()
        .map(|&(_, score)| score)
        .fold(f64::INFINITY, f64::min);

    let minimal: Vec<&'t Arm> = scores
        .iter()
        .filter(|&&(_, score)| score == minimum)
        .map(|&(arm, _)| arm)
        .collect();
    let non_minimal: Vec<&'t Arm> = scores
        .iter()
        .filter(|&&(_, score)| score > minimum)
        .map(|&(arm, _)| arm)
        .collect();

    let certainty = trial
        .parameter(PARAM_CERTAINTY)
        .unwrap_or(DEFAULT_CERTAINTY);

    let pool = if rng.uniform() <= certainty || non_minimal.is_empty() {
        &minimal
    } else {
        &non_minimal
    };
    let chosen = pool[rng.roll(pool.len() as u64) as usize];
    debug!(
        stratum,
        arm = %chosen.name,
        minimum,
        ties = minimal.len(),
        "minimisation selection"
    );

    for (attribute, group) in &matched {
        statistics.increment_factor_tally(stratum, &chosen.name, attribute.name(), &group.name);
    }

    Ok(chosen)
}

fn matched_factor_groups<'t>(
    trial: &'t Trial,
    request: &AllocationRequest<'t>,
) -> Result<Vec<(&'t Attribute, &'t Group)>, AllocationError> {
    let mut matched = Vec::new();
    for attribute in trial.factor_attributes() {
        let group = request
            .participant
            .response(attribute.name())
            .and_then(|response| attribute.group_for(response))
            .ok_or_else(|| AllocationError::MissingResponse {
                attribute: attribute.name().to_string(),
            })?;
        matched.push((attribute, group));
    }
    Ok(matched)
}

/// Registration-time check: `certainty` must be a probability.
pub(crate) fn validate(trial: &Trial) -> Result<(), InvalidTrialError> {
    let certainty = trial
        .parameter(PARAM_CERTAINTY)
        .unwrap_or(DEFAULT_CERTAINTY);
    if !(0.0..=1.0).contains(&certainty) {
        return Err(InvalidTrialError::ParameterOutOfRange {
            parameter: PARAM_CERTAINTY.to_string(),
            value: certainty,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

/// Factor tallies and allocation counters for every stratum, arm and
/// attribute group, zeroed.
pub(crate) fn stored_parameters(trial: &Trial) -> StatisticsStore {
    let mut statistics = StatisticsStore::new();
    for stratum in all_strata(trial) {
        for arm in trial.arms() {
            statistics.set(keys::allocation(&stratum, &arm.name), 0.0);
            for attribute in trial.factor_attributes() {
                for group in attribute.groups() {
                    statistics.set(
                        keys::factor_tally(&stratum, &arm.name, attribute.name(), &group.name),
                        0.0,
                    );
                }
            }
        }
    }
    statistics
}
