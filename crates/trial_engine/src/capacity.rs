//! Arm capacity filtering.

use std::collections::BTreeMap;

use trial_core::types::{Arm, Trial};
use trial_store::StatisticsStore;

/// Computes which arms still have room in a stratum.
///
/// Returns the open arms in declaration order (allocation count strictly
/// below the arm's limit; unlimited arms are always open) and the current
/// count for *all* arms, open or not. The fallback policy when no arm is
/// open (default arm or `TrialFullError`) belongs to the orchestrator, not
/// here.
pub fn open_arms<'t>(
    trial: &'t Trial,
    stratum: &str,
    statistics: &StatisticsStore,
) -> (Vec<&'t Arm>, BTreeMap<String, u64>) {
    let mut open = Vec::with_capacity(trial.arms().len());
    let mut counts = BTreeMap::new();

    for arm in trial.arms() {
        let count = statistics.allocation_count(stratum, &arm.name);
        if arm.is_open(count) {
            open.push(arm);
        }
        counts.insert(arm.name.clone(), count);
    }

    (open, counts)
}
