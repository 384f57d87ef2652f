//! Statistic naming conventions.
//!
//! Three families of keys cover everything the engine stores:
//!
//! - allocation counters: `"(<stratum>) <arm> allocations"`
//! - blocked-randomisation block state: `"(<stratum>) size"`,
//!   `"(<stratum>) seed"`, `"(<stratum>) counter"`
//! - minimisation tallies: `"(<stratum>) (<attribute> <group>) <arm>"`
//!
//! The `"(<stratum>) "` prefix is omitted when the stratum key is empty
//! (a trial with no stratification attributes), keeping keys short for the
//! common unstratified case and compatible with stores written before
//! stratification was configured.

/// Statistic name for the allocation counter of an arm within a stratum.
pub fn allocation(stratum: &str, arm: &str) -> String {
    prefixed(stratum, &format!("{} allocations", arm))
}

/// Statistic name for the realised size of the current block.
pub fn block_size(stratum: &str) -> String {
    prefixed(stratum, "size")
}

/// Statistic name for the shuffle seed of the current block.
pub fn block_seed(stratum: &str) -> String {
    prefixed(stratum, "seed")
}

/// Statistic name for the 0-based position inside the current block.
pub fn block_position(stratum: &str) -> String {
    prefixed(stratum, "counter")
}

/// Statistic name for a minimisation tally: participants with the given
/// attribute group already allocated to the given arm, within a stratum.
pub fn factor_tally(stratum: &str, arm: &str, attribute: &str, group: &str) -> String {
    prefixed(stratum, &format!("({} {}) {}", attribute, group, arm))
}

fn prefixed(stratum: &str, rest: &str) -> String {
    if stratum.is_empty() {
        rest.to_string()
    } else {
        format!("({}) {}", stratum, rest)
    }
}
