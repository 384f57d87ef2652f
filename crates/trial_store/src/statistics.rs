//! The mutable statistics store for one trial.
//!
//! Externally a flat `String -> f64` map (see [`crate::keys`] for the
//! naming conventions); internally the engine reads and writes through the
//! typed accessors on [`StatisticsStore`], which do all encoding in one
//! place. Counts are stored as integer-valued `f64`s and rounded on read,
//! matching what a numeric-column backend preserves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::keys;

/// Per-stratum block state for blocked randomisation.
///
/// `size` is the realised block size (a multiple of the arm weight sum),
/// `seed` the reproducible source for regenerating the block's shuffled
/// arm sequence, and `position` the 0-based index of the next slot to
/// consider. Seeds are drawn in `u32` range so the `f64` representation in
/// the flat map is exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockState {
    /// Realised size of the current block.
    pub size: u64,
    /// Shuffle seed for the current block.
    pub seed: u64,
    /// 0-based position of the next slot in the block.
    pub position: u64,
}

impl BlockState {
    /// Returns whether a fresh block must be drawn before allocating:
    /// either no block was ever drawn for this stratum, or the current
    /// block is exhausted.
    #[inline]
    pub fn needs_regeneration(&self) -> bool {
        self.size == 0 || self.position >= self.size
    }
}

/// Mutable key->value allocation state scoped to one trial.
///
/// Missing keys read as zero, never as an error; strategies pre-populate
/// their stored parameters at registration time and tolerate strata added
/// later.
///
/// # Examples
///
/// ```rust
/// use trial_store::StatisticsStore;
///
/// let mut statistics = StatisticsStore::new();
/// assert_eq!(statistics.allocation_count("", "control"), 0);
///
/// statistics.increment_allocation("", "control");
/// assert_eq!(statistics.allocation_count("", "control"), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatisticsStore {
    values: HashMap<String, f64>,
}

impl StatisticsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a flat map loaded from a persistence backend.
    pub fn from_values(values: HashMap<String, f64>) -> Self {
        Self { values }
    }

    /// Returns the flat map view handed to persistence backends.
    #[inline]
    pub fn values(&self) -> &HashMap<String, f64> {
        &self.values
    }

    /// Returns the raw value for a statistic name, zero when absent.
    #[inline]
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    /// Sets the raw value for a statistic name.
    #[inline]
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Inserts a default value only when the name is not yet present.
    pub fn seed_default(&mut self, name: impl Into<String>, value: f64) {
        self.values.entry(name.into()).or_insert(value);
    }

    /// Merges another store's entries as defaults: existing values win.
    pub fn merge_defaults(&mut self, defaults: &StatisticsStore) {
        for (name, value) in &defaults.values {
            self.seed_default(name.clone(), *value);
        }
    }

    /// Returns the number of stored statistics.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the store holds no statistics.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn count(&self, name: &str) -> u64 {
        self.get(name).round().max(0.0) as u64
    }

    // --- allocation counters ---

    /// Current allocation count for an arm within a stratum.
    pub fn allocation_count(&self, stratum: &str, arm: &str) -> u64 {
        self.count(&keys::allocation(stratum, arm))
    }

    /// Overwrites the allocation count for an arm within a stratum.
    pub fn set_allocation_count(&mut self, stratum: &str, arm: &str, count: u64) {
        self.set(keys::allocation(stratum, arm), count as f64);
    }

    /// Increments the allocation count for an arm within a stratum and
    /// returns the new count.
    pub fn increment_allocation(&mut self, stratum: &str, arm: &str) -> u64 {
        let next = self.allocation_count(stratum, arm) + 1;
        self.set_allocation_count(stratum, arm, next);
        next
    }

    // --- blocked-randomisation block state ---

    /// Current block state for a stratum.
    pub fn block_state(&self, stratum: &str) -> BlockState {
        BlockState {
            size: self.count(&keys::block_size(stratum)),
            seed: self.count(&keys::block_seed(stratum)),
            position: self.count(&keys::block_position(stratum)),
        }
    }

    /// Stores a freshly drawn block's size, seed and position.
    pub fn store_block(&mut self, stratum: &str, state: &BlockState) {
        self.set(keys::block_size(stratum), state.size as f64);
        self.set(keys::block_seed(stratum), state.seed as f64);
        self.set(keys::block_position(stratum), state.position as f64);
    }

    /// Advances only the position inside the current block.
    pub fn set_block_position(&mut self, stratum: &str, position: u64) {
        self.set(keys::block_position(stratum), position as f64);
    }

    // --- minimisation tallies ---

    /// Running count of participants with the given attribute group
    /// allocated to the given arm, within a stratum.
    pub fn factor_tally(&self, stratum: &str, arm: &str, attribute: &str, group: &str) -> u64 {
        self.count(&keys::factor_tally(stratum, arm, attribute, group))
    }

    /// Increments a minimisation tally by one.
    pub fn increment_factor_tally(
        &mut self,
        stratum: &str,
        arm: &str,
        attribute: &str,
        group: &str,
    ) {
        let name = keys::factor_tally(stratum, arm, attribute, group);
        let next = self.count(&name) + 1;
        self.set(name, next as f64);
    }
}
