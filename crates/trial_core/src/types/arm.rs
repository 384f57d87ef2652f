//! Treatment arm type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A treatment group a participant can be allocated to.
///
/// The `weight` is a relative allocation ratio: an arm with weight 2
/// receives, in expectation, twice the participants of an arm with
/// weight 1. `limit` caps the number of participants per stratum; `None`
/// means unbounded.
///
/// # Examples
///
/// ```rust
/// use trial_core::types::Arm;
///
/// let unbounded = Arm::new("control", 1);
/// let capped = Arm::with_limit("intervention", 2, 50);
///
/// assert!(unbounded.is_open(1_000_000));
/// assert!(!capped.is_open(50));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arm {
    /// Arm name, unique within a trial.
    pub name: String,
    /// Relative allocation ratio, at least 1.
    pub weight: u32,
    /// Maximum participants per stratum; `None` is unbounded.
    pub limit: Option<u64>,
}

impl Arm {
    /// Creates an unbounded arm.
    pub fn new(name: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight,
            limit: None,
        }
    }

    /// Creates an arm with a participant limit.
    pub fn with_limit(name: impl Into<String>, weight: u32, limit: u64) -> Self {
        Self {
            name: name.into(),
            weight,
            limit: Some(limit),
        }
    }

    /// Returns whether the arm can accept another participant given its
    /// current allocation count for a stratum.
    #[inline]
    pub fn is_open(&self, count: u64) -> bool {
        match self.limit {
            Some(limit) => count < limit,
            None => true,
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (weight: {}", self.name, self.weight)?;
        if let Some(limit) = self.limit {
            write!(f, ", limit: {}", limit)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_arm_is_always_open() {
        let arm = Arm::new("control", 1);
        assert!(arm.is_open(0));
        assert!(arm.is_open(u64::MAX - 1));
    }

    #[test]
    fn test_limited_arm_closes_at_limit() {
        let arm = Arm::with_limit("intervention", 1, 5);
        assert!(arm.is_open(4));
        assert!(!arm.is_open(5));
        assert!(!arm.is_open(6));
    }

    #[test]
    fn test_display() {
        assert_eq!(Arm::new("a", 2).to_string(), "a (weight: 2)");
        assert_eq!(
            Arm::with_limit("b", 1, 10).to_string(),
            "b (weight: 1, limit: 10)"
        );
    }
}
