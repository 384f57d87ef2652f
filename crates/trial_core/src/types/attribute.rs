//! Prognostic attributes and response classification.
//!
//! An `Attribute` (a stratification or minimisation variable) partitions
//! participant responses into named `Group`s. A group matches either one
//! discrete value or a half-open numeric range `[min, max)`. Classification
//! is exhaustive by contract: a response that matches no group is an error
//! at the call site, never a silent default.

use serde::{Deserialize, Serialize};

use super::participant::Response;

/// Matcher deciding whether a response belongs to a group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GroupMatcher {
    /// Matches a discrete response equal to the given value.
    Discrete(String),
    /// Matches a numeric response in the half-open range `[min, max)`.
    Range {
        /// Inclusive lower bound.
        min: f64,
        /// Exclusive upper bound.
        max: f64,
    },
}

impl GroupMatcher {
    /// Returns whether the response falls inside this matcher.
    pub fn matches(&self, response: &Response) -> bool {
        match (self, response) {
            (GroupMatcher::Discrete(value), Response::Discrete(given)) => value == given,
            (GroupMatcher::Range { min, max }, Response::Numeric(given)) => {
                // Range is [min, max): equal to the lower bound is inside,
                // equal to the upper bound is not.
                *given >= *min && *given < *max
            }
            _ => false,
        }
    }
}

/// A named stratum/group of one attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group name, used in stratum keys and statistic names.
    pub name: String,
    /// The matcher classifying responses into this group.
    pub matcher: GroupMatcher,
}

impl Group {
    /// Creates a group matching a discrete response value.
    pub fn discrete(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matcher: GroupMatcher::Discrete(value.into()),
        }
    }

    /// Creates a group matching numeric responses in `[min, max)`.
    pub fn range(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            matcher: GroupMatcher::Range { min, max },
        }
    }
}

/// A prognostic factor of a trial.
///
/// `weight` scales the factor's influence in minimisation scoring and is
/// ignored by the other strategies. `stratifying` marks the attribute as a
/// grouping factor for stratum derivation.
///
/// # Examples
///
/// ```rust
/// use trial_core::types::{Attribute, Group, Response};
///
/// let age = Attribute::new(
///     "age",
///     1.0,
///     true,
///     vec![Group::range("young", 0.0, 40.0), Group::range("old", 40.0, 120.0)],
/// );
///
/// let group = age.group_for(&Response::Numeric(40.0)).unwrap();
/// assert_eq!(group.name, "old");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    weight: f64,
    stratifying: bool,
    groups: Vec<Group>,
}

impl Attribute {
    /// Creates a new attribute with its ordered groups.
    pub fn new(
        name: impl Into<String>,
        weight: f64,
        stratifying: bool,
        groups: Vec<Group>,
    ) -> Self {
        Self {
            name: name.into(),
            weight,
            stratifying,
            groups,
        }
    }

    /// Returns the attribute name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the minimisation weight of this factor.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns whether this attribute is a stratification factor.
    #[inline]
    pub fn is_stratifying(&self) -> bool {
        self.stratifying
    }

    /// Returns the ordered groups of this attribute.
    #[inline]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Returns the number of groups.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Classifies a response into one of this attribute's groups.
    ///
    /// Returns `None` when no group matches; the caller decides whether
    /// that is `StratumError::UnmatchedResponse` or `MissingResponse`
    /// territory. Groups are tried in declaration order.
    pub fn group_for(&self, response: &Response) -> Option<&Group> {
        self.groups.iter().find(|g| g.matcher.matches(response))
    }
}
