//! Trial definition and its validating builder.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::arm::Arm;
use super::attribute::{Attribute, GroupMatcher};
use super::error::InvalidTrialError;

/// A validated trial definition.
///
/// Immutable once built; the allocation engine reads it and never writes.
/// Arms and attributes keep their declaration order, which is meaningful:
/// allocation walks arms in declaration order and stratum keys list
/// attributes in declaration order.
///
/// Construct through [`Trial::builder`]; the builder enforces the
/// structural invariants (at least one arm, unique arm names, positive
/// weights, non-overlapping range groups, a resolvable default arm) and
/// fails with [`InvalidTrialError`] otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    name: String,
    strategy: String,
    arms: Vec<Arm>,
    attributes: Vec<Attribute>,
    parameters: BTreeMap<String, f64>,
    default_arm: Option<String>,
}

impl Trial {
    /// Creates a new trial builder.
    pub fn builder() -> TrialBuilder {
        TrialBuilder::default()
    }

    /// Returns the trial name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the strategy identifier.
    #[inline]
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Returns the arms in declaration order.
    #[inline]
    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    /// Returns the arm with the given name.
    pub fn arm(&self, name: &str) -> Option<&Arm> {
        self.arms.iter().find(|a| a.name == name)
    }

    /// Returns the attributes in declaration order.
    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns the strategy configuration parameters.
    #[inline]
    pub fn parameters(&self) -> &BTreeMap<String, f64> {
        &self.parameters
    }

    /// Returns a single strategy parameter, if supplied.
    #[inline]
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    /// Returns the fallback arm used when every arm is at capacity.
    pub fn default_arm(&self) -> Option<&Arm> {
        self.default_arm.as_deref().and_then(|name| self.arm(name))
    }

    /// Returns the sum of all arm weights.
    pub fn weight_sum(&self) -> u32 {
        self.arms.iter().map(|a| a.weight).sum()
    }

    /// Iterates over the stratification attributes in declaration order.
    pub fn stratifying_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.is_stratifying())
    }

    /// Iterates over the non-stratification (minimisation factor)
    /// attributes in declaration order.
    pub fn factor_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| !a.is_stratifying())
    }

    /// Returns the number of strata this trial partitions participants
    /// into: the product of group counts over stratification attributes,
    /// 1 when none are declared.
    pub fn stratified_count(&self) -> usize {
        self.stratifying_attributes()
            .map(|a| a.group_count())
            .product()
    }
}

impl fmt::Display for Trial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trial: {}", self.name)?;
        writeln!(f, "Allocation strategy: {}", self.strategy)?;
        writeln!(f, "Arms:")?;
        for arm in &self.arms {
            writeln!(f, "  {}", arm)?;
        }
        if !self.parameters.is_empty() {
            writeln!(f, "Parameters:")?;
            for (name, value) in &self.parameters {
                writeln!(f, "  {} = {}", name, value)?;
            }
        }
        if let Some(arm) = self.default_arm() {
            writeln!(f, "Default arm: {}", arm.name)?;
        }
        Ok(())
    }
}

/// Builder for [`Trial`] with validation at build time.
///
/// # Examples
///
/// ```rust
/// use trial_core::types::{Arm, Trial};
///
/// let trial = Trial::builder()
///     .name("copd-rehab")
///     .strategy("BlockedRandomisation")
///     .arm(Arm::new("usual-care", 1))
///     .arm(Arm::new("rehab", 1))
///     .parameter("blocksize", 8.0)
///     .parameter("delta", 2.0)
///     .build()
///     .expect("valid trial");
/// assert_eq!(trial.weight_sum(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TrialBuilder {
    name: Option<String>,
    strategy: Option<String>,
    arms: Vec<Arm>,
    attributes: Vec<Attribute>,
    parameters: BTreeMap<String, f64>,
    default_arm: Option<String>,
}

impl TrialBuilder {
    /// Sets the trial name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the strategy identifier.
    pub fn strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Appends an arm; declaration order is preserved.
    pub fn arm(mut self, arm: Arm) -> Self {
        self.arms.push(arm);
        self
    }

    /// Appends an attribute; declaration order is preserved.
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Supplies a strategy configuration parameter.
    pub fn parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Names the fallback arm used when every arm is at capacity.
    pub fn default_arm(mut self, name: impl Into<String>) -> Self {
        self.default_arm = Some(name.into());
        self
    }

    /// Builds the trial, enforcing structural invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTrialError` if:
    /// - the name is missing or empty
    /// - no arm is declared, an arm name repeats, or an arm weight is 0
    /// - an attribute has no groups or overlapping range groups
    /// - the default arm names no declared arm
    pub fn build(self) -> Result<Trial, InvalidTrialError> {
        let name = match self.name {
            Some(ref n) if !n.is_empty() => n.clone(),
            _ => return Err(InvalidTrialError::EmptyName),
        };

        if self.arms.is_empty() {
            return Err(InvalidTrialError::NoArms(name));
        }

        let mut seen = HashSet::new();
        for arm in &self.arms {
            if !seen.insert(arm.name.as_str()) {
                return Err(InvalidTrialError::DuplicateArm(arm.name.clone()));
            }
            if arm.weight == 0 {
                return Err(InvalidTrialError::ZeroWeightArm(arm.name.clone()));
            }
        }

        for attribute in &self.attributes {
            validate_attribute(attribute)?;
        }

        if let Some(ref default) = self.default_arm {
            if !self.arms.iter().any(|a| &a.name == default) {
                return Err(InvalidTrialError::UnknownDefaultArm(default.clone()));
            }
        }

        Ok(Trial {
            name,
            strategy: self.strategy.unwrap_or_default(),
            arms: self.arms,
            attributes: self.attributes,
            parameters: self.parameters,
            default_arm: self.default_arm,
        })
    }
}

fn validate_attribute(attribute: &Attribute) -> Result<(), InvalidTrialError> {
    if attribute.group_count() == 0 {
        return Err(InvalidTrialError::EmptyAttribute(attribute.name().to_string()));
    }

    let groups = attribute.groups();
    for (i, a) in groups.iter().enumerate() {
        for b in &groups[i + 1..] {
            if let (
                GroupMatcher::Range {
                    min: a_min,
                    max: a_max,
                },
                GroupMatcher::Range {
                    min: b_min,
                    max: b_max,
                },
            ) = (&a.matcher, &b.matcher)
            {
                if a_min < b_max && b_min < a_max {
                    return Err(InvalidTrialError::OverlappingGroups {
                        attribute: attribute.name().to_string(),
                        first: a.name.clone(),
                        second: b.name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}
