//! Stratum key derivation and enumeration.
//!
//! A stratum key is the canonical string identifying the combination of
//! stratification-attribute groups a participant falls into. Keys are
//! built from `"<attribute name> <group name>"` terms in attribute
//! declaration order, joined with `", "`. A trial with no stratification
//! attributes has exactly one stratum, keyed by the empty string.
//!
//! Both functions here are pure: the same trial and participant always
//! produce the same key, and enumeration depends only on the trial
//! definition. Strategies rely on [`all_strata`] at registration time to
//! pre-initialise statistics for every stratum the trial can produce.

use crate::types::{Participant, StratumError, Trial};

/// Derives the stratum key for a participant.
///
/// # Errors
///
/// Returns [`StratumError`] when a stratification attribute has no
/// response from the participant, or the response matches none of the
/// attribute's groups. Allocation must not silently default a stratum, so
/// callers treat either case as fatal to the request.
///
/// # Examples
///
/// ```rust
/// use trial_core::strata::stratum_key;
/// use trial_core::types::{Arm, Attribute, Group, Participant, Trial};
///
/// let trial = Trial::builder()
///     .name("t")
///     .strategy("SimpleRandomisation")
///     .arm(Arm::new("a", 1))
///     .attribute(Attribute::new(
///         "age",
///         1.0,
///         true,
///         vec![Group::range("young", 0.0, 40.0), Group::range("old", 40.0, 120.0)],
///     ))
///     .build()
///     .unwrap();
///
/// let participant = Participant::new(1).with_numeric("age", 63.0);
/// assert_eq!(stratum_key(&trial, &participant).unwrap(), "age old");
/// ```
pub fn stratum_key(trial: &Trial, participant: &Participant) -> Result<String, StratumError> {
    let mut terms = Vec::new();

    for attribute in trial.stratifying_attributes() {
        let response = participant
            .response(attribute.name())
            .ok_or_else(|| StratumError::MissingResponse(attribute.name().to_string()))?;

        let group = attribute.group_for(response).ok_or_else(|| {
            StratumError::UnmatchedResponse {
                attribute: attribute.name().to_string(),
            }
        })?;

        terms.push(format!("{} {}", attribute.name(), group.name));
    }

    Ok(terms.join(", "))
}

/// Enumerates every stratum key the trial can produce.
///
/// The result is the Cartesian product of all stratification attributes'
/// groups, in attribute declaration order with later attributes varying
/// fastest. A trial with no stratification attributes yields the single
/// implicit stratum `""`.
pub fn all_strata(trial: &Trial) -> Vec<String> {
    let mut keys = vec![String::new()];

    for attribute in trial.stratifying_attributes() {
        let mut next = Vec::with_capacity(keys.len() * attribute.group_count());
        for prefix in &keys {
            for group in attribute.groups() {
                let term = format!("{} {}", attribute.name(), group.name);
                if prefix.is_empty() {
                    next.push(term);
                } else {
                    next.push(format!("{}, {}", prefix, term));
                }
            }
        }
        keys = next;
    }

    keys
}
