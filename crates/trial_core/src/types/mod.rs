//! Trial configuration types.
//!
//! This module provides:
//! - `Arm`: a treatment group with a relative weight and optional limit
//! - `Attribute`, `Group`, `GroupMatcher`: prognostic factors and their
//!   response classification
//! - `Participant`, `Response`: one allocation request's input data
//! - `Trial`, `TrialBuilder`: the validated trial definition
//! - `InvalidTrialError`, `StratumError`: structured error types

mod arm;
mod attribute;
mod error;
mod participant;
mod trial;

pub use arm::Arm;
pub use attribute::{Attribute, Group, GroupMatcher};
pub use error::{InvalidTrialError, StratumError};
pub use participant::{Participant, Response};
pub use trial::{Trial, TrialBuilder};
