//! # trial_core: Trial Data Model for the Stratal Allocation Engine
//!
//! ## Core Layer Role
//!
//! trial_core is the foundation layer of the 3-layer workspace, providing:
//! - The read-only trial configuration model: `Trial`, `Arm`, `Attribute`,
//!   `Group`, `Participant` (`types`)
//! - Structural validation at construction time via `TrialBuilder`
//! - Stratum key derivation and enumeration (`strata`)
//! - Error types: `InvalidTrialError`, `StratumError` (`types::error`)
//!
//! ## Immutability Contract
//!
//! Everything in this crate is read-only once a trial is registered. The
//! engine layer mutates allocation state exclusively through the statistics
//! store (trial_store); trial definitions may therefore be shared freely
//! across concurrent allocations for different trials.
//!
//! ## Usage Examples
//!
//! ```rust
//! use trial_core::types::{Arm, Trial};
//!
//! let trial = Trial::builder()
//!     .name("hypertension-2024")
//!     .strategy("SimpleRandomisation")
//!     .arm(Arm::new("control", 1))
//!     .arm(Arm::new("intervention", 2))
//!     .build()
//!     .expect("valid trial");
//!
//! assert_eq!(trial.arms().len(), 2);
//! assert_eq!(trial.stratified_count(), 1);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod strata;
pub mod types;

pub use strata::{all_strata, stratum_key};
pub use types::{
    Arm, Attribute, Group, GroupMatcher, InvalidTrialError, Participant, Response, StratumError,
    Trial, TrialBuilder,
};
