//! # trial_engine: The Allocation Kernel
//!
//! ## Engine Layer Role
//!
//! trial_engine is the top layer of the workspace, providing:
//! - `EngineRng`: seeded, reproducible random number generation (`rng`)
//! - The arm capacity filter (`capacity`)
//! - The three allocation strategies and their static-dispatch registry
//!   (`strategy`): simple weighted randomisation, blocked randomisation
//!   with adaptive block sizing, and Taves / Pocock-Simon minimisation
//! - `Allocator`: the orchestrator and sole public entry point
//!   (`orchestrator`)
//! - `AllocationError`: the full request-time error taxonomy (`error`)
//!
//! ## Allocation Contract
//!
//! `Allocator::allocate` either returns a chosen arm with the implied
//! statistics delta already handed to the persistence collaborator, or
//! fails with one typed error and leaves stored statistics untouched.
//! There is no sentinel "no arm" result and no silent stratum default.
//!
//! ## Usage Examples
//!
//! ```rust
//! use trial_core::types::{Arm, Participant, Trial};
//! use trial_engine::Allocator;
//! use trial_store::MemoryConnector;
//!
//! let trial = Trial::builder()
//!     .name("hypertension-2024")
//!     .strategy("SimpleRandomisation")
//!     .arm(Arm::new("control", 1))
//!     .arm(Arm::new("intervention", 1))
//!     .build()
//!     .unwrap();
//!
//! let allocator = Allocator::with_seed(MemoryConnector::new(), 42);
//! allocator.register(&trial).unwrap();
//!
//! let arm = allocator.allocate(&trial, &Participant::new(1)).unwrap();
//! assert!(trial.arm(&arm.name).is_some());
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod capacity;
pub mod error;
pub mod orchestrator;
pub mod rng;
pub mod strategy;

pub use capacity::open_arms;
pub use error::AllocationError;
pub use orchestrator::Allocator;
pub use rng::EngineRng;
pub use strategy::{AllocationRequest, StrategyKind};
