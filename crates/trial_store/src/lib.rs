//! # trial_store: Statistics Store and Persistence Boundary
//!
//! ## Store Layer Role
//!
//! trial_store sits between the trial data model (trial_core) and the
//! allocation engine (trial_engine), providing:
//! - `StatisticsStore`: the mutable flat map of allocation state with a
//!   typed accessor view (`statistics`)
//! - The statistic naming conventions shared with external persistence
//!   (`keys`)
//! - The persistence collaborator contract and its error type
//!   (`persistence`)
//! - `MemoryConnector`: an in-memory reference implementation (`memory`)
//!
//! ## Flat Map Contract
//!
//! External persistence sees statistics as a flat `String -> f64` map, so
//! any backend that can store such a map can host a trial. The engine never
//! touches raw key strings: it reads and writes through the typed accessors,
//! which encode and decode the naming conventions in one place. Keys absent
//! from the map read as zero; this is what lets strategies tolerate strata
//! added after registration.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod keys;
pub mod memory;
pub mod persistence;
pub mod statistics;

pub use memory::{AllocationRecord, MemoryConnector};
pub use persistence::{PersistenceError, PersistenceProvider};
pub use statistics::{BlockState, StatisticsStore};
