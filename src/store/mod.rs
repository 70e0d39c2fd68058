//! In-memory application state the pipeline reads from and commits into.
//!
//! Both stores are plain values owned by the caller; every mutation goes
//! through a method so the pipeline can be driven and checked in isolation.

pub mod generation;
pub mod results;
pub mod staging;

pub use generation::{EpochTicket, Generation};
pub use results::{ResultSummary, ResultsStore, SuccessfulResult};
pub use staging::{StagingSnapshot, StagingStore};
