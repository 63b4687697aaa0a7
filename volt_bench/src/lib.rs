//! # Volt Bench
//!
//! Drives a volt procedure host with parallel workers, each on its own
//! connection, and reports transactions per second while it runs and in
//! total.

#![forbid(unsafe_code)]
#![forbid(clippy::allow_attributes)]

mod benchmark;
mod error;
pub mod stats;
pub mod workload;

pub use benchmark::{Benchmark, Summary, WorkerReport};
pub use error::{Error, Result};
pub use workload::{Payload, Workload};
