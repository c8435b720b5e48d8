#![allow(
    clippy::upper_case_acronyms,
    non_camel_case_types,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

pub mod cache;
pub mod config;
pub mod sim;
pub mod tag_array;
pub mod trace;

#[cfg(test)]
pub mod testing;

pub use cache::{Geometry, ReplacementPolicy, RequestStatus};
pub use config::{Associativity, Config};
pub use sim::Simulation;

pub type address = u64;
