//! # simplot
//!
//! Post-processing helpers for the results of allocation/simulation
//! experiments: pick one experiment out of the request logs, aggregate it
//! into time windows, and render the result as charts or tables.

pub mod allocation;
pub mod analysis;
pub mod data;
pub mod env;
pub mod plot;
pub mod table;
