//! Report rendering for chart data.

pub mod generator;

pub use generator::*;
