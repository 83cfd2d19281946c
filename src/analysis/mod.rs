//! Analysis modules.
//!
//! Bucket resolution and grouping live in `grouping`, the reductions in
//! `calculation`, and the calculator that drives both in `aggregator`.

pub mod aggregator;
pub mod calculation;
pub mod grouping;

pub use aggregator::*;
pub use calculation::CalculationType;
pub use grouping::{group_records, Bucket, BucketKey};
