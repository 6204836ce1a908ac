//! Benchmark support crate for topogen.
//!
//! Provides parameter types and substrate sizing shared by the Criterion
//! generator benchmarks.

pub mod params;
