//! Benchmarks for allocation passes
//!
//! Engines are populated with seeded random components so runs are
//! comparable across builds.

pub mod runner;

pub use runner::{BenchmarkResult, BenchmarkRunner};
