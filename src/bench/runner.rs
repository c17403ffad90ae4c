//! Benchmark runner for allocation and learning passes

use chrono::{Duration, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Instant;
use tracing::warn;

use crate::core::component::{ComponentDescriptor, ComponentId, PriorityClass, Urgency};
use crate::core::config::EngineConfig;
use crate::core::engine::{AttentionEngine, ManualClock};
use crate::neural::ledger::InteractionAction;

pub struct BenchmarkRunner {
    iterations: usize,
    components: usize,
    warmup: usize,
    seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub iterations: usize,
    pub total_ms: u64,
    pub avg_us: f64,
    pub min_us: u64,
    pub max_us: u64,
    pub ops_per_sec: f64,
}

impl BenchmarkResult {
    fn from_samples(name: &str, samples: &[u64], total_ms: u64) -> Self {
        let iterations = samples.len();
        let sum: u64 = samples.iter().sum();
        let avg_us = if iterations > 0 { sum as f64 / iterations as f64 } else { 0.0 };
        let ops_per_sec = if sum > 0 {
            iterations as f64 / (sum as f64 / 1_000_000.0)
        } else {
            0.0
        };
        Self {
            name: name.into(),
            iterations,
            total_ms,
            avg_us,
            min_us: samples.iter().min().copied().unwrap_or(0),
            max_us: samples.iter().max().copied().unwrap_or(0),
            ops_per_sec,
        }
    }
}

const URGENCIES: [Urgency; 4] = [Urgency::Critical, Urgency::High, Urgency::Medium, Urgency::Low];
const PRIORITIES: [PriorityClass; 6] = [
    PriorityClass::Emergency,
    PriorityClass::Critical,
    PriorityClass::Primary,
    PriorityClass::Secondary,
    PriorityClass::Tertiary,
    PriorityClass::Background,
];
const ACTIONS: [InteractionAction; 4] = [
    InteractionAction::Activate,
    InteractionAction::Inspect,
    InteractionAction::Dismiss,
    InteractionAction::Ignore,
];

impl BenchmarkRunner {
    pub fn new(iterations: usize, components: usize) -> Self {
        Self { iterations, components, warmup: 5, seed: 42 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn random_component(rng: &mut StdRng, index: usize) -> ComponentDescriptor {
        ComponentDescriptor::new(format!("c{}", index))
            .with_kind("bench")
            .with_urgency(URGENCIES[rng.gen_range(0..URGENCIES.len())])
            .with_priority(PRIORITIES[rng.gen_range(0..PRIORITIES.len())])
            .with_weight(rng.gen_range(0.0..100.0))
            .deferrable(rng.gen_bool(0.5))
            .with_needs(rng.gen_range(0.0..40.0), rng.gen_range(0.0..4.0), rng.gen_range(0.0..1.5))
    }

    /// Engine populated with random components, optionally warmed up with
    /// random interactions so learned adjustments are active.
    fn build_engine(&self, rng: &mut StdRng, interactions: usize) -> AttentionEngine {
        let clock = ManualClock::new(Local::now());
        let mut engine = AttentionEngine::new(EngineConfig::default()).with_clock(clock.clone());
        for i in 0..self.components {
            engine.register(Self::random_component(rng, i));
        }
        if self.components > 0 {
            for _ in 0..interactions {
                let id = ComponentId::new(format!("c{}", rng.gen_range(0..self.components)));
                let action = ACTIONS[rng.gen_range(0..ACTIONS.len())];
                if let Err(e) = engine.record_interaction(&id, action) {
                    warn!("Bench interaction on {} failed: {}", id, e);
                }
                clock.advance(Duration::minutes(rng.gen_range(1..30)));
            }
        }
        engine
    }

    fn time_passes(&self, name: &str, engine: &mut AttentionEngine) -> BenchmarkResult {
        for _ in 0..self.warmup {
            engine.allocate();
        }
        let mut samples = Vec::with_capacity(self.iterations);
        let start = Instant::now();
        for _ in 0..self.iterations {
            let iter_start = Instant::now();
            engine.allocate();
            samples.push(iter_start.elapsed().as_micros() as u64);
        }
        BenchmarkResult::from_samples(name, &samples, start.elapsed().as_millis() as u64)
    }

    pub fn run_cold_allocation_bench(&self) -> BenchmarkResult {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut engine = self.build_engine(&mut rng, 0);
        self.time_passes("allocation_cold", &mut engine)
    }

    pub fn run_learned_allocation_bench(&self) -> BenchmarkResult {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut engine = self.build_engine(&mut rng, 200);
        self.time_passes("allocation_learned", &mut engine)
    }

    pub fn run_all(&self) -> Vec<BenchmarkResult> {
        vec![self.run_cold_allocation_bench(), self.run_learned_allocation_bench()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_runs() {
        let results = BenchmarkRunner::new(3, 8).run_all();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.iterations == 3));
        assert_eq!(results[0].name, "allocation_cold");
    }

    #[test]
    fn test_learned_bench_records_every_interaction() {
        let runner = BenchmarkRunner::new(1, 4);
        let mut rng = StdRng::seed_from_u64(runner.seed);
        let engine = runner.build_engine(&mut rng, 60);
        assert_eq!(engine.learner().ledger().len(), 60);
        assert!(engine.adjustments_active());
    }

    #[test]
    fn test_bench_without_components() {
        let result = BenchmarkRunner::new(2, 0).run_learned_allocation_bench();
        assert_eq!(result.iterations, 2);
    }
}
