//! Greedy attention budget allocation
//!
//! Candidates are admitted in descending score order while all three pools
//! have room and the score clears the activation threshold. This is a
//! knapsack-style heuristic, not an optimal packing.

use serde::{Deserialize, Serialize};

use super::component::{AttentionState, ComponentId, ResourceNeeds};
use super::context::{AttentionPools, PoolCapacities};

/// A scored component entering an allocation pass
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: ComponentId,
    pub score: f64,
    pub needs: ResourceNeeds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub id: ComponentId,
    pub score: f64,
    pub state: AttentionState,
}

/// Outcome of one allocation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub pass: u64,
    /// Scored components in admission order, then hidden ones
    pub entries: Vec<AllocationEntry>,
    pub usage: ResourceNeeds,
    pub capacity: PoolCapacities,
    /// Whether learned adjustments were applied
    pub adjusted: bool,
}

impl Default for AllocationReport {
    fn default() -> Self {
        let pools = AttentionPools::default();
        Self {
            pass: 0,
            entries: Vec::new(),
            usage: ResourceNeeds::default(),
            capacity: pools.capacity(),
            adjusted: false,
        }
    }
}

impl AllocationReport {
    pub fn count(&self, state: AttentionState) -> usize {
        self.entries.iter().filter(|e| e.state == state).count()
    }

    pub fn entry(&self, id: &ComponentId) -> Option<&AllocationEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn allocated(&self) -> impl Iterator<Item = &ComponentId> + '_ {
        self.entries
            .iter()
            .filter(|e| e.state == AttentionState::Allocated)
            .map(|e| &e.id)
    }
}

pub struct BudgetAllocator {
    threshold: f64,
}

impl BudgetAllocator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Admit candidates greedily. `candidates` must be in registration order;
    /// equal scores keep that order.
    ///
    /// Returns the decisions in admission order and the final pool usage.
    pub fn allocate(
        &self,
        mut candidates: Vec<Candidate>,
        pools: &AttentionPools,
    ) -> (Vec<AllocationEntry>, ResourceNeeds) {
        // Stable sort: ties stay in registration order
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut used = ResourceNeeds::default();
        let entries = candidates
            .into_iter()
            .map(|c| {
                let state = if c.score > self.threshold && pools.admits(&used, &c.needs) {
                    used.screen += c.needs.screen;
                    used.audio += c.needs.audio;
                    used.cognitive += c.needs.cognitive;
                    AttentionState::Allocated
                } else {
                    AttentionState::Deferred
                };
                AllocationEntry { id: c.id, score: c.score, state }
            })
            .collect();

        (entries, used)
    }
}

impl Default for BudgetAllocator {
    fn default() -> Self {
        Self::new(10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, score: f64, screen: f64, audio: f64, cognitive: f64) -> Candidate {
        Candidate {
            id: id.into(),
            score,
            needs: ResourceNeeds::new(screen, audio, cognitive),
        }
    }

    fn state_of(entries: &[AllocationEntry], id: &str) -> AttentionState {
        entries
            .iter()
            .find(|e| e.id.as_str() == id)
            .map(|e| e.state)
            .unwrap()
    }

    #[test]
    fn test_higher_score_wins_contended_pool() {
        let pools = AttentionPools::with_capacity(100.0, 10.0, 3.0);
        let (entries, used) = BudgetAllocator::default().allocate(
            vec![candidate("low", 40.0, 60.0, 0.0, 0.0), candidate("high", 80.0, 60.0, 0.0, 0.0)],
            &pools,
        );
        assert_eq!(state_of(&entries, "high"), AttentionState::Allocated);
        assert_eq!(state_of(&entries, "low"), AttentionState::Deferred);
        assert_eq!(used.screen, 60.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let pools = AttentionPools::default();
        let (entries, used) = BudgetAllocator::default().allocate(
            vec![
                candidate("edge", 10.0, 1.0, 0.0, 0.0),
                candidate("above", 10.5, 1.0, 0.0, 0.0),
            ],
            &pools,
        );
        assert_eq!(state_of(&entries, "edge"), AttentionState::Deferred);
        assert_eq!(state_of(&entries, "above"), AttentionState::Allocated);
        assert_eq!(used.screen, 1.0);
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let pools = AttentionPools::with_capacity(50.0, 10.0, 3.0);
        let (entries, _) = BudgetAllocator::default().allocate(
            vec![
                candidate("first", 30.0, 40.0, 0.0, 0.0),
                candidate("second", 30.0, 40.0, 0.0, 0.0),
            ],
            &pools,
        );
        assert_eq!(entries[0].id.as_str(), "first");
        assert_eq!(state_of(&entries, "first"), AttentionState::Allocated);
        assert_eq!(state_of(&entries, "second"), AttentionState::Deferred);
    }

    #[test]
    fn test_oversized_needs_always_deferred() {
        let pools = AttentionPools::with_capacity(100.0, 10.0, 3.0);
        let huge = candidate("huge", 500.0, 10.0, 11.0, 0.0);
        let (entries, used) = BudgetAllocator::default().allocate(vec![huge], &pools);
        assert_eq!(state_of(&entries, "huge"), AttentionState::Deferred);
        assert_eq!(used, ResourceNeeds::default());
    }

    #[test]
    fn test_skips_then_fills_smaller() {
        let pools = AttentionPools::with_capacity(100.0, 10.0, 3.0);
        let (entries, used) = BudgetAllocator::default().allocate(
            vec![
                candidate("a", 90.0, 70.0, 0.0, 1.0),
                candidate("b", 80.0, 40.0, 0.0, 1.0),
                candidate("c", 70.0, 30.0, 0.0, 1.0),
            ],
            &pools,
        );
        assert_eq!(state_of(&entries, "a"), AttentionState::Allocated);
        assert_eq!(state_of(&entries, "b"), AttentionState::Deferred);
        assert_eq!(state_of(&entries, "c"), AttentionState::Allocated);
        assert_eq!(used.screen, 100.0);
        assert_eq!(used.cognitive, 2.0);
    }

    #[test]
    fn test_usage_never_exceeds_caps() {
        let pools = AttentionPools::with_capacity(100.0, 10.0, 3.0);
        let candidates: Vec<Candidate> = (0..40)
            .map(|i| {
                let f = i as f64;
                candidate(
                    &format!("c{}", i),
                    11.0 + (f * 7.0) % 50.0,
                    (f * 13.0) % 45.0,
                    (f * 3.0) % 4.0,
                    (f * 0.7) % 1.5,
                )
            })
            .collect();
        let (entries, used) = BudgetAllocator::default().allocate(candidates, &pools);

        assert!(used.screen <= 100.0);
        assert!(used.audio <= 10.0);
        assert!(used.cognitive <= 3.0);
        assert!(entries
            .iter()
            .all(|e| matches!(e.state, AttentionState::Allocated | AttentionState::Deferred)));
    }
}
