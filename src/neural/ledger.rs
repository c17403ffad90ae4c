//! Interaction ledger
//!
//! Bounded FIFO of user interactions with components, each tagged with the
//! feature vector and a compact copy of the context at that instant. A
//! parallel training set of labeled examples grows for the whole session.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::core::component::{ComponentDescriptor, ComponentId};
use crate::core::context::Context;
use crate::core::patterns::{time_of_day, FeatureVector};

/// User action against a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionAction {
    Activate,
    Inspect,
    Dismiss,
    Ignore,
}

impl InteractionAction {
    /// Activate and inspect count as engagement
    pub fn is_positive(self) -> bool {
        matches!(self, InteractionAction::Activate | InteractionAction::Inspect)
    }

    pub fn label(self) -> f64 {
        if self.is_positive() {
            1.0
        } else {
            0.0
        }
    }
}

impl fmt::Display for InteractionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InteractionAction::Activate => "activate",
            InteractionAction::Inspect => "inspect",
            InteractionAction::Dismiss => "dismiss",
            InteractionAction::Ignore => "ignore",
        };
        f.write_str(s)
    }
}

/// Context fields kept with every interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSummary {
    pub time_of_day: f64,
    pub noise_level: f64,
    pub viewer_count: u32,
    pub is_busy: bool,
    pub in_focus_mode: bool,
}

impl ContextSummary {
    pub fn capture(context: &Context, at: &DateTime<Local>) -> Self {
        Self {
            time_of_day: time_of_day(at),
            noise_level: context.environment.noise_level,
            viewer_count: context.environment.viewer_count,
            is_busy: context.user.is_busy,
            in_focus_mode: context.user.in_focus_mode,
        }
    }
}

/// Immutable record of one interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Local>,
    pub component_id: ComponentId,
    #[serde(default)]
    pub component_kind: String,
    pub action: InteractionAction,
    pub features: FeatureVector,
    pub context: ContextSummary,
}

impl InteractionRecord {
    pub fn new(
        component: &ComponentDescriptor,
        action: InteractionAction,
        context: &Context,
        features: FeatureVector,
        at: DateTime<Local>,
    ) -> Self {
        Self {
            timestamp: at,
            component_id: component.id.clone(),
            component_kind: component.kind.clone(),
            action,
            features,
            context: ContextSummary::capture(context, &at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub features: FeatureVector,
    pub label: f64,
}

pub struct InteractionLedger {
    records: VecDeque<InteractionRecord>,
    capacity: usize,
    training: Vec<TrainingExample>,
}

impl InteractionLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            training: Vec::new(),
        }
    }

    /// Append a record and its training example.
    ///
    /// Returns the training set size after the append.
    pub fn append(&mut self, record: InteractionRecord) -> usize {
        self.training.push(TrainingExample {
            features: record.features.clone(),
            label: record.action.label(),
        });
        self.push_record(record);
        self.training.len()
    }

    fn push_record(&mut self, record: InteractionRecord) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Replace the history without touching the training set.
    ///
    /// Only the newest `capacity` records are kept.
    pub fn restore(&mut self, history: Vec<InteractionRecord>) {
        self.records.clear();
        let skip = history.len().saturating_sub(self.capacity);
        for record in history.into_iter().skip(skip) {
            self.push_record(record);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.training.clear();
    }

    /// Oldest first
    pub fn records(&self) -> impl Iterator<Item = &InteractionRecord> + '_ {
        self.records.iter()
    }

    /// The newest `limit` records, oldest first
    pub fn recent(&self, limit: usize) -> Vec<InteractionRecord> {
        let skip = self.records.len().saturating_sub(limit);
        self.records.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn training_set(&self) -> &[TrainingExample] {
        &self.training
    }

    pub fn training_len(&self) -> usize {
        self.training.len()
    }

    /// Fraction of this component's interactions that were positive
    pub fn engagement_rate(&self, id: &ComponentId) -> Option<f64> {
        let (positive, total) = self
            .records
            .iter()
            .filter(|r| &r.component_id == id)
            .fold((0usize, 0usize), |(p, t), r| (p + r.action.is_positive() as usize, t + 1));
        if total == 0 {
            None
        } else {
            Some(positive as f64 / total as f64)
        }
    }

    pub fn last_interaction(&self, id: &ComponentId) -> Option<DateTime<Local>> {
        self.records
            .iter()
            .filter(|r| &r.component_id == id)
            .map(|r| r.timestamp)
            .max()
    }

    pub fn count_since(&self, id: &ComponentId, since: DateTime<Local>) -> usize {
        self.records
            .iter()
            .filter(|r| &r.component_id == id && r.timestamp >= since)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, hour, 0, 0).unwrap()
    }

    fn record(id: &str, action: InteractionAction, when: DateTime<Local>) -> InteractionRecord {
        let comp = ComponentDescriptor::new(id).with_kind("toast");
        InteractionRecord::new(&comp, action, &Context::default(), FeatureVector::new(), when)
    }

    #[test]
    fn test_labels() {
        assert_eq!(InteractionAction::Activate.label(), 1.0);
        assert_eq!(InteractionAction::Inspect.label(), 1.0);
        assert_eq!(InteractionAction::Dismiss.label(), 0.0);
        assert_eq!(InteractionAction::Ignore.label(), 0.0);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut ledger = InteractionLedger::new(3);
        for hour in 0..5 {
            ledger.append(record("a", InteractionAction::Activate, at(hour)));
        }
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.records().next().map(|r| r.timestamp), Some(at(2)));
        // Training set is not capped by the ledger
        assert_eq!(ledger.training_len(), 5);
    }

    #[test]
    fn test_engagement_rate_per_component() {
        let mut ledger = InteractionLedger::new(10);
        ledger.append(record("a", InteractionAction::Activate, at(9)));
        ledger.append(record("a", InteractionAction::Dismiss, at(10)));
        ledger.append(record("a", InteractionAction::Inspect, at(11)));
        ledger.append(record("b", InteractionAction::Ignore, at(11)));

        let rate = ledger.engagement_rate(&"a".into()).unwrap();
        assert!((rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(ledger.engagement_rate(&"b".into()), Some(0.0));
        assert_eq!(ledger.engagement_rate(&"c".into()), None);
    }

    #[test]
    fn test_last_and_count_since() {
        let mut ledger = InteractionLedger::new(10);
        ledger.append(record("a", InteractionAction::Activate, at(8)));
        ledger.append(record("a", InteractionAction::Activate, at(14)));

        assert_eq!(ledger.last_interaction(&"a".into()), Some(at(14)));
        assert_eq!(ledger.count_since(&"a".into(), at(14) - Duration::hours(2)), 1);
        assert_eq!(ledger.count_since(&"a".into(), at(0)), 2);
    }

    #[test]
    fn test_restore_keeps_training_set() {
        let mut ledger = InteractionLedger::new(2);
        ledger.append(record("a", InteractionAction::Activate, at(1)));
        ledger.restore(vec![
            record("x", InteractionAction::Ignore, at(2)),
            record("y", InteractionAction::Ignore, at(3)),
            record("z", InteractionAction::Ignore, at(4)),
        ]);
        let ids: Vec<String> = ledger.records().map(|r| r.component_id.to_string()).collect();
        assert_eq!(ids, vec!["y", "z"]);
        assert_eq!(ledger.training_len(), 1);
    }

    #[test]
    fn test_recent_returns_newest() {
        let mut ledger = InteractionLedger::new(10);
        for hour in 0..4 {
            ledger.append(record("a", InteractionAction::Ignore, at(hour)));
        }
        let recent = ledger.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, at(2));
        assert_eq!(recent[1].timestamp, at(3));
    }
}
