//! Feature vectors for interaction learning
//!
//! A [`FeatureVector`] is a named, sparse numeric vector. Missing keys read as
//! zero, which lets vectors recorded under older feature sets still be
//! compared against current ones.

use chrono::{DateTime, Datelike, Duration, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::component::ComponentDescriptor;
use super::context::Context;
use crate::neural::ledger::InteractionLedger;

/// Feature names
pub mod keys {
    pub const URGENCY: &str = "urgency";
    pub const PRIORITY: &str = "priority";
    pub const CANNOT_DEFER: &str = "cannot_defer";
    pub const ATTENTION_WEIGHT: &str = "attention_weight";
    pub const TIME_OF_DAY: &str = "time_of_day";
    pub const DAY_OF_WEEK: &str = "day_of_week";
    pub const NOISE: &str = "noise";
    pub const VIEWERS: &str = "viewers";
    pub const BUSY: &str = "busy";
    pub const FOCUS: &str = "focus";
    pub const HISTORICAL_ENGAGEMENT: &str = "historical_engagement";
    pub const CONTEXT_SIMILARITY: &str = "context_similarity";
    pub const RECENCY: &str = "recency";
    pub const FREQUENCY: &str = "frequency";
    pub const URGENCY_X_TIME: &str = "urgency_x_time";
    pub const NOISE_X_BUSY: &str = "noise_x_busy";
}

/// Keys forming the context sub-vector used for context similarity
pub const CONTEXT_KEYS: [&str; 6] = [
    keys::TIME_OF_DAY,
    keys::DAY_OF_WEEK,
    keys::NOISE,
    keys::VIEWERS,
    keys::BUSY,
    keys::FOCUS,
];

/// Neutral value for history-derived features with no history
const NEUTRAL: f64 = 0.5;
/// Interactions in the last 24h that saturate the frequency feature
const FREQUENCY_SATURATION: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(BTreeMap<String, f64>);

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), value);
    }

    /// Value for `key`, zero when absent
    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn magnitude(&self) -> f64 {
        self.0.values().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Copy of the entries whose key is listed in `keys`
    pub fn subset(&self, keys: &[&str]) -> FeatureVector {
        FeatureVector(
            self.0
                .iter()
                .filter(|(k, _)| keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        )
    }

    pub fn context_vector(&self) -> FeatureVector {
        self.subset(&CONTEXT_KEYS)
    }
}

impl FromIterator<(String, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        FeatureVector(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        FeatureVector(iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

/// Cosine similarity over the union of both key sets.
///
/// Returns 0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    let norm_a = a.magnitude();
    let norm_b = b.magnitude();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    // Keys only in `b` contribute 0 to the dot product
    let dot: f64 = a.iter().map(|(k, v)| v * b.get(k)).sum();
    dot / (norm_a * norm_b)
}

/// Local time as a fraction of the day, 0.0 at midnight
pub fn time_of_day(at: &DateTime<Local>) -> f64 {
    (at.hour() as f64 + at.minute() as f64 / 60.0) / 24.0
}

/// Monday = 0.0 ... Sunday = 6/7
pub fn day_of_week(at: &DateTime<Local>) -> f64 {
    at.weekday().num_days_from_monday() as f64 / 7.0
}

/// Build the full feature vector for `component` at `now`.
///
/// History-derived features are queried live from `ledger`.
pub fn extract_features(
    component: &ComponentDescriptor,
    context: &Context,
    ledger: &InteractionLedger,
    now: DateTime<Local>,
) -> FeatureVector {
    let mut f = FeatureVector::new();

    let urgency = component.urgency.level();
    f.set(keys::URGENCY, urgency);
    f.set(keys::PRIORITY, component.priority.level());
    f.set(keys::CANNOT_DEFER, if component.can_defer { 0.0 } else { 1.0 });
    f.set(keys::ATTENTION_WEIGHT, component.attention_weight);

    let tod = time_of_day(&now);
    let noise = context.environment.noise_level / 100.0;
    let busy = if context.user.is_busy { 1.0 } else { 0.0 };
    f.set(keys::TIME_OF_DAY, tod);
    f.set(keys::DAY_OF_WEEK, day_of_week(&now));
    f.set(keys::NOISE, noise);
    f.set(keys::VIEWERS, (context.environment.viewer_count as f64 + 1.0).ln());
    f.set(keys::BUSY, busy);
    f.set(keys::FOCUS, if context.user.in_focus_mode { 1.0 } else { 0.0 });

    f.set(
        keys::HISTORICAL_ENGAGEMENT,
        ledger.engagement_rate(&component.id).unwrap_or(NEUTRAL),
    );
    f.set(keys::CONTEXT_SIMILARITY, context_similarity(&f.context_vector(), ledger));
    f.set(keys::RECENCY, recency(component, ledger, now));
    let recent = ledger.count_since(&component.id, now - Duration::hours(24));
    f.set(keys::FREQUENCY, (recent as f64 / FREQUENCY_SATURATION).min(1.0));

    f.set(keys::URGENCY_X_TIME, urgency * tod);
    f.set(keys::NOISE_X_BUSY, noise * busy);
    f
}

/// Mean similarity between `current` and the context at every positive interaction
fn context_similarity(current: &FeatureVector, ledger: &InteractionLedger) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for record in ledger.records().filter(|r| r.action.is_positive()) {
        total += cosine_similarity(current, &record.features.context_vector());
        count += 1;
    }
    if count == 0 {
        NEUTRAL
    } else {
        total / count as f64
    }
}

fn recency(
    component: &ComponentDescriptor,
    ledger: &InteractionLedger,
    now: DateTime<Local>,
) -> f64 {
    match ledger.last_interaction(&component.id) {
        Some(last) => {
            let hours = (now - last).num_milliseconds() as f64 / 3_600_000.0;
            (-hours / 24.0).exp()
        }
        None => 1.0,
    }
}
