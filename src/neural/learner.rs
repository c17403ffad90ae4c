//! Online learning score adjuster
//!
//! Two pieces live here. Pattern detectors read the interaction ledger and
//! produce the multiplicative score adjustment used by the allocator. A
//! logistic weight vector is fitted by plain gradient descent on the labeled
//! training set every `retrain_every` examples.
//!
//! The update rule has no regularization and no learning-rate decay, so the
//! weights can drift without bound over long sessions with skewed
//! interaction distributions.

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::core::component::ComponentDescriptor;
use crate::core::config::EngineConfig;
use crate::core::context::Context;
use crate::core::patterns::{cosine_similarity, extract_features, keys, FeatureVector};

use super::ledger::{InteractionAction, InteractionLedger, InteractionRecord};

/// Seed weights for the logistic model
pub const DEFAULT_WEIGHTS: [(&str, f64); 16] = [
    (keys::URGENCY, 0.3),
    (keys::PRIORITY, 0.2),
    (keys::CANNOT_DEFER, 0.1),
    (keys::ATTENTION_WEIGHT, 0.01),
    (keys::TIME_OF_DAY, 0.05),
    (keys::DAY_OF_WEEK, 0.02),
    (keys::NOISE, -0.1),
    (keys::VIEWERS, -0.05),
    (keys::BUSY, -0.2),
    (keys::FOCUS, -0.15),
    (keys::HISTORICAL_ENGAGEMENT, 0.4),
    (keys::CONTEXT_SIMILARITY, 0.3),
    (keys::RECENCY, 0.2),
    (keys::FREQUENCY, 0.1),
    (keys::URGENCY_X_TIME, 0.05),
    (keys::NOISE_X_BUSY, -0.1),
];

pub const TIME_PATTERN_WEIGHT: f64 = 0.3;
pub const SIMILARITY_PATTERN_WEIGHT: f64 = 0.4;
pub const CONTEXT_PATTERN_WEIGHT: f64 = 0.3;

/// Max time-of-day distance (fraction of a day, ~2.4h) for the time pattern
const TIME_WINDOW: f64 = 0.1;
const MIN_TIME_MATCHES: usize = 5;
const SIMILARITY_THRESHOLD: f64 = 0.7;
const MIN_SIMILAR_MATCHES: usize = 3;
const MIN_CONTEXT_MATCHES: usize = 5;

pub type WeightVector = BTreeMap<String, f64>;

pub fn default_weights() -> WeightVector {
    DEFAULT_WEIGHTS.iter().map(|(k, w)| (k.to_string(), *w)).collect()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn dot(weights: &WeightVector, features: &FeatureVector) -> f64 {
    features
        .iter()
        .filter_map(|(k, v)| weights.get(k).map(|w| w * v))
        .sum()
}

/// Discrete context key: busy flag, focus flag, noise quartile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextBucket {
    pub busy: bool,
    pub focus: bool,
    pub noise_quartile: u8,
}

impl ContextBucket {
    pub fn from_features(features: &FeatureVector) -> Self {
        let quartile = (features.get(keys::NOISE) * 4.0).floor().clamp(0.0, 3.0) as u8;
        Self {
            busy: features.get(keys::BUSY) > 0.5,
            focus: features.get(keys::FOCUS) > 0.5,
            noise_quartile: quartile,
        }
    }
}

/// `(rate - 0.5) * 2` over the matching records, or 0 below `min_matches`
fn engagement_signal<'a>(
    matches: impl Iterator<Item = &'a InteractionRecord>,
    min_matches: usize,
) -> f64 {
    let (positive, total) = matches.fold((0usize, 0usize), |(p, t), r| {
        (p + r.action.is_positive() as usize, t + 1)
    });
    if total < min_matches {
        return 0.0;
    }
    let rate = positive as f64 / total as f64;
    (rate - 0.5) * 2.0
}

pub struct OnlineLearner {
    weights: WeightVector,
    ledger: InteractionLedger,
    warmup_examples: usize,
    retrain_every: usize,
    epochs: usize,
    learning_rate: f64,
    retrain_count: usize,
}

impl OnlineLearner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            weights: default_weights(),
            ledger: InteractionLedger::new(config.history_capacity),
            warmup_examples: config.warmup_examples,
            retrain_every: config.retrain_every.max(1),
            epochs: config.epochs,
            learning_rate: config.learning_rate,
            retrain_count: 0,
        }
    }

    pub fn ledger(&self) -> &InteractionLedger {
        &self.ledger
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn retrain_count(&self) -> usize {
        self.retrain_count
    }

    /// Enough training examples for adjustments to apply
    pub fn is_warm(&self) -> bool {
        self.ledger.training_len() >= self.warmup_examples
    }

    pub fn features(
        &self,
        component: &ComponentDescriptor,
        context: &Context,
        now: DateTime<Local>,
    ) -> FeatureVector {
        extract_features(component, context, &self.ledger, now)
    }

    /// Record an interaction, retraining when the training set reaches a
    /// multiple of `retrain_every`. Returns the training set size.
    pub fn record(
        &mut self,
        component: &ComponentDescriptor,
        action: InteractionAction,
        context: &Context,
        now: DateTime<Local>,
    ) -> usize {
        let features = self.features(component, context, now);
        let record = InteractionRecord::new(component, action, context, features, now);
        let examples = self.ledger.append(record);
        debug!("Recorded {} on {} ({} examples)", action, component.id, examples);

        if examples % self.retrain_every == 0 {
            self.retrain();
        }
        examples
    }

    /// Signed multiplier for a base score; 0 until warmed up
    pub fn adjustment(&self, features: &FeatureVector) -> f64 {
        if !self.is_warm() {
            return 0.0;
        }
        let time = self.find_time_pattern(features.get(keys::TIME_OF_DAY));
        let similarity = self.find_similarity_pattern(features);
        let context = self.find_context_pattern(ContextBucket::from_features(features));
        time * TIME_PATTERN_WEIGHT
            + similarity * SIMILARITY_PATTERN_WEIGHT
            + context * CONTEXT_PATTERN_WEIGHT
    }

    /// Engagement among interactions recorded within ~2.4h of `time_of_day`
    pub fn find_time_pattern(&self, time_of_day: f64) -> f64 {
        let matches = self
            .ledger
            .records()
            .filter(|r| (r.context.time_of_day - time_of_day).abs() < TIME_WINDOW);
        engagement_signal(matches, MIN_TIME_MATCHES)
    }

    /// Engagement among interactions whose features resemble `features`
    pub fn find_similarity_pattern(&self, features: &FeatureVector) -> f64 {
        let matches = self
            .ledger
            .records()
            .filter(|r| cosine_similarity(&r.features, features) > SIMILARITY_THRESHOLD);
        engagement_signal(matches, MIN_SIMILAR_MATCHES)
    }

    /// Engagement among interactions recorded in the same context bucket
    pub fn find_context_pattern(&self, bucket: ContextBucket) -> f64 {
        let matches = self
            .ledger
            .records()
            .filter(|r| ContextBucket::from_features(&r.features) == bucket);
        engagement_signal(matches, MIN_CONTEXT_MATCHES)
    }

    /// Probability of engagement under the current weights
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        sigmoid(dot(&self.weights, features))
    }

    /// Gradient descent over the whole training set for a fixed number of
    /// epochs. Only keys present in both the weights and an example move.
    pub fn retrain(&mut self) {
        let lr = self.learning_rate;
        for _ in 0..self.epochs {
            for example in self.ledger.training_set() {
                let error = example.label - sigmoid(dot(&self.weights, &example.features));
                for (key, value) in example.features.iter() {
                    if let Some(weight) = self.weights.get_mut(key) {
                        *weight += lr * error * value;
                    }
                }
            }
        }
        self.retrain_count += 1;
        info!(
            "Retrained on {} examples ({} epochs, run #{})",
            self.ledger.training_len(),
            self.epochs,
            self.retrain_count
        );
    }

    /// Replace history and weights; the training set starts over
    pub fn restore(&mut self, history: Vec<InteractionRecord>, weights: WeightVector) {
        self.ledger.restore(history);
        let mut restored = default_weights();
        restored.extend(weights);
        self.weights = restored;
    }

    pub fn reset(&mut self) {
        self.ledger.clear();
        self.weights = default_weights();
        self.retrain_count = 0;
    }
}
