//! Learning insights for external dashboards
//!
//! Everything here is derived from the interaction ledger and is never read
//! back by the allocator.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::component::ComponentId;
use crate::neural::learner::{OnlineLearner, WeightVector};

const PEAK_HOURS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEngagement {
    pub id: ComponentId,
    pub engaged: usize,
    pub interactions: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourEngagement {
    /// Local hour, 0-23
    pub hour: u32,
    pub interactions: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningInsights {
    pub total_interactions: usize,
    pub training_examples: usize,
    pub weights: WeightVector,
    pub engagement_rate: f64,
    pub top_components: Vec<ComponentEngagement>,
    pub peak_hours: Vec<HourEngagement>,
}

impl LearningInsights {
    pub fn collect(learner: &OnlineLearner, top_n: usize) -> Self {
        let ledger = learner.ledger();

        let mut total_engaged = 0usize;
        let mut per_component: HashMap<&ComponentId, (usize, usize)> = HashMap::new();
        let mut per_hour: HashMap<u32, (usize, usize)> = HashMap::new();

        for record in ledger.records() {
            let engaged = record.action.is_positive() as usize;
            total_engaged += engaged;

            let entry = per_component.entry(&record.component_id).or_default();
            entry.0 += engaged;
            entry.1 += 1;

            let entry = per_hour.entry(record.timestamp.hour()).or_default();
            entry.0 += engaged;
            entry.1 += 1;
        }

        let engagement_rate = if ledger.is_empty() {
            0.0
        } else {
            total_engaged as f64 / ledger.len() as f64
        };

        let mut top_components: Vec<ComponentEngagement> = per_component
            .into_iter()
            .map(|(id, (engaged, interactions))| ComponentEngagement {
                id: id.clone(),
                engaged,
                interactions,
                rate: engaged as f64 / interactions as f64,
            })
            .collect();
        top_components.sort_by(|a, b| b.engaged.cmp(&a.engaged).then_with(|| a.id.cmp(&b.id)));
        top_components.truncate(top_n);

        let mut peak_hours: Vec<HourEngagement> = per_hour
            .into_iter()
            .map(|(hour, (engaged, interactions))| HourEngagement {
                hour,
                interactions,
                rate: engaged as f64 / interactions as f64,
            })
            .collect();
        peak_hours.sort_by(|a, b| {
            b.rate
                .total_cmp(&a.rate)
                .then_with(|| b.interactions.cmp(&a.interactions))
                .then_with(|| a.hour.cmp(&b.hour))
        });
        peak_hours.truncate(PEAK_HOURS);

        Self {
            total_interactions: ledger.len(),
            training_examples: ledger.training_len(),
            weights: learner.weights().clone(),
            engagement_rate,
            top_components,
            peak_hours,
        }
    }
}
