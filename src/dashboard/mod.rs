//! Read-only diagnostics for external dashboards

pub mod insights;

pub use insights::{ComponentEngagement, HourEngagement, LearningInsights};
