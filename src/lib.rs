//! Attention Budget
//!
//! Allocates scarce attention resources (screen space, audio time and
//! cognitive load) among UI components competing for the user, and refines
//! the allocation from observed behavior.
//!
//! ## Features
//!
//! - **Context Store**: environment, user and device state with change notification
//! - **Attention Scoring**: urgency-weighted scores with busy, focus and noise penalties
//! - **Budget Allocation**: greedy, score-ordered admission under three pool caps
//! - **Online Learning**: time, similarity and context engagement patterns
//! - **Insights**: engagement statistics for dashboards
//!
//! ## Guarantees
//!
//! - Pool usage never exceeds capacity after a pass
//! - Equal scores keep registration order
//! - Learned adjustments stay neutral until enough examples are recorded

pub mod bench;
pub mod core;
pub mod dashboard;
pub mod error;
pub mod neural;
pub mod scenario;

// Re-exports
pub use crate::core::allocator::{AllocationEntry, AllocationReport, BudgetAllocator};
pub use crate::core::component::{
    AttentionState, ComponentDescriptor, ComponentId, PriorityClass, ResourceNeeds, Sensitivity,
    Urgency,
};
pub use crate::core::config::EngineConfig;
pub use crate::core::context::{
    AttentionPools, Context, ContextUpdate, Environment, InteractionState, Lighting, Modality,
    UserState,
};
pub use crate::core::engine::{
    AttentionEngine, Clock, InteractionEvent, InteractionSink, ManualClock, SystemClock,
};
pub use crate::core::patterns::{cosine_similarity, FeatureVector};
pub use crate::core::scorer::AttentionScorer;
pub use crate::dashboard::LearningInsights;
pub use crate::error::{EngineError, Result};
pub use crate::neural::learner::OnlineLearner;
pub use crate::neural::ledger::{InteractionAction, InteractionLedger, InteractionRecord};
pub use crate::neural::persistence::{
    FileSnapshotStore, LearningSnapshot, MemorySnapshotStore, SnapshotStore,
};
pub use crate::scenario::{EngineEvent, Scenario};
