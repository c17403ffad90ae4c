//! Attention engine
//!
//! Composition root owning the context snapshot, the component registry, the
//! online learner and the subscriber list. Every mutation of the context or
//! the registry synchronously runs one full allocation pass and then notifies
//! subscribers, in that order, before returning.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::allocator::{AllocationEntry, AllocationReport, BudgetAllocator, Candidate};
use super::component::{AttentionState, ComponentDescriptor, ComponentId};
use super::config::EngineConfig;
use super::context::{Context, ContextUpdate};
use super::scorer::AttentionScorer;
use crate::error::{EngineError, Result};
use crate::neural::learner::OnlineLearner;
use crate::neural::ledger::InteractionAction;
use crate::neural::persistence::{LearningSnapshot, SnapshotStore};

/// Time source for feature extraction and interaction timestamps
pub trait Clock: Send {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Local>>>);

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self(Arc::new(Mutex::new(start)))
    }

    pub fn set(&self, at: DateTime<Local>) {
        if let Ok(mut now) = self.0.lock() {
            *now = at;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut now) = self.0.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        match self.0.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Interaction reported by an input-recognition front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub component: ComponentId,
    pub action: InteractionAction,
    /// Context at the time of the action; the engine's current one if absent
    #[serde(default)]
    pub context: Option<Context>,
    /// Descriptor at the time of the action, for components that may
    /// already be unregistered when the event arrives
    #[serde(default)]
    pub descriptor: Option<ComponentDescriptor>,
}

/// Receiver of interaction events
pub trait InteractionSink {
    fn on_interaction(&mut self, event: InteractionEvent) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Subscriber = Box<dyn FnMut(&Context, &AllocationReport) + Send>;

/// Unregistered descriptors kept so late interactions can still be recorded
const RETIRED_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct RegisteredComponent {
    descriptor: ComponentDescriptor,
    state: AttentionState,
    score: f64,
}

pub struct AttentionEngine {
    config: EngineConfig,
    context: Context,
    components: Vec<RegisteredComponent>,
    retired: VecDeque<ComponentDescriptor>,
    learner: OnlineLearner,
    allocator: BudgetAllocator,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    last_report: AllocationReport,
    passes: u64,
    clock: Box<dyn Clock>,
}

impl AttentionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_context(config, Context::default())
    }

    pub fn with_context(config: EngineConfig, context: Context) -> Self {
        let learner = OnlineLearner::new(&config);
        let allocator = BudgetAllocator::new(config.activation_threshold);
        Self {
            config,
            context,
            components: Vec::new(),
            retired: VecDeque::new(),
            learner,
            allocator,
            subscribers: Vec::new(),
            next_subscription: 0,
            last_report: AllocationReport::default(),
            passes: 0,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn learner(&self) -> &OnlineLearner {
        &self.learner
    }

    pub fn last_report(&self) -> &AllocationReport {
        &self.last_report
    }

    /// Registered descriptors in registration order
    pub fn components(&self) -> impl Iterator<Item = &ComponentDescriptor> + '_ {
        self.components.iter().map(|c| &c.descriptor)
    }

    pub fn state_of(&self, id: &ComponentId) -> Option<AttentionState> {
        self.find(id).map(|c| c.state)
    }

    /// Score from the last pass; `None` for hidden or unknown components
    pub fn score_of(&self, id: &ComponentId) -> Option<f64> {
        self.find(id)
            .filter(|c| c.state != AttentionState::Hidden)
            .map(|c| c.score)
    }

    fn find(&self, id: &ComponentId) -> Option<&RegisteredComponent> {
        self.components.iter().find(|c| &c.descriptor.id == id)
    }

    /// Shallow-merge a context update, reallocate, then notify subscribers
    pub fn update(&mut self, update: ContextUpdate) -> &AllocationReport {
        let changed = self.context.apply(update);
        debug!("Context update: {:?}", changed);
        self.notify()
    }

    /// Register a component, or replace the descriptor of an already
    /// registered id in place (its registration position is kept).
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> &AllocationReport {
        self.retired.retain(|d| d.id != descriptor.id);
        match self.components.iter_mut().find(|c| c.descriptor.id == descriptor.id) {
            Some(existing) => {
                debug!("Re-registered {}", descriptor.id);
                existing.descriptor = descriptor;
            }
            None => {
                debug!("Registered {}", descriptor.id);
                self.components.push(RegisteredComponent {
                    descriptor,
                    state: AttentionState::Deferred,
                    score: 0.0,
                });
            }
        }
        self.notify()
    }

    pub fn unregister(&mut self, id: &ComponentId) -> Result<&AllocationReport> {
        let index = self
            .components
            .iter()
            .position(|c| &c.descriptor.id == id)
            .ok_or_else(|| EngineError::UnknownComponent(id.to_string()))?;
        let removed = self.components.remove(index);
        debug!("Unregistered {}", id);
        self.retire(removed.descriptor);
        Ok(self.notify())
    }

    fn retire(&mut self, descriptor: ComponentDescriptor) {
        self.retired.retain(|d| d.id != descriptor.id);
        if self.retired.len() == RETIRED_CAPACITY {
            self.retired.pop_front();
        }
        self.retired.push_back(descriptor);
    }

    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(&Context, &AllocationReport) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self) -> &AllocationReport {
        self.allocate();
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&self.context, &self.last_report);
        }
        &self.last_report
    }

    /// Learned adjustments apply only once enabled and warmed up
    pub fn adjustments_active(&self) -> bool {
        self.config.learning_enabled && self.learner.is_warm()
    }

    /// Score a component against the current context
    pub fn score(&self, descriptor: &ComponentDescriptor) -> f64 {
        let base = AttentionScorer::base_score(descriptor, &self.context);
        if !self.adjustments_active() {
            return base;
        }
        let features = self.learner.features(descriptor, &self.context, self.clock.now());
        let adjustment = self.learner.adjustment(&features);
        (base * (1.0 + adjustment)).clamp(0.0, self.config.score_ceiling)
    }

    /// Run one full allocation pass and write states and pool usage back
    pub fn allocate(&mut self) -> &AllocationReport {
        let adjusted = self.adjustments_active();
        let candidates: Vec<Candidate> = self
            .components
            .iter()
            .filter(|c| !c.descriptor.hidden)
            .map(|c| Candidate {
                id: c.descriptor.id.clone(),
                score: self.score(&c.descriptor),
                needs: c.descriptor.needs,
            })
            .collect();

        let (mut entries, used) = self
            .allocator
            .allocate(candidates, &self.context.attention_pools);

        for component in self.components.iter_mut() {
            if component.descriptor.hidden {
                component.state = AttentionState::Hidden;
                component.score = 0.0;
                entries.push(AllocationEntry {
                    id: component.descriptor.id.clone(),
                    score: 0.0,
                    state: AttentionState::Hidden,
                });
            } else if let Some(entry) = entries.iter().find(|e| e.id == component.descriptor.id) {
                component.state = entry.state;
                component.score = entry.score;
            }
        }

        self.context.attention_pools.set_usage(&used);
        self.passes += 1;
        self.last_report = AllocationReport {
            pass: self.passes,
            entries,
            usage: used,
            capacity: self.context.attention_pools.capacity(),
            adjusted,
        };
        debug!(
            "Pass {}: {} allocated, {} deferred \
             (screen {:.1}/{:.1}, audio {:.1}/{:.1}, cognitive {:.2}/{:.2})",
            self.passes,
            self.last_report.count(AttentionState::Allocated),
            self.last_report.count(AttentionState::Deferred),
            used.screen,
            self.context.attention_pools.max_screen_space,
            used.audio,
            self.context.attention_pools.max_audio_time,
            used.cognitive,
            self.context.attention_pools.max_cognitive_load,
        );
        &self.last_report
    }

    /// Record a user action against a registered or recently unregistered
    /// component.
    ///
    /// Does not trigger an allocation pass; the learned effect shows up on the
    /// next context or registry change.
    pub fn record_interaction(
        &mut self,
        id: &ComponentId,
        action: InteractionAction,
    ) -> Result<usize> {
        let descriptor = self.descriptor_for(id)?;
        self.record_with_context(&descriptor, action, None)
    }

    /// Live registration first, then the most recently unregistered descriptor
    fn descriptor_for(&self, id: &ComponentId) -> Result<ComponentDescriptor> {
        self.find(id)
            .map(|c| &c.descriptor)
            .or_else(|| self.retired.iter().rev().find(|d| &d.id == id))
            .cloned()
            .ok_or_else(|| EngineError::UnknownComponent(id.to_string()))
    }

    fn record_with_context(
        &mut self,
        descriptor: &ComponentDescriptor,
        action: InteractionAction,
        context: Option<&Context>,
    ) -> Result<usize> {
        let now = self.clock.now();
        let context = context.unwrap_or(&self.context);
        Ok(self.learner.record(descriptor, action, context, now))
    }

    pub fn snapshot_learning(&self) -> LearningSnapshot {
        LearningSnapshot {
            interaction_history: self.learner.ledger().recent(self.config.persist_history_limit),
            weights: self.learner.weights().clone(),
            saved_at: self.clock.now().with_timezone(&Utc),
        }
    }

    pub fn persist_learning(&self, store: &dyn SnapshotStore) -> Result<()> {
        let snapshot = self.snapshot_learning();
        store.save(&snapshot)?;
        info!("Saved {} interactions", snapshot.interaction_history.len());
        Ok(())
    }

    /// Restore history and weights. Any failure is logged and the engine
    /// starts cold. Returns whether a snapshot was applied.
    pub fn restore_learning(&mut self, store: &dyn SnapshotStore) -> bool {
        match store.load() {
            Ok(Some(snapshot)) => {
                info!(
                    "Restored {} interactions saved at {}",
                    snapshot.interaction_history.len(),
                    snapshot.saved_at
                );
                self.learner.restore(snapshot.interaction_history, snapshot.weights);
                true
            }
            Ok(None) => {
                debug!("No learning snapshot, starting cold");
                false
            }
            Err(e) => {
                warn!("Failed to load learning snapshot, starting cold: {}", e);
                self.learner.reset();
                false
            }
        }
    }

    pub fn reset_learning(&mut self) {
        self.learner.reset();
        info!("Learning state reset");
    }
}

impl InteractionSink for AttentionEngine {
    fn on_interaction(&mut self, event: InteractionEvent) -> Result<()> {
        let descriptor = match event.descriptor {
            Some(descriptor) if descriptor.id == event.component => Ok(descriptor),
            _ => self.descriptor_for(&event.component),
        };
        let recorded = descriptor.and_then(|descriptor| {
            self.record_with_context(&descriptor, event.action, event.context.as_ref())
        });
        match recorded {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Dropped {} interaction: {}", event.action, e);
                Err(e)
            }
        }
    }
}
