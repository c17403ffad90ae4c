//! Scenario files and engine events
//!
//! A scenario is a TOML file describing pool capacities, an initial context,
//! components to register and an ordered list of steps. The same
//! [`EngineEvent`] type is read as newline-delimited JSON by the `run`
//! command.
//!
//! ```toml
//! [pools]
//! screen = 100.0
//! audio = 10.0
//! cognitive = 3.0
//!
//! [[components]]
//! id = "incoming-call"
//! urgency = "critical"
//! attention_weight = 100.0
//! needs = { screen = 10.0, audio = 2.0, cognitive = 0.5 }
//!
//! [[steps]]
//! event = "context"
//! update = { user = { is_busy = true } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::allocator::AllocationReport;
use crate::core::component::{ComponentDescriptor, ComponentId};
use crate::core::context::{Context, ContextUpdate, PoolCapacities};
use crate::core::engine::AttentionEngine;
use crate::error::{EngineError, Result};
use crate::neural::ledger::InteractionAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    Register {
        component: ComponentDescriptor,
    },
    Unregister {
        component: ComponentId,
    },
    Context {
        update: ContextUpdate,
    },
    Interaction {
        component: ComponentId,
        action: InteractionAction,
        #[serde(default = "one")]
        repeat: usize,
    },
    /// Force an allocation pass without changing anything
    Allocate,
}

fn one() -> usize {
    1
}

impl EngineEvent {
    /// Apply to `engine`. Returns the report when the event ran a pass.
    pub fn apply(self, engine: &mut AttentionEngine) -> Result<Option<AllocationReport>> {
        match self {
            EngineEvent::Register { component } => Ok(Some(engine.register(component).clone())),
            EngineEvent::Unregister { component } => {
                Ok(Some(engine.unregister(&component)?.clone()))
            }
            EngineEvent::Context { update } => Ok(Some(engine.update(update).clone())),
            EngineEvent::Interaction { component, action, repeat } => {
                for _ in 0..repeat {
                    engine.record_interaction(&component, action)?;
                }
                Ok(None)
            }
            EngineEvent::Allocate => Ok(Some(engine.allocate().clone())),
        }
    }

    pub fn from_json_line(line: &str) -> Result<Self> {
        serde_json::from_str(line)
            .map_err(|e| EngineError::Scenario(format!("bad event {:?}: {}", line, e)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub pools: Option<PoolCapacities>,
    pub context: Option<Context>,
    pub components: Vec<ComponentDescriptor>,
    pub steps: Vec<EngineEvent>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EngineError::Scenario(e.to_string()))
    }

    /// Seed context and pools, register the components, then run every step.
    ///
    /// Returns one report per pass, in order.
    pub fn run(self, engine: &mut AttentionEngine) -> Result<Vec<AllocationReport>> {
        let mut reports = Vec::new();
        let mut seed = match self.context {
            Some(context) => ContextUpdate {
                environment: Some(context.environment),
                user: Some(context.user),
                interaction: Some(context.interaction),
                device: Some(context.device),
                network: Some(context.network),
                attention_pools: Some(context.attention_pools.capacity()),
            },
            None => ContextUpdate::default(),
        };
        if let Some(pools) = self.pools {
            seed.attention_pools = Some(pools);
        }
        if !seed.is_empty() {
            reports.push(engine.update(seed).clone());
        }
        for component in self.components {
            reports.push(engine.register(component).clone());
        }
        for step in self.steps {
            if let Some(report) = step.apply(engine)? {
                reports.push(report);
            }
        }
        Ok(reports)
    }
}
