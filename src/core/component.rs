//! Component descriptors competing for attention
//!
//! Descriptors are resolved once, at registration time. Fields missing from a
//! serialized descriptor fall back to their documented defaults instead of
//! failing: urgency `medium`, attention weight `50`, no resource needs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a registered component
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Urgency {
    /// Score multiplier applied to the attention weight
    pub fn multiplier(self) -> f64 {
        match self {
            Urgency::Critical => 2.0,
            Urgency::High => 1.5,
            Urgency::Medium => 1.0,
            Urgency::Low => 0.5,
        }
    }

    /// Feature encoding, 0 (low) to 3 (critical)
    pub fn level(self) -> f64 {
        match self {
            Urgency::Critical => 3.0,
            Urgency::High => 2.0,
            Urgency::Medium => 1.0,
            Urgency::Low => 0.0,
        }
    }
}

/// Six-level importance class, most important first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityClass {
    Emergency,
    Critical,
    Primary,
    #[default]
    Secondary,
    Tertiary,
    Background,
}

impl PriorityClass {
    /// Feature encoding, 0 (background) to 5 (emergency)
    pub fn level(self) -> f64 {
        match self {
            PriorityClass::Emergency => 5.0,
            PriorityClass::Critical => 4.0,
            PriorityClass::Primary => 3.0,
            PriorityClass::Secondary => 2.0,
            PriorityClass::Tertiary => 1.0,
            PriorityClass::Background => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Private,
    #[default]
    Public,
}

/// Marginal cost of allocating a component, one amount per attention pool
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceNeeds {
    pub screen: f64,
    pub audio: f64,
    pub cognitive: f64,
}

impl ResourceNeeds {
    pub fn new(screen: f64, audio: f64, cognitive: f64) -> Self {
        Self { screen, audio, cognitive }
    }
}

/// Outcome written back to a component by an allocation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionState {
    Allocated,
    Deferred,
    /// Opted out of scoring entirely
    Hidden,
}

impl fmt::Display for AttentionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttentionState::Allocated => "allocated",
            AttentionState::Deferred => "deferred",
            AttentionState::Hidden => "hidden",
        };
        f.write_str(s)
    }
}

/// Declared attributes of an attention-competing component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub id: ComponentId,
    /// Component type, e.g. "toast" or "modal"
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub priority: PriorityClass,
    #[serde(default = "default_attention_weight")]
    pub attention_weight: f64,
    #[serde(default)]
    pub can_defer: bool,
    #[serde(default)]
    pub sensitivity: Sensitivity,
    #[serde(default)]
    pub needs: ResourceNeeds,
    #[serde(default)]
    pub hidden: bool,
}

fn default_attention_weight() -> f64 {
    50.0
}

impl ComponentDescriptor {
    pub fn new(id: impl Into<ComponentId>) -> Self {
        Self {
            id: id.into(),
            kind: String::new(),
            urgency: Urgency::default(),
            priority: PriorityClass::default(),
            attention_weight: default_attention_weight(),
            can_defer: false,
            sensitivity: Sensitivity::default(),
            needs: ResourceNeeds::default(),
            hidden: false,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_priority(mut self, priority: PriorityClass) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_weight(mut self, attention_weight: f64) -> Self {
        self.attention_weight = attention_weight;
        self
    }

    pub fn deferrable(mut self, can_defer: bool) -> Self {
        self.can_defer = can_defer;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_needs(mut self, screen: f64, audio: f64, cognitive: f64) -> Self {
        self.needs = ResourceNeeds::new(screen, audio, cognitive);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}
