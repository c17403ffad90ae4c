//! Context snapshot consumed by scoring and allocation
//!
//! A [`Context`] is owned by the engine and changed only through
//! [`ContextUpdate`], whose fields replace the matching top-level section
//! wholesale (no deep merge).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::component::ResourceNeeds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lighting {
    Dark,
    Dim,
    #[default]
    Normal,
    Bright,
}

/// Sensed surroundings of the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    /// Ambient noise, 0-100
    pub noise_level: f64,
    pub viewer_count: u32,
    pub lighting: Lighting,
    pub is_public: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            noise_level: 0.0,
            viewer_count: 1,
            lighting: Lighting::Normal,
            is_public: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserState {
    pub is_busy: bool,
    pub in_focus_mode: bool,
    pub prefers_reduced_motion: bool,
}

/// Input/output channel the user is currently engaged through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Visual,
    Voice,
    Touch,
    Keyboard,
    Pointer,
    Gesture,
}

/// Active interaction modalities, supplied by input-recognition collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionState {
    pub modalities: Vec<Modality>,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self { modalities: vec![Modality::Visual] }
    }
}

impl InteractionState {
    pub fn includes(&self, modality: Modality) -> bool {
        self.modalities.contains(&modality)
    }
}

/// Free-form quality fields (device class, battery, link quality...)
pub type QualityFields = BTreeMap<String, Value>;

/// Capacities of the three attention pools plus the usage of the last pass.
///
/// `used_*` are outputs of the allocator, recomputed on every pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionPools {
    pub max_screen_space: f64,
    pub used_screen_space: f64,
    pub max_audio_time: f64,
    pub used_audio_time: f64,
    pub max_cognitive_load: f64,
    pub used_cognitive_load: f64,
}

impl Default for AttentionPools {
    fn default() -> Self {
        Self::with_capacity(100.0, 10.0, 3.0)
    }
}

impl AttentionPools {
    pub fn with_capacity(screen: f64, audio: f64, cognitive: f64) -> Self {
        Self {
            max_screen_space: screen,
            used_screen_space: 0.0,
            max_audio_time: audio,
            used_audio_time: 0.0,
            max_cognitive_load: cognitive,
            used_cognitive_load: 0.0,
        }
    }

    pub fn capacity(&self) -> PoolCapacities {
        PoolCapacities {
            screen: self.max_screen_space,
            audio: self.max_audio_time,
            cognitive: self.max_cognitive_load,
        }
    }

    /// Whether `used + needs` stays within every cap
    pub fn admits(&self, used: &ResourceNeeds, needs: &ResourceNeeds) -> bool {
        used.screen + needs.screen <= self.max_screen_space
            && used.audio + needs.audio <= self.max_audio_time
            && used.cognitive + needs.cognitive <= self.max_cognitive_load
    }

    pub fn set_usage(&mut self, used: &ResourceNeeds) {
        self.used_screen_space = used.screen;
        self.used_audio_time = used.audio;
        self.used_cognitive_load = used.cognitive;
    }

    pub fn usage(&self) -> ResourceNeeds {
        ResourceNeeds::new(self.used_screen_space, self.used_audio_time, self.used_cognitive_load)
    }
}

/// Pool capacities as carried by a context update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolCapacities {
    pub screen: f64,
    pub audio: f64,
    pub cognitive: f64,
}

/// The full context snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    pub environment: Environment,
    pub user: UserState,
    pub interaction: InteractionState,
    pub device: QualityFields,
    pub network: QualityFields,
    pub attention_pools: AttentionPools,
}

/// Partial context update; each present section replaces the current one
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextUpdate {
    pub environment: Option<Environment>,
    pub user: Option<UserState>,
    pub interaction: Option<InteractionState>,
    pub device: Option<QualityFields>,
    pub network: Option<QualityFields>,
    pub attention_pools: Option<PoolCapacities>,
}

impl ContextUpdate {
    pub fn environment(environment: Environment) -> Self {
        Self { environment: Some(environment), ..Default::default() }
    }

    pub fn user(user: UserState) -> Self {
        Self { user: Some(user), ..Default::default() }
    }

    pub fn interaction(interaction: InteractionState) -> Self {
        Self { interaction: Some(interaction), ..Default::default() }
    }

    pub fn pools(screen: f64, audio: f64, cognitive: f64) -> Self {
        Self {
            attention_pools: Some(PoolCapacities { screen, audio, cognitive }),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.environment.is_none()
            && self.user.is_none()
            && self.interaction.is_none()
            && self.device.is_none()
            && self.network.is_none()
            && self.attention_pools.is_none()
    }
}

impl Context {
    /// Shallow-merge an update. Returns the names of the replaced sections.
    pub fn apply(&mut self, update: ContextUpdate) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if let Some(environment) = update.environment {
            self.environment = environment;
            changed.push("environment");
        }
        if let Some(user) = update.user {
            self.user = user;
            changed.push("user");
        }
        if let Some(interaction) = update.interaction {
            self.interaction = interaction;
            changed.push("interaction");
        }
        if let Some(device) = update.device {
            self.device = device;
            changed.push("device");
        }
        if let Some(network) = update.network {
            self.network = network;
            changed.push("network");
        }
        if let Some(caps) = update.attention_pools {
            self.attention_pools.max_screen_space = caps.screen;
            self.attention_pools.max_audio_time = caps.audio;
            self.attention_pools.max_cognitive_load = caps.cognitive;
            changed.push("attention_pools");
        }
        changed
    }

    pub fn voice_active(&self) -> bool {
        self.interaction.includes(Modality::Voice)
    }
}
