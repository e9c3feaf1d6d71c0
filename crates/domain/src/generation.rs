//! Validated per-page output of the generation collaborator

use serde::{Deserialize, Serialize};

use crate::state::{ActiveStateChanges, CharacterStateDelta, KeyedDelta, PromiseChanges};
use crate::structure::DeviationResult;
use crate::value_objects::ProtagonistAffect;

/// Narrative, choices and every category delta for one new page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeneration {
    pub narrative: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub inventory: KeyedDelta,
    #[serde(default)]
    pub health: KeyedDelta,
    #[serde(default)]
    pub character_state: CharacterStateDelta,
    #[serde(default)]
    pub active_state: ActiveStateChanges,
    #[serde(default)]
    pub promises: PromiseChanges,
    #[serde(default)]
    pub protagonist_affect: ProtagonistAffect,
    #[serde(default)]
    pub is_ending: bool,
    #[serde(default)]
    pub beat_concluded: bool,
    #[serde(default)]
    pub beat_resolution: String,
    #[serde(default)]
    pub deviation: DeviationResult,
}

impl PageGeneration {
    pub fn new(narrative: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            narrative: narrative.into(),
            choices,
            ..Default::default()
        }
    }

    /// An ending page: no choices.
    pub fn ending(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            is_ending: true,
            ..Default::default()
        }
    }

    pub fn with_inventory(mut self, inventory: KeyedDelta) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn with_health(mut self, health: KeyedDelta) -> Self {
        self.health = health;
        self
    }

    pub fn with_character_state(mut self, character_state: CharacterStateDelta) -> Self {
        self.character_state = character_state;
        self
    }

    pub fn with_active_state(mut self, active_state: ActiveStateChanges) -> Self {
        self.active_state = active_state;
        self
    }

    pub fn with_promises(mut self, promises: PromiseChanges) -> Self {
        self.promises = promises;
        self
    }

    pub fn with_protagonist_affect(mut self, affect: ProtagonistAffect) -> Self {
        self.protagonist_affect = affect;
        self
    }

    pub fn with_beat_concluded(mut self, resolution: impl Into<String>) -> Self {
        self.beat_concluded = true;
        self.beat_resolution = resolution.into();
        self
    }

    pub fn with_deviation(mut self, deviation: DeviationResult) -> Self {
        self.deviation = deviation;
        self
    }
}
