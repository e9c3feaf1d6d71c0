//! Protagonist affect - the emotional snapshot generated with each page

use serde::{Deserialize, Serialize};

/// How strongly the protagonist feels the primary emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmotionIntensity {
    Mild,
    #[default]
    Moderate,
    Strong,
    Overwhelming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryEmotion {
    pub emotion: String,
    pub cause: String,
}

/// The protagonist's emotional state at the end of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtagonistAffect {
    pub primary_emotion: String,
    pub intensity: EmotionIntensity,
    pub primary_cause: String,
    #[serde(default)]
    pub secondary_emotions: Vec<SecondaryEmotion>,
    pub dominant_motivation: String,
}

impl ProtagonistAffect {
    pub fn new(
        primary_emotion: impl Into<String>,
        intensity: EmotionIntensity,
        primary_cause: impl Into<String>,
        dominant_motivation: impl Into<String>,
    ) -> Self {
        Self {
            primary_emotion: primary_emotion.into(),
            intensity,
            primary_cause: primary_cause.into(),
            secondary_emotions: Vec::new(),
            dominant_motivation: dominant_motivation.into(),
        }
    }

    pub fn with_secondary(mut self, emotion: impl Into<String>, cause: impl Into<String>) -> Self {
        self.secondary_emotions.push(SecondaryEmotion {
            emotion: emotion.into(),
            cause: cause.into(),
        });
        self
    }
}

impl Default for ProtagonistAffect {
    fn default() -> Self {
        Self::new("calm", EmotionIntensity::Mild, "", "")
    }
}
