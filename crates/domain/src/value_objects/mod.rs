//! Value objects - small validated types shared across the page tree model

mod affect;
mod names;

pub use affect::{EmotionIntensity, ProtagonistAffect, SecondaryEmotion};
pub use names::{CharacterKey, StoryTitle};
