//! Per-branch beat progression
//!
//! # State Transitions
//!
//! ```text
//! pending -> active      (beat becomes the current beat)
//! active  -> concluded   (generation reports the beat concluded)
//! ```
//!
//! A concluded beat never changes again on that branch.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::StoryStructure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BeatStatus {
    Pending,
    Active,
    Concluded,
}

impl fmt::Display for BeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Concluded => write!(f, "concluded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatProgression {
    pub beat_id: String,
    pub status: BeatStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl BeatProgression {
    pub fn active(beat_id: impl Into<String>) -> Self {
        Self {
            beat_id: beat_id.into(),
            status: BeatStatus::Active,
            resolution: None,
        }
    }

    pub fn concluded(beat_id: impl Into<String>, resolution: impl Into<String>) -> Self {
        Self {
            beat_id: beat_id.into(),
            status: BeatStatus::Concluded,
            resolution: Some(resolution.into()),
        }
    }
}

/// Where a branch stands in the planned structure.
///
/// When every beat is concluded `current_act_index` equals the act count and
/// there is no current beat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatedStructureState {
    pub current_act_index: usize,
    pub current_beat_index: usize,
    pub beat_progressions: Vec<BeatProgression>,
}

impl AccumulatedStructureState {
    pub fn progression(&self, beat_id: &str) -> Option<&BeatProgression> {
        self.beat_progressions
            .iter()
            .find(|progression| progression.beat_id == beat_id)
    }

    pub fn status_of(&self, beat_id: &str) -> Option<BeatStatus> {
        self.progression(beat_id).map(|progression| progression.status)
    }

    pub fn is_concluded(&self, beat_id: &str) -> bool {
        self.status_of(beat_id) == Some(BeatStatus::Concluded)
    }

    /// True once the branch has moved past the final act.
    pub fn is_complete(&self, structure: &StoryStructure) -> bool {
        self.current_act_index >= structure.acts.len()
    }

    fn set_status(&mut self, beat_id: &str, status: BeatStatus, resolution: Option<String>) {
        match self
            .beat_progressions
            .iter_mut()
            .find(|progression| progression.beat_id == beat_id)
        {
            Some(progression) => {
                progression.status = status;
                if resolution.is_some() {
                    progression.resolution = resolution;
                }
            }
            None => self.beat_progressions.push(BeatProgression {
                beat_id: beat_id.to_string(),
                status,
                resolution,
            }),
        }
    }

    /// Make the beat at the current position active unless it is already
    /// active or concluded.
    pub(crate) fn activate_current(&mut self, structure: &StoryStructure) {
        let Some(beat) = structure.beat_at(self.current_act_index, self.current_beat_index) else {
            return;
        };
        let beat_id = beat.id.clone();
        match self.status_of(&beat_id) {
            Some(BeatStatus::Active) | Some(BeatStatus::Concluded) => {}
            Some(BeatStatus::Pending) | None => self.set_status(&beat_id, BeatStatus::Active, None),
        }
    }
}

/// Starting state for a structure: first beat of the first act active.
pub fn create_initial_structure_state(structure: &StoryStructure) -> AccumulatedStructureState {
    let mut state = AccumulatedStructureState::default();
    skip_empty_acts(structure, &mut state);
    state.activate_current(structure);
    state
}

/// Derive a child's structure state from its parent's.
///
/// Without a concluded beat the parent's state is returned unchanged. With one,
/// the current beat is concluded with `resolution`, the position moves to the
/// next beat (or the first beat of the next act) and that beat becomes active.
/// Always returns a fresh value; the parent is never modified.
pub fn apply_structure_progression(
    structure: &StoryStructure,
    parent: &AccumulatedStructureState,
    beat_concluded: bool,
    resolution: &str,
) -> AccumulatedStructureState {
    if !beat_concluded {
        return parent.clone();
    }

    let Some(current) = structure.beat_at(parent.current_act_index, parent.current_beat_index)
    else {
        tracing::warn!(
            act_index = parent.current_act_index,
            beat_index = parent.current_beat_index,
            "Beat concluded but the branch has no current beat, keeping structure state"
        );
        return parent.clone();
    };

    let mut state = parent.clone();
    let resolution = resolution.trim();
    state.set_status(
        &current.id,
        BeatStatus::Concluded,
        (!resolution.is_empty()).then(|| resolution.to_string()),
    );

    let beats_in_act = structure.acts[state.current_act_index].beats.len();
    if state.current_beat_index + 1 < beats_in_act {
        state.current_beat_index += 1;
    } else {
        state.current_act_index += 1;
        state.current_beat_index = 0;
        skip_empty_acts(structure, &mut state);
    }
    state.activate_current(structure);
    state
}

fn skip_empty_acts(structure: &StoryStructure, state: &mut AccumulatedStructureState) {
    while let Some(act) = structure.acts.get(state.current_act_index) {
        if !act.beats.is_empty() {
            break;
        }
        state.current_act_index += 1;
        state.current_beat_index = 0;
    }
}

/// Display label of the branch's current position, e.g.
/// "Act 2: The Descent, Beat 2.1". `None` once the structure is complete.
pub fn structure_position_label(
    structure: &StoryStructure,
    state: &AccumulatedStructureState,
) -> Option<String> {
    let act = structure.acts.get(state.current_act_index)?;
    let beat = act.beats.get(state.current_beat_index)?;
    Some(format!(
        "Act {}: {}, Beat {}",
        state.current_act_index + 1,
        act.name,
        beat.id
    ))
}
