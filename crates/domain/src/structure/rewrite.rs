//! Deviation-driven structure rewrites
//!
//! A rewrite keeps every beat the branch has concluded and asks the generation
//! collaborator for the rest. The merge puts the preserved beats back first,
//! untouched, and renumbers regenerated beats around them.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::StructureVersionId;
use crate::story::Story;

use super::deviation::BeatDeviation;
use super::model::{Act, Beat, StoryStructure};
use super::progression::{AccumulatedStructureState, BeatProgression, BeatStatus};
use super::version::VersionedStoryStructure;

/// A concluded beat carried into a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedBeat {
    pub act_index: usize,
    pub beat_index: usize,
    pub beat: Beat,
    pub resolution: Option<String>,
}

/// Everything the regeneration call needs to plan the remainder of a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteContext {
    pub story_title: String,
    pub character_concept: String,
    pub worldbuilding: String,
    pub tone: String,
    pub original_theme: String,
    pub premise: String,
    pub current_version_id: StructureVersionId,
    pub completed_beats: Vec<CompletedBeat>,
    pub deviation_reason: String,
    pub narrative_summary: String,
    pub invalidated_beat_ids: Vec<String>,
    pub current_act_index: usize,
    pub current_beat_index: usize,
}

impl RewriteContext {
    pub fn preserved_beat_ids(&self) -> Vec<String> {
        self.completed_beats
            .iter()
            .map(|completed| completed.beat.id.clone())
            .collect()
    }
}

/// Every concluded beat in structure order.
pub fn extract_completed_beats(
    structure: &StoryStructure,
    state: &AccumulatedStructureState,
) -> Vec<CompletedBeat> {
    structure
        .beats()
        .filter_map(|(act_index, beat_index, beat)| {
            let progression = state.progression(&beat.id)?;
            (progression.status == BeatStatus::Concluded).then(|| CompletedBeat {
                act_index,
                beat_index,
                beat: beat.clone(),
                resolution: progression.resolution.clone(),
            })
        })
        .collect()
}

pub fn build_rewrite_context(
    story: &Story,
    version: &VersionedStoryStructure,
    state: &AccumulatedStructureState,
    deviation: &BeatDeviation,
) -> RewriteContext {
    let premise = story.premise();
    RewriteContext {
        story_title: story.title().as_str().to_string(),
        character_concept: premise.character_concept.clone(),
        worldbuilding: premise.worldbuilding.clone(),
        tone: premise.tone.clone(),
        original_theme: version.structure.overall_theme.clone(),
        premise: version.structure.premise.clone(),
        current_version_id: version.id,
        completed_beats: extract_completed_beats(&version.structure, state),
        deviation_reason: deviation.reason().to_string(),
        narrative_summary: deviation.narrative_summary().to_string(),
        invalidated_beat_ids: deviation.invalidated_beat_ids().to_vec(),
        current_act_index: state.current_act_index,
        current_beat_index: state.current_beat_index,
    }
}

/// Merge preserved beats with a regenerated plan.
///
/// Act `i` of the result holds the preserved beats of act `i` verbatim,
/// followed by the regenerated beats of act `i`. Regenerated beats that merely
/// echo a preserved beat are dropped. Acts left without beats are dropped, and
/// the surviving acts are numbered by their position in the result. New beats
/// are numbered `{act}.{position}` from that act number, skipping any id
/// already taken, so preserved ids never change and every id is unique. The
/// theme is always `original_theme`.
///
/// # Errors
///
/// Returns `DomainError::Validation` when the result would have no acts.
pub fn merge_preserved_with_regenerated(
    preserved: &[CompletedBeat],
    regenerated: &StoryStructure,
    original_theme: &str,
) -> Result<StoryStructure, DomainError> {
    let mut preserved_by_act: BTreeMap<usize, Vec<&CompletedBeat>> = BTreeMap::new();
    for completed in preserved {
        preserved_by_act
            .entry(completed.act_index)
            .or_default()
            .push(completed);
    }

    let preserved_ids: HashSet<&str> = preserved.iter().map(|c| c.beat.id.as_str()).collect();
    let mut used_ids: HashSet<String> = preserved_ids.iter().map(|id| id.to_string()).collect();

    let act_count = regenerated.acts.len().max(
        preserved_by_act
            .keys()
            .next_back()
            .map_or(0, |last| last + 1),
    );

    let mut acts = Vec::with_capacity(act_count);
    for act_index in 0..act_count {
        let act_number = acts.len() + 1;
        let kept: &[&CompletedBeat] = preserved_by_act
            .get(&act_index)
            .map_or(&[], |beats| beats.as_slice());
        let mut beats: Vec<Beat> = kept.iter().map(|c| c.beat.clone()).collect();

        let template = regenerated.acts.get(act_index);
        if let Some(act) = template {
            for beat in &act.beats {
                let echoes_preserved = preserved_ids.contains(beat.id.as_str())
                    && kept
                        .iter()
                        .any(|c| c.beat.id == beat.id && c.beat.description == beat.description);
                if echoes_preserved {
                    continue;
                }
                let mut position = beats.len() + 1;
                let mut id = format!("{act_number}.{position}");
                while used_ids.contains(&id) {
                    position += 1;
                    id = format!("{act_number}.{position}");
                }
                used_ids.insert(id.clone());
                beats.push(Beat {
                    id,
                    ..beat.clone()
                });
            }
        }

        if beats.is_empty() {
            continue;
        }

        let act = match template {
            Some(act) => Act {
                id: act_number.to_string(),
                beats,
                ..act.clone()
            },
            None => Act {
                id: act_number.to_string(),
                name: format!("Act {act_number}"),
                objective: String::new(),
                stakes: String::new(),
                entry_condition: String::new(),
                beats,
            },
        };
        acts.push(act);
    }

    if acts.is_empty() {
        return Err(DomainError::validation(
            "Merged story structure must have at least one act",
        ));
    }

    Ok(StoryStructure {
        acts,
        overall_theme: original_theme.to_string(),
        premise: regenerated.premise.clone(),
    })
}

/// Re-anchor a branch's structure state in a merged structure.
///
/// Concluded progressions of beats that survive the merge are kept; the branch
/// then points at the first unconcluded beat, which becomes active.
pub fn reconcile_structure_state(
    merged: &StoryStructure,
    state: &AccumulatedStructureState,
) -> AccumulatedStructureState {
    let beat_progressions: Vec<BeatProgression> = merged
        .beats()
        .filter_map(|(_, _, beat)| {
            state
                .progression(&beat.id)
                .filter(|progression| progression.status == BeatStatus::Concluded)
                .cloned()
        })
        .collect();

    let position = merged
        .beats()
        .find(|(_, _, beat)| {
            !beat_progressions
                .iter()
                .any(|progression| progression.beat_id == beat.id)
        })
        .map(|(act_index, beat_index, _)| (act_index, beat_index));

    let mut reconciled = AccumulatedStructureState {
        current_act_index: position.map_or(merged.acts.len(), |(act, _)| act),
        current_beat_index: position.map_or(0, |(_, beat)| beat),
        beat_progressions,
    };
    reconciled.activate_current(merged);
    reconciled
}
