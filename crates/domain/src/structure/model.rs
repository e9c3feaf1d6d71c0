//! Acts and beats

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Dramatic function of a beat within its act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatRole {
    Setup,
    #[default]
    Escalation,
    TurningPoint,
    Resolution,
}

/// Smallest planned dramatic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beat {
    /// Stable "act.beat" id such as "2.1"
    pub id: String,
    pub description: String,
    pub objective: String,
    #[serde(default)]
    pub role: BeatRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Act {
    pub id: String,
    pub name: String,
    pub objective: String,
    pub stakes: String,
    pub entry_condition: String,
    pub beats: Vec<Beat>,
}

/// The full planned arc of a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStructure {
    pub acts: Vec<Act>,
    pub overall_theme: String,
    #[serde(default)]
    pub premise: String,
}

impl StoryStructure {
    pub fn beat_at(&self, act_index: usize, beat_index: usize) -> Option<&Beat> {
        self.acts
            .get(act_index)
            .and_then(|act| act.beats.get(beat_index))
    }

    /// Position and beat for an id.
    pub fn find_beat(&self, beat_id: &str) -> Option<(usize, usize, &Beat)> {
        self.acts.iter().enumerate().find_map(|(act_index, act)| {
            act.beats
                .iter()
                .position(|beat| beat.id == beat_id)
                .map(|beat_index| (act_index, beat_index, &act.beats[beat_index]))
        })
    }

    /// All beats in structure order with their positions.
    pub fn beats(&self) -> impl Iterator<Item = (usize, usize, &Beat)> + '_ {
        self.acts.iter().enumerate().flat_map(|(act_index, act)| {
            act.beats
                .iter()
                .enumerate()
                .map(move |(beat_index, beat)| (act_index, beat_index, beat))
        })
    }

    pub fn beat_count(&self) -> usize {
        self.acts.iter().map(|act| act.beats.len()).sum()
    }

    /// Check the plan is usable: at least one act, no empty act, unique beat ids.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.acts.is_empty() {
            return Err(DomainError::validation("Story structure must have at least one act"));
        }
        let mut seen = HashSet::new();
        for act in &self.acts {
            if act.beats.is_empty() {
                return Err(DomainError::validation(format!(
                    "Act '{}' must have at least one beat",
                    act.id
                )));
            }
            for beat in &act.beats {
                if !seen.insert(beat.id.as_str()) {
                    return Err(DomainError::validation(format!(
                        "Duplicate beat id '{}' in story structure",
                        beat.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::structure;
    use super::*;

    #[test]
    fn finds_beats_by_id_and_position() {
        let s = structure(3, 2);
        let (act, beat, found) = s.find_beat("2.2").unwrap();
        assert_eq!((act, beat), (1, 1));
        assert_eq!(found.description, "Beat 2.2");
        assert_eq!(s.beat_at(2, 0).unwrap().id, "3.1");
        assert!(s.beat_at(3, 0).is_none());
        assert!(s.find_beat("4.1").is_none());
    }

    #[test]
    fn beats_iterates_in_structure_order() {
        let s = structure(2, 2);
        let ids: Vec<&str> = s.beats().map(|(_, _, b)| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1.1", "1.2", "2.1", "2.2"]);
        assert_eq!(s.beat_count(), 4);
    }

    #[test]
    fn validate_rejects_duplicates_and_empty_acts() {
        assert!(structure(3, 2).validate().is_ok());

        let mut duplicate = structure(2, 2);
        duplicate.acts[1].beats[0].id = "1.1".to_string();
        assert!(duplicate.validate().is_err());

        let mut empty_act = structure(2, 2);
        empty_act.acts[1].beats.clear();
        assert!(empty_act.validate().is_err());

        let mut no_acts = structure(1, 1);
        no_acts.acts.clear();
        assert!(no_acts.validate().is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(structure(1, 1)).unwrap();
        assert!(json.get("overallTheme").is_some());
        assert!(json["acts"][0].get("entryCondition").is_some());
        assert_eq!(json["acts"][0]["beats"][0]["role"], "escalation");
    }
}
