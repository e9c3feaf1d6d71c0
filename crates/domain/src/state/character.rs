//! Per-character state accumulation

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::keyed_entry::{EntryCategory, IdCounters, KeyedEntry};
use crate::value_objects::CharacterKey;

/// New states for one character, as proposed by generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterStateAddition {
    pub character_name: String,
    pub states: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterStateDelta {
    #[serde(default)]
    pub added: Vec<CharacterStateAddition>,
    #[serde(default)]
    pub removed: Vec<String>,
}

/// States for one character plus the name it was first introduced under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterStates {
    pub display_name: String,
    pub states: Vec<KeyedEntry>,
}

pub type AccumulatedCharacterState = BTreeMap<CharacterKey, CharacterStates>;

/// Apply a character-state delta to the parent's map.
///
/// The `cs` numbering is shared by all characters of a branch, so an id names
/// exactly one state no matter which character holds it. Removal searches every
/// character; characters left without states are dropped. Additions for a name
/// with no usable characters are logged and skipped.
pub fn accumulate_character_state(
    parent: &AccumulatedCharacterState,
    delta: &CharacterStateDelta,
    counters: &mut IdCounters,
) -> Result<AccumulatedCharacterState, DomainError> {
    let mut sequence = counters.sequence(
        EntryCategory::CharacterState,
        parent
            .values()
            .flat_map(|character| character.states.iter().map(|s| s.id.as_str())),
    )?;

    let removed: HashSet<&str> = delta.removed.iter().map(String::as_str).collect();
    if !removed.is_empty() {
        let known: HashSet<&str> = parent
            .values()
            .flat_map(|character| character.states.iter().map(|s| s.id.as_str()))
            .collect();
        for id in &delta.removed {
            if !known.contains(id.as_str()) {
                tracing::warn!(id = %id, "Removal requested for unknown character state id, ignoring");
            }
        }
    }

    let mut result: AccumulatedCharacterState = parent
        .iter()
        .filter_map(|(key, character)| {
            let states: Vec<KeyedEntry> = character
                .states
                .iter()
                .filter(|state| !removed.contains(state.id.as_str()))
                .cloned()
                .collect();
            if states.is_empty() {
                None
            } else {
                Some((
                    key.clone(),
                    CharacterStates {
                        display_name: character.display_name.clone(),
                        states,
                    },
                ))
            }
        })
        .collect();

    for addition in &delta.added {
        let texts: Vec<&str> = addition
            .states
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .collect();
        if texts.is_empty() {
            continue;
        }
        let key = match CharacterKey::new(&addition.character_name) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(
                    character_name = %addition.character_name,
                    error = %e,
                    "Skipping character state for unusable name"
                );
                continue;
            }
        };
        let character = result.entry(key).or_insert_with(|| CharacterStates {
            display_name: addition.character_name.trim().to_string(),
            states: Vec::new(),
        });
        for text in texts {
            character.states.push(KeyedEntry::new(sequence.next_id(), text));
        }
    }

    counters.record(&sequence);
    Ok(result)
}
