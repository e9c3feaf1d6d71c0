//! Category accumulators
//!
//! Each page stores the full current value of every category, derived from its
//! parent's value plus the page's delta. Removals apply first, then additions
//! are appended with ids continuing from the branch's [`IdCounters`], so a
//! removed id is never handed out again. Untouched entries keep their relative
//! order. Every function returns freshly allocated
//! collections and leaves its inputs alone, which is what keeps sibling
//! branches independent.

mod active;
mod character;
mod promises;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::keyed_entry::{append_entries, remove_by_ids, EntryCategory, IdCounters, Keyed, KeyedEntry};

pub use active::{accumulate_active_state, age_threads, ActiveState, ActiveStateChanges};
pub use character::{
    accumulate_character_state, AccumulatedCharacterState, CharacterStateAddition,
    CharacterStateDelta, CharacterStates,
};
pub use promises::{accumulate_promises, PromiseChanges};

/// Added texts and removed ids for one plain keyed category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedDelta {
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl KeyedDelta {
    pub fn new(added: Vec<String>, removed: Vec<String>) -> Self {
        Self { added, removed }
    }
}

/// Remove `delta.removed` from the parent, then append `delta.added`.
///
/// New ids continue after the higher of the branch mark in `counters` and the
/// parent's own ids; `counters` is raised to the last id handed out.
pub fn accumulate(
    parent: &[KeyedEntry],
    delta: &KeyedDelta,
    category: EntryCategory,
    counters: &mut IdCounters,
) -> Result<Vec<KeyedEntry>, DomainError> {
    let mut sequence = counters.sequence(category, parent.iter().map(Keyed::key))?;
    let mut result = remove_by_ids(parent, &delta.removed);
    append_entries(&mut result, &delta.added, &mut sequence);
    counters.record(&sequence);
    Ok(result)
}

pub fn accumulate_inventory(
    parent: &[KeyedEntry],
    delta: &KeyedDelta,
    counters: &mut IdCounters,
) -> Result<Vec<KeyedEntry>, DomainError> {
    accumulate(parent, delta, EntryCategory::Inventory, counters)
}

pub fn accumulate_health(
    parent: &[KeyedEntry],
    delta: &KeyedDelta,
    counters: &mut IdCounters,
) -> Result<Vec<KeyedEntry>, DomainError> {
    accumulate(parent, delta, EntryCategory::Health, counters)
}
