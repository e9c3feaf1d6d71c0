//! Active state - where the protagonist is and what currently presses on them

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::keyed_entry::{remove_by_ids, EntryCategory, IdCounters, Keyed, KeyedEntry};
use crate::threads::{NewThread, ThreadEntry};

use super::{accumulate, KeyedDelta};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveState {
    pub current_location: String,
    pub active_threats: Vec<KeyedEntry>,
    pub active_constraints: Vec<KeyedEntry>,
    pub open_threads: Vec<ThreadEntry>,
}

/// The active-state delta carried by one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveStateChanges {
    /// Replaces the current location when present.
    #[serde(default)]
    pub new_location: Option<String>,
    #[serde(default)]
    pub threats: KeyedDelta,
    #[serde(default)]
    pub constraints: KeyedDelta,
    #[serde(default)]
    pub threads_added: Vec<NewThread>,
    #[serde(default)]
    pub threads_resolved: Vec<String>,
}

pub fn accumulate_active_state(
    parent: &ActiveState,
    changes: &ActiveStateChanges,
    counters: &mut IdCounters,
) -> Result<ActiveState, DomainError> {
    let current_location = match changes.new_location.as_deref().map(str::trim) {
        Some(location) if !location.is_empty() => location.to_string(),
        _ => parent.current_location.clone(),
    };

    let active_threats = accumulate(
        &parent.active_threats,
        &changes.threats,
        EntryCategory::Threat,
        counters,
    )?;
    let active_constraints = accumulate(
        &parent.active_constraints,
        &changes.constraints,
        EntryCategory::Constraint,
        counters,
    )?;

    let mut sequence = counters.sequence(
        EntryCategory::Thread,
        parent.open_threads.iter().map(|t| t.key()),
    )?;
    let mut open_threads = remove_by_ids(&parent.open_threads, &changes.threads_resolved);
    for thread in &changes.threads_added {
        let text = thread.text.trim();
        if text.is_empty() {
            continue;
        }
        open_threads.push(ThreadEntry {
            id: sequence.next_id(),
            text: text.to_string(),
            thread_type: thread.thread_type,
            urgency: thread.urgency,
        });
    }
    counters.record(&sequence);

    Ok(ActiveState {
        current_location,
        active_threats,
        active_constraints,
        open_threads,
    })
}

/// Ages of the child's open threads: a thread carried over from the parent
/// (same id and text) is one page older, anything else starts at zero.
pub fn age_threads(
    parent_ages: &BTreeMap<String, u32>,
    parent_threads: &[ThreadEntry],
    child_threads: &[ThreadEntry],
) -> BTreeMap<String, u32> {
    child_threads
        .iter()
        .map(|thread| {
            let carried = parent_threads
                .iter()
                .any(|p| p.id == thread.id && p.text == thread.text);
            let age = if carried {
                parent_ages.get(&thread.id).copied().unwrap_or(0) + 1
            } else {
                0
            };
            (thread.id.clone(), age)
        })
        .collect()
}
