//! Keyed entries - stable, removable identities for mutable narrative facts
//!
//! Every accumulated collection on a page (inventory, health, character state,
//! threats, constraints, threads, promises) stores its facts as entries with an
//! id of the form `{prefix}-{n}`. The number only ever grows within a branch, so
//! an id that has been removed is never handed out again and a stale removal
//! request can never hit a newer fact.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

static ENTRY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+-(\d+)$").expect("valid regex"));

/// The fixed id namespace of each accumulated category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryCategory {
    Inventory,
    Health,
    CharacterState,
    Threat,
    Constraint,
    Thread,
    Promise,
}

impl EntryCategory {
    /// Id prefix used by this category.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Inventory => "inv",
            Self::Health => "hp",
            Self::CharacterState => "cs",
            Self::Threat => "th",
            Self::Constraint => "cn",
            Self::Thread => "td",
            Self::Promise => "pr",
        }
    }
}

impl fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Anything stored in a keyed collection.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// A single narrative fact with its stable id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyedEntry {
    pub id: String,
    pub text: String,
}

impl KeyedEntry {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

impl Keyed for KeyedEntry {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Parse the numeric suffix of a keyed-entry id.
///
/// # Errors
///
/// Returns `DomainError::MalformedIdentifier` when `id` is not `^[a-z]+-(\d+)$`.
/// Upstream parsing strips foreign-looking ids, so reaching this is a contract
/// breach rather than bad model output.
pub fn extract_id_number(id: &str) -> Result<u32, DomainError> {
    ENTRY_ID_RE
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<u32>().ok())
        .ok_or_else(|| DomainError::malformed_id(id))
}

/// Returns true if `id` is a well formed id of the given category.
pub fn is_well_formed_id(id: &str, category: EntryCategory) -> bool {
    id.strip_prefix(category.prefix())
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some()
        && extract_id_number(id).is_ok()
}

/// Hands out the next ids of one category, continuing from the highest
/// number already in use.
#[derive(Debug, Clone)]
pub struct IdSequence {
    category: EntryCategory,
    current: u32,
}

impl IdSequence {
    /// Start after the highest number among `ids` that carry this category's
    /// prefix. Ids of other categories are ignored.
    pub fn continue_after<'a>(
        category: EntryCategory,
        ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, DomainError> {
        let own_prefix = format!("{}-", category.prefix());
        let mut current = 0;
        for id in ids {
            if !id.starts_with(&own_prefix) {
                continue;
            }
            current = current.max(extract_id_number(id)?);
        }
        Ok(Self { category, current })
    }

    /// Never hand out a number at or below `floor`.
    pub fn at_least(mut self, floor: u32) -> Self {
        self.current = self.current.max(floor);
        self
    }

    pub fn next_id(&mut self) -> String {
        self.current += 1;
        format!("{}-{}", self.category.prefix(), self.current)
    }
}

/// Highest number handed out per category along one branch.
///
/// Pages carry this from parent to child, so a number freed by a removal is
/// never handed out again further down the branch even after the entry that
/// held it is gone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdCounters(BTreeMap<EntryCategory, u32>);

impl IdCounters {
    pub fn get(&self, category: EntryCategory) -> u32 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    /// Sequence continuing after both the recorded mark and every id in `ids`.
    pub fn sequence<'a>(
        &self,
        category: EntryCategory,
        ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<IdSequence, DomainError> {
        Ok(IdSequence::continue_after(category, ids)?.at_least(self.get(category)))
    }

    /// Raise the mark of the sequence's category to what it has reached.
    pub fn record(&mut self, sequence: &IdSequence) {
        let mark = self.0.entry(sequence.category).or_insert(0);
        *mark = (*mark).max(sequence.current);
    }
}

/// Append one entry per non-blank text, numbering from the existing maximum.
///
/// Blank and whitespace-only texts are skipped without consuming a number.
pub fn assign_ids(
    existing: &[KeyedEntry],
    new_texts: &[String],
    category: EntryCategory,
) -> Result<Vec<KeyedEntry>, DomainError> {
    let mut sequence =
        IdSequence::continue_after(category, existing.iter().map(|entry| entry.key()))?;
    let mut result = existing.to_vec();
    append_entries(&mut result, new_texts, &mut sequence);
    Ok(result)
}

pub(crate) fn append_entries(
    entries: &mut Vec<KeyedEntry>,
    new_texts: &[String],
    sequence: &mut IdSequence,
) {
    for text in new_texts {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        entries.push(KeyedEntry::new(sequence.next_id(), trimmed));
    }
}

/// Entries whose id is not listed in `ids`, in their original order.
///
/// Ids that match nothing are logged and ignored: removal requests come from
/// model output and may reference facts that are already gone.
pub fn remove_by_ids<T: Keyed + Clone>(entries: &[T], ids: &[String]) -> Vec<T> {
    if ids.is_empty() {
        return entries.to_vec();
    }

    let present: HashSet<&str> = entries.iter().map(|entry| entry.key()).collect();
    for id in ids {
        if !present.contains(id.as_str()) {
            tracing::warn!(id = %id, "Removal requested for unknown entry id, ignoring");
        }
    }

    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    entries
        .iter()
        .filter(|entry| !wanted.contains(entry.key()))
        .cloned()
        .collect()
}
