//! Open narrative threads and tracked promises
//!
//! Threads are open hooks the story has raised (a mystery, a quest, a danger).
//! Promises are setups the narrator has planted and owes a payoff for. Both
//! age by one per page along a branch; the functions here classify them by age
//! and project them for display. Nothing here has side effects.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::keyed_entry::Keyed;

/// What kind of hook a thread is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadType {
    Mystery,
    Quest,
    Relationship,
    Danger,
    Information,
    Resource,
    Moral,
}

/// How pressing a thread or promise is.
///
/// Ordered from most to least urgent, so sorting ascending puts `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Urgency {
    pub fn all() -> [Urgency; 3] {
        [Self::High, Self::Medium, Self::Low]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open thread with its keyed id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadEntry {
    pub id: String,
    pub text: String,
    pub thread_type: ThreadType,
    pub urgency: Urgency,
}

impl Keyed for ThreadEntry {
    fn key(&self) -> &str {
        &self.id
    }
}

/// A thread proposed by generation, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThread {
    pub text: String,
    pub thread_type: ThreadType,
    pub urgency: Urgency,
}

/// Kind of setup a promise represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromiseType {
    Foreshadowing,
    ChekhovGun,
    UnresolvedQuestion,
    CharacterArc,
}

/// A planted setup that still awaits its payoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedPromise {
    pub id: String,
    pub description: String,
    pub promise_type: PromiseType,
    pub suggested_urgency: Urgency,
    /// Pages elapsed since the promise was planted on this branch.
    pub age: u32,
}

impl Keyed for TrackedPromise {
    fn key(&self) -> &str {
        &self.id
    }
}

/// A promise proposed by generation, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromise {
    pub description: String,
    pub promise_type: PromiseType,
    pub suggested_urgency: Urgency,
}

// ============================================================================
// Aging thresholds
// ============================================================================

/// Per-urgency page counts after which an open thread is overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadAgingThresholds {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl ThreadAgingThresholds {
    pub fn new(high: u32, medium: u32, low: u32) -> Result<Self, DomainError> {
        if high == 0 || medium == 0 || low == 0 {
            return Err(DomainError::validation(
                "Thread aging thresholds must be greater than zero",
            ));
        }
        Ok(Self { high, medium, low })
    }

    pub fn for_urgency(&self, urgency: Urgency) -> u32 {
        match urgency {
            Urgency::High => self.high,
            Urgency::Medium => self.medium,
            Urgency::Low => self.low,
        }
    }
}

impl Default for ThreadAgingThresholds {
    fn default() -> Self {
        Self {
            high: 4,
            medium: 7,
            low: 10,
        }
    }
}

/// Default page count after which a promise counts as aging.
pub const DEFAULT_PROMISE_AGING_NOTICE: u32 = 5;

/// Default number of rows shown in the open-thread panel.
pub const DEFAULT_THREAD_PANEL_ROWS: usize = 6;

/// True when a thread of this urgency has been open at least its threshold.
pub fn is_thread_overdue(urgency: Urgency, age: u32, thresholds: &ThreadAgingThresholds) -> bool {
    age >= thresholds.for_urgency(urgency)
}

/// Open threads that are overdue, in their original order.
pub fn overdue_threads<'a>(
    threads: &'a [ThreadEntry],
    ages: &BTreeMap<String, u32>,
    thresholds: &ThreadAgingThresholds,
) -> Vec<&'a ThreadEntry> {
    threads
        .iter()
        .filter(|thread| {
            let age = ages.get(&thread.id).copied().unwrap_or(0);
            is_thread_overdue(thread.urgency, age, thresholds)
        })
        .collect()
}

/// Promises split by the global aging-notice threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromisePartition {
    pub aging: Vec<TrackedPromise>,
    pub recent: Vec<TrackedPromise>,
}

/// Split promises into aging (`age >= notice_threshold`) and recent.
pub fn partition_promises(promises: &[TrackedPromise], notice_threshold: u32) -> PromisePartition {
    let (aging, recent): (Vec<TrackedPromise>, Vec<TrackedPromise>) = promises
        .iter()
        .cloned()
        .partition(|promise| promise.age >= notice_threshold);
    PromisePartition { aging, recent }
}

// ============================================================================
// Open-thread panel
// ============================================================================

/// One visible row of the open-thread panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPanelRow {
    pub id: String,
    pub text: String,
    pub thread_type: ThreadType,
    pub urgency: Urgency,
    pub age: u32,
    pub overdue: bool,
}

/// Threads that did not fit in the panel, counted per urgency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadOverflow {
    pub hidden: usize,
    pub by_urgency: Vec<(Urgency, usize)>,
}

impl fmt::Display for ThreadOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .by_urgency
            .iter()
            .map(|(urgency, count)| format!("{} {}", count, urgency))
            .collect();
        write!(f, "+{} more ({})", self.hidden, parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenThreadPanel {
    pub rows: Vec<ThreadPanelRow>,
    pub overflow: Option<ThreadOverflow>,
}

/// Project open threads into panel rows: most urgent first, original order
/// within an urgency, at most `max_rows` rows.
pub fn open_thread_panel(
    threads: &[ThreadEntry],
    ages: &BTreeMap<String, u32>,
    thresholds: &ThreadAgingThresholds,
    max_rows: usize,
) -> OpenThreadPanel {
    let mut sorted: Vec<&ThreadEntry> = threads.iter().collect();
    // sort_by_key is stable
    sorted.sort_by_key(|thread| thread.urgency);

    let rows = sorted
        .iter()
        .take(max_rows)
        .map(|thread| {
            let age = ages.get(&thread.id).copied().unwrap_or(0);
            ThreadPanelRow {
                id: thread.id.clone(),
                text: thread.text.clone(),
                thread_type: thread.thread_type,
                urgency: thread.urgency,
                age,
                overdue: is_thread_overdue(thread.urgency, age, thresholds),
            }
        })
        .collect();

    let hidden: Vec<&&ThreadEntry> = sorted.iter().skip(max_rows).collect();
    let overflow = if hidden.is_empty() {
        None
    } else {
        let by_urgency = Urgency::all()
            .into_iter()
            .map(|urgency| {
                let count = hidden.iter().filter(|t| t.urgency == urgency).count();
                (urgency, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();
        Some(ThreadOverflow {
            hidden: hidden.len(),
            by_urgency,
        })
    };

    OpenThreadPanel { rows, overflow }
}
