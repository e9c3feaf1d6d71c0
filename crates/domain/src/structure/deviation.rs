//! Deviations from the planned structure

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::progression::AccumulatedStructureState;

/// Outcome of comparing a generated page against the planned beats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeviationResult {
    #[default]
    NoDeviation,
    BeatDeviation(BeatDeviation),
}

impl DeviationResult {
    pub fn as_beat_deviation(&self) -> Option<&BeatDeviation> {
        match self {
            Self::NoDeviation => None,
            Self::BeatDeviation(deviation) => Some(deviation),
        }
    }

    pub fn is_deviation(&self) -> bool {
        matches!(self, Self::BeatDeviation(_))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BeatDeviationRecord {
    reason: String,
    invalidated_beat_ids: Vec<String>,
    #[serde(default)]
    narrative_summary: String,
}

/// The narrative has left the plan; `invalidated_beat_ids` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "BeatDeviationRecord")]
pub struct BeatDeviation {
    reason: String,
    invalidated_beat_ids: Vec<String>,
    narrative_summary: String,
}

impl BeatDeviation {
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when no beat id is given.
    pub fn new(
        reason: impl Into<String>,
        invalidated_beat_ids: Vec<String>,
        narrative_summary: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let invalidated_beat_ids: Vec<String> = invalidated_beat_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if invalidated_beat_ids.is_empty() {
            return Err(DomainError::validation(
                "A beat deviation must invalidate at least one beat",
            ));
        }
        Ok(Self {
            reason: reason.into(),
            invalidated_beat_ids,
            narrative_summary: narrative_summary.into(),
        })
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn invalidated_beat_ids(&self) -> &[String] {
        &self.invalidated_beat_ids
    }

    pub fn narrative_summary(&self) -> &str {
        &self.narrative_summary
    }
}

impl TryFrom<BeatDeviationRecord> for BeatDeviation {
    type Error = DomainError;

    fn try_from(record: BeatDeviationRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.reason,
            record.invalidated_beat_ids,
            record.narrative_summary,
        )
    }
}

/// False when the deviation tries to invalidate a beat this branch already
/// concluded. Ids absent from the progressions (future beats) are always
/// invalidatable.
pub fn validate_deviation_targets(
    deviation: &BeatDeviation,
    state: &AccumulatedStructureState,
) -> bool {
    deviation
        .invalidated_beat_ids()
        .iter()
        .all(|beat_id| !state.is_concluded(beat_id))
}
