//! Immutable structure versions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{PageId, StructureVersionId};

use super::model::StoryStructure;

/// One snapshot of the full act/beat plan.
///
/// Created at story start and on every accepted deviation rewrite. Versions are
/// never edited; a rewrite links back to the version it replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedStoryStructure {
    pub id: StructureVersionId,
    pub structure: StoryStructure,
    pub previous_version_id: Option<StructureVersionId>,
    /// Page whose generation triggered the rewrite; `None` for the initial version
    pub created_at_page_id: Option<PageId>,
    pub rewrite_reason: Option<String>,
    pub preserved_beat_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl VersionedStoryStructure {
    pub fn is_initial(&self) -> bool {
        self.previous_version_id.is_none()
    }
}

pub fn create_initial_versioned_structure(
    structure: StoryStructure,
    now: DateTime<Utc>,
) -> VersionedStoryStructure {
    VersionedStoryStructure {
        id: StructureVersionId::new(),
        structure,
        previous_version_id: None,
        created_at_page_id: None,
        rewrite_reason: None,
        preserved_beat_ids: Vec::new(),
        created_at: now,
    }
}

pub fn create_rewritten_versioned_structure(
    previous: &VersionedStoryStructure,
    merged_structure: StoryStructure,
    preserved_beat_ids: Vec<String>,
    rewrite_reason: impl Into<String>,
    created_at_page_id: PageId,
    now: DateTime<Utc>,
) -> VersionedStoryStructure {
    VersionedStoryStructure {
        id: StructureVersionId::new(),
        structure: merged_structure,
        previous_version_id: Some(previous.id),
        created_at_page_id: Some(created_at_page_id),
        rewrite_reason: Some(rewrite_reason.into()),
        preserved_beat_ids,
        created_at: now,
    }
}
