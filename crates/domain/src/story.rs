//! Story aggregate - the premise and the append-only history of structure
//! versions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{StoryId, StructureVersionId};
use crate::structure::{create_initial_versioned_structure, StoryStructure, VersionedStoryStructure};
use crate::value_objects::StoryTitle;

/// What the story is about, as given by the player at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPremise {
    pub character_concept: String,
    pub worldbuilding: String,
    pub tone: String,
}

impl StoryPremise {
    pub fn new(
        character_concept: impl Into<String>,
        worldbuilding: impl Into<String>,
        tone: impl Into<String>,
    ) -> Self {
        Self {
            character_concept: character_concept.into(),
            worldbuilding: worldbuilding.into(),
            tone: tone.into(),
        }
    }
}

/// A branching story.
///
/// # Invariants
///
/// - When `structure` is set, `structure_versions` is non-empty and
///   `structure` equals the structure of the latest version
/// - `structure_versions` only ever grows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    id: StoryId,
    title: StoryTitle,
    #[serde(flatten)]
    premise: StoryPremise,
    #[serde(default)]
    structure: Option<StoryStructure>,
    #[serde(default)]
    structure_versions: Vec<VersionedStoryStructure>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Story {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new(title: StoryTitle, premise: StoryPremise, now: DateTime<Utc>) -> Self {
        Self {
            id: StoryId::new(),
            title,
            premise,
            structure: None,
            structure_versions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> StoryId {
        self.id
    }

    #[inline]
    pub fn title(&self) -> &StoryTitle {
        &self.title
    }

    #[inline]
    pub fn premise(&self) -> &StoryPremise {
        &self.premise
    }

    /// The structure of the latest version, if the story has been planned.
    #[inline]
    pub fn structure(&self) -> Option<&StoryStructure> {
        self.structure.as_ref()
    }

    #[inline]
    pub fn structure_versions(&self) -> &[VersionedStoryStructure] {
        &self.structure_versions
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // =========================================================================
    // Structure versions
    // =========================================================================

    pub fn latest_structure_version(&self) -> Option<&VersionedStoryStructure> {
        self.structure_versions.last()
    }

    /// Look a version up by id. Only ids are compared.
    pub fn structure_version(&self, id: StructureVersionId) -> Option<&VersionedStoryStructure> {
        self.structure_versions.iter().find(|version| version.id == id)
    }

    /// Append a version and make its structure the current one.
    pub fn add_structure_version(
        mut self,
        version: VersionedStoryStructure,
        now: DateTime<Utc>,
    ) -> Self {
        self.structure = Some(version.structure.clone());
        self.structure_versions.push(version);
        self.updated_at = now;
        self
    }

    /// Attach the first planned structure to a story that has none yet.
    ///
    /// # Errors
    ///
    /// Fails if the structure is invalid or the story already has versions.
    pub fn adopt_structure(
        self,
        structure: StoryStructure,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !self.structure_versions.is_empty() {
            return Err(DomainError::validation(format!(
                "Story {} already has a structure",
                self.id
            )));
        }
        structure.validate()?;
        let version = create_initial_versioned_structure(structure, now);
        Ok(self.add_structure_version(version, now))
    }
}
