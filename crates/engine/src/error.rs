//! Engine errors.

use storyloom_domain::{DomainError, PageId, StoryId};

use crate::infrastructure::ports::{GenerationError, RepoError};

/// Errors that can occur while starting or continuing a story.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Story not found: {0}")]
    StoryNotFound(StoryId),
    #[error("Page {page_id} not found in story {story_id}")]
    PageNotFound { story_id: StoryId, page_id: PageId },
    #[error("Choice {index} is out of range for page {page_id} ({available} choices)")]
    ChoiceOutOfRange {
        page_id: PageId,
        index: usize,
        available: usize,
    },
    #[error("Page {0} is an ending and has no choices")]
    EndingPage(PageId),
    /// A story's structure, its versions and a page's version id disagree.
    #[error("{0}")]
    StructureVersionInconsistency(String),
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

impl EngineError {
    pub fn structure_version(message: impl Into<String>) -> Self {
        Self::StructureVersionInconsistency(message.into())
    }
}
