//! Generation collaborator port.
//!
//! Prompt construction, transport and schema repair live behind this trait;
//! the engine only sees validated [`PageGeneration`] values and planned
//! structures.

use async_trait::async_trait;
use storyloom_domain::{
    AccumulatedStructureState, Page, PageGeneration, RewriteContext, StoryPremise,
    StoryStructure, ThreadEntry, TrackedPromise,
};

use super::error::GenerationError;

#[derive(Debug, Clone, PartialEq)]
pub struct StructurePlanRequest {
    pub title: String,
    pub premise: StoryPremise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpeningRequest {
    pub title: String,
    pub premise: StoryPremise,
    pub structure: Option<StoryStructure>,
    pub structure_state: AccumulatedStructureState,
}

/// Everything needed to continue a branch through one choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationRequest {
    pub title: String,
    pub premise: StoryPremise,
    pub structure: Option<StoryStructure>,
    pub structure_state: AccumulatedStructureState,
    pub parent_page: Page,
    pub choice_index: usize,
    pub choice_text: String,
    /// Open threads that have waited longer than their urgency allows
    pub overdue_threads: Vec<ThreadEntry>,
    /// Promises old enough to deserve a payoff
    pub aging_promises: Vec<TrackedPromise>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageGenerator: Send + Sync {
    async fn plan_structure(
        &self,
        request: StructurePlanRequest,
    ) -> Result<StoryStructure, GenerationError>;

    async fn write_opening(&self, request: OpeningRequest)
        -> Result<PageGeneration, GenerationError>;

    async fn write_continuation(
        &self,
        request: ContinuationRequest,
    ) -> Result<PageGeneration, GenerationError>;

    /// Plan the remainder of a story after an accepted deviation.
    async fn regenerate_structure(
        &self,
        context: RewriteContext,
    ) -> Result<StoryStructure, GenerationError>;
}
