//! Repository port for stories and pages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use storyloom_domain::{Page, PageId, Story, StoryId, VersionedStoryStructure};

use super::error::RepoError;

/// A freshly generated page waiting to be attached to its parent's choice.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChildPage {
    pub parent_page_id: PageId,
    pub choice_index: usize,
    pub page: Page,
    /// Structure version introduced by this page, appended to the story
    pub structure_version: Option<VersionedStoryStructure>,
    pub committed_at: DateTime<Utc>,
}

/// Result of attaching a child page to a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildCommit {
    /// The page, the link and any new structure version were written
    Linked,
    /// The choice already led to this page; nothing was written
    AlreadyLinked(PageId),
}

/// Persistence of stories and their page trees.
///
/// Pages are immutable once saved; the only in-place change is filling a
/// choice link when a child page is committed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryRepo: Send + Sync {
    async fn load_story(&self, id: StoryId) -> Result<Option<Story>, RepoError>;
    async fn save_story(&self, story: &Story) -> Result<(), RepoError>;

    async fn load_page(&self, story_id: StoryId, page_id: PageId)
        -> Result<Option<Page>, RepoError>;
    async fn save_page(&self, story_id: StoryId, page: &Page) -> Result<(), RepoError>;

    /// Hand out the next page id of a story. Every call returns a distinct id
    /// above all saved pages, even across writers sharing the store.
    async fn reserve_page_id(&self, story_id: StoryId) -> Result<PageId, RepoError>;

    /// Atomically save a child page, link its parent's choice to it and append
    /// its structure version, unless the choice is already linked.
    async fn commit_child_page(
        &self,
        story_id: StoryId,
        child: NewChildPage,
    ) -> Result<ChildCommit, RepoError>;
}
