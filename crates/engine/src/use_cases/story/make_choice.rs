//! Make choice use case.
//!
//! Resolves a choice on a page to its child page, generating the child the
//! first time the choice is taken.
//!
//! # Flow
//!
//! 1. Already linked: load and return the existing child (`was_generated = false`)
//! 2. Claim the choice; re-check the link in case another request won the race
//! 3. Gate on structure-version consistency, then generate the continuation
//! 4. Reserve a page id, progress or rewrite the structure, build the page
//! 5. Commit page, link and any new structure version in one repository step;
//!    if another engine linked the choice first, return its child instead

use std::sync::Arc;

use storyloom_domain::{
    apply_structure_progression, build_continuation_page, overdue_threads, partition_promises,
    ContinuationContext, Page, PageId, ParentCollections, StoryId, StructureContext, ThreadEntry,
};

use crate::error::EngineError;
use crate::infrastructure::claims::StoryLocks;
use crate::infrastructure::ports::{
    ChildCommit, ClockPort, ContinuationRequest, NewChildPage, PageGenerator, StoryRepo,
};
use crate::infrastructure::settings::EngineSettings;
use crate::use_cases::validation::{
    resolve_active_structure_version, validate_continuation_structure_version,
};

use super::rewrite::{RewriteRequest, RewriteStructure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOutcome {
    pub page: Page,
    /// False when the choice had already been taken and the stored child was
    /// returned
    pub was_generated: bool,
}

pub struct MakeChoice {
    repo: Arc<dyn StoryRepo>,
    generator: Arc<dyn PageGenerator>,
    rewrite: RewriteStructure,
    clock: Arc<dyn ClockPort>,
    locks: Arc<StoryLocks>,
    settings: EngineSettings,
}

impl MakeChoice {
    pub fn new(
        repo: Arc<dyn StoryRepo>,
        generator: Arc<dyn PageGenerator>,
        rewrite: RewriteStructure,
        clock: Arc<dyn ClockPort>,
        locks: Arc<StoryLocks>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            repo,
            generator,
            rewrite,
            clock,
            locks,
            settings,
        }
    }

    pub async fn execute(
        &self,
        story_id: StoryId,
        page_id: PageId,
        choice_index: usize,
    ) -> Result<ChoiceOutcome, EngineError> {
        let parent = self.load_parent(story_id, page_id, choice_index).await?;
        if let Some(outcome) = self.replay(story_id, &parent, choice_index).await? {
            return Ok(outcome);
        }

        let result = {
            let _claim = self
                .locks
                .choices
                .acquire((story_id, page_id, choice_index))
                .await;
            self.resolve_claimed(story_id, page_id, choice_index).await
        };
        self.locks.choices.prune();
        result
    }

    async fn resolve_claimed(
        &self,
        story_id: StoryId,
        page_id: PageId,
        choice_index: usize,
    ) -> Result<ChoiceOutcome, EngineError> {
        let parent = self.load_parent(story_id, page_id, choice_index).await?;
        if let Some(outcome) = self.replay(story_id, &parent, choice_index).await? {
            tracing::debug!(
                story_id = %story_id,
                page_id = %page_id,
                choice_index,
                "Choice was resolved while waiting, replaying"
            );
            return Ok(outcome);
        }
        self.generate_child(story_id, &parent, choice_index).await
    }

    /// Load a page and check the choice can be taken.
    async fn load_parent(
        &self,
        story_id: StoryId,
        page_id: PageId,
        choice_index: usize,
    ) -> Result<Page, EngineError> {
        let page = self
            .repo
            .load_page(story_id, page_id)
            .await?
            .ok_or(EngineError::PageNotFound { story_id, page_id })?;
        if page.is_ending() {
            return Err(EngineError::EndingPage(page_id));
        }
        if choice_index >= page.choices().len() {
            return Err(EngineError::ChoiceOutOfRange {
                page_id,
                index: choice_index,
                available: page.choices().len(),
            });
        }
        Ok(page)
    }

    async fn replay(
        &self,
        story_id: StoryId,
        parent: &Page,
        choice_index: usize,
    ) -> Result<Option<ChoiceOutcome>, EngineError> {
        match parent
            .choice(choice_index)
            .and_then(|choice| choice.next_page_id)
        {
            Some(child_id) => Ok(Some(self.load_child(story_id, child_id).await?)),
            None => Ok(None),
        }
    }

    async fn load_child(
        &self,
        story_id: StoryId,
        child_id: PageId,
    ) -> Result<ChoiceOutcome, EngineError> {
        let page = self
            .repo
            .load_page(story_id, child_id)
            .await?
            .ok_or(EngineError::PageNotFound {
                story_id,
                page_id: child_id,
            })?;
        Ok(ChoiceOutcome {
            page,
            was_generated: false,
        })
    }

    async fn generate_child(
        &self,
        story_id: StoryId,
        parent: &Page,
        choice_index: usize,
    ) -> Result<ChoiceOutcome, EngineError> {
        let story = self
            .repo
            .load_story(story_id)
            .await?
            .ok_or(EngineError::StoryNotFound(story_id))?;
        validate_continuation_structure_version(&story, parent)?;
        let version = resolve_active_structure_version(&story, parent).cloned();

        let choice_text = parent
            .choice(choice_index)
            .map(|choice| choice.text.clone())
            .unwrap_or_default();
        let overdue: Vec<ThreadEntry> = overdue_threads(
            &parent.accumulated_active_state().open_threads,
            parent.thread_ages(),
            &self.settings.thread_aging,
        )
        .into_iter()
        .cloned()
        .collect();
        let promises = partition_promises(
            parent.accumulated_promises(),
            self.settings.promise_aging_notice,
        );

        let generation = self
            .generator
            .write_continuation(ContinuationRequest {
                title: story.title().to_string(),
                premise: story.premise().clone(),
                structure: version.as_ref().map(|v| v.structure.clone()),
                structure_state: parent.accumulated_structure_state().clone(),
                parent_page: parent.clone(),
                choice_index,
                choice_text,
                overdue_threads: overdue,
                aging_promises: promises.aging,
            })
            .await?;

        let page_id = self.repo.reserve_page_id(story_id).await?;
        let mut new_version = None;
        let structure = match &version {
            None => StructureContext::default(),
            Some(version) => {
                let progressed = apply_structure_progression(
                    &version.structure,
                    parent.accumulated_structure_state(),
                    generation.beat_concluded,
                    &generation.beat_resolution,
                );
                let rewritten = match generation.deviation.as_beat_deviation() {
                    None => None,
                    Some(deviation) => {
                        self.rewrite
                            .execute(RewriteRequest {
                                story: &story,
                                version,
                                structure_state: &progressed,
                                deviation,
                                page_id,
                            })
                            .await?
                    }
                };
                match rewritten {
                    Some(rewritten) => {
                        let context = StructureContext {
                            structure_state: rewritten.structure_state,
                            structure_version_id: Some(rewritten.version.id),
                        };
                        new_version = Some(rewritten.version);
                        context
                    }
                    None => StructureContext {
                        structure_state: progressed,
                        structure_version_id: Some(version.id),
                    },
                }
            }
        };

        let page = build_continuation_page(
            &generation,
            ContinuationContext {
                page_id,
                parent_page_id: parent.id(),
                parent_choice_index: choice_index,
                parent: ParentCollections::of(parent),
                structure,
            },
        )?;

        let structure_rewritten = new_version.is_some();
        let commit = self
            .repo
            .commit_child_page(
                story_id,
                NewChildPage {
                    parent_page_id: parent.id(),
                    choice_index,
                    page: page.clone(),
                    structure_version: new_version,
                    committed_at: self.clock.now(),
                },
            )
            .await?;

        match commit {
            ChildCommit::Linked => {
                tracing::info!(
                    story_id = %story_id,
                    page_id = %page_id,
                    parent_page_id = %parent.id(),
                    choice_index,
                    is_ending = page.is_ending(),
                    structure_rewritten,
                    "Page generated"
                );
                Ok(ChoiceOutcome {
                    page,
                    was_generated: true,
                })
            }
            ChildCommit::AlreadyLinked(existing) => {
                tracing::info!(
                    story_id = %story_id,
                    page_id = %existing,
                    discarded_page_id = %page_id,
                    parent_page_id = %parent.id(),
                    choice_index,
                    "Choice was linked by another writer, replaying"
                );
                self.load_child(story_id, existing).await
            }
        }
    }
}
