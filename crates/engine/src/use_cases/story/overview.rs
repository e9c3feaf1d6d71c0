//! Page overview query.
//!
//! Read-only projections shown next to a page: where the branch stands in the
//! planned structure, the open-thread panel, and what is overdue.

use std::sync::Arc;

use storyloom_domain::{
    open_thread_panel, overdue_threads, partition_promises, structure_position_label,
    OpenThreadPanel, PageId, StoryId, ThreadEntry, TrackedPromise,
};

use crate::error::EngineError;
use crate::infrastructure::ports::StoryRepo;
use crate::infrastructure::settings::EngineSettings;
use crate::use_cases::validation::resolve_active_structure_version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOverview {
    pub page_id: PageId,
    /// e.g. "Act 2: The Descent, Beat 2.1"; `None` without a structure or
    /// once every beat is concluded
    pub position_label: Option<String>,
    pub thread_panel: OpenThreadPanel,
    pub overdue_threads: Vec<ThreadEntry>,
    pub aging_promises: Vec<TrackedPromise>,
    pub is_ending: bool,
}

pub struct PageOverviewQuery {
    repo: Arc<dyn StoryRepo>,
    settings: EngineSettings,
}

impl PageOverviewQuery {
    pub fn new(repo: Arc<dyn StoryRepo>, settings: EngineSettings) -> Self {
        Self { repo, settings }
    }

    pub async fn execute(
        &self,
        story_id: StoryId,
        page_id: PageId,
    ) -> Result<PageOverview, EngineError> {
        let story = self
            .repo
            .load_story(story_id)
            .await?
            .ok_or(EngineError::StoryNotFound(story_id))?;
        let page = self
            .repo
            .load_page(story_id, page_id)
            .await?
            .ok_or(EngineError::PageNotFound { story_id, page_id })?;

        let position_label = resolve_active_structure_version(&story, &page).and_then(|version| {
            structure_position_label(&version.structure, page.accumulated_structure_state())
        });

        let threads = &page.accumulated_active_state().open_threads;
        let thresholds = &self.settings.thread_aging;
        Ok(PageOverview {
            page_id,
            position_label,
            thread_panel: open_thread_panel(
                threads,
                page.thread_ages(),
                thresholds,
                self.settings.thread_panel_rows,
            ),
            overdue_threads: overdue_threads(threads, page.thread_ages(), thresholds)
                .into_iter()
                .cloned()
                .collect(),
            aging_promises: partition_promises(
                page.accumulated_promises(),
                self.settings.promise_aging_notice,
            )
            .aging,
            is_ending: page.is_ending(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockStoryRepo;
    use crate::use_cases::story::test_support::{
        generation, opening_page, planned_story, three_act_structure,
    };
    use storyloom_domain::{
        build_first_page, AccumulatedStructureState, BeatProgression, StructureContext,
    };

    #[tokio::test]
    async fn structured_page_shows_position() {
        let story = planned_story(Some(three_act_structure()));
        let version = story.latest_structure_version().unwrap().clone();
        let page = build_first_page(
            &generation("Wind."),
            StructureContext {
                structure_state: AccumulatedStructureState {
                    current_act_index: 1,
                    current_beat_index: 0,
                    beat_progressions: vec![BeatProgression::active("2.1")],
                },
                structure_version_id: Some(version.id),
            },
        )
        .unwrap();

        let mut repo = MockStoryRepo::new();
        repo.expect_load_story()
            .returning(move |_| Ok(Some(story.clone())));
        repo.expect_load_page()
            .returning(move |_, _| Ok(Some(page.clone())));

        let overview = PageOverviewQuery::new(Arc::new(repo), EngineSettings::default())
            .execute(StoryId::new(), PageId::FIRST)
            .await
            .unwrap();

        assert_eq!(
            overview.position_label.as_deref(),
            Some("Act 2: The Descent, Beat 2.1")
        );
        assert!(overview.thread_panel.rows.is_empty());
        assert!(overview.thread_panel.overflow.is_none());
        assert!(!overview.is_ending);
    }

    #[tokio::test]
    async fn unstructured_page_has_no_position() {
        let story = planned_story(None);
        let page = opening_page(None);
        let mut repo = MockStoryRepo::new();
        repo.expect_load_story()
            .returning(move |_| Ok(Some(story.clone())));
        repo.expect_load_page()
            .returning(move |_, _| Ok(Some(page.clone())));

        let overview = PageOverviewQuery::new(Arc::new(repo), EngineSettings::default())
            .execute(StoryId::new(), PageId::FIRST)
            .await
            .unwrap();

        assert!(overview.position_label.is_none());
    }

    #[tokio::test]
    async fn when_page_missing_returns_error() {
        let story = planned_story(None);
        let mut repo = MockStoryRepo::new();
        repo.expect_load_story()
            .returning(move |_| Ok(Some(story.clone())));
        repo.expect_load_page().returning(|_, _| Ok(None));

        let result = PageOverviewQuery::new(Arc::new(repo), EngineSettings::default())
            .execute(StoryId::new(), PageId::FIRST)
            .await;

        assert!(matches!(result, Err(EngineError::PageNotFound { .. })));
    }
}
