//! Start story use case.
//!
//! Creates the story, optionally plans its act/beat structure, and generates
//! page 1.

use std::sync::Arc;

use storyloom_domain::{
    apply_structure_progression, build_first_page, create_initial_structure_state, Page, Story,
    StoryPremise, StoryTitle, StructureContext,
};

use crate::error::EngineError;
use crate::infrastructure::ports::{
    ClockPort, OpeningRequest, PageGenerator, StoryRepo, StructurePlanRequest,
};
use crate::use_cases::validation::validate_first_page_structure_version;

#[derive(Debug, Clone)]
pub struct StartStoryInput {
    pub title: String,
    pub premise: StoryPremise,
    /// Ask the generator for an act/beat plan before the opening page
    pub plan_structure: bool,
}

#[derive(Debug, Clone)]
pub struct StartedStory {
    pub story: Story,
    pub page: Page,
}

pub struct StartStory {
    repo: Arc<dyn StoryRepo>,
    generator: Arc<dyn PageGenerator>,
    clock: Arc<dyn ClockPort>,
}

impl StartStory {
    pub fn new(
        repo: Arc<dyn StoryRepo>,
        generator: Arc<dyn PageGenerator>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            repo,
            generator,
            clock,
        }
    }

    pub async fn execute(&self, input: StartStoryInput) -> Result<StartedStory, EngineError> {
        let title = StoryTitle::new(input.title)?;
        let now = self.clock.now();
        let mut story = Story::new(title, input.premise, now);

        if input.plan_structure {
            let structure = self
                .generator
                .plan_structure(StructurePlanRequest {
                    title: story.title().to_string(),
                    premise: story.premise().clone(),
                })
                .await?;
            story = story.adopt_structure(structure, now)?;
        }

        validate_first_page_structure_version(&story)?;

        let version = story.latest_structure_version();
        let initial_state = version
            .map(|v| create_initial_structure_state(&v.structure))
            .unwrap_or_default();

        let generation = self
            .generator
            .write_opening(OpeningRequest {
                title: story.title().to_string(),
                premise: story.premise().clone(),
                structure: story.structure().cloned(),
                structure_state: initial_state.clone(),
            })
            .await?;

        if generation.deviation.is_deviation() {
            tracing::debug!(
                story_id = %story.id(),
                "Ignoring deviation reported for the opening page"
            );
        }

        let structure_state = match version {
            Some(v) => apply_structure_progression(
                &v.structure,
                &initial_state,
                generation.beat_concluded,
                &generation.beat_resolution,
            ),
            None => initial_state,
        };
        let page = build_first_page(
            &generation,
            StructureContext {
                structure_state,
                structure_version_id: version.map(|v| v.id),
            },
        )?;

        self.repo.save_story(&story).await?;
        self.repo.save_page(story.id(), &page).await?;

        tracing::info!(
            story_id = %story.id(),
            title = %story.title(),
            structured = story.structure().is_some(),
            "Story started"
        );

        Ok(StartedStory { story, page })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{
        GenerationError, MockPageGenerator, MockStoryRepo, RepoError,
    };
    use crate::use_cases::story::test_support::{generation, now, premise, three_act_structure};
    use storyloom_domain::{BeatStatus, PageId};

    fn input(plan_structure: bool) -> StartStoryInput {
        StartStoryInput {
            title: "The Last Lamp".to_string(),
            premise: premise(),
            plan_structure,
        }
    }

    fn saving_repo() -> MockStoryRepo {
        let mut repo = MockStoryRepo::new();
        repo.expect_save_story().times(1).returning(|_| Ok(()));
        repo.expect_save_page()
            .withf(|_, page| page.id() == PageId::FIRST)
            .times(1)
            .returning(|_, _| Ok(()));
        repo
    }

    fn use_case(repo: MockStoryRepo, generator: MockPageGenerator) -> StartStory {
        StartStory::new(Arc::new(repo), Arc::new(generator), Arc::new(FixedClock(now())))
    }

    #[tokio::test]
    async fn structured_story_gets_initial_version_and_state() {
        let mut generator = MockPageGenerator::new();
        generator
            .expect_plan_structure()
            .withf(|request| request.title == "The Last Lamp")
            .times(1)
            .returning(|_| Ok(three_act_structure()));
        generator
            .expect_write_opening()
            .withf(|request| request.structure.is_some())
            .times(1)
            .returning(|_| Ok(generation("The lamp gutters.")));

        let started = use_case(saving_repo(), generator)
            .execute(input(true))
            .await
            .unwrap();

        let version = started.story.latest_structure_version().unwrap();
        assert!(version.is_initial());
        assert_eq!(started.page.structure_version_id(), Some(version.id));
        let state = started.page.accumulated_structure_state();
        assert_eq!(state.current_act_index, 0);
        assert_eq!(state.current_beat_index, 0);
        assert_eq!(state.status_of("1.1"), Some(BeatStatus::Active));
        assert_eq!(started.story.created_at(), now());
    }

    #[tokio::test]
    async fn unstructured_story_has_no_version() {
        let mut generator = MockPageGenerator::new();
        generator.expect_plan_structure().never();
        generator
            .expect_write_opening()
            .returning(|_| Ok(generation("The lamp gutters.")));

        let started = use_case(saving_repo(), generator)
            .execute(input(false))
            .await
            .unwrap();

        assert!(started.story.structure().is_none());
        assert_eq!(started.page.structure_version_id(), None);
        assert!(started.page.accumulated_structure_state().beat_progressions.is_empty());
    }

    #[tokio::test]
    async fn opening_can_conclude_first_beat() {
        let mut generator = MockPageGenerator::new();
        generator
            .expect_plan_structure()
            .returning(|_| Ok(three_act_structure()));
        generator.expect_write_opening().returning(|_| {
            Ok(generation("The keeper's note is found.").with_beat_concluded("Found the note"))
        });

        let started = use_case(saving_repo(), generator)
            .execute(input(true))
            .await
            .unwrap();

        let state = started.page.accumulated_structure_state();
        assert!(state.is_concluded("1.1"));
        assert_eq!(state.status_of("1.2"), Some(BeatStatus::Active));
    }

    #[tokio::test]
    async fn when_title_blank_returns_error() {
        let mut generator = MockPageGenerator::new();
        generator.expect_plan_structure().never();
        generator.expect_write_opening().never();
        let mut repo = MockStoryRepo::new();
        repo.expect_save_story().never();

        let result = use_case(repo, generator)
            .execute(StartStoryInput {
                title: "   ".to_string(),
                ..input(true)
            })
            .await;

        assert!(matches!(result, Err(EngineError::Domain(_))));
    }

    #[tokio::test]
    async fn when_opening_has_one_choice_nothing_is_saved() {
        let mut generator = MockPageGenerator::new();
        generator.expect_write_opening().returning(|_| {
            Ok(storyloom_domain::PageGeneration::new(
                "A single path.",
                vec!["Onward".to_string()],
            ))
        });
        let mut repo = MockStoryRepo::new();
        repo.expect_save_story().never();
        repo.expect_save_page().never();

        let result = use_case(repo, generator).execute(input(false)).await;

        match result {
            Err(EngineError::Domain(e)) => assert!(e.is_structural()),
            other => panic!("expected structural error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn when_generation_fails_returns_error() {
        let mut generator = MockPageGenerator::new();
        generator
            .expect_plan_structure()
            .returning(|_| Err(GenerationError::RequestFailed("timeout".to_string())));

        let result = use_case(MockStoryRepo::new(), generator)
            .execute(input(true))
            .await;

        assert!(matches!(result, Err(EngineError::Generation(_))));
    }

    #[tokio::test]
    async fn when_save_fails_returns_error() {
        let mut generator = MockPageGenerator::new();
        generator
            .expect_write_opening()
            .returning(|_| Ok(generation("The lamp gutters.")));
        let mut repo = MockStoryRepo::new();
        repo.expect_save_story()
            .returning(|_| Err(RepoError::storage("save_story", "disk full")));

        let result = use_case(repo, generator).execute(input(false)).await;

        assert!(matches!(result, Err(EngineError::Repo(_))));
    }
}
