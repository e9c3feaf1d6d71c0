//! Engine composition.

use std::sync::Arc;

use storyloom_domain::{PageId, StoryId};

use crate::error::EngineError;
use crate::infrastructure::{
    claims::StoryLocks,
    clock::SystemClock,
    ports::{ClockPort, PageGenerator, StoryRepo},
    settings::{EngineSettings, SettingsError},
};
use crate::use_cases::story::{
    ChoiceOutcome, MakeChoice, PageOverview, PageOverviewQuery, RewriteStructure, StartStory,
    StartStoryInput, StartedStory, StoryUseCases,
};

/// The story engine.
///
/// Holds the use cases wired to one repository and one generator. Several
/// engines may share a repository. Within one engine, concurrent requests for
/// a choice wait on a claim; across engines the repository's child commit
/// decides which page the choice leads to.
pub struct StoryEngine {
    pub use_cases: StoryUseCases,
    locks: Arc<StoryLocks>,
}

impl StoryEngine {
    pub fn new(
        repo: Arc<dyn StoryRepo>,
        generator: Arc<dyn PageGenerator>,
        clock: Arc<dyn ClockPort>,
        settings: EngineSettings,
    ) -> Self {
        let locks = Arc::new(StoryLocks::default());

        let start = StartStory::new(repo.clone(), generator.clone(), clock.clone());
        let make_choice = MakeChoice::new(
            repo.clone(),
            generator.clone(),
            RewriteStructure::new(generator, clock.clone()),
            clock,
            locks.clone(),
            settings,
        );
        let overview = PageOverviewQuery::new(repo, settings);

        Self {
            use_cases: StoryUseCases::new(start, make_choice, overview),
            locks,
        }
    }

    /// Engine on the system clock with settings read from the environment.
    pub fn from_env(
        repo: Arc<dyn StoryRepo>,
        generator: Arc<dyn PageGenerator>,
    ) -> Result<Self, SettingsError> {
        let settings = EngineSettings::load()?;
        Ok(Self::new(
            repo,
            generator,
            Arc::new(SystemClock::new()),
            settings,
        ))
    }

    pub async fn start_story(&self, input: StartStoryInput) -> Result<StartedStory, EngineError> {
        self.use_cases.start.execute(input).await
    }

    pub async fn make_choice(
        &self,
        story_id: StoryId,
        page_id: PageId,
        choice_index: usize,
    ) -> Result<ChoiceOutcome, EngineError> {
        self.use_cases
            .make_choice
            .execute(story_id, page_id, choice_index)
            .await
    }

    pub async fn page_overview(
        &self,
        story_id: StoryId,
        page_id: PageId,
    ) -> Result<PageOverview, EngineError> {
        self.use_cases.overview.execute(story_id, page_id).await
    }

    /// Number of choice claims currently held or awaited.
    pub fn pending_claims(&self) -> usize {
        self.locks.choices.len()
    }
}
