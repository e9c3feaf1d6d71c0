//! Use cases - story orchestration.

pub mod story;
pub mod validation;

pub use story::{
    ChoiceOutcome, MakeChoice, PageOverview, PageOverviewQuery, RewriteStructure, StartStory,
    StartStoryInput, StartedStory, StoryUseCases,
};
