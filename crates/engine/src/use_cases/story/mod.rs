//! Story use cases - starting a story, resolving choices, rewriting the
//! planned structure, and page projections.

mod make_choice;
mod overview;
pub mod response;
mod rewrite;
mod start;

#[cfg(test)]
pub(crate) mod test_support;

pub use make_choice::{ChoiceOutcome, MakeChoice};
pub use overview::{PageOverview, PageOverviewQuery};
pub use response::{parse_page_generation, ResponseParseError};
pub use rewrite::{RewriteRequest, RewriteStructure, RewrittenStructure};
pub use start::{StartStory, StartStoryInput, StartedStory};

/// Container for the story use cases.
pub struct StoryUseCases {
    pub start: StartStory,
    pub make_choice: MakeChoice,
    pub overview: PageOverviewQuery,
}

impl StoryUseCases {
    pub fn new(start: StartStory, make_choice: MakeChoice, overview: PageOverviewQuery) -> Self {
        Self {
            start,
            make_choice,
            overview,
        }
    }
}
