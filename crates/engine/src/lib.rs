//! Storyloom engine library.
//!
//! Async orchestration around the pure `storyloom-domain` crate: starting a
//! story, resolving choices into generated pages, and rewriting the planned
//! structure when the narrative leaves it behind.
//!
//! ## Structure
//!
//! - `use_cases/` - Story orchestration over the domain
//! - `infrastructure/` - Ports, the in-memory store, settings and telemetry
//! - `app` - Engine composition

pub mod app;
pub mod error;
pub mod infrastructure;
pub mod use_cases;

pub use app::StoryEngine;
pub use error::EngineError;
pub use infrastructure::memory::InMemoryStoryStore;
pub use infrastructure::ports::{
    ClockPort, ContinuationRequest, GenerationError, OpeningRequest, PageGenerator, RepoError,
    StoryRepo, StructurePlanRequest,
};
pub use infrastructure::settings::{EngineSettings, SettingsError};
pub use infrastructure::telemetry::init_tracing;
pub use use_cases::story::{
    parse_page_generation, ChoiceOutcome, PageOverview, ResponseParseError, StartStoryInput,
    StartedStory,
};
