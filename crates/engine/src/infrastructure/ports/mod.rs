//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Story and page persistence (in-memory today, any durable store later)
//! - The generation collaborator (LLM prompting and response repair)
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

pub use error::{GenerationError, RepoError};
pub use external::{ContinuationRequest, OpeningRequest, PageGenerator, StructurePlanRequest};
pub use repos::{ChildCommit, NewChildPage, StoryRepo};
pub use testing::ClockPort;

#[cfg(test)]
pub use external::MockPageGenerator;
#[cfg(test)]
pub use repos::MockStoryRepo;
