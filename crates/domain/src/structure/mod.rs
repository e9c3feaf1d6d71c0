//! Story structure - planned acts and beats, per-branch progression, and
//! versioned rewrites
//!
//! The plan is an ordered list of acts, each an ordered list of beats with
//! stable "act.beat" ids. Every page carries its own
//! [`AccumulatedStructureState`] snapshot, so two siblings that conclude (or do
//! not conclude) the current beat diverge without sharing anything.
//!
//! When generated content drifts from the plan, a deviation names the beats it
//! invalidates. Concluded beats are never invalidated; they are preserved
//! verbatim and merged in front of a regenerated remainder, producing a new
//! immutable [`VersionedStoryStructure`].

mod deviation;
mod model;
mod progression;
mod rewrite;
mod version;

pub use deviation::{validate_deviation_targets, BeatDeviation, DeviationResult};
pub use model::{Act, Beat, BeatRole, StoryStructure};
pub use progression::{
    apply_structure_progression, create_initial_structure_state, structure_position_label,
    AccumulatedStructureState, BeatProgression, BeatStatus,
};
pub use rewrite::{
    build_rewrite_context, extract_completed_beats, merge_preserved_with_regenerated,
    reconcile_structure_state, CompletedBeat, RewriteContext,
};
pub use version::{
    create_initial_versioned_structure, create_rewritten_versioned_structure,
    VersionedStoryStructure,
};
