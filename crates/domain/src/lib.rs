//! Storyloom domain - the branching page tree and its state model
//!
//! Everything here is synchronous and free of I/O. Accumulators and builders
//! borrow their inputs and return freshly allocated values, so sibling
//! branches never share mutable state.

pub mod error;
pub mod generation;
pub mod ids;
pub mod keyed_entry;
pub mod page;
pub mod state;
pub mod story;
pub mod structure;
pub mod threads;
pub mod value_objects;

pub use error::DomainError;
pub use generation::PageGeneration;
pub use ids::{PageId, StoryId, StructureVersionId};
pub use keyed_entry::{
    assign_ids, extract_id_number, is_well_formed_id, remove_by_ids, EntryCategory, IdCounters,
    IdSequence, Keyed, KeyedEntry,
};
pub use page::{
    build_continuation_page, build_first_page, Choice, ContinuationContext, Page,
    ParentCollections, StructureContext, MAX_CHOICES, MIN_CHOICES,
};
pub use state::{
    accumulate, accumulate_active_state, accumulate_character_state, accumulate_health,
    accumulate_inventory, accumulate_promises, age_threads, AccumulatedCharacterState,
    ActiveState, ActiveStateChanges, CharacterStateAddition, CharacterStateDelta, CharacterStates,
    KeyedDelta, PromiseChanges,
};
pub use story::{Story, StoryPremise};
pub use structure::{
    apply_structure_progression, build_rewrite_context, create_initial_structure_state,
    create_initial_versioned_structure, create_rewritten_versioned_structure,
    extract_completed_beats, merge_preserved_with_regenerated, reconcile_structure_state,
    structure_position_label, validate_deviation_targets, AccumulatedStructureState, Act, Beat,
    BeatDeviation, BeatProgression, BeatRole, BeatStatus, CompletedBeat, DeviationResult,
    RewriteContext, StoryStructure, VersionedStoryStructure,
};
pub use threads::{
    is_thread_overdue, open_thread_panel, overdue_threads, partition_promises, NewPromise,
    NewThread, OpenThreadPanel, PromisePartition, PromiseType, ThreadAgingThresholds, ThreadEntry,
    ThreadOverflow, ThreadPanelRow, ThreadType, TrackedPromise, Urgency,
    DEFAULT_PROMISE_AGING_NOTICE, DEFAULT_THREAD_PANEL_ROWS,
};
pub use value_objects::{
    CharacterKey, EmotionIntensity, ProtagonistAffect, SecondaryEmotion, StoryTitle,
};
