//! Structure rewrite use case.
//!
//! Turns an accepted beat deviation into a new structure version: concluded
//! beats are preserved, the generator plans the rest, and the branch's state is
//! re-anchored in the merged structure. Nothing is persisted here and no lock
//! is held; the caller commits the returned version together with the page
//! that triggered it.

use std::sync::Arc;

use storyloom_domain::{
    build_rewrite_context, create_rewritten_versioned_structure,
    merge_preserved_with_regenerated, reconcile_structure_state, validate_deviation_targets,
    AccumulatedStructureState, BeatDeviation, PageId, Story, VersionedStoryStructure,
};

use crate::error::EngineError;
use crate::infrastructure::ports::{ClockPort, PageGenerator};

pub struct RewriteRequest<'a> {
    pub story: &'a Story,
    /// The version the branch was generated under
    pub version: &'a VersionedStoryStructure,
    /// Branch state after applying the new page's progression
    pub structure_state: &'a AccumulatedStructureState,
    pub deviation: &'a BeatDeviation,
    /// The page whose generation reported the deviation
    pub page_id: PageId,
}

#[derive(Debug, Clone)]
pub struct RewrittenStructure {
    /// New version, not yet part of any stored story
    pub version: VersionedStoryStructure,
    pub structure_state: AccumulatedStructureState,
}

pub struct RewriteStructure {
    generator: Arc<dyn PageGenerator>,
    clock: Arc<dyn ClockPort>,
}

impl RewriteStructure {
    pub fn new(generator: Arc<dyn PageGenerator>, clock: Arc<dyn ClockPort>) -> Self {
        Self { generator, clock }
    }

    /// Returns `None` when the deviation targets a concluded beat; such a
    /// deviation is discarded and the branch keeps its current version.
    pub async fn execute(
        &self,
        request: RewriteRequest<'_>,
    ) -> Result<Option<RewrittenStructure>, EngineError> {
        let RewriteRequest {
            story,
            version,
            structure_state,
            deviation,
            page_id,
        } = request;

        if !validate_deviation_targets(deviation, structure_state) {
            tracing::warn!(
                story_id = %story.id(),
                page_id = %page_id,
                invalidated = ?deviation.invalidated_beat_ids(),
                reason = %deviation.reason(),
                "Deviation targets a concluded beat, discarding it"
            );
            return Ok(None);
        }

        let context = build_rewrite_context(story, version, structure_state, deviation);
        let preserved = context.completed_beats.clone();
        let preserved_ids = context.preserved_beat_ids();

        let regenerated = self.generator.regenerate_structure(context).await?;
        let merged = merge_preserved_with_regenerated(
            &preserved,
            &regenerated,
            &version.structure.overall_theme,
        )?;
        merged.validate()?;

        let now = self.clock.now();
        let rewritten = create_rewritten_versioned_structure(
            version,
            merged,
            preserved_ids,
            deviation.reason(),
            page_id,
            now,
        );
        let structure_state = reconcile_structure_state(&rewritten.structure, structure_state);

        tracing::info!(
            story_id = %story.id(),
            page_id = %page_id,
            previous_version_id = %version.id,
            version_id = %rewritten.id,
            preserved = rewritten.preserved_beat_ids.len(),
            "Story structure rewritten"
        );

        Ok(Some(RewrittenStructure {
            version: rewritten,
            structure_state,
        }))
    }
}
