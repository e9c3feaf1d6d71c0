//! Structure-version gates checked before any page is generated.

use storyloom_domain::{Page, Story, VersionedStoryStructure};

use crate::error::EngineError;

/// A story that has a structure must also have at least one version of it.
pub fn validate_first_page_structure_version(story: &Story) -> Result<(), EngineError> {
    if story.structure().is_some() && story.structure_versions().is_empty() {
        return Err(EngineError::structure_version(
            "Story has structure but no structure versions",
        ));
    }
    Ok(())
}

/// As [`validate_first_page_structure_version`], plus the parent page must
/// name the version it was generated under.
pub fn validate_continuation_structure_version(
    story: &Story,
    parent_page: &Page,
) -> Result<(), EngineError> {
    validate_first_page_structure_version(story)?;
    if story.structure().is_some() && parent_page.structure_version_id().is_none() {
        return Err(EngineError::structure_version(format!(
            "Parent page {} has null structureVersionId but story has structure",
            parent_page.id()
        )));
    }
    Ok(())
}

/// The version a child of `parent_page` continues under.
///
/// `None` when the parent has no version id. An id the story does not know
/// falls back to the latest version.
pub fn resolve_active_structure_version<'a>(
    story: &'a Story,
    parent_page: &Page,
) -> Option<&'a VersionedStoryStructure> {
    let version_id = parent_page.structure_version_id()?;
    match story.structure_version(version_id) {
        Some(version) => Some(version),
        None => {
            let latest = story.latest_structure_version();
            tracing::warn!(
                story_id = %story.id(),
                page_id = %parent_page.id(),
                version_id = %version_id,
                fallback_version_id = ?latest.map(|v| v.id),
                "Parent page references unknown structure version, using latest"
            );
            latest
        }
    }
}
