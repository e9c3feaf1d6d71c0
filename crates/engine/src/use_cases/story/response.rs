//! Generation response parser.
//!
//! Turns the JSON payload returned by a generation adapter into a
//! [`PageGeneration`]. The payload may be wrapped in a Markdown code fence.
//! Removal ids that do not belong to their category (`inv-` ids in the health
//! list, free text, and so on) are dropped with a warning before they reach the
//! accumulators.

use std::sync::LazyLock;

use regex_lite::Regex;
use storyloom_domain::{is_well_formed_id, EntryCategory, PageGeneration};

static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseParseError {
    #[error("Generation response is empty")]
    Empty,
    #[error("Generation response is malformed: {0}")]
    Malformed(String),
    #[error("Generation response has no narrative")]
    MissingNarrative,
}

pub fn parse_page_generation(raw: &str) -> Result<PageGeneration, ResponseParseError> {
    let body = CODE_FENCE_RE
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map_or(raw.trim(), |body| body.as_str());
    if body.is_empty() {
        return Err(ResponseParseError::Empty);
    }

    let mut generation: PageGeneration =
        serde_json::from_str(body).map_err(|e| ResponseParseError::Malformed(e.to_string()))?;
    if generation.narrative.trim().is_empty() {
        return Err(ResponseParseError::MissingNarrative);
    }

    retain_well_formed(&mut generation.inventory.removed, EntryCategory::Inventory);
    retain_well_formed(&mut generation.health.removed, EntryCategory::Health);
    retain_well_formed(
        &mut generation.character_state.removed,
        EntryCategory::CharacterState,
    );
    let active = &mut generation.active_state;
    retain_well_formed(&mut active.threats.removed, EntryCategory::Threat);
    retain_well_formed(&mut active.constraints.removed, EntryCategory::Constraint);
    retain_well_formed(&mut active.threads_resolved, EntryCategory::Thread);
    retain_well_formed(&mut generation.promises.resolved, EntryCategory::Promise);

    Ok(generation)
}

fn retain_well_formed(ids: &mut Vec<String>, category: EntryCategory) {
    ids.retain(|id| {
        let well_formed = is_well_formed_id(id, category);
        if !well_formed {
            tracing::warn!(id = %id, category = %category, "Dropping malformed removal id");
        }
        well_formed
    });
}
