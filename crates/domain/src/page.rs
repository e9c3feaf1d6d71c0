//! Page entity - one immutable node of the story tree
//!
//! A page carries the delta its generation produced and the full accumulated
//! value of every category along its branch. Only the choice links change
//! after creation, and only through [`Page::with_choice_link`], which returns a
//! new page.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::generation::PageGeneration;
use crate::ids::{PageId, StructureVersionId};
use crate::keyed_entry::{IdCounters, KeyedEntry};
use crate::state::{
    accumulate_active_state, accumulate_character_state, accumulate_health, accumulate_inventory,
    accumulate_promises, age_threads, AccumulatedCharacterState, ActiveState, ActiveStateChanges,
    CharacterStateDelta, KeyedDelta, PromiseChanges,
};
use crate::structure::AccumulatedStructureState;
use crate::threads::TrackedPromise;
use crate::value_objects::ProtagonistAffect;

pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    /// Child page reached through this choice, once it has been generated
    #[serde(default)]
    pub next_page_id: Option<PageId>,
}

impl Choice {
    pub fn unexplored(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_page_id: None,
        }
    }
}

/// Structure position handed to the builders by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureContext {
    pub structure_state: AccumulatedStructureState,
    pub structure_version_id: Option<StructureVersionId>,
}

/// Borrowed view of the parent's accumulated collections.
#[derive(Debug, Clone, Copy)]
pub struct ParentCollections<'a> {
    pub inventory: &'a [KeyedEntry],
    pub health: &'a [KeyedEntry],
    pub character_state: &'a AccumulatedCharacterState,
    pub active_state: &'a ActiveState,
    pub promises: &'a [TrackedPromise],
    pub thread_ages: &'a BTreeMap<String, u32>,
    pub id_counters: &'a IdCounters,
}

impl<'a> ParentCollections<'a> {
    pub fn of(page: &'a Page) -> Self {
        Self {
            inventory: &page.accumulated_inventory,
            health: &page.accumulated_health,
            character_state: &page.accumulated_character_state,
            active_state: &page.accumulated_active_state,
            promises: &page.accumulated_promises,
            thread_ages: &page.thread_ages,
            id_counters: &page.id_counters,
        }
    }
}

pub struct ContinuationContext<'a> {
    pub page_id: PageId,
    pub parent_page_id: PageId,
    pub parent_choice_index: usize,
    pub parent: ParentCollections<'a>,
    pub structure: StructureContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    id: PageId,
    narrative_text: String,
    choices: Vec<Choice>,

    inventory_changes: KeyedDelta,
    accumulated_inventory: Vec<KeyedEntry>,
    health_changes: KeyedDelta,
    accumulated_health: Vec<KeyedEntry>,
    character_state_changes: CharacterStateDelta,
    accumulated_character_state: AccumulatedCharacterState,
    active_state_changes: ActiveStateChanges,
    accumulated_active_state: ActiveState,
    promise_changes: PromiseChanges,
    accumulated_promises: Vec<TrackedPromise>,
    thread_ages: BTreeMap<String, u32>,
    /// Highest keyed-entry number per category handed out on this branch
    #[serde(default)]
    id_counters: IdCounters,

    accumulated_structure_state: AccumulatedStructureState,
    structure_version_id: Option<StructureVersionId>,
    protagonist_affect: ProtagonistAffect,
    is_ending: bool,
    parent_page_id: Option<PageId>,
    parent_choice_index: Option<usize>,
}

/// Build the root page of a story. All accumulators start empty.
///
/// # Errors
///
/// `StructuralInvariantViolation` when the choices do not fit the page kind.
pub fn build_first_page(
    generation: &PageGeneration,
    structure: StructureContext,
) -> Result<Page, DomainError> {
    let empty_entries: Vec<KeyedEntry> = Vec::new();
    let empty_characters = AccumulatedCharacterState::new();
    let empty_active = ActiveState::default();
    let empty_ages = BTreeMap::new();
    let empty_counters = IdCounters::default();
    let parent = ParentCollections {
        inventory: &empty_entries,
        health: &empty_entries,
        character_state: &empty_characters,
        active_state: &empty_active,
        promises: &[],
        thread_ages: &empty_ages,
        id_counters: &empty_counters,
    };
    assemble(generation, PageId::FIRST, None, parent, structure)
}

/// Build a child page from its parent's collections.
///
/// # Errors
///
/// `StructuralInvariantViolation` when the choices do not fit the page kind
/// or the page id is the root id; `MalformedIdentifier` if a parent
/// collection holds an unparseable id.
pub fn build_continuation_page(
    generation: &PageGeneration,
    context: ContinuationContext<'_>,
) -> Result<Page, DomainError> {
    assemble(
        generation,
        context.page_id,
        Some((context.parent_page_id, context.parent_choice_index)),
        context.parent,
        context.structure,
    )
}

fn assemble(
    generation: &PageGeneration,
    id: PageId,
    parent_link: Option<(PageId, usize)>,
    parent: ParentCollections<'_>,
    structure: StructureContext,
) -> Result<Page, DomainError> {
    validate_parent_link(id, parent_link)?;
    validate_choices(&generation.choices, generation.is_ending)?;

    let mut id_counters = parent.id_counters.clone();
    let accumulated_inventory =
        accumulate_inventory(parent.inventory, &generation.inventory, &mut id_counters)?;
    let accumulated_health =
        accumulate_health(parent.health, &generation.health, &mut id_counters)?;
    let accumulated_character_state = accumulate_character_state(
        parent.character_state,
        &generation.character_state,
        &mut id_counters,
    )?;
    let accumulated_active_state =
        accumulate_active_state(parent.active_state, &generation.active_state, &mut id_counters)?;
    let accumulated_promises =
        accumulate_promises(parent.promises, &generation.promises, &mut id_counters)?;
    let thread_ages = age_threads(
        parent.thread_ages,
        &parent.active_state.open_threads,
        &accumulated_active_state.open_threads,
    );

    Ok(Page {
        id,
        narrative_text: generation.narrative.clone(),
        choices: generation
            .choices
            .iter()
            .map(|text| Choice::unexplored(text.trim()))
            .collect(),
        inventory_changes: generation.inventory.clone(),
        accumulated_inventory,
        health_changes: generation.health.clone(),
        accumulated_health,
        character_state_changes: generation.character_state.clone(),
        accumulated_character_state,
        active_state_changes: generation.active_state.clone(),
        accumulated_active_state,
        promise_changes: generation.promises.clone(),
        accumulated_promises,
        thread_ages,
        id_counters,
        accumulated_structure_state: structure.structure_state,
        structure_version_id: structure.structure_version_id,
        protagonist_affect: generation.protagonist_affect.clone(),
        is_ending: generation.is_ending,
        parent_page_id: parent_link.map(|(page, _)| page),
        parent_choice_index: parent_link.map(|(_, index)| index),
    })
}

fn validate_parent_link(id: PageId, parent_link: Option<(PageId, usize)>) -> Result<(), DomainError> {
    match (id.is_first(), parent_link) {
        (true, Some(_)) => Err(DomainError::structural(
            "Page 1 must not have a parent page or parent choice",
        )),
        (false, None) => Err(DomainError::structural(format!(
            "Page {id} must have a parent page and parent choice"
        ))),
        (false, Some((parent, _))) if parent >= id => Err(DomainError::structural(format!(
            "Page {id} cannot descend from page {parent}"
        ))),
        _ => Ok(()),
    }
}

fn validate_choices(choices: &[String], is_ending: bool) -> Result<(), DomainError> {
    if is_ending {
        if !choices.is_empty() {
            return Err(DomainError::structural(format!(
                "Ending page must have no choices, got {}",
                choices.len()
            )));
        }
        return Ok(());
    }

    if !(MIN_CHOICES..=MAX_CHOICES).contains(&choices.len()) {
        return Err(DomainError::structural(format!(
            "Non-ending page must have {MIN_CHOICES} to {MAX_CHOICES} choices, got {}",
            choices.len()
        )));
    }

    let mut seen = HashSet::new();
    for choice in choices {
        let normalized = choice.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::structural("Choice text must not be empty"));
        }
        if !seen.insert(normalized) {
            return Err(DomainError::structural(format!(
                "Duplicate choice text: {}",
                choice.trim()
            )));
        }
    }
    Ok(())
}

impl Page {
    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> PageId {
        self.id
    }

    #[inline]
    pub fn narrative_text(&self) -> &str {
        &self.narrative_text
    }

    #[inline]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn choice(&self, index: usize) -> Option<&Choice> {
        self.choices.get(index)
    }

    #[inline]
    pub fn inventory_changes(&self) -> &KeyedDelta {
        &self.inventory_changes
    }

    #[inline]
    pub fn accumulated_inventory(&self) -> &[KeyedEntry] {
        &self.accumulated_inventory
    }

    #[inline]
    pub fn health_changes(&self) -> &KeyedDelta {
        &self.health_changes
    }

    #[inline]
    pub fn accumulated_health(&self) -> &[KeyedEntry] {
        &self.accumulated_health
    }

    #[inline]
    pub fn character_state_changes(&self) -> &CharacterStateDelta {
        &self.character_state_changes
    }

    #[inline]
    pub fn accumulated_character_state(&self) -> &AccumulatedCharacterState {
        &self.accumulated_character_state
    }

    #[inline]
    pub fn active_state_changes(&self) -> &ActiveStateChanges {
        &self.active_state_changes
    }

    #[inline]
    pub fn accumulated_active_state(&self) -> &ActiveState {
        &self.accumulated_active_state
    }

    #[inline]
    pub fn promise_changes(&self) -> &PromiseChanges {
        &self.promise_changes
    }

    #[inline]
    pub fn accumulated_promises(&self) -> &[TrackedPromise] {
        &self.accumulated_promises
    }

    #[inline]
    pub fn thread_ages(&self) -> &BTreeMap<String, u32> {
        &self.thread_ages
    }

    #[inline]
    pub fn id_counters(&self) -> &IdCounters {
        &self.id_counters
    }

    #[inline]
    pub fn accumulated_structure_state(&self) -> &AccumulatedStructureState {
        &self.accumulated_structure_state
    }

    #[inline]
    pub fn structure_version_id(&self) -> Option<StructureVersionId> {
        self.structure_version_id
    }

    #[inline]
    pub fn protagonist_affect(&self) -> &ProtagonistAffect {
        &self.protagonist_affect
    }

    #[inline]
    pub fn is_ending(&self) -> bool {
        self.is_ending
    }

    #[inline]
    pub fn parent_page_id(&self) -> Option<PageId> {
        self.parent_page_id
    }

    #[inline]
    pub fn parent_choice_index(&self) -> Option<usize> {
        self.parent_choice_index
    }

    // =========================================================================
    // Choice links
    // =========================================================================

    /// Copy of this page with choice `index` pointing at `next_page_id`.
    ///
    /// Linking a choice to the page it already points at is a no-op; relinking
    /// it elsewhere is an error, as is an index past the last choice.
    pub fn with_choice_link(&self, index: usize, next_page_id: PageId) -> Result<Page, DomainError> {
        let choice = self.choices.get(index).ok_or_else(|| {
            DomainError::validation(format!(
                "Page {} has no choice {index} ({} choices)",
                self.id,
                self.choices.len()
            ))
        })?;
        match choice.next_page_id {
            Some(existing) if existing == next_page_id => Ok(self.clone()),
            Some(existing) => Err(DomainError::validation(format!(
                "Choice {index} of page {} already leads to page {existing}",
                self.id
            ))),
            None => {
                let mut linked = self.clone();
                linked.choices[index].next_page_id = Some(next_page_id);
                Ok(linked)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CharacterStateAddition, KeyedDelta};
    use crate::structure::{create_initial_structure_state, fixtures::structure};
    use crate::keyed_entry::EntryCategory;
    use crate::threads::{NewPromise, NewThread, PromiseType, ThreadType, Urgency};
    use crate::value_objects::{CharacterKey, EmotionIntensity};

    fn strings(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    fn opening() -> PageGeneration {
        PageGeneration::new("The storm breaks.", strings(&["Run", "Hide"]))
            .with_inventory(KeyedDelta::new(strings(&["Sword", "Shield"]), vec![]))
    }

    fn first_page() -> Page {
        build_first_page(&opening(), StructureContext::default()).unwrap()
    }

    fn child_of<'a>(parent: &'a Page, id: u32, choice: usize) -> ContinuationContext<'a> {
        ContinuationContext {
            page_id: PageId::new(id).unwrap(),
            parent_page_id: parent.id(),
            parent_choice_index: choice,
            parent: ParentCollections::of(parent),
            structure: StructureContext {
                structure_state: parent.accumulated_structure_state().clone(),
                structure_version_id: parent.structure_version_id(),
            },
        }
    }

    mod first_page {
        use super::*;

        #[test]
        fn has_root_id_and_no_parent() {
            let page = first_page();
            assert_eq!(page.id(), PageId::FIRST);
            assert_eq!(page.parent_page_id(), None);
            assert_eq!(page.parent_choice_index(), None);
            assert_eq!(page.choices().len(), 2);
            assert!(page.choices().iter().all(|c| c.next_page_id.is_none()));
        }

        #[test]
        fn accumulators_start_from_empty() {
            let page = first_page();
            assert_eq!(
                page.accumulated_inventory(),
                &[KeyedEntry::new("inv-1", "Sword"), KeyedEntry::new("inv-2", "Shield")]
            );
            assert!(page.accumulated_health().is_empty());
            assert!(page.accumulated_character_state().is_empty());
        }

        #[test]
        fn carries_structure_context() {
            let s = structure(2, 2);
            let state = create_initial_structure_state(&s);
            let version = StructureVersionId::new();
            let page = build_first_page(
                &opening(),
                StructureContext {
                    structure_state: state.clone(),
                    structure_version_id: Some(version),
                },
            )
            .unwrap();
            assert_eq!(page.accumulated_structure_state(), &state);
            assert_eq!(page.structure_version_id(), Some(version));
        }
    }

    mod structural_checks {
        use super::*;

        fn first_with(generation: PageGeneration) -> Result<Page, DomainError> {
            build_first_page(&generation, StructureContext::default())
        }

        #[test]
        fn when_ending_page_has_choices_returns_error() {
            let mut generation = PageGeneration::ending("Fin.");
            generation.choices = strings(&["Again"]);
            assert!(first_with(generation).unwrap_err().is_structural());
        }

        #[test]
        fn ending_page_without_choices_is_accepted() {
            let page = first_with(PageGeneration::ending("Fin.")).unwrap();
            assert!(page.is_ending());
            assert!(page.choices().is_empty());
        }

        #[test]
        fn when_too_few_choices_returns_error() {
            let result = first_with(PageGeneration::new("x", strings(&["Only"])));
            assert!(result.unwrap_err().is_structural());
        }

        #[test]
        fn when_too_many_choices_returns_error() {
            let result = first_with(PageGeneration::new(
                "x",
                strings(&["a", "b", "c", "d", "e", "f"]),
            ));
            assert!(result.unwrap_err().is_structural());
        }

        #[test]
        fn five_choices_are_accepted() {
            let result = first_with(PageGeneration::new("x", strings(&["a", "b", "c", "d", "e"])));
            assert!(result.is_ok());
        }

        #[test]
        fn when_choices_differ_only_by_case_returns_error() {
            let result = first_with(PageGeneration::new("x", strings(&["Open the door", "open THE door"])));
            assert!(result.unwrap_err().is_structural());
        }

        #[test]
        fn when_continuation_uses_root_id_returns_error() {
            let parent = first_page();
            let mut context = child_of(&parent, 2, 0);
            context.page_id = PageId::FIRST;
            let result = build_continuation_page(&opening(), context);
            assert!(result.unwrap_err().is_structural());
        }
    }

    mod continuation {
        use super::*;

        #[test]
        fn inventory_scenario_removes_then_appends() {
            let parent = first_page();
            let generation = PageGeneration::new("You trade.", strings(&["Leave", "Stay"]))
                .with_inventory(KeyedDelta::new(strings(&["Bow"]), strings(&["inv-1"])));
            let child = build_continuation_page(&generation, child_of(&parent, 2, 0)).unwrap();

            assert_eq!(
                child.accumulated_inventory(),
                &[KeyedEntry::new("inv-2", "Shield"), KeyedEntry::new("inv-3", "Bow")]
            );
            assert_eq!(child.parent_page_id(), Some(PageId::FIRST));
            assert_eq!(child.parent_choice_index(), Some(0));
            assert_eq!(parent.accumulated_inventory().len(), 2);
        }

        #[test]
        fn removed_ids_stay_retired_down_the_branch() {
            let parent = first_page();
            let drop_shield = PageGeneration::new("The shield cracks.", strings(&["a", "b"]))
                .with_inventory(KeyedDelta::new(vec![], strings(&["inv-2"])));
            let child = build_continuation_page(&drop_shield, child_of(&parent, 2, 0)).unwrap();
            assert_eq!(child.id_counters().get(EntryCategory::Inventory), 2);

            let find_bow = PageGeneration::new("A bow in the reeds.", strings(&["c", "d"]))
                .with_inventory(KeyedDelta::new(strings(&["Bow"]), vec![]));
            let grandchild = build_continuation_page(&find_bow, child_of(&child, 3, 0)).unwrap();

            assert_eq!(
                grandchild.accumulated_inventory(),
                &[KeyedEntry::new("inv-1", "Sword"), KeyedEntry::new("inv-3", "Bow")]
            );
        }

        #[test]
        fn health_and_affect_are_recorded() {
            let parent = first_page();
            let generation = PageGeneration::new("Glass bites your palm.", strings(&["a", "b"]))
                .with_health(KeyedDelta::new(strings(&["Cut hand"]), vec![]))
                .with_protagonist_affect(
                    ProtagonistAffect::new(
                        "fear",
                        EmotionIntensity::Strong,
                        "The breaking lamp",
                        "Get out",
                    )
                    .with_secondary("guilt", "The keeper trusted you"),
                );
            let child = build_continuation_page(&generation, child_of(&parent, 2, 0)).unwrap();

            assert_eq!(child.accumulated_health(), &[KeyedEntry::new("hp-1", "Cut hand")]);
            assert_eq!(child.health_changes().added, strings(&["Cut hand"]));
            let affect = child.protagonist_affect();
            assert_eq!(affect.intensity, EmotionIntensity::Strong);
            assert_eq!(affect.secondary_emotions[0].emotion, "guilt");
        }

        #[test]
        fn siblings_accumulate_independently() {
            let parent = first_page();
            let left = PageGeneration::new("Left.", strings(&["a", "b"]))
                .with_inventory(KeyedDelta::new(strings(&["Lantern"]), vec![]));
            let right = PageGeneration::new("Right.", strings(&["c", "d"]))
                .with_inventory(KeyedDelta::new(vec![], strings(&["inv-2"])));

            let left = build_continuation_page(&left, child_of(&parent, 2, 0)).unwrap();
            let right = build_continuation_page(&right, child_of(&parent, 3, 1)).unwrap();

            assert_eq!(left.accumulated_inventory().len(), 3);
            assert_eq!(left.accumulated_inventory()[2].id, "inv-3");
            assert_eq!(right.accumulated_inventory(), &[KeyedEntry::new("inv-1", "Sword")]);
            assert_eq!(parent.accumulated_inventory().len(), 2);
        }

        #[test]
        fn character_threads_and_promises_flow_through() {
            let parent = first_page();
            let generation = PageGeneration::new("The captain eyes you.", strings(&["Bow", "Glare"]))
                .with_character_state(CharacterStateDelta {
                    added: vec![CharacterStateAddition {
                        character_name: "Captain Reyes".to_string(),
                        states: strings(&["Suspicious"]),
                    }],
                    removed: vec![],
                })
                .with_active_state(ActiveStateChanges {
                    new_location: Some("The quay".to_string()),
                    threads_added: vec![NewThread {
                        text: "Why is the captain here?".to_string(),
                        thread_type: ThreadType::Mystery,
                        urgency: Urgency::High,
                    }],
                    ..Default::default()
                })
                .with_promises(PromiseChanges {
                    added: vec![NewPromise {
                        description: "A gull with a red band".to_string(),
                        promise_type: PromiseType::ChekhovGun,
                        suggested_urgency: Urgency::Low,
                    }],
                    resolved: vec![],
                });
            let child = build_continuation_page(&generation, child_of(&parent, 2, 1)).unwrap();

            let reyes = &child.accumulated_character_state()[&CharacterKey::new("captain reyes").unwrap()];
            assert_eq!(reyes.states[0].id, "cs-1");
            assert_eq!(child.accumulated_active_state().current_location, "The quay");
            assert_eq!(child.thread_ages()["td-1"], 0);
            assert_eq!(child.accumulated_promises()[0].id, "pr-1");

            let grandchild = build_continuation_page(
                &PageGeneration::new("Later.", strings(&["x", "y"])),
                child_of(&child, 3, 0),
            )
            .unwrap();
            assert_eq!(grandchild.thread_ages()["td-1"], 1);
            assert_eq!(grandchild.accumulated_promises()[0].age, 1);
            assert_eq!(grandchild.accumulated_active_state().current_location, "The quay");
        }
    }

    mod choice_links {
        use super::*;

        #[test]
        fn linking_fills_only_the_choice() {
            let page = first_page();
            let linked = page.with_choice_link(1, PageId::new(2).unwrap()).unwrap();
            assert_eq!(linked.choice(1).unwrap().next_page_id, Some(PageId::new(2).unwrap()));
            assert_eq!(linked.choice(0).unwrap().next_page_id, None);
            assert_eq!(linked.accumulated_inventory(), page.accumulated_inventory());
            assert_eq!(page.choice(1).unwrap().next_page_id, None);
        }

        #[test]
        fn relinking_to_same_page_is_idempotent() {
            let linked = first_page().with_choice_link(0, PageId::new(2).unwrap()).unwrap();
            let again = linked.with_choice_link(0, PageId::new(2).unwrap()).unwrap();
            assert_eq!(again, linked);
        }

        #[test]
        fn when_relinking_elsewhere_returns_error() {
            let linked = first_page().with_choice_link(0, PageId::new(2).unwrap()).unwrap();
            assert!(linked.with_choice_link(0, PageId::new(3).unwrap()).is_err());
        }

        #[test]
        fn when_index_out_of_range_returns_error() {
            assert!(first_page().with_choice_link(2, PageId::new(2).unwrap()).is_err());
        }
    }

    #[test]
    fn round_trips_through_json() {
        let page = first_page().with_choice_link(0, PageId::new(2).unwrap()).unwrap();
        let json = serde_json::to_string(&page).unwrap();
        assert!(json.contains("\"accumulatedInventory\""));
        let back: Page = serde_json::from_str(&json).unwrap();
        assert_eq!(back, page);
    }
}
