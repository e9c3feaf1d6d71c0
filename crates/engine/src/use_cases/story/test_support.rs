//! Shared fixtures for story use-case tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use storyloom_domain::{
    build_first_page, Act, Beat, BeatRole, Page, PageGeneration, Story, StoryPremise,
    StoryStructure, StoryTitle, StructureContext, StructureVersionId,
};

use crate::app::StoryEngine;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::memory::InMemoryStoryStore;
use crate::infrastructure::ports::MockPageGenerator;
use crate::infrastructure::settings::EngineSettings;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
}

pub fn premise() -> StoryPremise {
    StoryPremise::new(
        "A lighthouse keeper's apprentice",
        "A storm-wracked northern coast",
        "Eerie",
    )
}

/// Three acts of two beats; act 2 is "The Descent".
pub fn three_act_structure() -> StoryStructure {
    let names = ["The Call", "The Descent", "The Return"];
    StoryStructure {
        acts: names
            .iter()
            .enumerate()
            .map(|(a, name)| Act {
                id: (a + 1).to_string(),
                name: name.to_string(),
                objective: format!("Survive {name}"),
                stakes: "The light goes out".to_string(),
                entry_condition: String::new(),
                beats: (1..=2)
                    .map(|b| Beat {
                        id: format!("{}.{b}", a + 1),
                        description: format!("{name} beat {b}"),
                        objective: format!("Objective {}.{b}", a + 1),
                        role: if b == 1 {
                            BeatRole::Setup
                        } else {
                            BeatRole::TurningPoint
                        },
                    })
                    .collect(),
            })
            .collect(),
        overall_theme: "Light must be tended".to_string(),
        premise: "The keeper vanished during the storm".to_string(),
    }
}

pub fn planned_story(structure: Option<StoryStructure>) -> Story {
    let story = Story::new(StoryTitle::new("The Last Lamp").unwrap(), premise(), now());
    match structure {
        Some(structure) => story.adopt_structure(structure, now()).unwrap(),
        None => story,
    }
}

pub fn choices(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

pub fn generation(narrative: &str) -> PageGeneration {
    PageGeneration::new(narrative, choices(&["Climb the stairs", "Check the cellar"]))
}

pub fn opening_page(structure_version_id: Option<StructureVersionId>) -> Page {
    build_first_page(
        &generation("Wind howls around the tower."),
        StructureContext {
            structure_state: Default::default(),
            structure_version_id,
        },
    )
    .unwrap()
}

pub fn engine(store: &InMemoryStoryStore, generator: MockPageGenerator) -> StoryEngine {
    StoryEngine::new(
        Arc::new(store.clone()),
        Arc::new(generator),
        Arc::new(FixedClock(now())),
        EngineSettings::default(),
    )
}
