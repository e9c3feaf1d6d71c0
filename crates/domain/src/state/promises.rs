//! Tracked promise accumulation

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::keyed_entry::{remove_by_ids, EntryCategory, IdCounters, Keyed};
use crate::threads::{NewPromise, TrackedPromise};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromiseChanges {
    #[serde(default)]
    pub added: Vec<NewPromise>,
    #[serde(default)]
    pub resolved: Vec<String>,
}

/// Drop resolved promises, age the rest by one page, append new ones at age 0.
pub fn accumulate_promises(
    parent: &[TrackedPromise],
    changes: &PromiseChanges,
    counters: &mut IdCounters,
) -> Result<Vec<TrackedPromise>, DomainError> {
    let mut sequence =
        counters.sequence(EntryCategory::Promise, parent.iter().map(|p| p.key()))?;
    let mut promises: Vec<TrackedPromise> = remove_by_ids(parent, &changes.resolved)
        .into_iter()
        .map(|mut promise| {
            promise.age = promise.age.saturating_add(1);
            promise
        })
        .collect();
    for promise in &changes.added {
        let description = promise.description.trim();
        if description.is_empty() {
            continue;
        }
        promises.push(TrackedPromise {
            id: sequence.next_id(),
            description: description.to_string(),
            promise_type: promise.promise_type,
            suggested_urgency: promise.suggested_urgency,
            age: 0,
        });
    }
    counters.record(&sequence);
    Ok(promises)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threads::{PromiseType, Urgency};

    fn new_promise(description: &str) -> NewPromise {
        NewPromise {
            description: description.to_string(),
            promise_type: PromiseType::Foreshadowing,
            suggested_urgency: Urgency::Low,
        }
    }

    #[test]
    fn promises_age_and_new_ones_start_at_zero() {
        let first = accumulate_promises(
            &[],
            &PromiseChanges {
                added: vec![new_promise("A raven watches")],
                resolved: vec![],
            },
            &mut IdCounters::default(),
        )
        .unwrap();
        assert_eq!(first[0].id, "pr-1");
        assert_eq!(first[0].age, 0);

        let second = accumulate_promises(
            &first,
            &PromiseChanges {
                added: vec![new_promise("The bell rings twice")],
                resolved: vec![],
            },
            &mut IdCounters::default(),
        )
        .unwrap();
        assert_eq!(second[0].age, 1);
        assert_eq!(second[1].id, "pr-2");
        assert_eq!(second[1].age, 0);
        assert_eq!(first[0].age, 0);
    }

    #[test]
    fn resolved_promises_are_removed() {
        let first = accumulate_promises(
            &[],
            &PromiseChanges {
                added: vec![new_promise("A"), new_promise("B")],
                resolved: vec![],
            },
            &mut IdCounters::default(),
        )
        .unwrap();
        let second = accumulate_promises(
            &first,
            &PromiseChanges {
                added: vec![],
                resolved: vec!["pr-1".to_string()],
            },
            &mut IdCounters::default(),
        )
        .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, "pr-2");
    }

    #[test]
    fn resolved_promise_id_is_not_reissued() {
        let mut counters = IdCounters::default();
        let first = accumulate_promises(
            &[],
            &PromiseChanges {
                added: vec![new_promise("A"), new_promise("B")],
                resolved: vec![],
            },
            &mut counters,
        )
        .unwrap();
        let second = accumulate_promises(
            &first,
            &PromiseChanges {
                added: vec![],
                resolved: vec!["pr-2".to_string()],
            },
            &mut counters,
        )
        .unwrap();
        let third = accumulate_promises(
            &second,
            &PromiseChanges {
                added: vec![new_promise("C")],
                resolved: vec![],
            },
            &mut counters,
        )
        .unwrap();
        let ids: Vec<&str> = third.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["pr-1", "pr-3"]);
    }
}
