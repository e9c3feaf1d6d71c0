//! In-memory story store.
//!
//! Stories and pages are kept as serialized JSON records, one per story and
//! one per page, so every load returns an independent value and the stored
//! shape matches what a durable adapter would write. Cloning the store shares
//! the underlying records, which lets several engines work on one store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use storyloom_domain::{Page, PageId, Story, StoryId};
use tokio::sync::Mutex;

use crate::infrastructure::ports::{ChildCommit, NewChildPage, RepoError, StoryRepo};

#[derive(Clone, Default)]
pub struct InMemoryStoryStore {
    inner: Arc<Records>,
}

#[derive(Default)]
struct Records {
    stories: DashMap<StoryId, String>,
    pages: DashMap<(StoryId, PageId), String>,
    /// Last page id handed out per story
    reserved: DashMap<StoryId, Option<PageId>>,
    /// Held while a child commit reads and writes its records
    commits: Mutex<()>,
}

impl InMemoryStoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_count(&self, story_id: StoryId) -> usize {
        self.inner
            .pages
            .iter()
            .filter(|record| record.key().0 == story_id)
            .count()
    }

    fn max_page_id(&self, story_id: StoryId) -> Option<PageId> {
        self.inner
            .pages
            .iter()
            .filter(|record| record.key().0 == story_id)
            .map(|record| record.key().1)
            .max()
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, RepoError> {
    serde_json::to_string(value).map_err(RepoError::serialization)
}

fn decode<T: DeserializeOwned>(record: &str) -> Result<T, RepoError> {
    serde_json::from_str(record).map_err(RepoError::serialization)
}

#[async_trait]
impl StoryRepo for InMemoryStoryStore {
    async fn load_story(&self, id: StoryId) -> Result<Option<Story>, RepoError> {
        self.inner
            .stories
            .get(&id)
            .map(|record| decode(record.value()))
            .transpose()
    }

    async fn save_story(&self, story: &Story) -> Result<(), RepoError> {
        let record = encode(story)?;
        self.inner.stories.insert(story.id(), record);
        Ok(())
    }

    async fn load_page(
        &self,
        story_id: StoryId,
        page_id: PageId,
    ) -> Result<Option<Page>, RepoError> {
        self.inner
            .pages
            .get(&(story_id, page_id))
            .map(|record| decode(record.value()))
            .transpose()
    }

    async fn save_page(&self, story_id: StoryId, page: &Page) -> Result<(), RepoError> {
        if !self.inner.stories.contains_key(&story_id) {
            return Err(RepoError::not_found("Story", story_id));
        }
        let record = encode(page)?;
        match self.inner.pages.entry((story_id, page.id())) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RepoError::constraint(format!(
                "Page {} already exists in story {story_id}",
                page.id()
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn reserve_page_id(&self, story_id: StoryId) -> Result<PageId, RepoError> {
        if !self.inner.stories.contains_key(&story_id) {
            return Err(RepoError::not_found("Story", story_id));
        }
        let saved = self.max_page_id(story_id);
        let mut reserved = self.inner.reserved.entry(story_id).or_insert(None);
        let next = saved.max(*reserved).map_or(PageId::FIRST, PageId::next);
        *reserved = Some(next);
        Ok(next)
    }

    async fn commit_child_page(
        &self,
        story_id: StoryId,
        child: NewChildPage,
    ) -> Result<ChildCommit, RepoError> {
        let _commit = self.inner.commits.lock().await;

        let parent = self
            .load_page(story_id, child.parent_page_id)
            .await?
            .ok_or_else(|| RepoError::not_found("Page", child.parent_page_id))?;
        if let Some(existing) = parent
            .choice(child.choice_index)
            .and_then(|choice| choice.next_page_id)
        {
            return Ok(ChildCommit::AlreadyLinked(existing));
        }

        let page_key = (story_id, child.page.id());
        if self.inner.pages.contains_key(&page_key) {
            return Err(RepoError::constraint(format!(
                "Page {} already exists in story {story_id}",
                child.page.id()
            )));
        }
        let linked_parent = parent
            .with_choice_link(child.choice_index, child.page.id())
            .map_err(RepoError::constraint)?;
        let story_record = match child.structure_version {
            None => None,
            Some(version) => {
                let story = self
                    .load_story(story_id)
                    .await?
                    .ok_or_else(|| RepoError::not_found("Story", story_id))?;
                Some(encode(
                    &story.add_structure_version(version, child.committed_at),
                )?)
            }
        };
        let page_record = encode(&child.page)?;
        let parent_record = encode(&linked_parent)?;

        if let Some(record) = story_record {
            self.inner.stories.insert(story_id, record);
        }
        self.inner.pages.insert(page_key, page_record);
        self.inner
            .pages
            .insert((story_id, child.parent_page_id), parent_record);
        Ok(ChildCommit::Linked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::story::test_support::{now, planned_story, three_act_structure};
    use chrono::{TimeZone, Utc};
    use storyloom_domain::{
        build_continuation_page, build_first_page, create_rewritten_versioned_structure,
        ContinuationContext, PageGeneration, ParentCollections, StoryPremise, StoryTitle,
        StructureContext,
    };

    fn story() -> Story {
        Story::new(
            StoryTitle::new("Salt and Iron").unwrap(),
            StoryPremise::new("A smuggler", "A port city", "Tense"),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn page() -> Page {
        build_first_page(
            &PageGeneration::new("Fog rolls in.", vec!["Wait".into(), "Row out".into()]),
            StructureContext::default(),
        )
        .unwrap()
    }

    fn child(id: u32, choice_index: usize) -> NewChildPage {
        let parent = page();
        let page = build_continuation_page(
            &PageGeneration::new("The tide turns.", vec!["Anchor".into(), "Drift".into()]),
            ContinuationContext {
                page_id: PageId::new(id).unwrap(),
                parent_page_id: PageId::FIRST,
                parent_choice_index: choice_index,
                parent: ParentCollections::of(&parent),
                structure: StructureContext::default(),
            },
        )
        .unwrap();
        NewChildPage {
            parent_page_id: PageId::FIRST,
            choice_index,
            page,
            structure_version: None,
            committed_at: now(),
        }
    }

    async fn seeded(story: &Story) -> InMemoryStoryStore {
        let store = InMemoryStoryStore::new();
        store.save_story(story).await.unwrap();
        store.save_page(story.id(), &page()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn story_and_page_round_trip() {
        let story = story();
        let store = seeded(&story).await;

        assert_eq!(store.load_story(story.id()).await.unwrap(), Some(story.clone()));
        assert_eq!(
            store.load_page(story.id(), PageId::FIRST).await.unwrap(),
            Some(page())
        );
    }

    #[tokio::test]
    async fn missing_records_load_as_none() {
        let store = InMemoryStoryStore::new();
        let id = StoryId::new();
        assert!(store.load_story(id).await.unwrap().is_none());
        assert!(store.load_page(id, PageId::FIRST).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn when_page_saved_twice_returns_error() {
        let story = story();
        let store = seeded(&story).await;

        let result = store.save_page(story.id(), &page()).await;
        assert!(matches!(result, Err(RepoError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn when_story_missing_save_page_returns_error() {
        let store = InMemoryStoryStore::new();
        let result = store.save_page(StoryId::new(), &page()).await;
        assert!(result.unwrap_err().is_not_found());
    }

    mod reserve {
        use super::*;

        #[tokio::test]
        async fn ids_are_distinct_and_above_saved_pages() {
            let story = story();
            let store = seeded(&story).await;
            let other = store.clone();

            let first = store.reserve_page_id(story.id()).await.unwrap();
            let second = other.reserve_page_id(story.id()).await.unwrap();

            assert_eq!(first.get(), 2);
            assert_eq!(second.get(), 3);
        }

        #[tokio::test]
        async fn when_story_missing_returns_error() {
            let store = InMemoryStoryStore::new();
            let result = store.reserve_page_id(StoryId::new()).await;
            assert!(result.unwrap_err().is_not_found());
        }
    }

    mod commit {
        use super::*;

        #[tokio::test]
        async fn saves_child_and_links_choice() {
            let story = story();
            let store = seeded(&story).await;

            let commit = store.commit_child_page(story.id(), child(2, 1)).await.unwrap();

            assert_eq!(commit, ChildCommit::Linked);
            let parent = store
                .load_page(story.id(), PageId::FIRST)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(parent.choice(1).unwrap().next_page_id, PageId::new(2).ok());
            assert_eq!(parent.choice(0).unwrap().next_page_id, None);
            assert_eq!(
                store.load_page(story.id(), PageId::new(2).unwrap()).await.unwrap(),
                Some(child(2, 1).page)
            );
        }

        #[tokio::test]
        async fn second_child_for_a_choice_writes_nothing() {
            let story = story();
            let store = seeded(&story).await;
            store.commit_child_page(story.id(), child(2, 0)).await.unwrap();

            let commit = store.commit_child_page(story.id(), child(3, 0)).await.unwrap();

            assert_eq!(commit, ChildCommit::AlreadyLinked(PageId::new(2).unwrap()));
            assert_eq!(store.page_count(story.id()), 2);
            assert!(store
                .load_page(story.id(), PageId::new(3).unwrap())
                .await
                .unwrap()
                .is_none());
        }

        #[tokio::test]
        async fn appends_structure_version_to_the_stored_story() {
            let story = planned_story(Some(three_act_structure()));
            let store = seeded(&story).await;
            let initial = story.latest_structure_version().unwrap().clone();
            let version = create_rewritten_versioned_structure(
                &initial,
                three_act_structure(),
                vec![],
                "The keeper returned",
                PageId::new(2).unwrap(),
                now(),
            );
            let new_child = NewChildPage {
                structure_version: Some(version.clone()),
                ..child(2, 0)
            };

            store.commit_child_page(story.id(), new_child).await.unwrap();

            let stored = store.load_story(story.id()).await.unwrap().unwrap();
            assert_eq!(stored.structure_versions().len(), 2);
            assert_eq!(stored.latest_structure_version(), Some(&version));
        }

        #[tokio::test]
        async fn when_page_id_taken_returns_error() {
            let story = story();
            let store = seeded(&story).await;
            store.commit_child_page(story.id(), child(2, 0)).await.unwrap();

            let result = store.commit_child_page(story.id(), child(2, 1)).await;

            assert!(matches!(result, Err(RepoError::ConstraintViolation(_))));
            let parent = store
                .load_page(story.id(), PageId::FIRST)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(parent.choice(1).unwrap().next_page_id, None);
        }

        #[tokio::test]
        async fn when_parent_missing_returns_error() {
            let story = story();
            let store = InMemoryStoryStore::new();
            store.save_story(&story).await.unwrap();

            let result = store.commit_child_page(story.id(), child(2, 0)).await;
            assert!(result.unwrap_err().is_not_found());
        }
    }

    #[tokio::test]
    async fn clones_share_records() {
        let store = InMemoryStoryStore::new();
        let other = store.clone();
        let story = story();
        store.save_story(&story).await.unwrap();
        assert!(other.load_story(story.id()).await.unwrap().is_some());
    }
}
