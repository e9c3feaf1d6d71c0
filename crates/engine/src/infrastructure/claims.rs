//! Keyed async locks for first-time choice resolution.
//!
//! Each key maps to its own `tokio::sync::Mutex`, so unrelated stories and
//! choices never wait on each other. Entries nobody holds or waits for are
//! removed by [`KeyedLocks::prune`].

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use storyloom_domain::{PageId, StoryId};
use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct KeyedLocks<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Wait for exclusive ownership of `key`. Released when the guard drops.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop locks that are neither held nor awaited.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A choice on a page; the unit of first-time generation.
pub type ChoiceKey = (StoryId, PageId, usize);

/// Locks shared by every use case of one engine.
///
/// They keep one engine from generating a choice twice. Writers on other
/// engines are settled by the repository's child commit.
#[derive(Default)]
pub struct StoryLocks {
    /// Held while a choice is resolved for the first time
    pub choices: KeyedLocks<ChoiceKey>,
}
