//! Concurrent keyed table with an atomic read-modify-or-delete.
//!
//! Entries are sharded, so updates to different keys never contend. The
//! transform passed to [`SyncTable::update`] runs while the key's shard is
//! locked and must not touch the same table again.

use dashmap::{mapref::entry::Entry, DashMap};
use std::hash::Hash;

#[derive(Debug)]
pub struct SyncTable<K, V>
where
    K: Eq + Hash,
{
    // The value is taken out during a transform so `update` can hand the
    // closure ownership; a `None` slot is treated as absent.
    map: DashMap<K, Option<V>>,
}

impl<K, V> SyncTable<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Replaces the value at `key` with `f(current)`; returning `None` deletes.
    pub fn update<F>(&self, key: K, f: F)
    where
        F: FnOnce(Option<V>) -> Option<V>,
    {
        self.update_with(key, |current| (f(current), ()))
    }

    /// Like [`update`](Self::update) but also returns a value computed under
    /// the lock.
    pub fn update_with<F, R>(&self, key: K, f: F) -> R
    where
        F: FnOnce(Option<V>) -> (Option<V>, R),
    {
        match self.map.entry(key) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get_mut().take();
                let (next, result) = f(current);
                match next {
                    Some(value) => *occupied.get_mut() = Some(value),
                    None => {
                        occupied.remove();
                    }
                }
                result
            }
            Entry::Vacant(vacant) => {
                let (next, result) = f(None);
                if let Some(value) = next {
                    vacant.insert(Some(value));
                }
                result
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.map.get(key).and_then(|entry| entry.value().clone())
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.map.remove(key).and_then(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.get(key).map_or(false, |entry| entry.is_some())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Removes and returns every value.
    pub fn drain(&self) -> Vec<V> {
        let keys: Vec<K> = self.map.iter().map(|entry| entry.key().clone()).collect();
        keys.into_iter().filter_map(|key| self.remove(&key)).collect()
    }
}

impl<K, V> Default for SyncTable<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
