//! Undo-journaled map
//!
//! Every write records the previous value so an atomic call can be rolled
//! back to a checkpoint. Nested checkpoints are plain journal lengths; the
//! outermost commit discards the journal.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub(crate) struct Journaled<K, V> {
    entries: HashMap<K, V>,
    undo: Vec<(K, Option<V>)>,
}

impl<K, V> Default for Journaled<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            undo: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Journaled<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn insert(&mut self, key: K, value: V) {
        let previous = self.entries.insert(key.clone(), value);
        self.undo.push((key, previous));
    }

    pub fn checkpoint(&self) -> usize {
        self.undo.len()
    }

    /// Undo every write made after `checkpoint`, newest first
    pub fn revert_to(&mut self, checkpoint: usize) {
        while self.undo.len() > checkpoint {
            let Some((key, previous)) = self.undo.pop() else {
                break;
            };
            match previous {
                Some(value) => {
                    self.entries.insert(key, value);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// Drop the undo history once no enclosing call can revert it
    pub fn discard_journal(&mut self) {
        self.undo.clear();
    }

    #[cfg(test)]
    pub fn journal_len(&self) -> usize {
        self.undo.len()
    }
}
