//! Order-preserving hash table
//!
//! Entries live in four index-aligned arrays (key, hash, key string,
//! value), so iteration order is insertion order. A bucket map from hash to
//! entry indices finds candidates; the key string breaks ties between keys
//! that share a hash.

use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct OrderedTable<K, V> {
    keys: Vec<K>,
    hashes: Vec<u64>,
    key_strings: Vec<Rc<str>>,
    values: Vec<V>,
    buckets: HashMap<u64, Vec<usize>>,
}

/// A located entry
#[derive(Debug)]
pub struct Entry<'a, K, V> {
    pub index: usize,
    pub key: &'a K,
    pub value: &'a V,
}

impl<K, V> Default for OrderedTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> OrderedTable<K, V> {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            hashes: Vec::new(),
            key_strings: Vec::new(),
            values: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Append a new entry at the end. The caller guarantees the key is not
    /// already present; use [`OrderedTable::insert`] otherwise.
    pub fn append(&mut self, key: K, hash: u64, key_string: impl Into<Rc<str>>, value: V) {
        let index = self.keys.len();
        self.keys.push(key);
        self.hashes.push(hash);
        self.key_strings.push(key_string.into());
        self.values.push(value);
        self.buckets.entry(hash).or_default().push(index);
    }

    fn position(&self, key_string: &str, hash: u64) -> Option<usize> {
        self.buckets.get(&hash).and_then(|indices| {
            indices
                .iter()
                .copied()
                .find(|&i| &*self.key_strings[i] == key_string)
        })
    }

    /// Find the entry for a key
    pub fn search(&self, key_string: &str, hash: u64) -> Option<Entry<'_, K, V>> {
        self.position(key_string, hash).map(|index| Entry {
            index,
            key: &self.keys[index],
            value: &self.values[index],
        })
    }

    pub fn contains(&self, key_string: &str, hash: u64) -> bool {
        self.position(key_string, hash).is_some()
    }

    /// Overwrite the value of an existing key, or append a new entry.
    /// Returns the replaced value; the original key and position are kept.
    pub fn insert(&mut self, key: K, hash: u64, key_string: impl Into<Rc<str>>, value: V) -> Option<V> {
        let key_string = key_string.into();
        match self.position(&key_string, hash) {
            Some(index) => Some(std::mem::replace(&mut self.values[index], value)),
            None => {
                self.append(key, hash, key_string, value);
                None
            }
        }
    }

    /// Remove an entry, shifting later entries down by one
    pub fn remove(&mut self, hash: u64, key_string: &str) -> Option<(K, V)> {
        let index = self.position(key_string, hash)?;
        self.hashes.remove(index);
        self.key_strings.remove(index);
        let key = self.keys.remove(index);
        let value = self.values.remove(index);
        self.reindex();
        Some((key, value))
    }

    fn reindex(&mut self) {
        self.buckets.clear();
        for (index, hash) in self.hashes.iter().enumerate() {
            self.buckets.entry(*hash).or_default().push(index);
        }
    }

    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        Some((self.keys.get(index)?, self.values.get(index)?))
    }

    pub fn key_string(&self, index: usize) -> Option<&str> {
        self.key_strings.get(index).map(|s| &**s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys.iter().zip(self.values.iter())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.values.iter()
    }
}
