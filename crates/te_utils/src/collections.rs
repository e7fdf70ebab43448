//! Collection types.

use core::borrow::Borrow;
use core::fmt;
use core::hash::Hash;

use crate::hash::HashMap;

// -----------------------------------------------------------------------------
// OrderedMap

/// A hash map that iterates in insertion order.
///
/// Replacing the value of an existing key keeps the key at its original
/// position. Lookups are `O(1)`, iteration follows the entry vector.
///
/// # Examples
///
/// ```
/// use te_utils::collections::OrderedMap;
///
/// let mut map = OrderedMap::new();
/// map.insert("b", 1);
/// map.insert("a", 2);
/// map.insert("b", 3);
///
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["b", "a"]);
/// assert_eq!(map.get("b"), Some(&3));
/// ```
#[derive(Clone)]
pub struct OrderedMap<K, V> {
    indices: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> OrderedMap<K, V> {
    /// Creates an empty map.
    #[inline]
    pub fn new() -> Self {
        Self {
            indices: HashMap::default(),
            entries: Vec::new(),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterates over keys in insertion order.
    #[inline]
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Iterates over values in insertion order.
    #[inline]
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: Hash + Eq + Clone, V> OrderedMap<K, V> {
    /// Inserts `value` under `key`.
    ///
    /// A new key is appended; an existing key keeps its position and the
    /// previous value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.indices.get(&key) {
            Some(&index) => Some(core::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.indices.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Inserts `value` under `key` like [`insert`](Self::insert) and
    /// returns a mutable reference to the stored value.
    pub fn insert_mut(&mut self, key: K, value: V) -> &mut V {
        let index = match self.indices.get(&key) {
            Some(&index) => {
                self.entries[index].1 = value;
                index
            }
            None => {
                let index = self.entries.len();
                self.indices.insert(key.clone(), index);
                self.entries.push((key, value));
                index
            }
        };
        &mut self.entries[index].1
    }

    /// Returns a reference to the value under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = *self.indices.get(key)?;
        Some(&self.entries[index].1)
    }

    /// Returns a mutable reference to the value under `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = *self.indices.get(key)?;
        Some(&mut self.entries[index].1)
    }

    /// Returns the insertion position of `key`.
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.indices.get(key).copied()
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.indices.contains_key(key)
    }
}

impl<K, V> Default for OrderedMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedMap;

    #[test]
    fn replace_keeps_position() {
        let mut map = OrderedMap::new();
        for (k, v) in [("x", 1), ("y", 2), ("z", 3)] {
            map.insert(k, v);
        }
        assert_eq!(map.insert("y", 20), Some(2));
        assert_eq!(map.insert("w", 4), None);

        let pairs: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, [("x", 1), ("y", 20), ("z", 3), ("w", 4)]);
        assert_eq!(map.index_of("z"), Some(2));

        *map.insert_mut("x", 0) += 5;
        assert_eq!(map.get("x"), Some(&5));
        assert_eq!(map.index_of("x"), Some(0));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut map = OrderedMap::new();
        map.insert(String::from("a"), vec![1]);
        map.get_mut("a").unwrap().push(2);
        assert_eq!(map.get("a"), Some(&vec![1, 2]));
        assert!(map.get("b").is_none());
    }
}
