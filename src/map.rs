//! Map and set types for decoded Transit collections.
//!
//! Transit maps may be keyed by any value (keywords, numbers, vectors, even
//! other maps), so [`TransitMap`] keys on [`Value`] rather than `String`.
//! Both collections wrap `indexmap` types: iteration follows the order entries
//! appeared on the wire, while equality ignores that order, since key order
//! carries no meaning for Transit maps and sets.
//!
//! ## Examples
//!
//! ```rust
//! use serde_transit::{TransitMap, Value};
//!
//! let mut map = TransitMap::new();
//! map.insert(Value::Keyword("name".to_string()), Value::from("Alice"));
//! map.insert(Value::from(1), Value::from("one"));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get_str("name"), None);
//! assert_eq!(map.get(&Value::from(1)).and_then(|v| v.as_str()), Some("one"));
//! ```

use crate::Value;
use indexmap::{IndexMap, IndexSet};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// An insertion-ordered map from Transit values to Transit values.
///
/// # Examples
///
/// ```rust
/// use serde_transit::{TransitMap, Value};
///
/// let a: TransitMap = vec![(Value::from("a"), Value::from(1)), (Value::from("b"), Value::from(2))]
///     .into_iter()
///     .collect();
/// let b: TransitMap = vec![(Value::from("b"), Value::from(2)), (Value::from("a"), Value::from(1))]
///     .into_iter()
///     .collect();
///
/// // Iteration keeps wire order, equality does not care about it
/// assert_eq!(a.keys().next(), Some(&Value::from("a")));
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitMap(IndexMap<Value, Value>);

impl TransitMap {
    /// Creates an empty `TransitMap`.
    #[must_use]
    pub fn new() -> Self {
        TransitMap(IndexMap::new())
    }

    /// Creates an empty `TransitMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        TransitMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned and
    /// the key keeps its original position.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.get(key)
    }

    /// Looks up an entry whose key is the plain string `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_transit::{TransitMap, Value};
    ///
    /// let mut map = TransitMap::new();
    /// map.insert(Value::from("key"), Value::from(42));
    /// assert_eq!(map.get_str("key").and_then(|v| v.as_i64()), Some(42));
    /// ```
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.0.get(&Value::String(key.to_string()))
    }

    /// Returns the number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, Value, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, Value, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, Value, Value> {
        self.0.iter()
    }
}

impl Default for TransitMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Hashes one item on its own so the results can be combined in any order.
fn item_hash<T: Hash + ?Sized>(item: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    item.hash(&mut hasher);
    hasher.finish()
}

// Order-insensitive, consistent with `PartialEq` on `IndexMap`.
impl Hash for TransitMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        self.0
            .iter()
            .map(|item| item_hash(&item))
            .fold(0u64, u64::wrapping_add)
            .hash(state);
    }
}

impl IntoIterator for TransitMap {
    type Item = (Value, Value);
    type IntoIter = indexmap::map::IntoIter<Value, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TransitMap {
    type Item = (&'a Value, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Value, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Value, Value)> for TransitMap {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        TransitMap(IndexMap::from_iter(iter))
    }
}

/// An insertion-ordered set of Transit values, produced by the `set` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitSet(IndexSet<Value>);

impl TransitSet {
    /// Creates an empty `TransitSet`.
    #[must_use]
    pub fn new() -> Self {
        TransitSet(IndexSet::new())
    }

    /// Adds a value, returning `false` if it was already present.
    pub fn insert(&mut self, value: Value) -> bool {
        self.0.insert(value)
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.0.contains(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the members, in insertion order.
    pub fn iter(&self) -> indexmap::set::Iter<'_, Value> {
        self.0.iter()
    }
}

impl Default for TransitSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Hash for TransitSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        self.0
            .iter()
            .map(|item| item_hash(&item))
            .fold(0u64, u64::wrapping_add)
            .hash(state);
    }
}

impl IntoIterator for TransitSet {
    type Item = Value;
    type IntoIter = indexmap::set::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Value> for TransitSet {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        TransitSet(IndexSet::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_string_keys() {
        let mut map = TransitMap::new();
        map.insert(Value::Array(vec![Value::from(1), Value::from(2)]), Value::from("pair"));
        assert_eq!(
            map.get(&Value::Array(vec![Value::from(1), Value::from(2)])),
            Some(&Value::from("pair"))
        );
    }

    #[test]
    fn test_set_dedupes() {
        let set: TransitSet = vec![Value::from(1), Value::from(2), Value::from(1)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Value::from(2)));
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        item_hash(value)
    }

    #[test]
    fn test_map_hash_ignores_order_but_not_contents() {
        let mut ab = TransitMap::new();
        ab.insert(Value::from("a"), Value::from(1));
        ab.insert(Value::from("b"), Value::from(2));
        let mut ba = TransitMap::new();
        ba.insert(Value::from("b"), Value::from(2));
        ba.insert(Value::from("a"), Value::from(1));
        assert_eq!(hash_of(&ab), hash_of(&ba));

        let mut other = TransitMap::new();
        other.insert(Value::from("a"), Value::from(1));
        other.insert(Value::from("b"), Value::from(3));
        assert_ne!(hash_of(&ab), hash_of(&other));
    }

    #[test]
    fn test_set_hash_ignores_order_but_not_contents() {
        let a: TransitSet = vec![Value::from(1), Value::from(2)].into_iter().collect();
        let b: TransitSet = vec![Value::from(2), Value::from(1)].into_iter().collect();
        let c: TransitSet = vec![Value::from(1), Value::from(3)].into_iter().collect();
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(hash_of(&a), hash_of(&c));
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a: TransitSet = vec![Value::from("x"), Value::from("y")].into_iter().collect();
        let b: TransitSet = vec![Value::from("y"), Value::from("x")].into_iter().collect();
        assert_eq!(a, b);
    }
}
