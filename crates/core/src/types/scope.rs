use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Items that carry their own name and can be keyed by it.
pub trait Named {
    fn name(&self) -> &str;
}

/// Ordered mapping from alias to value.
///
/// Insertion order is preserved. Setting an existing alias replaces the value
/// but keeps the alias at its first position. Entries are never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope<V> {
    entries: IndexMap<String, V>,
}

impl<V> Default for Scope<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V> Scope<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scope keyed by each item's own name.
    pub fn from_named(items: impl IntoIterator<Item = V>) -> Self
    where
        V: Named,
    {
        items
            .into_iter()
            .map(|item| (item.name().to_string(), item))
            .collect()
    }

    pub fn set(&mut self, alias: impl Into<String>, value: V) {
        self.entries.insert(alias.into(), value);
    }

    /// Look up an alias, failing with [`Error::Lookup`] when absent.
    pub fn get(&self, alias: &str) -> Result<&V> {
        self.entries
            .get(alias)
            .ok_or_else(|| Error::Lookup(alias.to_string()))
    }

    pub fn find(&self, alias: &str) -> Option<&V> {
        self.entries.get(alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// Merge `other` into `self`, last write wins.
    pub fn merge(&mut self, other: Scope<V>) {
        for (alias, value) in other.entries {
            self.entries.insert(alias, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for Scope<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut scope = Scope::new();
        for (alias, value) in iter {
            scope.set(alias, value);
        }
        scope
    }
}

impl<V> IntoIterator for Scope<V> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let mut scope = Scope::new();
        scope.set("dest", "dest".to_string());
        assert_eq!(scope.get("dest").unwrap(), "dest");
    }

    #[test]
    fn test_get_missing_alias_fails() {
        let scope: Scope<String> = Scope::new();
        let err = scope.get("comm").unwrap_err();
        assert!(matches!(err, Error::Lookup(ref alias) if alias == "comm"));
    }

    #[test]
    fn test_merge_is_last_write_wins_and_keeps_position() {
        let mut a: Scope<i32> = [("x", 1), ("y", 2)].into_iter().collect();
        let b: Scope<i32> = [("x", 3), ("z", 4)].into_iter().collect();
        a.merge(b);

        assert_eq!(*a.get("x").unwrap(), 3);
        assert_eq!(a.names().collect::<Vec<_>>(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut scope = Scope::new();
        scope.set("c", 1);
        scope.set("a", 2);
        scope.set("b", 3);
        scope.set("a", 5);
        let order: Vec<_> = scope.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        assert_eq!(
            order,
            vec![("c".to_string(), 1), ("a".to_string(), 5), ("b".to_string(), 3)]
        );
    }
}
