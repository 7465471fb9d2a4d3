use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

/// A single attribute key paired with its value.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValue {
    /// The attribute key, unique within its [`Attributes`] mapping.
    pub key: String,
    /// The attribute value.
    pub value: Value,
}

/// An insertion-ordered attribute mapping with unique keys.
///
/// Entries keep the order in which they were inserted; inserting an existing
/// key replaces its value in place. [`sort_keys`](Attributes::sort_keys)
/// permutes entries into lexicographic key order, which is the canonical
/// order required for content hashing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes(Vec<KeyValue>);

impl Attributes {
    /// Creates an empty attribute mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the mapping contains no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a reference to the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|kv| kv.key == key).map(|kv| &kv.value)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0
            .iter_mut()
            .find(|kv| kv.key == key)
            .map(|kv| &mut kv.value)
    }

    /// Returns `true` if the mapping contains `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts a value under `key`, returning the previous value if the key
    /// already existed. Replacement keeps the entry's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push(KeyValue { key, value });
                None
            }
        }
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.0.iter().position(|kv| kv.key == key)?;
        Some(self.0.remove(index).value)
    }

    /// Reorders entries lexicographically by key.
    ///
    /// This is a pure permutation of the existing entries and idempotent; no
    /// keys or values are modified.
    pub fn sort_keys(&mut self) {
        self.0.sort_by(|a, b| a.key.cmp(&b.key));
    }

    /// Iterates over entries in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Iterates over entries in storage order with mutable access to values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut KeyValue> {
        self.0.iter_mut()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}

impl IntoIterator for Attributes {
    type Item = KeyValue;
    type IntoIter = std::vec::IntoIter<KeyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for kv in &self.0 {
            map.serialize_entry(&kv.key, &kv.value)?;
        }
        map.end()
    }
}

struct AttributesVisitor;

impl<'de> Visitor<'de> for AttributesVisitor {
    type Value = Attributes;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("an attribute mapping")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Attributes, A::Error> {
        let mut attributes = Attributes::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            attributes.insert(key, value);
        }
        Ok(attributes)
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut attributes = Attributes::from_iter([("a", 1i64), ("b", 2i64)]);
        let previous = attributes.insert("a", Value::I64(3));
        assert_eq!(previous, Some(Value::I64(1)));

        let keys: Vec<_> = attributes.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(attributes.get("a"), Some(&Value::I64(3)));
    }

    #[test]
    fn test_remove() {
        let mut attributes = Attributes::from_iter([("a", 1i64), ("b", 2i64)]);
        assert_eq!(attributes.remove("a"), Some(Value::I64(1)));
        assert_eq!(attributes.remove("a"), None);
        assert_eq!(attributes.len(), 1);
    }

    #[test]
    fn test_sort_keys_is_idempotent() {
        let mut attributes = Attributes::from_iter([("c", 1i64), ("a", 2i64), ("b", 3i64)]);
        attributes.sort_keys();
        let sorted = attributes.clone();
        attributes.sort_keys();
        similar_asserts::assert_eq!(attributes, sorted);

        let keys: Vec<_> = attributes.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_deserialize_preserves_order() {
        let attributes: Attributes = serde_json::from_str(r#"{"b":1,"a":2}"#).unwrap();
        let keys: Vec<_> = attributes.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
