//! Case-insensitive, insertion-ordered header collection.
//!
//! Header names are matched without regard to ASCII case, but the
//! spelling of the most recent insertion is what gets enumerated. Several
//! occurrences of one logical header travel as a single value joined with
//! `\n`, which is how both multi-value gateway events and applications
//! emitting repeated headers (e.g. `Set-Cookie`) are represented.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use indexmap::IndexMap;

/// Separator between occurrences of a header folded into one value.
pub const VALUE_SEPARATOR: char = '\n';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderCollection {
    entries: Vec<(String, String)>,
}

impl HeaderCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a multi-value header map into one entry per name.
    pub fn from_multi_value(map: IndexMap<String, Vec<String>>) -> Self {
        map.into_iter()
            .map(|(name, values)| (name, values.join("\n")))
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set a header, replacing any existing value under a differently-cased
    /// spelling. The entry keeps its position but takes the new spelling.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.entries[i] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Add another occurrence of a header, folding it into the existing value.
    pub fn append(&mut self, name: impl Into<String>, value: impl AsRef<str>) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => {
                let existing = &mut self.entries[i].1;
                existing.push(VALUE_SEPARATOR);
                existing.push_str(value.as_ref());
            }
            None => self.entries.push((name, value.as_ref().to_string())),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    /// All occurrences of a header, in order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.get(name).map(split_values).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a folded header value back into its occurrences.
///
/// Trailing empty segments are dropped, so `"a\n"` is a single occurrence.
pub fn split_values(value: &str) -> Vec<&str> {
    let mut values: Vec<&str> = value.split(VALUE_SEPARATOR).collect();
    while values.last().is_some_and(|v| v.is_empty()) {
        values.pop();
    }
    values
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderCollection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.set(k, v);
        }
        headers
    }
}

struct HeaderVisitor;

impl<'de> Visitor<'de> for HeaderVisitor {
    type Value = HeaderCollection;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of header names to string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut headers = HeaderCollection::new();
        while let Some((name, value)) = access.next_entry::<String, Option<String>>()? {
            headers.set(name, value.unwrap_or_default());
        }
        Ok(headers)
    }
}

impl<'de> Deserialize<'de> for HeaderCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HeaderVisitor)
    }
}
