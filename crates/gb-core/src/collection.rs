//! The remote document: one flat JSON array holding every scene's entries.
//!
//! Elements that do not deserialize as an [`Entry`] are kept as
//! [`Record::Foreign`]. They never show up in scene listings but are written
//! back unchanged, so rewriting the document cannot drop them. Entries read
//! from the document keep their original JSON as well, so keys the typed
//! [`Entry`] does not model survive a rewrite.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::entry::{Entry, Spots, entry_id};
use crate::scene::Scene;

/// One element of the document array.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Entry {
        entry: Entry,
        /// JSON as read from the document; `None` for entries appended here.
        raw: Option<Value>,
    },
    Foreign(Value),
}

impl Record {
    fn from_value(value: Value) -> Self {
        match Entry::deserialize(&value) {
            Ok(entry) => Self::Entry {
                entry,
                raw: Some(value),
            },
            Err(_) => Self::Foreign(value),
        }
    }

    /// A record for an entry created in this process.
    #[must_use]
    pub const fn fresh(entry: Entry) -> Self {
        Self::Entry { entry, raw: None }
    }

    #[must_use]
    pub const fn as_entry(&self) -> Option<&Entry> {
        match self {
            Self::Entry { entry, .. } => Some(entry),
            Self::Foreign(_) => None,
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Entry { raw: Some(raw), .. } | Self::Foreign(raw) => raw.serialize(serializer),
            Self::Entry { entry, raw: None } => entry.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Result of reading the raw document body.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDocument {
    /// Body was empty or whitespace only.
    Empty,
    /// Body was a JSON array.
    Records(EntryCollection),
    /// Body was valid JSON but not an array; carries the JSON type name.
    NotAnArray(&'static str),
}

/// Interpret a document body.
///
/// # Errors
///
/// Returns the `serde_json` error when the body is not valid JSON.
pub fn parse_document(body: &str) -> Result<ParsedDocument, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(ParsedDocument::Empty);
    }
    match serde_json::from_str::<Value>(body)? {
        Value::Array(items) => Ok(ParsedDocument::Records(EntryCollection {
            records: items.into_iter().map(Record::from_value).collect(),
        })),
        other => Ok(ParsedDocument::NotAnArray(json_type_name(&other))),
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Every record of the document in insertion (append) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryCollection {
    records: Vec<Record>,
}

impl EntryCollection {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Total number of records, including ones that are not entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Well-formed entries across all scenes, in document order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.records.iter().filter_map(Record::as_entry)
    }

    /// Number of records skipped by [`Self::entries`].
    #[must_use]
    pub fn foreign_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| matches!(record, Record::Foreign(_)))
            .count()
    }

    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.entries().any(|entry| entry.id == id)
    }

    /// Entries listed under `scene`, oldest first.
    ///
    /// The sort is stable, so entries sharing a timestamp keep document order.
    #[must_use]
    pub fn scene_view(&self, scene: Scene) -> Vec<Entry> {
        let mut view: Vec<Entry> = self
            .entries()
            .filter(|entry| entry.scene.matches(scene))
            .cloned()
            .collect();
        view.sort_by_key(|entry| entry.created_at);
        view
    }

    /// Entry counts per scene. Scenes with no entries are reported as zero.
    #[must_use]
    pub fn scene_counts(&self) -> BTreeMap<Scene, usize> {
        let mut counts: BTreeMap<Scene, usize> = Scene::ALL.iter().map(|s| (*s, 0)).collect();
        for entry in self.entries() {
            *counts.entry(entry.scene()).or_default() += 1;
        }
        counts
    }

    /// Append a new entry for `scene` and return a copy of it.
    ///
    /// If the id derived from `created_at` is already taken, the timestamp is
    /// moved forward one millisecond at a time until the id is free.
    pub fn append(&mut self, scene: Scene, spots: Spots, created_at: i64) -> Entry {
        let mut stamp = created_at;
        while self.contains_id(&entry_id(scene, stamp)) {
            stamp += 1;
        }
        let entry = Entry::new(scene, spots, stamp);
        self.records.push(Record::fresh(entry.clone()));
        entry
    }

    /// Pretty-printed JSON text of the whole document.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(&self.records)
    }
}

impl From<Vec<Entry>> for EntryCollection {
    fn from(entries: Vec<Entry>) -> Self {
        Self {
            records: entries.into_iter().map(Record::fresh).collect(),
        }
    }
}
