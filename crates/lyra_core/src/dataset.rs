//! The served dataset: per-repository indices plus the collections table.
//!
//! A `Dataset` is built once offline, persisted as JSON, and loaded
//! wholesale at service start. Nothing mutates it afterwards, so any number
//! of lookups may run against a shared reference concurrently.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::record::CanonicalRecord;

/// Lookup table of one repository: tag, version and `"latest"` keys to the
/// record they resolve to. Keys overlap freely; one record is typically
/// reachable under several keys (shared, not duplicated).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoIndex {
    entries: BTreeMap<String, Arc<CanonicalRecord>>,
}

impl RepoIndex {
    pub fn get(&self, key: &str) -> Option<&Arc<CanonicalRecord>> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: String, record: Arc<CanonicalRecord>) {
        self.entries.insert(key, record);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<CanonicalRecord>)> {
        self.entries.iter()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut Arc<CanonicalRecord>> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collection metadata retained for the collection-id redirect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub license: Option<String>,
    pub full_name: Option<String>,
}

/// The whole process-wide serving state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub images: BTreeMap<String, RepoIndex>,
    pub collections: BTreeMap<u64, CollectionRecord>,
}

impl Dataset {
    /// Resolves a repository name plus the raw tag-or-version portion of a
    /// request to its record.
    ///
    /// The key may arrive with its `:` separator still attached; a missing
    /// or empty key means `"latest"`. Lookup is exact on both sides, no
    /// fuzzy matching.
    pub fn resolve(&self, name: &str, tag_or_version: &str) -> Option<&CanonicalRecord> {
        let index = self.images.get(name)?;
        index.get(normalize_key(tag_or_version)).map(Arc::as_ref)
    }

    /// Resolves a collection id to its full name, the suffix of the browse
    /// redirect.
    pub fn resolve_collection(&self, id: u64) -> Option<&str> {
        self.collections.get(&id)?.full_name.as_deref()
    }

    /// Loads a persisted dataset, re-checking the `"latest"` invariant every
    /// index must uphold before the service may answer requests.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, DatasetError> {
        let dataset: Self = serde_json::from_reader(reader)?;
        for (name, index) in &dataset.images {
            if !index.contains_key("latest") {
                return Err(DatasetError::MissingLatest(name.clone()));
            }
        }
        Ok(dataset)
    }

    /// Serializes the dataset deterministically: map iteration order is
    /// fixed (BTreeMap) and no timestamps are generated, so the same input
    /// always yields byte-identical output.
    pub fn write_to(&self, writer: impl Write) -> Result<(), DatasetError> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

fn normalize_key(raw: &str) -> &str {
    let key = raw.strip_prefix(':').unwrap_or(raw);
    if key.is_empty() { "latest" } else { key }
}
