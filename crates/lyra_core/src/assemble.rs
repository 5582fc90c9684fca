//! Final dataset assembly: indices, collections table, store closure check.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::dataset::{CollectionRecord, Dataset, RepoIndex};
use crate::dump::RawCollectionRecord;
use crate::error::BuildError;
use crate::index::build_index;
use crate::record::CanonicalRecord;
use crate::store::ArtifactStore;

/// Combines normalized records and the collections dump into the persisted
/// dataset shape.
///
/// `records` must be in dump order; grouping preserves it per name, which is
/// what the index conflict rule expects. `top_url` is the public base under
/// which the monolith tree is browsable; every record's `image` relpath is
/// expanded against it.
pub fn assemble(
    records: Vec<CanonicalRecord>,
    collections: &[RawCollectionRecord],
    store: &impl ArtifactStore,
    top_url: &str,
) -> Result<Dataset, BuildError> {
    let mut groups: BTreeMap<String, Vec<CanonicalRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.name.clone()).or_default().push(record);
    }

    // The dump and the store must agree on the names the dump references;
    // the store may legitimately hold directories the dump no longer knows.
    let known_dirs = store.repo_dirs()?;
    for name in groups.keys() {
        if !known_dirs.contains(name) {
            return Err(BuildError::NameNotInStore(name.clone()));
        }
    }
    let loose: Vec<&str> = known_dirs
        .iter()
        .filter(|dir| !groups.contains_key(*dir))
        .map(String::as_str)
        .collect();
    if !loose.is_empty() {
        tracing::warn!(
            loose = loose.len(),
            total = known_dirs.len(),
            dirs = %loose.join(", "),
            "store directories with no dump record"
        );
    }

    let mut images = BTreeMap::new();
    for (name, group) in groups {
        let index = build_index(&name, group)?;
        images.insert(name, index);
    }
    finalize_records(&mut images, top_url);

    let mut collection_table = BTreeMap::new();
    for row in collections {
        let repo = row.fields.repo.clone().unwrap_or_default();
        collection_table.insert(
            row.pk,
            CollectionRecord {
                license: repo.license,
                full_name: repo.full_name,
            },
        );
    }
    tracing::info!(count = collection_table.len(), "collected collections");

    Ok(Dataset {
        images,
        collections: collection_table,
    })
}

/// Expands `image` to its public URL and drops `build_date`, exactly once
/// per distinct record.
///
/// Indices share records across keys, so the rewrite is keyed on Arc
/// identity; every key pointing at a record keeps pointing at the same
/// rewritten one.
fn finalize_records(images: &mut BTreeMap<String, RepoIndex>, top_url: &str) {
    let top_url = top_url.trim_end_matches('/');
    let mut rewritten: HashMap<*const CanonicalRecord, Arc<CanonicalRecord>> = HashMap::new();
    for index in images.values_mut() {
        for slot in index.records_mut() {
            let replacement = rewritten.entry(Arc::as_ptr(slot)).or_insert_with(|| {
                let mut record = (**slot).clone();
                record.image = format!("{top_url}/{}", record.image);
                record.build_date = None;
                Arc::new(record)
            });
            *slot = Arc::clone(replacement);
        }
    }
}
