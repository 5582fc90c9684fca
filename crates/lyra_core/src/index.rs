//! Per-repository lookup index construction.

use std::sync::Arc;

use crate::dataset::RepoIndex;
use crate::error::BuildError;
use crate::record::CanonicalRecord;

/// Builds the tag/version lookup table for one repository name.
///
/// Records arrive in dump order, which is not chronological. Every record is
/// registered under both its `tag` and its `version`; when a key is already
/// bound, the incoming record wins only if its `build_date` is strictly
/// greater (string comparison, exact for the fixed-width ISO format). If no
/// record literally carries tag `"latest"`, the newest build is bound there.
///
/// Build dates are assumed unique per repository; two builds sharing the
/// running maximum indicate corrupt input and abort the run.
pub fn build_index(name: &str, records: Vec<CanonicalRecord>) -> Result<RepoIndex, BuildError> {
    let mut index = RepoIndex::default();
    let mut newest: Option<Arc<CanonicalRecord>> = None;

    for record in records {
        let record = Arc::new(record);
        if let Some(current) = &newest {
            if current.build_date == record.build_date {
                return Err(BuildError::DuplicateBuildDate {
                    name: name.to_string(),
                    build_date: record.build_date.clone().unwrap_or_default(),
                });
            }
        }
        if newest.as_ref().is_none_or(|current| record.build_date > current.build_date) {
            newest = Some(Arc::clone(&record));
        }

        for key in [&record.tag, &record.version] {
            // Keep an existing binding that is at least as new.
            let keep = index
                .get(key)
                .is_some_and(|bound| bound.build_date >= record.build_date);
            if !keep {
                index.insert(key.clone(), Arc::clone(&record));
            }
        }
    }

    if !index.contains_key("latest") {
        if let Some(newest) = newest {
            tracing::debug!(
                name,
                tag = %newest.tag,
                build_date = newest.build_date.as_deref().unwrap_or_default(),
                "no literal latest tag, binding newest build"
            );
            index.insert("latest".to_string(), newest);
        }
    }

    Ok(index)
}
