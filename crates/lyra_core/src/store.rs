use std::collections::BTreeSet;

use crate::error::BuildError;

/// Read-only view of the content-addressed artifact tree used while building
/// a dataset.
///
/// The pipeline never reads artifact bytes; it only needs the annexed key a
/// path resolves to and the set of `org/repo` directories the tree knows
/// about.
pub trait ArtifactStore {
    /// Annex key for the artifact at `relpath`: the file name of the symlink
    /// target. Fails when nothing is annexed there.
    fn annex_key(&self, relpath: &str) -> Result<String, BuildError>;

    /// All two-segment `org/repo` prefixes present in the tree, dot- and
    /// underscore-prefixed entries excluded.
    fn repo_dirs(&self) -> Result<BTreeSet<String>, BuildError>;
}
