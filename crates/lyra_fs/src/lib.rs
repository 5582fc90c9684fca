//! Filesystem implementation of [`ArtifactStore`] over a monolith tree.
//!
//! The monolith stores every artifact as a symlink whose target file name is
//! the annex key. Top-level layout is `org/repo/...`; dot- and
//! underscore-prefixed entries are bookkeeping, not repositories.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use lyra_core::error::BuildError;
use lyra_core::store::ArtifactStore;

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl ArtifactStore for FsStore {
    fn annex_key(&self, relpath: &str) -> Result<String, BuildError> {
        let path = self.root.join(relpath);
        let target = fs::read_link(&path).map_err(|_| BuildError::MissingSymlink(path.clone()))?;
        let key = target
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or(BuildError::MissingSymlink(path))?;
        Ok(key.to_string())
    }

    fn repo_dirs(&self) -> Result<BTreeSet<String>, BuildError> {
        let mut dirs = BTreeSet::new();
        for org in fs::read_dir(&self.root)? {
            let org = org?;
            if !org.file_type()?.is_dir() {
                continue;
            }
            let org_name = org.file_name();
            let Some(org_name) = org_name.to_str() else {
                continue;
            };
            for repo in fs::read_dir(org.path())? {
                let repo = repo?;
                let repo_name = repo.file_name();
                let Some(repo_name) = repo_name.to_str() else {
                    continue;
                };
                let rel = format!("{org_name}/{repo_name}");
                if rel.starts_with('.') || rel.starts_with('_') {
                    continue;
                }
                dirs.insert(rel);
            }
        }
        Ok(dirs)
    }
}
