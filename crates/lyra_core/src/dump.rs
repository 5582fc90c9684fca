//! Typed views over the raw database dump rows.
//!
//! The dump is a pair of JSON arrays, `main.container.json` and
//! `main.collection.json`, each row shaped as `{pk, fields}`. Only the keys
//! the pipeline needs are modeled; everything else in a row is ignored.
//! Required keys are validated here, at parse time, instead of on first
//! access.

use serde::Deserialize;

/// One build of one repository, as dumped from the upstream database.
///
/// Exists only during offline dataset construction and is discarded after
/// normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBuildRecord {
    /// Database primary key, served as the record `id`.
    pub pk: u64,
    pub fields: BuildFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildFields {
    /// `org/repo` repository name.
    pub name: String,
    pub branch: String,
    pub tag: String,
    pub commit: String,
    pub version: String,
    /// Fixed-width ISO-8601 timestamp, e.g. `2021-04-12T12:26:14.487Z`.
    /// Compared as a string throughout; the format is zero-padded so string
    /// order equals chronological order.
    pub build_date: String,
    /// Download URL of the build artifact. May be null or empty for builds
    /// that produced nothing.
    pub image: Option<String>,
    /// Owning collection id.
    pub collection: u64,
    pub metrics: BuildMetrics,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

impl BuildFields {
    /// The declared image url, with null and `""` folded together.
    pub fn image_url(&self) -> &str {
        self.image.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildMetrics {
    /// Kept as a raw JSON number so integer metrics stay integers in the
    /// output.
    pub size_mb: Option<serde_json::Number>,
}

/// One candidate artifact attached to a build record.
///
/// At most one descriptor per record is the actual build artifact; the
/// others are logs, recipes and the like.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Object name as seen by the remote store.
    #[serde(default)]
    pub name: String,
    pub media_link: String,
    /// Declared byte size. The upstream store dumps int64 values as decimal
    /// strings.
    pub size: String,
    /// Content md5 in base64 transport encoding.
    pub md5_hash: String,
}

/// One row of the collections dump. Only `license` and `full_name` of the
/// nested repo object are retained.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCollectionRecord {
    pub pk: u64,
    #[serde(default)]
    pub fields: CollectionFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionFields {
    #[serde(default)]
    pub repo: Option<RepoInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_row_parses_with_extra_keys_ignored() {
        let row = serde_json::json!({
            "pk": 11888,
            "model": "main.container",
            "fields": {
                "name": "vsoch/hello-world",
                "branch": "master",
                "tag": "latest",
                "commit": "3bac21df631874e3cbb3f0cf6fc9af1898f4cc3d",
                "version": "104932c9ca80c0eb90ebf6a80b7d7400",
                "build_date": "2021-04-12T12:26:14.487Z",
                "build_log": "True",
                "image": "https://www.googleapis.com/download/x",
                "collection": 17,
                "metrics": {"size_mb": 1332},
                "files": [{
                    "name": "singularityhub/github.com/vsoch/hello-world/3bac/1049/1049.sif",
                    "mediaLink": "https://www.googleapis.com/download/x",
                    "size": "62652447",
                    "md5Hash": "EEkyycqAwOuQ6/aoC310AA==",
                    "bucket": "singularityhub"
                }]
            }
        });
        let rec: RawBuildRecord = serde_json::from_value(row).unwrap();
        assert_eq!(rec.pk, 11888);
        assert_eq!(rec.fields.files.len(), 1);
        assert_eq!(rec.fields.files[0].size, "62652447");
        assert_eq!(rec.fields.metrics.size_mb.as_ref().unwrap().as_u64(), Some(1332));
    }

    #[test]
    fn null_image_and_missing_files_are_accepted() {
        let row = serde_json::json!({
            "pk": 1,
            "fields": {
                "name": "org/repo",
                "branch": "master",
                "tag": "latest",
                "commit": "c",
                "version": "v",
                "build_date": "2021-01-01T00:00:00.000Z",
                "image": null,
                "collection": 2,
                "metrics": {}
            }
        });
        let rec: RawBuildRecord = serde_json::from_value(row).unwrap();
        assert_eq!(rec.fields.image_url(), "");
        assert!(rec.fields.files.is_empty());
        assert!(rec.fields.metrics.size_mb.is_none());
    }

    #[test]
    fn collection_row_tolerates_missing_repo() {
        let row = serde_json::json!({"pk": 42, "fields": {}});
        let rec: RawCollectionRecord = serde_json::from_value(row).unwrap();
        assert_eq!(rec.pk, 42);
        assert!(rec.fields.repo.is_none());
    }
}
