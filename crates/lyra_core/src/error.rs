use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a dataset from a dump and a monolith tree.
///
/// Every variant is fatal for the whole run: the dump and the file store are
/// expected to agree, and a partially-correct dataset is worse than a halted
/// build. The only non-error outcomes are the skip path (a record with no
/// image and no artifact files) and the loose-directory warning.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("cannot parse image url {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unrecognized object store host in {0:?}")]
    UnknownHost(String),

    #[error("no github.com marker in object path of {0:?}")]
    MissingPathMarker(String),

    #[error("malformed annex key {0:?}")]
    BadAnnexKey(String),

    #[error("cannot decode md5 transport encoding {value:?}")]
    BadChecksumEncoding {
        value: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("cannot parse file size {value:?} for {name}:{tag}")]
    BadFileSize { name: String, tag: String, value: String },

    #[error("md5 mismatch for {relpath}: store has {store_md5}, dump has {dump_md5}")]
    ChecksumMismatch {
        relpath: String,
        store_md5: String,
        dump_md5: String,
    },

    #[error("size mismatch for {relpath}: store has {store_size}, dump has {dump_size}")]
    SizeMismatch {
        relpath: String,
        store_size: u64,
        dump_size: u64,
    },

    #[error("{count} artifact file candidates for {name}:{tag}, none matching the image url")]
    AmbiguousArtifact { name: String, tag: String, count: usize },

    #[error("record {name}:{tag} has no image url but carries artifact files")]
    ArtifactWithoutImage { name: String, tag: String },

    #[error("no file descriptor to derive {name}:{tag} from (image url {url:?})")]
    MissingDescriptor { name: String, tag: String, url: String },

    #[error("derived path {0:?} does not have 5 components")]
    MalformedPath(String),

    #[error("two builds of {name} share build date {build_date}")]
    DuplicateBuildDate { name: String, build_date: String },

    #[error("repository {0} from the dump has no directory in the store")]
    NameNotInStore(String),

    #[error("no symlink under {0}")]
    MissingSymlink(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading a persisted dataset at service start.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("index for {0} has no \"latest\" key")]
    MissingLatest(String),
}
