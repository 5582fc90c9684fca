//! Normalization of raw build records into canonical served records.
//!
//! The dump's per-build `files` lists are inconsistently shaped: most
//! records name their artifact via an exact `mediaLink` match, older ones
//! only via an artifact-extension file, and some only via the image URL
//! itself. Normalization picks the single correct descriptor, cross-checks
//! it against the store, and flattens the record.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::dump::{FileDescriptor, RawBuildRecord};
use crate::error::BuildError;
use crate::path::{AnnexKey, monolith_relpath};
use crate::record::CanonicalRecord;
use crate::store::ArtifactStore;

/// Extensions a build artifact may carry.
const ARTIFACT_EXTENSIONS: [&str; 3] = [".sif", ".simg", ".img.gz"];

fn is_artifact_name(name: &str) -> bool {
    ARTIFACT_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Image URLs under this host are redirects into the monolith itself; the
/// object-store path must come from the matched descriptor instead.
const MIRROR_HOST: &str = "datasets.datalad.org";

/// Normalizes one raw build record.
///
/// Returns `Ok(None)` for the one designed skip case: a record with no image
/// URL and no artifact-extension files. Every other irregularity is fatal,
/// since it means the dump and the store disagree about data the service
/// would hand out.
pub fn normalize_record(
    raw: &RawBuildRecord,
    store: &impl ArtifactStore,
) -> Result<Option<CanonicalRecord>, BuildError> {
    let fields = &raw.fields;
    let image_url = fields.image_url();
    let artifacts: Vec<&FileDescriptor> = fields
        .files
        .iter()
        .filter(|f| is_artifact_name(&f.name))
        .collect();

    if image_url.is_empty() {
        if !artifacts.is_empty() {
            return Err(BuildError::ArtifactWithoutImage {
                name: fields.name.clone(),
                tag: fields.tag.clone(),
            });
        }
        tracing::debug!(name = %fields.name, tag = %fields.tag, "record has no image, skipping");
        return Ok(None);
    }

    // Exact mediaLink match wins; a lone artifact-extension file is the
    // fallback. More than one candidate with no exact match cannot be
    // resolved and aborts the run.
    let matched = fields.files.iter().find(|f| f.media_link == image_url);
    let chosen = match matched {
        Some(f) => Some(f),
        None => match artifacts.as_slice() {
            [] => None,
            [only] => Some(*only),
            many => {
                return Err(BuildError::AmbiguousArtifact {
                    name: fields.name.clone(),
                    tag: fields.tag.clone(),
                    count: many.len(),
                });
            }
        },
    };

    let derive_url = if image_url.contains(MIRROR_HOST) {
        let f = chosen.ok_or_else(|| BuildError::MissingDescriptor {
            name: fields.name.clone(),
            tag: fields.tag.clone(),
            url: image_url.to_string(),
        })?;
        f.media_link.as_str()
    } else {
        image_url
    };

    let relpath = monolith_relpath(derive_url)?;
    let key = AnnexKey::parse(&store.annex_key(&relpath)?)?;

    if let Some(f) = chosen {
        // The store symlink is authoritative; the dump must agree with it.
        let dump_md5 = md5_transport_to_hex(&f.md5_hash)?;
        if dump_md5 != key.md5 {
            return Err(BuildError::ChecksumMismatch {
                relpath,
                store_md5: key.md5,
                dump_md5,
            });
        }
        let dump_size: u64 = f.size.parse().map_err(|_| BuildError::BadFileSize {
            name: fields.name.clone(),
            tag: fields.tag.clone(),
            value: f.size.clone(),
        })?;
        if dump_size != key.size {
            return Err(BuildError::SizeMismatch {
                relpath,
                store_size: key.size,
                dump_size,
            });
        }
    }

    if relpath.matches('/').count() != 4 {
        return Err(BuildError::MalformedPath(relpath));
    }

    Ok(Some(CanonicalRecord {
        id: raw.pk,
        name: fields.name.clone(),
        branch: fields.branch.clone(),
        commit: fields.commit.clone(),
        tag: fields.tag.clone(),
        version: fields.version.clone(),
        size_mb: fields.metrics.size_mb.clone(),
        image: relpath,
        build_date: Some(fields.build_date.clone()),
    }))
}

/// Converts a base64-encoded md5 into the lowercase hex the annex keys use.
fn md5_transport_to_hex(md5_hash: &str) -> Result<String, BuildError> {
    let bytes = BASE64
        .decode(md5_hash)
        .map_err(|source| BuildError::BadChecksumEncoding {
            value: md5_hash.to_string(),
            source,
        })?;
    Ok(hex::encode(bytes))
}
