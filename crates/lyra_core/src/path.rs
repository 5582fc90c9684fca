//! Derivation of monolith paths and annex keys.
//!
//! Artifacts live in a content-addressed tree ("monolith") under
//! `org/repo/ref/contenthash/filename`. The object-store URLs in the dump
//! percent-encode that path after a fixed `github.com/` marker, and the
//! store itself names symlink targets after the annexed content
//! (`MD5E-s<size>--<md5><ext>`). Both derivations are pure string
//! transformations.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use crate::error::BuildError;

/// Object-store hosts the dump is allowed to reference.
const KNOWN_HOSTS: [&str; 2] = ["storage.googleapis.com", "www.googleapis.com"];

/// Percent-encoded marker preceding the `org/repo/...` portion of an object
/// path.
const PATH_MARKER: &str = "%2Fgithub.com%2F";

/// First-generation bucket whose object paths lack the content-hash
/// directory level.
const LEGACY_MARKER: &str = "/singularityhub-legacy/";

/// Derives the monolith-relative artifact path from an object-store URL.
///
/// The result always has exactly 5 components,
/// `org/repo/ref/contenthash/filename`. Legacy-generation URLs carry only 4;
/// for those the md5 prefix of the filename is duplicated as the missing
/// directory level, matching how the monolith was laid out.
pub fn monolith_relpath(image_url: &str) -> Result<String, BuildError> {
    let url = Url::parse(image_url).map_err(|source| BuildError::InvalidUrl {
        url: image_url.to_string(),
        source,
    })?;

    if !KNOWN_HOSTS.contains(&url.host_str().unwrap_or_default()) {
        return Err(BuildError::UnknownHost(image_url.to_string()));
    }

    let path = url.path();
    let start = path
        .find(PATH_MARKER)
        .ok_or_else(|| BuildError::MissingPathMarker(image_url.to_string()))?
        + PATH_MARKER.len();
    let relpath = percent_decode_str(&path[start..])
        .decode_utf8_lossy()
        .into_owned();

    if image_url.contains(LEGACY_MARKER) {
        return legacy_relpath(&relpath);
    }
    Ok(relpath)
}

/// Inserts the filename's 32-char md5 prefix as an extra directory level.
fn legacy_relpath(relpath: &str) -> Result<String, BuildError> {
    let (parent, name) = relpath
        .rsplit_once('/')
        .ok_or_else(|| BuildError::MalformedPath(relpath.to_string()))?;
    let md5 = name
        .get(..32)
        .ok_or_else(|| BuildError::MalformedPath(relpath.to_string()))?;
    Ok(format!("{parent}/{md5}/{name}"))
}

static ANNEX_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^MD5E-s(\d+)--([0-9a-f]{32})(.*)$").unwrap());

/// Parsed annex key, the target file name of a monolith symlink.
///
/// The storage layer guarantees the `MD5E-s<size>--<md5><ext>` shape for
/// every valid artifact; anything else is corrupt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnexKey {
    pub size: u64,
    pub md5: String,
    pub ext: String,
}

impl AnnexKey {
    pub fn parse(key: &str) -> Result<Self, BuildError> {
        let caps = ANNEX_KEY_RE
            .captures(key)
            .ok_or_else(|| BuildError::BadAnnexKey(key.to_string()))?;
        let size = caps[1]
            .parse()
            .map_err(|_| BuildError::BadAnnexKey(key.to_string()))?;
        Ok(Self {
            size,
            md5: caps[2].to_string(),
            ext: caps[3].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEDIA_LINK: &str = "https://www.googleapis.com/download/storage/v1/b/singularityhub/o/singularityhub%2Fgithub.com%2Fvsoch%2Fhello-world%2F3bac21df631874e3cbb3f0cf6fc9af1898f4cc3d%2F104932c9ca80c0eb90ebf6a80b7d7400%2F104932c9ca80c0eb90ebf6a80b7d7400.sif?generation=1563547843599870&alt=media";

    #[test]
    fn derives_five_component_path() {
        let p = monolith_relpath(MEDIA_LINK).unwrap();
        assert_eq!(
            p,
            "vsoch/hello-world/3bac21df631874e3cbb3f0cf6fc9af1898f4cc3d/104932c9ca80c0eb90ebf6a80b7d7400/104932c9ca80c0eb90ebf6a80b7d7400.sif"
        );
        assert_eq!(p.matches('/').count(), 4);
    }

    #[test]
    fn legacy_urls_gain_the_md5_directory_once() {
        let md5 = "0123456789abcdef0123456789abcdef";
        let url = format!(
            "https://storage.googleapis.com/singularityhub-legacy/o/x%2Fgithub.com%2Forg%2Frepo%2Fdeadbeef%2F{md5}.simg"
        );
        let p = monolith_relpath(&url).unwrap();
        assert_eq!(p, format!("org/repo/deadbeef/{md5}/{md5}.simg"));
        assert_eq!(p.matches(md5).count(), 2);
    }

    #[test]
    fn unknown_host_is_fatal() {
        let err = monolith_relpath("https://example.com/a%2Fgithub.com%2Fb").unwrap_err();
        assert!(matches!(err, BuildError::UnknownHost(_)));
    }

    #[test]
    fn missing_marker_is_fatal() {
        let err =
            monolith_relpath("https://storage.googleapis.com/bucket/o/some%2Fother%2Fpath").unwrap_err();
        assert!(matches!(err, BuildError::MissingPathMarker(_)));
    }

    #[test]
    fn parses_annex_key() {
        let key = AnnexKey::parse("MD5E-s62652447--104932c9ca80c0eb90ebf6a80b7d7400.sif").unwrap();
        assert_eq!(key.size, 62652447);
        assert_eq!(key.md5, "104932c9ca80c0eb90ebf6a80b7d7400");
        assert_eq!(key.ext, ".sif");
    }

    #[test]
    fn rejects_foreign_backends_and_shapes() {
        for bad in [
            "SHA256E-s10--aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "MD5E-s10--notahexstring",
            "MD5E-10--104932c9ca80c0eb90ebf6a80b7d7400",
            "",
        ] {
            assert!(matches!(
                AnnexKey::parse(bad),
                Err(BuildError::BadAnnexKey(_))
            ));
        }
    }
}
