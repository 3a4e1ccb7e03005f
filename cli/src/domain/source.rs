//! Source specification and the pure rules of repository acquisition.

use std::fmt;

/// Where the application source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A version-control URL to clone.
    Git(String),
    /// A local archive to extract.
    Archive(std::path::PathBuf),
}

impl SourceSpec {
    /// Build a source from the two optional CLI inputs.
    ///
    /// Returns `None` unless exactly one is given.
    #[must_use]
    pub fn from_options(repo: Option<String>, archive: Option<std::path::PathBuf>) -> Option<Self> {
        match (repo, archive) {
            (Some(url), None) => Some(Self::Git(url)),
            (None, Some(path)) => Some(Self::Archive(path)),
            _ => None,
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Git(url) => write!(f, "{url}"),
            Self::Archive(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Archive container formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    Tar,
}

/// Identify an archive from its leading bytes.
///
/// `header` should hold at least the first 262 bytes for plain tar detection.
#[must_use]
pub fn sniff_archive(header: &[u8]) -> Option<ArchiveFormat> {
    if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
        Some(ArchiveFormat::Zip)
    } else if header.starts_with(&[0x1f, 0x8b]) {
        Some(ArchiveFormat::TarGz)
    } else if header.get(257..262) == Some(b"ustar".as_slice()) {
        Some(ArchiveFormat::Tar)
    } else {
        None
    }
}

/// Derive the project root name from a repository URL.
///
/// Takes the last path segment, dropping a trailing `/` and a `.git` suffix.
/// Works for `https://`, `ssh://` and scp-like `git@host:owner/repo.git` URLs.
#[must_use]
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = trimmed.rsplit(['/', ':']).next()?;
    let name = segment.strip_suffix(".git").unwrap_or(segment);
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !trimmed.ends_with(':')
        && name != trimmed;
    valid.then(|| name.to_string())
}

/// A top-level entry of an extraction directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Choose the project root inside an extraction directory.
///
/// Exactly one top-level directory is the archive's wrapper and is peeled:
/// returns its name. Anything else returns `None`, meaning the extraction
/// directory itself is the root and the root name is empty.
#[must_use]
pub fn wrapper_directory(entries: &[TopLevelEntry]) -> Option<&str> {
    match entries {
        [only] if only.is_dir => Some(only.name.as_str()),
        _ => None,
    }
}
