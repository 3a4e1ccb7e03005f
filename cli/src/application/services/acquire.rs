//! Application service: repository acquisition use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::any::Any;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::{
    ArchiveExtractor, LocalFs, ProgressReporter, ScratchSpace, VersionControl,
};
use crate::domain::error::AcquisitionError;
use crate::domain::source::{SourceSpec, repo_name_from_url, wrapper_directory};
use crate::domain::tree::render_listing;

/// A local copy of the source tree.
///
/// The scratch directory holding it is removed when this value is dropped.
pub struct AcquiredRepo {
    pub code_path: PathBuf,
    /// Empty when the archive had no single wrapper directory.
    pub root_name: String,
    pub tree_listing: String,
    _guard: Box<dyn Any + Send>,
}

impl std::fmt::Debug for AcquiredRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquiredRepo")
            .field("code_path", &self.code_path)
            .field("root_name", &self.root_name)
            .finish_non_exhaustive()
    }
}

/// Obtain the source tree described by `source`.
///
/// # Errors
///
/// Returns an [`AcquisitionError`] when no source is given, the clone fails,
/// or the archive cannot be extracted, and propagates filesystem errors.
pub async fn acquire(
    source: Option<&SourceSpec>,
    vcs: &impl VersionControl,
    extractor: &impl ArchiveExtractor,
    scratch: &impl ScratchSpace,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<AcquiredRepo> {
    let source = source.ok_or(AcquisitionError::NoSource)?;
    let (scratch_dir, guard) = scratch.create("source").context("creating scratch directory")?;

    let (code_path, root_name) = match source {
        SourceSpec::Git(url) => {
            let name =
                repo_name_from_url(url).ok_or_else(|| AcquisitionError::InvalidUrl(url.clone()))?;
            let dest = scratch_dir.join(&name);
            reporter.step(&format!("cloning {url}..."));
            let output = vcs.clone_repo(url, &dest).await?;
            if !output.status.success() {
                return Err(AcquisitionError::CloneFailed {
                    url: url.clone(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                }
                .into());
            }
            (dest, name)
        }
        SourceSpec::Archive(path) => {
            reporter.step(&format!("extracting {}...", path.display()));
            extractor.extract(path, &scratch_dir).await?;
            let entries = fs
                .top_level_entries(&scratch_dir)
                .context("listing extracted archive")?;
            match wrapper_directory(&entries) {
                Some(name) => (scratch_dir.join(name), name.to_string()),
                None => (scratch_dir.clone(), String::new()),
            }
        }
    };

    let mut tree = fs.tree(&code_path).context("reading source tree")?;
    tree.name.clone_from(&root_name);
    tree.sort();
    let tree_listing = render_listing(&tree);
    tracing::info!(path = %code_path.display(), root = %root_name, "source acquired");
    reporter.success("source acquired");

    Ok(AcquiredRepo {
        code_path,
        root_name,
        tree_listing,
        _guard: guard,
    })
}

impl AcquiredRepo {
    /// Assemble an acquired repo from parts; used by adapters and tests.
    #[must_use]
    pub fn from_parts(
        code_path: PathBuf,
        root_name: String,
        tree_listing: String,
        guard: Box<dyn Any + Send>,
    ) -> Self {
        Self {
            code_path,
            root_name,
            tree_listing,
            _guard: guard,
        }
    }
}
