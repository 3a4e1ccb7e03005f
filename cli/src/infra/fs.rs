//! Filesystem infrastructure: implements `LocalFs` and `ScratchSpace`.

use std::any::Any;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::{DirEntry, WalkDir};

use crate::application::ports::{LocalFs, ScratchSpace};
use crate::domain::source::TopLevelEntry;
use crate::domain::tree::{ListedPath, TreeNode};

/// Directory never listed or uploaded.
const VCS_DIR: &str = ".git";

// Symbolic links are neither listed nor uploaded: a link may point outside
// the project, and `scp` cannot recreate one.

/// Production filesystem implementation of `LocalFs`.
pub struct HostFs;

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && (entry.path_is_symlink()
            || (entry.file_type().is_dir() && entry.file_name() == VCS_DIR))
}

fn relative(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/"))
}

impl LocalFs for HostFs {
    fn top_level_entries(&self, dir: &Path) -> Result<Vec<TopLevelEntry>> {
        let mut entries = Vec::new();
        for entry in
            std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?
        {
            let entry = entry.with_context(|| format!("reading directory {}", dir.display()))?;
            let file_type = entry
                .file_type()
                .with_context(|| format!("inspecting {}", entry.path().display()))?;
            entries.push(TopLevelEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: file_type.is_dir(),
            });
        }
        Ok(entries)
    }

    fn tree(&self, root: &Path) -> Result<TreeNode> {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut node = TreeNode::dir(&name, Vec::new());
        for entry in std::fs::read_dir(root)
            .with_context(|| format!("reading directory {}", root.display()))?
        {
            let entry = entry.with_context(|| format!("reading directory {}", root.display()))?;
            let path = entry.path();
            let child_name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry
                .file_type()
                .with_context(|| format!("inspecting {}", path.display()))?;
            if file_type.is_symlink() {
                tracing::debug!(path = %path.display(), "skipping symlink");
                continue;
            }
            if file_type.is_dir() {
                if child_name == VCS_DIR {
                    continue;
                }
                node.children.push(self.tree(&path)?);
            } else {
                node.children.push(TreeNode::file(&child_name));
            }
        }
        Ok(node)
    }

    fn walk(&self, root: &Path) -> Result<Vec<ListedPath>> {
        let mut paths = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped(e));
        for entry in walker {
            let entry = entry.with_context(|| format!("walking {}", root.display()))?;
            paths.push(ListedPath {
                path: relative(root, entry.path())?,
                is_dir: entry.file_type().is_dir(),
            });
        }
        Ok(paths)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading file {}", path.display()))
    }

    fn write_string(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::write(path, content).with_context(|| format!("writing file {}", path.display()))
    }
}

/// Scratch directories under the system temp dir.
pub struct TempScratch;

impl ScratchSpace for TempScratch {
    fn create(&self, label: &str) -> Result<(PathBuf, Box<dyn Any + Send>)> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("autoship-{label}-"))
            .tempdir()
            .context("creating scratch directory")?;
        let path = dir.path().to_path_buf();
        tracing::debug!(path = %path.display(), "scratch directory created");
        Ok((path, Box::new(dir)))
    }

    fn create_retained(&self, label: &str) -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("autoship-{label}-"))
            .tempdir()
            .context("creating scratch directory")?;
        let path = dir.keep();
        tracing::debug!(path = %path.display(), "retained directory created");
        Ok(path)
    }
}
