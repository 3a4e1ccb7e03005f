//! Application service: loopback rewrite of the entry point before upload.

use std::path::Path;

use crate::application::ports::{LocalFs, ProgressReporter};
use crate::domain::analysis::{RepoAnalysis, rewrite_loopback};

/// Rewrite loopback references in the entry point so the app listens on
/// the public interface. Best effort: returns `true` only when the file was
/// rewritten, and leaves the original in place on any failure.
pub fn rewrite_entry_point(
    code_path: &Path,
    analysis: &RepoAnalysis,
    public_address: &str,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> bool {
    if !analysis.needs_localhost_rewrite {
        return false;
    }
    let Some(main_file) = analysis.main_file.as_deref() else {
        return false;
    };
    let path = code_path.join(main_file);

    let result = fs.read_to_string(&path).and_then(|source| {
        let rewritten = rewrite_loopback(&source, public_address);
        fs.write_string(&path, &rewritten)
    });
    match result {
        Ok(()) => {
            tracing::info!(file = %main_file, "rewrote loopback references");
            reporter.step(&format!("rewrote loopback addresses in {main_file}"));
            true
        }
        Err(e) => {
            tracing::warn!(file = %main_file, error = %format!("{e:#}"), "loopback rewrite failed");
            reporter.warn(&format!(
                "could not rewrite loopback addresses in {main_file}; uploading it unchanged"
            ));
            false
        }
    }
}
