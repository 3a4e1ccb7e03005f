//! Application service: structural analysis use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Nothing here is fatal: every failed lookup degrades the analysis and is
//! reported as a warning.

use crate::application::ports::{LocalFs, ProgressReporter, StructureClassifier};
use crate::application::services::acquire::AcquiredRepo;
use crate::domain::analysis::{RepoAnalysis, detect_framework, references_loopback};
use crate::domain::classify::{Structure, StructureRequest, parse_structure};
use crate::domain::framework::Framework;

/// Build the [`RepoAnalysis`] for an acquired repository.
///
/// `hint` is the caller's framework, if known; a framework detected from the
/// dependency manifest takes precedence over it.
pub async fn analyze(
    repo: &AcquiredRepo,
    hint: Option<Framework>,
    classifier: &impl StructureClassifier,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> RepoAnalysis {
    let framework = hint.unwrap_or(Framework::Unknown);
    let mut analysis = RepoAnalysis::new(framework);

    reporter.step("analyzing repository structure...");
    let request = StructureRequest {
        root_name: repo.root_name.clone(),
        tree_listing: repo.tree_listing.clone(),
        framework,
    };
    let structure = match classifier.classify_structure(&request).await {
        Ok(answer) => parse_structure(&answer),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "structure classifier failed");
            reporter.warn("structure classifier unavailable; continuing without hints");
            Structure::default()
        }
    };
    tracing::debug!(?structure, "structure classified");

    if let Some(manifest) = structure.dependency_manifest_path {
        match fs.read_to_string(&repo.code_path.join(&manifest)) {
            Ok(content) => {
                if let Some(detected) = detect_framework(&content) {
                    analysis.apply_detected(detected);
                }
                analysis.dependency_manifest = Some(manifest);
            }
            Err(e) => {
                tracing::warn!(%manifest, error = %e, "manifest unreadable");
                reporter.warn(&format!("dependency manifest '{manifest}' is unreadable"));
            }
        }
    }

    if let Some(main_file) = structure.main_file_path {
        match fs.read_to_string(&repo.code_path.join(&main_file)) {
            Ok(source) => {
                analysis.needs_localhost_rewrite = references_loopback(&source);
                analysis.main_file = Some(main_file);
            }
            Err(e) => {
                tracing::warn!(%main_file, error = %e, "entry point unreadable");
                reporter.warn(&format!("entry point '{main_file}' is unreadable"));
            }
        }
    }

    reporter.success(&format!(
        "detected {} on port {}",
        analysis.framework,
        analysis.primary_port()
    ));
    analysis
}
