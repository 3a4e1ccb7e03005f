//! Repository analysis record and the pure checks that build it.
//!
//! Pure functions only; file contents are passed in by the application layer.

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::framework::Framework;

/// Manifest keywords in precedence order: the first one found wins.
///
/// Node packages are matched as quoted JSON strings so that names merely
/// containing them (`koala`, `express-validator` alone) do not count.
pub const MANIFEST_KEYWORDS: &[(&str, Framework)] = &[
    ("django", Framework::Django),
    ("flask", Framework::Flask),
    ("\"express\"", Framework::NodeJs),
    ("\"koa\"", Framework::NodeJs),
];

static LOOPBACK_HOST: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"\blocalhost\b").unwrap()
});

static LOOPBACK_ADDR: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"\b127\.0\.0\.1\b").unwrap()
});

/// Structural facts about the acquired repository.
///
/// Built once per run by the analyzer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoAnalysis {
    pub framework: Framework,
    /// Listening ports; never empty, the first is the primary port.
    pub ports: Vec<u16>,
    /// Dependency manifest, relative to the project root.
    pub dependency_manifest: Option<String>,
    /// Entry point, relative to the project root.
    pub main_file: Option<String>,
    pub needs_localhost_rewrite: bool,
}

impl RepoAnalysis {
    /// Analysis with the framework's default ports and nothing discovered yet.
    #[must_use]
    pub fn new(framework: Framework) -> Self {
        Self {
            framework,
            ports: framework.default_ports(),
            dependency_manifest: None,
            main_file: None,
            needs_localhost_rewrite: false,
        }
    }

    /// Primary listening port.
    #[must_use]
    pub fn primary_port(&self) -> u16 {
        self.ports
            .first()
            .copied()
            .unwrap_or_else(|| self.framework.default_ports()[0])
    }

    /// Apply a framework detected from the dependency manifest, resetting the
    /// port set to that framework's defaults.
    pub fn apply_detected(&mut self, framework: Framework) {
        self.framework = framework;
        self.ports = framework.default_ports();
    }
}

/// Scan manifest content for framework keywords.
///
/// Matching is done on the lowercased content, in `MANIFEST_KEYWORDS` order.
#[must_use]
pub fn detect_framework(manifest_content: &str) -> Option<Framework> {
    let lowered = manifest_content.to_lowercase();
    MANIFEST_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, framework)| *framework)
}

/// `true` if the source text references a loopback hostname or address.
#[must_use]
pub fn references_loopback(source: &str) -> bool {
    LOOPBACK_HOST.is_match(source) || LOOPBACK_ADDR.is_match(source)
}

/// Replace loopback references: `localhost` → `public_address`, `127.0.0.1` → `0.0.0.0`.
#[must_use]
pub fn rewrite_loopback(source: &str, public_address: &str) -> String {
    let replaced = LOOPBACK_HOST.replace_all(source, regex::NoExpand(public_address));
    LOOPBACK_ADDR
        .replace_all(&replaced, regex::NoExpand("0.0.0.0"))
        .into_owned()
}

/// Validate a classifier-supplied path.
///
/// Returns the path with a leading `./` and surrounding whitespace removed,
/// or `None` if it is empty, absolute, or escapes the project root.
#[must_use]
pub fn sanitize_relative_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches("./");
    if trimmed.is_empty() {
        return None;
    }
    let path = Path::new(trimmed);
    let safe = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    safe.then(|| trimmed.replace('\\', "/"))
}
