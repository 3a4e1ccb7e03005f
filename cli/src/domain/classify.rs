//! Classifier contracts: request/answer shapes, answer parsing with
//! documented fallbacks, and the offline keyword classifiers.
//!
//! Classifier answers are never trusted to follow their schema. Every parse
//! path ends in a well-formed value, falling back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::domain::analysis::sanitize_relative_path;
use crate::domain::framework::Framework;
use crate::domain::tree::{ListedPath, parse_listing};

/// Provider assumed when the intent classifier gives no usable answer.
pub const DEFAULT_PROVIDER: &str = "aws";

/// Dependency manifests the offline classifier recognises, per toolchain.
const PYTHON_MANIFESTS: &[&str] = &["requirements.txt"];
const NODE_MANIFESTS: &[&str] = &["package.json"];

/// Entry-point candidates in preference order.
const PYTHON_ENTRIES: &[&str] = &["app.py", "main.py", "server.py", "wsgi.py", "run.py"];
const DJANGO_ENTRIES: &[&str] = &["manage.py"];
const NODE_ENTRIES: &[&str] = &["server.js", "app.js", "index.js", "main.js"];

/// Structured deployment intent extracted from free-form text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(default, alias = "cloudProvider")]
    pub cloud_provider: Option<String>,
    #[serde(default, alias = "applicationType")]
    pub application_type: Option<String>,
    #[serde(default, alias = "resourceSize")]
    pub resource_size: Option<String>,
}

impl Intent {
    /// The documented fallback: `{provider: "aws", applicationType: null, resourceSize: null}`.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            cloud_provider: Some(DEFAULT_PROVIDER.to_string()),
            application_type: None,
            resource_size: None,
        }
    }
}

/// Input to the structure classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureRequest {
    pub root_name: String,
    pub tree_listing: String,
    pub framework: Framework,
}

/// Candidate manifest and entry-point paths.
///
/// Best effort: may be absent or wrong, and is validated by the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    #[serde(default, alias = "dependencyManifestPath")]
    pub dependency_manifest_path: Option<String>,
    #[serde(default, alias = "mainFilePath")]
    pub main_file_path: Option<String>,
}

impl Structure {
    /// Drop paths that are empty, absolute, or escape the project root.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            dependency_manifest_path: self
                .dependency_manifest_path
                .as_deref()
                .and_then(sanitize_relative_path),
            main_file_path: self.main_file_path.as_deref().and_then(sanitize_relative_path),
        }
    }
}

/// Strip a surrounding Markdown code fence, if any.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_suffix("```").unwrap_or(body);
    // Skip an info string such as `json` on the opening fence line.
    match body.split_once('\n') {
        Some((first, rest)) if !first.trim_start().starts_with('{') => rest.trim(),
        _ => body.trim(),
    }
}

/// Treat `null`, empty strings and the literal `"null"` as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

/// Parse an intent classifier answer, falling back on any shape mismatch.
#[must_use]
pub fn parse_intent(answer: &str) -> Intent {
    match serde_json::from_str::<Intent>(strip_code_fence(answer)) {
        Ok(intent) => Intent {
            cloud_provider: non_empty(intent.cloud_provider).map(|p| p.to_lowercase()),
            application_type: non_empty(intent.application_type).map(|t| t.to_lowercase()),
            resource_size: non_empty(intent.resource_size),
        },
        Err(_) => Intent::fallback(),
    }
}

/// Parse a structure classifier answer, falling back to both-absent.
#[must_use]
pub fn parse_structure(answer: &str) -> Structure {
    serde_json::from_str::<Structure>(strip_code_fence(answer))
        .map(|s| Structure {
            dependency_manifest_path: non_empty(s.dependency_manifest_path),
            main_file_path: non_empty(s.main_file_path),
        })
        .unwrap_or_default()
        .sanitized()
}

// ── Offline classifiers ───────────────────────────────────────────────────────

/// Keyword intent classification used when no remote classifier is configured.
#[must_use]
pub fn keyword_intent(text: &str) -> Intent {
    let lowered = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| contains_word(&lowered, w));

    let cloud_provider = if has(&["gcp", "google cloud", "gce"]) {
        "gcp"
    } else if has(&["azure"]) {
        "azure"
    } else {
        DEFAULT_PROVIDER
    };

    let application_type = if has(&["django"]) {
        Some("django")
    } else if has(&["flask"]) {
        Some("flask")
    } else if has(&["node", "nodejs", "node.js", "express"]) {
        Some("nodejs")
    } else {
        None
    };

    let resource_size = lowered
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .find(|w| is_instance_type(w))
        .map(str::to_string);

    Intent {
        cloud_provider: Some(cloud_provider.to_string()),
        application_type: application_type.map(str::to_string),
        resource_size,
    }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + word.len()..].chars().next();
        let boundary = |c: Option<char>| c.is_none_or(|c| !c.is_alphanumeric());
        boundary(before) && boundary(after)
    })
}

/// EC2-style instance type such as `t2.micro` or `m5.large`.
fn is_instance_type(word: &str) -> bool {
    let Some((family, size)) = word.split_once('.') else {
        return false;
    };
    family.len() >= 2
        && family.starts_with(|c: char| c.is_ascii_lowercase())
        && family.chars().any(|c| c.is_ascii_digit())
        && family.chars().all(|c| c.is_ascii_alphanumeric())
        && !size.is_empty()
        && size.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

/// Structure classification from the tree listing alone.
///
/// Picks the shallowest known manifest for the framework's toolchain, then
/// the shallowest known entry point, preferring one that sits next to the
/// manifest.
#[must_use]
pub fn listing_structure(request: &StructureRequest) -> Structure {
    let paths = parse_listing(&request.tree_listing);
    let files: Vec<&ListedPath> = paths.iter().filter(|p| !p.is_dir).collect();

    let (manifests, entries): (&[&str], &[&str]) = match request.framework {
        Framework::NodeJs => (NODE_MANIFESTS, NODE_ENTRIES),
        Framework::Django => (PYTHON_MANIFESTS, DJANGO_ENTRIES),
        Framework::Flask => (PYTHON_MANIFESTS, PYTHON_ENTRIES),
        Framework::Unknown => {
            let has_python = files
                .iter()
                .any(|p| PYTHON_MANIFESTS.contains(&p.file_name()));
            let has_node = files.iter().any(|p| NODE_MANIFESTS.contains(&p.file_name()));
            if has_node && !has_python {
                (NODE_MANIFESTS, NODE_ENTRIES)
            } else if files.iter().any(|p| p.file_name() == "manage.py") {
                (PYTHON_MANIFESTS, DJANGO_ENTRIES)
            } else {
                (PYTHON_MANIFESTS, PYTHON_ENTRIES)
            }
        }
    };

    let manifest = shallowest(&files, manifests);
    let manifest_dir = manifest.and_then(|m| m.path.rsplit_once('/').map(|(d, _)| d));
    let sibling = manifest_dir.map_or_else(
        || shallowest(&files, entries).filter(|p| p.depth() == 1),
        |dir| {
            files
                .iter()
                .copied()
                .filter(|p| p.path.rsplit_once('/').map(|(d, _)| d) == Some(dir))
                .filter(|p| entries.contains(&p.file_name()))
                .min_by_key(|p| rank(entries, p.file_name()))
        },
    );
    let main = sibling.or_else(|| shallowest(&files, entries));

    Structure {
        dependency_manifest_path: manifest.map(|p| p.path.clone()),
        main_file_path: main.map(|p| p.path.clone()),
    }
}

fn rank(candidates: &[&str], name: &str) -> usize {
    candidates
        .iter()
        .position(|c| *c == name)
        .unwrap_or(usize::MAX)
}

fn shallowest<'a>(files: &[&'a ListedPath], names: &[&str]) -> Option<&'a ListedPath> {
    files
        .iter()
        .copied()
        .filter(|p| names.contains(&p.file_name()))
        .min_by_key(|p| (p.depth(), rank(names, p.file_name())))
}
