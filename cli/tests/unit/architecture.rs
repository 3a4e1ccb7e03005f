//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries
//! (domain → application → infra/output → commands) hold.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

fn src_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src")
}

fn rel(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
        .replace('\\', "/")
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Non-test, non-comment lines of every file under `dir` that contain any
/// of `patterns`, formatted as `path:line: text`.
fn find_forbidden(dir: &Path, patterns: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let rel = rel(&file);
        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            if in_test || trimmed.starts_with("//") {
                continue;
            }
            for pattern in patterns {
                if line.contains(pattern) {
                    violations.push(format!("{rel}:{}: `{pattern}`: {trimmed}", i + 1));
                }
            }
        }
    }
    violations
}

// ── Layer boundaries ─────────────────────────────────────────────────────────

#[test]
fn domain_is_pure() {
    let violations = find_forbidden(
        &src_dir().join("domain"),
        &[
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::env",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must not perform I/O or depend on outer layers:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_has_no_infra_or_output_imports() {
    let violations = find_forbidden(
        &src_dir().join("application"),
        &["crate::infra::", "crate::output::", "crate::commands::"],
    );
    assert!(
        violations.is_empty(),
        "application/ must not import from infra/, output/ or commands/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_has_no_blocking_io() {
    let violations = find_forbidden(
        &src_dir().join("application"),
        &["std::fs::", "std::process::Command", "std::net::TcpStream"],
    );
    assert!(
        violations.is_empty(),
        "application/ must reach the host only through ports:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = find_forbidden(
        &src_dir().join("infra"),
        &["crate::commands", "crate::output"],
    );
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn output_has_no_infra_imports() {
    let violations = find_forbidden(&src_dir().join("output"), &["crate::infra"]);
    assert!(
        violations.is_empty(),
        "output/ must not import from infra/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let violations = find_forbidden(&src_dir().join("infra"), &["println!", "eprintln!"]);
    assert!(
        violations.is_empty(),
        "infra/ must not use println!/eprintln! outside #[cfg(test)]:\n{}",
        violations.join("\n")
    );
}

// ── Process execution routes through infra ───────────────────────────────────

#[test]
fn no_tokio_command_runner_new_outside_infra() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir()) {
        let rel = rel(&file);
        if rel.contains("/infra/") {
            continue;
        }
        let lines = read_non_comment_lines(&file);
        for (i, line) in lines.iter().enumerate() {
            if line.contains("TokioCommandRunner::new") {
                violations.push(format!(
                    "{rel}:{}: TokioCommandRunner::new outside infra/: {line}",
                    i + 1
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Found TokioCommandRunner::new outside infra/; build adapters in HostEnvironment:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_concrete_adapter_types_in_service_signatures() {
    let services_dir = src_dir().join("application").join("services");
    let concrete_types = [
        "HostEnvironment",
        "TokioCommandRunner",
        "OpenSshConnector",
        "TerraformCli",
        "YamlConfigStore",
    ];

    let mut violations: Vec<String> = Vec::new();
    for file in collect_rs_files(&services_dir) {
        let rel = rel(&file);
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if !line.contains("fn ") {
                continue;
            }
            for concrete in &concrete_types {
                if line.contains(concrete) {
                    violations.push(format!(
                        "{rel}:{}: concrete type `{concrete}` in function signature: {line}",
                        i + 1
                    ));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Services must take port traits, not adapters:\n{}",
        violations.join("\n")
    );
}

// ── Command handlers ─────────────────────────────────────────────────────────

#[test]
fn no_inline_json_branching_in_commands() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir().join("commands")) {
        let lines = read_non_comment_lines(&file);
        let rel = rel(&file);

        for (i, line) in lines.iter().enumerate() {
            let lineno = i + 1;
            if line.contains("json: bool") {
                violations.push(format!(
                    "{rel}:{lineno}: found `json: bool` parameter: {line}"
                ));
            }
            let trimmed = line.trim();
            if trimmed.starts_with("if json") || trimmed.starts_with("if !json") {
                violations.push(format!("{rel}:{lineno}: found inline JSON branch: {line}"));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Found inline JSON branching in commands/; use app.renderer() instead:\n{}",
        violations.join("\n")
    );
}

/// All confirmation prompts in `commands/` must go through `app.confirm()`.
#[test]
fn commands_use_standardized_confirmation() {
    let violations = find_forbidden(
        &src_dir().join("commands"),
        &["io::stdin().lock()", "Confirm::new()"],
    );
    assert!(
        violations.is_empty(),
        "Commands must use app.confirm() for user prompts:\n{}",
        violations.join("\n")
    );
}

/// Each file in `commands/` stays a thin handler.
#[test]
fn command_handlers_are_reasonably_sized() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir().join("commands")) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let mut tracker = CfgTestTracker::new();
        let line_count = content
            .lines()
            .filter(|line| {
                let in_test = tracker.process_line(line);
                let trimmed = line.trim();
                !in_test && !trimmed.is_empty() && !trimmed.starts_with("//")
            })
            .count();

        if line_count > 125 {
            violations.push(format!(
                "{}: {line_count} non-test lines (limit: 125)",
                rel(&file)
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Command handler files exceed 125-line limit; extract logic to application services:\n{}",
        violations.join("\n")
    );
}

/// No module-level #![`allow(dead_code)`] in domain/, application/, or infra/ layers.
#[test]
fn no_module_level_dead_code_allows_in_layers() {
    let mut violations: Vec<String> = Vec::new();

    for layer in ["domain", "application", "infra"] {
        for file in collect_rs_files(&src_dir().join(layer)) {
            let Ok(content) = std::fs::read_to_string(&file) else {
                continue;
            };
            for (i, line) in content.lines().enumerate() {
                if line.trim() == "#![allow(dead_code)]" {
                    violations.push(format!(
                        "{}:{}: module-level #![allow(dead_code)]",
                        rel(&file),
                        i + 1
                    ));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Module-level #![allow(dead_code)] found in architecture layers; use item-level suppression:\n{}",
        violations.join("\n")
    );
}
