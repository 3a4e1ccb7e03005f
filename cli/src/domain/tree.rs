//! Directory tree model and its box-drawing listing.
//!
//! The listing is the textual form handed to the structure classifier, so
//! `parse_listing` must invert `render_listing` exactly.

const BRANCH: &str = "├── ";
const LAST: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// One node of a directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub is_dir: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    #[must_use]
    pub fn file(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_dir: false,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn dir(name: &str, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.to_string(),
            is_dir: true,
            children,
        }
    }

    /// Sort children by name at every level, directories and files interleaved.
    pub fn sort(&mut self) {
        self.children.sort_by(|a, b| a.name.cmp(&b.name));
        for child in &mut self.children {
            child.sort();
        }
    }
}

/// A path found in a listing, relative to the listing root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedPath {
    pub path: String,
    pub is_dir: bool,
}

impl ListedPath {
    /// Number of `/`-separated components.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.split('/').count()
    }

    /// Final path component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Render a tree as a Unicode box-drawing listing.
///
/// The first line is the root name followed by `/` (`./` when the root has
/// no name). Children are emitted in the order they are stored; call
/// [`TreeNode::sort`] first for a sorted listing.
#[must_use]
pub fn render_listing(root: &TreeNode) -> String {
    let mut out = String::new();
    if root.name.is_empty() {
        out.push_str("./\n");
    } else {
        out.push_str(&root.name);
        out.push_str("/\n");
    }
    render_children(&root.children, "", &mut out);
    out
}

fn render_children(children: &[TreeNode], prefix: &str, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        out.push_str(prefix);
        out.push_str(if last { LAST } else { BRANCH });
        out.push_str(&child.name);
        if child.is_dir {
            out.push('/');
        }
        out.push('\n');
        if child.is_dir {
            let next = format!("{prefix}{}", if last { SPACE } else { PIPE });
            render_children(&child.children, &next, out);
        }
    }
}

/// Recover relative paths from a listing produced by [`render_listing`].
///
/// Lines that do not look like tree entries are ignored, so a slightly
/// malformed listing degrades to fewer paths rather than an error.
#[must_use]
pub fn parse_listing(listing: &str) -> Vec<ListedPath> {
    let mut stack: Vec<String> = Vec::new();
    let mut paths = Vec::new();
    for line in listing.lines().skip(1) {
        let mut rest = line;
        let mut depth = 0usize;
        loop {
            if let Some(r) = rest.strip_prefix(PIPE).or_else(|| rest.strip_prefix(SPACE)) {
                rest = r;
                depth += 1;
            } else {
                break;
            }
        }
        let Some(entry) = rest.strip_prefix(BRANCH).or_else(|| rest.strip_prefix(LAST)) else {
            continue;
        };
        if depth > stack.len() {
            continue;
        }
        stack.truncate(depth);
        let (name, is_dir) = match entry.strip_suffix('/') {
            Some(n) => (n, true),
            None => (entry, false),
        };
        if name.is_empty() {
            continue;
        }
        let path = if stack.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", stack.join("/"))
        };
        paths.push(ListedPath { path, is_dir });
        if is_dir {
            stack.push(name.to_string());
        }
    }
    paths
}
