use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::{Result, StampError};
use crate::render::{Diagnostics, ErrorKind, Location};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    Directory {
        name: String,
        children: Vec<TemplateNode>,
    },
    File {
        name: String,
        content: Vec<u8>,
        /// Binary files are copied verbatim and never scanned.
        is_binary: bool,
    },
}

impl TemplateNode {
    pub fn dir(name: impl Into<String>, children: Vec<TemplateNode>) -> Self {
        TemplateNode::Directory {
            name: name.into(),
            children,
        }
    }

    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        TemplateNode::File {
            name: name.into(),
            content: content.into().into_bytes(),
            is_binary: false,
        }
    }

    pub fn binary(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        TemplateNode::File {
            name: name.into(),
            content: content.into(),
            is_binary: true,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TemplateNode::Directory { name, .. } | TemplateNode::File { name, .. } => name,
        }
    }
}

/// An ordered file tree. Used both for the template input and the rendered
/// output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateTree {
    pub nodes: Vec<TemplateNode>,
}

impl TemplateTree {
    pub fn new(nodes: Vec<TemplateNode>) -> Self {
        Self { nodes }
    }

    /// Every file with its path relative to the tree root, depth-first.
    pub fn files(&self) -> Vec<(PathBuf, &TemplateNode)> {
        fn collect<'a>(
            nodes: &'a [TemplateNode],
            parent: &Path,
            out: &mut Vec<(PathBuf, &'a TemplateNode)>,
        ) {
            for node in nodes {
                let path = parent.join(node.name());
                match node {
                    TemplateNode::Directory { children, .. } => collect(children, &path, out),
                    TemplateNode::File { .. } => out.push((path, node)),
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.nodes, Path::new(""), &mut out);
        out
    }
}

/// Which parts of the input root become template nodes.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Globs over original relative paths that are left out entirely.
    pub exclude: Vec<String>,
    /// Globs over original relative paths that are copied without rendering.
    pub copy_without_render: Vec<String>,
    /// When set, only root entries whose name starts with this are loaded.
    pub root_prefix: Option<String>,
}

pub struct LoadedTree {
    pub tree: TemplateTree,
    /// `IOFailure` errors for entries that could not be read.
    pub diagnostics: Diagnostics,
}

/// Walk `root` in file-name order and build the template tree.
///
/// Unreadable entries are recorded and skipped; only a missing root or a bad
/// glob fails the whole load.
pub fn load_tree(root: &Path, options: &LoadOptions) -> Result<LoadedTree> {
    if !root.is_dir() {
        return Err(StampError::InputNotFound {
            path: root.to_path_buf(),
        });
    }

    let exclude = build_glob_set(&options.exclude)?;
    let copy = build_glob_set(&options.copy_without_render)?;
    let mut diagnostics = Diagnostics::default();

    // One frame per open directory; the bottom frame is the root.
    let mut stack = vec![Frame::default()];

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let Ok(rel) = entry.path().strip_prefix(root) else {
                return false;
            };
            if entry.depth() == 1 {
                if let Some(prefix) = &options.root_prefix {
                    if !entry.file_name().to_string_lossy().starts_with(prefix.as_str()) {
                        return false;
                    }
                }
            }
            !exclude.is_match(rel)
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let rel = e
                    .path()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                diagnostics.error(
                    ErrorKind::IoFailure {
                        message: e.to_string(),
                    },
                    Location::name(rel),
                );
                continue;
            }
        };

        close_frames(&mut stack, entry.depth());

        let rel = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = entry.file_name().to_string_lossy().into_owned();

        // A matching directory makes everything beneath it copy-only.
        let inherited = stack.last().is_some_and(|frame| frame.copy_only);
        let copy_only = inherited || copy.is_match(&rel);

        if entry.file_type().is_dir() {
            stack.push(Frame {
                name,
                children: Vec::new(),
                copy_only,
            });
            continue;
        }

        let content = match std::fs::read(entry.path()) {
            Ok(content) => content,
            Err(e) => {
                diagnostics.error(
                    ErrorKind::IoFailure {
                        message: format!("reading {}: {e}", rel.display()),
                    },
                    Location::name(rel),
                );
                continue;
            }
        };

        let is_binary = copy_only || is_binary_content(&content);
        if let Some(frame) = stack.last_mut() {
            frame.children.push(TemplateNode::File {
                name,
                content,
                is_binary,
            });
        }
    }

    close_frames(&mut stack, 1);
    let nodes = stack.pop().map(|frame| frame.children).unwrap_or_default();

    Ok(LoadedTree {
        tree: TemplateTree::new(nodes),
        diagnostics,
    })
}

#[derive(Default)]
struct Frame {
    name: String,
    children: Vec<TemplateNode>,
    copy_only: bool,
}

/// Pop directory frames until the top frame is the parent of an entry at
/// `depth`.
fn close_frames(stack: &mut Vec<Frame>, depth: usize) {
    while stack.len() > depth {
        let Some(Frame { name, children, .. }) = stack.pop() else {
            break;
        };
        if let Some(parent) = stack.last_mut() {
            parent
                .children
                .push(TemplateNode::Directory { name, children });
        }
    }
}

/// Detect binary content using content_inspector (BOM-aware, null-byte
/// scanning) over the first 8KB.
pub fn is_binary_content(content: &[u8]) -> bool {
    let head = &content[..content.len().min(8192)];
    content_inspector::inspect(head).is_binary()
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| StampError::GlobPattern {
            pattern: pattern.clone(),
            source: e,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| StampError::GlobPattern {
        pattern: "<combined>".into(),
        source: e,
    })
}
