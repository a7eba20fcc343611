use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StampError};
use crate::render::{Diagnostics, ErrorKind, Location, RenderResult};
use crate::template::TemplateNode;

pub struct CommitReport {
    /// The output path now holds the rendered tree.
    pub committed: bool,
    /// Files written, relative to the output root.
    pub files_written: Vec<PathBuf>,
    /// `IOFailure` errors from writing the staging copy.
    pub diagnostics: Diagnostics,
}

/// Any existing output path, even an empty directory, needs `overwrite`.
pub fn ensure_output_available(output: &Path, overwrite: bool) -> Result<()> {
    if output.exists() && !overwrite {
        return Err(StampError::OutputExists {
            path: output.to_path_buf(),
        });
    }
    Ok(())
}

/// Write a rendered tree to `output`, all or nothing.
///
/// Nothing is written for an invalid result. Otherwise the tree goes into a
/// staging directory beside `output`, which is renamed into place only when
/// every write succeeded.
pub fn commit(result: &RenderResult, output: &Path, overwrite: bool) -> Result<CommitReport> {
    ensure_output_available(output, overwrite)?;

    if !result.is_valid() {
        return Ok(CommitReport {
            committed: false,
            files_written: Vec::new(),
            diagnostics: Diagnostics::default(),
        });
    }

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| StampError::Io {
        context: format!("creating directory {}", parent.display()),
        source: e,
    })?;

    let staging = tempfile::Builder::new()
        .prefix(".stamp-staging-")
        .tempdir_in(&parent)
        .map_err(|e| StampError::Io {
            context: format!("creating staging directory in {}", parent.display()),
            source: e,
        })?;

    let mut diagnostics = Diagnostics::default();
    let mut files_written = Vec::new();
    write_nodes(
        &result.tree.nodes,
        staging.path(),
        Path::new(""),
        &mut files_written,
        &mut diagnostics,
    );

    if diagnostics.has_errors() {
        return Ok(CommitReport {
            committed: false,
            files_written,
            diagnostics,
        });
    }

    replace_output(staging.path(), output, &parent)?;

    Ok(CommitReport {
        committed: true,
        files_written,
        diagnostics,
    })
}

fn write_nodes(
    nodes: &[TemplateNode],
    root: &Path,
    parent: &Path,
    written: &mut Vec<PathBuf>,
    diags: &mut Diagnostics,
) {
    for node in nodes {
        let rel = parent.join(node.name());
        let dest = root.join(&rel);
        match node {
            TemplateNode::Directory { children, .. } => {
                if let Err(e) = fs::create_dir(&dest) {
                    diags.error(
                        ErrorKind::IoFailure {
                            message: format!("creating directory {}: {e}", rel.display()),
                        },
                        Location::name(rel),
                    );
                    continue;
                }
                write_nodes(children, root, &rel, written, diags);
            }
            TemplateNode::File { content, .. } => match fs::write(&dest, content) {
                Ok(()) => written.push(rel),
                Err(e) => diags.error(
                    ErrorKind::IoFailure {
                        message: format!("writing {}: {e}", rel.display()),
                    },
                    Location::name(rel),
                ),
            },
        }
    }
}

fn replace_output(staged: &Path, output: &Path, parent: &Path) -> Result<()> {
    let rename_err = |e: std::io::Error| StampError::Io {
        context: format!("moving rendered tree to {}", output.display()),
        source: e,
    };

    if !output.exists() {
        return fs::rename(staged, output).map_err(rename_err);
    }

    // Move the old output aside so a failed rename can be undone; the aside
    // copy is deleted with `previous`.
    let previous = tempfile::Builder::new()
        .prefix(".stamp-previous-")
        .tempdir_in(parent)
        .map_err(|e| StampError::Io {
            context: format!("creating backup directory in {}", parent.display()),
            source: e,
        })?;
    let aside = previous.path().join("output");
    fs::rename(output, &aside).map_err(|e| StampError::Io {
        context: format!("moving {} aside", output.display()),
        source: e,
    })?;

    if let Err(e) = fs::rename(staged, output) {
        if let Err(restore) = fs::rename(&aside, output) {
            // Keep the backup on disk; dropping `previous` would delete it.
            let backup = previous.keep().join("output");
            return Err(StampError::Io {
                context: format!(
                    "moving rendered tree to {} failed ({e}) and the previous contents \
                     could not be restored; they are kept at {}",
                    output.display(),
                    backup.display()
                ),
                source: restore,
            });
        }
        return Err(rename_err(e));
    }
    Ok(())
}
