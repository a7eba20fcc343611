use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Where a diagnostic was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A derivation rule, by position in the rule list.
    Derivation { rule: usize, target: String },
    /// The name of a file or directory, by original relative path. The offset
    /// points into the unrendered name when a placeholder caused it.
    Name {
        path: PathBuf,
        offset: Option<usize>,
    },
    /// A byte offset inside a file's content.
    Content { path: PathBuf, offset: usize },
}

impl Location {
    pub fn name(path: impl Into<PathBuf>) -> Self {
        Location::Name {
            path: path.into(),
            offset: None,
        }
    }

    pub fn content(path: impl Into<PathBuf>, offset: usize) -> Self {
        Location::Content {
            path: path.into(),
            offset,
        }
    }

    /// The original relative path, if the location is inside the tree.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Location::Derivation { .. } => None,
            Location::Name { path, .. } | Location::Content { path, .. } => Some(path),
        }
    }

    /// Shift a location produced for a sub-string (a name or a text slice) so
    /// that offsets are relative to the start of the owning text.
    pub(crate) fn with_offset(&self, offset: usize) -> Self {
        match self {
            Location::Content { path, offset: base } => Location::Content {
                path: path.clone(),
                offset: base + offset,
            },
            Location::Name { path, offset: base } => Location::Name {
                path: path.clone(),
                offset: Some(base.unwrap_or(0) + offset),
            },
            other => other.clone(),
        }
    }

    /// Derivation diagnostics sort before anything in the tree; tree
    /// diagnostics sort by original path only, so a stable sort keeps
    /// per-file emission order.
    pub(crate) fn sort_cmp(&self, other: &Location) -> Ordering {
        match (self.path(), other.path()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Derivation { rule, target } => {
                write!(f, "derive rule #{} (target '{target}')", rule + 1)
            }
            Location::Name { path, offset: None } => write!(f, "{} (name)", path.display()),
            Location::Name {
                path,
                offset: Some(offset),
            } => write!(f, "{}:{offset} (name)", path.display()),
            Location::Content { path, offset } => write!(f, "{}:{offset}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarningKind {
    #[error("unterminated placeholder, left as-is")]
    MalformedPlaceholder,
}

/// A non-fatal problem. Warnings never change the exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWarning {
    pub kind: WarningKind,
    pub location: Location,
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String },

    #[error("unknown filter '{name}'")]
    UnknownFilter { name: String },

    #[error("invalid arguments for filter '{name}': {reason}")]
    InvalidFilterArguments { name: String, reason: String },

    #[error("invalid expression '{expr}'")]
    InvalidExpression { expr: String },

    #[error("'{}' and '{}' both render to '{}'", first.display(), second.display(), name)]
    NameCollision {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("'{name}' is not a valid file name")]
    InvalidName { name: String },

    #[error("{message}")]
    IoFailure { message: String },
}

/// A fatal problem. The pass still completes, but the result is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub kind: ErrorKind,
    pub location: Location,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.kind)
    }
}

/// Accumulates diagnostics during a pass.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub warnings: Vec<RenderWarning>,
    pub errors: Vec<RenderError>,
}

impl Diagnostics {
    pub fn warn(&mut self, kind: WarningKind, location: Location) {
        self.warnings.push(RenderWarning { kind, location });
    }

    pub fn error(&mut self, kind: ErrorKind, location: Location) {
        self.errors.push(RenderError { kind, location });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Stable sort by original path.
    pub fn sort(&mut self) {
        self.warnings.sort_by(|a, b| a.location.sort_cmp(&b.location));
        self.errors.sort_by(|a, b| a.location.sort_cmp(&b.location));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        assert_eq!(Location::content("a/b.txt", 12).to_string(), "a/b.txt:12");
        assert_eq!(Location::name("a/{{x}}").to_string(), "a/{{x}} (name)");
        let derive = Location::Derivation {
            rule: 0,
            target: "slug".into(),
        };
        assert_eq!(derive.to_string(), "derive rule #1 (target 'slug')");
    }

    #[test]
    fn test_with_offset() {
        let loc = Location::content("f", 10).with_offset(5);
        assert_eq!(loc, Location::content("f", 15));

        let name = Location::name("{{a}}-{{b}}").with_offset(6);
        assert_eq!(
            name,
            Location::Name {
                path: "{{a}}-{{b}}".into(),
                offset: Some(6)
            }
        );
        assert_eq!(name.to_string(), "{{a}}-{{b}}:6 (name)");

        let derive = Location::Derivation {
            rule: 0,
            target: "t".into(),
        };
        assert_eq!(derive.with_offset(3), derive);
    }

    #[test]
    fn test_sort_is_stable_by_path() {
        let mut diags = Diagnostics::default();
        let undefined = |n: &str| ErrorKind::UndefinedVariable { name: n.into() };
        diags.error(undefined("b1"), Location::content("b", 1));
        diags.error(undefined("a"), Location::content("a", 9));
        diags.error(undefined("b2"), Location::content("b", 0));
        diags.error(
            undefined("src"),
            Location::Derivation {
                rule: 2,
                target: "t".into(),
            },
        );
        diags.sort();

        let names: Vec<_> = diags
            .errors
            .iter()
            .map(|e| match &e.kind {
                ErrorKind::UndefinedVariable { name } => name.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["src", "a", "b1", "b2"]);
    }
}
