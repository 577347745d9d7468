//! Non-fatal parse and resolution diagnostics.

use std::fmt;

use thiserror::Error;

use crate::decl::SourceLocation;

/// What went wrong with a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    #[error("missing required attribute '{0}'")]
    MissingAttribute(String),

    #[error("invalid value '{value}' for attribute '{name}'")]
    InvalidAttribute { name: String, value: String },

    #[error("unknown region kind '{0}'")]
    UnknownRegionKind(String),

    #[error("region id '{0}' is already defined")]
    DuplicateRegionId(String),

    #[error("reference to undefined region '{0}'")]
    UnknownRegionReference(String),

    #[error("cyclic region reference: {}", .0.join(" -> "))]
    CyclicRegionReference(Vec<String>),

    #[error("'{tag}' expects {expected} child region(s), found {found}")]
    WrongChildCount {
        tag: String,
        expected: usize,
        found: usize,
    },

    #[error("'{0}' has no child regions and will never contain a point")]
    EmptyComposite(String),

    #[error("region '{0}' nests composites too deeply")]
    RegionTooDeep(String),
}

impl DiagnosticKind {
    pub(crate) fn missing(name: &str) -> Self {
        Self::MissingAttribute(name.to_string())
    }

    pub(crate) fn invalid(name: &str, value: &str) -> Self {
        Self::InvalidAttribute {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Severity this kind is reported with.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::EmptyComposite(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A recorded problem plus where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    #[must_use]
    pub const fn new(kind: DiagnosticKind, location: SourceLocation) -> Self {
        Self {
            kind,
            location: Some(location),
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{} at {}: {}", self.severity(), loc, self.kind),
            None => write!(f, "{}: {}", self.severity(), self.kind),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Ordered accumulator for diagnostics raised during a map load.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn report(&mut self, kind: DiagnosticKind, location: SourceLocation) {
        self.push(Diagnostic::new(kind, location));
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity() == Severity::Error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
