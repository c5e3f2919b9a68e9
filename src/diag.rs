//! Declaration diagnostics.
//!
//! Diagnostics are attached to the declaration that produced them and are
//! append-only for the lifetime of that declaration: passes may add entries,
//! never remove or reorder them. A declaration carrying any `Error` entry is
//! not emittable.

use std::fmt::{Display, Formatter, Result};
use std::sync::Arc;

use crate::model::DeclId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Persistent diagnostic list.
///
/// Cloning shares the underlying storage, so untouched declarations carry
/// their diagnostics through a rewrite without copying them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Arc<[Diagnostic]>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }

    /// Returns a new list with `diagnostic` appended.
    pub fn pushed(&self, diagnostic: Diagnostic) -> Self {
        let mut items = Vec::with_capacity(self.0.len() + 1);
        items.extend(self.0.iter().cloned());
        items.push(diagnostic);
        Self(items.into())
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_error()).count()
    }

    pub fn contains(&self, severity: Severity, message: &str) -> bool {
        self.0
            .iter()
            .any(|d| d.severity == severity && d.message == message)
    }

    /// True when `self` starts with every entry of `earlier`, in order.
    pub fn extends(&self, earlier: &Diagnostics) -> bool {
        self.0.len() >= earlier.0.len() && self.0[..earlier.0.len()] == earlier.0[..]
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect::<Vec<_>>().into())
    }
}

/// A diagnostic together with the declaration it is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedDiagnostic {
    pub decl: DeclId,
    /// Qualified name of the declaration, `Outer::Inner` style.
    pub path: String,
    pub diagnostic: Diagnostic,
}

impl Display for AttachedDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.path.is_empty() {
            write!(f, "{}: <anonymous>: {}", self.diagnostic.severity, self.diagnostic.message)
        } else {
            write!(
                f,
                "{}: {}: {}",
                self.diagnostic.severity, self.path, self.diagnostic.message
            )
        }
    }
}

#[cfg(test)]
#[path = "tests/diag/t_diag.rs"]
mod tests;
