//! Boundary between the declaration model and a code generator.
//!
//! `emit_library` is the only way a backend sees declarations: nodes carrying
//! an Error are skipped together with their subtree, and the diagnostics of
//! everything that is emitted are forwarded so they can be surfaced next to
//! the generated code.

use tracing::debug;

use crate::diag::{AttachedDiagnostic, Severity};
use crate::model::{Decl, Library, qualified_name};

/// Callback interface driven by `emit_library`.
pub trait Backend {
    /// Called once per emittable declaration, parents before children.
    fn emit(&mut self, parents: &[&Decl], decl: &Decl);

    /// Receives the Warning and Info diagnostics of emitted declarations.
    fn report(&mut self, _diagnostic: &AttachedDiagnostic) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitSummary {
    pub emitted: usize,
    /// Declarations withheld from the backend, including every descendant
    /// of a declaration carrying an Error.
    pub skipped: usize,
    pub reported: usize,
}

pub fn emit_library(library: &Library, backend: &mut dyn Backend) -> EmitSummary {
    let mut summary = EmitSummary::default();
    let mut parents = Vec::new();
    for decl in library.declarations() {
        emit_decl(decl, &mut parents, backend, &mut summary);
    }
    debug!(
        emitted = summary.emitted,
        skipped = summary.skipped,
        reported = summary.reported,
        "emission complete"
    );
    summary
}

fn emit_decl<'a>(
    decl: &'a Decl,
    parents: &mut Vec<&'a Decl>,
    backend: &mut dyn Backend,
    summary: &mut EmitSummary,
) {
    if !decl.is_emittable() {
        let skipped = subtree_size(decl);
        debug!(decl = %decl.name, id = %decl.id, skipped, "skipping declaration with errors");
        summary.skipped += skipped;
        return;
    }

    backend.emit(parents, decl);
    summary.emitted += 1;

    let reportable = decl
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity != Severity::Error);
    for diagnostic in reportable {
        backend.report(&AttachedDiagnostic {
            decl: decl.id,
            path: qualified_name(parents, decl),
            diagnostic: diagnostic.clone(),
        });
        summary.reported += 1;
    }

    parents.push(decl);
    for child in decl.children() {
        emit_decl(child, parents, backend, summary);
    }
    parents.pop();
}

fn subtree_size(decl: &Decl) -> usize {
    1 + decl.children().iter().map(subtree_size).sum::<usize>()
}
