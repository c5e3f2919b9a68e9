//! Moves declarations carrying Errors out of the tree.
//!
//! An erroneous declaration leaves together with its whole subtree; nested
//! erroneous declarations travel with their outermost erroneous ancestor.

use std::mem;

use tracing::debug;

use crate::model::{Decl, Library};
use crate::passes::VerifyIssue;
use crate::transform::{TransformContext, TransformResult, Transformation};

#[derive(Debug, Default)]
pub struct ExtractBrokenDeclarations {
    extracted: Vec<Decl>,
}

impl ExtractBrokenDeclarations {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformation for ExtractBrokenDeclarations {
    fn name(&self) -> &'static str {
        "extract-broken-declarations"
    }

    fn pre_transform_library(&mut self, _library: &Library) {
        self.extracted.clear();
    }

    fn post_transform_library(&mut self, library: Library) -> Library {
        if self.extracted.is_empty() {
            return library;
        }
        debug!(count = self.extracted.len(), "extracted broken declarations");
        let mut broken = library.broken_declarations().to_vec();
        broken.append(&mut mem::take(&mut self.extracted));
        library.with_broken_declarations(broken)
    }

    fn transform_declaration(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
    ) -> TransformResult {
        let checked = unpaired_vtable(decl);
        let current = checked.as_ref().unwrap_or(decl);
        if !current.has_errors() || ctx.parents().iter().any(|parent| parent.has_errors()) {
            return match checked {
                Some(checked) => TransformResult::Replace(checked),
                None => TransformResult::Unchanged,
            };
        }
        self.extracted.push(current.clone());
        TransformResult::delete()
    }
}

/// A record whose vtable or vtable pointer field was extracted loses the
/// pairing the backend relies on, so it is broken as well.
fn unpaired_vtable(decl: &Decl) -> Option<Decl> {
    let record = decl.as_record()?;
    if record.vtable.is_some() == record.vtable_field.is_some() {
        return None;
    }
    let issue = VerifyIssue::VTableFieldMismatch;
    Some(decl.ensure_diagnostic(issue.severity(), issue.to_string()))
}

#[cfg(test)]
#[path = "../tests/passes/t_broken.rs"]
mod tests;
