use std::cell::RefCell;

use crate::model::{Decl, DeclId, DeclIdGen, DeclKind, Library, SynthesizedKind};

/// Where a declaration sits while a pass is looking at it.
///
/// Ancestors are the *original* declarations of the input library, so a
/// child-level rule sees its parent's kind before the parent's own rule has
/// had a chance to rewrite it.
#[derive(Clone)]
pub struct TransformContext<'a> {
    library: &'a Library,
    parents: Vec<&'a Decl>,
    ids: &'a RefCell<DeclIdGen>,
}

impl<'a> TransformContext<'a> {
    pub(crate) fn root(library: &'a Library, ids: &'a RefCell<DeclIdGen>) -> Self {
        Self {
            library,
            parents: Vec::new(),
            ids,
        }
    }

    pub(crate) fn child(&self, parent: &'a Decl) -> Self {
        let mut parents = Vec::with_capacity(self.parents.len() + 1);
        parents.extend_from_slice(&self.parents);
        parents.push(parent);
        Self {
            library: self.library,
            parents,
            ids: self.ids,
        }
    }

    /// Read-only snapshot of the library the pass started from.
    pub fn library(&self) -> &'a Library {
        self.library
    }

    /// Ancestor chain, root first, excluding the current declaration.
    pub fn parents(&self) -> &[&'a Decl] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&'a Decl> {
        self.parents.last().copied()
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Allocates an id for a synthesized declaration.
    pub fn new_id(&self) -> DeclId {
        self.ids.borrow_mut().new_id()
    }

    /// True when the nearest enclosing declaration can host loose fields and
    /// methods: a record, or a synthesized loose-declarations container.
    pub fn is_valid_field_or_method_context(&self) -> bool {
        match self.parent().map(|parent| &parent.kind) {
            Some(DeclKind::Record(_)) => true,
            Some(DeclKind::Synthesized(synthesized)) => {
                synthesized.kind == SynthesizedKind::LooseDeclarations
            }
            _ => false,
        }
    }
}
