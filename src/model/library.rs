//! The library root: every declaration of one translation run.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::diag::AttachedDiagnostic;
use crate::model::decl::{Decl, DeclId, FileId};
use crate::model::types::{DeclRef, TypeRef};

#[derive(Debug, Clone)]
pub struct Library {
    files: Vec<PathBuf>,
    declarations: Vec<Decl>,
    broken_declarations: Vec<Decl>,
    next_id: u32,
    // DeclId -> child-index path from the root list.
    index: HashMap<DeclId, Vec<usize>>,
}

impl PartialEq for Library {
    fn eq(&self, other: &Self) -> bool {
        // The index is derived from `declarations`.
        self.files == other.files
            && self.declarations == other.declarations
            && self.broken_declarations == other.broken_declarations
            && self.next_id == other.next_id
    }
}

impl Library {
    pub fn new(files: Vec<PathBuf>, declarations: Vec<Decl>, next_id: u32) -> Self {
        let index = build_index(&declarations);
        Self {
            files,
            declarations,
            broken_declarations: Vec::new(),
            next_id,
            index,
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn file_path(&self, file: FileId) -> Option<&Path> {
        self.files.get(file.0 as usize).map(PathBuf::as_path)
    }

    pub fn declarations(&self) -> &[Decl] {
        &self.declarations
    }

    pub fn broken_declarations(&self) -> &[Decl] {
        &self.broken_declarations
    }

    /// First id not yet handed out for this library.
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn with_declarations(&self, declarations: Vec<Decl>) -> Self {
        let index = build_index(&declarations);
        Self {
            files: self.files.clone(),
            declarations,
            broken_declarations: self.broken_declarations.clone(),
            next_id: self.next_id,
            index,
        }
    }

    pub fn with_broken_declarations(self, broken_declarations: Vec<Decl>) -> Self {
        Self {
            broken_declarations,
            ..self
        }
    }

    pub fn with_next_id(self, next_id: u32) -> Self {
        Self {
            next_id: next_id.max(self.next_id),
            ..self
        }
    }

    // --- Lookup ---

    pub fn contains(&self, id: DeclId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn find(&self, id: DeclId) -> Option<&Decl> {
        let path = self.index.get(&id)?;
        let (first, rest) = path.split_first()?;
        let mut decl = self.declarations.get(*first)?;
        for &i in rest {
            decl = decl.children().get(i)?;
        }
        Some(decl)
    }

    pub fn parent_of(&self, id: DeclId) -> Option<&Decl> {
        let path = self.index.get(&id)?;
        let (first, rest) = path.split_first()?;
        let (_, between) = rest.split_last()?;
        let mut decl = self.declarations.get(*first)?;
        for &i in between {
            decl = decl.children().get(i)?;
        }
        Some(decl)
    }

    pub fn resolve(&self, decl_ref: &DeclRef) -> Option<&Decl> {
        self.find(decl_ref.id)
    }

    /// Follows typedef references until a non-typedef type is reached.
    ///
    /// Unresolvable references and typedef cycles stop the reduction at the
    /// last type reached.
    pub fn reduce_typedefs<'a>(&'a self, ty: &'a TypeRef) -> &'a TypeRef {
        let mut current = ty;
        let mut seen = HashSet::new();
        while let TypeRef::Decl(decl_ref) = current {
            if !seen.insert(decl_ref.id) {
                break;
            }
            let Some(typedef) = self.resolve(decl_ref).and_then(Decl::as_typedef) else {
                break;
            };
            current = &typedef.underlying_type;
        }
        current
    }

    /// Resolves `ty` through typedefs to the declaration it names, if any.
    pub fn resolve_through_typedefs<'a>(&'a self, ty: &'a TypeRef) -> Option<&'a Decl> {
        match self.reduce_typedefs(ty) {
            TypeRef::Decl(decl_ref) => self.resolve(decl_ref),
            _ => None,
        }
    }

    // --- Traversal ---

    /// Depth-first pre-order walk over every declaration in the tree.
    /// `f` receives the ancestor chain (root first) and the declaration.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&[&'a Decl], &'a Decl)) {
        let mut parents = Vec::new();
        for decl in &self.declarations {
            walk_decl(decl, &mut parents, f);
        }
    }

    pub fn decl_count(&self) -> usize {
        self.index.len()
    }

    pub fn error_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, decl| count += decl.diagnostics.error_count());
        count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Every diagnostic in the tree (and in the broken-declaration list),
    /// paired with the declaration it is attached to.
    pub fn diagnostics(&self) -> Vec<AttachedDiagnostic> {
        let mut out = Vec::new();
        let mut collect = |parents: &[&Decl], decl: &Decl| {
            if decl.diagnostics.is_empty() {
                return;
            }
            let path = qualified_name(parents, decl);
            out.extend(decl.diagnostics.iter().map(|diagnostic| AttachedDiagnostic {
                decl: decl.id,
                path: path.clone(),
                diagnostic: diagnostic.clone(),
            }));
        };
        self.walk(&mut collect);
        let mut parents = Vec::new();
        for decl in &self.broken_declarations {
            walk_decl(decl, &mut parents, &mut collect);
        }
        out
    }
}

/// `ns::Outer::Inner` for a declaration with the given ancestor chain.
pub fn qualified_name(parents: &[&Decl], decl: &Decl) -> String {
    let root = parents.first().copied().unwrap_or(decl);
    let mut parts = Vec::new();
    if let Some(namespace) = &root.namespace {
        parts.push(namespace.as_str());
    }
    parts.extend(
        parents
            .iter()
            .chain(std::iter::once(&decl))
            .map(|d| d.name.as_str())
            .filter(|name| !name.is_empty()),
    );
    parts.join("::")
}

fn walk_decl<'a>(
    decl: &'a Decl,
    parents: &mut Vec<&'a Decl>,
    f: &mut impl FnMut(&[&'a Decl], &'a Decl),
) {
    f(parents, decl);
    parents.push(decl);
    for child in decl.children() {
        walk_decl(child, parents, f);
    }
    parents.pop();
}

fn build_index(declarations: &[Decl]) -> HashMap<DeclId, Vec<usize>> {
    fn visit(decl: &Decl, path: &mut Vec<usize>, index: &mut HashMap<DeclId, Vec<usize>>) {
        index.entry(decl.id).or_insert_with(|| path.clone());
        for (i, child) in decl.children().iter().enumerate() {
            path.push(i);
            visit(child, path, index);
            path.pop();
        }
    }

    let mut index = HashMap::new();
    let mut path = Vec::new();
    for (i, decl) in declarations.iter().enumerate() {
        path.push(i);
        visit(decl, &mut path, &mut index);
        path.pop();
    }
    index
}

#[cfg(test)]
#[path = "../tests/model/t_library.rs"]
mod tests;
