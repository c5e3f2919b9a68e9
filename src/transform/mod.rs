//! Generic, context-aware rewriting of declaration trees.
//!
//! Implement the `transform_*` hooks you care about; every hook you leave
//! alone keeps its node unchanged while the engine still recurses into the
//! node's children. Children are rewritten first, so a hook always sees the
//! already-rewritten children of the node it is given.
//!
//! Example:
//! ```rust
//! use interop_model::model::{Decl, Field, Library};
//! use interop_model::transform::{Transformation, TransformContext, TransformResult};
//! use interop_model::transform::transform_library;
//!
//! struct DropUnimplementedFields;
//!
//! impl Transformation for DropUnimplementedFields {
//!     fn transform_unimplemented_field(
//!         &mut self,
//!         _ctx: &TransformContext<'_>,
//!         _decl: &Decl,
//!         _field: &Field,
//!     ) -> TransformResult {
//!         TransformResult::delete()
//!     }
//! }
//!
//! # fn run(library: &Library) -> Library {
//! transform_library(&mut DropUnimplementedFields, library)
//! # }
//! ```

mod context;
mod walk;

pub use context::TransformContext;
pub use walk::{
    dispatch_declaration, dispatch_field, transform_library, transform_recursively,
    walk_declaration, walk_type_ref,
};

use crate::model::{
    Decl, Enum, EnumConstant, Field, Function, Library, Parameter, Record, StaticField,
    Synthesized, TypeRef, Typedef, Unsupported, VTable,
};

/// Outcome of a hook for one declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformResult {
    /// Keep the declaration as given to the hook.
    Unchanged,
    /// Substitute one declaration, possibly of a different kind.
    Replace(Decl),
    /// Substitute zero or more siblings at this position. Zero deletes.
    ReplaceMany(Vec<Decl>),
}

impl TransformResult {
    pub fn delete() -> Self {
        TransformResult::ReplaceMany(Vec::new())
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, TransformResult::Unchanged)
    }

    /// `Replace(updated)` when `updated` differs from `original`, otherwise
    /// `Unchanged`.
    pub fn from_update(original: &Decl, updated: Decl) -> Self {
        if &updated == original {
            TransformResult::Unchanged
        } else {
            TransformResult::Replace(updated)
        }
    }

    pub(crate) fn into_decls(self, original: Decl) -> Vec<Decl> {
        match self {
            TransformResult::Unchanged => vec![original],
            TransformResult::Replace(decl) => vec![decl],
            TransformResult::ReplaceMany(decls) => decls,
        }
    }
}

impl From<Decl> for TransformResult {
    fn from(decl: Decl) -> Self {
        TransformResult::Replace(decl)
    }
}

impl From<Vec<Decl>> for TransformResult {
    fn from(decls: Vec<Decl>) -> Self {
        TransformResult::ReplaceMany(decls)
    }
}

/// A rewrite policy applied by `transform_library`.
///
/// A run has two phases: the per-declaration phase (`transform_*` hooks,
/// bottom-up over the whole tree) followed by the whole-library phase
/// (`post_transform_library`), which receives the complete output of the
/// first phase.
pub trait Transformation {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    // --- Library phases ---

    fn pre_transform_library(&mut self, _library: &Library) {}

    fn post_transform_library(&mut self, library: Library) -> Library {
        library
    }

    // --- Declarations ---

    /// Entry point for every declaration. Override to apply rules common to
    /// all kinds, then call `dispatch_declaration` for the per-kind hooks.
    fn transform_declaration(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
    ) -> TransformResult {
        dispatch_declaration(self, ctx, decl)
    }

    fn transform_record(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _record: &Record,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_enum(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _enum_decl: &Enum,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_enum_constant(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _constant: &EnumConstant,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_function(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _function: &Function,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_parameter(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _parameter: &Parameter,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    /// Common entry for every field kind; dispatches to the per-field hooks.
    fn transform_field(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
        field: &Field,
    ) -> TransformResult {
        dispatch_field(self, ctx, decl, field)
    }

    fn transform_normal_field(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _field: &Field,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_base_field(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _field: &Field,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_vtable_field(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _field: &Field,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_bitfield(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _field: &Field,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_unimplemented_field(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _field: &Field,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_static_field(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _static_field: &StaticField,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_vtable(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _vtable: &VTable,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_typedef(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _typedef: &Typedef,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_undefined_record(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_unsupported(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _unsupported: &Unsupported,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    fn transform_synthesized(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _synthesized: &Synthesized,
    ) -> TransformResult {
        TransformResult::Unchanged
    }

    // --- Types ---

    /// Applied to every type slot of a declaration before the declaration's
    /// own hook runs. The default only recurses.
    fn transform_type_ref(&mut self, ctx: &TransformContext<'_>, ty: &TypeRef) -> TypeRef {
        walk_type_ref(self, ctx, ty)
    }
}

#[cfg(test)]
#[path = "../tests/transform/t_transform.rs"]
mod tests;
