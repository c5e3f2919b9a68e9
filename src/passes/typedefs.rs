//! Typedef elimination: every reference to a typedef is replaced by the type
//! the typedef chain finally names, then the typedefs themselves are dropped.

use tracing::debug;

use crate::model::{Decl, Library, TypeRef, Typedef};
use crate::transform::{TransformContext, TransformResult, Transformation, walk_type_ref};

#[derive(Debug, Default)]
pub struct StripTypedefs {
    rewritten: usize,
    removed: usize,
}

impl StripTypedefs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformation for StripTypedefs {
    fn name(&self) -> &'static str {
        "strip-typedefs"
    }

    fn pre_transform_library(&mut self, _library: &Library) {
        self.rewritten = 0;
        self.removed = 0;
    }

    fn post_transform_library(&mut self, library: Library) -> Library {
        debug!(
            rewritten = self.rewritten,
            removed = self.removed,
            "typedefs stripped"
        );
        library
    }

    fn transform_type_ref(&mut self, ctx: &TransformContext<'_>, ty: &TypeRef) -> TypeRef {
        let TypeRef::Decl(_) = ty else {
            return walk_type_ref(self, ctx, ty);
        };
        let reduced = ctx.library().reduce_typedefs(ty);
        // A cyclic chain reduces to one of its own members.
        if reduced == ty {
            return ty.clone();
        }
        self.rewritten += 1;
        let reduced = reduced.clone();
        self.transform_type_ref(ctx, &reduced)
    }

    fn transform_typedef(
        &mut self,
        _ctx: &TransformContext<'_>,
        _decl: &Decl,
        _typedef: &Typedef,
    ) -> TransformResult {
        self.removed += 1;
        TransformResult::delete()
    }
}

#[cfg(test)]
#[path = "../tests/passes/t_typedefs.rs"]
mod tests;
