//! Type representability predicates. Every predicate looks through typedef
//! chains before classifying a type.

use crate::model::{BuiltinType, DeclKind, Library, SynthesizedKind, TypeRef};

pub(super) fn is_valid_enum_underlying_type(library: &Library, ty: &TypeRef) -> bool {
    matches!(
        library.reduce_typedefs(ty),
        TypeRef::Builtin(builtin) if builtin.is_valid_enum_underlying()
    )
}

/// Bitfields need an integral builtin, a boolean, or an enum backed by an
/// integral builtin.
pub(super) fn is_valid_bitfield_type(library: &Library, ty: &TypeRef) -> bool {
    match library.reduce_typedefs(ty) {
        TypeRef::Builtin(builtin) => builtin.is_integral() || *builtin == BuiltinType::Bool,
        TypeRef::Decl(decl_ref) => match library.resolve(decl_ref).map(|decl| &decl.kind) {
            Some(DeclKind::Enum(enum_decl)) => matches!(
                library.reduce_typedefs(&enum_decl.underlying_type),
                TypeRef::Builtin(builtin) if builtin.is_integral()
            ),
            _ => false,
        },
        TypeRef::Void | TypeRef::Pointer(_) | TypeRef::FunctionPointer(_) | TypeRef::Native(_) => {
            false
        }
    }
}

/// Whether a parameter of this type may carry a constant default value.
pub(super) fn can_have_default_value(library: &Library, ty: &TypeRef) -> bool {
    match library.reduce_typedefs(ty) {
        TypeRef::Pointer(_) | TypeRef::Builtin(_) | TypeRef::FunctionPointer(_) => true,
        TypeRef::Decl(decl_ref) => match library.resolve(decl_ref).map(|decl| &decl.kind) {
            Some(DeclKind::Enum(_)) => true,
            Some(DeclKind::Synthesized(synthesized)) => matches!(
                synthesized.kind,
                SynthesizedKind::NativeBoolean | SynthesizedKind::NativeChar
            ),
            _ => false,
        },
        TypeRef::Void | TypeRef::Native(_) => false,
    }
}
