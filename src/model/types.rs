//! Type references carried by declarations.

use std::fmt;

use crate::model::DeclId;
use crate::model::abi::CallingConvention;

/// Scalar types the target language provides natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    /// Pointer-sized signed integer.
    NInt,
    /// Pointer-sized unsigned integer.
    NUInt,
    /// UTF-16 code unit.
    Char16,
    F32,
    F64,
}

impl BuiltinType {
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            BuiltinType::I8
                | BuiltinType::U8
                | BuiltinType::I16
                | BuiltinType::U16
                | BuiltinType::I32
                | BuiltinType::U32
                | BuiltinType::I64
                | BuiltinType::U64
                | BuiltinType::NInt
                | BuiltinType::NUInt
        )
    }

    /// Underlying types a real (non-loose) enum may use.
    pub fn is_valid_enum_underlying(self) -> bool {
        matches!(
            self,
            BuiltinType::I8
                | BuiltinType::U8
                | BuiltinType::I16
                | BuiltinType::U16
                | BuiltinType::I32
                | BuiltinType::U32
                | BuiltinType::I64
                | BuiltinType::U64
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Bool => "bool",
            BuiltinType::I8 => "i8",
            BuiltinType::U8 => "u8",
            BuiltinType::I16 => "i16",
            BuiltinType::U16 => "u16",
            BuiltinType::I32 => "i32",
            BuiltinType::U32 => "u32",
            BuiltinType::I64 => "i64",
            BuiltinType::U64 => "u64",
            BuiltinType::NInt => "nint",
            BuiltinType::NUInt => "nuint",
            BuiltinType::Char16 => "char16",
            BuiltinType::F32 => "f32",
            BuiltinType::F64 => "f64",
        }
    }
}

/// Handle to another declaration, with the name it had when the reference
/// was created (kept for diagnostics when the handle no longer resolves).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclRef {
    pub id: DeclId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionPointerType {
    pub return_type: TypeRef,
    pub parameter_types: Vec<TypeRef>,
    pub calling_convention: CallingConvention,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Void,
    Builtin(BuiltinType),
    Pointer(Box<TypeRef>),
    FunctionPointer(Box<FunctionPointerType>),
    Decl(DeclRef),
    /// A front-end type that has not been reduced to one of the forms above.
    Native(String),
}

impl TypeRef {
    pub fn decl(id: DeclId, name: impl Into<String>) -> Self {
        TypeRef::Decl(DeclRef {
            id,
            name: name.into(),
        })
    }

    pub fn pointer_to(inner: TypeRef) -> Self {
        TypeRef::Pointer(Box::new(inner))
    }

    /// Calls `f` on every declaration reference reachable from this type.
    pub fn for_each_decl_ref(&self, f: &mut impl FnMut(&DeclRef)) {
        match self {
            TypeRef::Decl(decl_ref) => f(decl_ref),
            TypeRef::Pointer(inner) => inner.for_each_decl_ref(f),
            TypeRef::FunctionPointer(fn_ptr) => {
                fn_ptr.return_type.for_each_decl_ref(f);
                for param in &fn_ptr.parameter_types {
                    param.for_each_decl_ref(f);
                }
            }
            TypeRef::Void | TypeRef::Builtin(_) | TypeRef::Native(_) => {}
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Builtin(builtin) => write!(f, "{}", builtin.name()),
            TypeRef::Pointer(inner) => write!(f, "*{inner}"),
            TypeRef::FunctionPointer(fn_ptr) => {
                write!(f, "fn {}(", fn_ptr.calling_convention)?;
                for (i, param) in fn_ptr.parameter_types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {}", fn_ptr.return_type)
            }
            TypeRef::Decl(decl_ref) => write!(f, "{}#{}", decl_ref.name, decl_ref.id),
            TypeRef::Native(spelling) => write!(f, "native `{spelling}`"),
        }
    }
}
