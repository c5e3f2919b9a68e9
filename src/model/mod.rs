//! Declaration model: immutable declaration nodes and the library root.

pub mod abi;
pub mod builder;
pub mod decl;
pub mod format;
pub mod library;
pub mod metadata;
pub mod types;

pub use abi::{AbiFlags, ArgumentKind, AstCallingConvention, CallingConvention, FunctionAbi};
pub use decl::{
    Accessibility, ConstantValue, Decl, DeclId, DeclIdGen, DeclKind, Enum, EnumConstant, Field,
    FieldKind, FileId, Function, Parameter, Record, StaticField, Synthesized, SynthesizedKind,
    Typedef, Unsupported, VTable, VTableEntry, VTableEntryKind,
};
pub use library::{Library, qualified_name};
pub use metadata::{Metadata, MetadataItem, MetadataKind};
pub use types::{BuiltinType, DeclRef, FunctionPointerType, TypeRef};

#[cfg(test)]
#[path = "../tests/model/t_decl.rs"]
mod tests;
