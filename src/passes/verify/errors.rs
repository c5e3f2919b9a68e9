use thiserror::Error;

use crate::diag::Severity;
use crate::model::{Accessibility, ArgumentKind, CallingConvention, TypeRef};

/// Everything the verification pass can report about a declaration.
#[derive(Debug, Clone, Error)]
pub enum VerifyIssue {
    #[error("`{0}` accessibility is not valid at root scope; changed to internal")]
    InvalidRootAccessibility(Accessibility),

    #[error("`{0}` accessibility has no equivalent in the target scope; changed to internal")]
    ProtectedAccessibility(Accessibility),

    #[error(
        "enum `{0}` cannot be translated as an enum or as loose constants in this context; wrapped in a synthesized container"
    )]
    EnumWrapped(String),

    #[error("loose constants are not valid in this context; translated as a real enum instead")]
    LooseConstantsInvalidContext,

    #[error("`{0}` is not a valid enum underlying type; translated as loose constants instead")]
    InvalidEnumUnderlyingType(TypeRef),

    #[error("enum constants must be children of an enum")]
    EnumConstantOutsideEnum,

    #[error("functions must be members of a record or a loose-declarations container")]
    FunctionInvalidContext,

    #[error("virtual methods cannot capture the platform error code; the marker was ignored")]
    VirtualSetLastError,

    #[error("function is missing ABI information and cannot be called")]
    MissingAbi,

    #[error(
        "function uses the `{native}` calling convention (effective `{effective}`), which may not be handled correctly"
    )]
    NonDefaultCallingConvention {
        native: CallingConvention,
        effective: CallingConvention,
    },

    #[error("function uses unrecognized calling convention `{0}`")]
    UnrecognizedCallingConvention(String),

    #[error(
        "function passes arguments through an implicit stack allocation (inalloca), which may not be handled correctly"
    )]
    InAllocaArguments,

    #[error("function has extended parameter ABI information, which may not be handled correctly")]
    ExtParameterInfo,

    #[error("return value is passed via `{0}`, which may not be handled correctly")]
    ExpandedReturn(ArgumentKind),

    #[error("{0} is passed via `{1}`, which may not be handled correctly")]
    ExpandedArgument(String, ArgumentKind),

    #[error("parameters must be children of a function")]
    ParameterOutsideFunction,

    #[error("string default values are not supported; the default value was removed")]
    StringDefaultValue,

    #[error("parameters of type `{0}` cannot have a default value; the default value was removed")]
    IneligibleDefaultValue(TypeRef),

    #[error("record has {0} member(s) that could not be translated")]
    UnsupportedMembers(usize),

    #[error("record must have both a vtable and a vtable pointer field, or neither")]
    VTableFieldMismatch,

    #[error("designated {0} is not a member of this record")]
    DesignatedMemberMissing(&'static str),

    #[error("bitfield type `{0}` is not an integral, boolean, or integral-backed enum type")]
    InvalidBitFieldType(TypeRef),

    #[error("{0}s must be members of a record or a loose-declarations container")]
    FieldInvalidContext(&'static str),

    #[error("field has the same name as its enclosing type; renamed to `{0}`")]
    FieldRenamed(String),

    #[error("base field is not the designated non-virtual base of its record")]
    UndesignatedBaseField,

    #[error("vtable is not the designated vtable of its parent record")]
    UndesignatedVTable,

    #[error("`{0}` fields are not supported")]
    UnimplementedField(String),

    #[error("{0} declarations are not supported")]
    UnsupportedDeclaration(String),

    #[error("type reference `{0}` does not resolve to a declaration")]
    UnresolvedTypeRef(String),
}

impl VerifyIssue {
    pub fn severity(&self) -> Severity {
        match self {
            VerifyIssue::EnumConstantOutsideEnum
            | VerifyIssue::FunctionInvalidContext
            | VerifyIssue::MissingAbi
            | VerifyIssue::ParameterOutsideFunction
            | VerifyIssue::VTableFieldMismatch
            | VerifyIssue::DesignatedMemberMissing(_)
            | VerifyIssue::InvalidBitFieldType(_)
            | VerifyIssue::FieldInvalidContext(_)
            | VerifyIssue::UndesignatedBaseField
            | VerifyIssue::UndesignatedVTable
            | VerifyIssue::UnsupportedDeclaration(_)
            | VerifyIssue::UnresolvedTypeRef(_) => Severity::Error,
            VerifyIssue::InvalidRootAccessibility(_)
            | VerifyIssue::ProtectedAccessibility(_)
            | VerifyIssue::EnumWrapped(_)
            | VerifyIssue::LooseConstantsInvalidContext
            | VerifyIssue::InvalidEnumUnderlyingType(_)
            | VerifyIssue::VirtualSetLastError
            | VerifyIssue::NonDefaultCallingConvention { .. }
            | VerifyIssue::UnrecognizedCallingConvention(_)
            | VerifyIssue::InAllocaArguments
            | VerifyIssue::ExtParameterInfo
            | VerifyIssue::ExpandedReturn(_)
            | VerifyIssue::ExpandedArgument(..)
            | VerifyIssue::StringDefaultValue
            | VerifyIssue::IneligibleDefaultValue(_)
            | VerifyIssue::UnsupportedMembers(_)
            | VerifyIssue::FieldRenamed(_)
            | VerifyIssue::UnimplementedField(_) => Severity::Warning,
        }
    }
}
