//! ABI arrangement computed by the front end for each function.

use std::fmt;

use serde::Deserialize;

/// Low-level calling conventions the front end can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum CallingConvention {
    C,
    StdCall,
    FastCall,
    ThisCall,
    VectorCall,
    Win64,
    SysV64,
    Swift,
    PreserveMost,
    PreserveAll,
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallingConvention::C => "cdecl",
            CallingConvention::StdCall => "stdcall",
            CallingConvention::FastCall => "fastcall",
            CallingConvention::ThisCall => "thiscall",
            CallingConvention::VectorCall => "vectorcall",
            CallingConvention::Win64 => "win64",
            CallingConvention::SysV64 => "sysv64",
            CallingConvention::Swift => "swiftcall",
            CallingConvention::PreserveMost => "preserve_most",
            CallingConvention::PreserveAll => "preserve_all",
        };
        write!(f, "{name}")
    }
}

/// Calling convention as written on the declaration in source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AstCallingConvention {
    Known(CallingConvention),
    /// A convention the front end could not map onto `CallingConvention`.
    Unrecognized(String),
}

/// How a single argument or return value is physically passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    Direct,
    Extend,
    Indirect,
    IndirectAliased,
    Ignore,
    Expand,
    CoerceAndExpand,
    InAlloca,
}

impl ArgumentKind {
    /// Aggregates split across several registers/slots.
    pub fn is_expanded(self) -> bool {
        matches!(self, ArgumentKind::Expand | ArgumentKind::CoerceAndExpand)
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgumentKind::Direct => "Direct",
            ArgumentKind::Extend => "Extend",
            ArgumentKind::Indirect => "Indirect",
            ArgumentKind::IndirectAliased => "IndirectAliased",
            ArgumentKind::Ignore => "Ignore",
            ArgumentKind::Expand => "Expand",
            ArgumentKind::CoerceAndExpand => "CoerceAndExpand",
            ArgumentKind::InAlloca => "InAlloca",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AbiFlags {
    /// Arguments are passed through an implicit stack allocation (inalloca).
    pub uses_in_alloca: bool,
    /// Per-parameter ABI details exist beyond the argument classification.
    pub has_ext_parameter_infos: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionAbi {
    pub calling_convention: CallingConvention,
    pub effective_calling_convention: CallingConvention,
    pub ast_calling_convention: AstCallingConvention,
    pub return_kind: ArgumentKind,
    /// One entry per physical argument. For instance methods, entry 0 is the
    /// implicit receiver.
    pub arguments: Vec<ArgumentKind>,
    pub flags: AbiFlags,
}

impl FunctionAbi {
    /// A plain C arrangement with every argument passed directly.
    pub fn direct(argument_count: usize) -> Self {
        Self {
            calling_convention: CallingConvention::C,
            effective_calling_convention: CallingConvention::C,
            ast_calling_convention: AstCallingConvention::Known(CallingConvention::C),
            return_kind: ArgumentKind::Direct,
            arguments: vec![ArgumentKind::Direct; argument_count],
            flags: AbiFlags::default(),
        }
    }
}
