//! Declaration nodes.
//!
//! A declaration is an immutable value: every `with_*` method returns a new
//! node and leaves the receiver untouched. Identity is carried by `DeclId`,
//! never by structural equality.

use std::fmt;

use crate::diag::{Diagnostic, Diagnostics, Severity};
use crate::model::abi::FunctionAbi;
use crate::model::metadata::{Metadata, MetadataItem, MetadataKind};
use crate::model::types::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct DeclIdGen {
    next_id: u32,
}

impl Default for DeclIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclIdGen {
    pub fn new() -> Self {
        Self { next_id: 1 } // DeclId 0 is reserved
    }

    pub fn starting_at(next_id: u32) -> Self {
        Self {
            next_id: next_id.max(1),
        }
    }

    pub fn new_id(&mut self) -> DeclId {
        let id = DeclId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn watermark(&self) -> u32 {
        self.next_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessibility {
    Public,
    Internal,
    Protected,
    ProtectedAndInternal,
    ProtectedOrInternal,
    Private,
}

impl Accessibility {
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            Accessibility::Protected
                | Accessibility::ProtectedAndInternal
                | Accessibility::ProtectedOrInternal
        )
    }

    /// Levels a declaration without a parent may use.
    pub fn is_valid_at_root(self) -> bool {
        matches!(self, Accessibility::Public | Accessibility::Internal)
    }
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Accessibility::Public => "public",
            Accessibility::Internal => "internal",
            Accessibility::Protected => "protected",
            Accessibility::ProtectedAndInternal => "private protected",
            Accessibility::ProtectedOrInternal => "protected internal",
            Accessibility::Private => "private",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub id: DeclId,
    /// May be empty for anonymous or synthesized declarations.
    pub name: String,
    /// Scope path (`a::b`), independent of parent nesting.
    pub namespace: Option<String>,
    pub accessibility: Accessibility,
    pub file: FileId,
    pub diagnostics: Diagnostics,
    pub metadata: Metadata,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Record(Record),
    Enum(Enum),
    EnumConstant(EnumConstant),
    Function(Function),
    Parameter(Parameter),
    Field(Field),
    StaticField(StaticField),
    VTable(VTable),
    Typedef(Typedef),
    UndefinedRecord,
    Unsupported(Unsupported),
    Synthesized(Synthesized),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub size: u64,
    pub alignment: u64,
    pub members: Vec<Decl>,
    /// Designated vtable; must name a `VTable` member.
    pub vtable: Option<DeclId>,
    /// Designated vtable pointer field; must name a `Field` member.
    pub vtable_field: Option<DeclId>,
    /// Designated non-virtual base field; must name a `Field` member.
    pub non_virtual_base_field: Option<DeclId>,
    /// Members the front end could not represent. Carried, never traversed.
    pub unsupported_members: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub underlying_type: TypeRef,
    pub translate_as_loose_constants: bool,
    pub constants: Vec<Decl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumConstant {
    /// Raw bits of the constant, sign-extended for signed underlying types.
    pub value: u64,
    pub has_explicit_value: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub mangled_name: String,
    pub return_type: TypeRef,
    pub is_virtual: bool,
    pub is_instance_method: bool,
    pub abi: Option<FunctionAbi>,
    pub parameters: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Integer(i128),
    Float(f64),
    String(String),
    /// A default argument the front end could not evaluate. The front end has
    /// already reported it.
    Unsupported(String),
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Integer(value) => write!(f, "{value}"),
            ConstantValue::Float(value) => write!(f, "{value:?}"),
            ConstantValue::String(value) => write!(f, "{value:?}"),
            ConstantValue::Unsupported(spelling) => write!(f, "<unsupported `{spelling}`>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub ty: TypeRef,
    pub default_value: Option<ConstantValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Byte offset within the enclosing record.
    pub offset: u64,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Normal { ty: TypeRef },
    /// Layout slot of a non-virtual base class.
    Base { ty: TypeRef },
    /// The vtable pointer slot.
    VTablePointer,
    BitField {
        bit_offset: u32,
        bit_width: u32,
        ty: TypeRef,
    },
    /// A field the front end could not fully represent.
    Unimplemented { kind: String, size: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticField {
    pub mangled_name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VTable {
    pub entries: Vec<VTableEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VTableEntry {
    pub name: String,
    pub kind: VTableEntryKind,
    /// The virtual method occupying this slot, when the slot holds one.
    pub method: Option<DeclId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VTableEntryKind {
    FunctionPointer,
    OffsetToTop,
    Rtti,
    Destructor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Typedef {
    pub underlying_type: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    /// Description of the construct, e.g. `ClassTemplate`.
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized {
    pub kind: SynthesizedKind,
    pub members: Vec<Decl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesizedKind {
    /// Static container hosting declarations that cannot stand alone.
    LooseDeclarations,
    /// Marker type standing in for a native one-byte boolean.
    NativeBoolean,
    /// Marker type standing in for a native `char`.
    NativeChar,
}

impl DeclKind {
    pub fn name(&self) -> &'static str {
        match self {
            DeclKind::Record(_) => "record",
            DeclKind::Enum(_) => "enum",
            DeclKind::EnumConstant(_) => "enum constant",
            DeclKind::Function(_) => "function",
            DeclKind::Parameter(_) => "parameter",
            DeclKind::Field(field) => match field.kind {
                FieldKind::Normal { .. } => "field",
                FieldKind::Base { .. } => "base field",
                FieldKind::VTablePointer => "vtable field",
                FieldKind::BitField { .. } => "bitfield",
                FieldKind::Unimplemented { .. } => "unimplemented field",
            },
            DeclKind::StaticField(_) => "static field",
            DeclKind::VTable(_) => "vtable",
            DeclKind::Typedef(_) => "typedef",
            DeclKind::UndefinedRecord => "undefined record",
            DeclKind::Unsupported(_) => "unsupported declaration",
            DeclKind::Synthesized(synthesized) => match synthesized.kind {
                SynthesizedKind::LooseDeclarations => "loose declarations",
                SynthesizedKind::NativeBoolean => "native boolean",
                SynthesizedKind::NativeChar => "native char",
            },
        }
    }
}

impl Decl {
    pub fn new(id: DeclId, name: impl Into<String>, file: FileId, kind: DeclKind) -> Self {
        Self {
            id,
            name: name.into(),
            namespace: None,
            accessibility: Accessibility::Public,
            file,
            diagnostics: Diagnostics::new(),
            metadata: Metadata::new(),
            kind,
        }
    }

    pub fn children(&self) -> &[Decl] {
        match &self.kind {
            DeclKind::Record(record) => &record.members,
            DeclKind::Enum(enum_decl) => &enum_decl.constants,
            DeclKind::Function(function) => &function.parameters,
            DeclKind::Synthesized(synthesized) => &synthesized.members,
            _ => &[],
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Declarations carrying an Error must not be emitted.
    pub fn is_emittable(&self) -> bool {
        !self.has_errors()
    }

    // --- Functional updates ---

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn with_accessibility(&self, accessibility: Accessibility) -> Self {
        Self {
            accessibility,
            ..self.clone()
        }
    }

    pub fn with_kind(&self, kind: DeclKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    pub fn with_metadata(&self, item: MetadataItem) -> Self {
        Self {
            metadata: self.metadata.with(item),
            ..self.clone()
        }
    }

    pub fn without_metadata(&self, kind: MetadataKind) -> Self {
        Self {
            metadata: self.metadata.without(kind),
            ..self.clone()
        }
    }

    pub fn with_diagnostic(&self, diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: self.diagnostics.pushed(diagnostic),
            ..self.clone()
        }
    }

    pub fn with_info(&self, message: impl Into<String>) -> Self {
        self.with_diagnostic(Diagnostic::info(message))
    }

    pub fn with_warning(&self, message: impl Into<String>) -> Self {
        self.with_diagnostic(Diagnostic::warning(message))
    }

    pub fn with_error(&self, message: impl Into<String>) -> Self {
        self.with_diagnostic(Diagnostic::error(message))
    }

    /// Appends the diagnostic unless an identical entry is already present.
    pub fn ensure_diagnostic(&self, severity: Severity, message: impl Into<String>) -> Self {
        let message = message.into();
        if self.diagnostics.contains(severity, &message) {
            return self.clone();
        }
        self.with_diagnostic(Diagnostic::new(severity, message))
    }

    pub fn ensure_warning(&self, message: impl Into<String>) -> Self {
        self.ensure_diagnostic(Severity::Warning, message)
    }

    pub fn ensure_error(&self, message: impl Into<String>) -> Self {
        self.ensure_diagnostic(Severity::Error, message)
    }

    /// Appends `message` as an Error only if no Error is present yet.
    pub fn ensure_any_error(&self, message: impl Into<String>) -> Self {
        if self.has_errors() {
            return self.clone();
        }
        self.with_error(message)
    }

    // --- Typed views ---

    pub fn as_record(&self) -> Option<&Record> {
        match &self.kind {
            DeclKind::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Enum> {
        match &self.kind {
            DeclKind::Enum(enum_decl) => Some(enum_decl),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.kind {
            DeclKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&Parameter> {
        match &self.kind {
            DeclKind::Parameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    pub fn as_typedef(&self) -> Option<&Typedef> {
        match &self.kind {
            DeclKind::Typedef(typedef) => Some(typedef),
            _ => None,
        }
    }

    pub fn as_synthesized(&self) -> Option<&Synthesized> {
        match &self.kind {
            DeclKind::Synthesized(synthesized) => Some(synthesized),
            _ => None,
        }
    }

    pub fn is_vtable(&self) -> bool {
        matches!(self.kind, DeclKind::VTable(_))
    }

    pub fn is_vtable_field(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Field(Field {
                kind: FieldKind::VTablePointer,
                ..
            })
        )
    }

    pub fn is_base_field(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Field(Field {
                kind: FieldKind::Base { .. },
                ..
            })
        )
    }

    /// Calls `f` on every type slot owned directly by this declaration
    /// (children are not visited).
    pub fn for_each_type_ref(&self, f: &mut impl FnMut(&TypeRef)) {
        match &self.kind {
            DeclKind::Enum(enum_decl) => f(&enum_decl.underlying_type),
            DeclKind::Function(function) => f(&function.return_type),
            DeclKind::Parameter(parameter) => f(&parameter.ty),
            DeclKind::Field(field) => match &field.kind {
                FieldKind::Normal { ty }
                | FieldKind::Base { ty }
                | FieldKind::BitField { ty, .. } => f(ty),
                FieldKind::VTablePointer | FieldKind::Unimplemented { .. } => {}
            },
            DeclKind::StaticField(static_field) => f(&static_field.ty),
            DeclKind::Typedef(typedef) => f(&typedef.underlying_type),
            DeclKind::Record(_)
            | DeclKind::EnumConstant(_)
            | DeclKind::VTable(_)
            | DeclKind::UndefinedRecord
            | DeclKind::Unsupported(_)
            | DeclKind::Synthesized(_) => {}
        }
    }
}
