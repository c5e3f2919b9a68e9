//! Construction helpers for front ends and tests.
//!
//! Every helper allocates a fresh `DeclId` and attributes the declaration to
//! the most recently added file.

use std::path::PathBuf;

use crate::model::abi::FunctionAbi;
use crate::model::decl::{
    Decl, DeclId, DeclIdGen, DeclKind, Enum, EnumConstant, Field, FieldKind, FileId, Function,
    Parameter, Record, StaticField, Synthesized, SynthesizedKind, Typedef, Unsupported, VTable,
    VTableEntry,
};
use crate::model::library::Library;
use crate::model::types::TypeRef;

#[derive(Debug, Default)]
pub struct LibraryBuilder {
    files: Vec<PathBuf>,
    ids: DeclIdGen,
    declarations: Vec<Decl>,
}

impl LibraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> FileId {
        self.files.push(path.into());
        FileId(self.files.len() as u32 - 1)
    }

    fn current_file(&mut self) -> FileId {
        if self.files.is_empty() {
            self.add_file("<unknown>");
        }
        FileId(self.files.len() as u32 - 1)
    }

    pub fn new_id(&mut self) -> DeclId {
        self.ids.new_id()
    }

    /// Adds a root-level declaration.
    pub fn push(&mut self, decl: Decl) -> DeclId {
        let id = decl.id;
        self.declarations.push(decl);
        id
    }

    pub fn build(self) -> Library {
        Library::new(self.files, self.declarations, self.ids.watermark())
    }

    pub fn decl(&mut self, name: &str, kind: DeclKind) -> Decl {
        let file = self.current_file();
        let id = self.new_id();
        Decl::new(id, name, file, kind)
    }

    /// A record whose first vtable, vtable pointer field and base field
    /// members become its designated layout members.
    pub fn record(&mut self, name: &str, members: Vec<Decl>) -> Decl {
        let vtable = members.iter().find(|m| m.is_vtable()).map(|m| m.id);
        let vtable_field = members.iter().find(|m| m.is_vtable_field()).map(|m| m.id);
        let non_virtual_base_field = members.iter().find(|m| m.is_base_field()).map(|m| m.id);
        self.decl(
            name,
            DeclKind::Record(Record {
                members,
                vtable,
                vtable_field,
                non_virtual_base_field,
                ..Record::default()
            }),
        )
    }

    pub fn undefined_record(&mut self, name: &str) -> Decl {
        self.decl(name, DeclKind::UndefinedRecord)
    }

    pub fn field(&mut self, name: &str, offset: u64, ty: TypeRef) -> Decl {
        self.decl(
            name,
            DeclKind::Field(Field {
                offset,
                kind: FieldKind::Normal { ty },
            }),
        )
    }

    pub fn base_field(&mut self, offset: u64, ty: TypeRef) -> Decl {
        self.decl(
            "Base",
            DeclKind::Field(Field {
                offset,
                kind: FieldKind::Base { ty },
            }),
        )
    }

    pub fn vtable_field(&mut self) -> Decl {
        self.decl(
            "VirtualMethodTablePointer",
            DeclKind::Field(Field {
                offset: 0,
                kind: FieldKind::VTablePointer,
            }),
        )
    }

    pub fn bitfield(&mut self, name: &str, offset: u64, bit_width: u32, ty: TypeRef) -> Decl {
        self.decl(
            name,
            DeclKind::Field(Field {
                offset,
                kind: FieldKind::BitField {
                    bit_offset: 0,
                    bit_width,
                    ty,
                },
            }),
        )
    }

    pub fn unimplemented_field(&mut self, name: &str, offset: u64, kind: &str) -> Decl {
        self.decl(
            name,
            DeclKind::Field(Field {
                offset,
                kind: FieldKind::Unimplemented {
                    kind: kind.to_string(),
                    size: 0,
                },
            }),
        )
    }

    pub fn static_field(&mut self, name: &str, ty: TypeRef) -> Decl {
        self.decl(
            name,
            DeclKind::StaticField(StaticField {
                mangled_name: name.to_string(),
                ty,
            }),
        )
    }

    pub fn vtable(&mut self, entries: Vec<VTableEntry>) -> Decl {
        self.decl("VirtualMethodTable", DeclKind::VTable(VTable { entries }))
    }

    /// A free function with a direct C arrangement for every parameter.
    pub fn function(&mut self, name: &str, parameters: Vec<Decl>) -> Decl {
        let abi = FunctionAbi::direct(parameters.len());
        self.decl(
            name,
            DeclKind::Function(Function {
                mangled_name: name.to_string(),
                return_type: TypeRef::Void,
                is_virtual: false,
                is_instance_method: false,
                abi: Some(abi),
                parameters,
            }),
        )
    }

    /// An instance method; its ABI reserves argument 0 for the receiver.
    pub fn method(&mut self, name: &str, parameters: Vec<Decl>) -> Decl {
        let abi = FunctionAbi::direct(parameters.len() + 1);
        self.decl(
            name,
            DeclKind::Function(Function {
                mangled_name: name.to_string(),
                return_type: TypeRef::Void,
                is_virtual: false,
                is_instance_method: true,
                abi: Some(abi),
                parameters,
            }),
        )
    }

    pub fn parameter(&mut self, name: &str, ty: TypeRef) -> Decl {
        self.decl(
            name,
            DeclKind::Parameter(Parameter {
                ty,
                default_value: None,
            }),
        )
    }

    pub fn enumeration(
        &mut self,
        name: &str,
        underlying_type: TypeRef,
        constants: Vec<Decl>,
    ) -> Decl {
        self.decl(
            name,
            DeclKind::Enum(Enum {
                underlying_type,
                translate_as_loose_constants: false,
                constants,
            }),
        )
    }

    pub fn enum_constant(&mut self, name: &str, value: u64) -> Decl {
        self.decl(
            name,
            DeclKind::EnumConstant(EnumConstant {
                value,
                has_explicit_value: true,
            }),
        )
    }

    pub fn typedef(&mut self, name: &str, underlying_type: TypeRef) -> Decl {
        self.decl(name, DeclKind::Typedef(Typedef { underlying_type }))
    }

    /// Front ends always explain why a construct is unsupported.
    pub fn unsupported(&mut self, name: &str, kind: &str) -> Decl {
        self.decl(
            name,
            DeclKind::Unsupported(Unsupported {
                kind: kind.to_string(),
            }),
        )
        .with_error(format!("{kind} declarations are not supported"))
    }

    pub fn synthesized(&mut self, name: &str, kind: SynthesizedKind, members: Vec<Decl>) -> Decl {
        self.decl(name, DeclKind::Synthesized(Synthesized { kind, members }))
    }
}
