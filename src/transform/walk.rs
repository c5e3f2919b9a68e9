use std::cell::RefCell;

use tracing::{debug, debug_span, trace};

use crate::model::{
    Decl, DeclId, DeclIdGen, DeclKind, Enum, Field, FieldKind, Function, FunctionPointerType,
    Library, Parameter, Record, StaticField, Synthesized, TypeRef, Typedef,
};
use crate::transform::{TransformContext, TransformResult, Transformation};

/// Runs both phases of `pass` over `library` and returns the rewritten
/// library. The input is never modified.
pub fn transform_library<T: Transformation + ?Sized>(pass: &mut T, library: &Library) -> Library {
    let _span = debug_span!("transform", pass = pass.name()).entered();

    pass.pre_transform_library(library);

    let ids = RefCell::new(DeclIdGen::starting_at(library.next_id()));
    let ctx = TransformContext::root(library, &ids);
    let mut declarations = Vec::with_capacity(library.declarations().len());
    for decl in library.declarations() {
        declarations.extend(transform_recursively(pass, &ctx, decl));
    }
    drop(ctx);

    let watermark = ids.into_inner().watermark();
    let rewritten = library
        .with_declarations(declarations)
        .with_next_id(watermark);
    debug!(
        before = library.decl_count(),
        after = rewritten.decl_count(),
        "per-declaration phase complete"
    );

    pass.post_transform_library(rewritten)
}

/// Rewrites `decl` and its subtree: children (and type slots) first, then
/// the declaration's own hook. Returns the declarations that take its place.
pub fn transform_recursively<'a, T: Transformation + ?Sized>(
    pass: &mut T,
    ctx: &TransformContext<'a>,
    decl: &'a Decl,
) -> Vec<Decl> {
    let walked = walk_declaration(pass, ctx, decl);
    let result = pass.transform_declaration(ctx, &walked);
    match &result {
        TransformResult::Unchanged => {}
        TransformResult::Replace(replacement) => {
            trace!(decl = %decl.name, id = %decl.id, kind = replacement.kind.name(), "replaced");
        }
        TransformResult::ReplaceMany(replacements) => {
            trace!(decl = %decl.name, id = %decl.id, count = replacements.len(), "replaced");
        }
    }
    result.into_decls(walked)
}

/// Rebuilds `decl` with rewritten children and type slots. The declaration's
/// own hook is not applied.
pub fn walk_declaration<'a, T: Transformation + ?Sized>(
    pass: &mut T,
    ctx: &TransformContext<'a>,
    decl: &'a Decl,
) -> Decl {
    let kind = match &decl.kind {
        DeclKind::Record(record) => DeclKind::Record(walk_record(pass, &ctx.child(decl), record)),
        DeclKind::Enum(enum_decl) => DeclKind::Enum(Enum {
            underlying_type: pass.transform_type_ref(ctx, &enum_decl.underlying_type),
            translate_as_loose_constants: enum_decl.translate_as_loose_constants,
            constants: walk_children(pass, &ctx.child(decl), &enum_decl.constants),
        }),
        DeclKind::Function(function) => DeclKind::Function(Function {
            mangled_name: function.mangled_name.clone(),
            return_type: pass.transform_type_ref(ctx, &function.return_type),
            is_virtual: function.is_virtual,
            is_instance_method: function.is_instance_method,
            abi: function.abi.clone(),
            parameters: walk_children(pass, &ctx.child(decl), &function.parameters),
        }),
        DeclKind::Parameter(parameter) => DeclKind::Parameter(Parameter {
            ty: pass.transform_type_ref(ctx, &parameter.ty),
            default_value: parameter.default_value.clone(),
        }),
        DeclKind::Field(field) => DeclKind::Field(Field {
            offset: field.offset,
            kind: walk_field_kind(pass, ctx, &field.kind),
        }),
        DeclKind::StaticField(static_field) => DeclKind::StaticField(StaticField {
            mangled_name: static_field.mangled_name.clone(),
            ty: pass.transform_type_ref(ctx, &static_field.ty),
        }),
        DeclKind::Typedef(typedef) => DeclKind::Typedef(Typedef {
            underlying_type: pass.transform_type_ref(ctx, &typedef.underlying_type),
        }),
        DeclKind::Synthesized(synthesized) => DeclKind::Synthesized(Synthesized {
            kind: synthesized.kind,
            members: walk_children(pass, &ctx.child(decl), &synthesized.members),
        }),
        DeclKind::EnumConstant(_)
        | DeclKind::VTable(_)
        | DeclKind::UndefinedRecord
        | DeclKind::Unsupported(_) => decl.kind.clone(),
    };

    Decl {
        id: decl.id,
        name: decl.name.clone(),
        namespace: decl.namespace.clone(),
        accessibility: decl.accessibility,
        file: decl.file,
        diagnostics: decl.diagnostics.clone(),
        metadata: decl.metadata.clone(),
        kind,
    }
}

fn walk_children<'a, T: Transformation + ?Sized>(
    pass: &mut T,
    ctx: &TransformContext<'a>,
    children: &'a [Decl],
) -> Vec<Decl> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        out.extend(transform_recursively(pass, ctx, child));
    }
    out
}

fn walk_record<'a, T: Transformation + ?Sized>(
    pass: &mut T,
    ctx: &TransformContext<'a>,
    record: &'a Record,
) -> Record {
    let mut vtable = DesignatedSlot::new(record.vtable);
    let mut vtable_field = DesignatedSlot::new(record.vtable_field);
    let mut base_field = DesignatedSlot::new(record.non_virtual_base_field);

    let mut members = Vec::with_capacity(record.members.len());
    for member in &record.members {
        let results = transform_recursively(pass, ctx, member);
        vtable.observe(member.id, &results, Decl::is_vtable);
        vtable_field.observe(member.id, &results, Decl::is_vtable_field);
        base_field.observe(member.id, &results, Decl::is_base_field);
        members.extend(results);
    }

    Record {
        size: record.size,
        alignment: record.alignment,
        members,
        vtable: vtable.finish(),
        vtable_field: vtable_field.finish(),
        non_virtual_base_field: base_field.finish(),
        unsupported_members: record.unsupported_members.clone(),
    }
}

fn walk_field_kind<T: Transformation + ?Sized>(
    pass: &mut T,
    ctx: &TransformContext<'_>,
    kind: &FieldKind,
) -> FieldKind {
    match kind {
        FieldKind::Normal { ty } => FieldKind::Normal {
            ty: pass.transform_type_ref(ctx, ty),
        },
        FieldKind::Base { ty } => FieldKind::Base {
            ty: pass.transform_type_ref(ctx, ty),
        },
        FieldKind::BitField {
            bit_offset,
            bit_width,
            ty,
        } => FieldKind::BitField {
            bit_offset: *bit_offset,
            bit_width: *bit_width,
            ty: pass.transform_type_ref(ctx, ty),
        },
        FieldKind::VTablePointer | FieldKind::Unimplemented { .. } => kind.clone(),
    }
}

/// Re-targets a record's designated member handle across a member rewrite.
///
/// If the designated member was replaced, the first replacement of the
/// matching kind takes over; if it was deleted the handle is cleared. A
/// handle that never named a member is left as-is for verification to report.
struct DesignatedSlot {
    designated: Option<DeclId>,
    retargeted: Option<Option<DeclId>>,
}

impl DesignatedSlot {
    fn new(designated: Option<DeclId>) -> Self {
        Self {
            designated,
            retargeted: None,
        }
    }

    fn observe(&mut self, member: DeclId, results: &[Decl], matches: fn(&Decl) -> bool) {
        if self.designated == Some(member) && self.retargeted.is_none() {
            self.retargeted = Some(results.iter().find(|d| matches(d)).map(|d| d.id));
        }
    }

    fn finish(self) -> Option<DeclId> {
        self.retargeted.unwrap_or(self.designated)
    }
}

/// Default type rewrite: recurse into pointer and function-pointer types.
pub fn walk_type_ref<T: Transformation + ?Sized>(
    pass: &mut T,
    ctx: &TransformContext<'_>,
    ty: &TypeRef,
) -> TypeRef {
    match ty {
        TypeRef::Pointer(inner) => TypeRef::Pointer(Box::new(pass.transform_type_ref(ctx, inner))),
        TypeRef::FunctionPointer(fn_ptr) => {
            TypeRef::FunctionPointer(Box::new(FunctionPointerType {
                return_type: pass.transform_type_ref(ctx, &fn_ptr.return_type),
                parameter_types: fn_ptr
                    .parameter_types
                    .iter()
                    .map(|param| pass.transform_type_ref(ctx, param))
                    .collect(),
                calling_convention: fn_ptr.calling_convention,
            }))
        }
        TypeRef::Void | TypeRef::Builtin(_) | TypeRef::Decl(_) | TypeRef::Native(_) => ty.clone(),
    }
}

/// Routes `decl` to the hook for its kind.
pub fn dispatch_declaration<T: Transformation + ?Sized>(
    pass: &mut T,
    ctx: &TransformContext<'_>,
    decl: &Decl,
) -> TransformResult {
    match &decl.kind {
        DeclKind::Record(record) => pass.transform_record(ctx, decl, record),
        DeclKind::Enum(enum_decl) => pass.transform_enum(ctx, decl, enum_decl),
        DeclKind::EnumConstant(constant) => pass.transform_enum_constant(ctx, decl, constant),
        DeclKind::Function(function) => pass.transform_function(ctx, decl, function),
        DeclKind::Parameter(parameter) => pass.transform_parameter(ctx, decl, parameter),
        DeclKind::Field(field) => pass.transform_field(ctx, decl, field),
        DeclKind::StaticField(static_field) => pass.transform_static_field(ctx, decl, static_field),
        DeclKind::VTable(vtable) => pass.transform_vtable(ctx, decl, vtable),
        DeclKind::Typedef(typedef) => pass.transform_typedef(ctx, decl, typedef),
        DeclKind::UndefinedRecord => pass.transform_undefined_record(ctx, decl),
        DeclKind::Unsupported(unsupported) => pass.transform_unsupported(ctx, decl, unsupported),
        DeclKind::Synthesized(synthesized) => pass.transform_synthesized(ctx, decl, synthesized),
    }
}

/// Routes a field to the hook for its field kind.
pub fn dispatch_field<T: Transformation + ?Sized>(
    pass: &mut T,
    ctx: &TransformContext<'_>,
    decl: &Decl,
    field: &Field,
) -> TransformResult {
    match field.kind {
        FieldKind::Normal { .. } => pass.transform_normal_field(ctx, decl, field),
        FieldKind::Base { .. } => pass.transform_base_field(ctx, decl, field),
        FieldKind::VTablePointer => pass.transform_vtable_field(ctx, decl, field),
        FieldKind::BitField { .. } => pass.transform_bitfield(ctx, decl, field),
        FieldKind::Unimplemented { .. } => pass.transform_unimplemented_field(ctx, decl, field),
    }
}
