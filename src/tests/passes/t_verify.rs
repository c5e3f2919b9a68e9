use super::*;
use crate::diag::Severity;
use crate::model::builder::LibraryBuilder;
use crate::model::{
    AstCallingConvention, ArgumentKind, BuiltinType, CallingConvention, DeclId, TypeRef,
};

fn run(library: &Library) -> Library {
    verify(library, &VerifyConfig::default())
}

fn i32_ty() -> TypeRef {
    TypeRef::Builtin(BuiltinType::I32)
}

fn find(library: &Library, id: DeclId) -> &Decl {
    library
        .find(id)
        .unwrap_or_else(|| panic!("declaration {id} missing from output"))
}

fn messages(decl: &Decl, severity: Severity) -> Vec<String> {
    decl.diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .map(|d| d.message.clone())
        .collect()
}

fn update_function(decl: &Decl, update: impl FnOnce(&mut Function)) -> Decl {
    let mut function = decl.as_function().cloned().unwrap();
    update(&mut function);
    decl.with_kind(DeclKind::Function(function))
}

fn with_default(decl: &Decl, value: ConstantValue) -> Decl {
    let parameter = decl.as_parameter().cloned().unwrap();
    decl.with_kind(DeclKind::Parameter(Parameter {
        default_value: Some(value),
        ..parameter
    }))
}

/// Wraps `members` in a loose-declarations container so that functions and
/// fields sit in a valid context.
fn hosted(b: &mut LibraryBuilder, members: Vec<Decl>) -> Library {
    let api = b.synthesized("Api", SynthesizedKind::LooseDeclarations, members);
    b.push(api);
    std::mem::take(b).build()
}

// --- Accessibility ---

#[test]
fn protected_member_becomes_internal() {
    let mut b = LibraryBuilder::new();
    let draw = b
        .method("Draw", Vec::new())
        .with_accessibility(Accessibility::Protected);
    let draw_id = draw.id;
    let record = b.record("Widget", vec![draw]);
    let record_id = record.id;
    b.push(record);
    let out = run(&b.build());

    let draw = find(&out, draw_id);
    assert_eq!(draw.accessibility, Accessibility::Internal);
    assert_eq!(
        messages(draw, Severity::Warning),
        vec![VerifyIssue::ProtectedAccessibility(Accessibility::Protected).to_string()]
    );
    assert_eq!(draw.diagnostics.len(), 1);
    assert_eq!(out.parent_of(draw_id).map(|d| d.id), Some(record_id));
}

#[test]
fn root_private_declaration_becomes_internal() {
    let mut b = LibraryBuilder::new();
    let record = b.record("Hidden", Vec::new());
    let id = record.id;
    b.push(record.with_accessibility(Accessibility::Private));
    let out = run(&b.build());

    let record = find(&out, id);
    assert_eq!(record.accessibility, Accessibility::Internal);
    assert_eq!(
        messages(record, Severity::Warning),
        vec!["`private` accessibility is not valid at root scope; changed to internal".to_string()]
    );
}

#[test]
fn accessibility_fix_combines_with_kind_rule() {
    let mut b = LibraryBuilder::new();
    let flag = b.static_field("Flag", i32_ty());
    let id = flag.id;
    b.push(flag.with_accessibility(Accessibility::Protected));
    let out = run(&b.build());

    let flag = find(&out, id);
    assert_eq!(flag.accessibility, Accessibility::Internal);
    assert_eq!(messages(flag, Severity::Warning).len(), 1);
    assert_eq!(
        messages(flag, Severity::Error),
        vec![
            "static fields must be members of a record or a loose-declarations container"
                .to_string()
        ]
    );
}

// --- Enums ---

#[test]
fn enum_at_root_with_unsupported_underlying_type_is_wrapped() {
    let mut b = LibraryBuilder::new();
    let read = b.enum_constant("Read", 1);
    let flags = b.enumeration("Flags", TypeRef::Builtin(BuiltinType::NUInt), vec![read]);
    let flags_id = flags.id;
    let mut flags = flags.with_accessibility(Accessibility::Internal);
    flags.namespace = Some("io".to_string());
    b.push(flags);
    let library = b.build();
    let out = run(&library);

    assert_eq!(out.declarations().len(), 1);
    let wrapper = &out.declarations()[0];
    assert_ne!(wrapper.id, flags_id);
    assert!(wrapper.id.0 >= library.next_id());
    assert_eq!(wrapper.name, "Flags");
    assert_eq!(wrapper.namespace.as_deref(), Some("io"));
    assert_eq!(wrapper.accessibility, Accessibility::Internal);
    assert!(wrapper.diagnostics.is_empty());
    let synthesized = wrapper.as_synthesized().unwrap();
    assert_eq!(synthesized.kind, SynthesizedKind::LooseDeclarations);
    assert_eq!(synthesized.members.len(), 1);

    let inner = &synthesized.members[0];
    assert_eq!(inner.id, flags_id);
    assert!(inner.as_enum().unwrap().translate_as_loose_constants);
    assert_eq!(
        messages(inner, Severity::Warning),
        vec![VerifyIssue::EnumWrapped("Flags".to_string()).to_string()]
    );
    assert_eq!(inner.diagnostics.len(), 1);
}

#[test]
fn enum_in_record_with_unsupported_underlying_type_becomes_loose() {
    let mut b = LibraryBuilder::new();
    let mode = b.enumeration("Mode", TypeRef::Builtin(BuiltinType::NInt), Vec::new());
    let mode_id = mode.id;
    let record = b.record("Device", vec![mode]);
    b.push(record);
    let out = run(&b.build());

    let mode = find(&out, mode_id);
    assert!(mode.as_enum().unwrap().translate_as_loose_constants);
    assert_eq!(
        messages(mode, Severity::Warning),
        vec![
            "`nint` is not a valid enum underlying type; translated as loose constants instead"
                .to_string()
        ]
    );
}

#[test]
fn loose_constants_at_root_become_real_enum() {
    let mut b = LibraryBuilder::new();
    let color = b.enumeration("Color", i32_ty(), Vec::new());
    let id = color.id;
    let loose = color.with_kind(DeclKind::Enum(Enum {
        translate_as_loose_constants: true,
        ..color.as_enum().cloned().unwrap()
    }));
    b.push(loose);
    let out = run(&b.build());

    let color = find(&out, id);
    assert!(!color.as_enum().unwrap().translate_as_loose_constants);
    assert_eq!(
        messages(color, Severity::Warning),
        vec![VerifyIssue::LooseConstantsInvalidContext.to_string()]
    );
}

#[test]
fn valid_enum_at_root_is_untouched() {
    let mut b = LibraryBuilder::new();
    let one = b.enum_constant("One", 1);
    let color = b.enumeration("Color", TypeRef::Builtin(BuiltinType::U8), vec![one]);
    b.push(color);
    let library = b.build();
    assert_eq!(run(&library), library);
}

#[test]
fn enum_underlying_type_is_checked_through_typedefs() {
    let mut b = LibraryBuilder::new();
    let alias = b.typedef("u16_t", TypeRef::Builtin(BuiltinType::U16));
    let color = b.enumeration("Color", TypeRef::decl(alias.id, "u16_t"), Vec::new());
    b.push(alias);
    b.push(color);
    let library = b.build();
    assert_eq!(run(&library), library);
}

#[test]
fn enum_constant_outside_enum_is_an_error() {
    let mut b = LibraryBuilder::new();
    let stray = b.enum_constant("Stray", 3);
    let id = stray.id;
    let record = b.record("Holder", vec![stray]);
    b.push(record);
    let out = run(&b.build());

    assert_eq!(
        messages(find(&out, id), Severity::Error),
        vec!["enum constants must be children of an enum".to_string()]
    );
}

// --- Functions and ABI ---

#[test]
fn function_at_root_is_an_error() {
    let mut b = LibraryBuilder::new();
    let f = b.function("Free", Vec::new());
    let id = f.id;
    b.push(f);
    let out = run(&b.build());

    assert_eq!(
        messages(find(&out, id), Severity::Error),
        vec![VerifyIssue::FunctionInvalidContext.to_string()]
    );
}

#[test]
fn function_in_loose_container_is_valid() {
    let mut b = LibraryBuilder::new();
    let f = b.function("Free", Vec::new());
    let library = hosted(&mut b, vec![f]);
    assert_eq!(run(&library), library);
}

#[test]
fn expanded_receiver_is_named_this_pointer() {
    let mut b = LibraryBuilder::new();
    let width = b.parameter("width", i32_ty());
    let resize = b.method("Resize", vec![width]);
    let id = resize.id;
    let resize = update_function(&resize, |function| {
        if let Some(abi) = &mut function.abi {
            abi.arguments = vec![ArgumentKind::Expand, ArgumentKind::CoerceAndExpand];
        }
    });
    let record = b.record("Widget", vec![resize]);
    b.push(record);
    let out = run(&b.build());

    assert_eq!(
        messages(find(&out, id), Severity::Warning),
        vec![
            "this pointer parameter is passed via `Expand`, which may not be handled correctly"
                .to_string(),
            "parameter #0 `width` is passed via `CoerceAndExpand`, which may not be handled correctly"
                .to_string(),
        ]
    );
}

#[test]
fn unnamed_expanded_parameter_names_the_function() {
    let mut b = LibraryBuilder::new();
    let anonymous = b.parameter("", i32_ty());
    let f = b.function("Blit", vec![anonymous]);
    let id = f.id;
    let f = update_function(&f, |function| {
        if let Some(abi) = &mut function.abi {
            abi.arguments = vec![ArgumentKind::Expand];
            abi.return_kind = ArgumentKind::CoerceAndExpand;
        }
    });
    let out = run(&hosted(&mut b, vec![f]));

    assert_eq!(
        messages(find(&out, id), Severity::Warning),
        vec![
            "return value is passed via `CoerceAndExpand`, which may not be handled correctly"
                .to_string(),
            "parameter #0 of `Blit` is passed via `Expand`, which may not be handled correctly"
                .to_string(),
        ]
    );
}

#[test]
fn abi_flags_and_conventions_are_reported() {
    let mut b = LibraryBuilder::new();
    let f = b.function("Legacy", Vec::new());
    let id = f.id;
    let f = update_function(&f, |function| {
        if let Some(abi) = &mut function.abi {
            abi.calling_convention = CallingConvention::StdCall;
            abi.ast_calling_convention = AstCallingConvention::Unrecognized("pascal".to_string());
            abi.flags.uses_in_alloca = true;
            abi.flags.has_ext_parameter_infos = true;
        }
    });
    let out = run(&hosted(&mut b, vec![f]));

    let f = find(&out, id);
    assert_eq!(
        messages(f, Severity::Warning),
        vec![
            "function uses the `stdcall` calling convention (effective `cdecl`), which may not be handled correctly"
                .to_string(),
            "function uses unrecognized calling convention `pascal`".to_string(),
            VerifyIssue::InAllocaArguments.to_string(),
            VerifyIssue::ExtParameterInfo.to_string(),
        ]
    );
    assert!(f.is_emittable());
}

#[test]
fn default_calling_convention_is_configurable() {
    let mut b = LibraryBuilder::new();
    let f = b.function("Plain", Vec::new());
    let id = f.id;
    let library = hosted(&mut b, vec![f]);

    let config = VerifyConfig {
        default_calling_convention: CallingConvention::StdCall,
    };
    let out = verify(&library, &config);
    assert_eq!(
        messages(find(&out, id), Severity::Warning),
        vec![
            VerifyIssue::NonDefaultCallingConvention {
                native: CallingConvention::C,
                effective: CallingConvention::C,
            }
            .to_string()
        ]
    );
}

#[test]
fn missing_abi_is_an_error_and_skips_abi_checks() {
    let mut b = LibraryBuilder::new();
    let f = b.function("Opaque", Vec::new());
    let id = f.id;
    let f = update_function(&f, |function| function.abi = None);
    let out = run(&hosted(&mut b, vec![f]));

    let f = find(&out, id);
    assert_eq!(
        messages(f, Severity::Error),
        vec![VerifyIssue::MissingAbi.to_string()]
    );
    assert!(messages(f, Severity::Warning).is_empty());
}

#[test]
fn virtual_set_last_error_marker_is_dropped() {
    let mut b = LibraryBuilder::new();
    let draw = b.method("Draw", Vec::new());
    let id = draw.id;
    let draw = update_function(&draw, |function| function.is_virtual = true)
        .with_metadata(MetadataItem::SetLastError);
    let record = b.record("Widget", vec![draw]);
    b.push(record);
    let out = run(&b.build());

    let draw = find(&out, id);
    assert!(!draw.metadata.has(MetadataKind::SetLastError));
    assert_eq!(
        messages(draw, Severity::Warning),
        vec![VerifyIssue::VirtualSetLastError.to_string()]
    );
}

// --- Parameters ---

#[test]
fn string_default_value_is_removed() {
    let mut b = LibraryBuilder::new();
    let label = b.parameter("label", TypeRef::pointer_to(TypeRef::Builtin(BuiltinType::Char16)));
    let id = label.id;
    let label = with_default(&label, ConstantValue::String("untitled".to_string()));
    let f = b.function("SetLabel", vec![label.clone()]);
    let out = run(&hosted(&mut b, vec![f]));

    let out_label = find(&out, id);
    let parameter = out_label.as_parameter().unwrap();
    assert_eq!(parameter.default_value, None);
    assert_eq!(parameter.ty, label.as_parameter().unwrap().ty);
    assert_eq!(out_label.name, label.name);
    assert_eq!(out_label.accessibility, label.accessibility);
    assert_eq!(
        messages(out_label, Severity::Warning),
        vec![VerifyIssue::StringDefaultValue.to_string()]
    );
    assert_eq!(out_label.diagnostics.len(), 1);
}

#[test]
fn default_value_eligibility_follows_the_type() {
    let mut b = LibraryBuilder::new();
    let boolean = b.synthesized("NativeBool", SynthesizedKind::NativeBoolean, Vec::new());
    let point = b.record("Point", Vec::new());

    let by_value = b.parameter("origin", TypeRef::decl(point.id, "Point"));
    let by_value_id = by_value.id;
    let by_value = with_default(&by_value, ConstantValue::Integer(0));

    let flag = b.parameter("flag", TypeRef::decl(boolean.id, "NativeBool"));
    let flag_id = flag.id;
    let flag = with_default(&flag, ConstantValue::Integer(1));

    let scale = b.parameter("scale", TypeRef::Builtin(BuiltinType::F64));
    let scale_id = scale.id;
    let scale = with_default(&scale, ConstantValue::Float(1.5));

    let weird = b.parameter("weird", i32_ty());
    let weird_id = weird.id;
    let weird = with_default(&weird, ConstantValue::Unsupported("sizeof(T)".to_string()));

    let f = b.function("Place", vec![by_value, flag, scale, weird]);
    b.push(boolean);
    b.push(point);
    let out = run(&hosted(&mut b, vec![f]));

    let by_value = find(&out, by_value_id);
    assert_eq!(by_value.as_parameter().unwrap().default_value, None);
    assert_eq!(messages(by_value, Severity::Warning).len(), 1);

    let flag = find(&out, flag_id);
    assert_eq!(
        flag.as_parameter().unwrap().default_value,
        Some(ConstantValue::Integer(1))
    );
    assert!(flag.diagnostics.is_empty());

    let scale = find(&out, scale_id);
    assert_eq!(
        scale.as_parameter().unwrap().default_value,
        Some(ConstantValue::Float(1.5))
    );

    let weird = find(&out, weird_id);
    assert_eq!(weird.as_parameter().unwrap().default_value, None);
    assert!(weird.diagnostics.is_empty());
}

#[test]
fn parameter_outside_function_is_an_error() {
    let mut b = LibraryBuilder::new();
    let stray = b.parameter("stray", i32_ty());
    let id = stray.id;
    let record = b.record("Holder", vec![stray]);
    b.push(record);
    let out = run(&b.build());

    assert_eq!(
        messages(find(&out, id), Severity::Error),
        vec![VerifyIssue::ParameterOutsideFunction.to_string()]
    );
}

// --- Records and fields ---

#[test]
fn field_named_like_its_record_is_renamed() {
    let mut b = LibraryBuilder::new();
    let foo = b.field("Foo", 0, i32_ty());
    let id = foo.id;
    let record = b.record("Foo", vec![foo]);
    b.push(record);
    let out = run(&b.build());

    let foo = find(&out, id);
    assert_eq!(foo.name, "Foo_");
    assert_eq!(
        foo.metadata.get(MetadataKind::OriginalName),
        Some(&MetadataItem::OriginalName("Foo".to_string()))
    );
    let warnings = messages(foo, Severity::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("`Foo_`"));
}

#[test]
fn renamed_field_skips_colliding_sibling() {
    let mut b = LibraryBuilder::new();
    let foo = b.field("Foo", 0, i32_ty());
    let id = foo.id;
    let sibling = b.field("Foo_", 4, i32_ty());
    let record = b.record("Foo", vec![foo, sibling]);
    b.push(record);
    let out = run(&b.build());

    let foo = find(&out, id);
    assert_eq!(foo.name, "Foo__");
    let warnings = messages(foo, Severity::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("`Foo__`"));
}

#[test]
fn fields_sharing_record_name_get_distinct_names() {
    let mut b = LibraryBuilder::new();
    let first = b.field("Foo", 0, i32_ty());
    let second = b.field("Foo", 4, i32_ty());
    let taken = b.field("Foo__", 8, i32_ty());
    let ids = [first.id, second.id];
    let record = b.record("Foo", vec![first, second, taken]);
    b.push(record);
    let out = run(&b.build());

    assert_eq!(find(&out, ids[0]).name, "Foo_");
    assert_eq!(find(&out, ids[1]).name, "Foo___");

    let again = run(&out);
    assert_eq!(again, out);
}

#[test]
fn bitfield_through_typedef_to_float_is_an_error() {
    let mut b = LibraryBuilder::new();
    let real = b.typedef("Real", TypeRef::Builtin(BuiltinType::F32));
    let bits = b.bitfield("bits", 0, 3, TypeRef::decl(real.id, "Real"));
    let id = bits.id;
    let original = bits.clone();
    let record = b.record("Packed", vec![bits]);
    b.push(real);
    b.push(record);
    let out = run(&b.build());

    let bits = find(&out, id);
    assert_eq!(bits.kind, original.kind);
    assert_eq!(bits.name, original.name);
    assert_eq!(
        messages(bits, Severity::Error),
        vec![
            "bitfield type `Real#1` is not an integral, boolean, or integral-backed enum type"
                .to_string()
        ]
    );
    assert!(messages(bits, Severity::Warning).is_empty());
}

#[test]
fn bitfield_types_accepted() {
    let mut b = LibraryBuilder::new();
    let mode = b.enumeration("Mode", TypeRef::Builtin(BuiltinType::U8), Vec::new());
    let a = b.bitfield("a", 0, 1, TypeRef::Builtin(BuiltinType::Bool));
    let c = b.bitfield("c", 0, 4, TypeRef::Builtin(BuiltinType::NUInt));
    let d = b.bitfield("d", 1, 2, TypeRef::decl(mode.id, "Mode"));
    let record = b.record("Packed", vec![a, c, d]);
    b.push(mode);
    b.push(record);
    let library = b.build();
    assert_eq!(run(&library), library);
}

#[test]
fn vtable_without_vtable_field_is_an_error() {
    let mut b = LibraryBuilder::new();
    let vtable_field = b.vtable_field();
    let record = b.record("Half", vec![vtable_field]);
    let id = record.id;
    b.push(record);
    let out = run(&b.build());

    assert_eq!(
        messages(find(&out, id), Severity::Error),
        vec![VerifyIssue::VTableFieldMismatch.to_string()]
    );
}

#[test]
fn designated_handles_must_name_members() {
    let mut b = LibraryBuilder::new();
    let record = b.record("Dangling", Vec::new());
    let id = record.id;
    let mut layout = record.as_record().cloned().unwrap();
    layout.non_virtual_base_field = Some(DeclId(999));
    b.push(record.with_kind(DeclKind::Record(layout)));
    let out = run(&b.build());

    assert_eq!(
        messages(find(&out, id), Severity::Error),
        vec!["designated non-virtual base field is not a member of this record".to_string()]
    );
}

#[test]
fn extra_base_field_and_vtable_are_errors() {
    let mut b = LibraryBuilder::new();
    let base = b.base_field(0, i32_ty());
    let other_base = b.base_field(4, i32_ty());
    let other_base_id = other_base.id;
    let vtable_field = b.vtable_field();
    let vtable = b.vtable(Vec::new());
    let other_vtable = b.vtable(Vec::new());
    let other_vtable_id = other_vtable.id;
    let record = b.record(
        "Diamond",
        vec![base, other_base, vtable_field, vtable, other_vtable],
    );
    let record_id = record.id;
    let root_vtable = b.vtable(Vec::new());
    let root_vtable_id = root_vtable.id;
    b.push(record);
    b.push(root_vtable);
    let out = run(&b.build());

    assert_eq!(
        messages(find(&out, other_base_id), Severity::Error),
        vec![VerifyIssue::UndesignatedBaseField.to_string()]
    );
    assert_eq!(
        messages(find(&out, other_vtable_id), Severity::Error),
        vec![VerifyIssue::UndesignatedVTable.to_string()]
    );
    assert_eq!(
        messages(find(&out, root_vtable_id), Severity::Error),
        vec![VerifyIssue::UndesignatedVTable.to_string()]
    );
    assert!(find(&out, record_id).is_emittable());
}

#[test]
fn record_with_unsupported_members_warns() {
    let mut b = LibraryBuilder::new();
    let hidden = b.unsupported("operator()", "ConversionOperator");
    let record = b.record("Callable", Vec::new());
    let id = record.id;
    let mut layout = record.as_record().cloned().unwrap();
    layout.unsupported_members = vec![hidden.clone(), hidden];
    b.push(record.with_kind(DeclKind::Record(layout)));
    let out = run(&b.build());

    let record = find(&out, id);
    assert_eq!(
        messages(record, Severity::Warning),
        vec!["record has 2 member(s) that could not be translated".to_string()]
    );
    assert!(record.is_emittable());
}

#[test]
fn unimplemented_field_warns() {
    let mut b = LibraryBuilder::new();
    let tail = b.unimplemented_field("tail", 8, "FlexibleArray");
    let id = tail.id;
    let record = b.record("Buffer", vec![tail]);
    b.push(record);
    let out = run(&b.build());

    assert_eq!(
        messages(find(&out, id), Severity::Warning),
        vec!["`FlexibleArray` fields are not supported".to_string()]
    );
}

#[test]
fn field_at_root_is_an_error() {
    let mut b = LibraryBuilder::new();
    let field = b.field("orphan", 0, i32_ty());
    let id = field.id;
    b.push(field);
    let out = run(&b.build());

    assert_eq!(
        messages(find(&out, id), Severity::Error),
        vec!["fields must be members of a record or a loose-declarations container".to_string()]
    );
}

// --- Unsupported and unresolved ---

#[test]
fn unsupported_declaration_keeps_a_single_error() {
    let mut b = LibraryBuilder::new();
    let explained = b.unsupported("Tmpl", "ClassTemplate");
    let explained_id = explained.id;
    let bare = b.decl(
        "Bare",
        DeclKind::Unsupported(Unsupported {
            kind: "Concept".to_string(),
        }),
    );
    let bare_id = bare.id;
    b.push(explained);
    b.push(bare);
    let out = run(&b.build());

    assert_eq!(find(&out, explained_id).diagnostics.len(), 1);
    assert_eq!(
        messages(find(&out, bare_id), Severity::Error),
        vec!["Concept declarations are not supported".to_string()]
    );
}

#[test]
fn unresolved_type_reference_is_an_error() {
    let mut b = LibraryBuilder::new();
    let field = b.field("next", 0, TypeRef::pointer_to(TypeRef::decl(DeclId(999), "Missing")));
    let id = field.id;
    let record = b.record("Node", vec![field]);
    b.push(record);
    let out = run(&b.build());

    assert_eq!(
        messages(find(&out, id), Severity::Error),
        vec!["type reference `Missing` does not resolve to a declaration".to_string()]
    );
}

// --- Whole-pass properties ---

/// A library that trips most rules at once.
fn messy_library() -> Library {
    let mut b = LibraryBuilder::new();
    b.add_file("include/messy.h");

    let flags = b.enumeration("Flags", TypeRef::Builtin(BuiltinType::NInt), Vec::new());
    let real = b.typedef("Real", TypeRef::Builtin(BuiltinType::F32));
    let real_ref = TypeRef::decl(real.id, "Real");

    let vtable_field = b.vtable_field();
    let draw = b.method("Draw", Vec::new());
    let draw = update_function(&draw, |function| {
        function.is_virtual = true;
        if let Some(abi) = &mut function.abi {
            abi.arguments = vec![ArgumentKind::Expand];
        }
    })
    .with_metadata(MetadataItem::SetLastError)
    .with_accessibility(Accessibility::ProtectedOrInternal);
    let vtable = b.vtable(Vec::new());
    let same_name = b.field("Messy", 8, i32_ty());
    let other = b.field("Messy_", 12, i32_ty());
    let bits = b.bitfield("bits", 16, 3, real_ref);
    let label = b.parameter("label", TypeRef::pointer_to(TypeRef::Void));
    let label = with_default(&label, ConstantValue::String("x".to_string()));
    let set_label = b.method("SetLabel", vec![label]);
    let dangling = b.field("next", 20, TypeRef::decl(DeclId(999), "Gone"));
    let record = b.record(
        "Messy",
        vec![vtable_field, draw, vtable, same_name, other, bits, set_label, dangling],
    );
    let half = {
        let vtable_field = b.vtable_field();
        b.record("Half", vec![vtable_field])
    };
    let free = b.function("Free", Vec::new());
    let hidden = b.static_field("Hidden", i32_ty()).with_accessibility(Accessibility::Private);
    let tmpl = b.unsupported("Tmpl", "ClassTemplate");

    b.push(flags);
    b.push(real);
    b.push(record);
    b.push(half);
    b.push(free);
    b.push(hidden);
    b.push(tmpl);
    b.build()
}

#[test]
fn verification_is_idempotent() {
    let once = run(&messy_library());
    let twice = run(&once);
    assert_eq!(twice, once);
}

#[test]
fn diagnostics_only_grow() {
    let input = run(&messy_library());
    // Nothing recorded by an earlier run may be dropped or reordered.
    let mut before = Vec::new();
    input.walk(&mut |_, decl| before.push((decl.id, decl.diagnostics.clone())));

    let out = run(&input);
    for (id, diagnostics) in before {
        let after = find(&out, id);
        assert!(after.diagnostics.extends(&diagnostics), "diagnostics of {id} shrank");
    }

    let raw = messy_library();
    let verified = run(&raw);
    raw.walk(&mut |_, decl| {
        let after = find(&verified, decl.id);
        assert!(after.diagnostics.extends(&decl.diagnostics));
    });
}

#[test]
fn verified_records_keep_layout_invariants() {
    let out = run(&messy_library());
    out.walk(&mut |_, decl| {
        let Some(record) = decl.as_record() else {
            return;
        };
        if decl.has_errors() {
            return;
        }
        assert_eq!(record.vtable.is_none(), record.vtable_field.is_none());
        let designated_vtables = record
            .members
            .iter()
            .filter(|m| m.is_vtable() && Some(m.id) == record.vtable)
            .count();
        assert!(designated_vtables <= 1);
        let designated_bases = record
            .members
            .iter()
            .filter(|m| m.is_base_field() && Some(m.id) == record.non_virtual_base_field)
            .count();
        assert!(designated_bases <= 1);
    });
}

#[test]
fn messy_library_reports_expected_errors() {
    let out = run(&messy_library());
    let errors: Vec<String> = out
        .diagnostics()
        .iter()
        .filter(|d| d.diagnostic.is_error())
        .map(|d| d.path.clone())
        .collect();
    assert_eq!(
        errors,
        vec![
            "Messy::bits".to_string(),
            "Messy::next".to_string(),
            "Half".to_string(),
            "Free".to_string(),
            "Hidden".to_string(),
            "Tmpl".to_string(),
        ]
    );
}

#[test]
fn reused_verifier_counts_each_run_separately() {
    let mut b = LibraryBuilder::new();
    let draw = b
        .method("Draw", Vec::new())
        .with_accessibility(Accessibility::Protected);
    let library = hosted(&mut b, vec![draw]);

    let mut verifier = Verifier::new(VerifyConfig::default());
    transform_library(&mut verifier, &library);
    let first = verifier.reported();
    assert!(first > 0);

    transform_library(&mut verifier, &library);
    assert_eq!(verifier.reported(), first);
}
