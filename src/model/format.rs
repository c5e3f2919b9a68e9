//! Compact, indented textual dump of a declaration tree.

use std::fmt::Write;

use crate::model::decl::{Accessibility, Decl, DeclKind, FieldKind};
use crate::model::library::Library;

pub fn format_library(library: &Library) -> String {
    let mut out = String::new();
    for decl in library.declarations() {
        format_decl_into(&mut out, decl, 0);
    }
    if !library.broken_declarations().is_empty() {
        out.push_str("broken:\n");
        for decl in library.broken_declarations() {
            format_decl_into(&mut out, decl, 1);
        }
    }
    out
}

pub fn format_decl(decl: &Decl) -> String {
    let mut out = String::new();
    format_decl_into(&mut out, decl, 0);
    out
}

fn format_decl_into(out: &mut String, decl: &Decl, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}{} {}", decl.kind.name(), display_name(decl));
    let _ = write!(out, "{}", header_details(decl));
    if decl.accessibility != Accessibility::Public {
        let _ = write!(out, " ({})", decl.accessibility);
    }
    out.push('\n');

    for diagnostic in &decl.diagnostics {
        let _ = writeln!(out, "{indent}  ! {diagnostic}");
    }
    for child in decl.children() {
        format_decl_into(out, child, depth + 1);
    }
}

fn display_name(decl: &Decl) -> &str {
    if decl.name.is_empty() {
        "<anonymous>"
    } else {
        &decl.name
    }
}

fn header_details(decl: &Decl) -> String {
    match &decl.kind {
        DeclKind::Record(record) => {
            let mut details = String::new();
            if record.vtable.is_some() {
                details.push_str(" [vtable]");
            }
            if !record.unsupported_members.is_empty() {
                let _ = write!(
                    details,
                    " [{} unsupported]",
                    record.unsupported_members.len()
                );
            }
            details
        }
        DeclKind::Enum(enum_decl) => {
            if enum_decl.translate_as_loose_constants {
                format!(": {} [loose]", enum_decl.underlying_type)
            } else {
                format!(": {}", enum_decl.underlying_type)
            }
        }
        DeclKind::EnumConstant(constant) => format!(" = {}", constant.value),
        DeclKind::Function(function) => {
            let mut details = format!(" -> {}", function.return_type);
            if function.is_virtual {
                details.push_str(" [virtual]");
            }
            if function.is_instance_method {
                details.push_str(" [instance]");
            }
            if function.abi.is_none() {
                details.push_str(" [no abi]");
            }
            details
        }
        DeclKind::Parameter(parameter) => match &parameter.default_value {
            Some(value) => format!(": {} = {value}", parameter.ty),
            None => format!(": {}", parameter.ty),
        },
        DeclKind::Field(field) => match &field.kind {
            FieldKind::Normal { ty } | FieldKind::Base { ty } => {
                format!(": {ty} @{}", field.offset)
            }
            FieldKind::VTablePointer => format!(" @{}", field.offset),
            FieldKind::BitField {
                bit_offset,
                bit_width,
                ty,
            } => format!(": {ty} @{}.{bit_offset}:{bit_width}", field.offset),
            FieldKind::Unimplemented { kind, .. } => format!(" ({kind}) @{}", field.offset),
        },
        DeclKind::StaticField(static_field) => format!(": {}", static_field.ty),
        DeclKind::VTable(vtable) => format!(" ({} entries)", vtable.entries.len()),
        DeclKind::Typedef(typedef) => format!(" = {}", typedef.underlying_type),
        DeclKind::Unsupported(unsupported) => format!(" ({})", unsupported.kind),
        DeclKind::UndefinedRecord | DeclKind::Synthesized(_) => String::new(),
    }
}
