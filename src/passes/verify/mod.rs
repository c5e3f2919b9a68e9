//! Target representability verification.
//!
//! The last pass before emission. Every rule either repairs a declaration
//! into something the target can represent (with a Warning) or tags it with
//! an Error so the backend skips it. Rules only ever add diagnostics through
//! the `ensure_*` helpers, which makes the pass idempotent.

mod abi;
mod errors;
mod types;

pub use errors::VerifyIssue;

use tracing::{debug, trace};

use crate::config::VerifyConfig;
use crate::model::{
    Accessibility, ConstantValue, Decl, DeclId, DeclKind, Enum, EnumConstant, Field, FieldKind,
    Function, Library, MetadataItem, MetadataKind, Parameter, Record, StaticField, Synthesized,
    SynthesizedKind, Unsupported, VTable,
};
use crate::transform::{
    TransformContext, TransformResult, Transformation, dispatch_declaration, dispatch_field,
    transform_library,
};

/// Runs the verification pass over `library` with the given configuration.
pub fn verify(library: &Library, config: &VerifyConfig) -> Library {
    transform_library(&mut Verifier::new(config.clone()), library)
}

pub struct Verifier {
    config: VerifyConfig,
    reported: usize,
}

impl Verifier {
    pub fn new(config: VerifyConfig) -> Self {
        Self {
            config,
            reported: 0,
        }
    }

    /// Issues found by the most recent run.
    pub fn reported(&self) -> usize {
        self.reported
    }

    fn report(&mut self, decl: Decl, issue: VerifyIssue) -> Decl {
        trace!(decl = %decl.name, id = %decl.id, %issue, "verification issue");
        self.reported += 1;
        decl.ensure_diagnostic(issue.severity(), issue.to_string())
    }

    /// Returns the fixed declaration when an accessibility rule fired.
    fn check_accessibility(&mut self, ctx: &TransformContext<'_>, decl: &Decl) -> Option<Decl> {
        let accessibility = decl.accessibility;
        if ctx.is_root() && !accessibility.is_valid_at_root() {
            let fixed = decl.with_accessibility(Accessibility::Internal);
            return Some(self.report(fixed, VerifyIssue::InvalidRootAccessibility(accessibility)));
        }
        if accessibility.is_protected() {
            let fixed = decl.with_accessibility(Accessibility::Internal);
            return Some(self.report(fixed, VerifyIssue::ProtectedAccessibility(accessibility)));
        }
        None
    }

    /// Context and naming rules shared by every field kind.
    fn check_member_field(&mut self, ctx: &TransformContext<'_>, decl: &Decl) -> Decl {
        let mut out = decl.clone();
        if !ctx.is_valid_field_or_method_context() {
            out = self.report(out, VerifyIssue::FieldInvalidContext(decl.kind.name()));
        }
        if let Some(new_name) = disambiguated_name(ctx, decl) {
            out = out
                .with_metadata(MetadataItem::OriginalName(decl.name.clone()))
                .with_name(new_name.clone());
            out = self.report(out, VerifyIssue::FieldRenamed(new_name));
        }
        out
    }
}

impl Transformation for Verifier {
    fn name(&self) -> &'static str {
        "verify"
    }

    fn pre_transform_library(&mut self, _library: &Library) {
        self.reported = 0;
    }

    fn post_transform_library(&mut self, library: Library) -> Library {
        let resolved = transform_library(&mut ResolveTypeReferences { reported: 0 }, &library);
        debug!(issues = self.reported, "verification complete");
        resolved
    }

    fn transform_declaration(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
    ) -> TransformResult {
        let Some(fixed) = self.check_accessibility(ctx, decl) else {
            return dispatch_declaration(self, ctx, decl);
        };
        match dispatch_declaration(self, ctx, &fixed) {
            TransformResult::Unchanged => TransformResult::Replace(fixed),
            result => result,
        }
    }

    fn transform_record(
        &mut self,
        _ctx: &TransformContext<'_>,
        decl: &Decl,
        record: &Record,
    ) -> TransformResult {
        let mut out = decl.clone();

        if !record.unsupported_members.is_empty() {
            out = self.report(
                out,
                VerifyIssue::UnsupportedMembers(record.unsupported_members.len()),
            );
        }

        if record.vtable.is_some() != record.vtable_field.is_some() {
            out = self.report(out, VerifyIssue::VTableFieldMismatch);
        }

        let designated: [(&'static str, Option<DeclId>, fn(&Decl) -> bool); 3] = [
            ("vtable", record.vtable, Decl::is_vtable),
            ("vtable pointer field", record.vtable_field, Decl::is_vtable_field),
            (
                "non-virtual base field",
                record.non_virtual_base_field,
                Decl::is_base_field,
            ),
        ];
        for (slot, id, is_kind) in designated {
            let Some(id) = id else {
                continue;
            };
            if !record.members.iter().any(|m| m.id == id && is_kind(m)) {
                out = self.report(out, VerifyIssue::DesignatedMemberMissing(slot));
            }
        }

        TransformResult::from_update(decl, out)
    }

    fn transform_enum(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
        enum_decl: &Enum,
    ) -> TransformResult {
        let can_be_fields = ctx.is_valid_field_or_method_context();
        let can_be_enum =
            types::is_valid_enum_underlying_type(ctx.library(), &enum_decl.underlying_type);
        let with_loose = |loose: bool| {
            decl.with_kind(DeclKind::Enum(Enum {
                translate_as_loose_constants: loose,
                ..enum_decl.clone()
            }))
        };

        if !can_be_fields && !can_be_enum {
            let inner = with_loose(true);
            let inner = self.report(inner, VerifyIssue::EnumWrapped(decl.name.clone()));
            let mut wrapper = Decl::new(
                ctx.new_id(),
                decl.name.clone(),
                decl.file,
                DeclKind::Synthesized(Synthesized {
                    kind: SynthesizedKind::LooseDeclarations,
                    members: vec![inner],
                }),
            );
            wrapper.namespace = decl.namespace.clone();
            wrapper.accessibility = decl.accessibility;
            return TransformResult::Replace(wrapper);
        }

        if enum_decl.translate_as_loose_constants && !can_be_fields {
            let out = self.report(with_loose(false), VerifyIssue::LooseConstantsInvalidContext);
            return TransformResult::Replace(out);
        }

        if !enum_decl.translate_as_loose_constants && !can_be_enum {
            let issue = VerifyIssue::InvalidEnumUnderlyingType(enum_decl.underlying_type.clone());
            let out = self.report(with_loose(true), issue);
            return TransformResult::Replace(out);
        }

        TransformResult::Unchanged
    }

    fn transform_enum_constant(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
        _constant: &EnumConstant,
    ) -> TransformResult {
        if matches!(ctx.parent().map(|p| &p.kind), Some(DeclKind::Enum(_))) {
            return TransformResult::Unchanged;
        }
        let out = self.report(decl.clone(), VerifyIssue::EnumConstantOutsideEnum);
        TransformResult::from_update(decl, out)
    }

    fn transform_function(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
        function: &Function,
    ) -> TransformResult {
        let mut out = decl.clone();

        if !ctx.is_valid_field_or_method_context() {
            out = self.report(out, VerifyIssue::FunctionInvalidContext);
        }

        if function.is_virtual && out.metadata.has(MetadataKind::SetLastError) {
            out = out.without_metadata(MetadataKind::SetLastError);
            out = self.report(out, VerifyIssue::VirtualSetLastError);
        }

        match &function.abi {
            None => {
                self.reported += 1;
                out = out.ensure_any_error(VerifyIssue::MissingAbi.to_string());
            }
            Some(abi) => {
                let issues =
                    abi::check(decl, function, abi, self.config.default_calling_convention);
                for issue in issues {
                    out = self.report(out, issue);
                }
            }
        }

        TransformResult::from_update(decl, out)
    }

    fn transform_parameter(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
        parameter: &Parameter,
    ) -> TransformResult {
        let mut out = decl.clone();

        if !matches!(ctx.parent().map(|p| &p.kind), Some(DeclKind::Function(_))) {
            out = self.report(out, VerifyIssue::ParameterOutsideFunction);
        }

        let without_default = |decl: &Decl| {
            decl.with_kind(DeclKind::Parameter(Parameter {
                ty: parameter.ty.clone(),
                default_value: None,
            }))
        };
        match &parameter.default_value {
            None => {}
            Some(ConstantValue::String(_)) => {
                out = self.report(without_default(&out), VerifyIssue::StringDefaultValue);
            }
            // Already reported by the front end.
            Some(ConstantValue::Unsupported(_)) => out = without_default(&out),
            Some(ConstantValue::Integer(_) | ConstantValue::Float(_)) => {
                if !types::can_have_default_value(ctx.library(), &parameter.ty) {
                    let issue = VerifyIssue::IneligibleDefaultValue(parameter.ty.clone());
                    out = self.report(without_default(&out), issue);
                }
            }
        }

        TransformResult::from_update(decl, out)
    }

    fn transform_field(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
        field: &Field,
    ) -> TransformResult {
        let checked = self.check_member_field(ctx, decl);
        match dispatch_field(self, ctx, &checked, field) {
            TransformResult::Unchanged => TransformResult::from_update(decl, checked),
            result => result,
        }
    }

    fn transform_bitfield(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
        field: &Field,
    ) -> TransformResult {
        let FieldKind::BitField { ty, .. } = &field.kind else {
            return TransformResult::Unchanged;
        };
        if types::is_valid_bitfield_type(ctx.library(), ty) {
            return TransformResult::Unchanged;
        }
        let out = self.report(decl.clone(), VerifyIssue::InvalidBitFieldType(ty.clone()));
        TransformResult::from_update(decl, out)
    }

    fn transform_base_field(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
        _field: &Field,
    ) -> TransformResult {
        let designated = ctx
            .parent()
            .and_then(Decl::as_record)
            .is_some_and(|record| record.non_virtual_base_field == Some(decl.id));
        if designated {
            return TransformResult::Unchanged;
        }
        let out = self.report(decl.clone(), VerifyIssue::UndesignatedBaseField);
        TransformResult::from_update(decl, out)
    }

    fn transform_unimplemented_field(
        &mut self,
        _ctx: &TransformContext<'_>,
        decl: &Decl,
        field: &Field,
    ) -> TransformResult {
        let FieldKind::Unimplemented { kind, .. } = &field.kind else {
            return TransformResult::Unchanged;
        };
        let out = self.report(decl.clone(), VerifyIssue::UnimplementedField(kind.clone()));
        TransformResult::from_update(decl, out)
    }

    fn transform_static_field(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
        _static_field: &StaticField,
    ) -> TransformResult {
        let out = self.check_member_field(ctx, decl);
        TransformResult::from_update(decl, out)
    }

    fn transform_vtable(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
        _vtable: &VTable,
    ) -> TransformResult {
        let designated = ctx
            .parent()
            .and_then(Decl::as_record)
            .is_some_and(|record| record.vtable == Some(decl.id));
        if designated {
            return TransformResult::Unchanged;
        }
        let out = self.report(decl.clone(), VerifyIssue::UndesignatedVTable);
        TransformResult::from_update(decl, out)
    }

    fn transform_unsupported(
        &mut self,
        _ctx: &TransformContext<'_>,
        decl: &Decl,
        unsupported: &Unsupported,
    ) -> TransformResult {
        let issue = VerifyIssue::UnsupportedDeclaration(unsupported.kind.clone());
        TransformResult::from_update(decl, decl.ensure_any_error(issue.to_string()))
    }
}

/// New name for a field that shares its enclosing type's name: underscores
/// are appended until no sibling uses the name. The n-th such field takes the
/// n-th free name so that renamed siblings never collide with each other.
fn disambiguated_name(ctx: &TransformContext<'_>, decl: &Decl) -> Option<String> {
    let parent = ctx.parent()?;
    if decl.name.is_empty() || decl.name != parent.name {
        return None;
    }
    let siblings = parent.children();
    let earlier = siblings
        .iter()
        .take_while(|sibling| sibling.id != decl.id)
        .filter(|sibling| sibling.name == decl.name)
        .count();

    let mut name = decl.name.clone();
    let mut remaining = earlier + 1;
    while remaining > 0 {
        name.push('_');
        if !siblings.iter().any(|sibling| sibling.name == name) {
            remaining -= 1;
        }
    }
    Some(name)
}

/// Whole-library phase: every declaration reference in a declaration's own
/// type slots must resolve in the rewritten library.
struct ResolveTypeReferences {
    reported: usize,
}

impl Transformation for ResolveTypeReferences {
    fn name(&self) -> &'static str {
        "verify-type-references"
    }

    fn post_transform_library(&mut self, library: Library) -> Library {
        debug!(unresolved = self.reported, "type reference resolution complete");
        library
    }

    fn transform_declaration(
        &mut self,
        ctx: &TransformContext<'_>,
        decl: &Decl,
    ) -> TransformResult {
        let library = ctx.library();
        let mut unresolved = Vec::new();
        decl.for_each_type_ref(&mut |ty| {
            ty.for_each_decl_ref(&mut |decl_ref| {
                if !library.contains(decl_ref.id) && !unresolved.contains(&decl_ref.name) {
                    unresolved.push(decl_ref.name.clone());
                }
            })
        });
        if unresolved.is_empty() {
            return TransformResult::Unchanged;
        }

        let mut out = decl.clone();
        for name in unresolved {
            self.reported += 1;
            let issue = VerifyIssue::UnresolvedTypeRef(name);
            out = out.ensure_diagnostic(issue.severity(), issue.to_string());
        }
        TransformResult::from_update(decl, out)
    }
}

#[cfg(test)]
#[path = "../../tests/passes/t_verify.rs"]
mod tests;
