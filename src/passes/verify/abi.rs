//! ABI arrangement checks for functions.

use crate::model::{AstCallingConvention, CallingConvention, Decl, Function, FunctionAbi};
use crate::passes::verify::errors::VerifyIssue;

/// Collects the ABI details of `function` the target may mishandle.
pub(super) fn check(
    decl: &Decl,
    function: &Function,
    abi: &FunctionAbi,
    default_convention: CallingConvention,
) -> Vec<VerifyIssue> {
    let mut issues = Vec::new();

    if abi.calling_convention != default_convention
        || abi.effective_calling_convention != default_convention
    {
        issues.push(VerifyIssue::NonDefaultCallingConvention {
            native: abi.calling_convention,
            effective: abi.effective_calling_convention,
        });
    }

    if let AstCallingConvention::Unrecognized(spelling) = &abi.ast_calling_convention {
        issues.push(VerifyIssue::UnrecognizedCallingConvention(spelling.clone()));
    }

    if abi.flags.uses_in_alloca {
        issues.push(VerifyIssue::InAllocaArguments);
    }

    if abi.flags.has_ext_parameter_infos {
        issues.push(VerifyIssue::ExtParameterInfo);
    }

    if abi.return_kind.is_expanded() {
        issues.push(VerifyIssue::ExpandedReturn(abi.return_kind));
    }

    for (index, kind) in abi.arguments.iter().enumerate() {
        if kind.is_expanded() {
            issues.push(VerifyIssue::ExpandedArgument(
                describe_argument(decl, function, index),
                *kind,
            ));
        }
    }

    issues
}

/// Names ABI argument `index`; instance methods pass the receiver in slot 0.
fn describe_argument(decl: &Decl, function: &Function, index: usize) -> String {
    let parameter_index = if function.is_instance_method {
        if index == 0 {
            return "this pointer parameter".to_string();
        }
        index - 1
    } else {
        index
    };

    match function.parameters.get(parameter_index) {
        Some(parameter) if !parameter.name.is_empty() => {
            format!("parameter #{parameter_index} `{}`", parameter.name)
        }
        _ => format!("parameter #{parameter_index} of `{}`", decl.name),
    }
}
