use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use interop_model::config::PipelineConfig;
use interop_model::emit::{Backend, emit_library};
use interop_model::model::builder::LibraryBuilder;
use interop_model::model::format::format_library;
use interop_model::model::{
    Accessibility, ArgumentKind, BuiltinType, ConstantValue, Decl, DeclKind, Library,
    MetadataItem, Parameter, TypeRef, VTableEntry, VTableEntryKind,
};
use interop_model::pipeline::{Pipeline, PipelineError};

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Comma-separated list of things to dump: input,tree,diagnostics,emit
    #[clap(long)]
    dump: Option<String>,

    /// Pipeline configuration (JSON)
    #[clap(long)]
    config: Option<PathBuf>,
}

#[derive(Default)]
struct DumpFlags {
    input: bool,
    tree: bool,
    diagnostics: bool,
    emit: bool,
}

impl DumpFlags {
    fn parse(dump: Option<&str>) -> Self {
        let mut flags = Self::default();
        let Some(dump) = dump else {
            return flags;
        };
        for item in dump.split(',').map(|s| s.trim().to_lowercase()) {
            match item.as_str() {
                "input" => flags.input = true,
                "tree" => flags.tree = true,
                "diagnostics" => flags.diagnostics = true,
                "emit" => flags.emit = true,
                "" => {}
                _ => {
                    eprintln!("[WARN] unknown dump flag: {item}");
                }
            }
        }
        flags
    }
}

/// Prints the declarations a code generator would receive.
struct PrintBackend;

impl Backend for PrintBackend {
    fn emit(&mut self, parents: &[&Decl], decl: &Decl) {
        let indent = "  ".repeat(parents.len());
        println!("{indent}{} {}", decl.kind.name(), decl.name);
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interop_model=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let flags = DumpFlags::parse(args.dump.as_deref());

    let config = match &args.config {
        Some(path) => match PipelineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                println!("[ERROR] {e}");
                return ExitCode::FAILURE;
            }
        },
        None => PipelineConfig::default(),
    };

    let library = sample_library();
    if flags.input {
        dump_section("Input", &format_library(&library));
    }

    let output = match Pipeline::from_config(&config).run(&library) {
        Ok(output) => output,
        Err(PipelineError::ErrorsRemain { count, library }) => {
            if flags.diagnostics {
                dump_diagnostics(&library);
            }
            println!("[ERROR] {count} error(s) remain after verification");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            println!("[ERROR] {e}");
            return ExitCode::FAILURE;
        }
    };

    if flags.tree {
        dump_section("Tree", &format_library(&output));
    }
    if flags.diagnostics {
        dump_diagnostics(&output);
    }

    let summary = if flags.emit {
        println!("Emit:");
        println!("--------------------------------");
        let summary = emit_library(&output, &mut PrintBackend);
        println!("--------------------------------");
        summary
    } else {
        emit_library(&output, &mut NullBackend)
    };

    println!(
        "[SUCCESS] {} declaration(s) emitted, {} skipped, {} diagnostic(s) reported",
        summary.emitted, summary.skipped, summary.reported
    );
    ExitCode::SUCCESS
}

struct NullBackend;

impl Backend for NullBackend {
    fn emit(&mut self, _parents: &[&Decl], _decl: &Decl) {}
}

fn dump_section(title: &str, body: &str) {
    println!("{title}:");
    println!("--------------------------------");
    print!("{body}");
    println!("--------------------------------");
}

fn dump_diagnostics(library: &Library) {
    println!("Diagnostics:");
    println!("--------------------------------");
    for diagnostic in library.diagnostics() {
        println!("{diagnostic}");
    }
    println!("--------------------------------");
}

/// A small header's worth of declarations exercising most verification
/// rules.
fn sample_library() -> Library {
    let mut b = LibraryBuilder::new();
    b.add_file("include/widget.h");

    let flags = {
        let read = b.enum_constant("Read", 1);
        let write = b.enum_constant("Write", 2);
        b.enumeration("Flags", TypeRef::Builtin(BuiltinType::NUInt), vec![read, write])
    };
    let flags_ref = TypeRef::decl(flags.id, "Flags");
    let handle = b.typedef("Handle", TypeRef::pointer_to(TypeRef::Void));
    let handle_ref = TypeRef::decl(handle.id, "Handle");

    let widget = {
        let vtable_field = b.vtable_field();
        let draw = {
            let mut draw = b.method("Draw", Vec::new());
            if let DeclKind::Function(function) = &mut draw.kind {
                function.is_virtual = true;
            }
            draw.with_metadata(MetadataItem::SetLastError)
        };
        let vtable = b.vtable(vec![VTableEntry {
            name: "Draw".to_string(),
            kind: VTableEntryKind::FunctionPointer,
            method: Some(draw.id),
        }]);
        let widget_field = b.field("Widget", 8, TypeRef::Builtin(BuiltinType::I32));
        let mode = b.bitfield("Mode", 12, 3, flags_ref);
        let resize = {
            let width = b.parameter("width", TypeRef::Builtin(BuiltinType::I32));
            let label = b.parameter("label", TypeRef::Void);
            let label = label.with_kind(DeclKind::Parameter(Parameter {
                ty: TypeRef::pointer_to(TypeRef::Builtin(BuiltinType::Char16)),
                default_value: Some(ConstantValue::String("untitled".to_string())),
            }));
            let mut resize = b.method("Resize", vec![width, label]);
            if let DeclKind::Function(function) = &mut resize.kind {
                // The receiver is split across registers.
                let receiver = function
                    .abi
                    .as_mut()
                    .and_then(|abi| abi.arguments.first_mut());
                if let Some(receiver) = receiver {
                    *receiver = ArgumentKind::Expand;
                }
            }
            resize.with_accessibility(Accessibility::Protected)
        };
        b.record(
            "Widget",
            vec![vtable_field, vtable, draw, widget_field, mode, resize],
        )
    };

    let create = {
        let parent = b.parameter("parent", handle_ref);
        b.function("CreateWidget", vec![parent])
    };
    let template = b.unsupported("Container", "ClassTemplate");

    b.push(flags);
    b.push(handle);
    b.push(widget);
    b.push(create);
    b.push(template);
    b.build()
}
