//! Root-level functions and static fields cannot stand alone in the target;
//! this pass gathers them into one synthesized container per source file.

use indexmap::IndexMap;
use tracing::debug;

use crate::model::{Decl, DeclIdGen, DeclKind, FileId, Library, Synthesized, SynthesizedKind};
use crate::transform::Transformation;

/// Container name used when the originating file is unknown.
const FALLBACK_CONTAINER_NAME: &str = "Globals";

#[derive(Debug, Default)]
pub struct WrapLooseDeclarations {
    wrapped: usize,
}

impl WrapLooseDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of declarations moved into containers by the last run.
    pub fn wrapped(&self) -> usize {
        self.wrapped
    }
}

impl Transformation for WrapLooseDeclarations {
    fn name(&self) -> &'static str {
        "wrap-loose-declarations"
    }

    fn pre_transform_library(&mut self, _library: &Library) {
        self.wrapped = 0;
    }

    fn post_transform_library(&mut self, library: Library) -> Library {
        let mut roots = Vec::with_capacity(library.declarations().len());
        let mut groups: IndexMap<(FileId, Option<String>), Vec<Decl>> = IndexMap::new();
        for decl in library.declarations() {
            match decl.kind {
                DeclKind::Function(_) | DeclKind::StaticField(_) => groups
                    .entry((decl.file, decl.namespace.clone()))
                    .or_default()
                    .push(decl.clone()),
                _ => roots.push(decl.clone()),
            }
        }
        if groups.is_empty() {
            return library;
        }

        let mut ids = DeclIdGen::starting_at(library.next_id());
        for ((file, namespace), members) in groups {
            self.wrapped += members.len();
            let mut container = Decl::new(
                ids.new_id(),
                container_name(&library, file),
                file,
                DeclKind::Synthesized(Synthesized {
                    kind: SynthesizedKind::LooseDeclarations,
                    members,
                }),
            );
            container.namespace = namespace;
            roots.push(container);
        }
        debug!(wrapped = self.wrapped, "wrapped loose declarations");

        library
            .with_declarations(roots)
            .with_next_id(ids.watermark())
    }
}

fn container_name(library: &Library, file: FileId) -> String {
    library
        .file_path(file)
        .and_then(|path| path.file_stem())
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty() && !stem.starts_with('<'))
        .unwrap_or(FALLBACK_CONTAINER_NAME)
        .to_string()
}

#[cfg(test)]
#[path = "../tests/passes/t_loose.rs"]
mod tests;
