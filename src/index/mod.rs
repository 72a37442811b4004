//! Symbol resolution and graph emission.
//!
//! ## Architecture
//!
//! ```text
//! Indexer         → one run over a checked Program
//!   ↓
//! Visitor         → walks each source file, emits reference ranges
//!   ↓
//! IndexContext    → get-or-create of symbol data (definitions, hover, monikers)
//!   ↓
//! ResolverKind    → decides which kind of data a symbol gets
//!   ↓
//! DataManager     → owns symbol/document data, closes it at scope exits
//!   ↓
//! Graph           → vertices and edges, streamed to an Emitter
//! ```
//!
//! `Symbols` (export paths, inheritance, scoped overrides) and
//! `SymbolKeys` (stable symbol identity) are side tables consulted along
//! the way.

mod context;
mod data;
mod manager;
mod moniker;
mod resolver;
mod symbol_key;
mod symbols;
mod visitor;

use tracing::{debug, info};

use crate::config::IndexOptions;
use crate::error::Result;
use crate::graph::{Emitter, Graph};
use crate::program::Program;

pub use context::{Emit, IndexContext, definition_kind};
pub use data::{
    DefinitionInfo, DocumentData, LifeCycle, ProjectData, Reference, ReferenceRole, SymbolData,
    SymbolDataId, SymbolDataKind,
};
pub use manager::DataManager;
pub use moniker::{
    MonikerLinker, NPM_SCHEME, NpmMonikerLinker, TSC_SCHEME, module_path, tsc_identifier,
};
pub use resolver::{ResolverKind, composite_receiver_types, forward_type_alias};
pub use symbol_key::{SymbolId, SymbolKeys, compute_key};
pub use symbols::{Disposer, LocationKind, Symbols};
pub use visitor::Visitor;

/// Counts reported at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub documents: usize,
    pub symbols: usize,
    pub elements: usize,
}

/// Indexes a checked program into a graph.
pub struct Indexer<'a> {
    program: &'a dyn Program,
    options: IndexOptions,
    linker: Option<Box<dyn MonikerLinker>>,
}

impl<'a> Indexer<'a> {
    /// A run with the linker the options describe, if any.
    pub fn new(program: &'a dyn Program, options: IndexOptions) -> Self {
        let linker = options
            .linker()
            .map(|linker| Box::new(linker) as Box<dyn MonikerLinker>);
        Self {
            program,
            options,
            linker,
        }
    }

    pub fn with_linker(mut self, linker: impl MonikerLinker + 'static) -> Self {
        self.linker = Some(Box::new(linker));
        self
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Walk every project file and stream the graph into `emitter`.
    ///
    /// Default library and external library files are not walked; they
    /// only get documents for declarations referenced from walked files.
    pub fn index(&self, emitter: &mut dyn Emitter) -> Result<IndexSummary> {
        let program = self.program;
        let manager = DataManager::new(
            program,
            Graph::new(emitter),
            self.options.project_root.clone(),
            self.options.emit_document_symbols,
        )?;
        let emit = Emit {
            hover: self.options.emit_hover,
            monikers: self.options.emit_monikers,
        };
        let mut cx = IndexContext::new(program, manager, emit, self.linker.as_deref());

        for file in program.source_files() {
            if program.is_source_file_default_library(file)
                || program.is_source_file_from_external_library(file)
            {
                debug!(?file, "skipping library file");
                continue;
            }
            Visitor::new(&mut cx).visit_file(file)?;
        }

        cx.manager.project_processed()?;
        cx.manager.graph().flush()?;

        let summary = IndexSummary {
            documents: cx.manager.document_count(),
            symbols: cx.manager.symbol_count(),
            elements: cx.manager.emitted(),
        };
        info!(
            documents = summary.documents,
            symbols = summary.symbols,
            elements = summary.elements,
            "index complete"
        );
        Ok(summary)
    }
}
