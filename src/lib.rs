//! # lsif-tsc-base
//!
//! Core library for turning a type-checked TypeScript program into an LSIF
//! graph: symbol identity, export paths, per-symbol accumulation of
//! definitions and references, and streaming emission of the result.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! index   → Resolution, symbol data, lifecycle, tree walk
//!   ↓
//! graph   → Vertices/edges, id assignment, emitters, queries
//!   ↓
//! program → The checker oracle (trait + in-memory implementation)
//!   ↓
//! base    → Primitives (handles, TextRange, LineIndex)
//! ```
//!
//! `config` and `error` are shared by all layers.
//!
//! ## Example
//!
//! ```
//! use lsif::{IndexOptions, Indexer, MemoryEmitter};
//! use lsif::program::{NodeKind, ProgramBuilder, SymbolFlags};
//!
//! let mut b = ProgramBuilder::new();
//! let root = b.file("/p/a.ts", "export const x = 10;");
//! let module = b.module(root);
//! let list = b.node_at(root, NodeKind::VariableDeclarationList, "const x = 10");
//! let (decl, _) = b.declaration(list, NodeKind::VariableDeclaration, "x = 10", "x");
//! let x = b.symbol("x", SymbolFlags::BLOCK_SCOPED_VARIABLE);
//! b.declare(x, decl).export(module, x);
//! let program = b.build();
//!
//! let mut sink = MemoryEmitter::new();
//! let summary = Indexer::new(&program, IndexOptions::new("/p"))
//!     .index(&mut sink)
//!     .unwrap();
//! assert_eq!(summary.documents, 1);
//! assert!(sink.monikers().any(|m| m.identifier == "a:x"));
//! ```

/// Foundation types: handles, text ranges, line index
pub mod base;

/// Run options
pub mod config;

/// Crate error type
pub mod error;

/// LSIF records, builder, emitters
pub mod graph;

/// Symbol resolution and emission
pub mod index;

/// The type-checker oracle
pub mod program;

pub use base::{FileId, LineIndex, LineRange, NodeId, Position, SymbolRef, TextRange, TextSize, TypeRef};
pub use config::{IndexOptions, PackageInfo};
pub use error::{IndexError, Result};
pub use graph::{Element, Emitter, GraphQuery, JsonLinesEmitter, MemoryEmitter};
pub use index::{IndexSummary, Indexer, MonikerLinker, NpmMonikerLinker, SymbolId};
pub use program::{MemoryProgram, Program, ProgramBuilder};
