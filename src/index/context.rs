//! Creation of symbol data.
//!
//! [`IndexContext`] owns everything one run needs besides the walk itself:
//! the [`DataManager`], the export path tables and the per-file line
//! indexes. Its central operation is [`IndexContext::get_or_create`], which
//! turns a checker symbol into a live [`SymbolDataId`], emitting the
//! definition ranges, hover and monikers of the symbol on first sight.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::base::{FileId, LineIndex, LineRange, NodeId, SymbolRef, TextRange};
use crate::error::{IndexError, Result};
use crate::graph::{MarkedString, MonikerKind, RangeTag, SymbolKind, VertexRef};
use crate::program::{NodeKind, Program};

use super::data::{DefinitionInfo, SymbolData, SymbolDataId, SymbolDataKind};
use super::manager::DataManager;
use super::moniker::{self, MonikerLinker, TSC_SCHEME};
use super::resolver::{ResolverKind, composite_receiver_types};
use super::symbols::{LocationKind, Symbols, ancestors};

/// Which optional vertices a run produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Emit {
    pub hover: bool,
    pub monikers: bool,
}

pub struct IndexContext<'a> {
    program: &'a dyn Program,
    emit: Emit,
    linker: Option<&'a dyn MonikerLinker>,
    pub(crate) manager: DataManager<'a>,
    pub(crate) symbols: Symbols,
    pub(crate) line_indexes: FxHashMap<FileId, LineIndex>,
    /// Definition ranges keyed by the name node they cover.
    pub(crate) definitions: FxHashMap<NodeId, VertexRef>,
}

impl<'a> IndexContext<'a> {
    pub fn new(
        program: &'a dyn Program,
        manager: DataManager<'a>,
        emit: Emit,
        linker: Option<&'a dyn MonikerLinker>,
    ) -> Self {
        Self {
            program,
            emit,
            linker,
            manager,
            symbols: Symbols::new(),
            line_indexes: FxHashMap::default(),
            definitions: FxHashMap::default(),
        }
    }

    pub fn program(&self) -> &'a dyn Program {
        self.program
    }

    /// The definition range emitted for a declaration name, if any.
    pub fn definition_range(&self, name: NodeId) -> Option<VertexRef> {
        self.definitions.get(&name).copied()
    }

    /// Drop what was only kept for the walk of `file`.
    pub fn file_processed(&mut self, file: FileId) {
        let program = self.program;
        self.line_indexes.remove(&file);
        self.definitions
            .retain(|&name, _| program.node_file(name) != file);
    }

    pub fn line_range(&mut self, file: FileId, range: TextRange) -> LineRange {
        let program = self.program;
        self.line_indexes
            .entry(file)
            .or_insert_with(|| LineIndex::new(program.file_text(file).unwrap_or_else(|| Arc::from(""))))
            .line_range(range)
    }

    /// The data for `symbol`, created on first use.
    ///
    /// `location` is the node that triggered the resolution. Synthetic
    /// symbols cannot be created without one.
    pub fn get_or_create(
        &mut self,
        symbol: SymbolRef,
        location: Option<NodeId>,
    ) -> Result<SymbolDataId> {
        let id = self.symbols.key(self.program, symbol);
        if let Some(sid) = self.manager.lookup(&id)? {
            return Ok(sid);
        }
        self.manager.reserve(id.clone());
        match self.create(symbol, location) {
            Ok(sid) => Ok(sid),
            Err(err) => {
                self.manager.abandon(&id);
                Err(err)
            }
        }
    }

    fn create(&mut self, symbol: SymbolRef, location: Option<NodeId>) -> Result<SymbolDataId> {
        let program = self.program;
        let id = self.symbols.key(program, symbol);
        let resolver = ResolverKind::select(program, symbol, location);
        debug!(%id, resolver = resolver.name(), name = %program.symbol_name(symbol), "resolving symbol");

        let declarations = resolver.declarations(program, symbol, location)?;
        let files = resolver.source_files(program, &declarations);
        let location_kind = Symbols::location_kind(program, &files);
        let export_path = self.symbols.export_path(program, symbol, location_kind);

        let kind = self.data_kind(resolver, symbol, location, &declarations)?;
        let scope = match kind {
            SymbolDataKind::UnionOrIntersection { .. } | SymbolDataKind::Transient => None,
            _ if export_path.is_some() => None,
            _ => self.scope(symbol, &declarations),
        };

        let sid = self.manager.insert(SymbolData::new(id, kind, scope))?;
        if let Some(scope) = scope {
            self.manager.manage_life_cycle(scope, sid);
        }

        self.emit_definitions(resolver, sid, symbol, &declarations)?;
        if self.emit.hover {
            self.emit_hover(sid, &declarations)?;
        }
        if self.emit.monikers && !resolver.requires_location() {
            if let (Some(kind), Some(path)) = (location_kind, export_path.as_deref()) {
                self.emit_monikers(sid, &files, kind, path)?;
            }
        }
        Ok(sid)
    }

    fn data_kind(
        &mut self,
        resolver: ResolverKind,
        symbol: SymbolRef,
        location: Option<NodeId>,
        declarations: &[NodeId],
    ) -> Result<SymbolDataKind> {
        let program = self.program;
        let kind = match resolver {
            ResolverKind::Standard | ResolverKind::TypeAlias => SymbolDataKind::Standard,
            ResolverKind::Transient => SymbolDataKind::Transient,
            ResolverKind::Alias => match program.aliased_symbol_of(symbol) {
                Some(target) => {
                    let rename = program.symbol_name(symbol) != program.symbol_name(target);
                    let aliased = self.get_or_create(target, None)?;
                    SymbolDataKind::Aliased { aliased, rename }
                }
                None => SymbolDataKind::Standard,
            },
            ResolverKind::Method => {
                let anchor = declarations
                    .first()
                    .copied()
                    .or(location)
                    .map(|node| program.node_file(node));
                let name = program.symbol_name(symbol);
                let bases = program
                    .parent_symbol(symbol)
                    .and_then(|parent| self.symbols.find_base_members(program, parent, &name))
                    .unwrap_or_default();
                match anchor {
                    Some(anchor) => {
                        let mut resolved = Vec::with_capacity(bases.len());
                        for base in bases.into_iter().filter(|&base| base != symbol) {
                            match self.get_or_create(base, None) {
                                Ok(sid) => resolved.push(sid),
                                // Cyclic heritage: the base is the override being resolved.
                                Err(IndexError::CyclicResolution(id)) => {
                                    debug!(%id, "base method skipped in heritage cycle");
                                }
                                Err(err) => return Err(err),
                            }
                        }
                        SymbolDataKind::Method {
                            bases: resolved,
                            anchor,
                        }
                    }
                    None => SymbolDataKind::Standard,
                }
            }
            ResolverKind::UnionOrIntersection => {
                // `select` only picks this kind with a location.
                let Some(location) = location else {
                    return Ok(SymbolDataKind::Transient);
                };
                let name = program.symbol_name(symbol);
                let mut elements = Vec::new();
                for ty in composite_receiver_types(program, location).unwrap_or_default() {
                    let Some(property) = program.property_of_type(ty, &name) else {
                        continue;
                    };
                    let element = self.get_or_create(property, Some(location))?;
                    if !elements.contains(&element) {
                        elements.push(element);
                    }
                }
                SymbolDataKind::UnionOrIntersection {
                    elements,
                    anchor: program.node_file(location),
                }
            }
        };
        Ok(kind)
    }

    /// The node whose exit closes a local symbol.
    ///
    /// Only symbols with a single declaration that is not a member of a
    /// class, interface or type literal are local.
    fn scope(&self, symbol: SymbolRef, declarations: &[NodeId]) -> Option<NodeId> {
        let program = self.program;
        let [decl] = declarations else {
            return None;
        };
        if let Some(parent) = program.parent_symbol(symbol) {
            let flags = program.symbol_flags(parent);
            if flags.is_class() || flags.is_interface() || flags.is_type_literal() {
                return None;
            }
        }
        ancestors(program, *decl).find(|&node| program.kind(node).is_scope())
    }

    fn emit_definitions(
        &mut self,
        resolver: ResolverKind,
        sid: SymbolDataId,
        symbol: SymbolRef,
        declarations: &[NodeId],
    ) -> Result<()> {
        if !self.manager.data(sid).kind().accepts_definitions() {
            return Ok(());
        }
        let program = self.program;
        for &decl in declarations {
            let Some((name, text)) = resolver.identifier_information(program, symbol, decl) else {
                continue;
            };
            let file = program.node_file(decl);
            let info = DefinitionInfo {
                file,
                range: program.range(name),
            };
            if self.manager.has_definition_info(sid, &info) {
                continue;
            }

            let full_range = self.line_range(file, full_range(program, decl));
            let tag = RangeTag::Definition {
                text,
                kind: definition_kind(program.kind(decl)),
                full_range,
            };
            let line_range = self.line_range(file, info.range);
            let range = self.manager.graph().range(line_range, Some(tag))?;
            self.manager.get_or_create_document(file)?.add_range(range.id);
            self.definitions.insert(name, range);
            self.manager.record_definition_info(sid, info);
            self.manager.add_definition(sid, file, range.id, true)?;
        }
        Ok(())
    }

    fn emit_hover(&mut self, sid: SymbolDataId, declarations: &[NodeId]) -> Result<()> {
        let program = self.program;
        let Some(name) = declarations.iter().find_map(|&decl| program.name_of(decl)) else {
            return Ok(());
        };
        let info = match program.quick_info_at(name) {
            Ok(Some(info)) => info,
            Ok(None) => return Ok(()),
            Err(err) => {
                warn!(%err, "hover skipped");
                return Ok(());
            }
        };

        let mut contents = vec![MarkedString::Code {
            language: "typescript".to_owned(),
            value: info.display,
        }];
        if !info.documentation.is_empty() {
            contents.push(MarkedString::Text(info.documentation));
        }
        let hover = self.manager.graph().hover_result(contents)?;
        self.manager.add_hover(sid, hover.id)
    }

    fn emit_monikers(
        &mut self,
        sid: SymbolDataId,
        files: &[FileId],
        kind: LocationKind,
        export_path: &str,
    ) -> Result<()> {
        let program = self.program;
        let module_path = files
            .first()
            .and_then(|&file| program.file_path(file))
            .map(|path| moniker::module_path(self.manager.project_root(), &path))
            .unwrap_or_default();
        let identifier = moniker::tsc_identifier(kind, &module_path, export_path);
        let moniker_kind = if files
            .iter()
            .all(|&file| program.is_source_file_from_external_library(file))
        {
            MonikerKind::Import
        } else {
            MonikerKind::Export
        };
        trace!(%identifier, ?moniker_kind, "moniker");

        let linked = self.linker.and_then(|linker| {
            linker
                .link(&identifier)
                .map(|linked| (linker.scheme().to_owned(), linked))
        });
        let graph = self.manager.graph();
        let tsc = graph.moniker(TSC_SCHEME, identifier, moniker_kind)?;
        if let Some((scheme, linked)) = linked {
            let npm = graph.moniker(&scheme, linked, moniker_kind)?;
            graph.attach(npm.id, tsc.id)?;
        }
        self.manager.add_moniker(sid, tsc.id)
    }
}

/// LSP symbol kind of a definition, by declaration node.
pub fn definition_kind(kind: NodeKind) -> SymbolKind {
    match kind {
        NodeKind::SourceFile => SymbolKind::File,
        NodeKind::ModuleDeclaration => SymbolKind::Namespace,
        NodeKind::ClassDeclaration => SymbolKind::Class,
        NodeKind::InterfaceDeclaration => SymbolKind::Interface,
        NodeKind::MethodDeclaration | NodeKind::MethodSignature => SymbolKind::Method,
        NodeKind::Constructor => SymbolKind::Constructor,
        NodeKind::EnumDeclaration => SymbolKind::Enum,
        NodeKind::EnumMember => SymbolKind::EnumMember,
        NodeKind::FunctionDeclaration => SymbolKind::Function,
        NodeKind::VariableDeclaration | NodeKind::Parameter => SymbolKind::Variable,
        _ => SymbolKind::Property,
    }
}

/// The range a definition covers as a whole.
///
/// A variable declared alone in its declaration list spans the list, so
/// `const x = 10` rather than `x = 10`.
fn full_range(program: &dyn Program, decl: NodeId) -> TextRange {
    if program.kind(decl) == NodeKind::VariableDeclaration {
        if let Some(list) = program.parent(decl) {
            if program.kind(list) == NodeKind::VariableDeclarationList
                && program.children(list).len() == 1
            {
                return program.range(list);
            }
        }
    }
    program.range(decl)
}
