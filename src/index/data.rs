//! Accumulated state of symbols, documents and the project.
//!
//! A [`SymbolData`] collects the ranges of one symbol in per-file
//! [`Partition`]s and turns them into `item` edges when a partition ends.
//! Behaviour that crosses symbols (aliases, overrides, union members) is
//! dispatched by [`DataManager`](super::DataManager), which owns every
//! instance in an arena and hands out [`SymbolDataId`]s.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::base::{FileId, NodeId, TextRange};
use crate::error::{IndexError, Result};
use crate::graph::protocol::RangeBasedDocumentSymbol;
use crate::graph::{Graph, Id, ItemProperty, VertexRef};

use super::symbol_key::SymbolId;

/// Index of a [`SymbolData`] in the manager's arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolDataId(u32);

impl SymbolDataId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SymbolDataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolDataId({})", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LifeCycle {
    Unopened,
    Open,
    Closed,
}

/// Role a range plays for the symbol it is recorded against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceRole {
    Declarations,
    Definitions,
    References,
}

impl ReferenceRole {
    pub fn property(self) -> ItemProperty {
        match self {
            ReferenceRole::Declarations => ItemProperty::Declarations,
            ReferenceRole::Definitions => ItemProperty::Definitions,
            ReferenceRole::References => ItemProperty::References,
        }
    }
}

/// What gets recorded by `add_reference`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    /// A range vertex.
    Range(Id),
    /// Another symbol's whole reference result.
    Result(Id),
}

/// Coordinates of a recorded definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DefinitionInfo {
    pub file: FileId,
    pub range: TextRange,
}

/// The closed set of accumulator behaviours.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolDataKind {
    Standard,
    /// An import or re-export of `aliased`.
    Aliased { aliased: SymbolDataId, rename: bool },
    /// A method overriding the members in `bases`.
    Method {
        bases: Vec<SymbolDataId>,
        anchor: FileId,
    },
    /// A property shared by the arms of a union or intersection.
    UnionOrIntersection {
        elements: Vec<SymbolDataId>,
        anchor: FileId,
    },
    /// A checker-synthesized symbol without a definition site.
    Transient,
}

impl SymbolDataKind {
    pub fn name(&self) -> &'static str {
        match self {
            SymbolDataKind::Standard => "standard",
            SymbolDataKind::Aliased { .. } => "aliased",
            SymbolDataKind::Method { .. } => "method",
            SymbolDataKind::UnionOrIntersection { .. } => "union-or-intersection",
            SymbolDataKind::Transient => "transient",
        }
    }

    /// Whether definitions are recorded at all.
    pub fn accepts_definitions(&self) -> bool {
        !matches!(
            self,
            SymbolDataKind::UnionOrIntersection { .. } | SymbolDataKind::Transient
        )
    }

    /// Strict kinds fail on use after close; the others ignore it.
    pub fn is_strict(&self) -> bool {
        self.accepts_definitions()
    }
}

/// Ranges of one symbol inside one document.
#[derive(Debug)]
pub(crate) struct Partition {
    document: Id,
    definition_ranges: Vec<Id>,
    declarations: Vec<Id>,
    definitions: Vec<Id>,
    references: Vec<Id>,
    reference_results: Vec<Id>,
}

impl Partition {
    pub(crate) fn new(document: Id) -> Self {
        Self {
            document,
            definition_ranges: Vec::new(),
            declarations: Vec::new(),
            definitions: Vec::new(),
            references: Vec::new(),
            reference_results: Vec::new(),
        }
    }

    pub(crate) fn add_definition(&mut self, range: Id, record_as_reference: bool) {
        self.definition_ranges.push(range);
        if record_as_reference {
            self.definitions.push(range);
        }
    }

    pub(crate) fn add_reference(&mut self, reference: Reference, role: ReferenceRole) {
        match reference {
            Reference::Result(result) => self.reference_results.push(result),
            Reference::Range(range) => match role {
                ReferenceRole::Declarations => self.declarations.push(range),
                ReferenceRole::Definitions => self.definitions.push(range),
                ReferenceRole::References => self.references.push(range),
            },
        }
    }

    fn has_references(&self) -> bool {
        !(self.declarations.is_empty()
            && self.definitions.is_empty()
            && self.references.is_empty()
            && self.reference_results.is_empty())
    }
}

#[derive(Debug)]
pub(crate) enum PartitionSlot {
    Open(Partition),
    Cleared,
}

/// Everything recorded for one symbol.
#[derive(Debug)]
pub struct SymbolData {
    id: SymbolId,
    kind: SymbolDataKind,
    scope: Option<NodeId>,
    state: LifeCycle,
    result_set: Option<VertexRef>,
    definition_result: Option<VertexRef>,
    reference_result: Option<VertexRef>,
    definition_info: FxHashSet<DefinitionInfo>,
    pub(crate) partitions: IndexMap<FileId, PartitionSlot>,
}

impl SymbolData {
    pub fn new(id: SymbolId, kind: SymbolDataKind, scope: Option<NodeId>) -> Self {
        Self {
            id,
            kind,
            scope,
            state: LifeCycle::Unopened,
            result_set: None,
            definition_result: None,
            reference_result: None,
            definition_info: FxHashSet::default(),
            partitions: IndexMap::new(),
        }
    }

    pub fn id(&self) -> &SymbolId {
        &self.id
    }

    pub fn kind(&self) -> &SymbolDataKind {
        &self.kind
    }

    /// The node whose end closes this symbol, for symbols local to a scope.
    pub fn scope(&self) -> Option<NodeId> {
        self.scope
    }

    pub fn state(&self) -> LifeCycle {
        self.state
    }

    pub fn result_set(&self) -> Result<VertexRef> {
        self.result_set
            .ok_or_else(|| IndexError::SymbolDataClosed(self.id.clone()))
    }

    pub fn reference_result(&self) -> Option<VertexRef> {
        self.reference_result
    }

    pub fn definition_result(&self) -> Option<VertexRef> {
        self.definition_result
    }

    /// Emit the result set. Must be called exactly once.
    pub(crate) fn begin(&mut self, graph: &mut Graph<'_>) -> Result<VertexRef> {
        if self.state != LifeCycle::Unopened {
            return Err(IndexError::AlreadyBegun(self.id.clone()));
        }
        let rs = graph.result_set()?;
        self.result_set = Some(rs);
        self.state = LifeCycle::Open;
        Ok(rs)
    }

    /// `Ok(true)` when accumulation may proceed, `Ok(false)` when it is silently skipped.
    pub(crate) fn check_open(&self) -> Result<bool> {
        match self.state {
            LifeCycle::Open => Ok(true),
            LifeCycle::Closed if !self.kind.is_strict() => Ok(false),
            LifeCycle::Closed | LifeCycle::Unopened => {
                Err(IndexError::SymbolDataClosed(self.id.clone()))
            }
        }
    }

    pub fn has_definition_info(&self, info: &DefinitionInfo) -> bool {
        self.definition_info.contains(info)
    }

    pub(crate) fn record_definition_info(&mut self, info: DefinitionInfo) {
        if self.kind.accepts_definitions() {
            self.definition_info.insert(info);
        }
    }

    /// The reference result, created together with its `textDocument/references` edge.
    pub(crate) fn ensure_reference_result(&mut self, graph: &mut Graph<'_>) -> Result<VertexRef> {
        if let Some(result) = self.reference_result {
            return Ok(result);
        }
        let rs = self.result_set()?;
        let result = graph.reference_result()?;
        graph.references(rs.id, result.id)?;
        self.reference_result = Some(result);
        Ok(result)
    }

    fn ensure_definition_result(&mut self, graph: &mut Graph<'_>) -> Result<VertexRef> {
        if let Some(result) = self.definition_result {
            return Ok(result);
        }
        let rs = self.result_set()?;
        let result = graph.definition_result()?;
        graph.definition(rs.id, result.id)?;
        self.definition_result = Some(result);
        Ok(result)
    }

    /// Flush one partition into `item` edges and mark it cleared.
    pub(crate) fn end_partition(&mut self, graph: &mut Graph<'_>, file: FileId) -> Result<()> {
        let Some(slot) = self.partitions.get_mut(&file) else {
            return Ok(());
        };
        let PartitionSlot::Open(partition) = std::mem::replace(slot, PartitionSlot::Cleared) else {
            return Ok(());
        };
        self.flush(graph, partition)
    }

    fn flush(&mut self, graph: &mut Graph<'_>, partition: Partition) -> Result<()> {
        let document = partition.document;
        let has_references = partition.has_references();
        if !partition.definition_ranges.is_empty() {
            let result = self.ensure_definition_result(graph)?;
            graph.item(
                result,
                partition.definition_ranges,
                document,
                ItemProperty::Definitions,
            )?;
        }
        if !has_references {
            return Ok(());
        }
        let result = self.ensure_reference_result(graph)?;
        for (ranges, property) in [
            (partition.declarations, ItemProperty::Declarations),
            (partition.definitions, ItemProperty::Definitions),
            (partition.references, ItemProperty::References),
            (partition.reference_results, ItemProperty::ReferenceResults),
        ] {
            if !ranges.is_empty() {
                graph.item(result, ranges, document, property)?;
            }
        }
        Ok(())
    }

    /// End every open partition and close the symbol.
    pub(crate) fn end(&mut self, graph: &mut Graph<'_>) -> Result<()> {
        if self.state == LifeCycle::Closed {
            return Ok(());
        }
        let files: Vec<FileId> = self.partitions.keys().copied().collect();
        for file in files {
            self.end_partition(graph, file)?;
        }
        self.state = LifeCycle::Closed;
        self.partitions = IndexMap::new();
        self.definition_info = FxHashSet::default();
        Ok(())
    }
}

/// A container frame of the document symbol tree.
#[derive(Debug)]
struct Container {
    range: Id,
    children: Vec<RangeBasedDocumentSymbol>,
}

/// Everything recorded for one document.
#[derive(Debug)]
pub struct DocumentData {
    file: FileId,
    path: String,
    vertex: VertexRef,
    external_library: bool,
    module_path: Option<String>,
    ranges: Vec<Id>,
    containers: Vec<Container>,
    symbols: Vec<RangeBasedDocumentSymbol>,
}

impl DocumentData {
    pub(crate) fn new(
        file: FileId,
        path: String,
        vertex: VertexRef,
        external_library: bool,
        module_path: Option<String>,
    ) -> Self {
        Self {
            file,
            path,
            vertex,
            external_library,
            module_path,
            ranges: Vec::new(),
            containers: Vec::new(),
            symbols: Vec::new(),
        }
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn vertex(&self) -> VertexRef {
        self.vertex
    }

    pub fn is_external_library(&self) -> bool {
        self.external_library
    }

    /// Path relative to the project root without extension, used in monikers.
    pub fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref()
    }

    pub fn add_range(&mut self, range: Id) {
        self.ranges.push(range);
    }

    pub fn ranges(&self) -> &[Id] {
        &self.ranges
    }

    pub fn begin_container(&mut self, range: Id) {
        self.containers.push(Container {
            range,
            children: Vec::new(),
        });
    }

    pub fn end_container(&mut self) -> Result<()> {
        let container = self
            .containers
            .pop()
            .ok_or_else(|| IndexError::UnbalancedContainers(self.path.clone()))?;
        let symbol = RangeBasedDocumentSymbol {
            id: container.range,
            children: container.children,
        };
        match self.containers.last_mut() {
            Some(parent) => parent.children.push(symbol),
            None => self.symbols.push(symbol),
        }
        Ok(())
    }

    /// Emit containment and the document symbol tree.
    pub(crate) fn end(self, graph: &mut Graph<'_>, emit_symbols: bool) -> Result<()> {
        if !self.containers.is_empty() {
            return Err(IndexError::UnbalancedContainers(self.path));
        }
        if !self.ranges.is_empty() {
            graph.contains(self.vertex, self.ranges)?;
        }
        if emit_symbols && !self.symbols.is_empty() {
            let result = graph.document_symbol_result(self.symbols)?;
            graph.document_symbols(self.vertex.id, result.id)?;
        }
        Ok(())
    }
}

/// The project vertex and the documents it contains.
#[derive(Debug)]
pub struct ProjectData {
    vertex: VertexRef,
    documents: Vec<Id>,
}

impl ProjectData {
    pub(crate) fn new(vertex: VertexRef) -> Self {
        Self {
            vertex,
            documents: Vec::new(),
        }
    }

    pub fn vertex(&self) -> VertexRef {
        self.vertex
    }

    pub(crate) fn add_document(&mut self, document: Id) {
        self.documents.push(document);
    }

    pub(crate) fn end(&mut self, graph: &mut Graph<'_>) -> Result<()> {
        if self.documents.is_empty() {
            return Ok(());
        }
        graph.contains(self.vertex, std::mem::take(&mut self.documents))?;
        Ok(())
    }
}
