//! Ownership and lifecycle of symbol and document data.
//!
//! [`DataManager`] is the only owner of [`SymbolData`] and [`DocumentData`].
//! It dispatches the shared accumulation operations over
//! [`SymbolDataKind`], which is where one symbol forwards into another
//! (aliases into their target, overriding methods into their bases, union
//! properties into their elements). It also closes symbols and partitions
//! when the walk leaves the node they were registered for.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::base::{FileId, NodeId};
use crate::error::{IndexError, Result};
use crate::graph::{Graph, Id, VertexRef};
use crate::program::{NodeKind, Program};

use super::data::{
    DefinitionInfo, DocumentData, LifeCycle, Partition, PartitionSlot, ProjectData, Reference,
    ReferenceRole, SymbolData, SymbolDataId, SymbolDataKind,
};
use super::moniker;
use super::symbol_key::SymbolId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CacheSlot {
    /// Reserved while the data is being created.
    Resolving,
    Live(SymbolDataId),
    Cleared,
}

#[derive(Debug)]
enum DocumentSlot {
    Open(DocumentData),
    Cleared,
}

pub struct DataManager<'a> {
    program: &'a dyn Program,
    graph: Graph<'a>,
    project_root: PathBuf,
    emit_document_symbols: bool,
    project: ProjectData,
    symbols: Vec<SymbolData>,
    cache: FxHashMap<SymbolId, CacheSlot>,
    documents: IndexMap<FileId, DocumentSlot>,
    life_cycle: FxHashMap<NodeId, Vec<SymbolDataId>>,
}

impl<'a> DataManager<'a> {
    /// Start a run: emits the metadata and project vertices.
    pub fn new(
        program: &'a dyn Program,
        mut graph: Graph<'a>,
        project_root: PathBuf,
        emit_document_symbols: bool,
    ) -> Result<Self> {
        graph.meta_data(file_uri(&project_root))?;
        let project = ProjectData::new(graph.project("typescript")?);
        Ok(Self {
            program,
            graph,
            project_root,
            emit_document_symbols,
            project,
            symbols: Vec::new(),
            cache: FxHashMap::default(),
            documents: IndexMap::new(),
            life_cycle: FxHashMap::default(),
        })
    }

    pub fn graph(&mut self) -> &mut Graph<'a> {
        &mut self.graph
    }

    pub fn emitted(&self) -> usize {
        self.graph.emitted()
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn data(&self, sid: SymbolDataId) -> &SymbolData {
        &self.symbols[sid.index()]
    }

    pub fn result_set(&self, sid: SymbolDataId) -> Result<VertexRef> {
        self.data(sid).result_set()
    }

    // ========================================================================
    // SYMBOL CACHE
    // ========================================================================

    /// The live data for `id`, if any. Cleared and in-flight entries are errors.
    pub fn lookup(&self, id: &SymbolId) -> Result<Option<SymbolDataId>> {
        match self.cache.get(id) {
            None => Ok(None),
            Some(CacheSlot::Live(sid)) => Ok(Some(*sid)),
            Some(CacheSlot::Resolving) => Err(IndexError::CyclicResolution(id.clone())),
            Some(CacheSlot::Cleared) => Err(IndexError::SymbolDataCleared(id.clone())),
        }
    }

    /// Claim the slot for `id` before resolving anything it depends on.
    pub(crate) fn reserve(&mut self, id: SymbolId) {
        self.cache.insert(id, CacheSlot::Resolving);
    }

    /// Drop a reservation whose creation failed.
    pub(crate) fn abandon(&mut self, id: &SymbolId) {
        if self.cache.get(id) == Some(&CacheSlot::Resolving) {
            self.cache.remove(id);
        }
    }

    /// Store `data` and begin it.
    pub(crate) fn insert(&mut self, data: SymbolData) -> Result<SymbolDataId> {
        let sid = SymbolDataId::new(self.symbols.len());
        debug!(id = %data.id(), kind = data.kind().name(), "symbol data created");
        self.cache.insert(data.id().clone(), CacheSlot::Live(sid));
        self.symbols.push(data);
        self.begin(sid)?;
        Ok(sid)
    }

    fn begin(&mut self, sid: SymbolDataId) -> Result<()> {
        let rs = self.symbols[sid.index()].begin(&mut self.graph)?;
        match self.data(sid).kind().clone() {
            SymbolDataKind::Aliased { aliased, .. } => {
                let target = self.result_set(aliased)?;
                self.graph.next(rs.id, target.id)?;
            }
            SymbolDataKind::Method { bases, anchor } if !bases.is_empty() => {
                let own = self.symbols[sid.index()].ensure_reference_result(&mut self.graph)?;
                for base in bases {
                    self.add_reference(
                        base,
                        anchor,
                        Reference::Result(own.id),
                        ReferenceRole::References,
                    )?;
                }
            }
            SymbolDataKind::UnionOrIntersection { elements, anchor } => {
                for element in elements {
                    let result =
                        self.symbols[element.index()].ensure_reference_result(&mut self.graph)?;
                    self.standard_add_reference(
                        sid,
                        anchor,
                        Reference::Result(result.id),
                        ReferenceRole::References,
                    )?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    // ========================================================================
    // DOCUMENTS
    // ========================================================================

    pub fn get_or_create_document(&mut self, file: FileId) -> Result<&mut DocumentData> {
        if !self.documents.contains_key(&file) {
            let path = self.program.file_path(file).unwrap_or_default();
            let vertex = self.graph.document(file_uri(&path), language_id(&path))?;
            self.project.add_document(vertex.id);
            let module_path = moniker::module_path(&self.project_root, &path);
            let external = self.program.is_source_file_from_external_library(file);
            trace!(path = %path.display(), "document created");
            let data = DocumentData::new(
                file,
                path.to_string_lossy().into_owned(),
                vertex,
                external,
                Some(module_path),
            );
            self.documents.insert(file, DocumentSlot::Open(data));
        }
        match self.documents.get_mut(&file) {
            Some(DocumentSlot::Open(doc)) => Ok(doc),
            _ => Err(IndexError::DocumentCleared(display_path(self.program, file))),
        }
    }

    /// Emit the document's containment and symbols and mark it cleared.
    pub fn end_document(&mut self, file: FileId) -> Result<()> {
        let slot = self
            .documents
            .get_mut(&file)
            .map(|slot| std::mem::replace(slot, DocumentSlot::Cleared));
        match slot {
            Some(DocumentSlot::Open(doc)) => doc.end(&mut self.graph, self.emit_document_symbols),
            Some(DocumentSlot::Cleared) => {
                Err(IndexError::DocumentCleared(display_path(self.program, file)))
            }
            None => Ok(()),
        }
    }

    // ========================================================================
    // ACCUMULATION
    // ========================================================================

    pub fn has_definition_info(&self, sid: SymbolDataId, info: &DefinitionInfo) -> bool {
        self.data(sid).has_definition_info(info)
    }

    pub fn record_definition_info(&mut self, sid: SymbolDataId, info: DefinitionInfo) {
        self.symbols[sid.index()].record_definition_info(info);
    }

    pub fn add_definition(
        &mut self,
        sid: SymbolDataId,
        file: FileId,
        range: Id,
        record_as_reference: bool,
    ) -> Result<()> {
        if !self.data(sid).check_open()? {
            return Ok(());
        }
        match self.data(sid).kind().clone() {
            SymbolDataKind::Standard => {
                self.standard_add_definition(sid, file, range, record_as_reference)
            }
            SymbolDataKind::Aliased { rename: true, .. } => {
                self.standard_add_definition(sid, file, range, false)
            }
            SymbolDataKind::Aliased { aliased, rename: false } => {
                let rs = self.result_set(sid)?;
                self.graph.next(range, rs.id)?;
                self.add_reference(aliased, file, Reference::Range(range), ReferenceRole::References)
            }
            SymbolDataKind::Method { bases, .. } => {
                if bases.is_empty() {
                    return self.standard_add_definition(sid, file, range, record_as_reference);
                }
                self.standard_add_definition(sid, file, range, false)?;
                for base in bases {
                    self.add_reference(base, file, Reference::Range(range), ReferenceRole::Definitions)?;
                }
                Ok(())
            }
            SymbolDataKind::UnionOrIntersection { .. } | SymbolDataKind::Transient => Ok(()),
        }
    }

    pub fn add_reference(
        &mut self,
        sid: SymbolDataId,
        file: FileId,
        reference: Reference,
        role: ReferenceRole,
    ) -> Result<()> {
        if !self.data(sid).check_open()? {
            return Ok(());
        }
        trace!(id = %self.data(sid).id(), ?reference, ?role, "reference");
        match (self.data(sid).kind().clone(), reference) {
            (SymbolDataKind::Aliased { aliased, .. }, _) => {
                self.add_reference(aliased, file, reference, role)
            }
            (SymbolDataKind::Method { bases, .. }, Reference::Range(_)) if !bases.is_empty() => {
                for base in bases {
                    self.add_reference(base, file, reference, role)?;
                }
                Ok(())
            }
            (SymbolDataKind::UnionOrIntersection { elements, .. }, Reference::Range(_)) => {
                for element in elements {
                    self.add_reference(element, file, reference, role)?;
                }
                Ok(())
            }
            _ => self.standard_add_reference(sid, file, reference, role),
        }
    }

    pub fn add_hover(&mut self, sid: SymbolDataId, hover: Id) -> Result<()> {
        if !self.data(sid).check_open()? {
            return Ok(());
        }
        let rs = self.result_set(sid)?;
        self.graph.hover(rs.id, hover)?;
        Ok(())
    }

    pub fn add_moniker(&mut self, sid: SymbolDataId, moniker: Id) -> Result<()> {
        if !self.data(sid).check_open()? {
            return Ok(());
        }
        let rs = self.result_set(sid)?;
        self.graph.moniker_edge(rs.id, moniker)?;
        Ok(())
    }

    fn standard_add_definition(
        &mut self,
        sid: SymbolDataId,
        file: FileId,
        range: Id,
        record_as_reference: bool,
    ) -> Result<()> {
        let rs = self.result_set(sid)?;
        self.graph.next(range, rs.id)?;
        self.partition_mut(sid, file)?
            .add_definition(range, record_as_reference);
        Ok(())
    }

    fn standard_add_reference(
        &mut self,
        sid: SymbolDataId,
        file: FileId,
        reference: Reference,
        role: ReferenceRole,
    ) -> Result<()> {
        self.partition_mut(sid, file)?.add_reference(reference, role);
        Ok(())
    }

    /// The open partition of `sid` for `file`, created on first use.
    fn partition_mut(&mut self, sid: SymbolDataId, file: FileId) -> Result<&mut Partition> {
        if !self.symbols[sid.index()].partitions.contains_key(&file) {
            let document = self.get_or_create_document(file)?.vertex().id;
            self.symbols[sid.index()]
                .partitions
                .insert(file, PartitionSlot::Open(Partition::new(document)));
            let root = self.program.root(file);
            self.manage_life_cycle(root, sid);
        }
        let data = &mut self.symbols[sid.index()];
        let symbol = data.id().clone();
        match data.partitions.get_mut(&file) {
            Some(PartitionSlot::Open(partition)) => Ok(partition),
            _ => Err(IndexError::PartitionCleared {
                symbol,
                document: display_path(self.program, file),
            }),
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Notify `sid` when the visit of `node` completes.
    pub fn manage_life_cycle(&mut self, node: NodeId, sid: SymbolDataId) {
        let registered = self.life_cycle.entry(node).or_default();
        if !registered.contains(&sid) {
            registered.push(sid);
        }
    }

    pub fn node_processed(&mut self, node: NodeId) -> Result<()> {
        let Some(registered) = self.life_cycle.remove(&node) else {
            return Ok(());
        };
        let file = self.program.node_file(node);
        let is_source_file = self.program.kind(node) == NodeKind::SourceFile;

        for sid in registered {
            let data = self.data(sid);
            if data.state() == LifeCycle::Closed {
                continue;
            }
            if data.scope() == Some(node) {
                if self.program.is_declaration_file(file) {
                    continue;
                }
                let id = data.id().clone();
                debug!(%id, "scope exited, closing symbol");
                self.symbols[sid.index()].end(&mut self.graph)?;
                self.cache.insert(id, CacheSlot::Cleared);
            } else if is_source_file {
                self.symbols[sid.index()].end_partition(&mut self.graph, file)?;
            }
        }
        Ok(())
    }

    /// Close everything still open, then the project.
    pub fn project_processed(&mut self) -> Result<()> {
        self.life_cycle.clear();
        for symbol in &mut self.symbols {
            if symbol.state() == LifeCycle::Open {
                symbol.end(&mut self.graph)?;
            }
        }
        let open: Vec<FileId> = self
            .documents
            .iter()
            .filter(|(_, slot)| matches!(slot, DocumentSlot::Open(_)))
            .map(|(&file, _)| file)
            .collect();
        for file in open {
            self.end_document(file)?;
        }
        self.project.end(&mut self.graph)
    }
}

fn display_path(program: &dyn Program, file: FileId) -> String {
    program
        .file_path(file)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

pub(crate) fn file_uri(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

fn language_id(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js" | "jsx" | "mjs" | "cjs") => "javascript",
        _ => "typescript",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeLabel, MemoryEmitter, line_range};
    use crate::program::{MemoryProgram, ProgramBuilder};

    struct Fixture {
        program: MemoryProgram,
        file: FileId,
        root: NodeId,
        block: NodeId,
    }

    fn fixture(path: &str) -> Fixture {
        let mut b = ProgramBuilder::new();
        let root = b.file(path, "function f() { let a = 1; a; }");
        let block = b.node_at(root, NodeKind::Block, "{ let a = 1; a; }");
        let program = b.build();
        let file = program.file_id(path).unwrap();
        Fixture {
            program,
            file,
            root,
            block,
        }
    }

    fn manager<'a>(program: &'a MemoryProgram, sink: &'a mut MemoryEmitter) -> DataManager<'a> {
        DataManager::new(program, Graph::new(sink), PathBuf::from("/p"), true).unwrap()
    }

    fn standard(id: &str, scope: Option<NodeId>) -> SymbolData {
        SymbolData::new(SymbolId::from_raw(id), SymbolDataKind::Standard, scope)
    }

    fn range(m: &mut DataManager<'_>) -> Id {
        m.graph().range(line_range((0, 0), (0, 1)), None).unwrap().id
    }

    #[test]
    fn test_run_starts_with_metadata_and_project() {
        let f = fixture("/p/a.ts");
        let mut sink = MemoryEmitter::new();
        {
            let mut m = manager(&f.program, &mut sink);
            m.project_processed().unwrap();
        }
        let labels: Vec<_> = sink.vertices().map(|v| v.label()).collect();
        assert_eq!(
            labels,
            vec![crate::graph::VertexLabel::MetaData, crate::graph::VertexLabel::Project]
        );
    }

    #[test]
    fn test_lookup_reports_cycles_and_cleared_entries() {
        let f = fixture("/p/a.ts");
        let mut sink = MemoryEmitter::new();
        let mut m = manager(&f.program, &mut sink);
        let id = SymbolId::from_raw("s");

        assert_eq!(m.lookup(&id).unwrap(), None);
        m.reserve(id.clone());
        assert!(matches!(m.lookup(&id), Err(IndexError::CyclicResolution(_))));
        m.abandon(&id);
        assert_eq!(m.lookup(&id).unwrap(), None);

        let sid = m.insert(standard("s", Some(f.block))).unwrap();
        m.manage_life_cycle(f.block, sid);
        assert_eq!(m.lookup(&id).unwrap(), Some(sid));

        m.node_processed(f.block).unwrap();
        let err = m.lookup(&id).unwrap_err();
        assert!(matches!(err, IndexError::SymbolDataCleared(_)));
        assert!(err.is_lifecycle_violation());
    }

    #[test]
    fn test_closed_standard_rejects_accumulation() {
        let f = fixture("/p/a.ts");
        let mut sink = MemoryEmitter::new();
        let mut m = manager(&f.program, &mut sink);
        let sid = m.insert(standard("s", Some(f.block))).unwrap();
        m.manage_life_cycle(f.block, sid);
        let r = range(&mut m);
        m.add_definition(sid, f.file, r, true).unwrap();
        m.node_processed(f.block).unwrap();

        let r2 = range(&mut m);
        let err = m
            .add_reference(sid, f.file, Reference::Range(r2), ReferenceRole::References)
            .unwrap_err();
        assert!(matches!(err, IndexError::SymbolDataClosed(_)));
        assert!(m.add_definition(sid, f.file, r2, true).is_err());
    }

    #[test]
    fn test_closed_transient_ignores_accumulation() {
        let f = fixture("/p/a.ts");
        let mut sink = MemoryEmitter::new();
        let mut m = manager(&f.program, &mut sink);
        let data = SymbolData::new(SymbolId::from_raw("t"), SymbolDataKind::Transient, None);
        let sid = m.insert(data).unwrap();
        let r = range(&mut m);
        m.add_reference(sid, f.file, Reference::Range(r), ReferenceRole::References)
            .unwrap();
        m.project_processed().unwrap();

        let r2 = range(&mut m);
        m.add_reference(sid, f.file, Reference::Range(r2), ReferenceRole::References)
            .unwrap();
        m.add_definition(sid, f.file, r2, true).unwrap();
    }

    #[test]
    fn test_source_file_end_clears_partition() {
        let f = fixture("/p/a.ts");
        let mut sink = MemoryEmitter::new();
        let mut m = manager(&f.program, &mut sink);
        let sid = m.insert(standard("s", None)).unwrap();
        let r = range(&mut m);
        m.add_reference(sid, f.file, Reference::Range(r), ReferenceRole::References)
            .unwrap();

        m.node_processed(f.root).unwrap();
        let r2 = range(&mut m);
        let err = m
            .add_reference(sid, f.file, Reference::Range(r2), ReferenceRole::References)
            .unwrap_err();
        assert!(matches!(err, IndexError::PartitionCleared { .. }));
        // the symbol itself is still open
        assert_eq!(m.data(sid).state(), LifeCycle::Open);
    }

    #[test]
    fn test_declaration_file_scope_is_not_closed() {
        let f = fixture("/p/types.d.ts");
        let mut sink = MemoryEmitter::new();
        let mut m = manager(&f.program, &mut sink);
        let sid = m.insert(standard("s", Some(f.root))).unwrap();
        m.manage_life_cycle(f.root, sid);

        m.node_processed(f.root).unwrap();
        assert_eq!(m.data(sid).state(), LifeCycle::Open);
        assert!(m.lookup(&SymbolId::from_raw("s")).is_ok());

        m.project_processed().unwrap();
        assert_eq!(m.data(sid).state(), LifeCycle::Closed);
    }

    #[test]
    fn test_alias_forwards_references_to_target() {
        let f = fixture("/p/a.ts");
        let mut sink = MemoryEmitter::new();
        {
            let mut m = manager(&f.program, &mut sink);
            let target = m.insert(standard("target", None)).unwrap();
            let alias = m
                .insert(SymbolData::new(
                    SymbolId::from_raw("alias"),
                    SymbolDataKind::Aliased {
                        aliased: target,
                        rename: false,
                    },
                    None,
                ))
                .unwrap();
            let r = range(&mut m);
            m.add_definition(alias, f.file, r, true).unwrap();
            m.project_processed().unwrap();

            assert!(m.data(alias).reference_result().is_none());
            assert!(m.data(alias).definition_result().is_none());
            assert!(m.data(target).reference_result().is_some());
        }
        // result set -> result set, plus the definition range -> alias result set
        assert_eq!(sink.edges_labeled(EdgeLabel::Next).count(), 2);
    }

    #[test]
    fn test_document_end_twice_is_rejected() {
        let f = fixture("/p/a.ts");
        let mut sink = MemoryEmitter::new();
        let mut m = manager(&f.program, &mut sink);
        m.get_or_create_document(f.file).unwrap();
        m.end_document(f.file).unwrap();

        assert!(matches!(
            m.end_document(f.file),
            Err(IndexError::DocumentCleared(_))
        ));
        assert!(matches!(
            m.get_or_create_document(f.file),
            Err(IndexError::DocumentCleared(_))
        ));
    }

    #[test]
    fn test_file_uri_and_language() {
        assert_eq!(file_uri(Path::new("/p/a.ts")), "file:///p/a.ts");
        assert_eq!(file_uri(Path::new("p/a.ts")), "file:///p/a.ts");
        assert_eq!(language_id(Path::new("/p/a.jsx")), "javascript");
        assert_eq!(language_id(Path::new("/p/a.d.ts")), "typescript");
    }
}
