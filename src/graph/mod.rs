//! The emitted graph.
//!
//! - [`protocol`] - vertex and edge records and their serialized shape
//! - [`GraphBuilder`] - id assignment and validated edge constructors
//! - [`Emitter`] - where elements go ([`MemoryEmitter`], [`JsonLinesEmitter`])
//! - [`GraphQuery`] - consumer side lookups over emitted elements
//!
//! [`Graph`] ties a builder to an emitter: every constructor call is emitted
//! immediately, so an element is always written before anything refers to it.

mod builder;
mod emitter;
pub mod protocol;
mod query;

use crate::base::LineRange;
use crate::error::Result;

pub use builder::{GraphBuilder, line_range};
pub use emitter::{Emitter, JsonLinesEmitter, MemoryEmitter};
pub use protocol::{
    Edge, EdgeData, EdgeLabel, Element, Id, ItemProperty, MarkedString, MonikerKind, RangeTag,
    SymbolKind, Vertex, VertexData, VertexLabel, VertexRef,
};
pub use query::GraphQuery;

use protocol::RangeBasedDocumentSymbol;

/// A [`GraphBuilder`] writing straight into an [`Emitter`].
pub struct Graph<'e> {
    builder: GraphBuilder,
    emitter: &'e mut dyn Emitter,
    emitted: usize,
}

impl<'e> Graph<'e> {
    pub fn new(emitter: &'e mut dyn Emitter) -> Self {
        Self {
            builder: GraphBuilder::new(),
            emitter,
            emitted: 0,
        }
    }

    /// Number of elements written so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn flush(&mut self) -> Result<()> {
        self.emitter.flush()
    }

    fn vertex(&mut self, vertex: Vertex) -> Result<VertexRef> {
        let handle = vertex.as_ref();
        self.emitter.emit(Element::Vertex(vertex))?;
        self.emitted += 1;
        Ok(handle)
    }

    fn edge(&mut self, edge: Edge) -> Result<Id> {
        let id = edge.id;
        self.emitter.emit(Element::Edge(edge))?;
        self.emitted += 1;
        Ok(id)
    }

    // ========================================================================
    // VERTICES
    // ========================================================================

    pub fn meta_data(&mut self, project_root: String) -> Result<VertexRef> {
        let v = self.builder.meta_data(
            project_root,
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        );
        self.vertex(v)
    }

    pub fn project(&mut self, kind: &str) -> Result<VertexRef> {
        let v = self.builder.project(kind);
        self.vertex(v)
    }

    pub fn document(&mut self, uri: String, language_id: &str) -> Result<VertexRef> {
        let v = self.builder.document(uri, language_id);
        self.vertex(v)
    }

    pub fn range(&mut self, range: LineRange, tag: Option<RangeTag>) -> Result<VertexRef> {
        let v = self.builder.range(range, tag);
        self.vertex(v)
    }

    pub fn result_set(&mut self) -> Result<VertexRef> {
        let v = self.builder.result_set();
        self.vertex(v)
    }

    pub fn definition_result(&mut self) -> Result<VertexRef> {
        let v = self.builder.definition_result();
        self.vertex(v)
    }

    pub fn reference_result(&mut self) -> Result<VertexRef> {
        let v = self.builder.reference_result();
        self.vertex(v)
    }

    pub fn hover_result(&mut self, contents: Vec<MarkedString>) -> Result<VertexRef> {
        let v = self.builder.hover_result(contents);
        self.vertex(v)
    }

    pub fn moniker(
        &mut self,
        scheme: &str,
        identifier: String,
        kind: MonikerKind,
    ) -> Result<VertexRef> {
        let v = self.builder.moniker(scheme, identifier, kind);
        self.vertex(v)
    }

    pub fn document_symbol_result(
        &mut self,
        result: Vec<RangeBasedDocumentSymbol>,
    ) -> Result<VertexRef> {
        let v = self.builder.document_symbol_result(result);
        self.vertex(v)
    }

    // ========================================================================
    // EDGES
    // ========================================================================

    pub fn next(&mut self, from: Id, to: Id) -> Result<Id> {
        let e = self.builder.next(from, to);
        self.edge(e)
    }

    pub fn moniker_edge(&mut self, from: Id, to: Id) -> Result<Id> {
        let e = self.builder.moniker_edge(from, to);
        self.edge(e)
    }

    pub fn attach(&mut self, from: Id, to: Id) -> Result<Id> {
        let e = self.builder.attach(from, to);
        self.edge(e)
    }

    pub fn hover(&mut self, from: Id, to: Id) -> Result<Id> {
        let e = self.builder.hover(from, to);
        self.edge(e)
    }

    pub fn definition(&mut self, from: Id, to: Id) -> Result<Id> {
        let e = self.builder.definition(from, to);
        self.edge(e)
    }

    pub fn references(&mut self, from: Id, to: Id) -> Result<Id> {
        let e = self.builder.references(from, to);
        self.edge(e)
    }

    pub fn document_symbols(&mut self, from: Id, to: Id) -> Result<Id> {
        let e = self.builder.document_symbols(from, to);
        self.edge(e)
    }

    pub fn contains(&mut self, from: VertexRef, to: Vec<Id>) -> Result<Id> {
        let e = self.builder.contains(from, to)?;
        self.edge(e)
    }

    pub fn item(
        &mut self,
        from: VertexRef,
        to: Vec<Id>,
        document: Id,
        property: ItemProperty,
    ) -> Result<Id> {
        let e = self.builder.item(from, to, document, property)?;
        self.edge(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_emits_in_creation_order() {
        let mut sink = MemoryEmitter::new();
        {
            let mut graph = Graph::new(&mut sink);
            let rs = graph.result_set().unwrap();
            let range = graph.range(line_range((0, 0), (0, 1)), None).unwrap();
            graph.next(range.id, rs.id).unwrap();
            assert_eq!(graph.emitted(), 3);
        }

        let ids: Vec<u64> = sink.elements().iter().map(|e| e.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_failed_validation_emits_nothing() {
        let mut sink = MemoryEmitter::new();
        {
            let mut graph = Graph::new(&mut sink);
            let rs = graph.result_set().unwrap();
            assert!(graph.contains(rs, vec![]).is_err());
            assert_eq!(graph.emitted(), 1);
        }
        assert_eq!(sink.len(), 1);
    }
}
