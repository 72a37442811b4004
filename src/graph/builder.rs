//! Constructors for vertices and edges.
//!
//! [`GraphBuilder`] only hands out ids and validates edge shapes; it does not
//! remember what it built. Emission order is the caller's business.

use crate::base::{LineRange, Position};
use crate::error::{IndexError, Result};

use super::protocol::*;

/// Assigns monotonically increasing ids, starting at 1.
#[derive(Debug)]
pub struct GraphBuilder {
    next: u64,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    fn next_id(&mut self) -> Id {
        let id = Id(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }

    // ========================================================================
    // VERTICES
    // ========================================================================

    pub fn vertex(&mut self, data: VertexData) -> Vertex {
        Vertex {
            id: self.next_id(),
            data,
        }
    }

    pub fn meta_data(&mut self, project_root: String, tool_name: &str, tool_version: &str) -> Vertex {
        self.vertex(VertexData::MetaData(MetaData {
            version: "0.6.0".to_owned(),
            project_root,
            position_encoding: "utf-16".to_owned(),
            tool_info: ToolInfo {
                name: tool_name.to_owned(),
                version: tool_version.to_owned(),
            },
        }))
    }

    pub fn project(&mut self, kind: &str) -> Vertex {
        self.vertex(VertexData::Project(ProjectVertex {
            kind: kind.to_owned(),
        }))
    }

    pub fn document(&mut self, uri: String, language_id: &str) -> Vertex {
        self.vertex(VertexData::Document(DocumentVertex {
            uri,
            language_id: language_id.to_owned(),
        }))
    }

    pub fn range(&mut self, range: LineRange, tag: Option<RangeTag>) -> Vertex {
        self.vertex(VertexData::Range(RangeVertex {
            start: range.start,
            end: range.end,
            tag,
        }))
    }

    pub fn result_set(&mut self) -> Vertex {
        self.vertex(VertexData::ResultSet)
    }

    pub fn definition_result(&mut self) -> Vertex {
        self.vertex(VertexData::DefinitionResult)
    }

    pub fn reference_result(&mut self) -> Vertex {
        self.vertex(VertexData::ReferenceResult)
    }

    pub fn hover_result(&mut self, contents: Vec<MarkedString>) -> Vertex {
        self.vertex(VertexData::HoverResult(HoverResult {
            result: Hover { contents },
        }))
    }

    pub fn moniker(&mut self, scheme: &str, identifier: String, kind: MonikerKind) -> Vertex {
        self.vertex(VertexData::Moniker(Moniker {
            scheme: scheme.to_owned(),
            identifier,
            unique: UniquenessLevel::Group,
            kind,
        }))
    }

    pub fn document_symbol_result(&mut self, result: Vec<RangeBasedDocumentSymbol>) -> Vertex {
        self.vertex(VertexData::DocumentSymbolResult(DocumentSymbolResult { result }))
    }

    // ========================================================================
    // EDGES
    // ========================================================================

    fn edge(&mut self, data: EdgeData) -> Edge {
        Edge {
            id: self.next_id(),
            data,
        }
    }

    fn single(out_v: Id, in_v: Id) -> SingleEdge {
        SingleEdge { out_v, in_v }
    }

    pub fn next(&mut self, from: Id, to: Id) -> Edge {
        self.edge(EdgeData::Next(Self::single(from, to)))
    }

    pub fn moniker_edge(&mut self, from: Id, to: Id) -> Edge {
        self.edge(EdgeData::Moniker(Self::single(from, to)))
    }

    pub fn attach(&mut self, from: Id, to: Id) -> Edge {
        self.edge(EdgeData::Attach(Self::single(from, to)))
    }

    pub fn hover(&mut self, from: Id, to: Id) -> Edge {
        self.edge(EdgeData::Hover(Self::single(from, to)))
    }

    pub fn definition(&mut self, from: Id, to: Id) -> Edge {
        self.edge(EdgeData::Definition(Self::single(from, to)))
    }

    pub fn references(&mut self, from: Id, to: Id) -> Edge {
        self.edge(EdgeData::References(Self::single(from, to)))
    }

    pub fn document_symbols(&mut self, from: Id, to: Id) -> Edge {
        self.edge(EdgeData::DocumentSymbol(Self::single(from, to)))
    }

    /// `contains` from a project (to documents) or a document (to ranges).
    pub fn contains(&mut self, from: VertexRef, to: Vec<Id>) -> Result<Edge> {
        match from.label {
            VertexLabel::Project | VertexLabel::Document => Ok(self.edge(EdgeData::Contains(
                MultiEdge {
                    out_v: from.id,
                    in_vs: to,
                },
            ))),
            label => Err(IndexError::UnexpectedVertex {
                edge: "contains",
                label,
            }),
        }
    }

    /// `item` from a definition result (no property) or a reference result (with a property).
    pub fn item(
        &mut self,
        from: VertexRef,
        to: Vec<Id>,
        document: Id,
        property: ItemProperty,
    ) -> Result<Edge> {
        let property = match from.label {
            VertexLabel::DefinitionResult => None,
            VertexLabel::ReferenceResult => Some(property),
            label => {
                return Err(IndexError::UnexpectedVertex {
                    edge: "item",
                    label,
                });
            }
        };
        Ok(self.edge(EdgeData::Item(ItemEdge {
            out_v: from.id,
            in_vs: to,
            document,
            property,
        })))
    }
}

/// Convenience for tests and fixtures that only care about positions.
pub fn line_range(start: (u32, u32), end: (u32, u32)) -> LineRange {
    LineRange::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_across_vertices_and_edges() {
        let mut b = GraphBuilder::new();
        let rs = b.result_set();
        let range = b.range(line_range((0, 0), (0, 1)), None);
        let next = b.next(range.id, rs.id);

        assert_eq!(rs.id, Id(1));
        assert_eq!(range.id, Id(2));
        assert_eq!(next.id, Id(3));
        assert_eq!(b.issued(), 3);
    }

    #[test]
    fn test_contains_rejects_non_container() {
        let mut b = GraphBuilder::new();
        let range = b.range(line_range((0, 0), (0, 1)), None);

        let err = b.contains(range.as_ref(), vec![]).unwrap_err();
        assert!(matches!(
            err,
            IndexError::UnexpectedVertex {
                edge: "contains",
                label: VertexLabel::Range
            }
        ));
    }

    #[test]
    fn test_item_property_follows_source_label() {
        let mut b = GraphBuilder::new();
        let doc = b.document("file:///p/a.ts".into(), "typescript");
        let def = b.definition_result();
        let refs = b.reference_result();

        let def_item = b
            .item(def.as_ref(), vec![Id(10)], doc.id, ItemProperty::Definitions)
            .unwrap();
        let ref_item = b
            .item(refs.as_ref(), vec![Id(10)], doc.id, ItemProperty::Definitions)
            .unwrap();

        match (def_item.data, ref_item.data) {
            (EdgeData::Item(d), EdgeData::Item(r)) => {
                assert_eq!(d.property, None);
                assert_eq!(r.property, Some(ItemProperty::Definitions));
                assert_eq!(r.document, doc.id);
            }
            other => panic!("unexpected edges {other:?}"),
        }
    }

    #[test]
    fn test_item_rejects_result_set() {
        let mut b = GraphBuilder::new();
        let doc = b.document("file:///p/a.ts".into(), "typescript");
        let rs = b.result_set();

        assert!(b
            .item(rs.as_ref(), vec![], doc.id, ItemProperty::References)
            .is_err());
    }
}
