//! Interchange records: vertices and edges as they are written out.
//!
//! Every record serializes to one JSON object of the shape
//! `{"id": 1, "type": "vertex", "label": "range", ...}` or
//! `{"id": 2, "type": "edge", "label": "next", "outV": 1, "inV": 3}`.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::base::{LineRange, Position};

/// Identifier of a graph element, unique within one run.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Id(pub u64);

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line of output.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Element {
    Vertex(Vertex),
    Edge(Edge),
}

impl Element {
    pub fn id(&self) -> Id {
        match self {
            Element::Vertex(v) => v.id,
            Element::Edge(e) => e.id,
        }
    }

    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            Element::Vertex(v) => Some(v),
            Element::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Element::Vertex(_) => None,
            Element::Edge(e) => Some(e),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Vertex {
    pub id: Id,
    #[serde(flatten)]
    pub data: VertexData,
}

impl Vertex {
    pub fn label(&self) -> VertexLabel {
        self.data.label()
    }

    /// A copyable handle remembering the label, needed by validated edge constructors.
    pub fn as_ref(&self) -> VertexRef {
        VertexRef {
            id: self.id,
            label: self.label(),
        }
    }
}

/// The id and label of an emitted vertex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexRef {
    pub id: Id,
    pub label: VertexLabel,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VertexLabel {
    MetaData,
    Project,
    Document,
    Range,
    ResultSet,
    DefinitionResult,
    ReferenceResult,
    HoverResult,
    Moniker,
    DocumentSymbolResult,
}

impl fmt::Display for VertexLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VertexLabel::MetaData => "metaData",
            VertexLabel::Project => "project",
            VertexLabel::Document => "document",
            VertexLabel::Range => "range",
            VertexLabel::ResultSet => "resultSet",
            VertexLabel::DefinitionResult => "definitionResult",
            VertexLabel::ReferenceResult => "referenceResult",
            VertexLabel::HoverResult => "hoverResult",
            VertexLabel::Moniker => "moniker",
            VertexLabel::DocumentSymbolResult => "documentSymbolResult",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "label", rename_all = "camelCase")]
pub enum VertexData {
    MetaData(MetaData),
    Project(ProjectVertex),
    Document(DocumentVertex),
    Range(RangeVertex),
    ResultSet,
    DefinitionResult,
    ReferenceResult,
    HoverResult(HoverResult),
    Moniker(Moniker),
    DocumentSymbolResult(DocumentSymbolResult),
}

impl VertexData {
    pub fn label(&self) -> VertexLabel {
        match self {
            VertexData::MetaData(_) => VertexLabel::MetaData,
            VertexData::Project(_) => VertexLabel::Project,
            VertexData::Document(_) => VertexLabel::Document,
            VertexData::Range(_) => VertexLabel::Range,
            VertexData::ResultSet => VertexLabel::ResultSet,
            VertexData::DefinitionResult => VertexLabel::DefinitionResult,
            VertexData::ReferenceResult => VertexLabel::ReferenceResult,
            VertexData::HoverResult(_) => VertexLabel::HoverResult,
            VertexData::Moniker(_) => VertexLabel::Moniker,
            VertexData::DocumentSymbolResult(_) => VertexLabel::DocumentSymbolResult,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub version: String,
    pub project_root: String,
    pub position_encoding: String,
    pub tool_info: ToolInfo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectVertex {
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVertex {
    pub uri: String,
    pub language_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RangeVertex {
    pub start: Position,
    pub end: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<RangeTag>,
}

impl RangeVertex {
    pub fn line_range(&self) -> LineRange {
        LineRange::new(self.start, self.end)
    }

    /// Text covered by the range, as recorded in its tag.
    pub fn text(&self) -> Option<&str> {
        match &self.tag {
            Some(RangeTag::Definition { text, .. }) | Some(RangeTag::Reference { text }) => {
                Some(text)
            }
            None => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RangeTag {
    Definition {
        text: String,
        kind: SymbolKind,
        #[serde(rename = "fullRange")]
        full_range: LineRange,
    },
    Reference {
        text: String,
    },
}

/// LSP symbol kinds, serialized as their protocol numbers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    File,
    Module,
    Namespace,
    Class,
    Method,
    Property,
    Constructor,
    Enum,
    Interface,
    Function,
    Variable,
    EnumMember,
    TypeParameter,
}

impl SymbolKind {
    pub fn to_lsp(self) -> u8 {
        match self {
            SymbolKind::File => 1,
            SymbolKind::Module => 2,
            SymbolKind::Namespace => 3,
            SymbolKind::Class => 5,
            SymbolKind::Method => 6,
            SymbolKind::Property => 7,
            SymbolKind::Constructor => 9,
            SymbolKind::Enum => 10,
            SymbolKind::Interface => 11,
            SymbolKind::Function => 12,
            SymbolKind::Variable => 13,
            SymbolKind::EnumMember => 22,
            SymbolKind::TypeParameter => 26,
        }
    }
}

impl Serialize for SymbolKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.to_lsp())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HoverResult {
    pub result: Hover,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Hover {
    pub contents: Vec<MarkedString>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MarkedString {
    Code { language: String, value: String },
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Moniker {
    pub scheme: String,
    pub identifier: String,
    pub unique: UniquenessLevel,
    pub kind: MonikerKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UniquenessLevel {
    Document,
    Project,
    Group,
    Scheme,
    Global,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonikerKind {
    Import,
    Export,
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentSymbolResult {
    pub result: Vec<RangeBasedDocumentSymbol>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RangeBasedDocumentSymbol {
    pub id: Id,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RangeBasedDocumentSymbol>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    pub id: Id,
    #[serde(flatten)]
    pub data: EdgeData,
}

impl Edge {
    pub fn label(&self) -> EdgeLabel {
        self.data.label()
    }

    pub fn out_v(&self) -> Id {
        match &self.data {
            EdgeData::Contains(e) => e.out_v,
            EdgeData::Item(e) => e.out_v,
            EdgeData::Next(e)
            | EdgeData::Moniker(e)
            | EdgeData::Attach(e)
            | EdgeData::Hover(e)
            | EdgeData::Definition(e)
            | EdgeData::References(e)
            | EdgeData::DocumentSymbol(e) => e.out_v,
        }
    }

    /// All targets, whether the edge is single- or multi-target.
    pub fn in_vs(&self) -> Vec<Id> {
        match &self.data {
            EdgeData::Contains(e) => e.in_vs.clone(),
            EdgeData::Item(e) => e.in_vs.clone(),
            EdgeData::Next(e)
            | EdgeData::Moniker(e)
            | EdgeData::Attach(e)
            | EdgeData::Hover(e)
            | EdgeData::Definition(e)
            | EdgeData::References(e)
            | EdgeData::DocumentSymbol(e) => vec![e.in_v],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EdgeLabel {
    Contains,
    Item,
    Next,
    Moniker,
    Attach,
    Hover,
    Definition,
    References,
    DocumentSymbol,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "label")]
pub enum EdgeData {
    #[serde(rename = "contains")]
    Contains(MultiEdge),
    #[serde(rename = "item")]
    Item(ItemEdge),
    #[serde(rename = "next")]
    Next(SingleEdge),
    #[serde(rename = "moniker")]
    Moniker(SingleEdge),
    #[serde(rename = "attach")]
    Attach(SingleEdge),
    #[serde(rename = "textDocument/hover")]
    Hover(SingleEdge),
    #[serde(rename = "textDocument/definition")]
    Definition(SingleEdge),
    #[serde(rename = "textDocument/references")]
    References(SingleEdge),
    #[serde(rename = "textDocument/documentSymbol")]
    DocumentSymbol(SingleEdge),
}

impl EdgeData {
    pub fn label(&self) -> EdgeLabel {
        match self {
            EdgeData::Contains(_) => EdgeLabel::Contains,
            EdgeData::Item(_) => EdgeLabel::Item,
            EdgeData::Next(_) => EdgeLabel::Next,
            EdgeData::Moniker(_) => EdgeLabel::Moniker,
            EdgeData::Attach(_) => EdgeLabel::Attach,
            EdgeData::Hover(_) => EdgeLabel::Hover,
            EdgeData::Definition(_) => EdgeLabel::Definition,
            EdgeData::References(_) => EdgeLabel::References,
            EdgeData::DocumentSymbol(_) => EdgeLabel::DocumentSymbol,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleEdge {
    pub out_v: Id,
    pub in_v: Id,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiEdge {
    pub out_v: Id,
    pub in_vs: Vec<Id>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEdge {
    pub out_v: Id,
    pub in_vs: Vec<Id>,
    pub document: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<ItemProperty>,
}

/// Role of the targets of an `item` edge leaving a reference result.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemProperty {
    Declarations,
    Definitions,
    References,
    ReferenceResults,
}
