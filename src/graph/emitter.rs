//! Sinks for graph elements.

use std::io::Write;

use crate::error::Result;

use super::protocol::{Edge, EdgeLabel, Element, Id, Moniker, RangeVertex, Vertex, VertexData};

/// Receives elements in creation order.
pub trait Emitter {
    fn emit(&mut self, element: Element) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every element in memory.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    elements: Vec<Element>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.elements.iter().filter_map(Element::as_vertex)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.elements.iter().filter_map(Element::as_edge)
    }

    pub fn edges_labeled(&self, label: EdgeLabel) -> impl Iterator<Item = &Edge> {
        self.edges().filter(move |e| e.label() == label)
    }

    pub fn vertex(&self, id: Id) -> Option<&Vertex> {
        self.vertices().find(|v| v.id == id)
    }

    pub fn ranges(&self) -> impl Iterator<Item = (Id, &RangeVertex)> {
        self.vertices().filter_map(|v| match &v.data {
            VertexData::Range(r) => Some((v.id, r)),
            _ => None,
        })
    }

    pub fn monikers(&self) -> impl Iterator<Item = &Moniker> {
        self.vertices().filter_map(|v| match &v.data {
            VertexData::Moniker(m) => Some(m),
            _ => None,
        })
    }
}

impl Emitter for MemoryEmitter {
    fn emit(&mut self, element: Element) -> Result<()> {
        self.elements.push(element);
        Ok(())
    }
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesEmitter<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Emitter for JsonLinesEmitter<W> {
    fn emit(&mut self, element: Element) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &element)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
