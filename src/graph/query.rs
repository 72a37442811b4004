//! Answering editor requests from an emitted graph.
//!
//! This is the consumer side of the format: starting from a range, follow
//! `next` edges through result sets and take the first result of the asked
//! kind. Reference results are expanded transitively through their
//! `referenceResults` items.

use rustc_hash::{FxHashMap, FxHashSet};

use super::protocol::{
    Edge, EdgeData, EdgeLabel, Element, Hover, Id, ItemProperty, Moniker, RangeVertex, Vertex,
    VertexData,
};

pub struct GraphQuery<'a> {
    vertices: FxHashMap<Id, &'a Vertex>,
    order: Vec<Id>,
    outgoing: FxHashMap<Id, Vec<&'a Edge>>,
    attached: FxHashMap<Id, Vec<Id>>,
}

impl<'a> GraphQuery<'a> {
    pub fn new(elements: &'a [Element]) -> Self {
        let mut vertices = FxHashMap::default();
        let mut order = Vec::new();
        let mut outgoing: FxHashMap<Id, Vec<&'a Edge>> = FxHashMap::default();
        let mut attached: FxHashMap<Id, Vec<Id>> = FxHashMap::default();

        for element in elements {
            match element {
                Element::Vertex(v) => {
                    vertices.insert(v.id, v);
                    order.push(v.id);
                }
                Element::Edge(e) => {
                    if let EdgeData::Attach(single) = &e.data {
                        attached.entry(single.in_v).or_default().push(single.out_v);
                    }
                    outgoing.entry(e.out_v()).or_default().push(e);
                }
            }
        }

        Self {
            vertices,
            order,
            outgoing,
            attached,
        }
    }

    pub fn vertex(&self, id: Id) -> Option<&'a Vertex> {
        self.vertices.get(&id).copied()
    }

    pub fn range(&self, id: Id) -> Option<&'a RangeVertex> {
        match &self.vertex(id)?.data {
            VertexData::Range(r) => Some(r),
            _ => None,
        }
    }

    /// Range vertices whose tag text equals `text`, in emission order.
    pub fn ranges_with_text(&self, text: &str) -> Vec<Id> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.range(id).and_then(RangeVertex::text) == Some(text))
            .collect()
    }

    fn out(&self, id: Id, label: EdgeLabel) -> impl Iterator<Item = &'a Edge> + '_ {
        self.outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |e| e.label() == label)
    }

    /// The vertex itself followed by every result set reachable through `next`.
    pub fn next_chain(&self, id: Id) -> Vec<Id> {
        let mut chain = vec![id];
        let mut seen = FxHashSet::default();
        seen.insert(id);
        let mut current = id;
        while let Some(edge) = self.out(current, EdgeLabel::Next).next() {
            let target = edge.in_vs()[0];
            if !seen.insert(target) {
                break;
            }
            chain.push(target);
            current = target;
        }
        chain
    }

    fn first_result(&self, range: Id, label: EdgeLabel) -> Option<Id> {
        self.next_chain(range)
            .into_iter()
            .find_map(|id| self.out(id, label).next().map(|e| e.in_vs()[0]))
    }

    pub fn definitions(&self, range: Id) -> Vec<Id> {
        let Some(result) = self.first_result(range, EdgeLabel::Definition) else {
            return Vec::new();
        };
        self.out(result, EdgeLabel::Item)
            .flat_map(Edge::in_vs)
            .collect()
    }

    /// All ranges reachable from the range's reference result, declarations and definitions included.
    pub fn references(&self, range: Id) -> Vec<Id> {
        self.references_with(range, |_| true)
    }

    /// Like [`GraphQuery::references`], restricted to items with the given property.
    pub fn references_by(&self, range: Id, property: ItemProperty) -> Vec<Id> {
        self.references_with(range, |p| p == Some(property))
    }

    fn references_with(&self, range: Id, keep: impl Fn(Option<ItemProperty>) -> bool) -> Vec<Id> {
        let Some(result) = self.first_result(range, EdgeLabel::References) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut seen_results = FxHashSet::default();
        let mut seen_ranges = FxHashSet::default();
        let mut stack = vec![result];
        while let Some(current) = stack.pop() {
            if !seen_results.insert(current) {
                continue;
            }
            for edge in self.out(current, EdgeLabel::Item) {
                let EdgeData::Item(item) = &edge.data else {
                    continue;
                };
                if item.property == Some(ItemProperty::ReferenceResults) {
                    stack.extend(item.in_vs.iter().rev().copied());
                } else if keep(item.property) {
                    out.extend(item.in_vs.iter().copied().filter(|id| seen_ranges.insert(*id)));
                }
            }
        }
        out
    }

    pub fn hover(&self, range: Id) -> Option<&'a Hover> {
        let result = self.first_result(range, EdgeLabel::Hover)?;
        match &self.vertex(result)?.data {
            VertexData::HoverResult(h) => Some(&h.result),
            _ => None,
        }
    }

    /// Monikers along the `next` chain, each followed by the monikers attached to it.
    pub fn monikers(&self, range: Id) -> Vec<&'a Moniker> {
        let mut out = Vec::new();
        for id in self.next_chain(range) {
            for edge in self.out(id, EdgeLabel::Moniker) {
                let target = edge.in_vs()[0];
                out.extend(self.moniker(target));
                for linked in self.attached.get(&target).into_iter().flatten() {
                    out.extend(self.moniker(*linked));
                }
            }
        }
        out
    }

    fn moniker(&self, id: Id) -> Option<&'a Moniker> {
        match &self.vertex(id)?.data {
            VertexData::Moniker(m) => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, line_range};

    #[test]
    fn test_references_follow_reference_results() {
        let mut b = GraphBuilder::new();
        let doc = b.document("file:///p/a.ts".into(), "typescript");
        let base_rs = b.result_set();
        let base_refs = b.reference_result();
        let derived_refs = b.reference_result();
        let r1 = b.range(line_range((0, 0), (0, 1)), None);
        let r2 = b.range(line_range((1, 0), (1, 1)), None);

        let mut elements: Vec<Element> = vec![
            Element::Vertex(doc.clone()),
            Element::Vertex(base_rs.clone()),
            Element::Vertex(base_refs.clone()),
            Element::Vertex(derived_refs.clone()),
            Element::Vertex(r1.clone()),
            Element::Vertex(r2.clone()),
        ];
        elements.push(Element::Edge(b.next(r1.id, base_rs.id)));
        elements.push(Element::Edge(b.references(base_rs.id, base_refs.id)));
        elements.push(Element::Edge(
            b.item(base_refs.as_ref(), vec![r1.id], doc.id, ItemProperty::References)
                .unwrap(),
        ));
        elements.push(Element::Edge(
            b.item(
                base_refs.as_ref(),
                vec![derived_refs.id],
                doc.id,
                ItemProperty::ReferenceResults,
            )
            .unwrap(),
        ));
        elements.push(Element::Edge(
            b.item(derived_refs.as_ref(), vec![r2.id], doc.id, ItemProperty::Definitions)
                .unwrap(),
        ));

        let query = GraphQuery::new(&elements);
        assert_eq!(query.next_chain(r1.id), vec![r1.id, base_rs.id]);
        assert_eq!(query.references(r1.id), vec![r1.id, r2.id]);
        assert_eq!(
            query.references_by(r1.id, ItemProperty::Definitions),
            vec![r2.id]
        );
        assert!(query.definitions(r1.id).is_empty());
    }
}
