//! Choosing how a symbol is recorded.
//!
//! [`ResolverKind::select`] classifies a symbol once per resolution. The
//! other methods are the per-kind hooks used while creating its data:
//! which nodes count as declarations, which files it spans, and how the
//! name of one declaration is rendered.

use tracing::trace;

use crate::base::{FileId, NodeId, SymbolRef, TypeRef};
use crate::error::{IndexError, Result};
use crate::program::{NodeKind, Program};

use super::symbols::{Disposer, Symbols};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolverKind {
    Standard,
    Alias,
    Method,
    UnionOrIntersection,
    Transient,
    TypeAlias,
}

impl ResolverKind {
    /// Composite-ness is checked before the transient-only fallback; the
    /// type alias, alias and method checks only apply to non-transient symbols.
    pub fn select(program: &dyn Program, symbol: SymbolRef, location: Option<NodeId>) -> Self {
        let flags = program.symbol_flags(symbol);
        let kind = if flags.is_transient() {
            if location.is_some_and(|l| composite_receiver_types(program, l).is_some()) {
                ResolverKind::UnionOrIntersection
            } else if flags.is_transient_only() {
                ResolverKind::Transient
            } else {
                ResolverKind::Standard
            }
        } else if flags.is_type_alias() {
            ResolverKind::TypeAlias
        } else if flags.is_alias() {
            ResolverKind::Alias
        } else if flags.is_method() {
            ResolverKind::Method
        } else {
            ResolverKind::Standard
        };
        trace!(?symbol, ?kind, "resolver selected");
        kind
    }

    pub fn name(self) -> &'static str {
        match self {
            ResolverKind::Standard => "standard",
            ResolverKind::Alias => "alias",
            ResolverKind::Method => "method",
            ResolverKind::UnionOrIntersection => "union-or-intersection",
            ResolverKind::Transient => "transient",
            ResolverKind::TypeAlias => "type-alias",
        }
    }

    /// Scoped overrides to hold while `decl` is visited.
    ///
    /// Only type aliases forward anything: their inline type literals take
    /// the alias name. The caller releases the returned disposers when the
    /// declaration's visit completes.
    pub fn forward_symbol_information(
        self,
        program: &dyn Program,
        symbols: &mut Symbols,
        decl: NodeId,
    ) -> Vec<Disposer> {
        match self {
            ResolverKind::TypeAlias => forward_type_alias(program, symbols, decl),
            _ => Vec::new(),
        }
    }

    /// Synthetic kinds are anchored at the node that triggered them.
    pub fn requires_location(self) -> bool {
        matches!(
            self,
            ResolverKind::UnionOrIntersection | ResolverKind::Transient
        )
    }

    pub fn declarations(
        self,
        program: &dyn Program,
        symbol: SymbolRef,
        location: Option<NodeId>,
    ) -> Result<Vec<NodeId>> {
        if !self.requires_location() {
            return Ok(program.declarations_of(symbol));
        }
        location
            .map(|l| vec![l])
            .ok_or(IndexError::MissingLocation {
                resolver: self.name(),
            })
    }

    /// Files of the given declarations, first-seen order.
    pub fn source_files(self, program: &dyn Program, declarations: &[NodeId]) -> Vec<FileId> {
        let mut files = Vec::new();
        for &decl in declarations {
            let file = program.node_file(decl);
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }

    /// The node and text naming `decl`, if it has a name.
    pub fn identifier_information(
        self,
        program: &dyn Program,
        symbol: SymbolRef,
        decl: NodeId,
    ) -> Option<(NodeId, String)> {
        if self.requires_location() {
            return Some((decl, program.node_text(decl)));
        }
        if program.kind(decl) == NodeKind::SourceFile
            && program.symbol_flags(symbol).is_value_module()
        {
            return Some((decl, String::new()));
        }
        let name = program.name_of(decl)?;
        Some((name, program.node_text(name)))
    }
}

/// Constituent types of the receiver when `location` is a property name
/// accessed on a union or intersection.
pub fn composite_receiver_types(program: &dyn Program, location: NodeId) -> Option<Vec<TypeRef>> {
    let parent = program.parent(location)?;
    if program.kind(parent) != NodeKind::PropertyAccessExpression {
        return None;
    }
    let receiver = program
        .children(parent)
        .into_iter()
        .find(|&child| child != location)?;
    let ty = program.type_at(receiver)?;
    program.union_or_intersection_types(ty)
}

/// Give the type literals of a type alias declaration stable export names.
///
/// Literals inside a union or intersection are named `{index}_{alias}`; a
/// lone literal takes the alias name itself. The returned disposers undo
/// the forwards and must be released when the declaration has been visited.
pub fn forward_type_alias(
    program: &dyn Program,
    symbols: &mut Symbols,
    decl: NodeId,
) -> Vec<Disposer> {
    let Some(name) = program.name_of(decl) else {
        return Vec::new();
    };
    let Some(alias) = program.symbol_at(name) else {
        return Vec::new();
    };
    let alias_name = program.symbol_name(alias);

    let mut literals = Vec::new();
    let mut composite = false;
    for child in program.children(decl) {
        if child != name {
            collect_type_literals(program, child, &mut literals, &mut composite);
        }
    }

    let mut disposers = Vec::new();
    for (index, literal) in literals.into_iter().enumerate() {
        let Some(symbol) = program.symbol_at(literal) else {
            continue;
        };
        let forward = if composite {
            format!("{index}_{alias_name}")
        } else {
            alias_name.clone()
        };
        trace!(?symbol, %forward, "type literal forwarded");
        disposers.push(symbols.add_alias(program, symbol, alias, forward));
    }
    disposers
}

fn collect_type_literals(
    program: &dyn Program,
    node: NodeId,
    out: &mut Vec<NodeId>,
    composite: &mut bool,
) {
    match program.kind(node) {
        NodeKind::UnionType | NodeKind::IntersectionType => {
            *composite = true;
            for child in program.children(node) {
                collect_type_literals(program, child, out, composite);
            }
        }
        NodeKind::ParenthesizedType => {
            for child in program.children(node) {
                collect_type_literals(program, child, out, composite);
            }
        }
        NodeKind::TypeLiteral => out.push(node),
        _ => {}
    }
}
