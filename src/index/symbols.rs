//! Export paths, location kinds and inheritance lookups.
//!
//! [`Symbols`] owns every memo table keyed by [`SymbolId`]. Three tables are
//! scoped overrides rather than caches: parents, exports and alias forwards.
//! Adding one returns a [`Disposer`] that must be handed back to
//! [`Symbols::release`] once the region that asserted it has been visited.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::{FileId, NodeId, SymbolRef};
use crate::program::{NodeKind, Program};

use super::symbol_key::{SymbolId, SymbolKeys};

/// Where the declarations of a symbol live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocationKind {
    /// Default library files.
    Library,
    /// Files with module syntax.
    Module,
    /// Scripts, external dependencies and ambient declarations.
    Global,
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LocationKind::Library => "library",
            LocationKind::Module => "module",
            LocationKind::Global => "global",
        })
    }
}

/// Token for one scoped override.
#[must_use = "overrides leak into later files unless released"]
#[derive(Debug, PartialEq, Eq)]
pub enum Disposer {
    Parent { symbol: SymbolId, parent: SymbolRef },
    Export { parent: SymbolId, child: SymbolId },
    Alias { symbol: SymbolId, name: String },
}

#[derive(Clone, Debug)]
struct AliasForward {
    alias: SymbolRef,
    name: String,
}

#[derive(Debug, Default)]
pub struct Symbols {
    keys: SymbolKeys,
    /// `None` is the tombstone for "computed, not exported".
    export_paths: FxHashMap<SymbolId, Option<String>>,
    base_symbols: FxHashMap<SymbolId, Option<Vec<SymbolRef>>>,
    base_members: FxHashMap<SymbolId, FxHashMap<String, Option<Vec<SymbolRef>>>>,
    parents: FxHashMap<SymbolId, SymbolRef>,
    exports: FxHashMap<SymbolId, FxHashSet<SymbolId>>,
    aliases: FxHashMap<SymbolId, AliasForward>,
}

impl Symbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&mut self, program: &dyn Program, symbol: SymbolRef) -> SymbolId {
        self.keys.key(program, symbol)
    }

    // ========================================================================
    // LOCATION KIND
    // ========================================================================

    /// Uniform category of the given files, or `None` when they disagree.
    pub fn location_kind(program: &dyn Program, files: &[FileId]) -> Option<LocationKind> {
        let mut kinds = files.iter().map(|&file| {
            if program.file_symbol(file).is_some() {
                LocationKind::Module
            } else if program.is_source_file_default_library(file) {
                LocationKind::Library
            } else {
                LocationKind::Global
            }
        });
        let first = kinds.next()?;
        kinds.all(|k| k == first).then_some(first)
    }

    // ========================================================================
    // EXPORT PATHS
    // ========================================================================

    /// Dotted path of `symbol` from its module root, `None` when not exported.
    pub fn export_path(
        &mut self,
        program: &dyn Program,
        symbol: SymbolRef,
        kind: Option<LocationKind>,
    ) -> Option<String> {
        let mut overridden = false;
        self.export_path_inner(program, symbol, kind, &mut overridden)
    }

    fn export_path_inner(
        &mut self,
        program: &dyn Program,
        symbol: SymbolRef,
        kind: Option<LocationKind>,
        overridden: &mut bool,
    ) -> Option<String> {
        let id = self.key(program, symbol);
        if let Some(cached) = self.export_paths.get(&id) {
            return cached.clone();
        }

        let mut consulted = false;
        let result = self.compute_export_path(program, symbol, &id, kind, &mut consulted);
        if consulted {
            *overridden = true;
        } else {
            self.export_paths.insert(id, result.clone());
        }
        result
    }

    fn compute_export_path(
        &mut self,
        program: &dyn Program,
        symbol: SymbolRef,
        id: &SymbolId,
        kind: Option<LocationKind>,
        consulted: &mut bool,
    ) -> Option<String> {
        if is_source_file(program, symbol) {
            return Some(String::new());
        }

        let parent = match self.parents.get(id) {
            Some(&parent) => {
                *consulted = true;
                Some(parent)
            }
            None => program.parent_symbol(symbol),
        };
        let name = program.symbol_name(symbol);

        let Some(parent) = parent else {
            let flags = program.symbol_flags(symbol);
            let bare = matches!(kind, Some(LocationKind::Library | LocationKind::Global))
                && !is_nested_in_function_or_block(program, symbol);
            if flags.is_value_module() || bare {
                return Some(name);
            }
            let forward = self.aliases.get(id).cloned()?;
            *consulted = true;
            let alias_path = self.export_path_inner(program, forward.alias, kind, consulted)?;
            return Some(replace_last_segment(&alias_path, &forward.name));
        };

        let parent_path = self.export_path_inner(program, parent, kind, consulted)?;
        let parent_flags = program.symbol_flags(parent);
        let exported = parent_flags.is_class()
            || parent_flags.is_interface()
            || parent_flags.is_type_literal()
            || self.is_exported(program, parent, symbol, consulted);
        if !exported {
            return None;
        }
        Some(if parent_path.is_empty() {
            name
        } else {
            format!("{parent_path}.{name}")
        })
    }

    fn is_exported(
        &mut self,
        program: &dyn Program,
        parent: SymbolRef,
        child: SymbolRef,
        consulted: &mut bool,
    ) -> bool {
        if program.exports_of(parent).contains(&child) {
            return true;
        }
        let parent_id = self.key(program, parent);
        let child_id = self.key(program, child);
        let found = self
            .exports
            .get(&parent_id)
            .is_some_and(|children| children.contains(&child_id));
        if found {
            *consulted = true;
        }
        found
    }

    // ========================================================================
    // SCOPED OVERRIDES
    // ========================================================================

    pub fn add_parent(
        &mut self,
        program: &dyn Program,
        symbol: SymbolRef,
        parent: SymbolRef,
    ) -> Disposer {
        let id = self.key(program, symbol);
        self.parents.insert(id.clone(), parent);
        self.export_paths.clear();
        Disposer::Parent { symbol: id, parent }
    }

    pub fn add_export(
        &mut self,
        program: &dyn Program,
        parent: SymbolRef,
        child: SymbolRef,
    ) -> Disposer {
        let parent_id = self.key(program, parent);
        let child_id = self.key(program, child);
        self.exports
            .entry(parent_id.clone())
            .or_default()
            .insert(child_id.clone());
        self.export_paths.clear();
        Disposer::Export {
            parent: parent_id,
            child: child_id,
        }
    }

    /// Give an anonymous symbol the export name `name`, placed next to `alias`.
    pub fn add_alias(
        &mut self,
        program: &dyn Program,
        symbol: SymbolRef,
        alias: SymbolRef,
        name: String,
    ) -> Disposer {
        let id = self.key(program, symbol);
        self.aliases.insert(
            id.clone(),
            AliasForward {
                alias,
                name: name.clone(),
            },
        );
        self.export_paths.clear();
        Disposer::Alias { symbol: id, name }
    }

    /// Undo exactly the override `disposer` was issued for.
    ///
    /// Paths that consulted an override were never memoized, so nothing
    /// cached needs to be dropped here. Adding an override, on the other
    /// hand, clears the memo table.
    pub fn release(&mut self, disposer: Disposer) {
        match disposer {
            Disposer::Parent { symbol, parent } => {
                if self.parents.get(&symbol) == Some(&parent) {
                    self.parents.remove(&symbol);
                }
            }
            Disposer::Export { parent, child } => {
                if let Some(children) = self.exports.get_mut(&parent) {
                    children.remove(&child);
                    if children.is_empty() {
                        self.exports.remove(&parent);
                    }
                }
            }
            Disposer::Alias { symbol, name } => {
                if self.aliases.get(&symbol).is_some_and(|f| f.name == name) {
                    self.aliases.remove(&symbol);
                }
            }
        }
    }

    /// Number of live overrides of every kind.
    pub fn override_count(&self) -> usize {
        self.parents.len() + self.exports.values().map(FxHashSet::len).sum::<usize>() + self.aliases.len()
    }

    // ========================================================================
    // INHERITANCE
    // ========================================================================

    /// Direct supertypes of a class or interface; `None` for anything else.
    pub fn base_symbols(&mut self, program: &dyn Program, symbol: SymbolRef) -> Option<Vec<SymbolRef>> {
        let id = self.key(program, symbol);
        if let Some(cached) = self.base_symbols.get(&id) {
            return cached.clone();
        }

        let flags = program.symbol_flags(symbol);
        let result = if flags.is_class() {
            Some(heritage_symbols(program, symbol))
        } else if flags.is_interface() {
            program.declared_type_of(symbol).map(|ty| {
                program
                    .base_types_of(ty)
                    .into_iter()
                    .filter_map(|base| program.type_symbol(base))
                    .filter(|&base| base != symbol)
                    .collect()
            })
        } else {
            None
        };

        self.base_symbols.insert(id, result.clone());
        result
    }

    /// Members named `member` found along the supertypes of `symbol`.
    ///
    /// A base that declares the member ends the search along that path.
    /// Shared ancestors reached on several paths contribute once per path.
    pub fn find_base_members(
        &mut self,
        program: &dyn Program,
        symbol: SymbolRef,
        member: &str,
    ) -> Option<Vec<SymbolRef>> {
        let id = self.key(program, symbol);
        if let Some(cached) = self.base_members.get(&id).and_then(|m| m.get(member)) {
            return cached.clone();
        }
        // Cyclic heritage ends at the entry still being computed.
        self.base_members
            .entry(id.clone())
            .or_default()
            .insert(member.to_owned(), None);

        let result = self.base_symbols(program, symbol).and_then(|bases| {
            let mut found = Vec::new();
            for base in bases {
                let own = program
                    .members_of(base)
                    .into_iter()
                    .find(|&m| program.symbol_name(m) == member);
                match own {
                    Some(m) => found.push(m),
                    None => {
                        if let Some(inherited) = self.find_base_members(program, base, member) {
                            found.extend(inherited);
                        }
                    }
                }
            }
            (!found.is_empty()).then_some(found)
        });

        self.base_members
            .entry(id)
            .or_default()
            .insert(member.to_owned(), result.clone());
        result
    }
}

fn is_source_file(program: &dyn Program, symbol: SymbolRef) -> bool {
    program
        .declarations_of(symbol)
        .first()
        .is_some_and(|&decl| program.kind(decl) == NodeKind::SourceFile)
}

fn is_nested_in_function_or_block(program: &dyn Program, symbol: SymbolRef) -> bool {
    program.declarations_of(symbol).into_iter().any(|decl| {
        ancestors(program, decl).any(|node| program.kind(node).is_function_or_block())
    })
}

/// Strict ancestors of `node`, innermost first.
pub(crate) fn ancestors(program: &dyn Program, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(program.parent(node), move |&n| program.parent(n))
}

/// Symbols named in `extends`/`implements` clauses of a class.
fn heritage_symbols(program: &dyn Program, class: SymbolRef) -> Vec<SymbolRef> {
    let mut result = Vec::new();
    for decl in program.declarations_of(class) {
        for clause in program.children(decl) {
            if program.kind(clause) != NodeKind::HeritageClause {
                continue;
            }
            for expr in program.children(clause) {
                let target = program
                    .symbol_at(expr)
                    .or_else(|| program.children(expr).into_iter().find_map(|c| program.symbol_at(c)));
                let Some(mut target) = target else {
                    continue;
                };
                if program.symbol_flags(target).is_alias() {
                    if let Some(aliased) = program.aliased_symbol_of(target) {
                        target = aliased;
                    }
                }
                if target != class && !result.contains(&target) {
                    result.push(target);
                }
            }
        }
    }
    result
}

fn replace_last_segment(path: &str, name: &str) -> String {
    match path.rfind('.') {
        Some(dot) => format!("{}.{name}", &path[..dot]),
        None => name.to_owned(),
    }
}
