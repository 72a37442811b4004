//! An in-memory checked program.
//!
//! [`ProgramBuilder`] assembles syntax trees, symbols and types by hand and
//! produces a [`MemoryProgram`] that answers every [`Program`] query from
//! plain vectors. Ranges are byte ranges into the file text; the builder can
//! locate them by searching the text so callers rarely count offsets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use super::{FileOrigin, FileSet, NodeKind, OracleError, Program, QuickInfo, SymbolFlags};
use crate::base::{FileId, NodeId, SymbolRef, TextRange, TextSize, TypeRef};

#[derive(Clone, Debug)]
struct FileEntry {
    root: NodeId,
    symbol: Option<SymbolRef>,
}

#[derive(Clone, Debug)]
struct NodeEntry {
    kind: NodeKind,
    file: FileId,
    range: TextRange,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    name: Option<NodeId>,
    symbol: Option<SymbolRef>,
    ty: Option<TypeRef>,
    quick_info: Option<Result<QuickInfo, String>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Special {
    None,
    Unknown,
    Undefined,
}

#[derive(Clone, Debug)]
struct SymbolEntry {
    name: String,
    flags: SymbolFlags,
    declarations: Vec<NodeId>,
    parent: Option<SymbolRef>,
    exports: Vec<SymbolRef>,
    members: Vec<SymbolRef>,
    aliased: Option<SymbolRef>,
    declared_type: Option<TypeRef>,
    special: Special,
}

#[derive(Clone, Debug, Default)]
struct TypeEntry {
    symbol: Option<SymbolRef>,
    bases: Vec<TypeRef>,
    constituents: Option<Vec<TypeRef>>,
    properties: Vec<SymbolRef>,
}

/// A program whose trees and symbols were assembled with [`ProgramBuilder`].
#[derive(Debug)]
pub struct MemoryProgram {
    files: FileSet,
    file_entries: IndexMap<FileId, FileEntry>,
    nodes: Vec<NodeEntry>,
    symbols: Vec<SymbolEntry>,
    types: Vec<TypeEntry>,
}

impl MemoryProgram {
    fn node(&self, node: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(node.index() as usize)
    }

    fn symbol(&self, symbol: SymbolRef) -> Option<&SymbolEntry> {
        self.symbols.get(symbol.index() as usize)
    }

    fn ty(&self, ty: TypeRef) -> Option<&TypeEntry> {
        self.types.get(ty.index() as usize)
    }

    /// Resolve a path to its file id.
    pub fn file_id(&self, path: impl AsRef<Path>) -> Option<FileId> {
        self.files.lookup(path.as_ref())
    }
}

impl Program for MemoryProgram {
    fn source_files(&self) -> Vec<FileId> {
        self.file_entries.keys().copied().collect()
    }

    fn file_path(&self, file: FileId) -> Option<PathBuf> {
        self.files.path(file)
    }

    fn file_text(&self, file: FileId) -> Option<Arc<str>> {
        self.files.text(file)
    }

    fn is_declaration_file(&self, file: FileId) -> bool {
        self.files.is_declaration(file)
    }

    fn is_source_file_default_library(&self, file: FileId) -> bool {
        self.files.origin(file) == Some(FileOrigin::DefaultLibrary)
    }

    fn is_source_file_from_external_library(&self, file: FileId) -> bool {
        self.files.origin(file) == Some(FileOrigin::ExternalLibrary)
    }

    fn root(&self, file: FileId) -> NodeId {
        self.file_entries
            .get(&file)
            .map(|f| f.root)
            .unwrap_or(NodeId::new(u32::MAX))
    }

    fn file_symbol(&self, file: FileId) -> Option<SymbolRef> {
        self.file_entries.get(&file).and_then(|f| f.symbol)
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        self.node(node).map(|n| n.kind).unwrap_or(NodeKind::Other)
    }

    fn node_file(&self, node: NodeId) -> FileId {
        self.node(node).map(|n| n.file).unwrap_or(FileId::new(u32::MAX))
    }

    fn range(&self, node: NodeId) -> TextRange {
        self.node(node).map(|n| n.range).unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn name_of(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.name)
    }

    fn symbol_at(&self, node: NodeId) -> Option<SymbolRef> {
        self.node(node).and_then(|n| n.symbol)
    }

    fn symbol_name(&self, symbol: SymbolRef) -> String {
        self.symbol(symbol).map(|s| s.name.clone()).unwrap_or_default()
    }

    fn symbol_flags(&self, symbol: SymbolRef) -> SymbolFlags {
        self.symbol(symbol)
            .map(|s| s.flags)
            .unwrap_or(SymbolFlags::empty())
    }

    fn declarations_of(&self, symbol: SymbolRef) -> Vec<NodeId> {
        self.symbol(symbol)
            .map(|s| s.declarations.clone())
            .unwrap_or_default()
    }

    fn parent_symbol(&self, symbol: SymbolRef) -> Option<SymbolRef> {
        self.symbol(symbol).and_then(|s| s.parent)
    }

    fn exports_of(&self, symbol: SymbolRef) -> Vec<SymbolRef> {
        self.symbol(symbol)
            .map(|s| s.exports.clone())
            .unwrap_or_default()
    }

    fn members_of(&self, symbol: SymbolRef) -> Vec<SymbolRef> {
        self.symbol(symbol)
            .map(|s| s.members.clone())
            .unwrap_or_default()
    }

    fn aliased_symbol_of(&self, symbol: SymbolRef) -> Option<SymbolRef> {
        self.symbol(symbol).and_then(|s| s.aliased)
    }

    fn is_unknown_symbol(&self, symbol: SymbolRef) -> bool {
        self.symbol(symbol).is_some_and(|s| s.special == Special::Unknown)
    }

    fn is_undefined_symbol(&self, symbol: SymbolRef) -> bool {
        self.symbol(symbol)
            .is_some_and(|s| s.special == Special::Undefined)
    }

    fn declared_type_of(&self, symbol: SymbolRef) -> Option<TypeRef> {
        self.symbol(symbol).and_then(|s| s.declared_type)
    }

    fn type_at(&self, node: NodeId) -> Option<TypeRef> {
        self.node(node).and_then(|n| n.ty)
    }

    fn base_types_of(&self, ty: TypeRef) -> Vec<TypeRef> {
        self.ty(ty).map(|t| t.bases.clone()).unwrap_or_default()
    }

    fn type_symbol(&self, ty: TypeRef) -> Option<SymbolRef> {
        self.ty(ty).and_then(|t| t.symbol)
    }

    fn union_or_intersection_types(&self, ty: TypeRef) -> Option<Vec<TypeRef>> {
        self.ty(ty).and_then(|t| t.constituents.clone())
    }

    fn property_of_type(&self, ty: TypeRef, name: &str) -> Option<SymbolRef> {
        let entry = self.ty(ty)?;
        entry
            .properties
            .iter()
            .copied()
            .chain(entry.symbol.map(|s| self.members_of(s)).unwrap_or_default())
            .find(|&p| self.symbol(p).is_some_and(|s| s.name == name))
    }

    fn quick_info_at(&self, node: NodeId) -> Result<Option<QuickInfo>, OracleError> {
        let entry = self.node(node).ok_or(OracleError::UnknownNode(node))?;
        match &entry.quick_info {
            None => Ok(None),
            Some(Ok(info)) => Ok(Some(info.clone())),
            Some(Err(message)) => Err(OracleError::QuickInfo(node, message.clone())),
        }
    }
}

/// Assembles a [`MemoryProgram`].
///
/// Builder methods panic on malformed input (unknown handles, search text
/// that does not occur). They are meant for fixtures, not for untrusted data.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    files: FileSet,
    file_entries: IndexMap<FileId, FileEntry>,
    nodes: Vec<NodeEntry>,
    symbols: Vec<SymbolEntry>,
    types: Vec<TypeEntry>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // FILES
    // ========================================================================

    /// Add a source file, returning its `SourceFile` node.
    pub fn file(&mut self, path: impl AsRef<Path>, text: &str) -> NodeId {
        let id = self.files.add(path.as_ref(), text);
        let root = self.push_node(NodeEntry {
            kind: NodeKind::SourceFile,
            file: id,
            range: TextRange::up_to(TextSize::of(text)),
            parent: None,
            children: Vec::new(),
            name: None,
            symbol: None,
            ty: None,
            quick_info: None,
        });
        self.file_entries.insert(
            id,
            FileEntry { root, symbol: None },
        );
        root
    }

    pub fn mark_default_library(&mut self, root: NodeId) -> &mut Self {
        self.set_origin(root, FileOrigin::DefaultLibrary)
    }

    pub fn mark_external_library(&mut self, root: NodeId) -> &mut Self {
        self.set_origin(root, FileOrigin::ExternalLibrary)
    }

    fn set_origin(&mut self, root: NodeId, origin: FileOrigin) -> &mut Self {
        let file = self.nodes[root.index() as usize].file;
        self.files.set_origin(file, origin);
        self
    }

    /// Turn a file into a module: creates its value-module symbol declared by the root.
    ///
    /// # Panics
    ///
    /// Panics if `root` is not a node of this builder.
    pub fn module(&mut self, root: NodeId) -> SymbolRef {
        let path = self
            .files
            .path(self.nodes[root.index() as usize].file)
            .unwrap_or_default();
        let name = format!("\"{}\"", path.with_extension("").display());
        let symbol = self.symbol(name, SymbolFlags::VALUE_MODULE);
        self.symbols[symbol.index() as usize].declarations.push(root);
        self.nodes[root.index() as usize].symbol = Some(symbol);
        self.file_entry(root).symbol = Some(symbol);
        symbol
    }

    fn file_entry(&mut self, root: NodeId) -> &mut FileEntry {
        let file = self.nodes[root.index() as usize].file;
        self.file_entries
            .get_mut(&file)
            .expect("node does not belong to a known file")
    }

    // ========================================================================
    // NODES
    // ========================================================================

    fn push_node(&mut self, entry: NodeEntry) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        if let Some(parent) = entry.parent {
            self.nodes[parent.index() as usize].children.push(id);
        }
        self.nodes.push(entry);
        id
    }

    /// Add a child node with an explicit range.
    pub fn node(&mut self, parent: NodeId, kind: NodeKind, range: TextRange) -> NodeId {
        let file = self.nodes[parent.index() as usize].file;
        self.push_node(NodeEntry {
            kind,
            file,
            range,
            parent: Some(parent),
            children: Vec::new(),
            name: None,
            symbol: None,
            ty: None,
            quick_info: None,
        })
    }

    /// Add a child node covering the first occurrence of `text` inside `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `text` does not occur inside `parent`, see [`find`](Self::find).
    pub fn node_at(&mut self, parent: NodeId, kind: NodeKind, text: &str) -> NodeId {
        self.node_at_nth(parent, kind, text, 0)
    }

    /// Add a child node covering the `nth` occurrence of `text` inside `parent`.
    ///
    /// # Panics
    ///
    /// Panics if there is no `nth` occurrence, see [`find`](Self::find).
    pub fn node_at_nth(&mut self, parent: NodeId, kind: NodeKind, text: &str, nth: usize) -> NodeId {
        let range = self.find(parent, text, nth);
        self.node(parent, kind, range)
    }

    /// Add a declaration node covering `text` plus its name identifier.
    ///
    /// The name is the first occurrence of `name` inside the declaration.
    ///
    /// # Panics
    ///
    /// Panics if `text` does not occur in `parent` or `name` does not occur in `text`.
    pub fn declaration(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        text: &str,
        name: &str,
    ) -> (NodeId, NodeId) {
        let decl = self.node_at(parent, kind, text);
        let ident = self.node_at(decl, NodeKind::Identifier, name);
        self.nodes[decl.index() as usize].name = Some(ident);
        (decl, ident)
    }

    /// Add an identifier for the `nth` occurrence of `name` in `parent`, bound to `symbol`.
    ///
    /// # Panics
    ///
    /// Panics if there is no `nth` occurrence of `name`.
    pub fn identifier(
        &mut self,
        parent: NodeId,
        name: &str,
        nth: usize,
        symbol: SymbolRef,
    ) -> NodeId {
        let ident = self.node_at_nth(parent, NodeKind::Identifier, name, nth);
        self.bind(ident, symbol);
        ident
    }

    /// Locate the `nth` occurrence of `text` inside `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is unknown or `text` occurs fewer than `nth + 1` times in it.
    pub fn find(&self, parent: NodeId, text: &str, nth: usize) -> TextRange {
        let entry = &self.nodes[parent.index() as usize];
        let contents = self
            .files
            .text(entry.file)
            .expect("file has no contents");
        let start = usize::from(entry.range.start());
        let end = usize::from(entry.range.end());
        let haystack = &contents[start..end];
        let (offset, _) = haystack
            .match_indices(text)
            .nth(nth)
            .unwrap_or_else(|| panic!("`{text}` (#{nth}) not found in `{haystack}`"));
        let begin = TextSize::from((start + offset) as u32);
        TextRange::at(begin, TextSize::of(text))
    }

    pub fn set_name(&mut self, decl: NodeId, name: NodeId) -> &mut Self {
        self.nodes[decl.index() as usize].name = Some(name);
        self
    }

    pub fn bind(&mut self, node: NodeId, symbol: SymbolRef) -> &mut Self {
        self.nodes[node.index() as usize].symbol = Some(symbol);
        self
    }

    pub fn set_type_at(&mut self, node: NodeId, ty: TypeRef) -> &mut Self {
        self.nodes[node.index() as usize].ty = Some(ty);
        self
    }

    pub fn set_quick_info(&mut self, node: NodeId, display: &str, documentation: &str) -> &mut Self {
        self.nodes[node.index() as usize].quick_info = Some(Ok(QuickInfo {
            display: display.to_owned(),
            documentation: documentation.to_owned(),
        }));
        self
    }

    pub fn fail_quick_info(&mut self, node: NodeId, message: &str) -> &mut Self {
        self.nodes[node.index() as usize].quick_info = Some(Err(message.to_owned()));
        self
    }

    // ========================================================================
    // SYMBOLS
    // ========================================================================

    pub fn symbol(&mut self, name: impl Into<String>, flags: SymbolFlags) -> SymbolRef {
        let id = SymbolRef::new(self.symbols.len() as u32);
        self.symbols.push(SymbolEntry {
            name: name.into(),
            flags,
            declarations: Vec::new(),
            parent: None,
            exports: Vec::new(),
            members: Vec::new(),
            aliased: None,
            declared_type: None,
            special: Special::None,
        });
        id
    }

    /// Record `decl` as a declaration of `symbol` and bind the declaration and its name to it.
    pub fn declare(&mut self, symbol: SymbolRef, decl: NodeId) -> &mut Self {
        self.symbols[symbol.index() as usize].declarations.push(decl);
        self.bind(decl, symbol);
        if let Some(name) = self.nodes[decl.index() as usize].name {
            self.bind(name, symbol);
        }
        self
    }

    pub fn set_parent_symbol(&mut self, child: SymbolRef, parent: SymbolRef) -> &mut Self {
        self.symbols[child.index() as usize].parent = Some(parent);
        self
    }

    /// `parent` exports `child`; also makes `parent` the parent of `child`.
    pub fn export(&mut self, parent: SymbolRef, child: SymbolRef) -> &mut Self {
        self.symbols[parent.index() as usize].exports.push(child);
        self.set_parent_symbol(child, parent)
    }

    /// Add `child` to the exports of `parent` without touching its parent.
    pub fn export_only(&mut self, parent: SymbolRef, child: SymbolRef) -> &mut Self {
        self.symbols[parent.index() as usize].exports.push(child);
        self
    }

    /// `member` is a member of the class/interface/type literal `container`.
    pub fn member(&mut self, container: SymbolRef, member: SymbolRef) -> &mut Self {
        self.symbols[container.index() as usize].members.push(member);
        self.set_parent_symbol(member, container)
    }

    pub fn alias(&mut self, alias: SymbolRef, target: SymbolRef) -> &mut Self {
        self.symbols[alias.index() as usize].aliased = Some(target);
        self
    }

    pub fn mark_unknown(&mut self, symbol: SymbolRef) -> &mut Self {
        self.symbols[symbol.index() as usize].special = Special::Unknown;
        self
    }

    pub fn mark_undefined(&mut self, symbol: SymbolRef) -> &mut Self {
        self.symbols[symbol.index() as usize].special = Special::Undefined;
        self
    }

    // ========================================================================
    // TYPES
    // ========================================================================

    /// A new object type, optionally owned by `symbol` (its properties are then the symbol's members).
    pub fn object_type(&mut self, symbol: Option<SymbolRef>) -> TypeRef {
        let id = TypeRef::new(self.types.len() as u32);
        self.types.push(TypeEntry {
            symbol,
            ..TypeEntry::default()
        });
        id
    }

    pub fn union_type(&mut self, constituents: Vec<TypeRef>) -> TypeRef {
        let id = TypeRef::new(self.types.len() as u32);
        self.types.push(TypeEntry {
            constituents: Some(constituents),
            ..TypeEntry::default()
        });
        id
    }

    pub fn set_declared_type(&mut self, symbol: SymbolRef, ty: TypeRef) -> &mut Self {
        self.symbols[symbol.index() as usize].declared_type = Some(ty);
        self
    }

    pub fn add_base_type(&mut self, ty: TypeRef, base: TypeRef) -> &mut Self {
        self.types[ty.index() as usize].bases.push(base);
        self
    }

    pub fn add_property(&mut self, ty: TypeRef, property: SymbolRef) -> &mut Self {
        self.types[ty.index() as usize].properties.push(property);
        self
    }

    /// Finish the program. Children are put into source order.
    pub fn build(mut self) -> MemoryProgram {
        let ranges: Vec<TextRange> = self.nodes.iter().map(|n| n.range).collect();
        for node in &mut self.nodes {
            node.children.sort_by_key(|c| {
                let range = ranges[c.index() as usize];
                (range.start(), std::cmp::Reverse(range.end()))
            });
        }
        MemoryProgram {
            files: self.files,
            file_entries: self.file_entries,
            nodes: self.nodes,
            symbols: self.symbols,
            types: self.types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_locates_ranges() {
        let mut b = ProgramBuilder::new();
        let root = b.file("/p/a.ts", "export const x = 10;");
        let list = b.node_at(root, NodeKind::VariableDeclarationList, "const x = 10");
        let (decl, name) = b.declaration(list, NodeKind::VariableDeclaration, "x = 10", "x");
        let program = b.build();

        assert_eq!(program.range(list), TextRange::new(TextSize::from(7), TextSize::from(19)));
        assert_eq!(program.node_text(decl), "x = 10");
        assert_eq!(program.node_text(name), "x");
        assert_eq!(program.name_of(decl), Some(name));
        assert_eq!(program.parent(name), Some(decl));
        assert_eq!(program.children(root), vec![list]);
    }

    #[test]
    fn test_module_symbol() {
        let mut b = ProgramBuilder::new();
        let root = b.file("/p/a.ts", "export {};");
        let module = b.module(root);
        let program = b.build();
        let file = program.file_id("/p/a.ts").unwrap();

        assert_eq!(program.file_symbol(file), Some(module));
        assert_eq!(program.declarations_of(module), vec![root]);
        assert!(program.symbol_flags(module).is_value_module());
        assert!(!program.is_declaration_file(file));
    }

    #[test]
    fn test_children_sorted_by_start() {
        let mut b = ProgramBuilder::new();
        let root = b.file("/p/a.ts", "a; b;");
        let second = b.node_at(root, NodeKind::Identifier, "b");
        let first = b.node_at(root, NodeKind::Identifier, "a");
        let program = b.build();

        assert_eq!(program.children(root), vec![first, second]);
    }

    #[test]
    fn test_quick_info_failure_is_reported() {
        let mut b = ProgramBuilder::new();
        let root = b.file("/p/a.ts", "x");
        let ident = b.node_at(root, NodeKind::Identifier, "x");
        b.fail_quick_info(ident, "checker crashed");
        let program = b.build();

        assert!(program.quick_info_at(ident).is_err());
        assert_eq!(program.quick_info_at(root).unwrap(), None);
    }

    #[test]
    fn test_property_of_type_uses_owner_members() {
        let mut b = ProgramBuilder::new();
        let class = b.symbol("A", SymbolFlags::CLASS);
        let prop = b.symbol("p", SymbolFlags::PROPERTY);
        b.member(class, prop);
        let ty = b.object_type(Some(class));
        let program = b.build();

        assert_eq!(program.property_of_type(ty, "p"), Some(prop));
        assert_eq!(program.property_of_type(ty, "q"), None);
    }

    #[test]
    fn test_declaration_files_detected_by_extension() {
        let mut b = ProgramBuilder::new();
        b.file("/p/lib.d.ts", "declare const y: number;");
        let program = b.build();
        let file = program.file_id("/p/lib.d.ts").unwrap();

        assert!(program.is_declaration_file(file));
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn test_find_missing_text_panics() {
        let mut b = ProgramBuilder::new();
        let root = b.file("/p/a.ts", "let a = 1;");
        b.node_at_nth(root, NodeKind::Identifier, "a", 1);
    }
}
