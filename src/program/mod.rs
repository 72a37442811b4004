//! The checked program, i.e. the oracle the indexer consumes.
//!
//! The indexer never parses or type-checks anything itself. It walks a tree
//! handed to it through [`Program`] and asks the same trait which symbol a
//! node denotes, where that symbol is declared, what its flags are, and so on.
//!
//! [`MemoryProgram`] is a complete in-memory implementation assembled with
//! [`ProgramBuilder`]. Front ends that already own a checked tree implement
//! [`Program`] directly over their own arenas.

mod memory;
mod source;

use std::path::PathBuf;
use std::sync::Arc;

use bitflags::bitflags;
use thiserror::Error;

use crate::base::{FileId, NodeId, SymbolRef, TextRange, TypeRef};

pub use memory::{MemoryProgram, ProgramBuilder};
pub use source::{FileOrigin, FileSet, is_declaration_path};

bitflags! {
    /// Semantic category flags of a symbol, as reported by the checker.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SymbolFlags: u32 {
        const FUNCTION_SCOPED_VARIABLE = 1 << 0;
        const BLOCK_SCOPED_VARIABLE = 1 << 1;
        const PROPERTY = 1 << 2;
        const ENUM_MEMBER = 1 << 3;
        const FUNCTION = 1 << 4;
        const CLASS = 1 << 5;
        const INTERFACE = 1 << 6;
        const ENUM = 1 << 7;
        const VALUE_MODULE = 1 << 8;
        const NAMESPACE_MODULE = 1 << 9;
        const TYPE_LITERAL = 1 << 10;
        const METHOD = 1 << 11;
        const CONSTRUCTOR = 1 << 12;
        const TYPE_PARAMETER = 1 << 13;
        const TYPE_ALIAS = 1 << 14;
        const ALIAS = 1 << 15;
        /// Synthesized by the checker (union members, mapped properties, ...).
        const TRANSIENT = 1 << 16;

        const VARIABLE = Self::FUNCTION_SCOPED_VARIABLE.bits() | Self::BLOCK_SCOPED_VARIABLE.bits();
    }
}

impl SymbolFlags {
    pub fn is_class(self) -> bool {
        self.contains(SymbolFlags::CLASS)
    }

    pub fn is_interface(self) -> bool {
        self.contains(SymbolFlags::INTERFACE)
    }

    pub fn is_type_literal(self) -> bool {
        self.contains(SymbolFlags::TYPE_LITERAL)
    }

    pub fn is_method(self) -> bool {
        self.contains(SymbolFlags::METHOD)
    }

    pub fn is_alias(self) -> bool {
        self.contains(SymbolFlags::ALIAS)
    }

    pub fn is_value_module(self) -> bool {
        self.contains(SymbolFlags::VALUE_MODULE)
    }

    pub fn is_transient(self) -> bool {
        self.contains(SymbolFlags::TRANSIENT)
    }

    pub fn is_type_alias(self) -> bool {
        self.contains(SymbolFlags::TYPE_ALIAS)
    }

    /// Transient with no other semantic category attached.
    pub fn is_transient_only(self) -> bool {
        self == SymbolFlags::TRANSIENT
    }
}

/// Syntax node kinds the indexer distinguishes.
///
/// Anything the walk does not care about is [`NodeKind::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SourceFile,
    Identifier,
    Block,
    ModuleBlock,
    VariableStatement,
    VariableDeclarationList,
    VariableDeclaration,
    Parameter,
    FunctionDeclaration,
    FunctionExpression,
    ArrowFunction,
    ClassDeclaration,
    InterfaceDeclaration,
    HeritageClause,
    ExpressionWithTypeArguments,
    Constructor,
    MethodDeclaration,
    MethodSignature,
    PropertyDeclaration,
    PropertySignature,
    EnumDeclaration,
    EnumMember,
    ModuleDeclaration,
    TypeAliasDeclaration,
    TypeLiteral,
    UnionType,
    IntersectionType,
    ParenthesizedType,
    TypeReference,
    ImportDeclaration,
    ImportSpecifier,
    ExportDeclaration,
    ExportSpecifier,
    ExportAssignment,
    ExpressionStatement,
    CallExpression,
    PropertyAccessExpression,
    Other,
}

impl NodeKind {
    /// Nodes that open a lexical scope for local symbols.
    pub fn is_scope(self) -> bool {
        matches!(
            self,
            NodeKind::SourceFile
                | NodeKind::Block
                | NodeKind::ModuleBlock
                | NodeKind::FunctionDeclaration
                | NodeKind::FunctionExpression
                | NodeKind::ArrowFunction
                | NodeKind::Constructor
                | NodeKind::MethodDeclaration
        )
    }

    /// Function-like or block nodes; declarations below them are never global.
    pub fn is_function_or_block(self) -> bool {
        matches!(
            self,
            NodeKind::Block
                | NodeKind::FunctionDeclaration
                | NodeKind::FunctionExpression
                | NodeKind::ArrowFunction
                | NodeKind::Constructor
                | NodeKind::MethodDeclaration
        )
    }
}

/// Hover text for a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuickInfo {
    /// Rendered signature, e.g. `const x: 10`.
    pub display: String,
    /// Documentation comment text, possibly empty.
    pub documentation: String,
}

/// Failures inside the oracle. The indexer treats all of them as "nothing to emit".
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("quick info unavailable for node {0:?}: {1}")]
    QuickInfo(NodeId, String),

    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
}

/// The type-checking front end, as seen by the indexer.
///
/// Every query is cheap and side-effect free from the indexer's point of view.
pub trait Program {
    // ========================================================================
    // FILES
    // ========================================================================

    /// All source files of the program, in checker order.
    fn source_files(&self) -> Vec<FileId>;

    fn file_path(&self, file: FileId) -> Option<PathBuf>;

    fn file_text(&self, file: FileId) -> Option<Arc<str>>;

    /// `.d.ts` style file.
    fn is_declaration_file(&self, file: FileId) -> bool;

    fn is_source_file_default_library(&self, file: FileId) -> bool;

    fn is_source_file_from_external_library(&self, file: FileId) -> bool;

    /// The `SourceFile` node of a file.
    fn root(&self, file: FileId) -> NodeId;

    /// The file-level symbol; present exactly when the file is a module.
    fn file_symbol(&self, file: FileId) -> Option<SymbolRef>;

    // ========================================================================
    // NODES
    // ========================================================================

    fn kind(&self, node: NodeId) -> NodeKind;

    fn node_file(&self, node: NodeId) -> FileId;

    fn range(&self, node: NodeId) -> TextRange;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children in source order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// The name node of a named declaration.
    fn name_of(&self, node: NodeId) -> Option<NodeId>;

    fn node_text(&self, node: NodeId) -> String {
        let range = self.range(node);
        self.file_text(self.node_file(node))
            .and_then(|text| text.get(std::ops::Range::<usize>::from(range)).map(str::to_owned))
            .unwrap_or_default()
    }

    // ========================================================================
    // SYMBOLS
    // ========================================================================

    /// The symbol a node denotes, if any.
    fn symbol_at(&self, node: NodeId) -> Option<SymbolRef>;

    fn symbol_name(&self, symbol: SymbolRef) -> String;

    fn symbol_flags(&self, symbol: SymbolRef) -> SymbolFlags;

    fn declarations_of(&self, symbol: SymbolRef) -> Vec<NodeId>;

    /// The containing symbol (module, class, namespace, ...), if the checker reports one.
    fn parent_symbol(&self, symbol: SymbolRef) -> Option<SymbolRef>;

    /// Symbols a module or namespace exports.
    fn exports_of(&self, symbol: SymbolRef) -> Vec<SymbolRef>;

    /// Members of a class, interface or type literal.
    fn members_of(&self, symbol: SymbolRef) -> Vec<SymbolRef>;

    /// Target of an alias (import binding, re-export).
    fn aliased_symbol_of(&self, symbol: SymbolRef) -> Option<SymbolRef>;

    fn is_unknown_symbol(&self, symbol: SymbolRef) -> bool;

    fn is_undefined_symbol(&self, symbol: SymbolRef) -> bool;

    // ========================================================================
    // TYPES
    // ========================================================================

    fn declared_type_of(&self, symbol: SymbolRef) -> Option<TypeRef>;

    fn type_at(&self, node: NodeId) -> Option<TypeRef>;

    fn base_types_of(&self, ty: TypeRef) -> Vec<TypeRef>;

    fn type_symbol(&self, ty: TypeRef) -> Option<SymbolRef>;

    /// Constituents of a union or intersection type; `None` for any other type.
    fn union_or_intersection_types(&self, ty: TypeRef) -> Option<Vec<TypeRef>>;

    fn property_of_type(&self, ty: TypeRef, name: &str) -> Option<SymbolRef>;

    // ========================================================================
    // SERVICES
    // ========================================================================

    fn quick_info_at(&self, node: NodeId) -> Result<Option<QuickInfo>, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_only() {
        assert!(SymbolFlags::TRANSIENT.is_transient_only());
        assert!(!(SymbolFlags::TRANSIENT | SymbolFlags::PROPERTY).is_transient_only());
        assert!((SymbolFlags::TRANSIENT | SymbolFlags::PROPERTY).is_transient());
    }

    #[test]
    fn test_variable_covers_both_scopes() {
        assert!(SymbolFlags::VARIABLE.contains(SymbolFlags::BLOCK_SCOPED_VARIABLE));
        assert!(SymbolFlags::VARIABLE.contains(SymbolFlags::FUNCTION_SCOPED_VARIABLE));
    }

    #[test]
    fn test_scope_kinds() {
        assert!(NodeKind::SourceFile.is_scope());
        assert!(NodeKind::Block.is_scope());
        assert!(!NodeKind::SourceFile.is_function_or_block());
        assert!(!NodeKind::ClassDeclaration.is_scope());
    }
}
