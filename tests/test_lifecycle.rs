//! Opening and closing of symbol data during a run.

mod common;

use lsif::graph::{GraphQuery, VertexLabel};
use lsif::program::{NodeKind, ProgramBuilder, SymbolFlags};
use lsif::IndexError;

use common::{count_vertices, index, range_with_text};

#[test]
fn test_local_used_after_its_scope_is_fatal() {
    // `a` is declared inside `f`, the checker (wrongly) binds a later `a` to it.
    let text = "function f() { let a = 1; }\na;";
    let mut b = ProgramBuilder::new();
    let root = b.file("/p/a.ts", text);
    let f_decl = b.node_at(root, NodeKind::FunctionDeclaration, "function f() { let a = 1; }");
    let block = b.node_at(f_decl, NodeKind::Block, "{ let a = 1; }");
    let (a_decl, _) = b.declaration(block, NodeKind::VariableDeclaration, "a = 1", "a");
    let a = b.symbol("a", SymbolFlags::BLOCK_SCOPED_VARIABLE);
    b.declare(a, a_decl);
    let statement = b.node_at(root, NodeKind::ExpressionStatement, "a;");
    b.identifier(statement, "a", 0, a);
    let program = b.build();

    let err = index(&program).unwrap_err();
    assert!(matches!(err, IndexError::SymbolDataCleared(_)), "got {err:?}");
    assert!(err.is_lifecycle_violation());
}

#[test]
fn test_declaration_file_locals_stay_open() {
    let mut b = ProgramBuilder::new();
    let text = "declare namespace N { const hidden: number; }";
    let dts = b.file("/p/types.d.ts", text);
    let (ns_decl, _) = b.declaration(dts, NodeKind::ModuleDeclaration, text, "N");
    let body = b.node_at(ns_decl, NodeKind::ModuleBlock, "{ const hidden: number; }");
    let (hidden_decl, _) =
        b.declaration(body, NodeKind::VariableDeclaration, "hidden: number", "hidden");
    let ns = b.symbol("N", SymbolFlags::NAMESPACE_MODULE);
    let hidden = b.symbol("hidden", SymbolFlags::BLOCK_SCOPED_VARIABLE);
    b.declare(ns, ns_decl).declare(hidden, hidden_decl);
    b.set_parent_symbol(hidden, ns);

    let user = b.file("/p/use.ts", "hidden;");
    b.identifier(user, "hidden", 0, hidden);
    let program = b.build();

    let elements = index(&program).unwrap().into_elements();
    let query = GraphQuery::new(&elements);
    let definition = range_with_text(&elements, "hidden", 0);
    let usage = range_with_text(&elements, "hidden", 1);
    assert_eq!(query.definitions(usage), vec![definition]);
}

#[test]
fn test_mutual_aliases_fail_fast() {
    let mut b = ProgramBuilder::new();
    let root = b.file("/p/a.ts", "{ p, q }");
    b.module(root);
    let (p_decl, _) = b.declaration(root, NodeKind::ImportSpecifier, "p", "p");
    let (q_decl, _) = b.declaration(root, NodeKind::ImportSpecifier, "q", "q");
    let p = b.symbol("p", SymbolFlags::ALIAS);
    let q = b.symbol("q", SymbolFlags::ALIAS);
    b.declare(p, p_decl).declare(q, q_decl);
    b.alias(p, q).alias(q, p);
    let program = b.build();

    let err = index(&program).unwrap_err();
    assert!(matches!(err, IndexError::CyclicResolution(_)), "got {err:?}");
    assert!(!err.is_lifecycle_violation());
}

#[test]
fn test_scoped_symbol_closes_once() {
    let text = "function f() { let a = 1; a; a; }";
    let mut b = ProgramBuilder::new();
    let root = b.file("/p/a.ts", text);
    let f_decl = b.node_at(root, NodeKind::FunctionDeclaration, text);
    let block = b.node_at(f_decl, NodeKind::Block, "{ let a = 1; a; a; }");
    let (a_decl, _) = b.declaration(block, NodeKind::VariableDeclaration, "a = 1", "a");
    let a = b.symbol("a", SymbolFlags::BLOCK_SCOPED_VARIABLE);
    b.declare(a, a_decl);
    for nth in 0..2 {
        let statement = b.node_at_nth(block, NodeKind::ExpressionStatement, "a;", nth);
        b.identifier(statement, "a", 0, a);
    }
    let program = b.build();

    let elements = index(&program).unwrap().into_elements();
    assert_eq!(count_vertices(&elements, VertexLabel::ReferenceResult), 1);
    assert_eq!(count_vertices(&elements, VertexLabel::DefinitionResult), 1);

    let query = GraphQuery::new(&elements);
    let usage = range_with_text(&elements, "a", 2);
    assert_eq!(query.references(usage).len(), 3);
}
