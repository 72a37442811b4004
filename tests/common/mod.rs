//! Shared fixtures for scenario tests.
//!
//! Each fixture builds a small checked program by hand, the way a front
//! end would report it, and indexes it into a `MemoryEmitter`.

#![allow(dead_code)]

use lsif::graph::{EdgeData, Element, Id, ItemProperty, VertexData, VertexLabel};
use lsif::program::{NodeKind, ProgramBuilder, SymbolFlags};
use lsif::{IndexOptions, Indexer, MemoryEmitter, MemoryProgram, Result};

pub const ROOT: &str = "/p";

pub fn index(program: &MemoryProgram) -> Result<MemoryEmitter> {
    index_with(program, IndexOptions::new(ROOT))
}

pub fn index_with(program: &MemoryProgram, options: IndexOptions) -> Result<MemoryEmitter> {
    let mut sink = MemoryEmitter::new();
    Indexer::new(program, options).index(&mut sink)?;
    Ok(sink)
}

/// Id of the `nth` range vertex whose tag text is `text`.
pub fn range_with_text(elements: &[Element], text: &str, nth: usize) -> Id {
    elements
        .iter()
        .filter_map(Element::as_vertex)
        .filter(|v| match &v.data {
            VertexData::Range(range) => range.text() == Some(text),
            _ => false,
        })
        .map(|v| v.id)
        .nth(nth)
        .unwrap_or_else(|| panic!("no range #{nth} with text `{text}`"))
}

pub fn count_vertices(elements: &[Element], label: VertexLabel) -> usize {
    elements
        .iter()
        .filter_map(Element::as_vertex)
        .filter(|v| v.label() == label)
        .count()
}

/// Item edges carrying `property`.
pub fn items_with(elements: &[Element], property: ItemProperty) -> Vec<Vec<Id>> {
    elements
        .iter()
        .filter_map(Element::as_edge)
        .filter_map(|e| match &e.data {
            EdgeData::Item(item) if item.property == Some(property) => Some(item.in_vs.clone()),
            _ => None,
        })
        .collect()
}

/// `export const x = 10;` in `/p/a.ts`, followed by `extra`.
///
/// Every `x;` statement in `extra` is a reference to `x`.
pub struct ExportConst {
    pub program: MemoryProgram,
}

pub fn export_const(extra: &str) -> ExportConst {
    let text = format!("export const x = 10;{extra}");
    let mut b = ProgramBuilder::new();
    let root = b.file("/p/a.ts", &text);
    let module = b.module(root);
    let statement = b.node_at(root, NodeKind::VariableStatement, "export const x = 10;");
    let list = b.node_at(statement, NodeKind::VariableDeclarationList, "const x = 10");
    let (decl, name) = b.declaration(list, NodeKind::VariableDeclaration, "x = 10", "x");
    let x = b.symbol("x", SymbolFlags::BLOCK_SCOPED_VARIABLE);
    b.declare(x, decl).export(module, x);
    b.set_quick_info(name, "const x: 10", "The answer.");

    for nth in 0..extra.matches("x;").count() {
        let statement = b.node_at_nth(root, NodeKind::ExpressionStatement, "x;", nth);
        b.identifier(statement, "x", 0, x);
    }
    ExportConst { program: b.build() }
}

/// `a.ts` exports `x`; `b.ts` imports and uses it.
pub fn import_export() -> MemoryProgram {
    let mut b = ProgramBuilder::new();
    let a_root = b.file("/p/a.ts", "export const x = 10;");
    let a_module = b.module(a_root);
    let list = b.node_at(a_root, NodeKind::VariableDeclarationList, "const x = 10");
    let (decl, _) = b.declaration(list, NodeKind::VariableDeclaration, "x = 10", "x");
    let x = b.symbol("x", SymbolFlags::BLOCK_SCOPED_VARIABLE);
    b.declare(x, decl).export(a_module, x);

    let b_root = b.file("/p/b.ts", "import { x } from './a';\nx;");
    b.module(b_root);
    let import = b.node_at(b_root, NodeKind::ImportDeclaration, "import { x } from './a';");
    let (specifier, _) = b.declaration(import, NodeKind::ImportSpecifier, "x", "x");
    let imported = b.symbol("x", SymbolFlags::ALIAS);
    b.declare(imported, specifier).alias(imported, x);
    let usage = b.node_at(b_root, NodeKind::ExpressionStatement, "x;");
    b.identifier(usage, "x", 0, imported);
    b.build()
}

/// An interface method, a class implementing it, and a call through the interface.
pub fn method_fan_in() -> MemoryProgram {
    let text = "export interface I { m(): void; }\n\
                export class C implements I { m() {} }\n\
                declare const i: I;\n\
                i.m();";
    let mut b = ProgramBuilder::new();
    let root = b.file("/p/a.ts", text);
    let module = b.module(root);

    let (i_decl, _) = b.declaration(
        root,
        NodeKind::InterfaceDeclaration,
        "export interface I { m(): void; }",
        "I",
    );
    let (im_decl, _) = b.declaration(i_decl, NodeKind::MethodSignature, "m(): void;", "m");
    let iface = b.symbol("I", SymbolFlags::INTERFACE);
    let im = b.symbol("m", SymbolFlags::METHOD);
    b.declare(iface, i_decl).declare(im, im_decl);
    b.export(module, iface).member(iface, im);

    let (c_decl, _) = b.declaration(
        root,
        NodeKind::ClassDeclaration,
        "export class C implements I { m() {} }",
        "C",
    );
    let clause = b.node_at(c_decl, NodeKind::HeritageClause, "implements I");
    let heritage = b.node_at(clause, NodeKind::ExpressionWithTypeArguments, "I");
    b.identifier(heritage, "I", 0, iface);
    let (cm_decl, _) = b.declaration(c_decl, NodeKind::MethodDeclaration, "m() {}", "m");
    let class = b.symbol("C", SymbolFlags::CLASS);
    let cm = b.symbol("m", SymbolFlags::METHOD);
    b.declare(class, c_decl).declare(cm, cm_decl);
    b.export(module, class).member(class, cm);

    let list = b.node_at(root, NodeKind::VariableDeclarationList, "const i: I");
    let (v_decl, _) = b.declaration(list, NodeKind::VariableDeclaration, "i: I", "i");
    let type_ref = b.node_at(v_decl, NodeKind::TypeReference, "I");
    b.identifier(type_ref, "I", 0, iface);
    let instance = b.symbol("i", SymbolFlags::BLOCK_SCOPED_VARIABLE);
    b.declare(instance, v_decl);

    let call = b.node_at(root, NodeKind::CallExpression, "i.m()");
    let access = b.node_at(call, NodeKind::PropertyAccessExpression, "i.m");
    b.identifier(access, "i", 0, instance);
    b.identifier(access, "m", 0, im);
    b.build()
}

/// A property read through a receiver typed `A | B`.
pub fn union_property() -> MemoryProgram {
    let text = "export interface A { p: number }\n\
                export interface B { p: string }\n\
                declare const v: A | B;\n\
                v.p;";
    let mut b = ProgramBuilder::new();
    let root = b.file("/p/u.ts", text);
    let module = b.module(root);

    let arm = |b: &mut ProgramBuilder, decl_text: &str, name: &str| {
        let (decl, _) = b.declaration(root, NodeKind::InterfaceDeclaration, decl_text, name);
        let member_text = if name == "A" { "p: number" } else { "p: string" };
        let (p_decl, _) = b.declaration(decl, NodeKind::PropertySignature, member_text, "p");
        let iface = b.symbol(name, SymbolFlags::INTERFACE);
        let p = b.symbol("p", SymbolFlags::PROPERTY);
        b.declare(iface, decl).declare(p, p_decl);
        b.export(module, iface).member(iface, p);
        b.object_type(Some(iface))
    };
    let a_type = arm(&mut b, "export interface A { p: number }", "A");
    let b_type = arm(&mut b, "export interface B { p: string }", "B");
    let union = b.union_type(vec![a_type, b_type]);

    let list = b.node_at(root, NodeKind::VariableDeclarationList, "const v: A | B");
    let (v_decl, _) = b.declaration(list, NodeKind::VariableDeclaration, "v: A | B", "v");
    let v = b.symbol("v", SymbolFlags::BLOCK_SCOPED_VARIABLE);
    b.declare(v, v_decl);

    let statement = b.node_at(root, NodeKind::ExpressionStatement, "v.p;");
    let access = b.node_at(statement, NodeKind::PropertyAccessExpression, "v.p");
    let receiver = b.identifier(access, "v", 0, v);
    b.set_type_at(receiver, union);
    let shared = b.symbol("p", SymbolFlags::TRANSIENT | SymbolFlags::PROPERTY);
    b.identifier(access, "p", 0, shared);
    b.build()
}
