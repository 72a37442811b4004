//! The tree walk.
//!
//! One [`Visitor`] walks one source file depth first. Entering a node may
//! register releases for it (scoped export overrides, type alias forwards,
//! open document symbol containers); they run in reverse order when the
//! node's visit completes, whether or not its subtree failed. Only then is
//! the data manager told the node is processed.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::base::{FileId, NodeId, SymbolRef};
use crate::error::Result;
use crate::graph::RangeTag;
use crate::program::{NodeKind, Program};

use super::context::IndexContext;
use super::data::{DefinitionInfo, Reference, ReferenceRole};
use super::resolver::ResolverKind;
use super::symbols::Disposer;

/// Something to undo when the walk leaves a node.
#[derive(Debug)]
enum Release {
    Override(Disposer),
    Container(FileId),
}

pub struct Visitor<'c, 'a> {
    cx: &'c mut IndexContext<'a>,
    releases: FxHashMap<NodeId, Vec<Release>>,
}

impl<'c, 'a> Visitor<'c, 'a> {
    pub fn new(cx: &'c mut IndexContext<'a>) -> Self {
        Self {
            cx,
            releases: FxHashMap::default(),
        }
    }

    fn program(&self) -> &'a dyn Program {
        self.cx.program()
    }

    pub fn visit_file(&mut self, file: FileId) -> Result<()> {
        let root = self.program().root(file);
        debug!(?file, "visiting file");
        self.visit(root)
    }

    fn visit(&mut self, node: NodeId) -> Result<()> {
        let walked = self.enter(node).and_then(|()| {
            for child in self.program().children(node) {
                self.visit(child)?;
            }
            Ok(())
        });
        let released = self.release(node);
        walked?;
        released?;
        self.leave(node)
    }

    fn register(&mut self, node: NodeId, release: Release) {
        self.releases.entry(node).or_default().push(release);
    }

    fn release(&mut self, node: NodeId) -> Result<()> {
        let Some(mut releases) = self.releases.remove(&node) else {
            return Ok(());
        };
        let mut result = Ok(());
        while let Some(release) = releases.pop() {
            match release {
                Release::Override(disposer) => self.cx.symbols.release(disposer),
                Release::Container(file) => {
                    let ended = self
                        .cx
                        .manager
                        .get_or_create_document(file)
                        .and_then(|doc| doc.end_container());
                    if result.is_ok() {
                        result = ended;
                    }
                }
            }
        }
        result
    }

    fn enter(&mut self, node: NodeId) -> Result<()> {
        match self.program().kind(node) {
            NodeKind::SourceFile => self.enter_source_file(node),
            NodeKind::Identifier => self.visit_identifier(node),
            NodeKind::TypeAliasDeclaration => {
                self.forward_symbol_information(node);
                self.begin_document_symbol(node)
            }
            kind if is_document_symbol(kind) => self.begin_document_symbol(node),
            _ => Ok(()),
        }
    }

    fn leave(&mut self, node: NodeId) -> Result<()> {
        self.cx.manager.node_processed(node)?;
        let program = self.program();
        if program.kind(node) == NodeKind::SourceFile {
            let file = program.node_file(node);
            self.cx.manager.end_document(file)?;
            self.cx.file_processed(file);
        }
        Ok(())
    }

    fn forward_symbol_information(&mut self, decl: NodeId) {
        let program = self.program();
        let Some(symbol) = program.name_of(decl).and_then(|name| program.symbol_at(name)) else {
            return;
        };
        let resolver = ResolverKind::select(program, symbol, None);
        for disposer in resolver.forward_symbol_information(program, &mut self.cx.symbols, decl) {
            self.register(decl, Release::Override(disposer));
        }
    }

    fn enter_source_file(&mut self, root: NodeId) -> Result<()> {
        let program = self.program();
        let file = program.node_file(root);
        self.cx.manager.get_or_create_document(file)?;

        if let Some(module) = program.file_symbol(file) {
            for target in export_targets(program, root) {
                trace!(?target, "export override");
                let parent = self.cx.symbols.add_parent(program, target, module);
                let export = self.cx.symbols.add_export(program, module, target);
                self.register(root, Release::Override(parent));
                self.register(root, Release::Override(export));
            }
            self.cx.get_or_create(module, Some(root))?;
        }
        Ok(())
    }

    fn visit_identifier(&mut self, node: NodeId) -> Result<()> {
        let program = self.program();
        let Some(symbol) = program.symbol_at(node) else {
            return Ok(());
        };
        let sid = self.cx.get_or_create(symbol, Some(node))?;
        let file = program.node_file(node);
        let info = DefinitionInfo {
            file,
            range: program.range(node),
        };
        if self.cx.manager.has_definition_info(sid, &info) {
            return Ok(());
        }

        let line_range = self.cx.line_range(file, info.range);
        let tag = RangeTag::Reference {
            text: program.node_text(node),
        };
        let range = self.cx.manager.graph().range(line_range, Some(tag))?;
        self.cx.manager.get_or_create_document(file)?.add_range(range.id);
        let rs = self.cx.manager.result_set(sid)?;
        self.cx.manager.graph().next(range.id, rs.id)?;
        self.cx.manager.add_reference(
            sid,
            file,
            Reference::Range(range.id),
            ReferenceRole::References,
        )
    }

    /// Open a document symbol for a declaration whose name got a definition range.
    fn begin_document_symbol(&mut self, decl: NodeId) -> Result<()> {
        let program = self.program();
        let Some(name) = program.name_of(decl) else {
            return Ok(());
        };
        if let Some(symbol) = program.symbol_at(name) {
            self.cx.get_or_create(symbol, Some(name))?;
        }
        let Some(range) = self.cx.definition_range(name) else {
            return Ok(());
        };
        let file = program.node_file(decl);
        self.cx.manager.get_or_create_document(file)?.begin_container(range.id);
        self.register(decl, Release::Container(file));
        Ok(())
    }
}

fn is_document_symbol(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::ClassDeclaration
            | NodeKind::InterfaceDeclaration
            | NodeKind::FunctionDeclaration
            | NodeKind::MethodDeclaration
            | NodeKind::MethodSignature
            | NodeKind::PropertyDeclaration
            | NodeKind::PropertySignature
            | NodeKind::VariableDeclaration
            | NodeKind::EnumDeclaration
            | NodeKind::EnumMember
            | NodeKind::ModuleDeclaration
            | NodeKind::TypeAliasDeclaration
    )
}

/// Local symbols a file exports through `export default x`, `export = x`
/// or a non-renaming `export { x }`.
fn export_targets(program: &dyn Program, root: NodeId) -> Vec<SymbolRef> {
    let file = program.node_file(root);
    let mut targets = Vec::new();
    for statement in program.children(root) {
        match program.kind(statement) {
            NodeKind::ExportAssignment => {
                let expression = program
                    .children(statement)
                    .into_iter()
                    .find(|&child| program.kind(child) == NodeKind::Identifier);
                if let Some(symbol) = expression.and_then(|e| program.symbol_at(e)) {
                    targets.push(local_target(program, symbol));
                }
            }
            NodeKind::ExportDeclaration => {
                let mut specifiers = Vec::new();
                collect_kind(program, statement, NodeKind::ExportSpecifier, &mut specifiers);
                for specifier in specifiers {
                    let Some(symbol) = program.symbol_at(specifier) else {
                        continue;
                    };
                    let target = local_target(program, symbol);
                    if program.symbol_name(target) == program.symbol_name(symbol) {
                        targets.push(target);
                    }
                }
            }
            _ => {}
        }
    }
    targets.retain(|&target| {
        program
            .declarations_of(target)
            .into_iter()
            .any(|decl| program.node_file(decl) == file)
    });
    targets.dedup();
    targets
}

fn local_target(program: &dyn Program, symbol: SymbolRef) -> SymbolRef {
    if program.symbol_flags(symbol).is_alias() {
        program.aliased_symbol_of(symbol).unwrap_or(symbol)
    } else {
        symbol
    }
}

fn collect_kind(program: &dyn Program, node: NodeId, kind: NodeKind, out: &mut Vec<NodeId>) {
    for child in program.children(node) {
        if program.kind(child) == kind {
            out.push(child);
        } else {
            collect_kind(program, child, kind, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::graph::{Graph, MemoryEmitter};
    use crate::index::context::Emit;
    use crate::index::manager::DataManager;
    use crate::program::{ProgramBuilder, SymbolFlags};

    #[test]
    fn test_export_targets() {
        let mut b = ProgramBuilder::new();
        let text = "const a = 1; const b = 2; const c = 3; export { a, b as bee }; export default c;";
        let root = b.file("/p/m.ts", text);
        b.module(root);
        let (a_decl, _) = b.declaration(root, NodeKind::VariableDeclaration, "a = 1", "a");
        let (b_decl, _) = b.declaration(root, NodeKind::VariableDeclaration, "b = 2", "b");
        let (c_decl, _) = b.declaration(root, NodeKind::VariableDeclaration, "c = 3", "c");
        let a = b.symbol("a", SymbolFlags::BLOCK_SCOPED_VARIABLE);
        let bb = b.symbol("b", SymbolFlags::BLOCK_SCOPED_VARIABLE);
        let c = b.symbol("c", SymbolFlags::BLOCK_SCOPED_VARIABLE);
        b.declare(a, a_decl).declare(bb, b_decl).declare(c, c_decl);

        let export = b.node_at(root, NodeKind::ExportDeclaration, "export { a, b as bee };");
        let a_spec = b.node_at(export, NodeKind::ExportSpecifier, "a");
        let bee_spec = b.node_at(export, NodeKind::ExportSpecifier, "b as bee");
        let a_alias = b.symbol("a", SymbolFlags::ALIAS);
        let bee_alias = b.symbol("bee", SymbolFlags::ALIAS);
        b.bind(a_spec, a_alias).alias(a_alias, a);
        b.bind(bee_spec, bee_alias).alias(bee_alias, bb);

        let assignment = b.node_at(root, NodeKind::ExportAssignment, "export default c;");
        b.identifier(assignment, "c", 0, c);
        let program = b.build();

        assert_eq!(export_targets(&program, root), vec![a, c]);
    }

    #[test]
    fn test_collect_kind_stops_at_matches() {
        let mut b = ProgramBuilder::new();
        let root = b.file("/p/m.ts", "export { a };");
        let export = b.node_at(root, NodeKind::ExportDeclaration, "export { a };");
        let named = b.node_at(export, NodeKind::Other, "{ a }");
        let spec = b.node_at(named, NodeKind::ExportSpecifier, "a");
        b.node_at(spec, NodeKind::Identifier, "a");
        let program = b.build();

        let mut found = Vec::new();
        collect_kind(&program, root, NodeKind::ExportSpecifier, &mut found);
        assert_eq!(found, vec![spec]);
    }

    fn exported_local(tail: &str) -> (crate::program::MemoryProgram, FileId) {
        let mut b = ProgramBuilder::new();
        let text = format!("const a = 1; export {{ a }};{tail}");
        let root = b.file("/p/m.ts", &text);
        b.module(root);
        let (decl, _) = b.declaration(root, NodeKind::VariableDeclaration, "a = 1", "a");
        let a = b.symbol("a", SymbolFlags::BLOCK_SCOPED_VARIABLE);
        b.declare(a, decl);
        let export = b.node_at(root, NodeKind::ExportDeclaration, "export { a };");
        let spec = b.node_at(export, NodeKind::ExportSpecifier, "a");
        let alias = b.symbol("a", SymbolFlags::ALIAS);
        b.bind(spec, alias).alias(alias, a);

        if !tail.is_empty() {
            let (u_decl, _) = b.declaration(root, NodeKind::VariableDeclaration, "u", "u");
            let (w_decl, _) = b.declaration(root, NodeKind::VariableDeclaration, "w", "w");
            let u = b.symbol("u", SymbolFlags::ALIAS);
            let w = b.symbol("w", SymbolFlags::ALIAS);
            b.declare(u, u_decl).declare(w, w_decl);
            b.alias(u, w).alias(w, u);
        }
        let program = b.build();
        let file = program.file_id("/p/m.ts").unwrap();
        (program, file)
    }

    #[test]
    fn test_overrides_released_after_file() {
        let (program, file) = exported_local("");
        let mut sink = MemoryEmitter::new();
        {
            let manager =
                DataManager::new(&program, Graph::new(&mut sink), PathBuf::from("/p"), true).unwrap();
            let mut cx = IndexContext::new(&program, manager, Emit { hover: false, monikers: true }, None);
            Visitor::new(&mut cx).visit_file(file).unwrap();
            assert_eq!(cx.symbols.override_count(), 0);
            assert!(cx.definitions.is_empty());
            assert!(cx.line_indexes.is_empty());
        }
        assert!(sink.monikers().any(|m| m.identifier == "m:a"));
    }

    #[test]
    fn test_overrides_released_when_walk_fails() {
        let (program, file) = exported_local(" u; w;");
        let mut sink = MemoryEmitter::new();
        let manager =
            DataManager::new(&program, Graph::new(&mut sink), PathBuf::from("/p"), true).unwrap();
        let mut cx = IndexContext::new(&program, manager, Emit { hover: false, monikers: true }, None);
        let err = Visitor::new(&mut cx).visit_file(file).unwrap_err();
        assert!(matches!(err, crate::error::IndexError::CyclicResolution(_)));
        assert_eq!(cx.symbols.override_count(), 0);
    }
}
