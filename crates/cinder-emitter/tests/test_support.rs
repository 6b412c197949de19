//! Shared fixtures for the emitter tests.

use super::*;
use cinder_ast::NodeIndex;
use cinder_binder::{SymbolKind, VarFlags};
use cinder_common::{Span, SymbolId, TypeId};
use cinder_types::{ClassKind, Universe};

pub(crate) fn def(u: &mut Universe, sym: SymbolId, init: NodeIndex) -> NodeIndex {
    u.nodes
        .builder(Span::SYNTHETIC)
        .def(&mut u.symbols, sym, NodeIndex::NONE, init)
        .unwrap()
}

/// `enum name { constants... }`
pub(crate) fn enum_type(u: &mut Universe, name: &str, constants: &[&str]) -> TypeId {
    let mut defs = Vec::new();
    for &c in constants {
        let sym = u.symbols.alloc(c, SymbolKind::EnumConst, Span::SYNTHETIC);
        defs.push(def(u, sym, NodeIndex::NONE));
    }
    let ty = u.new_enum(defs, Span::SYNTHETIC).unwrap();
    u.bind(ty, name, name).unwrap();
    ty
}

pub(crate) fn color(u: &mut Universe) -> TypeId {
    enum_type(u, "Color", &["red", "green", "blue"])
}

/// A class or record with the given data fields.
pub(crate) fn aggregate(
    u: &mut Universe,
    name: &str,
    kind: ClassKind,
    fields: &[(&str, TypeId)],
) -> TypeId {
    let ty = u.new_aggregate(kind, Span::SYNTHETIC);
    let mut decls = Vec::new();
    for &(field, field_ty) in fields {
        let sym = u
            .symbols
            .new_var(field, VarFlags::empty(), Some(field_ty), Span::SYNTHETIC);
        decls.push(def(u, sym, NodeIndex::NONE));
    }
    u.add_declarations(ty, decls, None).unwrap();
    u.bind(ty, name, name).unwrap();
    ty
}

/// `class C { x: int; y: int }`
pub(crate) fn class_c(u: &mut Universe) -> TypeId {
    let int = u.builtins.int64();
    aggregate(u, "C", ClassKind::Reference, &[("x", int), ("y", int)])
}

/// `record Point { x: int; y: int }`
pub(crate) fn point(u: &mut Universe) -> TypeId {
    let int = u.builtins.int64();
    aggregate(u, "Point", ClassKind::Value, &[("x", int), ("y", int)])
}

/// Formals `f: file` and `arg: ty` for synthesized bodies.
pub(crate) fn formals(u: &mut Universe, ty: TypeId) -> (SymbolId, SymbolId) {
    let file = u.builtins.file;
    let f = u.symbols.new_var("f", VarFlags::empty(), Some(file), Span::SYNTHETIC);
    let arg = u.symbols.new_var("arg", VarFlags::empty(), Some(ty), Span::SYNTHETIC);
    (f, arg)
}

#[test]
fn test_fixtures_verify() {
    let mut u = Universe::new();
    let c = color(&mut u);
    let p = point(&mut u);
    let k = class_c(&mut u);
    for ty in [c, p, k] {
        assert!(u.verify_type(ty).is_ok(), "{:?} should verify", ty);
    }
    let printer = FragmentPrinter::new(&u);
    assert_eq!(printer.print_stmts(&[]), "");
}
