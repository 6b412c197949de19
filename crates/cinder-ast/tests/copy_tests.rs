use super::*;
use cinder_binder::{SymbolTable, VarFlags};
use cinder_common::{Span, TypeId};

#[test]
fn test_deep_copy_renames_local_definitions() {
    let mut arena = NodeArena::new();
    let mut symbols = SymbolTable::new();
    let x = symbols.new_var("x", VarFlags::empty(), Some(TypeId(1)), Span::SYNTHETIC);
    let init = arena.builder(Span::SYNTHETIC).int(0).unwrap();
    let def = arena
        .builder(Span::SYNTHETIC)
        .def(&mut symbols, x, NodeIndex::NONE, init)
        .unwrap();
    let use_x = arena.builder(Span::SYNTHETIC).sym(x).unwrap();
    let ret = arena.builder(Span::SYNTHETIC).ret(use_x).unwrap();
    let body = arena.builder(Span::SYNTHETIC).block(vec![def, ret]).unwrap();

    let mut map = CopyMap::new();
    map.types.insert(TypeId(1), TypeId(2));
    let copy = arena.deep_copy(body, &mut symbols, &mut map).unwrap();

    assert_ne!(copy, body);
    assert_eq!(arena.parent(copy), Parent::Detached);
    assert!(arena.verify_subtree(copy, Parent::Detached).is_ok());

    let stmts = arena.block_stmts(copy).unwrap().to_vec();
    let new_x = arena.kind(stmts[0]).and_then(NodeKind::def_sym).unwrap();
    assert_ne!(new_x, x);
    assert_eq!(map.symbols.get(&x), Some(&new_x));
    assert_eq!(symbols.get(new_x).unwrap().ty, Some(TypeId(2)));
    assert_eq!(symbols.get(new_x).unwrap().def, stmts[0]);
    // the original keeps its declaring node
    assert_eq!(symbols.get(x).unwrap().def, def);

    let ret_child = arena.children(stmts[1])[0];
    assert_eq!(arena.kind(ret_child), Some(&NodeKind::SymRef(new_x)));
}

#[test]
fn test_deep_copy_keeps_outer_references() {
    let mut arena = NodeArena::new();
    let mut symbols = SymbolTable::new();
    let outer = symbols.new_var("g", VarFlags::empty(), None, Span::SYNTHETIC);
    let use_g = arena.builder(Span::SYNTHETIC).sym(outer).unwrap();
    let stmt = arena.builder(Span::SYNTHETIC).expr_stmt(use_g).unwrap();

    let mut map = CopyMap::new();
    let copy = arena.deep_copy(stmt, &mut symbols, &mut map).unwrap();
    let child = arena.children(copy)[0];
    assert_eq!(arena.kind(child), Some(&NodeKind::SymRef(outer)));
    // original untouched
    assert_eq!(arena.parent(use_g), Parent::Node(stmt));
}

#[test]
fn test_deep_copy_applies_caller_substitution() {
    let mut arena = NodeArena::new();
    let mut symbols = SymbolTable::new();
    let a = symbols.new_var("a", VarFlags::empty(), None, Span::SYNTHETIC);
    let b = symbols.new_var("b", VarFlags::empty(), None, Span::SYNTHETIC);
    let r = arena.builder(Span::SYNTHETIC).sym(a).unwrap();

    let mut map = CopyMap::new();
    map.symbols.insert(a, b);
    let copy = arena.deep_copy(r, &mut symbols, &mut map).unwrap();
    assert_eq!(arena.kind(copy), Some(&NodeKind::SymRef(b)));
}
