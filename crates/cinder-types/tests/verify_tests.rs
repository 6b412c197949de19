use super::*;
use cinder_ast::Parent;
use cinder_binder::{SymbolKind, VarFlags};
use cinder_common::{NodeIndex, Span, TypeId};

fn point(u: &mut Universe) -> TypeId {
    let int = u.builtins.int64();
    let record = u.new_aggregate(ClassKind::Value, Span::SYNTHETIC);
    let mut decls = Vec::new();
    for name in ["x", "y"] {
        let sym = u.symbols.new_var(name, VarFlags::empty(), Some(int), Span::SYNTHETIC);
        decls.push(
            u.nodes
                .builder(Span::SYNTHETIC)
                .def(&mut u.symbols, sym, NodeIndex::NONE, NodeIndex::NONE)
                .unwrap(),
        );
    }
    u.add_declarations(record, decls, None).unwrap();
    u.bind(record, "Point", "Point").unwrap();
    record
}

fn color(u: &mut Universe) -> TypeId {
    let mut constants = Vec::new();
    for name in ["red", "green"] {
        let sym = u.symbols.alloc(name, SymbolKind::EnumConst, Span::SYNTHETIC);
        constants.push(
            u.nodes
                .builder(Span::SYNTHETIC)
                .def(&mut u.symbols, sym, NodeIndex::NONE, NodeIndex::NONE)
                .unwrap(),
        );
    }
    let ty = u.new_enum(constants, Span::SYNTHETIC).unwrap();
    u.bind(ty, "Color", "Color").unwrap();
    ty
}

#[test]
fn test_well_formed_types_verify() {
    let mut u = Universe::new();
    point(&mut u);
    color(&mut u);
    assert!(u.verify_types().is_ok());
}

#[test]
fn test_stale_field_cache_is_detected() {
    let mut u = Universe::new();
    let record = point(&mut u);
    let int = u.builtins.int64();
    let z = u.symbols.new_var("z", VarFlags::empty(), Some(int), Span::SYNTHETIC);
    let z_def = u
        .nodes
        .builder(Span::SYNTHETIC)
        .def(&mut u.symbols, z, NodeIndex::NONE, NodeIndex::NONE)
        .unwrap();
    u.nodes.attach(z_def, Parent::Type(record)).unwrap();
    u.types
        .get_mut(record)
        .unwrap()
        .as_aggregate_mut()
        .unwrap()
        .declarations
        .push(z_def);

    let err = u.verify_type(record).unwrap_err();
    assert!(err.message.contains("stale field cache"), "{}", err.message);
    u.recompute_caches(record).unwrap();
    assert!(u.verify_type(record).is_ok());
}

#[test]
fn test_reference_default_must_be_nil() {
    let mut u = Universe::new();
    let class = u.new_aggregate(ClassKind::Reference, Span::SYNTHETIC);
    u.types.get_mut(class).unwrap().default_value = DefaultValue::None;
    let err = u.verify_type(class).unwrap_err();
    assert!(err.message.contains("not nil"));

    let record = u.new_aggregate(ClassKind::Value, Span::SYNTHETIC);
    u.types.get_mut(record).unwrap().default_value = DefaultValue::Symbol(u.builtins.g_nil);
    assert!(u.verify_type(record).is_err());
}

#[test]
fn test_binding_must_name_the_type() {
    let mut u = Universe::new();
    let record = point(&mut u);
    let sym = u.types.binding(record).unwrap();
    u.symbols.get_mut(sym).unwrap().ty = Some(u.builtins.int64());
    let err = u.verify_type(record).unwrap_err();
    assert!(err.message.contains("does not name this type"));
}

#[test]
fn test_owned_node_with_wrong_parent() {
    let mut u = Universe::new();
    let ty = color(&mut u);
    let first = u.types.get(ty).unwrap().as_enum().unwrap().constants[0];
    u.nodes.relink(first, Parent::Detached);
    assert!(u.verify_type(ty).is_err());
}

#[test]
fn test_enum_default_must_be_first_constant() {
    let mut u = Universe::new();
    let ty = color(&mut u);
    let second = u.enum_constants(ty).unwrap()[1];
    u.types.get_mut(ty).unwrap().default_value = DefaultValue::Symbol(second);
    let err = u.verify_type(ty).unwrap_err();
    assert!(err.message.contains("first constant"));
}

#[test]
fn test_retired_alias_must_be_unreferenced() {
    let mut u = Universe::new();
    let name = u.symbols.intern("int");
    let expr = u.nodes.builder(Span::SYNTHETIC).name(name).unwrap();
    let alias = u.new_alias(expr, Span::SYNTHETIC).unwrap();
    let v = u.symbols.new_var("v", VarFlags::empty(), Some(alias), Span::SYNTHETIC);
    u.types.get_mut(alias).unwrap().retired = true;

    let err = u.verify_types().unwrap_err();
    assert!(err.message.contains("eliminated alias"), "{}", err.message);
    u.symbols.get_mut(v).unwrap().ty = Some(u.builtins.int64());
    assert!(u.verify_types().is_ok());
}
