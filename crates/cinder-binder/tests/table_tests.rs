use super::*;
use cinder_common::{Span, TypeId};

#[test]
fn test_alloc_and_names() {
    let mut table = SymbolTable::new();
    let id = table.new_var("count", VarFlags::empty(), None, Span::SYNTHETIC);
    assert_eq!(table.name(id), "count");
    assert_eq!(table.cname(id), "count");
    assert!(table.get(id).unwrap().is_var_like());
}

#[test]
fn test_define_rejects_duplicate_names() {
    let mut table = SymbolTable::new();
    let a = table.alloc("Color", SymbolKind::Type, Span::SYNTHETIC);
    let b = table.alloc("Color", SymbolKind::Type, Span::SYNTHETIC);
    assert_eq!(table.define(a), Ok(()));
    assert_eq!(table.define(a), Ok(()));
    assert_eq!(table.define(b), Err(a));
    assert_eq!(table.lookup("Color"), Some(a));
    assert_eq!(table.lookup("Missing"), None);
}

#[test]
fn test_immediates_are_unique() {
    let mut table = SymbolTable::new();
    let ty = TypeId(4);
    let zero = table.immediate(Immediate::Int { value: 0, bits: 64 }, ty);
    let again = table.immediate(Immediate::Int { value: 0, bits: 64 }, ty);
    let zero32 = table.immediate(Immediate::Int { value: 0, bits: 32 }, ty);
    assert_eq!(zero, again);
    assert_ne!(zero, zero32);
    assert!(table.is_constant(zero));
    assert_eq!(table.cname(zero), "0");
}

#[test]
fn test_copy_symbol_gets_fresh_id() {
    let mut table = SymbolTable::new();
    let x = table.new_var("x", VarFlags::CONFIG, None, Span::SYNTHETIC);
    let y = table.copy_symbol(x);
    assert_ne!(x, y);
    assert_eq!(table.name(y), "x");
    assert!(table.get(y).unwrap().is_config());
}

#[test]
fn test_intent_parse() {
    assert_eq!(Intent::parse("", Span::SYNTHETIC), Ok(Intent::Blank));
    assert_eq!(Intent::parse("inout", Span::SYNTHETIC), Ok(Intent::Inout));
    let err = Intent::parse("sideways", Span::SYNTHETIC).unwrap_err();
    assert!(err.message.contains("sideways"));
}
