use super::*;

#[test]
fn test_intern_is_idempotent() {
    let mut interner = Interner::new();
    let a = interner.intern("Color");
    let b = interner.intern("Color");
    assert_eq!(a, b);
    assert_eq!(interner.resolve(a), "Color");
}

#[test]
fn test_empty_string_is_none_atom() {
    let mut interner = Interner::new();
    assert_eq!(interner.intern(""), Atom::NONE);
    assert!(Atom::NONE.is_none());
}

#[test]
fn test_common_strings_are_seeded() {
    let interner = Interner::new();
    assert!(interner.get("this").is_some());
    assert!(interner.get("valString").is_some());
    assert!(interner.get("not-seeded").is_none());
}

#[test]
fn test_ids_debug_format() {
    assert_eq!(format!("{:?}", TypeId(3)), "type#3");
    assert_eq!(format!("{:?}", NodeIndex::NONE), "node#none");
    assert!(SymbolId::NONE.is_none());
    assert_eq!(SymbolId::from_index(7).index(), 7);
}
