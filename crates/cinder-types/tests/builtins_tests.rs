use super::*;
use cinder_binder::Immediate;

#[test]
fn test_primitives_are_bound_with_c_names() {
    let u = Universe::new();
    let b = u.builtins;
    assert_eq!(u.type_name(b.int64()), "int");
    assert_eq!(u.type_cname(b.int64()), "_int64");
    assert_eq!(u.type_name(b.int(IntWidth::W8)), "_int8");
    assert_eq!(u.type_cname(b.uint(IntWidth::W32)), "_uint32");
    assert_eq!(u.type_name(b.float(FloatWidth::W64)), "float");
    assert_eq!(u.type_cname(b.complex(FloatWidth::W128)), "_complex128");
    assert_eq!(u.type_cname(b.file), "_cfile");
    assert_eq!(u.type_name(b.nil), "_nilType");
    assert_eq!(u.type_cname(b.string), "_string");
}

#[test]
fn test_primitive_names_resolve_in_root_scope() {
    let u = Universe::new();
    let int_sym = u.symbols.lookup("int").expect("int is defined");
    assert_eq!(u.symbols.get(int_sym).unwrap().ty, Some(u.builtins.int64()));
    assert_eq!(u.symbols.lookup("nil"), Some(u.builtins.g_nil));
    assert_eq!(u.symbols.lookup("true"), Some(u.builtins.g_true));
    assert_eq!(u.symbols.lookup("false"), Some(u.builtins.g_false));
}

#[test]
fn test_primitive_defaults() {
    let mut u = Universe::new();
    let b = u.builtins;
    let default_of = |u: &Universe, ty| u.types.get(ty).unwrap().default_value.symbol();

    assert_eq!(default_of(&u, b.nil), Some(b.g_nil));
    assert_eq!(default_of(&u, b.bool), Some(b.g_false));
    assert_eq!(default_of(&u, b.void), Some(b.g_void));
    assert_eq!(default_of(&u, b.method_token), Some(b.g_method_token));
    assert_eq!(default_of(&u, b.any), None);

    let zero = u
        .symbols
        .immediate(Immediate::Int { value: 0, bits: 64 }, b.int64());
    assert_eq!(default_of(&u, b.int64()), Some(zero));

    let complex_default = default_of(&u, b.complex(FloatWidth::W64)).unwrap();
    assert_eq!(u.symbols.cname(complex_default), "_cinder_complex64(0.0, 0.0)");
    let file_default = default_of(&u, b.file).unwrap();
    assert_eq!(u.symbols.cname(file_default), "0");
}

#[test]
fn test_builtins_verify() {
    let u = Universe::new();
    assert!(u.verify_types().is_ok());
    for (id, ty) in u.types.iter() {
        assert_eq!(ty.variant(), TypeVariant::Primitive, "{id:?} should be primitive");
        assert!(ty.binding().is_some());
    }
}

#[test]
fn test_primitive_lookup_by_kind() {
    let u = Universe::new();
    let b = u.builtins;
    assert_eq!(b.primitive(PrimitiveKind::Int(IntWidth::W64)), b.int64());
    assert_eq!(b.primitive(PrimitiveKind::SetterToken), b.setter_token);
    assert_eq!(
        u.types.get(b.uint(IntWidth::W16)).unwrap().primitive(),
        Some(PrimitiveKind::UInt(IntWidth::W16))
    );
}
