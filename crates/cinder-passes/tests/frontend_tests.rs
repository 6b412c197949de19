use super::*;
use crate::test_support::*;

use cinder_ast::NodeKind;
use cinder_binder::SymbolKind;
use cinder_types::{ClassKind, TypeKind, Universe};

fn load(text: &str) -> (Universe, Result<LoadedModule, PassError>) {
    let mut u = Universe::new();
    let file = u.files.add("m.json");
    let result = JsonFrontend.load(&mut u, file, text);
    (u, result)
}

fn load_errors(text: &str) -> Vec<String> {
    let (_, result) = load(text);
    result
        .unwrap_err()
        .diagnostics()
        .iter()
        .map(|d| d.message_text.clone())
        .collect()
}

#[test]
fn test_module_symbols_and_body() {
    let (u, result) = load(COLOR_MODULE);
    let loaded = result.unwrap();
    let module = u.symbols.get(loaded.module).unwrap();
    let SymbolKind::Module(info) = &module.kind else {
        panic!("expected a module symbol");
    };
    assert_eq!(u.symbols.cname(info.init_fn), "__init_M");
    // Two type definitions, then the two variables.
    let stmts = u.nodes.block_stmts(info.body).unwrap();
    assert_eq!(stmts.len(), 4);
    let tint = u.symbols.lookup("tint").unwrap();
    assert_eq!(stmts[2], u.symbols.get(tint).unwrap().def);
    assert!(u.symbols.get(tint).unwrap().is_config());
}

#[test]
fn test_enum_constants_are_defined() {
    let (u, result) = load(COLOR_MODULE);
    result.unwrap();
    let color = u.symbols.get(u.symbols.lookup("Color").unwrap()).unwrap().ty.unwrap();
    let names: Vec<_> = u
        .enum_constants(color)
        .unwrap()
        .into_iter()
        .map(|c| u.symbols.name(c).to_string())
        .collect();
    assert_eq!(names, vec!["red", "green", "blue"]);
    let green = u.symbols.lookup("green").unwrap();
    assert!(matches!(u.symbols.get(green).unwrap().kind, SymbolKind::EnumConst));
}

#[test]
fn test_record_fields_and_kind() {
    let (u, result) = load(COLOR_MODULE);
    result.unwrap();
    let point = u.symbols.get(u.symbols.lookup("Point").unwrap()).unwrap().ty.unwrap();
    let shape = u.types.ty(point).unwrap().as_aggregate().unwrap();
    assert_eq!(shape.class_kind, ClassKind::Value);
    let fields: Vec<_> = u.data_fields(point).unwrap().iter().map(|&f| u.symbols.name(f).to_string()).collect();
    assert_eq!(fields, vec!["x", "y"]);
}

#[test]
fn test_forward_type_reference_becomes_alias() {
    let text = r#"{
      "module": "M",
      "types": [
        { "kind": "class", "name": "Node", "fields": [{ "name": "next", "type": "Later" }] },
        { "kind": "class", "name": "Later" }
      ]
    }"#;
    let (u, result) = load(text);
    result.unwrap();
    let node = u.symbols.get(u.symbols.lookup("Node").unwrap()).unwrap().ty.unwrap();
    let next = u.data_fields(node).unwrap()[0];
    let next_ty = u.symbols.get(next).unwrap().ty.unwrap();
    let TypeKind::Alias(shape) = &u.types.ty(next_ty).unwrap().kind else {
        panic!("expected an alias for the forward reference");
    };
    let Some(NodeKind::Name(atom)) = u.nodes.kind(shape.type_expr) else {
        panic!("alias should wrap the written name");
    };
    assert_eq!(u.symbols.resolve_atom(*atom), "Later");
}

#[test]
fn test_methods_get_receiver_formals() {
    let text = r#"{
      "module": "M",
      "types": [
        { "kind": "class", "name": "Counter",
          "fields": [{ "name": "n", "type": "int" }],
          "methods": [{ "name": "bump", "params": [{ "name": "by", "type": "int" }] }] }
      ]
    }"#;
    let (u, result) = load(text);
    result.unwrap();
    let counter = u.symbols.get(u.symbols.lookup("Counter").unwrap()).unwrap().ty.unwrap();
    let shape = u.types.ty(counter).unwrap().as_aggregate().unwrap();
    assert_eq!(shape.methods.len(), 1);
    let bump = shape.methods[0];
    let info = u.symbols.get(bump).unwrap().fn_info().unwrap();
    let formals: Vec<_> = info.formals.iter().map(|&f| u.symbols.name(f)).collect();
    assert_eq!(formals, vec!["_methodTokenDummy", "this", "by"]);
    assert_eq!(info.owner, Some(counter));
}

#[test]
fn test_invalid_json_reports_position() {
    let (u, result) = load("{\n  \"module\": \"M\",\n  \"types\": [ oops ]\n}");
    let err = result.unwrap_err();
    let diag = &err.diagnostics()[0];
    assert_eq!(diag.span.line, 3);
    assert!(diag.message_text.starts_with("invalid program description"));
    assert_eq!(u.files.name(diag.span.file), Some("m.json"));
}

#[test]
fn test_duplicate_names_are_reported_with_previous_definition() {
    let (_, result) = load(
        r#"{ "module": "M", "vars": [{ "name": "x", "type": "int", "line": 2 }, { "name": "x", "type": "int", "line": 5 }] }"#,
    );
    let err = result.unwrap_err();
    let diag = &err.diagnostics()[0];
    assert_eq!(diag.message_text, "'x' is already defined");
    assert_eq!(diag.span.line, 5);
    assert_eq!(diag.related_information[0].span.line, 2);
}

#[test]
fn test_bad_enums_and_unions_are_user_errors() {
    assert_eq!(
        load_errors(r#"{ "module": "M", "types": [{ "kind": "enum", "name": "E", "constants": [] }] }"#),
        vec!["enum 'E' has no constants"]
    );
    assert_eq!(
        load_errors(
            r#"{ "module": "M", "types": [{ "kind": "enum", "name": "E", "constants": [{ "name": "a" }, { "name": "a" }] }] }"#
        ),
        vec!["duplicate enum constant 'a' in 'E'"]
    );
    assert_eq!(
        load_errors(r#"{ "module": "M", "types": [{ "kind": "class", "name": "U", "union": true }] }"#),
        vec!["'U' cannot be a union: only records can be unions"]
    );
}

#[test]
fn test_instances_are_deferred() {
    let text = r#"{
      "module": "M",
      "types": [
        { "kind": "record", "name": "Pair", "type_params": ["T"], "fields": [{ "name": "a", "type": "T" }] },
        { "kind": "instance", "name": "IntPair", "template": "Pair", "args": { "T": "int" }, "line": 9 }
      ]
    }"#;
    let (u, result) = load(text);
    let loaded = result.unwrap();
    assert_eq!(loaded.instances.len(), 1);
    assert_eq!(loaded.instances[0].template, "Pair");
    assert_eq!(loaded.instances[0].args.get("T").map(String::as_str), Some("int"));
    assert!(u.symbols.lookup("IntPair").is_none());
    let pair = u.symbols.get(u.symbols.lookup("Pair").unwrap()).unwrap().ty.unwrap();
    assert!(u.types.ty(pair).unwrap().is_pattern());
}
