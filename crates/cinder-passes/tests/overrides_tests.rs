use super::*;
use crate::test_support::*;

use cinder_ast::{Literal, NodeKind};

fn with_overrides(overrides: &[(&str, &str)]) -> (Inputs, Program, Result<(), Abort>) {
    let (inputs, mut program) = program(&[OVERRIDE_MODULE]);
    for (name, value) in overrides {
        program
            .options
            .config_overrides
            .insert(name.to_string(), value.to_string());
    }
    let result = run_names(&mut program, &["FilesToAST", "ResolveSymbols"]);
    (inputs, program, result)
}

const OVERRIDE_MODULE: &str = r#"{
  "module": "M",
  "types": [
    { "kind": "enum", "name": "Color", "constants": [{ "name": "red" }, { "name": "green" }] },
    { "kind": "alias", "name": "Shade", "target": "Color" }
  ],
  "vars": [
    { "name": "tint", "type": "Shade", "config": true },
    { "name": "verbose", "type": "bool", "config": true },
    { "name": "n", "type": "int", "config": true, "init": 1 },
    { "name": "label", "type": "string", "config": true },
    { "name": "loose", "config": true },
    { "name": "fixed", "type": "int", "init": 4 }
  ]
}"#;

fn init_of<'a>(program: &'a Program, name: &str) -> Option<&'a NodeKind> {
    let def = program.u.symbols.get(lookup(program, name)).unwrap().def;
    match program.u.nodes.kind(def) {
        Some(NodeKind::Def { init, .. }) if init.is_some() => program.u.nodes.kind(*init),
        _ => None,
    }
}

#[test]
fn test_parse_override() {
    assert_eq!(
        parse_override("n=5"),
        ConfigOverride {
            name: "n".to_string(),
            value: "5".to_string()
        }
    );
    assert_eq!(parse_override("verbose").value, "true");
    assert_eq!(parse_override("verbose=").value, "true");
    assert_eq!(parse_override("url=a=b").value, "a=b");
}

#[test]
fn test_typed_overrides_become_initializers() {
    let (_inputs, program, result) = with_overrides(&[
        ("tint", "green"),
        ("verbose", "true"),
        ("n", "42"),
        ("label", "hi there"),
    ]);
    result.unwrap();
    let green = lookup(&program, "green");
    assert_eq!(init_of(&program, "tint"), Some(&NodeKind::SymRef(green)));
    assert_eq!(init_of(&program, "verbose"), Some(&NodeKind::Literal(Literal::Bool(true))));
    assert_eq!(init_of(&program, "n"), Some(&NodeKind::Literal(Literal::Int(42))));
    assert_eq!(
        init_of(&program, "label"),
        Some(&NodeKind::Literal(Literal::Str("hi there".to_string())))
    );
}

#[test]
fn test_untyped_override_types_the_var() {
    let (_inputs, program, result) = with_overrides(&[("loose", "17")]);
    result.unwrap();
    assert_eq!(init_of(&program, "loose"), Some(&NodeKind::Literal(Literal::Int(17))));
    let loose = program.u.symbols.get(lookup(&program, "loose")).unwrap();
    assert_eq!(loose.ty, Some(program.u.builtins.int64()));
}

#[test]
fn test_unknown_and_non_config_names_are_rejected() {
    let (_inputs, _program, result) = with_overrides(&[("nope", "1"), ("fixed", "2")]);
    let abort = result.unwrap_err();
    assert_eq!(abort.pass, "ResolveSymbols");
    assert_eq!(
        messages(&abort),
        vec![
            "Trying to set unrecognized config param 'nope' via -s flag",
            "Trying to set unrecognized config param 'fixed' via -s flag",
        ]
    );
}

#[test]
fn test_invalid_values_name_the_type() {
    let (_inputs, _program, result) =
        with_overrides(&[("tint", "Green"), ("verbose", "yes"), ("n", "4x")]);
    let abort = result.unwrap_err();
    assert_eq!(
        messages(&abort),
        vec![
            "\"Green\" is not a valid value for a config var \"tint\" in module \"M\" of type Color",
            "\"yes\" is not a valid value for a config var \"verbose\" in module \"M\" of type bool",
            "\"4x\" is not a valid value for a config var \"n\" in module \"M\" of type int",
        ]
    );
}
