use super::*;
use crate::test_support::*;

use cinder_ast::{Callee, Literal, NodeKind, Prim};
use cinder_common::{Span, SymbolId, TypeId};
use cinder_types::TypeKind;

fn type_of(program: &Program, name: &str) -> TypeId {
    program.u.symbols.get(lookup(program, name)).unwrap().ty.unwrap()
}

fn body_of(program: &Program, fn_sym: SymbolId) -> Vec<cinder_common::NodeIndex> {
    let body = program.u.symbols.get(fn_sym).unwrap().fn_info().unwrap().body;
    program.u.nodes.block_stmts(body).unwrap().to_vec()
}

fn field_names(program: &Program, ty: TypeId) -> Vec<String> {
    program
        .u
        .data_fields(ty)
        .unwrap()
        .iter()
        .map(|&f| program.u.symbols.name(f).to_string())
        .collect()
}

fn front_half(modules: &[&str]) -> (Inputs, Program, Result<(), Abort>) {
    let (inputs, mut program) = program(modules);
    let result = run_names(&mut program, FRONT_HALF);
    (inputs, program, result)
}

// =============================================================================
// FilesToAST / CreateEntryPoint / Cleanup
// =============================================================================

#[test]
fn test_files_to_ast_needs_inputs() {
    let mut program = Program::new(CompileOptions::default());
    let abort = run_names(&mut program, &["FilesToAST"]).unwrap_err();
    assert_eq!(messages(&abort), vec!["no input files"]);
}

#[test]
fn test_files_to_ast_reports_unreadable_input() {
    let mut program = Program::new(CompileOptions {
        inputs: vec!["/nonexistent/cinder/input.json".into()],
        ..CompileOptions::default()
    });
    let abort = run_names(&mut program, &["FilesToAST"]).unwrap_err();
    assert!(messages(&abort)[0].starts_with("cannot read '/nonexistent/cinder/input.json'"));
}

#[test]
fn test_entry_point_runs_initializers_in_module_order() {
    let (_inputs, mut program) = program(&[
        r#"{ "module": "A" }"#,
        r#"{ "module": "B" }"#,
    ]);
    run_names(&mut program, &["FilesToAST", "CreateEntryPoint"]).unwrap();
    let entry = program.entry.unwrap();
    assert_eq!(program.u.symbols.cname(entry), passes::ENTRY_NAME);

    let callees: Vec<&str> = body_of(&program, entry)
        .into_iter()
        .map(|stmt| match program.u.nodes.kind(stmt) {
            Some(NodeKind::ExprStmt(call)) => match program.u.nodes.kind(*call) {
                Some(NodeKind::Call {
                    callee: Callee::Sym(f),
                    ..
                }) => program.u.symbols.cname(*f),
                other => panic!("unexpected call {other:?}"),
            },
            other => panic!("unexpected statement {other:?}"),
        })
        .collect();
    assert_eq!(callees, vec!["__init_A", "__init_B"]);
    assert_eq!(program.declaring_module(entry), Some(program.modules[0]));
}

#[test]
fn test_user_main_becomes_entry() {
    let (_inputs, mut program) = program(&[
        r#"{ "module": "A", "functions": [{ "name": "main", "body": [{ "return": 0 }], "returns": "int" }] }"#,
    ]);
    run_names(&mut program, &["FilesToAST", "CreateEntryPoint"]).unwrap();
    let main = lookup(&program, "main");
    assert_eq!(program.entry, Some(main));
    let stmts = body_of(&program, main);
    assert_eq!(stmts.len(), 2);
    assert!(matches!(program.u.nodes.kind(stmts[1]), Some(NodeKind::Return(_))));
}

#[test]
fn test_cleanup_flattens_nested_blocks() {
    let (_inputs, mut program) = program(&[COLOR_MODULE]);
    run_names(&mut program, &["FilesToAST"]).unwrap();
    let body = program.module_body(program.modules[0]).unwrap();
    let before = program.u.nodes.block_stmts(body).unwrap().len();
    let mut b = program.u.nodes.builder(Span::SYNTHETIC);
    let one = b.int(1).unwrap();
    let stmt = b.expr_stmt(one).unwrap();
    let empty = b.block(Vec::new()).unwrap();
    let inner = b.block(vec![stmt, empty]).unwrap();
    program.u.nodes.push_stmt(body, inner).unwrap();

    run_names(&mut program, &["Cleanup", "Fixup", "Fixup"]).unwrap();
    let stmts = program.u.nodes.block_stmts(body).unwrap();
    assert_eq!(stmts.len(), before + 1);
    assert_eq!(stmts.last(), Some(&stmt));
    assert!(stmts.iter().all(|&s| !matches!(program.u.nodes.kind(s), Some(NodeKind::Block(_)))));
    verify_program(&program.u).unwrap();
}

// =============================================================================
// RunAnalysis / ResolveSymbols
// =============================================================================

#[test]
fn test_analysis_types_literal_initializers() {
    let (_inputs, mut program) = program(&[
        r#"{ "module": "M", "vars": [{ "name": "s", "init": "hi" }, { "name": "b", "init": true }] }"#,
    ]);
    run_names(&mut program, &["FilesToAST", "RunAnalysis"]).unwrap();
    let s = program.u.symbols.get(lookup(&program, "s")).unwrap();
    assert_eq!(s.ty, Some(program.u.builtins.string));
    let b = program.u.symbols.get(lookup(&program, "b")).unwrap();
    assert_eq!(b.ty, Some(program.u.builtins.bool));
}

#[test]
fn test_resolve_eliminates_aliases() {
    let (_inputs, program, result) = front_half(&[r#"{
      "module": "M",
      "types": [
        { "kind": "alias", "name": "Count", "target": "Size" },
        { "kind": "alias", "name": "Size", "target": "int" },
        { "kind": "record", "name": "Box", "fields": [{ "name": "n", "type": "Count" }, { "name": "next", "type": "Later" }] },
        { "kind": "class", "name": "Later" }
      ],
      "vars": [{ "name": "c", "type": "Count", "init": 2 }]
    }"#]);
    result.unwrap();
    let int = program.u.builtins.int64();
    let c = program.u.symbols.get(lookup(&program, "c")).unwrap();
    assert_eq!(c.ty, Some(int));
    let boxed = type_of(&program, "Box");
    let fields = program.u.data_fields(boxed).unwrap();
    assert_eq!(program.u.symbols.get(fields[0]).unwrap().ty, Some(int));
    assert_eq!(program.u.symbols.get(fields[1]).unwrap().ty, Some(type_of(&program, "Later")));
    assert!(
        program
            .u
            .types
            .live()
            .all(|(_, t)| !matches!(&t.kind, TypeKind::Alias(shape) if shape.type_expr.is_some())),
        "no resolvable alias may survive"
    );
    program.u.verify_types().unwrap();
}

#[test]
fn test_resolve_reports_cycles_and_unknown_types() {
    let (_inputs, _program, result) = front_half(&[r#"{
      "module": "M",
      "types": [
        { "kind": "alias", "name": "A", "target": "B" },
        { "kind": "alias", "name": "B", "target": "A" },
        { "kind": "record", "name": "R", "fields": [{ "name": "x", "type": "Nope" }] }
      ]
    }"#]);
    let abort = result.unwrap_err();
    assert_eq!(abort.pass, "ResolveSymbols");
    let messages = messages(&abort);
    assert!(messages.contains(&"Type alias 'A' refers to itself".to_string()), "{messages:?}");
    assert!(messages.contains(&"Unable to resolve type 'Nope'".to_string()), "{messages:?}");
}

#[test]
fn test_resolve_binds_identifiers() {
    let (_inputs, program, result) = front_half(&[r#"{
      "module": "M",
      "vars": [{ "name": "x", "type": "int", "init": 2 }],
      "functions": [
        { "name": "stop", "params": [{ "name": "why", "type": "string" }], "body": [{ "call": "halt", "args": [{ "name": "why" }] }] },
        { "name": "main", "body": [
          { "var": { "name": "y", "init": { "name": "x" } } },
          { "call": "stop", "args": ["done"] }
        ] }
      ]
    }"#]);
    result.unwrap();
    let main = lookup(&program, "main");
    let stmts = body_of(&program, main);
    let y = lookup_local(&program, stmts[1]);
    let y_symbol = program.u.symbols.get(y).unwrap();
    assert_eq!(program.u.symbols.name(y), "y");
    assert_eq!(y_symbol.ty, Some(program.u.builtins.int64()));
    let Some(NodeKind::Def { init, .. }) = program.u.nodes.kind(stmts[1]) else {
        panic!("expected the definition of y");
    };
    assert_eq!(program.u.nodes.kind(*init), Some(&NodeKind::SymRef(lookup(&program, "x"))));

    let stop = lookup(&program, "stop");
    let Some(NodeKind::ExprStmt(call)) = program.u.nodes.kind(stmts[2]) else {
        panic!("expected the call statement");
    };
    assert!(matches!(
        program.u.nodes.kind(*call),
        Some(NodeKind::Call { callee: Callee::Sym(f), .. }) if *f == stop
    ));
    let Some(NodeKind::ExprStmt(halt)) = program.u.nodes.kind(body_of(&program, stop)[0]) else {
        panic!("expected the halt statement");
    };
    assert!(matches!(
        program.u.nodes.kind(*halt),
        Some(NodeKind::Call { callee: Callee::Prim(Prim::Halt), .. })
    ));
}

/// Symbol defined by a `Def` statement.
fn lookup_local(program: &Program, def: cinder_common::NodeIndex) -> SymbolId {
    program.u.nodes.kind(def).and_then(NodeKind::def_sym).unwrap()
}

#[test]
fn test_resolve_reports_unresolved_identifiers() {
    let (_inputs, _program, result) = front_half(&[r#"{
      "module": "M",
      "functions": [{ "name": "f", "body": [{ "call": "nothing" }, { "name": "ghost" }] }]
    }"#]);
    let abort = result.unwrap_err();
    assert_eq!(
        messages(&abort),
        vec!["Unresolved identifier 'ghost'", "Unresolved identifier 'nothing'"]
    );
}

#[test]
fn test_resolve_flattens_inheritance() {
    let (_inputs, program, result) = front_half(&[r#"{
      "module": "M",
      "types": [
        { "kind": "class", "name": "Derived", "inherits": ["Middle"], "fields": [{ "name": "c", "type": "int" }] },
        { "kind": "class", "name": "Middle", "inherits": ["Base"], "fields": [{ "name": "b", "type": "int" }] },
        { "kind": "class", "name": "Base", "fields": [{ "name": "a", "type": "int" }] }
      ]
    }"#]);
    result.unwrap();
    assert_eq!(field_names(&program, type_of(&program, "Middle")), vec!["a", "b"]);
    assert_eq!(field_names(&program, type_of(&program, "Derived")), vec!["a", "b", "c"]);
    let base_field = program.u.data_fields(type_of(&program, "Base")).unwrap()[0];
    let derived_field = program.u.data_fields(type_of(&program, "Derived")).unwrap()[0];
    assert_ne!(base_field, derived_field, "inherited fields are copies");
    verify_program(&program.u).unwrap();
}

#[test]
fn test_resolve_rejects_non_aggregate_parent() {
    let (_inputs, _program, result) = front_half(&[r#"{
      "module": "M",
      "types": [
        { "kind": "enum", "name": "Color", "constants": [{ "name": "red" }] },
        { "kind": "class", "name": "C", "inherits": ["Color"] }
      ]
    }"#]);
    assert_eq!(
        messages(&result.unwrap_err()),
        vec!["'Color' cannot be inherited from: it is not a class or record"]
    );
}

const PAIR_MODULE: &str = r#"{
  "module": "M",
  "types": [
    { "kind": "record", "name": "Pair", "type_params": ["T"], "fields": [{ "name": "first", "type": "T" }, { "name": "second", "type": "T" }] },
    { "kind": "instance", "name": "IntPair", "template": "Pair", "args": { "T": "int" } }
  ],
  "vars": [{ "name": "p", "type": "IntPair" }]
}"#;

#[test]
fn test_resolve_instantiates_templates() {
    let (_inputs, program, result) = front_half(&[PAIR_MODULE]);
    result.unwrap();
    let pair = type_of(&program, "Pair");
    let int_pair = type_of(&program, "IntPair");
    let t = program.u.types.ty(int_pair).unwrap();
    assert_eq!(t.instantiated_from, Some(pair));
    assert!(!t.is_pattern());
    let int = program.u.builtins.int64();
    for field in program.u.data_fields(int_pair).unwrap() {
        assert_eq!(program.u.symbols.get(field).unwrap().ty, Some(int));
    }
    let p = program.u.symbols.get(lookup(&program, "p")).unwrap();
    assert_eq!(p.ty, Some(int_pair));
}

#[test]
fn test_resolve_rejects_bad_instances() {
    let (_inputs, _program, result) = front_half(&[r#"{
      "module": "M",
      "types": [
        { "kind": "record", "name": "Pair", "type_params": ["T"], "fields": [{ "name": "first", "type": "T" }] },
        { "kind": "record", "name": "Plain" },
        { "kind": "instance", "name": "A", "template": "Plain", "args": {} },
        { "kind": "instance", "name": "B", "template": "Pair", "args": { "U": "int" } },
        { "kind": "instance", "name": "C", "template": "Pair", "args": {} }
      ]
    }"#]);
    assert_eq!(
        messages(&result.unwrap_err()),
        vec![
            "'Plain' is not a generic type",
            "'U' is not a type parameter of 'Pair'",
            "missing type argument 'T' for 'Pair'",
        ]
    );
}

// =============================================================================
// FindUnknownTypes
// =============================================================================

#[test]
fn test_unknown_types_are_reported() {
    let (_inputs, _program, result) = front_half(&[r#"{
      "module": "M",
      "vars": [{ "name": "z", "line": 3 }],
      "functions": [{ "name": "f", "body": [{ "var": { "name": "w", "init": { "call": "f" } } }] }]
    }"#]);
    let abort = result.unwrap_err();
    assert_eq!(abort.pass, "FindUnknownTypes");
    assert_eq!(
        messages(&abort),
        vec![
            "Unable to determine the type of 'z'",
            "Unable to determine the type of 'w'",
        ]
    );
    assert_eq!(abort.error.diagnostics()[0].span.line, 3);
}

#[test]
fn test_template_code_is_not_checked() {
    let (_inputs, _program, result) = front_half(&[PAIR_MODULE]);
    result.unwrap();
}

// =============================================================================
// Back half
// =============================================================================

#[test]
fn test_default_functions_per_type() {
    let (_inputs, mut program) = program(&[COLOR_MODULE]);
    run_names(&mut program, FRONT_HALF).unwrap();
    run_names(&mut program, &["BuildDefaultFunctions"]).unwrap();
    let cnames: Vec<&str> = program
        .default_fns
        .iter()
        .map(|&f| program.u.symbols.cname(f))
        .collect();
    assert_eq!(
        cnames,
        vec![
            "_default_format_write_enumColor",
            "_default_format_read_enumColor",
            "_default_format_writePoint",
            "_default_format_readPoint",
        ]
    );
    let first = program.default_fns[0];
    assert_eq!(program.u.symbols.name(first), "_default_format_write_enum");
    assert_eq!(program.declaring_module(first), Some(program.modules[0]));
    let formals: Vec<&str> = program
        .u
        .symbols
        .get(first)
        .unwrap()
        .fn_info()
        .unwrap()
        .formals
        .iter()
        .map(|&f| program.u.symbols.name(f))
        .collect();
    assert_eq!(formals, vec!["f", "arg"]);

    // Running again adds nothing.
    run_names(&mut program, &["BuildDefaultFunctions"]).unwrap();
    assert_eq!(program.default_fns.len(), 4);
}

const COUNTER_MODULE: &str = r#"{
  "module": "M",
  "types": [
    { "kind": "class", "name": "Counter",
      "fields": [{ "name": "n", "type": "int" }],
      "methods": [{ "name": "bump", "params": [{ "name": "by", "type": "int" }], "body": [
        { "call": "=", "args": [{ "base": { "name": "this" }, "field": "n" }, { "name": "by" }] }
      ] }] }
  ]
}"#;

#[test]
fn test_methods_become_module_functions() {
    let (_inputs, mut program) = program(&[COUNTER_MODULE]);
    run_names(&mut program, FRONT_HALF).unwrap();
    run_names(&mut program, &["MethodsToFunctions", "Fixup", "Fixup"]).unwrap();
    let counter = type_of(&program, "Counter");
    let shape = program.u.types.ty(counter).unwrap().as_aggregate().unwrap();
    let bump = shape.methods[0];
    assert!(
        !shape.declarations.contains(&program.u.symbols.get(bump).unwrap().def),
        "the method definition left the class"
    );
    assert_eq!(program.u.symbols.cname(bump), "Counter_bump");
    assert_eq!(program.declaring_module(bump), Some(program.modules[0]));
    assert!(program.functions().unwrap().contains(&bump));
    assert_eq!(field_names(&program, counter), vec!["n"]);
    verify_program(&program.u).unwrap();
}

#[test]
fn test_union_reads_are_checked() {
    let (_inputs, mut program) = program(&[r#"{
      "module": "M",
      "types": [
        { "kind": "record", "name": "U", "union": true, "fields": [{ "name": "i", "type": "int" }, { "name": "s", "type": "string" }] }
      ],
      "functions": [{ "name": "show", "params": [{ "name": "u", "type": "U" }], "body": [
        { "call": "=", "args": [{ "base": { "name": "u" }, "field": "i" }, 3] },
        { "var": { "name": "v", "init": { "base": { "name": "u" }, "field": "s" } } }
      ] }]
    }"#]);
    run_names(&mut program, FRONT_HALF).unwrap();
    run_names(&mut program, &["InsertUnionChecks", "Fixup"]).unwrap();

    let show = lookup(&program, "show");
    let stmts = body_of(&program, show);
    assert_eq!(stmts.len(), 3, "one check, for the read of 's' only");
    let Some(NodeKind::ExprStmt(check)) = program.u.nodes.kind(stmts[1]) else {
        panic!("expected the union check before the read");
    };
    let Some(NodeKind::Call {
        callee: Callee::Prim(Prim::UnionCheck),
        args,
    }) = program.u.nodes.kind(*check)
    else {
        panic!("expected a _union_check call");
    };
    let u_formal = program.u.symbols.get(show).unwrap().fn_info().unwrap().formals[0];
    assert_eq!(program.u.nodes.kind(args[0]), Some(&NodeKind::SymRef(u_formal)));
    assert_eq!(program.u.nodes.kind(args[1]), Some(&NodeKind::Literal(Literal::Int(2))));
    verify_program(&program.u).unwrap();
}

// =============================================================================
// Codegen
// =============================================================================

const HUE_MODULE: &str = r#"{
  "module": "M",
  "types": [
    { "kind": "enum", "name": "Color", "constants": [{ "name": "red" }] },
    { "kind": "alias", "name": "Hue", "target": "Color" }
  ]
}"#;

#[test]
fn test_codegen_rejects_surviving_alias() {
    let (_inputs, mut program) = program(&[HUE_MODULE]);
    let abort = run_names(&mut program, &["FilesToAST", "CreateEntryPoint", "Codegen"]).unwrap_err();
    assert_eq!(abort.pass, "Codegen");
    let PassError::Internal(err) = &abort.error else {
        panic!("expected an internal error, got {:?}", abort.error);
    };
    assert_eq!(err.message, "alias types should be removed by codegen time");
    let hue = type_of(&program, "Hue");
    assert_eq!(err.span, program.u.types.ty(hue).unwrap().span);
    assert!(program.output.is_none());
}

#[test]
fn test_codegen_after_resolution_emits_no_alias() {
    let (_inputs, program, result) = compile(&[HUE_MODULE]);
    result.unwrap();
    let output = program.output.expect("generated output");
    assert!(!output.header.contains("Hue"), "{}", output.header);
}
