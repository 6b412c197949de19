use super::*;
use crate::test_support::*;
use cinder_ast::{NodeIndex, Parent};
use cinder_binder::{FnInfo, Intent, ModuleInfo, SymbolKind, VarFlags};
use cinder_common::{Span, SymbolId, TypeId};
use cinder_types::{ClassKind, Universe};

fn function(
    u: &mut Universe,
    name: &str,
    cname: &str,
    formals: Vec<SymbolId>,
    stmts: Vec<NodeIndex>,
) -> SymbolId {
    let body = u.nodes.builder(Span::SYNTHETIC).block(stmts).unwrap();
    let sym = u.symbols.alloc_with_cname(
        name,
        cname.to_string(),
        SymbolKind::Fn(FnInfo {
            formals,
            body,
            ..FnInfo::default()
        }),
        Span::SYNTHETIC,
    );
    u.nodes.attach(body, Parent::Symbol(sym)).unwrap();
    sym
}

/// A default-format routine for `ty` with a synthesized body.
fn default_fn(u: &mut Universe, ty: TypeId, is_read: bool) -> SymbolId {
    let file = u.builtins.file;
    let f = u.symbols.alloc("f", SymbolKind::Arg { intent: Intent::Blank }, Span::SYNTHETIC);
    let intent = if is_read { Intent::Inout } else { Intent::Blank };
    let arg = u.symbols.alloc("arg", SymbolKind::Arg { intent }, Span::SYNTHETIC);
    u.symbols.get_mut(f).unwrap().ty = Some(file);
    u.symbols.get_mut(arg).unwrap().ty = Some(ty);
    let mut synth = SerializationSynthesizer::new(u);
    let stmts = if is_read {
        synth.build_read_body(ty, f, arg).unwrap()
    } else {
        synth.build_write_body(ty, f, arg).unwrap()
    };
    let name = u.default_format_name(ty, is_read).unwrap();
    let cname = default_format_cname(u, ty, is_read).unwrap();
    function(u, &name, &cname, vec![f, arg], stmts)
}

struct Fixture {
    u: Universe,
    contents: UnitContents,
}

fn program() -> Fixture {
    let mut u = Universe::new();
    let color = color(&mut u);
    let point = point(&mut u);
    let write_color = default_fn(&mut u, color, false);

    let int = u.builtins.int64();
    let count = u.symbols.new_var("count", VarFlags::empty(), Some(int), Span::SYNTHETIC);
    let three = u.nodes.builder(Span::SYNTHETIC).int(3).unwrap();
    let count_def = def(&mut u, count, three);
    let tint = u.symbols.new_var("tint", VarFlags::CONFIG, Some(color), Span::SYNTHETIC);
    let tint_def = def(&mut u, tint, NodeIndex::NONE);
    let module_body = u
        .nodes
        .builder(Span::SYNTHETIC)
        .block(vec![count_def, tint_def])
        .unwrap();
    let init = u.symbols.alloc_with_cname(
        "__init_M",
        "__init_M".to_string(),
        SymbolKind::Fn(FnInfo::default()),
        Span::SYNTHETIC,
    );
    let module = u.symbols.alloc(
        "M",
        SymbolKind::Module(ModuleInfo {
            body: module_body,
            init_fn: init,
        }),
        Span::SYNTHETIC,
    );
    u.nodes.attach(module_body, Parent::Symbol(module)).unwrap();

    let call_init = {
        let mut b = u.nodes.builder(Span::SYNTHETIC);
        let call = b.call_sym(init, Vec::new()).unwrap();
        b.expr_stmt(call).unwrap()
    };
    let main = function(&mut u, "_main", "_main", Vec::new(), vec![call_init]);

    let stmts = u.nodes.block_stmts(module_body).unwrap().to_vec();
    let contents = UnitContents {
        types: vec![color, point],
        modules: vec![ModuleUnit {
            module,
            init_fn: init,
            stmts,
        }],
        functions: vec![write_color, main],
        default_fns: vec![write_color],
        config_vars: vec![(tint, module)],
        entry: main,
        gen_communicated_structures: false,
    };
    Fixture { u, contents }
}

#[test]
fn test_header_declares_types_prototypes_and_runtime_abi() {
    let fx = program();
    let out = UnitEmitter::new(&fx.u).emit(&fx.contents).unwrap();
    let h = &out.header;
    assert!(h.starts_with("#ifndef _CINDER_MAIN_H_\n#define _CINDER_MAIN_H_\n"));
    assert!(h.contains("#include \"cinder_runtime.h\""));
    assert!(h.contains("typedef struct __Point _Point, *Point;"));
    assert!(h.contains("typedef enum {\n  red, green, blue\n} Color;"));
    assert!(h.contains("struct __Point {\n  _int64 x;\n  _int64 y;\n};"));
    assert!(h.contains("int _convert_string_to_enumColor(char* inputString, Color* val);"));
    assert!(h.contains("void _default_format_write_enumColor(_cfile f, Color arg);"));
    assert!(h.contains("void __init_M(void);"));
    assert!(h.contains("extern _int64 count;"));
    assert!(h.contains("extern cinder_fn_p cinder_ftable[];"));
    assert!(h.contains("extern int64_t cinder_gen_main(cinder_main_argument* const _arg);"));
    assert!(h.contains("extern void CreateConfigVarTable(void);"));
    assert!(!h.contains("cinder_getFieldType"));
    assert!(h.trim_end().ends_with("#endif"));

    // Prototypes precede definitions.
    let proto = h.find("typedef struct __Point").unwrap();
    let def = h.find("struct __Point {").unwrap();
    assert!(proto < def);
}

#[test]
fn test_source_defines_tables_entry_and_initializers() {
    let fx = program();
    let out = UnitEmitter::new(&fx.u).emit(&fx.contents).unwrap();
    let c = &out.source;
    assert!(c.starts_with("#include \"_main.h\"\n"));
    assert!(c.contains("_int64 count;\n"));
    assert!(c.contains("void __init_M(void) {\n  count = 3;\n  if (!setInCommandLineColor(\"tint\", &tint, \"M\")) {\n    tint = red;\n  }\n}\n"));
    assert!(c.contains("installConfigVar(\"tint\", \"Color\", \"M\");"));
    assert!(c.contains("cinder_fn_p cinder_ftable[] = {\n  (cinder_fn_p)_default_format_write_enumColor,\n  NULL\n};"));
    assert!(c.contains("int64_t cinder_gen_main(cinder_main_argument* const _arg) {\n  _main();\n  return 0;\n}"));
    assert!(c.contains("void _main(void) {\n  __init_M();\n}"));
    assert!(c.contains("if (arg == blue) {\n    _default_format_write_string(f, \"blue\");\n  } else if (arg == green) {"));
}

#[test]
fn test_inout_formal_is_copied_in_and_written_back() {
    let mut u = Universe::new();
    let color = color(&mut u);
    let read = default_fn(&mut u, color, true);
    let mut out = CWriter::new();
    CCodeEmitter::new(&u).emit_fn(read, &mut out).unwrap();
    let text = out.finish();
    assert!(text.starts_with(
        "void _default_format_read_enumColor(_cfile f, Color* const _in_arg) {\n  Color arg = *_in_arg;\n"
    ), "{text}");
    assert!(text.contains("_string valString = \"\";"));
    assert!(text.contains("_default_format_read_string(f, &valString);"));
    assert!(text.contains("if (_cinder_string_equal(valString, \"red\")) {\n    arg = red;"));
    assert!(text.contains("halt(\"***Error: Not of \", \"Color\", \" type***\");"));
    assert!(text.ends_with("  *_in_arg = arg;\n}\n\n"));
}

#[test]
fn test_class_write_returns_early_for_nil() {
    let mut u = Universe::new();
    let c = class_c(&mut u);
    let write = default_fn(&mut u, c, false);
    let mut out = CWriter::new();
    CCodeEmitter::new(&u).emit_fn(write, &mut out).unwrap();
    let text = out.finish();
    assert!(text.contains("if (arg == nil) {\n    _default_format_write_string(f, \"nil\");\n    return;\n  }"));
    assert!(text.contains("_default_format_write_int64(f, arg->x);"));
}

#[test]
fn test_record_read_reads_fields_through_pointers() {
    let mut u = Universe::new();
    let p = point(&mut u);
    let read = default_fn(&mut u, p, true);
    let mut out = CWriter::new();
    CCodeEmitter::new(&u).emit_fn(read, &mut out).unwrap();
    let text = out.finish();
    assert!(text.contains("_Point* const _in_arg"));
    assert!(text.contains("matchingCharWasRead = _readLitChar(f->fp, \"(\", ignoreWhiteSpace);"));
    assert!(text.contains("if (!matchingCharWasRead) {"));
    assert!(text.contains("_default_format_read_int64(f, &arg.x);"));
}

#[test]
fn test_embedded_records_are_defined_first() {
    let mut u = Universe::new();
    let p = point(&mut u);
    let line = aggregate(&mut u, "Line", ClassKind::Value, &[("a", p), ("b", p)]);
    let entry = function(&mut u, "_main", "_main", Vec::new(), Vec::new());
    let contents = UnitContents {
        types: vec![line, p],
        functions: vec![entry],
        entry,
        ..UnitContents::default()
    };
    let out = UnitEmitter::new(&u).emit(&contents).unwrap();
    let point_def = out.header.find("struct __Point {").unwrap();
    let line_def = out.header.find("struct __Line {").unwrap();
    assert!(point_def < line_def);
    assert!(out.header.contains("  _Point a;\n  _Point b;\n"));
}

#[test]
fn test_communicated_structures_table() {
    let mut fx = program();
    fx.contents.gen_communicated_structures = true;
    let out = UnitEmitter::new(&fx.u).emit(&fx.contents).unwrap();
    assert!(out.header.contains("extern size_t cinder_getFieldOffset(int typeNum, int fieldNum);"));
    let c = &out.source;
    assert!(c.contains("const int cinder_max_fields_per_type = 2;"));
    assert!(c.contains("{offsetof(struct __Point, x), offsetof(struct __Point, y)},"));
    assert!(c.contains("{CINDER_TYPE__int64, CINDER_TYPE__int64},"));
    assert!(c.contains("sizeof(struct __Point),"));
    assert!(c.contains("cinderType cinder_getFieldType(int typeNum, int fieldNum) {"));
}

#[test]
fn test_write_to_creates_both_files() {
    let fx = program();
    let out = UnitEmitter::new(&fx.u).emit(&fx.contents).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("gen");
    out.write_to(&target).unwrap();
    assert_eq!(std::fs::read_to_string(target.join(HEADER_FILE)).unwrap(), out.header);
    assert_eq!(std::fs::read_to_string(target.join(SOURCE_FILE)).unwrap(), out.source);
}

#[test]
fn test_alias_in_unit_is_fatal() {
    let mut u = Universe::new();
    let name = u.symbols.intern("Target");
    let expr = u.nodes.builder(Span::SYNTHETIC).name(name).unwrap();
    let alias = u.new_alias(expr, Span::SYNTHETIC).unwrap();
    u.bind(alias, "A", "A").unwrap();
    let int = u.builtins.int64();
    let holder = aggregate(&mut u, "Holder", ClassKind::Value, &[("a", alias), ("n", int)]);
    let entry = function(&mut u, "_main", "_main", Vec::new(), Vec::new());
    let contents = UnitContents {
        types: vec![holder],
        functions: vec![entry],
        entry,
        ..UnitContents::default()
    };
    let err = UnitEmitter::new(&u).emit(&contents).unwrap_err();
    assert!(err.message.contains("should be removed by codegen time"));
}
