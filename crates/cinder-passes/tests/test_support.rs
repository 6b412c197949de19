//! Shared fixtures for the pass tests.

use super::*;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use cinder_common::SymbolId;
use tempfile::TempDir;

/// Input descriptions written to a scratch directory.
pub(crate) struct Inputs {
    pub dir: TempDir,
    pub paths: Vec<PathBuf>,
}

pub(crate) fn write_inputs(modules: &[&str]) -> Inputs {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = Vec::new();
    for (i, text) in modules.iter().enumerate() {
        let path = dir.path().join(format!("m{i}.json"));
        std::fs::write(&path, text).unwrap();
        paths.push(path);
    }
    Inputs { dir, paths }
}

/// A program over `modules` that never writes or builds anything.
pub(crate) fn program(modules: &[&str]) -> (Inputs, Program) {
    let inputs = write_inputs(modules);
    let options = CompileOptions {
        inputs: inputs.paths.clone(),
        no_build: true,
        ..CompileOptions::default()
    };
    (inputs, Program::new(options))
}

pub(crate) fn run_names(program: &mut Program, names: &[&str]) -> Result<(), Abort> {
    let list = PassList::new(names.iter().map(|n| PassEntry::new(n, "")).collect());
    Pipeline::new(list, PassRegistry::builtin()).unwrap().run(program)
}

/// Everything up to (not including) code generation.
pub(crate) const FRONT_HALF: &[&str] = &[
    "FilesToAST",
    "CreateEntryPoint",
    "Fixup",
    "Cleanup",
    "RunAnalysis",
    "ResolveSymbols",
    "FindUnknownTypes",
];

/// Run the default pass list with `--no-build`.
pub(crate) fn compile(modules: &[&str]) -> (Inputs, Program, Result<(), Abort>) {
    let (inputs, mut program) = program(modules);
    let result = Pipeline::new(PassList::default_list(), PassRegistry::builtin())
        .unwrap()
        .run(&mut program);
    (inputs, program, result)
}

/// Messages of the user diagnostics behind an abort.
pub(crate) fn messages(abort: &Abort) -> Vec<String> {
    abort
        .error
        .diagnostics()
        .iter()
        .map(|d| d.message_text.clone())
        .collect()
}

pub(crate) fn lookup(program: &Program, name: &str) -> SymbolId {
    program
        .u
        .symbols
        .lookup(name)
        .unwrap_or_else(|| panic!("'{name}' is not defined"))
}

/// A pass that appends its name to a shared log.
pub(crate) struct LogPass {
    pub name: &'static str,
    pub log: Rc<RefCell<Vec<String>>>,
}

impl Pass for LogPass {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, _program: &mut Program, args: &str) -> PassResult {
        self.log.borrow_mut().push(format!("{}({args})", self.name));
        Ok(())
    }
}

pub(crate) const COLOR_MODULE: &str = r#"{
  "module": "M",
  "types": [
    { "kind": "enum", "name": "Color", "constants": [{ "name": "red" }, { "name": "green" }, { "name": "blue" }] },
    { "kind": "record", "name": "Point", "fields": [{ "name": "x", "type": "int" }, { "name": "y", "type": "int" }] }
  ],
  "vars": [
    { "name": "tint", "type": "Color", "config": true },
    { "name": "count", "type": "int", "init": 3 }
  ]
}"#;

#[test]
fn test_fixture_program_loads() {
    let (_inputs, mut program) = program(&[COLOR_MODULE]);
    run_names(&mut program, &["FilesToAST"]).unwrap();
    assert_eq!(program.modules.len(), 1);
    lookup(&program, "Color");
    lookup(&program, "tint");
}
