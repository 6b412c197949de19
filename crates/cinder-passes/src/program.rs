//! The state a pipeline run mutates.

use std::path::PathBuf;

use cinder_ast::{NodeKind, Parent};
use cinder_binder::SymbolKind;
use cinder_common::{InternalResult, NodeIndex, Span, SymbolId, int_fatal};
use cinder_emitter::CodegenOutput;
use cinder_types::Universe;
use indexmap::IndexMap;

use crate::builder::{BinaryBuilder, CcBuilder};
use crate::frontend::{Frontend, JsonFrontend};

pub const DEFAULT_CC: &str = "cc";

/// Settings of one compilation run.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Program descriptions to load, in order. The first one holds the entry point.
    pub inputs: Vec<PathBuf>,
    /// Where `_main.h` / `_main.c` are written; nothing is written without it.
    pub out_dir: Option<PathBuf>,
    pub cc: String,
    pub no_build: bool,
    /// `-s name=value` overrides, in command-line order.
    pub config_overrides: IndexMap<String, String>,
    pub gen_communicated_structures: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            inputs: Vec::new(),
            out_dir: None,
            cc: DEFAULT_CC.to_string(),
            no_build: false,
            config_overrides: IndexMap::new(),
            gen_communicated_structures: false,
        }
    }
}

/// A generic instantiation requested by a program description, resolved by
/// `ResolveSymbols` once the template and argument types are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInstance {
    pub name: String,
    pub template: String,
    /// Type parameter name -> argument type name.
    pub args: IndexMap<String, String>,
    pub span: Span,
}

pub struct Program {
    pub u: Universe,
    pub options: CompileOptions,
    /// Loaded modules in input order.
    pub modules: Vec<SymbolId>,
    pub entry: Option<SymbolId>,
    /// Synthesized default-format routines.
    pub default_fns: Vec<SymbolId>,
    pub instances: Vec<PendingInstance>,
    pub output: Option<CodegenOutput>,
    pub frontend: Box<dyn Frontend>,
    pub builder: Box<dyn BinaryBuilder>,
}

impl Program {
    pub fn new(options: CompileOptions) -> Self {
        Program {
            u: Universe::new(),
            options,
            modules: Vec::new(),
            entry: None,
            default_fns: Vec::new(),
            instances: Vec::new(),
            output: None,
            frontend: Box::new(JsonFrontend),
            builder: Box::new(CcBuilder),
        }
    }

    pub fn with_frontend(mut self, frontend: Box<dyn Frontend>) -> Self {
        self.frontend = frontend;
        self
    }

    pub fn with_builder(mut self, builder: Box<dyn BinaryBuilder>) -> Self {
        self.builder = builder;
        self
    }

    pub fn module_body(&self, module: SymbolId) -> InternalResult<NodeIndex> {
        match self.u.symbols.get(module).map(|s| &s.kind) {
            Some(SymbolKind::Module(info)) => Ok(info.body),
            _ => Err(int_fatal!(
                self.u.symbols.get(module).map(|s| s.span).unwrap_or_default(),
                "{:?} is not a module",
                module
            )),
        }
    }

    pub fn module_init_fn(&self, module: SymbolId) -> InternalResult<SymbolId> {
        match self.u.symbols.get(module).map(|s| &s.kind) {
            Some(SymbolKind::Module(info)) => Ok(info.init_fn),
            _ => Err(int_fatal!(Span::SYNTHETIC, "{:?} is not a module", module)),
        }
    }

    /// The module whose body declares `sym`, if it is declared at the top
    /// level of one.
    pub fn declaring_module(&self, sym: SymbolId) -> Option<SymbolId> {
        let def = self.u.symbols.get(sym)?.def;
        let Parent::Node(block) = self.u.nodes.parent(def) else {
            return None;
        };
        match self.u.nodes.parent(block) {
            Parent::Symbol(module) if self.modules.contains(&module) => Some(module),
            _ => None,
        }
    }

    /// `(module, symbol)` for every top-level definition matching `keep`.
    fn top_level_defs(
        &self,
        keep: impl Fn(&cinder_binder::Symbol) -> bool,
    ) -> InternalResult<Vec<(SymbolId, SymbolId)>> {
        let mut out = Vec::new();
        for &module in &self.modules {
            for &stmt in self.u.nodes.block_stmts(self.module_body(module)?)? {
                if let Some(NodeKind::Def { sym, .. }) = self.u.nodes.kind(stmt)
                    && self.u.symbols.get(*sym).is_some_and(&keep)
                {
                    out.push((module, *sym));
                }
            }
        }
        Ok(out)
    }

    /// Module-level variables as `(module, var)`.
    pub fn globals(&self) -> InternalResult<Vec<(SymbolId, SymbolId)>> {
        self.top_level_defs(|s| s.is_var_like())
    }

    /// Module-level functions with bodies, in declaration order.
    pub fn functions(&self) -> InternalResult<Vec<SymbolId>> {
        Ok(self
            .top_level_defs(|s| s.fn_info().is_some_and(|i| i.body.is_some()))?
            .into_iter()
            .map(|(_, sym)| sym)
            .collect())
    }

    /// Every statement block that holds code: module bodies, then the bodies
    /// of functions and methods still declared somewhere in the tree.
    pub fn code_roots(&self) -> InternalResult<Vec<(SymbolId, NodeIndex)>> {
        let mut roots = Vec::new();
        for &module in &self.modules {
            roots.push((module, self.module_body(module)?));
        }
        for (sym, symbol) in self.u.symbols.iter() {
            let Some(info) = symbol.fn_info() else {
                continue;
            };
            if info.body.is_some()
                && symbol.def.is_some()
                && !self.u.nodes.parent(symbol.def).is_detached()
            {
                roots.push((sym, info.body));
            }
        }
        Ok(roots)
    }
}
