//! Program-description front end.
//!
//! Parsing source text is the job of an external front end. It hands over one
//! JSON document per module, which [`JsonFrontend`] turns into symbols, types
//! and tree nodes:
//!
//! ```json
//! {
//!   "module": "M",
//!   "types": [
//!     { "kind": "enum", "name": "Color", "constants": [{ "name": "red" }, { "name": "green", "init": 3 }] },
//!     { "kind": "record", "name": "Point", "fields": [{ "name": "x", "type": "int" }] }
//!   ],
//!   "vars": [{ "name": "tint", "type": "Color", "config": true }],
//!   "functions": [{ "name": "main", "params": [], "body": [{ "call": "show", "args": [{ "name": "tint" }] }] }]
//! }
//! ```
//!
//! Type names that are not yet known when they are used become unbound alias
//! types wrapping the name; `ResolveSymbols` replaces them.

use cinder_ast::{Callee, NodeIndex, NodeKind, Parent};
use cinder_binder::{FnInfo, Intent, ModuleInfo, SymbolKind, VarFlags};
use cinder_common::{Diagnostic, FileId, InternalResult, Span, SymbolId, TypeId};
use cinder_types::{ClassKind, Universe};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use tracing::debug;

use crate::error::{DiagnosticSink, PassError};
use crate::program::PendingInstance;

// =============================================================================
// Description format
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDesc {
    pub module: String,
    #[serde(default)]
    pub types: Vec<TypeDesc>,
    #[serde(default)]
    pub vars: Vec<VarDesc>,
    #[serde(default)]
    pub functions: Vec<FunctionDesc>,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDesc {
    Enum {
        name: String,
        constants: Vec<ConstantDesc>,
        #[serde(default)]
        line: Option<u32>,
    },
    Class(AggregateDesc),
    Record(AggregateDesc),
    Alias {
        name: String,
        target: String,
        #[serde(default)]
        line: Option<u32>,
    },
    Instance {
        name: String,
        template: String,
        #[serde(default)]
        args: IndexMap<String, String>,
        #[serde(default)]
        line: Option<u32>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstantDesc {
    pub name: String,
    #[serde(default)]
    pub init: Option<i64>,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregateDesc {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDesc>,
    #[serde(default)]
    pub methods: Vec<FunctionDesc>,
    #[serde(default)]
    pub inherits: Vec<String>,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub union: bool,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// A type-level field; carries no data.
    #[serde(default)]
    pub type_variable: bool,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDesc {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDesc>,
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub body: Vec<StmtDesc>,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VarDesc {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub init: Option<ExprDesc>,
    #[serde(default)]
    pub config: bool,
    #[serde(rename = "const", default)]
    pub is_const: bool,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExprDesc {
    Int(i64),
    Bool(bool),
    Str(String),
    Name {
        name: String,
    },
    Member {
        base: Box<ExprDesc>,
        field: String,
    },
    Call {
        call: String,
        #[serde(default)]
        args: Vec<ExprDesc>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StmtDesc {
    Var {
        var: VarDesc,
    },
    Expr(ExprDesc),
    Return {
        #[serde(rename = "return")]
        value: Option<ExprDesc>,
    },
}

// =============================================================================
// Loading
// =============================================================================

/// What loading one description added to the program.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub module: SymbolId,
    pub instances: Vec<PendingInstance>,
}

/// Turns one program description into tree, symbols and types.
pub trait Frontend {
    fn load(&self, u: &mut Universe, file: FileId, text: &str) -> Result<LoadedModule, PassError>;
}

/// The JSON program-description front end.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFrontend;

impl Frontend for JsonFrontend {
    fn load(&self, u: &mut Universe, file: FileId, text: &str) -> Result<LoadedModule, PassError> {
        let desc: ModuleDesc = serde_json::from_str(text).map_err(|e| {
            PassError::user(Diagnostic::error(
                Span::new(file, e.line() as u32, e.column() as u32),
                format!("invalid program description: {e}"),
            ))
        })?;
        let mut loader = Loader {
            u,
            file,
            diags: DiagnosticSink::new(),
            type_refs: FxHashMap::default(),
            instances: Vec::new(),
            stmts: Vec::new(),
        };
        let module = loader.module(&desc)?;
        let Loader {
            diags, instances, ..
        } = loader;
        diags.finish()?;
        Ok(LoadedModule { module, instances })
    }
}

struct Loader<'a> {
    u: &'a mut Universe,
    file: FileId,
    diags: DiagnosticSink,
    /// Names used before they were declared, each wrapped in an alias.
    type_refs: FxHashMap<String, TypeId>,
    instances: Vec<PendingInstance>,
    /// Top-level statements of the module being loaded.
    stmts: Vec<NodeIndex>,
}

/// Type parameters of the aggregate being loaded, by name.
type TypeParams = IndexMap<String, TypeId>;

impl Loader<'_> {
    fn span(&self, line: Option<u32>) -> Span {
        Span::new(self.file, line.unwrap_or(0), 0)
    }

    /// Define in the root scope, reporting a clash with an existing name.
    fn define(&mut self, sym: SymbolId) {
        if let Err(existing) = self.u.symbols.define(sym) {
            let (span, prev) = (
                self.u.symbols.get(sym).map(|s| s.span).unwrap_or_default(),
                self.u.symbols.get(existing).map(|s| s.span).unwrap_or_default(),
            );
            self.diags.push(
                Diagnostic::error(
                    span,
                    format!("'{}' is already defined", self.u.symbols.name(sym)),
                )
                .with_related(prev, "previous definition"),
            );
        }
    }

    fn module(&mut self, desc: &ModuleDesc) -> InternalResult<SymbolId> {
        let span = self.span(desc.line);
        let init_fn = self.u.symbols.alloc_with_cname(
            &format!("__init_{}", desc.module),
            format!("__init_{}", desc.module),
            SymbolKind::Fn(FnInfo::default()),
            span,
        );
        let module = self.u.symbols.alloc(
            &desc.module,
            SymbolKind::Module(ModuleInfo {
                body: NodeIndex::NONE,
                init_fn,
            }),
            span,
        );
        self.define(module);

        for ty in &desc.types {
            self.type_decl(ty)?;
        }
        for var in &desc.vars {
            let def = self.var(var, &TypeParams::new())?;
            if let Some(sym) = self.u.nodes.kind(def).and_then(NodeKind::def_sym) {
                self.define(sym);
            }
            self.stmts.push(def);
        }
        for function in &desc.functions {
            let (sym, def) = self.function(function)?;
            self.define(sym);
            self.stmts.push(def);
        }

        let stmts = std::mem::take(&mut self.stmts);
        let body = self.u.nodes.builder(span).block(stmts)?;
        self.u.nodes.attach(body, Parent::Symbol(module))?;
        if let Some(SymbolKind::Module(info)) = self.u.symbols.get_mut(module).map(|s| &mut s.kind) {
            info.body = body;
        }
        debug!(
            module = %desc.module,
            types = desc.types.len(),
            vars = desc.vars.len(),
            functions = desc.functions.len(),
            "loaded module"
        );
        Ok(module)
    }

    /// Type for a written type name: a type parameter in scope, a type already
    /// in the root scope, or an alias wrapping the name for later resolution.
    fn type_ref(&mut self, name: &str, line: Option<u32>, params: &TypeParams) -> InternalResult<TypeId> {
        if let Some(&placeholder) = params.get(name) {
            return Ok(placeholder);
        }
        if let Some(ty) = self
            .u
            .symbols
            .lookup(name)
            .and_then(|sym| self.u.symbols.get(sym))
            .filter(|s| s.is_type())
            .and_then(|s| s.ty)
        {
            return Ok(ty);
        }
        if let Some(&alias) = self.type_refs.get(name) {
            return Ok(alias);
        }
        let span = self.span(line);
        let atom = self.u.symbols.intern(name);
        let type_expr = self.u.nodes.builder(span).name(atom)?;
        let alias = self.u.new_alias(type_expr, span)?;
        self.type_refs.insert(name.to_string(), alias);
        Ok(alias)
    }

    /// A `Def` of a type symbol, placed in the module body.
    fn declare_type(&mut self, ty: TypeId, name: &str, span: Span) -> InternalResult<()> {
        let sym = self.u.bind(ty, name, name)?;
        self.define(sym);
        let def = self
            .u
            .nodes
            .builder(span)
            .def(&mut self.u.symbols, sym, NodeIndex::NONE, NodeIndex::NONE)?;
        self.stmts.push(def);
        Ok(())
    }

    fn type_decl(&mut self, desc: &TypeDesc) -> InternalResult<()> {
        match desc {
            TypeDesc::Enum {
                name,
                constants,
                line,
            } => self.enum_type(name, constants, *line),
            TypeDesc::Class(agg) => self.aggregate_type(agg, ClassKind::Reference),
            TypeDesc::Record(agg) => self.aggregate_type(agg, ClassKind::Value),
            TypeDesc::Alias { name, target, line } => {
                let span = self.span(*line);
                let atom = self.u.symbols.intern(target);
                let type_expr = self.u.nodes.builder(span).name(atom)?;
                let alias = self.u.new_alias(type_expr, span)?;
                self.declare_type(alias, name, span)
            }
            TypeDesc::Instance {
                name,
                template,
                args,
                line,
            } => {
                self.instances.push(PendingInstance {
                    name: name.clone(),
                    template: template.clone(),
                    args: args.clone(),
                    span: self.span(*line),
                });
                Ok(())
            }
        }
    }

    fn enum_type(&mut self, name: &str, constants: &[ConstantDesc], line: Option<u32>) -> InternalResult<()> {
        let span = self.span(line);
        if constants.is_empty() {
            self.diags
                .push(Diagnostic::error(span, format!("enum '{name}' has no constants")));
            return Ok(());
        }
        let mut seen = FxHashSet::default();
        for constant in constants {
            if !seen.insert(constant.name.as_str()) {
                let cspan = self.span(constant.line.or(line));
                self.diags.push(Diagnostic::error(
                    cspan,
                    format!("duplicate enum constant '{}' in '{name}'", constant.name),
                ));
                return Ok(());
            }
        }
        let mut defs = Vec::with_capacity(constants.len());
        let mut syms = Vec::with_capacity(constants.len());
        for constant in constants {
            let cspan = self.span(constant.line.or(line));
            let sym = self.u.symbols.alloc(&constant.name, SymbolKind::EnumConst, cspan);
            let mut b = self.u.nodes.builder(cspan);
            let init = match constant.init {
                Some(value) => b.int(value)?,
                None => NodeIndex::NONE,
            };
            defs.push(b.def(&mut self.u.symbols, sym, NodeIndex::NONE, init)?);
            syms.push(sym);
        }
        let ty = self.u.new_enum(defs, span)?;
        self.declare_type(ty, name, span)?;
        for sym in syms {
            self.define(sym);
        }
        Ok(())
    }

    fn aggregate_type(&mut self, desc: &AggregateDesc, class_kind: ClassKind) -> InternalResult<()> {
        let span = self.span(desc.line);
        if desc.union && class_kind != ClassKind::Value {
            self.diags.push(Diagnostic::error(
                span,
                format!("'{}' cannot be a union: only records can be unions", desc.name),
            ));
            return Ok(());
        }
        let ty = self.u.new_aggregate(class_kind, span);

        let mut params = TypeParams::new();
        let mut decls = Vec::new();
        for param in &desc.type_params {
            let placeholder = self.u.new_alias(NodeIndex::NONE, span)?;
            params.insert(param.clone(), placeholder);
            let sym = self
                .u
                .symbols
                .new_var(param, VarFlags::TYPE_VARIABLE, Some(placeholder), span);
            decls.push(
                self.u
                    .nodes
                    .builder(span)
                    .def(&mut self.u.symbols, sym, NodeIndex::NONE, NodeIndex::NONE)?,
            );
        }
        for field in &desc.fields {
            let fspan = self.span(field.line.or(desc.line));
            let field_ty = self.type_ref(&field.ty, field.line.or(desc.line), &params)?;
            let flags = if field.type_variable {
                VarFlags::TYPE_VARIABLE
            } else {
                VarFlags::empty()
            };
            let sym = self.u.symbols.new_var(&field.name, flags, Some(field_ty), fspan);
            decls.push(
                self.u
                    .nodes
                    .builder(fspan)
                    .def(&mut self.u.symbols, sym, NodeIndex::NONE, NodeIndex::NONE)?,
            );
        }
        for method in &desc.methods {
            let (_, def) = self.function_in(method, &params)?;
            decls.push(def);
        }
        self.u.add_declarations(ty, decls, None)?;

        let mut inherits = Vec::with_capacity(desc.inherits.len());
        for parent in &desc.inherits {
            let atom = self.u.symbols.intern(parent);
            let node = self.u.nodes.builder(span).name(atom)?;
            self.u.nodes.attach(node, Parent::Type(ty))?;
            inherits.push(node);
        }
        if let Some(shape) = self.u.types.ty_mut(ty)?.as_aggregate_mut() {
            shape.inherits = inherits;
            shape.is_pattern = !desc.type_params.is_empty();
            shape.is_union = desc.union;
        }
        self.declare_type(ty, &desc.name, span)
    }

    fn var(&mut self, desc: &VarDesc, params: &TypeParams) -> InternalResult<NodeIndex> {
        let span = self.span(desc.line);
        let ty = match &desc.ty {
            Some(name) => Some(self.type_ref(name, desc.line, params)?),
            None => None,
        };
        let mut flags = VarFlags::empty();
        flags.set(VarFlags::CONFIG, desc.config);
        flags.set(VarFlags::CONST, desc.is_const);
        let sym = self.u.symbols.new_var(&desc.name, flags, ty, span);
        let init = match &desc.init {
            Some(expr) => self.expr(expr, span)?,
            None => NodeIndex::NONE,
        };
        self.u
            .nodes
            .builder(span)
            .def(&mut self.u.symbols, sym, NodeIndex::NONE, init)
    }

    fn function(&mut self, desc: &FunctionDesc) -> InternalResult<(SymbolId, NodeIndex)> {
        self.function_in(desc, &TypeParams::new())
    }

    fn function_in(&mut self, desc: &FunctionDesc, params: &TypeParams) -> InternalResult<(SymbolId, NodeIndex)> {
        let span = self.span(desc.line);
        let mut formals = Vec::with_capacity(desc.params.len());
        for param in &desc.params {
            let pspan = self.span(param.line.or(desc.line));
            let intent = Intent::parse(param.intent.as_deref().unwrap_or(""), pspan)?;
            let ty = self.type_ref(&param.ty, param.line.or(desc.line), params)?;
            let sym = self.u.symbols.alloc(&param.name, SymbolKind::Arg { intent }, pspan);
            if let Some(symbol) = self.u.symbols.get_mut(sym) {
                symbol.ty = Some(ty);
            }
            formals.push(sym);
        }
        let ret = match &desc.returns {
            Some(name) => Some(self.type_ref(name, desc.line, params)?),
            None => None,
        };
        let mut stmts = Vec::with_capacity(desc.body.len());
        for stmt in &desc.body {
            stmts.push(self.stmt(stmt, span, params)?);
        }
        let body = self.u.nodes.builder(span).block(stmts)?;
        let sym = self.u.symbols.alloc(
            &desc.name,
            SymbolKind::Fn(FnInfo {
                formals,
                body,
                ret,
                ..FnInfo::default()
            }),
            span,
        );
        self.u.nodes.attach(body, Parent::Symbol(sym))?;
        let def = self
            .u
            .nodes
            .builder(span)
            .def(&mut self.u.symbols, sym, NodeIndex::NONE, NodeIndex::NONE)?;
        Ok((sym, def))
    }

    fn stmt(&mut self, desc: &StmtDesc, span: Span, params: &TypeParams) -> InternalResult<NodeIndex> {
        match desc {
            StmtDesc::Var { var } => self.var(var, params),
            StmtDesc::Expr(expr) => {
                let e = self.expr(expr, span)?;
                self.u.nodes.builder(span).expr_stmt(e)
            }
            StmtDesc::Return { value } => {
                let v = match value {
                    Some(expr) => self.expr(expr, span)?,
                    None => NodeIndex::NONE,
                };
                self.u.nodes.builder(span).ret(v)
            }
        }
    }

    fn expr(&mut self, desc: &ExprDesc, span: Span) -> InternalResult<NodeIndex> {
        match desc {
            ExprDesc::Int(value) => self.u.nodes.builder(span).int(*value),
            ExprDesc::Bool(value) => self.u.nodes.builder(span).boolean(*value),
            ExprDesc::Str(value) => self.u.nodes.builder(span).str(value),
            ExprDesc::Name { name } => {
                let atom = self.u.symbols.intern(name);
                self.u.nodes.builder(span).name(atom)
            }
            ExprDesc::Member { base, field } => {
                let base = self.expr(base, span)?;
                let atom = self.u.symbols.intern(field);
                self.u.nodes.builder(span).member(base, atom)
            }
            ExprDesc::Call { call, args } => {
                let mut arg_nodes = Vec::with_capacity(args.len());
                for arg in args {
                    arg_nodes.push(self.expr(arg, span)?);
                }
                let callee = Callee::Name(self.u.symbols.intern(call));
                self.u.nodes.add(
                    NodeKind::Call {
                        callee,
                        args: arg_nodes,
                    },
                    span,
                )
            }
        }
    }
}
