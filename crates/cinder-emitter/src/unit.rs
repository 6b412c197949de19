//! The whole-program translation unit: `_main.h` and `_main.c`.

use std::path::Path;

use cinder_ast::NodeKind;
use cinder_common::{InternalResult, Span, SymbolId, TypeId, int_fatal};
use cinder_types::{ClassKind, Universe};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::c_code::CCodeEmitter;
use crate::declarations::DeclarationEmitter;
use crate::writer::{CWriter, c_string_literal};

pub const HEADER_FILE: &str = "_main.h";
pub const SOURCE_FILE: &str = "_main.c";
pub const RUNTIME_HEADER: &str = "cinder_runtime.h";

/// Generated C text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodegenOutput {
    pub header: String,
    pub source: String,
}

impl CodegenOutput {
    /// Write `_main.h` and `_main.c` into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(HEADER_FILE), &self.header)?;
        std::fs::write(dir.join(SOURCE_FILE), &self.source)?;
        info!(dir = %dir.display(), "wrote translation unit");
        Ok(())
    }
}

/// A module's top-level statements and the function that runs them.
#[derive(Clone, Debug)]
pub struct ModuleUnit {
    pub module: SymbolId,
    pub init_fn: SymbolId,
    /// Top-level statements of the module, in order.
    pub stmts: Vec<cinder_ast::NodeIndex>,
}

/// Everything the translation unit is built from.
#[derive(Clone, Debug, Default)]
pub struct UnitContents {
    /// Enum and aggregate types to declare.
    pub types: Vec<TypeId>,
    pub modules: Vec<ModuleUnit>,
    /// Functions with bodies, in emission order.
    pub functions: Vec<SymbolId>,
    /// Generated default-format routines; these fill the dispatch table.
    pub default_fns: Vec<SymbolId>,
    /// `(config var, module)` pairs.
    pub config_vars: Vec<(SymbolId, SymbolId)>,
    pub entry: SymbolId,
    pub gen_communicated_structures: bool,
}

pub struct UnitEmitter<'a> {
    u: &'a Universe,
    decls: DeclarationEmitter<'a>,
    code: CCodeEmitter<'a>,
}

impl<'a> UnitEmitter<'a> {
    pub fn new(u: &'a Universe) -> Self {
        UnitEmitter {
            u,
            decls: DeclarationEmitter::new(u),
            code: CCodeEmitter::new(u),
        }
    }

    pub fn emit(&self, contents: &UnitContents) -> InternalResult<CodegenOutput> {
        let types = self.definition_order(&contents.types)?;
        let header = self.header(contents, &types)?;
        let source = self.source(contents, &types)?;
        debug!(
            types = types.len(),
            functions = contents.functions.len(),
            header_bytes = header.len(),
            source_bytes = source.len(),
            "emitted translation unit"
        );
        Ok(CodegenOutput { header, source })
    }

    /// Enums first, then aggregates ordered so that a value aggregate is
    /// defined before any aggregate embedding it by value.
    fn definition_order(&self, types: &[TypeId]) -> InternalResult<Vec<TypeId>> {
        let wanted: FxHashSet<TypeId> = types.iter().copied().collect();
        let mut order: Vec<TypeId> = Vec::with_capacity(types.len());
        for &ty in types {
            if self.u.types.ty(ty)?.as_enum().is_some() {
                order.push(ty);
            }
        }
        let mut done = FxHashSet::default();
        let mut visiting = FxHashSet::default();
        for &ty in types {
            if self.u.types.ty(ty)?.as_aggregate().is_some() {
                self.visit_aggregate(ty, &wanted, &mut done, &mut visiting, &mut order)?;
            }
        }
        Ok(order)
    }

    fn visit_aggregate(
        &self,
        ty: TypeId,
        wanted: &FxHashSet<TypeId>,
        done: &mut FxHashSet<TypeId>,
        visiting: &mut FxHashSet<TypeId>,
        order: &mut Vec<TypeId>,
    ) -> InternalResult<()> {
        if done.contains(&ty) {
            return Ok(());
        }
        let span = self.u.types.ty(ty)?.span;
        if !visiting.insert(ty) {
            return Err(int_fatal!(
                span,
                "record '{}' contains itself by value",
                self.u.type_name(ty)
            ));
        }
        for field in self.u.data_fields(ty)? {
            let Some(field_ty) = self.u.symbols.get(field).and_then(|s| s.ty) else {
                continue;
            };
            let embedded = self
                .u
                .types
                .get(field_ty)
                .and_then(|t| t.as_aggregate())
                .is_some_and(|a| a.class_kind == ClassKind::Value);
            if embedded && wanted.contains(&field_ty) {
                self.visit_aggregate(field_ty, wanted, done, visiting, order)?;
            }
        }
        visiting.remove(&ty);
        done.insert(ty);
        order.push(ty);
        Ok(())
    }

    fn enums(&self, types: &[TypeId]) -> impl Iterator<Item = TypeId> {
        let u = self.u;
        types
            .iter()
            .copied()
            .filter(move |&ty| u.types.get(ty).is_some_and(|t| t.as_enum().is_some()))
    }

    fn aggregates(&self, types: &[TypeId]) -> impl Iterator<Item = TypeId> {
        let u = self.u;
        types
            .iter()
            .copied()
            .filter(move |&ty| u.types.get(ty).is_some_and(|t| t.as_aggregate().is_some()))
    }

    /// Variable definitions at the top level of a module.
    fn globals(&self, module: &ModuleUnit) -> Vec<(SymbolId, cinder_ast::NodeIndex)> {
        module
            .stmts
            .iter()
            .filter_map(|&stmt| match self.u.nodes.kind(stmt) {
                Some(NodeKind::Def { sym, init, .. })
                    if self.u.symbols.get(*sym).is_some_and(|s| s.is_var_like()) =>
                {
                    Some((*sym, *init))
                }
                _ => None,
            })
            .collect()
    }

    fn global_decl(&self, sym: SymbolId) -> InternalResult<String> {
        let symbol = self
            .u
            .symbols
            .get(sym)
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "no global {:?}", sym))?;
        let ty = symbol.ty.ok_or_else(|| {
            int_fatal!(
                symbol.span,
                "global '{}' has no type at codegen time",
                self.u.symbols.name(sym)
            )
        })?;
        Ok(format!("{} {}", self.decls.c_type(ty)?, symbol.cname))
    }

    // =========================================================================
    // Header
    // =========================================================================

    fn header(&self, contents: &UnitContents, types: &[TypeId]) -> InternalResult<String> {
        let mut out = CWriter::new();
        out.line("#ifndef _CINDER_MAIN_H_");
        out.line("#define _CINDER_MAIN_H_");
        out.write_line();
        out.line(&format!("#include \"{RUNTIME_HEADER}\""));
        out.write_line();

        out.line("/*** Class Prototypes ***/");
        out.write_line();
        for ty in self.aggregates(types) {
            self.decls.emit_prototype(ty, &mut out)?;
        }
        out.write_line();

        out.line("/*** Enum Definitions ***/");
        out.write_line();
        for ty in self.enums(types) {
            self.decls.emit_def(ty, &mut out)?;
        }

        out.line("/*** Class Definitions ***/");
        out.write_line();
        for ty in self.aggregates(types) {
            self.decls.emit_def(ty, &mut out)?;
        }

        out.line("/*** Function Prototypes ***/");
        out.write_line();
        for ty in self.enums(types) {
            self.decls.emit_string_to_enum_prototype(ty, &mut out)?;
            self.decls.emit_config_setter_prototype(ty, &mut out)?;
        }
        for module in &contents.modules {
            self.code.emit_fn_prototype(module.init_fn, &mut out)?;
        }
        for &f in &contents.functions {
            self.code.emit_fn_prototype(f, &mut out)?;
        }
        out.write_line();

        out.line("/*** Global Variables ***/");
        out.write_line();
        for module in &contents.modules {
            for (sym, _) in self.globals(module) {
                out.line(&format!("extern {};", self.global_decl(sym)?));
            }
        }
        out.write_line();

        out.line("extern cinder_fn_p cinder_ftable[];");
        out.line("extern int64_t cinder_gen_main(cinder_main_argument* const _arg);");
        out.line("extern void CreateConfigVarTable(void);");
        if contents.gen_communicated_structures {
            out.line("extern cinderType cinder_getFieldType(int typeNum, int fieldNum);");
            out.line("extern size_t cinder_getFieldOffset(int typeNum, int fieldNum);");
            out.line("extern size_t cinder_getFieldSize(int typeNum);");
            out.line("extern const int cinder_max_fields_per_type;");
        }
        out.write_line();
        out.line("#endif");
        Ok(out.finish())
    }

    // =========================================================================
    // Source
    // =========================================================================

    fn source(&self, contents: &UnitContents, types: &[TypeId]) -> InternalResult<String> {
        let mut out = CWriter::new();
        out.line(&format!("#include \"{HEADER_FILE}\""));
        out.write_line();

        for module in &contents.modules {
            for (sym, _) in self.globals(module) {
                out.line(&format!("{};", self.global_decl(sym)?));
            }
        }
        out.write_line();

        for ty in self.enums(types) {
            self.decls.emit_string_to_enum(ty, &mut out)?;
            self.decls.emit_config_var_routines(ty, &mut out)?;
        }

        for module in &contents.modules {
            self.emit_module_init(module, &mut out)?;
        }
        for &f in &contents.functions {
            self.code.emit_fn(f, &mut out)?;
        }

        out.line("void CreateConfigVarTable(void) {");
        out.increase_indent();
        out.line("initConfigVarTable();");
        for &(var, module) in &contents.config_vars {
            let ty = self.u.symbols.get(var).and_then(|s| s.ty).ok_or_else(|| {
                int_fatal!(
                    Span::SYNTHETIC,
                    "config var '{}' has no type",
                    self.u.symbols.name(var)
                )
            })?;
            out.line(&format!(
                "installConfigVar({}, {}, {});",
                c_string_literal(self.u.symbols.name(var)),
                c_string_literal(self.u.type_name(ty)),
                c_string_literal(self.u.symbols.name(module))
            ));
        }
        out.decrease_indent();
        out.line("}");
        out.write_line();

        out.line("cinder_fn_p cinder_ftable[] = {");
        out.increase_indent();
        for &f in &contents.default_fns {
            out.line(&format!("(cinder_fn_p){},", self.u.symbols.cname(f)));
        }
        out.line("NULL");
        out.decrease_indent();
        out.line("};");
        out.write_line();

        self.emit_gen_main(contents.entry, &mut out)?;

        if contents.gen_communicated_structures {
            self.emit_type_structure(types, &mut out)?;
        }
        Ok(out.finish())
    }

    /// The module initializer assigns every global in order. A config var
    /// keeps a command-line override when one was given.
    fn emit_module_init(&self, module: &ModuleUnit, out: &mut CWriter) -> InternalResult<()> {
        let module_name = self.u.symbols.name(module.module);
        out.line(&format!("{} {{", self.code.fn_signature(module.init_fn)?));
        out.increase_indent();
        for &stmt in &module.stmts {
            let Some(kind) = self.u.nodes.kind(stmt) else {
                continue;
            };
            match kind {
                NodeKind::Def { sym, init, .. } => {
                    let Some(symbol) = self.u.symbols.get(*sym) else {
                        continue;
                    };
                    if !symbol.is_var_like() {
                        continue;
                    }
                    let ty = symbol.ty.ok_or_else(|| {
                        int_fatal!(symbol.span, "global '{}' has no type", self.u.symbols.name(*sym))
                    })?;
                    let value = if init.is_some() {
                        Some(self.code.expr(*init)?)
                    } else {
                        self.code.default_value(ty)?
                    };
                    let Some(value) = value else {
                        continue;
                    };
                    let assign = format!("{} = {value};", symbol.cname);
                    if symbol.is_config() {
                        let setter = format!("setInCommandLine{}", self.u.codegen_type_name(ty)?);
                        out.line(&format!(
                            "if (!{setter}({}, &{}, {})) {{",
                            c_string_literal(self.u.symbols.name(*sym)),
                            symbol.cname,
                            c_string_literal(module_name)
                        ));
                        out.increase_indent();
                        out.line(&assign);
                        out.decrease_indent();
                        out.line("}");
                    } else {
                        out.line(&assign);
                    }
                }
                _ => self.code.emit_free_stmt(stmt, out)?,
            }
        }
        out.decrease_indent();
        out.line("}");
        out.write_line();
        Ok(())
    }

    fn emit_gen_main(&self, entry: SymbolId, out: &mut CWriter) -> InternalResult<()> {
        let symbol = self
            .u
            .symbols
            .get(entry)
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "program has no entry point"))?;
        let returns_int = symbol
            .fn_info()
            .and_then(|i| i.ret)
            .is_some_and(|ret| ret == self.u.builtins.int64());
        out.line("int64_t cinder_gen_main(cinder_main_argument* const _arg) {");
        out.increase_indent();
        if returns_int {
            out.line(&format!("return {}();", symbol.cname));
        } else {
            out.line(&format!("{}();", symbol.cname));
            out.line("return 0;");
        }
        out.decrease_indent();
        out.line("}");
        out.write_line();
        Ok(())
    }

    /// Field type/offset/size tables for the communication layer. Type
    /// numbers are positions among the emitted aggregates.
    fn emit_type_structure(&self, types: &[TypeId], out: &mut CWriter) -> InternalResult<()> {
        let aggregates: Vec<TypeId> = self.aggregates(types).collect();
        let mut rows = Vec::with_capacity(aggregates.len());
        let mut max_fields = 0;
        for &ty in &aggregates {
            let fields = self.u.data_fields(ty)?;
            max_fields = max_fields.max(fields.len());
            rows.push((ty, fields));
        }
        let width = max_fields.max(1);

        out.line("typedef enum {");
        out.increase_indent();
        let mut ids: Vec<String> = Vec::new();
        for (_, fields) in &rows {
            for &field in fields {
                if let Some(field_ty) = self.u.symbols.get(field).and_then(|s| s.ty) {
                    let id = format!("CINDER_TYPE_{}", self.u.codegen_type_name(field_ty)?);
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        ids.push("CINDER_TYPE_DONE".to_string());
        for (i, id) in ids.iter().enumerate() {
            if i + 1 < ids.len() {
                out.line(&format!("{id},"));
            } else {
                out.line(id);
            }
        }
        out.decrease_indent();
        out.line("} _type_structure_id;");
        out.write_line();

        out.line(&format!("const int cinder_max_fields_per_type = {width};"));
        out.write_line();

        out.line(&format!("static const cinderType cinder_structType[][{width}] = {{"));
        out.increase_indent();
        for (_, fields) in &rows {
            let mut cells = Vec::with_capacity(width);
            for &field in fields {
                let field_ty = self.u.symbols.get(field).and_then(|s| s.ty);
                cells.push(match field_ty {
                    Some(ft) => format!("CINDER_TYPE_{}", self.u.codegen_type_name(ft)?),
                    None => "CINDER_TYPE_DONE".to_string(),
                });
            }
            while cells.len() < width {
                cells.push("CINDER_TYPE_DONE".to_string());
            }
            out.line(&format!("{{{}}},", cells.join(", ")));
        }
        out.decrease_indent();
        out.line("};");
        out.write_line();

        out.line(&format!("static const size_t cinder_structOffset[][{width}] = {{"));
        out.increase_indent();
        for (ty, fields) in &rows {
            let name = self.u.codegen_type_name(*ty)?;
            let mut cells = Vec::with_capacity(width);
            for &field in fields {
                cells.push(format!("offsetof(struct __{name}, {})", self.u.symbols.cname(field)));
            }
            while cells.len() < width {
                cells.push("0".to_string());
            }
            out.line(&format!("{{{}}},", cells.join(", ")));
        }
        out.decrease_indent();
        out.line("};");
        out.write_line();

        out.line("static const size_t cinder_structSize[] = {");
        out.increase_indent();
        for (ty, _) in &rows {
            out.line(&format!("sizeof(struct __{}),", self.u.codegen_type_name(*ty)?));
        }
        out.line("0");
        out.decrease_indent();
        out.line("};");
        out.write_line();

        out.line("cinderType cinder_getFieldType(int typeNum, int fieldNum) {");
        out.line("  return cinder_structType[typeNum][fieldNum];");
        out.line("}");
        out.write_line();
        out.line("size_t cinder_getFieldOffset(int typeNum, int fieldNum) {");
        out.line("  return cinder_structOffset[typeNum][fieldNum];");
        out.line("}");
        out.write_line();
        out.line("size_t cinder_getFieldSize(int typeNum) {");
        out.line("  return cinder_structSize[typeNum];");
        out.line("}");
        Ok(())
    }
}
