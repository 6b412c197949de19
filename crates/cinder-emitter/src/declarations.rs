//! C declarations for resolved types.
//!
//! | Type      | prototype                               | definition                  |
//! |-----------|-----------------------------------------|-----------------------------|
//! | primitive | none                                    | none                        |
//! | enum      | none                                    | `typedef enum {...} Name;`  |
//! | aggregate | `typedef struct __Name _Name, *Name;`   | `struct __Name {...};`      |
//! | function  | fatal                                   | fatal                       |
//! | alias     | fatal                                   | fatal                       |
//!
//! Enums additionally get a string-to-enum conversion function and a
//! config-var setter built on it.

use cinder_ast::{Literal, NodeKind};
use cinder_common::{InternalResult, Span, SymbolId, TypeId, int_fatal};
use cinder_types::{ClassKind, TypeKind, Universe};

use crate::writer::CWriter;

/// Member of a union aggregate that stores the active field id.
pub const UNION_ID_FIELD: &str = "_uid";
/// Member of a union aggregate holding the shared storage.
pub const UNION_STORAGE_FIELD: &str = "_u";

pub struct DeclarationEmitter<'a> {
    u: &'a Universe,
}

impl<'a> DeclarationEmitter<'a> {
    pub fn new(u: &'a Universe) -> Self {
        DeclarationEmitter { u }
    }

    /// C spelling of `ty` in variable and parameter declarations. Value
    /// aggregates are used by value through their `_Name` typedef; reference
    /// aggregates through the `Name` pointer typedef.
    pub fn c_type(&self, ty: TypeId) -> InternalResult<String> {
        let t = self.u.types.ty(ty)?;
        let name = self.u.codegen_type_name(ty)?;
        Ok(match &t.kind {
            TypeKind::Aggregate(shape) if shape.class_kind == ClassKind::Value => format!("_{name}"),
            TypeKind::Alias(_) => {
                return Err(int_fatal!(t.span, "alias types should be removed by codegen time"));
            }
            _ => name.to_string(),
        })
    }

    /// Emit a reference to the type's bound name.
    pub fn emit_type_ref(&self, ty: TypeId, out: &mut CWriter) -> InternalResult<()> {
        out.write(&self.c_type(ty)?);
        Ok(())
    }

    /// Forward declaration, independent of the full body.
    pub fn emit_prototype(&self, ty: TypeId, out: &mut CWriter) -> InternalResult<()> {
        let t = self.u.types.ty(ty)?;
        match &t.kind {
            TypeKind::Aggregate(_) => {
                let name = self.u.codegen_type_name(ty)?;
                out.line(&format!("typedef struct __{name} _{name}, *{name};"));
                Ok(())
            }
            TypeKind::Function(_) => {
                Err(int_fatal!(t.span, "function types are not yet implemented"))
            }
            TypeKind::Alias(_) => {
                Err(int_fatal!(t.span, "alias types should be removed by codegen time"))
            }
            TypeKind::Primitive(_) | TypeKind::Enum(_) => Ok(()),
        }
    }

    pub fn emit_def(&self, ty: TypeId, out: &mut CWriter) -> InternalResult<()> {
        let t = self.u.types.ty(ty)?;
        match &t.kind {
            TypeKind::Primitive(_) => Ok(()),
            TypeKind::Enum(_) => self.emit_enum_def(ty, out),
            TypeKind::Aggregate(_) => self.emit_aggregate_def(ty, out),
            TypeKind::Function(_) => {
                Err(int_fatal!(t.span, "function types are not yet implemented"))
            }
            TypeKind::Alias(_) => {
                Err(int_fatal!(t.span, "alias types should be removed by codegen time"))
            }
        }
    }

    fn emit_enum_def(&self, ty: TypeId, out: &mut CWriter) -> InternalResult<()> {
        let name = self.u.codegen_type_name(ty)?;
        out.line("typedef enum {");
        out.increase_indent();
        for (i, constant) in self.u.enum_constants(ty)?.into_iter().enumerate() {
            if i > 0 {
                out.write(", ");
            }
            out.write(self.u.symbols.cname(constant));
            if let Some(init) = self.constant_init(constant)? {
                out.write(" = ");
                out.write(&init);
            }
        }
        out.write_line();
        out.decrease_indent();
        out.line(&format!("}} {name};"));
        out.write_line();
        Ok(())
    }

    /// Literal initializer of an enum constant, if it has one.
    fn constant_init(&self, constant: SymbolId) -> InternalResult<Option<String>> {
        let Some(symbol) = self.u.symbols.get(constant) else {
            return Ok(None);
        };
        let init = match self.u.nodes.kind(symbol.def) {
            Some(NodeKind::Def { init, .. }) if init.is_some() => *init,
            _ => return Ok(None),
        };
        match self.u.nodes.kind(init) {
            Some(NodeKind::Literal(Literal::Int(v))) => Ok(Some(v.to_string())),
            Some(NodeKind::SymRef(sym)) => Ok(Some(self.u.symbols.cname(*sym).to_string())),
            other => Err(int_fatal!(
                self.u.nodes.span(init),
                "enum constant '{}' has a non-constant initializer {:?}",
                self.u.symbols.name(constant),
                other
            )),
        }
    }

    fn emit_aggregate_def(&self, ty: TypeId, out: &mut CWriter) -> InternalResult<()> {
        let t = self.u.types.ty(ty)?;
        let Some(shape) = t.as_aggregate() else {
            return Err(int_fatal!(t.span, "{:?} is not an aggregate", ty));
        };
        let name = self.u.codegen_type_name(ty)?;
        out.line(&format!("struct __{name} {{"));
        out.increase_indent();
        let mut printed_something = false;
        if shape.class_kind == ClassKind::Reference {
            out.line("_int64 _cid;");
            printed_something = true;
        }
        let fields = self.u.data_fields(ty)?;
        if shape.is_union {
            out.line(&format!("_int64 {UNION_ID_FIELD};"));
            printed_something = true;
            if !fields.is_empty() {
                out.line("union {");
                out.increase_indent();
                self.emit_fields(&fields, out)?;
                out.decrease_indent();
                out.line(&format!("}} {UNION_STORAGE_FIELD};"));
            }
        } else if !fields.is_empty() {
            self.emit_fields(&fields, out)?;
            printed_something = true;
        }
        if !printed_something {
            out.line("int _emptyStructPlaceholder;");
        }
        out.decrease_indent();
        out.line("};");
        out.write_line();
        Ok(())
    }

    fn emit_fields(&self, fields: &[SymbolId], out: &mut CWriter) -> InternalResult<()> {
        for &field in fields {
            let symbol = self
                .u
                .symbols
                .get(field)
                .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "no field {:?}", field))?;
            let Some(field_ty) = symbol.ty else {
                return Err(int_fatal!(
                    symbol.span,
                    "field '{}' has no type at codegen time",
                    self.u.symbols.name(field)
                ));
            };
            out.line(&format!("{} {};", self.c_type(field_ty)?, symbol.cname));
        }
        Ok(())
    }

    // =========================================================================
    // Enum conversion and config-var routines
    // =========================================================================

    fn require_enum(&self, ty: TypeId) -> InternalResult<&str> {
        let t = self.u.types.ty(ty)?;
        if t.as_enum().is_none() {
            return Err(int_fatal!(t.span, "{} type has no string conversion", t.variant()));
        }
        self.u.codegen_type_name(ty)
    }

    fn string_to_enum_signature(&self, ty: TypeId) -> InternalResult<String> {
        let name = self.require_enum(ty)?;
        Ok(format!("int _convert_string_to_enum{name}(char* inputString, {name}* val)"))
    }

    fn config_setter_signature(&self, ty: TypeId) -> InternalResult<String> {
        let name = self.require_enum(ty)?;
        Ok(format!("int setInCommandLine{name}(char* varName, {name}* value, char* moduleName)"))
    }

    pub fn emit_string_to_enum_prototype(&self, ty: TypeId, out: &mut CWriter) -> InternalResult<()> {
        out.line(&format!("{};", self.string_to_enum_signature(ty)?));
        Ok(())
    }

    pub fn emit_config_setter_prototype(&self, ty: TypeId, out: &mut CWriter) -> InternalResult<()> {
        out.line(&format!("{};", self.config_setter_signature(ty)?));
        Ok(())
    }

    /// `_convert_string_to_enumName`: compares the input against every
    /// constant name in declaration order; returns 0 when nothing matches.
    pub fn emit_string_to_enum(&self, ty: TypeId, out: &mut CWriter) -> InternalResult<()> {
        out.line(&format!("{} {{", self.string_to_enum_signature(ty)?));
        out.increase_indent();
        for constant in self.u.enum_constants(ty)? {
            let name = self.u.symbols.name(constant);
            out.write("if (strcmp(inputString, ");
            out.write_string_literal(name);
            out.line(") == 0) {");
            out.increase_indent();
            out.line(&format!("*val = {};", self.u.symbols.cname(constant)));
            out.decrease_indent();
            out.write("} else ");
        }
        out.line("{");
        out.increase_indent();
        out.line("return 0;");
        out.decrease_indent();
        out.line("}");
        out.line("return 1;");
        out.decrease_indent();
        out.line("}");
        out.write_line();
        Ok(())
    }

    /// `setInCommandLineName`: looks up an override for `varName` in
    /// `moduleName` and converts it. Returns whether the variable was set.
    pub fn emit_config_var_routines(&self, ty: TypeId, out: &mut CWriter) -> InternalResult<()> {
        let name = self.require_enum(ty)?;
        let type_name = self.u.type_name(ty);
        out.line(&format!("{} {{", self.config_setter_signature(ty)?));
        out.increase_indent();
        out.line("int varSet = 0;");
        out.line("char* setValue = lookupSetValue(varName, moduleName);");
        out.line("if (setValue) {");
        out.increase_indent();
        out.line(&format!("int validEnum = _convert_string_to_enum{name}(setValue, value);"));
        out.line("if (validEnum) {");
        out.increase_indent();
        out.line("varSet = 1;");
        out.decrease_indent();
        out.line("} else {");
        out.increase_indent();
        out.write("char* message = _glom_strings(7, \"\\\"\", setValue, ");
        out.write_string_literal("\" is not a valid value for a config var \"");
        out.write(", varName, ");
        out.write_string_literal("\" in module \"");
        out.write(", moduleName, ");
        out.write_string_literal(&format!("\" of type {type_name}"));
        out.line(");");
        out.line("printError(message);");
        out.decrease_indent();
        out.line("}");
        out.decrease_indent();
        out.line("}");
        out.line("return varSet;");
        out.decrease_indent();
        out.line("}");
        out.write_line();
        Ok(())
    }
}
