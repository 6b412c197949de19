use std::fmt::Write;

use cinder_ast::NodeKind;
use cinder_common::TypeId;

use crate::types::{ClassKind, TypeKind};
use crate::universe::Universe;

/// Human-readable rendering of types for dumps and messages.
pub struct TypeFormatter<'a> {
    universe: &'a Universe,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(universe: &'a Universe) -> Self {
        TypeFormatter { universe }
    }

    /// The type's source name.
    pub fn format(&self, ty: TypeId) -> String {
        self.universe.type_name(ty).to_string()
    }

    /// One-line definition, e.g. `enum Color = red | green` or
    /// `record Point(x, y)`.
    pub fn format_def(&self, ty: TypeId) -> String {
        let u = self.universe;
        let name = u.type_name(ty);
        let Some(t) = u.types.get(ty) else {
            return format!("<missing {ty:?}>");
        };
        match &t.kind {
            TypeKind::Primitive(_) => name.to_string(),
            TypeKind::Function(shape) => {
                let formals: Vec<String> = shape.formals.iter().map(|&f| self.format(f)).collect();
                let ret = shape.ret.map(|r| self.format(r)).unwrap_or_else(|| "void".into());
                format!("fn({}): {}", formals.join(", "), ret)
            }
            TypeKind::Enum(shape) => {
                let mut out = format!("enum {name} = ");
                for (i, &c) in shape.constants.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" | ");
                    }
                    if let Some(sym) = u.nodes.kind(c).and_then(NodeKind::def_sym) {
                        out.push_str(u.symbols.name(sym));
                    }
                }
                out
            }
            TypeKind::Alias(_) => format!("type {name}"),
            TypeKind::Aggregate(shape) => {
                let keyword = match (shape.class_kind, shape.is_union) {
                    (_, true) => "union",
                    (ClassKind::Reference, _) => "class",
                    (ClassKind::Value, _) => "record",
                };
                let mut out = format!("{keyword} {name}(");
                for (i, &field) in shape.fields().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}", u.symbols.name(field));
                    if let Some(fty) = u.symbols.get(field).and_then(|s| s.ty) {
                        let _ = write!(out, ": {}", self.format(fty));
                    }
                }
                out.push(')');
                out
            }
        }
    }
}
