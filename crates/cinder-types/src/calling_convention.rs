//! Parameter-passing decisions and default-format routine names.

use cinder_binder::Intent;
use cinder_common::{InternalResult, TypeId, int_fatal};

use crate::types::{PrimitiveKind, TypeKind};
use crate::universe::Universe;

impl Universe {
    /// Whether C's own pass-by-value already transports the type: bool and the
    /// integer and floating primitives, and enums.
    pub fn is_value_representable(&self, ty: TypeId) -> InternalResult<bool> {
        Ok(match &self.types.ty(ty)?.kind {
            TypeKind::Primitive(kind) => kind.is_c_value(),
            TypeKind::Enum(_) => true,
            TypeKind::Function(_) | TypeKind::Alias(_) | TypeKind::Aggregate(_) => false,
        })
    }

    /// Whether a formal of type `ty` with `intent` needs a caller-local
    /// temporary in the generated C.
    pub fn requires_c_param_tmp(&self, ty: TypeId, intent: Intent) -> InternalResult<bool> {
        let intent = match intent {
            Intent::Blank => Intent::Const,
            other => other,
        };
        Ok(match intent {
            Intent::Const | Intent::Ref | Intent::Param | Intent::Type => false,
            Intent::In => !self.is_value_representable(ty)?,
            Intent::Inout | Intent::Out => true,
            Intent::Blank => {
                return Err(int_fatal!(
                    self.types.ty(ty)?.span,
                    "should never have reached the blank intent case"
                ));
            }
        })
    }

    /// C name of a type as it appears in generated code.
    pub fn codegen_type_name(&self, ty: TypeId) -> InternalResult<&str> {
        let t = self.types.ty(ty)?;
        match t.kind {
            TypeKind::Primitive(PrimitiveKind::Unknown) => {
                Err(int_fatal!(t.span, "Cannot generate unknown type"))
            }
            TypeKind::Function(_) => Err(int_fatal!(t.span, "function types are not yet implemented")),
            _ => match t.binding() {
                Some(sym) => Ok(self.symbols.cname(sym)),
                None => Err(int_fatal!(t.span, "cannot generate unbound type {:?}", ty)),
            },
        }
    }

    /// Name of the default textual read or write routine for `ty`:
    /// `_default_format_read_enum` for enums, `_default_format_write` plus the
    /// C type name otherwise.
    pub fn default_format_name(&self, ty: TypeId, is_read: bool) -> InternalResult<String> {
        let t = self.types.ty(ty)?;
        let prefix = if is_read {
            "_default_format_read"
        } else {
            "_default_format_write"
        };
        match t.kind {
            TypeKind::Enum(_) => Ok(format!("{prefix}_enum")),
            TypeKind::Alias(_) => Err(int_fatal!(t.span, "alias types should be removed by codegen time")),
            _ => Ok(format!("{prefix}{}", self.codegen_type_name(ty)?)),
        }
    }
}
