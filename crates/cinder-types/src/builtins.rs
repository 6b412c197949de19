//! Start-up primitive types and shared constants.
//!
//! [`Builtins::init`] runs once per compilation, before the front end. It
//! creates every primitive type, binds it to a root-scope type symbol with its
//! C name, and gives it a default value from the unique-constant table. The
//! returned ids never change afterwards.

use cinder_binder::{Immediate, SymbolKind, SymbolTable};
use cinder_common::{Span, SymbolId, TypeId};
use tracing::debug;

use crate::table::TypeTable;
use crate::types::{DefaultValue, FloatWidth, IntWidth, PrimitiveKind, Type, TypeKind};

#[derive(Copy, Clone, Debug)]
pub struct Builtins {
    pub nil: TypeId,
    pub unknown: TypeId,
    pub void: TypeId,
    pub object: TypeId,
    pub value: TypeId,
    pub bool: TypeId,
    ints: [TypeId; 4],
    uints: [TypeId; 4],
    floats: [TypeId; 3],
    complexes: [TypeId; 3],
    pub string: TypeId,
    pub symbol: TypeId,
    pub file: TypeId,
    pub mutex: TypeId,
    pub mutex_p: TypeId,
    pub condvar_p: TypeId,
    pub any: TypeId,
    pub method_token: TypeId,
    pub setter_token: TypeId,

    /// The shared null sentinel; default of every reference aggregate.
    pub g_nil: SymbolId,
    pub g_unknown: SymbolId,
    pub g_void: SymbolId,
    pub g_true: SymbolId,
    pub g_false: SymbolId,
    pub g_method_token: SymbolId,
    pub g_setter_token: SymbolId,
}

struct Init<'a> {
    types: &'a mut TypeTable,
    symbols: &'a mut SymbolTable,
}

impl Init<'_> {
    fn primitive(&mut self, kind: PrimitiveKind, name: &str, cname: &str) -> TypeId {
        let ty = self.types.add(Type::new(TypeKind::Primitive(kind), Span::SYNTHETIC));
        let sym = self.symbols.alloc_with_cname(
            name,
            cname.to_string(),
            SymbolKind::Type,
            Span::SYNTHETIC,
        );
        if let Some(symbol) = self.symbols.get_mut(sym) {
            symbol.ty = Some(ty);
        }
        let _ = self.symbols.define(sym);
        if let Some(t) = self.types.get_mut(ty) {
            t.binding = Some(sym);
        }
        ty
    }

    /// Named constant defined in the root scope and used as the default.
    fn default_symbol(&mut self, ty: TypeId, name: &str) -> SymbolId {
        let sym = self.symbols.named_constant(name, name, ty);
        self.set_default(ty, sym);
        sym
    }

    fn default_immediate(&mut self, ty: TypeId, imm: Immediate) -> SymbolId {
        let sym = self.symbols.immediate(imm, ty);
        self.set_default(ty, sym);
        sym
    }

    fn set_default(&mut self, ty: TypeId, sym: SymbolId) {
        if let Some(t) = self.types.get_mut(ty) {
            t.default_value = DefaultValue::Symbol(sym);
        }
    }
}

impl Builtins {
    pub fn init(types: &mut TypeTable, symbols: &mut SymbolTable) -> Builtins {
        let mut cx = Init { types, symbols };

        let nil = cx.primitive(PrimitiveKind::Nil, "_nilType", "_nilType");
        let g_nil = cx.default_symbol(nil, "nil");
        let unknown = cx.primitive(PrimitiveKind::Unknown, "_unknownType", "_unknownType");
        let g_unknown = cx.default_symbol(unknown, "_unknown");
        let void = cx.primitive(PrimitiveKind::Void, "void", "void");
        let g_void = cx.default_symbol(void, "_void");

        let object = cx.primitive(PrimitiveKind::Object, "object", "_cinder_object");
        let value = cx.primitive(PrimitiveKind::Value, "value", "_cinder_value");

        let bool = cx.primitive(PrimitiveKind::Bool, "bool", "_bool");
        let g_false = cx.default_immediate(bool, Immediate::Bool(false));
        let g_true = cx.symbols.immediate(Immediate::Bool(true), bool);
        let _ = cx.symbols.define(g_false);
        let _ = cx.symbols.define(g_true);

        let mut ints = [TypeId::NONE; 4];
        let mut uints = [TypeId::NONE; 4];
        for width in IntWidth::ALL {
            let bits = width.bits();
            let (name, uname) = if width == IntWidth::W64 {
                ("int".to_string(), "uint".to_string())
            } else {
                (format!("_int{bits}"), format!("_uint{bits}"))
            };
            let int = cx.primitive(PrimitiveKind::Int(width), &name, &format!("_int{bits}"));
            cx.default_immediate(int, Immediate::Int { value: 0, bits });
            ints[width.slot()] = int;
            let uint = cx.primitive(PrimitiveKind::UInt(width), &uname, &format!("_uint{bits}"));
            cx.default_immediate(uint, Immediate::UInt { value: 0, bits });
            uints[width.slot()] = uint;
        }

        let mut floats = [TypeId::NONE; 3];
        let mut complexes = [TypeId::NONE; 3];
        for width in FloatWidth::ALL {
            let bits = width.bits();
            let (name, cname) = if width == FloatWidth::W64 {
                ("float".to_string(), "complex".to_string())
            } else {
                (format!("_float{bits}"), format!("_complex{bits}"))
            };
            let float = cx.primitive(PrimitiveKind::Float(width), &name, &format!("_float{bits}"));
            cx.default_immediate(
                float,
                Immediate::Float {
                    text: "0.0".to_string(),
                    bits,
                },
            );
            floats[width.slot()] = float;
            let complex =
                cx.primitive(PrimitiveKind::Complex(width), &cname, &format!("_complex{bits}"));
            cx.default_immediate(
                complex,
                Immediate::Complex {
                    text: format!("_cinder_complex{bits}(0.0, 0.0)"),
                    bits,
                },
            );
            complexes[width.slot()] = complex;
        }

        let string = cx.primitive(PrimitiveKind::String, "string", "_string");
        cx.default_immediate(string, Immediate::Str(String::new()));
        let symbol = cx.primitive(PrimitiveKind::Symbol, "symbol", "_symbol");

        let file = cx.primitive(PrimitiveKind::File, "_file", "_cfile");
        cx.default_symbol(file, "0");

        let mutex = cx.primitive(PrimitiveKind::Mutex, "_mutex", "_cinder_mutex_t");
        let mutex_p = cx.primitive(PrimitiveKind::MutexP, "_mutex_p", "_cinder_mutex_p");
        cx.default_symbol(mutex_p, "_cinder_mutex_new()");
        let condvar_p = cx.primitive(PrimitiveKind::CondVarP, "_condvar_p", "_cinder_condvar_p");
        cx.default_symbol(condvar_p, "_cinder_condvar_new()");

        let any = cx.primitive(PrimitiveKind::Any, "any", "_any");
        let method_token = cx.primitive(PrimitiveKind::MethodToken, "_mt", "_mt");
        let g_method_token = cx.default_symbol(method_token, "_unknown");
        let setter_token = cx.primitive(PrimitiveKind::SetterToken, "_st", "_st");
        let g_setter_token = cx.default_symbol(setter_token, "_unknown");

        debug!(types = cx.types.len(), symbols = cx.symbols.len(), "initialized primitive types");

        Builtins {
            nil,
            unknown,
            void,
            object,
            value,
            bool,
            ints,
            uints,
            floats,
            complexes,
            string,
            symbol,
            file,
            mutex,
            mutex_p,
            condvar_p,
            any,
            method_token,
            setter_token,
            g_nil,
            g_unknown,
            g_void,
            g_true,
            g_false,
            g_method_token,
            g_setter_token,
        }
    }

    pub fn int(&self, width: IntWidth) -> TypeId {
        self.ints[width.slot()]
    }

    pub fn uint(&self, width: IntWidth) -> TypeId {
        self.uints[width.slot()]
    }

    pub fn float(&self, width: FloatWidth) -> TypeId {
        self.floats[width.slot()]
    }

    pub fn complex(&self, width: FloatWidth) -> TypeId {
        self.complexes[width.slot()]
    }

    /// The default-width `int`.
    pub fn int64(&self) -> TypeId {
        self.int(IntWidth::W64)
    }

    /// Look up a primitive by its kind.
    pub fn primitive(&self, kind: PrimitiveKind) -> TypeId {
        match kind {
            PrimitiveKind::Nil => self.nil,
            PrimitiveKind::Unknown => self.unknown,
            PrimitiveKind::Void => self.void,
            PrimitiveKind::Object => self.object,
            PrimitiveKind::Value => self.value,
            PrimitiveKind::Bool => self.bool,
            PrimitiveKind::Int(w) => self.int(w),
            PrimitiveKind::UInt(w) => self.uint(w),
            PrimitiveKind::Float(w) => self.float(w),
            PrimitiveKind::Complex(w) => self.complex(w),
            PrimitiveKind::String => self.string,
            PrimitiveKind::Symbol => self.symbol,
            PrimitiveKind::File => self.file,
            PrimitiveKind::Mutex => self.mutex,
            PrimitiveKind::MutexP => self.mutex_p,
            PrimitiveKind::CondVarP => self.condvar_p,
            PrimitiveKind::Any => self.any,
            PrimitiveKind::MethodToken => self.method_token,
            PrimitiveKind::SetterToken => self.setter_token,
        }
    }
}
