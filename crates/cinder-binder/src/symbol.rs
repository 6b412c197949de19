use bitflags::bitflags;
use cinder_common::{Atom, NodeIndex, Span, SymbolId, TypeId};

use crate::Intent;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct VarFlags: u8 {
        const CONST = 1 << 0;
        /// Overridable at program invocation (`config var`).
        const CONFIG = 1 << 1;
        /// A type-level field of a generic aggregate; carries no data.
        const TYPE_VARIABLE = 1 << 2;
        const PARAM = 1 << 3;
    }
}

/// A literal value stored in the unique-constant table.
///
/// Floats keep their source text so the table can hash them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Immediate {
    Bool(bool),
    Int { value: i64, bits: u8 },
    UInt { value: u64, bits: u8 },
    Float { text: String, bits: u8 },
    Complex { text: String, bits: u8 },
    Str(String),
}

impl Immediate {
    /// C spelling of the literal.
    pub fn to_c(&self) -> String {
        match self {
            Immediate::Bool(true) => "true".to_string(),
            Immediate::Bool(false) => "false".to_string(),
            Immediate::Int { value, .. } => value.to_string(),
            Immediate::UInt { value, .. } => format!("{value}u"),
            Immediate::Float { text, .. } | Immediate::Complex { text, .. } => text.clone(),
            Immediate::Str(s) => format!("{s:?}"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FnInfo {
    pub formals: Vec<SymbolId>,
    /// Block node holding the body, `NONE` for prototypes.
    pub body: NodeIndex,
    pub ret: Option<TypeId>,
    pub is_method: bool,
    /// The implicit receiver formal of a method.
    pub receiver: SymbolId,
    /// Aggregate the method was registered with.
    pub owner: Option<TypeId>,
}

#[derive(Clone, Debug)]
pub struct ModuleInfo {
    /// Block node holding the module's top-level statements.
    pub body: NodeIndex,
    pub init_fn: SymbolId,
}

#[derive(Clone, Debug)]
pub enum SymbolKind {
    Var {
        flags: VarFlags,
        immediate: Option<Immediate>,
    },
    Arg {
        intent: Intent,
    },
    /// A type symbol; `Symbol::ty` is the type it names.
    Type,
    Fn(FnInfo),
    EnumConst,
    Module(ModuleInfo),
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: Atom,
    /// Name used in generated C.
    pub cname: String,
    pub kind: SymbolKind,
    /// Type of the value, or the named type for type symbols. `None` until
    /// resolved.
    pub ty: Option<TypeId>,
    pub span: Span,
    /// The `Def` node declaring this symbol, if it is in the tree.
    pub def: NodeIndex,
}

impl Symbol {
    pub fn is_fn(&self) -> bool {
        matches!(self.kind, SymbolKind::Fn(_))
    }

    pub fn is_type(&self) -> bool {
        matches!(self.kind, SymbolKind::Type)
    }

    /// Variables and formals: the symbols that can be aggregate fields.
    pub fn is_var_like(&self) -> bool {
        matches!(self.kind, SymbolKind::Var { .. } | SymbolKind::Arg { .. })
    }

    pub fn var_flags(&self) -> VarFlags {
        match &self.kind {
            SymbolKind::Var { flags, .. } => *flags,
            _ => VarFlags::empty(),
        }
    }

    pub fn is_type_variable(&self) -> bool {
        self.var_flags().contains(VarFlags::TYPE_VARIABLE)
    }

    pub fn is_config(&self) -> bool {
        self.var_flags().contains(VarFlags::CONFIG)
    }

    pub fn fn_info(&self) -> Option<&FnInfo> {
        match &self.kind {
            SymbolKind::Fn(info) => Some(info),
            _ => None,
        }
    }

    pub fn fn_info_mut(&mut self) -> Option<&mut FnInfo> {
        match &mut self.kind {
            SymbolKind::Fn(info) => Some(info),
            _ => None,
        }
    }
}
