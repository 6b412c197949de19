//! Type data.
//!
//! Types live in a flat [`TypeTable`](crate::TypeTable), never in the tree.
//! The variant tag is the [`TypeKind`] sum type; structural children that are
//! tree nodes (enum constants, aggregate declarations, inheritance entries,
//! alias type-expressions) are owned through `Parent::Type(id)` links.

use std::fmt;

use cinder_common::{NodeIndex, Span, SymbolId, TypeId};
use indexmap::{IndexMap, IndexSet};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub const ALL: [IntWidth; 4] = [IntWidth::W8, IntWidth::W16, IntWidth::W32, IntWidth::W64];

    pub fn bits(self) -> u8 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    W32,
    W64,
    W128,
}

impl FloatWidth {
    pub const ALL: [FloatWidth; 3] = [FloatWidth::W32, FloatWidth::W64, FloatWidth::W128];

    pub fn bits(self) -> u8 {
        match self {
            FloatWidth::W32 => 32,
            FloatWidth::W64 => 64,
            FloatWidth::W128 => 128,
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// The fixed set of primitive types created at start-up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Nil,
    Unknown,
    Void,
    Object,
    Value,
    Bool,
    Int(IntWidth),
    UInt(IntWidth),
    Float(FloatWidth),
    Complex(FloatWidth),
    String,
    Symbol,
    File,
    Mutex,
    MutexP,
    CondVarP,
    Any,
    MethodToken,
    SetterToken,
}

impl PrimitiveKind {
    /// Passed by C value without a compiler-managed temporary.
    pub fn is_c_value(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Bool
                | PrimitiveKind::Int(_)
                | PrimitiveKind::UInt(_)
                | PrimitiveKind::Float(_)
        )
    }

    /// Bit width of numeric primitives.
    pub fn width(self) -> Option<u8> {
        match self {
            PrimitiveKind::Int(w) | PrimitiveKind::UInt(w) => Some(w.bits()),
            PrimitiveKind::Float(w) | PrimitiveKind::Complex(w) => Some(w.bits()),
            _ => None,
        }
    }
}

/// Callable signature. Serialization and default values are unsupported.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FnShape {
    pub formals: Vec<TypeId>,
    pub ret: Option<TypeId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnumShape {
    /// `Def` nodes of the enum-constant symbols, in declaration order.
    pub constants: Vec<NodeIndex>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AliasShape {
    pub type_expr: NodeIndex,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Heap allocated, nominal, nullable (`class`).
    Reference,
    /// Record, no identity, never null (`record`).
    Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateShape {
    pub class_kind: ClassKind,
    /// Generic template; never emitted, only instantiated.
    pub is_pattern: bool,
    /// Value-kind aggregate whose data fields share storage.
    pub is_union: bool,
    pub declarations: Vec<NodeIndex>,
    /// Unresolved parent type-expressions.
    pub inherits: Vec<NodeIndex>,
    pub methods: IndexSet<SymbolId>,
    // Projections of `declarations`, rebuilt by `recompute_caches`.
    pub(crate) fields: Vec<SymbolId>,
    pub(crate) nested_types: Vec<SymbolId>,
}

impl AggregateShape {
    pub fn new(class_kind: ClassKind) -> Self {
        AggregateShape {
            class_kind,
            is_pattern: false,
            is_union: false,
            declarations: Vec::new(),
            inherits: Vec::new(),
            methods: IndexSet::new(),
            fields: Vec::new(),
            nested_types: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[SymbolId] {
        &self.fields
    }

    pub fn nested_types(&self) -> &[SymbolId] {
        &self.nested_types
    }

    pub fn is_nominal(&self) -> bool {
        self.class_kind == ClassKind::Reference
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Function(FnShape),
    Enum(EnumShape),
    /// A user type wrapping an unresolved type-expression.
    Alias(AliasShape),
    Aggregate(AggregateShape),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeVariant {
    Primitive,
    Function,
    Enum,
    Alias,
    Aggregate,
}

impl fmt::Display for TypeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeVariant::Primitive => "primitive",
            TypeVariant::Function => "function",
            TypeVariant::Enum => "enum",
            TypeVariant::Alias => "alias",
            TypeVariant::Aggregate => "aggregate",
        })
    }
}

/// Default value of a type: nothing, or a constant symbol looked up in the
/// global constant table (`nil` for reference aggregates).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum DefaultValue {
    #[default]
    None,
    Symbol(SymbolId),
}

impl DefaultValue {
    pub fn symbol(self) -> Option<SymbolId> {
        match self {
            DefaultValue::None => None,
            DefaultValue::Symbol(sym) => Some(sym),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Type {
    pub kind: TypeKind,
    pub(crate) binding: Option<SymbolId>,
    pub default_value: DefaultValue,
    pub scalar_promotion: Option<TypeId>,
    pub instantiated_from: Option<TypeId>,
    /// Formal type-parameter symbol of the template -> concrete type.
    pub instantiation_args: IndexMap<SymbolId, TypeId>,
    pub span: Span,
    /// Eliminated alias; must no longer be referenced.
    pub retired: bool,
}

impl Type {
    pub fn new(kind: TypeKind, span: Span) -> Self {
        Type {
            kind,
            binding: None,
            default_value: DefaultValue::None,
            scalar_promotion: None,
            instantiated_from: None,
            instantiation_args: IndexMap::new(),
            span,
            retired: false,
        }
    }

    pub fn variant(&self) -> TypeVariant {
        match self.kind {
            TypeKind::Primitive(_) => TypeVariant::Primitive,
            TypeKind::Function(_) => TypeVariant::Function,
            TypeKind::Enum(_) => TypeVariant::Enum,
            TypeKind::Alias(_) => TypeVariant::Alias,
            TypeKind::Aggregate(_) => TypeVariant::Aggregate,
        }
    }

    pub fn binding(&self) -> Option<SymbolId> {
        self.binding
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumShape> {
        match &self.kind {
            TypeKind::Enum(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&AggregateShape> {
        match &self.kind {
            TypeKind::Aggregate(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_aggregate_mut(&mut self) -> Option<&mut AggregateShape> {
        match &mut self.kind {
            TypeKind::Aggregate(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        self.as_aggregate().is_some_and(|a| a.is_pattern)
    }

    /// Has a synthesized default write procedure.
    pub fn has_default_write(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_) | TypeKind::Aggregate(_))
    }

    pub fn has_default_read(&self) -> bool {
        self.has_default_write()
    }

    /// Every tree node this type owns, in slot order.
    pub fn owned_nodes(&self) -> Vec<NodeIndex> {
        match &self.kind {
            TypeKind::Primitive(_) | TypeKind::Function(_) => Vec::new(),
            TypeKind::Enum(shape) => shape.constants.clone(),
            TypeKind::Alias(shape) => {
                if shape.type_expr.is_some() {
                    vec![shape.type_expr]
                } else {
                    Vec::new()
                }
            }
            TypeKind::Aggregate(shape) => shape
                .declarations
                .iter()
                .chain(shape.inherits.iter())
                .copied()
                .collect(),
        }
    }
}
