//! The shared compilation state every pass works on, and the type
//! constructors that need more than the type table.

use cinder_ast::{NodeArena, NodeKind, Parent};
use cinder_binder::{Intent, SymbolKind, SymbolTable};
use cinder_common::{InternalResult, NodeIndex, SourceFiles, Span, SymbolId, TypeId, int_fatal};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::builtins::Builtins;
use crate::table::TypeTable;
use crate::types::{
    AggregateShape, AliasShape, ClassKind, DefaultValue, EnumShape, FnShape, Type, TypeKind,
};

/// Name of the constructor-like method that gets no method-token formal.
pub const CONSTRUCTOR_NAME: &str = "this";

/// Types, tree, symbols and the start-up builtins of one compilation run.
#[derive(Debug)]
pub struct Universe {
    pub types: TypeTable,
    pub nodes: NodeArena,
    pub symbols: SymbolTable,
    pub builtins: Builtins,
    pub files: SourceFiles,
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl Universe {
    pub fn new() -> Self {
        let mut types = TypeTable::new();
        let mut symbols = SymbolTable::new();
        let builtins = Builtins::init(&mut types, &mut symbols);
        Universe {
            types,
            nodes: NodeArena::new(),
            symbols,
            builtins,
            files: SourceFiles::new(),
        }
    }

    // =========================================================================
    // Binding
    // =========================================================================

    /// Create a root-scope type symbol named `name` and bind `ty` to it.
    pub fn bind(&mut self, ty: TypeId, name: &str, cname: &str) -> InternalResult<SymbolId> {
        let t = self.types.ty(ty)?;
        let span = t.span;
        if let Some(existing) = t.binding() {
            return Err(int_fatal!(span, "type {:?} is already bound to {:?}", ty, existing));
        }
        let sym = self
            .symbols
            .alloc_with_cname(name, cname.to_string(), SymbolKind::Type, span);
        self.bind_symbol(ty, sym)?;
        Ok(sym)
    }

    /// Bind `ty` to an existing type symbol.
    pub fn bind_symbol(&mut self, ty: TypeId, sym: SymbolId) -> InternalResult<()> {
        let t = self.types.ty(ty)?;
        let span = t.span;
        if let Some(existing) = t.binding() {
            return Err(int_fatal!(span, "type {:?} is already bound to {:?}", ty, existing));
        }
        match self.symbols.get_mut(sym) {
            Some(symbol) if symbol.is_type() => symbol.ty = Some(ty),
            _ => return Err(int_fatal!(span, "{:?} is not a type symbol", sym)),
        }
        self.types.set_binding(ty, sym)?;
        trace!(ty = ?ty, name = self.symbols.name(sym), "bound type");
        Ok(())
    }

    /// Source name of a type's binding, `"<unbound>"` without one.
    pub fn type_name(&self, ty: TypeId) -> &str {
        match self.types.binding(ty) {
            Some(sym) => self.symbols.name(sym),
            None => "<unbound>",
        }
    }

    pub fn type_cname(&self, ty: TypeId) -> &str {
        match self.types.binding(ty) {
            Some(sym) => self.symbols.cname(sym),
            None => "<unbound>",
        }
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn new_fn_type(&mut self, shape: FnShape, span: Span) -> TypeId {
        self.types.add(Type::new(TypeKind::Function(shape), span))
    }

    /// Build an enum from detached `Def` nodes of enum-constant symbols. The
    /// first constant becomes the default value.
    pub fn new_enum(&mut self, constants: Vec<NodeIndex>, span: Span) -> InternalResult<TypeId> {
        let Some(&first) = constants.first() else {
            return Err(int_fatal!(span, "enum type with no constants"));
        };
        let mut seen = FxHashSet::default();
        let mut syms = Vec::with_capacity(constants.len());
        for &constant in &constants {
            let sym = match self.nodes.kind(constant) {
                Some(NodeKind::Def { sym, .. }) => *sym,
                other => {
                    return Err(int_fatal!(
                        self.nodes.span(constant),
                        "enum constant is not a definition: {:?}",
                        other
                    ));
                }
            };
            let symbol = self
                .symbols
                .get(sym)
                .ok_or_else(|| int_fatal!(span, "enum constant {:?} has no symbol", sym))?;
            if !matches!(symbol.kind, SymbolKind::EnumConst) {
                return Err(int_fatal!(symbol.span, "{:?} is not an enum constant", sym));
            }
            if !seen.insert(symbol.name) {
                return Err(int_fatal!(
                    symbol.span,
                    "duplicate enum constant '{}'",
                    self.symbols.name(sym)
                ));
            }
            syms.push(sym);
        }
        let first_sym = self.nodes.kind(first).and_then(NodeKind::def_sym);
        let ty = self.types.add(Type::new(
            TypeKind::Enum(EnumShape {
                constants: constants.clone(),
            }),
            span,
        ));
        for (&constant, sym) in constants.iter().zip(syms) {
            self.nodes.attach(constant, Parent::Type(ty))?;
            if let Some(symbol) = self.symbols.get_mut(sym) {
                symbol.ty = Some(ty);
            }
        }
        if let Some(sym) = first_sym {
            self.types.ty_mut(ty)?.default_value = DefaultValue::Symbol(sym);
        }
        Ok(ty)
    }

    /// An alias wrapping a detached type-expression.
    pub fn new_alias(&mut self, type_expr: NodeIndex, span: Span) -> InternalResult<TypeId> {
        let ty = self
            .types
            .add(Type::new(TypeKind::Alias(AliasShape { type_expr }), span));
        if type_expr.is_some() {
            self.nodes.attach(type_expr, Parent::Type(ty))?;
        }
        Ok(ty)
    }

    /// An empty aggregate. Reference aggregates default to `nil`.
    pub fn new_aggregate(&mut self, class_kind: ClassKind, span: Span) -> TypeId {
        let mut ty = Type::new(TypeKind::Aggregate(AggregateShape::new(class_kind)), span);
        if class_kind == ClassKind::Reference {
            ty.default_value = DefaultValue::Symbol(self.builtins.g_nil);
        }
        self.types.add(ty)
    }

    fn aggregate_mut(&mut self, ty: TypeId) -> InternalResult<&mut AggregateShape> {
        let t = self.types.ty_mut(ty)?;
        let span = t.span;
        t.as_aggregate_mut()
            .ok_or_else(|| int_fatal!(span, "{:?} is not an aggregate", ty))
    }

    /// Add detached declarations to an aggregate, before `before` or at the
    /// end. Function definitions are registered as methods and get the
    /// implicit receiver (and, unless named `this`, method-token) formals.
    pub fn add_declarations(
        &mut self,
        ty: TypeId,
        decls: Vec<NodeIndex>,
        before: Option<NodeIndex>,
    ) -> InternalResult<()> {
        self.aggregate_mut(ty)?;
        for &decl in &decls {
            if let Some(sym) = self.nodes.kind(decl).and_then(NodeKind::def_sym)
                && self.symbols.get(sym).is_some_and(|s| s.is_fn())
            {
                self.register_method(ty, sym)?;
            }
        }
        for &decl in &decls {
            self.nodes.attach(decl, Parent::Type(ty))?;
        }
        let span = self.types.ty(ty)?.span;
        let shape = self.aggregate_mut(ty)?;
        let pos = match before {
            Some(anchor) => shape
                .declarations
                .iter()
                .position(|&d| d == anchor)
                .ok_or_else(|| int_fatal!(span, "{:?} is not a declaration of {:?}", anchor, ty))?,
            None => shape.declarations.len(),
        };
        shape.declarations.splice(pos..pos, decls);
        self.recompute_caches(ty)
    }

    fn register_method(&mut self, ty: TypeId, fn_sym: SymbolId) -> InternalResult<()> {
        let span = self.symbols.get(fn_sym).map(|s| s.span).unwrap_or_default();
        let is_constructor = self.symbols.name(fn_sym) == CONSTRUCTOR_NAME;
        let receiver = self.symbols.alloc(
            "this",
            SymbolKind::Arg {
                intent: Intent::Blank,
            },
            span,
        );
        if let Some(symbol) = self.symbols.get_mut(receiver) {
            symbol.ty = Some(ty);
        }
        let token = if is_constructor {
            None
        } else {
            let token = self.symbols.alloc(
                "_methodTokenDummy",
                SymbolKind::Arg {
                    intent: Intent::Blank,
                },
                span,
            );
            if let Some(symbol) = self.symbols.get_mut(token) {
                symbol.ty = Some(self.builtins.method_token);
            }
            Some(token)
        };
        let info = self
            .symbols
            .get_mut(fn_sym)
            .and_then(|s| s.fn_info_mut())
            .ok_or_else(|| int_fatal!(span, "{:?} is not a function", fn_sym))?;
        info.formals.insert(0, receiver);
        if let Some(token) = token {
            info.formals.insert(0, token);
        }
        info.receiver = receiver;
        info.is_method = true;
        info.owner = Some(ty);
        self.aggregate_mut(ty)?.methods.insert(fn_sym);
        Ok(())
    }

    /// Rebuild the field and nested-type projections from the declaration list.
    pub fn recompute_caches(&mut self, ty: TypeId) -> InternalResult<()> {
        let (fields, nested_types) = self.project_declarations(ty)?;
        let shape = self.aggregate_mut(ty)?;
        shape.fields = fields;
        shape.nested_types = nested_types;
        Ok(())
    }

    /// Fields and nested types as derived from the current declarations.
    pub fn project_declarations(
        &self,
        ty: TypeId,
    ) -> InternalResult<(Vec<SymbolId>, Vec<SymbolId>)> {
        let t = self.types.ty(ty)?;
        let shape = t
            .as_aggregate()
            .ok_or_else(|| int_fatal!(t.span, "{:?} is not an aggregate", ty))?;
        let mut fields = Vec::new();
        let mut nested_types = Vec::new();
        for &decl in &shape.declarations {
            let Some(sym) = self.nodes.kind(decl).and_then(NodeKind::def_sym) else {
                continue;
            };
            match self.symbols.get(sym) {
                Some(symbol) if symbol.is_type() => nested_types.push(sym),
                Some(symbol) if symbol.is_var_like() => fields.push(sym),
                _ => {}
            }
        }
        Ok((fields, nested_types))
    }

    /// Data fields: fields that are not type variables, in declaration order.
    pub fn data_fields(&self, ty: TypeId) -> InternalResult<Vec<SymbolId>> {
        let t = self.types.ty(ty)?;
        let shape = t
            .as_aggregate()
            .ok_or_else(|| int_fatal!(t.span, "{:?} is not an aggregate", ty))?;
        Ok(shape
            .fields()
            .iter()
            .copied()
            .filter(|&f| self.symbols.get(f).is_some_and(|s| !s.is_type_variable()))
            .collect())
    }

    /// Enum-constant symbols in declaration order.
    pub fn enum_constants(&self, ty: TypeId) -> InternalResult<Vec<SymbolId>> {
        let t = self.types.ty(ty)?;
        let shape = t
            .as_enum()
            .ok_or_else(|| int_fatal!(t.span, "{:?} is not an enum", ty))?;
        shape
            .constants
            .iter()
            .map(|&c| {
                self.nodes
                    .kind(c)
                    .and_then(NodeKind::def_sym)
                    .ok_or_else(|| int_fatal!(self.nodes.span(c), "enum constant is not a definition"))
            })
            .collect()
    }

    /// Remove a declaration from an aggregate, leaving it detached.
    pub fn remove_declaration(&mut self, ty: TypeId, decl: NodeIndex) -> InternalResult<()> {
        let span = self.nodes.span(decl);
        let shape = self.aggregate_mut(ty)?;
        let pos = shape
            .declarations
            .iter()
            .position(|&d| d == decl)
            .ok_or_else(|| int_fatal!(span, "{:?} is not a declaration of {:?}", decl, ty))?;
        shape.declarations.remove(pos);
        self.nodes.detach(decl);
        debug!(ty = ?ty, decl = ?decl, "removed declaration");
        self.recompute_caches(ty)
    }
}

// =============================================================================
// Expression typing
// =============================================================================

impl Universe {
    /// Field of an aggregate by source name.
    pub fn field_named(&self, ty: TypeId, name: cinder_common::Atom) -> Option<SymbolId> {
        self.types
            .get(ty)?
            .as_aggregate()?
            .fields()
            .iter()
            .copied()
            .find(|&f| self.symbols.get(f).is_some_and(|s| s.name == name))
    }

    /// Static type of an expression node, when it can be read off the tree.
    pub fn expr_type(&self, node: NodeIndex) -> Option<TypeId> {
        use cinder_ast::{Callee, Literal, Prim};
        match self.nodes.kind(node)? {
            NodeKind::SymRef(sym) => self.symbols.get(*sym)?.ty,
            NodeKind::Literal(Literal::Int(_)) => Some(self.builtins.int64()),
            NodeKind::Literal(Literal::Str(_)) => Some(self.builtins.string),
            NodeKind::Literal(Literal::Bool(_)) => Some(self.builtins.bool),
            NodeKind::Member { base, field } => {
                let base_ty = self.expr_type(*base)?;
                let sym = self.field_named(base_ty, *field)?;
                self.symbols.get(sym)?.ty
            }
            NodeKind::Call { callee, .. } => match callee {
                Callee::Prim(Prim::Eq | Prim::Ne | Prim::Not) => Some(self.builtins.bool),
                Callee::Prim(Prim::ReadLitChar | Prim::GetErrno) => Some(self.builtins.int64()),
                Callee::Prim(_) => Some(self.builtins.void),
                Callee::Sym(sym) => self.symbols.get(*sym)?.fn_info()?.ret,
                Callee::Name(_) => None,
            },
            NodeKind::Name(_)
            | NodeKind::Def { .. }
            | NodeKind::ExprStmt(_)
            | NodeKind::Cond { .. }
            | NodeKind::Block(_)
            | NodeKind::Return(_) => None,
        }
    }
}
