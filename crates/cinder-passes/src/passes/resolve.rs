//! Name resolution.
//!
//! Runs in this order, collecting user errors along the way:
//! 1. requested generic instantiations are created and bound,
//! 2. every alias is resolved to a concrete type, every use retargeted and
//!    the alias retired,
//! 3. inherited data fields are copied into derived aggregates,
//! 4. identifiers and callees in code are bound to symbols,
//! 5. `-s` config overrides become initializers,
//! 6. untyped variables take their (now resolvable) initializer's type.

use cinder_ast::{Callee, CopyMap, NodeIndex, NodeKind, Prim};
use cinder_binder::SymbolKind;
use cinder_common::diagnostics::{format_message, messages};
use cinder_common::{Atom, Diagnostic, InternalResult, Span, SymbolId, TypeId, int_fatal};
use cinder_types::{TypeKind, Universe};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::error::{DiagnosticSink, PassResult};
use crate::overrides::apply_overrides;
use crate::passes::{defs_below, infer_var_types};
use crate::program::Program;
use crate::registry::Pass;

pub struct ResolveSymbols;

impl Pass for ResolveSymbols {
    fn name(&self) -> &'static str {
        "ResolveSymbols"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        let mut sink = DiagnosticSink::new();
        instantiate_pending(program, &mut sink)?;
        let resolved = resolve_aliases(&program.u, &mut sink)?;
        retarget(&mut program.u, &resolved)?;
        flatten_inheritance(&mut program.u, &mut sink)?;
        resolve_identifiers(program, &mut sink)?;
        apply_overrides(program, &mut sink)?;
        let typed = infer_var_types(program)?;
        debug!(
            aliases = resolved.len(),
            typed,
            errors = sink.len(),
            "resolved symbols"
        );
        sink.finish()
    }
}

/// The type a root-scope type name denotes, without chasing aliases.
fn lookup_type(u: &Universe, name: Atom) -> Option<TypeId> {
    let symbol = u.symbols.get(u.symbols.lookup_atom(name)?)?;
    if symbol.is_type() { symbol.ty } else { None }
}

// =============================================================================
// Instantiation
// =============================================================================

fn instantiate_pending(program: &mut Program, sink: &mut DiagnosticSink) -> InternalResult<()> {
    for inst in std::mem::take(&mut program.instances) {
        let u = &mut program.u;
        let template_atom = u.symbols.intern(&inst.template);
        let Some(template) = lookup_type(u, template_atom) else {
            sink.push(Diagnostic::error(
                inst.span,
                format_message(messages::UNRESOLVED_TYPE, &[&inst.template]),
            ));
            continue;
        };
        if !u.types.ty(template)?.is_pattern() {
            sink.push(Diagnostic::error(
                inst.span,
                format!("'{}' is not a generic type", inst.template),
            ));
            continue;
        }
        let params: Vec<SymbolId> = u
            .types
            .ty(template)?
            .as_aggregate()
            .map(|a| a.fields().to_vec())
            .unwrap_or_default()
            .into_iter()
            .filter(|&f| u.symbols.get(f).is_some_and(|s| s.is_type_variable()))
            .collect();

        let mut args = IndexMap::new();
        let mut ok = true;
        for (param_name, arg_name) in &inst.args {
            let Some(param) = params.iter().copied().find(|&p| u.symbols.name(p) == param_name.as_str()) else {
                sink.push(Diagnostic::error(
                    inst.span,
                    format!(
                        "'{param_name}' is not a type parameter of '{}'",
                        inst.template
                    ),
                ));
                ok = false;
                continue;
            };
            let arg_atom = u.symbols.intern(arg_name);
            let actual = match lookup_type(u, arg_atom) {
                Some(ty) => resolve_alias(u, ty, &mut Vec::new(), &mut FxHashMap::default(), sink)?,
                None => None,
            };
            match actual {
                Some(actual) => {
                    args.insert(param, actual);
                }
                None => {
                    sink.push(Diagnostic::error(
                        inst.span,
                        format_message(messages::UNRESOLVED_TYPE, &[arg_name]),
                    ));
                    ok = false;
                }
            }
        }
        for &param in &params {
            if ok && !args.contains_key(&param) {
                sink.push(Diagnostic::error(
                    inst.span,
                    format!(
                        "missing type argument '{}' for '{}'",
                        u.symbols.name(param),
                        inst.template
                    ),
                ));
                ok = false;
            }
        }
        if !ok {
            continue;
        }
        let instance = u.instantiate(template, args, &inst.name)?;
        if let Some(sym) = u.types.binding(instance)
            && let Err(existing) = u.symbols.define(sym)
        {
            let prev = u.symbols.get(existing).map_or(Span::SYNTHETIC, |s| s.span);
            sink.push(
                Diagnostic::error(inst.span, format!("'{}' is already defined", inst.name))
                    .with_related(prev, "previous definition"),
            );
        }
    }
    Ok(())
}

// =============================================================================
// Alias elimination
// =============================================================================

/// Map every resolvable alias to the concrete type it denotes. Type
/// parameter placeholders (aliases without a type-expression) are skipped.
fn resolve_aliases(u: &Universe, sink: &mut DiagnosticSink) -> InternalResult<FxHashMap<TypeId, TypeId>> {
    let aliases: Vec<TypeId> = u
        .types
        .live()
        .filter(|(_, t)| matches!(&t.kind, TypeKind::Alias(shape) if shape.type_expr.is_some()))
        .map(|(id, _)| id)
        .collect();
    let mut resolved = FxHashMap::default();
    for alias in aliases {
        resolve_alias(u, alias, &mut Vec::new(), &mut resolved, sink)?;
    }
    Ok(resolved)
}

/// Chase `ty` through alias type-expressions to a concrete type. Reports an
/// unknown name or a cycle once, at the alias where it is found.
fn resolve_alias(
    u: &Universe,
    ty: TypeId,
    visiting: &mut Vec<TypeId>,
    resolved: &mut FxHashMap<TypeId, TypeId>,
    sink: &mut DiagnosticSink,
) -> InternalResult<Option<TypeId>> {
    if let Some(&done) = resolved.get(&ty) {
        return Ok(Some(done));
    }
    let t = u.types.ty(ty)?;
    let type_expr = match &t.kind {
        TypeKind::Alias(shape) => shape.type_expr,
        _ => return Ok(Some(ty)),
    };
    if type_expr.is_none() {
        return Ok(None);
    }
    let span = t.span;
    let name = match u.nodes.kind(type_expr) {
        Some(NodeKind::Name(atom)) => *atom,
        Some(NodeKind::SymRef(sym)) => match u.symbols.get(*sym).and_then(|s| s.ty) {
            Some(target) => return Ok(Some(target)),
            None => return Ok(None),
        },
        other => {
            return Err(int_fatal!(
                span,
                "alias type-expression is not a name: {:?}",
                other
            ));
        }
    };
    if visiting.contains(&ty) {
        let display = match u.types.binding(ty) {
            Some(_) => u.type_name(ty).to_string(),
            None => u.symbols.resolve_atom(name).to_string(),
        };
        sink.push(Diagnostic::error(
            span,
            format_message(messages::CYCLIC_ALIAS, &[&display]),
        ));
        return Ok(None);
    }
    let Some(target) = lookup_type(u, name) else {
        sink.push(Diagnostic::error(
            span,
            format_message(messages::UNRESOLVED_TYPE, &[u.symbols.resolve_atom(name)]),
        ));
        return Ok(None);
    };
    visiting.push(ty);
    let result = resolve_alias(u, target, visiting, resolved, sink)?;
    visiting.pop();
    if let Some(concrete) = result {
        resolved.insert(ty, concrete);
        trace!(alias = ?ty, concrete = u.type_name(concrete), "resolved alias");
    }
    Ok(result)
}

/// Point every use of a resolved alias at its concrete type and retire the
/// alias.
fn retarget(u: &mut Universe, resolved: &FxHashMap<TypeId, TypeId>) -> InternalResult<()> {
    if resolved.is_empty() {
        return Ok(());
    }
    let map = |ty: TypeId| resolved.get(&ty).copied().unwrap_or(ty);
    let ids: Vec<SymbolId> = u.symbols.iter().map(|(id, _)| id).collect();
    for id in ids {
        let Some(symbol) = u.symbols.get_mut(id) else {
            continue;
        };
        if let Some(ty) = symbol.ty {
            symbol.ty = Some(map(ty));
        }
        if let Some(info) = symbol.fn_info_mut()
            && let Some(ret) = info.ret
        {
            info.ret = Some(map(ret));
        }
    }
    for index in 0..u.types.len() {
        let Some(t) = u.types.get_mut(TypeId::from_index(index)) else {
            continue;
        };
        if let TypeKind::Function(shape) = &mut t.kind {
            for formal in &mut shape.formals {
                *formal = map(*formal);
            }
            shape.ret = shape.ret.map(map);
        }
        t.scalar_promotion = t.scalar_promotion.map(map);
        for actual in t.instantiation_args.values_mut() {
            *actual = map(*actual);
        }
    }
    for &alias in resolved.keys() {
        u.types.ty_mut(alias)?.retired = true;
    }
    Ok(())
}

// =============================================================================
// Inheritance
// =============================================================================

fn flatten_inheritance(u: &mut Universe, sink: &mut DiagnosticSink) -> InternalResult<()> {
    let derived: Vec<TypeId> = u
        .types
        .live()
        .filter(|(_, t)| t.as_aggregate().is_some_and(|a| !a.inherits.is_empty()))
        .map(|(id, _)| id)
        .collect();
    let mut done = FxHashSet::default();
    for ty in derived {
        flatten(u, ty, &mut done, &mut Vec::new(), sink)?;
    }
    Ok(())
}

fn flatten(
    u: &mut Universe,
    ty: TypeId,
    done: &mut FxHashSet<TypeId>,
    visiting: &mut Vec<TypeId>,
    sink: &mut DiagnosticSink,
) -> InternalResult<()> {
    if done.contains(&ty) {
        return Ok(());
    }
    let span = u.types.ty(ty)?.span;
    if visiting.contains(&ty) {
        sink.push(Diagnostic::error(
            span,
            format!("'{}' inherits from itself", u.type_name(ty)),
        ));
        return Ok(());
    }
    visiting.push(ty);
    let inherits = u
        .types
        .ty(ty)?
        .as_aggregate()
        .map(|a| a.inherits.clone())
        .unwrap_or_default();
    let mut copied = Vec::new();
    for node in inherits {
        let Some(&NodeKind::Name(name)) = u.nodes.kind(node) else {
            continue;
        };
        let parent_name = u.symbols.resolve_atom(name).to_string();
        let Some(parent) = lookup_type(u, name) else {
            sink.push(Diagnostic::error(
                u.nodes.span(node),
                format_message(messages::UNRESOLVED_TYPE, &[&parent_name]),
            ));
            continue;
        };
        if u.types.ty(parent)?.as_aggregate().is_none() {
            sink.push(Diagnostic::error(
                u.nodes.span(node),
                format_message(messages::NOT_AN_AGGREGATE, &[&parent_name]),
            ));
            continue;
        }
        flatten(u, parent, done, visiting, sink)?;
        let parent_fields = u.data_fields(parent)?;
        for field in parent_fields {
            let def = u.symbols.get(field).map(|s| s.def).unwrap_or_default();
            if def.is_none() {
                continue;
            }
            let mut map = CopyMap::new();
            copied.push(u.nodes.deep_copy(def, &mut u.symbols, &mut map)?);
        }
        if let Some(parent_sym) = u.types.binding(parent) {
            u.nodes.rewrite_leaf(node, NodeKind::SymRef(parent_sym))?;
        }
    }
    if !copied.is_empty() {
        let count = copied.len();
        let first = u
            .types
            .ty(ty)?
            .as_aggregate()
            .and_then(|a| a.declarations.first().copied());
        u.add_declarations(ty, copied, first)?;
        debug!(ty = u.type_name(ty), fields = count, "flattened inherited fields");
    }
    visiting.pop();
    done.insert(ty);
    Ok(())
}

// =============================================================================
// Identifiers
// =============================================================================

/// Runtime operations a program description may call by name.
const CALLABLE_PRIMS: [Prim; 5] = [Prim::Halt, Prim::Assign, Prim::Eq, Prim::Ne, Prim::Not];

fn resolve_identifiers(program: &mut Program, sink: &mut DiagnosticSink) -> InternalResult<()> {
    let prims: Vec<(Atom, Prim)> = CALLABLE_PRIMS
        .iter()
        .map(|&prim| (program.u.symbols.intern(prim.name()), prim))
        .collect();
    for (owner, body) in program.code_roots()? {
        let u = &mut program.u;
        let mut locals: FxHashMap<Atom, SymbolId> = FxHashMap::default();
        if let Some(info) = u.symbols.get(owner).and_then(|s| s.fn_info()) {
            for &formal in &info.formals {
                if let Some(symbol) = u.symbols.get(formal) {
                    locals.insert(symbol.name, formal);
                }
            }
        }
        for (_, sym) in defs_below(u, body) {
            if let Some(symbol) = u.symbols.get(sym)
                && symbol.is_var_like()
                && !matches!(u.symbols.get(owner).map(|s| &s.kind), Some(SymbolKind::Module(_)))
            {
                locals.insert(symbol.name, sym);
            }
        }

        let mut names: Vec<(NodeIndex, Atom)> = Vec::new();
        let mut callees: Vec<(NodeIndex, Atom)> = Vec::new();
        u.nodes.walk(body, &mut |idx, node| match &node.kind {
            NodeKind::Name(atom) => names.push((idx, *atom)),
            NodeKind::Call {
                callee: Callee::Name(atom),
                ..
            } => callees.push((idx, *atom)),
            _ => {}
        });

        for (idx, atom) in names {
            let found = locals
                .get(&atom)
                .copied()
                .or_else(|| u.symbols.lookup_atom(atom))
                .filter(|&sym| {
                    u.symbols
                        .get(sym)
                        .is_some_and(|s| s.is_var_like() || matches!(s.kind, SymbolKind::EnumConst))
                });
            match found {
                Some(sym) => u.nodes.rewrite_leaf(idx, NodeKind::SymRef(sym))?,
                None => sink.push(unresolved(u, idx, atom)),
            }
        }
        for (idx, atom) in callees {
            if let Some(&(_, prim)) = prims.iter().find(|(name, _)| *name == atom) {
                u.nodes.set_callee(idx, Callee::Prim(prim))?;
                continue;
            }
            let found = u
                .symbols
                .lookup_atom(atom)
                .filter(|&sym| u.symbols.get(sym).is_some_and(|s| s.is_fn()));
            match found {
                Some(sym) => u.nodes.set_callee(idx, Callee::Sym(sym))?,
                None => sink.push(unresolved(u, idx, atom)),
            }
        }
    }
    Ok(())
}

fn unresolved(u: &Universe, idx: NodeIndex, atom: Atom) -> Diagnostic {
    Diagnostic::error(
        u.nodes.span(idx),
        format_message(messages::UNRESOLVED_IDENTIFIER, &[u.symbols.resolve_atom(atom)]),
    )
}
