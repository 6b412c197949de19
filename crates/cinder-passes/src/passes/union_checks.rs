use cinder_ast::{Callee, CopyMap, NodeIndex, NodeKind, Prim};
use cinder_common::{Atom, InternalResult};
use cinder_types::Universe;
use tracing::{debug, trace};

use crate::error::PassResult;
use crate::passes::is_template_method;
use crate::program::Program;
use crate::registry::Pass;

/// Guards every read of a union field: the statement is preceded by
/// `_union_check(base, <field id>)`, which halts unless the union currently
/// holds that field. Field ids count the union's data fields from 1.
///
/// The target of a plain assignment is a write and is not checked.
pub struct InsertUnionChecks;

impl Pass for InsertUnionChecks {
    fn name(&self) -> &'static str {
        "InsertUnionChecks"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        let mut inserted = 0;
        for (owner, body) in program.code_roots()? {
            if is_template_method(&program.u, owner) {
                continue;
            }
            inserted += check_block(&mut program.u, body)?;
        }
        debug!(inserted, "inserted union checks");
        Ok(())
    }
}

fn check_block(u: &mut Universe, block: NodeIndex) -> InternalResult<usize> {
    let stmts = u.nodes.block_stmts(block)?.to_vec();
    let mut inserted = 0;
    let mut pos = 0;
    for stmt in stmts {
        let mut reads = Vec::new();
        for expr in own_exprs(u, stmt) {
            collect_union_reads(u, expr, &mut reads);
        }
        for (base, field_id) in reads {
            let base_copy = u.nodes.deep_copy(base, &mut u.symbols, &mut CopyMap::new())?;
            let span = u.nodes.span(stmt);
            let mut b = u.nodes.builder(span);
            let id = b.int(field_id)?;
            let check = b.stmt(Prim::UnionCheck, vec![base_copy, id])?;
            u.nodes.insert_stmt(block, pos, check)?;
            pos += 1;
            inserted += 1;
            trace!(field_id, "inserted union check");
        }
        for nested in nested_blocks(u, stmt) {
            inserted += check_block(u, nested)?;
        }
        pos += 1;
    }
    Ok(inserted)
}

/// Expressions evaluated by the statement itself, not by nested blocks.
fn own_exprs(u: &Universe, stmt: NodeIndex) -> Vec<NodeIndex> {
    match u.nodes.kind(stmt) {
        Some(NodeKind::ExprStmt(expr)) => vec![*expr],
        Some(NodeKind::Def { init, .. }) if init.is_some() => vec![*init],
        Some(NodeKind::Return(value)) if value.is_some() => vec![*value],
        Some(NodeKind::Cond { cond, .. }) => vec![*cond],
        Some(NodeKind::Call { .. } | NodeKind::Member { .. }) => vec![stmt],
        _ => Vec::new(),
    }
}

fn nested_blocks(u: &Universe, stmt: NodeIndex) -> Vec<NodeIndex> {
    let mut out = Vec::new();
    let mut branch = stmt;
    loop {
        match u.nodes.kind(branch) {
            Some(NodeKind::Block(_)) => {
                out.push(branch);
                break;
            }
            Some(NodeKind::Cond {
                then_branch,
                else_branch,
                ..
            }) => {
                if matches!(u.nodes.kind(*then_branch), Some(NodeKind::Block(_))) {
                    out.push(*then_branch);
                }
                if else_branch.is_none() {
                    break;
                }
                branch = *else_branch;
            }
            _ => break,
        }
    }
    out
}

/// `(base, field id)` for every union field read in `expr`, innermost first.
fn collect_union_reads(u: &Universe, expr: NodeIndex, out: &mut Vec<(NodeIndex, i64)>) {
    match u.nodes.kind(expr) {
        Some(NodeKind::Member { base, field }) => {
            collect_union_reads(u, *base, out);
            if let Some(id) = union_field_id(u, *base, *field) {
                out.push((*base, id));
            }
        }
        Some(NodeKind::Call { callee, args }) => {
            let skip_target = matches!(callee, Callee::Prim(Prim::Assign));
            for (i, &arg) in args.iter().enumerate() {
                if skip_target && i == 0 {
                    if let Some(NodeKind::Member { base, .. }) = u.nodes.kind(arg) {
                        collect_union_reads(u, *base, out);
                    }
                    continue;
                }
                collect_union_reads(u, arg, out);
            }
        }
        _ => {}
    }
}

fn union_field_id(u: &Universe, base: NodeIndex, field: Atom) -> Option<i64> {
    let ty = u.expr_type(base)?;
    if !u.types.get(ty)?.as_aggregate()?.is_union {
        return None;
    }
    let sym = u.field_named(ty, field)?;
    let pos = u.data_fields(ty).ok()?.iter().position(|&f| f == sym)?;
    i64::try_from(pos + 1).ok()
}
