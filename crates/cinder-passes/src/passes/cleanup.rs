use cinder_ast::NodeKind;
use cinder_common::{InternalResult, NodeIndex};
use cinder_types::Universe;
use tracing::debug;

use crate::error::PassResult;
use crate::program::Program;
use crate::registry::Pass;

/// Splices nested statement blocks into their enclosing block. Empty nested
/// blocks disappear.
pub struct Cleanup;

impl Pass for Cleanup {
    fn name(&self) -> &'static str {
        "Cleanup"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        let mut flattened = 0;
        for (_, body) in program.code_roots()? {
            flattened += clean_block(&mut program.u, body)?;
        }
        debug!(flattened, "cleaned up blocks");
        Ok(())
    }
}

fn clean_block(u: &mut Universe, block: NodeIndex) -> InternalResult<usize> {
    let mut flattened = 0;
    for stmt in u.nodes.block_stmts(block)?.to_vec() {
        match u.nodes.kind(stmt) {
            Some(NodeKind::Block(_)) => {
                flattened += clean_block(u, stmt)?;
                u.nodes.flatten_block(block, stmt)?;
                flattened += 1;
            }
            Some(&NodeKind::Cond {
                then_branch,
                else_branch,
                ..
            }) => {
                for branch in [then_branch, else_branch] {
                    if matches!(u.nodes.kind(branch), Some(NodeKind::Block(_))) {
                        flattened += clean_block(u, branch)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(flattened)
}
