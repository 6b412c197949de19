use cinder_ast::Parent;
use cinder_common::{NodeIndex, Span, TypeId, int_fatal};
use tracing::debug;

use crate::error::PassResult;
use crate::program::Program;
use crate::registry::Pass;
use crate::verify::verify_program;

/// With no argument, re-derives every parent link from the owners' child
/// lists. With `"verify"`, checks the whole program instead of repairing it.
pub struct Fixup;

impl Pass for Fixup {
    fn name(&self) -> &'static str {
        "Fixup"
    }

    fn run(&self, program: &mut Program, args: &str) -> PassResult {
        match args {
            "" => relink(program),
            "verify" => {
                verify_program(&program.u)?;
                Ok(())
            }
            other => Err(int_fatal!(Span::SYNTHETIC, "unknown Fixup mode '{}'", other).into()),
        }
    }
}

fn relink(program: &mut Program) -> PassResult {
    let roots = program.code_roots()?;
    for &(owner, body) in &roots {
        program.u.nodes.relink_subtree(body, Parent::Symbol(owner));
    }
    let owned: Vec<(TypeId, Vec<NodeIndex>)> = program
        .u
        .types
        .live()
        .map(|(id, t)| (id, t.owned_nodes()))
        .filter(|(_, nodes)| !nodes.is_empty())
        .collect();
    for (ty, nodes) in &owned {
        for &node in nodes {
            program.u.nodes.relink_subtree(node, Parent::Type(*ty));
        }
    }
    debug!(bodies = roots.len(), types = owned.len(), "relinked tree");
    Ok(())
}
