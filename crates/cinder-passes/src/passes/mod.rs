//! Built-in passes, in the order the default pass list runs them.

mod analysis;
mod cleanup;
mod codegen;
mod default_functions;
mod entry_point;
mod files_to_ast;
mod fixup;
mod methods;
mod resolve;
mod union_checks;
mod unknown_types;

pub use analysis::RunAnalysis;
pub use cleanup::Cleanup;
pub use codegen::{BuildBinary, Codegen};
pub use default_functions::BuildDefaultFunctions;
pub use entry_point::{CreateEntryPoint, ENTRY_NAME, USER_MAIN_NAME};
pub use files_to_ast::FilesToAst;
pub use fixup::Fixup;
pub use methods::MethodsToFunctions;
pub use resolve::ResolveSymbols;
pub use union_checks::InsertUnionChecks;
pub use unknown_types::FindUnknownTypes;

pub(crate) use analysis::infer_var_types;

use cinder_ast::NodeKind;
use cinder_common::{NodeIndex, SymbolId};
use cinder_types::Universe;

/// Symbols defined by `Def` nodes anywhere below `root`.
pub(crate) fn defs_below(u: &Universe, root: NodeIndex) -> Vec<(NodeIndex, SymbolId)> {
    let mut out = Vec::new();
    u.nodes.walk(root, &mut |idx, node| {
        if let NodeKind::Def { sym, .. } = &node.kind {
            out.push((idx, *sym));
        }
    });
    out
}

/// Whether `fn_sym` is a method of a generic template, whose code is only
/// ever used through instantiation.
pub(crate) fn is_template_method(u: &Universe, fn_sym: SymbolId) -> bool {
    u.symbols
        .get(fn_sym)
        .and_then(|s| s.fn_info())
        .and_then(|info| info.owner)
        .and_then(|owner| u.types.get(owner))
        .is_some_and(|t| t.is_pattern())
}
