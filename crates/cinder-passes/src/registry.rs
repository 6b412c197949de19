use indexmap::IndexMap;

use crate::error::PassResult;
use crate::pass_list::{PassList, PassListError};
use crate::passes;
use crate::program::Program;

/// One named step of the pipeline. `args` is the free-form argument string
/// from the pass list.
pub trait Pass {
    fn name(&self) -> &'static str;
    fn run(&self, program: &mut Program, args: &str) -> PassResult;
}

/// Passes available to pass lists, by name.
pub struct PassRegistry {
    passes: IndexMap<&'static str, Box<dyn Pass>>,
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PassRegistry {
    pub fn empty() -> Self {
        PassRegistry {
            passes: IndexMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(passes::FilesToAst));
        registry.register(Box::new(passes::CreateEntryPoint));
        registry.register(Box::new(passes::Fixup));
        registry.register(Box::new(passes::Cleanup));
        registry.register(Box::new(passes::RunAnalysis));
        registry.register(Box::new(passes::ResolveSymbols));
        registry.register(Box::new(passes::FindUnknownTypes));
        registry.register(Box::new(passes::BuildDefaultFunctions));
        registry.register(Box::new(passes::MethodsToFunctions));
        registry.register(Box::new(passes::InsertUnionChecks));
        registry.register(Box::new(passes::Codegen));
        registry.register(Box::new(passes::BuildBinary));
        registry
    }

    /// Add a pass, replacing any pass of the same name.
    pub fn register(&mut self, pass: Box<dyn Pass>) {
        self.passes.insert(pass.name(), pass);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Pass> {
        self.passes.get(name).map(|p| p.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.keys().copied()
    }

    /// Fail on the first entry naming a pass that is not registered.
    pub fn check(&self, list: &PassList) -> Result<(), PassListError> {
        match list.entries().iter().find(|e| !self.passes.contains_key(e.name.as_str())) {
            Some(entry) => Err(PassListError::UnknownPass {
                line: entry.line,
                name: entry.name.clone(),
            }),
            None => Ok(()),
        }
    }
}
