//! Runs a pass list over a program.
//!
//! States: `NotStarted -> Running(i) -> Completed`, or `Running(i) ->
//! Aborted` at the first failing pass. There is no rollback and no way to
//! resume an aborted run.

use std::time::{Duration, Instant};

use tracing::{debug, info, info_span};

use crate::error::Abort;
use crate::pass_list::{PassList, PassListError};
use crate::program::Program;
use crate::registry::PassRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    Running(usize),
    Completed,
    Aborted(Abort),
}

/// Audit entry of one executed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassRecord {
    pub name: String,
    pub args: String,
    pub elapsed: Duration,
    pub succeeded: bool,
}

pub struct Pipeline {
    list: PassList,
    registry: PassRegistry,
    state: PipelineState,
    history: Vec<PassRecord>,
}

impl Pipeline {
    /// Fails if the list names a pass the registry does not know.
    pub fn new(list: PassList, registry: PassRegistry) -> Result<Self, PassListError> {
        registry.check(&list)?;
        Ok(Pipeline {
            list,
            registry,
            state: PipelineState::NotStarted,
            history: Vec::new(),
        })
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn history(&self) -> &[PassRecord] {
        &self.history
    }

    pub fn list(&self) -> &PassList {
        &self.list
    }

    pub fn run(&mut self, program: &mut Program) -> Result<(), Abort> {
        if let PipelineState::Aborted(abort) = &self.state {
            return Err(abort.clone());
        }
        if self.state != PipelineState::NotStarted {
            return Ok(());
        }
        let started = Instant::now();
        for (index, entry) in self.list.entries().iter().enumerate() {
            self.state = PipelineState::Running(index);
            let Some(pass) = self.registry.get(&entry.name) else {
                // `new` checked every name.
                continue;
            };
            let span = info_span!("pass", pass = %entry.name, args = %entry.args);
            let _guard = span.enter();
            let start = Instant::now();
            let result = pass.run(program, &entry.args);
            let elapsed = start.elapsed();
            self.history.push(PassRecord {
                name: entry.name.clone(),
                args: entry.args.clone(),
                elapsed,
                succeeded: result.is_ok(),
            });
            if let Err(error) = result {
                let abort = Abort {
                    pass: entry.name.clone(),
                    index,
                    error,
                };
                info!(index, elapsed_us = elapsed.as_micros() as u64, "pass aborted");
                self.state = PipelineState::Aborted(abort.clone());
                return Err(abort);
            }
            debug!(index, elapsed_us = elapsed.as_micros() as u64, "pass done");
        }
        self.state = PipelineState::Completed;
        info!(
            passes = self.history.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline completed"
        );
        Ok(())
    }
}
