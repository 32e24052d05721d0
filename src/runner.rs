//! Step runners used by the CLI

use std::io::Write;

use crate::error::ChildFailure;
use crate::shell_exec::Cmd;
use crate::styling::{PROGRESS, PROGRESS_EMOJI, println};
use crate::sync::{Invocation, Step, StepRunner};

/// Runs each invocation as a real child process.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl StepRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), ChildFailure> {
        let what = match &invocation.step {
            Step::Manifest { location } => format!("Updating manifest in {}", location.display()),
            Step::FullBump => "Running full-project version bump".to_string(),
        };
        println!("{PROGRESS_EMOJI} {PROGRESS}{what}{PROGRESS:#}");

        Cmd::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.dir)
            .context(invocation.step.label())
            .stream()
    }
}

/// Prints each invocation instead of running it.
pub struct DryRunRunner<W> {
    out: W,
}

impl<W: Write> DryRunRunner<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> StepRunner for DryRunRunner<W> {
    fn run(&mut self, invocation: &Invocation) -> Result<(), ChildFailure> {
        writeln!(self.out, "{invocation}").map_err(|e| ChildFailure {
            code: 1,
            message: format!("Failed to write dry-run output: {e}"),
        })
    }
}
