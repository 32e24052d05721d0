//! Version synchronization
//!
//! A run is planned up front as an ordered list of [`Invocation`]s: one manifest
//! setter per configured location (only when manifests are being updated), then
//! the full-project bump. Planning does all the validation, so nothing is
//! executed for a run that can't complete its argument checks. Execution is
//! fail-fast: the first failing step ends the run, and steps that already
//! succeeded are not rolled back.

use std::fmt;
use std::path::PathBuf;

use crate::config::{CommandTemplate, SyncConfig};
use crate::error::{ChildFailure, SyncError};
use crate::version::VersionString;

/// The literal that turns manifest updates on. Every other value turns them off.
pub const UPDATE_MANIFESTS_TOKEN: &str = "1";

/// Interpret the first positional argument.
///
/// A missing argument is an error; a present one is true only when it is exactly `"1"`.
pub fn parse_update_flag(raw: Option<&str>) -> Result<bool, SyncError> {
    match raw {
        Some(raw) => Ok(raw == UPDATE_MANIFESTS_TOKEN),
        None => Err(SyncError::invalid_argument(
            "missing UPDATE_MANIFESTS argument (\"1\" to update manifests)",
        )),
    }
}

/// Which part of a run an invocation belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Manifest setter for one location, as configured (before root resolution)
    Manifest { location: PathBuf },
    /// Repository-wide bump at the project root
    FullBump,
}

impl Step {
    /// Short label used in logs and dry-run output.
    pub fn label(&self) -> String {
        match self {
            Step::Manifest { location } => location.display().to_string(),
            Step::FullBump => ".".to_string(),
        }
    }
}

/// One fully expanded external call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub step: Step,
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child
    pub dir: PathBuf,
}

impl Invocation {
    fn from_template(
        step: Step,
        template: &CommandTemplate,
        version: &VersionString,
        dir: PathBuf,
    ) -> Result<Self, SyncError> {
        let mut words = template.expand(version.as_str()).map_err(|e| {
            SyncError::invalid_argument(format!("cannot expand `{template}`: {e}"))
        })?;
        let program = words.remove(0);
        Ok(Self {
            step,
            program,
            args: words,
            dir,
        })
    }

    /// Command line with each word shell-escaped, for display.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|word| shell_escape::escape(word.as_str().into()).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step.label(), self.command_line())
    }
}

/// Executes planned invocations.
///
/// The CLI runs real processes or prints a dry run; tests record calls.
pub trait StepRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), ChildFailure>;
}

/// Drives one synchronization run over a project root.
pub struct Synchronizer<R> {
    root: PathBuf,
    config: SyncConfig,
    runner: R,
}

impl<R: StepRunner> Synchronizer<R> {
    pub fn new(root: impl Into<PathBuf>, config: SyncConfig, runner: R) -> Self {
        Self {
            root: root.into(),
            config,
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// The exact invocations [`Synchronizer::synchronize`] would run, in order.
    pub fn plan(
        &self,
        update_manifests: bool,
        version: &VersionString,
    ) -> Result<Vec<Invocation>, SyncError> {
        if self.config.strict_semver {
            version.require_semver()?;
        }

        let mut plan = Vec::with_capacity(self.config.manifests.len() + 1);
        if update_manifests {
            for (location, dir) in self
                .config
                .manifests
                .iter()
                .zip(self.config.manifest_dirs(&self.root))
            {
                plan.push(Invocation::from_template(
                    Step::Manifest {
                        location: location.clone(),
                    },
                    &self.config.manifest_command,
                    version,
                    dir,
                )?);
            }
        }
        plan.push(Invocation::from_template(
            Step::FullBump,
            &self.config.bump_command,
            version,
            self.root.clone(),
        )?);
        Ok(plan)
    }

    /// Update every manifest (when asked), then run the full-project bump.
    pub fn synchronize(
        &mut self,
        update_manifests: bool,
        version: &VersionString,
    ) -> Result<(), SyncError> {
        let plan = self.plan(update_manifests, version)?;
        log::info!(
            "Synchronizing version {} ({} step{})",
            version,
            plan.len(),
            if plan.len() == 1 { "" } else { "s" }
        );

        for invocation in &plan {
            log::info!("Running {}", invocation);
            if let Err(failure) = self.runner.run(invocation) {
                return Err(match &invocation.step {
                    Step::Manifest { location } => {
                        SyncError::manifest_update_failed(location, failure)
                    }
                    Step::FullBump => SyncError::full_bump_failed(failure),
                });
            }
        }
        Ok(())
    }
}
