//! External command execution
//!
//! Every external tool versync drives goes through [`Cmd`], which logs the
//! command line, emits a trace line with timing, and maps the child's exit
//! status onto a [`ChildFailure`] carrying the code to propagate.
//!
//! Child output is streamed, not captured: stdout is redirected to our stderr
//! at the OS level while stdin and stderr are inherited. Tools can still prompt
//! on the terminal, and versync's own stdout stays reserved for its summary
//! lines.

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::Instant;

use crate::error::{ChildFailure, SPAWN_FAILED_EXIT_CODE};

/// Monotonic epoch for trace timestamps.
///
/// All trace timestamps are relative to this epoch, so they stay monotonic even
/// if the system clock steps backward.
static TRACE_EPOCH: OnceLock<Instant> = OnceLock::new();

fn trace_epoch() -> &'static Instant {
    TRACE_EPOCH.get_or_init(Instant::now)
}

/// Builder for executing one external command with logging and tracing.
///
/// # Examples
///
/// ```ignore
/// Cmd::new("npm")
///     .args(["version", "2.0.0", "--no-git-tag-version"])
///     .current_dir(&manifest_dir)
///     .context("src/api")
///     .stream()?;
/// ```
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    context: Option<String>,
}

impl Cmd {
    /// Create a new command builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            context: None,
        }
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory for the command.
    ///
    /// The parent's cwd is never changed; each child gets its directory explicitly.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set the logging context (typically the manifest location).
    pub fn context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }

    fn command_string(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Run the command to completion, streaming its output.
    ///
    /// Blocks until the child exits. Returns an error if it could not be spawned,
    /// was killed by a signal, or exited non-zero.
    pub fn stream(self) -> Result<(), ChildFailure> {
        let cmd_str = self.command_string();

        match &self.context {
            Some(ctx) => log::debug!("$ {} [{}]", cmd_str, ctx),
            None => log::debug!("$ {}", cmd_str),
        }

        let t0 = Instant::now();
        let ts = t0.duration_since(*trace_epoch()).as_micros() as u64;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit());

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        let result = cmd.status();

        let dur_us = t0.elapsed().as_micros() as u64;
        let context = self.context.as_deref().unwrap_or("-");
        match &result {
            Ok(status) => log::debug!(
                "[versync-trace] ts={} context={} cmd=\"{}\" dur_us={} ok={}",
                ts,
                context,
                cmd_str,
                dur_us,
                status.success()
            ),
            Err(e) => log::debug!(
                "[versync-trace] ts={} context={} cmd=\"{}\" dur_us={} err=\"{}\"",
                ts,
                context,
                cmd_str,
                dur_us,
                e
            ),
        }

        let status = result.map_err(|e| ChildFailure {
            code: SPAWN_FAILED_EXIT_CODE,
            message: format!("Failed to execute {}: {}", self.program, e),
        })?;
        check_status(status)
    }
}

/// Map an exit status onto the code we propagate.
///
/// Signal deaths become 128 + signal number, matching Unix shell conventions.
fn check_status(status: ExitStatus) -> Result<(), ChildFailure> {
    #[cfg(unix)]
    if let Some(sig) = std::os::unix::process::ExitStatusExt::signal(&status) {
        return Err(ChildFailure {
            code: 128 + sig,
            message: format!("terminated by signal {}", sig),
        });
    }

    if !status.success() {
        let code = status.code().unwrap_or(1);
        return Err(ChildFailure {
            code,
            message: format!("exit status: {}", code),
        });
    }

    Ok(())
}
