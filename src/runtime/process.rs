//! Running installed executables.

use anyhow::{Context, Result, anyhow, bail};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

use super::RealRuntime;

/// Upper bound on how long an installed executable may run.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn run_command_impl(&self, program: &Path, args: &[String]) -> Result<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start {:?}", program))?;

        // Pipes are read while waiting; a full pipe would stall the child.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        match child.wait_timeout(COMMAND_TIMEOUT)? {
            Some(status) => Ok(CommandOutput {
                success: status.success(),
                code: status.code(),
                stdout: collect(stdout)?,
                stderr: collect(stderr)?,
            }),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                bail!(
                    "{:?} timed out after {} seconds",
                    program,
                    COMMAND_TIMEOUT.as_secs()
                )
            }
        }
    }
}

type Drained = JoinHandle<std::io::Result<String>>;

fn drain<P: Read + Send + 'static>(pipe: Option<P>) -> Option<Drained> {
    pipe.map(|p| thread::spawn(move || std::io::read_to_string(p)))
}

fn collect(handle: Option<Drained>) -> Result<String> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| anyhow!("output reader thread panicked"))?
            .context("Failed to read command output"),
        None => Ok(String::new()),
    }
}
