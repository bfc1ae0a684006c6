//! Bounded execution of external commands.

use log::{debug, warn};
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::{ConnectionError, Result};

/// Runs host tools with a per-command deadline.
///
/// Children are killed when the deadline passes, so a hung supplicant
/// socket cannot stall the caller.
#[derive(Debug, Clone)]
pub(crate) struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runs `program args..` and returns stdout on a zero exit status.
    pub(crate) async fn run(&self, program: &Path, args: &[&str]) -> Result<String> {
        let label = describe(program, args);
        self.run_labelled(program, args, &label).await
    }

    /// Like [`run`](Self::run), but logs and reports `label` in place of
    /// the real arguments. Used when an argument is secret.
    pub(crate) async fn run_labelled(
        &self,
        program: &Path,
        args: &[&str],
        label: &str,
    ) -> Result<String> {
        let output = self.output(program, args, label).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("`{label}` exited with {:?}: {stderr}", output.status.code());
            return Err(ConnectionError::CommandFailed {
                cmd: label.to_string(),
                code: output.status.code(),
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs the command and returns its raw output, whatever the exit status.
    pub(crate) async fn output(&self, program: &Path, args: &[&str], label: &str) -> Result<Output> {
        debug!("Running `{label}`");

        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                warn!("Failed to spawn `{label}`: {e}");
                Err(ConnectionError::Io(e))
            }
            Err(_) => {
                warn!("`{label}` timed out after {:?}", self.timeout);
                Err(ConnectionError::CommandTimeout {
                    cmd: label.to_string(),
                    after: self.timeout,
                })
            }
        }
    }
}

fn describe(program: &Path, args: &[&str]) -> String {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());
    if args.is_empty() {
        name
    } else {
        format!("{name} {}", args.join(" "))
    }
}
