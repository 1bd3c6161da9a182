//! Running local commands

use mycel_host_api::{HostError, HostResult};
use std::borrow::Cow;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const SUDO: &str = "/usr/bin/sudo";

/// Runs external programs, optionally through `sudo -n`
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner {
    use_sudo: bool,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self { use_sudo: false }
    }

    /// Run privileged commands through non-interactive sudo
    pub fn with_sudo() -> Self {
        Self { use_sudo: true }
    }

    /// Run a command and return its stdout; a non-zero exit is an error
    /// carrying stderr
    pub async fn run(&self, program: &str, args: &[String]) -> HostResult<String> {
        self.run_inner(program, args, false).await
    }

    /// Like [`run`](Self::run), elevated when the runner uses sudo
    pub async fn run_privileged(&self, program: &str, args: &[String]) -> HostResult<String> {
        self.run_inner(program, args, self.use_sudo).await
    }

    async fn run_inner(&self, program: &str, args: &[String], sudo: bool) -> HostResult<String> {
        let mut cmd = if sudo {
            let mut cmd = Command::new(SUDO);
            cmd.arg("-n").arg(program);
            cmd
        } else {
            Command::new(program)
        };
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %display_command(program, args), sudo, "Running command");

        let output = cmd
            .output()
            .await
            .map_err(|e| HostError::command(program, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HostError::command(
                program,
                format!("{}: {}", output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Render a command line for logs, quoted the way a shell would need it
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(|part| shell_escape::unix::escape(Cow::Borrowed(part)))
        .collect::<Vec<_>>()
        .join(" ")
}
