// src/dispatch/trigger.rs

//! External command invocation.
//!
//! The dispatcher talks to a `Trigger` instead of spawning processes
//! directly, so tests can record invocations without running anything.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::process::Command;
use tracing::{debug, info};

/// What the external command reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOutput {
    /// Exit code; `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TriggerOutput {
    /// Only a zero exit status counts as started.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub type TriggerFuture<'a> = Pin<Box<dyn Future<Output = Result<TriggerOutput>> + Send + 'a>>;

/// Trait abstracting how the stage's external command is run.
///
/// An `Err` means the command could not be started or did not finish in
/// time; a command that ran and exited non-zero is an `Ok` with that code.
pub trait Trigger: Send + Sync + Debug {
    fn trigger<'a>(&'a self, command: &'a str) -> TriggerFuture<'a>;
}

/// `<script> <runId>`, quoting the run id if it holds anything unusual.
pub fn trigger_command(script: &str, run_id: &str) -> String {
    format!("{} {}", script.trim(), shell_quote(run_id))
}

/// Single-quote `value` for `sh` unless it is made only of safe characters.
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '@' | ':'));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// Build a shell command appropriate for the platform.
pub(crate) fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

/// Runs the command through the shell and waits for it, up to `timeout`.
///
/// On timeout the child is killed and an error is returned.
#[derive(Debug, Clone)]
pub struct ShellTrigger {
    timeout: Duration,
}

impl ShellTrigger {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Trigger for ShellTrigger {
    fn trigger<'a>(&'a self, command: &'a str) -> TriggerFuture<'a> {
        Box::pin(async move {
            info!(cmd = %command, "starting trigger command");

            let mut cmd = shell(command);
            cmd.stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let child = cmd
                .spawn()
                .with_context(|| format!("spawning trigger command '{command}'"))?;

            let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
                Ok(res) => res.with_context(|| format!("waiting for trigger command '{command}'"))?,
                // Dropping the future drops the child, which kills it.
                Err(_) => {
                    return Err(anyhow!(
                        "trigger command '{command}' did not finish within {:?}",
                        self.timeout
                    ));
                }
            };

            let result = TriggerOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };

            debug!(cmd = %command, stderr = %result.stderr.trim(), "trigger stderr");
            info!(
                cmd = %command,
                exit_code = result.exit_code,
                success = result.success(),
                "trigger command exited"
            );

            Ok(result)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_appends_run_id() {
        assert_eq!(
            trigger_command("/scripts/demux.sh ", "170101_X_0001"),
            "/scripts/demux.sh 170101_X_0001"
        );
    }

    #[test]
    fn odd_run_ids_are_quoted() {
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("x;rm"), "'x;rm'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_exit_status_and_stdout() {
        let trigger = ShellTrigger::new(Duration::from_secs(10));

        let ok = trigger.trigger("echo started").await.unwrap();
        assert!(ok.success());
        assert_eq!(ok.stdout.trim(), "started");

        let failed = trigger.trigger("echo nope >&2; exit 3").await.unwrap();
        assert_eq!(failed.exit_code, 3);
        assert!(!failed.success());
        assert_eq!(failed.stderr.trim(), "nope");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        let trigger = ShellTrigger::new(Duration::from_millis(200));
        let err = trigger.trigger("sleep 5").await.unwrap_err();
        assert!(err.to_string().contains("did not finish"));
    }
}
