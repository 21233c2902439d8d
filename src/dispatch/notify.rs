// src/dispatch/notify.rs

//! Notification transport.
//!
//! The controller doesn't speak SMTP; it hands the subject and body to an
//! external mail command (e.g. `mutt`) or, without one, just logs them.

use std::fmt::Debug;
use std::future::Future;
use std::io::ErrorKind;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::trigger::{shell, shell_quote};
use crate::types::StageKind;

/// A message about one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

/// `"[<Stage>] <Event> <runId>"`.
pub fn subject(stage: StageKind, event: &str, run_id: &str) -> String {
    format!("[{}] {} {}", stage.label(), event, run_id)
}

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

pub trait Notifier: Send + Sync + Debug {
    fn notify<'a>(&'a self, notification: &'a Notification) -> NotifyFuture<'a>;
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> NotifyFuture<'a> {
        Box::pin(async move {
            info!(
                subject = %notification.subject,
                recipients = ?notification.recipients,
                "notification (no notify command configured)"
            );
            debug!(body = %notification.body, "notification body");
            Ok(())
        })
    }
}

/// Runs a shell command template with the body on stdin.
///
/// Placeholders: `{subject}`, `{recipients}` (space separated), `{reply_to}`.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    template: String,
    reply_to: Option<String>,
    timeout: Duration,
}

impl CommandNotifier {
    pub fn new(template: impl Into<String>, reply_to: Option<String>, timeout: Duration) -> Self {
        Self {
            template: template.into(),
            reply_to,
            timeout,
        }
    }

    pub fn render(&self, notification: &Notification) -> String {
        let recipients = notification
            .recipients
            .iter()
            .map(|r| shell_quote(r))
            .collect::<Vec<_>>()
            .join(" ");
        let reply_to = self.reply_to.as_deref().map(shell_quote).unwrap_or_default();
        self.template
            .replace("{subject}", &shell_quote(&notification.subject))
            .replace("{recipients}", &recipients)
            .replace("{reply_to}", &reply_to)
    }
}

impl Notifier for CommandNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> NotifyFuture<'a> {
        Box::pin(async move {
            let command = self.render(notification);
            debug!(cmd = %command, "sending notification");

            let mut cmd = shell(&command);
            cmd.stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let mut child = cmd
                .spawn()
                .with_context(|| format!("spawning notify command '{command}'"))?;

            // Body write and wait share one deadline; dropping the future on
            // timeout kills the child.
            let exchange = async move {
                if let Some(mut stdin) = child.stdin.take() {
                    match stdin.write_all(notification.body.as_bytes()).await {
                        // Exited without reading; its status says why.
                        Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
                        other => other.context("writing notification body to notify command")?,
                    }
                    // Close stdin so the mailer sees EOF.
                    drop(stdin);
                }
                child
                    .wait_with_output()
                    .await
                    .context("waiting for notify command")
            };

            let output = tokio::time::timeout(self.timeout, exchange)
                .await
                .with_context(|| {
                    format!("notify command did not finish within {:?}", self.timeout)
                })??;

            if !output.status.success() {
                bail!(
                    "notify command exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }

            info!(subject = %notification.subject, "notification sent");
            Ok(())
        })
    }
}

/// `<user>@<server>`, using `$USER` (or `$USERNAME`).
pub fn reply_to_address(server: &str) -> Option<String> {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()?;
    Some(format!("{user}@{server}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> Notification {
        Notification {
            subject: subject(StageKind::Demultiplexing, "Started", "170101_X_0001"),
            body: "INFO: hello\n".to_string(),
            recipients: vec!["a@lab.org".to_string(), "b@lab.org".to_string()],
        }
    }

    #[test]
    fn subject_follows_stage_event_run_layout() {
        assert_eq!(note().subject, "[Demultiplexing] Started 170101_X_0001");
    }

    #[test]
    fn render_fills_placeholders_with_quoted_values() {
        let n = CommandNotifier::new(
            "mutt -s {subject} -e 'my_hdr Reply-To:{reply_to}' {recipients}",
            Some("me@lab.org".to_string()),
            Duration::from_secs(5),
        );
        assert_eq!(
            n.render(&note()),
            "mutt -s '[Demultiplexing] Started 170101_X_0001' -e 'my_hdr Reply-To:me@lab.org' a@lab.org b@lab.org"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn body_is_piped_to_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("mail.txt");
        let n = CommandNotifier::new(
            format!("cat > {}", out.display()),
            None,
            Duration::from_secs(10),
        );

        n.notify(&note()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "INFO: hello\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_is_reported() {
        let n = CommandNotifier::new("exit 1", None, Duration::from_secs(10));
        assert!(n.notify(&note()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_covers_a_mailer_that_never_reads_the_body() {
        let n = CommandNotifier::new("sleep 20", None, Duration::from_secs(1));
        let mut big = note();
        // Well past any pipe buffer.
        big.body = "x".repeat(1024 * 1024);

        let started = std::time::Instant::now();
        let result = tokio::time::timeout(Duration::from_secs(8), n.notify(&big))
            .await
            .expect("notify must honour its own timeout");

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("did not finish within"), "{err:#}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
