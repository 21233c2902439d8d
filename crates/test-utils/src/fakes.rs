use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use run_monitor::dispatch::notify::NotifyFuture;
use run_monitor::dispatch::trigger::TriggerFuture;
use run_monitor::dispatch::{Notification, Notifier, Trigger, TriggerOutput};

/// A fake trigger that:
/// - records every command it was asked to run
/// - optionally sleeps, to keep a dispatch in flight
/// - reports a fixed exit code, or fails to start at all.
#[derive(Debug, Clone, Default)]
pub struct RecordingTrigger {
    exit_code: i32,
    fail_to_start: bool,
    delay: Option<Duration>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl RecordingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exiting_with(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn failing_to_start(mut self) -> Self {
        self.fail_to_start = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl Trigger for RecordingTrigger {
    fn trigger<'a>(&'a self, command: &'a str) -> TriggerFuture<'a> {
        let commands = Arc::clone(&self.commands);
        Box::pin(async move {
            commands.lock().unwrap().push(command.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_to_start {
                return Err(anyhow!("failed to spawn '{command}'"));
            }
            Ok(TriggerOutput {
                exit_code: self.exit_code,
                stdout: String::new(),
                stderr: if self.exit_code == 0 {
                    String::new()
                } else {
                    "pipeline refused the run".to_string()
                },
            })
        })
    }
}

/// A fake notifier that keeps every notification, or fails each one.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    fail: bool,
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> NotifyFuture<'a> {
        Box::pin(async move {
            if self.fail {
                return Err(anyhow!("mail transport unavailable"));
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        })
    }
}
