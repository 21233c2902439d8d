// src/dispatch/runlog.rs

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clock::Clock;

/// Time prefix on every collected line.
const LINE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Per-run log.
///
/// Every line is emitted as a `tracing` event and kept in memory with its
/// wall-clock time; the collected text becomes the notification body.
#[derive(Debug, Clone)]
pub struct RunLog {
    stage: String,
    run_id: String,
    clock: Arc<dyn Clock>,
    lines: Vec<String>,
}

impl RunLog {
    pub fn new(stage: impl Into<String>, run_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            stage: stage.into(),
            run_id: run_id.into(),
            clock,
            lines: Vec::new(),
        }
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        info!(stage = %self.stage, run = %self.run_id, "{msg}");
        self.push("INFO", &msg);
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        warn!(stage = %self.stage, run = %self.run_id, "{msg}");
        self.push("WARNING", &msg);
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        error!(stage = %self.stage, run = %self.run_id, "{msg}");
        self.push("ERROR", &msg);
    }

    fn push(&mut self, level: &str, msg: &str) {
        let at = self.clock.now().format(LINE_TIME_FORMAT);
        self.lines.push(format!("{at} {level}: {msg}"));
    }

    pub fn body(&self) -> String {
        let mut body = self.lines.join("\n");
        body.push('\n');
        body
    }
}
