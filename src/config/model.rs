// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::discovery::{DEFAULT_EXCLUDES, HIDDEN_EXCLUDE};
use crate::types::{DiscoveryMode, FailurePolicy, SequencingType, StageKind};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// sequencer_dir = "/data/quicksilver"
/// quiescence = "90m"
///
/// [notify]
/// command = "mutt -s {subject} {recipients}"
/// recipients = ["lab@example.org"]
///
/// [stage.NGS580_demultiplexing]
/// kind = "demultiplexing"
/// seqtype = "NGS580"
/// script = "/scripts/demultiplex-NGS580-WES.sh"
/// samplesheet_source_dir = "/data/quicksilver/to_be_demultiplexed/NGS580"
/// ```
///
/// This is the raw, unvalidated form. Use `ConfigFile::try_from` (or
/// [`crate::config::load_and_validate`]) to obtain a checked [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global settings from `[config]`.
    pub config: ConfigSection,

    /// Notification transport from `[notify]`.
    #[serde(default)]
    pub notify: NotifySection,

    /// All stages from `[stage.<name>]`, keyed by stage name.
    #[serde(default)]
    pub stage: BTreeMap<String, StageConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub notify: NotifySection,
    pub stage: BTreeMap<String, StageConfig>,
    quiescence: Duration,
    trigger_timeout: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        notify: NotifySection,
        stage: BTreeMap<String, StageConfig>,
        quiescence: Duration,
        trigger_timeout: Duration,
    ) -> Self {
        Self {
            config,
            notify,
            stage,
            quiescence,
            trigger_timeout,
        }
    }

    /// Minimum age of the RTAComplete stamp before a run is touched.
    pub fn quiescence(&self) -> Duration {
        self.quiescence
    }

    /// Upper bound on a single external trigger command.
    pub fn trigger_timeout(&self) -> Duration {
        self.trigger_timeout
    }

    /// Where processed markers live; defaults to `<sequencer_dir>/.run-monitor`.
    pub fn state_dir(&self) -> PathBuf {
        self.config
            .state_dir
            .clone()
            .unwrap_or_else(|| self.config.sequencer_dir.join(".run-monitor"))
    }

    /// Exclude globs for directory discovery of `stage`.
    ///
    /// The state and log directories are added when they sit directly in
    /// `sequencer_dir`, so they are never taken for runs.
    pub fn discovery_excludes(&self, stage: &StageConfig) -> Vec<String> {
        let mut list = stage.effective_exclude();
        let own_dirs = [Some(self.state_dir()), self.config.log_dir.clone()];
        for dir in own_dirs.into_iter().flatten() {
            if dir.parent() != Some(self.config.sequencer_dir.as_path()) {
                continue;
            }
            if let Some(name) = dir.file_name().and_then(|n| n.to_str()) {
                let pattern = globset::escape(name);
                if !list.contains(&pattern) {
                    list.push(pattern);
                }
            }
        }
        list
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Directory holding one subdirectory per sequencer run.
    pub sequencer_dir: PathBuf,

    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// If set, each dispatched run's log is also written to
    /// `<log_dir>/<run_id>.<timestamp>.log`.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Duration string, e.g. `"90m"`.
    #[serde(default = "default_quiescence")]
    pub quiescence: String,

    /// Duration string, e.g. `"30m"`.
    #[serde(default = "default_trigger_timeout")]
    pub trigger_timeout: String,

    /// Number of runs dispatched concurrently within a stage.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_quiescence() -> String {
    "90m".to_string()
}

fn default_trigger_timeout() -> String {
    "30m".to_string()
}

fn default_max_parallel() -> usize {
    1
}

/// `[notify]` section.
///
/// `command` is run through the shell with the per-run log on stdin.
/// Placeholders `{subject}`, `{recipients}` and `{reply_to}` are replaced
/// with shell-quoted values. Without a command, notifications only go to
/// the log.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotifySection {
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub recipients: Vec<String>,

    /// Reply-to becomes `<user>@<reply_to_server>`.
    #[serde(default)]
    pub reply_to_server: Option<String>,
}

/// `[stage.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub kind: StageKind,

    pub seqtype: SequencingType,

    /// External command; invoked as `<script> <runId>`.
    pub script: String,

    /// Defaults to `samplesheet` for demultiplexing, `directory` for analysis.
    #[serde(default)]
    pub discovery: Option<DiscoveryMode>,

    /// Directory scanned for `<runId>-SampleSheet.csv`.
    #[serde(default)]
    pub samplesheet_source_dir: Option<PathBuf>,

    /// Inbound sample sheets are moved here after dispatch.
    #[serde(default)]
    pub samplesheet_processed_dir: Option<PathBuf>,

    /// Basename globs excluded from directory discovery.
    ///
    /// If `None`, `DEFAULT_EXCLUDES` applies. Hidden directories are
    /// excluded either way.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// Overrides `notify.recipients` for this stage.
    #[serde(default)]
    pub recipients: Option<Vec<String>>,
}

impl StageConfig {
    pub fn discovery_mode(&self) -> DiscoveryMode {
        self.discovery
            .unwrap_or_else(|| self.kind.default_discovery())
    }

    /// Configured or default excludes; [`HIDDEN_EXCLUDE`] is always present.
    pub fn effective_exclude(&self) -> Vec<String> {
        let mut list = match &self.exclude {
            Some(list) => list.clone(),
            None => DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        };
        if !list.iter().any(|p| p == HIDDEN_EXCLUDE) {
            list.push(HIDDEN_EXCLUDE.to_string());
        }
        list
    }

    pub fn effective_recipients(&self, notify: &NotifySection) -> Vec<String> {
        self.recipients
            .clone()
            .unwrap_or_else(|| notify.recipients.clone())
    }
}
