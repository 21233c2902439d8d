#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use run_monitor::config::{ConfigFile, ConfigSection, NotifySection, RawConfigFile, StageConfig};
use run_monitor::types::{DiscoveryMode, FailurePolicy, SequencingType, StageKind};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(sequencer_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection {
                    sequencer_dir: sequencer_dir.into(),
                    state_dir: None,
                    log_dir: None,
                    quiescence: "90m".to_string(),
                    trigger_timeout: "30m".to_string(),
                    max_parallel: 1,
                    failure_policy: FailurePolicy::default(),
                },
                notify: NotifySection::default(),
                stage: BTreeMap::new(),
            },
        }
    }

    pub fn with_stage(mut self, name: &str, stage: StageConfig) -> Self {
        self.config.stage.insert(name.to_string(), stage);
        self
    }

    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.config.state_dir = Some(dir.into());
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.config.log_dir = Some(dir.into());
        self
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.config.config.max_parallel = n;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.config.failure_policy = policy;
        self
    }

    pub fn recipients(mut self, recipients: &[&str]) -> Self {
        self.config.notify.recipients = recipients.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `StageConfig`.
pub struct StageConfigBuilder {
    stage: StageConfig,
}

impl StageConfigBuilder {
    fn new(kind: StageKind, seqtype: SequencingType, script: &str) -> Self {
        Self {
            stage: StageConfig {
                kind,
                seqtype,
                script: script.to_string(),
                discovery: None,
                samplesheet_source_dir: None,
                samplesheet_processed_dir: None,
                exclude: None,
                recipients: None,
            },
        }
    }

    /// Sample-sheet driven demultiplexing stage.
    pub fn demultiplexing(
        seqtype: SequencingType,
        script: &str,
        source_dir: impl Into<PathBuf>,
    ) -> Self {
        let mut b = Self::new(StageKind::Demultiplexing, seqtype, script);
        b.stage.samplesheet_source_dir = Some(source_dir.into());
        b
    }

    /// Directory driven analysis stage.
    pub fn analysis(seqtype: SequencingType, script: &str) -> Self {
        Self::new(StageKind::Analysis, seqtype, script)
    }

    pub fn discovery(mut self, mode: DiscoveryMode) -> Self {
        self.stage.discovery = Some(mode);
        self
    }

    pub fn processed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stage.samplesheet_processed_dir = Some(dir.into());
        self
    }

    pub fn exclude(mut self, patterns: &[&str]) -> Self {
        self.stage.exclude = Some(patterns.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn recipients(mut self, recipients: &[&str]) -> Self {
        self.stage.recipients = Some(recipients.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn build(self) -> StageConfig {
        self.stage
    }
}
