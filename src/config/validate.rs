// src/config/validate.rs

use std::path::Path;
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile, StageConfig};
use crate::discovery::build_globset;
use crate::errors::{MonitorError, Result};
use crate::types::DiscoveryMode;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = MonitorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_stages(&raw)?;
        let (quiescence, trigger_timeout) = validate_global_config(&raw)?;
        for (name, stage) in raw.stage.iter() {
            validate_stage(name, stage)?;
        }
        Ok(ConfigFile::new_unchecked(
            raw.config,
            raw.notify,
            raw.stage,
            quiescence,
            trigger_timeout,
        ))
    }
}

fn ensure_has_stages(cfg: &RawConfigFile) -> Result<()> {
    if cfg.stage.is_empty() {
        return Err(MonitorError::Config(
            "config must contain at least one [stage.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<(Duration, Duration)> {
    let section = &cfg.config;

    if section.sequencer_dir.as_os_str().is_empty() {
        return Err(MonitorError::Config(
            "[config].sequencer_dir must not be empty".to_string(),
        ));
    }

    if section.max_parallel == 0 {
        return Err(MonitorError::Config(
            "[config].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }

    let quiescence = positive_duration("quiescence", &section.quiescence)?;
    let trigger_timeout = positive_duration("trigger_timeout", &section.trigger_timeout)?;

    Ok((quiescence, trigger_timeout))
}

fn positive_duration(field: &str, raw: &str) -> Result<Duration> {
    let d = parse_duration(raw)
        .map_err(|e| MonitorError::Config(format!("[config].{field}: {e}")))?;
    if d.is_zero() {
        return Err(MonitorError::Config(format!(
            "[config].{field} must be greater than zero"
        )));
    }
    Ok(d)
}

fn validate_stage(name: &str, stage: &StageConfig) -> Result<()> {
    if !is_path_component(name) {
        return Err(MonitorError::Config(format!(
            "stage name '{name}' must be a single path component"
        )));
    }

    if stage.script.trim().is_empty() {
        return Err(MonitorError::Config(format!(
            "stage '{name}' has an empty `script`"
        )));
    }

    if stage.discovery_mode() == DiscoveryMode::SampleSheet && stage.samplesheet_source_dir.is_none()
    {
        return Err(MonitorError::Config(format!(
            "stage '{name}' uses sample sheet discovery but has no `samplesheet_source_dir`"
        )));
    }

    build_globset(&stage.effective_exclude()).map_err(|e| {
        MonitorError::Config(format!("stage '{name}' has an invalid `exclude` pattern: {e:#}"))
    })?;

    Ok(())
}

/// Stage names and run ids are used as single path components.
pub(crate) fn is_path_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && Path::new(name).components().count() == 1
        && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(toml_src)?;
        ConfigFile::try_from(raw)
    }

    const BASE: &str = r#"
[config]
sequencer_dir = "/seq"
"#;

    #[test]
    fn minimal_demultiplexing_stage_gets_defaults() {
        let cfg = parse(&format!(
            r#"{BASE}
[stage.NGS580_demultiplexing]
kind = "demultiplexing"
seqtype = "NGS580"
script = "/scripts/demux.sh"
samplesheet_source_dir = "/inbox"
"#
        ))
        .unwrap();

        assert_eq!(cfg.quiescence(), Duration::from_secs(5400));
        assert_eq!(cfg.trigger_timeout(), Duration::from_secs(1800));
        assert_eq!(cfg.state_dir(), Path::new("/seq/.run-monitor"));
        let stage = &cfg.stage["NGS580_demultiplexing"];
        assert_eq!(stage.discovery_mode(), DiscoveryMode::SampleSheet);
    }

    #[test]
    fn sample_sheet_discovery_requires_source_dir() {
        let err = parse(&format!(
            r#"{BASE}
[stage.demux]
kind = "demultiplexing"
seqtype = "NGS580"
script = "/scripts/demux.sh"
"#
        ))
        .unwrap_err();
        assert!(matches!(err, MonitorError::Config(msg) if msg.contains("samplesheet_source_dir")));
    }

    #[test]
    fn unknown_seqtype_is_rejected() {
        let err = parse(&format!(
            r#"{BASE}
[stage.x]
kind = "analysis"
seqtype = "MiSeqXYZ"
script = "/s.sh"
"#
        ))
        .unwrap_err();
        assert!(matches!(err, MonitorError::Toml(_)));
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let err = parse(
            r#"
[config]
sequencer_dir = "/seq"
max_parallel = 0

[stage.a]
kind = "analysis"
seqtype = "NGS580"
script = "/s.sh"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, MonitorError::Config(msg) if msg.contains("max_parallel")));
    }

    #[test]
    fn no_stages_is_rejected() {
        assert!(matches!(parse(BASE), Err(MonitorError::Config(_))));
    }

    #[test]
    fn stage_names_cannot_contain_separators() {
        let err = parse(&format!(
            r#"{BASE}
[stage."../x"]
kind = "analysis"
seqtype = "NGS580"
script = "/s.sh"
"#
        ))
        .unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn bad_exclude_glob_is_a_config_error() {
        let err = parse(&format!(
            r#"{BASE}
[stage.a]
kind = "analysis"
seqtype = "NGS580"
script = "/s.sh"
exclude = ["[unclosed"]
"#
        ))
        .unwrap_err();
        assert!(matches!(err, MonitorError::Config(msg) if msg.contains("exclude")));
    }
}
