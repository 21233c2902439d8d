use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Assay / instrument family a run belongs to.
///
/// The tag is what the demultiplexing stage writes into `seqtype.txt` and
/// what the analysis stage expects to read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SequencingType {
    Ngs580,
    It50,
    Archer,
}

impl SequencingType {
    /// Canonical tag, as written to and compared against `seqtype.txt`.
    pub fn tag(self) -> &'static str {
        match self {
            SequencingType::Ngs580 => "NGS580",
            SequencingType::It50 => "IT50",
            SequencingType::Archer => "Archer",
        }
    }
}

impl fmt::Display for SequencingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SequencingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ngs580" => Ok(SequencingType::Ngs580),
            "it50" => Ok(SequencingType::It50),
            "archer" => Ok(SequencingType::Archer),
            other => Err(format!(
                "unknown sequencing type: {other} (expected \"NGS580\", \"IT50\" or \"Archer\")"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for SequencingType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which downstream action a stage dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Demultiplexing,
    Analysis,
}

impl StageKind {
    /// Lowercase name used for on-disk markers.
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Demultiplexing => "demultiplexing",
            StageKind::Analysis => "analysis",
        }
    }

    /// Capitalised label used in notification subjects.
    pub fn label(self) -> &'static str {
        match self {
            StageKind::Demultiplexing => "Demultiplexing",
            StageKind::Analysis => "Analysis",
        }
    }

    /// Discovery mode used when a stage doesn't set one explicitly.
    pub fn default_discovery(self) -> DiscoveryMode {
        match self {
            StageKind::Demultiplexing => DiscoveryMode::SampleSheet,
            StageKind::Analysis => DiscoveryMode::Directory,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How candidate runs are enumerated for a stage.
///
/// - `SampleSheet`: an operator registers a run by dropping
///   `<runId>-SampleSheet.csv` into the stage's source directory.
/// - `Directory`: every subdirectory of the sequencer output root is a
///   candidate, minus the configured exclusions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    #[serde(alias = "sample_sheet")]
    SampleSheet,
    Directory,
}

/// What to do with the processed marker when the external trigger reports
/// failure.
///
/// - `KeepMarker` (default): never re-trigger a job that may have partially
///   started, at the cost of possibly missing a run.
/// - `ReleaseMarker`: remove the marker so the next sweep retries the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    KeepMarker,
    ReleaseMarker,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep_marker" | "keep" => Ok(FailurePolicy::KeepMarker),
            "release_marker" | "release" => Ok(FailurePolicy::ReleaseMarker),
            other => Err(format!(
                "invalid failure_policy: {other} (expected \"keep_marker\" or \"release_marker\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequencing_type_parses_case_insensitively() {
        assert_eq!("ngs580".parse::<SequencingType>(), Ok(SequencingType::Ngs580));
        assert_eq!(" ARCHER ".parse::<SequencingType>(), Ok(SequencingType::Archer));
        assert!("MiSeq".parse::<SequencingType>().is_err());
    }

    #[test]
    fn tag_round_trips_through_from_str() {
        for t in [SequencingType::Ngs580, SequencingType::It50, SequencingType::Archer] {
            assert_eq!(t.tag().parse::<SequencingType>(), Ok(t));
        }
    }
}
