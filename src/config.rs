// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Optional settings file, read from the working directory.
pub const SETTINGS_FILE: &str = "charts.yaml";

/// Which template a pipeline fills.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Map,
}

impl ChartKind {
    pub fn as_str(&self) -> &str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Map => "map",
        }
    }
}

/// One pipeline: CSV source → chart kind → output location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChartJob {
    pub kind: ChartKind,
    pub source: String,
    pub target: String,
}

impl ChartJob {
    pub fn new(kind: ChartKind, source: &str, target: &str) -> Self {
        Self {
            kind,
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory or `http(s)://` URL the data paths are relative to.
    pub base: String,
    /// Where the specs and the host page are written.
    pub out_dir: PathBuf,
    pub title: String,
    /// Boundary file, relative to the host page.
    pub boundaries: String,
    /// Join the income data against the boundaries locally and report
    /// states that would be left uncoloured.
    pub check_boundaries: bool,
    pub charts: Vec<ChartJob>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base: ".".to_string(),
            out_dir: PathBuf::from("."),
            title: "Australian Earnings".to_string(),
            boundaries: "australian-states.min.geojson".to_string(),
            check_boundaries: true,
            charts: vec![
                ChartJob::new(ChartKind::Bar, "cleaned_data_by_industry.csv", "earnings-chart"),
                ChartJob::new(ChartKind::Line, "cleaned_data_by_time.csv", "line-chart"),
                ChartJob::new(ChartKind::Map, "cleaned_data_by_state.csv", "map-container"),
            ],
        }
    }
}

impl Settings {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing settings")
    }

    /// Settings from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no settings file; using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let settings =
            Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))?;
        info!(path = %path.display(), charts = settings.charts.len(), "loaded settings");
        Ok(settings)
    }

    pub fn targets(&self) -> Vec<&str> {
        self.charts.iter().map(|c| c.target.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.targets(), vec!["earnings-chart", "line-chart", "map-container"]);
        assert_eq!(s.charts[2].kind, ChartKind::Map);
        assert!(s.check_boundaries);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() -> Result<()> {
        let s = Settings::from_yaml("base: https://example.com/data/\ncheck_boundaries: false\n")?;
        assert_eq!(s.base, "https://example.com/data/");
        assert!(!s.check_boundaries);
        assert_eq!(s.charts.len(), 3);
        Ok(())
    }

    #[test]
    fn test_custom_charts() -> Result<()> {
        let s = Settings::from_yaml(
            "charts:\n  - kind: line\n    source: weekly.csv\n    target: weekly-chart\n",
        )?;
        assert_eq!(s.charts, vec![ChartJob::new(ChartKind::Line, "weekly.csv", "weekly-chart")]);
        Ok(())
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Settings::from_yaml("bsae: .\n").is_err());
        let pie = "charts:\n  - kind: pie\n    source: a\n    target: b\n";
        assert!(Settings::from_yaml(pie).is_err());
    }

    #[test]
    fn test_load_or_default() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join(SETTINGS_FILE);
        assert_eq!(Settings::load_or_default(&path)?, Settings::default());

        std::fs::write(&path, "title: Pay gap\n")?;
        assert_eq!(Settings::load_or_default(&path)?.title, "Pay gap");
        Ok(())
    }
}
