//! Configuration types for the SALVO toolkit.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::naming::LogType;

/// A single `keyword -> instrument tag` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRule {
    /// Substring searched for (case-sensitive) in the input name
    pub keyword: String,
    /// Instrument tag used in the canonical name
    pub tag: String,
}

/// A single `keyword -> log type` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTypeRule {
    /// Substring searched for in the lower-cased input name
    pub keyword: String,
    pub log_type: LogType,
}

/// Lookup tables used to derive canonical names.
///
/// Both tables are ordered: the first rule whose keyword matches wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingTables {
    /// Project prefix of every canonical name
    #[serde(default = "default_project")]
    pub project: String,

    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentRule>,

    #[serde(default = "default_log_types")]
    pub log_types: Vec<LogTypeRule>,
}

fn default_project() -> String {
    "salvo".to_string()
}

fn default_instruments() -> Vec<InstrumentRule> {
    [
        ("reachm2", "reachm2-salvo"),
        ("UAF_SALVO_R", "rs2-salvo"),
        ("REACH-BASE-", "rs2-salvo"),
        ("CEErover", "rs2-cee317"),
        ("CEEbase", "rs2-cee"),
    ]
    .into_iter()
    .map(|(keyword, tag)| InstrumentRule {
        keyword: keyword.to_string(),
        tag: tag.to_string(),
    })
    .collect()
}

fn default_log_types() -> Vec<LogTypeRule> {
    LogType::ALL
        .into_iter()
        .map(|log_type| LogTypeRule {
            keyword: log_type.as_str().to_string(),
            log_type,
        })
        .collect()
}

impl Default for NamingTables {
    fn default() -> Self {
        Self {
            project: default_project(),
            instruments: default_instruments(),
            log_types: default_log_types(),
        }
    }
}

/// Configuration for track distance computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceConfig {
    /// Column holding the X coordinate
    #[serde(default = "default_x_column")]
    pub x_column: String,

    /// Column holding the Y coordinate
    #[serde(default = "default_y_column")]
    pub y_column: String,

    /// Column holding the Z coordinate; ignored when absent from the table
    #[serde(default = "default_z_column")]
    pub z_column: Option<String>,

    /// Explicit origin point, defaults to the first point of the track
    #[serde(default)]
    pub origin: Option<Vec<f64>>,

    /// Suffix appended to the derived column names (e.g. "_el")
    #[serde(default)]
    pub column_suffix: String,

    /// Measure steps from the last finite point when points are missing
    #[serde(default)]
    pub carry_last_valid: bool,

    /// Step distance above which a gap before the point is reported
    #[serde(default)]
    pub gap_threshold: Option<f64>,

    /// Processing level used for derived output paths
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_x_column() -> String {
    "X".to_string()
}

fn default_y_column() -> String {
    "Y".to_string()
}

fn default_z_column() -> Option<String> {
    Some("Z".to_string())
}

fn default_level() -> String {
    "a".to_string()
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            x_column: default_x_column(),
            y_column: default_y_column(),
            z_column: default_z_column(),
            origin: None,
            column_suffix: String::new(),
            carry_last_valid: false,
            gap_threshold: None,
            level: default_level(),
        }
    }
}

/// Configuration for track plots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_plot_width")]
    pub width: u32,

    #[serde(default = "default_plot_height")]
    pub height: u32,

    /// Maximum points drawn (subsamples if exceeded)
    #[serde(default = "default_plot_max_points")]
    pub max_points: usize,
}

fn default_plot_width() -> u32 {
    1600
}

fn default_plot_height() -> u32 {
    1200
}

fn default_plot_max_points() -> usize {
    100_000
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_plot_width(),
            height: default_plot_height(),
            max_points: default_plot_max_points(),
        }
    }
}

/// Main configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalvoConfig {
    #[serde(default)]
    pub naming: NamingTables,

    #[serde(default)]
    pub distance: DistanceConfig,

    #[serde(default)]
    pub plot: PlotConfig,
}

impl SalvoConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: SalvoConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_naming_tables_order() {
        let tables = NamingTables::default();
        assert_eq!(tables.project, "salvo");
        assert_eq!(tables.instruments[0].keyword, "reachm2");
        assert_eq!(tables.instruments[4].tag, "rs2-cee");

        let keywords: Vec<&str> = tables.log_types.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["rinex", "ubx", "raw", "llh"]);
    }

    #[test]
    fn test_default_distance_config() {
        let config = SalvoConfig::default();
        assert_eq!(config.distance.x_column, "X");
        assert_eq!(config.distance.z_column.as_deref(), Some("Z"));
        assert!(config.distance.origin.is_none());
        assert_eq!(config.distance.level, "a");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "distance:\n  origin: [10.0, 20.0]\n  column_suffix: _el\n";
        let config: SalvoConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.distance.origin, Some(vec![10.0, 20.0]));
        assert_eq!(config.distance.column_suffix, "_el");
        assert_eq!(config.distance.y_column, "Y");
        assert_eq!(config.naming.instruments.len(), 5);
    }

    #[test]
    fn test_yaml_round_trip_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("salvo.yaml");

        let mut config = SalvoConfig::default();
        config.naming.instruments.insert(
            0,
            InstrumentRule {
                keyword: "EMLID-X".to_string(),
                tag: "rsx".to_string(),
            },
        );
        config.to_yaml(&path).unwrap();

        let loaded = SalvoConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.naming.instruments[0].tag, "rsx");
        assert_eq!(loaded.naming.log_types[1].log_type, LogType::Ubx);
    }
}
