// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stress run settings, stored as RON.

use nodeview_graph::CanvasConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors while reading or writing run settings
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// RON text did not match the settings layout
    #[error("Invalid stress config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Settings could not be rendered
    #[error("Failed to serialize: {0}")]
    Serialize(#[from] ron::Error),
}

/// Load scenario to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Scenario {
    /// Socketless nodes only
    NodeCount,
    /// Single-input nodes fanned out from one hub
    Connection,
    /// Every hub wired to every leaf
    #[default]
    Mesh,
}

/// Settings of a stress run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Scenario to run
    pub scenario: Scenario,
    /// Scattered nodes, or leaves for the mesh
    pub count: usize,
    /// Hub nodes for the mesh
    pub hubs: usize,
    /// Half side of the square nodes are scattered in
    pub radius: u32,
    /// How many times to repeat the scenario
    pub runs: usize,
    /// Canvas settings
    pub canvas: CanvasConfig,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::default(),
            count: 100,
            hubs: 10,
            radius: 5000,
            runs: 1,
            canvas: CanvasConfig::default(),
        }
    }
}

impl StressConfig {
    /// Parse from RON text
    pub fn from_ron(s: &str) -> Result<Self, DemoError> {
        Ok(ron::from_str(s)?)
    }

    /// Render as pretty RON text
    pub fn to_ron(&self) -> Result<String, DemoError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, DemoError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::info!("Loaded stress config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = StressConfig::from_ron("(scenario: Connection, count: 7)").expect("parse");
        assert_eq!(config.scenario, Scenario::Connection);
        assert_eq!(config.count, 7);
        assert_eq!(config.hubs, 10);
        assert_eq!(config.canvas, CanvasConfig::default());
    }

    #[test]
    fn test_nested_canvas_settings() {
        let config = StressConfig::from_ron("(canvas: (grid_size: 25.0, snap_to_grid: false))").expect("parse");
        assert_eq!(config.canvas.grid_size, 25.0);
        assert!(!config.canvas.snap_to_grid);
    }

    #[test]
    fn test_printed_config_parses_back() {
        let config = StressConfig {
            scenario: Scenario::NodeCount,
            runs: 3,
            ..Default::default()
        };
        let text = config.to_ron().expect("render");
        assert_eq!(StressConfig::from_ron(&text).expect("parse"), config);
    }

    #[test]
    fn test_unknown_scenario_is_rejected() {
        assert!(matches!(
            StressConfig::from_ron("(scenario: Spiral)"),
            Err(DemoError::Parse(_))
        ));
    }
}
