// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas settings, stored as RON.

use crate::error::ConfigError;
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid, zoom and extent settings of a canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Grid spacing in scene units
    pub grid_size: f32,
    /// Snap nodes to the grid when they are released
    pub snap_to_grid: bool,
    /// Draw grid lines behind the items
    pub grid_lines: bool,
    /// Scene extent as `[x, y, width, height]`
    pub scene_rect: [f32; 4],
    /// Lower zoom bound
    pub min_zoom: f32,
    /// Upper zoom bound
    pub max_zoom: f32,
    /// Wheel delta that doubles the zoom
    pub wheel_step: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            grid_size: 10.0,
            snap_to_grid: true,
            grid_lines: true,
            scene_rect: [-50000.0, -50000.0, 100_000.0, 100_000.0],
            min_zoom: 0.001,
            max_zoom: 100.0,
            wheel_step: 480.0,
        }
    }
}

impl CanvasConfig {
    /// Scene extent as a rectangle
    pub fn scene_rect(&self) -> Rect {
        let [x, y, w, h] = self.scene_rect;
        Rect::from_min_size(Pos2::new(x, y), Vec2::new(w, h))
    }

    /// Parse from RON text
    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    /// Render as pretty RON text
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::debug!("Loaded canvas config from {}", path.display());
        Ok(config)
    }

    /// Load from a file, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default canvas config, {} unreadable: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CanvasConfig::default();
        assert_eq!(config.grid_size, 10.0);
        assert!(config.snap_to_grid);
        assert_eq!(config.scene_rect().width(), 100_000.0);
        assert_eq!(config.scene_rect().min, Pos2::new(-50000.0, -50000.0));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = CanvasConfig::from_ron("(grid_size: 20.0)").expect("parse");
        assert_eq!(config.grid_size, 20.0);
        assert_eq!(config.max_zoom, 100.0);
    }

    #[test]
    fn test_bad_ron_is_an_error() {
        assert!(matches!(
            CanvasConfig::from_ron("(grid_size: \"wide\")"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("canvas-{}.ron", uuid::Uuid::new_v4()));
        let config = CanvasConfig {
            grid_size: 25.0,
            snap_to_grid: false,
            ..Default::default()
        };
        config.save(&path).expect("save");
        let loaded = CanvasConfig::load(&path).expect("load");
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = std::env::temp_dir().join("does-not-exist-canvas.ron");
        assert_eq!(CanvasConfig::load_or_default(&path), CanvasConfig::default());
    }
}
