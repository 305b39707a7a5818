//! Configuration for the tile engine.
//!
//! Every section has a serde default, so a JSON document only needs the keys
//! it wants to change. Build a [`MapConfig`] once and hand it to the map.

use crate::{
    core::{
        constants::{
            DEFAULT_TILE_SERVER, FILL_MARGIN, MAX_WHEEL_STEP, TILE_ENDPOINT, TILE_SIZE,
            WHEEL_COALESCE_MS,
        },
        zoom::{ZoomContext, ZoomTable},
    },
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where tile images come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileServerConfig {
    /// Hosts spread by the tile hash; at least one.
    pub servers: Vec<String>,
    /// Path segment of the tile endpoint.
    pub endpoint: String,
}

impl Default for TileServerConfig {
    fn default() -> Self {
        Self {
            servers: vec![DEFAULT_TILE_SERVER.to_string()],
            endpoint: TILE_ENDPOINT.to_string(),
        }
    }
}

/// Input tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub drag_enabled: bool,
    pub pan_enabled: bool,
    pub wheel_window_ms: u64,
    pub max_wheel_step: i32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_enabled: true,
            pan_enabled: true,
            wheel_window_ms: WHEEL_COALESCE_MS,
            max_wheel_step: MAX_WHEEL_STEP,
        }
    }
}

impl InteractionConfig {
    pub fn wheel_window(&self) -> Duration {
        Duration::from_millis(self.wheel_window_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub tile_size: u32,
    /// Tiles added to `viewport / tile_size` on each axis.
    pub fill_margin: u32,
    pub zoom_ranges: ZoomTable,
    pub tiles: TileServerConfig,
    pub interaction: InteractionConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            fill_margin: FILL_MARGIN,
            zoom_ranges: ZoomTable::default(),
            tiles: TileServerConfig::default(),
            interaction: InteractionConfig::default(),
        }
    }
}

impl MapConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(MapError::Config("tile_size must be positive".into()));
        }
        if self.fill_margin < 2 {
            return Err(MapError::Config(format!(
                "fill_margin {} leaves no room for the pan margin",
                self.fill_margin
            )));
        }
        if self.tiles.servers.is_empty() {
            return Err(MapError::Config("at least one tile server is required".into()));
        }
        if self.interaction.max_wheel_step <= 0 {
            return Err(MapError::Config("max_wheel_step must be positive".into()));
        }
        for level in self.zoom_ranges.levels() {
            if level.width() % self.tile_size as i64 != 0 {
                return Err(MapError::Config(format!(
                    "zoom range {level:?} is not a whole number of {} px tiles",
                    self.tile_size
                )));
            }
        }
        Ok(())
    }

    /// Zoom context for `zoom`, clamped into the configured range.
    pub fn context(&self, zoom: i64) -> ZoomContext {
        let zoom = self.zoom_ranges.clamp_zoom(zoom);
        ZoomContext::new(
            zoom,
            self.zoom_ranges.levels()[(zoom - self.zoom_ranges.min_zoom()) as usize],
            self.tile_size,
        )
    }
}
