//! Zoom-level descriptors: the server-pixel extent of the projected world at
//! every zoom level, and the per-level context the projection needs.

use crate::{
    core::constants::{BASE_HALF_WORLD, MAX_ZOOM, MIN_ZOOM, TILE_SIZE},
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bounding box of the whole projected world at one zoom level, in server pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoomLevel {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

impl ZoomLevel {
    pub fn new(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> i64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i64 {
        self.y_max - self.y_min
    }

    /// Horizontal period of the repeating world.
    pub fn world_width(&self) -> i64 {
        2 * self.x_min.abs()
    }

    /// Number of tile columns and rows at this level.
    pub fn total_tiles(&self, tile_size: u32) -> (i64, i64) {
        let ts = tile_size as i64;
        (self.width() / ts + 1, self.height() / ts + 1)
    }

    /// Whether a tile whose image y coordinate is `y` lies inside the world.
    /// The world does not repeat vertically.
    pub fn contains_row(&self, y: i64) -> bool {
        y <= self.y_max && y > self.y_min
    }
}

/// Everything needed to interpret a server coordinate: the zoom level, its
/// extent and the tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomContext {
    pub zoom: u8,
    pub level: ZoomLevel,
    pub tile_size: u32,
}

impl ZoomContext {
    pub fn new(zoom: u8, level: ZoomLevel, tile_size: u32) -> Self {
        Self {
            zoom,
            level,
            tile_size,
        }
    }

    pub fn total_tiles(&self) -> (i64, i64) {
        self.level.total_tiles(self.tile_size)
    }

    /// Width of one full world in server pixels (`totalTilesX * tileSize`).
    pub fn world_span(&self) -> f64 {
        (self.total_tiles().0 * self.tile_size as i64) as f64
    }

    /// Brings `x` back into the canonical world by removing whole world spans.
    ///
    /// Tile columns land exactly in `[x_min, x_max]`; arbitrary points may sit
    /// up to a quarter tile past the left edge, which the projection tolerates.
    pub fn real_x(&self, x: f64) -> f64 {
        let span = self.world_span();
        let edge = if x < 0.0 {
            self.level.x_max
        } else {
            self.level.x_min
        } as f64;
        x - ((x - edge) / span).trunc() * span
    }
}

/// Number that may appear as either a JSON number or a quoted string, as in
/// the server's published range tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeValue {
    Number(i64),
    Text(String),
}

impl RangeValue {
    fn parse(&self, zoom: &str) -> Result<i64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s.trim().parse().map_err(|_| {
                MapError::Config(format!("zoom level {zoom}: '{s}' is not an integer"))
            }),
        }
    }
}

/// Serialized shape of a zoom table: `{"1": [x_min, y_min, x_max, y_max], ...}`.
pub type RawZoomRanges = BTreeMap<String, [RangeValue; 4]>;

/// Fixed table of zoom levels `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawZoomRanges", into = "RawZoomRanges")]
pub struct ZoomTable {
    levels: Vec<ZoomLevel>,
}

impl ZoomTable {
    /// Builds a table from levels ordered from zoom 1 upwards.
    pub fn new(levels: Vec<ZoomLevel>) -> Result<Self> {
        let table = Self { levels };
        table.validate()?;
        Ok(table)
    }

    /// Parses the range table format published by the tile server.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawZoomRanges = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    pub fn min_zoom(&self) -> u8 {
        MIN_ZOOM
    }

    pub fn max_zoom(&self) -> u8 {
        self.levels.len() as u8
    }

    pub fn level(&self, zoom: u8) -> Result<ZoomLevel> {
        if zoom < MIN_ZOOM {
            return Err(MapError::InvalidZoom(zoom as i64));
        }
        self.levels
            .get((zoom - MIN_ZOOM) as usize)
            .copied()
            .ok_or(MapError::InvalidZoom(zoom as i64))
    }

    pub fn context(&self, zoom: u8, tile_size: u32) -> Result<ZoomContext> {
        Ok(ZoomContext::new(zoom, self.level(zoom)?, tile_size))
    }

    pub fn levels(&self) -> &[ZoomLevel] {
        &self.levels
    }

    /// Clamps any requested zoom into the table's range.
    pub fn clamp_zoom(&self, zoom: i64) -> u8 {
        zoom.clamp(self.min_zoom() as i64, self.max_zoom() as i64) as u8
    }

    /// Shrinks `delta` so that `current + delta` stays inside the table.
    pub fn clamp_delta(&self, current: u8, delta: i32) -> i32 {
        let target = self.clamp_zoom(current as i64 + delta as i64);
        target as i32 - current as i32
    }

    fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(MapError::Config("zoom table is empty".into()));
        }
        if self.levels.len() > u8::MAX as usize {
            return Err(MapError::Config(format!(
                "zoom table has {} levels",
                self.levels.len()
            )));
        }

        let mut previous: Option<i64> = None;
        for (index, level) in self.levels.iter().enumerate() {
            let zoom = index + MIN_ZOOM as usize;
            if level.width() <= 0 || level.width() != level.height() {
                return Err(MapError::Config(format!(
                    "zoom level {zoom} is not a square world: {level:?}"
                )));
            }
            if previous.is_some_and(|width| level.width() <= width) {
                return Err(MapError::Config(format!(
                    "zoom level {zoom} does not grow past level {}",
                    zoom - 1
                )));
            }
            previous = Some(level.width());
        }
        Ok(())
    }
}

impl Default for ZoomTable {
    /// The server's production ranges for 256 px tiles: each level doubles the
    /// previous one, and the world spans `[-half, half - tile]` on both axes.
    fn default() -> Self {
        let ts = TILE_SIZE as i64;
        let levels = (MIN_ZOOM..=MAX_ZOOM)
            .map(|zoom| {
                let half = BASE_HALF_WORLD << (zoom - MIN_ZOOM);
                ZoomLevel::new(-half, -half, half - ts, half - ts)
            })
            .collect();
        Self { levels }
    }
}

impl TryFrom<RawZoomRanges> for ZoomTable {
    type Error = MapError;

    fn try_from(raw: RawZoomRanges) -> Result<Self> {
        let mut keyed = Vec::with_capacity(raw.len());
        for (key, values) in &raw {
            let zoom: u8 = key
                .trim()
                .parse()
                .map_err(|_| MapError::Config(format!("'{key}' is not a zoom level")))?;
            let [x_min, y_min, x_max, y_max] = values;
            keyed.push((
                zoom,
                ZoomLevel::new(
                    x_min.parse(key)?,
                    y_min.parse(key)?,
                    x_max.parse(key)?,
                    y_max.parse(key)?,
                ),
            ));
        }
        keyed.sort_by_key(|(zoom, _)| *zoom);

        for (expected, (zoom, _)) in (MIN_ZOOM..).zip(&keyed) {
            if *zoom != expected {
                return Err(MapError::Config(format!(
                    "zoom levels must run 1..=N without gaps, found {zoom} where {expected} was expected"
                )));
            }
        }

        Self::new(keyed.into_iter().map(|(_, level)| level).collect())
    }
}

impl From<ZoomTable> for RawZoomRanges {
    fn from(table: ZoomTable) -> Self {
        (MIN_ZOOM..)
            .zip(table.levels)
            .map(|(zoom, level)| {
                (
                    zoom.to_string(),
                    [
                        RangeValue::Number(level.x_min),
                        RangeValue::Number(level.y_min),
                        RangeValue::Number(level.x_max),
                        RangeValue::Number(level.y_max),
                    ],
                )
            })
            .collect()
    }
}
