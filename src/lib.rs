//! # LMMap
//!
//! Tile-matrix and coordinate engine for a slippy map served by LMMap tile
//! servers.
//!
//! The crate converts between WGS84 degrees, MC2 fixed-point angles and the
//! server's Mercator pixel space, keeps a finite grid of reusable tile slots
//! aligned with the viewport while it is dragged, zoomed and resized, and
//! places points on the copy of the endlessly repeating world that is in
//! view. Drawing is left to the caller: every operation returns what to
//! fetch and where to put it.

pub mod core;
pub mod input;
pub mod prelude;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::MapConfig,
    geo::{BoundingBox, CoordSystem, GeoPoint, Point},
    map::{Map, PanPlan},
    viewport::{DragSurface, Viewport},
    wrap::{PlacementOptions, ScreenPosition, WorldWrap},
    zoom::{ZoomContext, ZoomLevel, ZoomTable},
};

pub use input::wheel::{WheelCoalescer, WheelZoom};

pub use tiles::{
    loader::{LoadCompletion, LoadOutcome, TileRequest},
    matrix::{MatrixUpdate, TileMatrix, TilePlacement},
    source::{LmMapSource, TileSource},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid zoom level: {0}")]
    InvalidZoom(i64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown tile slot: {0}")]
    UnknownSlot(u32),
}

/// Error type alias for convenience
pub type Error = MapError;
