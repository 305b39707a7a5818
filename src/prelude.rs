//! Prelude module for common lmmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use lmmap::prelude::*;`

pub use crate::core::{
    config::{InteractionConfig, MapConfig, TileServerConfig},
    geo::{BoundingBox, CoordSystem, GeoPoint, Point},
    map::{Map, PanPlan},
    projection::{distance_km, distance_miles, mc2_to_wgs84, wgs84_to_mc2, Axis},
    viewport::{DragSurface, Viewport},
    wrap::{PlacementOptions, ScreenPosition, WorldWrap},
    zoom::{ZoomContext, ZoomLevel, ZoomTable},
};

pub use crate::input::wheel::{WheelCoalescer, WheelZoom};

pub use crate::tiles::{
    loader::{LoadCompletion, LoadOutcome, LoadReport, TileRequest},
    matrix::{FillDimensions, MatrixUpdate, TileMatrix, TilePlacement},
    slot::{SlotId, SlotState},
    source::{LmMapSource, TileSource},
};

pub use crate::{Error as MapError, Result};

pub use std::time::Duration;

pub use instant::Instant;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
