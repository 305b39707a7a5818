//! World repetition: the projected world repeats horizontally forever, so every
//! server x has infinitely many screen copies. This module picks the copy that
//! is on (or nearest to) the current view.

use crate::core::{
    geo::{GeoPoint, Point},
    zoom::ZoomContext,
};
use serde::{Deserialize, Serialize};

/// How a point is placed by [`WorldWrap::screen_position`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementOptions {
    /// Extra pixels added to `x` before choosing the repetition. Large shapes
    /// pass their width so they stay on their world until fully off-screen.
    pub extra_distance: f64,
    /// When false the point keeps repetition 0. Used for path vertices, which
    /// must not be split across worlds.
    pub wrap: bool,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            extra_distance: 0.0,
            wrap: true,
        }
    }
}

impl PlacementOptions {
    pub fn with_extra_distance(extra_distance: f64) -> Self {
        Self {
            extra_distance,
            ..Self::default()
        }
    }

    pub fn unwrapped() -> Self {
        Self {
            wrap: false,
            ..Self::default()
        }
    }
}

/// Layer-relative pixel position of a point, in the frame tiles are placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenPosition {
    pub top: i64,
    pub left: i64,
    pub repetitions: i64,
    pub world_width: i64,
}

/// Snapshot of the viewport state the repetition math reads.
///
/// Built fresh for every query from the current viewport; never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldWrap {
    pub context: ZoomContext,
    pub origin: Point,
    pub drag: Point,
    pub layer_offset: Point,
    pub layer_position: Point,
}

impl WorldWrap {
    pub fn world_width(&self) -> f64 {
        self.context.world_span()
    }

    /// Canonical x inside `[x_min, x_max]`.
    pub fn real_x(&self, x: f64) -> f64 {
        self.context.real_x(x)
    }

    /// Number of world widths to add to `x` so it lands on the current view.
    pub fn repetitions(&self, x: f64, extra_distance: f64) -> i64 {
        let width = self.world_width();
        let aux = x + extra_distance - self.origin.x - self.drag.x - self.layer_offset.x;
        let whole = ((self.origin.x - aux) / width).trunc() as i64;
        if self.origin.x <= aux {
            whole
        } else {
            1 + whole
        }
    }

    /// Position of a server point relative to the map layer.
    pub fn screen_position_xy(&self, x: f64, y: f64, options: PlacementOptions) -> ScreenPosition {
        let repetitions = if options.wrap {
            self.repetitions(x, options.extra_distance)
        } else {
            0
        };
        let width = self.world_width();

        let left = x - self.origin.x - self.drag.x - self.layer_position.x + width * repetitions as f64;
        let top = -(y - self.origin.y + self.drag.y + self.layer_position.y);

        ScreenPosition {
            top: top.trunc() as i64,
            left: left.trunc() as i64,
            repetitions,
            world_width: width as i64,
        }
    }

    /// Position of any geographic point; it is first projected at the
    /// snapshot's zoom.
    pub fn screen_position(&self, point: &GeoPoint, options: PlacementOptions) -> ScreenPosition {
        let server = point.to_map(&self.context);
        self.screen_position_xy(server.x(), server.y(), options)
    }
}
