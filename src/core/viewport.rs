use crate::core::{
    geo::{GeoPoint, Point},
    wrap::WorldWrap,
    zoom::ZoomContext,
};
use serde::{Deserialize, Serialize};

/// The element the user drags. The rendering layer owns it; the engine only
/// reads its current translation.
pub trait DragSurface {
    fn offset(&self) -> Point;
}

impl DragSurface for Point {
    fn offset(&self) -> Point {
        *self
    }
}

/// Tracks which part of the server's pixel space is under the viewport.
///
/// Three offsets combine into the origin (the server point at the viewport's
/// top-left pixel):
/// - the drag surface translation, changed by the user,
/// - the logical map layer offset, fixed when the view is anchored,
/// - the anchor itself, `(left server x, -top server y)` at anchoring time.
///
/// The layer is physically placed at `layer_position = -drag` at anchoring
/// time, so a freshly anchored view shows its tiles at their own positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    context: ZoomContext,
    size: Point,
    page_position: Point,
    drag: Point,
    anchor: Point,
    layer_offset: Point,
    layer_position: Point,
    origin: Point,
}

impl Viewport {
    pub fn new(context: ZoomContext, size: Point) -> Self {
        let mut viewport = Self {
            context,
            size,
            page_position: Point::default(),
            drag: Point::default(),
            anchor: Point::default(),
            layer_offset: Point::default(),
            layer_position: Point::default(),
            origin: Point::default(),
        };
        viewport.set_anchor(Point::default());
        viewport
    }

    pub fn context(&self) -> &ZoomContext {
        &self.context
    }

    pub fn zoom(&self) -> u8 {
        self.context.zoom
    }

    pub fn tile_size(&self) -> f64 {
        self.context.tile_size as f64
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn width(&self) -> f64 {
        self.size.x
    }

    pub fn height(&self) -> f64 {
        self.size.y
    }

    pub fn page_position(&self) -> Point {
        self.page_position
    }

    pub fn drag(&self) -> Point {
        self.drag
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn layer_offset(&self) -> Point {
        self.layer_offset
    }

    pub fn layer_position(&self) -> Point {
        self.layer_position
    }

    /// Switches zoom level. The anchor is left alone; callers re-anchor.
    pub fn set_context(&mut self, context: ZoomContext) {
        self.context = context;
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = Point::new(width, height);
    }

    pub fn set_page_position(&mut self, position: Point) {
        self.page_position = position;
    }

    /// Anchors the view so that its top-left pixel shows `(anchor.x, -anchor.y)`.
    /// `x` is brought back into the canonical world and both axes are rounded
    /// to whole pixels.
    pub fn set_anchor(&mut self, anchor: Point) {
        self.anchor = Point::new(self.context.real_x(anchor.x), anchor.y).round();
        self.layer_offset = self.raw_view().subtract(&self.drag);
        self.layer_position = Point::new(-self.drag.x, -self.drag.y);
        self.recompute_origin();
    }

    /// Layer-space offset the tile grid is laid out from.
    pub fn raw_view(&self) -> Point {
        Point::new(-self.anchor.x, -self.tile_size() - self.anchor.y)
    }

    /// Pulls the current drag offset from the surface and refreshes the origin.
    pub fn sync(&mut self, surface: &dyn DragSurface) {
        self.set_drag_offset(surface.offset());
    }

    pub fn set_drag_offset(&mut self, offset: Point) {
        self.drag = offset;
        self.recompute_origin();
    }

    /// Limits a proposed drag offset vertically so the view stays on the
    /// world, from the north edge of the top tile row to the south edge of
    /// the bottom one. A view taller than the world is held in the middle.
    /// Horizontal drags are free, the world repeats.
    pub fn clamp_drag(&self, offset: Point) -> Point {
        let level = self.context.level;
        let highest = level.y_max as f64 - self.layer_offset.y;
        let lowest = level.y_min as f64 + self.height() - self.layer_offset.y;
        let y = if lowest > highest {
            (lowest + highest) / 2.0
        } else {
            offset.y.clamp(lowest, highest)
        };
        Point::new(offset.x, y)
    }

    pub fn recompute_origin(&mut self) {
        self.origin = Point::new(
            -(self.layer_offset.x + self.drag.x),
            self.layer_offset.y + self.drag.y + self.tile_size(),
        );
    }

    /// Server point at the viewport's top-left pixel.
    pub fn origin(&self) -> GeoPoint {
        GeoPoint::map(self.origin.x, self.origin.y, self.context)
    }

    pub fn origin_point(&self) -> Point {
        self.origin
    }

    /// Anchor that puts `server` (a point at this zoom) in the middle of the view.
    pub fn center_anchor(&self, server: &GeoPoint) -> Point {
        let server = server.to_map(&self.context);
        Point::new(
            server.x() - self.width() / 2.0,
            -server.y() - self.height() / 2.0,
        )
    }

    pub fn center_on(&mut self, point: &GeoPoint) {
        let anchor = self.center_anchor(point);
        self.set_anchor(anchor);
    }

    /// Re-anchors on the current origin, folding the drag into the layer.
    pub fn reanchor(&mut self) {
        self.set_anchor(Point::new(self.origin.x, -self.origin.y));
    }

    /// Anchor that keeps the server point under `focus` (viewport pixels) in
    /// place after zooming by `delta` levels.
    pub fn focus_anchor(&self, focus: Point, delta: i32) -> Point {
        let server = self.screen_to_server(focus);
        let scale = 2_f64.powi(delta);
        Point::new(
            scale * server.x() - focus.x,
            -(scale * server.y()) - focus.y,
        )
    }

    /// Viewport pixel to server point.
    pub fn screen_to_server(&self, screen: Point) -> GeoPoint {
        GeoPoint::map(
            screen.x + self.origin.x,
            self.origin.y - screen.y,
            self.context,
        )
    }

    /// Page pixel (e.g. a mouse event) to server point.
    pub fn page_to_server(&self, page: Point) -> GeoPoint {
        self.screen_to_server(page.subtract(&self.page_position))
    }

    pub fn screen_to_mc2(&self, screen: Point) -> GeoPoint {
        self.screen_to_server(screen).to_mc2()
    }

    pub fn page_to_mc2(&self, page: Point) -> GeoPoint {
        self.screen_to_mc2(page.subtract(&self.page_position))
    }

    /// WGS84 point at the middle of the viewport.
    pub fn center(&self) -> GeoPoint {
        self.screen_to_server(Point::new(self.width() / 2.0, self.height() / 2.0))
            .to_wgs84()
    }

    pub fn world_wrap(&self) -> WorldWrap {
        WorldWrap {
            context: self.context,
            origin: self.origin,
            drag: self.drag,
            layer_offset: self.layer_offset,
            layer_position: self.layer_position,
        }
    }
}
