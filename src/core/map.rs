use crate::{
    core::{
        config::MapConfig,
        constants::FIT_BOUNDS_PADDING,
        geo::{BoundingBox, GeoPoint, Point},
        projection,
        viewport::{DragSurface, Viewport},
        wrap::{PlacementOptions, ScreenPosition},
    },
    input::wheel::WheelCoalescer,
    tiles::{
        loader::LoadCompletion,
        matrix::{MatrixUpdate, TileMatrix, TilePlacement},
        source::{LmMapSource, TileSource},
    },
    MapError, Result,
};
use crossbeam_channel::Sender;
use instant::Instant;

/// Outcome of [`Map::pan_to`].
#[derive(Debug, Clone, PartialEq)]
pub enum PanPlan {
    /// The target is close: move the drag surface by this many pixels
    /// (animated by the caller) and report the moves through [`Map::on_drag`].
    Animate(Point),
    /// The target was far away or panning is disabled; the map was centred on
    /// it directly.
    Recentered(MatrixUpdate),
}

/// A map view: viewport state plus the tile matrix covering it.
///
/// All mutation goes through `&mut self`, so pans, zooms and resizes are
/// applied one at a time. Tile loads finish elsewhere and are folded back in
/// with [`Map::drain_completions`].
pub struct Map {
    config: MapConfig,
    view: Viewport,
    matrix: TileMatrix,
    wheel: WheelCoalescer,
    drag_enabled: bool,
    pan_enabled: bool,
    focus: Option<GeoPoint>,
}

impl Map {
    /// Creates a map of `width x height` pixels served by the configured
    /// LMMap hosts. Nothing is laid out until the map is first centred.
    pub fn new(config: MapConfig, width: f64, height: f64) -> Result<Self> {
        let source = LmMapSource::from_config(&config)?;
        Self::with_source(config, width, height, Box::new(source))
    }

    pub fn with_source(
        config: MapConfig,
        width: f64,
        height: f64,
        source: Box<dyn TileSource>,
    ) -> Result<Self> {
        config.validate()?;
        let context = config.context(config.zoom_ranges.min_zoom() as i64);
        let view = Viewport::new(context, Point::new(width, height));
        let matrix = TileMatrix::new(source, config.fill_margin);
        let wheel = WheelCoalescer::from_config(&config.interaction);

        Ok(Self {
            drag_enabled: config.interaction.drag_enabled,
            pan_enabled: config.interaction.pan_enabled,
            config,
            view,
            matrix,
            wheel,
            focus: None,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.view
    }

    pub fn matrix(&self) -> &TileMatrix {
        &self.matrix
    }

    pub fn zoom_level(&self) -> u8 {
        self.view.zoom()
    }

    /// Point the map was last centred on.
    pub fn focus_point(&self) -> Option<GeoPoint> {
        self.focus
    }

    /// Centres the map on `point` at `zoom` (clamped) and lays out the grid.
    pub fn center_map(&mut self, point: &GeoPoint, zoom: i64) -> Result<MatrixUpdate> {
        self.center_map_with_offset(point, zoom, Point::default())
    }

    /// Like [`Map::center_map`], with the point shown `offset` pixels up and
    /// to the left of the middle.
    pub fn center_map_with_offset(
        &mut self,
        point: &GeoPoint,
        zoom: i64,
        offset: Point,
    ) -> Result<MatrixUpdate> {
        let point = point.validate()?;
        let offset = offset.validate()?;
        let context = self.config.context(zoom);
        self.view.set_context(context);
        let anchor = self.view.center_anchor(&point).add(&offset);
        self.view.set_anchor(anchor);
        self.focus = Some(point);

        log::info!(
            "centering on ({:.6}, {:.6}) at zoom {}",
            point.lon(),
            point.lat(),
            context.zoom
        );
        Ok(self.matrix.render(&self.view))
    }

    /// Centres on the middle of `bounds` at the deepest zoom whose view the box
    /// roughly fills.
    pub fn fit_bounds(&mut self, bounds: &BoundingBox) -> Result<MatrixUpdate> {
        let bounds = bounds.validate()?;
        let upper = bounds.upper().to_mc2();
        let lower = bounds.lower().to_mc2();

        let zoom = self.bounds_zoom(&upper, &lower);
        let center = GeoPoint::mc2(
            (upper.x() - lower.x()) / 2.0 + lower.x(),
            (upper.y() - lower.y()) / 2.0 + lower.y(),
        );
        self.center_map(&center, zoom)
    }

    fn bounds_zoom(&self, upper: &GeoPoint, lower: &GeoPoint) -> i64 {
        let max_zoom = self.config.zoom_ranges.max_zoom() as i64;
        let deepest = self.config.context(max_zoom);
        let upper = projection::mc2_to_server(upper.x(), upper.y(), &deepest);
        let lower = projection::mc2_to_server(lower.x(), lower.y(), &deepest);

        let fit = |delta: f64, size: f64| {
            let mut ratio = (delta / size.max(1.0)).trunc();
            let mut halvings = 1;
            while ratio > 1.0 {
                ratio /= 2.0;
                halvings += 1;
            }
            max_zoom - halvings
        };

        let zoom_x = fit(upper.x() - lower.x() + FIT_BOUNDS_PADDING, self.view.width());
        let zoom_y = fit(upper.y() - lower.y() + FIT_BOUNDS_PADDING, self.view.height());
        zoom_x.min(zoom_y).max(1) + 1
    }

    /// Moves to `point`: a short hop is handed back as a pan to animate, a
    /// long one recentres the map.
    pub fn pan_to(&mut self, point: &GeoPoint) -> Result<PanPlan> {
        let point = &point.validate()?;
        if self.pan_enabled {
            let server = point.to_map(self.view.context());
            let origin = self.view.origin_point();
            let (gx, gy) = (server.x() - origin.x, server.y() - origin.y);

            let (half_w, half_h) = (self.view.width() / 2.0, self.view.height() / 2.0);
            let by = Point::new((half_w - gx).trunc(), (half_h + gy).trunc());
            if by.x.abs() <= half_w && by.y.abs() <= half_h {
                self.focus = Some(*point);
                return Ok(PanPlan::Animate(by));
            }
        }
        let zoom = self.zoom_level() as i64;
        self.center_map(point, zoom).map(PanPlan::Recentered)
    }

    /// Follows the drag surface after the user (or an animation) moved it.
    pub fn on_drag(&mut self, surface: &dyn DragSurface) -> Result<MatrixUpdate> {
        if !self.drag_enabled {
            log::debug!("drag ignored while dragging is disabled");
            return Ok(MatrixUpdate::default());
        }
        let offset = surface.offset().validate()?;
        self.view.set_drag_offset(offset);
        Ok(self.matrix.pan(&mut self.view))
    }

    /// Drag offset the surface may move to without leaving the world
    /// vertically.
    pub fn clamp_drag(&self, offset: Point) -> Point {
        self.view.clamp_drag(offset)
    }

    /// Zooms by `delta` levels around `focus` (viewport pixels, the middle by
    /// default). Returns `None` when the zoom is already at the limit.
    pub fn zoom(&mut self, delta: i32, focus: Option<Point>) -> Result<Option<MatrixUpdate>> {
        let focus = focus
            .unwrap_or_else(|| Point::new(self.view.width() / 2.0, self.view.height() / 2.0))
            .validate()?;
        let current = self.zoom_level();
        let delta = self.config.zoom_ranges.clamp_delta(current, delta);
        if delta == 0 {
            return Ok(None);
        }

        let anchor = self.view.focus_anchor(focus, delta);
        let context = self.config.context(current as i64 + delta as i64);
        self.view.set_context(context);
        self.view.set_anchor(anchor);

        log::info!("zoom {} -> {} around {:?}", current, context.zoom, focus);
        Ok(Some(self.matrix.render(&self.view)))
    }

    /// Jumps to an absolute zoom level around the middle of the view.
    pub fn set_zoom(&mut self, zoom: i64) -> Result<Option<MatrixUpdate>> {
        let target = self.config.zoom_ranges.clamp_zoom(zoom);
        self.zoom(target as i32 - self.zoom_level() as i32, None)
    }

    /// Records a wheel tick; see [`Map::poll_wheel`].
    pub fn wheel(&mut self, delta: f64, focus: Point, now: Instant) {
        self.wheel.push(delta, focus, now);
    }

    /// Zooms once a wheel burst has settled.
    pub fn poll_wheel(&mut self, now: Instant) -> Result<Option<MatrixUpdate>> {
        match self.wheel.poll(now) {
            Some(step) => self.zoom(step.delta, Some(step.focus)),
            None => Ok(None),
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) -> MatrixUpdate {
        self.view.set_size(width, height);
        self.matrix.resize(&self.view)
    }

    pub fn set_page_position(&mut self, position: Point) {
        self.view.set_page_position(position);
    }

    /// WGS84 point at the middle of the view.
    pub fn center(&self) -> GeoPoint {
        self.view.center()
    }

    /// Server point at the top-left pixel of the view.
    pub fn origin(&self) -> GeoPoint {
        self.view.origin()
    }

    /// World repetitions to add to `point` to bring it onto the view.
    pub fn repetitions(&self, point: &GeoPoint) -> Result<i64> {
        let server = point.validate()?.to_map(self.view.context());
        Ok(self.view.world_wrap().repetitions(server.x(), 0.0))
    }

    /// Layer-relative pixel position of `point`, on the copy of the world
    /// currently in view.
    pub fn screen_position(
        &self,
        point: &GeoPoint,
        options: PlacementOptions,
    ) -> Result<ScreenPosition> {
        let point = point.validate()?;
        if !options.extra_distance.is_finite() {
            return Err(MapError::InvalidCoordinates(format!(
                "extra distance {}",
                options.extra_distance
            )));
        }
        Ok(self.view.world_wrap().screen_position(&point, options))
    }

    /// WGS84 point under a page pixel.
    pub fn page_to_geo(&self, page: Point) -> GeoPoint {
        self.view.page_to_server(page).to_wgs84()
    }

    pub fn page_to_mc2(&self, page: Point) -> GeoPoint {
        self.view.page_to_mc2(page)
    }

    pub fn tile_url(&self, x: i64, y: i64) -> String {
        self.matrix.tile_url(x, y, self.view.context())
    }

    pub fn placements(&self) -> Vec<TilePlacement> {
        self.matrix.placements()
    }

    pub fn completion_sender(&self) -> Sender<LoadCompletion> {
        self.matrix.completion_sender()
    }

    pub fn drain_completions(&mut self) -> usize {
        let applied = self.matrix.drain_completions();
        if applied > 0 && self.matrix.all_loaded() {
            log::info!("all tiles loaded at zoom {}", self.zoom_level());
        }
        applied
    }

    pub fn all_loaded(&self) -> bool {
        self.matrix.all_loaded()
    }

    /// Requests every tile again in place.
    pub fn reload_tiles(&mut self) -> MatrixUpdate {
        self.matrix.reload_all(&self.view)
    }

    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled
    }

    pub fn set_drag_enabled(&mut self, enabled: bool) {
        self.drag_enabled = enabled;
    }

    pub fn toggle_drag(&mut self) -> bool {
        self.drag_enabled = !self.drag_enabled;
        self.drag_enabled
    }

    pub fn pan_enabled(&self) -> bool {
        self.pan_enabled
    }

    pub fn set_pan_enabled(&mut self, enabled: bool) {
        self.pan_enabled = enabled;
    }

    pub fn toggle_pan(&mut self) -> bool {
        self.pan_enabled = !self.pan_enabled;
        self.pan_enabled
    }
}
