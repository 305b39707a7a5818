//! The tile matrix: a finite grid of reusable slots covering the viewport plus
//! a margin. Panning slides the grid and recycles the rows and columns that
//! scrolled out instead of rebuilding it.

use super::{
    loader::{CompletionQueue, LoadCompletion, LoadOutcome, LoadReport, TileRequest},
    ring::TileRing,
    slot::{GridPoint, SlotId, SlotState, TileSlot},
    source::TileSource,
};
use crate::{
    core::{viewport::Viewport, zoom::ZoomContext},
    MapError, Result,
};
use crossbeam_channel::Sender;
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Grid size in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FillDimensions {
    pub cols: usize,
    pub rows: usize,
}

impl FillDimensions {
    /// `floor(size / tile) + margin` on each axis.
    pub fn for_viewport(width: f64, height: f64, tile_size: u32, margin: u32) -> Self {
        let ts = tile_size as f64;
        Self {
            cols: (width.max(0.0) / ts).floor() as usize + margin as usize,
            rows: (height.max(0.0) / ts).floor() as usize + margin as usize,
        }
    }

    pub fn len(&self) -> usize {
        self.cols * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the rendering layer must do after a matrix operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatrixUpdate {
    /// Images to fetch, at most one per slot.
    pub requests: Vec<TileRequest>,
    /// Slots that must show nothing.
    pub cleared: Vec<SlotId>,
    /// Slots created by this operation.
    pub added: Vec<SlotId>,
    /// Slots removed by this operation; their elements can be dropped.
    pub released: Vec<SlotId>,
    /// Every slot was laid out again.
    pub full_reload: bool,
    /// Tiles the grid moved by, `(x, y)`.
    pub shift: (i64, i64),
}

impl MatrixUpdate {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
            && self.cleared.is_empty()
            && self.added.is_empty()
            && self.released.is_empty()
            && !self.full_reload
    }
}

/// Where and what one slot draws, relative to the map layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePlacement {
    pub slot: SlotId,
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
    pub src: Option<String>,
    pub state: SlotState,
}

pub struct TileMatrix {
    slots: TileRing<TileSlot>,
    fill: FillDimensions,
    fill_margin: u32,
    tile_size: u32,
    /// Layer position of the logical first slot.
    first_pos: GridPoint,
    /// Image coordinate of the logical first slot, `y` negated.
    first_img: GridPoint,
    source: Box<dyn TileSource>,
    next_id: u32,
    report: LoadReport,
    completions: CompletionQueue,
}

impl TileMatrix {
    pub fn new(source: Box<dyn TileSource>, fill_margin: u32) -> Self {
        Self {
            slots: TileRing::default(),
            fill: FillDimensions::default(),
            fill_margin,
            tile_size: 0,
            first_pos: GridPoint::default(),
            first_img: GridPoint::default(),
            source,
            next_id: 0,
            report: LoadReport::default(),
            completions: CompletionQueue::new(),
        }
    }

    pub fn fill(&self) -> FillDimensions {
        self.fill
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn first_pos(&self) -> GridPoint {
        self.first_pos
    }

    pub fn first_img(&self) -> GridPoint {
        self.first_img
    }

    /// Slot at logical `(row, col)`; `(0, 0)` is the top-left one.
    pub fn slot(&self, row: usize, col: usize) -> Option<&TileSlot> {
        self.slots.get(row, col)
    }

    /// All slots with their logical `(row, col)`.
    pub fn slots(&self) -> impl Iterator<Item = (usize, usize, &TileSlot)> + '_ {
        self.slots.iter()
    }

    pub fn load_report(&self) -> LoadReport {
        self.report
    }

    /// Every tile requested since the last full render has arrived or failed.
    pub fn all_loaded(&self) -> bool {
        self.report.all_loaded()
    }

    /// Image URL of the tile whose left and south edges are `(x, y)`; `x` may
    /// lie in any repetition of the world.
    pub fn tile_url(&self, x: i64, y: i64, ctx: &ZoomContext) -> String {
        self.source.url(ctx.real_x(x as f64) as i64, y, ctx.zoom)
    }

    /// Hands out a sender the image layer reports completions through.
    pub fn completion_sender(&self) -> Sender<LoadCompletion> {
        self.completions.sender()
    }

    /// Lays the whole grid out from the viewport's anchor. Slots are reused
    /// when the grid size is unchanged.
    pub fn render(&mut self, view: &Viewport) -> MatrixUpdate {
        let ctx = *view.context();
        let ts = ctx.tile_size as i64;
        self.tile_size = ctx.tile_size;
        let raw = view.raw_view();
        let (raw_x, raw_y) = (raw.x as i64, raw.y as i64);

        self.first_img = GridPoint::new((-raw_x / ts - 1) * ts, (-raw_y / ts - 1) * ts);
        self.first_pos = GridPoint::new(raw_x % ts - ts, raw_y % ts - ts);

        let fill = self.fill_for(view);
        let mut update = MatrixUpdate {
            full_reload: true,
            ..MatrixUpdate::default()
        };

        if fill != self.fill || self.slots.len() != fill.len() {
            update.released = self.slot_ids();
            let (first_pos, first_img) = (self.first_pos, self.first_img);
            let mut next_id = self.next_id;
            self.slots = TileRing::new(fill.rows, fill.cols, |row, col| {
                let (pos, img) = cell(first_pos, first_img, row, col, ts);
                next_id += 1;
                TileSlot::new(SlotId(next_id), pos, img)
            });
            self.next_id = next_id;
            self.fill = fill;
            update.added = self.slot_ids();
        }

        self.report.reset();
        for row in 0..fill.rows {
            for col in 0..fill.cols {
                let (pos, img) = cell(self.first_pos, self.first_img, row, col, ts);
                // The report was just reset, so abandoned loads need no accounting.
                if let Some(slot) = self.slots.get_mut(row, col) {
                    slot.relocate(pos, img);
                }
                self.assign(row, col, &ctx, &mut update);
            }
        }

        log::info!(
            "rendered {}x{} tiles at zoom {} ({} requests, {} culled)",
            fill.cols,
            fill.rows,
            ctx.zoom,
            update.requests.len(),
            update.cleared.len()
        );
        update
    }

    /// Follows the drag surface. Columns and rows that scrolled more than half
    /// a tile past the edge move to the opposite edge and load new images.
    /// A drag longer than the grid re-anchors the viewport and renders again.
    pub fn pan(&mut self, view: &mut Viewport) -> MatrixUpdate {
        if self.slots.is_empty() {
            return self.render(view);
        }

        let ctx = *view.context();
        let ts = ctx.tile_size as i64;
        let drag = view.drag();
        let layer = view.layer_position();

        let shift_x = pan_factor(drag.x + layer.x + self.first_pos.x as f64, ts);
        let shift_y = pan_factor(drag.y + layer.y + self.first_pos.y as f64, ts);
        if shift_x == 0 && shift_y == 0 {
            return MatrixUpdate::default();
        }

        let (cols, rows) = (self.fill.cols, self.fill.rows);
        if shift_x.unsigned_abs() as usize > cols || shift_y.unsigned_abs() as usize > rows {
            log::debug!(
                "pan of ({shift_x}, {shift_y}) tiles exceeds the {cols}x{rows} grid, reloading"
            );
            view.reanchor();
            let mut update = self.render(view);
            update.shift = (shift_x, shift_y);
            return update;
        }

        self.first_pos.x -= shift_x * ts;
        self.first_pos.y -= shift_y * ts;
        self.first_img.x -= shift_x * ts;
        self.first_img.y -= shift_y * ts;

        let mut touched: FxHashSet<(usize, usize)> = FxHashSet::default();
        let span_x = ts * cols as i64 * shift_x.signum();
        for k in 1..=shift_x.unsigned_abs() as usize {
            let col = if shift_x > 0 { cols - k } else { k - 1 };
            for row in 0..rows {
                if let Some(slot) = self.slots.get_mut(row, col) {
                    let pos = GridPoint::new(slot.pos.x - span_x, slot.pos.y);
                    let img = GridPoint::new(slot.img.x - span_x, slot.img.y);
                    if slot.relocate(pos, img) {
                        self.report.abandon();
                    }
                    touched.insert((row, col));
                }
            }
        }

        let span_y = ts * rows as i64 * shift_y.signum();
        for k in 1..=shift_y.unsigned_abs() as usize {
            let row = if shift_y > 0 { rows - k } else { k - 1 };
            for col in 0..cols {
                if let Some(slot) = self.slots.get_mut(row, col) {
                    let pos = GridPoint::new(slot.pos.x, slot.pos.y - span_y);
                    let img = GridPoint::new(slot.img.x, slot.img.y + span_y);
                    if slot.relocate(pos, img) {
                        self.report.abandon();
                    }
                    touched.insert((row, col));
                }
            }
        }

        let mut update = MatrixUpdate {
            shift: (shift_x, shift_y),
            ..MatrixUpdate::default()
        };
        let mut touched: Vec<_> = touched.into_iter().collect();
        touched.sort_unstable();
        for (row, col) in touched {
            self.assign(row, col, &ctx, &mut update);
        }

        self.slots.rotate(shift_y, shift_x);
        log::debug!(
            "shifted grid by ({shift_x}, {shift_y}), {} new tiles",
            update.requests.len()
        );
        update
    }

    /// Adapts the grid to a new viewport size without moving it. Slots beyond
    /// the new extent are released; new slots on the right and bottom edges
    /// are the only ones loaded.
    pub fn resize(&mut self, view: &Viewport) -> MatrixUpdate {
        let fill = self.fill_for(view);
        if self.slots.is_empty() {
            return self.render(view);
        }
        if fill == self.fill {
            return MatrixUpdate::default();
        }

        let ctx = *view.context();
        let ts = ctx.tile_size as i64;
        let mut update = MatrixUpdate::default();
        let mut rows = std::mem::take(&mut self.slots).into_rows();

        let mut released = Vec::new();
        if fill.rows < rows.len() {
            for row in rows.drain(fill.rows..) {
                released.extend(row);
            }
        }
        for row in rows.iter_mut() {
            if fill.cols < row.len() {
                released.extend(row.drain(fill.cols..));
            }
        }
        for slot in released {
            if slot.is_loading() {
                self.report.abandon();
            }
            update.released.push(slot.id);
        }

        let mut fresh = Vec::new();
        for row_index in 0..fill.rows {
            if row_index == rows.len() {
                rows.push(Vec::with_capacity(fill.cols));
            }
            let row = &mut rows[row_index];
            for col in row.len()..fill.cols {
                let (pos, img) = cell(self.first_pos, self.first_img, row_index, col, ts);
                self.next_id += 1;
                let id = SlotId(self.next_id);
                row.push(TileSlot::new(id, pos, img));
                update.added.push(id);
                fresh.push((row_index, col));
            }
        }

        self.slots = match TileRing::from_rows(rows) {
            Some(slots) => slots,
            None => {
                log::warn!("grid lost its shape while resizing, rebuilding");
                self.fill = FillDimensions::default();
                return self.render(view);
            }
        };
        self.fill = fill;

        for (row, col) in fresh {
            self.assign(row, col, &ctx, &mut update);
        }

        log::info!(
            "resized grid to {}x{} ({} added, {} released)",
            fill.cols,
            fill.rows,
            update.added.len(),
            update.released.len()
        );
        update
    }

    /// Issues a fresh load for every slot in place.
    pub fn reload_all(&mut self, view: &Viewport) -> MatrixUpdate {
        let ctx = *view.context();
        let mut update = MatrixUpdate {
            full_reload: true,
            ..MatrixUpdate::default()
        };
        self.report.reset();
        for row in 0..self.fill.rows {
            for col in 0..self.fill.cols {
                self.assign(row, col, &ctx, &mut update);
            }
        }
        update
    }

    /// Records a load result. Returns whether it was applied; completions
    /// for an older assignment of the slot are dropped.
    pub fn apply_completion(&mut self, completion: &LoadCompletion) -> Result<bool> {
        let slot = self
            .slots
            .find_mut(|slot| slot.id == completion.slot)
            .ok_or(MapError::UnknownSlot(completion.slot.0))?;

        let success = completion.outcome == LoadOutcome::Loaded;
        if !slot.finish(completion.token, success) {
            log::debug!("dropping stale completion for {}", completion.slot);
            return Ok(false);
        }

        match &completion.outcome {
            LoadOutcome::Loaded => self.report.loaded += 1,
            LoadOutcome::Failed(reason) => {
                self.report.failed += 1;
                log::warn!(
                    "tile {} failed to load: {reason}",
                    slot.url.as_deref().unwrap_or_default()
                );
            }
        }
        Ok(true)
    }

    /// Applies everything waiting on the completion channel. Returns how many
    /// completions changed a slot.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        for completion in self.completions.drain() {
            match self.apply_completion(&completion) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(err) => log::debug!("ignoring completion: {err}"),
            }
        }
        applied
    }

    pub fn placements(&self) -> Vec<TilePlacement> {
        let ts = self.tile_size;
        self.slots
            .iter()
            .map(|(_, _, slot)| TilePlacement {
                slot: slot.id,
                left: slot.pos.x,
                top: slot.pos.y,
                width: ts,
                height: ts,
                src: slot.url.clone(),
                state: slot.state,
            })
            .collect()
    }

    fn fill_for(&self, view: &Viewport) -> FillDimensions {
        FillDimensions::for_viewport(
            view.width(),
            view.height(),
            view.context().tile_size,
            self.fill_margin,
        )
    }

    fn slot_ids(&self) -> Vec<SlotId> {
        self.slots.iter().map(|(_, _, slot)| slot.id).collect()
    }

    /// Loads the slot at `(row, col)` or culls it when it lies above or below
    /// the world.
    fn assign(&mut self, row: usize, col: usize, ctx: &ZoomContext, update: &mut MatrixUpdate) {
        let Some(slot) = self.slots.get_mut(row, col) else {
            return;
        };

        if !ctx.level.contains_row(slot.img.y) {
            slot.clear();
            update.cleared.push(slot.id);
            return;
        }

        let x = ctx.real_x(slot.img.x as f64) as i64;
        let y = slot.img.y;
        let url = self.source.url(x, y, ctx.zoom);
        let token = slot.begin_load(url.clone());
        self.report.expected += 1;
        update.requests.push(TileRequest {
            slot: slot.id,
            token,
            url,
            x,
            y,
            zoom: ctx.zoom,
        });
    }
}

/// Position and image coordinate of logical cell `(row, col)`.
fn cell(first_pos: GridPoint, first_img: GridPoint, row: usize, col: usize, ts: i64) -> (GridPoint, GridPoint) {
    let (row, col) = (row as i64, col as i64);
    (
        GridPoint::new(col * ts + first_pos.x, row * ts + first_pos.y),
        GridPoint::new(col * ts + first_img.x, -(row * ts + first_img.y)),
    )
}

/// Whole tiles the grid must move so that its first column (or row), now at
/// screen coordinate `edge`, ends up within `[-1.5, -0.5]` tiles.
fn pan_factor(edge: f64, ts: i64) -> i64 {
    let ts = ts as f64;
    let half = ts / 2.0;
    if edge + half > 0.0 {
        ((edge + half) / ts + 1.0).trunc() as i64
    } else if edge + 3.0 * half < 0.0 {
        ((edge + 3.0 * half) / ts - 1.0).trunc() as i64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{config::MapConfig, geo::Point},
        tiles::source::LmMapSource,
    };

    fn setup(zoom: i64, width: f64, height: f64) -> (TileMatrix, Viewport) {
        let config = MapConfig::default();
        let source = LmMapSource::from_config(&config).unwrap();
        let matrix = TileMatrix::new(Box::new(source), config.fill_margin);
        let view = Viewport::new(config.context(zoom), Point::new(width, height));
        (matrix, view)
    }

    /// Every slot sits exactly where its logical cell says.
    fn assert_consistent(matrix: &TileMatrix) {
        for (row, col, slot) in matrix.slots() {
            let (pos, img) = cell(matrix.first_pos(), matrix.first_img(), row, col, 256);
            assert_eq!(slot.pos, pos, "pos of ({row}, {col})");
            assert_eq!(slot.img, img, "img of ({row}, {col})");
        }
    }

    #[test]
    fn test_fill_dimensions() {
        assert_eq!(
            FillDimensions::for_viewport(800.0, 600.0, 256, 3),
            FillDimensions { cols: 6, rows: 5 }
        );
        assert_eq!(
            FillDimensions::for_viewport(1200.0, 900.0, 256, 3),
            FillDimensions { cols: 7, rows: 6 }
        );
    }

    #[test]
    fn test_pan_factor_hysteresis() {
        assert_eq!(pan_factor(-200.0, 256), 0);
        assert_eq!(pan_factor(-128.0, 256), 0);
        assert_eq!(pan_factor(-384.0, 256), 0);
        assert_eq!(pan_factor(-100.0, 256), 1);
        assert_eq!(pan_factor(-400.0, 256), -1);
        assert_eq!(pan_factor(700.0, 256), 4);
        assert_eq!(pan_factor(-1000.0, 256), -3);
    }

    #[test]
    fn test_render_lays_out_grid() {
        let (mut matrix, mut view) = setup(3, 800.0, 600.0);
        view.set_anchor(Point::new(0.0, 0.0));
        let update = matrix.render(&view);

        assert!(update.full_reload);
        assert_eq!(matrix.len(), 30);
        assert_eq!(update.added.len(), 30);
        assert_eq!(update.requests.len(), 30);
        assert_eq!(matrix.first_pos(), GridPoint::new(-256, -256));
        assert_eq!(matrix.slot(0, 0).unwrap().img, GridPoint::new(-256, 0));
        assert_eq!(matrix.slot(1, 2).unwrap().img, GridPoint::new(256, -256));
        assert_consistent(&matrix);

        let first = &update.requests[0];
        assert_eq!(
            first.url,
            "http://oss-xml.services.wayfinder.com/LMMap?x=-256&y=0&zoom=3"
        );
    }

    #[test]
    fn test_render_reuses_slots_of_same_size() {
        let (mut matrix, mut view) = setup(3, 800.0, 600.0);
        matrix.render(&view);
        let before: Vec<_> = matrix.slots().map(|(_, _, s)| s.id).collect();
        view.set_anchor(Point::new(5000.0, -900.0));
        let update = matrix.render(&view);
        let after: Vec<_> = matrix.slots().map(|(_, _, s)| s.id).collect();
        assert_eq!(before, after);
        assert!(update.added.is_empty() && update.released.is_empty());
    }

    #[test]
    fn test_rows_above_the_world_are_culled() {
        let (mut matrix, mut view) = setup(3, 800.0, 600.0);
        let y_max = view.context().level.y_max;
        view.set_anchor(Point::new(0.0, -(y_max as f64 + 256.0 + 5.0)));
        let update = matrix.render(&view);

        assert_eq!(update.cleared.len(), 6);
        for col in 0..6 {
            let slot = matrix.slot(0, col).unwrap();
            assert_eq!(slot.img.y, y_max + 256);
            assert_eq!(slot.state, SlotState::Empty);
            assert_eq!(slot.url, None);
        }
        assert!(update.requests.iter().all(|r| r.y <= y_max));
        assert_eq!(update.requests.len(), 24);
    }

    #[test]
    fn test_small_pan_relocates_one_column() {
        let (mut matrix, mut view) = setup(5, 800.0, 600.0);
        view.set_anchor(Point::new(1000.0, -3000.0));
        matrix.render(&view);
        // Settle the grid into its pan window first.
        matrix.pan(&mut view);
        assert_consistent(&matrix);
        let first_x = matrix.first_pos().x as f64 + view.layer_position().x + view.drag().x;
        assert!((-384.0..=-128.0).contains(&first_x));

        let before: Vec<_> = matrix.slots().map(|(_, _, s)| s.img).collect();
        view.sync(&Point::new(first_x.abs() + 10.0, 0.0).add(&view.drag()));
        let update = matrix.pan(&mut view);

        assert!(!update.full_reload);
        assert!(update.shift.0 >= 1);
        assert_eq!(update.requests.len(), 5 * update.shift.0 as usize);
        assert_consistent(&matrix);

        let after: Vec<_> = matrix.slots().map(|(_, _, s)| s.img).collect();
        let kept = after.iter().filter(|img| before.contains(img)).count();
        assert_eq!(kept, 30 - update.requests.len());
    }

    #[test]
    fn test_pan_keeps_viewport_covered() {
        let (mut matrix, mut view) = setup(7, 800.0, 600.0);
        view.set_anchor(Point::new(-12_345.0, -6789.0));
        matrix.render(&view);

        let mut drag = Point::default();
        for step in [
            Point::new(90.0, 0.0),
            Point::new(0.0, -170.0),
            Point::new(-300.0, 40.0),
            Point::new(255.0, 255.0),
            Point::new(-600.0, -10.0),
            Point::new(31.0, 500.0),
        ] {
            drag = drag.add(&step);
            view.sync(&drag);
            let update = matrix.pan(&mut view);
            assert!(!update.full_reload);
            assert_consistent(&matrix);

            let left = matrix.first_pos().x as f64 + view.layer_position().x + drag.x;
            let top = matrix.first_pos().y as f64 + view.layer_position().y + drag.y;
            assert!((-384.0..=-128.0).contains(&left), "left edge at {left}");
            assert!((-384.0..=-128.0).contains(&top), "top edge at {top}");
            assert!(left + 6.0 * 256.0 >= 800.0);
            assert!(top + 5.0 * 256.0 >= 600.0);

            // The tile under the viewport's top-left pixel is the one the
            // origin points at.
            let origin = view.origin_point();
            let col = ((-left) / 256.0).floor() as usize;
            let row = ((-top) / 256.0).floor() as usize;
            let slot = matrix.slot(row, col).unwrap();
            assert!(origin.x >= slot.img.x as f64 && origin.x < slot.img.x as f64 + 256.0);
            assert!(origin.y > slot.img.y as f64 && origin.y <= slot.img.y as f64 + 256.0);
        }
    }

    #[test]
    fn test_long_drag_reloads() {
        let (mut matrix, mut view) = setup(7, 800.0, 600.0);
        view.set_anchor(Point::new(0.0, -1000.0));
        matrix.render(&view);

        view.sync(&Point::new(-2500.0, 0.0));
        let origin = view.origin_point();
        let update = matrix.pan(&mut view);
        assert!(update.full_reload);
        assert_eq!(update.requests.len(), 30);
        assert_eq!(view.origin_point(), origin);
        assert_consistent(&matrix);
    }

    #[test]
    fn test_resize_grows_periphery_only() {
        let (mut matrix, mut view) = setup(4, 800.0, 600.0);
        view.set_anchor(Point::new(300.0, -700.0));
        matrix.render(&view);
        let before: Vec<_> = matrix
            .slots()
            .map(|(r, c, s)| (r, c, s.id, s.img))
            .collect();

        view.set_size(1200.0, 900.0);
        let update = matrix.resize(&view);
        assert_eq!(matrix.fill(), FillDimensions { cols: 7, rows: 6 });
        assert_eq!(update.added.len(), 42 - 30);
        assert_eq!(update.requests.len(), 12);
        assert!(update.released.is_empty());
        for (r, c, id, img) in before {
            let slot = matrix.slot(r, c).unwrap();
            assert_eq!((slot.id, slot.img), (id, img));
        }
        for request in &update.requests {
            let (r, c, _) = matrix.slots().find(|(_, _, s)| s.id == request.slot).unwrap();
            assert!(r == 5 || c == 6);
        }
        assert_consistent(&matrix);
    }

    #[test]
    fn test_resize_shrinks_from_the_far_edges() {
        let (mut matrix, mut view) = setup(4, 1200.0, 900.0);
        matrix.render(&view);
        view.set_size(800.0, 900.0);
        let update = matrix.resize(&view);
        assert_eq!(matrix.fill(), FillDimensions { cols: 6, rows: 6 });
        assert_eq!(update.released.len(), 6);
        assert!(update.requests.is_empty());
        assert_consistent(&matrix);
    }

    #[test]
    fn test_completions_respect_tokens() {
        let (mut matrix, mut view) = setup(3, 800.0, 600.0);
        let first = matrix.render(&view);
        view.set_anchor(Point::new(2048.0, 0.0));
        let second = matrix.render(&view);

        let tx = matrix.completion_sender();
        tx.send(first.requests[0].complete(LoadOutcome::Loaded)).unwrap();
        for request in &second.requests {
            tx.send(request.complete(LoadOutcome::Loaded)).unwrap();
        }
        assert!(!matrix.all_loaded() || second.requests.is_empty());
        assert_eq!(matrix.drain_completions(), second.requests.len());
        assert!(matrix.all_loaded());

        let stray = LoadCompletion {
            slot: SlotId(9999),
            token: first.requests[0].token,
            outcome: LoadOutcome::Loaded,
        };
        assert!(matches!(
            matrix.apply_completion(&stray),
            Err(MapError::UnknownSlot(9999))
        ));
    }

    #[test]
    fn test_dragging_mid_load_still_finishes() {
        let (mut matrix, mut view) = setup(5, 800.0, 600.0);
        view.set_anchor(Point::new(1000.0, -3000.0));
        let first = matrix.render(&view);

        view.sync(&Point::new(300.0, 0.0));
        let second = matrix.pan(&mut view);
        assert!(!second.full_reload);
        assert!(!second.requests.is_empty());
        assert_eq!(matrix.load_report().expected, 30);

        let tx = matrix.completion_sender();
        for request in first.requests.iter().chain(&second.requests) {
            tx.send(request.complete(LoadOutcome::Loaded)).unwrap();
        }
        assert_eq!(matrix.drain_completions(), 30);
        assert!(matrix.all_loaded());
        assert_eq!(matrix.load_report().loaded, 30);
    }

    #[test]
    fn test_shrinking_mid_load_still_finishes() {
        let (mut matrix, mut view) = setup(4, 1200.0, 900.0);
        let first = matrix.render(&view);
        view.set_size(800.0, 600.0);
        let update = matrix.resize(&view);
        assert_eq!(update.released.len(), 42 - 30);

        let tx = matrix.completion_sender();
        for request in &first.requests {
            tx.send(request.complete(LoadOutcome::Loaded)).unwrap();
        }
        assert_eq!(matrix.drain_completions(), 30);
        assert!(matrix.all_loaded());
        assert_eq!(matrix.load_report().expected, 30);
    }

    #[test]
    fn test_failed_loads_keep_placeholder() {
        let (mut matrix, view) = setup(3, 800.0, 600.0);
        let update = matrix.render(&view);
        let request = &update.requests[3];
        let applied = matrix
            .apply_completion(&request.complete(LoadOutcome::Failed("timeout".into())))
            .unwrap();
        assert!(applied);
        let placement = matrix
            .placements()
            .into_iter()
            .find(|p| p.slot == request.slot)
            .unwrap();
        assert_eq!(placement.state, SlotState::Failed);
        assert_eq!(placement.src.as_deref(), Some(request.url.as_str()));
        assert_eq!((placement.width, placement.height), (256, 256));
        assert_eq!(matrix.load_report().failed, 1);
    }
}
