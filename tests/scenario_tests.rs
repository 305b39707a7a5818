use lmmap::prelude::*;

/// End-to-end scenarios driving a map the way a rendering layer would
#[cfg(test)]
mod scenario_tests {
    use super::*;
    use lmmap::{tiles::slot::GridPoint, Viewport};
    use std::thread;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn map(width: f64, height: f64) -> Map {
        Map::new(MapConfig::default(), width, height).expect("default config is valid")
    }

    /// Screen position of a tile's top-left corner.
    fn screen_of(map: &Map, placement: &TilePlacement) -> Point {
        let view = map.viewport();
        Point::new(
            placement.left as f64 + view.layer_position().x + view.drag().x,
            placement.top as f64 + view.layer_position().y + view.drag().y,
        )
    }

    #[test]
    fn test_panning_one_world_width_returns_to_same_longitude() {
        init();
        let mut map = map(800.0, 600.0);
        map.center_map(&GeoPoint::new(12.59, 55.657), 10).unwrap();
        let before = map.origin();
        let center_before = map.center();
        let width = map.viewport().context().world_span();

        // Dragging the surface left by a whole world moves the view east by one world.
        let update = map.on_drag(&Point::new(-width, 0.0)).unwrap();
        assert!(update.full_reload);

        let after = map.origin();
        let lon_diff = (after.lon() - before.lon()).rem_euclid(360.0);
        assert!(lon_diff < 1e-6 || lon_diff > 360.0 - 1e-6, "{lon_diff}");
        assert!((after.lat() - before.lat()).abs() < 1e-9);
        assert!((map.center().lon() - center_before.lon()).abs() < 1e-6);
    }

    #[test]
    fn test_repetition_steps_with_world_width() {
        init();
        let mut map = map(800.0, 600.0);
        map.center_map(&GeoPoint::new(179.9, 10.0), 6).unwrap();
        let ctx = *map.viewport().context();
        let width = ctx.world_span();

        let east = GeoPoint::new(-179.9, 10.0).to_map(&ctx);
        let shifted = GeoPoint::map(east.x() + width, east.y(), ctx);
        let a = map.screen_position(&east, PlacementOptions::default()).unwrap();
        let b = map.screen_position(&shifted, PlacementOptions::default()).unwrap();
        assert_eq!(a.repetitions - b.repetitions, 1);
        assert_eq!(a.left, b.left);

        // Just across the date line, the east point is drawn right of the centre.
        let center = map
            .screen_position(&map.center(), PlacementOptions::default())
            .unwrap();
        assert!(a.left > center.left);
        assert!(a.left - center.left < 100);
    }

    #[test]
    fn test_tiles_above_the_world_are_culled() {
        init();
        let config = MapConfig::default();
        let ctx = config.context(10);
        let y_max = ctx.level.y_max;
        assert!(!ctx.level.contains_row(y_max + 5));
        assert!(ctx.level.contains_row(y_max));

        let source = LmMapSource::from_config(&config).unwrap();
        let mut matrix = TileMatrix::new(Box::new(source), config.fill_margin);
        let mut view = Viewport::new(ctx, Point::new(800.0, 600.0));
        view.set_anchor(Point::new(1000.0, -(y_max as f64 + 261.0)));
        let update = matrix.render(&view);

        let culled: Vec<_> = matrix
            .slots()
            .filter(|(_, _, slot)| slot.state == SlotState::Empty)
            .collect();
        assert_eq!(culled.len(), matrix.fill().cols);
        assert!(culled.iter().all(|(row, _, slot)| *row == 0 && slot.img.y > y_max));
        assert!(culled.iter().all(|(_, _, slot)| slot.url.is_none()));
        assert!(update.requests.iter().all(|r| r.y <= y_max));
    }

    #[test]
    fn test_resize_adds_only_periphery() {
        init();
        let mut map = map(800.0, 600.0);
        map.center_map(&GeoPoint::new(-0.1278, 51.5074), 9).unwrap();
        assert_eq!(map.matrix().fill(), FillDimensions { cols: 6, rows: 5 });
        let before: Vec<(usize, usize, SlotId, GridPoint)> = map
            .matrix()
            .slots()
            .map(|(r, c, s)| (r, c, s.id, s.img))
            .collect();

        let update = map.resize(1200.0, 900.0);
        assert_eq!(map.matrix().fill(), FillDimensions { cols: 7, rows: 6 });
        assert!(!update.full_reload);
        assert_eq!(update.added.len(), 12);
        assert_eq!(update.requests.len(), 12);

        for (row, col, id, img) in before {
            let slot = map.matrix().slot(row, col).unwrap();
            assert_eq!(slot.id, id);
            assert_eq!(slot.img, img);
        }
        for id in &update.added {
            let (row, col, _) = map
                .matrix()
                .slots()
                .find(|(_, _, s)| s.id == *id)
                .unwrap();
            assert!(row == 5 || col == 6, "new slot at ({row}, {col})");
        }
    }

    #[test]
    fn test_drag_keeps_tiles_aligned_with_coordinates() {
        init();
        let mut map = map(1024.0, 768.0);
        map.center_map(&GeoPoint::new(139.6503, 35.6762), 12).unwrap();

        let mut drag = Point::default();
        for step in [(120.0, -40.0), (-700.0, 10.0), (33.0, 333.0), (-1.0, -900.0), (450.0, 450.0)] {
            drag = drag.add(&Point::new(step.0, step.1));
            let update = map.on_drag(&drag).unwrap();
            assert!(!update.full_reload);

            for placement in map.placements() {
                let screen = screen_of(&map, &placement);
                let corner = map.viewport().screen_to_server(screen);
                let slot = map
                    .matrix()
                    .slots()
                    .find(|(_, _, s)| s.id == placement.slot)
                    .map(|(_, _, s)| s.img)
                    .unwrap();
                // Top-left corner shows the tile's left edge and its north edge.
                assert_eq!(corner.x() as i64, slot.x);
                assert_eq!(corner.y() as i64, slot.y + 256);
            }

            let (min_left, min_top) = map
                .placements()
                .iter()
                .map(|p| screen_of(&map, p))
                .fold((f64::MAX, f64::MAX), |(l, t), p| (l.min(p.x), t.min(p.y)));
            assert!(min_left <= 0.0 && min_left >= -384.0);
            assert!(min_top <= 0.0 && min_top >= -384.0);
        }
    }

    #[test]
    fn test_zoom_is_clamped() {
        init();
        let mut map = map(800.0, 600.0);
        map.center_map(&GeoPoint::new(12.59, 55.657), 15).unwrap();
        assert!(map.zoom(3, Some(Point::new(10.0, 10.0))).unwrap().is_none());
        assert_eq!(map.zoom_level(), 15);

        map.center_map(&GeoPoint::new(12.59, 55.657), 1).unwrap();
        assert!(map.zoom(-5, None).unwrap().is_none());
        assert_eq!(map.zoom_level(), 1);
    }

    #[test]
    fn test_zoom_keeps_focus_under_cursor() {
        init();
        let mut map = map(800.0, 600.0);
        map.center_map(&GeoPoint::new(2.3522, 48.8566), 9).unwrap();
        let cursor = Point::new(620.0, 140.0);
        let before = map.viewport().screen_to_server(cursor).to_wgs84();

        map.zoom(1, Some(cursor)).unwrap().unwrap();
        let after = map.viewport().screen_to_server(cursor).to_wgs84();
        assert_eq!(map.zoom_level(), 10);
        assert!((before.lon() - after.lon()).abs() < 2e-3);
        assert!((before.lat() - after.lat()).abs() < 2e-3);
    }

    #[test]
    fn test_non_finite_input_leaves_the_view_alone() {
        init();
        let mut map = map(800.0, 600.0);
        map.center_map(&GeoPoint::new(12.59, 55.657), 10).unwrap();
        let origin = map.origin();
        let placements = map.placements();

        let nan = GeoPoint::new(f64::NAN, 55.657);
        assert!(matches!(map.center_map(&nan, 10), Err(MapError::InvalidCoordinates(_))));
        assert!(matches!(
            map.center_map_with_offset(&GeoPoint::new(12.59, 55.657), 10, Point::new(0.0, f64::NAN)),
            Err(MapError::InvalidCoordinates(_))
        ));
        assert!(matches!(map.pan_to(&nan), Err(MapError::InvalidCoordinates(_))));
        assert!(matches!(
            map.zoom(1, Some(Point::new(f64::INFINITY, 10.0))),
            Err(MapError::InvalidCoordinates(_))
        ));
        assert!(matches!(
            map.screen_position(&GeoPoint::mc2(f64::NAN, 0.0), PlacementOptions::default()),
            Err(MapError::InvalidCoordinates(_))
        ));
        assert!(matches!(
            map.on_drag(&Point::new(f64::NAN, f64::NAN)),
            Err(MapError::InvalidCoordinates(_))
        ));

        assert_eq!(map.zoom_level(), 10);
        assert_eq!(map.origin(), origin);
        assert_eq!(map.placements(), placements);
        assert!(map.center().lon().is_finite());
    }

    #[test]
    fn test_wheel_with_bad_focus_reports_on_settle() {
        init();
        let mut map = map(800.0, 600.0);
        map.center_map(&GeoPoint::new(12.59, 55.657), 10).unwrap();
        let t0 = Instant::now();
        map.wheel(1.0, Point::new(f64::NAN, 300.0), t0);
        assert!(map.poll_wheel(t0 + Duration::from_millis(200)).is_err());
        assert_eq!(map.zoom_level(), 10);
        assert!(map.poll_wheel(t0 + Duration::from_millis(400)).unwrap().is_none());
    }

    #[test]
    fn test_loads_complete_from_another_thread() {
        init();
        let mut map = map(800.0, 600.0);
        let update = map.center_map(&GeoPoint::new(12.59, 55.657), 10).unwrap();
        assert!(!map.all_loaded());

        let tx = map.completion_sender();
        let requests = update.requests.clone();
        thread::spawn(move || {
            for (i, request) in requests.iter().enumerate() {
                let outcome = if i == 0 {
                    LoadOutcome::Failed("HTTP 500".into())
                } else {
                    LoadOutcome::Loaded
                };
                tx.send(request.complete(outcome)).unwrap();
            }
        })
        .join()
        .unwrap();

        assert_eq!(map.drain_completions(), update.requests.len());
        assert!(map.all_loaded());
        let report = map.matrix().load_report();
        assert_eq!(report.failed, 1);
        assert_eq!(report.loaded, update.requests.len() - 1);

        let failed = map
            .placements()
            .into_iter()
            .find(|p| p.slot == update.requests[0].slot)
            .unwrap();
        assert_eq!(failed.state, SlotState::Failed);
    }

    #[test]
    fn test_stale_completions_after_pan_are_dropped() {
        init();
        let mut map = map(800.0, 600.0);
        let first = map.center_map(&GeoPoint::new(12.59, 55.657), 10).unwrap();

        // A long drag reloads everything; completions for the old tiles are stale.
        map.on_drag(&Point::new(3000.0, 0.0)).unwrap();
        let tx = map.completion_sender();
        for request in &first.requests {
            tx.send(request.complete(LoadOutcome::Loaded)).unwrap();
        }
        assert_eq!(map.drain_completions(), 0);
        assert!(map
            .placements()
            .iter()
            .all(|p| p.state == SlotState::Loading));
    }

    #[test]
    fn test_reload_reissues_every_tile() {
        init();
        let mut map = map(800.0, 600.0);
        let first = map.center_map(&GeoPoint::new(12.59, 55.657), 10).unwrap();
        let again = map.reload_tiles();
        assert_eq!(first.requests.len(), again.requests.len());
        for (a, b) in first.requests.iter().zip(&again.requests) {
            assert_eq!(a.url, b.url);
            assert_ne!(a.token, b.token);
        }
    }

    #[test]
    fn test_page_coordinates_to_geo() {
        init();
        let mut map = map(800.0, 600.0);
        map.set_page_position(Point::new(100.0, 50.0));
        map.center_map(&GeoPoint::new(12.59, 55.657), 10).unwrap();
        let center = map.page_to_geo(Point::new(500.0, 350.0));
        assert!((center.lon() - 12.59).abs() < 1e-3);
        assert!((center.lat() - 55.657).abs() < 1e-3);
        let mc2 = map.page_to_mc2(Point::new(500.0, 350.0));
        assert_eq!(mc2.system(), CoordSystem::Mc2);
        assert!((mc2_to_wgs84(mc2.x()) - 12.59).abs() < 1e-3);
    }
}
