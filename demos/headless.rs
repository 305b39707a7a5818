use lmmap::prelude::*;

/// Drives a map without any UI: tiles are "loaded" by a worker thread that
/// just acknowledges every request.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("LMMap headless example");
    println!("======================");

    let config = MapConfig::default();
    let mut map = Map::new(config, 1024.0, 768.0)?;

    let update = map.center_map(&GeoPoint::new(12.5683, 55.6761), 10)?;
    println!(
        "Centred on Copenhagen at zoom {} with a {}x{} tile matrix ({} requests)",
        map.zoom_level(),
        map.matrix().fill().cols,
        map.matrix().fill().rows,
        update.requests.len()
    );
    load(&mut map, update.requests)?;

    println!("\nDragging:");
    let mut drag = Point::default();
    for (dx, dy) in [(100.0, 0.0), (0.0, 300.0), (-640.0, -50.0)] {
        drag = drag.add(&Point::new(dx, dy));
        let update = map.on_drag(&map.clamp_drag(drag))?;
        let center = map.center();
        println!(
            "  drag ({dx}, {dy}) -> centre {:.4}, {:.4}; {} new tiles, shift {:?}",
            center.lon(),
            center.lat(),
            update.requests.len(),
            update.shift
        );
        load(&mut map, update.requests)?;
    }

    println!("\nZooming in around the top-left quarter:");
    if let Some(update) = map.zoom(1, Some(Point::new(256.0, 192.0)))? {
        println!("  zoom {} with {} requests", map.zoom_level(), update.requests.len());
        load(&mut map, update.requests)?;
    }

    let now = Instant::now();
    map.wheel(-1.0, Point::new(512.0, 384.0), now);
    map.wheel(-1.0, Point::new(512.0, 384.0), now + Duration::from_millis(20));
    if let Some(update) = map.poll_wheel(now + Duration::from_secs(1))? {
        println!("  wheel burst settled at zoom {}", map.zoom_level());
        load(&mut map, update.requests)?;
    }

    println!("\nResizing to 1600x1000:");
    let update = map.resize(1600.0, 1000.0);
    println!(
        "  matrix is now {}x{}, {} slots added",
        map.matrix().fill().cols,
        map.matrix().fill().rows,
        update.added.len()
    );
    load(&mut map, update.requests)?;

    println!("\nFirst placements:");
    for placement in map.placements().iter().take(5) {
        println!(
            "  {} at ({}, {}) {:?} {}",
            placement.slot,
            placement.left,
            placement.top,
            placement.state,
            placement.src.as_deref().unwrap_or("-")
        );
    }

    let report = map.matrix().load_report();
    println!(
        "\nLoaded {} of {} tiles, {} failed",
        report.loaded, report.expected, report.failed
    );
    Ok(())
}

fn load(map: &mut Map, requests: Vec<TileRequest>) -> anyhow::Result<()> {
    let tx = map.completion_sender();
    let worker = std::thread::spawn(move || {
        for request in requests {
            if tx.send(request.complete(LoadOutcome::Loaded)).is_err() {
                break;
            }
        }
    });
    worker
        .join()
        .map_err(|_| anyhow::anyhow!("tile worker panicked"))?;
    map.drain_completions();
    Ok(())
}
