use crate::core::{config::InteractionConfig, geo::Point};
use instant::Instant;
use std::time::Duration;

/// One zoom step produced from a burst of wheel ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelZoom {
    /// Levels to zoom, positive zooms in.
    pub delta: i32,
    /// Viewport pixel the zoom is centred on.
    pub focus: Point,
}

#[derive(Debug, Clone, Copy)]
struct Burst {
    peak: f64,
    direction: f64,
    focus: Point,
    last_tick: Instant,
}

/// Turns a burst of wheel ticks into a single zoom.
///
/// Ticks closer together than the window belong to the same burst. Once the
/// window passes without a tick the burst becomes one [`WheelZoom`]: its size
/// is the largest tick magnitude, capped. Direction and focus are those of
/// the tick that opened the burst.
#[derive(Debug, Clone)]
pub struct WheelCoalescer {
    window: Duration,
    max_step: i32,
    burst: Option<Burst>,
}

impl WheelCoalescer {
    pub fn new(window: Duration, max_step: i32) -> Self {
        Self {
            window,
            max_step,
            burst: None,
        }
    }

    pub fn from_config(config: &InteractionConfig) -> Self {
        Self::new(config.wheel_window(), config.max_wheel_step)
    }

    pub fn is_pending(&self) -> bool {
        self.burst.is_some()
    }

    /// Records a wheel tick. Zero deltas are ignored.
    pub fn push(&mut self, delta: f64, focus: Point, now: Instant) {
        if delta == 0.0 || !delta.is_finite() {
            return;
        }
        match self.burst.as_mut() {
            Some(burst) => {
                burst.peak = burst.peak.max(delta.abs());
                burst.last_tick = now;
            }
            None => {
                self.burst = Some(Burst {
                    peak: delta.abs(),
                    direction: delta.signum(),
                    focus,
                    last_tick: now,
                });
            }
        }
    }

    /// Emits the pending burst once its window has passed.
    pub fn poll(&mut self, now: Instant) -> Option<WheelZoom> {
        let burst = self.burst?;
        if now.duration_since(burst.last_tick) < self.window {
            return None;
        }
        self.flush()
    }

    /// Emits the pending burst right away.
    pub fn flush(&mut self) -> Option<WheelZoom> {
        let burst = self.burst.take()?;
        let magnitude = burst.peak.min(self.max_step as f64).round() as i32;
        if magnitude == 0 {
            return None;
        }
        log::debug!(
            "wheel burst of peak {} becomes zoom {}",
            burst.peak,
            magnitude * burst.direction as i32
        );
        Some(WheelZoom {
            delta: magnitude * burst.direction as i32,
            focus: burst.focus,
        })
    }
}

impl Default for WheelCoalescer {
    fn default() -> Self {
        Self::from_config(&InteractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_becomes_one_zoom() {
        let mut wheel = WheelCoalescer::default();
        let t0 = Instant::now();
        wheel.push(1.0, Point::new(10.0, 10.0), t0);
        wheel.push(2.0, Point::new(20.0, 20.0), t0 + ms(30));
        wheel.push(1.0, Point::new(30.0, 40.0), t0 + ms(60));

        assert_eq!(wheel.poll(t0 + ms(120)), None);
        let zoom = wheel.poll(t0 + ms(160)).unwrap();
        assert_eq!(zoom.delta, 2);
        assert_eq!(zoom.focus, Point::new(10.0, 10.0));
        assert!(!wheel.is_pending());
        assert_eq!(wheel.poll(t0 + ms(500)), None);
    }

    #[test]
    fn test_magnitude_is_capped_and_direction_is_first() {
        let mut wheel = WheelCoalescer::default();
        let t0 = Instant::now();
        wheel.push(9.0, Point::default(), t0);
        wheel.push(-0.5, Point::default(), t0 + ms(10));
        let zoom = wheel.poll(t0 + ms(110)).unwrap();
        assert_eq!(zoom.delta, 3);

        wheel.push(-1.0, Point::new(5.0, 6.0), t0 + ms(200));
        wheel.push(2.0, Point::new(50.0, 60.0), t0 + ms(220));
        let zoom = wheel.poll(t0 + ms(320)).unwrap();
        assert_eq!(zoom.delta, -2);
        assert_eq!(zoom.focus, Point::new(5.0, 6.0));
    }

    #[test]
    fn test_tiny_ticks_round_to_nothing() {
        let mut wheel = WheelCoalescer::default();
        let t0 = Instant::now();
        wheel.push(0.2, Point::default(), t0);
        wheel.push(0.0, Point::default(), t0);
        assert_eq!(wheel.flush(), None);
    }
}
