//! Frame throughput for the progress bar of a sequential run (feature `progress`).
//!
//! The runner calls [`FrameRate::tick`] at the start of every frame, which closes
//! the previous one. The rate is smoothed as
//! `fps <- alpha * fps_frame + (1 - alpha) * fps` (the first frame seeds it),
//! and the slowest frame is kept so a trial with a pathological frame
//! (fallback geometry, a heavy user function) shows it by index.

use std::time::{Duration, Instant};

pub struct FrameRate {
    last: Instant,
    current: Option<usize>,
    fps: f64,
    alpha: f64,
    closed: usize,
    slowest: Option<(usize, Duration)>,
}

impl FrameRate {
    pub fn new(alpha: f64) -> Self {
        Self {
            last: Instant::now(),
            current: None,
            fps: 0.0,
            alpha,
            closed: 0,
            slowest: None,
        }
    }

    /// Frame `frame` is about to be evaluated.
    pub fn tick(&mut self, frame: usize) {
        let now = Instant::now();
        if let Some(prev) = self.current {
            self.record(prev, now.duration_since(self.last));
        }
        self.last = now;
        self.current = Some(frame);
    }

    fn record(&mut self, frame: usize, dt: Duration) {
        let rate = 1.0 / dt.as_secs_f64().max(1e-9);
        self.fps = match self.closed {
            0 => rate,
            _ => self.alpha * rate + (1.0 - self.alpha) * self.fps,
        };
        self.closed += 1;
        if self.slowest.map_or(true, |(_, worst)| dt > worst) {
            self.slowest = Some((frame, dt));
        }
    }

    pub fn frames_per_sec(&self) -> f64 {
        self.fps
    }

    pub fn slowest(&self) -> Option<(usize, Duration)> {
        self.slowest
    }

    /// Bar message, e.g. `"12.4k fr/s | slowest #37 (2ms)"`.
    pub fn message(&self) -> String {
        match self.slowest {
            Some((frame, dt)) => format!(
                "{} | slowest #{frame} ({})",
                fmt_rate(self.fps),
                fmt_dur(dt)
            ),
            None => "warming up".to_string(),
        }
    }
}

pub fn fmt_rate(fps: f64) -> String {
    match fps {
        r if r < 1e3 => format!("{r:.0} fr/s"),
        r if r < 1e6 => format!("{:.1}k fr/s", r / 1e3),
        r => format!("{:.1}M fr/s", r / 1e6),
    }
}

fn fmt_dur(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}µs"),
        us if us < 1_000_000 => format!("{}ms", us / 1_000),
        _ => format!("{:.2}s", d.as_secs_f32()),
    }
}

#[cfg(test)]
mod progress_bar_test {
    use super::*;

    #[test]
    fn test_fmt_rate_scales() {
        assert_eq!(fmt_rate(850.2), "850 fr/s");
        assert_eq!(fmt_rate(12_400.0), "12.4k fr/s");
        assert_eq!(fmt_rate(2_500_000.0), "2.5M fr/s");
    }

    #[test]
    fn test_slowest_frame_is_tracked() {
        let mut rate = FrameRate::new(0.25);
        assert_eq!(rate.message(), "warming up");

        rate.record(0, Duration::from_millis(1));
        assert!((rate.frames_per_sec() - 1000.0).abs() < 1e-6);
        rate.record(1, Duration::from_millis(4));
        rate.record(2, Duration::from_millis(2));
        assert_eq!(rate.slowest(), Some((1, Duration::from_millis(4))));
        // 0.25 * 500 + 0.75 * (0.25 * 250 + 0.75 * 1000)
        assert!((rate.frames_per_sec() - 734.375).abs() < 1e-6);
        assert_eq!(rate.message(), "734 fr/s | slowest #1 (4ms)");
    }

    #[test]
    fn test_tick_closes_the_previous_frame() {
        let mut rate = FrameRate::new(0.2);
        rate.tick(10);
        assert!(rate.slowest().is_none());
        rate.tick(11);
        assert_eq!(rate.slowest().map(|(f, _)| f), Some(10));
    }
}
