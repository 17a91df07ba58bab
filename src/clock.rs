// Copyright (c) 2026 glowveil contributors

use std::time::{Duration, Instant};

/// Largest elapsed time a single tick may observe. Anything longer (a
/// suspended terminal, a debugger stop) is treated as one long frame.
const MAX_TICK: Duration = Duration::from_millis(100);

/// Paces the simulation at a target frame rate and hands out clamped
/// elapsed time per tick. `start` and `stop` are idempotent; stopping
/// drops the pending deadline so no further ticks are due.
#[derive(Clone, Debug)]
pub struct FrameClock {
    period: Duration,
    running: bool,
    last: Option<Instant>,
    deadline: Option<Instant>,
}

impl FrameClock {
    pub fn new(target_fps: f64) -> Self {
        let fps = if target_fps.is_finite() && target_fps > 0.0 {
            target_fps
        } else {
            60.0
        };
        Self {
            period: Duration::from_secs_f64(1.0 / fps),
            running: false,
            last: None,
            deadline: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.last = Some(now);
        self.deadline = Some(now);
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.last = None;
        self.deadline = None;
    }

    /// Next instant a frame is due, if the clock is running.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Elapsed seconds since the previous tick, clamped to [`MAX_TICK`].
    /// Advances the deadline by one period, snapping forward to `now`
    /// when the host fell behind instead of queueing catch-up frames.
    pub fn tick(&mut self, now: Instant) -> f32 {
        if !self.running {
            return 0.0;
        }
        let elapsed = match self.last {
            Some(last) => now.saturating_duration_since(last).min(MAX_TICK),
            None => Duration::ZERO,
        };
        self.last = Some(now);

        let next = self.deadline.unwrap_or(now) + self.period;
        self.deadline = Some(if next < now { now } else { next });

        elapsed.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_clamps_long_gaps() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(60.0);
        clock.start(t0);
        let dt = clock.tick(t0 + Duration::from_millis(450));
        assert!((dt - 0.1).abs() < 1e-6);
    }

    #[test]
    fn start_is_idempotent() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(60.0);
        clock.start(t0);
        let first_deadline = clock.deadline();
        clock.start(t0 + Duration::from_millis(50));
        assert_eq!(clock.deadline(), first_deadline);
        assert!(clock.is_running());
    }

    #[test]
    fn stop_drops_pending_deadline_and_repeats_safely() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(60.0);
        clock.start(t0);
        clock.stop();
        assert!(!clock.is_running());
        assert!(clock.deadline().is_none());
        clock.stop();
        assert_eq!(clock.tick(t0 + Duration::from_millis(16)), 0.0);
    }

    #[test]
    fn deadline_snaps_forward_when_behind() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(60.0);
        clock.start(t0);
        let late = t0 + Duration::from_millis(90);
        clock.tick(late);
        assert!(clock.deadline().unwrap() >= late);
    }

    #[test]
    fn restart_does_not_carry_stale_elapsed_time() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(60.0);
        clock.start(t0);
        clock.tick(t0 + Duration::from_millis(16));
        clock.stop();
        let t1 = t0 + Duration::from_secs(5);
        clock.start(t1);
        let dt = clock.tick(t1 + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-3);
    }
}
