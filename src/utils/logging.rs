use log::{log_enabled, Level};
use std::time::{Duration, Instant};

/// Per-step timing and counters attached to the world.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepProfiler {
    pub collide_time: Duration,
    pub solve_time: Duration,
    pub toi_time: Duration,
    pub step_time: Duration,

    pub body_count: usize,
    pub contact_count: usize,
    pub island_count: usize,
}

impl StepProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Emits the profile through the `log` facade at debug level.
    pub fn report(&self) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        log::debug!(
            "step: bodies={} contacts={} islands={} collide={:.3}ms solve={:.3}ms toi={:.3}ms total={:.3}ms",
            self.body_count,
            self.contact_count,
            self.island_count,
            self.collide_time.as_secs_f32() * 1000.0,
            self.solve_time.as_secs_f32() * 1000.0,
            self.toi_time.as_secs_f32() * 1000.0,
            self.step_time.as_secs_f32() * 1000.0,
        );
    }
}

/// Accumulates elapsed time into a profiler field when dropped.
pub struct ScopedTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
