use crate::constants::{MAX_TICKS_PER_FRAME, TICK_MS};

/// Fixed-timestep accumulator that turns wall-clock frame deltas into a
/// bounded number of simulation ticks.
#[derive(Clone, Debug)]
pub struct FixedStepDriver {
    tick_ms: f64,
    max_ticks_per_frame: u32,
    accumulator: f64,
    total_ticks: u64,
}

impl Default for FixedStepDriver {
    fn default() -> Self {
        Self::new(TICK_MS, MAX_TICKS_PER_FRAME)
    }
}

impl FixedStepDriver {
    pub fn new(tick_ms: f64, max_ticks_per_frame: u32) -> Self {
        Self {
            tick_ms,
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            accumulator: 0.0,
            total_ticks: 0,
        }
    }

    /// Returns how many ticks to run for a frame that took `elapsed_ms`.
    pub fn advance(&mut self, elapsed_ms: f64) -> u32 {
        let cap = self.tick_ms * self.max_ticks_per_frame as f64;
        let delta = elapsed_ms.clamp(0.0, cap);
        self.accumulator += delta;

        let mut ticks = 0;
        while self.accumulator >= self.tick_ms && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.tick_ms;
            ticks += 1;
        }
        if self.accumulator > cap {
            self.accumulator = self.tick_ms;
        }
        self.accumulator = self.accumulator.max(0.0);
        self.total_ticks += ticks as u64;
        ticks
    }

    /// Runs `tick` once per due step and returns the count.
    pub fn run_frame(&mut self, elapsed_ms: f64, mut tick: impl FnMut()) -> u32 {
        let due = self.advance(elapsed_ms);
        for _ in 0..due {
            tick();
        }
        due
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::FixedStepDriver;

    #[test]
    fn steady_frames_run_one_tick_each() {
        let mut driver = FixedStepDriver::new(10.0, 5);
        let ticks: Vec<u32> = (0..4).map(|_| driver.advance(10.0)).collect();
        assert_eq!(ticks, vec![1, 1, 1, 1]);
        assert_eq!(driver.total_ticks(), 4);
    }

    #[test]
    fn slow_frame_is_capped() {
        let mut driver = FixedStepDriver::new(10.0, 5);
        assert_eq!(driver.advance(1_000.0), 5);
        assert_eq!(driver.advance(0.0), 0);
    }

    #[test]
    fn remainders_accumulate_across_frames() {
        let mut driver = FixedStepDriver::new(10.0, 5);
        assert_eq!(driver.advance(6.0), 0);
        assert_eq!(driver.advance(6.0), 1);
        assert_eq!(driver.advance(8.0), 1);
    }

    #[test]
    fn negative_elapsed_is_ignored() {
        let mut driver = FixedStepDriver::new(10.0, 5);
        assert_eq!(driver.advance(-50.0), 0);
        let mut calls = 0;
        assert_eq!(driver.run_frame(25.0, || calls += 1), 2);
        assert_eq!(calls, 2);
    }
}
