use std::time::Instant;

/// Frame metadata - carries frame number and timing info
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub number: u64,
    /// Seconds since the clock started
    pub time: f32,
    /// Seconds since the previous tick
    pub delta: f32,
}

impl FrameInfo {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }
}

/// Monotonic frame clock - one tick per rendered frame
#[derive(Debug)]
pub struct FrameClock {
    frame_number: u64,
    start_time: Instant,
    last_tick: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_number: 0,
            start_time: now,
            last_tick: now,
        }
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Advance the clock and return timing for the frame about to be drawn
    pub fn tick(&mut self) -> FrameInfo {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        let time = now.duration_since(self.start_time).as_secs_f32();

        let info = FrameInfo::new(self.frame_number, time, delta);

        self.frame_number += 1;
        self.last_tick = now;

        info
    }

    /// Forget time spent while not rendering (e.g. minimized)
    pub fn reset_delta(&mut self) {
        self.last_tick = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn clock_measures_delta() {
        let mut clock = FrameClock::new();

        thread::sleep(Duration::from_millis(10));
        let frame = clock.tick();

        assert!(frame.delta >= 0.009);
        assert!(frame.time >= frame.delta);
    }

    #[test]
    fn clock_counts_frames() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick().number, 0);
        assert_eq!(clock.tick().number, 1);
        assert_eq!(clock.frame_number(), 2);
    }

    #[test]
    fn reset_delta_discards_elapsed_time() {
        let mut clock = FrameClock::new();

        thread::sleep(Duration::from_millis(20));
        clock.reset_delta();

        let frame = clock.tick();
        assert!(frame.delta < 0.015);
        assert!(frame.time >= 0.019);
    }
}
