const MAX_FRAME_DELTA_SECS: f32 = 0.25;

/// Fixed-rate send timer advanced by the frame delta.
#[derive(Debug, Clone)]
pub struct SendCadence {
    send_rate: u32,
    interval: f32,
    accumulator: f32,
}

impl SendCadence {
    pub fn new(send_rate: u32) -> Self {
        let send_rate = send_rate.max(1);
        Self {
            send_rate,
            interval: 1.0 / send_rate as f32,
            // Send immediately on the first frame.
            accumulator: 1.0 / send_rate as f32,
        }
    }

    pub fn send_rate(&self) -> u32 {
        self.send_rate
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.clamp(0.0, MAX_FRAME_DELTA_SECS);
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            true
        } else {
            false
        }
    }

    /// Accumulates `delta` and reports whether at least one send is due.
    /// Several due ticks in one frame collapse into a single send.
    pub fn advance(&mut self, delta: f32) -> bool {
        self.accumulate(delta);
        let mut due = false;
        while self.consume_tick() {
            due = true;
        }
        due
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_at_send_rate() {
        let mut cadence = SendCadence::new(15);
        let frame = 1.0 / 60.0;

        let sends = (0..60).filter(|_| cadence.advance(frame)).count();

        // One immediate send plus one per interval over a second.
        assert!((15..=16).contains(&sends), "sent {sends} times");
    }

    #[test]
    fn long_frame_collapses_and_is_clamped() {
        let mut cadence = SendCadence::new(10);
        cadence.reset();

        assert!(cadence.advance(5.0));
        assert!(!cadence.advance(0.0));
    }
}
