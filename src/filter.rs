// gSENSOR - Streaming Filter
//
// Per-axis moving average plus a separately filtered magnitude channel and a
// peak-hold tracker. Every update is O(1) via a running sum, rebuilt from the
// window once per lap.

use crate::config::MOVING_AVG_WINDOW;
use crate::events::Sample;

/// Fixed-window moving average over the last `N` samples.
#[derive(Debug, Clone)]
pub struct MovingAverage<const N: usize> {
    buffer: [f32; N],
    index: usize,
    count: usize,
    sum: f32,
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        Self {
            buffer: [0.0; N],
            index: 0,
            count: 0,
            sum: 0.0,
        }
    }

    /// Push `value` into the window and return the new average.
    pub fn add_sample(&mut self, value: f32) -> f32 {
        // Slots not yet written hold 0.0, so subtracting them is harmless.
        self.sum -= self.buffer[self.index];
        self.buffer[self.index] = value;
        self.sum += value;
        self.index = (self.index + 1) % N;
        if self.index == 0 {
            // Resync once per lap so f32 rounding cannot accumulate.
            self.sum = self.buffer.iter().sum();
        }
        if self.count < N {
            self.count += 1;
        }
        self.average()
    }

    /// Mean of the valid samples, exactly 0.0 before the first one.
    pub fn average(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f32
    }

    pub fn sample_count(&self) -> usize {
        self.count
    }

    pub fn is_full(&self) -> bool {
        self.count >= N
    }

    pub fn reset(&mut self) {
        self.buffer = [0.0; N];
        self.index = 0;
        self.count = 0;
        self.sum = 0.0;
    }
}

/// Filters raw accelerometer samples and tracks the peak filtered magnitude.
#[derive(Debug, Clone, Default)]
pub struct SignalProcessor {
    filter_x: MovingAverage<MOVING_AVG_WINDOW>,
    filter_y: MovingAverage<MOVING_AVG_WINDOW>,
    filter_z: MovingAverage<MOVING_AVG_WINDOW>,
    filter_mag: MovingAverage<MOVING_AVG_WINDOW>,
    last_filtered: Sample,
    peak_magnitude: f32,
}

impl SignalProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter one raw sample and return the filtered axes.
    ///
    /// The magnitude channel averages the magnitude of the *raw* samples.
    /// Recomputing it from the averaged axes would understate short impacts
    /// whose direction changes inside the window.
    pub fn process(&mut self, raw: Sample) -> Sample {
        self.last_filtered = Sample {
            x: self.filter_x.add_sample(raw.x),
            y: self.filter_y.add_sample(raw.y),
            z: self.filter_z.add_sample(raw.z),
        };

        let magnitude = self.filter_mag.add_sample(raw.magnitude());
        if magnitude > self.peak_magnitude {
            self.peak_magnitude = magnitude;
        }

        self.last_filtered
    }

    pub fn last_filtered(&self) -> Sample {
        self.last_filtered
    }

    pub fn filtered_magnitude(&self) -> f32 {
        self.filter_mag.average()
    }

    pub fn peak_magnitude(&self) -> f32 {
        self.peak_magnitude
    }

    pub fn sample_count(&self) -> usize {
        self.filter_mag.sample_count()
    }

    pub fn reset_peak(&mut self) {
        self.peak_magnitude = 0.0;
    }

    /// Clear every filter, the last output and the peak in one step, so the
    /// display never pairs a stale peak with zeroed axes.
    pub fn reset(&mut self) {
        self.filter_x.reset();
        self.filter_y.reset();
        self.filter_z.reset();
        self.filter_mag.reset();
        self.last_filtered = Sample::ZERO;
        self.peak_magnitude = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn average_is_zero_before_first_sample() {
        let avg = MovingAverage::<4>::new();
        assert_eq!(avg.average(), 0.0);
        assert_eq!(avg.sample_count(), 0);
        assert!(!avg.is_full());
    }

    #[test]
    fn partial_window_uses_samples_seen_so_far() {
        let mut avg = MovingAverage::<4>::new();
        assert!(close(avg.add_sample(2.0), 2.0));
        assert!(close(avg.add_sample(4.0), 3.0));
        assert!(close(avg.add_sample(9.0), 5.0));
        assert_eq!(avg.sample_count(), 3);
    }

    #[test]
    fn full_window_drops_oldest() {
        let mut avg = MovingAverage::<3>::new();
        for v in [1.0, 2.0, 3.0] {
            avg.add_sample(v);
        }
        assert!(avg.is_full());
        assert!(close(avg.add_sample(4.0), 3.0)); // (2+3+4)/3
        assert!(close(avg.add_sample(5.0), 4.0)); // (3+4+5)/3
        assert_eq!(avg.sample_count(), 3);
    }

    #[test]
    fn reset_returns_to_exact_zero() {
        let mut avg = MovingAverage::<3>::new();
        for v in [1.5, -7.0, 3.25, 8.0] {
            avg.add_sample(v);
        }
        avg.reset();
        assert_eq!(avg.average(), 0.0);
        assert_eq!(avg.sample_count(), 0);
        assert!(close(avg.add_sample(6.0), 6.0));
    }

    #[test]
    fn long_run_sum_does_not_drift() {
        let mut avg = MovingAverage::<10>::new();
        // Deterministic LCG over 0..200 g.
        let mut seed: u32 = 0x2545_F491;
        for _ in 0..2_000_000 {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            avg.add_sample((seed >> 8) as f32 / (1u32 << 24) as f32 * 200.0);
        }
        for _ in 0..10 {
            avg.add_sample(0.0);
        }
        assert_eq!(avg.average(), 0.0);

        for v in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0] {
            avg.add_sample(v);
        }
        // Last ten: 3..=12
        assert!(close(avg.average(), 7.5));
    }

    #[test]
    fn steady_gravity_converges() {
        let mut proc = SignalProcessor::new();
        for _ in 0..MOVING_AVG_WINDOW {
            proc.process(Sample::new(0.0, 0.0, 1.0));
        }
        let f = proc.last_filtered();
        assert!(close(f.x, 0.0) && close(f.y, 0.0) && close(f.z, 1.0));
        assert!(close(proc.filtered_magnitude(), 1.0));
        assert!(close(proc.peak_magnitude(), 1.0));
    }

    #[test]
    fn spike_raises_peak_to_window_average() {
        let mut proc = SignalProcessor::new();
        for _ in 0..MOVING_AVG_WINDOW {
            proc.process(Sample::new(0.0, 0.0, 1.0));
        }
        proc.process(Sample::new(0.0, 0.0, 50.0));
        // Nine samples of 1.0 and one of 50.0 in a window of ten.
        assert!(close(proc.peak_magnitude(), 5.9));
        assert!(close(proc.filtered_magnitude(), 5.9));
    }

    #[test]
    fn magnitude_filters_raw_norm_not_filtered_axes() {
        let mut proc = SignalProcessor::new();
        proc.process(Sample::new(3.0, 0.0, 0.0));
        proc.process(Sample::new(-3.0, 0.0, 0.0));
        // Axes cancel out, the raw magnitudes do not.
        assert!(close(proc.last_filtered().x, 0.0));
        assert!(close(proc.filtered_magnitude(), 3.0));
    }

    #[test]
    fn peak_is_monotonic_until_reset() {
        let mut proc = SignalProcessor::new();
        let mut last_peak = 0.0;
        for z in [1.0, 4.0, 2.0, 0.5, 9.0, 0.0, 0.0, 3.0] {
            proc.process(Sample::new(0.0, 0.0, z));
            assert!(proc.peak_magnitude() >= last_peak);
            last_peak = proc.peak_magnitude();
        }
        proc.reset_peak();
        assert_eq!(proc.peak_magnitude(), 0.0);
        assert!(proc.filtered_magnitude() > 0.0);
    }

    #[test]
    fn full_reset_clears_everything_together() {
        let mut proc = SignalProcessor::new();
        proc.process(Sample::new(1.0, 2.0, 3.0));
        proc.reset();
        assert_eq!(proc.last_filtered(), Sample::ZERO);
        assert_eq!(proc.filtered_magnitude(), 0.0);
        assert_eq!(proc.peak_magnitude(), 0.0);
        assert_eq!(proc.sample_count(), 0);
    }
}
