//! Sliding-window statistics over the magnitude spectrum.
//!
//! Every bin keeps the last `N` observed magnitudes; a parallel queue keeps
//! the time elapsed between consecutive observations. From these the tracker
//! derives a per-bin rate of change (speed) and dispersion (population
//! standard deviation).

use std::collections::VecDeque;

use crate::audio::frame::FrequencyFrame;

#[derive(Clone, Debug)]
pub struct SpectralStatisticsTracker {
    capacity: usize,
    series: Vec<VecDeque<f32>>,
    deltas: VecDeque<f64>,
    last_timestamp: Option<f64>,
}

impl SpectralStatisticsTracker {
    /// Tracker keeping up to `capacity` observations per bin
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: Vec::new(),
            deltas: VecDeque::new(),
            last_timestamp: None,
        }
    }

    /// Allocate `frame_len` empty bins, discarding any history.
    pub fn init(&mut self, frame_len: usize) {
        self.series = (0..frame_len)
            .map(|_| VecDeque::with_capacity(self.capacity))
            .collect();
        self.deltas = VecDeque::with_capacity(self.capacity);
        self.last_timestamp = None;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bin_count(&self) -> usize {
        self.series.len()
    }

    /// Observations currently held per bin (identical for every bin)
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Record one frame observed at `timestamp` (milliseconds).
    ///
    /// Bins beyond the frame's length record 0; extra frame values are ignored.
    pub fn push(&mut self, frame: &FrequencyFrame, timestamp: f64) {
        let delta = match self.last_timestamp {
            Some(last) => timestamp - last,
            None => 0.0,
        };

        if self.deltas.len() >= self.capacity {
            self.deltas.pop_front();
            for bin in self.series.iter_mut() {
                bin.pop_front();
            }
        }

        self.deltas.push_back(delta);
        let values = frame.as_slice();
        for (i, bin) in self.series.iter_mut().enumerate() {
            bin.push_back(values.get(i).copied().unwrap_or(0.0));
        }
        self.last_timestamp = Some(timestamp);
    }

    /// Population standard deviation of bin `i`'s window; 0 when empty.
    pub fn standard_deviation(&self, i: usize) -> f32 {
        let Some(data) = self.series.get(i) else {
            return 0.0;
        };
        if data.is_empty() {
            return 0.0;
        }
        let n = data.len() as f64;
        let mean = data.iter().map(|&x| x as f64).sum::<f64>() / n;
        let variance = data
            .iter()
            .map(|&x| {
                let d = x as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        variance.sqrt() as f32
    }

    /// Signed rate of change of bin `i` between its two newest observations,
    /// in magnitude units per millisecond. 0 with fewer than two observations
    /// or a zero time delta.
    pub fn speed(&self, i: usize) -> f32 {
        let Some(data) = self.series.get(i) else {
            return 0.0;
        };
        let l = data.len();
        if l < 2 {
            return 0.0;
        }
        let dt = self.deltas.back().copied().unwrap_or(0.0);
        if !(dt.is_finite() && dt != 0.0) {
            return 0.0;
        }
        ((data[l - 1] - data[l - 2]) as f64 / dt) as f32
    }

    /// Mean over all bins of the non-negative part of their speed.
    pub fn average_increment(&self) -> f32 {
        if self.series.is_empty() {
            return 0.0;
        }
        let total: f64 = (0..self.series.len())
            .map(|i| self.speed(i).max(0.0) as f64)
            .sum();
        (total / self.series.len() as f64) as f32
    }

    /// Forget all history, keeping the bin count.
    pub fn clear(&mut self) {
        for bin in self.series.iter_mut() {
            bin.clear();
        }
        self.deltas.clear();
        self.last_timestamp = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn frame(values: &[f32]) -> FrequencyFrame {
        FrequencyFrame::new(values.to_vec())
    }

    fn tracker(bins: usize, capacity: usize) -> SpectralStatisticsTracker {
        let mut t = SpectralStatisticsTracker::new(capacity);
        t.init(bins);
        t
    }

    #[test]
    fn fresh_tracker_reports_zero() {
        let t = tracker(4, 20);
        for i in 0..4 {
            assert_eq!(t.speed(i), 0.0);
            assert_eq!(t.standard_deviation(i), 0.0);
        }
        assert_eq!(t.average_increment(), 0.0);
        assert!(t.is_empty());
    }

    #[test]
    fn speed_uses_latest_delta() {
        let mut t = tracker(2, 20);
        t.push(&frame(&[10.0, 50.0]), 100.0);
        assert_eq!(t.speed(0), 0.0, "single observation has no speed");
        t.push(&frame(&[30.0, 40.0]), 110.0);
        assert_abs_diff_eq!(t.speed(0), 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(t.speed(1), -1.0, epsilon = 1e-6);
        // only the positive part counts towards the aggregate
        assert_abs_diff_eq!(t.average_increment(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn duplicate_timestamps_do_not_blow_up() {
        let mut t = tracker(1, 20);
        t.push(&frame(&[1.0]), 5.0);
        t.push(&frame(&[9.0]), 5.0);
        assert_eq!(t.speed(0), 0.0);
        assert!(t.average_increment().is_finite());
    }

    #[test]
    fn window_is_bounded_fifo() {
        let capacity = 5;
        let mut t = tracker(1, capacity);
        for m in 0..12 {
            t.push(&frame(&[m as f32]), m as f64 * 10.0);
            assert_eq!(t.len(), (m + 1).min(capacity));
        }
        // window holds 7..=11
        let expected_mean = 9.0f64;
        let expected_var = [7.0f64, 8.0, 9.0, 10.0, 11.0]
            .iter()
            .map(|x| (x - expected_mean).powi(2))
            .sum::<f64>()
            / 5.0;
        assert_abs_diff_eq!(
            t.standard_deviation(0),
            expected_var.sqrt() as f32,
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(t.speed(0), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn clear_behaves_like_fresh_init() {
        let mut t = tracker(3, 20);
        t.push(&frame(&[1.0, 2.0, 3.0]), 0.0);
        t.push(&frame(&[4.0, 0.0, 9.0]), 16.0);
        t.clear();
        for i in 0..3 {
            assert_eq!(t.speed(i), 0.0);
            assert_eq!(t.standard_deviation(i), 0.0);
        }
        assert_eq!(t.bin_count(), 3);

        // first push after clear records a zero delta again
        t.push(&frame(&[1.0, 1.0, 1.0]), 1000.0);
        t.push(&frame(&[2.0, 1.0, 1.0]), 1004.0);
        assert_abs_diff_eq!(t.speed(0), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn zero_length_frames_degenerate() {
        let mut t = tracker(0, 20);
        t.push(&FrequencyFrame::zeroed(0), 0.0);
        t.push(&FrequencyFrame::zeroed(0), 1.0);
        assert_eq!(t.average_increment(), 0.0);
        assert_eq!(t.speed(0), 0.0);
        assert_eq!(t.standard_deviation(0), 0.0);
    }

    #[test]
    fn reinit_discards_history() {
        let mut t = tracker(2, 20);
        t.push(&frame(&[1.0, 1.0]), 0.0);
        t.push(&frame(&[3.0, 1.0]), 1.0);
        t.init(4);
        assert_eq!(t.bin_count(), 4);
        assert!(t.is_empty());
        assert_eq!(t.speed(0), 0.0);
    }
}
