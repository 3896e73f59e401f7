//! Budgeted inverse-CDF sampling of the magnitude histogram.
//!
//! Each frame gets a paint budget of `peak · area_scale · elapsed_ms`. Points
//! are drawn with probability proportional to bin magnitude and each one
//! spends `size²` of the budget, so louder points are fewer and the number of
//! points grows with loudness and frame time.

use rand::Rng;

use crate::analysis::stats::SpectralStatisticsTracker;
use crate::audio::frame::{bin_frequency, FrequencyFrame};
use crate::config::SessionConfig;

use super::data::SamplePoint;

/// Inverse-CDF lookup: the fractional bin position where the cumulative
/// magnitude first exceeds `u · total_area`.
///
/// Returns 0 for an empty histogram and `bins.len()` if the scan runs off the
/// end (only reachable through rounding or `u >= 1`).
pub fn sample_bin(bins: &[f32], u: f64, total_area: f64) -> f64 {
    if !(total_area > 0.0) {
        return 0.0;
    }
    let mut area = total_area * u;
    for (i, &val) in bins.iter().enumerate() {
        let val = val as f64;
        if area < val {
            return i as f64 + area / val;
        }
        area -= val;
        if val > 0.0 && area == 0.0 {
            return (i + 1) as f64;
        }
    }
    bins.len() as f64
}

#[derive(Clone, Debug)]
pub struct WeightedPointSampler {
    area_scale: f32,
    size_scale: f32,
    min_point_cost: f32,
    max_points: usize,
}

impl WeightedPointSampler {
    pub fn new(area_scale: f32, size_scale: f32) -> Self {
        Self {
            area_scale,
            size_scale,
            min_point_cost: 1.0,
            max_points: 10_000,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            area_scale: config.area_scale,
            size_scale: config.size_scale,
            min_point_cost: config.min_point_cost,
            max_points: config.max_points,
        }
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Paint area available for a frame with the given peak magnitude.
    pub fn budget(&self, peak: f32, elapsed_ms: f64) -> f64 {
        let budget = peak as f64 * self.area_scale as f64 * elapsed_ms;
        if budget.is_finite() {
            budget.max(0.0)
        } else {
            0.0
        }
    }

    pub fn sample<R: Rng>(
        &self,
        frame: &FrequencyFrame,
        tracker: &SpectralStatisticsTracker,
        sample_rate: f32,
        elapsed_ms: f64,
        rng: &mut R,
    ) -> Vec<SamplePoint> {
        let bins = frame.as_slice();
        let area = frame.total_area();
        let mut remaining = self.budget(frame.peak(), elapsed_ms);
        if bins.is_empty() || !(area > 0.0) {
            return Vec::new();
        }

        let mut points = Vec::new();
        let mut draws = 0;
        while remaining > 0.0 && draws < self.max_points {
            draws += 1;
            let u: f64 = rng.random();
            let position = sample_bin(bins, u, area);
            let index = (position.floor() as usize).min(bins.len() - 1);
            let amplitude = bins[index];
            if !(amplitude > 0.0) {
                // landed on an empty bin boundary: nothing to draw
                remaining -= self.min_point_cost as f64;
                continue;
            }

            let size = amplitude.sqrt() * self.size_scale;
            points.push(SamplePoint {
                size,
                frequency: bin_frequency(position as f32, sample_rate, bins.len()),
                amplitude,
                delta_speed: tracker.speed(index).max(0.0),
                delta_std_dev: tracker.standard_deviation(index),
            });
            remaining -= (size * size) as f64;
        }

        if remaining > 0.0 {
            log::trace!(
                "sampler stopped at {} draws with {:.1} budget left",
                draws,
                remaining
            );
        }
        points
    }
}
