//! Fundamental-frequency estimation with the YIN difference method.
//!
//! 1. Difference function d(τ) = Σ (x[j] - x[j+τ])² over the first half of the buffer
//! 2. Cumulative mean normalization d'(τ) = d(τ) · τ / Σ d(1..=τ), d'(0) = 1
//! 3. First τ ≥ 2 with d'(τ) under the threshold, walked down to the local minimum
//! 4. Parabolic interpolation around that τ
//!
//! Cost is O(T²/4) per frame; `window` caps T when that matters.

use crate::error::AnalysisError;

const MIN_BUFFER: usize = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PitchEstimate {
    /// Detected fundamental in Hz; 0 when no pitch was found
    pub frequency: f32,
    /// d'(τ) at the chosen lag, lower is more periodic; 1 when no pitch was found
    pub aperiodicity: f32,
}

impl PitchEstimate {
    pub fn none() -> Self {
        Self {
            frequency: 0.0,
            aperiodicity: 1.0,
        }
    }

    pub fn is_voiced(&self) -> bool {
        self.frequency > 0.0
    }

    /// Confidence in [0, 1], the complement of the aperiodicity. 0 when unvoiced.
    pub fn accuracy(&self) -> f32 {
        if !self.is_voiced() {
            return 0.0;
        }
        (1.0 - self.aperiodicity).clamp(0.0, 1.0)
    }
}

pub struct PitchEstimator {
    threshold: f32,
    window: Option<usize>,
    yin: Vec<f64>,
}

impl PitchEstimator {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            window: None,
            yin: Vec::new(),
        }
    }

    /// Analyse at most `window` leading samples of each buffer.
    pub fn with_window(mut self, window: Option<usize>) -> Self {
        self.window = window;
        self
    }

    pub fn estimate(&mut self, samples: &[f32], sample_rate: f32) -> PitchEstimate {
        match self.try_estimate(samples, sample_rate) {
            Ok(Some(estimate)) => estimate,
            Ok(None) => PitchEstimate::none(),
            Err(err) => {
                log::trace!("pitch estimate skipped: {}", err);
                PitchEstimate::none()
            }
        }
    }

    /// `Ok(None)` when the threshold is never crossed.
    pub fn try_estimate(
        &mut self,
        samples: &[f32],
        sample_rate: f32,
    ) -> Result<Option<PitchEstimate>, AnalysisError> {
        let len = self.window.map_or(samples.len(), |w| w.min(samples.len()));
        if len < MIN_BUFFER {
            return Err(AnalysisError::FrameTooShort {
                len,
                required: MIN_BUFFER,
            });
        }
        if !(sample_rate > 0.0) {
            return Ok(None);
        }
        let samples = &samples[..len];
        let half = len / 2;

        self.difference(samples, half);
        if !self.normalize() {
            return Err(AnalysisError::SilentFrame);
        }

        let threshold = self.threshold as f64;
        let yin = &self.yin;
        let mut tau = 2;
        while tau < half {
            if yin[tau] < threshold {
                while tau + 1 < half && yin[tau + 1] < yin[tau] {
                    tau += 1;
                }
                break;
            }
            tau += 1;
        }
        if tau >= half || yin[tau] >= threshold {
            return Ok(None);
        }

        let refined = self.refine(tau, half);
        if !(refined > 0.0) {
            return Ok(None);
        }

        Ok(Some(PitchEstimate {
            frequency: (sample_rate as f64 / refined) as f32,
            aperiodicity: yin[tau] as f32,
        }))
    }

    fn difference(&mut self, samples: &[f32], half: usize) {
        self.yin.clear();
        self.yin.resize(half, 0.0);
        for tau in 0..half {
            let mut sum = 0.0f64;
            for j in 0..half {
                let delta = samples[j] as f64 - samples[j + tau] as f64;
                sum += delta * delta;
            }
            self.yin[tau] = sum;
        }
    }

    /// In-place cumulative mean normalization. `false` when the signal has no
    /// variation at any lag.
    fn normalize(&mut self) -> bool {
        let Some(first) = self.yin.first_mut() else {
            return false;
        };
        *first = 1.0;
        let mut running_sum = 0.0f64;
        let mut any_energy = false;
        for tau in 1..self.yin.len() {
            running_sum += self.yin[tau];
            if running_sum > f64::EPSILON {
                any_energy = true;
                self.yin[tau] *= tau as f64 / running_sum;
            } else {
                self.yin[tau] = 1.0;
            }
        }
        any_energy
    }

    fn refine(&self, tau: usize, half: usize) -> f64 {
        let x0 = tau - 1;
        let x2 = if tau + 1 < half { tau + 1 } else { tau };
        let s0 = self.yin[x0];
        let s1 = self.yin[tau];
        let s2 = self.yin[x2];
        let denominator = 2.0 * (2.0 * s1 - s2 - s0);
        if denominator.abs() < 1e-12 {
            return tau as f64;
        }
        let shift = ((s2 - s0) / denominator).clamp(-1.0, 1.0);
        tau as f64 + shift
    }
}
