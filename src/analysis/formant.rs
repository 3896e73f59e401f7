//! Formant estimation from linear prediction.
//!
//! Pre-emphasis, autocorrelation, Levinson-Durbin recursion, then the roots
//! of the prediction polynomial `1 + a₁z⁻¹ + … + aₚz⁻ᵖ`. Each root
//! `|r|·e^{iθ}` is a resonance at `θ/2π · Sr` Hz with bandwidth
//! `-ln|r|/π · Sr` Hz.

use serde::Serialize;
use std::f64::consts::PI;

use super::roots::polynomial_roots;
use crate::config::SessionConfig;
use crate::error::AnalysisError;

/// Prediction error below this fraction of the signal energy is treated as
/// a degenerate (singular) system.
const DEGENERATE_ERROR: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Formant {
    /// Centre frequency in Hz
    pub frequency: f32,
    /// Bandwidth in Hz
    pub bandwidth: f32,
    /// Approximate relative amplitude in dB
    pub amplitude: f32,
}

/// Acceptance window for resonances. Poles outside it are numerical
/// artifacts or out-of-range resonances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormantBounds {
    pub min_hz: f32,
    pub max_hz: f32,
    pub max_bandwidth_hz: f32,
}

impl Default for FormantBounds {
    fn default() -> Self {
        Self {
            min_hz: 80.0,
            max_hz: 4000.0,
            max_bandwidth_hz: 500.0,
        }
    }
}

impl FormantBounds {
    fn accepts(&self, frequency: f64, bandwidth: f64) -> bool {
        frequency > self.min_hz as f64
            && frequency < self.max_hz as f64
            && bandwidth < self.max_bandwidth_hz as f64
    }
}

pub struct FormantEstimator {
    order: usize,
    pre_emphasis: f32,
    bounds: FormantBounds,
    max_formants: usize,
}

impl FormantEstimator {
    pub fn new(order: usize) -> Self {
        Self {
            order,
            pre_emphasis: 0.97,
            bounds: FormantBounds::default(),
            max_formants: 5,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            order: config.lpc_order,
            pre_emphasis: config.pre_emphasis,
            bounds: FormantBounds {
                min_hz: config.formant_min_hz,
                max_hz: config.formant_max_hz,
                max_bandwidth_hz: config.formant_max_bandwidth_hz,
            },
            max_formants: config.max_formants,
        }
    }

    /// Formants sorted by ascending frequency; empty when the frame is
    /// silent or the prediction system is degenerate.
    pub fn estimate(&self, samples: &[f32], sample_rate: f32) -> Vec<Formant> {
        self.try_estimate(samples, sample_rate).unwrap_or_else(|err| {
            log::debug!("formant extraction skipped: {}", err);
            Vec::new()
        })
    }

    pub fn try_estimate(
        &self,
        samples: &[f32],
        sample_rate: f32,
    ) -> Result<Vec<Formant>, AnalysisError> {
        if samples.len() <= self.order {
            return Err(AnalysisError::FrameTooShort {
                len: samples.len(),
                required: self.order + 1,
            });
        }
        let emphasized = pre_emphasize(samples, self.pre_emphasis);
        let r = autocorrelation(&emphasized, self.order);
        let lpc = levinson_durbin(&r, self.order)?;
        let mut formants = formants_from_lpc(&lpc, sample_rate, &self.bounds)?;
        formants.truncate(self.max_formants);
        Ok(formants)
    }
}

/// First-order high-pass: `y[0] = x[0]`, `y[n] = x[n] - coeff·x[n-1]`.
pub fn pre_emphasize(samples: &[f32], coeff: f32) -> Vec<f64> {
    let coeff = coeff as f64;
    let mut out = Vec::with_capacity(samples.len());
    let mut prev = 0.0f64;
    for (n, &s) in samples.iter().enumerate() {
        let s = s as f64;
        out.push(if n == 0 { s } else { s - coeff * prev });
        prev = s;
    }
    out
}

/// `r[0..=order]`
pub fn autocorrelation(signal: &[f64], order: usize) -> Vec<f64> {
    (0..=order)
        .map(|lag| {
            signal
                .iter()
                .zip(signal.iter().skip(lag))
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Solves the normal equations for `a[1..=order]` of `A(z) = 1 + Σ aₖz⁻ᵏ`.
pub fn levinson_durbin(r: &[f64], order: usize) -> Result<Vec<f64>, AnalysisError> {
    if r.len() <= order {
        return Err(AnalysisError::FrameTooShort {
            len: r.len(),
            required: order + 1,
        });
    }
    let energy = r[0];
    if !(energy.is_finite() && energy > f64::MIN_POSITIVE) {
        return Err(AnalysisError::SilentFrame);
    }

    let mut a = vec![0.0f64; order + 1];
    a[0] = 1.0;
    let mut scratch = a.clone();
    let mut error = energy;

    for i in 1..=order {
        if !(error.is_finite() && error > energy * DEGENERATE_ERROR) {
            return Err(AnalysisError::DegeneratePrediction { order: i });
        }
        let acc: f64 = r[i] + (1..i).map(|j| a[j] * r[i - j]).sum::<f64>();
        let k = -acc / error;
        if !(k.is_finite() && k.abs() < 1.0) {
            return Err(AnalysisError::DegeneratePrediction { order: i });
        }

        scratch.copy_from_slice(&a);
        for j in 1..i {
            a[j] = scratch[j] + k * scratch[i - j];
        }
        a[i] = k;
        error *= 1.0 - k * k;
    }

    a.remove(0);
    Ok(a)
}

/// Maps the roots of `1 + Σ aₖz⁻ᵏ` to formants within `bounds`, sorted by
/// ascending frequency. Only poles strictly inside the unit circle qualify.
pub fn formants_from_lpc(
    coeffs: &[f64],
    sample_rate: f32,
    bounds: &FormantBounds,
) -> Result<Vec<Formant>, AnalysisError> {
    let mut poly = Vec::with_capacity(coeffs.len() + 1);
    poly.push(1.0);
    poly.extend_from_slice(coeffs);

    let sr = sample_rate as f64;
    let mut formants: Vec<Formant> = polynomial_roots(&poly)?
        .into_iter()
        .filter_map(|root| {
            let radius = root.norm();
            if !(radius > 0.0 && radius < 1.0) {
                return None;
            }
            let frequency = root.arg() / (2.0 * PI) * sr;
            let bandwidth = -radius.ln() / PI * sr;
            if !bounds.accepts(frequency, bandwidth) {
                return None;
            }
            Some(Formant {
                frequency: frequency as f32,
                bandwidth: bandwidth as f32,
                amplitude: (20.0 * (1.0 / (1.0 - radius)).log10()) as f32,
            })
        })
        .collect();

    formants.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    Ok(formants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// `[a1, a2]` of a resonator section with the given centre and bandwidth
    fn section(freq: f64, bandwidth: f64, sample_rate: f64) -> [f64; 2] {
        let radius = (-PI * bandwidth / sample_rate).exp();
        let theta = 2.0 * PI * freq / sample_rate;
        [-2.0 * radius * theta.cos(), radius * radius]
    }

    /// Coefficients (without the leading 1) of the product of two sections
    fn cascade(s1: [f64; 2], s2: [f64; 2]) -> Vec<f64> {
        vec![
            s1[0] + s2[0],
            s1[1] + s2[1] + s1[0] * s2[0],
            s1[0] * s2[1] + s1[1] * s2[0],
            s1[1] * s2[1],
        ]
    }

    #[test]
    fn pre_emphasis_is_first_order_highpass() {
        let coeff = 0.97f32;
        let out = pre_emphasize(&[1.0, 1.0, 0.5], coeff);
        assert_abs_diff_eq!(out[0], 1.0);
        // the coefficient is widened from f32, so compare against the same value
        assert_abs_diff_eq!(out[1], 1.0 - coeff as f64, epsilon = 1e-12);
        assert_abs_diff_eq!(out[2], 0.5 - coeff as f64, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1], 0.03, epsilon = 1e-6);
    }

    #[test]
    fn autocorrelation_lag_zero_is_energy() {
        let r = autocorrelation(&[1.0, 2.0, 3.0], 2);
        assert_eq!(r, vec![14.0, 8.0, 3.0]);
    }

    #[test]
    fn levinson_recovers_ar1() {
        // r[k] = 0.9^k is the autocorrelation of x[n] = 0.9 x[n-1] + e[n]
        let r: Vec<f64> = (0..=4).map(|k| 0.9f64.powi(k)).collect();
        let a = levinson_durbin(&r, 4).unwrap();
        assert_abs_diff_eq!(a[0], -0.9, epsilon = 1e-9);
        for &c in &a[1..] {
            assert_abs_diff_eq!(c, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn levinson_rejects_silence_and_singular_systems() {
        assert_eq!(
            levinson_durbin(&[0.0, 0.0, 0.0], 2),
            Err(AnalysisError::SilentFrame)
        );
        // constant signal: perfectly predictable after the first step
        let r = vec![4.0, 4.0, 4.0, 4.0];
        assert!(matches!(
            levinson_durbin(&r, 3),
            Err(AnalysisError::DegeneratePrediction { .. })
        ));
    }

    #[test]
    fn bandwidth_bound_excludes_wide_poles() {
        let sample_rate = 16000.0;
        let coeffs = cascade(
            section(1200.0, 300.0, sample_rate),
            section(2000.0, 600.0, sample_rate),
        );
        let formants =
            formants_from_lpc(&coeffs, sample_rate as f32, &FormantBounds::default()).unwrap();
        assert_eq!(formants.len(), 1, "got {:?}", formants);
        assert_abs_diff_eq!(formants[0].frequency, 1200.0, epsilon = 0.01);
        assert_abs_diff_eq!(formants[0].bandwidth, 300.0, epsilon = 0.01);
        assert!(formants[0].amplitude > 0.0);
    }

    #[test]
    fn frequency_bounds_and_ordering() {
        let sample_rate = 16000.0;
        let coeffs = cascade(
            section(2500.0, 100.0, sample_rate),
            section(60.0, 50.0, sample_rate),
        );
        let formants =
            formants_from_lpc(&coeffs, sample_rate as f32, &FormantBounds::default()).unwrap();
        assert_eq!(formants.len(), 1);
        assert_abs_diff_eq!(formants[0].frequency, 2500.0, epsilon = 0.01);

        let coeffs = cascade(
            section(2500.0, 100.0, sample_rate),
            section(700.0, 100.0, sample_rate),
        );
        let formants =
            formants_from_lpc(&coeffs, sample_rate as f32, &FormantBounds::default()).unwrap();
        let freqs: Vec<f32> = formants.iter().map(|f| f.frequency).collect();
        assert_eq!(freqs.len(), 2);
        assert!(freqs[0] < freqs[1]);
    }

    #[test]
    fn finds_resonances_of_pulse_excited_filter() {
        let sample_rate = 16000.0f64;
        let a = cascade(
            section(700.0, 80.0, sample_rate),
            section(1200.0, 80.0, sample_rate),
        );
        // 100 Hz pulse train through the all-pole filter 1/A(z)
        let mut y = vec![0.0f64; 2048];
        for n in 0..y.len() {
            let x = if n % 160 == 0 { 1.0 } else { 0.0 };
            let mut v = x;
            for (k, &ak) in a.iter().enumerate() {
                if n > k {
                    v -= ak * y[n - k - 1];
                }
            }
            y[n] = v;
        }
        let peak = y.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let samples: Vec<f32> = y.iter().map(|v| (v / peak) as f32).collect();

        let estimator = FormantEstimator::new(14);
        let formants = estimator.try_estimate(&samples, sample_rate as f32).unwrap();
        assert!(formants.len() <= 5);
        for target in [700.0f32, 1200.0] {
            assert!(
                formants.iter().any(|f| (f.frequency - target).abs() < 60.0),
                "no formant near {} Hz in {:?}",
                target,
                formants
            );
        }
    }

    #[test]
    fn silent_frame_yields_no_formants() {
        let estimator = FormantEstimator::new(14);
        assert!(estimator.estimate(&vec![0.0; 1024], 44100.0).is_empty());
        assert!(estimator.estimate(&[0.1; 4], 44100.0).is_empty());
    }
}
