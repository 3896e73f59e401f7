use serde::Serialize;

use crate::analysis::formant::Formant;

/// One weighted point drawn from the spectrum, ready for the renderer
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SamplePoint {
    /// sqrt(amplitude) * size scale
    pub size: f32,
    /// Frequency (Hz) of the fractional bin position that was drawn
    pub frequency: f32,
    /// Magnitude of the drawn bin
    pub amplitude: f32,
    /// Rate of magnitude growth of the bin, clamped to >= 0
    pub delta_speed: f32,
    /// Dispersion of the bin over the statistics window
    pub delta_std_dev: f32,
}

/// Everything the renderer gets for one tick
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PaintData {
    pub points: Vec<SamplePoint>,
    /// Hz, 0 when no pitch was detected
    pub fundamental_frequency: f32,
    /// 0.0-1.0, 0 when no pitch was detected
    pub fundamental_frequency_accuracy: f32,
    /// Fractional MIDI note of the fundamental
    pub note: Option<f32>,
    /// Hz
    pub spectral_centroid: f32,
    /// Mean positive magnitude growth over all bins
    pub delta_speed: f32,
    pub sample_rate: f32,
    /// Peak magnitude of the frame
    pub amplitude: f32,
    /// Mean magnitude of the frame
    pub average_amplitude: f32,
    /// Odd/even harmonic energy ratio, 0 when no pitch was detected
    pub harmonic_ratio: f32,
    /// Second harmonic over fundamental, 0 when no pitch was detected
    pub second_harmonic_ratio: f32,
    /// Ascending by frequency
    pub formants: Vec<Formant>,
}

impl PaintData {
    /// Fundamental, or `fallback` when none was detected. Use this rather
    /// than the raw field in frequency-ratio math.
    pub fn pitch_or(&self, fallback: f32) -> f32 {
        if self.fundamental_frequency > 0.0 {
            self.fundamental_frequency
        } else {
            fallback
        }
    }
}
