//! Stateless scalar features of a magnitude spectrum.

use crate::audio::frame::{bin_frequency, FrequencyFrame};

const REFERENCE_PITCH: f32 = 440.0;

/// Magnitude-weighted mean frequency in Hz; 0 for a frame without energy.
pub fn spectral_centroid(frame: &FrequencyFrame, sample_rate: f32) -> f32 {
    let bins = frame.as_slice();
    let mut total = 0.0f64;
    let mut weighted = 0.0f64;
    for (i, &mag) in bins.iter().enumerate() {
        let freq = bin_frequency(i as f32, sample_rate, bins.len()) as f64;
        weighted += mag as f64 * freq;
        total += mag as f64;
    }
    if total > 0.0 {
        (weighted / total) as f32
    } else {
        0.0
    }
}

/// Odd-to-even energy ratio over the first `harmonics` multiples of the
/// fundamental. Magnitudes are treated as decibel-like values and mapped to
/// linear energy with `10^(mag/10)`. 0 when no even harmonic carries energy.
pub fn harmonic_ratio(
    frame: &FrequencyFrame,
    fundamental: f32,
    sample_rate: f32,
    harmonics: usize,
) -> f32 {
    let bins = frame.as_slice();
    if !(fundamental > 0.0) || bins.is_empty() {
        return 0.0;
    }
    let bin_width = sample_rate as f64 / (2 * bins.len()) as f64;
    let mut odd = 0.0f64;
    let mut even = 0.0f64;
    for n in 1..=harmonics {
        let bin = (fundamental as f64 * n as f64 / bin_width).round() as usize;
        let Some(&mag) = bins.get(bin) else {
            break;
        };
        let energy = 10f64.powf(mag as f64 / 10.0);
        if n % 2 == 0 {
            even += energy;
        } else {
            odd += energy;
        }
    }
    if even > 0.0 && odd.is_finite() && even.is_finite() {
        (odd / even) as f32
    } else {
        0.0
    }
}

/// Magnitude at twice the fundamental's bin over the magnitude at that bin.
/// 0 when either bin is out of range or the fundamental bin is empty.
pub fn second_harmonic_ratio(frame: &FrequencyFrame, fundamental: f32, sample_rate: f32) -> f32 {
    let bins = frame.as_slice();
    if !(fundamental > 0.0 && sample_rate > 0.0) || bins.is_empty() {
        return 0.0;
    }
    let nyquist = sample_rate / 2.0;
    let fundamental_bin = (fundamental / nyquist * bins.len() as f32).round() as usize;
    let (Some(&base), Some(&second)) = (bins.get(fundamental_bin), bins.get(fundamental_bin * 2))
    else {
        return 0.0;
    };
    if base > 0.0 {
        second / base
    } else {
        0.0
    }
}

/// Fractional MIDI note number (A4 = 69).
pub fn frequency_to_note(frequency: f32) -> Option<f32> {
    if !(frequency > 0.0) {
        return None;
    }
    Some((frequency * 32.0 / REFERENCE_PITCH).log2() * 12.0 + 9.0)
}

pub fn note_to_frequency(note: f32) -> f32 {
    REFERENCE_PITCH / 32.0 * 2f32.powf((note - 9.0) / 12.0)
}
