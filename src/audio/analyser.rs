use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::AnalyserConfig;
use crate::error::ConfigError;

/// Byte spectra rendered at a fixed tick rate, one per tick, plus the sample
/// offset each tick ends at.
#[derive(Clone, Debug)]
pub struct AnalyserFrames {
    pub sample_rate: u32,
    pub fft_size: usize,
    pub spectra: Vec<Vec<u8>>,
    pub offsets: Vec<usize>,
}

/// Render what a real-time analyser node would have reported at every tick of
/// a `fps` clock while `samples` played.
///
/// Pass 1 (parallel): Blackman-windowed FFT of the `fft_size` samples ending at
/// each tick, magnitudes scaled by `1/N`.
/// Pass 2 (sequential): exponential smoothing across ticks, then decibel
/// conversion to bytes over `[min_decibels, max_decibels]`.
pub fn render_spectra(
    samples: &[f32],
    sample_rate: u32,
    fps: u32,
    config: &AnalyserConfig,
) -> Result<AnalyserFrames, ConfigError> {
    config.validate()?;
    if sample_rate == 0 {
        return Err(ConfigError::invalid("sample_rate", "must be positive"));
    }
    if fps == 0 {
        return Err(ConfigError::invalid("fps", "must be positive"));
    }

    let duration = samples.len() as f64 / sample_rate as f64;
    let total_ticks = (duration * fps as f64).ceil() as usize;
    let samples_per_tick = sample_rate as f64 / fps as f64;
    let offsets: Vec<usize> = (0..total_ticks)
        .map(|i| (((i + 1) as f64 * samples_per_tick) as usize).min(samples.len()))
        .collect();

    log::info!(
        "Pass 1: Windowed FFT ({} ticks, fft_size={})...",
        total_ticks,
        config.fft_size
    );
    let magnitudes = pass1_magnitudes(samples, &offsets, config.fft_size);

    log::info!("Pass 2: Smoothing & byte conversion (smoothing={:.2})...", config.smoothing);
    let spectra = pass2_smooth(&magnitudes, config);

    Ok(AnalyserFrames {
        sample_rate,
        fft_size: config.fft_size,
        spectra,
        offsets,
    })
}

fn pass1_magnitudes(samples: &[f32], offsets: &[usize], fft_size: usize) -> Vec<Vec<f32>> {
    let window = blackman_window(fft_size);
    let half = fft_size / 2;

    offsets
        .par_iter()
        .map(|&end| {
            let start = end.saturating_sub(fft_size);
            let available = &samples[start..end];
            // right-align so the newest sample is always last
            let pad = fft_size - available.len();

            let mut fft_input: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); fft_size];
            for (i, &s) in available.iter().enumerate() {
                fft_input[pad + i] = Complex::new(s * window[pad + i], 0.0);
            }

            // Per-thread FFT planner (rayon-safe)
            let mut planner = FftPlanner::<f32>::new();
            let fft = planner.plan_fft_forward(fft_size);
            fft.process(&mut fft_input);

            let scale = 1.0 / fft_size as f32;
            fft_input[..half].iter().map(|c| c.norm() * scale).collect()
        })
        .collect()
}

fn pass2_smooth(magnitudes: &[Vec<f32>], config: &AnalyserConfig) -> Vec<Vec<u8>> {
    let tau = config.smoothing;
    let range = config.max_decibels - config.min_decibels;
    let mut previous = vec![0.0f32; config.fft_size / 2];

    magnitudes
        .iter()
        .map(|frame| {
            frame
                .iter()
                .zip(previous.iter_mut())
                .map(|(&mag, prev)| {
                    let smoothed = tau * *prev + (1.0 - tau) * mag;
                    *prev = if smoothed.is_finite() { smoothed } else { 0.0 };
                    let db = 20.0 * prev.log10();
                    (255.0 * (db - config.min_decibels) / range).clamp(0.0, 255.0) as u8
                })
                .collect()
        })
        .collect()
}

fn blackman_window(size: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42f32, 0.5f32, 0.08f32);
    (0..size)
        .map(|i| {
            let x = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| {
                (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5
            })
            .collect()
    }

    fn analyser(fft_size: usize, smoothing: f32) -> AnalyserConfig {
        AnalyserConfig {
            fft_size,
            smoothing,
            ..AnalyserConfig::default()
        }
    }

    #[test]
    fn tick_count_and_offsets_follow_the_clock() {
        let samples = vec![0.0; 48000];
        let frames = render_spectra(&samples, 48000, 60, &analyser(1024, 0.8)).unwrap();
        assert_eq!(frames.spectra.len(), 60);
        assert_eq!(frames.offsets.len(), 60);
        assert_eq!(frames.offsets[0], 800);
        assert_eq!(*frames.offsets.last().unwrap(), 48000);
        assert!(frames.spectra.iter().all(|s| s.len() == 512));
    }

    #[test]
    fn silence_renders_zero_bytes() {
        let samples = vec![0.0; 16000];
        let frames = render_spectra(&samples, 16000, 30, &analyser(512, 0.5)).unwrap();
        assert!(frames.spectra.iter().flatten().all(|&b| b == 0));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        // 1000 Hz at 32 kHz with N=1024 lands exactly on bin 32
        let samples = sine(1000.0, 32000, 0.5);
        let config = AnalyserConfig {
            max_decibels: 0.0,
            ..analyser(1024, 0.0)
        };
        let frames = render_spectra(&samples, 32000, 30, &config).unwrap();
        let last = frames.spectra.last().unwrap();
        let peak = last
            .iter()
            .enumerate()
            .max_by_key(|(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 32);
        assert!(last[32] > 0);
    }

    #[test]
    fn smoothing_carries_energy_past_the_signal() {
        // half a second of tone, then half a second of silence
        let mut samples = sine(1000.0, 32000, 0.5);
        samples.extend(vec![0.0; 16000]);
        let fast = render_spectra(&samples, 32000, 30, &analyser(1024, 0.0)).unwrap();
        let slow = render_spectra(&samples, 32000, 30, &analyser(1024, 0.9)).unwrap();

        // first tick whose window is fully silent
        let tick = fast
            .offsets
            .iter()
            .position(|&end| end >= 16000 + 1024)
            .unwrap();
        assert_eq!(fast.spectra[tick][32], 0);
        assert!(slow.spectra[tick][32] > 0);
    }

    #[test]
    fn rejects_bad_fft_size_and_clock() {
        let samples = vec![0.0; 100];
        assert!(render_spectra(&samples, 8000, 30, &analyser(1000, 0.8)).is_err());
        assert!(render_spectra(&samples, 8000, 0, &analyser(1024, 0.8)).is_err());
        assert!(render_spectra(&samples, 0, 30, &analyser(1024, 0.8)).is_err());
    }
}
