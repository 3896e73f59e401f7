use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use crate::analysis::formant::FormantEstimator;
use crate::analysis::metrics::{
    frequency_to_note, harmonic_ratio, second_harmonic_ratio, spectral_centroid,
};
use crate::analysis::pitch::PitchEstimator;
use crate::analysis::stats::SpectralStatisticsTracker;
use crate::audio::frame::{FrameLayout, FrequencyFrame, TimeDomainFrame};
use crate::audio::source::AudioSource;
use crate::config::SessionConfig;
use crate::error::ConfigError;

use super::data::PaintData;
use super::sampler::WeightedPointSampler;

/// Owns everything that lives across ticks: the statistics window, the
/// estimators' scratch space, the sampler's RNG and the session clock.
///
/// Frames are processed strictly one after another; the session is not meant
/// to be shared between threads without external serialization.
pub struct AnalysisSession {
    config: SessionConfig,
    layout: FrameLayout,
    tracker: SpectralStatisticsTracker,
    pitch: PitchEstimator,
    formants: FormantEstimator,
    sampler: WeightedPointSampler,
    rng: StdRng,
    clock_ms: f64,
    frequency: FrequencyFrame,
    time_domain: TimeDomainFrame,
}

impl AnalysisSession {
    pub fn new(config: SessionConfig, layout: FrameLayout) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut tracker = SpectralStatisticsTracker::new(config.window_len);
        tracker.init(layout.frequency_bin_count());
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        log::info!(
            "Analysis session: {} Hz, fft_size={}, {} bins, window={}",
            layout.sample_rate(),
            layout.fft_size(),
            layout.frequency_bin_count(),
            config.window_len
        );

        Ok(Self {
            pitch: PitchEstimator::new(config.yin_threshold).with_window(config.pitch_window),
            formants: FormantEstimator::from_config(&config),
            sampler: WeightedPointSampler::from_config(&config),
            frequency: FrequencyFrame::zeroed(layout.frequency_bin_count()),
            time_domain: TimeDomainFrame::zeroed(layout.fft_size()),
            config,
            layout,
            tracker,
            rng,
            clock_ms: 0.0,
        })
    }

    /// Session sized for whatever `source` reports.
    pub fn for_source<S: AudioSource>(config: SessionConfig, source: &S) -> Result<Self, ConfigError> {
        let layout = FrameLayout::new(source.sample_rate(), source.fft_size())?;
        Self::new(config, layout)
    }

    /// Pull the current buffers from `source` and analyse them. `elapsed` is
    /// the wall time since the previous tick.
    pub fn get_frame_data<S: AudioSource>(&mut self, source: &mut S, elapsed: Duration) -> PaintData {
        source.read_frequency_data(&mut self.frequency);
        source.read_time_domain_data(&mut self.time_domain);
        self.process(elapsed)
    }

    /// Analyse caller-supplied buffers. Buffers shorter than the session
    /// layout are zero-filled; longer ones are truncated.
    pub fn analyze(
        &mut self,
        frequency: &FrequencyFrame,
        time_domain: &TimeDomainFrame,
        elapsed: Duration,
    ) -> PaintData {
        self.frequency.copy_from_slice(frequency.as_slice());
        self.time_domain.copy_from_slice(time_domain.as_slice());
        self.process(elapsed)
    }

    /// Forget all statistics history and restart the session clock. Call
    /// when the audio source changes.
    pub fn reset(&mut self) {
        self.tracker.clear();
        self.clock_ms = 0.0;
        log::info!("Analysis session reset");
    }

    pub fn tracker(&self) -> &SpectralStatisticsTracker {
        &self.tracker
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn process(&mut self, elapsed: Duration) -> PaintData {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let sample_rate = self.layout.sample_rate();
        self.clock_ms += elapsed_ms;
        self.tracker.push(&self.frequency, self.clock_ms);

        let peak = self.frequency.peak();
        let average_amplitude = if self.frequency.is_empty() {
            0.0
        } else {
            (self.frequency.total_area() / self.frequency.len() as f64) as f32
        };
        let centroid = spectral_centroid(&self.frequency, sample_rate);

        let pitch = self.pitch.estimate(self.time_domain.as_slice(), sample_rate);
        let (harmonic, second_harmonic) = if pitch.is_voiced() {
            (
                harmonic_ratio(
                    &self.frequency,
                    pitch.frequency,
                    sample_rate,
                    self.config.harmonic_count,
                ),
                second_harmonic_ratio(&self.frequency, pitch.frequency, sample_rate),
            )
        } else {
            (0.0, 0.0)
        };
        let formants = self.formants.estimate(self.time_domain.as_slice(), sample_rate);

        let points = self.sampler.sample(
            &self.frequency,
            &self.tracker,
            sample_rate,
            elapsed_ms,
            &mut self.rng,
        );

        log::trace!(
            "tick @{:.1}ms: peak={:.1} centroid={:.1}Hz f0={:.1}Hz points={} formants={}",
            self.clock_ms,
            peak,
            centroid,
            pitch.frequency,
            points.len(),
            formants.len()
        );

        PaintData {
            points,
            fundamental_frequency: pitch.frequency,
            fundamental_frequency_accuracy: pitch.accuracy(),
            note: frequency_to_note(pitch.frequency),
            spectral_centroid: centroid,
            delta_speed: self.tracker.average_increment(),
            sample_rate,
            amplitude: peak,
            average_amplitude,
            harmonic_ratio: harmonic,
            second_harmonic_ratio: second_harmonic,
            formants,
        }
    }
}
