use super::analyser::AnalyserFrames;
use super::frame::{FrequencyFrame, TimeDomainFrame};

/// Where a session pulls its two buffers from each tick. The source decides
/// what "now" is; the session only reads.
pub trait AudioSource {
    fn sample_rate(&self) -> f32;

    /// Transform size `T`
    fn fft_size(&self) -> usize;

    fn read_frequency_data(&mut self, frame: &mut FrequencyFrame);

    fn read_time_domain_data(&mut self, frame: &mut TimeDomainFrame);
}

/// Plays back pre-rendered analyser spectra together with the PCM they were
/// rendered from, one tick at a time.
pub struct ReplaySource {
    frames: AnalyserFrames,
    samples: Vec<f32>,
    tick: usize,
}

impl ReplaySource {
    pub fn new(frames: AnalyserFrames, samples: Vec<f32>) -> Self {
        Self {
            frames,
            samples,
            tick: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.spectra.is_empty()
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    /// Position the playhead on `tick`, clamped to the last rendered tick.
    pub fn seek(&mut self, tick: usize) {
        self.tick = tick.min(self.len().saturating_sub(1));
    }
}

impl AudioSource for ReplaySource {
    fn sample_rate(&self) -> f32 {
        self.frames.sample_rate as f32
    }

    fn fft_size(&self) -> usize {
        self.frames.fft_size
    }

    fn read_frequency_data(&mut self, frame: &mut FrequencyFrame) {
        match self.frames.spectra.get(self.tick) {
            Some(spectrum) => frame.copy_from_bytes(spectrum),
            None => frame.copy_from_bytes(&[]),
        }
    }

    fn read_time_domain_data(&mut self, frame: &mut TimeDomainFrame) {
        let end = self
            .frames
            .offsets
            .get(self.tick)
            .copied()
            .unwrap_or(0)
            .min(self.samples.len());
        let start = end.saturating_sub(self.frames.fft_size);
        let window = &self.samples[start..end];

        // zero-pad at the front when the playhead is near the start
        let pad = self.frames.fft_size - window.len();
        let mut buffer = vec![0.0f32; self.frames.fft_size];
        buffer[pad..].copy_from_slice(window);
        frame.copy_from_slice(&buffer);
    }
}
