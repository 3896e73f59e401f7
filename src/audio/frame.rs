use crate::error::ConfigError;

/// Fixed geometry of a session's input buffers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameLayout {
    sample_rate: f32,
    fft_size: usize,
}

impl FrameLayout {
    pub fn new(sample_rate: f32, fft_size: usize) -> Result<Self, ConfigError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ConfigError::invalid(
                "sample_rate",
                format!("must be finite and positive, got {}", sample_rate),
            ));
        }
        if fft_size < 2 {
            return Err(ConfigError::invalid(
                "fft_size",
                format!("must be at least 2, got {}", fft_size),
            ));
        }
        Ok(Self { sample_rate, fft_size })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Transform size, also the time-domain frame length `T`
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins `B`
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Physical frequency of a (possibly fractional) bin position: `i * Sr / (2B)`
    pub fn bin_frequency(&self, position: f32) -> f32 {
        bin_frequency(position, self.sample_rate, self.frequency_bin_count())
    }
}

pub fn bin_frequency(position: f32, sample_rate: f32, bin_count: usize) -> f32 {
    if bin_count == 0 {
        return 0.0;
    }
    position * sample_rate / (2 * bin_count) as f32
}

/// Magnitude spectrum of one tick. Values are non-negative; anything else
/// coming from a source is flushed to zero on the way in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrequencyFrame {
    bins: Vec<f32>,
}

impl FrequencyFrame {
    pub fn new(bins: Vec<f32>) -> Self {
        let mut frame = Self { bins };
        for v in frame.bins.iter_mut() {
            *v = sanitize_magnitude(*v);
        }
        frame
    }

    pub fn zeroed(len: usize) -> Self {
        Self { bins: vec![0.0; len] }
    }

    /// Overwrite in place, keeping the frame length. Missing values read as 0.
    pub fn copy_from_slice(&mut self, values: &[f32]) {
        for (i, slot) in self.bins.iter_mut().enumerate() {
            *slot = values.get(i).copied().map_or(0.0, sanitize_magnitude);
        }
    }

    pub fn copy_from_bytes(&mut self, bytes: &[u8]) {
        for (i, slot) in self.bins.iter_mut().enumerate() {
            *slot = bytes.get(i).map_or(0.0, |&b| b as f32);
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Histogram area `A = sum of magnitudes`, accumulated in f64
    pub fn total_area(&self) -> f64 {
        self.bins.iter().map(|&v| v as f64).sum()
    }

    pub fn peak(&self) -> f32 {
        self.bins.iter().copied().fold(0.0f32, f32::max)
    }
}

fn sanitize_magnitude(v: f32) -> f32 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Signed time-domain samples of one tick, nominally in [-1, 1].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeDomainFrame {
    samples: Vec<f32>,
}

impl TimeDomainFrame {
    pub fn new(samples: Vec<f32>) -> Self {
        let mut frame = Self { samples };
        for s in frame.samples.iter_mut() {
            *s = sanitize_sample(*s);
        }
        frame
    }

    pub fn zeroed(len: usize) -> Self {
        Self { samples: vec![0.0; len] }
    }

    pub fn copy_from_slice(&mut self, values: &[f32]) {
        for (i, slot) in self.samples.iter_mut().enumerate() {
            *slot = values.get(i).copied().map_or(0.0, sanitize_sample);
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn sanitize_sample(s: f32) -> f32 {
    if s.is_finite() {
        s
    } else {
        0.0
    }
}
