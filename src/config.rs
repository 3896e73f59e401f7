use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub analyser: AnalyserConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Tunables of the analysis and sampling pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Paint-budget multiplier: budget = peak amplitude * area_scale * elapsed ms
    #[serde(default = "default_area_scale")]
    pub area_scale: f32,
    /// Point-size multiplier: size = sqrt(amplitude) * size_scale
    #[serde(default = "default_size_scale")]
    pub size_scale: f32,
    /// Number of observations kept per bin by the statistics window
    #[serde(default = "default_window_len")]
    pub window_len: usize,
    /// YIN absolute threshold on the normalized difference
    #[serde(default = "default_yin_threshold")]
    pub yin_threshold: f32,
    /// Optional cap on the number of time-domain samples fed to the pitch estimator
    #[serde(default)]
    pub pitch_window: Option<usize>,
    #[serde(default = "default_lpc_order")]
    pub lpc_order: usize,
    #[serde(default = "default_pre_emphasis")]
    pub pre_emphasis: f32,
    #[serde(default = "default_formant_min_hz")]
    pub formant_min_hz: f32,
    #[serde(default = "default_formant_max_hz")]
    pub formant_max_hz: f32,
    #[serde(default = "default_formant_max_bandwidth_hz")]
    pub formant_max_bandwidth_hz: f32,
    #[serde(default = "default_max_formants")]
    pub max_formants: usize,
    /// Harmonics considered by the odd/even ratio
    #[serde(default = "default_harmonic_count")]
    pub harmonic_count: usize,
    /// Budget consumed by a draw that lands on a zero-magnitude bin
    #[serde(default = "default_min_point_cost")]
    pub min_point_cost: f32,
    /// Hard cap on points emitted per frame
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    /// Seed for the sampler; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyserConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "default_min_decibels")]
    pub min_decibels: f32,
    #[serde(default = "default_max_decibels")]
    pub max_decibels: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub pretty: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            area_scale: default_area_scale(),
            size_scale: default_size_scale(),
            window_len: default_window_len(),
            yin_threshold: default_yin_threshold(),
            pitch_window: None,
            lpc_order: default_lpc_order(),
            pre_emphasis: default_pre_emphasis(),
            formant_min_hz: default_formant_min_hz(),
            formant_max_hz: default_formant_max_hz(),
            formant_max_bandwidth_hz: default_formant_max_bandwidth_hz(),
            max_formants: default_max_formants(),
            harmonic_count: default_harmonic_count(),
            min_point_cost: default_min_point_cost(),
            max_points: default_max_points(),
            seed: None,
        }
    }
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
            min_decibels: default_min_decibels(),
            max_decibels: default_max_decibels(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            pretty: false,
        }
    }
}

fn default_area_scale() -> f32 { 0.5 }
fn default_size_scale() -> f32 { 1.0 }
fn default_window_len() -> usize { 20 }
fn default_yin_threshold() -> f32 { 0.2 }
fn default_lpc_order() -> usize { 14 }
fn default_pre_emphasis() -> f32 { 0.97 }
fn default_formant_min_hz() -> f32 { 80.0 }
fn default_formant_max_hz() -> f32 { 4000.0 }
fn default_formant_max_bandwidth_hz() -> f32 { 500.0 }
fn default_max_formants() -> usize { 5 }
fn default_harmonic_count() -> usize { 10 }
fn default_min_point_cost() -> f32 { 1.0 }
fn default_max_points() -> usize { 10_000 }
fn default_fft_size() -> usize { 4096 }
fn default_smoothing() -> f32 { 0.8 }
fn default_min_decibels() -> f32 { -100.0 }
fn default_max_decibels() -> f32 { -30.0 }
fn default_fps() -> u32 { 60 }

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.area_scale.is_finite() && self.area_scale >= 0.0) {
            return Err(ConfigError::invalid("area_scale", "must be finite and non-negative"));
        }
        if !(self.size_scale.is_finite() && self.size_scale > 0.0) {
            return Err(ConfigError::invalid("size_scale", "must be finite and positive"));
        }
        if self.window_len == 0 {
            return Err(ConfigError::invalid("window_len", "must hold at least one observation"));
        }
        if !(self.yin_threshold > 0.0 && self.yin_threshold <= 1.0) {
            return Err(ConfigError::invalid("yin_threshold", "must lie in (0, 1]"));
        }
        if matches!(self.pitch_window, Some(w) if w < 8) {
            return Err(ConfigError::invalid("pitch_window", "must be at least 8 samples"));
        }
        if self.lpc_order == 0 {
            return Err(ConfigError::invalid("lpc_order", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.pre_emphasis) {
            return Err(ConfigError::invalid("pre_emphasis", "must lie in [0, 1)"));
        }
        if !(self.formant_min_hz >= 0.0 && self.formant_min_hz < self.formant_max_hz) {
            return Err(ConfigError::invalid(
                "formant_min_hz",
                format!(
                    "must be non-negative and below formant_max_hz ({})",
                    self.formant_max_hz
                ),
            ));
        }
        if !(self.formant_max_bandwidth_hz > 0.0) {
            return Err(ConfigError::invalid("formant_max_bandwidth_hz", "must be positive"));
        }
        if !(self.min_point_cost.is_finite() && self.min_point_cost > 0.0) {
            return Err(ConfigError::invalid("min_point_cost", "must be finite and positive"));
        }
        if self.max_points == 0 {
            return Err(ConfigError::invalid("max_points", "must be at least 1"));
        }
        Ok(())
    }
}

impl AnalyserConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fft_size < 32 || !self.fft_size.is_power_of_two() {
            return Err(ConfigError::invalid("fft_size", "must be a power of two >= 32"));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(ConfigError::invalid("smoothing", "must lie in [0, 1)"));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(ConfigError::invalid("min_decibels", "must be below max_decibels"));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Local `voicepaint.toml`, then the XDG-style and platform config dirs.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("voicepaint.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("voicepaint").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("voicepaint").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
