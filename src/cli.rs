use clap::Parser;
use std::path::PathBuf;

use voicepaint::config::Config;

#[derive(Parser, Debug)]
#[command(name = "voicepaint", about = "Turn recorded audio into per-tick paint data for a point renderer")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Output file for JSON lines, or "-" for stdout
    #[arg(short, long, default_value = "paint.jsonl")]
    pub output: PathBuf,

    /// Config file (defaults to voicepaint.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Ticks per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Analyser transform size (power of two)
    #[arg(long)]
    pub fft_size: Option<usize>,

    /// Analyser smoothing across ticks (0.0-1.0)
    #[arg(long)]
    pub smoothing: Option<f32>,

    /// Paint-budget multiplier
    #[arg(long)]
    pub area_scale: Option<f32>,

    /// Point-size multiplier
    #[arg(long)]
    pub size_scale: Option<f32>,

    /// Observations kept per bin by the statistics window
    #[arg(long)]
    pub window_len: Option<usize>,

    /// Cap on samples fed to the pitch estimator
    #[arg(long)]
    pub pitch_window: Option<usize>,

    /// Seed the point sampler for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pretty-print each frame
    #[arg(long)]
    pub pretty: bool,
}

impl Cli {
    /// Command-line values win over the config file.
    pub fn apply_to(&self, cfg: &mut Config) {
        if let Some(fps) = self.fps { cfg.output.fps = fps; }
        if let Some(fft_size) = self.fft_size { cfg.analyser.fft_size = fft_size; }
        if let Some(smoothing) = self.smoothing { cfg.analyser.smoothing = smoothing; }
        if let Some(area_scale) = self.area_scale { cfg.session.area_scale = area_scale; }
        if let Some(size_scale) = self.size_scale { cfg.session.size_scale = size_scale; }
        if let Some(window_len) = self.window_len { cfg.session.window_len = window_len; }
        if self.pitch_window.is_some() {
            cfg.session.pitch_window = self.pitch_window;
        }
        if self.seed.is_some() {
            cfg.session.seed = self.seed;
        }
        if self.pretty {
            cfg.output.pretty = true;
        }
    }
}
