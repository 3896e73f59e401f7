mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use cli::Cli;
use voicepaint::audio::analyser::render_spectra;
use voicepaint::audio::decode::decode_audio;
use voicepaint::audio::source::ReplaySource;
use voicepaint::config::{self, Config};
use voicepaint::encode::jsonl::PaintDataWriter;
use voicepaint::paint::session::AnalysisSession;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect voicepaint.toml / global config
    let mut cfg = match cli.config.clone().or_else(config::find_config) {
        Some(path) => {
            let cfg = config::load_config(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };
    cli.apply_to(&mut cfg);
    cfg.analyser.validate()?;
    cfg.session.validate()?;
    if cfg.output.fps == 0 {
        anyhow::bail!("fps must be positive");
    }

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("voicepaint - audio to paint data");
    log::info!("Input: {}", cli.input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!(
        "Clock: {}fps, fft_size={}, smoothing={:.2}",
        cfg.output.fps,
        cfg.analyser.fft_size,
        cfg.analyser.smoothing
    );

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio = decode_audio(&cli.input)?;

    // 2. Render the analyser's view of every tick
    log::info!("Rendering analyser spectra...");
    let frames = render_spectra(&audio.samples, audio.sample_rate, cfg.output.fps, &cfg.analyser)?;
    let total_ticks = frames.spectra.len();
    log::info!("Total ticks: {}, Duration: {:.1}s", total_ticks, audio.duration_secs());

    // 3. Session over the replayed buffers
    let mut source = ReplaySource::new(frames, audio.samples);
    let mut session = AnalysisSession::for_source(cfg.session.clone(), &source)?;
    let mut writer = PaintDataWriter::create(&cli.output, cfg.output.pretty)?;

    // 4. Tick loop
    let tick = Duration::from_secs_f64(1.0 / cfg.output.fps as f64);
    let pb = ProgressBar::new(total_ticks as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ticks ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let mut total_points = 0usize;
    let mut voiced_ticks = 0usize;
    for tick_idx in 0..total_ticks {
        source.seek(tick_idx);
        let data = session.get_frame_data(&mut source, tick);
        total_points += data.points.len();
        if data.fundamental_frequency > 0.0 {
            voiced_ticks += 1;
        }
        writer.write_frame(tick_idx as f64 / cfg.output.fps as f64, &data)?;
        pb.set_position(tick_idx as u64 + 1);
    }

    pb.finish_with_message("Analysis complete");

    // 5. Flush output
    writer.finish()?;

    log::info!(
        "Done! {} ticks, {} points, {} voiced ticks. Output: {}",
        total_ticks,
        total_points,
        voiced_ticks,
        cli.output.display()
    );
    Ok(())
}
