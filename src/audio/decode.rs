use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Mono PCM of a whole file
#[derive(Debug)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the source before downmixing
    pub channels: usize,
}

impl AudioData {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// A probed container with a decoder ready for its first audio track.
struct OpenTrack {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    channels: usize,
    sample_rate: u32,
}

fn open_track(path: &Path) -> Result<OpenTrack> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    let format = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?
        .format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio tracks found")?;
    let params = &track.codec_params;
    let sample_rate = params.sample_rate.context("Unknown sample rate")?;
    let decoder = symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    Ok(OpenTrack {
        track_id: track.id,
        channels: params.channels.map_or(1, |c| c.count()),
        sample_rate,
        decoder,
        format,
    })
}

/// Decode the first audio track of `path` to mono PCM.
pub fn decode_audio(path: &Path) -> Result<AudioData> {
    let OpenTrack {
        mut format,
        mut decoder,
        track_id,
        channels,
        sample_rate,
    } = open_track(path)?;

    let mut mono: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("skipping undecodable packet: {}", msg);
                skipped_packets += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        // reuse the interleave buffer unless a packet outgrows it
        let spec = *decoded.spec();
        let needed = decoded.capacity() * spec.channels.count();
        if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < needed) {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            downmix_into(buf.samples(), spec.channels.count(), &mut mono);
        }
    }

    if skipped_packets > 0 {
        log::warn!("Skipped {} undecodable packets", skipped_packets);
    }

    let audio = AudioData {
        samples: mono,
        sample_rate,
        channels,
    };
    log::info!(
        "Decoded audio: {} samples, {}Hz, {} ch, {:.1}s",
        audio.samples.len(),
        audio.sample_rate,
        audio.channels,
        audio.duration_secs()
    );
    Ok(audio)
}

/// Average interleaved `channels`-wide frames into `out`.
pub fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}
