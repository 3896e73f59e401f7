use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::paint::data::PaintData;

#[derive(Serialize)]
struct Record<'a> {
    frame: usize,
    /// Seconds since the first tick
    time: f64,
    #[serde(flatten)]
    data: &'a PaintData,
}

/// Streams one JSON document per tick. Compact output is newline-delimited
/// JSON; pretty output separates documents with a blank line.
pub struct PaintDataWriter<W: Write> {
    out: W,
    pretty: bool,
    frames: usize,
}

impl PaintDataWriter<Box<dyn Write>> {
    /// Write to `path`, or to stdout when `path` is `-`.
    pub fn create(path: &Path, pretty: bool) -> Result<Self> {
        let out: Box<dyn Write> = if path.as_os_str() == "-" {
            Box::new(BufWriter::new(io::stdout().lock()))
        } else {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(BufWriter::new(file))
        };
        log::info!("Writing paint data to {}", path.display());
        Ok(Self::new(out, pretty))
    }
}

impl<W: Write> PaintDataWriter<W> {
    pub fn new(out: W, pretty: bool) -> Self {
        Self {
            out,
            pretty,
            frames: 0,
        }
    }

    pub fn write_frame(&mut self, time: f64, data: &PaintData) -> Result<()> {
        let record = Record {
            frame: self.frames,
            time,
            data,
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, &record)?;
            self.out.write_all(b"\n\n")?;
        } else {
            serde_json::to_writer(&mut self.out, &record)?;
            self.out.write_all(b"\n")?;
        }
        self.frames += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush().context("Failed to flush paint data")?;
        log::info!("Wrote {} frames of paint data", self.frames);
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::formant::Formant;
    use crate::paint::data::SamplePoint;

    fn sample_data() -> PaintData {
        PaintData {
            points: vec![SamplePoint {
                size: 2.0,
                frequency: 440.0,
                amplitude: 4.0,
                delta_speed: 0.5,
                delta_std_dev: 1.0,
            }],
            fundamental_frequency: 220.0,
            fundamental_frequency_accuracy: 0.9,
            note: Some(57.0),
            sample_rate: 44100.0,
            formants: vec![Formant {
                frequency: 700.0,
                bandwidth: 80.0,
                amplitude: 12.0,
            }],
            ..PaintData::default()
        }
    }

    #[test]
    fn writes_one_line_per_frame() {
        let mut writer = PaintDataWriter::new(Vec::new(), false);
        writer.write_frame(0.0, &sample_data()).unwrap();
        writer.write_frame(1.0 / 60.0, &PaintData::default()).unwrap();
        assert_eq!(writer.frames_written(), 2);
        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["frame"], 0);
        assert_eq!(first["fundamental_frequency"], 220.0);
        assert_eq!(first["points"][0]["frequency"], 440.0);
        assert_eq!(first["formants"][0]["bandwidth"], 80.0);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["frame"], 1);
        assert!(second["note"].is_null());
        assert_eq!(second["points"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn pretty_output_separates_documents() {
        let mut writer = PaintDataWriter::new(Vec::new(), true);
        writer.write_frame(0.0, &sample_data()).unwrap();
        writer.write_frame(0.5, &sample_data()).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        let docs: Vec<&str> = text.split("\n\n").filter(|d| !d.trim().is_empty()).collect();
        assert_eq!(docs.len(), 2);
        let doc: serde_json::Value = serde_json::from_str(docs[1]).unwrap();
        assert_eq!(doc["time"], 0.5);
    }
}
