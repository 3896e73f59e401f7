//! Per-tick audio feature extraction and budgeted point sampling.
//!
//! An [`AnalysisSession`] pulls a magnitude spectrum and a time-domain buffer
//! from an [`AudioSource`] each tick and turns them into one [`PaintData`]:
//! spectral statistics, pitch, formants and a set of weighted sample points
//! for a renderer to draw.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod encode;
pub mod error;
pub mod paint;

pub use analysis::formant::{Formant, FormantEstimator};
pub use analysis::pitch::{PitchEstimate, PitchEstimator};
pub use analysis::stats::SpectralStatisticsTracker;
pub use audio::frame::{FrameLayout, FrequencyFrame, TimeDomainFrame};
pub use audio::source::{AudioSource, ReplaySource};
pub use config::{Config, SessionConfig};
pub use error::{AnalysisError, ConfigError};
pub use paint::data::{PaintData, SamplePoint};
pub use paint::sampler::WeightedPointSampler;
pub use paint::session::AnalysisSession;
