use std::path::PathBuf;
use thiserror::Error;

/// Setup-time failures. Anything that reaches a caller through this type is
/// a contract violation, not a property of the audio.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Per-frame analysis failures. These are recovered inside the session
/// (the affected metric falls back to a neutral value) and never abort a frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("frame carries no energy")]
    SilentFrame,

    #[error("prediction error vanished at order {order}")]
    DegeneratePrediction { order: usize },

    #[error("root finder did not converge for a degree {degree} polynomial")]
    RootsDidNotConverge { degree: usize },

    #[error("frame of {len} samples is too short, need at least {required}")]
    FrameTooShort { len: usize, required: usize },
}
