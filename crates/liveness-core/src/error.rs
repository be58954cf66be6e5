use std::path::PathBuf;
use thiserror::Error;

/// Rejected session configuration. A session is never started with one of these.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid threshold {name}: {value} (expected {expected})")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("invalid cooldown: {0} ms (maximum 60000)")]
    InvalidCooldown(u64),

    #[error("invalid minimum eye motion: {0} (expected a finite value >= 0)")]
    InvalidEyeMotion(f64),

    #[error("failed to read config file: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Why a frame could not be evaluated.
///
/// Frame errors never leave the session: they are logged and the frame is
/// skipped without touching challenge state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("no landmarks in frame")]
    Empty,

    #[error("too few landmarks: {got} (need {need})")]
    TooFewLandmarks { got: usize, need: usize },

    #[error("invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("non-finite landmark coordinate at index {0}")]
    NonFinite(usize),
}
