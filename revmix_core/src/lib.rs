use std::path::PathBuf;

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

pub mod labels;
pub mod manifest;
pub mod reverb;
pub mod scan;

pub use labels::{contiguous_regions, Event, MultiHotEncoder};
pub use reverb::{ReverbConfig, ReverbConfigBuilder, RirSubset, REFERENCE_WORKERS};
pub use scan::{ScanProgress, WavInfo};

/// Errors that can occur while preparing or running the reverberation pipeline.
#[derive(Debug, Error)]
pub enum RevMixError {
    /// Wrapper around IO errors encountered while reading or writing files.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper around errors produced by the Symphonia decoding library.
    #[error(transparent)]
    Symphonia(#[from] SymphoniaError),

    /// Wrapper around errors raised while walking a directory tree.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    /// Error returned when the source audio directory is absent or not a directory.
    #[error("audio directory does not exist: {0}")]
    MissingAudioDir(PathBuf),

    /// Error returned when the impulse response directory is absent or not a directory.
    #[error("impulse response directory does not exist: {0}")]
    MissingRirDir(PathBuf),

    /// Error returned when a worker count of zero is requested.
    #[error("worker count must be at least one")]
    InvalidWorkerCount,

    /// Error returned when an impulse response subset name is not recognised.
    #[error("unknown impulse response subset '{0}' (expected train, validation or eval)")]
    UnknownSubset(String),

    /// Error returned when the external tool could not be started at all.
    #[error("failed to launch '{program}': {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Error returned when the external tool ran but reported failure.
    #[error("'{program}' exited unsuccessfully ({status})")]
    ToolFailed {
        program: String,
        status: std::process::ExitStatus,
    },

    /// Error returned when the decoder track lacks a sample rate.
    #[error("input stream does not advertise a sample rate: {0}")]
    MissingSampleRate(PathBuf),

    /// Error returned when the container does not expose any default track.
    #[error("input stream does not provide a default track: {0}")]
    MissingDefaultTrack(PathBuf),

    /// Error returned when the codec of the track cannot be handled.
    #[error("unsupported codec in {0}")]
    UnsupportedCodec(PathBuf),

    /// Error produced when a manifest file does not parse.
    #[error("{}:{line}: {message}", .path.display())]
    ManifestFormat {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Error returned when a label is not part of the encoder vocabulary.
    #[error("unknown event label '{0}'")]
    UnknownLabel(String),

    /// Error returned when strong labels are encoded without a frame count.
    #[error("a frame count is required to encode strong labels")]
    FrameCountMissing,
}
