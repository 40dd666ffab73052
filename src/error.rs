use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the decode and analysis core.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("no audio track found")]
    NoAudioTrack,

    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    /// Bucket width truncated to zero. Callers must clamp the bucket count first.
    #[error("bucket count {bucket_count} is invalid for {samples} samples")]
    BucketSizing { bucket_count: usize, samples: usize },
}
