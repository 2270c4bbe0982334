use thiserror::Error;

/// The signal decoder could not produce a sample buffer. Fatal to a run.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to open audio file {path}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to probe audio format")]
    Probe(#[source] symphonia::core::errors::Error),

    #[error("no audio tracks found")]
    NoTrack,

    #[error("unknown sample rate")]
    UnknownSampleRate,

    #[error("audio codec error")]
    Codec(#[from] symphonia::core::errors::Error),

    #[error("resampling from {from} Hz to {to} Hz failed: {reason}")]
    Resample { from: u32, to: u32, reason: String },

    #[error("audio is {duration:.1}s long, limit is {limit:.1}s")]
    TooLong { duration: f32, limit: f32 },
}

/// Invalid parameters handed to the analysis core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("sample rate must be positive")]
    ZeroSampleRate,

    #[error("window duration must be a positive finite number of seconds, got {0}")]
    InvalidWindowDuration(f32),

    #[error("window of {window_duration}s at {sample_rate} Hz holds no samples")]
    EmptyWindow { window_duration: f32, sample_rate: u32 },
}

/// A per-window numerical step that failed. Always recovered with a fallback.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    #[error("fewer than two onsets detected")]
    TooFewOnsets,

    #[error("no inter-onset interval in the plausible tempo range")]
    NoPlausibleInterval,

    #[error("{0} is not finite")]
    NonFinite(&'static str),
}
