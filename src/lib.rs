//! Windowed audio analysis: per-window features mapped to brainwave, brain
//! region and emotion estimates, folded into a whole-track summary.
//!
//! ```no_run
//! use neurosonic::aggregate::TrackAggregator;
//! use neurosonic::audio::decode_audio;
//!
//! let audio = decode_audio("song.mp3".as_ref(), 22050, 600.0)?;
//! let analysis = TrackAggregator::default().analyze(&audio.samples, audio.sample_rate)?;
//! println!("{} ({:.2})", analysis.overall_emotion.primary, analysis.overall_emotion.confidence);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod aggregate;
pub mod audio;
pub mod config;
pub mod error;
pub mod mapping;
pub mod report;

pub use aggregate::{Segment, TrackAggregator, TrackAnalysis};
pub use error::{AnalysisError, DecodeError};
