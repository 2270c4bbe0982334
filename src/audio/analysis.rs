use std::iter::FusedIterator;

use super::features::{self, FeatureVector, FrequencyBands};
use super::rhythm::{self, FALLBACK_BEAT_STRENGTH, FALLBACK_TEMPO};
use super::spectrum::Stft;
use crate::error::{AnalysisError, WindowError};

pub const DEFAULT_WINDOW_DURATION: f32 = 1.0;

/// Number of samples in one analysis window.
pub fn window_len(sample_rate: u32, window_duration: f32) -> Result<usize, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::ZeroSampleRate);
    }
    if !window_duration.is_finite() || window_duration <= 0.0 {
        return Err(AnalysisError::InvalidWindowDuration(window_duration));
    }
    let len = (window_duration as f64 * sample_rate as f64) as usize;
    if len == 0 {
        return Err(AnalysisError::EmptyWindow {
            window_duration,
            sample_rate,
        });
    }
    Ok(len)
}

/// Number of windows a buffer of `total` samples produces.
pub fn window_count(total: usize, window_len: usize) -> usize {
    let full = total / window_len;
    let tail = total % window_len;
    if tail > 0 && tail >= window_len / 2 {
        full + 1
    } else {
        full
    }
}

/// Lazy, single-pass sequence of per-window features over one track.
///
/// The track tempo is estimated once at construction; every window reuses it.
/// A trailing window shorter than half the window length is dropped, a longer
/// one is zero-padded to full length.
pub struct FeatureStream<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    window_len: usize,
    position: usize,
    tempo: f32,
    stft: Stft,
}

impl<'a> FeatureStream<'a> {
    pub fn new(samples: &'a [f32], sample_rate: u32, window_duration: f32) -> Result<Self, AnalysisError> {
        let window_len = window_len(sample_rate, window_duration)?;
        let stft = Stft::new();

        let tempo = match rhythm::estimate_tempo(&rhythm::onset_envelope(&stft, samples, sample_rate), sample_rate) {
            Ok(tempo) => tempo,
            Err(err) => {
                log::warn!("Tempo estimation failed ({}), using {:.0} BPM", err, FALLBACK_TEMPO);
                FALLBACK_TEMPO
            }
        };
        log::info!("Global tempo: {:.1} BPM", tempo);

        Ok(Self {
            samples,
            sample_rate,
            window_len,
            position: 0,
            tempo,
            stft,
        })
    }

    /// Track-wide tempo shared by every window.
    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// End time in seconds of the window `next` would produce, padding
    /// included.
    pub fn next_window_end(&self) -> f32 {
        (self.position + self.window_len) as f32 / self.sample_rate as f32
    }

    /// Windows not yet produced.
    pub fn remaining(&self) -> usize {
        window_count(self.samples.len().saturating_sub(self.position), self.window_len)
    }

    fn analyze_window(&self, window: &[f32], timestamp: f32) -> FeatureVector {
        let spectra: Vec<Vec<f32>> = self.stft.spectra(window).collect();

        let bands = features::frequency_bands(&spectra, self.sample_rate);
        let bands = if bands.as_array().iter().all(|v| v.is_finite()) {
            bands
        } else {
            fallback("frequency bands", timestamp);
            FrequencyBands::default()
        };

        let envelope = rhythm::onset_envelope_from(&spectra, self.sample_rate);
        let beat_strength = rhythm::beat_strength(&envelope).unwrap_or_else(|err| {
            log::warn!("Window at {:.2}s: {}, using fallback beat strength", timestamp, err);
            FALLBACK_BEAT_STRENGTH
        });

        let (energy, loudness) = features::energy_and_loudness(window);
        let (centroid, rolloff, flatness) = features::spectral_shape(&spectra, self.sample_rate);
        let zcr = features::zero_crossing_rate(window);

        FeatureVector {
            timestamp,
            bands,
            tempo: self.tempo,
            beat_strength,
            energy: finite_or_zero(energy, "energy", timestamp),
            loudness: finite_or_zero(loudness, "loudness", timestamp),
            spectral_centroid: finite_or_zero(centroid, "spectral centroid", timestamp),
            spectral_rolloff: finite_or_zero(rolloff, "spectral rolloff", timestamp),
            spectral_flatness: finite_or_zero(flatness, "spectral flatness", timestamp),
            zcr: finite_or_zero(zcr, "zero crossing rate", timestamp),
        }
    }
}

impl Iterator for FeatureStream<'_> {
    type Item = FeatureVector;

    fn next(&mut self) -> Option<FeatureVector> {
        let start = self.position;
        if start >= self.samples.len() {
            return None;
        }
        let end = (start + self.window_len).min(self.samples.len());
        let chunk = &self.samples[start..end];

        // Too short to analyze
        if chunk.len() < self.window_len / 2 {
            self.position = self.samples.len();
            return None;
        }
        self.position = end;

        let timestamp = start as f32 / self.sample_rate as f32;
        let features = if chunk.len() < self.window_len {
            let mut padded = chunk.to_vec();
            padded.resize(self.window_len, 0.0);
            self.analyze_window(&padded, timestamp)
        } else {
            self.analyze_window(chunk, timestamp)
        };

        log::debug!(
            "Window {:.2}s: energy={:.3} centroid={:.3} beat={:.3}",
            timestamp,
            features.energy,
            features.spectral_centroid,
            features.beat_strength
        );
        Some(features)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for FeatureStream<'_> {}

impl FusedIterator for FeatureStream<'_> {}

fn fallback(what: &'static str, timestamp: f32) {
    log::warn!("Window at {:.2}s: {}", timestamp, WindowError::NonFinite(what));
}

fn finite_or_zero(value: f32, what: &'static str, timestamp: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback(what, timestamp);
        0.0
    }
}
