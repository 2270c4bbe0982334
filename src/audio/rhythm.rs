use super::spectrum::{Stft, HOP_SIZE};
use crate::error::WindowError;

pub const FALLBACK_TEMPO: f32 = 120.0;
pub const FALLBACK_BEAT_STRENGTH: f32 = 0.5;

const POWER_FLOOR: f32 = 1e-10;
/// Dynamic range kept below the loudest band before rises are measured.
const TOP_DB: f32 = 80.0;
/// Mel-spaced bands the spectrum is folded into before measuring rises.
const ONSET_BANDS: usize = 40;

/// Onset strength per STFT frame: mean positive rise in band log power.
pub fn onset_envelope(stft: &Stft, samples: &[f32], sample_rate: u32) -> Vec<f32> {
    onset_envelope_from(stft.spectra(samples), sample_rate)
}

/// Onset strength from magnitude spectra.
///
/// Bins are folded into mel-spaced bands and converted to dB, everything more
/// than `TOP_DB` below the loudest band of the whole input is raised to that
/// floor, and each frame scores the mean positive rise over the previous one.
pub fn onset_envelope_from<I>(spectra: I, sample_rate: u32) -> Vec<f32>
where
    I: IntoIterator,
    I::Item: AsRef<[f32]>,
{
    let mut layout = BandLayout::default();
    let frames: Vec<Vec<f32>> = spectra
        .into_iter()
        .map(|spectrum| {
            let spectrum = spectrum.as_ref();
            if layout.band_of.len() != spectrum.len() {
                layout = BandLayout::new(spectrum.len(), sample_rate);
            }
            layout.band_db(spectrum)
        })
        .collect();

    let peak = frames.iter().flatten().copied().fold(f32::NEG_INFINITY, f32::max);
    let floor = peak - TOP_DB;

    let mut envelope = Vec::with_capacity(frames.len());
    let mut prev: Option<&[f32]> = None;
    for db in &frames {
        let flux = match prev {
            Some(prev) if !db.is_empty() => {
                db.iter()
                    .zip(prev)
                    .map(|(&cur, &prev)| (cur.max(floor) - prev.max(floor)).max(0.0))
                    .sum::<f32>()
                    / db.len() as f32
            }
            _ => 0.0,
        };
        envelope.push(flux);
        prev = Some(db.as_slice());
    }

    envelope
}

/// Assignment of STFT bins to occupied mel bands.
#[derive(Default)]
struct BandLayout {
    band_of: Vec<usize>,
    bands: usize,
}

impl BandLayout {
    fn new(num_bins: usize, sample_rate: u32) -> Self {
        let top = hz_to_mel(sample_rate as f32 / 2.0).max(f32::EPSILON);
        let mut band_of = Vec::with_capacity(num_bins);
        let mut band = 0;
        let mut last = None;
        for bin in 0..num_bins {
            let mel = hz_to_mel(Stft::bin_frequency(bin, sample_rate));
            let raw = ((mel / top * ONSET_BANDS as f32) as usize).min(ONSET_BANDS - 1);
            if last.is_some_and(|l| l != raw) {
                band += 1;
            }
            last = Some(raw);
            band_of.push(band);
        }
        let bands = if num_bins == 0 { 0 } else { band + 1 };
        Self { band_of, bands }
    }

    /// Mean power of each band in dB.
    fn band_db(&self, spectrum: &[f32]) -> Vec<f32> {
        let mut power = vec![0.0f32; self.bands];
        let mut count = vec![0usize; self.bands];
        for (&band, &mag) in self.band_of.iter().zip(spectrum) {
            power[band] += mag * mag;
            count[band] += 1;
        }
        power
            .iter()
            .zip(&count)
            .map(|(&p, &n)| 10.0 * (p / n.max(1) as f32).max(POWER_FLOOR).log10())
            .collect()
    }
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Track-wide tempo in BPM from an onset envelope sampled every `HOP_SIZE` samples.
pub fn estimate_tempo(envelope: &[f32], sample_rate: u32) -> Result<f32, WindowError> {
    let frame_seconds = HOP_SIZE as f32 / sample_rate as f32;
    let flux_values: Vec<(f32, f32)> = envelope
        .iter()
        .enumerate()
        .map(|(i, &flux)| (i as f32 * frame_seconds, flux))
        .collect();

    let beat_times = detect_beats(&flux_values);
    log::debug!("Detected {} onsets", beat_times.len());

    tempo_from_beats(&beat_times)
}

/// Mean onset strength of a window, halved and clamped to 0-1.
pub fn beat_strength(envelope: &[f32]) -> Result<f32, WindowError> {
    if envelope.is_empty() {
        return Ok(0.0);
    }
    let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
    if !mean.is_finite() {
        return Err(WindowError::NonFinite("beat strength"));
    }
    Ok((mean * 0.5).clamp(0.0, 1.0))
}

fn detect_beats(flux_values: &[(f32, f32)]) -> Vec<f32> {
    if flux_values.is_empty() {
        return Vec::new();
    }

    let window = 20; // ~460ms at 22050 Hz
    let mut beat_times = Vec::new();

    for i in 0..flux_values.len() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(flux_values.len());
        let local_mean: f32 =
            flux_values[start..end].iter().map(|(_, f)| f).sum::<f32>() / (end - start) as f32;

        let threshold = local_mean * 1.5 + 0.01;

        if flux_values[i].1 > threshold {
            let is_peak = (i == 0 || flux_values[i].1 >= flux_values[i - 1].1)
                && (i == flux_values.len() - 1 || flux_values[i].1 >= flux_values[i + 1].1);

            // Minimum gap between beats (100ms)
            let far_enough = beat_times
                .last()
                .map_or(true, |&last: &f32| flux_values[i].0 - last > 0.1);

            if is_peak && far_enough {
                beat_times.push(flux_values[i].0);
            }
        }
    }

    beat_times
}

fn tempo_from_beats(beat_times: &[f32]) -> Result<f32, WindowError> {
    if beat_times.len() < 2 {
        return Err(WindowError::TooFewOnsets);
    }

    // Reasonable intervals: 60-200 BPM
    let mut reasonable: Vec<f32> = beat_times
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&i| (0.3..=1.0).contains(&i))
        .collect();

    if reasonable.is_empty() {
        return Err(WindowError::NoPlausibleInterval);
    }

    reasonable.sort_by(f32::total_cmp);
    let median_interval = reasonable[reasonable.len() / 2];

    let tempo = 60.0 / median_interval;
    if tempo.is_finite() {
        Ok(tempo)
    } else {
        Err(WindowError::NonFinite("tempo"))
    }
}
