use serde::Serialize;

use super::spectrum::{self, Stft};

/// Band edges in Hz, lower bound inclusive.
pub const BASS: (f32, f32) = (20.0, 250.0);
pub const LOW_MID: (f32, f32) = (250.0, 500.0);
pub const MID: (f32, f32) = (500.0, 2000.0);
pub const HIGH_MID: (f32, f32) = (2000.0, 4000.0);
pub const HIGH: (f32, f32) = (4000.0, 20000.0);

const CENTROID_RANGE: (f32, f32) = (500.0, 4000.0);
const ROLLOFF_RANGE: (f32, f32) = (2000.0, 10000.0);
const ROLLOFF_PERCENT: f32 = 0.85;
const LOUDNESS_FLOOR_DB: f32 = -80.0;
const AMPLITUDE_FLOOR: f32 = 1e-5;
const POWER_FLOOR: f32 = 1e-10;

/// Most decimal places `round_to` keeps; beyond this the f32 scale overflows.
pub const MAX_PRECISION: u32 = 9;

/// Band intensities relative to the loudest band in the same window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyBands {
    pub bass: f32,      // 20-250 Hz
    pub low_mid: f32,   // 250-500 Hz
    pub mid: f32,       // 500-2000 Hz
    pub high_mid: f32,  // 2-4 kHz
    pub high: f32,      // 4-20 kHz
}

impl FrequencyBands {
    pub fn as_array(&self) -> [f32; 5] {
        [self.bass, self.low_mid, self.mid, self.high_mid, self.high]
    }

    pub fn mean(&self) -> f32 {
        self.as_array().iter().sum::<f32>() / 5.0
    }

    pub fn rounded(&self, precision: u32) -> Self {
        Self {
            bass: round_to(self.bass, precision),
            low_mid: round_to(self.low_mid, precision),
            mid: round_to(self.mid, precision),
            high_mid: round_to(self.high_mid, precision),
            high: round_to(self.high, precision),
        }
    }
}

/// Everything the mapping models know about one window.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FeatureVector {
    /// Window start in seconds
    pub timestamp: f32,
    pub bands: FrequencyBands,
    /// Track-wide tempo estimate (BPM), identical for every window of a pass
    pub tempo: f32,
    pub beat_strength: f32,
    /// RMS energy, 0-1
    pub energy: f32,
    /// Mean level relative to the window peak, 0-1
    pub loudness: f32,
    pub spectral_centroid: f32,
    pub spectral_rolloff: f32,
    /// Geometric / arithmetic mean of the power spectrum. Not clamped.
    pub spectral_flatness: f32,
    pub zcr: f32,
}

impl FeatureVector {
    /// Mean of normalized centroid and rolloff.
    pub fn complexity(&self) -> f32 {
        (self.spectral_centroid + self.spectral_rolloff) / 2.0
    }
}

/// Mean band magnitude over every frame, divided by the largest band.
pub fn frequency_bands(spectra: &[Vec<f32>], sample_rate: u32) -> FrequencyBands {
    let band = |(low_hz, high_hz): (f32, f32)| -> f32 {
        let mut sum = 0.0f32;
        let mut count = 0usize;
        for frame in spectra {
            for (bin, &mag) in frame.iter().enumerate() {
                let hz = Stft::bin_frequency(bin, sample_rate);
                if hz >= low_hz && hz < high_hz {
                    sum += mag;
                    count += 1;
                }
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    };

    let raw = [band(BASS), band(LOW_MID), band(MID), band(HIGH_MID), band(HIGH)];
    let max = raw.iter().copied().fold(0.0f32, f32::max);
    let norm = |v: f32| if max > 0.0 { (v / max).clamp(0.0, 1.0) } else { 0.0 };

    FrequencyBands {
        bass: norm(raw[0]),
        low_mid: norm(raw[1]),
        mid: norm(raw[2]),
        high_mid: norm(raw[3]),
        high: norm(raw[4]),
    }
}

/// (energy, loudness), both 0-1.
pub fn energy_and_loudness(samples: &[f32]) -> (f32, f32) {
    let rms = spectrum::frame_rms(samples);
    if rms.is_empty() {
        return (0.0, 0.0);
    }

    // Typical RMS range is 0-0.5
    let energy = (mean(&rms) * 2.0).clamp(0.0, 1.0);

    let peak = rms.iter().copied().fold(0.0f32, f32::max);
    let reference_db = amplitude_to_db(peak);
    let db: Vec<f32> = rms
        .iter()
        .map(|&r| (amplitude_to_db(r) - reference_db).max(LOUDNESS_FLOOR_DB))
        .collect();
    let loudness = ((mean(&db) - LOUDNESS_FLOOR_DB) / -LOUDNESS_FLOOR_DB).clamp(0.0, 1.0);

    (energy, loudness)
}

/// (centroid, rolloff, flatness). Centroid and rolloff are rescaled to 0-1;
/// flatness is left as the raw ratio.
pub fn spectral_shape(spectra: &[Vec<f32>], sample_rate: u32) -> (f32, f32, f32) {
    if spectra.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let mut centroids = Vec::with_capacity(spectra.len());
    let mut rolloffs = Vec::with_capacity(spectra.len());
    let mut flatness = Vec::with_capacity(spectra.len());

    for frame in spectra {
        let total: f32 = frame.iter().sum();

        let centroid = if total > 1e-10 {
            frame
                .iter()
                .enumerate()
                .map(|(i, &mag)| Stft::bin_frequency(i, sample_rate) * mag)
                .sum::<f32>()
                / total
        } else {
            0.0
        };
        centroids.push(centroid);

        let threshold = ROLLOFF_PERCENT * total;
        let mut cumulative = 0.0f32;
        let mut rolloff_bin = 0;
        for (i, &mag) in frame.iter().enumerate() {
            cumulative += mag;
            if cumulative >= threshold {
                rolloff_bin = i;
                break;
            }
        }
        rolloffs.push(Stft::bin_frequency(rolloff_bin, sample_rate));

        let n = frame.len() as f32;
        let log_sum: f32 = frame.iter().map(|&m| (m * m).max(POWER_FLOOR).ln()).sum();
        let arith: f32 = frame.iter().map(|&m| (m * m).max(POWER_FLOOR)).sum::<f32>() / n;
        flatness.push((log_sum / n).exp() / arith);
    }

    (
        rescale(mean(&centroids), CENTROID_RANGE),
        rescale(mean(&rolloffs), ROLLOFF_RANGE),
        mean(&flatness),
    )
}

/// Zero-crossing rate, scaled from its typical 0-0.2 range to 0-1.
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    (mean(&spectrum::frame_zero_crossings(samples)) * 5.0).clamp(0.0, 1.0)
}

pub fn round_to(value: f32, precision: u32) -> f32 {
    let scale = 10f32.powi(precision.min(MAX_PRECISION) as i32);
    (value * scale).round() / scale
}

fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.max(AMPLITUDE_FLOOR).log10()
}

fn rescale(value: f32, (low, high): (f32, f32)) -> f32 {
    ((value - low) / (high - low)).clamp(0.0, 1.0)
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}
