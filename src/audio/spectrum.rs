use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

pub const FFT_SIZE: usize = 2048;
pub const HOP_SIZE: usize = 512;

/// Short-time Fourier transform over centred, zero-padded Hann frames.
pub struct Stft {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl Stft {
    pub fn new() -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            fft: planner.plan_fft_forward(FFT_SIZE),
            window: hann_window(FFT_SIZE),
        }
    }

    /// Number of magnitude bins per frame.
    pub fn num_bins(&self) -> usize {
        FFT_SIZE / 2 + 1
    }

    /// Centre frequency of `bin` in Hz.
    pub fn bin_frequency(bin: usize, sample_rate: u32) -> f32 {
        bin as f32 * sample_rate as f32 / FFT_SIZE as f32
    }

    /// Magnitude spectra, one per hop, lazily.
    pub fn spectra<'a>(&'a self, samples: &'a [f32]) -> impl Iterator<Item = Vec<f32>> + 'a {
        let mut scratch = vec![Complex::new(0.0f32, 0.0); FFT_SIZE];
        centred_frames(samples, FFT_SIZE, HOP_SIZE).map(move |frame| {
            for (i, slot) in scratch.iter_mut().enumerate() {
                *slot = Complex::new(frame[i] * self.window[i], 0.0);
            }
            self.fft.process(&mut scratch);
            scratch[..FFT_SIZE / 2 + 1].iter().map(|c| c.norm()).collect()
        })
    }
}

impl Default for Stft {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of centred frames over `len` samples.
pub fn frame_count(len: usize, hop: usize) -> usize {
    1 + len / hop
}

/// Frames of `frame_len` samples every `hop` samples, with frame `t` centred on
/// sample `t * hop` and the signal zero-padded on both sides.
pub fn centred_frames(samples: &[f32], frame_len: usize, hop: usize) -> impl Iterator<Item = Vec<f32>> + '_ {
    let half = frame_len / 2;
    (0..frame_count(samples.len(), hop)).map(move |t| {
        let centre = t * hop;
        let mut frame = vec![0.0f32; frame_len];
        for (i, slot) in frame.iter_mut().enumerate() {
            let pos = centre + i;
            if pos >= half && pos - half < samples.len() {
                *slot = samples[pos - half];
            }
        }
        frame
    })
}

/// RMS of each centred frame.
pub fn frame_rms(samples: &[f32]) -> Vec<f32> {
    centred_frames(samples, FFT_SIZE, HOP_SIZE)
        .map(|frame| (frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32).sqrt())
        .collect()
}

/// Fraction of sign changes in each centred frame. Zero counts as positive.
pub fn frame_zero_crossings(samples: &[f32]) -> Vec<f32> {
    centred_frames(samples, FFT_SIZE, HOP_SIZE)
        .map(|frame| {
            let crossings = frame
                .windows(2)
                .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
                .count();
            crossings as f32 / frame.len() as f32
        })
        .collect()
}

pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()))
        .collect()
}
