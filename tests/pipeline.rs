use approx::assert_abs_diff_eq;

use neurosonic::audio::analysis::FeatureStream;
use neurosonic::audio::rhythm::FALLBACK_TEMPO;
use neurosonic::mapping::{BrainwavePredictor, EmotionClassification, EmotionClassifier};
use neurosonic::TrackAggregator;

const SR: u32 = 22050;

fn seconds(s: f32) -> usize {
    (s * SR as f32).round() as usize
}

/// Deterministic broadband test signal: a few tones plus LCG noise.
fn music_like(len: usize) -> Vec<f32> {
    let mut state: u32 = 0x1234_5678;
    (0..len)
        .map(|i| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let noise = (state >> 8) as f32 / (1u32 << 24) as f32 - 0.5;
            let t = i as f32 / SR as f32;
            0.3 * (2.0 * std::f32::consts::PI * 110.0 * t).sin()
                + 0.2 * (2.0 * std::f32::consts::PI * 880.0 * t).sin()
                + 0.1 * noise
        })
        .collect()
}

#[test]
fn silent_track_yields_three_flat_segments() {
    let samples = vec![0.0f32; seconds(3.0)];
    let analysis = TrackAggregator::default().analyze(&samples, SR).unwrap();

    assert_eq!(analysis.segments.len(), 3);
    assert_eq!(analysis.tempo, FALLBACK_TEMPO);

    let expected_emotion = EmotionClassifier.classify(&neurosonic::audio::FeatureVector {
        tempo: FALLBACK_TEMPO,
        ..Default::default()
    });
    for segment in &analysis.segments {
        assert_eq!(segment.frequencies.as_array(), [0.0; 5]);
        assert_eq!(segment.emotion.primary, expected_emotion.primary);
        assert_abs_diff_eq!(segment.brainwaves.total(), 1.0, epsilon = 1e-2);
    }

    let features: Vec<_> = FeatureStream::new(&samples, SR, 1.0).unwrap().collect();
    let predictor = BrainwavePredictor;
    for f in &features {
        assert_eq!(f.energy, 0.0);
        assert_eq!(predictor.band(f), "medium-fast");
    }
    assert_eq!(analysis.overall_emotion.confidence, 1.0);
}

#[test]
fn too_short_track_is_empty_with_default_summary() {
    let samples = vec![0.1f32; seconds(0.3)];
    let analysis = TrackAggregator::default().analyze(&samples, SR).unwrap();
    assert!(analysis.segments.is_empty());
    assert_eq!(analysis.overall_emotion, EmotionClassification::DEFAULT);
}

#[test]
fn empty_buffer_is_not_an_error() {
    let analysis = TrackAggregator::default().analyze(&[], SR).unwrap();
    assert!(analysis.segments.is_empty());
    assert_eq!(analysis.overall_emotion.confidence, 0.5);
}

#[test]
fn partial_tail_is_padded() {
    let samples = music_like(seconds(1.6));
    let features: Vec<_> = FeatureStream::new(&samples, SR, 1.0).unwrap().collect();
    assert_eq!(features.len(), 2);
    assert_eq!(features[1].timestamp, 1.0);
    // The padded tail carries 0.6s of signal, so less energy than the full window.
    assert!(features[1].energy < features[0].energy);

    let analysis = TrackAggregator::default().analyze(&samples, SR).unwrap();
    assert_eq!(analysis.segments[1].start_time, 1.0);
    assert_eq!(analysis.segments[1].end_time, 2.0);
}

#[test]
fn window_count_matches_half_length_rule() {
    let window = SR as usize;
    for len in [0, window / 2 - 1, window / 2, window, 2 * window + window / 2 - 1, 2 * window + window / 2, 5 * window] {
        let samples = vec![0.0f32; len];
        let count = FeatureStream::new(&samples, SR, 1.0).unwrap().count();
        let full = len / window;
        let expected = if len % window >= window / 2 && len % window > 0 { full + 1 } else { full };
        assert_eq!(count, expected, "len {len}");
        assert!(count == full || count == full + 1);
    }
}

#[test]
fn reruns_are_bit_identical() {
    let samples = music_like(seconds(3.5));
    let aggregator = TrackAggregator::default();
    let first = aggregator.analyze(&samples, SR).unwrap();
    let second = aggregator.analyze(&samples, SR).unwrap();
    assert_eq!(first, second);
}

#[test]
fn tempo_is_shared_by_every_window() {
    let samples = music_like(seconds(4.0));
    let stream = FeatureStream::new(&samples, SR, 1.0).unwrap();
    let tempo = stream.tempo();
    let tempos: Vec<f32> = stream.map(|f| f.tempo).collect();
    assert_eq!(tempos.len(), 4);
    assert!(tempos.iter().all(|&t| t == tempo));
}

#[test]
fn bounded_fields_stay_in_range_for_pathological_input() {
    let len = seconds(2.0);
    let clipping = vec![100.0f32; len];
    let noise = music_like(len).iter().map(|s| s * 50.0).collect::<Vec<_>>();
    let impulses: Vec<f32> = (0..len).map(|i| if i % 1000 == 0 { 1.0 } else { 0.0 }).collect();

    for samples in [clipping, noise, impulses] {
        for f in FeatureStream::new(&samples, SR, 1.0).unwrap() {
            for v in [f.energy, f.loudness, f.spectral_centroid, f.spectral_rolloff, f.zcr, f.beat_strength] {
                assert!((0.0..=1.0).contains(&v), "{v} out of range in {f:?}");
            }
            let bands = f.bands.as_array();
            assert!(bands.iter().all(|b| (0.0..=1.0).contains(b)));
            if bands.iter().any(|&b| b > 0.0) {
                assert!(bands.contains(&1.0));
            }
            assert!(f.spectral_flatness >= 0.0);
        }
    }
}

#[test]
fn stream_can_be_abandoned_between_windows() {
    let samples = music_like(seconds(5.0));
    let mut segments = TrackAggregator::default().segments(&samples, SR).unwrap();
    assert_eq!(segments.len(), 5);
    let first = segments.next().unwrap();
    assert_eq!(first.start_time, 0.0);
    drop(segments);
}
