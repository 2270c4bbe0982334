use serde::Serialize;

use crate::audio::analysis::{FeatureStream, DEFAULT_WINDOW_DURATION};
use crate::audio::features::{round_to, FeatureVector, FrequencyBands, MAX_PRECISION};
use crate::error::AnalysisError;
use crate::mapping::{
    BrainRegionActivation, BrainRegionMapper, BrainwavePredictor, BrainwaveState, EmotionClassification,
    EmotionClassifier, EmotionLabel,
};

pub const DEFAULT_PRECISION: u32 = 3;

/// One analysed window, rounded for external consumption.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start_time: f32,
    pub end_time: f32,
    pub frequencies: FrequencyBands,
    pub brain_regions: BrainRegionActivation,
    pub brainwaves: BrainwaveState,
    pub emotion: EmotionClassification,
}

/// Whole-track result: every segment plus the dominant emotion.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackAnalysis {
    pub segments: Vec<Segment>,
    pub overall_emotion: EmotionClassification,
    pub tempo: f32,
}

/// Running count of segment emotions in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct EmotionTally {
    counts: Vec<(EmotionLabel, usize)>,
    total: usize,
}

impl EmotionTally {
    pub fn record(&mut self, label: EmotionLabel) {
        self.total += 1;
        match self.counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((label, 1)),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Most frequent label; ties go to the label seen first. Confidence is the
    /// label's share of all recorded segments.
    pub fn dominant(&self) -> EmotionClassification {
        let mut best: Option<(EmotionLabel, usize)> = None;
        for &(label, count) in &self.counts {
            if best.map_or(true, |(_, n)| count > n) {
                best = Some((label, count));
            }
        }
        match best {
            Some((label, count)) => EmotionClassification::new(label, count as f32 / self.total as f32),
            None => EmotionClassification::DEFAULT,
        }
    }
}

/// Runs the three mapping models over every window of a track.
#[derive(Clone, Copy, Debug)]
pub struct TrackAggregator {
    window_duration: f32,
    precision: u32,
    predictor: BrainwavePredictor,
    mapper: BrainRegionMapper,
    classifier: EmotionClassifier,
}

impl Default for TrackAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DURATION, DEFAULT_PRECISION)
    }
}

impl TrackAggregator {
    pub fn new(window_duration: f32, precision: u32) -> Self {
        if precision > MAX_PRECISION {
            log::warn!("Precision {} is too fine for f32, using {}", precision, MAX_PRECISION);
        }
        Self {
            window_duration,
            precision: precision.min(MAX_PRECISION),
            predictor: BrainwavePredictor,
            mapper: BrainRegionMapper,
            classifier: EmotionClassifier,
        }
    }

    pub fn window_duration(&self) -> f32 {
        self.window_duration
    }

    /// Build the segment for one window's features, ending one window
    /// duration after its timestamp.
    pub fn segment(&self, features: &FeatureVector) -> Segment {
        self.segment_ending(features, features.timestamp + self.window_duration)
    }

    fn segment_ending(&self, features: &FeatureVector, end_time: f32) -> Segment {
        let p = self.precision;
        Segment {
            start_time: round_to(features.timestamp, p),
            end_time: round_to(end_time, p),
            frequencies: features.bands.rounded(p),
            brain_regions: self.mapper.map(features).rounded(p),
            brainwaves: self.predictor.predict(features).rounded(p),
            emotion: self.classifier.classify(features).rounded(p),
        }
    }

    /// Lazy segment sequence over `samples`.
    pub fn segments<'a>(&self, samples: &'a [f32], sample_rate: u32) -> Result<SegmentStream<'a>, AnalysisError> {
        Ok(SegmentStream {
            features: FeatureStream::new(samples, sample_rate, self.window_duration)?,
            aggregator: *self,
        })
    }

    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> Result<TrackAnalysis, AnalysisError> {
        self.analyze_with(samples, sample_rate, |_| {})
    }

    /// Like [`analyze`](Self::analyze), calling `on_segment` after each window
    /// and before the next one is computed.
    pub fn analyze_with<F>(&self, samples: &[f32], sample_rate: u32, mut on_segment: F) -> Result<TrackAnalysis, AnalysisError>
    where
        F: FnMut(&Segment),
    {
        let stream = self.segments(samples, sample_rate)?;
        let tempo = stream.tempo();
        let mut tally = EmotionTally::default();
        let mut segments = Vec::with_capacity(stream.len());

        for segment in stream {
            tally.record(segment.emotion.primary);
            on_segment(&segment);
            segments.push(segment);
        }

        let overall_emotion = tally.dominant().rounded(self.precision);
        log::info!(
            "Analyzed {} segments, overall emotion: {} ({:.2})",
            segments.len(),
            overall_emotion.primary,
            overall_emotion.confidence
        );

        Ok(TrackAnalysis {
            segments,
            overall_emotion,
            tempo,
        })
    }
}

/// Segments produced one window at a time.
pub struct SegmentStream<'a> {
    features: FeatureStream<'a>,
    aggregator: TrackAggregator,
}

impl SegmentStream<'_> {
    pub fn tempo(&self) -> f32 {
        self.features.tempo()
    }
}

impl Iterator for SegmentStream<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let end_time = self.features.next_window_end();
        self.features.next().map(|f| self.aggregator.segment_ending(&f, end_time))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.features.size_hint()
    }
}

impl ExactSizeIterator for SegmentStream<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tally_is_default() {
        assert_eq!(EmotionTally::default().dominant(), EmotionClassification::DEFAULT);
    }

    #[test]
    fn unanimous_tally_is_certain() {
        let mut tally = EmotionTally::default();
        for _ in 0..4 {
            tally.record(EmotionLabel::Happy);
        }
        assert_eq!(tally.dominant(), EmotionClassification::new(EmotionLabel::Happy, 1.0));
    }

    #[test]
    fn mode_wins() {
        let mut tally = EmotionTally::default();
        for label in [EmotionLabel::Sad, EmotionLabel::Tense, EmotionLabel::Tense, EmotionLabel::Sad, EmotionLabel::Tense] {
            tally.record(label);
        }
        let dominant = tally.dominant();
        assert_eq!(dominant.primary, EmotionLabel::Tense);
        assert!((dominant.confidence - 0.6).abs() < 1e-6);
        assert_eq!(tally.total(), 5);
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let mut tally = EmotionTally::default();
        for label in [EmotionLabel::Calm, EmotionLabel::Angry, EmotionLabel::Angry, EmotionLabel::Calm] {
            tally.record(label);
        }
        assert_eq!(tally.dominant().primary, EmotionLabel::Calm);

        let mut reversed = EmotionTally::default();
        for label in [EmotionLabel::Angry, EmotionLabel::Calm, EmotionLabel::Calm, EmotionLabel::Angry] {
            reversed.record(label);
        }
        assert_eq!(reversed.dominant().primary, EmotionLabel::Angry);
    }

    #[test]
    fn segment_spans_one_window_and_is_rounded() {
        let aggregator = TrackAggregator::new(1.0, 2);
        let segment = aggregator.segment(&FeatureVector {
            timestamp: 3.0,
            tempo: 90.0,
            energy: 0.3,
            bands: FrequencyBands {
                bass: 0.123456,
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(segment.start_time, 3.0);
        assert_eq!(segment.end_time, 4.0);
        assert_eq!(segment.frequencies.bass, 0.12);
    }

    #[test]
    fn segments_tile_the_track_without_gaps() {
        // 0.1234s is not a whole number of samples at 22050 Hz
        let samples = vec![0.0f32; 22050 * 2];
        let analysis = TrackAggregator::new(0.1234, MAX_PRECISION).analyze(&samples, 22050).unwrap();
        assert!(analysis.segments.len() > 10);
        for pair in analysis.segments.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
        }
        assert_eq!(analysis.segments[0].end_time, round_to(2720.0 / 22050.0, MAX_PRECISION));
    }

    #[test]
    fn precision_is_capped() {
        let segment = TrackAggregator::new(1.0, 40).segment(&FeatureVector {
            timestamp: 2.0,
            energy: 0.5,
            bands: FrequencyBands {
                mid: 0.25,
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(segment.start_time, 2.0);
        assert_eq!(segment.end_time, 3.0);
        assert_eq!(segment.frequencies.mid, 0.25);
        assert!(segment.emotion.confidence.is_finite());
        assert!(segment.brainwaves.as_array().iter().all(|v| v.is_finite()));
        let json = serde_json::to_string(&segment).unwrap();
        assert!(!json.contains("null"), "{json}");
    }

    #[test]
    fn callback_sees_every_segment_in_order() {
        let samples = vec![0.0f32; 22050 * 3];
        let mut seen = Vec::new();
        let analysis = TrackAggregator::default()
            .analyze_with(&samples, 22050, |s| seen.push(s.start_time))
            .unwrap();
        assert_eq!(seen, vec![0.0, 1.0, 2.0]);
        assert_eq!(analysis.segments.len(), 3);
    }

    #[test]
    fn invalid_window_is_rejected_up_front() {
        let err = TrackAggregator::new(0.0, 3).analyze(&[0.0; 10], 22050).unwrap_err();
        assert_eq!(err, AnalysisError::InvalidWindowDuration(0.0));
    }
}
