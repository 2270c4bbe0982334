use serde::Serialize;
use std::fmt;

use super::rules::{Rule, RuleTable};
use crate::audio::features::{round_to, FeatureVector};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Calm,
    Excited,
    Fearful,
    Energetic,
    Melancholic,
    Uplifting,
    Tense,
    Peaceful,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 11] = [
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Calm,
        EmotionLabel::Excited,
        EmotionLabel::Fearful,
        EmotionLabel::Energetic,
        EmotionLabel::Melancholic,
        EmotionLabel::Uplifting,
        EmotionLabel::Tense,
        EmotionLabel::Peaceful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Calm => "calm",
            EmotionLabel::Excited => "excited",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Energetic => "energetic",
            EmotionLabel::Melancholic => "melancholic",
            EmotionLabel::Uplifting => "uplifting",
            EmotionLabel::Tense => "tense",
            EmotionLabel::Peaceful => "peaceful",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EmotionClassification {
    pub primary: EmotionLabel,
    /// 0-1
    pub confidence: f32,
}

impl EmotionClassification {
    /// Used when nothing better is known, e.g. an empty track.
    pub const DEFAULT: Self = Self {
        primary: EmotionLabel::Calm,
        confidence: 0.5,
    };

    pub fn new(primary: EmotionLabel, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { primary, confidence }
    }

    pub fn rounded(&self, precision: u32) -> Self {
        Self {
            primary: self.primary,
            confidence: round_to(self.confidence, precision),
        }
    }
}

// High-arousal labels come first so loud, fast material never falls into a
// low-arousal bucket on a secondary feature.
static RULES: RuleTable<EmotionClassification> = RuleTable::new(
    &[
        Rule {
            name: "angry",
            matches: |f| f.energy >= 0.7 && f.zcr >= 0.5 && f.spectral_flatness >= 0.2,
            emit: |f| EmotionClassification::new(EmotionLabel::Angry, 0.55 + 0.4 * (f.energy + f.zcr) / 2.0),
        },
        Rule {
            name: "energetic",
            matches: |f| f.tempo >= 140.0 && f.energy >= 0.6,
            emit: |f| EmotionClassification::new(EmotionLabel::Energetic, 0.6 + 0.35 * f.energy),
        },
        Rule {
            name: "excited",
            matches: |f| f.tempo >= 120.0 && f.energy >= 0.5 && f.beat_strength >= 0.5,
            emit: |f| EmotionClassification::new(EmotionLabel::Excited, 0.55 + 0.4 * f.beat_strength),
        },
        Rule {
            name: "tense",
            matches: |f| f.energy >= 0.4 && f.spectral_centroid >= 0.6 && f.bands.bass < 0.4,
            emit: |f| EmotionClassification::new(EmotionLabel::Tense, 0.5 + 0.4 * f.spectral_centroid),
        },
        Rule {
            name: "fearful",
            matches: |f| f.energy < 0.4 && f.bands.high >= 0.6 && f.zcr >= 0.4,
            emit: |f| EmotionClassification::new(EmotionLabel::Fearful, 0.5 + 0.3 * f.bands.high),
        },
        Rule {
            name: "happy",
            matches: |f| f.tempo >= 100.0 && f.energy >= 0.3 && f.spectral_centroid >= 0.4,
            emit: |f| {
                EmotionClassification::new(EmotionLabel::Happy, 0.5 + 0.4 * (f.energy + f.spectral_centroid) / 2.0)
            },
        },
        Rule {
            name: "uplifting",
            matches: |f| f.tempo >= 90.0 && f.energy >= 0.2 && f.loudness >= 0.5 && f.bands.mid >= 0.5,
            emit: |f| EmotionClassification::new(EmotionLabel::Uplifting, 0.5 + 0.3 * f.bands.mid),
        },
        Rule {
            name: "sad",
            matches: |f| f.tempo < 80.0 && f.energy < 0.3 && f.spectral_centroid < 0.3,
            emit: |f| EmotionClassification::new(EmotionLabel::Sad, 0.55 + 0.4 * (1.0 - f.spectral_centroid)),
        },
        Rule {
            name: "melancholic",
            matches: |f| f.tempo < 100.0 && f.energy < 0.5 && f.spectral_centroid < 0.4,
            emit: |f| EmotionClassification::new(EmotionLabel::Melancholic, 0.5 + 0.3 * (1.0 - f.energy)),
        },
        Rule {
            name: "peaceful",
            matches: |f| f.tempo < 80.0 && f.energy < 0.2,
            emit: |f| EmotionClassification::new(EmotionLabel::Peaceful, 0.6 + 0.3 * (1.0 - f.energy)),
        },
        Rule {
            name: "calm",
            matches: |f| f.tempo < 110.0 && f.energy < 0.4,
            emit: |f| EmotionClassification::new(EmotionLabel::Calm, 0.5 + 0.4 * (1.0 - f.energy)),
        },
    ],
    Rule {
        name: "default",
        matches: |_| true,
        emit: |_| EmotionClassification::DEFAULT,
    },
);

/// Maps window features to one emotion label.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmotionClassifier;

impl EmotionClassifier {
    pub fn classify(&self, features: &FeatureVector) -> EmotionClassification {
        RULES.evaluate(features)
    }

    /// Rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        RULES.rules().map(|r| r.name).collect()
    }
}
