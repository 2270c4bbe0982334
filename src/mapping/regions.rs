use serde::Serialize;

use super::rules::{Rule, RuleTable};
use crate::audio::features::{round_to, FeatureVector};

/// Activation level per brain-region proxy, each 0-1 and independent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrainRegionActivation {
    pub auditory_cortex: f32,
    pub amygdala: f32,
    pub hippocampus: f32,
    pub nucleus_accumbens: f32,
    pub motor_cortex: f32,
    pub prefrontal_cortex: f32,
    pub basal_ganglia: f32,
}

impl BrainRegionActivation {
    pub fn as_array(&self) -> [f32; 7] {
        [
            self.auditory_cortex,
            self.amygdala,
            self.hippocampus,
            self.nucleus_accumbens,
            self.motor_cortex,
            self.prefrontal_cortex,
            self.basal_ganglia,
        ]
    }

    fn clamped(&self) -> Self {
        let c = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            auditory_cortex: c(self.auditory_cortex),
            amygdala: c(self.amygdala),
            hippocampus: c(self.hippocampus),
            nucleus_accumbens: c(self.nucleus_accumbens),
            motor_cortex: c(self.motor_cortex),
            prefrontal_cortex: c(self.prefrontal_cortex),
            basal_ganglia: c(self.basal_ganglia),
        }
    }

    pub fn rounded(&self, precision: u32) -> Self {
        Self {
            auditory_cortex: round_to(self.auditory_cortex, precision),
            amygdala: round_to(self.amygdala, precision),
            hippocampus: round_to(self.hippocampus, precision),
            nucleus_accumbens: round_to(self.nucleus_accumbens, precision),
            motor_cortex: round_to(self.motor_cortex, precision),
            prefrontal_cortex: round_to(self.prefrontal_cortex, precision),
            basal_ganglia: round_to(self.basal_ganglia, precision),
        }
    }
}

/// Additive adjustment applied on top of the base blend.
#[derive(Clone, Copy, Debug, PartialEq)]
struct TempoModifier {
    hippocampus: f32,
    prefrontal_cortex: f32,
    nucleus_accumbens: f32,
    motor_cortex: f32,
    basal_ganglia: f32,
}

impl TempoModifier {
    const NONE: Self = Self {
        hippocampus: 0.0,
        prefrontal_cortex: 0.0,
        nucleus_accumbens: 0.0,
        motor_cortex: 0.0,
        basal_ganglia: 0.0,
    };
}

// Slow music leans on memory and reflection, danceable tempos on reward and
// movement, very fast tempos on motor timing.
static TEMPO_BANDS: RuleTable<TempoModifier> = RuleTable::new(
    &[
        Rule {
            name: "slow",
            matches: |f| f.tempo < 80.0,
            emit: |_| TempoModifier {
                hippocampus: 0.15,
                prefrontal_cortex: 0.10,
                motor_cortex: -0.10,
                ..TempoModifier::NONE
            },
        },
        Rule {
            name: "groove",
            matches: |f| f.tempo >= 100.0 && f.tempo < 140.0 && f.beat_strength >= 0.3,
            emit: |f| TempoModifier {
                nucleus_accumbens: 0.10 + (f.beat_strength * 0.1).min(0.10),
                motor_cortex: 0.10,
                basal_ganglia: 0.10,
                ..TempoModifier::NONE
            },
        },
        Rule {
            name: "fast",
            matches: |f| f.tempo >= 140.0,
            emit: |_| TempoModifier {
                motor_cortex: 0.15,
                basal_ganglia: 0.15,
                prefrontal_cortex: -0.05,
                ..TempoModifier::NONE
            },
        },
    ],
    Rule {
        name: "neutral",
        matches: |_| true,
        emit: |_| TempoModifier::NONE,
    },
);

/// Maps window features to region activations.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrainRegionMapper;

impl BrainRegionMapper {
    pub fn map(&self, features: &FeatureVector) -> BrainRegionActivation {
        let f = features;
        let b = &f.bands;
        let flatness = if f.spectral_flatness.is_finite() {
            f.spectral_flatness.clamp(0.0, 1.0)
        } else {
            0.0
        };
        // 60-180 BPM mapped to 0-1
        let pace = ((f.tempo - 60.0) / 120.0).clamp(0.0, 1.0);
        // Peaks at 120 BPM, zero beyond +-60
        let groove = (1.0 - (f.tempo - 120.0).abs() / 60.0).clamp(0.0, 1.0);

        let base = BrainRegionActivation {
            auditory_cortex: 0.2 + 0.3 * f.energy + 0.2 * f.loudness + 0.3 * b.mean(),
            amygdala: 0.4 * f.energy + 0.3 * f.zcr + 0.2 * b.high + 0.1 * flatness,
            hippocampus: 0.4 * b.mid + 0.3 * b.low_mid + 0.3 * (1.0 - f.zcr),
            nucleus_accumbens: 0.4 * groove + 0.3 * f.beat_strength + 0.3 * b.bass,
            motor_cortex: 0.5 * f.beat_strength + 0.3 * pace + 0.2 * f.energy,
            prefrontal_cortex: 0.5 * f.complexity() + 0.3 * b.high_mid + 0.2 * flatness,
            basal_ganglia: 0.5 * f.beat_strength + 0.3 * b.bass + 0.2 * pace,
        };

        let m = TEMPO_BANDS.evaluate(f);
        BrainRegionActivation {
            hippocampus: base.hippocampus + m.hippocampus,
            prefrontal_cortex: base.prefrontal_cortex + m.prefrontal_cortex,
            nucleus_accumbens: base.nucleus_accumbens + m.nucleus_accumbens,
            motor_cortex: base.motor_cortex + m.motor_cortex,
            basal_ganglia: base.basal_ganglia + m.basal_ganglia,
            ..base
        }
        .clamped()
    }
}
