use serde::Serialize;

use super::rules::{Rule, RuleTable};
use crate::audio::features::{round_to, FeatureVector};

/// Probability distribution over the five oscillation bands.
///
/// - Delta (1-4 Hz): deep sleep
/// - Theta (4-8 Hz): meditation, drowsiness
/// - Alpha (8-13 Hz): relaxed awareness
/// - Beta (13-30 Hz): alert, focused
/// - Gamma (30-100 Hz): peak focus
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BrainwaveState {
    pub delta: f32,
    pub theta: f32,
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl BrainwaveState {
    pub const UNIFORM: Self = Self::new(0.2, 0.2, 0.2, 0.2, 0.2);

    pub const fn new(delta: f32, theta: f32, alpha: f32, beta: f32, gamma: f32) -> Self {
        Self {
            delta,
            theta,
            alpha,
            beta,
            gamma,
        }
    }

    pub fn as_array(&self) -> [f32; 5] {
        [self.delta, self.theta, self.alpha, self.beta, self.gamma]
    }

    pub fn total(&self) -> f32 {
        self.as_array().iter().sum()
    }

    /// Scale so the weights sum to 1.0. All-zero weights become uniform.
    pub fn normalize(&self) -> Self {
        let total = self.total();
        if total == 0.0 {
            return Self::UNIFORM;
        }
        Self::new(
            self.delta / total,
            self.theta / total,
            self.alpha / total,
            self.beta / total,
            self.gamma / total,
        )
    }

    /// Name of the heaviest band.
    pub fn dominant(&self) -> &'static str {
        const NAMES: [&str; 5] = ["delta", "theta", "alpha", "beta", "gamma"];
        let weights = self.as_array();
        let mut best = 0;
        for i in 1..weights.len() {
            if weights[i] > weights[best] {
                best = i;
            }
        }
        NAMES[best]
    }

    pub fn rounded(&self, precision: u32) -> Self {
        Self::new(
            round_to(self.delta, precision),
            round_to(self.theta, precision),
            round_to(self.alpha, precision),
            round_to(self.beta, precision),
            round_to(self.gamma, precision),
        )
    }
}

/// Tempo/energy cascade, slowest band first.
static CASCADE: RuleTable<BrainwaveState> = RuleTable::new(
    &[
        Rule {
            name: "very slow, quiet",
            matches: |f| f.tempo < 60.0 && f.energy < 0.3,
            emit: |_| BrainwaveState::new(0.35, 0.40, 0.18, 0.05, 0.02),
        },
        Rule {
            name: "slow, calm",
            matches: |f| f.tempo < 80.0 && f.energy < 0.4,
            emit: |_| BrainwaveState::new(0.15, 0.35, 0.35, 0.12, 0.03),
        },
        Rule {
            name: "medium-slow, relaxed",
            matches: |f| f.tempo < 100.0 && f.energy < 0.5,
            emit: |_| BrainwaveState::new(0.05, 0.15, 0.50, 0.25, 0.05),
        },
        Rule {
            name: "medium",
            matches: |f| f.tempo < 120.0,
            emit: |_| BrainwaveState::new(0.03, 0.10, 0.30, 0.45, 0.12),
        },
        Rule {
            name: "medium-fast",
            matches: |f| f.tempo < 140.0,
            emit: |f| {
                let beta_boost = (f.energy * 0.2).min(0.15);
                BrainwaveState::new(0.02, 0.05, 0.18, 0.55 + beta_boost, 0.20 - beta_boost)
            },
        },
        Rule {
            name: "fast",
            matches: |f| f.tempo < 160.0,
            emit: |f| {
                let gamma_boost = (f.complexity() * 0.15).min(0.10);
                BrainwaveState::new(0.01, 0.03, 0.10, 0.56, 0.30 + gamma_boost)
            },
        },
    ],
    Rule {
        name: "very fast",
        matches: |_| true,
        emit: |_| BrainwaveState::new(0.01, 0.02, 0.07, 0.50, 0.40),
    },
);

/// Maps window features to a brainwave distribution.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrainwavePredictor;

impl BrainwavePredictor {
    pub fn predict(&self, features: &FeatureVector) -> BrainwaveState {
        CASCADE.evaluate(features).normalize()
    }

    /// Name of the cascade band that fires for `features`.
    pub fn band(&self, features: &FeatureVector) -> &'static str {
        CASCADE.rule_for(features).name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn features(tempo: f32, energy: f32) -> FeatureVector {
        FeatureVector {
            tempo,
            energy,
            ..Default::default()
        }
    }

    #[test]
    fn zero_weights_normalize_to_uniform() {
        let state = BrainwaveState::new(0.0, 0.0, 0.0, 0.0, 0.0).normalize();
        assert_eq!(state, BrainwaveState::UNIFORM);
    }

    #[test]
    fn predictions_sum_to_one() {
        let predictor = BrainwavePredictor;
        for tempo in [0.0, 45.0, 70.0, 90.0, 110.0, 130.0, 150.0, 200.0, 400.0] {
            for energy in [0.0, 0.25, 0.45, 0.75, 1.0] {
                for centroid in [0.0, 0.5, 1.0] {
                    let f = FeatureVector {
                        spectral_centroid: centroid,
                        spectral_rolloff: centroid,
                        ..features(tempo, energy)
                    };
                    let state = predictor.predict(&f);
                    assert_abs_diff_eq!(state.total(), 1.0, epsilon = 1e-6);
                    assert!(state.as_array().iter().all(|&w| w >= 0.0));
                }
            }
        }
    }

    #[test]
    fn slow_quiet_is_theta_dominant() {
        let predictor = BrainwavePredictor;
        let f = features(50.0, 0.1);
        assert_eq!(predictor.band(&f), "very slow, quiet");
        assert_eq!(predictor.predict(&f).dominant(), "theta");
    }

    #[test]
    fn energy_gates_the_slow_bands() {
        let predictor = BrainwavePredictor;
        // Too loud for the first three bands, falls through to "medium".
        assert_eq!(predictor.band(&features(50.0, 0.9)), "medium");
        assert_eq!(predictor.band(&features(70.0, 0.35)), "slow, calm");
        assert_eq!(predictor.band(&features(95.0, 0.45)), "medium-slow, relaxed");
    }

    #[test]
    fn band_edges_are_exclusive() {
        let predictor = BrainwavePredictor;
        assert_eq!(predictor.band(&features(120.0, 0.0)), "medium-fast");
        assert_eq!(predictor.band(&features(140.0, 0.0)), "fast");
        assert_eq!(predictor.band(&features(160.0, 0.0)), "very fast");
    }

    #[test]
    fn medium_fast_beta_boost_is_capped() {
        let predictor = BrainwavePredictor;
        let quiet = predictor.predict(&features(130.0, 0.0));
        let loud = predictor.predict(&features(130.0, 1.0));
        assert_abs_diff_eq!(quiet.beta, 0.55, epsilon = 1e-6);
        assert_abs_diff_eq!(loud.beta, 0.70, epsilon = 1e-6);
        assert_abs_diff_eq!(loud.gamma, 0.05, epsilon = 1e-6);
        assert_eq!(loud.dominant(), "beta");
    }

    #[test]
    fn fast_gamma_grows_with_complexity() {
        let predictor = BrainwavePredictor;
        let plain = predictor.predict(&features(150.0, 0.5));
        let bright = predictor.predict(&FeatureVector {
            spectral_centroid: 1.0,
            spectral_rolloff: 1.0,
            ..features(150.0, 0.5)
        });
        assert!(bright.gamma > plain.gamma);
    }
}
