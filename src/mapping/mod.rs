pub mod brainwave;
pub mod emotion;
pub mod regions;
pub mod rules;

pub use brainwave::{BrainwavePredictor, BrainwaveState};
pub use emotion::{EmotionClassification, EmotionClassifier, EmotionLabel};
pub use regions::{BrainRegionActivation, BrainRegionMapper};
