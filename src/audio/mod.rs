pub mod analysis;
pub mod decode;
pub mod features;
pub mod rhythm;
pub mod spectrum;

pub use analysis::FeatureStream;
pub use decode::{decode_audio, AudioData};
pub use features::{FeatureVector, FrequencyBands};
