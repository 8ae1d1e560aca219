//! Image preprocessing module
//!
//! Turns raw upload bytes into the fixed-shape tensor the classifier expects:
//! - Content-based format detection and decoding
//! - Conversion to 3-channel RGB
//! - Resampling to the model's input resolution
//! - Scaling of channel values to [0.0, 1.0]

mod normalizer;

pub use normalizer::{ImageNormalizer, CHANNELS, INPUT_SIZE};
