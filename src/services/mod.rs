// src/services/mod.rs
pub mod image_processor;
pub mod predictor;
pub mod registry;

pub use image_processor::ImageProcessor;
pub use predictor::{HttpPredictor, Predictor};
pub use registry::{DefaultModelFactory, ModelFactory, ModelRegistry};
