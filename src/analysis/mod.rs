// src/analysis/mod.rs
// Analysis models: one per predictor, each turning an image into a typed
// AnalysisResult.
use crate::errors::AdviceError;
use crate::models::{AnalysisResult, LabelPrediction, ModelType, SharedImage};
use async_trait::async_trait;
use image::DynamicImage;
use log::error;
use serde::Deserialize;

pub mod chromatic;
pub mod composition;
pub mod imaging;
pub mod quality;
pub mod recognition;

pub use chromatic::ChromaticModel;
pub use composition::CompositionModel;
pub use quality::TechnicalQualityModel;
pub use recognition::{AestheticModel, GENRE_LABELS, GenreModel, ObjectModel, SceneModel};

/// Wraps a single predictor. `predict` never fails: internal errors come
/// back as `AnalysisResult::Unavailable` so callers can degrade.
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    fn model_type(&self) -> ModelType;
    async fn predict(&self, image: SharedImage) -> AnalysisResult;
}

/// Runs a CPU-bound analysis on the blocking pool so request workers stay free.
pub(crate) async fn run_blocking<T, F>(model: ModelType, image: SharedImage, analyse: F) -> Result<T, AdviceError>
where
    T: Send + 'static,
    F: FnOnce(&DynamicImage) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || analyse(&image))
        .await
        .map_err(|e| {
            error!("{} analysis worker failed: {}", model, e);
            AdviceError::model_unavailable(model.as_str(), format!("analysis worker failed: {}", e))
        })
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPrediction {
    #[serde(default)]
    pub class_id: Option<u32>,
    pub label: String,
    pub probability: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPredictions {
    #[serde(default)]
    pub predictions: Vec<RawPrediction>,
}

/// Probabilities become percentages rounded to two decimals, ranked
/// highest first and cut to `top_k`.
pub(crate) fn normalise_predictions(raw: Vec<RawPrediction>, top_k: usize) -> Vec<LabelPrediction> {
    let mut ranked: Vec<LabelPrediction> = raw
        .into_iter()
        .filter(|p| p.probability.is_finite())
        .map(|p| LabelPrediction {
            class_id: p.class_id,
            label: p.label.trim().to_string(),
            confidence: imaging::round2((p.probability * 100.0).clamp(0.0, 100.0)),
        })
        .collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked.truncate(top_k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};
    use std::sync::Arc;

    #[test]
    fn test_normalise_predictions_ranks_and_bounds() {
        let raw = vec![
            RawPrediction { class_id: Some(1), label: "goldfish".into(), probability: 0.123456 },
            RawPrediction { class_id: Some(2), label: " tabby ".into(), probability: 0.8 },
            RawPrediction { class_id: None, label: "broken".into(), probability: f64::NAN },
            RawPrediction { class_id: Some(3), label: "overshoot".into(), probability: 1.7 },
        ];
        let ranked = normalise_predictions(raw, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].label, "overshoot");
        assert_eq!(ranked[0].confidence, 100.0);
        assert_eq!(ranked[1].label, "tabby");
        assert_eq!(ranked[1].confidence, 80.0);
    }

    #[tokio::test]
    async fn test_run_blocking_returns_analysis() {
        let image: SharedImage = Arc::new(DynamicImage::ImageRgb8(RgbImage::new(4, 4)));
        let width = run_blocking(ModelType::Quality, image, |img| img.dimensions().0)
            .await
            .unwrap();
        assert_eq!(width, 4);
    }
}
