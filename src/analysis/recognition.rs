// src/analysis/recognition.rs
// Predictor-backed models. Inference happens elsewhere; these only shape the
// raw output into AnalysisResult.
use super::imaging::round2;
use super::{AnalysisModel, RawPrediction, RawPredictions, normalise_predictions};
use crate::errors::AdviceError;
use crate::models::{
    AnalysisResult, HumanDetection, LabelPrediction, ModelType, ObjectDetection, SharedImage,
};
use crate::services::predictor::{InferenceRequest, Predictor, parse_prediction};
use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use std::sync::Arc;

const TOP_K: usize = 5;

/// Zero-shot candidates for genre classification.
pub const GENRE_LABELS: [&str; 26] = [
    "nature photography",
    "landscape photography",
    "astrophotography",
    "storm photography",
    "pet photography",
    "wild animals photography",
    "aquatic animals photography",
    "macro photography",
    "flower photography",
    "architecture photography",
    "real estate photography",
    "aerial photography",
    "portrait photography",
    "headshot photography",
    "fashion photography",
    "sports photography",
    "documentary photography",
    "street photography",
    "wedding photography",
    "event photography",
    "food photography",
    "product photography",
    "still life photography",
    "black and white photography",
    "fine art photography",
    "abstract photography",
];

async fn infer_raw(
    predictor: &dyn Predictor,
    model: ModelType,
    image: &SharedImage,
    labels: &[String],
) -> Result<serde_json::Value, AdviceError> {
    predictor
        .infer(InferenceRequest {
            task: model.as_str(),
            image: Arc::clone(image),
            labels,
        })
        .await
}

fn degrade(model: ModelType, outcome: Result<AnalysisResult, AdviceError>) -> AnalysisResult {
    outcome.unwrap_or_else(|e| {
        warn!("{} prediction unavailable: {}", model, e);
        AnalysisResult::unavailable(model, e)
    })
}

#[derive(Debug, Deserialize)]
struct RawScore {
    score: f64,
}

pub struct AestheticModel {
    predictor: Arc<dyn Predictor>,
}

impl AestheticModel {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self { predictor }
    }

    async fn run(&self, image: &SharedImage) -> Result<AnalysisResult, AdviceError> {
        let raw = infer_raw(self.predictor.as_ref(), ModelType::Aesthetic, image, &[]).await?;
        let parsed: RawScore = parse_prediction(ModelType::Aesthetic.as_str(), raw)?;
        if !parsed.score.is_finite() {
            return Err(AdviceError::model_unavailable(
                ModelType::Aesthetic.as_str(),
                "score is not a number",
            ));
        }
        Ok(AnalysisResult::Aesthetic {
            score: round2(parsed.score.clamp(0.0, 10.0)),
        })
    }
}

#[async_trait]
impl AnalysisModel for AestheticModel {
    fn model_type(&self) -> ModelType {
        ModelType::Aesthetic
    }

    async fn predict(&self, image: SharedImage) -> AnalysisResult {
        degrade(ModelType::Aesthetic, self.run(&image).await)
    }
}

#[derive(Debug, Deserialize)]
struct RawHuman {
    age: f64,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    emotion: String,
}

#[derive(Debug, Deserialize)]
struct RawObjects {
    #[serde(default)]
    human: Option<RawHuman>,
    #[serde(default)]
    predictions: Vec<RawPrediction>,
}

pub struct ObjectModel {
    predictor: Arc<dyn Predictor>,
}

impl ObjectModel {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self { predictor }
    }

    async fn run(&self, image: &SharedImage) -> Result<AnalysisResult, AdviceError> {
        let raw = infer_raw(self.predictor.as_ref(), ModelType::Object, image, &[]).await?;
        let parsed: RawObjects = parse_prediction(ModelType::Object.as_str(), raw)?;

        let detection = match parsed.human {
            Some(human) => ObjectDetection::Human(HumanDetection {
                age: human.age.max(0.0).round(),
                gender: human.gender.trim().to_string(),
                emotion: human.emotion.trim().to_string(),
            }),
            None => ObjectDetection::Labels {
                predictions: normalise_predictions(parsed.predictions, TOP_K),
            },
        };
        Ok(AnalysisResult::Object { detection })
    }
}

#[async_trait]
impl AnalysisModel for ObjectModel {
    fn model_type(&self) -> ModelType {
        ModelType::Object
    }

    async fn predict(&self, image: SharedImage) -> AnalysisResult {
        degrade(ModelType::Object, self.run(&image).await)
    }
}

pub struct SceneModel {
    predictor: Arc<dyn Predictor>,
}

impl SceneModel {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self { predictor }
    }

    async fn run(&self, image: &SharedImage) -> Result<AnalysisResult, AdviceError> {
        let predictions = ranked(self.predictor.as_ref(), ModelType::Scene, image, &[]).await?;
        Ok(AnalysisResult::Scene { predictions })
    }
}

#[async_trait]
impl AnalysisModel for SceneModel {
    fn model_type(&self) -> ModelType {
        ModelType::Scene
    }

    async fn predict(&self, image: SharedImage) -> AnalysisResult {
        degrade(ModelType::Scene, self.run(&image).await)
    }
}

pub struct GenreModel {
    predictor: Arc<dyn Predictor>,
    labels: Vec<String>,
}

impl GenreModel {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self {
            predictor,
            labels: GENRE_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }

    async fn run(&self, image: &SharedImage) -> Result<AnalysisResult, AdviceError> {
        let predictions = ranked(self.predictor.as_ref(), ModelType::Genre, image, &self.labels).await?;
        Ok(AnalysisResult::Genre { predictions })
    }
}

#[async_trait]
impl AnalysisModel for GenreModel {
    fn model_type(&self) -> ModelType {
        ModelType::Genre
    }

    async fn predict(&self, image: SharedImage) -> AnalysisResult {
        degrade(ModelType::Genre, self.run(&image).await)
    }
}

async fn ranked(
    predictor: &dyn Predictor,
    model: ModelType,
    image: &SharedImage,
    labels: &[String],
) -> Result<Vec<LabelPrediction>, AdviceError> {
    let raw = infer_raw(predictor, model, image, labels).await?;
    let parsed: RawPredictions = parse_prediction(model.as_str(), raw)?;
    Ok(normalise_predictions(parsed.predictions, TOP_K))
}
