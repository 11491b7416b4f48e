// src/services/predictor.rs
use crate::errors::AdviceError;
use crate::models::SharedImage;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageFormat};
use log::{debug, error};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::{Duration, Instant};

/// One call to the external inference back-end.
pub struct InferenceRequest<'a> {
    pub task: &'a str,
    pub image: SharedImage,
    /// Candidate labels for zero-shot tasks; empty otherwise.
    pub labels: &'a [String],
}

/// Black-box predictor returning the raw JSON prediction for a task.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn infer(&self, request: InferenceRequest<'_>) -> Result<Value, AdviceError>;
}

pub struct HttpPredictor {
    base_url: String,
    client: Client,
}

impl HttpPredictor {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AdviceError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AdviceError::model_unavailable("predictor", format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn infer(&self, request: InferenceRequest<'_>) -> Result<Value, AdviceError> {
        let start = Instant::now();
        let base64_image = encode_off_thread(request.task, request.image).await?;

        let response = self
            .client
            .post(format!("{}/predict/{}", self.base_url, request.task))
            .json(&json!({
                "image": base64_image,
                "labels": request.labels,
            }))
            .send()
            .await
            .map_err(|e| {
                AdviceError::model_unavailable(request.task, format!("Predictor request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AdviceError::model_unavailable(
                request.task,
                format!("Predictor error ({}): {}", status, error_text),
            ));
        }

        let result: Value = response.json().await.map_err(|e| {
            AdviceError::model_unavailable(
                request.task,
                format!("Failed to parse predictor response: {}", e),
            )
        })?;

        debug!(
            "Predictor task '{}' answered in {} ms",
            request.task,
            start.elapsed().as_millis()
        );
        Ok(result)
    }
}

pub fn encode_jpeg_base64(image: &DynamicImage) -> Result<String, AdviceError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut output = Vec::new();
    rgb.write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Jpeg)
        .map_err(|e| AdviceError::ImageDecode(format!("Failed to encode image: {}", e)))?;
    Ok(general_purpose::STANDARD.encode(output))
}

/// JPEG encoding is CPU-bound, so it runs on the blocking pool like the
/// local analysers.
async fn encode_off_thread(task: &str, image: SharedImage) -> Result<String, AdviceError> {
    tokio::task::spawn_blocking(move || encode_jpeg_base64(&image))
        .await
        .map_err(|e| {
            error!("Encoding for predictor task '{}' failed: {}", task, e);
            AdviceError::model_unavailable(task, format!("encoding worker failed: {}", e))
        })?
}

/// Deserialises a raw prediction into the shape a model expects.
pub fn parse_prediction<T: DeserializeOwned>(task: &str, value: Value) -> Result<T, AdviceError> {
    serde_json::from_value(value).map_err(|e| {
        AdviceError::model_unavailable(task, format!("Unexpected prediction shape: {}", e))
    })
}
