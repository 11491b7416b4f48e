// src/services/image_processor.rs
use crate::config::AppConfig;
use crate::errors::AdviceError;
use crate::models::SharedImage;
use bytes::{Bytes, BytesMut};
use image::{DynamicImage, GenericImageView};
use log::{debug, info};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;

/// Decodes uploads and fetched images into analysis-ready rasters.
#[derive(Clone)]
pub struct ImageProcessor {
    client: Client,
    max_bytes: usize,
    max_side: u32,
}

impl ImageProcessor {
    pub fn new(max_bytes: usize, max_side: u32, fetch_timeout: Duration) -> Result<Self, AdviceError> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| AdviceError::ImageFetch(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            max_bytes,
            max_side,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AdviceError> {
        Self::new(
            config.max_upload_bytes,
            config.max_analysis_side,
            config.image_fetch_timeout(),
        )
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Bytes to a shared raster, downscaled for analysis.
    pub fn decode(&self, data: &[u8]) -> Result<SharedImage, AdviceError> {
        if data.is_empty() {
            return Err(AdviceError::ImageDecode("image is empty".to_string()));
        }
        self.check_size(data.len())?;

        let img = image::load_from_memory(data)
            .map_err(|e| AdviceError::ImageDecode(format!("Invalid image format: {}", e)))?;

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(AdviceError::ImageDecode("image has no pixels".to_string()));
        }

        Ok(Arc::new(prepare_for_analysis(img, self.max_side)))
    }

    /// Downloads an image, refusing anything over the upload limit.
    pub async fn fetch(&self, url: &str) -> Result<Bytes, AdviceError> {
        let url = Url::parse(url.trim())
            .map_err(|e| AdviceError::ImageFetch(format!("Invalid image URL '{}': {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AdviceError::ImageFetch(format!(
                "Unsupported URL scheme '{}'",
                url.scheme()
            )));
        }

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AdviceError::ImageFetch(format!("Failed to download {}: {}", url, e)))?;

        if let Some(length) = response.content_length() {
            self.check_size(length as usize)?;
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AdviceError::ImageFetch(format!("Failed to read {}: {}", url, e)))?
        {
            self.check_size(body.len() + chunk.len())?;
            body.extend_from_slice(&chunk);
        }

        info!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.freeze())
    }

    pub async fn load_url(&self, url: &str) -> Result<SharedImage, AdviceError> {
        let data = self.fetch(url).await?;
        self.decode(&data)
    }

    fn check_size(&self, len: usize) -> Result<(), AdviceError> {
        if len > self.max_bytes {
            return Err(AdviceError::Validation(format!(
                "image exceeds the {} byte limit",
                self.max_bytes
            )));
        }
        Ok(())
    }
}

/// Shrinks the image so its longer side is at most `max_side`, keeping the
/// aspect ratio. Smaller images pass through untouched.
pub fn prepare_for_analysis(img: DynamicImage, max_side: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_side && height <= max_side {
        return img;
    }

    let ratio = max_side as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * ratio).round() as u32).max(1);
    let new_height = ((height as f32 * ratio).round() as u32).max(1);
    debug!("Downscaling {}x{} to {}x{}", width, height, new_width, new_height);

    img.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle)
}
