// src/analysis/quality.rs
use super::imaging;
use super::{AnalysisModel, run_blocking};
use crate::models::{AnalysisResult, ModelType, QualityResult, SharedImage};
use async_trait::async_trait;
use image::RgbImage;
use log::warn;

pub struct TechnicalQualityModel;

impl TechnicalQualityModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TechnicalQualityModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisModel for TechnicalQualityModel {
    fn model_type(&self) -> ModelType {
        ModelType::Quality
    }

    async fn predict(&self, image: SharedImage) -> AnalysisResult {
        match run_blocking(ModelType::Quality, image, |img| assess(&img.to_rgb8())).await {
            Ok(result) => AnalysisResult::Quality(result),
            Err(e) => {
                warn!("Technical quality analysis unavailable: {}", e);
                AnalysisResult::unavailable(ModelType::Quality, e)
            }
        }
    }
}

pub fn assess(img: &RgbImage) -> QualityResult {
    let gray = imaging::grayscale(img);
    // Depth of field and noise share the Laplacian energy; the advice layer
    // reads them against different thresholds.
    let sharpness = imaging::laplacian_variance(&gray);

    QualityResult {
        white_balance: imaging::round2(white_balance_deviation(img)),
        depth_of_field: imaging::round2(sharpness),
        brightness: imaging::round2(imaging::mean(&gray)),
        noise: imaging::round2(sharpness),
    }
}

/// Sum of pairwise differences between the channel means; 0 is neutral.
pub fn white_balance_deviation(img: &RgbImage) -> f64 {
    let total = img.width() as f64 * img.height() as f64;
    if total == 0.0 {
        return 0.0;
    }
    let mut sums = [0u64; 3];
    for px in img.pixels() {
        for (sum, value) in sums.iter_mut().zip(px.0) {
            *sum += value as u64;
        }
    }
    let [r, g, b] = sums.map(|s| s as f64 / total);
    (r - g).abs() + (g - b).abs() + (r - b).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_all_black_image() {
        let result = assess(&RgbImage::new(32, 32));
        assert_eq!(result.brightness, 0.0);
        assert_eq!(result.white_balance, 0.0);
        assert_eq!(result.depth_of_field, 0.0);
        assert_eq!(result.noise, 0.0);
    }

    #[test]
    fn test_colour_cast_raises_white_balance_deviation() {
        let img = RgbImage::from_pixel(8, 8, Rgb([200, 100, 50]));
        // |200-100| + |100-50| + |200-50|
        assert_eq!(white_balance_deviation(&img), 300.0);
    }

    #[test]
    fn test_fine_texture_raises_laplacian_energy() {
        let noisy = RgbImage::from_fn(32, 32, |x, y| {
            let v = if (x * 7 + y * 13) % 3 == 0 { 230 } else { 20 };
            Rgb([v, v, v])
        });
        let result = assess(&noisy);
        assert!(result.noise > 200.0);
        assert_eq!(result.noise, result.depth_of_field);
    }

    #[test]
    fn test_empty_image_does_not_panic() {
        let result = assess(&RgbImage::new(0, 0));
        assert_eq!(result.brightness, 0.0);
    }
}
