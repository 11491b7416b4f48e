// src/analysis/chromatic.rs
use super::imaging;
use super::{AnalysisModel, run_blocking};
use crate::models::{AnalysisResult, ChromaticResult, ColorBand, Harmony, ModelType, SharedImage};
use async_trait::async_trait;
use image::RgbImage;
use log::warn;
use std::collections::BTreeMap;

pub struct ChromaticModel;

impl ChromaticModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChromaticModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisModel for ChromaticModel {
    fn model_type(&self) -> ModelType {
        ModelType::Chromatic
    }

    async fn predict(&self, image: SharedImage) -> AnalysisResult {
        match run_blocking(ModelType::Chromatic, image, |img| analyse_colours(&img.to_rgb8())).await {
            Ok(result) => AnalysisResult::Chromatic(result),
            Err(e) => {
                warn!("Colour analysis unavailable: {}", e);
                AnalysisResult::unavailable(ModelType::Chromatic, e)
            }
        }
    }
}

pub fn analyse_colours(img: &RgbImage) -> ChromaticResult {
    let total = img.width() as usize * img.height() as usize;
    let mut counts: BTreeMap<ColorBand, (u64, u64)> = BTreeMap::new();
    let (mut min_l, mut max_l) = (u8::MAX, u8::MIN);

    for px in img.pixels() {
        let [r, g, b] = px.0;
        let l = imaging::lightness(r, g, b).round() as u8;
        min_l = min_l.min(l);
        max_l = max_l.max(l);

        if let Some(hue) = imaging::hue_half_degrees(r, g, b) {
            if let Some(band) = ColorBand::for_hue(hue) {
                let entry = counts.entry(band).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += hue as u64;
            }
        }
    }

    let percentages: BTreeMap<ColorBand, f64> = ColorBand::ALL
        .into_iter()
        .map(|band| {
            let count = counts.get(&band).map_or(0, |(c, _)| *c);
            let pct = if total == 0 { 0.0 } else { count as f64 / total as f64 * 100.0 };
            (band, imaging::round2(pct))
        })
        .collect();

    let mean_hues: Vec<f64> = counts
        .values()
        .filter(|(count, _)| *count > 0)
        .map(|(count, hue_sum)| *hue_sum as f64 / *count as f64)
        .collect();

    let contrast = if total == 0 { 0.0 } else { (max_l - min_l) as f64 / 255.0 };

    ChromaticResult {
        contrast: imaging::round2(contrast),
        harmony: classify_harmony(average_hue_distance(&mean_hues)),
        percentages,
    }
}

/// Mean pairwise circular distance between hues on the 0..180 scale.
pub fn average_hue_distance(hues: &[f64]) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in hues.iter().enumerate() {
        for b in &hues[i + 1..] {
            let diff = (a - b).abs();
            total += diff.min(180.0 - diff);
            pairs += 1;
        }
    }
    if pairs == 0 { 0.0 } else { total / pairs as f64 }
}

pub fn classify_harmony(avg_distance: f64) -> Harmony {
    if avg_distance > 90.0 {
        Harmony::Complementary
    } else if avg_distance < 30.0 {
        Harmony::Analogous
    } else {
        Harmony::Balanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb};
    use std::sync::Arc;

    fn striped(colours: &[[u8; 3]]) -> RgbImage {
        let width = colours.len() as u32 * 10;
        RgbImage::from_fn(width, 10, |x, _| Rgb(colours[(x / 10) as usize]))
    }

    #[test]
    fn test_percentages_bounded_and_sum_at_most_100() {
        let img = striped(&[[255, 0, 0], [255, 128, 0], [0, 0, 255], [40, 40, 40], [200, 0, 200]]);
        let result = analyse_colours(&img);
        let sum: f64 = result.percentages.values().sum();
        assert!(sum <= 100.0 + 1e-9);
        assert!(result.percentages.values().all(|p| (0.0..=100.0).contains(p)));
        assert_eq!(result.percentages.len(), 7);
        // Grey stripe is achromatic and lands in no band.
        assert!(sum < 100.0);
        assert_eq!(result.percentages[&ColorBand::Red], 20.0);
        assert_eq!(result.percentages[&ColorBand::Blue], 20.0);
    }

    #[test]
    fn test_hue_distance_is_order_independent() {
        let hues = [5.0, 60.0, 120.0, 150.0];
        let forward = average_hue_distance(&hues);
        let reversed: Vec<f64> = hues.iter().rev().copied().collect();
        let shuffled = [120.0, 5.0, 150.0, 60.0];
        assert!((forward - average_hue_distance(&reversed)).abs() < 1e-12);
        assert!((forward - average_hue_distance(&shuffled)).abs() < 1e-12);
    }

    #[test]
    fn test_hue_distance_wraps_around() {
        // 5 and 175 are ten half-degrees apart across the wrap.
        assert_eq!(average_hue_distance(&[5.0, 175.0]), 10.0);
        assert_eq!(average_hue_distance(&[42.0]), 0.0);
    }

    #[test]
    fn test_harmony_thresholds() {
        assert_eq!(classify_harmony(95.0), Harmony::Complementary);
        assert_eq!(classify_harmony(90.0), Harmony::Balanced);
        assert_eq!(classify_harmony(30.0), Harmony::Balanced);
        assert_eq!(classify_harmony(12.0), Harmony::Analogous);
    }

    #[test]
    fn test_single_hue_is_analogous_and_flat() {
        let img = RgbImage::from_pixel(20, 20, Rgb([30, 90, 200]));
        let result = analyse_colours(&img);
        assert_eq!(result.harmony, Harmony::Analogous);
        assert_eq!(result.contrast, 0.0);
        assert_eq!(result.percentages[&ColorBand::Blue], 100.0);
    }

    #[test]
    fn test_black_and_white_has_full_contrast() {
        let img = striped(&[[0, 0, 0], [255, 255, 255]]);
        let result = analyse_colours(&img);
        assert_eq!(result.contrast, 1.0);
        assert!(result.percentages.values().all(|p| *p == 0.0));
    }

    #[tokio::test]
    async fn test_predict_wraps_result() {
        let image = Arc::new(DynamicImage::ImageRgb8(striped(&[[255, 0, 0]])));
        let result = ChromaticModel::new().predict(image).await;
        assert!(matches!(result, AnalysisResult::Chromatic(_)));
    }
}
