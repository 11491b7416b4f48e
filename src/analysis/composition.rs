// src/analysis/composition.rs
use super::imaging::{self, Plane};
use super::{AnalysisModel, RawPredictions, run_blocking};
use crate::errors::AdviceError;
use crate::models::{AnalysisResult, CompositionResult, ModelType, SharedImage, SymmetryScores};
use crate::services::predictor::{InferenceRequest, Predictor, parse_prediction};
use async_trait::async_trait;
use image::RgbImage;
use log::warn;
use std::f64::consts::PI;
use std::sync::Arc;

const WELL_COMPOSED_PROMPT: &str = "a well-composed photograph";
const POORLY_COMPOSED_PROMPT: &str = "a poorly composed photograph";

const LEADING_LINE_VOTES: u32 = 120;
const MIN_LEADING_LINES: usize = 5;
// Components smaller than this enclose no area and are edge noise.
const MIN_CONTOUR_PIXELS: usize = 4;

/// Signals computed from pixels alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSignals {
    pub rule_of_thirds: bool,
    pub leading_lines: bool,
    pub symmetry: SymmetryScores,
}

pub struct CompositionModel {
    predictor: Arc<dyn Predictor>,
    prompts: Vec<String>,
}

impl CompositionModel {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self {
            predictor,
            prompts: vec![
                WELL_COMPOSED_PROMPT.to_string(),
                POORLY_COMPOSED_PROMPT.to_string(),
            ],
        }
    }

    /// Probability (0..1) that CLIP prefers the well-composed prompt.
    async fn clip_score(&self, image: &SharedImage) -> Result<f64, AdviceError> {
        let raw = self
            .predictor
            .infer(InferenceRequest {
                task: ModelType::Composition.as_str(),
                image: Arc::clone(image),
                labels: &self.prompts,
            })
            .await?;
        let parsed: RawPredictions = parse_prediction(ModelType::Composition.as_str(), raw)?;

        parsed
            .predictions
            .iter()
            .find(|p| p.label == WELL_COMPOSED_PROMPT)
            .map(|p| p.probability.clamp(0.0, 1.0))
            .ok_or_else(|| {
                AdviceError::model_unavailable(
                    ModelType::Composition.as_str(),
                    "no score for the well-composed prompt",
                )
            })
    }
}

#[async_trait]
impl AnalysisModel for CompositionModel {
    fn model_type(&self) -> ModelType {
        ModelType::Composition
    }

    async fn predict(&self, image: SharedImage) -> AnalysisResult {
        let layout = run_blocking(ModelType::Composition, image.clone(), |img| {
            analyse_layout(&img.to_rgb8())
        });
        let (layout, clip) = tokio::join!(layout, self.clip_score(&image));

        // Layout signals are local; only the CLIP line is lost without the back-end.
        let clip = match clip {
            Ok(score) => Some(score),
            Err(e) => {
                warn!("CLIP composition score unavailable: {}", e);
                None
            }
        };
        match layout {
            Ok(signals) => AnalysisResult::Composition(combine(signals, clip)),
            Err(e) => {
                warn!("Composition analysis unavailable: {}", e);
                AnalysisResult::unavailable(ModelType::Composition, e)
            }
        }
    }
}

pub fn analyse_layout(img: &RgbImage) -> LayoutSignals {
    let gray = imaging::grayscale(img);
    LayoutSignals {
        rule_of_thirds: rule_of_thirds(&gray),
        leading_lines: leading_lines(&gray),
        symmetry: symmetry(img),
    }
}

pub fn combine(signals: LayoutSignals, clip_score: Option<f64>) -> CompositionResult {
    let symmetry_score = (normalise_symmetry(signals.symmetry.vertical)
        + normalise_symmetry(signals.symmetry.horizontal))
        / 2.0;
    let as_unit = |flag: bool| if flag { 1.0 } else { 0.0 };
    let overall = (as_unit(signals.rule_of_thirds) + as_unit(signals.leading_lines) + symmetry_score) / 3.0;

    CompositionResult {
        rule_of_thirds: signals.rule_of_thirds,
        leading_lines: signals.leading_lines,
        symmetry: signals.symmetry,
        symmetry_score: imaging::round2(symmetry_score),
        clip_score: clip_score.map(imaging::round2),
        overall_score: imaging::round2(overall),
    }
}

/// Maps a mean mirror difference onto [0, 1], 1 being a perfect mirror.
pub fn normalise_symmetry(diff: f64) -> f64 {
    (1.0 - diff / 255.0).max(0.0)
}

/// True when any edge contour centres within (w/20, h/20) of one of the
/// four thirds intersections.
pub fn rule_of_thirds(gray: &Plane) -> bool {
    let (w, h) = (gray.width, gray.height);
    let thirds_x = [w / 3, 2 * w / 3];
    let thirds_y = [h / 3, 2 * h / 3];
    let (tol_x, tol_y) = ((w / 20) as isize, (h / 20) as isize);

    let blurred = imaging::gaussian_blur_5x5(gray);
    let edges = imaging::canny(&blurred, 100.0, 200.0);

    imaging::edge_centroids(&edges, w, h, MIN_CONTOUR_PIXELS)
        .into_iter()
        .any(|(cx, cy)| {
            let (cx, cy) = (cx as isize, cy as isize);
            thirds_x.iter().any(|&x| (cx - x as isize).abs() < tol_x)
                && thirds_y.iter().any(|&y| (cy - y as isize).abs() < tol_y)
        })
}

/// True when at least five Hough lines have a normal within 45 degrees of
/// the vertical axis or within 22.5 degrees of the horizontal axis.
pub fn leading_lines(gray: &Plane) -> bool {
    let edges = imaging::canny(gray, 50.0, 150.0);
    let angles = imaging::hough_line_angles(&edges, gray.width, gray.height, LEADING_LINE_VOTES);

    let qualifying = angles
        .iter()
        .filter(|&&theta| {
            (PI / 4.0 < theta && theta < 3.0 * PI / 4.0) || theta < PI / 8.0 || theta > 7.0 * PI / 8.0
        })
        .count();
    qualifying >= MIN_LEADING_LINES
}

/// Mean absolute difference between each half and the mirror of the other,
/// across the vertical axis (left/right) and the horizontal axis (top/bottom).
pub fn symmetry(img: &RgbImage) -> SymmetryScores {
    let (w, h) = img.dimensions();
    let (w, h) = (w as usize, h as usize);
    let raw = img.as_raw();
    let channel_diff = |a: usize, b: usize| -> u64 {
        (0..3)
            .map(|c| (raw[a * 3 + c] as i32 - raw[b * 3 + c] as i32).unsigned_abs() as u64)
            .sum()
    };

    let half_w = w / 2;
    let mut vertical_total = 0u64;
    for y in 0..h {
        for x in 0..half_w {
            vertical_total += channel_diff(y * w + x, y * w + (w - 1 - x));
        }
    }

    let half_h = h / 2;
    let mut horizontal_total = 0u64;
    for y in 0..half_h {
        for x in 0..w {
            horizontal_total += channel_diff(y * w + x, (h - 1 - y) * w + x);
        }
    }

    let mean = |total: u64, samples: usize| {
        if samples == 0 { 0.0 } else { total as f64 / (samples * 3) as f64 }
    };
    SymmetryScores {
        vertical: imaging::round2(mean(vertical_total, half_w * h)),
        horizontal: imaging::round2(mean(horizontal_total, half_h * w)),
    }
}
