// src/advice/quality.rs
use super::Advice;
use crate::models::QualityResult;
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteBalance {
    Good,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthOfField {
    High,
    Moderate,
    Shallow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    TooDark,
    Balanced,
    Overexposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Noise {
    High,
    Noticeable,
    Low,
}

/// Qualitative reading of a `QualityResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityBands {
    pub white_balance: WhiteBalance,
    pub depth_of_field: DepthOfField,
    pub exposure: Exposure,
    pub noise: Noise,
}

impl QualityBands {
    pub fn classify(result: &QualityResult) -> Self {
        Self {
            white_balance: if result.white_balance < 10.0 {
                WhiteBalance::Good
            } else {
                WhiteBalance::Off
            },
            depth_of_field: if result.depth_of_field > 1000.0 {
                DepthOfField::High
            } else if result.depth_of_field > 100.0 {
                DepthOfField::Moderate
            } else {
                DepthOfField::Shallow
            },
            exposure: if result.brightness < 40.0 {
                Exposure::TooDark
            } else if result.brightness > 200.0 {
                Exposure::Overexposed
            } else {
                Exposure::Balanced
            },
            noise: if result.noise > 200.0 {
                Noise::High
            } else if result.noise > 50.0 {
                Noise::Noticeable
            } else {
                Noise::Low
            },
        }
    }
}

impl WhiteBalance {
    fn label(&self) -> &'static str {
        match self {
            WhiteBalance::Good => "good",
            WhiteBalance::Off => "off",
        }
    }

    fn sentence(&self) -> &'static str {
        match self {
            WhiteBalance::Good => "White balance is good: neutral tones look neutral.",
            WhiteBalance::Off => {
                "White balance is off: there is a colour cast. Set a custom white balance or correct it in editing."
            }
        }
    }
}

impl DepthOfField {
    fn label(&self) -> &'static str {
        match self {
            DepthOfField::High => "high",
            DepthOfField::Moderate => "moderate",
            DepthOfField::Shallow => "shallow",
        }
    }

    fn sentence(&self) -> &'static str {
        match self {
            DepthOfField::High => {
                "Depth of field is high, with detail across the frame, which suits landscapes and architecture."
            }
            DepthOfField::Moderate => {
                "Depth of field is moderate, which suits portraits where the subject stands out from the background."
            }
            DepthOfField::Shallow => {
                "Depth of field is shallow. If you wanted more of the scene sharp, use a smaller aperture or check your focus."
            }
        }
    }
}

impl Exposure {
    fn label(&self) -> &'static str {
        match self {
            Exposure::TooDark => "too dark",
            Exposure::Balanced => "balanced",
            Exposure::Overexposed => "overexposed",
        }
    }

    fn sentence(&self) -> &'static str {
        match self {
            Exposure::TooDark => {
                "The image is too dark. Increase exposure with a slower shutter, a wider aperture or a higher ISO."
            }
            Exposure::Balanced => "Brightness is balanced.",
            Exposure::Overexposed => {
                "The image is overexposed. Reduce exposure or use exposure compensation to keep highlight detail."
            }
        }
    }
}

impl Noise {
    fn label(&self) -> &'static str {
        match self {
            Noise::High => "high noise",
            Noise::Noticeable => "some noise",
            Noise::Low => "low noise",
        }
    }

    fn sentence(&self) -> &'static str {
        match self {
            Noise::High => "High noise detected. Lower the ISO or add light to the scene.",
            Noise::Noticeable => "Some noise is visible. A little noise reduction in editing may help.",
            Noise::Low => "Noise is low, so the image looks clean.",
        }
    }
}

fn field(value: f64, rating: &str) -> Value {
    json!({ "value": value, "rating": rating })
}

pub fn advise(result: &QualityResult) -> Advice {
    let bands = QualityBands::classify(result);

    let narrative = [
        bands.white_balance.sentence(),
        bands.depth_of_field.sentence(),
        bands.exposure.sentence(),
        bands.noise.sentence(),
    ]
    .join(" ");

    let mut fields = Map::new();
    fields.insert("white_balance".into(), field(result.white_balance, bands.white_balance.label()));
    fields.insert("depth_of_field".into(), field(result.depth_of_field, bands.depth_of_field.label()));
    fields.insert("brightness".into(), field(result.brightness, bands.exposure.label()));
    fields.insert("noise".into(), field(result.noise, bands.noise.label()));

    Advice::structured(narrative, fields)
}
