// src/models.rs
use crate::errors::AdviceError;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Decoded image shared between the request handler and analysis workers.
pub type SharedImage = Arc<DynamicImage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceCategory {
    AestheticScore,
    TechnicalQuality,
    ObjectAdvice,
    SceneAdvice,
    GenreAdvice,
    GeneralAdvice,
}

impl AdviceCategory {
    pub const ALL: [AdviceCategory; 6] = [
        AdviceCategory::AestheticScore,
        AdviceCategory::TechnicalQuality,
        AdviceCategory::ObjectAdvice,
        AdviceCategory::SceneAdvice,
        AdviceCategory::GenreAdvice,
        AdviceCategory::GeneralAdvice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdviceCategory::AestheticScore => "aesthetic_score",
            AdviceCategory::TechnicalQuality => "technical_quality",
            AdviceCategory::ObjectAdvice => "object_advice",
            AdviceCategory::SceneAdvice => "scene_advice",
            AdviceCategory::GenreAdvice => "genre_advice",
            AdviceCategory::GeneralAdvice => "general_advice",
        }
    }

    /// Content advice is the only category answered without an image.
    pub fn requires_image(&self) -> bool {
        !matches!(self, AdviceCategory::GeneralAdvice)
    }
}

impl fmt::Display for AdviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdviceCategory {
    type Err = AdviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        AdviceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| AdviceError::InvalidCategory(key.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AestheticOption {
    Composition,
    Chromatic,
    General,
}

impl AestheticOption {
    pub const ALL: [AestheticOption; 3] = [
        AestheticOption::Composition,
        AestheticOption::Chromatic,
        AestheticOption::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AestheticOption::Composition => "composition",
            AestheticOption::Chromatic => "chromatic",
            AestheticOption::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_ascii_lowercase();
        AestheticOption::ALL.into_iter().find(|o| o.as_str() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Aesthetic,
    Composition,
    Chromatic,
    Quality,
    Object,
    Scene,
    Genre,
}

impl ModelType {
    pub const ALL: [ModelType; 7] = [
        ModelType::Aesthetic,
        ModelType::Composition,
        ModelType::Chromatic,
        ModelType::Quality,
        ModelType::Object,
        ModelType::Scene,
        ModelType::Genre,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Aesthetic => "aesthetic",
            ModelType::Composition => "composition",
            ModelType::Chromatic => "chromatic",
            ModelType::Quality => "quality",
            ModelType::Object => "object",
            ModelType::Scene => "scene",
            ModelType::Genre => "genre",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = AdviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelType::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AdviceError::UnknownModelType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBand {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Indigo,
    Violet,
}

impl ColorBand {
    pub const ALL: [ColorBand; 7] = [
        ColorBand::Red,
        ColorBand::Orange,
        ColorBand::Yellow,
        ColorBand::Green,
        ColorBand::Blue,
        ColorBand::Indigo,
        ColorBand::Violet,
    ];

    /// Inclusive hue range on the 0..180 half-degree scale.
    pub fn hue_range(&self) -> (u8, u8) {
        match self {
            ColorBand::Red => (0, 10),
            ColorBand::Orange => (11, 25),
            ColorBand::Yellow => (26, 35),
            ColorBand::Green => (36, 85),
            ColorBand::Blue => (86, 125),
            ColorBand::Indigo => (126, 140),
            ColorBand::Violet => (141, 160),
        }
    }

    pub fn for_hue(hue: u8) -> Option<ColorBand> {
        ColorBand::ALL.into_iter().find(|band| {
            let (low, high) = band.hue_range();
            (low..=high).contains(&hue)
        })
    }

    pub fn is_warm(&self) -> bool {
        matches!(self, ColorBand::Red | ColorBand::Orange | ColorBand::Yellow)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorBand::Red => "red",
            ColorBand::Orange => "orange",
            ColorBand::Yellow => "yellow",
            ColorBand::Green => "green",
            ColorBand::Blue => "blue",
            ColorBand::Indigo => "indigo",
            ColorBand::Violet => "violet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Harmony {
    Complementary,
    Analogous,
    Balanced,
}

impl Harmony {
    pub fn as_str(&self) -> &'static str {
        match self {
            Harmony::Complementary => "complementary",
            Harmony::Analogous => "analogous",
            Harmony::Balanced => "balanced",
        }
    }
}

/// Mean absolute difference between mirrored halves, 0..255 per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymmetryScores {
    pub vertical: f64,
    pub horizontal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionResult {
    pub rule_of_thirds: bool,
    pub leading_lines: bool,
    pub symmetry: SymmetryScores,
    /// Both axes normalised to [0, 1] and averaged.
    pub symmetry_score: f64,
    /// `None` when the CLIP back-end could not score the image.
    #[serde(default)]
    pub clip_score: Option<f64>,
    pub overall_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromaticResult {
    pub contrast: f64,
    pub harmony: Harmony,
    pub percentages: BTreeMap<ColorBand, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    pub white_balance: f64,
    pub depth_of_field: f64,
    pub brightness: f64,
    pub noise: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPrediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<u32>,
    pub label: String,
    /// Percentage in [0, 100], two decimals.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanDetection {
    pub age: f64,
    pub gender: String,
    pub emotion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectDetection {
    Labels { predictions: Vec<LabelPrediction> },
    Human(HumanDetection),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum AnalysisResult {
    Aesthetic { score: f64 },
    Composition(CompositionResult),
    Chromatic(ChromaticResult),
    Quality(QualityResult),
    Object { detection: ObjectDetection },
    Scene { predictions: Vec<LabelPrediction> },
    Genre { predictions: Vec<LabelPrediction> },
    Unavailable { source: ModelType, reason: String },
}

impl AnalysisResult {
    pub fn unavailable(source: ModelType, reason: impl ToString) -> Self {
        AnalysisResult::Unavailable {
            source,
            reason: reason.to_string(),
        }
    }

    pub fn model_type(&self) -> ModelType {
        match self {
            AnalysisResult::Aesthetic { .. } => ModelType::Aesthetic,
            AnalysisResult::Composition(_) => ModelType::Composition,
            AnalysisResult::Chromatic(_) => ModelType::Chromatic,
            AnalysisResult::Quality(_) => ModelType::Quality,
            AnalysisResult::Object { .. } => ModelType::Object,
            AnalysisResult::Scene { .. } => ModelType::Scene,
            AnalysisResult::Genre { .. } => ModelType::Genre,
            AnalysisResult::Unavailable { source, .. } => *source,
        }
    }
}

/// A validated advice request, built at the HTTP boundary.
#[derive(Debug, Clone)]
pub struct AdviceRequest {
    pub category: AdviceCategory,
    pub sub_category: Option<String>,
    /// Second-level key for content advice.
    pub sub_topic: Option<String>,
    pub image: Option<SharedImage>,
}

#[derive(Debug, Clone)]
pub struct AdviceResponse {
    pub request_id: Uuid,
    pub category: AdviceCategory,
    pub sub_category: Option<String>,
    pub narrative: String,
    pub structured_fields: Option<Map<String, Value>>,
    pub generated_at: DateTime<Utc>,
}

impl AdviceResponse {
    pub fn new(
        category: AdviceCategory,
        sub_category: Option<String>,
        narrative: impl Into<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            category,
            sub_category,
            narrative: narrative.into(),
            structured_fields: None,
            generated_at: Utc::now(),
        }
    }

    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.structured_fields = Some(fields);
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.structured_fields
            .as_ref()
            .and_then(|f| f.get("degraded"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Wire value of `result`: the narrative alone, or the structured
    /// fields with the narrative folded in.
    pub fn result_value(&self) -> Value {
        match &self.structured_fields {
            None => Value::String(self.narrative.clone()),
            Some(fields) => {
                let mut object = fields.clone();
                object.insert("narrative".to_string(), Value::String(self.narrative.clone()));
                Value::Object(object)
            }
        }
    }
}

#[derive(Serialize)]
struct WireAdvice<'a> {
    request_id: &'a Uuid,
    advice_type: AdviceCategory,
    sub_advice_type: &'a Option<String>,
    result: Value,
    generated_at: &'a DateTime<Utc>,
}

impl Serialize for AdviceResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireAdvice {
            request_id: &self.request_id,
            advice_type: self.category,
            sub_advice_type: &self.sub_category,
            result: self.result_value(),
            generated_at: &self.generated_at,
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub title: String,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default, alias = "tips")]
    pub details: Vec<String>,
    #[serde(default)]
    pub image_link: Option<String>,
}
