// src/advice/mod.rs
// Turns a category plus an optional image into advice. Each strategy pulls
// one model from the registry and renders its result against fixed
// threshold tables.
pub mod aesthetic;
pub mod chromatic;
pub mod composition;
pub mod labels;
pub mod object;
pub mod quality;

use crate::catalog::{ContentAdviceProvider, ContentCatalog, ReferenceData};
use crate::errors::AdviceError;
use crate::models::{
    AdviceCategory, AdviceRequest, AdviceResponse, AestheticOption, AnalysisResult, ModelType,
    SharedImage,
};
use crate::services::registry::ModelRegistry;
use log::{debug, error, warn};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Narrative text plus optional machine-readable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Advice {
    pub narrative: String,
    pub fields: Option<Map<String, Value>>,
}

impl Advice {
    pub fn text(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            fields: None,
        }
    }

    pub fn structured(narrative: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            narrative: narrative.into(),
            fields: Some(fields),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdviceStrategy {
    Aesthetic(AestheticOption),
    TechnicalQuality,
    Object,
    Scene,
    Genre,
    Content {
        category: Option<String>,
        sub_topic: Option<String>,
    },
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AdviceStrategy {
    /// Picks the strategy for a category. Unknown aesthetic sub-options fall
    /// back to the general score; categories without sub-options reject one.
    pub fn for_category(
        category: AdviceCategory,
        sub_category: Option<&str>,
        sub_topic: Option<&str>,
    ) -> Result<Self, AdviceError> {
        let sub_category = non_blank(sub_category);
        let strategy = match category {
            AdviceCategory::AestheticScore => {
                let option = match sub_category {
                    None => AestheticOption::General,
                    Some(raw) => AestheticOption::parse(raw).unwrap_or_else(|| {
                        warn!("Unknown aesthetic sub-option '{}', using general", raw);
                        AestheticOption::General
                    }),
                };
                AdviceStrategy::Aesthetic(option)
            }
            AdviceCategory::GeneralAdvice => AdviceStrategy::Content {
                category: sub_category.map(str::to_string),
                sub_topic: non_blank(sub_topic).map(str::to_string),
            },
            other => {
                if let Some(raw) = sub_category {
                    return Err(AdviceError::InvalidSubCategory {
                        category: other.to_string(),
                        sub_category: raw.to_string(),
                    });
                }
                match other {
                    AdviceCategory::TechnicalQuality => AdviceStrategy::TechnicalQuality,
                    AdviceCategory::ObjectAdvice => AdviceStrategy::Object,
                    AdviceCategory::SceneAdvice => AdviceStrategy::Scene,
                    _ => AdviceStrategy::Genre,
                }
            }
        };
        Ok(strategy)
    }

    pub fn for_request(request: &AdviceRequest) -> Result<Self, AdviceError> {
        Self::for_category(
            request.category,
            request.sub_category.as_deref(),
            request.sub_topic.as_deref(),
        )
    }

    pub fn category(&self) -> AdviceCategory {
        match self {
            AdviceStrategy::Aesthetic(_) => AdviceCategory::AestheticScore,
            AdviceStrategy::TechnicalQuality => AdviceCategory::TechnicalQuality,
            AdviceStrategy::Object => AdviceCategory::ObjectAdvice,
            AdviceStrategy::Scene => AdviceCategory::SceneAdvice,
            AdviceStrategy::Genre => AdviceCategory::GenreAdvice,
            AdviceStrategy::Content { .. } => AdviceCategory::GeneralAdvice,
        }
    }

    /// Model backing an image strategy; `None` for content advice.
    pub fn model_type(&self) -> Option<ModelType> {
        match self {
            AdviceStrategy::Aesthetic(option) => Some(aesthetic::model_for(*option)),
            AdviceStrategy::TechnicalQuality => Some(ModelType::Quality),
            AdviceStrategy::Object => Some(ModelType::Object),
            AdviceStrategy::Scene => Some(ModelType::Scene),
            AdviceStrategy::Genre => Some(ModelType::Genre),
            AdviceStrategy::Content { .. } => None,
        }
    }

    fn sub_category(&self) -> Option<String> {
        match self {
            AdviceStrategy::Aesthetic(option) => Some(option.as_str().to_string()),
            _ => None,
        }
    }

    /// Renders a model result; `None` when the result does not belong to
    /// this strategy.
    pub fn render(&self, result: &AnalysisResult, reference: &ReferenceData) -> Option<Advice> {
        let advice = match (self, result) {
            (AdviceStrategy::Aesthetic(AestheticOption::General), AnalysisResult::Aesthetic { score }) => {
                Advice::text(aesthetic::advise(*score))
            }
            (AdviceStrategy::Aesthetic(AestheticOption::Composition), AnalysisResult::Composition(r)) => {
                Advice::text(composition::advise(r))
            }
            (AdviceStrategy::Aesthetic(AestheticOption::Chromatic), AnalysisResult::Chromatic(r)) => {
                Advice::text(chromatic::advise(r))
            }
            (AdviceStrategy::TechnicalQuality, AnalysisResult::Quality(r)) => quality::advise(r),
            (AdviceStrategy::Object, AnalysisResult::Object { detection }) => {
                object::advise(detection, reference)
            }
            (AdviceStrategy::Scene, AnalysisResult::Scene { predictions }) => {
                labels::advise_scene(predictions, &reference.scene_advice)
            }
            (AdviceStrategy::Genre, AnalysisResult::Genre { predictions }) => {
                labels::advise_genre(predictions, &reference.genre_advice)
            }
            _ => return None,
        };
        Some(advice)
    }
}

/// Valid sub-category keys for a category.
pub fn sub_options(category: AdviceCategory, catalog: &ContentCatalog) -> Vec<String> {
    match category {
        AdviceCategory::AestheticScore => AestheticOption::ALL
            .iter()
            .map(|o| o.as_str().to_string())
            .collect(),
        AdviceCategory::GeneralAdvice => catalog.categories().into_iter().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn unavailable_tip(model: ModelType) -> &'static str {
    match model {
        ModelType::Aesthetic => "Strong images usually pair a clear subject with good light and an uncluttered background.",
        ModelType::Composition => "Try placing your subject on a thirds line and look for lines that lead into the frame.",
        ModelType::Chromatic => "Limit the palette to a few related colours, or pair complementary ones for impact.",
        ModelType::Quality => "Check focus, exposure and white balance before you shoot.",
        ModelType::Object => "Make the main subject obvious and give it room in the frame.",
        ModelType::Scene => "Shoot when the light suits the place, usually early or late in the day.",
        ModelType::Genre => "Study photographers whose work you admire and borrow one idea at a time.",
    }
}

/// Advice returned when a model cannot be built or reports failure.
pub fn degraded(category: AdviceCategory, sub_category: Option<String>, model: ModelType) -> AdviceResponse {
    let narrative = format!(
        "{} analysis is currently unavailable, so we could not assess this image. {}",
        capitalised(model.as_str()),
        unavailable_tip(model)
    );
    let mut fields = Map::new();
    fields.insert("degraded".into(), json!(true));
    fields.insert("model".into(), json!(model.as_str()));
    AdviceResponse::new(category, sub_category, narrative).with_fields(fields)
}

pub(crate) fn capitalised(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Shared, read-only collaborators of every strategy.
#[derive(Clone)]
pub struct AdviceServices {
    pub registry: Arc<ModelRegistry>,
    pub reference: Arc<ReferenceData>,
    pub content: Arc<ContentAdviceProvider>,
}

/// Request-scoped holder of the selected strategy.
pub struct AdviceContext {
    services: AdviceServices,
    strategy: Option<AdviceStrategy>,
}

impl AdviceContext {
    pub fn new(services: AdviceServices) -> Self {
        Self {
            services,
            strategy: None,
        }
    }

    pub fn with_strategy(mut self, strategy: AdviceStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn set_strategy(&mut self, strategy: AdviceStrategy) {
        self.strategy = Some(strategy);
    }

    pub fn strategy(&self) -> Option<&AdviceStrategy> {
        self.strategy.as_ref()
    }

    pub async fn execute(&self, image: Option<SharedImage>) -> Result<AdviceResponse, AdviceError> {
        let strategy = self
            .strategy
            .as_ref()
            .ok_or_else(|| AdviceError::InvalidCategory("no advice category selected".to_string()))?;
        debug!("Executing {:?} strategy", strategy);

        let model_type = match (strategy, strategy.model_type()) {
            (AdviceStrategy::Content { category, sub_topic }, _) => {
                return self.content_advice(category.as_deref(), sub_topic.as_deref());
            }
            (_, Some(model_type)) => model_type,
            (_, None) => return Err(AdviceError::InvalidCategory(strategy.category().to_string())),
        };

        let image = image.ok_or_else(|| {
            AdviceError::Validation(format!("an image is required for {}", strategy.category()))
        })?;

        let category = strategy.category();
        let model = match self.services.registry.resolve_type(model_type).await {
            Ok(model) => model,
            Err(e) => {
                warn!("Cannot use {} model: {}", model_type, e);
                return Ok(degraded(category, strategy.sub_category(), model_type));
            }
        };

        let result = model.predict(image).await;
        if let AnalysisResult::Unavailable { reason, .. } = &result {
            warn!("{} analysis unavailable: {}", model_type, reason);
            return Ok(degraded(category, strategy.sub_category(), model_type));
        }

        match strategy.render(&result, &self.services.reference) {
            Some(advice) => {
                let response = AdviceResponse::new(category, strategy.sub_category(), advice.narrative);
                Ok(match advice.fields {
                    Some(fields) => response.with_fields(fields),
                    None => response,
                })
            }
            None => {
                error!("{} model returned a {} result", model_type, result.model_type());
                Ok(degraded(category, strategy.sub_category(), model_type))
            }
        }
    }

    fn content_advice(
        &self,
        category: Option<&str>,
        sub_topic: Option<&str>,
    ) -> Result<AdviceResponse, AdviceError> {
        let selection = self.services.content.get(category, sub_topic)?;
        let narrative = format!("{}: {}", selection.entry.title, selection.entry.description.join(" "));
        let fields = match serde_json::to_value(&selection) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) | Err(_) => Map::new(),
        };
        Ok(AdviceResponse::new(
            AdviceCategory::GeneralAdvice,
            Some(selection.category.clone()),
            narrative,
        )
        .with_fields(fields))
    }
}
