// src/services/registry.rs
use crate::analysis::{
    AestheticModel, AnalysisModel, ChromaticModel, CompositionModel, GenreModel, ObjectModel,
    SceneModel, TechnicalQualityModel,
};
use crate::errors::AdviceError;
use crate::models::ModelType;
use crate::services::predictor::Predictor;
use async_trait::async_trait;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Builds analysis models. Construction may be expensive, so the registry
/// calls it at most once per model type.
#[async_trait]
pub trait ModelFactory: Send + Sync {
    async fn build(&self, model_type: ModelType) -> Result<Arc<dyn AnalysisModel>, AdviceError>;
}

pub struct DefaultModelFactory {
    predictor: Option<Arc<dyn Predictor>>,
}

impl DefaultModelFactory {
    pub fn new(predictor: Option<Arc<dyn Predictor>>) -> Self {
        Self { predictor }
    }

    fn predictor_for(&self, model_type: ModelType) -> Result<Arc<dyn Predictor>, AdviceError> {
        self.predictor.clone().ok_or_else(|| {
            AdviceError::model_unavailable(model_type.as_str(), "no predictor back-end configured")
        })
    }
}

#[async_trait]
impl ModelFactory for DefaultModelFactory {
    async fn build(&self, model_type: ModelType) -> Result<Arc<dyn AnalysisModel>, AdviceError> {
        let model: Arc<dyn AnalysisModel> = match model_type {
            ModelType::Chromatic => Arc::new(ChromaticModel::new()),
            ModelType::Quality => Arc::new(TechnicalQualityModel::new()),
            ModelType::Composition => Arc::new(CompositionModel::new(self.predictor_for(model_type)?)),
            ModelType::Aesthetic => Arc::new(AestheticModel::new(self.predictor_for(model_type)?)),
            ModelType::Object => Arc::new(ObjectModel::new(self.predictor_for(model_type)?)),
            ModelType::Scene => Arc::new(SceneModel::new(self.predictor_for(model_type)?)),
            ModelType::Genre => Arc::new(GenreModel::new(self.predictor_for(model_type)?)),
        };
        Ok(model)
    }
}

/// Maps model-type keys to shared model instances, constructing each one
/// exactly once even under concurrent first use.
pub struct ModelRegistry {
    factory: Arc<dyn ModelFactory>,
    slots: HashMap<ModelType, OnceCell<Arc<dyn AnalysisModel>>>,
}

impl ModelRegistry {
    pub fn new(factory: Arc<dyn ModelFactory>) -> Self {
        let slots = ModelType::ALL
            .into_iter()
            .map(|model_type| (model_type, OnceCell::new()))
            .collect();
        Self { factory, slots }
    }

    pub async fn resolve(&self, model_type: &str) -> Result<Arc<dyn AnalysisModel>, AdviceError> {
        self.resolve_type(model_type.parse()?).await
    }

    pub async fn resolve_type(&self, model_type: ModelType) -> Result<Arc<dyn AnalysisModel>, AdviceError> {
        let slot = self
            .slots
            .get(&model_type)
            .ok_or_else(|| AdviceError::UnknownModelType(model_type.to_string()))?;

        // A failed build leaves the cell empty so a later call can retry.
        let model = slot
            .get_or_try_init(|| async {
                info!("Constructing {} model", model_type);
                self.factory.build(model_type).await
            })
            .await?;
        Ok(Arc::clone(model))
    }

    /// Builds every model up front. Failures are logged, not fatal: the
    /// affected advice degrades until the model can be built.
    pub async fn initialize_all(&self) -> usize {
        let mut ready = 0;
        for model_type in ModelType::ALL {
            match self.resolve_type(model_type).await {
                Ok(_) => ready += 1,
                Err(e) => warn!("Model {} not ready at startup: {}", model_type, e),
            }
        }
        info!("ModelRegistry initialised {}/{} models", ready, ModelType::ALL.len());
        ready
    }

    pub fn is_ready(&self, model_type: ModelType) -> bool {
        self.slots
            .get(&model_type)
            .is_some_and(|slot| slot.initialized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, SharedImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::task::JoinSet;

    struct NullModel(ModelType);

    #[async_trait]
    impl AnalysisModel for NullModel {
        fn model_type(&self) -> ModelType {
            self.0
        }

        async fn predict(&self, _image: SharedImage) -> AnalysisResult {
            AnalysisResult::unavailable(self.0, "null model")
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        builds: AtomicUsize,
    }

    #[async_trait]
    impl ModelFactory for CountingFactory {
        async fn build(&self, model_type: ModelType) -> Result<Arc<dyn AnalysisModel>, AdviceError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            // Widen the window in which concurrent callers overlap.
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Arc::new(NullModel(model_type)))
        }
    }

    #[tokio::test]
    async fn test_unknown_model_type() {
        let registry = ModelRegistry::new(Arc::new(CountingFactory::default()));
        let err = registry.resolve("depth").await.err().unwrap();
        assert!(matches!(err, AdviceError::UnknownModelType(ref key) if key == "depth"));
    }

    #[tokio::test]
    async fn test_concurrent_resolve_builds_once() {
        let factory = Arc::new(CountingFactory::default());
        let registry = Arc::new(ModelRegistry::new(factory.clone()));

        let mut join_set = JoinSet::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            join_set.spawn(async move { registry.resolve("scene").await.unwrap() });
        }

        let mut models = Vec::new();
        while let Some(result) = join_set.join_next().await {
            models.push(result.expect("task panicked"));
        }

        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
        assert!(models.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(models[0].model_type(), ModelType::Scene);
        assert!(registry.is_ready(ModelType::Scene));
        assert!(!registry.is_ready(ModelType::Genre));
    }

    #[tokio::test]
    async fn test_default_factory_without_predictor() {
        let registry = ModelRegistry::new(Arc::new(DefaultModelFactory::new(None)));
        // Local analysers only.
        assert_eq!(registry.initialize_all().await, 2);
        assert!(registry.is_ready(ModelType::Chromatic));
        assert!(registry.is_ready(ModelType::Quality));

        let err = registry.resolve("aesthetic").await.err().unwrap();
        assert!(matches!(err, AdviceError::ModelUnavailable { .. }));
        assert!(!registry.is_ready(ModelType::Aesthetic));
    }
}
