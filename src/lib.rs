// src/lib.rs
pub mod advice;
pub mod analysis;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

use crate::advice::AdviceServices;
use crate::catalog::{ContentAdviceProvider, ContentCatalog, ReferenceData};
use crate::config::AppConfig;
use crate::errors::AdviceError;
use crate::services::{DefaultModelFactory, HttpPredictor, ImageProcessor, ModelRegistry, Predictor};
use log::{info, warn};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub advice: AdviceServices,
    pub image_processor: Arc<ImageProcessor>,
}

impl AppState {
    /// Loads reference data and builds every model before the server
    /// accepts requests.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AdviceError> {
        let predictor: Option<Arc<dyn Predictor>> = match &config.predictor_url {
            Some(url) => {
                info!("Using predictor back-end at {}", url);
                Some(Arc::new(HttpPredictor::new(url.as_str(), config.predictor_timeout())?))
            }
            None => {
                warn!("PREDICTOR_URL not set; aesthetic, composition, object, scene and genre advice will be degraded");
                None
            }
        };

        let registry = Arc::new(ModelRegistry::new(Arc::new(DefaultModelFactory::new(predictor))));
        registry.initialize_all().await;

        let catalog = Arc::new(ContentCatalog::load(config.content_catalog_path.as_deref())?);
        let content = match config.content_seed {
            Some(seed) => ContentAdviceProvider::with_seed(catalog, seed),
            None => ContentAdviceProvider::new(catalog),
        };

        Ok(Self {
            advice: AdviceServices {
                registry,
                reference: Arc::new(ReferenceData::embedded()?),
                content: Arc::new(content),
            },
            image_processor: Arc::new(ImageProcessor::from_config(config)?),
        })
    }
}
