// src/catalog/content.rs
use crate::errors::AdviceError;
use crate::models::ContentEntry;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

const CONTENT_CATALOG_JSON: &str = include_str!("../../data/content_catalog.json");

/// Curated tips keyed by category, then subtopic. Never mutated after load.
#[derive(Debug, Clone)]
pub struct ContentCatalog {
    categories: BTreeMap<String, BTreeMap<String, ContentEntry>>,
}

/// One catalog entry together with the keys it was found under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentSelection {
    pub category: String,
    pub sub_topic: String,
    #[serde(flatten)]
    pub entry: ContentEntry,
}

impl ContentCatalog {
    pub fn embedded() -> Result<Self, AdviceError> {
        Self::from_json(CONTENT_CATALOG_JSON)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AdviceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AdviceError::Catalog(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    /// The file at `path` when given, the embedded catalog otherwise.
    pub fn load(path: Option<&str>) -> Result<Self, AdviceError> {
        let catalog = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::embedded()?,
        };
        info!(
            "Content catalog ready: {} categories from {}",
            catalog.categories.len(),
            path.unwrap_or("embedded data")
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, AdviceError> {
        let loaded: BTreeMap<String, BTreeMap<String, ContentEntry>> =
            serde_json::from_str(raw).map_err(|e| AdviceError::Catalog(e.to_string()))?;
        if loaded.is_empty() {
            return Err(AdviceError::Catalog("catalog has no categories".to_string()));
        }

        // Keys are stored in lookup form so every listed key can be requested back.
        let mut categories = BTreeMap::new();
        for (name, topics) in loaded {
            // Random fallback needs at least one subtopic to pick from.
            if topics.is_empty() {
                return Err(AdviceError::Catalog(format!("category '{}' has no subtopics", name)));
            }
            let mut normalised = BTreeMap::new();
            for (topic, entry) in topics {
                let key = checked_key(&topic)?;
                if normalised.insert(key, entry).is_some() {
                    return Err(AdviceError::Catalog(format!(
                        "subtopic '{}' in category '{}' collides with another key",
                        topic, name
                    )));
                }
            }
            if categories.insert(checked_key(&name)?, normalised).is_some() {
                return Err(AdviceError::Catalog(format!(
                    "category '{}' collides with another key",
                    name
                )));
            }
        }
        Ok(Self { categories })
    }

    pub fn categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    pub fn sub_topics(&self, category: &str) -> Option<Vec<&str>> {
        self.categories
            .get(&normalise_key(category))
            .map(|topics| topics.keys().map(String::as_str).collect())
    }

    /// Looks up an entry. An omitted (or blank) key is chosen uniformly at
    /// random with `rng`; an explicit key that is missing is an error. A
    /// subtopic without its category is rejected rather than looked up in a
    /// randomly chosen one.
    pub fn select<R: Rng + ?Sized>(
        &self,
        category: Option<&str>,
        sub_topic: Option<&str>,
        rng: &mut R,
    ) -> Result<ContentSelection, AdviceError> {
        let category = given(category);
        let sub_topic = given(sub_topic);
        if let (None, Some(topic)) = (&category, &sub_topic) {
            return Err(AdviceError::Validation(format!(
                "sub_topic '{}' requires a category",
                topic
            )));
        }

        let (category_key, topics) = match category {
            Some(key) => self
                .categories
                .get_key_value(&key)
                .ok_or(AdviceError::CategoryNotFound(key))?,
            None => {
                let keys: Vec<&String> = self.categories.keys().collect();
                let key = keys
                    .choose(&mut *rng)
                    .ok_or_else(|| AdviceError::Catalog("catalog has no categories".to_string()))?;
                (*key, &self.categories[*key])
            }
        };

        let (topic_key, entry) = match sub_topic {
            Some(key) => topics.get_key_value(&key).ok_or_else(|| AdviceError::SubtopicNotFound {
                category: category_key.clone(),
                sub_topic: key,
            })?,
            None => {
                let entries: Vec<(&String, &ContentEntry)> = topics.iter().collect();
                *entries.choose(&mut *rng).ok_or_else(|| {
                    AdviceError::Catalog(format!("category '{}' has no subtopics", category_key))
                })?
            }
        };

        Ok(ContentSelection {
            category: category_key.clone(),
            sub_topic: topic_key.clone(),
            entry: entry.clone(),
        })
    }
}

fn normalise_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn given(key: Option<&str>) -> Option<String> {
    key.map(normalise_key).filter(|k| !k.is_empty())
}

fn checked_key(raw: &str) -> Result<String, AdviceError> {
    given(Some(raw))
        .ok_or_else(|| AdviceError::Catalog("catalog keys must not be blank".to_string()))
}

/// Serves content advice with an injected, seedable random source so
/// fallback selection is reproducible in tests.
pub struct ContentAdviceProvider {
    catalog: Arc<ContentCatalog>,
    rng: Mutex<StdRng>,
}

impl ContentAdviceProvider {
    pub fn new(catalog: Arc<ContentCatalog>) -> Self {
        Self::with_rng(catalog, StdRng::from_entropy())
    }

    pub fn with_seed(catalog: Arc<ContentCatalog>, seed: u64) -> Self {
        Self::with_rng(catalog, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(catalog: Arc<ContentCatalog>, rng: StdRng) -> Self {
        Self {
            catalog,
            rng: Mutex::new(rng),
        }
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    pub fn get(
        &self,
        category: Option<&str>,
        sub_topic: Option<&str>,
    ) -> Result<ContentSelection, AdviceError> {
        // A panic elsewhere cannot leave the generator in a bad state.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let selection = self.catalog.select(category, sub_topic, &mut *rng)?;
        debug!(
            "Content advice {}/{} (requested {:?}/{:?})",
            selection.category, selection.sub_topic, category, sub_topic
        );
        Ok(selection)
    }
}
