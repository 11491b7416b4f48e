// src/catalog/mod.rs
// Read-only reference tables, loaded once at startup and shared by every
// request.
pub mod content;

pub use content::{ContentAdviceProvider, ContentCatalog, ContentSelection};

use crate::errors::AdviceError;
use log::info;
use serde::Deserialize;
use std::collections::HashMap;

const OBJECT_CATEGORIES_JSON: &str = include_str!("../../data/object_categories.json");
const CATEGORY_TIPS_JSON: &str = include_str!("../../data/category_tips.json");
const SCENE_ADVICE_JSON: &str = include_str!("../../data/scene_advice.json");
const GENRE_ADVICE_JSON: &str = include_str!("../../data/genre_advice.json");

/// Coarse category for ImageNet classes outside every range.
pub const FALLBACK_OBJECT_CATEGORY: &str = "object";

#[derive(Debug, Clone, Deserialize)]
struct ClassRange {
    from: u32,
    to: u32,
    category: String,
}

/// Label to tip lookup, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct LabelAdviceMap {
    tips: HashMap<String, String>,
}

impl LabelAdviceMap {
    pub fn from_json(name: &str, raw: &str) -> Result<Self, AdviceError> {
        let parsed: HashMap<String, String> = serde_json::from_str(raw)
            .map_err(|e| AdviceError::Catalog(format!("{}: {}", name, e)))?;
        Ok(parsed.into_iter().collect())
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.tips.get(&normalise_label(label)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
    }
}

impl FromIterator<(String, String)> for LabelAdviceMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            tips: iter
                .into_iter()
                .map(|(label, tip)| (normalise_label(&label), tip))
                .collect(),
        }
    }
}

fn normalise_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Static tables consulted by the object, scene and genre advice.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    object_ranges: Vec<ClassRange>,
    pub category_tips: LabelAdviceMap,
    pub scene_advice: LabelAdviceMap,
    pub genre_advice: LabelAdviceMap,
}

impl ReferenceData {
    /// Tables compiled into the binary.
    pub fn embedded() -> Result<Self, AdviceError> {
        Self::from_json(
            OBJECT_CATEGORIES_JSON,
            CATEGORY_TIPS_JSON,
            SCENE_ADVICE_JSON,
            GENRE_ADVICE_JSON,
        )
    }

    pub fn from_json(
        object_categories: &str,
        category_tips: &str,
        scene_advice: &str,
        genre_advice: &str,
    ) -> Result<Self, AdviceError> {
        let mut object_ranges: Vec<ClassRange> = serde_json::from_str(object_categories)
            .map_err(|e| AdviceError::Catalog(format!("object categories: {}", e)))?;
        if let Some(bad) = object_ranges.iter().find(|r| r.from > r.to) {
            return Err(AdviceError::Catalog(format!(
                "object categories: empty range {}..{} for '{}'",
                bad.from, bad.to, bad.category
            )));
        }
        object_ranges.sort_by_key(|r| r.from);

        let data = Self {
            object_ranges,
            category_tips: LabelAdviceMap::from_json("category tips", category_tips)?,
            scene_advice: LabelAdviceMap::from_json("scene advice", scene_advice)?,
            genre_advice: LabelAdviceMap::from_json("genre advice", genre_advice)?,
        };
        info!(
            "Loaded reference data: {} class ranges, {} category tips, {} scene tips, {} genre tips",
            data.object_ranges.len(),
            data.category_tips.len(),
            data.scene_advice.len(),
            data.genre_advice.len()
        );
        Ok(data)
    }

    /// Coarse category for an ImageNet class id.
    pub fn category_for_class(&self, class_id: u32) -> &str {
        self.object_ranges
            .iter()
            .find(|r| (r.from..=r.to).contains(&class_id))
            .map_or(FALLBACK_OBJECT_CATEGORY, |r| r.category.as_str())
    }

    pub fn tip_for_category(&self, category: &str) -> Option<&str> {
        self.category_tips.get(category)
    }
}
