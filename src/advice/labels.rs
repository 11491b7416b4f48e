// src/advice/labels.rs
// Scene and genre advice: top-1 label looked up in a curated table.
use super::Advice;
use crate::catalog::LabelAdviceMap;
use crate::models::LabelPrediction;
use serde_json::{Map, json};

pub fn advise_scene(predictions: &[LabelPrediction], tips: &LabelAdviceMap) -> Advice {
    advise_top(predictions, tips, "scene")
}

pub fn advise_genre(predictions: &[LabelPrediction], tips: &LabelAdviceMap) -> Advice {
    advise_top(predictions, tips, "genre")
}

fn advise_top(predictions: &[LabelPrediction], tips: &LabelAdviceMap, kind: &str) -> Advice {
    let Some(top) = predictions.first() else {
        return Advice::text(format!("The {} of this image could not be determined.", kind));
    };

    let tip = tips.get(&top.label);
    let narrative = match tip {
        Some(tip) => format!(
            "Detected {}: {} ({:.2}% confidence). {}",
            kind, top.label, top.confidence, tip
        ),
        None => format!(
            "Detected {}: {} ({:.2}% confidence). No advice available for this {} yet.",
            kind, top.label, top.confidence, kind
        ),
    };

    let mut fields = Map::new();
    fields.insert(kind.to_string(), json!(top.label));
    fields.insert("confidence".into(), json!(top.confidence));
    fields.insert("advice_available".into(), json!(tip.is_some()));
    Advice::structured(narrative, fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tips() -> LabelAdviceMap {
        [("Beach".to_string(), "Keep the horizon level.".to_string())]
            .into_iter()
            .collect()
    }

    fn prediction(label: &str, confidence: f64) -> LabelPrediction {
        LabelPrediction {
            class_id: None,
            label: label.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_top_label_matches_case_insensitively() {
        let advice = advise_scene(&[prediction("beach", 88.1), prediction("coast", 5.0)], &tips());
        assert_eq!(
            advice.narrative,
            "Detected scene: beach (88.10% confidence). Keep the horizon level."
        );
        assert_eq!(advice.fields.unwrap()["advice_available"], true);
    }

    #[test]
    fn test_miss_still_reports_label_and_confidence() {
        let advice = advise_genre(&[prediction("astrophotography", 42.5)], &tips());
        assert!(advice.narrative.contains("astrophotography (42.50% confidence)"));
        assert!(advice.narrative.contains("No advice available"));
        let fields = advice.fields.unwrap();
        assert_eq!(fields["genre"], "astrophotography");
        assert_eq!(fields["advice_available"], false);
    }

    #[test]
    fn test_empty_predictions() {
        let advice = advise_scene(&[], &tips());
        assert!(advice.fields.is_none());
    }
}
