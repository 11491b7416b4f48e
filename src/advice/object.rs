// src/advice/object.rs
use super::Advice;
use crate::catalog::{FALLBACK_OBJECT_CATEGORY, ReferenceData};
use crate::models::{HumanDetection, LabelPrediction, ObjectDetection};
use serde_json::{Map, Value, json};

const GENERIC_OBJECT_TIP: &str =
    "Simplify the frame around your subject and use directional light to show its shape.";
const DEFAULT_EMOTION_TIP: &str =
    "Keep the session relaxed and shoot in bursts to catch genuine expressions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    Child,
    Adult,
    Elderly,
}

impl AgeGroup {
    pub fn for_age(age: f64) -> Self {
        if age < 13.0 {
            AgeGroup::Child
        } else if age > 60.0 {
            AgeGroup::Elderly
        } else {
            AgeGroup::Adult
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Child => "child",
            AgeGroup::Adult => "adult",
            AgeGroup::Elderly => "elderly",
        }
    }

    fn tip(&self) -> &'static str {
        match self {
            AgeGroup::Child => {
                "Get down to the child's eye level, keep it playful and use a fast shutter speed for quick movements."
            }
            AgeGroup::Adult => {
                "Direct with simple prompts, focus on the eyes and pick a background that reflects their personality."
            }
            AgeGroup::Elderly => {
                "Soft side light brings out character and texture; let their stories guide natural expressions."
            }
        }
    }
}

/// Tip for a detected emotion, matched after lower-casing.
pub fn emotion_tip(emotion: &str) -> Option<&'static str> {
    let tip = match emotion.trim().to_lowercase().as_str() {
        "happy" => "Capture the smile at its peak and keep shooting, as the laugh after the smile is often the best frame.",
        "sad" => "Use soft, low-key light and give the subject space in the frame to convey the mood.",
        "angry" => "Hard light and a tighter crop add intensity; keep the eyes sharp.",
        "surprise" => "Shoot in bursts so you catch the moment of surprise rather than the aftermath.",
        "fear" => "Low-key lighting and a slightly high angle reinforce a sense of vulnerability.",
        "disgust" => "A close crop on the face makes the expression read clearly.",
        "neutral" => "A neutral expression suits classic portraits; try prompting a small smile or a look away for variety.",
        _ => return None,
    };
    Some(tip)
}

pub fn advise(detection: &ObjectDetection, reference: &ReferenceData) -> Advice {
    match detection {
        ObjectDetection::Human(human) => advise_human(human),
        ObjectDetection::Labels { predictions } => advise_labels(predictions, reference),
    }
}

fn advise_human(human: &HumanDetection) -> Advice {
    let group = AgeGroup::for_age(human.age);
    let emotion = human.emotion.to_lowercase();
    let emotion_advice = emotion_tip(&emotion).unwrap_or(DEFAULT_EMOTION_TIP);

    let mut description = format!("A person was detected, approximately {} years old", human.age);
    if !human.gender.is_empty() {
        description.push_str(&format!(" ({})", human.gender.to_lowercase()));
    }
    if !emotion.is_empty() {
        description.push_str(&format!(", appearing {}", emotion));
    }

    let narrative = format!("{}. {} {}", description, group.tip(), emotion_advice);

    let mut fields = Map::new();
    fields.insert("subject".into(), json!("human"));
    fields.insert("age".into(), json!(human.age));
    fields.insert("age_group".into(), json!(group.as_str()));
    fields.insert("gender".into(), json!(human.gender));
    fields.insert("emotion".into(), json!(emotion));
    Advice::structured(narrative, fields)
}

fn advise_labels(predictions: &[LabelPrediction], reference: &ReferenceData) -> Advice {
    let Some(top) = predictions.first() else {
        return Advice::text(format!(
            "No objects could be recognised in this image. {}",
            GENERIC_OBJECT_TIP
        ));
    };

    let category = top
        .class_id
        .map_or(FALLBACK_OBJECT_CATEGORY, |id| reference.category_for_class(id));
    let tip = reference.tip_for_category(category).unwrap_or(GENERIC_OBJECT_TIP);

    let narrative = format!(
        "The main subject looks like a {} ({:.2}% confidence). {}",
        top.label, top.confidence, tip
    );

    let mut fields = Map::new();
    fields.insert("subject".into(), json!(top.label));
    fields.insert("confidence".into(), json!(top.confidence));
    fields.insert("category".into(), json!(category));
    fields.insert(
        "predictions".into(),
        serde_json::to_value(predictions).unwrap_or(Value::Null),
    );
    Advice::structured(narrative, fields)
}
