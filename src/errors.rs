// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("Invalid advice category: {0}")]
    InvalidCategory(String),

    #[error("Invalid sub-category '{sub_category}' for category '{category}'")]
    InvalidSubCategory {
        category: String,
        sub_category: String,
    },

    #[error("No model found for type: {0}")]
    UnknownModelType(String),

    #[error("Model '{model}' unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    #[error("Content category not found: {0}")]
    CategoryNotFound(String),

    #[error("Subtopic '{sub_topic}' not found in category '{category}'")]
    SubtopicNotFound { category: String, sub_topic: String },

    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    #[error("Image fetch error: {0}")]
    ImageFetch(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl AdviceError {
    pub fn model_unavailable(model: impl Into<String>, reason: impl ToString) -> Self {
        AdviceError::ModelUnavailable {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}

impl ResponseError for AdviceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AdviceError::InvalidCategory(_) | AdviceError::InvalidSubCategory { .. } => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Invalid advice choice",
                    "message": self.to_string()
                }))
            }
            AdviceError::CategoryNotFound(_) | AdviceError::SubtopicNotFound { .. } => {
                HttpResponse::NotFound().json(serde_json::json!({
                    "error": "Content not found",
                    "message": self.to_string()
                }))
            }
            AdviceError::ImageDecode(_) | AdviceError::ImageFetch(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Image processing error",
                    "message": self.to_string()
                }))
            }
            AdviceError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation error",
                "message": self.to_string()
            })),
            AdviceError::ModelUnavailable { .. } => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "Analysis service error",
                    "message": self.to_string()
                }))
            }
            AdviceError::UnknownModelType(_) | AdviceError::Catalog(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal error",
                    "message": self.to_string()
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        let errors = [
            AdviceError::InvalidCategory("nope".to_string()),
            AdviceError::ImageDecode("truncated".to_string()),
            AdviceError::Validation("image is required".to_string()),
        ];
        for err in errors {
            assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST, "{err}");
        }
    }

    #[test]
    fn test_lookup_misses_map_to_not_found() {
        let err = AdviceError::SubtopicNotFound {
            category: "lighting".to_string(),
            sub_topic: "moonbeams".to_string(),
        };
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("moonbeams"));
    }
}
