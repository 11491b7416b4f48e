// src/handlers.rs
use crate::advice::{AdviceContext, AdviceStrategy, sub_options};
use crate::{AppState, errors::AdviceError, models::*};
use actix_multipart::{Field, Multipart};
use actix_web::{Error, HttpResponse, web};
use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use log::{debug, info};
use serde::Deserialize;

const MAX_TEXT_FIELD_BYTES: usize = 4096;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/advice")
            .route("", web::post().to(request_advice))
            .route("/options", web::get().to(advice_options))
            .route("/sub_options", web::get().to(advice_sub_options))
            .route("/general", web::post().to(general_advice)),
    )
    .route("/health", web::get().to(health_check));
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn advice_options() -> HttpResponse {
    let options: Vec<&str> = AdviceCategory::ALL.iter().map(|c| c.as_str()).collect();
    HttpResponse::Ok().json(serde_json::json!({ "options": options }))
}

#[derive(Debug, Deserialize)]
pub struct SubOptionsQuery {
    #[serde(default, alias = "main_choice")]
    pub category: Option<String>,
}

/// Unknown or missing categories have no sub-options.
pub async fn advice_sub_options(
    query: web::Query<SubOptionsQuery>,
    data: web::Data<AppState>,
) -> HttpResponse {
    let options = query
        .category
        .as_deref()
        .and_then(|c| c.parse::<AdviceCategory>().ok())
        .map(|category| sub_options(category, data.advice.content.catalog()))
        .unwrap_or_default();

    HttpResponse::Ok().json(serde_json::json!({ "sub_options": options }))
}

/// Multipart form accepted by `POST /advice`.
#[derive(Debug, Default)]
struct AdviceForm {
    category: Option<String>,
    sub_category: Option<String>,
    sub_topic: Option<String>,
    image: Option<Bytes>,
    image_url: Option<String>,
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Bytes, Error> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field.try_next().await? {
        if buffer.len() + chunk.len() > limit {
            return Err(AdviceError::Validation(format!("field exceeds the {} byte limit", limit)).into());
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

async fn read_text(field: &mut Field) -> Result<String, Error> {
    let raw = read_field(field, MAX_TEXT_FIELD_BYTES).await?;
    let text = String::from_utf8(raw.to_vec())
        .map_err(|_| AdviceError::Validation("form field is not valid UTF-8".to_string()))?;
    Ok(text.trim().to_string())
}

async fn read_form(mut payload: Multipart, max_image_bytes: usize) -> Result<AdviceForm, Error> {
    let mut form = AdviceForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        match name.as_str() {
            "category" | "choice" => form.category = Some(read_text(&mut field).await?),
            "sub_category" | "sub_choice" | "subCategory" => form.sub_category = Some(read_text(&mut field).await?),
            "sub_topic" | "sub_sub_topic" | "subTopic" => form.sub_topic = Some(read_text(&mut field).await?),
            "image_url" | "imageUrl" => form.image_url = Some(read_text(&mut field).await?),
            "image" | "file" => form.image = Some(read_field(&mut field, max_image_bytes).await?),
            other => {
                debug!("Ignoring form field '{}'", other);
                read_field(&mut field, max_image_bytes).await?;
            }
        }
    }

    Ok(form)
}

pub async fn request_advice(payload: Multipart, data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let form = read_form(payload, data.image_processor.max_bytes()).await?;

    // Reject unknown categories before touching the image.
    let category: AdviceCategory = form
        .category
        .as_deref()
        .ok_or_else(|| AdviceError::InvalidCategory("no category given".to_string()))?
        .parse()?;
    let mut request = AdviceRequest {
        category,
        sub_category: form.sub_category.clone(),
        sub_topic: form.sub_topic.clone(),
        image: None,
    };
    let strategy = AdviceStrategy::for_request(&request)?;

    if category.requires_image() {
        request.image = Some(load_image(&form, &data).await?);
    }

    let response = AdviceContext::new(data.advice.clone())
        .with_strategy(strategy)
        .execute(request.image)
        .await?;

    info!(
        "Advice {} served: {}/{}{}",
        response.request_id,
        response.category,
        response.sub_category.as_deref().unwrap_or("-"),
        if response.is_degraded() { " (degraded)" } else { "" }
    );

    Ok(HttpResponse::Ok().json(&response))
}

async fn load_image(form: &AdviceForm, data: &web::Data<AppState>) -> Result<SharedImage, Error> {
    if let Some(bytes) = form.image.clone().filter(|b| !b.is_empty()) {
        let processor = data.image_processor.clone();
        let decoded = web::block(move || processor.decode(&bytes))
            .await
            .map_err(|e| AdviceError::ImageDecode(format!("decoder worker failed: {}", e)))??;
        return Ok(decoded);
    }

    match form.image_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => Ok(data.image_processor.load_url(url).await?),
        None => Err(AdviceError::Validation("an image file or image_url is required".to_string()).into()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GeneralAdviceRequest {
    #[serde(default, alias = "subCategory")]
    pub sub_category: Option<String>,
    #[serde(default, alias = "subSubTopic", alias = "sub_topic")]
    pub sub_sub_topic: Option<String>,
}

pub async fn general_advice(
    body: web::Json<GeneralAdviceRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let selection = data
        .advice
        .content
        .get(body.sub_category.as_deref(), body.sub_sub_topic.as_deref())?;
    Ok(HttpResponse::Ok().json(&selection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::AdviceServices;
    use crate::catalog::{ContentAdviceProvider, ContentCatalog, ReferenceData};
    use crate::services::{DefaultModelFactory, ImageProcessor, ModelRegistry};
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use serde_json::{Value, json};
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    const BOUNDARY: &str = "----advice-test-boundary";

    fn state() -> AppState {
        let catalog = Arc::new(ContentCatalog::embedded().unwrap());
        AppState {
            advice: AdviceServices {
                registry: Arc::new(ModelRegistry::new(Arc::new(DefaultModelFactory::new(None)))),
                reference: Arc::new(ReferenceData::embedded().unwrap()),
                content: Arc::new(ContentAdviceProvider::with_seed(catalog, 1)),
            },
            image_processor: Arc::new(ImageProcessor::new(1 << 20, 256, Duration::from_secs(1)).unwrap()),
        }
    }

    fn black_png() -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(40, 30))
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    /// Builds a multipart body from text fields and an optional file.
    fn multipart(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n",
                    BOUNDARY, name
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn advice_request(body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/advice")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn test_options() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/advice/options").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["options"].as_array().unwrap().len(), 6);
        assert_eq!(body["options"][0], "aesthetic_score");

        let req = test::TestRequest::get()
            .uri("/advice/sub_options?main_choice=aesthetic_score")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["sub_options"], json!(["composition", "chromatic", "general"]));

        let req = test::TestRequest::get()
            .uri("/advice/sub_options?category=scene_advice")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["sub_options"], json!([]));
    }

    #[actix_web::test]
    async fn test_invalid_category_is_bad_request() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let png = black_png();
        let req = advice_request(multipart(&[("choice", "portrait_magic")], Some(("file", &png)))).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_technical_quality_on_black_image() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let png = black_png();
        let req = advice_request(multipart(&[("choice", "technical_quality")], Some(("file", &png)))).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["advice_type"], "technical_quality");
        assert_eq!(body["result"]["brightness"]["rating"], "too dark");
        assert!(body["request_id"].is_string());
    }

    #[actix_web::test]
    async fn test_undecodable_image_is_bad_request() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = advice_request(multipart(
            &[("category", "aesthetic_score"), ("sub_category", "chromatic")],
            Some(("image", b"not an image")),
        )).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_missing_image_is_bad_request() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = advice_request(multipart(&[("choice", "scene_advice")], None)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_general_advice() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/advice/general")
            .set_json(json!({"subCategory": "lighting", "subSubTopic": "golden_hour"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["title"], "Golden Hour");
        assert!(body["details"].as_array().is_some_and(|d| !d.is_empty()));

        let req = test::TestRequest::post()
            .uri("/advice/general")
            .set_json(json!({"sub_category": "lighting", "sub_sub_topic": "strobes"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_general_advice_subtopic_needs_category() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        for _ in 0..10 {
            let req = test::TestRequest::post()
                .uri("/advice/general")
                .set_json(json!({"subSubTopic": "golden_hour"}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn test_form_accepts_camel_case_sub_category() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = advice_request(multipart(
            &[("category", "general_advice"), ("subCategory", "lighting"), ("subTopic", "golden_hour")],
            None,
        ))
        .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["sub_advice_type"], "lighting");
        assert_eq!(body["result"]["title"], "Golden Hour");
    }

    #[actix_web::test]
    async fn test_general_advice_via_form_needs_no_image() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = advice_request(multipart(&[("choice", "general_advice"), ("sub_choice", "genres")], None)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["advice_type"], "general_advice");
        assert_eq!(body["sub_advice_type"], "genres");
        assert!(body["result"]["title"].is_string());
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }
}
