// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::question::{CreateQuestionRequest, Question},
    services::{
        images::{ImageHost, ImageUpload},
        questions::QuestionService,
    },
};

/// Response body of a successful image upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

/// Creates a new quiz question.
/// Admin only.
#[utoipa::path(
    post,
    path = "/api/admin/questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 200, description = "Question created", body = Question),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Rejected by the access gate"),
        (status = 500, description = "Question store unavailable")
    ),
    tag = "admin"
)]
pub async fn create_question(
    State(service): State<QuestionService>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> Result<Json<Question>, AppError> {
    let Json(request) = payload?;

    let question = service.create_question(request).await.map_err(|e| {
        if let AppError::Validation(msg) = &e {
            tracing::info!("Rejected question: {}", msg);
        }
        e
    })?;

    Ok(Json(question))
}

/// Lists questions in store order, for the admin overview.
/// Admin only.
#[utoipa::path(
    get,
    path = "/api/admin/questions",
    responses(
        (status = 200, description = "All questions in creation order", body = [Question]),
        (status = 403, description = "Rejected by the access gate"),
        (status = 500, description = "Question store unavailable")
    ),
    tag = "admin"
)]
pub async fn list_all_questions(
    State(service): State<QuestionService>,
) -> Result<Json<Vec<Question>>, AppError> {
    Ok(Json(service.list_questions(false).await?))
}

/// Accepts exactly one image file and returns the URL it is served from.
/// Admin only.
#[utoipa::path(
    post,
    path = "/api/admin/uploads",
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing, extra or non-image file"),
        (status = 403, description = "Rejected by the access gate"),
        (status = 413, description = "Image too large")
    ),
    tag = "admin"
)]
pub async fn upload_image(
    State(images): State<Arc<dyn ImageHost>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<ImageUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        // Plain form fields carry neither a file name nor a content type.
        if field.file_name().is_none() && field.content_type().is_none() {
            continue;
        }
        if upload.is_some() {
            return Err(AppError::Upload(
                "only one image can be uploaded at a time".to_string(),
            ));
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string).unwrap_or_default();
        let bytes = field.bytes().await?;

        upload = Some(ImageUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    let upload = upload.ok_or_else(|| AppError::Upload("no image was uploaded".to_string()))?;
    let url = images.store(upload).await?;

    Ok(Json(UploadResponse { url }))
}
