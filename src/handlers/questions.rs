// src/handlers/questions.rs

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    error::AppError,
    models::question::{ListQuestionsParams, Question},
    services::questions::QuestionService,
};

/// Lists every question for the quiz page.
///
/// Shuffled by default; pass `randomize=false` for store order.
#[utoipa::path(
    get,
    path = "/api/questions",
    params(ListQuestionsParams),
    responses(
        (status = 200, description = "All questions", body = [Question]),
        (status = 500, description = "Question store unavailable")
    ),
    tag = "questions"
)]
pub async fn list_questions(
    State(service): State<QuestionService>,
    Query(params): Query<ListQuestionsParams>,
) -> Result<Json<Vec<Question>>, AppError> {
    let questions = service
        .list_questions(params.randomize.unwrap_or(true))
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions: {}", e);
            e
        })?;

    Ok(Json(questions))
}
