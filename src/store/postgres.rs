// src/store/postgres.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use super::QuestionStore;
use crate::{
    error::AppError,
    models::question::{NewQuestion, Question, QuestionRow},
};

/// Question store backed by the Postgres `questions` table.
#[derive(Debug, Clone)]
pub struct PgQuestionStore {
    pool: PgPool,
}

impl PgQuestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionStore for PgQuestionStore {
    async fn list(&self) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, question, options, answer, image_url, created_at, updated_at
            FROM questions
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list questions: {:?}", e);
            AppError::from(e)
        })?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn insert(&self, question: NewQuestion) -> Result<Question, AppError> {
        let answer = i32::try_from(question.answer)
            .map_err(|_| AppError::Validation("answer index is too large".to_string()))?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            INSERT INTO questions (id, question, options, answer, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, question, options, answer, image_url, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question.question)
        .bind(Json(question.options))
        .bind(answer)
        .bind(question.image_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create question: {:?}", e);
            AppError::from(e)
        })?;

        Question::try_from(row)
    }
}
