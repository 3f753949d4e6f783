// src/store/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::QuestionStore;
use crate::{
    error::AppError,
    models::question::{NewQuestion, Question},
};

/// Process-local question store. Used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryQuestionStore {
    questions: RwLock<Vec<Question>>,
}

impl MemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the store with existing records, kept in the given order.
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: RwLock::new(questions),
        }
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn list(&self) -> Result<Vec<Question>, AppError> {
        Ok(self.questions.read().await.clone())
    }

    async fn insert(&self, question: NewQuestion) -> Result<Question, AppError> {
        let now = Utc::now();
        let stored = Question {
            id: Uuid::new_v4(),
            question: question.question,
            options: question.options,
            answer: question.answer,
            image_url: question.image_url,
            created_at: now,
            updated_at: now,
        };

        self.questions.write().await.push(stored.clone());
        Ok(stored)
    }
}
