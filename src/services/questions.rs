// src/services/questions.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    config::MIN_OPTIONS_FLOOR,
    error::AppError,
    models::question::{CreateQuestionRequest, NewQuestion, Question},
    services::shuffle::{RandomSource, fisher_yates},
    store::QuestionStore,
};

/// Server-side boundary for listing and creating questions.
///
/// Does not check who is calling; admin requests are filtered by the access
/// gate before they get here.
#[derive(Clone)]
pub struct QuestionService {
    store: Arc<dyn QuestionStore>,
    random: Arc<dyn RandomSource>,
    min_options: usize,
}

impl QuestionService {
    pub fn new(
        store: Arc<dyn QuestionStore>,
        random: Arc<dyn RandomSource>,
        min_options: usize,
    ) -> Self {
        Self {
            store,
            random,
            min_options: min_options.max(MIN_OPTIONS_FLOOR),
        }
    }

    pub fn min_options(&self) -> usize {
        self.min_options
    }

    /// Reads every stored question, shuffled when `randomize` is set.
    /// Each call draws a fresh permutation.
    pub async fn list_questions(&self, randomize: bool) -> Result<Vec<Question>, AppError> {
        let mut questions = self.store.list().await?;
        if randomize {
            fisher_yates(&mut questions, self.random.as_ref());
        }
        tracing::debug!(count = questions.len(), randomize, "Listed questions");
        Ok(questions)
    }

    /// Validates the request and inserts it. Nothing is written when validation fails.
    pub async fn create_question(
        &self,
        request: CreateQuestionRequest,
    ) -> Result<Question, AppError> {
        let new_question = self.validate(request)?;
        let created = self.store.insert(new_question).await?;
        tracing::info!(id = %created.id, "Question created");
        Ok(created)
    }

    /// Field rules, then the rules that depend on configuration and on other fields.
    pub fn validate(&self, request: CreateQuestionRequest) -> Result<NewQuestion, AppError> {
        let request = request.normalized();
        request.validate()?;

        if request.options.len() < self.min_options {
            return Err(AppError::Validation(format!(
                "options: at least {} options are required, got {}",
                self.min_options,
                request.options.len()
            )));
        }

        let answer = usize::try_from(request.answer)
            .ok()
            .filter(|idx| *idx < request.options.len())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "answer: index {} is outside 0..{}",
                    request.answer,
                    request.options.len()
                ))
            })?;

        Ok(NewQuestion {
            question: request.question,
            options: request.options,
            answer,
            image_url: request.image_url,
        })
    }
}
