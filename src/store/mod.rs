// src/store/mod.rs

//! Persistence boundary for question records.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::question::{NewQuestion, Question},
};

mod memory;
mod postgres;

pub use memory::MemoryQuestionStore;
pub use postgres::PgQuestionStore;

/// Lists and inserts question records.
///
/// Implementations assign the identifier and timestamps on insert and report
/// any backend failure as `AppError::StoreUnavailable`.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// All stored questions, oldest first.
    async fn list(&self) -> Result<Vec<Question>, AppError>;

    async fn insert(&self, question: NewQuestion) -> Result<Question, AppError>;
}
