// src/models/question.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// A stored multiple-choice question, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,

    /// The question text shown to the player.
    pub question: String,

    /// Answer options in display order. Always at least two.
    pub options: Vec<String>,

    /// Index into `options` of the correct answer.
    pub answer: usize,

    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// Text of the correct option.
    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.answer)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub question: String,

    /// Stored as a JSONB array.
    pub options: Json<Vec<String>>,

    pub answer: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let answer = usize::try_from(row.answer)
            .ok()
            .filter(|idx| *idx < row.options.len())
            .ok_or_else(|| {
                AppError::InternalServerError(format!(
                    "question {} has answer index {} outside its {} options",
                    row.id,
                    row.answer,
                    row.options.len()
                ))
            })?;

        Ok(Question {
            id: row.id,
            question: row.question,
            options: row.options.0,
            answer,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A question that has passed validation and is ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: usize,
    pub image_url: Option<String>,
}

/// DTO for creating a new question.
///
/// Field-level rules live here; the option-count minimum and the answer
/// bounds depend on configuration and are checked by the question service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[validate(length(max = 1000), custom(function = validate_not_blank))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    /// Signed so that a negative index is reported as a validation error
    /// instead of a deserialization failure.
    pub answer: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500), custom(function = validate_image_url))]
    pub image_url: Option<String>,
}

impl CreateQuestionRequest {
    /// Trims text fields and treats a blank image URL as no image.
    pub fn normalized(mut self) -> Self {
        self.question = self.question.trim().to_string();
        for option in &mut self.options {
            *option = option.trim().to_string();
        }
        self.image_url = self
            .image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        self
    }
}

/// Query parameters for the public listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuestionsParams {
    /// Shuffle the result. Defaults to `true`.
    pub randomize: Option<bool>,
}

fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("must_not_be_blank"));
    }
    Ok(())
}

/// Longest option accepted, in characters.
const MAX_OPTION_CHARS: usize = 500;

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_blank"));
        }
        if opt.chars().count() > MAX_OPTION_CHARS {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// Image URLs must be absolute; relative paths would not resolve for every client.
fn validate_image_url(url: &str) -> Result<(), validator::ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_url")),
    }
}
