// src/client/form.rs

//! Admin authoring form: collects a question and only lets it be submitted
//! once it would pass the service's validation.

use crate::{
    client::api::{ClientError, QuestionApi},
    config::MIN_OPTIONS_FLOOR,
    models::question::{CreateQuestionRequest, Question},
    services::images::ImageUpload,
};

/// Empty option slots a fresh form starts with.
pub const DEFAULT_OPTION_SLOTS: usize = 4;

/// Form state. `submit` borrows the form mutably, so there is never more than
/// one submission in flight.
#[derive(Debug, Clone)]
pub struct AuthoringForm {
    text: String,
    options: Vec<String>,
    answer: Option<usize>,
    image_url: Option<String>,
    min_options: usize,
    error: Option<ClientError>,
}

impl Default for AuthoringForm {
    fn default() -> Self {
        Self::new(MIN_OPTIONS_FLOOR)
    }
}

impl AuthoringForm {
    pub fn new(min_options: usize) -> Self {
        let min_options = min_options.max(MIN_OPTIONS_FLOOR);
        Self {
            text: String::new(),
            options: vec![String::new(); DEFAULT_OPTION_SLOTS.max(min_options)],
            answer: None,
            image_url: None,
            min_options,
            error: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn answer(&self) -> Option<usize> {
        self.answer
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// The last error, kept until the next successful action.
    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Returns false when `index` is not an option slot.
    pub fn set_option(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.options.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn add_option(&mut self) {
        self.options.push(String::new());
    }

    /// Removes a slot unless that would drop below the minimum. The chosen
    /// answer follows its option, or is cleared if it was the one removed.
    pub fn remove_option(&mut self, index: usize) -> bool {
        if index >= self.options.len() || self.options.len() <= self.min_options {
            return false;
        }
        self.options.remove(index);
        self.answer = match self.answer {
            Some(a) if a == index => None,
            Some(a) if a > index => Some(a - 1),
            other => other,
        };
        true
    }

    pub fn choose_answer(&mut self, index: usize) -> bool {
        if index < self.options.len() {
            self.answer = Some(index);
            true
        } else {
            false
        }
    }

    pub fn clear_image(&mut self) {
        self.image_url = None;
    }

    pub fn can_submit(&self) -> bool {
        !self.text.trim().is_empty()
            && self.options.len() >= self.min_options
            && self.options.iter().all(|o| !o.trim().is_empty())
            && self.answer.is_some_and(|a| a < self.options.len())
    }

    pub fn to_request(&self) -> Option<CreateQuestionRequest> {
        if !self.can_submit() {
            return None;
        }
        let answer = self.answer?;
        Some(CreateQuestionRequest {
            question: self.text.clone(),
            options: self.options.clone(),
            answer: i64::try_from(answer).ok()?,
            image_url: self.image_url.clone(),
        })
    }

    /// Uploads an image for the question. A failure is recorded but does not
    /// stop a text-only question from being submitted.
    pub async fn attach_image(
        &mut self,
        api: &dyn QuestionApi,
        upload: ImageUpload,
    ) -> Result<String, ClientError> {
        match api.upload_image(upload).await {
            Ok(url) => {
                self.image_url = Some(url.clone());
                self.error = None;
                Ok(url)
            }
            Err(err) => {
                let err = match err {
                    ClientError::Upload(_) | ClientError::Unauthorized => err,
                    other => ClientError::Upload(other.to_string()),
                };
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Sends the question. On success every field is cleared and `on_success`
    /// is called with the stored question; on failure the fields are kept.
    pub async fn submit<F>(
        &mut self,
        api: &dyn QuestionApi,
        on_success: F,
    ) -> Result<Question, ClientError>
    where
        F: FnOnce(&Question),
    {
        let Some(request) = self.to_request() else {
            let err = ClientError::Validation("the form is incomplete".to_string());
            self.error = Some(err.clone());
            return Err(err);
        };

        match api.create_question(request).await {
            Ok(question) => {
                *self = Self::new(self.min_options);
                on_success(&question);
                Ok(question)
            }
            Err(err) => {
                tracing::warn!("Failed to add question: {}", err);
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }
}
