// src/client/api.rs

use std::fmt;

use async_trait::async_trait;
use reqwest::{StatusCode, multipart};
use serde::Deserialize;

use crate::{
    error::AppError,
    handlers::admin::UploadResponse,
    models::question::{CreateQuestionRequest, Question},
    services::images::ImageUpload,
    state::AppState,
};

/// Errors as the client sees them. Each one is surfaced to the action that
/// triggered it; nothing is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The question input was rejected. Fix the fields and resubmit.
    Validation(String),
    /// The service could not reach its store. Try again later.
    StoreUnavailable(String),
    /// Rejected by the access gate.
    Unauthorized,
    /// The image could not be uploaded.
    Upload(String),
    /// No usable response from the service at all.
    Transport(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Validation(msg) => write!(f, "Invalid question: {}", msg),
            ClientError::StoreUnavailable(_) => {
                write!(f, "Failed to reach the question store. Please try again later.")
            }
            ClientError::Unauthorized => {
                write!(f, "Access denied: your IP address is not authorized.")
            }
            ClientError::Upload(msg) => write!(f, "Image upload failed: {}", msg),
            ClientError::Transport(msg) => write!(f, "Request failed: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<AppError> for ClientError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => ClientError::Validation(msg),
            AppError::Unauthorized => ClientError::Unauthorized,
            AppError::Upload(msg) | AppError::PayloadTooLarge(msg) => ClientError::Upload(msg),
            AppError::StoreUnavailable(msg) => ClientError::StoreUnavailable(msg),
            AppError::InternalServerError(msg) => ClientError::Transport(msg),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// The calls a quiz or admin view makes against the question service.
#[async_trait]
pub trait QuestionApi: Send + Sync {
    async fn list_questions(&self, randomize: bool) -> Result<Vec<Question>, ClientError>;

    async fn create_question(
        &self,
        request: CreateQuestionRequest,
    ) -> Result<Question, ClientError>;

    /// Stores an image and returns its URL.
    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ClientError>;
}

/// In-process access, for embedding the engine next to the service.
#[async_trait]
impl QuestionApi for AppState {
    async fn list_questions(&self, randomize: bool) -> Result<Vec<Question>, ClientError> {
        Ok(self.questions.list_questions(randomize).await?)
    }

    async fn create_question(
        &self,
        request: CreateQuestionRequest,
    ) -> Result<Question, ClientError> {
        Ok(self.questions.create_question(request).await?)
    }

    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ClientError> {
        Ok(self.images.store(upload).await?)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Which call failed; decides how a 400 is classified.
#[derive(Clone, Copy)]
enum Call {
    Questions,
    Upload,
}

/// Talks to a running service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpQuestionApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuestionApi {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response, call: Call) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };

        Err(match (status, call) {
            (StatusCode::FORBIDDEN, _) => ClientError::Unauthorized,
            (StatusCode::PAYLOAD_TOO_LARGE, _) => ClientError::Upload(message),
            (StatusCode::BAD_REQUEST, Call::Upload) => ClientError::Upload(message),
            (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, Call::Questions) => {
                ClientError::Validation(message)
            }
            (s, _) if s.is_server_error() => ClientError::StoreUnavailable(message),
            (s, _) => ClientError::Transport(format!("unexpected status {}: {}", s, message)),
        })
    }
}

#[async_trait]
impl QuestionApi for HttpQuestionApi {
    async fn list_questions(&self, randomize: bool) -> Result<Vec<Question>, ClientError> {
        let response = self
            .client
            .get(self.url("/api/questions"))
            .query(&[("randomize", randomize)])
            .send()
            .await?;

        Ok(Self::check(response, Call::Questions).await?.json().await?)
    }

    async fn create_question(
        &self,
        request: CreateQuestionRequest,
    ) -> Result<Question, ClientError> {
        let response = self
            .client
            .post(self.url("/api/admin/questions"))
            .json(&request)
            .send()
            .await?;

        Ok(Self::check(response, Call::Questions).await?.json().await?)
    }

    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ClientError> {
        let part = multipart::Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.unwrap_or_else(|| "image".to_string()))
            .mime_str(&upload.content_type)
            .map_err(|e| ClientError::Upload(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/api/admin/uploads"))
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = Self::check(response, Call::Upload).await?.json().await?;
        Ok(body.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_map_to_client_kinds() {
        assert_eq!(
            ClientError::from(AppError::Validation("answer".into())),
            ClientError::Validation("answer".into())
        );
        assert_eq!(ClientError::from(AppError::Unauthorized), ClientError::Unauthorized);
        assert!(matches!(
            ClientError::from(AppError::PayloadTooLarge("big".into())),
            ClientError::Upload(_)
        ));
        assert!(matches!(
            ClientError::from(AppError::StoreUnavailable("down".into())),
            ClientError::StoreUnavailable(_)
        ));
    }

    #[test]
    fn store_failure_message_is_generic() {
        let msg = ClientError::StoreUnavailable("pg: connection refused".into()).to_string();
        assert!(!msg.contains("connection refused"));
    }
}
