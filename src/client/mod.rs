// src/client/mod.rs

//! Client-side logic: the quiz session engine and the admin authoring form,
//! both talking to the question service through [`api::QuestionApi`].

pub mod api;
pub mod form;
pub mod session;

pub use api::{ClientError, HttpQuestionApi, QuestionApi};
pub use form::AuthoringForm;
pub use session::{AnswerFeedback, QuizEvent, QuizSession, QuizState, Verdict};
