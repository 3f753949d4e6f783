// src/client/session.rs

//! Quiz session engine.
//!
//! One session is one run through the questions returned by a single fetch.
//! The state machine is a plain value: [`step`] maps a state and an event to
//! the next state, so it can be driven and tested without any UI around it.

use crate::{client::api::QuestionApi, client::ClientError, models::question::Question};

/// Scores at or above this share of the total count as "great".
const GREAT_SCORE_RATIO: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub enum QuizState {
    /// Waiting for the question list.
    Loading,

    /// The fetch failed or returned nothing. The user has to reload.
    Failed { message: String },

    InProgress {
        /// Fixed for the whole session, in the order the service returned.
        questions: Vec<Question>,
        position: usize,
        selected: Option<usize>,
        score: usize,
    },

    Finished { score: usize, total: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    Loaded(Result<Vec<Question>, ClientError>),
    Select(usize),
    Submit,
    /// Start over with a fresh fetch.
    Reset,
}

/// Result of submitting one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerFeedback {
    Correct,
    Incorrect { correct_option: String },
}

/// Closing remark for a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Perfect,
    Great,
    KeepPracticing,
}

impl Verdict {
    pub fn for_score(score: usize, total: usize) -> Self {
        if score == total {
            Verdict::Perfect
        } else if score as f64 >= total as f64 * GREAT_SCORE_RATIO {
            Verdict::Great
        } else {
            Verdict::KeepPracticing
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Verdict::Perfect => "Perfect score! Outstanding!",
            Verdict::Great => "Great job! Keep it up!",
            Verdict::KeepPracticing => "Good effort! Try again to improve your score!",
        }
    }
}

/// Applies one event. Events that make no sense in the current state leave
/// it untouched.
pub fn step(state: QuizState, event: QuizEvent) -> (QuizState, Option<AnswerFeedback>) {
    match (state, event) {
        (_, QuizEvent::Reset) => (QuizState::Loading, None),

        (QuizState::Loading, QuizEvent::Loaded(Ok(questions))) if questions.is_empty() => (
            QuizState::Failed {
                message: "No questions are available yet.".to_string(),
            },
            None,
        ),
        (QuizState::Loading, QuizEvent::Loaded(Ok(questions))) => (
            QuizState::InProgress {
                questions,
                position: 0,
                selected: None,
                score: 0,
            },
            None,
        ),
        (QuizState::Loading, QuizEvent::Loaded(Err(err))) => (
            QuizState::Failed {
                message: err.to_string(),
            },
            None,
        ),

        (
            QuizState::InProgress {
                questions,
                position,
                selected,
                score,
            },
            QuizEvent::Select(index),
        ) => {
            let valid = questions
                .get(position)
                .is_some_and(|current| index < current.options.len());
            let selected = if valid { Some(index) } else { selected };
            (
                QuizState::InProgress {
                    questions,
                    position,
                    selected,
                    score,
                },
                None,
            )
        }

        (
            QuizState::InProgress {
                questions,
                position,
                selected: Some(choice),
                score,
            },
            QuizEvent::Submit,
        ) => {
            let Some(current) = questions.get(position) else {
                return (
                    QuizState::InProgress {
                        questions,
                        position,
                        selected: Some(choice),
                        score,
                    },
                    None,
                );
            };
            let (score, feedback) = if choice == current.answer {
                (score + 1, AnswerFeedback::Correct)
            } else {
                (
                    score,
                    AnswerFeedback::Incorrect {
                        correct_option: current.correct_option().to_string(),
                    },
                )
            };

            let next = if position + 1 < questions.len() {
                QuizState::InProgress {
                    questions,
                    position: position + 1,
                    selected: None,
                    score,
                }
            } else {
                QuizState::Finished {
                    score,
                    total: questions.len(),
                }
            };
            (next, Some(feedback))
        }

        // Submit without a selection, stale loads, anything after Finished.
        (state, _) => (state, None),
    }
}

impl QuizState {
    pub fn current_question(&self) -> Option<&Question> {
        match self {
            QuizState::InProgress {
                questions,
                position,
                ..
            } => questions.get(*position),
            _ => None,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        match self {
            QuizState::InProgress { selected, .. } => *selected,
            _ => None,
        }
    }

    pub fn score(&self) -> usize {
        match self {
            QuizState::InProgress { score, .. } | QuizState::Finished { score, .. } => *score,
            _ => 0,
        }
    }

    /// One-based question number and total, e.g. "Question 2 of 5".
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self {
            QuizState::InProgress {
                questions,
                position,
                ..
            } => Some((position + 1, questions.len())),
            _ => None,
        }
    }

    /// Share of questions already answered, in percent.
    pub fn progress_percent(&self) -> f64 {
        match self {
            QuizState::InProgress {
                questions,
                position,
                ..
            } if !questions.is_empty() => *position as f64 / questions.len() as f64 * 100.0,
            QuizState::Finished { .. } => 100.0,
            _ => 0.0,
        }
    }

    /// Final score as a percentage of the total, for the results bar.
    pub fn score_percent(&self) -> Option<f64> {
        match self {
            QuizState::Finished { total: 0, .. } => Some(0.0),
            QuizState::Finished { score, total } => Some(*score as f64 / *total as f64 * 100.0),
            _ => None,
        }
    }

    pub fn is_last_question(&self) -> bool {
        matches!(self.progress(), Some((n, total)) if n == total)
    }

    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            QuizState::Finished { score, total } => Some(Verdict::for_score(*score, *total)),
            _ => None,
        }
    }
}

/// Holds the state of one quiz visit and feeds it events.
#[derive(Debug)]
pub struct QuizSession {
    state: QuizState,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            state: QuizState::Loading,
        }
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn apply(&mut self, event: QuizEvent) -> Option<AnswerFeedback> {
        let state = std::mem::replace(&mut self.state, QuizState::Loading);
        let (next, feedback) = step(state, event);
        self.state = next;
        feedback
    }

    /// Fetches a shuffled question list. Only acts while loading.
    pub async fn load(&mut self, api: &dyn QuestionApi) {
        if self.state != QuizState::Loading {
            return;
        }
        let result = api.list_questions(true).await;
        if let Err(err) = &result {
            tracing::warn!("Failed to load quiz questions: {}", err);
        }
        self.apply(QuizEvent::Loaded(result));
    }

    pub fn select_option(&mut self, index: usize) {
        self.apply(QuizEvent::Select(index));
    }

    pub fn submit_answer(&mut self) -> Option<AnswerFeedback> {
        self.apply(QuizEvent::Submit)
    }

    /// Throws the session away and fetches a new one.
    pub async fn restart(&mut self, api: &dyn QuestionApi) {
        self.apply(QuizEvent::Reset);
        self.load(api).await;
    }
}
