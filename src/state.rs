// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::{
        images::{ImageHost, LocalImageHost},
        questions::QuestionService,
        shuffle::RandomSource,
    },
    store::QuestionStore,
    utils::gate::AccessGate,
};

#[derive(Clone)]
pub struct AppState {
    pub questions: QuestionService,
    pub images: Arc<dyn ImageHost>,
    pub gate: AccessGate,
    pub config: Config,
}

impl FromRef<AppState> for QuestionService {
    fn from_ref(state: &AppState) -> Self {
        state.questions.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ImageHost> {
    fn from_ref(state: &AppState) -> Self {
        state.images.clone()
    }
}

impl FromRef<AppState> for AccessGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}

impl AppState {
    /// Wires the services for a question store and a shuffle source.
    pub fn new(
        config: Config,
        store: Arc<dyn QuestionStore>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        let questions = QuestionService::new(store, random, config.min_options);
        let images: Arc<dyn ImageHost> = Arc::new(LocalImageHost::new(
            config.upload_dir.clone(),
            &config.public_base_url,
            config.max_upload_bytes,
        ));
        let gate = AccessGate::from_config(&config);

        Self {
            questions,
            images,
            gate,
            config,
        }
    }
}
