// tests/client_tests.rs

use std::{net::SocketAddr, sync::Arc};

use axum::body::Bytes;
use quiz_backend::{
    client::{
        AnswerFeedback, AuthoringForm, ClientError, HttpQuestionApi, QuestionApi, QuizSession,
        QuizState,
    },
    config::{Config, GatePolicy},
    routes,
    services::{images::ImageUpload, shuffle::ThreadRandom},
    state::AppState,
    store::{MemoryQuestionStore, QuestionStore},
};

async fn spawn_app(config: Config, store: Arc<MemoryQuestionStore>) -> String {
    let state = AppState::new(config, store, Arc::new(ThreadRandom));
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    address
}

fn test_config() -> Config {
    Config {
        rust_log: "error".to_string(),
        upload_dir: std::env::temp_dir().join(format!("quiz-client-{}", uuid::Uuid::new_v4())),
        ..Config::default()
    }
}

async fn author(api: &dyn QuestionApi, text: &str, options: &[&str], answer: usize) {
    let mut form = AuthoringForm::new(2);
    form.set_text(text);
    for (i, opt) in options.iter().enumerate() {
        if !form.set_option(i, *opt) {
            form.add_option();
            form.set_option(i, *opt);
        }
    }
    while form.options().len() > options.len() {
        let last = form.options().len() - 1;
        form.remove_option(last);
    }
    form.choose_answer(answer);
    form.submit(api, |_| {}).await.unwrap();
}

#[tokio::test]
async fn play_a_full_quiz_over_http() {
    // Arrange: store contains A, B and C
    let store = Arc::new(MemoryQuestionStore::new());
    let address = spawn_app(test_config(), store.clone()).await;
    let api = HttpQuestionApi::new(&address);

    author(&api, "A", &["a0", "a1"], 0).await;
    author(&api, "B", &["b0", "b1", "b2"], 2).await;
    author(&api, "C", &["c0", "c1", "c2", "c3"], 3).await;
    assert_eq!(store.list().await.unwrap().len(), 3);

    // Act: answer A correctly, B incorrectly, C correctly, whatever the order
    let mut session = QuizSession::new();
    session.load(&api).await;

    let mut seen = Vec::new();
    while let Some(current) = session.state().current_question().cloned() {
        seen.push(current.question.clone());
        let choice = match current.question.as_str() {
            "B" => 0,
            _ => current.answer,
        };
        session.select_option(choice);
        let feedback = session.submit_answer().unwrap();
        if current.question == "B" {
            assert_eq!(
                feedback,
                AnswerFeedback::Incorrect {
                    correct_option: "b2".into()
                }
            );
        } else {
            assert_eq!(feedback, AnswerFeedback::Correct);
        }
    }

    // Assert
    seen.sort();
    assert_eq!(seen, vec!["A", "B", "C"]);
    assert_eq!(session.state(), &QuizState::Finished { score: 2, total: 3 });
}

#[tokio::test]
async fn empty_store_ends_in_the_error_state() {
    let address = spawn_app(test_config(), Arc::new(MemoryQuestionStore::new())).await;
    let api = HttpQuestionApi::new(&address);

    let mut session = QuizSession::new();
    session.load(&api).await;

    assert!(matches!(session.state(), QuizState::Failed { .. }));
}

#[tokio::test]
async fn unreachable_service_is_reported_once() {
    // Nothing listens on this port once the listener is dropped.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let api = HttpQuestionApi::new(&address);
    let mut session = QuizSession::new();
    session.load(&api).await;

    match session.state() {
        QuizState::Failed { message } => assert!(message.starts_with("Request failed")),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn form_surfaces_gate_rejection_and_keeps_fields() {
    let config = Config {
        gate_policy: GatePolicy::AllowList(vec!["198.51.100.7".parse().unwrap()]),
        ..test_config()
    };
    let store = Arc::new(MemoryQuestionStore::new());
    let address = spawn_app(config, store.clone()).await;
    let api = HttpQuestionApi::new(&address);

    let mut form = AuthoringForm::new(2);
    form.set_text("Blocked?");
    form.set_option(0, "yes");
    form.set_option(1, "no");
    form.remove_option(3);
    form.remove_option(2);
    form.choose_answer(0);

    let err = form.submit(&api, |_| panic!("must not succeed")).await.unwrap_err();

    assert_eq!(err, ClientError::Unauthorized);
    assert_eq!(form.text(), "Blocked?");
    assert_eq!(form.answer(), Some(0));
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn image_upload_over_http_attaches_url() {
    let store = Arc::new(MemoryQuestionStore::new());
    let address = spawn_app(test_config(), store.clone()).await;
    let api = HttpQuestionApi::new(&address);

    let mut form = AuthoringForm::new(2);
    form.set_text("Which shape is shown?");
    for (i, opt) in ["circle", "square", "triangle", "hexagon"].iter().enumerate() {
        form.set_option(i, *opt);
    }
    form.choose_answer(2);

    let url = form
        .attach_image(
            &api,
            ImageUpload {
                file_name: Some("shape.png".into()),
                content_type: "image/png".into(),
                bytes: Bytes::from_static(b"\x89PNG shape"),
            },
        )
        .await
        .unwrap();

    let created = form.submit(&api, |_| {}).await.unwrap();
    assert_eq!(created.image_url.as_deref(), Some(url.as_str()));

    let bad = form
        .attach_image(
            &api,
            ImageUpload {
                file_name: Some("shape.txt".into()),
                content_type: "text/plain".into(),
                bytes: Bytes::from_static(b"nope"),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(bad, ClientError::Upload(_)));
}

#[tokio::test]
async fn http_validation_errors_map_to_validation() {
    let address = spawn_app(test_config(), Arc::new(MemoryQuestionStore::new())).await;
    let api = HttpQuestionApi::new(&address);

    let err = api
        .create_question(quiz_backend::models::question::CreateQuestionRequest {
            question: "Out of range".into(),
            options: vec!["a".into(), "b".into()],
            answer: 5,
            image_url: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
}
