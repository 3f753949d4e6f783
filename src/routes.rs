// src/routes.rs

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    config::ADMIN_PREFIX,
    handlers::{admin, pages, questions},
    models::question::{CreateQuestionRequest, Question},
    services::images::UPLOADS_ROUTE,
    state::AppState,
    utils::gate::access_gate_middleware,
};

/// Multipart framing on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        questions::list_questions,
        admin::create_question,
        admin::list_all_questions,
        admin::upload_image
    ),
    components(schemas(Question, CreateQuestionRequest, admin::UploadResponse)),
    tags(
        (name = "questions", description = "Public quiz endpoints"),
        (name = "admin", description = "Question authoring, behind the IP access gate")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Assembles the main application router.
///
/// * Public quiz listing and the admin routes under `/api/admin`.
/// * Uploaded images served from the upload directory.
/// * Global middleware: access gate, trace, CORS.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let admin_routes = Router::new()
        .route(
            "/questions",
            get(admin::list_all_questions).post(admin::create_question),
        )
        .route(
            "/uploads",
            post(admin::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        );

    Router::new()
        .route("/api/questions", get(questions::list_questions))
        .route("/api/openapi.json", get(openapi_json))
        .route("/unauthorized", get(pages::unauthorized))
        .nest(ADMIN_PREFIX, admin_routes)
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&state.config.upload_dir))
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(
            state.gate.clone(),
            access_gate_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
