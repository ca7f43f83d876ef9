//! services/api/src/web/mod.rs
//!
//! HTTP surface of the course assistant: routes, payloads and shared state.

pub mod protocol;
pub mod rest;
pub mod state;

use crate::web::rest::ApiDoc;
use crate::web::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart framing on top of the configured upload cap.
pub const MULTIPART_HEADROOM_BYTES: usize = 1024 * 1024;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let body_limit = app_state.config.max_upload_bytes + MULTIPART_HEADROOM_BYTES;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let api_router = Router::new()
        .route("/sessions", post(rest::create_session_handler))
        .route(
            "/sessions/{id}",
            get(rest::get_session_handler).delete(rest::delete_session_handler),
        )
        .route("/sessions/{id}/course", put(rest::update_course_handler))
        .route(
            "/sessions/{id}/description/enhance",
            post(rest::enhance_description_handler),
        )
        .route(
            "/sessions/{id}/lists/{kind}/generate",
            post(rest::generate_list_handler),
        )
        .route("/sessions/{id}/lists/{kind}", post(rest::add_list_item_handler))
        .route(
            "/sessions/{id}/lists/{kind}/{index}",
            put(rest::update_list_item_handler).delete(rest::remove_list_item_handler),
        )
        .route("/sessions/{id}/documents", post(rest::upload_documents_handler))
        .route("/sessions/{id}/structure", post(rest::generate_structure_handler))
        .route(
            "/sessions/{id}/modules/{module}/chapters/{chapter}/content",
            post(rest::chapter_content_handler),
        )
        .route(
            "/sessions/{id}/modules/{module}/quiz",
            post(rest::module_quiz_handler),
        )
        .route("/sessions/{id}/podcast/script", post(rest::podcast_script_handler))
        .route("/sessions/{id}/podcast/audio", post(rest::podcast_audio_handler))
        .route(
            "/sessions/{id}/export/structure",
            get(rest::export_structure_handler),
        )
        .route(
            "/sessions/{id}/export/modules/{module}/quiz",
            get(rest::export_quiz_handler),
        )
        .route(
            "/sessions/{id}/export/podcast/script.json",
            get(rest::export_script_json_handler),
        )
        .route(
            "/sessions/{id}/export/podcast/script.txt",
            get(rest::export_script_text_handler),
        )
        .route(
            "/sessions/{id}/export/podcast/audio.mp3",
            get(rest::export_audio_handler),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
