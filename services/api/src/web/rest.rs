//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification. Every handler locks its session
//! for the whole action, so actions on one session never interleave.

use crate::error::HttpError;
use crate::web::protocol::{
    AudioRequest, ChapterContentResponse, CourseResponse, CourseUpdateRequest,
    CreateSessionResponse, DescriptionResponse, EnhanceRequest, ErrorResponse, ForceQuery,
    ListItemRequest, ListResponse, PodcastAudioResponse, PodcastRequest, PodcastScriptResponse,
    QuizRequest, QuizResponse, RemovedItemResponse, SessionResponse, StructureResponse,
    UploadFailure, UploadResponse,
};
use crate::web::state::{AppState, SessionEntry};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use course_assistant_core::{ExportFile, GenerationError, ListKind, QuizOptions, TextProvider, Voice};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session_handler,
        get_session_handler,
        delete_session_handler,
        update_course_handler,
        enhance_description_handler,
        generate_list_handler,
        add_list_item_handler,
        update_list_item_handler,
        remove_list_item_handler,
        upload_documents_handler,
        generate_structure_handler,
        chapter_content_handler,
        module_quiz_handler,
        podcast_script_handler,
        podcast_audio_handler,
        export_structure_handler,
        export_quiz_handler,
        export_script_json_handler,
        export_script_text_handler,
        export_audio_handler,
    ),
    components(
        schemas(
            CreateSessionResponse, SessionResponse, CourseUpdateRequest, CourseResponse,
            EnhanceRequest, DescriptionResponse, ListItemRequest, ListResponse,
            RemovedItemResponse, UploadResponse, UploadFailure, StructureResponse, ChapterContentResponse,
            QuizRequest, QuizResponse, PodcastRequest, PodcastScriptResponse, AudioRequest,
            PodcastAudioResponse, ErrorResponse
        )
    ),
    tags(
        (name = "Course Assistant API", description = "Course authoring sessions backed by text, embedding and speech models.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Helpers
//=========================================================================================

async fn session_entry(state: &AppState, id: Uuid) -> Result<SessionEntry, HttpError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| HttpError::not_found(format!("Session {} not found", id)))
}

fn list_kind(kind: &str) -> Result<ListKind, HttpError> {
    kind.parse::<ListKind>().map_err(HttpError::bad_request)
}

fn invalid_input(message: String) -> HttpError {
    HttpError::from(GenerationError::InvalidInput(message))
}

/// Serves an export as a file download.
fn download(file: ExportFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.data,
    )
        .into_response()
}

//=========================================================================================
// Sessions
//=========================================================================================

/// Start a new, empty course-authoring session.
#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session created successfully", body = CreateSessionResponse)
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let (session_id, entry) = app_state.sessions.create(app_state.services.clone()).await;
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            created_at: entry.created_at,
        }),
    )
}

/// Everything the session holds: course, lists, documents and generated artifacts.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, HttpError> {
    let entry = session_entry(&app_state, id).await?;
    let state = entry.session.lock().await.snapshot();
    Ok(Json(SessionResponse {
        session_id: id,
        created_at: entry.created_at,
        state,
    }))
}

/// End a session. All of its state is dropped.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session ended"),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn delete_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpError> {
    if app_state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HttpError::not_found(format!("Session {} not found", id)))
    }
}

//=========================================================================================
// Course Metadata
//=========================================================================================

/// Update course fields. Omitted fields are left unchanged.
#[utoipa::path(
    put,
    path = "/sessions/{id}/course",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = CourseUpdateRequest,
    responses(
        (status = 200, description = "The updated course", body = CourseResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn update_course_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseUpdateRequest>,
) -> Result<Json<CourseResponse>, HttpError> {
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    session.update_course(payload.into());
    Ok(Json(CourseResponse {
        course: session.course().clone(),
    }))
}

/// Rewrite the course description with the chosen provider.
#[utoipa::path(
    post,
    path = "/sessions/{id}/description/enhance",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = EnhanceRequest,
    responses(
        (status = 200, description = "The enhanced description", body = DescriptionResponse),
        (status = 400, description = "Unknown provider or missing title/description", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse),
        (status = 503, description = "Provider API key not configured", body = ErrorResponse)
    )
)]
pub async fn enhance_description_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EnhanceRequest>,
) -> Result<Json<DescriptionResponse>, HttpError> {
    let provider = payload.provider.parse::<TextProvider>().map_err(invalid_input)?;
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    let description = session.enhance_description(provider).await?.to_string();
    info!("Session {}: description enhanced with {}", id, provider);
    Ok(Json(DescriptionResponse {
        provider: provider.to_string(),
        description,
    }))
}

//=========================================================================================
// Lists
//=========================================================================================

/// Generate learning objectives, prerequisites or learning methods.
#[utoipa::path(
    post,
    path = "/sessions/{id}/lists/{kind}/generate",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("kind" = String, Path, description = "objectives, prerequisites or methods")
    ),
    responses(
        (status = 200, description = "The generated list", body = ListResponse),
        (status = 400, description = "Unknown list or missing title/description", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse),
        (status = 503, description = "OpenAI API key not configured", body = ErrorResponse)
    )
)]
pub async fn generate_list_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, kind)): Path<(Uuid, String)>,
) -> Result<Json<ListResponse>, HttpError> {
    let kind = list_kind(&kind)?;
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    let items = session.generate_list(kind).await?.to_vec();
    info!("Session {}: generated {} {}", id, items.len(), kind);
    Ok(Json(ListResponse {
        kind: kind.to_string(),
        items,
    }))
}

/// Append an item to a list.
#[utoipa::path(
    post,
    path = "/sessions/{id}/lists/{kind}",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("kind" = String, Path, description = "objectives, prerequisites or methods")
    ),
    request_body = ListItemRequest,
    responses(
        (status = 200, description = "The updated list", body = ListResponse),
        (status = 400, description = "Unknown list or empty text", body = ErrorResponse)
    )
)]
pub async fn add_list_item_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, kind)): Path<(Uuid, String)>,
    Json(payload): Json<ListItemRequest>,
) -> Result<Json<ListResponse>, HttpError> {
    let kind = list_kind(&kind)?;
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    session.add_list_item(kind, &payload.text)?;
    Ok(Json(ListResponse {
        kind: kind.to_string(),
        items: session.list(kind).to_vec(),
    }))
}

/// Replace the text of a list item.
#[utoipa::path(
    put,
    path = "/sessions/{id}/lists/{kind}/{index}",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("kind" = String, Path, description = "objectives, prerequisites or methods"),
        ("index" = usize, Path, description = "Zero-based item position")
    ),
    request_body = ListItemRequest,
    responses(
        (status = 200, description = "The updated list", body = ListResponse),
        (status = 404, description = "No item at that position", body = ErrorResponse)
    )
)]
pub async fn update_list_item_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, kind, index)): Path<(Uuid, String, usize)>,
    Json(payload): Json<ListItemRequest>,
) -> Result<Json<ListResponse>, HttpError> {
    let kind = list_kind(&kind)?;
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    session.update_list_item(kind, index, &payload.text)?;
    Ok(Json(ListResponse {
        kind: kind.to_string(),
        items: session.list(kind).to_vec(),
    }))
}

/// Remove a list item.
#[utoipa::path(
    delete,
    path = "/sessions/{id}/lists/{kind}/{index}",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("kind" = String, Path, description = "objectives, prerequisites or methods"),
        ("index" = usize, Path, description = "Zero-based item position")
    ),
    responses(
        (status = 200, description = "The removed item and the remaining list", body = RemovedItemResponse),
        (status = 404, description = "No item at that position", body = ErrorResponse)
    )
)]
pub async fn remove_list_item_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, kind, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<RemovedItemResponse>, HttpError> {
    let kind = list_kind(&kind)?;
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    let removed = session.remove_list_item(kind, index)?;
    Ok(Json(RemovedItemResponse {
        removed,
        items: session.list(kind).to_vec(),
    }))
}

//=========================================================================================
// Documents and Structure
//=========================================================================================

/// Upload reference documents (PDF, DOCX, PPTX or TXT).
///
/// Accepts a multipart/form-data request with one or more file parts. Every file
/// is processed in order; files that fail are listed under `errors` while the
/// others are kept. When no file succeeds, the first failure is the response.
#[utoipa::path(
    post,
    path = "/sessions/{id}/documents",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body(content_type = "multipart/form-data", description = "The documents to upload."),
    responses(
        (status = 200, description = "Uploaded documents and per-file failures", body = UploadResponse),
        (status = 400, description = "No file, or every file has an unsupported type", body = ErrorResponse),
        (status = 413, description = "File larger than the upload limit", body = ErrorResponse),
        (status = 422, description = "Text could not be extracted", body = ErrorResponse),
        (status = 503, description = "OpenAI API key not configured", body = ErrorResponse)
    )
)]
pub async fn upload_documents_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpError> {
    let entry = session_entry(&app_state, id).await?;

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        HttpError::bad_request(format!("Failed to read multipart data: {}", e))
    })? {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field.bytes().await.map_err(|e| {
            HttpError::bad_request(format!("Failed to read file bytes: {}", e))
        })?;
        files.push((name, data));
    }
    if files.is_empty() {
        return Err(HttpError::bad_request("Multipart form must include a file"));
    }

    let mut session = entry.session.lock().await;
    let mut documents = Vec::with_capacity(files.len());
    let mut failures = Vec::new();
    for (name, data) in files {
        match session.upload_document(&name, &data).await {
            Ok(document) => documents.push(document),
            Err(e) => {
                warn!("Skipping uploaded file {}: {}", name, e);
                failures.push((name, e));
            }
        }
    }

    if documents.is_empty() {
        if let Some((_, first)) = failures.drain(..).next() {
            return Err(first.into());
        }
    }
    let errors = failures
        .into_iter()
        .map(|(file_name, e)| UploadFailure { file_name, error: e.to_string() })
        .collect();
    Ok(Json(UploadResponse { documents, errors }))
}

/// Generate the module and chapter outline. Replaces any previous outline.
#[utoipa::path(
    post,
    path = "/sessions/{id}/structure",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "The generated structure", body = StructureResponse),
        (status = 400, description = "Missing title/description", body = ErrorResponse),
        (status = 502, description = "Provider failure or malformed reply", body = ErrorResponse),
        (status = 503, description = "OpenAI API key not configured", body = ErrorResponse)
    )
)]
pub async fn generate_structure_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StructureResponse>, HttpError> {
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    let course_structure = session.generate_course_structure().await?.clone();
    Ok(Json(StructureResponse { course_structure }))
}

/// Content of one chapter, generated on first request and cached afterwards.
#[utoipa::path(
    post,
    path = "/sessions/{id}/modules/{module}/chapters/{chapter}/content",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("module" = u32, Path, description = "Module number"),
        ("chapter" = f64, Path, description = "Chapter number, e.g. 1.2"),
        ForceQuery
    ),
    responses(
        (status = 200, description = "Chapter content", body = ChapterContentResponse),
        (status = 404, description = "No structure, or no such chapter", body = ErrorResponse),
        (status = 502, description = "Provider failure or malformed reply", body = ErrorResponse),
        (status = 503, description = "OpenAI API key not configured", body = ErrorResponse)
    )
)]
pub async fn chapter_content_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, module_number, chapter_number)): Path<(Uuid, u32, f64)>,
    Query(query): Query<ForceQuery>,
) -> Result<Json<ChapterContentResponse>, HttpError> {
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    let cached = !query.force
        && session
            .cached_chapter_content(module_number, chapter_number)
            .is_some();
    let content = if query.force {
        session
            .regenerate_chapter_content(module_number, chapter_number)
            .await?
    } else {
        session.chapter_content(module_number, chapter_number).await?
    }
    .clone();
    Ok(Json(ChapterContentResponse {
        module_number,
        chapter_number,
        cached,
        content,
    }))
}

//=========================================================================================
// Quizzes
//=========================================================================================

/// Quiz for one module, generated on first request and cached afterwards.
/// Options only apply when a quiz is actually generated.
#[utoipa::path(
    post,
    path = "/sessions/{id}/modules/{module}/quiz",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("module" = u32, Path, description = "Module number"),
        ForceQuery
    ),
    request_body = QuizRequest,
    responses(
        (status = 200, description = "The module quiz", body = QuizResponse),
        (status = 400, description = "Invalid quiz options", body = ErrorResponse),
        (status = 404, description = "No structure, or no such module", body = ErrorResponse),
        (status = 502, description = "Provider failure or malformed reply", body = ErrorResponse),
        (status = 503, description = "OpenAI API key not configured", body = ErrorResponse)
    )
)]
pub async fn module_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, module_number)): Path<(Uuid, u32)>,
    Query(query): Query<ForceQuery>,
    Json(payload): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, HttpError> {
    let options = QuizOptions::from(payload);
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    let cached = !query.force && session.cached_quiz(module_number).is_some();
    let quiz = if query.force {
        session.regenerate_module_quiz(module_number, &options).await?
    } else {
        session.module_quiz(module_number, &options).await?
    }
    .clone();
    Ok(Json(QuizResponse {
        module_number,
        cached,
        quiz,
    }))
}

//=========================================================================================
// Podcast
//=========================================================================================

/// Generate a podcast script from the course structure. Discards earlier audio.
#[utoipa::path(
    post,
    path = "/sessions/{id}/podcast/script",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = PodcastRequest,
    responses(
        (status = 200, description = "The podcast script", body = PodcastScriptResponse),
        (status = 400, description = "Structure has no modules", body = ErrorResponse),
        (status = 404, description = "No structure generated yet", body = ErrorResponse),
        (status = 502, description = "Provider failure or malformed reply", body = ErrorResponse),
        (status = 503, description = "OpenAI API key not configured", body = ErrorResponse)
    )
)]
pub async fn podcast_script_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PodcastRequest>,
) -> Result<Json<PodcastScriptResponse>, HttpError> {
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    let script = session
        .generate_podcast_script(&payload.into())
        .await?
        .clone();
    Ok(Json(PodcastScriptResponse { script }))
}

/// Synthesize the current podcast script as MP3 audio.
#[utoipa::path(
    post,
    path = "/sessions/{id}/podcast/audio",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = AudioRequest,
    responses(
        (status = 200, description = "Base64 encoded audio", body = PodcastAudioResponse),
        (status = 400, description = "Unknown voice", body = ErrorResponse),
        (status = 404, description = "No script generated yet", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse),
        (status = 503, description = "OpenAI API key not configured", body = ErrorResponse)
    )
)]
pub async fn podcast_audio_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AudioRequest>,
) -> Result<Json<PodcastAudioResponse>, HttpError> {
    let voice = payload.voice.parse::<Voice>().map_err(invalid_input)?;
    let entry = session_entry(&app_state, id).await?;
    let mut session = entry.session.lock().await;
    let audio = session.generate_podcast_audio(voice).await?.clone();
    info!("Session {}: podcast audio ready ({:.0}s)", id, audio.duration_seconds);
    Ok(Json(PodcastAudioResponse { audio }))
}

//=========================================================================================
// Exports
//=========================================================================================

/// Download the course structure as `course_structure.json`.
#[utoipa::path(
    get,
    path = "/sessions/{id}/export/structure",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "JSON file download"),
        (status = 404, description = "Nothing to export", body = ErrorResponse)
    )
)]
pub async fn export_structure_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpError> {
    let entry = session_entry(&app_state, id).await?;
    let file = entry.session.lock().await.export_course_structure()?;
    Ok(download(file))
}

/// Download a module quiz as `quiz_module_{n}.json`.
#[utoipa::path(
    get,
    path = "/sessions/{id}/export/modules/{module}/quiz",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("module" = u32, Path, description = "Module number")
    ),
    responses(
        (status = 200, description = "JSON file download"),
        (status = 404, description = "Nothing to export", body = ErrorResponse)
    )
)]
pub async fn export_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, module_number)): Path<(Uuid, u32)>,
) -> Result<Response, HttpError> {
    let entry = session_entry(&app_state, id).await?;
    let file = entry.session.lock().await.export_quiz(module_number)?;
    Ok(download(file))
}

/// Download the podcast script as `podcast_script.json`.
#[utoipa::path(
    get,
    path = "/sessions/{id}/export/podcast/script.json",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "JSON file download"),
        (status = 404, description = "Nothing to export", body = ErrorResponse)
    )
)]
pub async fn export_script_json_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpError> {
    let entry = session_entry(&app_state, id).await?;
    let file = entry.session.lock().await.export_podcast_script_json()?;
    Ok(download(file))
}

/// Download the spoken text of the podcast script as `podcast_script.txt`.
#[utoipa::path(
    get,
    path = "/sessions/{id}/export/podcast/script.txt",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Text file download"),
        (status = 404, description = "Nothing to export", body = ErrorResponse)
    )
)]
pub async fn export_script_text_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpError> {
    let entry = session_entry(&app_state, id).await?;
    let file = entry.session.lock().await.export_podcast_script_text()?;
    Ok(download(file))
}

/// Download the podcast audio as an MP3 file named after the podcast.
#[utoipa::path(
    get,
    path = "/sessions/{id}/export/podcast/audio.mp3",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "MP3 file download"),
        (status = 404, description = "Nothing to export", body = ErrorResponse)
    )
)]
pub async fn export_audio_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpError> {
    let entry = session_entry(&app_state, id).await?;
    let file = entry.session.lock().await.export_podcast_audio()?;
    Ok(download(file))
}
