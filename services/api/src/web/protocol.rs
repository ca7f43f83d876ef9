//! services/api/src/web/protocol.rs
//!
//! Request and response payloads of the REST API. Generated artifacts are
//! passed through as the JSON objects the core produces.

use chrono::{DateTime, Utc};
use course_assistant_core::domain::{
    ChapterContent, Difficulty, PodcastAudio, PodcastFormat, PodcastScript, QuestionType, Quiz,
    QuizDifficulty, UploadedDocument,
};
use course_assistant_core::{
    Course, CourseStructure, CourseUpdate, PodcastOptions, QuizOptions, SessionSnapshot,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Errors
//=========================================================================================

/// The body of every error response.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

//=========================================================================================
// Sessions
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Everything the session currently holds.
#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Object)]
    pub state: SessionSnapshot,
}

//=========================================================================================
// Course Metadata
//=========================================================================================

/// Fields to change; omitted fields keep their value.
#[derive(Deserialize, ToSchema, Default)]
pub struct CourseUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration: Option<String>,
    /// One of `beginner`, `intermediate`, `advanced`, `expert`.
    #[schema(value_type = Option<String>, example = "beginner")]
    pub difficulty: Option<Difficulty>,
    /// Number of modules as typed by the user.
    pub target_modules: Option<String>,
    pub price: Option<String>,
}

impl From<CourseUpdateRequest> for CourseUpdate {
    fn from(req: CourseUpdateRequest) -> Self {
        CourseUpdate {
            title: req.title,
            description: req.description,
            category: req.category,
            duration: req.duration,
            difficulty: req.difficulty,
            target_modules: req.target_modules,
            price: req.price,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CourseResponse {
    #[schema(value_type = Object)]
    pub course: Course,
}

fn default_provider() -> String {
    "openai".to_string()
}

#[derive(Deserialize, ToSchema)]
pub struct EnhanceRequest {
    /// `openai` or `anthropic`.
    #[serde(default = "default_provider")]
    #[schema(example = "openai")]
    pub provider: String,
}

#[derive(Serialize, ToSchema)]
pub struct DescriptionResponse {
    pub provider: String,
    pub description: String,
}

//=========================================================================================
// Lists
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ListItemRequest {
    pub text: String,
}

#[derive(Serialize, ToSchema)]
pub struct ListResponse {
    pub kind: String,
    pub items: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RemovedItemResponse {
    pub removed: String,
    pub items: Vec<String>,
}

//=========================================================================================
// Documents and Structure
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    /// One record per uploaded file, in upload order.
    #[schema(value_type = Vec<Object>)]
    pub documents: Vec<UploadedDocument>,
    /// Files that could not be added; the rest of the upload still went through.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<UploadFailure>,
}

#[derive(Serialize, ToSchema)]
pub struct UploadFailure {
    pub file_name: String,
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct StructureResponse {
    #[schema(value_type = Object)]
    pub course_structure: CourseStructure,
}

/// `?force=true` regenerates even when a cached result exists.
#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ForceQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ChapterContentResponse {
    pub module_number: u32,
    pub chapter_number: f64,
    /// True when the content came from the session cache.
    pub cached: bool,
    #[schema(value_type = Object)]
    pub content: ChapterContent,
}

//=========================================================================================
// Quizzes
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(default)]
pub struct QuizRequest {
    /// Between 1 and 50.
    pub num_questions: u32,
    /// `very_easy`, `easy`, `medium`, `hard` or `very_hard`.
    #[schema(value_type = String, example = "medium")]
    pub difficulty: QuizDifficulty,
    /// Any of `multiple_choice`, `true_false`, `direct_question`.
    #[schema(value_type = Vec<String>)]
    pub question_types: Vec<QuestionType>,
}

impl Default for QuizRequest {
    fn default() -> Self {
        let options = QuizOptions::default();
        Self {
            num_questions: options.num_questions,
            difficulty: options.difficulty,
            question_types: options.question_types,
        }
    }
}

impl From<QuizRequest> for QuizOptions {
    fn from(req: QuizRequest) -> Self {
        QuizOptions {
            num_questions: req.num_questions,
            difficulty: req.difficulty,
            question_types: req.question_types,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct QuizResponse {
    pub module_number: u32,
    pub cached: bool,
    #[schema(value_type = Object)]
    pub quiz: Quiz,
}

//=========================================================================================
// Podcast
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(default)]
pub struct PodcastRequest {
    /// `interview`, `monologue`, `discussion` or `debate`.
    #[schema(value_type = String, example = "interview")]
    pub format: PodcastFormat,
    #[schema(example = "15-20 minutes")]
    pub duration: String,
    #[schema(example = "Students")]
    pub target_audience: String,
}

impl Default for PodcastRequest {
    fn default() -> Self {
        let options = PodcastOptions::default();
        Self {
            format: options.format,
            duration: options.duration,
            target_audience: options.target_audience,
        }
    }
}

impl From<PodcastRequest> for PodcastOptions {
    fn from(req: PodcastRequest) -> Self {
        PodcastOptions {
            format: req.format,
            duration: req.duration,
            target_audience: req.target_audience,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PodcastScriptResponse {
    #[schema(value_type = Object)]
    pub script: PodcastScript,
}

fn default_voice() -> String {
    "alloy".to_string()
}

#[derive(Deserialize, ToSchema)]
pub struct AudioRequest {
    /// `alloy`, `echo`, `fable`, `onyx`, `nova` or `shimmer`.
    #[serde(default = "default_voice")]
    #[schema(example = "alloy")]
    pub voice: String,
}

#[derive(Serialize, ToSchema)]
pub struct PodcastAudioResponse {
    #[schema(value_type = Object)]
    pub audio: PodcastAudio,
}
