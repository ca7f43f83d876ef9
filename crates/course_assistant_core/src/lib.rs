pub mod audio;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod generators;
pub mod ingestion;
pub mod ports;
pub mod session;

pub use credentials::ApiKeys;
pub use domain::{
    Course, CourseStructure, CourseUpdate, ListKind, PodcastOptions, QuizOptions, TextProvider,
    Voice,
};
pub use error::{GenerationError, GenerationResult};
pub use generators::{ContentGenerator, GenerationSettings};
pub use ports::{
    ChatMessage, ChatRole, CompletionRequest, CompletionService, EmbeddingService, PortError,
    PortResult, SpeechRequest, TextToSpeechService,
};
pub use session::{
    AssistantConfig, AssistantServices, CourseSession, ExportFile, ProviderPorts, SessionSnapshot,
};
