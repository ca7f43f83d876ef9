//! crates/course_assistant_core/src/session.rs
//!
//! The course-authoring session: all mutable state of one user session and
//! the actions that fill it in. Per-key artifacts (chapter content, quizzes)
//! are generated at most once unless explicitly regenerated or invalidated;
//! singleton artifacts are replaced on every generation. A failed action never
//! touches the stored state.

use crate::audio::AudioSynthesizer;
use crate::credentials::ApiKeys;
use crate::domain::{
    chapter_content_key, quiz_key, ChapterContent, Course, CourseStructure, CourseUpdate,
    DocumentEmbeddingSet, ListKind, PodcastAudio, PodcastOptions, PodcastScript, Quiz,
    QuizOptions, TextProvider, UploadedDocument, Voice,
};
use crate::error::{GenerationError, GenerationResult};
use crate::generators::{enhancer_for, ContentGenerator, GenerationSettings, ReferenceMaterial};
use crate::ingestion::{ChunkerConfig, DocumentPipeline, Embedder, UploadLimits};
use crate::ports::{CompletionService, EmbeddingService, TextToSpeechService};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

//=========================================================================================
// Shared Services
//=========================================================================================

/// The provider transports the session talks to.
#[derive(Clone)]
pub struct ProviderPorts {
    pub openai: Arc<dyn CompletionService>,
    pub anthropic: Arc<dyn CompletionService>,
    pub embeddings: Arc<dyn EmbeddingService>,
    pub speech: Arc<dyn TextToSpeechService>,
}

/// Tunables for the services shared by every session.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub generation: GenerationSettings,
    pub embedding_model: String,
    pub tts_model: String,
    pub chunker: ChunkerConfig,
    pub limits: UploadLimits,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            generation: GenerationSettings::default(),
            embedding_model: "text-embedding-3-small".to_string(),
            tts_model: "tts-1".to_string(),
            chunker: ChunkerConfig::default(),
            limits: UploadLimits::default(),
        }
    }
}

/// Stateless services shared by all sessions, built once at startup.
pub struct AssistantServices {
    ports: ProviderPorts,
    keys: ApiKeys,
    settings: GenerationSettings,
    generator: ContentGenerator,
    pipeline: DocumentPipeline,
    synthesizer: AudioSynthesizer,
    limits: UploadLimits,
}

impl AssistantServices {
    pub fn new(ports: ProviderPorts, keys: ApiKeys, config: AssistantConfig) -> Self {
        let generator =
            ContentGenerator::new(ports.openai.clone(), keys.clone(), config.generation.clone());
        let pipeline = DocumentPipeline::new(
            Embedder::new(ports.embeddings.clone(), config.embedding_model),
            config.chunker,
        );
        let synthesizer = AudioSynthesizer::new(ports.speech.clone(), config.tts_model);
        Self {
            ports,
            keys,
            settings: config.generation,
            generator,
            pipeline,
            synthesizer,
            limits: config.limits,
        }
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }
}

//=========================================================================================
// Exports
//=========================================================================================

/// A downloadable artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

/// Pretty JSON with four-space indentation, non-ASCII kept as is.
fn indented_json<T: Serialize>(value: &T) -> GenerationResult<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| GenerationError::Parse(e.to_string()))?;
    Ok(out)
}

//=========================================================================================
// Session Snapshot
//=========================================================================================

/// Everything a session holds, for display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub course: Course,
    pub enhanced_description: Option<String>,
    pub learning_objectives: Vec<String>,
    pub prerequisites: Vec<String>,
    pub learning_methods: Vec<String>,
    pub documents: Vec<UploadedDocument>,
    pub course_structure: Option<CourseStructure>,
    pub chapter_contents: BTreeMap<String, ChapterContent>,
    pub quizzes: BTreeMap<String, Quiz>,
    pub podcast_script: Option<PodcastScript>,
    pub podcast_audio: Option<PodcastAudio>,
}

//=========================================================================================
// The Session
//=========================================================================================

pub struct CourseSession {
    services: Arc<AssistantServices>,
    course: Course,
    enhanced_description: Option<String>,
    learning_objectives: Vec<String>,
    prerequisites: Vec<String>,
    learning_methods: Vec<String>,
    documents: Vec<UploadedDocument>,
    document_embeddings: DocumentEmbeddingSet,
    course_structure: Option<CourseStructure>,
    chapter_contents: BTreeMap<String, ChapterContent>,
    quizzes: BTreeMap<String, Quiz>,
    podcast_script: Option<PodcastScript>,
    podcast_audio: Option<PodcastAudio>,
}

impl CourseSession {
    pub fn new(services: Arc<AssistantServices>) -> Self {
        Self {
            services,
            course: Course::default(),
            enhanced_description: None,
            learning_objectives: Vec::new(),
            prerequisites: Vec::new(),
            learning_methods: Vec::new(),
            documents: Vec::new(),
            document_embeddings: DocumentEmbeddingSet::new(),
            course_structure: None,
            chapter_contents: BTreeMap::new(),
            quizzes: BTreeMap::new(),
            podcast_script: None,
            podcast_audio: None,
        }
    }

    fn require_basics(&self) -> GenerationResult<()> {
        if self.course.has_basics() {
            Ok(())
        } else {
            Err(GenerationError::InvalidInput(
                "Please fill in the course title and description first.".to_string(),
            ))
        }
    }

    fn require_structure(&self) -> GenerationResult<&CourseStructure> {
        self.course_structure.as_ref().ok_or_else(|| {
            GenerationError::NotFound("No course structure has been generated yet.".to_string())
        })
    }

    fn reference_material(&self) -> Option<ReferenceMaterial> {
        ReferenceMaterial::from_documents(&self.documents, &self.document_embeddings)
    }

    //-------------------------------------------------------------------------------------
    // Course metadata
    //-------------------------------------------------------------------------------------

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn update_course(&mut self, update: CourseUpdate) {
        update.apply(&mut self.course);
    }

    pub fn enhanced_description(&self) -> Option<&str> {
        self.enhanced_description.as_deref()
    }

    /// Rewrites the course description with `provider`. On success the
    /// enhanced text also becomes the course description.
    pub async fn enhance_description(&mut self, provider: TextProvider) -> GenerationResult<&str> {
        let services = self.services.clone();
        let enhancer = enhancer_for(
            provider,
            services.ports.openai.clone(),
            services.ports.anthropic.clone(),
            services.keys.clone(),
            &services.settings,
        );
        let enhanced = enhancer
            .enhance(&self.course.title, &self.course.description)
            .await?;

        info!("Course description replaced by {} enhancement", enhancer.provider());
        self.course.description = enhanced.clone();
        Ok(self.enhanced_description.insert(enhanced).as_str())
    }

    //-------------------------------------------------------------------------------------
    // Objectives, prerequisites and methods
    //-------------------------------------------------------------------------------------

    pub fn list(&self, kind: ListKind) -> &[String] {
        match kind {
            ListKind::Objectives => &self.learning_objectives,
            ListKind::Prerequisites => &self.prerequisites,
            ListKind::Methods => &self.learning_methods,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<String> {
        match kind {
            ListKind::Objectives => &mut self.learning_objectives,
            ListKind::Prerequisites => &mut self.prerequisites,
            ListKind::Methods => &mut self.learning_methods,
        }
    }

    pub fn learning_objectives(&self) -> &[String] {
        &self.learning_objectives
    }

    pub fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    pub fn learning_methods(&self) -> &[String] {
        &self.learning_methods
    }

    /// Generates the list of `kind`, replacing the current one.
    pub async fn generate_list(&mut self, kind: ListKind) -> GenerationResult<&[String]> {
        self.require_basics()?;
        let items = self.services.generator.generate_list(kind, &self.course).await?;
        let list = self.list_mut(kind);
        *list = items;
        Ok(list.as_slice())
    }

    pub async fn generate_learning_objectives(&mut self) -> GenerationResult<&[String]> {
        self.generate_list(ListKind::Objectives).await
    }

    pub async fn generate_prerequisites(&mut self) -> GenerationResult<&[String]> {
        self.generate_list(ListKind::Prerequisites).await
    }

    pub async fn generate_learning_methods(&mut self) -> GenerationResult<&[String]> {
        self.generate_list(ListKind::Methods).await
    }

    pub fn add_list_item(&mut self, kind: ListKind, text: &str) -> GenerationResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::InvalidInput("List items cannot be empty.".to_string()));
        }
        self.list_mut(kind).push(text.to_string());
        Ok(())
    }

    pub fn update_list_item(&mut self, kind: ListKind, index: usize, text: &str) -> GenerationResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::InvalidInput("List items cannot be empty.".to_string()));
        }
        let item = self
            .list_mut(kind)
            .get_mut(index)
            .ok_or_else(|| out_of_range(kind, index))?;
        *item = text.to_string();
        Ok(())
    }

    /// Removes and returns the item at `index`; later items shift down.
    pub fn remove_list_item(&mut self, kind: ListKind, index: usize) -> GenerationResult<String> {
        let list = self.list_mut(kind);
        if index >= list.len() {
            return Err(out_of_range(kind, index));
        }
        Ok(list.remove(index))
    }

    //-------------------------------------------------------------------------------------
    // Reference documents
    //-------------------------------------------------------------------------------------

    pub fn documents(&self) -> &[UploadedDocument] {
        &self.documents
    }

    pub fn document_embeddings(&self) -> &DocumentEmbeddingSet {
        &self.document_embeddings
    }

    /// Extracts, chunks and embeds an uploaded file. A name that was already
    /// uploaded returns the existing record without reprocessing.
    pub async fn upload_document(&mut self, name: &str, bytes: &[u8]) -> GenerationResult<UploadedDocument> {
        let api_key = self.services.keys.resolve(TextProvider::OpenAi)?;

        if let Some(existing) = self.documents.iter().find(|doc| doc.name == name) {
            info!("Document {} already uploaded, skipping", name);
            return Ok(existing.clone());
        }

        let kind = self.services.limits.validate(name, bytes.len())?;
        let processed = self.services.pipeline.process(&api_key, bytes, name).await?;

        let document = UploadedDocument::new(
            name.to_string(),
            kind.extension().to_string(),
            bytes.len(),
            &processed.text,
        );
        self.document_embeddings.insert(name.to_string(), processed.embeddings);
        self.documents.push(document.clone());
        info!("Document {} added to the session", name);
        Ok(document)
    }

    //-------------------------------------------------------------------------------------
    // Course structure
    //-------------------------------------------------------------------------------------

    pub fn course_structure(&self) -> Option<&CourseStructure> {
        self.course_structure.as_ref()
    }

    /// Generates the outline, replacing the previous tree wholesale. Cached
    /// chapter content and quizzes are kept.
    pub async fn generate_course_structure(&mut self) -> GenerationResult<&CourseStructure> {
        self.require_basics()?;
        let reference = self.reference_material();
        let structure = self
            .services
            .generator
            .generate_course_structure(&self.course, reference.as_ref())
            .await?;
        Ok(self.course_structure.insert(structure))
    }

    //-------------------------------------------------------------------------------------
    // Chapter content
    //-------------------------------------------------------------------------------------

    pub fn cached_chapter_content(&self, module_number: u32, chapter_number: f64) -> Option<&ChapterContent> {
        self.chapter_contents
            .get(&chapter_content_key(module_number, chapter_number))
    }

    async fn build_chapter_content(&self, module_number: u32, chapter_number: f64) -> GenerationResult<ChapterContent> {
        let (module, chapter) = self
            .require_structure()?
            .find_chapter(module_number, chapter_number)
            .ok_or_else(|| {
                GenerationError::NotFound(format!(
                    "Chapter {} of module {} does not exist.",
                    chapter_number, module_number
                ))
            })?;
        let reference = self.reference_material();
        self.services
            .generator
            .generate_chapter_content(&self.course, module, chapter, reference.as_ref())
            .await
    }

    /// Returns the chapter's content, generating it only when it is not cached.
    pub async fn chapter_content(&mut self, module_number: u32, chapter_number: f64) -> GenerationResult<&ChapterContent> {
        let key = chapter_content_key(module_number, chapter_number);
        if self.chapter_contents.contains_key(&key) {
            return Ok(&self.chapter_contents[&key]);
        }
        let content = self.build_chapter_content(module_number, chapter_number).await?;
        Ok(&*self.chapter_contents.entry(key).or_insert(content))
    }

    /// Generates the chapter's content even when cached, replacing the cached
    /// value only on success.
    pub async fn regenerate_chapter_content(&mut self, module_number: u32, chapter_number: f64) -> GenerationResult<&ChapterContent> {
        let content = self.build_chapter_content(module_number, chapter_number).await?;
        let key = chapter_content_key(module_number, chapter_number);
        info!("Chapter content {} regenerated", key);
        self.chapter_contents.insert(key.clone(), content);
        Ok(&self.chapter_contents[&key])
    }

    /// Drops the cached content. Returns whether anything was cached.
    pub fn invalidate_chapter_content(&mut self, module_number: u32, chapter_number: f64) -> bool {
        self.chapter_contents
            .remove(&chapter_content_key(module_number, chapter_number))
            .is_some()
    }

    //-------------------------------------------------------------------------------------
    // Quizzes
    //-------------------------------------------------------------------------------------

    pub fn cached_quiz(&self, module_number: u32) -> Option<&Quiz> {
        self.quizzes.get(&quiz_key(module_number))
    }

    async fn build_quiz(&self, module_number: u32, options: &QuizOptions) -> GenerationResult<Quiz> {
        let module = self
            .require_structure()?
            .find_module(module_number)
            .ok_or_else(|| {
                GenerationError::NotFound(format!("Module {} does not exist.", module_number))
            })?;
        self.services
            .generator
            .generate_quiz(&self.course.title, module, options)
            .await
    }

    /// Returns the module's quiz, generating it only when it is not cached.
    /// `options` are ignored when a cached quiz is returned.
    pub async fn module_quiz(&mut self, module_number: u32, options: &QuizOptions) -> GenerationResult<&Quiz> {
        let key = quiz_key(module_number);
        if self.quizzes.contains_key(&key) {
            return Ok(&self.quizzes[&key]);
        }
        let quiz = self.build_quiz(module_number, options).await?;
        Ok(&*self.quizzes.entry(key).or_insert(quiz))
    }

    pub async fn regenerate_module_quiz(&mut self, module_number: u32, options: &QuizOptions) -> GenerationResult<&Quiz> {
        let quiz = self.build_quiz(module_number, options).await?;
        let key = quiz_key(module_number);
        info!("Quiz {} regenerated", key);
        self.quizzes.insert(key.clone(), quiz);
        Ok(&self.quizzes[&key])
    }

    pub fn invalidate_module_quiz(&mut self, module_number: u32) -> bool {
        self.quizzes.remove(&quiz_key(module_number)).is_some()
    }

    //-------------------------------------------------------------------------------------
    // Podcast
    //-------------------------------------------------------------------------------------

    pub fn podcast_script(&self) -> Option<&PodcastScript> {
        self.podcast_script.as_ref()
    }

    pub fn podcast_audio(&self) -> Option<&PodcastAudio> {
        self.podcast_audio.as_ref()
    }

    /// Replaces the script. Audio rendered from the previous script is dropped.
    pub async fn generate_podcast_script(&mut self, options: &PodcastOptions) -> GenerationResult<&PodcastScript> {
        let structure = self.require_structure()?;
        let script = self
            .services
            .generator
            .generate_podcast_script(&self.course, structure, options)
            .await?;
        if self.podcast_audio.take().is_some() {
            info!("Previous podcast audio discarded with its script");
        }
        Ok(self.podcast_script.insert(script))
    }

    pub async fn generate_podcast_audio(&mut self, voice: Voice) -> GenerationResult<&PodcastAudio> {
        let script = self.podcast_script.as_ref().ok_or_else(|| {
            GenerationError::NotFound("Generate a podcast script first.".to_string())
        })?;
        let api_key = self.services.keys.resolve(TextProvider::OpenAi)?;
        let audio = self
            .services
            .synthesizer
            .synthesize(&api_key, &script.full_text(), voice)
            .await?;
        Ok(self.podcast_audio.insert(audio))
    }

    //-------------------------------------------------------------------------------------
    // Exports
    //-------------------------------------------------------------------------------------

    pub fn export_course_structure(&self) -> GenerationResult<ExportFile> {
        Ok(ExportFile {
            file_name: "course_structure.json".to_string(),
            content_type: "application/json",
            data: indented_json(self.require_structure()?)?,
        })
    }

    pub fn export_quiz(&self, module_number: u32) -> GenerationResult<ExportFile> {
        let quiz = self.cached_quiz(module_number).ok_or_else(|| {
            GenerationError::NotFound(format!("No quiz has been generated for module {}.", module_number))
        })?;
        Ok(ExportFile {
            file_name: format!("quiz_module_{}.json", module_number),
            content_type: "application/json",
            data: indented_json(quiz)?,
        })
    }

    fn require_script(&self) -> GenerationResult<&PodcastScript> {
        self.podcast_script.as_ref().ok_or_else(|| {
            GenerationError::NotFound("No podcast script has been generated yet.".to_string())
        })
    }

    pub fn export_podcast_script_json(&self) -> GenerationResult<ExportFile> {
        Ok(ExportFile {
            file_name: "podcast_script.json".to_string(),
            content_type: "application/json",
            data: indented_json(self.require_script()?)?,
        })
    }

    pub fn export_podcast_script_text(&self) -> GenerationResult<ExportFile> {
        Ok(ExportFile {
            file_name: "podcast_script.txt".to_string(),
            content_type: "text/plain; charset=utf-8",
            data: self.require_script()?.full_text().into_bytes(),
        })
    }

    pub fn export_podcast_audio(&self) -> GenerationResult<ExportFile> {
        let script = self.require_script()?;
        let audio = self.podcast_audio.as_ref().ok_or_else(|| {
            GenerationError::NotFound("No podcast audio has been generated yet.".to_string())
        })?;
        let data = audio.decode().map_err(|e| {
            warn!("Stored podcast audio is not valid base64: {}", e);
            GenerationError::Parse(e.to_string())
        })?;
        Ok(ExportFile {
            file_name: script.audio_file_name(),
            content_type: "audio/mpeg",
            data,
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            course: self.course.clone(),
            enhanced_description: self.enhanced_description.clone(),
            learning_objectives: self.learning_objectives.clone(),
            prerequisites: self.prerequisites.clone(),
            learning_methods: self.learning_methods.clone(),
            documents: self.documents.clone(),
            course_structure: self.course_structure.clone(),
            chapter_contents: self.chapter_contents.clone(),
            quizzes: self.quizzes.clone(),
            podcast_script: self.podcast_script.clone(),
            podcast_audio: self.podcast_audio.clone(),
        }
    }
}

fn out_of_range(kind: ListKind, index: usize) -> GenerationError {
    GenerationError::NotFound(format!("There is no item {} in the {}.", index, kind))
}
