//! crates/course_assistant_core/src/domain.rs
//!
//! Defines the core data structures for a course-authoring session.
//! Generated artifacts derive `Deserialize` because they are decoded straight
//! from the JSON objects the text-generation model is asked to emit.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Course Metadata
//=========================================================================================

/// Difficulty level of the course as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
            Difficulty::Expert => "Expert",
        };
        f.write_str(label)
    }
}

/// The course being authored. Mutated in place as the user edits its fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub duration: String,
    pub difficulty: Difficulty,
    /// Free-text module count as typed by the user, see [`Course::module_count`].
    pub target_modules: String,
    pub price: String,
}

impl Course {
    /// Number of modules to generate. Unparsable or zero input counts as one module.
    pub fn module_count(&self) -> u32 {
        match self.target_modules.trim().parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => 1,
        }
    }

    /// True when both the title and the description have been filled in.
    pub fn has_basics(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }
}

/// A partial update of the course fields; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub target_modules: Option<String>,
    pub price: Option<String>,
}

impl CourseUpdate {
    pub fn apply(self, course: &mut Course) {
        if let Some(title) = self.title {
            course.title = title;
        }
        if let Some(description) = self.description {
            course.description = description;
        }
        if let Some(category) = self.category {
            course.category = Some(category).filter(|c| !c.trim().is_empty());
        }
        if let Some(duration) = self.duration {
            course.duration = duration;
        }
        if let Some(difficulty) = self.difficulty {
            course.difficulty = difficulty;
        }
        if let Some(target_modules) = self.target_modules {
            course.target_modules = target_modules;
        }
        if let Some(price) = self.price {
            course.price = price;
        }
    }
}

/// The three ordered, user-editable lists attached to a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Objectives,
    Prerequisites,
    Methods,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ListKind::Objectives => "learning objectives",
            ListKind::Prerequisites => "prerequisites",
            ListKind::Methods => "learning methods",
        };
        f.write_str(label)
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "objectives" => Ok(ListKind::Objectives),
            "prerequisites" => Ok(ListKind::Prerequisites),
            "methods" => Ok(ListKind::Methods),
            other => Err(format!(
                "Unknown list '{}'. Use 'objectives', 'prerequisites' or 'methods'.",
                other
            )),
        }
    }
}

//=========================================================================================
// Uploaded Reference Documents
//=========================================================================================

/// Characters of extracted text kept as a document preview.
pub const DOCUMENT_PREVIEW_CHARS: usize = 1000;

/// A reference document uploaded into the session. Identified by its file name.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedDocument {
    pub name: String,
    /// Lower-cased extension including the leading dot, e.g. `.pdf`.
    pub file_type: String,
    pub size: usize,
    pub preview: String,
}

impl UploadedDocument {
    pub fn new(name: String, file_type: String, size: usize, full_text: &str) -> Self {
        Self {
            name,
            file_type,
            size,
            preview: preview_of(full_text),
        }
    }
}

/// First [`DOCUMENT_PREVIEW_CHARS`] characters of `text`, with `...` appended when cut.
pub fn preview_of(text: &str) -> String {
    if text.chars().count() > DOCUMENT_PREVIEW_CHARS {
        let mut preview: String = text.chars().take(DOCUMENT_PREVIEW_CHARS).collect();
        preview.push_str("...");
        preview
    } else {
        text.to_string()
    }
}

/// Embedding vectors per document name, one vector per text chunk.
pub type DocumentEmbeddingSet = HashMap<String, Vec<Vec<f32>>>;

//=========================================================================================
// Course Structure
//=========================================================================================

/// The generated outline: an ordered list of modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseStructure {
    pub modules: Vec<Module>,
}

impl CourseStructure {
    pub fn find_module(&self, module_number: u32) -> Option<&Module> {
        self.modules.iter().find(|m| m.module_number == module_number)
    }

    pub fn find_chapter(&self, module_number: u32, chapter_number: f64) -> Option<(&Module, &Chapter)> {
        let module = self.find_module(module_number)?;
        let chapter = module
            .chapters
            .iter()
            .find(|c| c.chapter_number == chapter_number)?;
        Some((module, chapter))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(deserialize_with = "lenient::whole_number")]
    pub module_number: u32,
    pub module_title: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Decimal `module.index` numbering, e.g. `1.2`.
    #[serde(deserialize_with = "lenient::number")]
    pub chapter_number: f64,
    pub chapter_title: String,
    pub description: String,
    pub key_points: Vec<String>,
}

/// Cache key of a chapter's generated content.
pub fn chapter_content_key(module_number: u32, chapter_number: f64) -> String {
    format!("{}_{}", module_number, chapter_number)
}

/// Cache key of a module's generated quiz.
pub fn quiz_key(module_number: u32) -> String {
    format!("module_{}_quiz", module_number)
}

//=========================================================================================
// Chapter Content
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterContent {
    pub introduction: String,
    pub sections: Vec<ContentSection>,
    pub conclusion: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub question: String,
    pub answer: String,
}

//=========================================================================================
// Quizzes
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizDifficulty {
    VeryEasy,
    Easy,
    #[default]
    Medium,
    Hard,
    VeryHard,
}

impl fmt::Display for QuizDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuizDifficulty::VeryEasy => "Very easy",
            QuizDifficulty::Easy => "Easy",
            QuizDifficulty::Medium => "Medium",
            QuizDifficulty::Hard => "Hard",
            QuizDifficulty::VeryHard => "Very hard",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    DirectQuestion,
}

impl QuestionType {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Multiple choice",
            QuestionType::TrueFalse => "True/False",
            QuestionType::DirectQuestion => "Direct questions",
        }
    }
}

/// Parameters of a quiz generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizOptions {
    pub num_questions: u32,
    pub difficulty: QuizDifficulty,
    pub question_types: Vec<QuestionType>,
}

impl QuizOptions {
    pub const MAX_QUESTIONS: u32 = 50;
}

impl Default for QuizOptions {
    fn default() -> Self {
        Self {
            num_questions: 10,
            difficulty: QuizDifficulty::Medium,
            question_types: vec![
                QuestionType::MultipleChoice,
                QuestionType::TrueFalse,
                QuestionType::DirectQuestion,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub module_title: String,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub module_number: u32,
    pub quiz_title: String,
    pub difficulty_level: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(deserialize_with = "lenient::whole_number")]
    pub question_number: u32,
    pub question_text: String,
    pub question_type: String,
    /// Only present for multiple-choice and true/false questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Models sometimes answer true/false questions with a JSON boolean.
    #[serde(deserialize_with = "lenient::text")]
    pub correct_answer: String,
    pub explanation: String,
}

impl Question {
    /// Options prefixed with their display letter: `A. ...`, `B. ...`.
    pub fn lettered_options(&self) -> Vec<String> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("{}. {}", option_letter(i), option))
            .collect()
    }
}

/// Display letter for the option at `index` (0 → `A`). Wraps after `Z`.
pub fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

//=========================================================================================
// Podcast
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PodcastFormat {
    #[default]
    Interview,
    Monologue,
    Discussion,
    Debate,
}

impl PodcastFormat {
    /// Whether the script should be written as a dialogue between several voices.
    pub fn is_dialogue(&self) -> bool {
        matches!(self, PodcastFormat::Interview | PodcastFormat::Discussion)
    }
}

impl fmt::Display for PodcastFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PodcastFormat::Interview => "Interview",
            PodcastFormat::Monologue => "Monologue",
            PodcastFormat::Discussion => "Discussion",
            PodcastFormat::Debate => "Debate",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodcastOptions {
    pub format: PodcastFormat,
    pub duration: String,
    pub target_audience: String,
}

impl Default for PodcastOptions {
    fn default() -> Self {
        Self {
            format: PodcastFormat::Interview,
            duration: "15-20 minutes".to_string(),
            target_audience: "Students".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastScript {
    pub podcast_title: String,
    pub format: String,
    pub duration: String,
    pub target_audience: String,
    #[serde(default)]
    pub participants: Vec<String>,
    pub script_sections: Vec<ScriptSection>,
}

impl PodcastScript {
    /// The spoken text: every section's content followed by a blank line.
    pub fn full_text(&self) -> String {
        self.script_sections
            .iter()
            .map(|section| format!("{}\n\n", section.content))
            .collect()
    }

    /// File name for the rendered audio of this script.
    pub fn audio_file_name(&self) -> String {
        let stem: String = self
            .podcast_title
            .trim()
            .chars()
            .filter(|c| !c.is_control() && !matches!(c, '"' | '\\' | '/'))
            .map(|c| if c == ' ' { '_' } else { c })
            .collect();
        if stem.is_empty() {
            "podcast.mp3".to_string()
        } else {
            format!("{}.mp3", stem)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSection {
    pub section_title: String,
    pub content: String,
}

/// Speech-synthesis voices offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            Voice::Alloy => "alloy",
            Voice::Echo => "echo",
            Voice::Fable => "fable",
            Voice::Onyx => "onyx",
            Voice::Nova => "nova",
            Voice::Shimmer => "shimmer",
        };
        f.write_str(id)
    }
}

impl FromStr for Voice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alloy" => Ok(Voice::Alloy),
            "echo" => Ok(Voice::Echo),
            "fable" => Ok(Voice::Fable),
            "onyx" => Ok(Voice::Onyx),
            "nova" => Ok(Voice::Nova),
            "shimmer" => Ok(Voice::Shimmer),
            other => Err(format!("Unknown voice '{}'", other)),
        }
    }
}

/// Synthesized podcast audio, base64-encoded for transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PodcastAudio {
    pub audio_base64: String,
    /// Rough estimate: audio byte length divided by 16000.
    pub duration_seconds: f64,
    pub format: String,
}

impl PodcastAudio {
    /// The raw MP3 bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.audio_base64)
    }
}

//=========================================================================================
// Text Providers
//=========================================================================================

/// Remote text-generation vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextProvider {
    #[default]
    OpenAi,
    Anthropic,
}

impl TextProvider {
    /// Environment variable holding this provider's API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            TextProvider::OpenAi => "OPENAI_API_KEY",
            TextProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn vendor_name(&self) -> &'static str {
        match self {
            TextProvider::OpenAi => "OpenAI",
            TextProvider::Anthropic => "Anthropic",
        }
    }
}

impl fmt::Display for TextProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextProvider::OpenAi => f.write_str("openai"),
            TextProvider::Anthropic => f.write_str("anthropic"),
        }
    }
}

impl FromStr for TextProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(TextProvider::OpenAi),
            "anthropic" => Ok(TextProvider::Anthropic),
            other => Err(format!(
                "Unsupported API provider: {}. Use 'openai' or 'anthropic'.",
                other
            )),
        }
    }
}

//=========================================================================================
// Lenient Decoding of Model Replies
//=========================================================================================

/// Field decoders for values models emit with inconsistent JSON types, such as
/// `"1.1"` for a chapter number or `false` for a true/false answer.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Whole(u64),
        Float(f64),
        Text(String),
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Scalar::deserialize(deserializer)? {
            Scalar::Whole(n) => Ok(n as f64),
            Scalar::Float(n) => Ok(n),
            Scalar::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected a number, got \"{}\"", s))),
            Scalar::Bool(b) => Err(D::Error::custom(format!("expected a number, got {}", b))),
        }
    }

    pub fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let n = number(deserializer)?;
        if n.fract() == 0.0 && n >= 0.0 && n <= f64::from(u32::MAX) {
            Ok(n as u32)
        } else {
            Err(D::Error::custom(format!("expected a whole number, got {}", n)))
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Scalar::deserialize(deserializer)? {
            Scalar::Bool(true) => "True".to_string(),
            Scalar::Bool(false) => "False".to_string(),
            Scalar::Whole(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Text(s) => s,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_count_falls_back_to_one() {
        let mut course = Course::default();
        assert_eq!(course.module_count(), 1);
        course.target_modules = "abc".to_string();
        assert_eq!(course.module_count(), 1);
        course.target_modules = "0".to_string();
        assert_eq!(course.module_count(), 1);
        course.target_modules = " 4 ".to_string();
        assert_eq!(course.module_count(), 4);
    }

    #[test]
    fn course_update_only_touches_given_fields() {
        let mut course = Course {
            title: "Old".to_string(),
            description: "Desc".to_string(),
            ..Default::default()
        };
        CourseUpdate {
            title: Some("New".to_string()),
            difficulty: Some(Difficulty::Advanced),
            ..Default::default()
        }
        .apply(&mut course);
        assert_eq!(course.title, "New");
        assert_eq!(course.description, "Desc");
        assert_eq!(course.difficulty, Difficulty::Advanced);
    }

    #[test]
    fn keys_use_decimal_chapter_numbers() {
        assert_eq!(chapter_content_key(1, 1.2), "1_1.2");
        assert_eq!(quiz_key(3), "module_3_quiz");
    }

    #[test]
    fn preview_is_truncated_with_ellipsis() {
        let long = "é".repeat(1200);
        let preview = preview_of(&long);
        assert_eq!(preview.chars().count(), DOCUMENT_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
        assert_eq!(preview_of("short"), "short");
    }

    #[test]
    fn options_are_lettered_by_position() {
        let question = Question {
            question_number: 1,
            question_text: "Pick one".to_string(),
            question_type: "Multiple choice".to_string(),
            options: vec!["Mean".into(), "Median".into(), "Mode".into(), "Range".into()],
            correct_answer: "Mean".to_string(),
            explanation: String::new(),
        };
        assert_eq!(
            question.lettered_options(),
            vec!["A. Mean", "B. Median", "C. Mode", "D. Range"]
        );
    }

    #[test]
    fn podcast_full_text_joins_sections() {
        let script = PodcastScript {
            podcast_title: "Stats Talk".to_string(),
            format: "Interview".to_string(),
            duration: "10 minutes".to_string(),
            target_audience: "Students".to_string(),
            participants: vec![],
            script_sections: vec![
                ScriptSection { section_title: "Intro".into(), content: "Hello".into() },
                ScriptSection { section_title: "End".into(), content: "Bye".into() },
            ],
        };
        assert_eq!(script.full_text(), "Hello\n\nBye\n\n");
        assert_eq!(script.audio_file_name(), "Stats_Talk.mp3");
    }

    #[test]
    fn provider_identifiers_are_exact() {
        assert_eq!("openai".parse::<TextProvider>(), Ok(TextProvider::OpenAi));
        assert_eq!("anthropic".parse::<TextProvider>(), Ok(TextProvider::Anthropic));
        assert!("gemini".parse::<TextProvider>().is_err());
    }

    #[test]
    fn chapter_lookup_by_decimal_number() {
        let structure: CourseStructure = serde_json::from_str(
            r#"{"modules":[{"module_number":1,"module_title":"Basics","chapters":[
                {"chapter_number":1.1,"chapter_title":"Mean","description":"d","key_points":["a"]},
                {"chapter_number":1.2,"chapter_title":"Median","description":"d","key_points":["b"]}
            ]}]}"#,
        )
        .unwrap();
        let (module, chapter) = structure.find_chapter(1, 1.2).unwrap();
        assert_eq!(module.module_title, "Basics");
        assert_eq!(chapter.chapter_title, "Median");
        assert!(structure.find_chapter(2, 2.1).is_none());
    }
    #[test]
    fn numbers_given_as_strings_are_accepted() {
        let structure: CourseStructure = serde_json::from_str(
            r#"{"modules":[{"module_number":"2","module_title":"Spread","chapters":[
                {"chapter_number":"2.1","chapter_title":"Range","description":"d","key_points":[]}
            ]}]}"#,
        )
        .unwrap();
        let (module, chapter) = structure.find_chapter(2, 2.1).unwrap();
        assert_eq!(module.module_number, 2);
        assert_eq!(chapter.chapter_number, 2.1);
    }

    #[test]
    fn non_numeric_chapter_number_is_rejected() {
        let err = serde_json::from_str::<Chapter>(
            r#"{"chapter_number":"one","chapter_title":"t","description":"d","key_points":[]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected a number"));
        assert!(serde_json::from_str::<Module>(
            r#"{"module_number":1.5,"module_title":"t","chapters":[]}"#
        )
        .is_err());
    }

    #[test]
    fn boolean_and_numeric_answers_become_text() {
        let quiz: Quiz = serde_json::from_str(
            r#"{"module_title":"Basics","module_number":"1","quiz_title":"Check",
                "difficulty_level":"Easy","questions":[
                {"question_number":1,"question_text":"Is the mean robust?","question_type":"True/False",
                 "options":["True","False"],"correct_answer":false,"explanation":"Outliers."},
                {"question_number":"2","question_text":"Mean of 2 and 4?","question_type":"Direct questions",
                 "correct_answer":3,"explanation":"Sum over count."}
            ]}"#,
        )
        .unwrap();
        assert_eq!(quiz.module_number, 1);
        assert_eq!(quiz.questions[0].correct_answer, "False");
        assert_eq!(quiz.questions[1].question_number, 2);
        assert_eq!(quiz.questions[1].correct_answer, "3");
    }

    #[test]
    fn audio_file_name_is_safe_for_headers() {
        let mut script = PodcastScript {
            podcast_title: "Stats \"Live\"\t/ Q&A\\".to_string(),
            format: "Interview".to_string(),
            duration: "10 minutes".to_string(),
            target_audience: "Students".to_string(),
            participants: vec![],
            script_sections: vec![],
        };
        assert_eq!(script.audio_file_name(), "Stats_Live_Q&A.mp3");
        script.podcast_title = "\"/\"".to_string();
        assert_eq!(script.audio_file_name(), "podcast.mp3");
    }
}
