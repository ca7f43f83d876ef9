//! Course outline generation and the reference material that can anchor it.

use super::ContentGenerator;
use crate::domain::{Course, CourseStructure, DocumentEmbeddingSet, UploadedDocument};
use crate::error::{GenerationError, GenerationResult};
use tracing::{debug, info};

/// Characters of reference text placed in a prompt.
pub const REFERENCE_EXCERPT_CHARS: usize = 2000;

const STRUCTURE_SYSTEM: &str = "You are an expert in pedagogy and course design. \
    You must create a detailed and coherent course structure.";

/// Reference text and embeddings drawn from the uploaded documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceMaterial {
    /// Document previews joined by a blank line.
    pub text: String,
    /// Embeddings of the first uploaded document. Accepted but not yet used
    /// for retrieval.
    pub embeddings: Vec<Vec<f32>>,
}

impl ReferenceMaterial {
    /// Collects the material from the session's documents, or `None` when
    /// nothing has been uploaded.
    pub fn from_documents(
        documents: &[UploadedDocument],
        embeddings: &DocumentEmbeddingSet,
    ) -> Option<Self> {
        let first = documents.first()?;
        let text = documents
            .iter()
            .map(|doc| doc.preview.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Some(Self {
            text,
            embeddings: embeddings.get(&first.name).cloned().unwrap_or_default(),
        })
    }

    /// The first `REFERENCE_EXCERPT_CHARS` characters followed by `...`.
    pub fn excerpt(&self) -> String {
        let head: String = self.text.chars().take(REFERENCE_EXCERPT_CHARS).collect();
        format!("{}...", head)
    }

    /// Context line appended to a prompt, empty when there is no text.
    pub(crate) fn prompt_context(reference: Option<&Self>) -> String {
        match reference {
            Some(material) if !material.text.is_empty() => {
                debug!(
                    vectors = material.embeddings.len(),
                    "Attaching reference material to prompt"
                );
                format!("\nReference document content: {}", material.excerpt())
            }
            _ => String::new(),
        }
    }
}

fn structure_prompt(course: &Course, num_modules: u32, reference: Option<&ReferenceMaterial>) -> String {
    let context = format!(
        "Course title: {}\n\
         Course description: {}\n\
         Duration: {}\n\
         Difficulty level: {}\n\
         Requested number of modules: {}{}",
        course.title,
        course.description,
        course.duration,
        course.difficulty,
        num_modules,
        ReferenceMaterial::prompt_context(reference)
    );

    format!(
        r#"As an expert in pedagogy and course design, create a complete hierarchical structure for a course with the following context:

{context}

Generate a course structure with:
1. {num_modules} numbered and titled modules
2. For each module, 3 to 5 numbered and titled chapters
3. For each chapter, a short description of its content (2-3 sentences)
4. For each chapter, 3 to 5 key points that will be covered

The structure must be progressive, coherent and suited to the stated difficulty level.
Make sure modules and chapters follow on logically and cover the whole subject.
Number chapters as module.chapter, for example 1.1, 1.2, 2.1.

Return the structure as a JSON object shaped as follows:
{{
    "modules": [
        {{
            "module_number": 1,
            "module_title": "Title of module 1",
            "chapters": [
                {{
                    "chapter_number": 1.1,
                    "chapter_title": "Title of chapter 1.1",
                    "description": "Description of chapter 1.1",
                    "key_points": ["Key point 1", "Key point 2", "Key point 3"]
                }},
                ...
            ]
        }},
        ...
    ]
}}"#
    )
}

impl ContentGenerator {
    /// Generates the module and chapter outline for `course`.
    pub async fn generate_course_structure(
        &self,
        course: &Course,
        reference: Option<&ReferenceMaterial>,
    ) -> GenerationResult<CourseStructure> {
        let num_modules = course.module_count();
        let prompt = structure_prompt(course, num_modules, reference);
        let structure: CourseStructure = self.complete_json(STRUCTURE_SYSTEM, prompt).await?;

        if structure.modules.is_empty() {
            return Err(GenerationError::Parse(
                "the course structure contains no modules".to_string(),
            ));
        }
        info!(
            "Generated course structure with {} modules (requested {})",
            structure.modules.len(),
            num_modules
        );
        Ok(structure)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::generator;
    use super::*;
    use crate::ports::MockCompletionService;
    use std::collections::HashMap;

    const TWO_MODULES: &str = r#"{
        "modules": [
            {"module_number": 1, "module_title": "Describing data", "chapters": [
                {"chapter_number": 1.1, "chapter_title": "Variables", "description": "Types of variables.", "key_points": ["Nominal", "Ordinal", "Numeric"]},
                {"chapter_number": 1.2, "chapter_title": "Central tendency", "description": "Mean and median.", "key_points": ["Mean", "Median", "Mode"]},
                {"chapter_number": 1.3, "chapter_title": "Spread", "description": "Variance.", "key_points": ["Range", "Variance", "IQR"]}
            ]},
            {"module_number": 2, "module_title": "Visualising data", "chapters": [
                {"chapter_number": 2.1, "chapter_title": "Histograms", "description": "Bins.", "key_points": ["Bins", "Shape", "Skew"]},
                {"chapter_number": 2.2, "chapter_title": "Box plots", "description": "Quartiles.", "key_points": ["Quartiles", "Whiskers", "Outliers"]},
                {"chapter_number": 2.3, "chapter_title": "Scatter plots", "description": "Pairs.", "key_points": ["Axes", "Trend", "Correlation"]}
            ]}
        ]
    }"#;

    fn course() -> Course {
        Course {
            title: "Intro to Statistics".to_string(),
            description: "Basics of descriptive statistics".to_string(),
            target_modules: "2".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn structure_matches_requested_module_count() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .times(1)
            .withf(|_, req| {
                req.json_object
                    && req.messages[1].content.contains("Requested number of modules: 2")
                    && !req.messages[1].content.contains("Reference document content")
            })
            .returning(|_, _| Ok(TWO_MODULES.to_string()));

        let structure = generator(mock).generate_course_structure(&course(), None).await.unwrap();

        assert_eq!(structure.modules.len(), 2);
        for module in &structure.modules {
            assert!((3..=5).contains(&module.chapters.len()));
            for (i, chapter) in module.chapters.iter().enumerate() {
                assert_eq!(
                    chapter.chapter_number.to_string(),
                    format!("{}.{}", module.module_number, i + 1)
                );
            }
        }
    }

    #[tokio::test]
    async fn reference_excerpt_is_appended() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .withf(|_, req| {
                req.messages[1]
                    .content
                    .contains("Reference document content: Chapter one of the handbook...")
            })
            .returning(|_, _| Ok(TWO_MODULES.to_string()));

        let reference = ReferenceMaterial {
            text: "Chapter one of the handbook".to_string(),
            embeddings: vec![vec![0.1; 4]],
        };
        assert!(generator(mock)
            .generate_course_structure(&course(), Some(&reference))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn missing_schema_keys_are_a_parse_error() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .returning(|_, _| Ok(r#"{"modules":[{"module_number":1}]}"#.to_string()));

        let err = generator(mock).generate_course_structure(&course(), None).await.unwrap_err();
        assert!(matches!(err, GenerationError::Parse(_)));
    }

    #[test]
    fn reference_material_joins_previews_and_uses_first_embeddings() {
        let docs = vec![
            UploadedDocument::new("a.txt".into(), ".txt".into(), 3, "AAA"),
            UploadedDocument::new("b.txt".into(), ".txt".into(), 3, "BBB"),
        ];
        let mut embeddings = HashMap::new();
        embeddings.insert("a.txt".to_string(), vec![vec![1.0]]);
        embeddings.insert("b.txt".to_string(), vec![vec![2.0]]);

        let material = ReferenceMaterial::from_documents(&docs, &embeddings).unwrap();
        assert_eq!(material.text, "AAA\n\nBBB");
        assert_eq!(material.embeddings, vec![vec![1.0]]);
        assert!(ReferenceMaterial::from_documents(&[], &embeddings).is_none());
    }

    #[test]
    fn excerpt_is_capped() {
        let material = ReferenceMaterial { text: "x".repeat(5000), embeddings: vec![] };
        assert_eq!(material.excerpt().len(), REFERENCE_EXCERPT_CHARS + 3);
    }
}
