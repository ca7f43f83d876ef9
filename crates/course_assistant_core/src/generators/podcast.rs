//! Podcast scripts built from the course outline.

use super::ContentGenerator;
use crate::domain::{Course, CourseStructure, PodcastFormat, PodcastOptions, PodcastScript};
use crate::error::{GenerationError, GenerationResult};
use tracing::info;

const PODCAST_SYSTEM: &str = "You are an expert in educational audio content. \
    You must create an informative, engaging podcast script suited to audio.";

/// Title, description and the full outline, indented by level.
pub fn course_summary(course: &Course, structure: &CourseStructure) -> String {
    let mut summary = format!(
        "Course title: {}\nDescription: {}\n\nCourse structure:\n",
        course.title, course.description
    );
    for module in &structure.modules {
        summary.push_str(&format!("Module {}: {}\n", module.module_number, module.module_title));
        for chapter in &module.chapters {
            summary.push_str(&format!(
                "  - Chapter {}: {}\n",
                chapter.chapter_number, chapter.chapter_title
            ));
            summary.push_str(&format!("    Description: {}\n", chapter.description));
            summary.push_str("    Key points:\n");
            for point in &chapter.key_points {
                summary.push_str(&format!("      * {}\n", point));
            }
        }
    }
    summary
}

fn format_instructions(format: PodcastFormat) -> &'static str {
    if format.is_dialogue() {
        "Write the script as a dialogue between a host and one or more expert guests."
    } else if format == PodcastFormat::Monologue {
        "Write the script as a continuous narration by a single presenter."
    } else {
        "Write the script as an exchange of opposing viewpoints between the participants."
    }
}

fn podcast_prompt(course: &Course, structure: &CourseStructure, options: &PodcastOptions) -> String {
    format!(
        r#"As an expert in educational audio content, create a podcast script about the following course:

{summary}
Podcast characteristics:
- Format: {format}
- Target duration: {duration}
- Target audience: {audience}

The script must include:
1. An engaging introduction presenting the subject of the course
2. A clear presentation of the course's main concepts and ideas
3. Discussion of the key points of each module
4. Concrete examples and anecdotes illustrating the concepts
5. A conclusion summarising the important points and encouraging the listener to learn more

{instructions}

The script must be conversational, engaging and suited to an audio format.

Return the script as a JSON object shaped as follows:
{{
    "podcast_title": "Podcast title",
    "format": "Podcast format",
    "duration": "Estimated duration",
    "target_audience": "Target audience",
    "participants": ["Participant name 1", "Participant name 2"],
    "script_sections": [
        {{
            "section_title": "Introduction",
            "content": "Script text for this section"
        }},
        {{
            "section_title": "Module X",
            "content": "Script text for this section"
        }},
        ...
        {{
            "section_title": "Conclusion",
            "content": "Script text for this section"
        }}
    ]
}}"#,
        summary = course_summary(course, structure),
        format = options.format,
        duration = options.duration,
        audience = options.target_audience,
        instructions = format_instructions(options.format),
    )
}

impl ContentGenerator {
    pub async fn generate_podcast_script(
        &self,
        course: &Course,
        structure: &CourseStructure,
        options: &PodcastOptions,
    ) -> GenerationResult<PodcastScript> {
        if structure.modules.is_empty() {
            return Err(GenerationError::InvalidInput(
                "Generate the course structure before the podcast script.".to_string(),
            ));
        }
        let prompt = podcast_prompt(course, structure, options);
        let script: PodcastScript = self.complete_json(PODCAST_SYSTEM, prompt).await?;
        info!(
            "Generated podcast script '{}' with {} sections",
            script.podcast_title,
            script.script_sections.len()
        );
        Ok(script)
    }
}
