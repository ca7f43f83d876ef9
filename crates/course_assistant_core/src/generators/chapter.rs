//! Detailed chapter content.

use super::{ContentGenerator, ReferenceMaterial};
use crate::domain::{Chapter, ChapterContent, Course, Module};
use crate::error::GenerationResult;
use tracing::info;

const CHAPTER_SYSTEM: &str = "You are an expert in pedagogy and course design. \
    You must create detailed, informative and pedagogically sound chapter content.";

fn chapter_prompt(
    course: &Course,
    module: &Module,
    chapter: &Chapter,
    reference: Option<&ReferenceMaterial>,
) -> String {
    let context = format!(
        "Course title: {}\n\
         Course description: {}\n\
         Module title: {}\n\
         Chapter title: {}\n\
         Chapter description: {}\n\
         Key points to cover:\n{}{}",
        course.title,
        course.description,
        module.module_title,
        chapter.chapter_title,
        chapter.description,
        chapter.key_points.join(", "),
        ReferenceMaterial::prompt_context(reference)
    );

    format!(
        r#"As an expert in pedagogy and course design, create detailed content for a course chapter with the following context:

{context}

Generate complete chapter content that includes:
1. An engaging introduction presenting the subject of the chapter
2. A structured development covering every key point listed
3. Concrete examples and illustrations that aid understanding
4. Clear, pedagogical explanations suited to the course's difficulty level
5. A conclusion summarising the important points and linking to the rest of the course
6. Reflection questions or practical exercises that reinforce learning

The content must be informative, engaging and pedagogically sound.

Return the content as a JSON object shaped as follows:
{{
    "introduction": "Introduction text",
    "sections": [
        {{
            "title": "Title of section 1",
            "content": "Detailed content of section 1",
            "examples": ["Example 1", "Example 2"]
        }},
        ...
    ],
    "conclusion": "Conclusion text",
    "exercises": [
        {{
            "question": "Question 1",
            "answer": "Answer or hint for question 1"
        }},
        ...
    ]
}}"#
    )
}

impl ContentGenerator {
    pub async fn generate_chapter_content(
        &self,
        course: &Course,
        module: &Module,
        chapter: &Chapter,
        reference: Option<&ReferenceMaterial>,
    ) -> GenerationResult<ChapterContent> {
        let prompt = chapter_prompt(course, module, chapter, reference);
        let content: ChapterContent = self.complete_json(CHAPTER_SYSTEM, prompt).await?;
        info!(
            "Generated content for chapter {} ({} sections, {} exercises)",
            chapter.chapter_number,
            content.sections.len(),
            content.exercises.len()
        );
        Ok(content)
    }
}
