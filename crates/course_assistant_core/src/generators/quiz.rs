//! Module quizzes.

use super::ContentGenerator;
use crate::domain::{Module, QuestionType, Quiz, QuizOptions};
use crate::error::{GenerationError, GenerationResult};
use tracing::info;

const QUIZ_SYSTEM: &str = "You are an expert in pedagogy and quiz design. \
    You must create a relevant quiz suited to the content provided.";

/// `Module N: title` followed by each chapter's number, title, description
/// and dash-bulleted key points.
pub fn module_summary(module: &Module) -> String {
    let mut summary = format!("Module {}: {}\n\n", module.module_number, module.module_title);
    for chapter in &module.chapters {
        summary.push_str(&format!("Chapter {}: {}\n", chapter.chapter_number, chapter.chapter_title));
        summary.push_str(&format!("Description: {}\n", chapter.description));
        summary.push_str("Key points:\n");
        for point in &chapter.key_points {
            summary.push_str(&format!("- {}\n", point));
        }
        summary.push('\n');
    }
    summary
}

fn validate(options: &QuizOptions) -> GenerationResult<()> {
    if options.num_questions == 0 || options.num_questions > QuizOptions::MAX_QUESTIONS {
        return Err(GenerationError::InvalidInput(format!(
            "The number of questions must be between 1 and {}.",
            QuizOptions::MAX_QUESTIONS
        )));
    }
    if options.question_types.is_empty() {
        return Err(GenerationError::InvalidInput(
            "Select at least one question type.".to_string(),
        ));
    }
    Ok(())
}

fn quiz_prompt(course_title: &str, module: &Module, options: &QuizOptions) -> String {
    let types = options
        .question_types
        .iter()
        .map(QuestionType::label)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"As a pedagogy expert, create a quiz assessing knowledge of the following module:

Course: {course_title}
{summary}
Generate a quiz with the following characteristics:
- Number of questions: {count}
- Difficulty level: {difficulty}
- Question types to include: {types}

For each question, include:
1. The question text
2. The question type (one of those specified)
3. The answer options (for multiple choice and true/false questions)
4. The correct answer
5. An explanation of the answer

The quiz must cover the whole module evenly and match the requested difficulty level.

Return the quiz as a JSON object shaped as follows:
{{
    "module_title": "Module title",
    "module_number": {number},
    "quiz_title": "Quiz title",
    "difficulty_level": "Difficulty level",
    "questions": [
        {{
            "question_number": 1,
            "question_text": "Question text",
            "question_type": "Question type",
            "options": ["Option A", "Option B", "Option C", "Option D"],
            "correct_answer": "Correct answer",
            "explanation": "Explanation of the answer"
        }},
        ...
    ]
}}
Omit "options" for direct questions."#,
        summary = module_summary(module),
        count = options.num_questions,
        difficulty = options.difficulty,
        number = module.module_number,
    )
}

impl ContentGenerator {
    pub async fn generate_quiz(
        &self,
        course_title: &str,
        module: &Module,
        options: &QuizOptions,
    ) -> GenerationResult<Quiz> {
        validate(options)?;
        let prompt = quiz_prompt(course_title, module, options);
        let quiz: Quiz = self.complete_json(QUIZ_SYSTEM, prompt).await?;
        info!(
            "Generated quiz for module {} with {} questions",
            module.module_number,
            quiz.questions.len()
        );
        Ok(quiz)
    }
}
