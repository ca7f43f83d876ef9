//! Learning objectives, prerequisites and learning methods.
//!
//! All three ask for a numbered or bulleted list and parse the reply with
//! [`parse_list_reply`](super::parse_list_reply).

use super::{parse_list_reply, ContentGenerator, PEDAGOGY_EXPERT};
use crate::domain::{Course, ListKind};
use crate::error::GenerationResult;
use tracing::info;

fn objectives_prompt(title: &str, description: &str) -> String {
    format!(
        "As a pedagogy expert, generate 5 clear and measurable learning objectives for this course:\n\n\
         Course title: {title}\n\n\
         Course description: {description}\n\n\
         The learning objectives must:\n\
         1. Start with action verbs (e.g. identify, analyse, create)\n\
         2. Be specific and measurable\n\
         3. Be aligned with the course content\n\
         4. Cover different levels of Bloom's taxonomy (knowledge, comprehension, application, analysis, synthesis, evaluation)\n\
         5. Be written from the learner's point of view\n\n\
         Output format: a numbered list of 5 learning objectives."
    )
}

fn prerequisites_prompt(title: &str, description: &str) -> String {
    format!(
        "As a pedagogy expert, generate a list of prerequisites for this course:\n\n\
         Course title: {title}\n\n\
         Course description: {description}\n\n\
         The prerequisites must:\n\
         1. Be clear and specific\n\
         2. Include the required knowledge and skills\n\
         3. Mention any required tools or software\n\
         4. State the recommended level of prior experience\n\
         5. Be realistic and relevant to the course\n\n\
         Output format: a list of 4-6 prerequisites."
    )
}

fn methods_prompt(title: &str, description: &str) -> String {
    format!(
        "As a pedagogy expert, generate 3-5 effective learning methods for this course:\n\n\
         Course title: {title}\n\n\
         Course description: {description}\n\n\
         The learning methods must:\n\
         1. Be varied and suited to the course content\n\
         2. Include modern, effective teaching approaches\n\
         3. Be clearly named (e.g. \"Interactive videos\", \"Hands-on workshops\", \"Case studies\")\n\
         4. Be relevant to the subject of the course\n\n\
         Output format: a list of 3-5 learning methods."
    )
}

impl ContentGenerator {
    /// Generates one of the three course lists.
    pub async fn generate_list(&self, kind: ListKind, course: &Course) -> GenerationResult<Vec<String>> {
        let prompt = match kind {
            ListKind::Objectives => objectives_prompt(&course.title, &course.description),
            ListKind::Prerequisites => prerequisites_prompt(&course.title, &course.description),
            ListKind::Methods => methods_prompt(&course.title, &course.description),
        };
        let reply = self.complete_text(PEDAGOGY_EXPERT, prompt).await?;
        let items = parse_list_reply(&reply);
        info!("Generated {} {}", items.len(), kind);
        Ok(items)
    }

    pub async fn generate_learning_objectives(&self, course: &Course) -> GenerationResult<Vec<String>> {
        self.generate_list(ListKind::Objectives, course).await
    }

    pub async fn generate_prerequisites(&self, course: &Course) -> GenerationResult<Vec<String>> {
        self.generate_list(ListKind::Prerequisites, course).await
    }

    pub async fn generate_learning_methods(&self, course: &Course) -> GenerationResult<Vec<String>> {
        self.generate_list(ListKind::Methods, course).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::generator;
    use super::*;
    use crate::ports::MockCompletionService;

    fn course() -> Course {
        Course {
            title: "Intro to Statistics".to_string(),
            description: "Basics of descriptive statistics".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn objectives_are_parsed_from_numbered_reply() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .times(1)
            .withf(|_, req| {
                !req.json_object
                    && req.model == "gpt-4o"
                    && req.max_tokens == 1000
                    && req.messages[1].content.contains("5 clear and measurable learning objectives")
                    && req.messages[1].content.contains("Intro to Statistics")
            })
            .returning(|_, _| Ok("1. Compute the mean\n2. Interpret a histogram".to_string()));

        let items = generator(mock).generate_learning_objectives(&course()).await.unwrap();
        assert_eq!(items, vec!["Compute the mean", "Interpret a histogram"]);
    }

    #[tokio::test]
    async fn prerequisites_fall_back_to_whole_reply() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .withf(|_, req| req.messages[1].content.contains("4-6 prerequisites"))
            .returning(|_, _| Ok("Some comfort with arithmetic.".to_string()));

        let items = generator(mock).generate_prerequisites(&course()).await.unwrap();
        assert_eq!(items, vec!["Some comfort with arithmetic."]);
    }

    #[tokio::test]
    async fn methods_prompt_asks_for_named_methods() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .withf(|_, req| req.messages[1].content.contains("3-5 effective learning methods"))
            .returning(|_, _| Ok("- Case studies\n- Quizzes".to_string()));

        let items = generator(mock).generate_learning_methods(&course()).await.unwrap();
        assert_eq!(items, vec!["Case studies", "Quizzes"]);
    }
}
