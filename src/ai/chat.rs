// src/ai/chat.rs
//
// Free-form learning-assistant chat. Single turn, raw text back, and a fixed
// apology on failure so this path can never surface an error to the caller.

use super::{LearnerProfile, TextGenerator};

/// Sends one chat turn to the generator and returns the reply verbatim.
pub async fn reply(
    generator: &dyn TextGenerator,
    message: &str,
    profile: &LearnerProfile,
    course_context: &str,
) -> String {
    let context = if course_context.trim().is_empty() {
        "General query - no specific course selected"
    } else {
        course_context
    };

    let prompt = format!(
        r#"You are CurriForge AI, an intelligent learning assistant. You help students with their learning journey.

**Student Profile:**
- Name: {name}
- Educational Background: {qualification}
- Interests: {interests}

**Course Context:** {context}

**Student's Question:** {message}

Provide a helpful, encouraging, and detailed response. If the student asks about their planner, give specific actionable advice. If they ask about a course topic, explain it clearly. Keep the response concise but thorough. Use markdown formatting for readability.

If the student seems to be asking about enrolling in a new course, suggest they use the "Enroll New Course" feature and mention what information would help create the best curriculum for them.
"#,
        name = LearnerProfile::text_or_default(&profile.name, "Student"),
        qualification =
            LearnerProfile::text_or_default(&profile.educational_qualification, "Not specified"),
        interests =
            LearnerProfile::text_or_default(&profile.educational_interests, "Not specified"),
    );

    match generator.complete(&prompt, 2048, 0.7).await {
        Ok(text) => text,
        Err(e) => format!(
            "I'm sorry, I encountered an error: {}. Please try again.",
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::GenerationError;
    use async_trait::async_trait;

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, GenerationError> {
            Err(GenerationError::Api {
                status: 500,
                message: "overloaded".into(),
            })
        }
    }

    struct VerbatimGenerator;

    #[async_trait]
    impl TextGenerator for VerbatimGenerator {
        async fn complete(
            &self,
            prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, GenerationError> {
            Ok(prompt.to_string())
        }
    }

    #[tokio::test]
    async fn failure_returns_apology_not_error() {
        let text = reply(&FailingGenerator, "help", &LearnerProfile::default(), "").await;
        assert!(text.starts_with("I'm sorry, I encountered an error:"));
        assert!(text.contains("overloaded"));
    }

    #[tokio::test]
    async fn prompt_carries_profile_and_context() {
        let profile = LearnerProfile {
            name: Some("Ada".to_string()),
            educational_interests: Some("compilers".to_string()),
            ..Default::default()
        };
        let text = reply(
            &VerbatimGenerator,
            "What next?",
            &profile,
            "Course: Rust (beginner). Progress: 40%",
        )
        .await;
        assert!(text.contains("- Name: Ada"));
        assert!(text.contains("- Interests: compilers"));
        assert!(text.contains("Course: Rust (beginner). Progress: 40%"));
        assert!(text.contains("**Student's Question:** What next?"));
    }

    #[tokio::test]
    async fn empty_context_gets_general_placeholder() {
        let text = reply(&VerbatimGenerator, "hi", &LearnerProfile::default(), "  ").await;
        assert!(text.contains("General query - no specific course selected"));
        assert!(text.contains("- Name: Student"));
    }
}
