// src/ai/mod.rs
//
// Everything that talks to the external text-generation service: the HTTP
// client, prompt builders for curriculum / practice / chat, and the JSON
// recovery used on generator replies.

pub mod chat;
pub mod client;
pub mod curriculum;
pub mod parse;
pub mod practice;

pub use client::{GenerationError, GroqClient};

use async_trait::async_trait;
use std::sync::Arc;

/// Seam between the adapters and the real HTTP client so tests can
/// substitute a canned generator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Single-turn completion: one user prompt in, raw text out.
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError>;
}

pub type SharedGenerator = Arc<dyn TextGenerator>;

/// Learner profile snapshot passed into the prompt builders.
///
/// All fields are optional free text; missing values render as
/// "Not specified" in prompts so the generator never sees empty slots.
#[derive(Debug, Clone, Default)]
pub struct LearnerProfile {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub educational_qualification: Option<String>,
    pub educational_interests: Option<String>,
    pub hobbies: Option<String>,
    pub habits: Option<String>,
    pub daily_routine: Option<String>,
    /// Comma-joined titles of the learner's other ongoing courses.
    pub ongoing_courses: Option<String>,
}

impl LearnerProfile {
    pub(crate) fn text_or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
        match value {
            Some(v) if !v.trim().is_empty() => v,
            _ => default,
        }
    }

    pub(crate) fn age_text(&self) -> String {
        self.age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "Not specified".to_string())
    }
}
